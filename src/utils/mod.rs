pub mod constants;
mod errors;
pub mod keys;
mod timeout;
mod wait_for_element;

pub use errors::{EngineError, EngineResult};
pub use timeout::{interaction_timeout, validate_navigation_timeout, wait_duration};
pub use wait_for_element::wait_for_visible_text;
