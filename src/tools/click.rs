//! Click actions: by highlight index or by viewport coordinates

use super::{AutomationEngine, element_not_found};
use crate::actions::{ClickCoordinatesAction, ClickElementAction};
use crate::browser::Point;
use crate::dom::resolve_live;
use crate::result::{ActionResult, Outcome};

impl AutomationEngine {
    /// Click the element at `index` of a fresh scan.
    ///
    /// An index outside the fresh interactive set fails before anything on
    /// the page is touched.
    pub async fn click_element(&self, params: ClickElementAction) -> ActionResult {
        self.run("click_element", |page| async move {
            let Some(element) = resolve_live(page.as_ref(), params.index).await? else {
                return Ok(element_not_found(params.index));
            };

            element.handle.click().await?;
            self.settle(page.as_ref(), self.config.action_settle_timeout_ms).await;

            Ok(Outcome::success(format!(
                "Clicked element {} <{}>",
                element.index, element.tag_name
            )))
        })
        .await
    }

    pub async fn click_coordinates(&self, params: ClickCoordinatesAction) -> ActionResult {
        self.run("click_coordinates", |page| async move {
            page.click_at(Point::new(params.x, params.y)).await?;
            self.settle(page.as_ref(), self.config.action_settle_timeout_ms).await;
            Ok(Outcome::success(format!(
                "Clicked at coordinates ({}, {})",
                params.x, params.y
            )))
        })
        .await
    }
}
