//! Drag and drop between two elements or two coordinate pairs

use std::time::Duration;

use super::AutomationEngine;
use crate::actions::{DragDropAction, Position};
use crate::browser::{PageDriver, Point};
use crate::result::{ActionResult, Outcome};
use crate::utils::constants::{DEFAULT_DRAG_DELAY_MS, DEFAULT_DRAG_STEPS};
use crate::utils::{EngineError, EngineResult};

/// Where a drag starts and ends
#[derive(Debug, Clone, PartialEq)]
enum DragEndpoints {
    Elements {
        source: String,
        target: String,
        source_offset: Option<Position>,
        target_offset: Option<Position>,
    },
    Coordinates {
        from: Point,
        to: Point,
    },
}

impl DragEndpoints {
    /// Element selectors win over coordinates; neither complete pair is an error
    fn from_params(params: &DragDropAction) -> EngineResult<Self> {
        if let (Some(source), Some(target)) = (&params.element_source, &params.element_target) {
            return Ok(DragEndpoints::Elements {
                source: source.clone(),
                target: target.clone(),
                source_offset: params.element_source_offset,
                target_offset: params.element_target_offset,
            });
        }
        if let (Some(sx), Some(sy), Some(tx), Some(ty)) = (
            params.coord_source_x,
            params.coord_source_y,
            params.coord_target_x,
            params.coord_target_y,
        ) {
            return Ok(DragEndpoints::Coordinates {
                from: Point::new(sx, sy),
                to: Point::new(tx, ty),
            });
        }
        Err(EngineError::invalid_argument(
            "Must provide either source/target selectors or source/target coordinates",
        ))
    }
}

/// Point inside the element matched by `selector`: its top-left corner plus
/// `offset`, or its center
async fn element_point(page: &dyn PageDriver, selector: &str, offset: Option<Position>) -> EngineResult<Option<Point>> {
    let Some(element) = page.query_selector(selector).await? else {
        return Ok(None);
    };
    element.scroll_into_view().await?;
    let rect = element.bounding_box().await?;
    Ok(Some(match offset {
        Some(offset) => Point::new(rect.x + offset.x, rect.y + offset.y),
        None => rect.center(),
    }))
}

impl AutomationEngine {
    pub async fn drag_drop(&self, params: DragDropAction) -> ActionResult {
        self.run("drag_drop", |page| async move {
            let endpoints = DragEndpoints::from_params(&params)?;

            let (from, to) = match endpoints {
                DragEndpoints::Elements {
                    source,
                    target,
                    source_offset,
                    target_offset,
                } => {
                    let Some(from) = element_point(page.as_ref(), &source, source_offset).await? else {
                        return Ok(Outcome::failure(
                            format!("Source element '{}' not found", source),
                            "source element not found",
                        ));
                    };
                    let Some(to) = element_point(page.as_ref(), &target, target_offset).await? else {
                        return Ok(Outcome::failure(
                            format!("Target element '{}' not found", target),
                            "target element not found",
                        ));
                    };
                    (from, to)
                }
                DragEndpoints::Coordinates { from, to } => (from, to),
            };

            let steps = params.steps.unwrap_or(DEFAULT_DRAG_STEPS).max(1);
            let delay = Duration::from_millis(params.delay_ms.unwrap_or(DEFAULT_DRAG_DELAY_MS));
            page.drag(from, to, steps, delay).await?;
            self.settle(page.as_ref(), self.config.action_settle_timeout_ms).await;

            Ok(Outcome::success(format!(
                "Dragged from ({:.0}, {:.0}) to ({:.0}, {:.0})",
                from.x, from.y, to.x, to.y
            )))
        })
        .await
    }
}
