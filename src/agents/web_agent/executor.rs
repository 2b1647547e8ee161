use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::agents::web_agent::types::{ActionSpec, Position};
use crate::browser::client::BrowserClient;
use crate::tools::utils::animation_utils::AnimationUtils;
use crate::types::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome {
    pub x: i64,
    pub y: i64,
    pub text: String,
}

/// Inverse of the annotator's scaling: raster position back to logical page
/// pixels, floored.
pub fn to_page_point(position: Position, scale: f64) -> (i64, i64) {
    ((position.x / scale).floor() as i64, (position.y / scale).floor() as i64)
}

/// Executes one resolved action: move, click, type, Enter. Steps run in order
/// and the first failure aborts the rest.
pub struct ActionExecutor {
    scale: f64,
    highlight: AnimationUtils,
}

impl ActionExecutor {
    pub fn new(scale: f64, highlight_duration: Duration) -> Self {
        Self {
            scale,
            highlight: AnimationUtils::new(highlight_duration),
        }
    }

    pub async fn execute(&self, browser: &dyn BrowserClient, spec: &ActionSpec) -> AppResult<ActionOutcome> {
        let (text, position) = match (spec.next_action.text(), spec.next_action.element_position()) {
            (Some(text), Some(position)) => (text.to_string(), position),
            _ => {
                return Err(AppError::ActionValidation(
                    "nextAction.text and nextAction.elementPosition are required.".into(),
                ))
            }
        };
        let (x, y) = to_page_point(position, self.scale);
        info!(x, y, action = ?spec.next_action.action(), "executing action");

        if let Err(e) = self.highlight.highlight_point(browser, x, y).await {
            warn!("could not draw highlight: {}", e);
        }

        browser.move_pointer(x, y).await.map_err(|e| step_failed("move", e))?;
        browser.click().await.map_err(|e| step_failed("click", e))?;
        browser.type_text(&text).await.map_err(|e| step_failed("type", e))?;
        browser.press_enter().await.map_err(|e| step_failed("submit", e))?;

        Ok(ActionOutcome { x, y, text })
    }
}

fn step_failed(step: &'static str, e: AppError) -> AppError {
    AppError::Action {
        step,
        message: e.to_string(),
    }
}
