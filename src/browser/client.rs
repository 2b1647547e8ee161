use async_trait::async_trait;
use serde_json::Value;

use crate::types::error::AppResult;

/// The live browser surface the pipeline works against.
///
/// Driver failures come back as `AppError::Session`; callers re-classify them
/// when a step has a more specific meaning (extraction, action).
#[async_trait]
pub trait BrowserClient: Send + Sync {
	/// Maximize the window, then load `url`.
	async fn goto(&self, url: &str) -> AppResult<()>;

	async fn current_url(&self) -> AppResult<String>;

	async fn screenshot_png(&self) -> AppResult<Vec<u8>>;

	/// Run a constant script body; request data travels in `args`
	/// (`arguments[i]` inside the script).
	async fn execute(&self, script: &str, args: Vec<Value>) -> AppResult<Value>;

	async fn move_pointer(&self, x: i64, y: i64) -> AppResult<()>;

	async fn click(&self) -> AppResult<()>;

	async fn type_text(&self, text: &str) -> AppResult<()>;

	async fn press_enter(&self) -> AppResult<()>;

	async fn accessibility_tree(&self) -> AppResult<Value>;

	async fn quit(&self) -> AppResult<()>;
}

/// Builds a browser with the process-wide fixed configuration.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
	async fn launch(&self) -> AppResult<std::sync::Arc<dyn BrowserClient>>;
}
