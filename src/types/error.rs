use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub const PIPELINE_FAILURE: &str = "An error occurred while processing the request";

#[derive(Debug, Error)]
pub enum AppError {
	#[error("{0}")]
	InputValidation(String),

	#[error("Browser session error: {0}")]
	Session(String),

	#[error("Element extraction failed: {0}")]
	Extraction(String),

	#[error("Annotation failed: {0}")]
	Annotation(String),

	#[error("An error occurred while uploading the screenshot: {0}")]
	Upload(String),

	#[error("Decision service error: {message}")]
	RemoteService { status: Option<u16>, message: String },

	#[error("Missing required fields: {0}")]
	ActionValidation(String),

	#[error("Accessibility tree unavailable: {0}")]
	Accessibility(String),

	#[error("Action step '{step}' failed: {message}")]
	Action { step: &'static str, message: String },

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
	/// Errors after which the browser can no longer be trusted; the handler
	/// drops the session so the next request starts from a fresh one.
	pub fn is_session_fatal(&self) -> bool {
		matches!(self, AppError::Session(_) | AppError::Extraction(_))
	}

	pub fn status_code(&self) -> StatusCode {
		match self {
			AppError::InputValidation(_) => StatusCode::BAD_REQUEST,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		let status = self.status_code();
		let body = match &self {
			AppError::InputValidation(msg) => msg.clone(),
			AppError::ActionValidation(_) => self.to_string(),
			other => format!("{}: {}", PIPELINE_FAILURE, other),
		};
		(status, body).into_response()
	}
}
