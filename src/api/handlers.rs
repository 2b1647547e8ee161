use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::agents::web_agent::config::WebAgentConfig;
use crate::agents::web_agent::executor::ActionExecutor;
use crate::agents::web_agent::pipeline::{self, normalize_url};
use crate::agents::web_agent::types::ActionSpec;
use crate::browser::client::BrowserLauncher;
use crate::browser::session::{SessionLease, SessionManager};
use crate::clients::decision::DecisionClient;
use crate::manager::action_log::ActionLog;
use crate::tools::chrome::chrome_ctrl::ChromeLauncher;
use crate::types::error::{AppError, AppResult};

const ACCESSIBILITY_FAILURE: &str = "An error occurred while retrieving the accessibility tree.";

#[derive(Clone)]
pub struct AppState {
	pub config: Arc<WebAgentConfig>,
	pub sessions: Arc<SessionManager>,
	pub decision: Arc<DecisionClient>,
	pub executor: Arc<ActionExecutor>,
	pub action_log: Arc<ActionLog>,
}

impl AppState {
	pub fn new(config: WebAgentConfig) -> Self {
		let launcher = Arc::new(ChromeLauncher {
			webdriver_url: config.webdriver_url.clone(),
			headless: config.headless,
		});
		Self::with_launcher(config, launcher)
	}

	pub fn with_launcher(config: WebAgentConfig, launcher: Arc<dyn BrowserLauncher>) -> Self {
		Self {
			sessions: SessionManager::new(launcher),
			decision: Arc::new(DecisionClient::new(config.upload_url.clone(), config.decision_url.clone())),
			executor: Arc::new(ActionExecutor::new(config.annotation_scale, config.highlight_duration)),
			action_log: Arc::new(ActionLog::new(config.action_log_capacity)),
			config: Arc::new(config),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct OpenUrlParams {
	pub url: Option<String>,
	pub user_input: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActionParams {
	pub query: Option<String>,
}

/// GET /open-url?url=&user_input=
pub async fn open_url(
	State(state): State<AppState>,
	Query(params): Query<OpenUrlParams>,
) -> Result<Json<ActionSpec>, AppError> {
	let user_input = params
		.user_input
		.filter(|s| !s.trim().is_empty())
		.ok_or_else(|| AppError::InputValidation("No user input provided.".into()))?;
	let url = normalize_url(params.url.as_deref());

	let request_id = Uuid::new_v4();
	let span = info_span!("open_url", %request_id, url = %url);
	async move {
		let mut lease = state.sessions.acquire().await;
		let result = run_open_url(&state, &mut lease, &url, &user_input).await;
		let spec = settle(&mut lease, result).await?;
		info!(action = ?spec.next_action.action(), element = ?spec.next_action.element(), "decision ready");
		Ok::<_, AppError>(Json(spec))
	}
	.instrument(span)
	.await
}

async fn run_open_url(
	state: &AppState,
	lease: &mut SessionLease<'_>,
	url: &str,
	user_input: &str,
) -> AppResult<ActionSpec> {
	let browser = lease.get_session().await?;
	let perception = pipeline::perceive(browser.as_ref(), url, state.config.settle_delay).await?;
	let annotated = pipeline::annotate(&perception, state.config.annotation_scale)?;
	if let Some(dir) = &state.config.debug_dir {
		pipeline::save_debug_image(dir, &annotated).await;
	}

	let log = state.action_log.render().await;
	let spec = state
		.decision
		.round_trip(&annotated, user_input, &perception.current_link, &log)
		.await?;
	state
		.action_log
		.push(format!(
			"[{}] {}",
			perception.current_link,
			spec.brief_explanation().unwrap_or("(no explanation)")
		))
		.await;
	Ok(spec)
}

/// GET /action?query=<ActionSpec JSON>
pub async fn action(
	State(state): State<AppState>,
	Query(params): Query<ActionParams>,
) -> Result<&'static str, AppError> {
	let raw = params
		.query
		.filter(|q| !q.trim().is_empty())
		.ok_or_else(|| AppError::InputValidation("No action query provided.".into()))?;
	let spec: ActionSpec = serde_json::from_str(&raw)
		.map_err(|e| AppError::InputValidation(format!("Invalid action query: {}", e)))?;

	let request_id = Uuid::new_v4();
	let span = info_span!("action", %request_id);
	async move {
		let mut lease = state.sessions.acquire().await;
		let result = match lease.get_session().await {
			Ok(browser) => state.executor.execute(browser.as_ref(), &spec).await,
			Err(e) => Err(e),
		};
		let outcome = settle(&mut lease, result).await?;
		state
			.action_log
			.push(format!(
				"{} at ({}, {}) with text \"{}\"",
				spec.next_action.action().unwrap_or("act"),
				outcome.x,
				outcome.y,
				outcome.text
			))
			.await;
		Ok::<_, AppError>("Action executed successfully.")
	}
	.instrument(span)
	.await
}

/// GET /accessibility-tree
pub async fn accessibility_tree(State(state): State<AppState>) -> Response {
	let mut lease = state.sessions.acquire().await;
	// 只读查询：CDP 调用失败不丢弃会话，只有启动失败才算会话级错误
	let result = match lease.get_session().await {
		Ok(browser) => browser
			.accessibility_tree()
			.await
			.map_err(|e| AppError::Accessibility(e.to_string())),
		Err(e) => Err(e),
	};
	match settle(&mut lease, result).await {
		Ok(tree) => Json::<Value>(tree).into_response(),
		Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, ACCESSIBILITY_FAILURE).into_response(),
	}
}

pub async fn health() -> &'static str {
	"ok"
}

// 失败时记录日志；会话级错误直接丢弃浏览器，下个请求重新启动
async fn settle<T>(lease: &mut SessionLease<'_>, result: AppResult<T>) -> AppResult<T> {
	if let Err(e) = &result {
		error!("request failed: {}", e);
		if e.is_session_fatal() {
			lease.discard().await;
		}
	}
	result
}
