use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{accessibility_tree, action, health, open_url, AppState};

pub fn build_router() -> Router<AppState> {
	Router::new()
		.route("/open-url", get(open_url))
		.route("/action", get(action))
		.route("/accessibility-tree", get(accessibility_tree))
		.route("/health", get(health))
		.layer(TraceLayer::new_for_http())
}


#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;
	use std::sync::Arc;
	use std::time::Duration;

	use axum::body::Body;
	use axum::http::{Request, StatusCode};
	use serde_json::{json, Value};
	use tower::ServiceExt; // for `oneshot`
	use wiremock::matchers::{body_partial_json, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use crate::agents::web_agent::config::WebAgentConfig;
	use crate::browser::testing::{Call, FakeBrowser, FakeLauncher};

	fn state(server: &MockServer, launcher: Arc<FakeLauncher>) -> AppState {
		state_with(server, launcher, None)
	}

	fn state_with(server: &MockServer, launcher: Arc<FakeLauncher>, debug_dir: Option<PathBuf>) -> AppState {
		let config = WebAgentConfig {
			debug_dir,
			upload_url: format!("{}/upload", server.uri()),
			decision_url: format!("{}/process_query", server.uri()),
			settle_delay: Duration::ZERO,
			highlight_duration: Duration::from_millis(10),
			..WebAgentConfig::default()
		};
		AppState::with_launcher(config, launcher)
	}

	async fn get(state: AppState, uri: &str) -> (StatusCode, String) {
		let response = build_router()
			.with_state(state)
			.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
			.await
			.unwrap();
		let status = response.status();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
		(status, String::from_utf8(bytes.to_vec()).unwrap())
	}

	async fn mount_upload(server: &MockServer) {
		Mock::given(method("POST"))
			.and(path("/upload"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"img_url": "https://img.example/a.png"})))
			.mount(server)
			.await;
	}

	fn action_uri(spec: Value) -> String {
		format!("/action?query={}", urlencoding::encode(&spec.to_string()))
	}

	#[tokio::test]
	async fn health_ok() {
		let server = MockServer::start().await;
		let (status, body) = get(state(&server, FakeLauncher::new(FakeBrowser::default())), "/health").await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, "ok");
	}

	#[tokio::test]
	async fn open_url_without_user_input_is_rejected() {
		let server = MockServer::start().await;
		let launcher = FakeLauncher::new(FakeBrowser::default());
		let (status, body) = get(state(&server, launcher.clone()), "/open-url?url=http://www.google.com").await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body, "No user input provided.");
		assert_eq!(launcher.launches(), 0);
	}

	#[tokio::test]
	async fn open_url_returns_resolved_decision() {
		let server = MockServer::start().await;
		mount_upload(&server).await;
		Mock::given(method("POST"))
			.and(path("/process_query"))
			.and(body_partial_json(json!({
				"query_string": "press the button",
				"img_url": "https://img.example/a.png",
				"current_link": "http://example.com",
				"log": "No actions taken yet.",
				"element_centers": {
					"1": {"position": {"x": 40.0, "y": 30.0}, "tag": "A", "link": "https://example.com/next"},
					"2": {"position": {"x": 140.0, "y": 74.0}, "tag": "BUTTON"}
				}
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"briefExplanation": "the button is label 2",
				"nextAction": {"action": "click", "element": 2, "text": ""}
			})))
			.expect(1)
			.mount(&server)
			.await;

		let launcher = FakeLauncher::new(FakeBrowser::default());
		let app = state(&server, launcher.clone());
		let (status, body) = get(app.clone(), "/open-url?url=example.com&user_input=press%20the%20button").await;
		assert_eq!(status, StatusCode::OK, "{body}");

		let reply: Value = serde_json::from_str(&body).unwrap();
		assert_eq!(reply["nextAction"]["elementPosition"], json!({"x": 140.0, "y": 74.0}));
		assert_eq!(launcher.browser().calls()[0], Call::Goto("http://example.com".into()));
		assert!(app.action_log.render().await.contains("the button is label 2"));
	}

	#[tokio::test]
	async fn decision_failure_is_reported_with_status() {
		let server = MockServer::start().await;
		mount_upload(&server).await;
		Mock::given(method("POST"))
			.and(path("/process_query"))
			.respond_with(ResponseTemplate::new(500))
			.mount(&server)
			.await;

		let launcher = FakeLauncher::new(FakeBrowser::default());
		let (status, body) = get(state(&server, launcher.clone()), "/open-url?user_input=anything").await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert!(body.starts_with("An error occurred while processing the request"));
		assert!(body.contains("500"));
		// 远程服务错误不影响浏览器会话
		assert_eq!(launcher.browser().quit_count(), 0);
	}

	#[tokio::test]
	async fn upload_error_stops_before_decision() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/upload"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "disk full"})))
			.expect(1)
			.mount(&server)
			.await;
		Mock::given(method("POST"))
			.and(path("/process_query"))
			.respond_with(ResponseTemplate::new(200))
			.expect(0)
			.mount(&server)
			.await;

		let (status, body) = get(
			state(&server, FakeLauncher::new(FakeBrowser::default())),
			"/open-url?user_input=anything",
		)
		.await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert!(body.contains("disk full"));
	}

	#[tokio::test]
	async fn navigation_failure_discards_session() {
		let server = MockServer::start().await;
		let launcher = FakeLauncher::new(FakeBrowser::default().failing_goto());
		let app = state(&server, launcher.clone());

		let (status, _) = get(app.clone(), "/open-url?url=nowhere.invalid&user_input=x").await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(launcher.browser().quit_count(), 1);
		assert!(!app.sessions.is_live().await);

		get(app, "/open-url?url=nowhere.invalid&user_input=x").await;
		assert_eq!(launcher.launches(), 2);
	}

	#[tokio::test]
	async fn action_without_position_is_rejected() {
		let server = MockServer::start().await;
		let launcher = FakeLauncher::new(FakeBrowser::default());
		let uri = action_uri(json!({"briefExplanation": "b", "nextAction": {"action": "type", "text": "hi"}}));
		let (status, body) = get(state(&server, launcher.clone()), &uri).await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert!(body.starts_with("Missing required fields"));
		assert!(launcher.browser().input_calls().is_empty());
	}

	#[tokio::test]
	async fn action_executes_against_the_session() {
		let server = MockServer::start().await;
		let launcher = FakeLauncher::new(FakeBrowser::default());
		let app = state(&server, launcher.clone());
		let uri = action_uri(json!({
			"briefExplanation": "search",
			"nextAction": {"action": "type", "element": 1, "text": "funny cat videos",
						   "elementPosition": {"x": 101.0, "y": 51.0}}
		}));

		let (status, body) = get(app.clone(), &uri).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, "Action executed successfully.");
		assert_eq!(
			launcher.browser().input_calls(),
			vec![Call::Move(50, 25), Call::Click, Call::Type("funny cat videos".into()), Call::Enter]
		);
		assert_eq!(launcher.launches(), 1);
		assert!(app.action_log.render().await.contains("type at (50, 25)"));
	}

	#[tokio::test]
	async fn action_with_bad_json_is_a_client_error() {
		let server = MockServer::start().await;
		let (status, body) = get(
			state(&server, FakeLauncher::new(FakeBrowser::default())),
			"/action?query=%7Bnot%20json",
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert!(body.starts_with("Invalid action query"));
	}

	#[tokio::test]
	async fn action_without_query_is_a_client_error() {
		let server = MockServer::start().await;
		let (status, body) = get(state(&server, FakeLauncher::new(FakeBrowser::default())), "/action").await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body, "No action query provided.");
	}

	#[tokio::test]
	async fn accessibility_tree_is_returned_as_json() {
		let server = MockServer::start().await;
		let (status, body) = get(
			state(&server, FakeLauncher::new(FakeBrowser::default())),
			"/accessibility-tree",
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		let tree: Value = serde_json::from_str(&body).unwrap();
		assert_eq!(tree["nodes"][0]["role"]["value"], "RootWebArea");
	}

	#[tokio::test]
	async fn accessibility_failure_keeps_the_session() {
		let server = MockServer::start().await;
		let launcher = FakeLauncher::new(FakeBrowser::default().failing_accessibility_tree());
		let app = state(&server, launcher.clone());

		let (status, body) = get(app.clone(), "/accessibility-tree").await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(body, "An error occurred while retrieving the accessibility tree.");
		assert_eq!(launcher.browser().quit_count(), 0);
		assert!(app.sessions.is_live().await);
	}

	#[tokio::test]
	async fn unwritable_debug_dir_does_not_fail_open_url() {
		let server = MockServer::start().await;
		mount_upload(&server).await;
		Mock::given(method("POST"))
			.and(path("/process_query"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"briefExplanation": "click",
				"nextAction": {"action": "click", "element": 1}
			})))
			.expect(1)
			.mount(&server)
			.await;

		let tmp = tempfile::tempdir().unwrap();
		let blocker = tmp.path().join("not-a-dir");
		std::fs::write(&blocker, b"file").unwrap();
		let app = state_with(&server, FakeLauncher::new(FakeBrowser::default()), Some(blocker.join("shots")));

		let (status, body) = get(app, "/open-url?user_input=click%20the%20link").await;
		assert_eq!(status, StatusCode::OK, "{body}");
		assert!(!blocker.join("shots").exists());
	}

	#[tokio::test]
	async fn open_url_returns_reply_fields_as_sent() {
		let server = MockServer::start().await;
		mount_upload(&server).await;
		Mock::given(method("POST"))
			.and(path("/process_query"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"nextAction": {"action": "scroll", "text": 5, "element": null}
			})))
			.mount(&server)
			.await;

		let (status, body) = get(
			state(&server, FakeLauncher::new(FakeBrowser::default())),
			"/open-url?user_input=scroll%20down",
		)
		.await;
		assert_eq!(status, StatusCode::OK, "{body}");
		let reply: Value = serde_json::from_str(&body).unwrap();
		assert_eq!(reply, json!({"nextAction": {"action": "scroll", "text": 5, "element": null}}));
	}
}
