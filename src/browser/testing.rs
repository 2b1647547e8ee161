//! In-memory browser used by unit and router tests.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{ImageOutputFormat, Rgba, RgbaImage};
use serde_json::{json, Value};

use crate::browser::client::{BrowserClient, BrowserLauncher};
use crate::types::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
	Goto(String),
	Execute(String),
	Move(i64, i64),
	Click,
	Type(String),
	Enter,
}

pub struct FakeBrowser {
	calls: Mutex<Vec<Call>>,
	script_result: Value,
	screenshot: Vec<u8>,
	fail_goto: bool,
	fail_click: bool,
	fail_accessibility: bool,
	quits: AtomicUsize,
}

impl Default for FakeBrowser {
	fn default() -> Self {
		Self {
			calls: Mutex::new(Vec::new()),
			script_result: json!({
				"viewport": {"width": 100.0, "height": 50.0},
				"elements": [
					{"tag": "DIV", "rects": [rect(0.0, 0.0, 100.0, 50.0)], "link": null},
					{"tag": "A", "rects": [rect(10.0, 10.0, 30.0, 20.0)], "link": "https://example.com/next"},
					{"tag": "BUTTON", "rects": [rect(50.0, 30.0, 90.0, 44.0)], "link": null}
				]
			}),
			screenshot: png(200, 100),
			fail_goto: false,
			fail_click: false,
			fail_accessibility: false,
			quits: AtomicUsize::new(0),
		}
	}
}

pub fn rect(left: f64, top: f64, right: f64, bottom: f64) -> Value {
	json!({
		"left": left, "top": top, "right": right, "bottom": bottom,
		"width": right - left, "height": bottom - top
	})
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
	let img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
	let mut out = Vec::new();
	image::DynamicImage::ImageRgba8(img)
		.write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Png)
		.expect("encode test png");
	out
}

impl FakeBrowser {
	pub fn with_script_result(mut self, value: Value) -> Self {
		self.script_result = value;
		self
	}

	pub fn with_screenshot(mut self, bytes: Vec<u8>) -> Self {
		self.screenshot = bytes;
		self
	}

	pub fn failing_goto(mut self) -> Self {
		self.fail_goto = true;
		self
	}

	pub fn failing_click(mut self) -> Self {
		self.fail_click = true;
		self
	}

	pub fn failing_accessibility_tree(mut self) -> Self {
		self.fail_accessibility = true;
		self
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().unwrap().clone()
	}

	/// Calls without the script executions (highlight, collector).
	pub fn input_calls(&self) -> Vec<Call> {
		self.calls()
			.into_iter()
			.filter(|c| !matches!(c, Call::Execute(_) | Call::Goto(_)))
			.collect()
	}

	pub fn quit_count(&self) -> usize {
		self.quits.load(Ordering::SeqCst)
	}

	fn record(&self, call: Call) {
		self.calls.lock().unwrap().push(call);
	}
}

#[async_trait]
impl BrowserClient for FakeBrowser {
	async fn goto(&self, url: &str) -> AppResult<()> {
		self.record(Call::Goto(url.to_string()));
		if self.fail_goto {
			return Err(AppError::Session("net::ERR_NAME_NOT_RESOLVED".into()));
		}
		Ok(())
	}

	async fn current_url(&self) -> AppResult<String> {
		let calls = self.calls.lock().unwrap();
		let url = calls.iter().rev().find_map(|c| match c {
			Call::Goto(u) => Some(u.clone()),
			_ => None,
		});
		Ok(url.unwrap_or_else(|| "about:blank".to_string()))
	}

	async fn screenshot_png(&self) -> AppResult<Vec<u8>> {
		Ok(self.screenshot.clone())
	}

	async fn execute(&self, script: &str, _args: Vec<Value>) -> AppResult<Value> {
		self.record(Call::Execute(script.lines().next().unwrap_or_default().to_string()));
		Ok(self.script_result.clone())
	}

	async fn move_pointer(&self, x: i64, y: i64) -> AppResult<()> {
		self.record(Call::Move(x, y));
		Ok(())
	}

	async fn click(&self) -> AppResult<()> {
		if self.fail_click {
			return Err(AppError::Session("element click intercepted".into()));
		}
		self.record(Call::Click);
		Ok(())
	}

	async fn type_text(&self, text: &str) -> AppResult<()> {
		self.record(Call::Type(text.to_string()));
		Ok(())
	}

	async fn press_enter(&self) -> AppResult<()> {
		self.record(Call::Enter);
		Ok(())
	}

	async fn accessibility_tree(&self) -> AppResult<Value> {
		if self.fail_accessibility {
			return Err(AppError::Session("Accessibility domain not enabled".into()));
		}
		Ok(json!({"nodes": [{"nodeId": "1", "role": {"value": "RootWebArea"}}]}))
	}

	async fn quit(&self) -> AppResult<()> {
		self.quits.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

pub struct FakeLauncher {
	browser: Arc<FakeBrowser>,
	launches: AtomicUsize,
}

impl FakeLauncher {
	pub fn new(browser: FakeBrowser) -> Arc<Self> {
		Arc::new(Self {
			browser: Arc::new(browser),
			launches: AtomicUsize::new(0),
		})
	}

	pub fn browser(&self) -> Arc<FakeBrowser> {
		Arc::clone(&self.browser)
	}

	pub fn launches(&self) -> usize {
		self.launches.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
	async fn launch(&self) -> AppResult<Arc<dyn BrowserClient>> {
		self.launches.fetch_add(1, Ordering::SeqCst);
		Ok(self.browser.clone() as Arc<dyn BrowserClient>)
	}
}
