use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info};

use crate::browser::client::{BrowserClient, BrowserLauncher};
use crate::types::error::AppResult;

type Slot = Option<Arc<dyn BrowserClient>>;

/// Owns the single browser session of the process.
///
/// Requests take a [`SessionLease`] for their whole pipeline, so two requests
/// never interleave navigation and actions on the same browser.
pub struct SessionManager {
	launcher: Arc<dyn BrowserLauncher>,
	slot: Mutex<Slot>,
}

pub struct SessionLease<'a> {
	launcher: &'a dyn BrowserLauncher,
	guard: MutexGuard<'a, Slot>,
}

impl SessionManager {
	pub fn new(launcher: Arc<dyn BrowserLauncher>) -> Arc<Self> {
		Arc::new(Self {
			launcher,
			slot: Mutex::new(None),
		})
	}

	/// Waits until no other request holds the session.
	pub async fn acquire(&self) -> SessionLease<'_> {
		SessionLease {
			launcher: self.launcher.as_ref(),
			guard: self.slot.lock().await,
		}
	}

	pub async fn is_live(&self) -> bool {
		self.slot.lock().await.is_some()
	}

	pub async fn shutdown(&self) {
		self.acquire().await.discard().await;
	}
}

impl SessionLease<'_> {
	/// Returns the live session, creating it on first use.
	pub async fn get_session(&mut self) -> AppResult<Arc<dyn BrowserClient>> {
		if let Some(browser) = self.guard.as_ref() {
			return Ok(Arc::clone(browser));
		}
		info!("Starting browser session...");
		let browser = self.launcher.launch().await?;
		*self.guard = Some(Arc::clone(&browser));
		info!("Browser session started");
		Ok(browser)
	}

	/// Quits and forgets the session; the next request launches a new one.
	pub async fn discard(&mut self) {
		if let Some(browser) = self.guard.take() {
			info!("Closing browser session...");
			if let Err(e) = browser.quit().await {
				error!("Error closing browser session: {}", e);
			}
		}
	}
}
