use std::collections::VecDeque;

use tokio::sync::RwLock;

const EMPTY_LOG: &str = "No actions taken yet.";

/// Browsing, thinking and action history sent with every decision request.
/// Lives in memory only and keeps the most recent `capacity` entries.
pub struct ActionLog {
	entries: RwLock<VecDeque<String>>,
	capacity: usize,
}

impl ActionLog {
	pub fn new(capacity: usize) -> Self {
		Self {
			entries: RwLock::new(VecDeque::with_capacity(capacity)),
			capacity: capacity.max(1),
		}
	}

	pub async fn push(&self, entry: impl Into<String>) {
		let mut guard = self.entries.write().await;
		if guard.len() == self.capacity {
			guard.pop_front();
		}
		guard.push_back(entry.into());
	}

	pub async fn render(&self) -> String {
		let guard = self.entries.read().await;
		if guard.is_empty() {
			return EMPTY_LOG.to_string();
		}
		guard
			.iter()
			.enumerate()
			.map(|(i, entry)| format!("{}. {}", i + 1, entry))
			.collect::<Vec<_>>()
			.join("\n")
	}
}
