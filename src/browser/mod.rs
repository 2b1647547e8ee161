pub mod client;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{BrowserClient, BrowserLauncher};
pub use session::{SessionLease, SessionManager};
