pub mod config;
pub mod executor;
pub mod pipeline;
pub mod set_of_mark;
pub mod types;

pub use config::WebAgentConfig;
pub use executor::{ActionExecutor, ActionOutcome};
