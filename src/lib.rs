pub mod agents;
pub mod api;
pub mod browser;
pub mod clients;
pub mod manager;
pub mod tools;
pub mod types;
