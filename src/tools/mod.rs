pub mod chrome;
pub mod utils;
