pub mod chrome_ctrl;
pub mod collector;
pub mod types;

pub use chrome_ctrl::{Chrome, ChromeLauncher};
pub use collector::collect_page;
pub use types::{CollectedPage, PageElement, Viewport, VisibleRect};
