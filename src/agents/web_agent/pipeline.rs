//! Typed stages of one perception round: perceive → annotate → (decide) →
//! act. The HTTP handlers compose them; each stage only sees its inputs.

use std::path::Path;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::agents::web_agent::set_of_mark::{add_set_of_mark, observed_scale};
use crate::agents::web_agent::types::AnnotatedImage;
use crate::browser::client::BrowserClient;
use crate::tools::chrome::collector::collect_page;
use crate::tools::chrome::types::CollectedPage;
use crate::types::error::AppResult;

pub const DEFAULT_URL: &str = "http://www.google.com";

/// What the browser showed at extraction time.
#[derive(Debug, Clone)]
pub struct Perception {
    pub page: CollectedPage,
    pub screenshot: Vec<u8>,
    pub current_link: String,
}

/// Navigate, let the page settle, then capture screenshot and geometry.
pub async fn perceive(browser: &dyn BrowserClient, url: &str, settle: Duration) -> AppResult<Perception> {
    info!(url, "opening url");
    browser.goto(url).await?;
    tokio::time::sleep(settle).await;

    let screenshot = browser.screenshot_png().await?;
    let page = collect_page(browser).await?;
    let current_link = browser.current_url().await?;
    info!(
        elements = page.elements.len(),
        screenshot_bytes = screenshot.len(),
        current_link = %current_link,
        "page perceived"
    );
    Ok(Perception {
        page,
        screenshot,
        current_link,
    })
}

pub fn annotate(perception: &Perception, scale: f64) -> AppResult<AnnotatedImage> {
    let annotated = add_set_of_mark(
        &perception.page.elements,
        &perception.screenshot,
        scale,
        &mut StdRng::from_entropy(),
    )?;

    if let Some(observed) = observed_scale(annotated.width, perception.page.viewport.width) {
        if (observed - scale).abs() > 0.01 {
            warn!(
                observed,
                configured = scale,
                "screenshot/viewport ratio differs from the annotation scale"
            );
        }
    }
    info!(labels = annotated.map.len(), width = annotated.width, height = annotated.height, "screenshot annotated");
    Ok(annotated)
}

/// Best effort; a failed write only logs.
pub async fn save_debug_image(dir: &Path, annotated: &AnnotatedImage) {
    let path = dir.join(chrono::Local::now().format("%Y%m%d%H%M%S%3f.png").to_string());
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!(dir = %dir.display(), "could not create debug dir: {}", e);
        return;
    }
    match tokio::fs::write(&path, &annotated.image).await {
        Ok(()) => info!(path = %path.display(), "saved annotated screenshot"),
        Err(e) => warn!(path = %path.display(), "could not save annotated screenshot: {}", e),
    }
}

/// Falls back to the default start page and adds `http://` to bare hosts.
pub fn normalize_url(raw: Option<&str>) -> String {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return DEFAULT_URL.to_string();
    }
    match url::Url::parse(raw) {
        Err(url::ParseError::RelativeUrlWithoutBase) => format!("http://{}", raw),
        _ => raw.to_string(),
    }
}
