use tracing::{debug, warn};

use crate::browser::client::BrowserClient;
use crate::tools::chrome::types::CollectedPage;
use crate::types::error::{AppError, AppResult};

// 扫描整个文档，返回每个元素在视口内、未被遮挡的矩形
pub const PAGE_SCRIPT: &str = include_str!("page_script.js");

/// One synchronous scan of the document. Either the whole page comes back or
/// the call fails with `AppError::Extraction`.
pub async fn collect_page(browser: &dyn BrowserClient) -> AppResult<CollectedPage> {
    let raw = browser
        .execute(PAGE_SCRIPT, Vec::new())
        .await
        .map_err(|e| AppError::Extraction(e.to_string()))?;

    let page: CollectedPage = serde_json::from_value(raw).map_err(|e| {
        AppError::Extraction(format!("Failed to parse collected elements: {}", e))
    })?;

    let page = sanitize(page);
    debug!(
        elements = page.elements.len(),
        viewport_width = page.viewport.width,
        viewport_height = page.viewport.height,
        "collected visible elements"
    );
    Ok(page)
}

/// Drops rects that break the viewport invariant, then elements left without
/// any rect. Document order is preserved.
pub fn sanitize(mut page: CollectedPage) -> CollectedPage {
    let viewport = page.viewport;
    let mut dropped = 0usize;
    page.elements.retain_mut(|element| {
        let before = element.rects.len();
        element.rects.retain(|r| r.is_within(&viewport));
        dropped += before - element.rects.len();
        !element.rects.is_empty()
    });
    if dropped > 0 {
        warn!(dropped, "discarded rects outside the viewport");
    }
    page
}
