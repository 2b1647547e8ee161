use std::time::Duration;

use serde_json::json;

use crate::browser::client::BrowserClient;
use crate::types::error::AppResult;

// arguments: [x, y, durationMs]; 到时后由页面自己移除
const HIGHLIGHT_SCRIPT: &str = r#"
const [x, y, durationMs] = arguments;
const box = document.createElement('div');
box.setAttribute('data-som-highlight', '');
box.style.position = 'fixed';
box.style.left = (x - 12) + 'px';
box.style.top = (y - 12) + 'px';
box.style.width = '24px';
box.style.height = '24px';
box.style.border = '2px solid red';
box.style.borderRadius = '4px';
box.style.boxShadow = '0 0 6px 2px rgba(255,0,0,0.5)';
box.style.zIndex = '2147483647';
box.style.pointerEvents = 'none';
document.body.appendChild(box);
setTimeout(() => box.remove(), durationMs);
"#;

/// 在目标坐标处画一个临时高亮框，只用于观察和调试
pub struct AnimationUtils {
    duration: Duration,
}

impl AnimationUtils {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub async fn highlight_point(&self, browser: &dyn BrowserClient, x: i64, y: i64) -> AppResult<()> {
        browser
            .execute(
                HIGHLIGHT_SCRIPT,
                vec![json!(x), json!(y), json!(self.duration.as_millis() as u64)],
            )
            .await?;
        Ok(())
    }
}
