use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::agents::web_agent::set_of_mark::DEFAULT_SCALE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebAgentConfig {
    pub webdriver_url: String,
    pub upload_url: String,
    pub decision_url: String,
    pub bind_addr: String,
    pub settle_delay: Duration,          // 导航后等待动态内容渲染
    pub highlight_duration: Duration,
    pub annotation_scale: f64,           // 截图像素 / 页面逻辑像素
    pub headless: bool,
    pub debug_dir: Option<PathBuf>,      // 设置后保存每张标注图
    pub action_log_capacity: usize,
}

impl Default for WebAgentConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            upload_url: "http://localhost:5000/upload".to_string(),
            decision_url: "http://localhost:5000/process_query".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            settle_delay: Duration::from_secs(2),
            highlight_duration: Duration::from_secs(2),
            annotation_scale: DEFAULT_SCALE,
            headless: false,
            debug_dir: None,
            action_log_capacity: 20,
        }
    }
}

impl WebAgentConfig {
    /// Reads the process environment (call `dotenv` first to pick up `.env`).
    /// `UPLOAD_URL` and `DECISION_URL` are required.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            webdriver_url: env::var("WEBDRIVER_URL").unwrap_or(defaults.webdriver_url),
            upload_url: env::var("UPLOAD_URL").context("UPLOAD_URL environment variable not found")?,
            decision_url: env::var("DECISION_URL").context("DECISION_URL environment variable not found")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            settle_delay: optional_var::<u64>("SETTLE_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.settle_delay),
            highlight_duration: optional_var::<u64>("HIGHLIGHT_DURATION_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.highlight_duration),
            annotation_scale: optional_var::<f64>("ANNOTATION_SCALE")?.unwrap_or(defaults.annotation_scale),
            headless: optional_var::<bool>("HEADLESS")?.unwrap_or(defaults.headless),
            debug_dir: env::var("DEBUG_DIR").ok().filter(|v| !v.is_empty()).map(PathBuf::from),
            action_log_capacity: optional_var::<usize>("ACTION_LOG_CAPACITY")?
                .unwrap_or(defaults.action_log_capacity),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.annotation_scale.is_finite() && self.annotation_scale > 0.0) {
            return Err(anyhow!("ANNOTATION_SCALE must be a positive number, got {}", self.annotation_scale));
        }
        url::Url::parse(&self.upload_url).context("UPLOAD_URL is not a valid URL")?;
        url::Url::parse(&self.decision_url).context("DECISION_URL is not a valid URL")?;
        Ok(())
    }
}

fn optional_var<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("invalid value for {}: {}", key, e)),
        _ => Ok(None),
    }
}
