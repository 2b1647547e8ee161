use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thirtyfour::extensions::cdp::ChromeDevTools;
use thirtyfour::prelude::*;
use thirtyfour::ChromiumLikeCapabilities;
use tracing::{debug, info};

use crate::browser::client::{BrowserClient, BrowserLauncher};
use crate::types::error::{AppError, AppResult};

fn driver_err(e: WebDriverError) -> AppError {
    AppError::Session(e.to_string())
}

/// Chrome 浏览器控制器
pub struct Chrome {
    driver: Arc<WebDriver>,
}

impl Chrome {
    pub async fn new(webdriver_url: &str, headless: bool) -> AppResult<Self> {
        let mut caps = DesiredCapabilities::chrome();
        if headless {
            caps.set_headless().map_err(driver_err)?;
            // 无头模式下没有可以最大化的窗口，固定视口尺寸
            caps.add_arg("--window-size=1920,1080").map_err(driver_err)?;
        }
        let driver = WebDriver::new(webdriver_url, caps)
            .await
            .map_err(driver_err)?;

        Ok(Self {
            driver: Arc::new(driver),
        })
    }
}

#[async_trait]
impl BrowserClient for Chrome {
    async fn goto(&self, url: &str) -> AppResult<()> {
        // 先最大化，保证提取与截图都基于同一个视口尺寸
        self.driver.maximize_window().await.map_err(driver_err)?;
        self.driver.goto(url).await.map_err(driver_err)?;
        debug!(url, "navigation finished");
        Ok(())
    }

    async fn current_url(&self) -> AppResult<String> {
        let url = self.driver.current_url().await.map_err(driver_err)?;
        Ok(url.to_string())
    }

    async fn screenshot_png(&self) -> AppResult<Vec<u8>> {
        self.driver.screenshot_as_png().await.map_err(driver_err)
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> AppResult<Value> {
        let ret = self.driver.execute(script, args).await.map_err(driver_err)?;
        Ok(ret.json().clone())
    }

    async fn move_pointer(&self, x: i64, y: i64) -> AppResult<()> {
        self.driver
            .action_chain()
            .move_to(x, y)
            .perform()
            .await
            .map_err(driver_err)
    }

    async fn click(&self) -> AppResult<()> {
        self.driver
            .action_chain()
            .click()
            .perform()
            .await
            .map_err(driver_err)
    }

    async fn type_text(&self, text: &str) -> AppResult<()> {
        self.driver
            .action_chain()
            .send_keys(text)
            .perform()
            .await
            .map_err(driver_err)
    }

    async fn press_enter(&self) -> AppResult<()> {
        self.driver
            .action_chain()
            .key_down(Key::Enter)
            .key_up(Key::Enter)
            .perform()
            .await
            .map_err(driver_err)
    }

    async fn accessibility_tree(&self) -> AppResult<Value> {
        let dev_tools = ChromeDevTools::new(self.driver.handle.clone());
        dev_tools
            .execute_cdp("Accessibility.getFullAXTree")
            .await
            .map_err(driver_err)
    }

    async fn quit(&self) -> AppResult<()> {
        <WebDriver as Clone>::clone(&self.driver)
            .quit()
            .await
            .map_err(driver_err)
    }
}

/// Launches Chrome through a running chromedriver.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    pub webdriver_url: String,
    pub headless: bool,
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> AppResult<Arc<dyn BrowserClient>> {
        info!(webdriver_url = %self.webdriver_url, headless = self.headless, "connecting to chromedriver");
        let chrome = Chrome::new(&self.webdriver_url, self.headless).await?;
        Ok(Arc::new(chrome))
    }
}
