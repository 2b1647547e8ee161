use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::agents::web_agent::types::{ActionSpec, AnnotatedImage, AnnotationMap};
use crate::types::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct DecisionRequest<'a> {
    query_string: &'a str,
    img_url: &'a str,
    element_centers: &'a AnnotationMap,
    current_link: &'a str,
    log: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct UploadReply {
    #[serde(default)]
    img_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Talks to the image host and the decision service. Every call is made
/// exactly once; failures are returned, never retried.
#[derive(Debug, Clone)]
pub struct DecisionClient {
    client: Client,
    upload_url: String,
    decision_url: String,
}

impl DecisionClient {
    pub fn new(upload_url: impl Into<String>, decision_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            upload_url: upload_url.into(),
            decision_url: decision_url.into(),
        }
    }

    /// Upload, decide, then resolve the chosen label against the same map
    /// that was sent.
    pub async fn round_trip(
        &self,
        annotated: &AnnotatedImage,
        query: &str,
        current_link: &str,
        log: &str,
    ) -> AppResult<ActionSpec> {
        let img_url = self.upload_image(&annotated.image).await?;
        let mut spec = self
            .decide(query, &img_url, &annotated.map, current_link, log)
            .await?;
        resolve_element(&mut spec, &annotated.map);
        Ok(spec)
    }

    pub async fn upload_image(&self, image: &[u8]) -> AppResult<String> {
        let filename = chrono::Local::now().format("%Y%m%d%H%M%S.png").to_string();
        let part = Part::bytes(image.to_vec())
            .file_name(filename)
            .mime_str("image/png")
            .map_err(|e| AppError::Upload(format!("Failed to prepare the screenshot for upload: {}", e)))?;
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("Failed to send upload request to {}: {}", self.upload_url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Upload(format!("Failed to read upload response: {}", e)))?;
        let reply: UploadReply = serde_json::from_str(&body).unwrap_or_default();

        if let Some(err) = reply.error {
            error!(status = status.as_u16(), "Error uploading file: {}", err);
            return Err(AppError::Upload(err));
        }
        if !status.is_success() {
            return Err(AppError::Upload(format!("HTTP error! status: {}", status.as_u16())));
        }
        let img_url = reply
            .img_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::Upload("upload response did not contain img_url".into()))?;
        info!(img_url = %img_url, "uploaded annotated screenshot");
        Ok(img_url)
    }

    pub async fn decide(
        &self,
        query: &str,
        img_url: &str,
        element_centers: &AnnotationMap,
        current_link: &str,
        log: &str,
    ) -> AppResult<ActionSpec> {
        let request = DecisionRequest {
            query_string: query,
            img_url,
            element_centers,
            current_link,
            log,
        };

        let response = self
            .client
            .post(&self.decision_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::RemoteService {
                status: None,
                message: format!("Failed to send request to {}: {}", self.decision_url, e),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AppError::RemoteService {
            status: Some(status.as_u16()),
            message: format!("Failed to read response body: {}", e),
        })?;
        debug!(status = status.as_u16(), body = %body, "decision service replied");

        if !status.is_success() {
            return Err(AppError::RemoteService {
                status: Some(status.as_u16()),
                message: format!("HTTP error! status: {}", status.as_u16()),
            });
        }

        serde_json::from_str(&body).map_err(|e| AppError::RemoteService {
            status: Some(status.as_u16()),
            message: format!("Failed to parse decision response: {}", e),
        })
    }
}

/// Attaches `elementPosition` for the label the service chose. An unknown
/// label is logged and left unresolved.
pub fn resolve_element(spec: &mut ActionSpec, map: &AnnotationMap) {
    if spec.next_action.element().is_none() {
        return;
    }
    match spec.next_action.label().and_then(|label| map.get(&label)) {
        Some(center) => spec.next_action.set_element_position(center.position),
        None => warn!(
            element = ?spec.next_action.element(),
            known_labels = map.len(),
            "decision referenced an element label that is not on the image"
        ),
    }
}
