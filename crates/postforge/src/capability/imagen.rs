use async_trait::async_trait;
use base64::Engine;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ImageCapabilityConfig;

use super::{check_status, create_http_client, CapabilityError, Credential, ImageGenerator, Result};

/// Image generation through Vertex AI Imagen `:predict`.
pub struct ImagenClient {
    client: Client,
    location: String,
    model: String,
    project_id: Credential,
    access_token: Credential,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: [Instance<'a>; 1],
    parameters: Parameters<'a>,
}

#[derive(Serialize)]
struct Instance<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters<'a> {
    sample_count: u32,
    aspect_ratio: &'a str,
    safety_filter_level: &'static str,
    person_generation: &'static str,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
}

impl ImagenClient {
    pub fn new(config: &ImageCapabilityConfig) -> Result<Self> {
        Ok(Self {
            client: create_http_client(config.timeout_secs)?,
            location: config.location.clone(),
            model: config.model.clone(),
            project_id: Credential::from_source("google project id", &config.project_id),
            access_token: Credential::from_source("google access token", &config.access_token),
        })
    }

    fn endpoint(&self, project_id: &str) -> String {
        format!(
            "https://{loc}-aiplatform.googleapis.com/v1/projects/{project}/locations/{loc}/publishers/google/models/{model}:predict",
            loc = self.location,
            project = project_id,
            model = self.model,
        )
    }
}

#[async_trait]
impl ImageGenerator for ImagenClient {
    async fn generate_image(&self, prompt: &str, aspect_ratio: &str) -> Result<Vec<u8>> {
        let project_id = self.project_id.expose()?;
        let access_token = self.access_token.expose()?;

        debug!("Generating {} image with {}", aspect_ratio, self.model);

        let body = PredictRequest {
            instances: [Instance { prompt }],
            parameters: Parameters {
                sample_count: 1,
                aspect_ratio,
                safety_filter_level: "block_some",
                person_generation: "allow_adult",
            },
        };

        let response = self
            .client
            .post(self.endpoint(project_id))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| CapabilityError::from_reqwest("Predict request failed", e))?;

        let response = check_status(response).await.inspect_err(|e| {
            warn!("Image generation rejected: {}", e);
        })?;

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::MalformedResponse(format!("Predict response: {}", e)))?;

        decode_first_prediction(parsed)
    }
}

/// No prediction usually means the safety filter declined the prompt.
fn decode_first_prediction(response: PredictResponse) -> Result<Vec<u8>> {
    let encoded = response
        .predictions
        .into_iter()
        .find_map(|p| p.bytes_base64_encoded)
        .ok_or_else(|| CapabilityError::Refused("no image returned for prompt".to_string()))?;

    base64::engine::general_purpose::STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| CapabilityError::MalformedResponse(format!("image payload: {}", e)))
}
