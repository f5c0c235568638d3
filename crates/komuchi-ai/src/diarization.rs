//! HTTP client for the speaker diarization sidecar.
//!
//! The sidecar exposes a voice embedding endpoint used for voice profile
//! enrollment. Embeddings come back as a JSON array of floats.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::providers::VoiceEmbeddingClient;

/// Client for the diarization service's `/embed` endpoint.
pub struct DiarizationClient {
    http_client: Client,
    base_url: String,
}

impl Debug for DiarizationClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DiarizationClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DiarizationClient {
    pub fn new(base_url: String) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client for diarization service")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VoiceEmbeddingClient for DiarizationClient {
    fn name(&self) -> &str {
        "diarization"
    }

    async fn embed(&self, audio: Bytes, mime_type: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embed", self.base_url);

        let file_part = Part::bytes(audio.to_vec())
            .file_name("sample")
            .mime_str(mime_type)
            .context("Invalid mime type for voice sample")?;
        let form = Form::new().part("file", file_part);

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("Failed to call diarization service")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Diarization embedding failed: {} - {}",
                status,
                error_text
            ));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        tracing::info!(
            dimensions = body.embedding.len(),
            "Voice embedding received"
        );

        Ok(body.embedding)
    }
}

// Diarization service response types
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_strips_trailing_slash() {
        let client = DiarizationClient::new("http://localhost:8000/".to_string()).unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");
    }

    #[test]
    fn embedding_response_parses() {
        let payload = r#"{"embedding": [0.1, 0.2, 0.3]}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.embedding, vec![0.1, 0.2, 0.3]);
    }
}
