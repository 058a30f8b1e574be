use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::error::PipelineError;
use crate::EmbeddingConfig;

#[derive(Debug, Serialize)]
pub struct EmbeddingRequest<'a> {
    input: &'a [&'a str],
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingResponse {
    data: Vec<Embed>,
}

#[derive(Debug, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub index: Option<usize>,
    pub embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible `/embeddings` endpoint.
pub struct HttpEmbedder {
    client: Client,
    url: String,
    model: String,
    api_key: String,
    dimensions: Option<usize>,
}

impl HttpEmbedder {
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            client: Client::new(),
            url: config.url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            dimensions: config.dimensions,
        }
    }

    async fn request(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            input: texts,
            model: &self.model,
            dimensions: self.dimensions,
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }
        let response = builder
            .send()
            .await
            .context("Failed to send request to embedding API")?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Request Failed to Embedding Model: {}",
                response.status()
            ));
        }

        let body = response
            .json::<EmbeddingResponse>()
            .await
            .context("Failed to parse embedding API response")?;

        Ok(into_vectors(body.data))
    }
}

/// Vectors in input order; servers may return `data` out of order but tag
/// each entry with its `index`.
fn into_vectors(mut data: Vec<Embed>) -> Vec<Vec<f32>> {
    if data.iter().all(|e| e.index.is_some()) {
        data.sort_by_key(|e| e.index);
    }
    data.into_iter().map(|e| e.embedding).collect()
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, PipelineError> {
        self.request(texts)
            .await
            .map_err(|e| PipelineError::Embedding(format!("{:#}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() -> anyhow::Result<()> {
        let texts = ["helloworld", "hellorust"];
        let request = EmbeddingRequest {
            input: &texts,
            model: "m",
            dimensions: None,
        };
        assert_eq!(
            serde_json::to_value(&request)?,
            serde_json::json!({"input": ["helloworld", "hellorust"], "model": "m"})
        );
        Ok(())
    }

    #[test]
    fn test_response_reordered_by_index() -> anyhow::Result<()> {
        let body: EmbeddingResponse = serde_json::from_str(
            r#"{"data": [
                {"index": 1, "object": "embedding", "embedding": [0.5]},
                {"index": 0, "object": "embedding", "embedding": [0.25]}
            ]}"#,
        )?;
        assert_eq!(into_vectors(body.data), vec![vec![0.25], vec![0.5]]);
        Ok(())
    }

    #[test]
    fn test_response_without_index_keeps_order() -> anyhow::Result<()> {
        let body: EmbeddingResponse =
            serde_json::from_str(r#"{"data": [{"embedding": [1.0]}, {"embedding": [2.0]}]}"#)?;
        assert_eq!(into_vectors(body.data), vec![vec![1.0], vec![2.0]]);
        Ok(())
    }
}
