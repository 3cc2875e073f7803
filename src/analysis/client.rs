//! HTTP client for a generateContent-style text model endpoint.

use crate::analysis::{AnalysisError, AnalysisRequest, Analyzer};
use crate::config::AnalysisConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateRequest {
    fn from_request(request: &AnalysisRequest) -> Self {
        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: request.instruction.clone(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt(),
                }],
            }],
        }
    }
}

impl GenerateResponse {
    fn into_text(self) -> Result<String, AnalysisError> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AnalysisError::Response("empty response".to_string()));
        }
        Ok(text)
    }
}

/// Async analysis client.
pub struct HttpAnalyzer {
    config: AnalysisConfig,
    api_key: String,
    client: reqwest::Client,
}

impl HttpAnalyzer {
    /// Create a new client with an explicit API key.
    pub fn new(config: AnalysisConfig, api_key: impl Into<String>) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnalysisError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            api_key: api_key.into(),
            client,
        })
    }

    /// Create a new client reading the API key from the configured
    /// environment variable.
    pub fn from_env(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            AnalysisError::Config(format!(
                "Environment variable {} is not set",
                config.api_key_env
            ))
        })?;
        Self::new(config, api_key)
    }

    /// Send one request and return the model's text.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        let body = GenerateRequest::from_request(request);

        let response = self
            .client
            .post(self.config.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AnalysisError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Response(e.to_string()))?;
        parsed.into_text()
    }
}

/// Blocking analysis client for use from worker threads.
pub struct BlockingHttpAnalyzer {
    inner: HttpAnalyzer,
    runtime: tokio::runtime::Runtime,
}

impl BlockingHttpAnalyzer {
    pub fn new(inner: HttpAnalyzer) -> Result<Self, AnalysisError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AnalysisError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self { inner, runtime })
    }

    pub fn from_env(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        Self::new(HttpAnalyzer::from_env(config)?)
    }
}

impl Analyzer for BlockingHttpAnalyzer {
    fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        self.runtime.block_on(self.inner.analyze(request))
    }
}
