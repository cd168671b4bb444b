//! HTTP-backed generation capability.
//!
//! [`HttpGenerator`] adapts a line-of-business generation service into the
//! [`TextGenerator`] traits: `GET {endpoint}/status` for the availability
//! probe and `POST {endpoint}/generate` for streamed generation. The chunked
//! response body is folded into the cumulative-replace stream contract the
//! rewrite client expects.

use futures::StreamExt;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use async_trait::async_trait;

use crate::session::{Availability, GenerationSession, SessionConfig, TextGenerator, TextStream};
use crate::{LenioError, Result};

/// Configuration for the HTTP generation backend.
#[derive(Debug, Clone)]
pub struct HttpGeneratorConfig {
    /// Base URL of the generation service.
    pub endpoint: String,
    /// Connection timeout in seconds. Overall attempt duration is bounded
    /// by the rewrite client, not here, since generations stream for an
    /// unbounded time.
    pub connect_timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for HttpGeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8787".to_string(),
            connect_timeout: 10,
            user_agent: "Lenio/1.0".to_string(),
        }
    }
}

/// Request body for the generation endpoint.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    system: &'a str,
    prompt: &'a str,
    temperature: f64,
    sampling_width: u32,
}

/// Response body of the status endpoint.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    state: String,
}

/// A [`TextGenerator`] speaking to an HTTP generation service.
pub struct HttpGenerator {
    client: Client,
    config: HttpGeneratorConfig,
}

impl HttpGenerator {
    /// Build the backend and its HTTP client.
    pub fn new(config: HttpGeneratorConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(config.connect_timeout))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(LenioError::HttpError)?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    /// Probe the service's status endpoint.
    ///
    /// A service that cannot be reached at all counts as unavailable, which
    /// is fatal to a run before any session is created.
    async fn availability(&self) -> Result<Availability> {
        let url = format!("{}/status", self.config.endpoint.trim_end_matches('/'));

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(_) => return Ok(Availability::Unavailable),
        };

        if !response.status().is_success() {
            return Ok(Availability::Unavailable);
        }

        let status: StatusResponse = match response.json().await {
            Ok(status) => status,
            Err(_) => return Ok(Availability::Unavailable),
        };

        Ok(match status.state.as_str() {
            "ready" => Availability::Available,
            "downloading" => Availability::Downloading,
            _ => Availability::Unavailable,
        })
    }

    async fn create_session(&self, config: &SessionConfig) -> Result<Box<dyn GenerationSession>> {
        let url = format!("{}/generate", self.config.endpoint.trim_end_matches('/'));
        Ok(Box::new(HttpSession { client: self.client.clone(), url, config: config.clone() }))
    }
}

/// One configured generation handle against the HTTP service.
struct HttpSession {
    client: Client,
    url: String,
    config: SessionConfig,
}

#[async_trait]
impl GenerationSession for HttpSession {
    async fn generate_streaming(&mut self, prompt: &str) -> Result<TextStream> {
        let request = GenerateRequest {
            system: &self.config.system_instruction,
            prompt,
            temperature: self.config.temperature,
            sampling_width: self.config.sampling_width,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(LenioError::HttpError)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_rejection(status.as_u16(), &body));
        }

        // Fold body chunks into cumulative snapshots: each yielded value is
        // the full text so far.
        let stream = response.bytes_stream().scan(String::new(), |acc, item| {
            let next = match item {
                Ok(bytes) => {
                    acc.push_str(&String::from_utf8_lossy(&bytes));
                    Some(Ok(acc.clone()))
                }
                Err(e) => Some(Err(LenioError::HttpError(e))),
            };
            futures::future::ready(next)
        });

        Ok(Box::pin(stream))
    }
}

/// Map a non-success generation response onto the error taxonomy.
///
/// An unsupported-language rejection is a distinct signal that routes the
/// chunk into the fallback path instead of the plain retry loop.
fn classify_rejection(status: u16, body: &str) -> LenioError {
    let unsupported = Regex::new(r"(?i)unsupported[ _-]?language").unwrap();
    if unsupported.is_match(body) {
        return LenioError::UnsupportedLanguage;
    }

    LenioError::Backend(format!("HTTP {}: {}", status, body.chars().take(200).collect::<String>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpGeneratorConfig::default();
        assert!(config.endpoint.starts_with("http://"));
        assert_eq!(config.connect_timeout, 10);
    }

    #[test]
    fn test_classify_unsupported_language() {
        let err = classify_rejection(422, r#"{"error": "unsupported language: input is not English"}"#);
        assert!(matches!(err, LenioError::UnsupportedLanguage));

        let err = classify_rejection(422, r#"{"error": "UNSUPPORTED_LANGUAGE"}"#);
        assert!(matches!(err, LenioError::UnsupportedLanguage));
    }

    #[test]
    fn test_classify_other_rejection() {
        let err = classify_rejection(500, "internal error");
        assert!(matches!(err, LenioError::Backend(_)));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_generate_request_shape() {
        let request = GenerateRequest { system: "sys", prompt: "text", temperature: 1.0, sampling_width: 8 };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["system"], "sys");
        assert_eq!(json["prompt"], "text");
        assert_eq!(json["sampling_width"], 8);
    }
}
