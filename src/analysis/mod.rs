//! Hand-off of session features to an external analysis service.
//!
//! The service is opaque: it receives a natural-language request built from
//! a [`FeaturePayload`] and answers with free-form text. Any failure is
//! reduced to a single user-visible message by the [`AnalysisSlot`].

pub mod slot;

#[cfg(feature = "analysis")]
pub mod client;

pub use slot::{AnalysisSlot, AnalysisState};

#[cfg(feature = "analysis")]
pub use client::{BlockingHttpAnalyzer, HttpAnalyzer};

use crate::core::features::FeaturePayload;
use serde::Serialize;
use thiserror::Error;

/// Fixed role and style instruction sent with every request.
pub const ROLE_INSTRUCTION: &str = "You are a keystroke dynamics analyst. \
Reply in plain language with a one-paragraph summary, a short list of the \
typing patterns you notice, and two or three practical recommendations.";

/// Message shown when the analysis service fails.
pub const FAILURE_MESSAGE: &str = "Analysis failed. Please try again.";

/// Errors from the analysis boundary.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Analysis config error: {0}")]
    Config(String),
    #[error("Analysis network error: {0}")]
    Network(String),
    #[error("Analysis server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("Analysis response error: {0}")]
    Response(String),
    #[error("Analysis service panicked: {0}")]
    Panicked(String),
    #[error("An analysis request is already in flight")]
    AlreadyInFlight,
}

/// A request for the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    pub instruction: String,
    pub payload: FeaturePayload,
}

impl AnalysisRequest {
    pub fn new(payload: FeaturePayload) -> Self {
        Self {
            instruction: ROLE_INSTRUCTION.to_string(),
            payload,
        }
    }

    /// Render the user prompt embedding the sequence and timings.
    pub fn prompt(&self) -> String {
        let timings = self
            .payload
            .timings
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Analyze this typing session.\n\
             Key sequence: {}\n\
             Inter-key intervals of the first {} keys (ms): [{}]\n\
             Describe the typing rhythm, notable patterns, and how the typist could improve.",
            self.payload.sequence,
            self.payload.timings.len(),
            timings
        )
    }
}

/// An external analysis service.
pub trait Analyzer: Send + Sync {
    /// Analyse one request, returning the service's text.
    fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisError>;
}

impl<F> Analyzer for F
where
    F: Fn(&AnalysisRequest) -> Result<String, AnalysisError> + Send + Sync,
{
    fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        self(request)
    }
}
