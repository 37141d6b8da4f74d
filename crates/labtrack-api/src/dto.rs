//! Request and response payloads.
//!
//! Identifiers arrive as plain strings and are parsed here, so a malformed
//! uid is rejected before any store call is made.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use labtrack_core::{Sample, SampleId, SplitEvent, SplitEventId};

use crate::error::ApiError;

/// `{"uid": "..."}` reference to an existing sample.
#[derive(Debug, Clone, Deserialize)]
pub struct SampleRef {
    pub uid: String,
}

impl SampleRef {
    pub fn parse(&self) -> Result<SampleId, ApiError> {
        Ok(self.uid.parse()?)
    }
}

/// Body of `POST /samples`. A client-supplied uid is accepted and ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSampleRequest {
    #[serde(default)]
    pub uid: Option<String>,
}

/// Body of `POST /processes`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateProcessRequest {
    #[serde(default)]
    pub samples: Option<Vec<SampleRef>>,
}

impl CreateProcessRequest {
    /// Parse every referenced uid, failing on the first malformed one.
    pub fn sample_ids(&self) -> Result<Vec<SampleId>, ApiError> {
        self.samples
            .iter()
            .flatten()
            .map(SampleRef::parse)
            .collect()
    }
}

/// Body of `POST /split`.
#[derive(Debug, Deserialize)]
pub struct SplitRequest {
    pub original_sample: SampleRef,
    pub target_count: i64,
}

impl SplitRequest {
    pub fn target_count(&self) -> Result<u32, ApiError> {
        u32::try_from(self.target_count).map_err(|_| {
            ApiError::Validation(format!(
                "Invalid target_count: {} is out of range",
                self.target_count
            ))
        })
    }
}

/// A completed split. Unlike [`SplitEvent`], the original is always present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SplitEventResponse {
    pub uid: SplitEventId,
    pub timestamp: DateTime<Utc>,
    pub original_sample: Sample,
    pub target_samples: Vec<Sample>,
}

impl TryFrom<SplitEvent> for SplitEventResponse {
    type Error = ApiError;

    fn try_from(event: SplitEvent) -> Result<Self, Self::Error> {
        let original_sample = event.original_sample.ok_or_else(|| {
            ApiError::Internal(format!("Split event {} has no original sample", event.uid))
        })?;
        Ok(Self {
            uid: event.uid,
            timestamp: event.timestamp,
            original_sample,
            target_samples: event.target_samples,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Decode a JSON body that may be omitted entirely.
pub fn optional_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}
