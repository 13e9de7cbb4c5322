//! Wire types of the image job protocol.
//!
//! Requests and responses are camelCase JSON. Image bytes travel as
//! standard base64 strings.

use scan_imaging::{FilterKind, NormalizedCorner, Quad};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::JobError;

/// A job submitted by a client.
///
/// `payload` stays untyped until the operation is known, so an unknown
/// operation is reported as such rather than as a payload error.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    /// Opaque id echoed back in the response
    pub correlation_id: String,
    /// `perspectiveTransform` or `applyFilter`
    pub operation: String,
    /// Operation-specific payload
    #[serde(default)]
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
}

impl JobRequest {
    /// Build a `perspectiveTransform` request.
    pub fn perspective(
        correlation_id: impl Into<String>,
        image_bytes: Vec<u8>,
        quad: &Quad,
    ) -> Self {
        let payload = PerspectivePayload {
            image_bytes,
            corners: quad.corners().map(WireCorner::from),
            image_size: None,
        };
        Self::with_payload(correlation_id, Operation::PerspectiveTransform, &payload)
    }

    /// Build an `applyFilter` request.
    pub fn filter(
        correlation_id: impl Into<String>,
        image_bytes: Vec<u8>,
        filter: FilterKind,
    ) -> Self {
        let payload = FilterPayload {
            image_bytes,
            filter: filter.name().to_string(),
        };
        Self::with_payload(correlation_id, Operation::ApplyFilter, &payload)
    }

    fn with_payload(
        correlation_id: impl Into<String>,
        operation: Operation,
        payload: &impl Serialize,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            operation: operation.name().to_string(),
            // Serializing plain structs of strings and numbers cannot fail
            payload: serde_json::to_value(payload).unwrap_or_default(),
        }
    }

    /// Resolve the operation and decode the matching payload.
    pub fn parse(&self) -> Result<ParsedJob, JobError> {
        let operation: Operation = self.operation.parse()?;
        match operation {
            Operation::PerspectiveTransform => {
                let payload: PerspectivePayload = decode_payload(&self.payload)?;
                let quad = Quad::from(payload.corners.map(NormalizedCorner::from));
                Ok(ParsedJob::Perspective {
                    image_bytes: payload.image_bytes,
                    quad,
                    image_size: payload.image_size,
                })
            }
            Operation::ApplyFilter => {
                let payload: FilterPayload = decode_payload(&self.payload)?;
                let filter: FilterKind = payload.filter.parse()?;
                Ok(ParsedJob::Filter {
                    image_bytes: payload.image_bytes,
                    filter,
                })
            }
        }
    }
}

fn decode_payload<T: serde::de::DeserializeOwned>(value: &serde_json::Value) -> Result<T, JobError> {
    T::deserialize(value).map_err(|e| JobError::InvalidPayload(e.to_string()))
}

/// Supported job operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    PerspectiveTransform,
    ApplyFilter,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::PerspectiveTransform => "perspectiveTransform",
            Operation::ApplyFilter => "applyFilter",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "perspectiveTransform" => Ok(Operation::PerspectiveTransform),
            "applyFilter" => Ok(Operation::ApplyFilter),
            other => Err(JobError::UnsupportedOperation(other.to_string())),
        }
    }
}

/// A request whose operation and payload have been validated.
#[derive(Debug, Clone)]
pub enum ParsedJob {
    Perspective {
        image_bytes: Vec<u8>,
        quad: Quad,
        image_size: Option<ImageSize>,
    },
    Filter {
        image_bytes: Vec<u8>,
        filter: FilterKind,
    },
}

impl ParsedJob {
    pub fn operation(&self) -> Operation {
        match self {
            ParsedJob::Perspective { .. } => Operation::PerspectiveTransform,
            ParsedJob::Filter { .. } => Operation::ApplyFilter,
        }
    }

    pub fn image_bytes(&self) -> &[u8] {
        match self {
            ParsedJob::Perspective { image_bytes, .. } | ParsedJob::Filter { image_bytes, .. } => {
                image_bytes
            }
        }
    }
}

/// A corner as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WireCorner {
    pub dx: f64,
    pub dy: f64,
}

impl From<WireCorner> for NormalizedCorner {
    fn from(corner: WireCorner) -> Self {
        NormalizedCorner::new(corner.dx, corner.dy)
    }
}

impl From<NormalizedCorner> for WireCorner {
    fn from(corner: NormalizedCorner) -> Self {
        Self {
            dx: corner.dx,
            dy: corner.dy,
        }
    }
}

/// Dimensions the client believes the image has. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Payload of `perspectiveTransform`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerspectivePayload {
    #[serde(with = "base64_bytes")]
    #[schema(value_type = String, format = Byte)]
    pub image_bytes: Vec<u8>,
    /// top-left, top-right, bottom-right, bottom-left
    #[schema(value_type = Vec<WireCorner>, min_items = 4, max_items = 4)]
    pub corners: [WireCorner; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_size: Option<ImageSize>,
}

/// Payload of `applyFilter`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterPayload {
    #[serde(with = "base64_bytes")]
    #[schema(value_type = String, format = Byte)]
    pub image_bytes: Vec<u8>,
    /// `grayscale`, `blackAndWhite`, `enhanced` or `document`
    pub filter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Success,
    Error,
}

/// Exactly one of these is produced per [`JobRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub correlation_id: String,
    pub status: JobStatus,
    /// Encoded result image (success only)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_bytes::option"
    )]
    #[schema(value_type = Option<String>, format = Byte)]
    pub result_bytes: Option<Vec<u8>>,
    /// Failure description (error only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JobResponse {
    pub fn success(correlation_id: impl Into<String>, result_bytes: Vec<u8>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            status: JobStatus::Success,
            result_bytes: Some(result_bytes),
            message: None,
        }
    }

    pub fn error(correlation_id: impl Into<String>, error: &JobError) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            status: JobStatus::Error,
            result_bytes: None,
            message: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Success
    }

    /// The result bytes, or the error message.
    pub fn into_result(self) -> Result<Vec<u8>, String> {
        match (self.status, self.result_bytes) {
            (JobStatus::Success, Some(bytes)) => Ok(bytes),
            (JobStatus::Success, None) => Err("success response without result".to_string()),
            (JobStatus::Error, _) => Err(self.message.unwrap_or_default()),
        }
    }
}

/// Serde adapter for `Vec<u8>` as a standard base64 string.
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            bytes: &Option<Vec<u8>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match bytes {
                Some(bytes) => super::serialize(bytes, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Vec<u8>>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|encoded| {
                    STANDARD
                        .decode(encoded.as_bytes())
                        .map_err(serde::de::Error::custom)
                })
                .transpose()
        }
    }
}
