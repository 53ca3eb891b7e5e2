use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    UnknownRegion,
    NotConfigured,
    RestartFailed,
    StartFailed,
    StopFailed,
    Internal,
}

impl ErrorCode {
    /// Caller-input errors; everything else is an execution or environment
    /// failure.
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            Self::InvalidRequest | Self::UnknownRegion | Self::NotConfigured
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("Region required")]
    InvalidRequest,
    #[error("Unknown region: {region}")]
    UnknownRegion {
        region: String,
        available: Vec<String>,
    },
    #[error("No configuration found. Switch to a region first.")]
    NotConfigured,
    #[error("Failed to restart: {0}")]
    RestartFailed(String),
    #[error("{0}")]
    StartFailed(String),
    #[error("{0}")]
    StopFailed(String),
    #[error("Failed to write configuration: {0}")]
    ConfigWrite(String),
}

impl ControlError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest => ErrorCode::InvalidRequest,
            Self::UnknownRegion { .. } => ErrorCode::UnknownRegion,
            Self::NotConfigured => ErrorCode::NotConfigured,
            Self::RestartFailed(_) => ErrorCode::RestartFailed,
            Self::StartFailed(_) => ErrorCode::StartFailed,
            Self::StopFailed(_) => ErrorCode::StopFailed,
            Self::ConfigWrite(_) => ErrorCode::Internal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<Vec<String>>,
}

impl ApiError {
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
            available: None,
        }
    }
}

impl From<ControlError> for ApiError {
    fn from(value: ControlError) -> Self {
        let code = value.code();
        let error = value.to_string();
        let available = match value {
            ControlError::UnknownRegion { available, .. } => Some(available),
            _ => None,
        };
        Self {
            error,
            code,
            available,
        }
    }
}
