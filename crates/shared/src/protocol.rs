use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::RegionProfile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub running: bool,
    pub region: Option<String>,
    pub config_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub file: String,
    pub name: String,
}

impl From<&RegionProfile> for RegionSummary {
    fn from(profile: &RegionProfile) -> Self {
        Self {
            file: profile.file_path.display().to_string(),
            name: profile.display_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionsResponse {
    pub regions: BTreeMap<String, RegionSummary>,
    pub current: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SwitchRequest {
    #[serde(default)]
    pub region: Option<serde_json::Value>,
}

impl SwitchRequest {
    /// Anything that is not a JSON object counts as an empty request.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// The requested code. Falsy JSON values (`null`, `false`, `0`, `""`,
    /// `[]`, `{}`) mean no region was given; other non-string values are
    /// rendered as JSON text so they fail the catalog lookup by name.
    pub fn region_code(&self) -> Option<String> {
        use serde_json::Value;

        match self.region.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(code) if code.is_empty() => None,
            Value::String(code) => Some(code.clone()),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::Array(items) if items.is_empty() => None,
            Value::Object(fields) if fields.is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchResponse {
    pub success: bool,
    pub region: String,
    pub restarted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonResponse {
    pub success: bool,
    pub running: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
        }
    }
}
