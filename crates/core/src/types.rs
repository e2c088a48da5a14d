use serde::{Deserialize, Serialize};

pub const SERVICE_NAME: &str = "JARVIS";
pub const SERVICE_VERSION: &str = "0.1.0";

// ============================================================================
// Diagnostic Payloads
// ============================================================================

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInfo {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl ServiceInfo {
    pub fn online() -> Self {
        Self {
            status: "online".into(),
            service: SERVICE_NAME.into(),
            version: SERVICE_VERSION.into(),
        }
    }
}

/// Body of `GET /health`. Reports configuration only; the memory service
/// is not contacted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthReport {
    pub status: String,
    pub memory_api: String,
    pub user_id: String,
}

impl HealthReport {
    pub fn healthy(memory_api: &str, user_id: &str) -> Self {
        Self {
            status: "healthy".into(),
            memory_api: memory_api.into(),
            user_id: user_id.into(),
        }
    }
}
