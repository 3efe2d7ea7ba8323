//! Saved report templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::report::ReportConfig;

/// A reusable report configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTemplate {
    pub id: Uuid,
    pub config: ReportConfig,
    pub created_at: DateTime<Utc>,
}

impl ReportTemplate {
    /// Saves a working configuration as a template under a fresh id.
    pub fn from_config(config: ReportConfig) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            config: ReportConfig { id, ..config },
            created_at: Utc::now(),
        }
    }

    /// Copies every field into a fresh working configuration.
    pub fn apply(&self) -> ReportConfig {
        ReportConfig {
            id: Uuid::new_v4(),
            ..self.config.clone()
        }
    }
}
