//! JSON result envelope for batch sync runs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::SyncStats;
use crate::error::SyncError;

/// Outcome of one batch run, serialized by the CLI and the scheduler job.
#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SyncStats>,
    pub timestamp: DateTime<Utc>,
}

impl SyncReport {
    #[must_use]
    pub fn from_result(result: &Result<SyncStats, SyncError>) -> Self {
        match result {
            Ok(stats) => Self {
                success: true,
                message: Some("sincronización completada exitosamente".to_string()),
                error: None,
                stats: Some(*stats),
                timestamp: Utc::now(),
            },
            Err(e) => Self {
                success: false,
                message: None,
                error: Some(e.to_string()),
                stats: None,
                timestamp: Utc::now(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_report_carries_stats() {
        let stats = SyncStats {
            created: 2,
            updated: 1,
            skipped: 3,
            errors: 0,
            total_processed: 6,
        };
        let report = SyncReport::from_result(&Ok(stats));
        let json = serde_json::to_value(&report).expect("serialization failed");
        assert_eq!(json["success"], true);
        assert_eq!(json["stats"]["created"], 2);
        assert_eq!(json["stats"]["total_processed"], 6);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failure_report_carries_error_message() {
        let result = Err(SyncError::UnexpectedStatus {
            status: 503,
            url: "https://example.test".to_string(),
        });
        let report = SyncReport::from_result(&result);
        let json = serde_json::to_value(&report).expect("serialization failed");
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().expect("error string").contains("503"));
        assert!(json.get("stats").is_none());
    }
}
