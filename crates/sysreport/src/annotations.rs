//! Job handover annotations
//!
//! When a job crosses component boundaries (for example a workload that is
//! scanned by one service and attached by another), the first component
//! stamps a small JSON document onto the resource. The next component reads
//! it back to continue the same job and action sequence.

use serde::{Deserialize, Serialize};

/// Serialized under the `armo.job` annotation keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAnnotations {
    /// Job id the next component should report under
    #[serde(rename = "jobID", default)]
    pub current_job_id: String,

    /// Job id the next component should use as its parent
    #[serde(rename = "parentJobID", default)]
    pub parent_job_id: String,

    /// Action id the next component continues from
    #[serde(rename = "actionID", default)]
    pub last_action_id: String,
}

impl JobAnnotations {
    /// Serialize for use as an annotation value
    ///
    /// # Errors
    ///
    /// Returns a serde error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse an annotation value
    ///
    /// # Errors
    ///
    /// Returns a serde error if the value is not a job annotation document.
    pub fn from_json(value: &str) -> serde_json::Result<Self> {
        serde_json::from_str(value)
    }
}
