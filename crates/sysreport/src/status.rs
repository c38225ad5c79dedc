//! Job statuses understood by the backend

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a job or of one of its actions.
///
/// Before an action use [`JobStatus::Started`]; after it, [`JobStatus::Success`]
/// or [`JobStatus::Failure`]. A reporter that finished all of its work sends
/// [`JobStatus::Done`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Work has begun
    Started,
    /// The action succeeded
    Success,
    /// The action failed
    Failure,
    /// The action finished with non-fatal problems
    Warning,
    /// The reporter finished
    Done,
}

impl JobStatus {
    /// Wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Warning => "warning",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "started" => Ok(Self::Started),
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "warning" => Ok(Self::Warning),
            "done" => Ok(Self::Done),
            _ => Err(format!("Unknown job status: {s}")),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}
