//! Lock-guarded report shared between tasks.
//!
//! Every read and mutation acquires the report's single exclusive lock for
//! its duration, so two mutations never interleave. Senders hold the same
//! lock across serialization and delivery, which keeps the record
//! consistent while it is on the wire.

use crate::annotations::JobAnnotations;
use crate::report::Report;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Shared handle to one job's [`Report`]
#[derive(Debug, Clone, Default)]
pub struct SharedReport {
    inner: Arc<Mutex<Report>>,
}

/// Generate `async` setters that take the lock and delegate to [`Report`]
macro_rules! locked_setters {
    ($($(#[$meta:meta])* $name:ident($value:ident: $ty:ty);)+) => {
        $(
            $(#[$meta])*
            pub async fn $name(&self, $value: $ty) {
                self.inner.lock().await.$name($value);
            }
        )+
    };
}

/// Generate `async` getters returning owned values
macro_rules! locked_getters {
    ($($(#[$meta:meta])* $name:ident -> $ty:ty;)+) => {
        $(
            $(#[$meta])*
            pub async fn $name(&self) -> $ty {
                self.inner.lock().await.$name().into()
            }
        )+
    };
}

impl SharedReport {
    /// Wrap a report for shared use
    #[must_use]
    pub fn new(report: Report) -> Self {
        Self {
            inner: Arc::new(Mutex::new(report)),
        }
    }

    /// Acquire the exclusive lock.
    ///
    /// The guard releases the lock when dropped, on every exit path.
    pub async fn lock(&self) -> MutexGuard<'_, Report> {
        self.inner.lock().await
    }

    /// Acquire the lock only if nobody holds it
    #[must_use]
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Report>> {
        self.inner.try_lock().ok()
    }

    /// Clone the current state
    pub async fn snapshot(&self) -> Report {
        self.inner.lock().await.clone()
    }

    locked_setters! {
        /// Replace the status
        set_status(status: impl Into<String> + Send);
        /// Replace the action name
        set_action_name(action_name: impl Into<String> + Send);
        /// Replace the details
        set_details(details: impl Into<String> + Send);
        /// Replace the target
        set_target(target: impl Into<String> + Send);
        /// Replace the action id verbatim
        set_action_id(action_id: impl Into<String> + Send);
        /// Replace the job id, whatever it was before
        set_job_id(job_id: impl Into<String> + Send);
        /// Replace the parent action id
        set_parent_action(parent_action: impl Into<String> + Send);
        /// Replace the timestamp
        set_timestamp(timestamp: DateTime<Utc>);
        /// Replace the account id
        set_customer_guid(customer_guid: impl Into<String> + Send);
        /// Replace the reporter name; stored upper-cased
        set_reporter(reporter: &str);
        /// Set the sequence number and resync the action id
        set_action_id_n(action_id_n: i64);
        /// Append an error message
        add_error(message: impl Into<String> + Send);
    }

    /// Move to the next pipeline stage
    pub async fn next_action(&self) {
        self.inner.lock().await.next_action();
    }

    /// Drop every collected error
    pub async fn clear_errors(&self) {
        self.inner.lock().await.clear_errors();
    }

    locked_getters! {
        /// Account id
        customer_guid -> String;
        /// Reporting component
        reporter -> String;
        /// Scope the job applies to
        target -> String;
        /// Current status
        status -> String;
        /// Current stage description
        action_name -> String;
        /// Collected errors
        errors -> Vec<String>;
        /// Action id as sent on the wire
        action_id -> String;
        /// Backend job id
        job_id -> String;
        /// Parent action id
        parent_action -> String;
        /// Free-form details
        details -> String;
        /// Action sequence number
        action_id_n -> i64;
        /// Time of the last send attempt
        timestamp -> DateTime<Utc>;
        /// String form of the current sequence number
        next_action_id -> String;
        /// Composite identity for log correlation
        identity -> String;
    }

    /// Build the handover annotation; see [`Report::annotation_payload`]
    pub async fn annotation_payload(
        &self,
        set_parent: bool,
        set_current: bool,
    ) -> (JobAnnotations, String) {
        self.inner
            .lock()
            .await
            .annotation_payload(set_parent, set_current)
    }
}

impl From<Report> for SharedReport {
    fn from(report: Report) -> Self {
        Self::new(report)
    }
}
