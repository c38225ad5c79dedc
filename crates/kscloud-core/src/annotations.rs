//! Annotation keys stamped onto workloads.
//!
//! A component that hands a job over to another one writes the serialized
//! job annotation under [`JOB`] and the per-field keys below so the next
//! component can continue the action sequence.

/// Job annotation root
pub const JOB: &str = "armo.job";
/// Current job id
pub const JOB_ID_PATH: &str = "armo.job/id";
/// Parent job id
pub const JOB_PARENT_PATH: &str = "armo.job/parent";
/// Next action id
pub const JOB_ACTION_PATH: &str = "armo.job/action";
