//! Versioning rules: how reads resolve delete markers, what a DELETE does,
//! and which operations refuse a version id.

mod delete_preprocessing;
mod query_guard;
mod resolution;

pub use delete_preprocessing::{DeleteOptions, DeleteOutcome, preprocess_delete};
pub use query_guard::{VERSION_ID_PARAM, check_version_pin, requested_version_id};
pub use resolution::{Resolution, classify, echoed_version_id, resolve_for_read};
