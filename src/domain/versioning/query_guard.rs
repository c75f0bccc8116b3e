use std::collections::HashMap;

use crate::domain::{
    errors::{INVALID_VERSION_ID, StorageError, StorageResult, VERSION_ID_NOT_ACCEPTED},
    value_objects::VersionId,
};

/// Query parameter carrying a version id
pub const VERSION_ID_PARAM: &str = "versionId";

/// Reject a request that pins a version on an operation acting only on the
/// current version. An empty `versionId=` counts as present.
pub fn check_version_pin(query: &HashMap<String, String>) -> StorageResult<()> {
    match query.get(VERSION_ID_PARAM) {
        Some(value) => Err(StorageError::invalid_argument_value(
            VERSION_ID_NOT_ACCEPTED,
            VERSION_ID_PARAM,
            value.clone(),
        )),
        None => Ok(()),
    }
}

/// Extract the version id of an operation that accepts one
pub fn requested_version_id(query: &HashMap<String, String>) -> StorageResult<Option<VersionId>> {
    let Some(raw) = query.get(VERSION_ID_PARAM) else {
        return Ok(None);
    };

    if raw.is_empty() {
        return Err(StorageError::invalid_argument_value(
            "Version id cannot be the empty string",
            VERSION_ID_PARAM,
            "",
        ));
    }

    VersionId::parse(raw)
        .map(Some)
        .map_err(|_| StorageError::invalid_argument_value(INVALID_VERSION_ID, VERSION_ID_PARAM, raw.clone()))
}
