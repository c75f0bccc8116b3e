mod bucket_name;
mod object_key;
mod version_id;

pub use bucket_name::BucketName;
pub use object_key::ObjectKey;
pub use version_id::{NULL_VERSION_ID, VersionId, VersionKey, VersionKeyGenerator};
