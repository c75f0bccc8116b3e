pub mod bucket;
pub mod object;
pub mod version;

pub use bucket::{
    Action, BucketMetadata, BucketVersioning, CannedAcl, RequestContext, Requester,
};
pub use object::*;
pub use version::{
    CreatedVersion, DataLocation, ListingCursor, NewVersion, ObjectVersion, VersionListing,
    VersionPrecondition, md5_hex,
};
