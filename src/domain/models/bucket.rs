use chrono::{DateTime, Utc};

use crate::domain::{
    errors::{StorageError, StorageResult},
    value_objects::BucketName,
};

/// Versioning state of a bucket.
///
/// A bucket starts out `Disabled` and, once configured, only ever moves
/// between `Enabled` and `Suspended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketVersioning {
    #[default]
    Disabled,
    Enabled,
    Suspended,
}

impl BucketVersioning {
    /// Whether a versioning configuration was ever applied to the bucket
    pub fn is_configured(&self) -> bool {
        !matches!(self, BucketVersioning::Disabled)
    }

    /// Whether new writes get a fresh version id rather than `null`
    pub fn mints_version_ids(&self) -> bool {
        matches!(self, BucketVersioning::Enabled)
    }

    /// Value of the `Status` element, absent for a never-configured bucket
    pub fn status(&self) -> Option<&'static str> {
        match self {
            BucketVersioning::Disabled => None,
            BucketVersioning::Enabled => Some("Enabled"),
            BucketVersioning::Suspended => Some("Suspended"),
        }
    }

    /// Parse a `Status` value from a PutBucketVersioning request
    pub fn from_status(status: &str) -> Option<Self> {
        match status {
            "Enabled" => Some(BucketVersioning::Enabled),
            "Suspended" => Some(BucketVersioning::Suspended),
            _ => None,
        }
    }
}

/// Canned ACLs understood by the access check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CannedAcl {
    #[default]
    Private,
    PublicRead,
    PublicReadWrite,
}

impl CannedAcl {
    pub fn from_header(value: &str) -> Option<Self> {
        match value {
            "private" => Some(CannedAcl::Private),
            "public-read" => Some(CannedAcl::PublicRead),
            "public-read-write" => Some(CannedAcl::PublicReadWrite),
            _ => None,
        }
    }
}

/// Who is making the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    Anonymous,
    Account(String),
}

/// Per-request permission context handed to the metadata layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub requester: Requester,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self {
            requester: Requester::Anonymous,
        }
    }

    pub fn account(access_key: impl Into<String>) -> Self {
        Self {
            requester: Requester::Account(access_key.into()),
        }
    }
}

/// Operations subject to the bucket access check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    GetObject,
    PutObject,
    DeleteObject,
    ListObjectVersions,
    GetBucketVersioning,
    PutBucketVersioning,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::GetObject => "GetObject",
            Action::PutObject => "PutObject",
            Action::DeleteObject => "DeleteObject",
            Action::ListObjectVersions => "ListObjectVersions",
            Action::GetBucketVersioning => "GetBucketVersioning",
            Action::PutBucketVersioning => "PutBucketVersioning",
        }
    }
}

/// Metadata describing a bucket
#[derive(Debug, Clone, PartialEq)]
pub struct BucketMetadata {
    pub name: BucketName,
    pub owner: String,
    pub acl: CannedAcl,
    pub versioning: BucketVersioning,
    pub created_at: DateTime<Utc>,
}

impl BucketMetadata {
    pub fn new(name: BucketName, owner: impl Into<String>, acl: CannedAcl) -> Self {
        Self {
            name,
            owner: owner.into(),
            acl,
            versioning: BucketVersioning::Disabled,
            created_at: Utc::now(),
        }
    }

    /// Check whether the requester may perform `action` on this bucket
    pub fn check_access(&self, context: &RequestContext, action: Action) -> StorageResult<()> {
        let is_owner = matches!(&context.requester, Requester::Account(id) if *id == self.owner);

        let allowed = is_owner
            || match action {
                Action::GetObject | Action::ListObjectVersions => {
                    matches!(self.acl, CannedAcl::PublicRead | CannedAcl::PublicReadWrite)
                }
                Action::PutObject | Action::DeleteObject => {
                    matches!(self.acl, CannedAcl::PublicReadWrite)
                }
                // bucket configuration stays with the owner regardless of ACL
                Action::GetBucketVersioning | Action::PutBucketVersioning => false,
            };

        if allowed {
            Ok(())
        } else {
            Err(StorageError::AccessDenied {
                bucket: self.name.clone(),
                operation: action.as_str().to_string(),
            })
        }
    }
}
