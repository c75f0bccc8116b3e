use serde::Serialize;

use crate::domain::value_objects::{BucketName, ObjectKey};

/// Metering event names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricKind {
    #[serde(rename = "putObject")]
    PutObject,
    #[serde(rename = "deleteObject")]
    DeleteObject,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::PutObject => "putObject",
            MetricKind::DeleteObject => "deleteObject",
        }
    }
}

/// One metering event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricEvent {
    #[serde(rename = "action")]
    pub kind: MetricKind,
    #[serde(serialize_with = "serialize_display")]
    pub bucket: BucketName,
    #[serde(serialize_with = "serialize_display")]
    pub key: ObjectKey,
    /// Bytes written (put) or freed (delete)
    pub byte_length: u64,
    /// Bytes of a version replaced by this write
    pub old_byte_length: Option<u64>,
    pub number_of_objects: u64,
}

fn serialize_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: std::fmt::Display,
    S: serde::Serializer,
{
    serializer.collect_str(value)
}

impl MetricEvent {
    pub fn put_object(
        bucket: &BucketName,
        key: &ObjectKey,
        byte_length: u64,
        old_byte_length: Option<u64>,
    ) -> Self {
        Self {
            kind: MetricKind::PutObject,
            bucket: bucket.clone(),
            key: key.clone(),
            byte_length,
            old_byte_length,
            number_of_objects: 1,
        }
    }

    pub fn delete_object(bucket: &BucketName, key: &ObjectKey, byte_length: u64) -> Self {
        Self {
            kind: MetricKind::DeleteObject,
            bucket: bucket.clone(),
            key: key.clone(),
            byte_length,
            old_byte_length: None,
            number_of_objects: 1,
        }
    }
}

/// Fire-and-forget metering sink.
///
/// `emit` is called on the response path: implementations must not block and
/// must swallow their own failures.
pub trait MetricSink: Send + Sync + 'static {
    fn emit(&self, event: MetricEvent);
}
