use bytes::Bytes;
use std::sync::Arc;
use versioned_object_store::{
    adapters::outbound::{
        metrics::RecordingMetricSink, persistence::InMemoryObjectRepository,
        storage::ApacheObjectStoreAdapter,
    },
    domain::{
        models::{
            BucketVersioning, CannedAcl, DeleteObjectRequest, GetObjectRequest,
            ListVersionsRequest, PutObjectRequest, RequestContext,
        },
        value_objects::{BucketName, ObjectKey, VersionId, VersionKeyGenerator},
    },
    ports::{
        metrics::MetricKind,
        services::{BucketService, ObjectService},
    },
    services::{BucketServiceImpl, ObjectServiceBuilder, ObjectServiceImpl},
};

const OWNER: &str = "AKIDOWNER";

struct Harness {
    buckets: BucketServiceImpl,
    objects: ObjectServiceImpl,
    metrics: RecordingMetricSink,
    owner: RequestContext,
}

impl Harness {
    fn new() -> Self {
        let repository = Arc::new(InMemoryObjectRepository::new());
        let metrics = RecordingMetricSink::new();
        let objects = ObjectServiceBuilder::new()
            .repository(repository.clone())
            .store(Arc::new(ApacheObjectStoreAdapter::in_memory()))
            .metrics(Arc::new(metrics.clone()))
            .build()
            .unwrap();

        Self {
            buckets: BucketServiceImpl::new(repository),
            objects,
            metrics,
            owner: RequestContext::account(OWNER),
        }
    }

    async fn bucket(&self, name: &str, versioning: BucketVersioning) -> BucketName {
        self.bucket_with_acl(name, versioning, CannedAcl::Private).await
    }

    async fn bucket_with_acl(
        &self,
        name: &str,
        versioning: BucketVersioning,
        acl: CannedAcl,
    ) -> BucketName {
        let bucket = BucketName::try_from(name).unwrap();
        self.buckets
            .create_bucket(&self.owner, bucket.clone(), acl)
            .await
            .unwrap();
        if versioning.is_configured() {
            self.buckets
                .put_bucket_versioning(&self.owner, &bucket, versioning)
                .await
                .unwrap();
        }
        bucket
    }

    async fn put(&self, bucket: &BucketName, key: &str, data: &'static str) -> Option<VersionId> {
        self.objects
            .put_object(
                &self.owner,
                PutObjectRequest::builder()
                    .bucket(bucket.clone())
                    .key(key_of(key))
                    .data(Bytes::from_static(data.as_bytes()))
                    .content_type("text/plain".to_string())
                    .build(),
            )
            .await
            .unwrap()
            .version_id
    }

    fn get_request(bucket: &BucketName, key: &str, version_id: Option<VersionId>) -> GetObjectRequest {
        GetObjectRequest::builder()
            .bucket(bucket.clone())
            .key(key_of(key))
            .maybe_version_id(version_id)
            .build()
    }

    fn delete_request(
        bucket: &BucketName,
        key: &str,
        version_id: Option<VersionId>,
    ) -> DeleteObjectRequest {
        DeleteObjectRequest::builder()
            .bucket(bucket.clone())
            .key(key_of(key))
            .maybe_version_id(version_id)
            .build()
    }

    async fn version_ids(&self, bucket: &BucketName) -> Vec<(VersionId, bool)> {
        self.objects
            .list_object_versions(
                &self.owner,
                ListVersionsRequest::builder().bucket(bucket.clone()).build(),
            )
            .await
            .unwrap()
            .into_iter()
            .map(|listing| (listing.version.version_id, listing.version.is_delete_marker))
            .collect()
    }
}

fn key_of(key: &str) -> ObjectKey {
    ObjectKey::try_from(key).unwrap()
}

#[tokio::test]
async fn test_delete_of_absent_version_is_a_silent_no_op() {
    let h = Harness::new();
    let bucket = h.bucket("skip-bucket", BucketVersioning::Enabled).await;
    h.put(&bucket, "doc.txt", "content").await;
    h.metrics.clear();

    let unknown = VersionKeyGenerator::new(42).next_version_id();
    let output = h
        .objects
        .delete_object(&h.owner, Harness::delete_request(&bucket, "doc.txt", Some(unknown)))
        .await
        .unwrap();

    assert!(!output.delete_marker);
    assert!(output.version_id.is_none());
    assert!(h.metrics.events().is_empty());
    assert_eq!(h.version_ids(&bucket).await.len(), 1);
}

#[tokio::test]
async fn test_delete_of_never_created_object_creates_marker() {
    let h = Harness::new();
    let bucket = h.bucket("ghost-bucket", BucketVersioning::Enabled).await;

    let output = h
        .objects
        .delete_object(&h.owner, Harness::delete_request(&bucket, "ghost.txt", None))
        .await
        .unwrap();

    assert!(output.delete_marker);
    let marker_id = output.version_id.unwrap();
    assert!(!marker_id.is_null());
    assert_eq!(h.version_ids(&bucket).await, vec![(marker_id, true)]);

    let events = h.metrics.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, MetricKind::PutObject);
    assert_eq!(events[0].byte_length, 0);
    assert_eq!(events[0].number_of_objects, 1);
}

#[tokio::test]
async fn test_delete_marker_read_explicitly_vs_implicitly() {
    let h = Harness::new();
    let bucket = h.bucket("marker-bucket", BucketVersioning::Enabled).await;
    let original = h.put(&bucket, "doc.txt", "content").await.unwrap();

    let marker = h
        .objects
        .delete_object(&h.owner, Harness::delete_request(&bucket, "doc.txt", None))
        .await
        .unwrap()
        .version_id
        .unwrap();

    let explicit = h
        .objects
        .get_object(&h.owner, Harness::get_request(&bucket, "doc.txt", Some(marker)))
        .await
        .unwrap_err();
    assert_eq!(explicit.code(), "MethodNotAllowed");
    assert_eq!(explicit.status_code(), 405);

    let implicit = h
        .objects
        .get_object(&h.owner, Harness::get_request(&bucket, "doc.txt", None))
        .await
        .unwrap_err();
    assert_eq!(implicit.code(), "NoSuchKey");
    assert_eq!(implicit.status_code(), 404);

    let head = h
        .objects
        .head_object(&h.owner, Harness::get_request(&bucket, "doc.txt", None))
        .await
        .unwrap_err();
    assert_eq!(head.code(), "NoSuchKey");

    // the version under the marker is still readable by id
    let older = h
        .objects
        .get_object(&h.owner, Harness::get_request(&bucket, "doc.txt", Some(original)))
        .await
        .unwrap();
    assert_eq!(older.data, Bytes::from_static(b"content"));
}

#[tokio::test]
async fn test_explicit_version_read_echoes_requested_id() {
    let h = Harness::new();
    let bucket = h.bucket("echo-bucket", BucketVersioning::Enabled).await;
    let first = h.put(&bucket, "doc.txt", "first").await.unwrap();
    let second = h.put(&bucket, "doc.txt", "second").await.unwrap();

    let token = first.to_string();
    let requested = VersionId::parse(&token).unwrap();
    let output = h
        .objects
        .get_object(&h.owner, Harness::get_request(&bucket, "doc.txt", Some(requested)))
        .await
        .unwrap();

    assert_eq!(output.data, Bytes::from_static(b"first"));
    assert_eq!(output.head.version_id.unwrap().to_string(), token);

    let current = h
        .objects
        .get_object(&h.owner, Harness::get_request(&bucket, "doc.txt", None))
        .await
        .unwrap();
    assert_eq!(current.data, Bytes::from_static(b"second"));
    assert_eq!(current.head.version_id, Some(second));
    assert_eq!(current.head.content_type.as_deref(), Some("text/plain"));
    assert_eq!(current.head.content_length, 6);
}

#[tokio::test]
async fn test_missing_explicit_version_is_no_such_key() {
    let h = Harness::new();
    let bucket = h.bucket("missing-bucket", BucketVersioning::Enabled).await;
    h.put(&bucket, "doc.txt", "content").await;

    let unknown = VersionKeyGenerator::new(7).next_version_id();
    let err = h
        .objects
        .get_object(&h.owner, Harness::get_request(&bucket, "doc.txt", Some(unknown)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NoSuchKey");
}

#[tokio::test]
async fn test_removing_delete_marker_restores_object() {
    let h = Harness::new();
    let bucket = h.bucket("restore-bucket", BucketVersioning::Enabled).await;
    h.put(&bucket, "doc.txt", "content").await;

    let marker = h
        .objects
        .delete_object(&h.owner, Harness::delete_request(&bucket, "doc.txt", None))
        .await
        .unwrap()
        .version_id
        .unwrap();
    h.metrics.clear();

    let output = h
        .objects
        .delete_object(&h.owner, Harness::delete_request(&bucket, "doc.txt", Some(marker)))
        .await
        .unwrap();
    assert!(output.delete_marker);
    assert_eq!(output.version_id, Some(marker));

    let events = h.metrics.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, MetricKind::DeleteObject);
    assert_eq!(events[0].byte_length, 0);

    let current = h
        .objects
        .get_object(&h.owner, Harness::get_request(&bucket, "doc.txt", None))
        .await
        .unwrap();
    assert_eq!(current.data, Bytes::from_static(b"content"));
}

#[tokio::test]
async fn test_permanent_version_delete_reports_freed_bytes() {
    let h = Harness::new();
    let bucket = h.bucket("purge-bucket", BucketVersioning::Enabled).await;
    let first = h.put(&bucket, "doc.txt", "12345").await.unwrap();
    let second = h.put(&bucket, "doc.txt", "abc").await.unwrap();
    h.metrics.clear();

    let output = h
        .objects
        .delete_object(&h.owner, Harness::delete_request(&bucket, "doc.txt", Some(first)))
        .await
        .unwrap();
    assert!(!output.delete_marker);
    assert_eq!(output.version_id, Some(first));

    let events = h.metrics.events();
    assert_eq!(events[0].kind, MetricKind::DeleteObject);
    assert_eq!(events[0].byte_length, 5);
    assert_eq!(h.version_ids(&bucket).await, vec![(second, false)]);
}

#[tokio::test]
async fn test_unversioned_bucket_delete() {
    let h = Harness::new();
    let bucket = h.bucket("plain-bucket", BucketVersioning::Disabled).await;

    let err = h
        .objects
        .delete_object(&h.owner, Harness::delete_request(&bucket, "doc.txt", None))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NoSuchKey");

    assert_eq!(h.put(&bucket, "doc.txt", "content").await, None);
    let output = h
        .objects
        .delete_object(&h.owner, Harness::delete_request(&bucket, "doc.txt", None))
        .await
        .unwrap();
    assert!(!output.delete_marker);
    assert_eq!(output.version_id, None);
    assert!(h.version_ids(&bucket).await.is_empty());

    let last = h.metrics.events().pop().unwrap();
    assert_eq!(last.kind, MetricKind::DeleteObject);
    assert_eq!(last.byte_length, 7);
}

#[tokio::test]
async fn test_unversioned_overwrite_replaces_null_version() {
    let h = Harness::new();
    let bucket = h.bucket("overwrite-bucket", BucketVersioning::Disabled).await;
    h.put(&bucket, "doc.txt", "first").await;
    h.put(&bucket, "doc.txt", "second!").await;

    assert_eq!(h.version_ids(&bucket).await, vec![(VersionId::Null, false)]);

    let events = h.metrics.events();
    assert_eq!(events[1].byte_length, 7);
    assert_eq!(events[1].old_byte_length, Some(5));

    let head = h
        .objects
        .head_object(&h.owner, Harness::get_request(&bucket, "doc.txt", None))
        .await
        .unwrap();
    assert_eq!(head.version_id, None);
    assert_eq!(head.content_length, 7);
}

#[tokio::test]
async fn test_suspended_bucket_writes_null_versions() {
    let h = Harness::new();
    let bucket = h.bucket("suspended-bucket", BucketVersioning::Enabled).await;
    let kept = h.put(&bucket, "doc.txt", "kept").await.unwrap();

    h.buckets
        .put_bucket_versioning(&h.owner, &bucket, BucketVersioning::Suspended)
        .await
        .unwrap();

    assert_eq!(h.put(&bucket, "doc.txt", "null one").await, Some(VersionId::Null));
    assert_eq!(h.put(&bucket, "doc.txt", "null two").await, Some(VersionId::Null));
    assert_eq!(
        h.version_ids(&bucket).await,
        vec![(VersionId::Null, false), (kept, false)]
    );

    // an implicit delete puts a null marker in place of the null version
    let output = h
        .objects
        .delete_object(&h.owner, Harness::delete_request(&bucket, "doc.txt", None))
        .await
        .unwrap();
    assert!(output.delete_marker);
    assert_eq!(output.version_id, Some(VersionId::Null));
    assert_eq!(
        h.version_ids(&bucket).await,
        vec![(VersionId::Null, true), (kept, false)]
    );

    let explicit = h
        .objects
        .get_object(&h.owner, Harness::get_request(&bucket, "doc.txt", Some(VersionId::Null)))
        .await
        .unwrap_err();
    assert_eq!(explicit.code(), "MethodNotAllowed");
}

#[tokio::test]
async fn test_anonymous_requests_are_checked_against_acl() {
    let h = Harness::new();
    let private = h.bucket("private-bucket", BucketVersioning::Enabled).await;
    let public = h
        .bucket_with_acl("public-bucket", BucketVersioning::Enabled, CannedAcl::PublicReadWrite)
        .await;
    let anonymous = RequestContext::anonymous();

    let err = h
        .objects
        .delete_object(&anonymous, Harness::delete_request(&private, "doc.txt", None))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "AccessDenied");
    assert_eq!(err.status_code(), 403);
    assert!(h.version_ids(&private).await.is_empty());

    let output = h
        .objects
        .delete_object(&anonymous, Harness::delete_request(&public, "doc.txt", None))
        .await
        .unwrap();
    assert!(output.delete_marker);

    let err = h
        .buckets
        .put_bucket_versioning(&anonymous, &public, BucketVersioning::Suspended)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "AccessDenied");
}

#[tokio::test]
async fn test_bucket_management_rules() {
    let h = Harness::new();
    let bucket = BucketName::try_from("managed-bucket").unwrap();

    let err = h
        .buckets
        .create_bucket(&RequestContext::anonymous(), bucket.clone(), CannedAcl::Private)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "AccessDenied");

    h.buckets
        .create_bucket(&h.owner, bucket.clone(), CannedAcl::Private)
        .await
        .unwrap();
    let err = h
        .buckets
        .create_bucket(&h.owner, bucket.clone(), CannedAcl::Private)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BucketAlreadyExists");

    let err = h
        .buckets
        .put_bucket_versioning(&h.owner, &bucket, BucketVersioning::Disabled)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "MalformedXML");

    let missing = BucketName::try_from("missing-bucket").unwrap();
    let err = h
        .buckets
        .get_bucket_versioning(&h.owner, &missing)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NoSuchBucket");
}

#[tokio::test]
async fn test_concurrent_puts_get_distinct_ordered_versions() {
    let h = Arc::new(Harness::new());
    let bucket = h.bucket("busy-bucket", BucketVersioning::Enabled).await;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let h = h.clone();
            let bucket = bucket.clone();
            tokio::spawn(async move { h.put(&bucket, "hot.txt", "payload").await.unwrap() })
        })
        .collect();
    let created: Vec<VersionId> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let listed = h.version_ids(&bucket).await;
    assert_eq!(listed.len(), 10);
    for id in &created {
        assert!(listed.iter().any(|(listed_id, _)| listed_id == id));
    }

    // newest first
    let keys: Vec<_> = listed
        .iter()
        .map(|(id, _)| match id {
            VersionId::Key(key) => *key,
            VersionId::Null => panic!("unexpected null version"),
        })
        .collect();
    assert!(keys.windows(2).all(|pair| pair[0] > pair[1]));
}

#[tokio::test]
async fn test_version_marker_requires_key_marker() {
    let h = Harness::new();
    let bucket = h.bucket("marker-rules", BucketVersioning::Enabled).await;
    let id = h.put(&bucket, "doc.txt", "content").await.unwrap();

    let err = h
        .objects
        .list_object_versions(
            &h.owner,
            ListVersionsRequest::builder()
                .bucket(bucket.clone())
                .version_id_marker(id)
                .build(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "InvalidArgument");

    let page = h
        .objects
        .list_object_versions(
            &h.owner,
            ListVersionsRequest::builder()
                .bucket(bucket)
                .key_marker(key_of("doc.txt"))
                .version_id_marker(id)
                .build(),
        )
        .await
        .unwrap();
    assert!(page.is_empty());
}
