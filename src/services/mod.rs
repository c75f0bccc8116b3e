mod bucket_service_impl;
mod object_service_impl;

pub use bucket_service_impl::BucketServiceImpl;
pub use object_service_impl::{ObjectServiceBuilder, ObjectServiceImpl};
