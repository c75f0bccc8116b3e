pub mod metrics;
pub mod persistence;
pub mod storage;
