//! Library entrypoint: re-export modules

pub mod bus;
pub mod classifier;
pub mod config;
pub mod db;
pub mod errors;
pub mod fetch;
pub mod ingest;
pub mod ingestor;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod reactor;
