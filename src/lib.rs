pub mod abis;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod source;
pub mod utils;

pub use client::{RpcStateClient, StateQueryClient};
pub use config::Settings;
pub use error::{FetchError, PipelineError, ReconcileError};
pub use fetcher::{MetricFetchers, RateLimitedFetcher};
pub use pipeline::ChainPipeline;
pub use source::CheckpointSource;
