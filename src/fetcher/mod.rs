mod metrics;
mod rate_limited;

pub use metrics::{project_balances, MetricFetchers};
pub use rate_limited::RateLimitedFetcher;
