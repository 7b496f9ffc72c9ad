pub mod balancer;
pub mod chainlink;

pub use balancer::{IComposableStablePool, IVault};
pub use chainlink::IAggregatorV3;
