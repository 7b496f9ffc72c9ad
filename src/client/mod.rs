#[cfg(test)]
pub(crate) mod mock;
mod rpc;
mod state_client;

pub use rpc::RpcStateClient;
pub use state_client::{PoolTokens, RoundData, StateQueryClient};
