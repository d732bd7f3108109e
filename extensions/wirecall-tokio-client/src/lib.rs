//! Tokio TCP client for the `wirecall` protocol.
//!
//! Binds the sans-IO core to real connections: [`RpcClient`] drives the
//! control channel (batched calls, ordered correlation), [`StreamClient`]
//! drives the dedicated server-push channel and publishes updates through
//! `tokio::sync::watch`.

mod caller;
mod rpc_client;
mod stream_client;

pub use caller::RpcCaller;
pub use rpc_client::RpcClient;
pub use stream_client::{StreamClient, StreamHandle};
