//! Sans-IO client core for a batched, order-correlated binary RPC protocol.
//!
//! The crate turns symbolic procedure invocations into wire bytes, batches
//! them into single requests, and reconstructs typed values from the
//! server's ordered reply, including recursive composites (tuples, lists,
//! sets, dictionaries), enumerations, and opaque object handles. A second,
//! independent channel carries server-push updates for registered streams.
//!
//! Nothing here touches a socket: state machines consume and produce byte
//! slices through callbacks, and runtime-specific transports live in
//! extension crates (see `wirecall-tokio-client`).

pub mod codec;
pub mod constants;
mod error;
pub mod rpc;
pub mod schema;
pub mod wire;

pub use error::RpcError;
