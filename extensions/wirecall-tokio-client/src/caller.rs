use wirecall::RpcError;
use wirecall::schema::{DecodeSpec, Value};
use wirecall::wire::ProcedureCall;

/// The one-call seam between the stream manager and whatever executes
/// control-channel round trips.
///
/// `RpcClient` is the production implementation; tests substitute mocks to
/// observe exactly which calls reach the server.
#[async_trait::async_trait]
pub trait RpcCaller: Send + Sync {
    /// Sends a single call and resolves its decoded result.
    async fn call_raw(&self, call: ProcedureCall, decode_spec: DecodeSpec)
    -> Result<Value, RpcError>;
}
