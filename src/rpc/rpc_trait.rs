/// Callback that receives fully framed bytes ready for the transport.
pub trait RpcEmit: FnMut(&[u8]) {}
impl<T: FnMut(&[u8])> RpcEmit for T {}
