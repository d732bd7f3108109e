mod rpc_bindings;
mod rpc_call_builder;
mod rpc_dispatcher;
mod rpc_stream_router;
mod rpc_trait;

pub use rpc_bindings::{BindingSet, ClassBindings, ProcedureBinding, core_bindings, procedure_id};
pub use rpc_call_builder::CallBuilder;
pub use rpc_dispatcher::{PreparedCall, ResolveOnce, RpcDispatcher};
pub use rpc_stream_router::{StreamEvent, StreamRegistration, StreamRouter};
pub use rpc_trait::RpcEmit;
