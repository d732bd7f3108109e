use crate::caller::RpcCaller;
use crate::rpc_client::handshake;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::watch;
use wirecall::RpcError;
use wirecall::constants::{CORE_ADD_STREAM, CORE_REMOVE_STREAM, CORE_SERVICE};
use wirecall::rpc::{CallBuilder, StreamRouter, core_bindings};
use wirecall::schema::{DecodeSpec, Value};
use wirecall::wire::{ConnectionKind, FrameStreamDecoder, ProcedureCall};

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Handle to one named stream. Dropping the handle does not unsubscribe;
/// call [`StreamClient::remove_stream`] for that.
#[derive(Debug, Clone)]
pub struct StreamHandle {
    name: String,
    stream_id: u64,
    rx: watch::Receiver<Option<Value>>,
}

impl StreamHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    /// Most recent value, if any update has arrived yet.
    pub fn latest(&self) -> Option<Value> {
        self.rx.borrow().clone()
    }

    /// Waits for the next successfully decoded update.
    pub async fn next(&mut self) -> Result<Value, RpcError> {
        loop {
            self.rx
                .changed()
                .await
                .map_err(|_| RpcError::Transport("stream connection closed".to_string()))?;
            if let Some(value) = self.rx.borrow_and_update().clone() {
                return Ok(value);
            }
        }
    }
}

/// Stream-channel client: registers calls as named, continuously updated
/// values and routes server pushes to per-name watch channels.
///
/// Registration round trips travel over the control channel through the
/// [`RpcCaller`] seam; the dedicated stream connection only ever receives.
pub struct StreamClient<C: RpcCaller> {
    caller: Arc<C>,
    router: Arc<Mutex<StreamRouter>>,
    watchers: Arc<Mutex<HashMap<String, watch::Sender<Option<Value>>>>>,
}

impl<C: RpcCaller> Clone for StreamClient<C> {
    fn clone(&self) -> Self {
        Self {
            caller: self.caller.clone(),
            router: self.router.clone(),
            watchers: self.watchers.clone(),
        }
    }
}

impl<C: RpcCaller> StreamClient<C> {
    /// Connects the dedicated stream channel, authenticating with the
    /// control channel's client identifier.
    pub async fn connect(
        address: &str,
        caller: Arc<C>,
        client_id: &[u8],
    ) -> Result<StreamClient<C>, RpcError> {
        let stream = TcpStream::connect(address).await?;
        Self::from_stream(stream, caller, client_id).await
    }

    /// Performs the stream handshake on an established connection and
    /// spawns the routing task.
    pub async fn from_stream<S>(
        mut stream: S,
        caller: Arc<C>,
        client_id: &[u8],
    ) -> Result<StreamClient<C>, RpcError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        handshake(&mut stream, ConnectionKind::Stream, client_id).await?;

        let router = Arc::new(Mutex::new(StreamRouter::new()));
        let watchers: Arc<Mutex<HashMap<String, watch::Sender<Option<Value>>>>> =
            Arc::new(Mutex::new(HashMap::new()));

        // Routing task. Independent of control-channel processing: updates
        // are decoded and published as they arrive.
        let router_handle = router.clone();
        let watchers_handle = watchers.clone();
        tokio::spawn(async move {
            let mut decoder = FrameStreamDecoder::new();
            let mut buf = vec![0u8; READ_BUFFER_SIZE];
            loop {
                let n = match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                let frames = match decoder.push_bytes(&buf[..n]) {
                    Ok(frames) => frames,
                    Err(e) => {
                        tracing::error!(error = %e, "stream framing lost, closing channel");
                        break;
                    }
                };
                for payload in frames {
                    let events = match router_handle.lock().unwrap().route_frame(&payload) {
                        Ok(events) => events,
                        Err(e) => {
                            // One bad frame does not tear the channel down.
                            tracing::warn!(error = %e, "dropping malformed stream frame");
                            continue;
                        }
                    };
                    let watchers = watchers_handle.lock().unwrap();
                    for event in events {
                        match event.result {
                            Ok(value) => {
                                if let Some(sender) = watchers.get(&event.name) {
                                    sender.send_replace(Some(value));
                                }
                            }
                            // Decode failures are isolated per update; the
                            // subscription and its last value stay intact.
                            Err(e) => {
                                tracing::warn!(name = %event.name, error = %e, "stream update rejected")
                            }
                        }
                    }
                }
            }
            // Connection teardown drops every registration.
            router_handle.lock().unwrap().clear();
            watchers_handle.lock().unwrap().clear();
        });

        Ok(StreamClient {
            caller,
            router,
            watchers,
        })
    }

    /// Registers `call` as a continuously updated value under `name`.
    ///
    /// A duplicate name fails locally, before any server round trip. A
    /// failed round trip rolls the local registration back.
    pub async fn add_stream(
        &self,
        name: &str,
        call: ProcedureCall,
        decode_spec: DecodeSpec,
    ) -> Result<StreamHandle, RpcError> {
        self.router.lock().unwrap().register(name, decode_spec)?;

        let binding = core_bindings()
            .procedure(CORE_SERVICE, CORE_ADD_STREAM)
            .expect("built-in core bindings");
        let add_call = CallBuilder::new(CORE_SERVICE, CORE_ADD_STREAM)
            .raw_argument(call.encode())
            .build();

        let stream_id = match self
            .caller
            .call_raw(add_call, binding.return_spec.clone())
            .await
        {
            Ok(value) => match value.as_u64() {
                Some(id) => id,
                None => {
                    self.router.lock().unwrap().unregister(name);
                    return Err(RpcError::Transport(format!(
                        "stream id decoded as {}, expected uInt64",
                        value.kind_name()
                    )));
                }
            },
            Err(e) => {
                self.router.lock().unwrap().unregister(name);
                return Err(e);
            }
        };

        self.router.lock().unwrap().bind(name, stream_id)?;
        let (sender, receiver) = watch::channel(None);
        self.watchers
            .lock()
            .unwrap()
            .insert(name.to_string(), sender);

        tracing::debug!(name, stream_id, "stream registered");
        Ok(StreamHandle {
            name: name.to_string(),
            stream_id,
            rx: receiver,
        })
    }

    /// Unsubscribes `name` and drops the local registration. Removing an
    /// unknown name reports [`RpcError::NoSuchStream`].
    pub async fn remove_stream(&self, name: &str) -> Result<(), RpcError> {
        let registration = self
            .router
            .lock()
            .unwrap()
            .unregister(name)
            .ok_or_else(|| RpcError::NoSuchStream(name.to_string()))?;
        self.watchers.lock().unwrap().remove(name);

        if let Some(stream_id) = registration.stream_id {
            let binding = core_bindings()
                .procedure(CORE_SERVICE, CORE_REMOVE_STREAM)
                .expect("built-in core bindings");
            let remove_call = binding.build_call(&[Value::UInt64(stream_id)])?;
            self.caller
                .call_raw(remove_call, binding.return_spec.clone())
                .await?;
        }
        tracing::debug!(name, "stream removed");
        Ok(())
    }

    /// Most recent successfully decoded value for `name`.
    pub fn latest(&self, name: &str) -> Option<Value> {
        self.router.lock().unwrap().last_value(name).cloned()
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.router.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.router.lock().unwrap().is_empty()
    }
}
