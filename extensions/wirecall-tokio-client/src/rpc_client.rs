use crate::caller::RpcCaller;
use bytes::Bytes;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{
    Mutex,
    mpsc::{self, unbounded_channel},
    oneshot,
};
use wirecall::RpcError;
use wirecall::constants::{
    CLIENT_ID_SIZE, CORE_GET_SERVICES, CORE_SERVICE, MAX_FRAME_PAYLOAD_SIZE,
};
use wirecall::rpc::{PreparedCall, ProcedureBinding, RpcDispatcher, core_bindings};
use wirecall::schema::{DecodeSpec, ServiceCatalog, Value};
use wirecall::wire::{
    ConnectionKind, ConnectionReply, ConnectionRequest, FrameCodec, HandshakeStatus, ProcedureCall,
};

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Control-channel client: one TCP connection, batched calls, ordered
/// correlation.
///
/// The public API looks blocking but is resolved through oneshot channels
/// fed by the dispatcher's resolve-once callbacks. There is no built-in
/// timeout and no cancellation of an in-flight call; wrap calls in
/// `tokio::time::timeout` where deadlines matter.
#[derive(Clone)]
pub struct RpcClient {
    dispatcher: Arc<Mutex<RpcDispatcher>>,
    tx: mpsc::UnboundedSender<Bytes>,
    client_id: Vec<u8>,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Reads one length-prefixed frame. Only used during the handshake, before
/// the read loop owns the stream.
async fn read_handshake_frame<R>(reader: &mut R) -> Result<Vec<u8>, RpcError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_PAYLOAD_SIZE {
        return Err(RpcError::Transport(format!(
            "handshake frame length {} exceeds bound",
            len
        )));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

pub(crate) async fn handshake<S>(
    stream: &mut S,
    kind: ConnectionKind,
    client_id: &[u8],
) -> Result<ConnectionReply, RpcError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = ConnectionRequest {
        kind,
        client_id: client_id.to_vec(),
    };
    stream
        .write_all(&FrameCodec::encode(&request.encode()))
        .await?;

    let payload = read_handshake_frame(stream).await?;
    let reply = ConnectionReply::decode(&payload)?;
    if reply.status != HandshakeStatus::Ok {
        return Err(RpcError::ConnectionRejected(reply.message));
    }
    Ok(reply)
}

impl RpcClient {
    pub async fn connect(address: &str) -> Result<RpcClient, RpcError> {
        let stream = TcpStream::connect(address).await?;
        Self::from_stream(stream).await
    }

    /// Performs the control handshake on an established stream and spawns
    /// the reader/writer tasks.
    pub async fn from_stream<S>(mut stream: S) -> Result<RpcClient, RpcError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let reply = handshake(&mut stream, ConnectionKind::Control, &[]).await?;
        if reply.client_id.len() != CLIENT_ID_SIZE {
            return Err(RpcError::ConnectionRejected(format!(
                "server issued a {}-byte client id, expected {}",
                reply.client_id.len(),
                CLIENT_ID_SIZE
            )));
        }

        let (mut reader, mut writer) = tokio::io::split(stream);
        let (tx, mut rx) = unbounded_channel::<Bytes>();
        let dispatcher = Arc::new(Mutex::new(RpcDispatcher::new()));

        // Send loop
        tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                if writer.write_all(&chunk).await.is_err() {
                    break;
                }
            }
        });

        // Receive loop: raw bytes straight into the dispatcher, which does
        // its own frame reassembly.
        let dispatcher_handle = dispatcher.clone();
        let emit_tx = tx.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; READ_BUFFER_SIZE];
            loop {
                match reader.read(&mut buf).await {
                    Ok(0) | Err(_) => {
                        dispatcher_handle
                            .lock()
                            .await
                            .fail_all(RpcError::Transport("connection closed".to_string()));
                        break;
                    }
                    Ok(n) => {
                        let mut dispatcher = dispatcher_handle.lock().await;
                        let emit_tx = emit_tx.clone();
                        let outcome = dispatcher.read_bytes(&buf[..n], move |bytes: &[u8]| {
                            let _ = emit_tx.send(Bytes::copy_from_slice(bytes));
                        });
                        if let Err(e) = outcome {
                            // The frame stream can no longer be trusted;
                            // reject whatever is still queued and stop.
                            tracing::warn!(error = %e, "control channel failed");
                            dispatcher.fail_all(e);
                            break;
                        }
                    }
                }
            }
        });

        Ok(RpcClient {
            dispatcher,
            tx,
            client_id: reply.client_id,
        })
    }

    /// Identifier issued by the control handshake; authenticates the stream
    /// connection.
    pub fn client_id(&self) -> &[u8] {
        &self.client_id
    }

    async fn send_prepared(&self, calls: Vec<PreparedCall>) -> Result<(), RpcError> {
        let tx = self.tx.clone();
        self.dispatcher
            .lock()
            .await
            .send(calls, move |bytes: &[u8]| {
                let _ = tx.send(Bytes::copy_from_slice(bytes));
            })
    }

    /// Sends a batch as one request. The returned vector holds one outcome
    /// per call, in call order, even when some results carry server errors.
    pub async fn call_batch(
        &self,
        calls: Vec<(ProcedureCall, DecodeSpec)>,
    ) -> Result<Vec<Result<Value, RpcError>>, RpcError> {
        let mut receivers = Vec::with_capacity(calls.len());
        let mut prepared = Vec::with_capacity(calls.len());
        for (call, decode_spec) in calls {
            let (done_tx, done_rx) = oneshot::channel();
            receivers.push(done_rx);
            prepared.push(PreparedCall::new(
                call,
                decode_spec,
                Box::new(move |outcome| {
                    let _ = done_tx.send(outcome);
                }),
            ));
        }
        self.send_prepared(prepared).await?;

        let outcomes = futures::future::join_all(receivers).await;
        Ok(outcomes
            .into_iter()
            .map(|received| {
                received.unwrap_or_else(|_| {
                    Err(RpcError::Transport(
                        "client dropped before the response arrived".to_string(),
                    ))
                })
            })
            .collect())
    }

    /// Convenience over a compiled binding: encodes `args`, sends a
    /// single-call batch, decodes the result.
    pub async fn call(
        &self,
        binding: &ProcedureBinding,
        args: &[Value],
    ) -> Result<Value, RpcError> {
        self.call_raw(binding.build_call(args)?, binding.return_spec.clone())
            .await
    }

    /// Fetches and parses the server's service catalog.
    pub async fn fetch_services(&self) -> Result<ServiceCatalog, RpcError> {
        let binding = core_bindings()
            .procedure(CORE_SERVICE, CORE_GET_SERVICES)
            .expect("built-in core bindings");
        match self.call(binding, &[]).await? {
            Value::Bytes(blob) => Ok(ServiceCatalog::decode(&blob)?),
            other => Err(RpcError::Transport(format!(
                "catalog result decoded as {}, expected bytes",
                other.kind_name()
            ))),
        }
    }
}

#[async_trait::async_trait]
impl RpcCaller for RpcClient {
    async fn call_raw(
        &self,
        call: ProcedureCall,
        decode_spec: DecodeSpec,
    ) -> Result<Value, RpcError> {
        let (done_tx, done_rx) = oneshot::channel();
        let prepared = PreparedCall::new(
            call,
            decode_spec,
            Box::new(move |outcome| {
                let _ = done_tx.send(outcome);
            }),
        );
        self.send_prepared(vec![prepared]).await?;

        done_rx.await.unwrap_or_else(|_| {
            Err(RpcError::Transport(
                "client dropped before the response arrived".to_string(),
            ))
        })
    }
}
