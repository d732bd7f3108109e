use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};
use wirecall::RpcError;
use wirecall::codec::ByteWriter;
use wirecall::constants::{CORE_ADD_STREAM, CORE_REMOVE_STREAM, CORE_SERVICE};
use wirecall::rpc::CallBuilder;
use wirecall::schema::{DecodeSpec, ScalarKind, Value};
use wirecall::wire::{
    ConnectionKind, ConnectionReply, ConnectionRequest, FrameCodec, ProcedureCall,
    ProcedureResult, StreamFrame, StreamUpdate,
};
use wirecall_tokio_client::{RpcCaller, StreamClient};

// --- Test setup: mock control channel + fake stream server ---

/// Records every control-channel call and replays scripted outcomes, so
/// tests can observe exactly which round trips the stream manager makes.
struct MockCaller {
    calls: Mutex<Vec<ProcedureCall>>,
    outcomes: Mutex<VecDeque<Result<Value, RpcError>>>,
}

impl MockCaller {
    fn scripted(outcomes: Vec<Result<Value, RpcError>>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            outcomes: Mutex::new(outcomes.into()),
        })
    }

    fn recorded(&self) -> Vec<ProcedureCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RpcCaller for MockCaller {
    async fn call_raw(
        &self,
        call: ProcedureCall,
        _decode_spec: DecodeSpec,
    ) -> Result<Value, RpcError> {
        self.calls.lock().unwrap().push(call);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::None))
    }
}

async fn read_frame(stream: &mut DuplexStream) -> Vec<u8> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await.expect("frame length");
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await.expect("frame payload");
    payload
}

/// Accepts the stream handshake, checking the forwarded client id.
async fn accept_stream(stream: &mut DuplexStream, expected_client_id: &[u8]) {
    let request = ConnectionRequest::decode(&read_frame(stream).await).unwrap();
    assert_eq!(request.kind, ConnectionKind::Stream);
    assert_eq!(request.client_id, expected_client_id);
    stream
        .write_all(&FrameCodec::encode(&ConnectionReply::ok(vec![]).encode()))
        .await
        .unwrap();
}

/// Spins up a connected stream client; returns the server end for pushing.
async fn connected_client(
    caller: Arc<MockCaller>,
) -> (StreamClient<MockCaller>, DuplexStream) {
    let (client_end, mut server_end) = duplex(4096);
    let server = tokio::spawn(async move {
        accept_stream(&mut server_end, &[9; 16]).await;
        server_end
    });
    let client = StreamClient::from_stream(client_end, caller, &[9; 16])
        .await
        .unwrap();
    (client, server.await.unwrap())
}

async fn push_updates(server_end: &mut DuplexStream, updates: Vec<StreamUpdate>) {
    let frame = StreamFrame { updates };
    server_end
        .write_all(&FrameCodec::encode(&frame.encode()))
        .await
        .unwrap();
}

fn uvarint_bytes(value: u64) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.put_uvarint(value);
    w.into_bytes()
}

fn altitude_call() -> ProcedureCall {
    CallBuilder::new("orbit", "Vessel_get_Altitude").build()
}

// --- Tests ---

#[tokio::test]
async fn add_stream_registers_and_routes_updates() {
    let caller = MockCaller::scripted(vec![Ok(Value::UInt64(5))]);
    let (client, mut server_end) = connected_client(caller.clone()).await;

    let mut handle = client
        .add_stream("altitude", altitude_call(), DecodeSpec::Scalar(ScalarKind::UInt64))
        .await
        .unwrap();
    assert_eq!(handle.stream_id(), 5);
    assert_eq!(handle.latest(), None);

    // The registration round trip referenced the target call.
    let recorded = caller.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].service, CORE_SERVICE);
    assert_eq!(recorded[0].procedure, CORE_ADD_STREAM);
    assert_eq!(
        ProcedureCall::decode(&recorded[0].arguments[0].value).unwrap(),
        altitude_call()
    );

    push_updates(
        &mut server_end,
        vec![StreamUpdate {
            stream_id: 5,
            result: ProcedureResult::ok(uvarint_bytes(70_000)),
        }],
    )
    .await;

    assert_eq!(handle.next().await.unwrap(), Value::UInt64(70_000));
    assert_eq!(client.latest("altitude"), Some(Value::UInt64(70_000)));
}

#[tokio::test]
async fn duplicate_names_fail_without_a_second_round_trip() {
    let caller = MockCaller::scripted(vec![Ok(Value::UInt64(5))]);
    let (client, _server_end) = connected_client(caller.clone()).await;

    client
        .add_stream("altitude", altitude_call(), DecodeSpec::Scalar(ScalarKind::UInt64))
        .await
        .unwrap();

    let err = client
        .add_stream("altitude", altitude_call(), DecodeSpec::Scalar(ScalarKind::UInt64))
        .await
        .unwrap_err();
    assert_eq!(err, RpcError::DuplicateStreamName("altitude".to_string()));

    // Exactly one registration call reached the server.
    assert_eq!(caller.recorded().len(), 1);
    assert_eq!(client.len(), 1);
}

#[tokio::test]
async fn failed_registration_rolls_back_and_allows_retry() {
    let caller = MockCaller::scripted(vec![
        Err(RpcError::Procedure("stream quota exceeded".to_string())),
        Ok(Value::UInt64(6)),
    ]);
    let (client, _server_end) = connected_client(caller.clone()).await;

    let err = client
        .add_stream("altitude", altitude_call(), DecodeSpec::Scalar(ScalarKind::UInt64))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RpcError::Procedure("stream quota exceeded".to_string())
    );
    assert!(client.is_empty());

    // The name is free again after the rollback.
    let handle = client
        .add_stream("altitude", altitude_call(), DecodeSpec::Scalar(ScalarKind::UInt64))
        .await
        .unwrap();
    assert_eq!(handle.stream_id(), 6);
}

#[tokio::test]
async fn decode_failures_are_isolated_per_update() {
    let caller = MockCaller::scripted(vec![Ok(Value::UInt64(3))]);
    let (client, mut server_end) = connected_client(caller.clone()).await;

    let mut handle = client
        .add_stream("armed", altitude_call(), DecodeSpec::Scalar(ScalarKind::Bool))
        .await
        .unwrap();

    // First update is garbage for the bool spec, second is fine; both in
    // one frame so ordering is fixed.
    push_updates(
        &mut server_end,
        vec![
            StreamUpdate {
                stream_id: 3,
                result: ProcedureResult::ok(uvarint_bytes(9)),
            },
            StreamUpdate {
                stream_id: 3,
                result: ProcedureResult::ok(uvarint_bytes(1)),
            },
        ],
    )
    .await;

    // The bad update was dropped; the good one came through and the
    // subscription survived.
    assert_eq!(handle.next().await.unwrap(), Value::Bool(true));
    assert_eq!(client.latest("armed"), Some(Value::Bool(true)));
    assert_eq!(client.len(), 1);
}

#[tokio::test]
async fn remove_stream_unsubscribes_and_drops_the_registration() {
    let caller = MockCaller::scripted(vec![Ok(Value::UInt64(5)), Ok(Value::None)]);
    let (client, _server_end) = connected_client(caller.clone()).await;

    client
        .add_stream("altitude", altitude_call(), DecodeSpec::Scalar(ScalarKind::UInt64))
        .await
        .unwrap();
    client.remove_stream("altitude").await.unwrap();
    assert!(client.is_empty());

    let recorded = caller.recorded();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[1].procedure, CORE_REMOVE_STREAM);
    // The removal call carries the bound stream id.
    assert_eq!(recorded[1].arguments[0].value, uvarint_bytes(5));

    // Removing again is a clearly reported no-such-stream condition.
    assert_eq!(
        client.remove_stream("altitude").await.unwrap_err(),
        RpcError::NoSuchStream("altitude".to_string())
    );
}
