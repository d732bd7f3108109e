use crate::RpcError;
use crate::rpc::RpcEmit;
use crate::schema::{DecodeSpec, Value};
use crate::wire::{FrameCodec, FrameStreamDecoder, MalformedFrameError, ProcedureCall, Request, Response};
use std::collections::VecDeque;

/// Resolve-once callback for one logical call.
pub type ResolveOnce = Box<dyn FnOnce(Result<Value, RpcError>) + Send>;

/// One call ready for batching: the encoded wire call, the spec that will
/// interpret its result, and the callback that resolves it.
///
/// Carrying all three in one value is the fail-fast rule of §correlation: a
/// call without a decode spec is unrepresentable.
pub struct PreparedCall {
    pub call: ProcedureCall,
    pub decode_spec: DecodeSpec,
    on_result: ResolveOnce,
}

impl PreparedCall {
    pub fn new(call: ProcedureCall, decode_spec: DecodeSpec, on_result: ResolveOnce) -> Self {
        Self {
            call,
            decode_spec,
            on_result,
        }
    }
}

struct PendingDecode {
    decode_spec: DecodeSpec,
    on_result: ResolveOnce,
}

struct EncodedBatch {
    frame: Vec<u8>,
    pending: Vec<PendingDecode>,
}

/// Request multiplexer and response correlator for one control connection.
///
/// Calls are batched into a single `Request`; their decode specs enter a
/// FIFO queue in transmission order. Results are consumed from the front of
/// that queue, one spec per result, in receipt order. Consumption order is
/// load-bearing: LIFO would misassign every batch larger than one.
///
/// One batch is outstanding at a time. Batches sent while one is in flight
/// are queued and transmitted only after the in-flight response has been
/// fully processed.
#[derive(Default)]
pub struct RpcDispatcher {
    in_flight: VecDeque<PendingDecode>,
    outbox: VecDeque<EncodedBatch>,
    frame_decoder: FrameStreamDecoder,
}

impl RpcDispatcher {
    pub fn new() -> Self {
        Self {
            in_flight: VecDeque::new(),
            outbox: VecDeque::new(),
            frame_decoder: FrameStreamDecoder::new(),
        }
    }

    /// Calls awaiting a result on the in-flight batch.
    pub fn pending_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Batches waiting for the in-flight one to resolve.
    pub fn queued_batches(&self) -> usize {
        self.outbox.len()
    }

    /// Batches one or more calls into a single request and transmits it, or
    /// queues the encoded batch if another is still outstanding.
    pub fn send<E: RpcEmit>(
        &mut self,
        calls: Vec<PreparedCall>,
        mut on_emit: E,
    ) -> Result<(), RpcError> {
        if calls.is_empty() {
            return Err(RpcError::EmptyBatch);
        }

        let mut request = Request::default();
        let mut pending = Vec::with_capacity(calls.len());
        for prepared in calls {
            request.calls.push(prepared.call);
            pending.push(PendingDecode {
                decode_spec: prepared.decode_spec,
                on_result: prepared.on_result,
            });
        }
        let frame = FrameCodec::encode(&request.encode());

        if self.in_flight.is_empty() {
            tracing::debug!(calls = pending.len(), "transmitting batch");
            self.in_flight.extend(pending);
            on_emit(&frame);
        } else {
            tracing::debug!(
                calls = pending.len(),
                queued = self.outbox.len() + 1,
                "batch queued behind in-flight request"
            );
            self.outbox.push_back(EncodedBatch { frame, pending });
        }
        Ok(())
    }

    /// Feeds raw transport bytes in. Complete response frames resolve the
    /// in-flight batch in order; once a batch fully resolves, the next
    /// queued batch is transmitted.
    ///
    /// A malformed frame rejects the entire outstanding batch and is also
    /// returned, since the connection can no longer be trusted.
    pub fn read_bytes<E: RpcEmit>(
        &mut self,
        bytes: &[u8],
        mut on_emit: E,
    ) -> Result<(), RpcError> {
        let frames = match self.frame_decoder.push_bytes(bytes) {
            Ok(frames) => frames,
            Err(e) => {
                let err = RpcError::MalformedFrame(e);
                self.fail_outstanding(&err);
                return Err(err);
            }
        };

        for payload in frames {
            self.process_response(&payload)?;
            self.transmit_next(&mut on_emit);
        }
        Ok(())
    }

    fn process_response(&mut self, payload: &[u8]) -> Result<(), RpcError> {
        let response = match Response::decode(payload) {
            Ok(response) => response,
            Err(e) => {
                let err = RpcError::MalformedFrame(e);
                self.fail_outstanding(&err);
                return Err(err);
            }
        };

        if response.results.len() != self.in_flight.len() {
            let err = RpcError::MalformedFrame(MalformedFrameError::ResultCountMismatch {
                expected: self.in_flight.len(),
                got: response.results.len(),
            });
            self.fail_outstanding(&err);
            return Err(err);
        }

        for result in response.results {
            // Counts were checked above, so the front entry exists.
            let pending = self
                .in_flight
                .pop_front()
                .expect("pending queue length matches result count");

            let outcome = if let Some(message) = result.error {
                // Server-reported errors are surfaced without touching the
                // value bytes.
                Err(RpcError::Procedure(message))
            } else {
                let bytes = result.value.unwrap_or_default();
                pending.decode_spec.decode(&bytes).map_err(RpcError::from)
            };
            (pending.on_result)(outcome);
        }
        Ok(())
    }

    fn transmit_next<E: RpcEmit>(&mut self, on_emit: &mut E) {
        if self.in_flight.is_empty() {
            if let Some(batch) = self.outbox.pop_front() {
                tracing::debug!(calls = batch.pending.len(), "transmitting queued batch");
                self.in_flight.extend(batch.pending);
                on_emit(&batch.frame);
            }
        }
    }

    fn fail_outstanding(&mut self, err: &RpcError) {
        let n = self.in_flight.len();
        if n > 0 {
            tracing::warn!(calls = n, error = %err, "rejecting outstanding batch");
        }
        for pending in self.in_flight.drain(..) {
            (pending.on_result)(Err(err.clone()));
        }
    }

    /// Rejects the outstanding batch and every queued batch. Used at
    /// connection teardown; afterwards the dispatcher is empty.
    pub fn fail_all(&mut self, err: RpcError) {
        self.fail_outstanding(&err);
        for batch in self.outbox.drain(..) {
            for pending in batch.pending {
                (pending.on_result)(Err(err.clone()));
            }
        }
    }
}
