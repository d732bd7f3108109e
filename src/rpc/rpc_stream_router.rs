use crate::RpcError;
use crate::schema::{DecodeSpec, Value};
use crate::wire::{MalformedFrameError, StreamFrame};
use std::collections::HashMap;

/// One named server-push subscription.
#[derive(Debug)]
pub struct StreamRegistration {
    pub name: String,
    /// Assigned by the server once the add-stream round trip completes.
    pub stream_id: Option<u64>,
    pub decode_spec: DecodeSpec,
    pub last_value: Option<Value>,
}

/// The outcome of routing one push update to its registration.
#[derive(Debug)]
pub struct StreamEvent {
    pub name: String,
    pub stream_id: u64,
    pub result: Result<Value, RpcError>,
}

/// Routes asynchronous push frames to per-name decoders.
///
/// Owns the name→registration map and the id index for one stream
/// connection. Registrations persist until explicit removal or connection
/// teardown; a decode failure on one update never tears anything down.
#[derive(Debug, Default)]
pub struct StreamRouter {
    registrations: HashMap<String, StreamRegistration>,
    names_by_id: HashMap<u64, String>,
}

impl StreamRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Pre-flight registration. Rejects a duplicate name locally, before
    /// any server round trip happens.
    pub fn register(&mut self, name: &str, decode_spec: DecodeSpec) -> Result<(), RpcError> {
        if self.registrations.contains_key(name) {
            return Err(RpcError::DuplicateStreamName(name.to_string()));
        }
        self.registrations.insert(
            name.to_string(),
            StreamRegistration {
                name: name.to_string(),
                stream_id: None,
                decode_spec,
                last_value: None,
            },
        );
        Ok(())
    }

    /// Records the server-assigned identifier for a registered name.
    pub fn bind(&mut self, name: &str, stream_id: u64) -> Result<(), RpcError> {
        let registration = self
            .registrations
            .get_mut(name)
            .ok_or_else(|| RpcError::NoSuchStream(name.to_string()))?;
        registration.stream_id = Some(stream_id);
        if let Some(previous) = self.names_by_id.insert(stream_id, name.to_string()) {
            tracing::warn!(stream_id, previous = %previous, "stream id rebound to new name");
        }
        Ok(())
    }

    /// Drops every registration. Connection teardown only; individual
    /// removal goes through [`StreamRouter::unregister`].
    pub fn clear(&mut self) {
        self.registrations.clear();
        self.names_by_id.clear();
    }

    /// Drops a registration and returns it (the caller still needs the
    /// stream id for the removal request). Unknown names return `None`.
    pub fn unregister(&mut self, name: &str) -> Option<StreamRegistration> {
        let registration = self.registrations.remove(name)?;
        if let Some(id) = registration.stream_id {
            self.names_by_id.remove(&id);
        }
        Some(registration)
    }

    pub fn registration(&self, name: &str) -> Option<&StreamRegistration> {
        self.registrations.get(name)
    }

    /// Most recent successfully decoded value for a name.
    pub fn last_value(&self, name: &str) -> Option<&Value> {
        self.registrations.get(name)?.last_value.as_ref()
    }

    /// Decodes one push frame and routes each update to its registration.
    ///
    /// Per-update failures are isolated: a bad update yields an errored
    /// event for that name and the rest of the frame still routes. Updates
    /// for unknown ids are dropped (removal races with in-flight pushes).
    pub fn route_frame(&mut self, payload: &[u8]) -> Result<Vec<StreamEvent>, MalformedFrameError> {
        let frame = StreamFrame::decode(payload)?;
        let mut events = Vec::with_capacity(frame.updates.len());

        for update in frame.updates {
            let Some(name) = self.names_by_id.get(&update.stream_id).cloned() else {
                tracing::debug!(stream_id = update.stream_id, "update for unknown stream id");
                continue;
            };
            let Some(registration) = self.registrations.get_mut(&name) else {
                // Both maps are updated together; a dangling index entry
                // means the registration raced away mid-frame.
                self.names_by_id.remove(&update.stream_id);
                continue;
            };

            let result = if let Some(message) = update.result.error {
                Err(RpcError::Procedure(message))
            } else {
                let bytes = update.result.value.unwrap_or_default();
                match registration.decode_spec.decode(&bytes) {
                    Ok(value) => {
                        registration.last_value = Some(value.clone());
                        Ok(value)
                    }
                    Err(e) => {
                        tracing::warn!(name = %name, error = %e, "stream update failed to decode");
                        Err(RpcError::DecodeMismatch(e))
                    }
                }
            };

            events.push(StreamEvent {
                name,
                stream_id: update.stream_id,
                result,
            });
        }
        Ok(events)
    }
}
