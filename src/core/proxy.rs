//! External channel bridge.
//!
//! An [`EventChannelProxy`] accumulates per-connection channel
//! registrations into an ordered index map while unpublished, then
//! freezes the map at `publish()` and forwards every subsequent spike
//! to the out-of-process transport. The index map is append-only while
//! unpublished and strictly immutable once published.

use super::error::{KernelError, KernelResult};
use super::events::{EventKind, SpikeEvent};
use super::nodes::traits::Node;
use super::status::{self, StatusMap, StatusValue};
use super::types::{NodeId, Port, ThreadId, Time};
use log::info;
use std::any::Any;
use std::sync::{Arc, Mutex};

/// Out-of-process transport collaborator.
///
/// The kernel hands it the finalized `(name, width, index map)` tuple
/// exactly once at publish time, then `(channel, timestamp)` pairs for
/// every forwarded event. Byte-level framing is its concern, not ours.
pub trait ChannelTransport: Send {
    fn publish(&mut self, port_name: &str, width: u32, index_map: &[Port]) -> KernelResult<()>;

    fn forward(&mut self, channel: Port, time_ms: f64) -> KernelResult<()>;
}

/// Bridge from local event producers to one externally addressed
/// output channel.
pub struct EventChannelProxy {
    id: NodeId,
    thread: ThreadId,
    port_name: String,
    width: u32,
    published: bool,
    /// Registration-order map from local connection index to channel.
    index_map: Vec<Port>,
    transport: Box<dyn ChannelTransport>,
}

impl std::fmt::Debug for EventChannelProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannelProxy")
            .field("id", &self.id)
            .field("thread", &self.thread)
            .field("port_name", &self.port_name)
            .field("width", &self.width)
            .field("published", &self.published)
            .field("index_map", &self.index_map)
            .finish_non_exhaustive()
    }
}

impl EventChannelProxy {
    pub fn new(port_name: &str, width: u32, transport: Box<dyn ChannelTransport>) -> Self {
        Self {
            id: NodeId::new(0),
            thread: ThreadId::new(0),
            port_name: port_name.to_string(),
            width,
            published: false,
            index_map: Vec::new(),
            transport,
        }
    }

    /// Register a connection on `channel`, recording it in call order.
    ///
    /// The assigned port is a pure echo of the requested channel; the
    /// recorded order is what routes events after publication. Fails
    /// with `AlreadyPublished` once the channel is frozen, leaving the
    /// index map untouched.
    pub fn connect(&mut self, kind: EventKind, channel: Port) -> KernelResult<Port> {
        if self.published {
            return Err(KernelError::AlreadyPublished {
                port_name: self.port_name.clone(),
            });
        }
        if kind != EventKind::Spike {
            return Err(KernelError::UnsupportedEventKind {
                node: self.id,
                kind,
                receptor: channel,
            });
        }
        if channel >= self.width {
            return Err(KernelError::ChannelWidthExceeded {
                channel,
                width: self.width,
            });
        }
        self.index_map.push(channel);
        Ok(channel)
    }

    /// One-way transition to the published state.
    ///
    /// Freezes the index map and hands the finalized contract to the
    /// transport. A second call fails with `AlreadyPublished`.
    pub fn publish(&mut self) -> KernelResult<()> {
        if self.published {
            return Err(KernelError::AlreadyPublished {
                port_name: self.port_name.clone(),
            });
        }
        self.transport
            .publish(&self.port_name, self.width, &self.index_map)?;
        self.published = true;
        info!(
            "published channel '{}' (width {}, {} registrations)",
            self.port_name,
            self.width,
            self.index_map.len()
        );
        Ok(())
    }

    pub fn is_published(&self) -> bool {
        self.published
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn index_map(&self) -> &[Port] {
        &self.index_map
    }

    /// Number of connections registered so far; the most recent one's
    /// registration index is `registration_count() - 1`.
    pub fn registration_count(&self) -> usize {
        self.index_map.len()
    }
}

impl Node for EventChannelProxy {
    fn id(&self) -> NodeId {
        self.id
    }

    fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    fn thread(&self) -> ThreadId {
        self.thread
    }

    fn set_thread(&mut self, thread: ThreadId) {
        self.thread = thread;
    }

    fn model_name(&self) -> &'static str {
        "event_channel_proxy"
    }

    /// Setup-time negotiation doubles as channel registration, so the
    /// requested receptor is the requested channel.
    fn handles_test_event(&mut self, kind: EventKind, receptor: Port) -> KernelResult<Port> {
        self.connect(kind, receptor)
    }

    /// Forward a delivered spike to the external transport. `receptor`
    /// is the sender's registration index in the frozen map.
    fn handle_spike(
        &mut self,
        _event: &SpikeEvent,
        receptor: Port,
        time: Time,
    ) -> KernelResult<()> {
        if !self.published {
            return Err(KernelError::NotPublished {
                port_name: self.port_name.clone(),
            });
        }
        let channel = *self.index_map.get(receptor as usize).ok_or(
            KernelError::UnknownChannelIndex {
                index: receptor,
                registered: self.index_map.len(),
            },
        )?;
        self.transport.forward(channel, time.to_ms())
    }

    fn get_status(&self) -> StatusMap {
        let mut map = StatusMap::new();
        map.insert(
            "port_name".to_string(),
            StatusValue::from(self.port_name.as_str()),
        );
        map.insert(
            "port_width".to_string(),
            StatusValue::Int(i64::from(self.width)),
        );
        map.insert("published".to_string(), StatusValue::Bool(self.published));
        map
    }

    fn set_status(&mut self, status: &StatusMap) -> KernelResult<()> {
        // `published` is runtime state, not settable
        status::ensure_known_keys(status, &["port_name", "port_width"])?;
        if self.published && !status.is_empty() {
            return Err(KernelError::AlreadyPublished {
                port_name: self.port_name.clone(),
            });
        }
        let port_name = status::get_str(status, "port_name")?;
        let port_width = status::get_int(status, "port_width")?;

        if let Some(width) = port_width {
            if width < 0 {
                return Err(KernelError::StatusTypeMismatch {
                    key: "port_width".to_string(),
                    expected: "non-negative integer",
                });
            }
            self.width = width as u32;
        }
        if let Some(name) = port_name {
            self.port_name = name;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// In-memory transport that records what it was handed.
///
/// Cloning shares the underlying record, so a test can keep a handle
/// while the proxy owns the boxed transport.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Mutex<RecordingInner>>,
}

#[derive(Default)]
struct RecordingInner {
    contract: Option<(String, u32, Vec<Port>)>,
    forwarded: Vec<(Port, f64)>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `(name, width, index map)` tuple handed over at publish
    /// time, if publication happened.
    pub fn contract(&self) -> Option<(String, u32, Vec<Port>)> {
        self.inner
            .lock()
            .expect("recording transport lock poisoned")
            .contract
            .clone()
    }

    /// Snapshot of all forwarded `(channel, time_ms)` pairs.
    pub fn forwarded(&self) -> Vec<(Port, f64)> {
        self.inner
            .lock()
            .expect("recording transport lock poisoned")
            .forwarded
            .clone()
    }
}

impl ChannelTransport for RecordingTransport {
    fn publish(&mut self, port_name: &str, width: u32, index_map: &[Port]) -> KernelResult<()> {
        let mut inner = self
            .inner
            .lock()
            .expect("recording transport lock poisoned");
        inner.contract = Some((port_name.to_string(), width, index_map.to_vec()));
        Ok(())
    }

    fn forward(&mut self, channel: Port, time_ms: f64) -> KernelResult<()> {
        self.inner
            .lock()
            .expect("recording transport lock poisoned")
            .forwarded
            .push((channel, time_ms));
        Ok(())
    }
}
