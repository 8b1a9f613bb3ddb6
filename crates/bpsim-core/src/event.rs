use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::Result;
use crate::types::NodeKind;

/// Why a gateway branch was not launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The condition string could not be parsed.
    MalformedCondition,
    /// The operator is not one of `<`, `>`, `=`.
    UnknownOperator,
    /// The condition parsed but did not hold for the predecessor's value.
    NotMatched,
    /// Exclusive routing: an earlier branch was already chosen.
    NotSelected,
}

/// Everything observable about a running simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimulationEvent {
    NodeStarted {
        node_id: usize,
        kind: NodeKind,
        description: String,
    },
    NodeCompleted {
        node_id: usize,
        kind: NodeKind,
        description: String,
        trace: String,
        elapsed_ms: u64,
    },
    BranchLaunched {
        gateway: String,
        branch: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
    },
    BranchSkipped {
        gateway: String,
        branch: usize,
        condition: String,
        reason: SkipReason,
    },
    GatewayJoined {
        gateway: String,
        launched: usize,
    },
}

impl SimulationEvent {
    /// Render this event as one JSON line.
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Backlog each subscriber may fall behind by before it starts lagging.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// Fan-out of simulation events to every live subscriber.
///
/// Publishing never blocks the engine. A run nobody watches just drops
/// its events.
pub struct EventBus {
    tx: broadcast::Sender<SimulationEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: SimulationEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No event subscribers, event dropped");
        }
    }

    /// Receives every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SimulationEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}
