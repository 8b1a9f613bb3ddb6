use std::sync::Arc;

use bpsim_core::event::{EventBus, SimulationEvent};
use bpsim_core::traits::{WorkKind, WorkSimulator};

use crate::work::SimulatedWork;

/// Shared, cheaply cloneable state threaded through every node execution.
#[derive(Clone)]
pub struct ExecutionContext {
    work: Arc<dyn WorkSimulator>,
    events: Arc<EventBus>,
}

impl ExecutionContext {
    pub fn new(work: Arc<dyn WorkSimulator>, events: Arc<EventBus>) -> Self {
        Self { work, events }
    }

    /// Zero-delay work and a private event bus.
    pub fn instant() -> Self {
        Self::new(Arc::new(SimulatedWork::instant()), Arc::new(EventBus::default()))
    }

    pub fn work(&self) -> &dyn WorkSimulator {
        self.work.as_ref()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn publish(&self, event: SimulationEvent) {
        self.events.publish(event);
    }

    /// Pause the calling task for the simulated duration of `description`'s work.
    pub(crate) async fn simulate_work(&self, kind: WorkKind, description: &str) {
        let duration = self.work.duration(kind, description);
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
