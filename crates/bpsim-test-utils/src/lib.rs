//! Fakes and helpers shared by the bpsim test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;

use bpsim_core::event::{EventBus, SimulationEvent};
use bpsim_core::traits::{Computation, WorkKind, WorkSimulator};
use bpsim_core::types::TypedValue;

/// Work simulator with per-activity delays that records every request.
pub struct ScriptedWork {
    default: Duration,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(WorkKind, String)>>,
    reseeds: AtomicUsize,
}

impl ScriptedWork {
    pub fn new(default: Duration) -> Self {
        Self {
            default,
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            reseeds: AtomicUsize::new(0),
        }
    }

    /// Delay the activity named `description` by `delay` instead of the default.
    pub fn with_delay(mut self, description: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(description.into(), delay);
        self
    }

    /// Every `(kind, description)` asked for, in request order.
    pub fn calls(&self) -> Vec<(WorkKind, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reseed_count(&self) -> usize {
        self.reseeds.load(Ordering::SeqCst)
    }
}

impl WorkSimulator for ScriptedWork {
    fn duration(&self, kind: WorkKind, description: &str) -> Duration {
        self.calls
            .lock()
            .unwrap()
            .push((kind, description.to_string()));
        self.delays.get(description).copied().unwrap_or(self.default)
    }

    fn reseed(&self) {
        self.reseeds.fetch_add(1, Ordering::SeqCst);
    }
}

/// Collects events published on a bus from the moment it is created.
pub struct EventRecorder {
    rx: Receiver<SimulationEvent>,
}

impl EventRecorder {
    pub fn new(bus: &EventBus) -> Self {
        Self { rx: bus.subscribe() }
    }

    /// Everything published since the last drain.
    pub fn drain(&mut self) -> Vec<SimulationEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(n)) => panic!("event recorder lagged by {n} events"),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        events
    }

    /// Drain and return the sorted indices of branches launched by `gateway`.
    pub fn launched_branches(&mut self, gateway: &str) -> Vec<usize> {
        let mut launched: Vec<usize> = self
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                SimulationEvent::BranchLaunched {
                    gateway: g, branch, ..
                } if g == gateway => Some(branch),
                _ => None,
            })
            .collect();
        launched.sort_unstable();
        launched
    }
}

/// A computation that always returns `value`.
pub fn fixed_computation(value: TypedValue) -> Computation {
    Arc::new(move || value.clone())
}

/// A computation returning `value` plus a counter of its invocations.
pub fn counting_computation(value: TypedValue) -> (Computation, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let computation: Computation = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        value.clone()
    });
    (computation, calls)
}
