use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, Instrument};

use bpsim_core::config::SimulationConfig;
use bpsim_core::event::EventBus;
use bpsim_core::traits::WorkSimulator;
use bpsim_core::types::RunId;

use crate::context::ExecutionContext;
use crate::node::Node;
use crate::work::SimulatedWork;

/// Outcome of running a process graph to completion.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub run_id: RunId,
    /// Concatenated display trace of the top-level node.
    pub trace: String,
    pub elapsed: Duration,
}

/// Runs a single-shot process graph against a work simulator and event bus.
pub struct Simulation {
    ctx: ExecutionContext,
}

impl Simulation {
    pub fn new(work: Arc<dyn WorkSimulator>, events: Arc<EventBus>) -> Self {
        Self {
            ctx: ExecutionContext::new(work, events),
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            Arc::new(SimulatedWork::from_config(config)),
            Arc::new(EventBus::default()),
        )
    }

    pub fn events(&self) -> &Arc<EventBus> {
        self.ctx.events()
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// Execute `root` (handed itself as predecessor) and wait for everything
    /// it launched to finish.
    pub async fn run(&self, root: &Node) -> SimulationReport {
        let run_id = RunId::new();
        let span = tracing::info_span!("simulation", run_id = %run_id);

        async {
            info!(root = %root.description(), kind = %root.kind(), "Simulation started");
            let started = Instant::now();
            let trace = root.execute(root, &self.ctx).await;
            let elapsed = started.elapsed();
            info!(elapsed_ms = elapsed.as_millis() as u64, "Simulation finished");

            SimulationReport {
                run_id: run_id.clone(),
                trace,
                elapsed,
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpsim_core::event::SimulationEvent;
    use bpsim_core::types::{NodeKind, TypedValue};
    use bpsim_test_utils::{fixed_computation, EventRecorder};

    use crate::gateway::InclusiveGateway;
    use crate::leaf::{ActiveActivity, DefaultActivity, EndEvent, StartEvent};
    use crate::process::Process;

    #[tokio::test]
    async fn test_run_reports_trace_and_single_root_completion() {
        let sim = Simulation::from_config(&SimulationConfig::instant());
        let mut recorder = EventRecorder::new(sim.events());
        let root: Node = Process::new("Default")
            .with(StartEvent::new())
            .with(ActiveActivity::new("Active", fixed_computation(TypedValue::int(40))))
            .with(
                InclusiveGateway::new("g")
                    .with_branch(">;30", Process::new("b").with(DefaultActivity::new("High"))),
            )
            .with(EndEvent::new())
            .into();

        let report = sim.run(&root).await;

        assert!(report.trace.starts_with("Start Event ---> Active (40)"));
        assert!(report.trace.contains(" ---> High"));
        assert!(report.trace.ends_with(" ----> End event"));
        assert!(!report.run_id.0.is_empty());

        let events = recorder.drain();
        let root_completions = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    SimulationEvent::NodeCompleted { kind: NodeKind::Process, description, .. }
                        if description == "Default"
                )
            })
            .count();
        assert_eq!(root_completions, 1);
    }

    #[tokio::test]
    async fn test_runs_get_distinct_ids() {
        let sim = Simulation::from_config(&SimulationConfig::instant());
        let root: Node = Process::new("empty").into();
        let a = sim.run(&root).await;
        let b = sim.run(&root).await;
        assert_ne!(a.run_id, b.run_id);
    }
}
