use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::context::ExecutionContext;
use crate::process::Process;

/// Fan-out/fan-in barrier for gateway branches.
///
/// Every [`FanIn::launch`] registers one outstanding completion and spawns
/// the branch as its own task; [`FanIn::join`] returns only once each
/// launched branch has finished. There is no timeout: a branch that never
/// finishes keeps `join` waiting.
pub struct FanIn {
    gateway: String,
    tasks: JoinSet<(usize, String)>,
    launched: usize,
}

impl FanIn {
    pub fn new(gateway: impl Into<String>) -> Self {
        Self {
            gateway: gateway.into(),
            tasks: JoinSet::new(),
            launched: 0,
        }
    }

    /// Spawn `branch` concurrently with everything else.
    pub fn launch(&mut self, index: usize, branch: &Arc<Process>, ctx: &ExecutionContext) {
        let branch = Arc::clone(branch);
        let ctx = ctx.clone();
        self.tasks.spawn(async move {
            let trace = branch.run(&ctx).await;
            (index, trace)
        });
        self.launched += 1;
        debug!(gateway = %self.gateway, branch = index, "Branch launched");
    }

    /// Number of completions this barrier waits for.
    pub fn launched(&self) -> usize {
        self.launched
    }

    /// Wait for every launched branch, returning `(branch index, trace)`
    /// pairs in completion order.
    ///
    /// A panic inside a branch resumes on the joining task.
    pub async fn join(mut self) -> Vec<(usize, String)> {
        let mut completed = Vec::with_capacity(self.launched);
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(done) => completed.push(done),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => {
                    error!(gateway = %self.gateway, error = %e, "Branch task ended without completing");
                }
            }
        }
        debug!(gateway = %self.gateway, completed = completed.len(), "Branches joined");
        completed
    }
}
