use std::sync::Arc;

use tracing::{debug, info, warn};

use bpsim_core::event::{SimulationEvent, SkipReason};
use bpsim_core::types::TypedValue;

use crate::barrier::FanIn;
use crate::condition::{Condition, Operand};
use crate::context::ExecutionContext;
use crate::node::{Element, Node};
use crate::process::Process;

/// Opens a gateway's section of the trace and separates its branches.
pub const FAN_OUT_MARK: &str = "\n\n\t\t\t\t";
/// Closes a gateway's section of the trace.
pub const FAN_IN_MARK: &str = "\n\n";

/// Routing outcome for one branch of a conditional gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchDecision {
    Launch,
    Skip(SkipReason),
}

impl BranchDecision {
    pub fn is_launch(&self) -> bool {
        matches!(self, BranchDecision::Launch)
    }
}

/// Join the traces of finished branches between the fan-out and fan-in marks.
fn gateway_trace(mut completed: Vec<(usize, String)>) -> String {
    completed.retain(|(_, trace)| !trace.is_empty());
    let body = completed
        .into_iter()
        .map(|(_, trace)| trace)
        .collect::<Vec<_>>()
        .join(FAN_OUT_MARK);
    format!("{FAN_OUT_MARK}{body}{FAN_IN_MARK}")
}

/// Unconditional fan-out: every branch runs, concurrently.
#[derive(Debug, Default)]
pub struct ParallelGateway {
    pub(crate) element: Element,
    branches: Vec<Arc<Process>>,
}

impl ParallelGateway {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            element: Element::new(description),
            branches: Vec::new(),
        }
    }

    pub fn add_branch(&mut self, process: Process) {
        self.branches.push(Arc::new(process));
    }

    pub fn with_branch(mut self, process: Process) -> Self {
        self.add_branch(process);
        self
    }

    pub fn branches(&self) -> &[Arc<Process>] {
        &self.branches
    }

    pub fn result(&self) -> TypedValue {
        TypedValue::none()
    }

    pub(crate) async fn execute(&self, ctx: &ExecutionContext) -> String {
        let gateway = &self.element.description;
        let mut fan_in = FanIn::new(gateway.as_str());
        for (index, branch) in self.branches.iter().enumerate() {
            ctx.publish(SimulationEvent::BranchLaunched {
                gateway: gateway.clone(),
                branch: index,
                condition: None,
            });
            fan_in.launch(index, branch, ctx);
        }
        info!(gateway = %gateway, branches = fan_in.launched(), "Parallel gateway fanned out");

        let launched = fan_in.launched();
        let completed = fan_in.join().await;
        ctx.publish(SimulationEvent::GatewayJoined {
            gateway: gateway.clone(),
            launched,
        });
        gateway_trace(completed)
    }
}

/// Condition/branch pairs shared by the inclusive and exclusive gateways.
#[derive(Debug, Default)]
struct ConditionalBranches {
    conditions: Vec<String>,
    branches: Vec<Arc<Process>>,
}

impl ConditionalBranches {
    fn add(&mut self, condition: String, process: Process) {
        self.conditions.push(condition);
        self.branches.push(Arc::new(process));
    }

    /// Decide every branch against the predecessor's result.
    ///
    /// `None` when the result gives no usable operand; then nothing runs.
    fn evaluate(&self, previous: &TypedValue, exclusive: bool) -> Option<Vec<BranchDecision>> {
        let operand = Operand::from_result(previous)?;
        let mut chosen = false;
        let decisions = self
            .conditions
            .iter()
            .map(|raw| match Condition::parse(raw) {
                Ok(condition) if condition.matches(&operand) => {
                    if exclusive && chosen {
                        BranchDecision::Skip(SkipReason::NotSelected)
                    } else {
                        chosen = true;
                        BranchDecision::Launch
                    }
                }
                Ok(_) => BranchDecision::Skip(SkipReason::NotMatched),
                Err(e) => BranchDecision::Skip(e.skip_reason()),
            })
            .collect();
        Some(decisions)
    }

    async fn execute(
        &self,
        gateway: &str,
        predecessor: &Node,
        ctx: &ExecutionContext,
        exclusive: bool,
    ) -> String {
        let previous = predecessor.result();
        let Some(decisions) = self.evaluate(&previous, exclusive) else {
            debug!(
                gateway = %gateway,
                value = %previous.value,
                tag = %previous.tag,
                "Predecessor result unusable, no branch evaluated"
            );
            ctx.publish(SimulationEvent::GatewayJoined {
                gateway: gateway.to_string(),
                launched: 0,
            });
            return String::new();
        };

        let mut fan_in = FanIn::new(gateway);
        for (index, decision) in decisions.into_iter().enumerate() {
            let condition = &self.conditions[index];
            match decision {
                BranchDecision::Launch => {
                    debug!(gateway = %gateway, branch = index, condition = %condition, "Condition matched");
                    ctx.publish(SimulationEvent::BranchLaunched {
                        gateway: gateway.to_string(),
                        branch: index,
                        condition: Some(condition.clone()),
                    });
                    fan_in.launch(index, &self.branches[index], ctx);
                }
                BranchDecision::Skip(reason) => {
                    match reason {
                        SkipReason::MalformedCondition | SkipReason::UnknownOperator => {
                            warn!(gateway = %gateway, branch = index, condition = %condition, ?reason, "Skipping branch with unusable condition");
                        }
                        SkipReason::NotMatched | SkipReason::NotSelected => {
                            debug!(gateway = %gateway, branch = index, condition = %condition, ?reason, "Branch not taken");
                        }
                    }
                    ctx.publish(SimulationEvent::BranchSkipped {
                        gateway: gateway.to_string(),
                        branch: index,
                        condition: condition.clone(),
                        reason,
                    });
                }
            }
        }

        let launched = fan_in.launched();
        info!(
            gateway = %gateway,
            value = %previous.value,
            launched,
            branches = self.branches.len(),
            "Gateway routed"
        );
        let completed = fan_in.join().await;
        ctx.publish(SimulationEvent::GatewayJoined {
            gateway: gateway.to_string(),
            launched,
        });
        gateway_trace(completed)
    }
}

/// Conditional fan-out: every branch whose condition holds runs, concurrently.
///
/// Several branches may match at once; all of them are launched.
#[derive(Debug, Default)]
pub struct InclusiveGateway {
    pub(crate) element: Element,
    routes: ConditionalBranches,
}

impl InclusiveGateway {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            element: Element::new(description),
            routes: ConditionalBranches::default(),
        }
    }

    /// Guard `process` with `condition` (`<op>;<threshold>`).
    ///
    /// Malformed conditions are accepted here and skipped at execution.
    pub fn add_branch(&mut self, condition: impl Into<String>, process: Process) {
        self.routes.add(condition.into(), process);
    }

    pub fn with_branch(mut self, condition: impl Into<String>, process: Process) -> Self {
        self.add_branch(condition, process);
        self
    }

    pub fn conditions(&self) -> &[String] {
        &self.routes.conditions
    }

    pub fn branches(&self) -> &[Arc<Process>] {
        &self.routes.branches
    }

    /// Which branches would run for a predecessor result of `previous`.
    pub fn evaluate(&self, previous: &TypedValue) -> Option<Vec<BranchDecision>> {
        self.routes.evaluate(previous, false)
    }

    pub fn result(&self) -> TypedValue {
        TypedValue::none()
    }

    pub(crate) async fn execute(&self, predecessor: &Node, ctx: &ExecutionContext) -> String {
        self.routes
            .execute(&self.element.description, predecessor, ctx, false)
            .await
    }
}

/// Conditional routing to at most one branch: the first whose condition holds.
#[derive(Debug, Default)]
pub struct ExclusiveGateway {
    pub(crate) element: Element,
    routes: ConditionalBranches,
}

impl ExclusiveGateway {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            element: Element::new(description),
            routes: ConditionalBranches::default(),
        }
    }

    pub fn add_branch(&mut self, condition: impl Into<String>, process: Process) {
        self.routes.add(condition.into(), process);
    }

    pub fn with_branch(mut self, condition: impl Into<String>, process: Process) -> Self {
        self.add_branch(condition, process);
        self
    }

    pub fn conditions(&self) -> &[String] {
        &self.routes.conditions
    }

    pub fn branches(&self) -> &[Arc<Process>] {
        &self.routes.branches
    }

    pub fn evaluate(&self, previous: &TypedValue) -> Option<Vec<BranchDecision>> {
        self.routes.evaluate(previous, true)
    }

    pub fn result(&self) -> TypedValue {
        TypedValue::none()
    }

    pub(crate) async fn execute(&self, predecessor: &Node, ctx: &ExecutionContext) -> String {
        self.routes
            .execute(&self.element.description, predecessor, ctx, true)
            .await
    }
}
