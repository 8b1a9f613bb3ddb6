use futures::future::BoxFuture;
use tokio::time::Instant;
use tracing::debug;

use bpsim_core::event::SimulationEvent;
use bpsim_core::types::{NodeKind, TypedValue};

use crate::context::ExecutionContext;
use crate::gateway::{ExclusiveGateway, InclusiveGateway, ParallelGateway};
use crate::leaf::{ActiveActivity, DefaultActivity, EndEvent, StartEvent};
use crate::process::Process;

/// Identity shared by every node: position in its container and a label.
#[derive(Debug, Clone, Default)]
pub(crate) struct Element {
    pub(crate) id: usize,
    pub(crate) description: String,
}

impl Element {
    pub(crate) fn new(description: impl Into<String>) -> Self {
        Self {
            id: 0,
            description: description.into(),
        }
    }
}

/// An executable element of a process graph.
#[derive(Debug)]
pub enum Node {
    StartEvent(StartEvent),
    EndEvent(EndEvent),
    DefaultActivity(DefaultActivity),
    ActiveActivity(ActiveActivity),
    Process(Process),
    ParallelGateway(ParallelGateway),
    InclusiveGateway(InclusiveGateway),
    ExclusiveGateway(ExclusiveGateway),
}

impl Node {
    fn element(&self) -> &Element {
        match self {
            Node::StartEvent(n) => &n.element,
            Node::EndEvent(n) => &n.element,
            Node::DefaultActivity(n) => &n.element,
            Node::ActiveActivity(n) => &n.element,
            Node::Process(n) => &n.element,
            Node::ParallelGateway(n) => &n.element,
            Node::InclusiveGateway(n) => &n.element,
            Node::ExclusiveGateway(n) => &n.element,
        }
    }

    fn element_mut(&mut self) -> &mut Element {
        match self {
            Node::StartEvent(n) => &mut n.element,
            Node::EndEvent(n) => &mut n.element,
            Node::DefaultActivity(n) => &mut n.element,
            Node::ActiveActivity(n) => &mut n.element,
            Node::Process(n) => &mut n.element,
            Node::ParallelGateway(n) => &mut n.element,
            Node::InclusiveGateway(n) => &mut n.element,
            Node::ExclusiveGateway(n) => &mut n.element,
        }
    }

    /// Position of this node within its parent process.
    pub fn id(&self) -> usize {
        self.element().id
    }

    pub(crate) fn set_id(&mut self, id: usize) {
        self.element_mut().id = id;
    }

    pub fn description(&self) -> &str {
        &self.element().description
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::StartEvent(_) => NodeKind::StartEvent,
            Node::EndEvent(_) => NodeKind::EndEvent,
            Node::DefaultActivity(_) => NodeKind::DefaultActivity,
            Node::ActiveActivity(_) => NodeKind::ActiveActivity,
            Node::Process(_) => NodeKind::Process,
            Node::ParallelGateway(_) => NodeKind::ParallelGateway,
            Node::InclusiveGateway(_) => NodeKind::InclusiveGateway,
            Node::ExclusiveGateway(_) => NodeKind::ExclusiveGateway,
        }
    }

    /// The node's typed output.
    ///
    /// Only an executed active activity reports a meaningful value; every
    /// other node, composites included, reports [`TypedValue::none`].
    pub fn result(&self) -> TypedValue {
        match self {
            Node::ActiveActivity(n) => n.result(),
            _ => TypedValue::none(),
        }
    }

    /// Run this node and return its display trace.
    ///
    /// `predecessor` is the node executed right before this one in the same
    /// process; only conditional gateways read it. The returned future
    /// resolves once the node, and everything it launched, has completed.
    pub fn execute<'a>(
        &'a self,
        predecessor: &'a Node,
        ctx: &'a ExecutionContext,
    ) -> BoxFuture<'a, String> {
        Box::pin(async move {
            let kind = self.kind();
            let node_id = self.id();
            debug!(node_id, %kind, description = %self.description(), "Node started");
            ctx.publish(SimulationEvent::NodeStarted {
                node_id,
                kind,
                description: self.description().to_string(),
            });

            let started = Instant::now();
            let trace = match self {
                Node::StartEvent(n) => n.execute(ctx).await,
                Node::EndEvent(n) => n.execute(ctx).await,
                Node::DefaultActivity(n) => n.execute(ctx).await,
                Node::ActiveActivity(n) => n.execute(ctx).await,
                Node::Process(n) => n.run(ctx).await,
                Node::ParallelGateway(n) => n.execute(ctx).await,
                Node::InclusiveGateway(n) => n.execute(predecessor, ctx).await,
                Node::ExclusiveGateway(n) => n.execute(predecessor, ctx).await,
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;

            debug!(node_id, %kind, elapsed_ms, "Node completed");
            ctx.publish(SimulationEvent::NodeCompleted {
                node_id,
                kind,
                description: self.description().to_string(),
                trace: trace.clone(),
                elapsed_ms,
            });
            trace
        })
    }
}

impl From<StartEvent> for Node {
    fn from(n: StartEvent) -> Self {
        Node::StartEvent(n)
    }
}

impl From<EndEvent> for Node {
    fn from(n: EndEvent) -> Self {
        Node::EndEvent(n)
    }
}

impl From<DefaultActivity> for Node {
    fn from(n: DefaultActivity) -> Self {
        Node::DefaultActivity(n)
    }
}

impl From<ActiveActivity> for Node {
    fn from(n: ActiveActivity) -> Self {
        Node::ActiveActivity(n)
    }
}

impl From<Process> for Node {
    fn from(n: Process) -> Self {
        Node::Process(n)
    }
}

impl From<ParallelGateway> for Node {
    fn from(n: ParallelGateway) -> Self {
        Node::ParallelGateway(n)
    }
}

impl From<InclusiveGateway> for Node {
    fn from(n: InclusiveGateway) -> Self {
        Node::InclusiveGateway(n)
    }
}

impl From<ExclusiveGateway> for Node {
    fn from(n: ExclusiveGateway) -> Self {
        Node::ExclusiveGateway(n)
    }
}
