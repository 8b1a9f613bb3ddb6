use futures::future::BoxFuture;
use tracing::info;

use bpsim_core::types::TypedValue;

use crate::context::ExecutionContext;
use crate::node::{Element, Node};

/// An ordered sequence of nodes, executed one after another.
///
/// Insertion order is both the execution order and the source of each
/// child's id. A process is itself a node, so gateway branches and nested
/// sub-processes are plain `Process` values.
#[derive(Debug, Default)]
pub struct Process {
    pub(crate) element: Element,
    children: Vec<Node>,
}

impl Process {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            element: Element::new(description),
            children: Vec::new(),
        }
    }

    /// Set the id of a process that is never inserted into a parent
    /// (top-level processes and gateway branches).
    pub fn with_id(mut self, id: usize) -> Self {
        self.element.id = id;
        self
    }

    /// Append a node, returning the id assigned to it.
    pub fn add(&mut self, node: impl Into<Node>) -> usize {
        let mut node = node.into();
        let id = self.children.len();
        node.set_id(id);
        self.children.push(node);
        id
    }

    /// Builder form of [`Process::add`].
    pub fn with(mut self, node: impl Into<Node>) -> Self {
        self.add(node);
        self
    }

    pub fn id(&self) -> usize {
        self.element.id
    }

    pub fn description(&self) -> &str {
        &self.element.description
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Composite results never propagate upward.
    pub fn result(&self) -> TypedValue {
        TypedValue::none()
    }

    /// Execute every child in order and return their concatenated traces.
    ///
    /// Child `i + 1` starts only after child `i`'s future has resolved. The
    /// first child is handed itself as predecessor.
    pub fn run<'a>(&'a self, ctx: &'a ExecutionContext) -> BoxFuture<'a, String> {
        Box::pin(async move {
            info!(
                process = %self.element.description,
                children = self.children.len(),
                "Process started"
            );

            let mut trace = String::new();
            for (i, child) in self.children.iter().enumerate() {
                let predecessor = if i > 0 { &self.children[i - 1] } else { child };
                trace.push_str(&child.execute(predecessor, ctx).await);
            }

            info!(process = %self.element.description, "Process completed");
            trace
        })
    }
}
