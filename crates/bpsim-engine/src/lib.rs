//! Process-graph execution engine.
//!
//! A [`Process`] runs its child [`Node`]s strictly in order. Gateways fan out
//! to branch processes, each launched as an independent tokio task, and fan
//! back in through a [`FanIn`] before the enclosing process moves on.
//! Inclusive and exclusive gateways pick their branches by evaluating a
//! `<op>;<threshold>` [`Condition`] against the typed result of the node
//! right before them.

pub mod barrier;
pub mod condition;
pub mod context;
pub mod demo;
pub mod gateway;
pub mod leaf;
pub mod node;
pub mod process;
pub mod simulation;
pub mod work;

pub use barrier::FanIn;
pub use condition::{Condition, ConditionError, Operand, Operator};
pub use context::ExecutionContext;
pub use gateway::{
    BranchDecision, ExclusiveGateway, InclusiveGateway, ParallelGateway, FAN_IN_MARK, FAN_OUT_MARK,
};
pub use leaf::{ActiveActivity, DefaultActivity, EndEvent, StartEvent};
pub use node::Node;
pub use process::Process;
pub use simulation::{Simulation, SimulationReport};
pub use work::SimulatedWork;
