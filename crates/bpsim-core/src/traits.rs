use std::sync::Arc;
use std::time::Duration;

use crate::types::TypedValue;

/// The kind of simulated work an activity performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkKind {
    /// Constant duration (default activities).
    Fixed,
    /// Randomized duration within a bounded range (active activities).
    Variable,
}

/// Work-simulation provider: supplies how long an activity "works".
///
/// The engine treats the returned duration as an opaque delay local to the
/// activity's own task; it never suspends any other node.
pub trait WorkSimulator: Send + Sync + 'static {
    /// Duration of the work performed by the activity named `description`.
    fn duration(&self, kind: WorkKind, description: &str) -> Duration;

    /// Reset any randomness to its initial state. Called by start events.
    fn reseed(&self) {}
}

/// Zero-argument computation supplied to an active activity.
pub type Computation = Arc<dyn Fn() -> TypedValue + Send + Sync>;
