use std::fmt;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use bpsim_core::traits::{Computation, WorkKind};
use bpsim_core::types::TypedValue;

use crate::context::ExecutionContext;
use crate::node::Element;

/// Marks the beginning of a process and resets the delay generator.
#[derive(Debug, Clone)]
pub struct StartEvent {
    pub(crate) element: Element,
}

impl StartEvent {
    pub fn new() -> Self {
        Self {
            element: Element::new("Start Event"),
        }
    }

    pub(crate) async fn execute(&self, ctx: &ExecutionContext) -> String {
        info!("Start of business process simulation...");
        ctx.work().reseed();
        self.element.description.clone()
    }
}

impl Default for StartEvent {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct EndEvent {
    pub(crate) element: Element,
}

impl EndEvent {
    pub fn new() -> Self {
        Self {
            element: Element::new("End Event"),
        }
    }

    pub(crate) async fn execute(&self, _ctx: &ExecutionContext) -> String {
        " ----> End event".to_string()
    }
}

impl Default for EndEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// An activity that only takes (simulated) time.
#[derive(Debug, Clone)]
pub struct DefaultActivity {
    pub(crate) element: Element,
}

impl DefaultActivity {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            element: Element::new(description),
        }
    }

    pub(crate) async fn execute(&self, ctx: &ExecutionContext) -> String {
        ctx.simulate_work(WorkKind::Fixed, &self.element.description)
            .await;
        format!(" ---> {}", self.element.description)
    }
}

/// An activity that produces a typed value for the gateway after it.
///
/// The computation runs once per execution; its output is cached and
/// served by [`ActiveActivity::result`] until the next execution.
pub struct ActiveActivity {
    pub(crate) element: Element,
    computation: Computation,
    result: Mutex<Option<TypedValue>>,
}

impl ActiveActivity {
    pub fn new(description: impl Into<String>, computation: Computation) -> Self {
        Self {
            element: Element::new(description),
            computation,
            result: Mutex::new(None),
        }
    }

    /// Last computed value, or [`TypedValue::none`] before the first execution.
    pub fn result(&self) -> TypedValue {
        self.result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_default()
    }

    pub(crate) async fn execute(&self, ctx: &ExecutionContext) -> String {
        ctx.simulate_work(WorkKind::Variable, &self.element.description)
            .await;

        let value = (self.computation)();
        debug!(
            description = %self.element.description,
            value = %value.value,
            tag = %value.tag,
            "Active activity computed result"
        );
        let trace = format!(" ---> {} ({})", self.element.description, value.value);
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
        trace
    }
}

impl fmt::Debug for ActiveActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveActivity")
            .field("element", &self.element)
            .field("result", &self.result())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use bpsim_core::event::EventBus;
    use bpsim_core::types::TypeTag;
    use bpsim_test_utils::{counting_computation, fixed_computation, ScriptedWork};

    #[tokio::test]
    async fn test_active_result_before_and_after_execute() {
        let ctx = ExecutionContext::instant();
        let activity = ActiveActivity::new(
            "Active Activity 0-1",
            fixed_computation(TypedValue::new("24", TypeTag::Int)),
        );

        assert_eq!(activity.result(), TypedValue::new("NONE", TypeTag::String));

        let trace = activity.execute(&ctx).await;
        assert_eq!(trace, " ---> Active Activity 0-1 (24)");
        assert_eq!(activity.result(), TypedValue::new("24", TypeTag::Int));
    }

    #[tokio::test]
    async fn test_computation_invoked_once_per_execution() {
        let ctx = ExecutionContext::instant();
        let (computation, calls) = counting_computation(TypedValue::int(1));
        let activity = ActiveActivity::new("a", computation);

        activity.execute(&ctx).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        activity.execute(&ctx).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_activity_waits_for_fixed_work() {
        let work = Arc::new(ScriptedWork::new(Duration::from_secs(1)));
        let ctx = ExecutionContext::new(work.clone(), Arc::new(EventBus::default()));
        let activity = DefaultActivity::new("Activity 0-1");

        let started = tokio::time::Instant::now();
        let trace = activity.execute(&ctx).await;
        assert_eq!(trace, " ---> Activity 0-1");
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(1) && elapsed < Duration::from_secs(2));
        assert_eq!(work.calls(), vec![(WorkKind::Fixed, "Activity 0-1".to_string())]);
    }

    #[tokio::test]
    async fn test_start_event_reseeds_work() {
        let work = Arc::new(ScriptedWork::new(Duration::ZERO));
        let ctx = ExecutionContext::new(work.clone(), Arc::new(EventBus::default()));

        let trace = StartEvent::new().execute(&ctx).await;
        assert_eq!(trace, "Start Event");
        assert_eq!(work.reseed_count(), 1);
    }

    #[tokio::test]
    async fn test_end_event_trace() {
        let ctx = ExecutionContext::instant();
        assert_eq!(EndEvent::new().execute(&ctx).await, " ----> End event");
    }
}
