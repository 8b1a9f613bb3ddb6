//! The reference business process: a start event, a few activities, an
//! active activity feeding an inclusive gateway with two guarded
//! sub-processes, more activities and an end event.

use std::sync::Arc;

use bpsim_core::types::TypedValue;

use crate::gateway::InclusiveGateway;
use crate::leaf::{ActiveActivity, DefaultActivity, EndEvent, StartEvent};
use crate::node::Node;
use crate::process::Process;

/// What the demo's active activity computes by default (`4 * 6`).
pub const DEFAULT_ACTIVE_VALUE: i64 = 4 * 6;

pub const GATEWAY: &str = "Inclusive Gateway";

/// Build the demo graph; the active activity yields `active_value` as INT.
pub fn business_process(active_value: i64) -> Node {
    let sub_process_1 = (1..=4).fold(Process::new("Sub Process 1").with_id(2), |p, i| {
        p.with(DefaultActivity::new(format!("Activity 1-{i}")))
    });
    let sub_process_2 = (1..=3).fold(Process::new("Sub Process 2").with_id(3), |p, i| {
        p.with(DefaultActivity::new(format!("Activity 2-{i}")))
    });

    let gateway = InclusiveGateway::new(GATEWAY)
        .with_branch(">;30", sub_process_1)
        .with_branch("<;25", sub_process_2);

    Process::new("Default")
        .with_id(1)
        .with(StartEvent::new())
        .with(DefaultActivity::new("Activity 0-1"))
        .with(DefaultActivity::new("Activity 0-2"))
        .with(ActiveActivity::new(
            "Active Activity 0-1",
            Arc::new(move || TypedValue::int(active_value)),
        ))
        .with(gateway)
        .with(DefaultActivity::new("Activity 0-3"))
        .with(DefaultActivity::new("Activity 0-4"))
        .with(EndEvent::new())
        .into()
}
