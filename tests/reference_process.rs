use std::sync::Arc;
use std::time::Duration;

use bpsim_core::config::SimulationConfig;
use bpsim_core::event::{EventBus, SimulationEvent};
use bpsim_core::types::NodeKind;
use bpsim_engine::{demo, Simulation};
use bpsim_test_utils::{EventRecorder, ScriptedWork};

fn leaf_order(events: &[SimulationEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            SimulationEvent::NodeCompleted {
                kind, description, ..
            } if !matches!(kind, NodeKind::Process) && !kind.is_gateway() => {
                Some(description.clone())
            }
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_default_value_runs_second_sub_process() {
    let sim = Simulation::from_config(&SimulationConfig::instant());
    let mut recorder = EventRecorder::new(sim.events());
    let root = demo::business_process(demo::DEFAULT_ACTIVE_VALUE);

    let report = sim.run(&root).await;

    assert!(report.trace.contains(" ---> Active Activity 0-1 (24)"));
    assert!(!report.trace.contains("Activity 1-"));
    assert!(report.trace.contains(" ---> Activity 2-1 ---> Activity 2-2 ---> Activity 2-3"));
    assert!(report.trace.ends_with(" ----> End event"));

    let events = recorder.drain();
    assert_eq!(
        leaf_order(&events),
        vec![
            "Start Event",
            "Activity 0-1",
            "Activity 0-2",
            "Active Activity 0-1",
            "Activity 2-1",
            "Activity 2-2",
            "Activity 2-3",
            "Activity 0-3",
            "Activity 0-4",
            "End Event",
        ]
    );
    let launched: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            SimulationEvent::BranchLaunched { gateway, branch, .. } if gateway == demo::GATEWAY => {
                Some(*branch)
            }
            _ => None,
        })
        .collect();
    assert_eq!(launched, vec![1]);
}

#[tokio::test]
async fn test_high_value_runs_first_sub_process() {
    let sim = Simulation::from_config(&SimulationConfig::instant());
    let mut recorder = EventRecorder::new(sim.events());
    let root = demo::business_process(35);

    let report = sim.run(&root).await;

    for i in 1..=4 {
        assert!(report.trace.contains(&format!(" ---> Activity 1-{i}")));
    }
    assert!(!report.trace.contains("Activity 2-"));
    assert_eq!(recorder.launched_branches(demo::GATEWAY), vec![0]);
}

#[tokio::test]
async fn test_low_value_runs_second_sub_process() {
    let sim = Simulation::from_config(&SimulationConfig::instant());
    let mut recorder = EventRecorder::new(sim.events());
    let root = demo::business_process(10);

    let report = sim.run(&root).await;

    assert!(report.trace.contains(" ---> Activity 2-3"));
    assert!(!report.trace.contains("Activity 1-"));
    assert_eq!(recorder.launched_branches(demo::GATEWAY), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_gateway_blocks_downstream_until_branch_finishes() {
    let work = Arc::new(
        ScriptedWork::new(Duration::from_secs(1)).with_delay("Activity 2-2", Duration::from_secs(30)),
    );
    let sim = Simulation::new(work, Arc::new(EventBus::default()));
    let mut recorder = EventRecorder::new(sim.events());
    let root = demo::business_process(10);

    sim.run(&root).await;

    let order = leaf_order(&recorder.drain());
    let slow = order.iter().position(|d| d == "Activity 2-2").unwrap();
    let after = order.iter().position(|d| d == "Activity 0-3").unwrap();
    assert!(slow < after, "downstream activity ran before the branch finished: {order:?}");
}

#[tokio::test(start_paused = true)]
async fn test_seeded_runs_with_real_delays_route_identically() {
    for seed in [1u64, 2, 3] {
        let config = SimulationConfig {
            seed: Some(seed),
            ..SimulationConfig::default()
        };
        let sim = Simulation::from_config(&config);
        let mut recorder = EventRecorder::new(sim.events());

        sim.run(&demo::business_process(40)).await;

        assert_eq!(recorder.launched_branches(demo::GATEWAY), vec![0]);
    }
}
