//! End-to-end drain decisions over fabricated cluster snapshots.

use std::collections::BTreeSet;

use drainkit_admission::{DrainEvaluator, DrainPolicy, is_busy};
use drainkit_core::{
    Cause, ClusterView, Computer, Executable, Execution, Executor, JobState, Node, QueuedJob,
    UnresolvedState,
};
use drainkit_state::{ClusterSnapshot, SharedCluster};

fn online(name: &str) -> Node {
    Node::new(name).with_computer(Computer::online())
}

/// Uncaused project build with a single capable node.
#[test]
fn scenario_a_uncaused_build_is_held_back() {
    let snap = ClusterSnapshot::new()
        .with_node(online("N1"))
        .with_job(QueuedJob::project(1, "J1", JobState::Buildable));
    let ev = DrainEvaluator::new(&snap);

    assert!(!ev.globally_permitted_ids().contains(&1));
    assert!(ev.permitted_ids_for_node("N1").is_empty());
}

/// Build chained to a finished upstream, with a second capable node.
#[test]
fn scenario_b_chained_build_goes_to_any_capable_node() {
    let snap = ClusterSnapshot::new()
        .with_node(online("N1"))
        .with_node(online("N2"))
        .with_build(Execution::finished("P", 5, "N1"))
        .with_job(QueuedJob::project(2, "J2", JobState::Buildable).caused_by("P", 5));
    let ev = DrainEvaluator::new(&snap);

    assert!(ev.globally_permitted_ids().contains(&2));

    let job = snap.queued_job(2).unwrap();
    assert!(ev.other_node_can_build(job, snap.node("N1").unwrap()));
    assert!(!ev.permitted_ids_for_node("N1").contains(&2));

    // N1 is equally capable, so N2 is not the exclusive candidate either.
    assert!(!ev.permitted_ids_for_node("N2").contains(&2));
}

/// Same lineage, but N2 is the only node able to take the job.
#[test]
fn scenario_b_variant_only_one_node_can_take_it() {
    let snap = ClusterSnapshot::new()
        .with_node(online("N1"))
        .with_node(online("N2").with_label("arm"))
        .with_build(Execution::finished("P", 5, "N1"))
        .with_job(
            QueuedJob::project(2, "J2", JobState::Buildable)
                .caused_by("P", 5)
                .with_required_label("arm"),
        );
    let ev = DrainEvaluator::new(&snap);

    assert!(!ev.permitted_ids_for_node("N1").contains(&2));
    assert!(ev.permitted_ids_for_node("N2").contains(&2));
}

/// Waiting job whose trigger ran on the only online node.
#[test]
fn scenario_c_waiting_job_pins_its_trigger_node() {
    let snap = ClusterSnapshot::new()
        .with_node(online("N1"))
        .with_build(Execution::finished("P", 5, "N1"))
        .with_job(QueuedJob::project(3, "J3", JobState::Waiting).caused_by("P", 5));
    let ev = DrainEvaluator::new(&snap);
    let n1 = snap.node("N1").unwrap();

    assert!(!ev.other_node_can_build(snap.queued_job(3).unwrap(), n1));
    assert!(ev.has_exclusive_queued_job(n1));
    assert_eq!(ev.permitted_ids_for_node("N1"), BTreeSet::from([3]));
}

/// Computer with one busy and one idle executor.
#[test]
fn scenario_d_busy_computer_reports_running_project() {
    let snap = ClusterSnapshot::new().with_node(
        Node::new("C").with_computer(
            Computer::online()
                .with_executor(Executor::running(Executable::Build(Execution::running(
                    "Foo", 12, "C",
                ))))
                .with_executor(Executor::idle()),
        ),
    );
    let ev = DrainEvaluator::new(&snap);
    let computer = snap.node("C").and_then(Node::to_computer).unwrap();

    assert!(is_busy(computer));
    assert_eq!(
        ev.running_project_names_on("C"),
        BTreeSet::from(["Foo".to_string()])
    );
}

#[test]
fn uncaused_project_jobs_are_never_permitted() {
    let snap = ClusterSnapshot::new()
        .with_node(online("N1"))
        .with_job(QueuedJob::project(1, "a", JobState::Buildable))
        .with_job(QueuedJob::project(2, "b", JobState::Waiting))
        .with_job(QueuedJob::project(3, "c", JobState::Blocked))
        .with_job(QueuedJob::project(4, "d", JobState::Pending).with_cause(Cause::User {
            user_id: "ops".to_string(),
        }));
    let ev = DrainEvaluator::new(&snap);
    assert!(ev.globally_permitted_ids().is_empty());
    assert!(ev.globally_permitted_project_names().is_empty());
}

#[test]
fn plain_tasks_are_always_permitted() {
    let snap = ClusterSnapshot::new()
        .with_job(QueuedJob::plain(1, "a", JobState::Buildable))
        .with_job(QueuedJob::plain(2, "b", JobState::Waiting))
        .with_job(QueuedJob::plain(3, "c", JobState::Blocked).caused_by("gone", 1));
    let ev = DrainEvaluator::new(&snap);
    assert_eq!(ev.globally_permitted_ids(), BTreeSet::from([1, 2, 3]));
}

#[test]
fn deleting_the_upstream_project_revokes_admission() {
    let mut snap = ClusterSnapshot::new()
        .with_build(Execution::finished("P", 5, "N1"))
        .with_job(QueuedJob::project(1, "J", JobState::Buildable).caused_by("P", 5));
    assert_eq!(
        DrainEvaluator::new(&snap).globally_permitted_ids(),
        BTreeSet::from([1])
    );

    snap.remove_project("P");
    let ev = DrainEvaluator::new(&snap);
    assert!(ev.globally_permitted_ids().is_empty());
    // The recorded name survives the deletion.
    assert_eq!(
        drainkit_admission::upstream_project_names(snap.queued_job(1).unwrap()),
        BTreeSet::from(["P".to_string()])
    );
}

#[test]
fn unrestricted_per_node_query_matches_global_for_any_snapshot() {
    let snapshots = [
        ClusterSnapshot::new(),
        ClusterSnapshot::new()
            .with_node(online("N1"))
            .with_job(QueuedJob::plain(1, "a", JobState::Buildable)),
        ClusterSnapshot::new()
            .with_node(online("N1"))
            .with_node(online("N2"))
            .with_build(Execution::finished("P", 1, "N2"))
            .with_job(QueuedJob::project(1, "x", JobState::Waiting).caused_by("P", 1))
            .with_job(QueuedJob::project(2, "y", JobState::Buildable)),
    ];
    for snap in &snapshots {
        let ev = DrainEvaluator::new(snap);
        assert_eq!(ev.permitted_ids_for_node(""), ev.globally_permitted_ids());
    }
}

#[test]
fn blocked_jobs_follow_configured_policy() {
    let snap = ClusterSnapshot::new()
        .with_node(online("N1"))
        .with_job(QueuedJob::project(1, "J", JobState::Blocked));
    let n1 = snap.node("N1").unwrap();

    assert!(DrainEvaluator::new(&snap).has_exclusive_queued_job(n1));

    let lenient = DrainPolicy {
        unresolved_state: UnresolvedState::OtherCapable,
    };
    assert!(!DrainEvaluator::new(&snap)
        .with_policy(lenient)
        .has_exclusive_queued_job(n1));
}

#[test]
fn one_read_scope_per_query_through_shared_cluster() {
    let shared = SharedCluster::new(
        ClusterSnapshot::new()
            .with_node(online("N1"))
            .with_build(Execution::finished("P", 5, "N1"))
            .with_job(QueuedJob::project(1, "J", JobState::Waiting).caused_by("P", 5)),
    );

    let first = shared.evaluate(|view| DrainEvaluator::new(view).permitted_ids_for_node("N1"));
    assert_eq!(first, BTreeSet::from([1]));

    // The job leaves the queue; the next query sees the new snapshot only.
    let mut next = shared.read().clone();
    next.remove_job(1);
    shared.replace(next);

    let second = shared.evaluate(|view| DrainEvaluator::new(view).permitted_ids_for_node("N1"));
    assert!(second.is_empty());
}

#[test]
fn repeated_queries_against_unchanged_snapshot_are_identical() {
    let snap = ClusterSnapshot::new()
        .with_node(online("N1"))
        .with_node(online("N2").with_label("gpu"))
        .with_build(Execution::finished("P", 5, "N1"))
        .with_job(
            QueuedJob::project(1, "J", JobState::Buildable)
                .caused_by("P", 5)
                .with_required_label("gpu"),
        )
        .with_job(QueuedJob::plain(2, "t", JobState::Buildable));
    let before = snap.clone();
    let ev = DrainEvaluator::new(&snap);

    for _ in 0..3 {
        assert_eq!(ev.globally_permitted_ids(), BTreeSet::from([1, 2]));
        assert_eq!(ev.permitted_ids_for_node("N2"), BTreeSet::from([1]));
        assert_eq!(ev.cluster_report(), ev.cluster_report());
    }
    assert_eq!(snap, before);
}

#[test]
fn demo_snapshot_decisions() {
    let snap = ClusterSnapshot::from_json_str(include_str!(
        "../../../demos/lenient-shutdown/snapshot.json"
    ))
    .unwrap();
    let ev = DrainEvaluator::new(&snap);

    assert_eq!(
        ev.globally_permitted_ids(),
        BTreeSet::from([101, 103, 105, 106])
    );
    assert_eq!(
        ev.globally_permitted_project_names(),
        BTreeSet::from([
            "platform/api".to_string(),
            "platform/inference".to_string(),
            "platform/integration".to_string(),
        ])
    );
    assert_eq!(ev.permitted_ids_for_node("linux-01"), BTreeSet::from([105]));
    assert_eq!(ev.permitted_ids_for_node("gpu-01"), BTreeSet::from([103]));
    assert!(ev.permitted_ids_for_node("mac-01").is_empty());
    assert_eq!(
        ev.running_project_names(),
        BTreeSet::from(["platform/core".to_string()])
    );

    let linux_01 = snap.node("linux-01").unwrap();
    assert!(ev.has_exclusive_queued_job(linux_01));
    assert!(is_busy(linux_01.to_computer().unwrap()));
}
