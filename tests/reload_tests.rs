mod common;

use common::{millis, sleeper, Fleet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use taskmaster::{Request, Response};

async fn reload(fleet: &mut Fleet) -> Result<(), String> {
    match fleet.request(Request::Reload).await {
        Response::Reload(result) => result,
        other => panic!("expected a reload response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reload_unchanged_config_keeps_processes() {
    let task = sleeper("steady").with_grace(millis(400), millis(300));
    let mut fleet = Fleet::start(vec![task.clone()]).await;
    fleet.wait_for_state(0, 0, "RUNNING").await;

    fleet.source.replace(fleet.config(vec![task]));
    assert_eq!(reload(&mut fleet).await, Ok(()));

    // A rebuilt process would be back in its start grace period
    assert_eq!(fleet.state_of(0, 0).await, "RUNNING");

    fleet.shutdown().await;
}

#[tokio::test]
async fn test_failed_reload_leaves_status_identical() {
    let tasks = vec![
        sleeper("a").with_instances(2).with_start_at_launch(false),
        sleeper("b").with_start_at_launch(false),
    ];
    let mut fleet = Fleet::start(tasks).await;
    let before = fleet.status().await;

    fleet.source.fail();
    let result = reload(&mut fleet).await;
    assert!(result.is_err());

    assert_eq!(fleet.status().await, before);

    fleet.shutdown().await;
}

#[tokio::test]
async fn test_failed_reload_message() {
    let mut fleet = Fleet::start(vec![sleeper("a").with_start_at_launch(false)]).await;

    fleet.source.fail();
    let response = fleet.request(Request::Reload).await;
    assert_eq!(
        response.to_string(),
        "Failed to reload configuration: no task to run."
    );

    fleet.shutdown().await;
}

#[tokio::test]
async fn test_reload_rebuilds_only_changed_task() {
    let first = sleeper("first").with_grace(millis(400), millis(300));
    let second = sleeper("second").with_grace(millis(400), millis(300));
    let mut fleet = Fleet::start(vec![first.clone(), second.clone()]).await;
    fleet.wait_for_state(0, 0, "RUNNING").await;
    fleet.wait_for_state(1, 0, "RUNNING").await;

    let changed = second.with_args(["31"]);
    fleet.source.replace(fleet.config(vec![first, changed]));
    assert_eq!(reload(&mut fleet).await, Ok(()));

    let status = fleet.status().await;
    assert_eq!(status.tasks[0].processes[0].state, "RUNNING");
    assert_eq!(status.tasks[1].processes[0].state, "STARTING");
    assert_eq!(fleet.handle.config().tasks[1].args, vec!["31".to_string()]);

    fleet.shutdown().await;
}

#[tokio::test]
async fn test_reload_with_new_task_rebuilds_everything() {
    let first = sleeper("first").with_start_at_launch(false);
    let mut fleet = Fleet::start(vec![first.clone()]).await;
    assert_eq!(fleet.status().await.tasks.len(), 1);

    let added = sleeper("added").with_instances(2).with_start_at_launch(false);
    fleet.source.replace(fleet.config(vec![first, added]));
    assert_eq!(reload(&mut fleet).await, Ok(()));

    let status = fleet.status().await;
    assert_eq!(status.tasks.len(), 2);
    assert_eq!(status.tasks[1].name, "added");
    assert_eq!(status.tasks[1].processes.len(), 2);

    // Requests are validated against the new generation
    let response = fleet
        .request(Request::StartProcess {
            task_id: 1,
            process_id: 1,
        })
        .await;
    match response {
        Response::StartProcess(reply) => assert_eq!(reply.result, Ok(())),
        other => panic!("unexpected response {other:?}"),
    }

    fleet.shutdown().await;
}

#[tokio::test]
async fn test_reload_with_fewer_tasks() {
    let tasks = vec![
        sleeper("a").with_start_at_launch(false),
        sleeper("b").with_start_at_launch(false),
    ];
    let mut fleet = Fleet::start(tasks).await;

    fleet
        .source
        .replace(fleet.config(vec![sleeper("a").with_start_at_launch(false)]));
    assert_eq!(reload(&mut fleet).await, Ok(()));
    assert_eq!(fleet.status().await.tasks.len(), 1);

    fleet.shutdown().await;
}

#[tokio::test]
async fn test_config_subscribers_see_successful_reloads() {
    let task = sleeper("a").with_start_at_launch(false);
    let mut fleet = Fleet::start(vec![task.clone()]).await;

    let changes = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&changes);
    fleet.handle.subscribe_config(move |old, new| {
        assert_eq!(old.tasks[0].instances, 1);
        assert_eq!(new.tasks[0].instances, 3);
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    fleet.source.fail();
    assert!(reload(&mut fleet).await.is_err());
    assert_eq!(changes.load(Ordering::SeqCst), 0);

    fleet.source.replace(fleet.config(vec![task.with_instances(3)]));
    assert_eq!(reload(&mut fleet).await, Ok(()));
    assert_eq!(changes.load(Ordering::SeqCst), 1);
    assert_eq!(fleet.status().await.tasks[0].processes.len(), 3);

    fleet.shutdown().await;
}

#[tokio::test]
async fn test_reload_with_unwritable_log_dir_keeps_generation() {
    let task = sleeper("a").with_start_at_launch(false);
    let mut fleet = Fleet::start(vec![task.clone()]).await;
    let before = fleet.status().await;

    let missing = fleet.log_dir.path().join("does-not-exist");
    fleet
        .source
        .replace(taskmaster::Config::new(vec![task], missing));
    let result = reload(&mut fleet).await;
    assert!(result.unwrap_err().contains("failed to open log file"));

    assert_eq!(fleet.status().await, before);
    assert_eq!(fleet.handle.config().log_dir, fleet.log_dir.path());

    fleet.shutdown().await;
}
