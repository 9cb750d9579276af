// SIGHUP is process-wide, so this file holds a single test in its own binary.

use nix::sys::signal::{raise, Signal};
use std::path::Path;
use std::time::Duration;
use taskmaster::{MasterHandle, MasterSpec, Request, Response};
use tempfile::TempDir;

fn write_config(path: &Path, log_dir: &Path, instances: usize) {
    let json = format!(
        r#"{{
            "logDir": {:?},
            "tasks": [
                {{ "name": "idle", "command": "sleep", "arguments": ["30"],
                   "startAtLaunch": false, "instances": {instances} }}
            ]
        }}"#,
        log_dir.display().to_string()
    );
    std::fs::write(path, json).unwrap();
}

#[tokio::test]
async fn test_hangup_triggers_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tmconfig.json");
    let log_dir = dir.path().join("logs");
    write_config(&path, &log_dir, 1);

    let spec = MasterSpec::from_file(&path).with_hangup_reload(true);
    let (handle, mut responses) = MasterHandle::start(spec).await.unwrap();
    assert_eq!(handle.config().tasks[0].instances, 1);

    write_config(&path, &log_dir, 2);
    raise(Signal::SIGHUP).unwrap();

    let response = tokio::time::timeout(Duration::from_secs(10), responses.recv())
        .await
        .unwrap();
    assert_eq!(response, Some(Response::Reload(Ok(()))));
    assert_eq!(handle.config().tasks[0].instances, 2);

    handle.send(Request::Status).unwrap();
    let status = match responses.recv().await {
        Some(Response::Status(status)) => status,
        other => panic!("expected a status response, got {other:?}"),
    };
    assert_eq!(status.tasks[0].processes.len(), 2);
    assert!(status.tasks[0]
        .processes
        .iter()
        .all(|process| process.state == "NOT_STARTED"));

    handle.shutdown().unwrap();
    while responses.recv().await.is_some() {}
}
