mod common;

use common::{sleeper, Fleet};
use std::time::Duration;
use taskmaster::shell;

#[tokio::test]
async fn test_shell_answers_commands_and_shuts_down_on_eof() {
    let fleet = Fleet::start(vec![sleeper("idle").with_start_at_launch(false)]).await;
    let Fleet {
        handle,
        responses,
        log_dir: _log_dir,
        ..
    } = fleet;

    let input: &[u8] = b"help\nstatus\n\nlaunch 1 2\nstop 0 0\n";
    let mut output = Vec::new();
    tokio::time::timeout(
        Duration::from_secs(10),
        shell::run(handle.clone(), responses, input, &mut output),
    )
    .await
    .expect("shell did not terminate")
    .unwrap();

    let output = String::from_utf8(output).unwrap();
    assert!(output.starts_with("commands:\n"), "{output}");
    assert!(output.contains("0 -- idle\n  0 -- NOT_STARTED\n"), "{output}");
    assert!(output.contains("Invalid request: invalid command: launch\n"), "{output}");
    assert!(output.contains("stop 0/0 failed: process is not running\n"), "{output}");

    // End of input shut the master down
    assert!(handle.send(taskmaster::Request::Status).is_err());
}
