//! Line-based control front end

use crate::master::MasterHandle;
use crate::messages::Response;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

const HELP: &str = "\
commands:
  status                            status of every process
  start <task-id> <process-id>      start a process
  stop <task-id> <process-id>       stop a process
  restart <task-id> <process-id>    restart a process
  reload                            reload the configuration
  shutdown                          stop everything and exit
  help                              this message
";

/// Forwards commands read from `input` to the master and writes every
/// response to `output`.
///
/// End of input requests a shutdown. Returns once the master has closed its
/// response channel.
pub async fn run<R, W>(
    handle: MasterHandle,
    mut responses: mpsc::UnboundedReceiver<Response>,
    input: R,
    mut output: W,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut reading = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if reading => match line? {
                Some(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line == "help" {
                        output.write_all(HELP.as_bytes()).await?;
                        output.flush().await?;
                        continue;
                    }
                    if let Err(err) = handle.submit_line(line) {
                        slog::warn!(slog_scope::logger(), "command not delivered"; "error" => %err);
                    }
                }
                None => {
                    reading = false;
                    // Already gone when this fails; the response channel closes next
                    let _ = handle.shutdown();
                }
            },
            response = responses.recv() => match response {
                Some(response) => {
                    output.write_all(format!("{response}\n").as_bytes()).await?;
                    output.flush().await?;
                }
                None => break,
            },
        }
    }
    Ok(())
}
