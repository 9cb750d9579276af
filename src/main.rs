//! taskmaster binary: loads the configuration, starts the supervision tree
//! and serves the line-based control shell on stdin.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use taskmaster::{logging, shell, ConfigSource, JsonFileSource, MasterHandle, MasterSpec};
use tokio::io::BufReader;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "taskmaster")]
#[command(about = "Supervises a fleet of processes described by a JSON configuration")]
struct Args {
    /// Configuration file
    #[arg(short, long, value_name = "PATH", default_value = "./tmconfig.json")]
    config: PathBuf,

    /// Minimum level of emitted log records
    #[arg(long, value_name = "LEVEL", default_value = "info", value_parser = logging::parse_level)]
    log_level: slog::Level,

    /// Ignore SIGHUP instead of reloading the configuration
    #[arg(long)]
    no_hangup_reload: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _stderr_guard = slog_scope::set_global_logger(logging::build(args.log_level, None));

    let source = Arc::new(JsonFileSource::new(&args.config));
    let config = match source.load().await {
        Ok(config) => config,
        Err(err) => {
            slog::crit!(slog_scope::logger(), "failed to load configuration";
                "config" => %source.path().display(),
                "error" => %err
            );
            return Err(err.into());
        }
    };

    // From here on records are also kept under the log directory
    let (log_path, log_file) = logging::open_log_file(&config.log_dir)?;
    let _guard = slog_scope::set_global_logger(logging::build(args.log_level, Some(log_file)));
    slog::info!(slog_scope::logger(), "logging to file"; "path" => %log_path.display());

    let spec = MasterSpec::new(source).with_hangup_reload(!args.no_hangup_reload);
    let (handle, responses) = match MasterHandle::launch(spec, config) {
        Ok(started) => started,
        Err(err) => {
            slog::crit!(slog_scope::logger(), "failed to start";
                "config" => %args.config.display(),
                "error" => %err
            );
            return Err(err.into());
        }
    };

    shell::run(
        handle,
        responses,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;
    Ok(())
}
