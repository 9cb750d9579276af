//! Master supervisor handle - public API of a running supervision tree

use super::runtime::{MasterCommand, MasterRuntime};
use super::spec::MasterSpec;
use crate::cell::{ReactiveCell, SubscriberError};
use crate::config::Config;
use crate::error::SupervisorError;
use crate::messages::{Request, Response};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Handle used to control a running master supervisor.
///
/// Responses arrive on the receiver returned by [`MasterHandle::start`], in
/// the order the master produced them. The receiver yields `None` once the
/// master has shut down.
#[derive(Clone)]
pub struct MasterHandle {
    name: Arc<String>,
    control_tx: mpsc::UnboundedSender<MasterCommand>,
    config: Arc<ReactiveCell<Arc<Config>>>,
}

impl MasterHandle {
    /// Loads the configuration, prepares and launches the first generation.
    ///
    /// Configuration and log file errors are fatal here.
    pub async fn start(
        spec: MasterSpec,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Response>), SupervisorError> {
        let config = spec.source.load().await?;
        Self::launch(spec, config)
    }

    /// Launches the first generation from an already loaded configuration.
    ///
    /// Later reloads still go through the spec's source. Must be called from
    /// within a tokio runtime.
    pub fn launch(
        spec: MasterSpec,
        config: Config,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Response>), SupervisorError> {
        let config = Arc::new(ReactiveCell::new(Arc::new(config)));
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();

        let runtime = MasterRuntime::new(&spec, Arc::clone(&config), control_rx, response_tx)?;
        tokio::spawn(runtime.run());

        let handle = Self {
            name: Arc::new(spec.name),
            control_tx,
            config,
        };
        Ok((handle, response_rx))
    }

    /// Submits a control request
    pub fn send(&self, request: Request) -> Result<(), SupervisorError> {
        self.submit(MasterCommand::Request(request))
    }

    /// Parses and submits one line of textual control input.
    ///
    /// Malformed input is answered with [`Response::BadRequest`].
    pub fn submit_line(&self, line: &str) -> Result<(), SupervisorError> {
        let command = match line.parse::<Request>() {
            Ok(request) => MasterCommand::Request(request),
            Err(err) => MasterCommand::Rejected(err.to_string()),
        };
        self.submit(command)
    }

    /// Asks the master to reload its configuration
    pub fn reload(&self) -> Result<(), SupervisorError> {
        self.send(Request::Reload)
    }

    /// Requests a graceful shutdown of the whole tree
    pub fn shutdown(&self) -> Result<(), SupervisorError> {
        self.send(Request::Shutdown)
    }

    /// Currently installed configuration
    pub fn config(&self) -> Arc<Config> {
        self.config.get()
    }

    /// Registers a callback fired with `(old, new)` after every successful reload
    pub fn subscribe_config<F>(&self, callback: F)
    where
        F: Fn(&Config, &Config) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        self.config.subscribe(move |old, new| callback(old, new));
    }

    /// Returns the supervisor's name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    fn submit(&self, command: MasterCommand) -> Result<(), SupervisorError> {
        self.control_tx
            .send(command)
            .map_err(|_| SupervisorError::ShuttingDown(self.name().to_string()))
    }
}
