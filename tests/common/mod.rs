// Helpers shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use taskmaster::{
    Config, ConfigError, ConfigSource, FleetStatus, MasterHandle, MasterSpec, ReactiveCell,
    Request, Response, TaskConfig,
};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration source kept in memory so tests can swap generations
pub struct MemorySource {
    current: ReactiveCell<Option<Config>>,
}

impl MemorySource {
    pub fn new(config: Config) -> Arc<Self> {
        Arc::new(Self {
            current: ReactiveCell::new(Some(config)),
        })
    }

    /// Next load returns `config`
    pub fn replace(&self, config: Config) {
        self.current.set(Some(config)).unwrap();
    }

    /// Next load fails
    pub fn fail(&self) {
        self.current.set(None).unwrap();
    }
}

#[async_trait]
impl ConfigSource for MemorySource {
    async fn load(&self) -> Result<Config, ConfigError> {
        let config = self.current.get().ok_or(ConfigError::NoTasks)?;
        config.validate()?;
        Ok(config)
    }
}

/// A running master with its response channel and log directory
pub struct Fleet {
    pub handle: MasterHandle,
    pub responses: UnboundedReceiver<Response>,
    pub source: Arc<MemorySource>,
    pub log_dir: TempDir,
}

impl Fleet {
    pub async fn start(tasks: Vec<TaskConfig>) -> Fleet {
        let log_dir = TempDir::new().unwrap();
        let config = Config::new(tasks, log_dir.path());
        let source = MemorySource::new(config);
        let spec = MasterSpec::new(source.clone()).with_name("test-master");
        let (handle, responses) = MasterHandle::start(spec).await.unwrap();
        Fleet {
            handle,
            responses,
            source,
            log_dir,
        }
    }

    /// Configuration using this fleet's log directory
    pub fn config(&self, tasks: Vec<TaskConfig>) -> Config {
        Config::new(tasks, self.log_dir.path())
    }

    pub async fn next_response(&mut self) -> Response {
        tokio::time::timeout(RESPONSE_TIMEOUT, self.responses.recv())
            .await
            .expect("timed out waiting for a response")
            .expect("response channel closed")
    }

    pub async fn request(&mut self, request: Request) -> Response {
        self.handle.send(request).unwrap();
        self.next_response().await
    }

    pub async fn status(&mut self) -> FleetStatus {
        self.handle.send(Request::Status).unwrap();
        loop {
            if let Response::Status(status) = self.next_response().await {
                return status;
            }
        }
    }

    pub async fn state_of(&mut self, task_id: usize, process_id: usize) -> String {
        let status = self.status().await;
        status.tasks[task_id].processes[process_id].state.clone()
    }

    /// Polls until the process reports `expected`
    pub async fn wait_for_state(&mut self, task_id: usize, process_id: usize, expected: &str) {
        let deadline = tokio::time::Instant::now() + RESPONSE_TIMEOUT;
        loop {
            let state = self.state_of(task_id, process_id).await;
            if state == expected {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "process {task_id}/{process_id} stuck in '{state}', expected '{expected}'"
            );
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    pub async fn shutdown(mut self) {
        self.handle.shutdown().unwrap();
        let closed = tokio::time::timeout(RESPONSE_TIMEOUT, async {
            while self.responses.recv().await.is_some() {}
        })
        .await;
        assert!(closed.is_ok(), "master did not close its response channel");
    }
}

pub fn sleeper(name: &str) -> TaskConfig {
    TaskConfig::new(name, "sleep").with_args(["30"])
}

pub fn shell(name: &str, script: &str) -> TaskConfig {
    TaskConfig::new(name, "sh").with_args(["-c", script])
}

pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
