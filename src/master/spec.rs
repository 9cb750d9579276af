//! Master supervisor specification and builder

use crate::config::{ConfigSource, JsonFileSource};
use std::path::PathBuf;
use std::sync::Arc;

/// Describes how a master supervisor obtains its configuration
#[derive(Clone)]
pub struct MasterSpec {
    pub(crate) name: String,
    pub(crate) source: Arc<dyn ConfigSource>,
    pub(crate) hangup_reload: bool,
}

impl MasterSpec {
    /// Creates a specification loading every generation from `source`
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self {
            name: String::from("taskmaster"),
            source,
            hangup_reload: false,
        }
    }

    /// Shorthand for a JSON configuration file
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(JsonFileSource::new(path)))
    }

    /// Sets the name used in logs and errors
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Reloads the configuration on every SIGHUP
    pub fn with_hangup_reload(mut self, enabled: bool) -> Self {
        self.hangup_reload = enabled;
        self
    }
}
