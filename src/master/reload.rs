//! Reconciliation of a freshly loaded configuration with the running tree

use super::runtime::{prepare_generation, prepare_task, shutdown_tasks, MasterRuntime};
use crate::config::Config;
use crate::error::SupervisorError;
use crate::task::{PreparedTask, TaskHandle};
use crate::types::TaskId;
use std::collections::VecDeque;
use std::sync::Arc;

impl MasterRuntime {
    /// Installs `next`, rebuilding only what changed.
    ///
    /// Every replacement is prepared before anything is torn down, so an
    /// error leaves the running generation as it was.
    pub(super) async fn apply(&mut self, next: Config) -> Result<(), SupervisorError> {
        let current = self.config.get();

        if current.requires_full_rebuild(&next) {
            self.rebuild_all(&next).await?;
        } else {
            self.rebuild_changed(&current, &next).await?;
        }

        if let Err(err) = self.config.set(Arc::new(next)) {
            slog::warn!(slog_scope::logger(), "configuration subscriber failed";
                "supervisor" => &self.name,
                "error" => %err
            );
        }
        slog::info!(slog_scope::logger(), "configuration reloaded"; "supervisor" => &self.name);
        Ok(())
    }

    async fn rebuild_all(&mut self, next: &Config) -> Result<(), SupervisorError> {
        let prepared = prepare_generation(next, &self.tasks_tx)?;

        slog::info!(slog_scope::logger(), "rebuilding every task";
            "supervisor" => &self.name,
            "previous" => self.tasks.len(),
            "next" => prepared.len()
        );

        let retired = std::mem::take(&mut self.tasks);
        shutdown_tasks(retired).await;
        // Old statuses are complete once every retired task has returned
        self.drain_tasks();

        self.pending = vec![VecDeque::new(); prepared.len()];
        self.tasks = prepared.into_iter().map(PreparedTask::launch).collect();
        Ok(())
    }

    async fn rebuild_changed(&mut self, current: &Config, next: &Config) -> Result<(), SupervisorError> {
        let changed = current.changed_tasks(next);
        if changed.is_empty() {
            return Ok(());
        }

        let mut prepared: Vec<(TaskId, PreparedTask)> = Vec::with_capacity(changed.len());
        for task_id in changed {
            if let Some(task) = next.tasks.get(task_id) {
                prepared.push((task_id, prepare_task(next, task_id, task, &self.tasks_tx)?));
            }
        }

        let mut slots: Vec<Option<TaskHandle>> =
            std::mem::take(&mut self.tasks).into_iter().map(Some).collect();
        let retired: Vec<TaskHandle> = prepared
            .iter()
            .filter_map(|(task_id, _)| slots.get_mut(*task_id).and_then(Option::take))
            .collect();

        slog::info!(slog_scope::logger(), "rebuilding changed tasks";
            "supervisor" => &self.name,
            "tasks" => ?prepared.iter().map(|(task_id, _)| *task_id).collect::<Vec<_>>()
        );

        shutdown_tasks(retired).await;
        self.drain_tasks();

        for (task_id, task) in prepared {
            if let Some(slot) = slots.get_mut(task_id) {
                *slot = Some(task.launch());
            }
        }
        self.tasks = slots.into_iter().flatten().collect();
        Ok(())
    }
}
