//! In-process FIFO task queues and the drain loop.
//!
//! Per-queue submission order is the pipeline's only sequencing mechanism:
//! the ingestion stage relies on it to run every Enrich task before the
//! Aggregate and Alert tasks of the same sync. Redelivery on failure gives
//! at-least-once semantics, so handlers must tolerate duplicates.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::stages::{dispatch, PipelineDeps};
use crate::tasks::{QueueName, Task};
use crate::traits::TaskQueue;

/// FIFO queues held in memory, one per name.
#[derive(Default)]
pub struct MemoryQueue {
    queues: Mutex<HashMap<QueueName, VecDeque<Task>>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest task on `queue`, if any.
    pub fn pop(&self, queue: QueueName) -> Option<Task> {
        self.queues
            .lock()
            .unwrap()
            .get_mut(&queue)
            .and_then(|q| q.pop_front())
    }

    pub fn len(&self, queue: QueueName) -> usize {
        self.queues
            .lock()
            .unwrap()
            .get(&queue)
            .map_or(0, |q| q.len())
    }

    pub fn is_empty(&self, queue: QueueName) -> bool {
        self.len(queue) == 0
    }
}

#[async_trait]
impl TaskQueue for MemoryQueue {
    async fn enqueue(&self, queue: QueueName, task: Task) -> Result<()> {
        self.queues
            .lock()
            .unwrap()
            .entry(queue)
            .or_default()
            .push_back(task);
        Ok(())
    }
}

/// Drains one queue in submission order, redelivering failed tasks to the
/// back of the line up to a retry cap.
pub struct QueueRunner {
    max_attempts: u32,
}

impl QueueRunner {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Process tasks until `name` is empty, including tasks enqueued by the
    /// handlers themselves. Returns the number of tasks that completed.
    pub async fn drain(
        &self,
        queue: &MemoryQueue,
        name: QueueName,
        deps: &PipelineDeps,
    ) -> Result<u32> {
        let mut completed = 0;
        let mut pending: VecDeque<(Task, u32)> = VecDeque::new();
        while let Some(task) = queue.pop(name) {
            pending.push_back((task, 0));
        }

        while let Some((task, attempts)) = pending.pop_front() {
            match dispatch(&task, deps).await {
                Ok(()) => completed += 1,
                Err(e) => {
                    let attempts = attempts + 1;
                    if attempts >= self.max_attempts {
                        warn!(kind = task.kind(), attempts, error = %e, "Task dropped after retry cap");
                    } else {
                        warn!(kind = task.kind(), attempts, error = %e, "Task failed, redelivering");
                        pending.push_back((task, attempts));
                    }
                }
            }
            // Tasks enqueued by the handler join behind any redeliveries.
            while let Some(task) = queue.pop(name) {
                pending.push_back((task, 0));
            }
        }
        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::tasks::AlertTask;

    fn alert_task() -> Task {
        Task::Alert(AlertTask {
            list_id: Uuid::new_v4(),
            since: Utc::now(),
        })
    }

    #[tokio::test]
    async fn queues_are_fifo_per_name() {
        let queue = MemoryQueue::new();
        let first = alert_task();
        let second = alert_task();
        let (Task::Alert(a), Task::Alert(b)) = (&first, &second) else {
            unreachable!()
        };
        let (a_id, b_id) = (a.list_id, b.list_id);

        queue.enqueue(QueueName::Pipeline, first).await.unwrap();
        queue.enqueue(QueueName::Pipeline, second).await.unwrap();
        queue.enqueue(QueueName::Email, alert_task()).await.unwrap();

        match queue.pop(QueueName::Pipeline) {
            Some(Task::Alert(t)) => assert_eq!(t.list_id, a_id),
            other => panic!("unexpected task: {other:?}"),
        }
        match queue.pop(QueueName::Pipeline) {
            Some(Task::Alert(t)) => assert_eq!(t.list_id, b_id),
            other => panic!("unexpected task: {other:?}"),
        }
        assert!(queue.pop(QueueName::Pipeline).is_none());
        assert_eq!(queue.len(QueueName::Email), 1);
    }
}
