/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! Priority + deduplicating background task runner.
//!
//! A fixed worker pool consumes `(priority, seq, name, task)` entries from
//! one heap. Smaller priority runs first; equal priorities run FIFO by
//! submission sequence. A task whose name is already queued *or* running is
//! silently dropped; the name clears when the task finishes either way.

use crate::error::EngineResult;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Smaller value runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskPriority {
  /// Incremental updates the caller is actively waiting on
  High = 1,
  Normal = 5,
  /// Historical backfill
  Low = 10,
}

type TaskFuture = BoxFuture<'static, EngineResult<()>>;

struct QueuedTask {
  priority: TaskPriority,
  seq: u64,
  name: String,
  fut: TaskFuture,
}

impl PartialEq for QueuedTask {
  fn eq(&self, other: &Self) -> bool {
    self.priority == other.priority && self.seq == other.seq
  }
}

impl Eq for QueuedTask {}

impl PartialOrd for QueuedTask {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for QueuedTask {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    (self.priority, self.seq).cmp(&(other.priority, other.seq))
  }
}

struct State {
  heap: BinaryHeap<Reverse<QueuedTask>>,
  pending: HashSet<String>,
}

/// Counters exposed for the stats surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkQueueStats {
  pub queue_depth: usize,
  pub pending: usize,
  pub completed: u64,
  pub failed: u64,
  pub workers: usize,
}

pub struct WorkQueue {
  state: Mutex<State>,
  notify: Notify,
  running: AtomicBool,
  seq: AtomicU64,
  completed: AtomicU64,
  failed: AtomicU64,
  worker_count: usize,
  handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkQueue {
  /// Spawn `workers` consumer tasks and hand back the shared queue.
  pub fn start(workers: usize) -> Arc<Self> {
    let workers = workers.max(1);
    let queue = Arc::new(Self {
      state: Mutex::new(State { heap: BinaryHeap::new(), pending: HashSet::new() }),
      notify: Notify::new(),
      running: AtomicBool::new(true),
      seq: AtomicU64::new(0),
      completed: AtomicU64::new(0),
      failed: AtomicU64::new(0),
      worker_count: workers,
      handles: Mutex::new(Vec::new()),
    });

    let mut handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
      let q = queue.clone();
      handles.push(tokio::spawn(async move { q.worker_loop(worker_id).await }));
    }
    *lock(&queue.handles) = handles;

    info!("work queue started with {} workers", workers);
    queue
  }

  /// Submit a named task. Returns `false` when a task with the same name is
  /// already queued or running (the submission is dropped), or after
  /// shutdown.
  pub fn submit<F>(&self, priority: TaskPriority, name: impl Into<String>, fut: F) -> bool
  where
    F: std::future::Future<Output = EngineResult<()>> + Send + 'static,
  {
    let name = name.into();
    if !self.running.load(Ordering::SeqCst) {
      warn!("work queue is shut down, dropping task: {}", name);
      return false;
    }

    {
      let mut state = lock(&self.state);
      if state.pending.contains(&name) {
        debug!("task already pending, dropped: {}", name);
        return false;
      }
      state.pending.insert(name.clone());
      let seq = self.seq.fetch_add(1, Ordering::SeqCst);
      state.heap.push(Reverse(QueuedTask { priority, seq, name, fut: Box::pin(fut) }));
    }

    self.notify.notify_one();
    true
  }

  async fn worker_loop(self: Arc<Self>, worker_id: usize) {
    loop {
      let task = lock(&self.state).heap.pop();

      match task {
        Some(Reverse(task)) => {
          let QueuedTask { priority, name, fut, .. } = task;
          debug!("[worker-{}] running task: {} (priority {:?})", worker_id, name, priority);
          let started = Instant::now();

          match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(())) => {
              self.completed.fetch_add(1, Ordering::SeqCst);
              info!("[worker-{}] task done: {} ({:.2?})", worker_id, name, started.elapsed());
            }
            Ok(Err(e)) => {
              self.failed.fetch_add(1, Ordering::SeqCst);
              error!("[worker-{}] task failed: {} - {}", worker_id, name, e);
            }
            Err(_) => {
              self.failed.fetch_add(1, Ordering::SeqCst);
              error!("[worker-{}] task panicked: {}", worker_id, name);
            }
          }

          lock(&self.state).pending.remove(&name);
        }
        None => {
          if !self.running.load(Ordering::SeqCst) {
            break;
          }
          // The timeout covers the race between a submit and this wait.
          let _ = tokio::time::timeout(Duration::from_millis(200), self.notify.notified()).await;
        }
      }
    }
    debug!("[worker-{}] stopped", worker_id);
  }

  /// Drain remaining tasks, then stop the workers, waiting at most
  /// `timeout` per worker.
  pub async fn shutdown(&self, timeout: Duration) {
    info!("shutting down work queue");
    self.running.store(false, Ordering::SeqCst);
    self.notify.notify_waiters();

    let handles: Vec<JoinHandle<()>> = lock(&self.handles).drain(..).collect();
    for handle in handles {
      if tokio::time::timeout(timeout, handle).await.is_err() {
        warn!("worker did not stop within {:?}", timeout);
      }
    }
    info!("work queue stopped");
  }

  /// Block until nothing is queued or running.
  pub async fn wait_idle(&self) {
    loop {
      let idle = {
        let state = lock(&self.state);
        state.heap.is_empty() && state.pending.is_empty()
      };
      if idle {
        return;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }
  }

  pub fn stats(&self) -> WorkQueueStats {
    let state = lock(&self.state);
    WorkQueueStats {
      queue_depth: state.heap.len(),
      pending: state.pending.len(),
      completed: self.completed.load(Ordering::SeqCst),
      failed: self.failed.load(Ordering::SeqCst),
      workers: self.worker_count,
    }
  }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl std::fmt::Debug for WorkQueue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let stats = self.stats();
    f.debug_struct("WorkQueue")
      .field("queue_depth", &stats.queue_depth)
      .field("workers", &stats.workers)
      .finish()
  }
}
