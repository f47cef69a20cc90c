//! Deferred work for the bridge.
//!
//! The chrome synchronizer never transmits inline: it defers one flush to run
//! after the current burst of synchronous mutations. Where that deferred task
//! runs is decided by a [`Scheduler`].

use std::cell::RefCell;
use std::collections::VecDeque;

pub type Task = Box<dyn FnOnce()>;

pub trait Scheduler {
    fn defer(&self, task: Task);
}

/// FIFO of deferred tasks, drained explicitly by the embedder's event loop
/// once the current turn of synchronous work has finished.
#[derive(Default)]
pub struct MicrotaskQueue {
    queue: RefCell<VecDeque<Task>>,
}

impl MicrotaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Run tasks until the queue is empty, including tasks deferred by the
    /// tasks being run. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            // The borrow must end before the task runs; tasks may defer more.
            let next = self.queue.borrow_mut().pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl Scheduler for MicrotaskQueue {
    fn defer(&self, task: Task) {
        self.queue.borrow_mut().push_back(task);
    }
}

impl std::fmt::Debug for MicrotaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicrotaskQueue")
            .field("pending", &self.len())
            .finish()
    }
}

/// Defers onto the current `tokio::task::LocalSet`.
///
/// Panics if used outside a `LocalSet`, like `spawn_local` itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTaskScheduler;

impl Scheduler for LocalTaskScheduler {
    fn defer(&self, task: Task) {
        tokio::task::spawn_local(async move { task() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn runs_in_fifo_order() {
        let queue = MicrotaskQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = Rc::clone(&log);
            queue.defer(Box::new(move || log.borrow_mut().push(i)));
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.run_until_idle(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn tasks_deferred_while_draining_also_run() {
        let queue = Rc::new(MicrotaskQueue::new());
        let hits = Rc::new(Cell::new(0));
        {
            let inner_queue = Rc::clone(&queue);
            let hits = Rc::clone(&hits);
            queue.defer(Box::new(move || {
                hits.set(hits.get() + 1);
                let hits = Rc::clone(&hits);
                inner_queue.defer(Box::new(move || hits.set(hits.get() + 10)));
            }));
        }
        assert_eq!(queue.run_until_idle(), 2);
        assert_eq!(hits.get(), 11);
    }

    #[tokio::test]
    async fn local_task_scheduler_runs_after_yield() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let hit = Rc::new(Cell::new(false));
                let flag = Rc::clone(&hit);
                LocalTaskScheduler.defer(Box::new(move || flag.set(true)));
                assert!(!hit.get());
                tokio::task::yield_now().await;
                assert!(hit.get());
            })
            .await;
    }
}
