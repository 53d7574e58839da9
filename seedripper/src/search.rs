//! Worker harness: the shared control block and the background thread that
//! drives an engine while the front-end polls.

use std::{
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
    thread,
};

use crossbeam::channel::{unbounded, Receiver};

/// The two words shared between a running search and its front-end: a
/// monotonic progress counter and a cooperative cancellation flag. Nothing
/// else crosses the thread boundary outside the result channel.
#[derive(Debug, Default)]
pub struct SearchControl {
    progress: AtomicU64,
    cancelled: AtomicBool,
}

impl SearchControl {
    pub fn new() -> SearchControl {
        SearchControl::default()
    }

    pub fn tick(&self, amount: u64) {
        self.progress.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn progress(&self) -> u64 {
        self.progress.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Runs an engine to completion on a background thread, delivering results
/// in batches. The channel closing signals completion; cancellation is the
/// engine's business via its `SearchControl`. Dropping the receiver tears
/// the worker down at its next send.
pub fn run_worker<I, T>(mut engine: I, batch_size: usize) -> Receiver<Vec<T>>
where
    I: Iterator<Item = T> + Send + 'static,
    T: Send + 'static,
{
    let (sender, receiver) = unbounded();
    thread::spawn(move || {
        let mut batch = Vec::with_capacity(batch_size);
        for row in engine.by_ref() {
            batch.push(row);
            if batch.len() >= batch_size && sender.send(std::mem::take(&mut batch)).is_err() {
                return;
            }
        }
        if !batch.is_empty() {
            let _ = sender.send(batch);
        }
    });
    receiver
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_progress_is_monotonic() {
        let control = SearchControl::new();
        control.tick(3);
        control.tick(4);
        assert_eq!(control.progress(), 7);
        assert!(!control.is_cancelled());
        control.cancel();
        assert!(control.is_cancelled());
    }

    #[test]
    fn test_worker_delivers_everything_in_order() {
        let receiver = run_worker(0..1000u32, 64);
        let received: Vec<u32> = receiver.iter().flatten().collect();
        assert_eq!(received, (0..1000).collect::<Vec<u32>>());
    }
}
