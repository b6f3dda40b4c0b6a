//! Thread-safe FIFO buffer between the feed tasks and the delivery loop.

use crate::core::Alert;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Multi-producer, single-consumer alert buffer.
///
/// Every feed connection pushes records one at a time; the delivery loop
/// atomically removes everything queued at call time. The queue is unbounded,
/// so a push never blocks a feed task. The mutex is the only synchronization
/// point between the feed tasks and the delivery loop.
#[derive(Debug, Default)]
pub struct AlertQueue {
    inner: Mutex<VecDeque<Alert>>,
}

impl AlertQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one record. Insertion is atomic per record.
    pub fn push(&self, alert: Alert) {
        self.inner.lock().unwrap().push_back(alert);
    }

    /// Removes and returns every record queued at call time, oldest first.
    /// Returns an empty vec when nothing is queued.
    pub fn drain(&self) -> Vec<Alert> {
        self.inner.lock().unwrap().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn alert(msg: &str) -> Alert {
        Alert::new("test-search", msg, "listing")
    }

    #[test]
    fn test_drain_preserves_insertion_order() {
        let queue = AlertQueue::new();
        queue.push(alert("first"));
        queue.push(alert("second"));
        queue.push(alert("third"));

        let drained = queue.drain();
        let messages: Vec<_> = drained.iter().map(|a| a.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_drain_removes_everything() {
        let queue = AlertQueue::new();
        queue.push(alert("a"));
        queue.push(alert("b"));

        assert_eq!(queue.drain().len(), 2);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_concurrent_producers_lose_nothing() {
        let queue = Arc::new(AlertQueue::new());
        let mut handles = Vec::new();

        for producer in 0..4 {
            let queue = queue.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    queue.push(Alert::new(
                        format!("search-{producer}"),
                        format!("msg-{i}"),
                        "listing",
                    ));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.len(), 400);

        // Per-producer order must survive the interleaving.
        let drained = queue.drain();
        for producer in 0..4 {
            let from_producer: Vec<_> = drained
                .iter()
                .filter(|a| a.search_name == format!("search-{producer}"))
                .map(|a| a.message.clone())
                .collect();
            let expected: Vec<_> = (0..100).map(|i| format!("msg-{i}")).collect();
            assert_eq!(from_producer, expected);
        }
    }
}
