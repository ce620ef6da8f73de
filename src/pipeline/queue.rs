//! Bounded hand-off queues between adjacent pipeline stages.
//!
//! Each queue is a bounded crossbeam channel carrying `Option<T>`, where
//! `None` is the sentinel meaning "producer is done". A full queue blocks
//! the producer; that backpressure is the pipeline's only flow-control
//! mechanism. `recv_timeout` lets consumers re-check the cancellation flag
//! while the queue is empty.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Creates a bounded stage queue with the given capacity.
pub fn stage_queue<T>(capacity: usize) -> (StageSender<T>, StageReceiver<T>) {
    let (tx, rx) = bounded(capacity);
    (StageSender { tx }, StageReceiver { rx })
}

/// Result of a timed dequeue attempt.
#[derive(Debug)]
pub enum Dequeued<T> {
    /// A payload item.
    Item(T),
    /// The producer signalled end of input.
    Sentinel,
    /// Queue empty for the whole wait; caller should re-check cancellation.
    Empty,
    /// All senders dropped without a sentinel (producer died).
    Disconnected,
}

/// Producing end of a stage queue.
#[derive(Debug, Clone)]
pub struct StageSender<T> {
    tx: Sender<Option<T>>,
}

impl<T> StageSender<T> {
    /// Enqueues an item, blocking while the queue is full.
    ///
    /// Returns false if the consumer is gone.
    pub fn send(&self, item: T) -> bool {
        self.tx.send(Some(item)).is_ok()
    }

    /// Enqueues the end-of-input sentinel. Consumers receive items already
    /// queued before they observe the sentinel (FIFO).
    pub fn close(&self) {
        let _ = self.tx.send(None);
    }
}

/// Consuming end of a stage queue.
#[derive(Debug)]
pub struct StageReceiver<T> {
    rx: Receiver<Option<T>>,
}

impl<T> StageReceiver<T> {
    /// Dequeues with a bounded wait.
    pub fn recv_timeout(&self, timeout: Duration) -> Dequeued<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(Some(item)) => Dequeued::Item(item),
            Ok(None) => Dequeued::Sentinel,
            Err(RecvTimeoutError::Timeout) => Dequeued::Empty,
            Err(RecvTimeoutError::Disconnected) => Dequeued::Disconnected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const SHORT: Duration = Duration::from_millis(20);

    #[test]
    fn items_preserve_fifo_order() {
        let (tx, rx) = stage_queue(4);
        tx.send(1);
        tx.send(2);
        tx.send(3);

        for expected in 1..=3 {
            match rx.recv_timeout(SHORT) {
                Dequeued::Item(n) => assert_eq!(n, expected),
                other => panic!("expected item, got {:?}", other),
            }
        }
    }

    #[test]
    fn sentinel_arrives_after_queued_items() {
        let (tx, rx) = stage_queue(4);
        tx.send("a");
        tx.close();

        assert!(matches!(rx.recv_timeout(SHORT), Dequeued::Item("a")));
        assert!(matches!(rx.recv_timeout(SHORT), Dequeued::Sentinel));
    }

    #[test]
    fn empty_queue_times_out() {
        let (_tx, rx) = stage_queue::<u32>(2);
        assert!(matches!(rx.recv_timeout(SHORT), Dequeued::Empty));
    }

    #[test]
    fn dropped_sender_reports_disconnected() {
        let (tx, rx) = stage_queue::<u32>(2);
        drop(tx);
        assert!(matches!(rx.recv_timeout(SHORT), Dequeued::Disconnected));
    }

    #[test]
    fn full_queue_blocks_producer_until_consumed() {
        let (tx, rx) = stage_queue(1);
        tx.send(1);

        // Second send must block until the consumer drains one slot.
        let producer = thread::spawn(move || {
            tx.send(2);
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished(), "send should block on a full queue");

        assert!(matches!(rx.recv_timeout(SHORT), Dequeued::Item(1)));
        producer.join().unwrap();
        assert!(matches!(rx.recv_timeout(SHORT), Dequeued::Item(2)));
    }

    #[test]
    fn send_after_receiver_dropped_returns_false() {
        let (tx, rx) = stage_queue(1);
        drop(rx);
        assert!(!tx.send(7));
    }
}
