//! Ingestion queue between the MIDI callback thread and the processing tick
//!
//! The driver callback only ever calls [`IngestSender::enqueue`]; the tick
//! owns the [`IngestQueue`] and drains it. Nothing else is shared between the
//! two contexts.

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::midi::InboundMessage;

/// Producer side, handed to the MIDI input callback
#[derive(Debug, Clone)]
pub struct IngestSender {
    tx: Sender<InboundMessage>,
}

impl IngestSender {
    /// Queue a message without blocking
    ///
    /// Returns false once the consumer is gone (shutdown), in which case the
    /// message is discarded.
    pub fn enqueue(&self, message: InboundMessage) -> bool {
        self.tx.send(message).is_ok()
    }
}

/// Consumer side, owned by the processing context
#[derive(Debug)]
pub struct IngestQueue {
    rx: Receiver<InboundMessage>,
}

impl IngestQueue {
    /// Create a connected sender/queue pair
    pub fn new() -> (IngestSender, IngestQueue) {
        let (tx, rx) = unbounded();
        (IngestSender { tx }, IngestQueue { rx })
    }

    /// Take every message queued at the time of the call, oldest first
    ///
    /// Messages enqueued while draining are left for the next call.
    pub fn drain(&self) -> Vec<InboundMessage> {
        let queued = self.rx.len();
        self.rx.try_iter().take(queued).collect()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::thread;

    fn msg(value: u8) -> InboundMessage {
        InboundMessage::control_change("test", 1, 1, value)
    }

    #[test]
    fn test_drain_empties_queue_in_order() {
        let (tx, queue) = IngestQueue::new();

        tx.enqueue(msg(1));
        tx.enqueue(msg(2));
        tx.enqueue(msg(3));
        assert_eq!(queue.len(), 3);

        let values: Vec<u8> = queue.drain().iter().map(|m| m.value).collect();
        assert_eq!(values, vec![1, 2, 3]);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_enqueue_after_consumer_dropped() {
        let (tx, queue) = IngestQueue::new();
        drop(queue);

        assert!(!tx.enqueue(msg(1)));
    }

    #[test]
    fn test_producer_thread_no_loss() {
        let (tx, queue) = IngestQueue::new();

        let producer = thread::spawn(move || {
            for i in 0..1000u32 {
                tx.enqueue(InboundMessage::control_change(
                    "thread",
                    1,
                    (i / 128) as u8,
                    (i % 128) as u8,
                ));
            }
        });

        let mut received = Vec::new();
        while received.len() < 1000 {
            received.extend(queue.drain());
            thread::yield_now();
        }
        producer.join().unwrap();

        for (i, m) in received.iter().enumerate() {
            assert_eq!(m.control as usize, i / 128);
            assert_eq!(m.value as usize, i % 128);
        }
        assert!(queue.drain().is_empty());
    }

    proptest! {
        /// Any interleaving of enqueues and drains yields every message exactly once, in order
        #[test]
        fn prop_fifo_no_loss_no_duplication(batches in prop::collection::vec(0usize..20, 0..30)) {
            let (tx, queue) = IngestQueue::new();
            let mut sent = Vec::new();
            let mut received = Vec::new();
            let mut next = 0u32;

            for batch in batches {
                for _ in 0..batch {
                    let m = InboundMessage::control_change("p", 1, (next / 128) as u8, (next % 128) as u8);
                    sent.push(m.clone());
                    tx.enqueue(m);
                    next += 1;
                }
                received.extend(queue.drain());
            }
            received.extend(queue.drain());

            prop_assert_eq!(sent, received);
        }
    }
}
