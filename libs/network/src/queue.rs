//! Inbound message queue.
//!
//! Unbounded MPSC FIFO between the per-link receiver tasks (producers) and
//! the actor's tick loop (sole consumer). Per-producer arrival order is
//! preserved; interleaving across producers is "first observed", which is
//! exactly Lamport's model: causal order is recovered from clock values,
//! not queue position.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use types::Message;

/// Cloneable producer handle, one per peer receiver task.
#[derive(Debug, Clone)]
pub struct QueueSender {
    tx: Sender<Message>,
}

impl QueueSender {
    /// Enqueue a message. Never blocks and never fails while the queue is
    /// alive (the channel is unbounded); a message pushed after the consumer
    /// is gone is dropped, which only happens during shutdown.
    pub fn push(&self, message: Message) {
        let _ = self.tx.send(message);
    }
}

/// Consumer side, owned by the tick loop.
#[derive(Debug)]
pub struct InboundQueue {
    rx: Receiver<Message>,
    tx: Sender<Message>,
}

impl InboundQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        InboundQueue { rx, tx }
    }

    /// New producer handle for a receiver task.
    pub fn sender(&self) -> QueueSender {
        QueueSender {
            tx: self.tx.clone(),
        }
    }

    /// Pop one message if any is present. Non-blocking; an empty queue is a
    /// normal `None`, not an error.
    pub fn try_pop(&self) -> Option<Message> {
        match self.rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Instantaneous queue length. Used for backlog logging; the value is a
    /// snapshot and may be stale the moment it is read.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for InboundQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ActorId;

    fn msg(sender: u32, clock: u64) -> Message {
        Message::new(ActorId::new(sender), clock)
    }

    #[test]
    fn empty_queue_pops_none() {
        let queue = InboundQueue::new();
        assert_eq!(queue.try_pop(), None);
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn fifo_order_from_one_producer() {
        let queue = InboundQueue::new();
        let sender = queue.sender();
        for clock in 1..=5 {
            sender.push(msg(1, clock));
        }
        for clock in 1..=5 {
            assert_eq!(queue.try_pop(), Some(msg(1, clock)));
        }
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn len_is_pre_pop_snapshot() {
        let queue = InboundQueue::new();
        let sender = queue.sender();
        sender.push(msg(1, 1));
        sender.push(msg(1, 2));
        sender.push(msg(1, 3));

        // The tick loop reads the length before popping.
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_pop(), Some(msg(1, 1)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn per_producer_order_survives_concurrent_pushes() {
        let queue = InboundQueue::new();
        let mut handles = Vec::new();
        for producer in 0..4u32 {
            let sender = queue.sender();
            handles.push(std::thread::spawn(move || {
                for clock in 0..250u64 {
                    sender.push(msg(producer, clock));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.len(), 1000);
        let mut last_seen = [None::<u64>; 4];
        while let Some(message) = queue.try_pop() {
            let slot = &mut last_seen[message.sender.inner() as usize];
            if let Some(prev) = *slot {
                assert!(message.clock > prev, "per-producer order violated");
            }
            *slot = Some(message.clock);
        }
        assert_eq!(last_seen, [Some(249); 4]);
    }

    #[test]
    fn push_after_consumer_drop_does_not_panic() {
        let queue = InboundQueue::new();
        let sender = queue.sender();
        drop(queue);
        sender.push(msg(1, 1));
    }
}
