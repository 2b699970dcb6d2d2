//! Delivery queue between callers and the connection worker.
//!
//! A bounded `crossbeam-channel` carries [`QueueItem`]s. Shutdown is
//! broadcast by dropping the only sender of a zero-capacity channel, which
//! wakes every waiter at once. Ordering is FIFO on the failure-free path; a
//! requeued event goes to the back, behind anything enqueued meanwhile.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{
    Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError, bounded, select,
};
use parking_lot::Mutex;
use thiserror::Error;

use crate::event::LogEvent;

/// Items travelling through the queue.
#[derive(Debug)]
pub enum QueueItem {
    Event(LogEvent),
    /// Acknowledged once every earlier item has been handled.
    Flush(Sender<()>),
}

/// Reasons an item could not be enqueued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("delivery queue is full")]
    Full,
    #[error("delivery queue is shut down")]
    Closed,
}

/// One-shot broadcast used to stop the worker.
#[derive(Clone, Debug)]
pub struct Shutdown {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    signal: Receiver<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            trigger: Arc::new(Mutex::new(Some(tx))),
            signal: rx,
        }
    }

    /// Fire the signal. Later calls have no effect.
    pub fn trigger(&self) {
        self.trigger.lock().take();
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self.signal.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleep for `timeout` unless shutdown fires first.
    ///
    /// Returns `true` when woken by shutdown.
    pub fn wait(&self, timeout: Duration) -> bool {
        matches!(
            self.signal.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected)
        )
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller side of the queue.
#[derive(Clone, Debug)]
pub struct QueueProducer {
    tx: Sender<QueueItem>,
    shutdown: Shutdown,
}

/// Worker side of the queue.
#[derive(Debug)]
pub struct QueueConsumer {
    rx: Receiver<QueueItem>,
    requeue_tx: Sender<QueueItem>,
    shutdown: Shutdown,
}

/// Create a queue holding at most `capacity` pending items.
pub fn delivery_queue(capacity: usize) -> (QueueProducer, QueueConsumer) {
    let (tx, rx) = bounded(capacity);
    let shutdown = Shutdown::new();
    let producer = QueueProducer {
        tx: tx.clone(),
        shutdown: shutdown.clone(),
    };
    let consumer = QueueConsumer {
        rx,
        requeue_tx: tx,
        shutdown,
    };
    (producer, consumer)
}

fn try_push(tx: &Sender<QueueItem>, shutdown: &Shutdown, item: QueueItem) -> Result<(), QueueError> {
    if shutdown.is_triggered() {
        return Err(QueueError::Closed);
    }
    tx.try_send(item).map_err(|err| match err {
        TrySendError::Full(_) => QueueError::Full,
        TrySendError::Disconnected(_) => QueueError::Closed,
    })
}

impl QueueProducer {
    /// Append without blocking.
    pub fn push(&self, item: QueueItem) -> Result<(), QueueError> {
        try_push(&self.tx, &self.shutdown, item)
    }

    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }
}

impl QueueConsumer {
    /// Block until an item arrives or shutdown is requested.
    pub fn next(&self) -> Option<QueueItem> {
        if self.shutdown.is_triggered() {
            return None;
        }
        select! {
            recv(self.rx) -> item => item.ok(),
            recv(self.shutdown.signal) -> _ => None,
        }
    }

    /// Put a failed event back at the end of the queue.
    pub fn requeue(&self, event: LogEvent) -> Result<(), QueueError> {
        try_push(&self.requeue_tx, &self.shutdown, QueueItem::Event(event))
    }

    pub fn shutdown_signal(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Sleep up to `timeout`, returning `true` if shutdown interrupted it.
    pub fn wait_for_shutdown(&self, timeout: Duration) -> bool {
        self.shutdown.wait(timeout)
    }

    /// Drop everything still queued, acknowledging pending flushes.
    ///
    /// Returns the number of events discarded.
    pub fn discard_pending(&self) -> usize {
        let mut discarded = 0;
        while let Ok(item) = self.rx.try_recv() {
            match item {
                QueueItem::Event(_) => discarded += 1,
                QueueItem::Flush(ack) => drop(ack),
            }
        }
        discarded
    }
}
