//! # Receipt Sinks
//!
//! `ChannelReceiptSink` hands receipts to a bounded mpsc channel the runtime
//! drains. When the channel is full the receipt is dropped with a warning:
//! a slow consumer must never stall request handling.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::ports::{Receipt, ReceiptSink};

/// Receipt sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReceiptSink;

impl ReceiptSink for NoOpReceiptSink {
    fn send_receipt(&self, _receipt: &Receipt) {}
}

/// Receipt sink publishing onto a bounded channel.
pub struct ChannelReceiptSink {
    topic: String,
    sender: mpsc::Sender<Receipt>,
}

impl ChannelReceiptSink {
    /// Create the sink and the receiver to drain.
    pub fn new(topic: impl Into<String>, capacity: usize) -> (Self, mpsc::Receiver<Receipt>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                topic: topic.into(),
                sender,
            },
            receiver,
        )
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl ReceiptSink for ChannelReceiptSink {
    fn send_receipt(&self, receipt: &Receipt) {
        match self.sender.try_send(receipt.clone()) {
            Ok(()) => debug!(
                topic = %self.topic,
                receipt_id = ?receipt.receipt_id,
                request_id = receipt.request_id,
                "Queued receipt"
            ),
            Err(mpsc::error::TrySendError::Full(_)) => warn!(
                topic = %self.topic,
                request_id = receipt.request_id,
                "Receipt channel full, dropping receipt"
            ),
            Err(mpsc::error::TrySendError::Closed(_)) => warn!(
                topic = %self.topic,
                request_id = receipt.request_id,
                "Receipt channel closed, dropping receipt"
            ),
        }
    }
}
