//! Channel subscriber that claims transfer responses for the active session.

use crate::channel::{Disposition, Subscriber};
use crate::error::ChannelError;
use crate::message::{Inbound, MessageKind, ServerMessage};
use tokio::sync::mpsc;

/// Event forwarded from the channel to a running transfer
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TransferEvent {
    /// A message of one of the intercepted kinds
    Message(ServerMessage),
    /// Transport error (also seen by every other subscriber)
    Error(ChannelError),
    /// Channel closed
    Closed,
}

/// Claims messages of the given kinds and forwards them to the transfer task.
///
/// Everything else passes to older subscribers. Once the transfer has gone
/// away the interceptor stops claiming anything.
pub(crate) struct Interceptor {
    kinds: &'static [MessageKind],
    tx: mpsc::UnboundedSender<TransferEvent>,
}

impl Interceptor {
    pub(crate) fn new(kinds: &'static [MessageKind], tx: mpsc::UnboundedSender<TransferEvent>) -> Self {
        Self { kinds, tx }
    }
}

impl Subscriber for Interceptor {
    fn on_message(&mut self, inbound: &Inbound) -> Disposition {
        match &inbound.message {
            Some(message) if self.kinds.contains(&message.kind()) => {
                if self.tx.send(TransferEvent::Message(message.clone())).is_ok() {
                    Disposition::Handled
                } else {
                    Disposition::Pass
                }
            }
            _ => Disposition::Pass,
        }
    }

    fn on_error(&mut self, error: &ChannelError) {
        let _ = self.tx.send(TransferEvent::Error(error.clone()));
    }

    fn on_close(&mut self) {
        let _ = self.tx.send(TransferEvent::Closed);
    }
}

/// Next event for a transfer; a dropped sender counts as a close
pub(crate) async fn next_event(rx: &mut mpsc::UnboundedReceiver<TransferEvent>) -> TransferEvent {
    rx.recv().await.unwrap_or(TransferEvent::Closed)
}
