//! Shared message channel with ordered subscriber dispatch.
//!
//! One [`Channel`] carries both terminal I/O and transfer control messages.
//! Consumers register a [`Subscriber`]; inbound frames are offered to the
//! newest subscriber first and fall through to older ones until somebody
//! returns [`Disposition::Handled`]. Transport errors and close notifications
//! reach every subscriber.
//!
//! ```text
//!   inbound text ──► [transfer interceptor] ──Pass──► [terminal echo]
//!                         │ Handled
//!                         ▼
//!                   transfer session
//! ```
//!
//! Dropping a [`Subscription`] removes its subscriber, so an interception
//! ends exactly when the transfer that installed it ends.

use crate::error::ChannelError;
use crate::message::{ClientMessage, Inbound};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc;

/// Outbound side of a connection
pub trait Transport: Send + Sync {
    /// Send one text frame
    fn send_text(&self, text: String) -> Result<(), ChannelError>;
}

/// Whether a subscriber consumed an inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Consumed; older subscribers do not see it
    Handled,
    /// Not interested; offer it to the next subscriber
    Pass,
}

/// Receives channel events.
///
/// Callbacks run on the delivering task while the subscriber list is locked,
/// so they must not subscribe or unsubscribe.
pub trait Subscriber: Send {
    /// Offer an inbound message
    fn on_message(&mut self, inbound: &Inbound) -> Disposition;

    /// Transport-level error
    fn on_error(&mut self, _error: &ChannelError) {}

    /// Channel closed
    fn on_close(&mut self) {}
}

/// Subscriber identifier, unique per channel
pub type SubscriptionId = u64;

struct Registered {
    id: SubscriptionId,
    subscriber: Box<dyn Subscriber>,
}

/// Bidirectional message channel shared by the terminal and transfers
pub struct Channel {
    transport: Box<dyn Transport>,
    /// Oldest first; dispatch walks it in reverse
    subscribers: Mutex<Vec<Registered>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl Channel {
    /// Create a channel over a transport
    pub fn new(transport: impl Transport + 'static) -> Arc<Self> {
        Arc::new(Self {
            transport: Box::new(transport),
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        })
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<Registered>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send a JSON control message
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed, encoding fails, or the
    /// transport rejects the frame.
    pub fn send(&self, message: &ClientMessage) -> Result<(), ChannelError> {
        let text = message.to_json()?;
        self.send_raw(text)
    }

    /// Send an unframed text frame (terminal keystrokes)
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed or the transport rejects the frame.
    pub fn send_raw(&self, text: impl Into<String>) -> Result<(), ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        self.transport.send_text(text.into())
    }

    /// Register a subscriber; it sees messages before every earlier one
    pub fn subscribe(self: &Arc<Self>, subscriber: impl Subscriber + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers().push(Registered {
            id,
            subscriber: Box::new(subscriber),
        });
        tracing::trace!("subscriber {} registered", id);

        Subscription {
            id,
            channel: Arc::downgrade(self),
        }
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers().retain(|r| r.id != id);
        tracing::trace!("subscriber {} removed", id);
    }

    /// Number of registered subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    /// Dispatch one inbound text frame
    ///
    /// Returns [`Disposition::Pass`] if no subscriber consumed it.
    pub fn deliver(&self, text: impl Into<String>) -> Disposition {
        let inbound = Inbound::parse(text);
        let mut subscribers = self.subscribers();

        for registered in subscribers.iter_mut().rev() {
            if registered.subscriber.on_message(&inbound) == Disposition::Handled {
                return Disposition::Handled;
            }
        }

        tracing::trace!("unclaimed inbound frame ({} bytes)", inbound.text.len());
        Disposition::Pass
    }

    /// Report a transport error to every subscriber, newest first
    pub fn deliver_error(&self, error: ChannelError) {
        tracing::warn!("channel error: {}", error);
        for registered in self.subscribers().iter_mut().rev() {
            registered.subscriber.on_error(&error);
        }
    }

    /// Close the channel and notify every subscriber, newest first
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!("channel closed");
        for registered in self.subscribers().iter_mut().rev() {
            registered.subscriber.on_close();
        }
    }

    /// Whether [`Channel::close`] has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Registration guard; unsubscribes on drop
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: SubscriptionId,
    channel: Weak<Channel>,
}

impl Subscription {
    /// Identifier of the registered subscriber
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.upgrade() {
            channel.unsubscribe(self.id);
        }
    }
}

/// Written to the terminal once the device login has been sent
pub const CONNECTED_BANNER: &str = "\r\n*** Connected to device terminal ***\r\n";

/// Written to the terminal when the channel closes
pub const CLOSED_BANNER: &str = "\r\n*** Connection closed ***\r\n";

/// Terminal output consumer: claims every message it is offered
pub struct TerminalEcho<F> {
    write: F,
}

impl<F> TerminalEcho<F>
where
    F: FnMut(&str) + Send,
{
    /// Echo every unclaimed frame through `write`
    pub fn new(write: F) -> Self {
        Self { write }
    }
}

impl<F> Subscriber for TerminalEcho<F>
where
    F: FnMut(&str) + Send,
{
    fn on_message(&mut self, inbound: &Inbound) -> Disposition {
        (self.write)(&inbound.text);
        Disposition::Handled
    }

    fn on_close(&mut self) {
        (self.write)(CLOSED_BANNER);
    }
}

/// In-process transport; every sent frame appears on the paired receiver
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    tx: mpsc::UnboundedSender<String>,
}

impl MemoryTransport {
    /// Create a transport and the receiver observing what it sends
    #[must_use]
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for MemoryTransport {
    fn send_text(&self, text: String) -> Result<(), ChannelError> {
        self.tx.send(text).map_err(|_| ChannelError::Closed)
    }
}
