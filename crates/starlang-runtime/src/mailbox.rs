//! Selective-receive mailbox.
//!
//! A [`MessageBox`] holds two FIFO queues: messages nobody has asked for yet,
//! and consumers (pending [`pop`](MessageBox::pop) calls) waiting for a
//! message their predicate accepts.
//!
//! - `push` hands the message to the first waiting consumer that accepts it,
//!   otherwise buffers it at the tail.
//! - `pop` takes the first buffered message its predicate accepts, otherwise
//!   waits, optionally bounded by a timeout.
//!
//! Messages a predicate skips stay where they are, so the relative order of
//! everything left behind is preserved.

use parking_lot::Mutex;
use starlang_core::pattern::{Matcher, Predicate};
use starlang_core::{OtpError, Term};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;

/// Why a `pop` failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailboxError {
    /// No acceptable message arrived before the deadline.
    #[error("receive timed out")]
    Timeout,

    /// The mailbox was cleared, normally because its process died.
    #[error("mailbox closed: {0}")]
    Closed(Term),
}

impl From<MailboxError> for OtpError {
    fn from(err: MailboxError) -> Self {
        match err {
            MailboxError::Timeout => OtpError::timeout(),
            MailboxError::Closed(reason) => OtpError::new(reason),
        }
    }
}

type Resolution = Result<Term, MailboxError>;

struct Consumer {
    id: u64,
    predicate: Predicate,
    tx: oneshot::Sender<Resolution>,
}

#[derive(Default)]
struct Inner {
    messages: VecDeque<Term>,
    consumers: VecDeque<Consumer>,
    next_id: u64,
    closed: Option<Term>,
}

impl Inner {
    /// Hands `message` to the first waiting consumer that accepts it, or
    /// gives it back when nobody does.
    fn offer(&mut self, message: Term) -> Option<Term> {
        let mut message = message;
        let mut index = 0;
        while index < self.consumers.len() {
            let predicate = self.consumers[index].predicate.clone();
            let accepted = match catch_unwind(AssertUnwindSafe(|| predicate.matches(&message))) {
                Ok(accepted) => accepted,
                Err(_) => {
                    tracing::warn!(%message, "receive predicate panicked; skipping consumer");
                    false
                }
            };

            if !accepted {
                index += 1;
                continue;
            }

            let Some(consumer) = self.consumers.remove(index) else {
                break;
            };
            match consumer.tx.send(Ok(message)) {
                Ok(()) => return None,
                // The waiting `pop` went away; offer the message to the next one.
                Err(Ok(returned)) => message = returned,
                Err(Err(_)) => return None,
            }
        }
        Some(message)
    }
}

/// A process mailbox with predicate-based, timeout-bounded consumption.
///
/// Predicates run while the mailbox is locked and must not touch the same
/// mailbox.
///
/// # Examples
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use starlang_core::{pattern, Term};
/// use starlang_runtime::MessageBox;
/// use std::sync::Arc;
///
/// let mailbox = MessageBox::new();
/// mailbox.push(Term::from("x"));
/// mailbox.push(Term::from("y"));
///
/// let only_y = Arc::new(|m: &Term| m.as_str() == Some("y"));
/// assert_eq!(mailbox.pop(only_y, None).await.unwrap(), Term::from("y"));
/// assert_eq!(mailbox.pop(pattern::any(), None).await.unwrap(), Term::from("x"));
/// # }
/// ```
#[derive(Default)]
pub struct MessageBox {
    inner: Mutex<Inner>,
}

impl MessageBox {
    /// Creates an empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a message.
    ///
    /// The first pending consumer (in `pop` order) whose predicate accepts
    /// the message receives it directly; otherwise it is buffered. A
    /// predicate that panics is treated as a rejection. Pushing into a
    /// cleared mailbox drops the message.
    pub fn push(&self, message: Term) {
        let mut inner = self.inner.lock();
        if inner.closed.is_some() {
            tracing::trace!(%message, "dropping message for closed mailbox");
            return;
        }
        if let Some(message) = inner.offer(message) {
            inner.messages.push_back(message);
        }
    }

    /// Puts back a message a dropped `pop` had already been handed. It goes
    /// to the head of the buffer unless another consumer claims it.
    fn restore(&self, message: Term) {
        let mut inner = self.inner.lock();
        if inner.closed.is_some() {
            return;
        }
        if let Some(message) = inner.offer(message) {
            inner.messages.push_front(message);
        }
    }

    /// Removes and returns the first buffered message `predicate` accepts,
    /// without waiting.
    pub fn try_pop(&self, predicate: &dyn Matcher) -> Option<Term> {
        let mut inner = self.inner.lock();
        let position = inner.messages.iter().position(|m| predicate.matches(m))?;
        inner.messages.remove(position)
    }

    /// Waits for a message `predicate` accepts.
    ///
    /// With `timeout = None` the call waits until a message arrives or the
    /// mailbox is cleared. On timeout the pending consumer is withdrawn, so
    /// it can never swallow a later message; a message that raced the timer
    /// is returned rather than lost.
    ///
    /// Dropping the returned future also withdraws the consumer. If a
    /// message had already been handed to it, the message is put back at
    /// the head of the mailbox.
    pub async fn pop(
        &self,
        predicate: Predicate,
        timeout: Option<Duration>,
    ) -> Result<Term, MailboxError> {
        let (id, rx) = {
            let mut inner = self.inner.lock();
            if let Some(reason) = &inner.closed {
                return Err(MailboxError::Closed(reason.clone()));
            }

            if let Some(position) = inner.messages.iter().position(|m| predicate.matches(m)) {
                if let Some(message) = inner.messages.remove(position) {
                    return Ok(message);
                }
            }

            let (tx, rx) = oneshot::channel();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.consumers.push_back(Consumer { id, predicate, tx });
            (id, rx)
        };

        let mut waiting = Waiting {
            mailbox: self,
            id,
            rx,
        };

        let resolution = match timeout {
            None => (&mut waiting.rx).await,
            Some(duration) => match tokio::time::timeout(duration, &mut waiting.rx).await {
                Ok(resolution) => resolution,
                Err(_) => {
                    waiting.withdraw();
                    return match waiting.rx.try_recv() {
                        Ok(resolution) => resolution,
                        Err(_) => Err(MailboxError::Timeout),
                    };
                }
            },
        };

        // The sender only disappears without a value if the mailbox itself
        // was dropped, which is a closed mailbox as far as we are concerned.
        resolution.unwrap_or_else(|_| Err(MailboxError::Closed(starlang_core::reason::normal())))
    }

    /// Discards every buffered message and fails every pending consumer with
    /// `reason`. Later pops fail immediately and later pushes are dropped.
    pub fn clear(&self, reason: Term) {
        let (messages, consumers) = {
            let mut inner = self.inner.lock();
            inner.closed = Some(reason.clone());
            (
                std::mem::take(&mut inner.messages),
                std::mem::take(&mut inner.consumers),
            )
        };

        tracing::trace!(
            discarded = messages.len(),
            rejected = consumers.len(),
            %reason,
            "mailbox cleared"
        );

        for consumer in consumers {
            let _ = consumer.tx.send(Err(MailboxError::Closed(reason.clone())));
        }
    }

    /// Number of buffered messages.
    pub fn len(&self) -> usize {
        self.inner.lock().messages.len()
    }

    /// Returns `true` if no message is buffered.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().messages.is_empty()
    }

    /// Number of `pop` calls currently waiting.
    pub fn pending_consumers(&self) -> usize {
        self.inner.lock().consumers.len()
    }

    /// Returns `true` once [`clear`](Self::clear) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed.is_some()
    }
}

impl std::fmt::Debug for MessageBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MessageBox")
            .field("messages", &inner.messages.len())
            .field("consumers", &inner.consumers.len())
            .field("closed", &inner.closed.is_some())
            .finish()
    }
}

/// A registered consumer owned by an in-flight `pop`.
struct Waiting<'a> {
    mailbox: &'a MessageBox,
    id: u64,
    rx: oneshot::Receiver<Resolution>,
}

impl Waiting<'_> {
    /// Removes the consumer record. Returns `false` if `push` or `clear`
    /// already resolved it.
    fn withdraw(&self) -> bool {
        let mut inner = self.mailbox.inner.lock();
        match inner.consumers.iter().position(|c| c.id == self.id) {
            Some(position) => {
                inner.consumers.remove(position);
                true
            }
            None => false,
        }
    }
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        if self.withdraw() {
            return;
        }
        // Resolved but never observed; hand the message back.
        if let Ok(Ok(message)) = self.rx.try_recv() {
            self.mailbox.restore(message);
        }
    }
}
