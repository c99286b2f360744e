//! Process execution context.
//!
//! A [`Context`] is the live handle of one process: its pid, mailbox, link
//! and monitor tables, process flags, and the signal state machine that turns
//! inbound signals into mailbox messages or termination.
//!
//! Other processes never touch a context directly. They go through the
//! [`Node`], which queues a [`Signal`] that the dispatcher later hands to
//! the target's signal handler.
//!
//! A context is alive until [`die`](Context::die) runs, exactly once. Dying
//! fans out `EXIT` signals to links and `DOWN` signals to monitors, clears
//! the mailbox, wakes anyone awaiting the exit and releases the node's
//! bookkeeping for the pid.

use crate::mailbox::MessageBox;
use crate::node::Node;
use crate::signal::{Dest, Signal};
use parking_lot::Mutex;
use starlang_core::pattern::{self, Pattern, Predicate};
use starlang_core::{reason, Atom, OtpError, Pid, Ref, Term};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// A recognized process flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessFlag {
    /// Deliver exit signals from links as `{'EXIT', From, Reason}` messages
    /// instead of terminating.
    TrapExit,
}

impl ProcessFlag {
    /// Looks a flag up by its atom name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "trap_exit" => Some(ProcessFlag::TrapExit),
            _ => None,
        }
    }

    /// The flag's atom name.
    pub fn name(&self) -> &'static str {
        match self {
            ProcessFlag::TrapExit => "trap_exit",
        }
    }
}

/// Current values of every process flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessFlags {
    /// See [`ProcessFlag::TrapExit`].
    pub trap_exit: bool,
}

impl ProcessFlags {
    fn get(&self, flag: ProcessFlag) -> bool {
        match flag {
            ProcessFlag::TrapExit => self.trap_exit,
        }
    }

    fn set(&mut self, flag: ProcessFlag, value: bool) {
        match flag {
            ProcessFlag::TrapExit => self.trap_exit = value,
        }
    }
}

enum Life {
    Alive,
    Dead(Term),
}

struct ProcessState {
    links: HashSet<Pid>,
    /// Monitors this process holds: ref to watchee.
    monitors: HashMap<Ref, Pid>,
    /// Monitors held on this process: ref to watcher.
    monitored_by: HashMap<Ref, Pid>,
    flags: ProcessFlags,
    life: Life,
}

pub(crate) struct ContextInner {
    pid: Pid,
    node: Node,
    mailbox: MessageBox,
    state: Mutex<ProcessState>,
    death: watch::Sender<Option<Term>>,
}

impl ContextInner {
    pub(crate) fn new(pid: Pid, node: Node) -> Self {
        Self {
            pid,
            node,
            mailbox: MessageBox::new(),
            state: Mutex::new(ProcessState {
                links: HashSet::new(),
                monitors: HashMap::new(),
                monitored_by: HashMap::new(),
                flags: ProcessFlags::default(),
                life: Life::Alive,
            }),
            death: watch::channel(None).0,
        }
    }
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        // Every handle is gone without the process having died: nothing can
        // reach it any more, so give its pid, names and routes back.
        if matches!(self.state.get_mut().life, Life::Alive) {
            tracing::debug!(pid = %self.pid, "unreachable process reclaimed");
            self.node.release(self.pid);
        }
    }
}

/// The execution context for a process.
///
/// Cloning a `Context` yields another handle to the same process.
///
/// # Examples
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use starlang_core::Term;
/// use starlang_runtime::Node;
///
/// let node = Node::default();
/// let echo = node
///     .spawn(|ctx| async move {
///         let msg = ctx.receive().await?;
///         let (from, body) = match msg.as_tuple() {
///             Some([from, body]) => (from.as_pid(), body.clone()),
///             _ => (None, msg.clone()),
///         };
///         if let Some(from) = from {
///             ctx.send(from, body)?;
///         }
///         Ok(())
///     })
///     .unwrap();
///
/// let me = node.make_context().unwrap();
/// me.send(echo, (me.pid(), Term::from("hi"))).unwrap();
/// assert_eq!(me.receive().await.unwrap(), Term::from("hi"));
/// # }
/// ```
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    pub(crate) fn from_inner(inner: Arc<ContextInner>) -> Self {
        Self { inner }
    }

    /// Returns this process's pid.
    pub fn pid(&self) -> Pid {
        self.inner.pid
    }

    /// Returns the node this process lives on.
    pub fn node(&self) -> &Node {
        &self.inner.node
    }

    /// Returns this process's mailbox.
    pub fn mailbox(&self) -> &MessageBox {
        &self.inner.mailbox
    }

    // ------------------------------------------------------------------
    // Receiving
    // ------------------------------------------------------------------

    /// Receives the next message.
    ///
    /// Fails only if the process dies while waiting, with the exit reason.
    pub async fn receive(&self) -> Result<Term, OtpError> {
        self.receive_match(pattern::any(), None).await
    }

    /// Receives the next message, failing with `timeout` after `timeout`.
    pub async fn receive_timeout(&self, timeout: Duration) -> Result<Term, OtpError> {
        self.receive_match(pattern::any(), Some(timeout)).await
    }

    /// Receives the first message `predicate` accepts, leaving the others
    /// in place.
    pub async fn receive_match(
        &self,
        predicate: Predicate,
        timeout: Option<Duration>,
    ) -> Result<Term, OtpError> {
        Ok(self.inner.mailbox.pop(predicate, timeout).await?)
    }

    /// Receives the first message matching `pattern`.
    pub async fn receive_pattern(
        &self,
        pattern: &Pattern,
        timeout: Option<Duration>,
    ) -> Result<Term, OtpError> {
        self.receive_match(pattern::compile(pattern), timeout).await
    }

    // ------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------

    /// Reads a process flag, first storing `value` if one is given.
    ///
    /// Returns the flag's value after the call.
    pub fn process_flag(&self, flag: ProcessFlag, value: Option<bool>) -> bool {
        let mut state = self.inner.state.lock();
        if let Some(value) = value {
            state.flags.set(flag, value);
        }
        state.flags.get(flag)
    }

    /// Like [`process_flag`](Self::process_flag), with the flag given by
    /// name. Unknown flags fail with `{badarg, Flag}`.
    pub fn process_flag_named(&self, name: &str, value: Option<bool>) -> Result<bool, OtpError> {
        let flag = ProcessFlag::from_name(name)
            .ok_or_else(|| OtpError::badarg_with(Term::atom(name)))?;
        Ok(self.process_flag(flag, value))
    }

    /// Returns a copy of every process flag.
    pub fn flags(&self) -> ProcessFlags {
        self.inner.state.lock().flags
    }

    /// Shorthand for `process_flag(ProcessFlag::TrapExit, Some(trap))`.
    pub fn trap_exit(&self, trap: bool) -> bool {
        self.process_flag(ProcessFlag::TrapExit, Some(trap))
    }

    // ------------------------------------------------------------------
    // Links, monitors, exits
    // ------------------------------------------------------------------

    /// Links this process with `other`.
    ///
    /// If `other` does not exist, this process receives an exit signal with
    /// reason `noproc`.
    pub fn link(&self, other: Pid) {
        self.inner.node.link(self.pid(), other);
    }

    /// Removes the link with `other`, if any.
    pub fn unlink(&self, other: Pid) {
        self.inner.node.unlink(self.pid(), other);
    }

    /// Starts monitoring `other`.
    ///
    /// A `{'DOWN', Ref, process, Other, Reason}` message arrives when it
    /// terminates, or right away with reason `noproc` if it is already gone.
    pub fn monitor(&self, other: Pid) -> Ref {
        self.inner.node.monitor(self.pid(), other)
    }

    /// Stops a monitor. No `DOWN` message is sent for it afterwards, but one
    /// already in the mailbox stays there.
    pub fn demonitor(&self, reference: Ref) {
        self.inner.node.demonitor(self.pid(), reference);
    }

    /// Sends an exit signal to `target`.
    pub fn exit(&self, target: Pid, reason: impl Into<Term>) -> Result<(), OtpError> {
        self.inner.node.exit(self.pid(), target, reason)
    }

    /// Terminates this process with `reason`.
    ///
    /// Returns the reason as an error so a process body can end with
    /// `return Err(ctx.exit_self(reason))`.
    pub fn exit_self(&self, reason: impl Into<Term>) -> OtpError {
        let reason = reason.into();
        self.die(reason.clone());
        OtpError::new(reason)
    }

    /// Transitions this process to dead. Calls after the first do nothing.
    ///
    /// `kill` is recorded as `killed`.
    pub fn die(&self, reason: impl Into<Term>) {
        let reason = reason::untrappable(reason.into());
        let (links, monitored_by) = {
            let mut state = self.inner.state.lock();
            if let Life::Dead(_) = state.life {
                return;
            }
            state.life = Life::Dead(reason.clone());
            state.monitors.clear();
            (
                std::mem::take(&mut state.links),
                std::mem::take(&mut state.monitored_by),
            )
        };

        let pid = self.pid();
        tracing::debug!(
            %pid,
            %reason,
            links = links.len(),
            monitors = monitored_by.len(),
            "process exited"
        );

        let node = &self.inner.node;
        for linked in links {
            let _ = node.signal(pid, Signal::Exit(reason.clone()), linked);
        }
        for (reference, watcher) in monitored_by {
            let _ = node.signal(pid, Signal::Down(reference, reason.clone()), watcher);
        }

        self.inner.mailbox.clear(reason.clone());
        self.inner.death.send_replace(Some(reason));
        node.release(pid);
    }

    // ------------------------------------------------------------------
    // Messaging and process services
    // ------------------------------------------------------------------

    /// Sends a message.
    ///
    /// Fails with `noproc` if the destination does not exist, or with
    /// `noconnection` if its node is unreachable.
    pub fn send(&self, to: impl Into<Dest>, message: impl Into<Term>) -> Result<(), OtpError> {
        self.inner
            .node
            .signal(self.pid(), Signal::Relay(message.into()), to)
    }

    /// Spawns a new process on this node.
    pub fn spawn<F, Fut>(&self, body: F) -> Result<Pid, OtpError>
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), OtpError>> + Send + 'static,
    {
        self.inner.node.spawn(body)
    }

    /// Spawns a new process linked to this one.
    pub fn spawn_link<F, Fut>(&self, body: F) -> Result<Pid, OtpError>
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), OtpError>> + Send + 'static,
    {
        self.inner.node.spawn_link(self.pid(), body)
    }

    /// Spawns a new process monitored by this one.
    pub fn spawn_monitor<F, Fut>(&self, body: F) -> Result<(Pid, Ref), OtpError>
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), OtpError>> + Send + 'static,
    {
        self.inner.node.spawn_monitor(self.pid(), body)
    }

    /// Registers `name` for this process.
    pub fn register(&self, name: impl Into<Atom>) -> Result<(), OtpError> {
        self.inner.node.register(self.pid(), name)
    }

    /// Looks up a registered name on this node.
    pub fn whereis(&self, name: impl Into<Atom>) -> Option<Pid> {
        self.inner.node.whereis(name)
    }

    /// Creates a fresh reference.
    pub fn make_ref(&self) -> Ref {
        self.inner.node.make_ref()
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Returns `true` until the process dies.
    pub fn is_alive(&self) -> bool {
        matches!(self.inner.state.lock().life, Life::Alive)
    }

    /// The exit reason, once dead.
    pub fn exit_reason(&self) -> Option<Term> {
        match &self.inner.state.lock().life {
            Life::Alive => None,
            Life::Dead(reason) => Some(reason.clone()),
        }
    }

    /// Waits for the process to die and returns the exit reason.
    pub async fn exited(&self) -> Term {
        let mut rx = self.inner.death.subscribe();
        let value = match rx.wait_for(Option::is_some).await {
            Ok(value) => value.clone(),
            // The sender lives as long as `self`, so this is unreachable.
            Err(_) => None,
        };
        value.unwrap_or_else(reason::normal)
    }

    /// Linked pids, sorted.
    pub fn links(&self) -> Vec<Pid> {
        let mut links: Vec<Pid> = self.inner.state.lock().links.iter().copied().collect();
        links.sort();
        links
    }

    /// Monitors this process holds, as `(ref, watchee)` pairs sorted by ref.
    pub fn monitors(&self) -> Vec<(Ref, Pid)> {
        let mut monitors: Vec<(Ref, Pid)> = self
            .inner
            .state
            .lock()
            .monitors
            .iter()
            .map(|(r, p)| (*r, *p))
            .collect();
        monitors.sort();
        monitors
    }

    /// Monitors held on this process, as `(ref, watcher)` pairs sorted by ref.
    pub fn monitored_by(&self) -> Vec<(Ref, Pid)> {
        let mut watchers: Vec<(Ref, Pid)> = self
            .inner
            .state
            .lock()
            .monitored_by
            .iter()
            .map(|(r, p)| (*r, *p))
            .collect();
        watchers.sort();
        watchers
    }

    // ------------------------------------------------------------------
    // Node-side hooks
    // ------------------------------------------------------------------

    /// Records a link before the process starts running.
    pub(crate) fn preset_link(&self, other: Pid) {
        self.inner.state.lock().links.insert(other);
    }

    /// Records a watcher before the process starts running.
    pub(crate) fn preset_monitored_by(&self, reference: Ref, watcher: Pid) {
        self.inner.state.lock().monitored_by.insert(reference, watcher);
    }

    /// Records the watcher side of a monitor.
    pub(crate) fn track_monitor(&self, reference: Ref, watchee: Pid) {
        let mut state = self.inner.state.lock();
        if matches!(state.life, Life::Alive) {
            state.monitors.insert(reference, watchee);
        }
    }

    /// Forgets the watcher side of a monitor, returning the watchee.
    pub(crate) fn untrack_monitor(&self, reference: Ref) -> Option<Pid> {
        self.inner.state.lock().monitors.remove(&reference)
    }

    /// Applies one inbound signal.
    pub(crate) fn handle_signal(&self, from: Pid, signal: Signal) {
        let pid = self.pid();
        tracing::trace!(%from, to = %pid, kind = signal.kind(), "handling signal");

        let mut state = self.inner.state.lock();
        if let Life::Dead(_) = state.life {
            drop(state);
            self.answer_when_dead(from, signal);
            return;
        }

        match signal {
            Signal::Relay(message) => {
                drop(state);
                self.inner.mailbox.push(message);
            }
            Signal::Link => {
                state.links.insert(from);
            }
            Signal::Unlink => {
                state.links.remove(&from);
            }
            Signal::Monitor(reference) => {
                state.monitored_by.insert(reference, from);
            }
            Signal::Demonitor(reference) => {
                state.monitored_by.remove(&reference);
            }
            Signal::Exit(exit_reason) => {
                state.links.remove(&from);
                let trapped = state.flags.trap_exit && !reason::is_kill(&exit_reason);
                drop(state);
                if trapped {
                    self.inner.mailbox.push(Term::tuple([
                        Term::atom("EXIT"),
                        from.into(),
                        exit_reason,
                    ]));
                } else {
                    self.die(exit_reason);
                }
            }
            Signal::Down(reference, down_reason) => {
                state.monitors.remove(&reference);
                drop(state);
                self.inner.mailbox.push(Term::tuple([
                    Term::atom("DOWN"),
                    reference.into(),
                    Term::atom("process"),
                    from.into(),
                    down_reason,
                ]));
            }
        }
    }

    /// A link or monitor that reaches a process after it died is answered
    /// with `noproc`, so the other side is never left waiting.
    fn answer_when_dead(&self, from: Pid, signal: Signal) {
        let node = &self.inner.node;
        let pid = self.pid();
        match signal {
            Signal::Link => {
                let _ = node.signal(pid, Signal::Exit(reason::noproc()), from);
            }
            Signal::Monitor(reference) => {
                let _ = node.signal(pid, Signal::Down(reference, reason::noproc()), from);
            }
            other => {
                tracing::trace!(%from, to = %pid, kind = other.kind(), "signal to dead process ignored");
            }
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Context")
            .field("pid", &self.inner.pid)
            .field("alive", &matches!(state.life, Life::Alive))
            .field("links", &state.links.len())
            .field("monitors", &state.monitors.len())
            .field("monitored_by", &state.monitored_by.len())
            .field("flags", &state.flags)
            .field("mailbox", &self.inner.mailbox)
            .finish()
    }
}
