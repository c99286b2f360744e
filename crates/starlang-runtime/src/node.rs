//! Process table, name registry and signal router.
//!
//! A [`Node`] owns every process running on it. It allocates pids and
//! references, keeps the registered-name table and the routes to other
//! nodes, and is the only path by which one process affects another: every
//! link, monitor, exit and message goes through [`Node::signal`].
//!
//! # Dispatch
//!
//! Local signals are queued on a per-node FIFO and handled on a separate
//! task, never on the caller's stack. Signals for other nodes are wrapped
//! in a `{route, From, To, Signal}` envelope and delivered as an ordinary
//! message to the cheapest router registered for the destination node.
//!
//! # Example
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use starlang_core::Term;
//! use starlang_runtime::{Node, NodeConfig};
//!
//! let node = Node::new(NodeConfig::new().name("a@localhost"));
//! let pid = node
//!     .spawn(|ctx| async move {
//!         ctx.register("worker")?;
//!         let _ = ctx.receive().await?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! while node.whereis("worker").is_none() {
//!     tokio::task::yield_now().await;
//! }
//! assert_eq!(node.whereis("worker"), Some(pid));
//!
//! node.deliver("worker", Term::atom("stop"));
//! assert_eq!(node.await_exit(pid).await, Some(Term::atom("normal")));
//! assert_eq!(node.whereis("worker"), None);
//! # }
//! ```

use crate::config::NodeConfig;
use crate::context::{Context, ContextInner};
use crate::dispatch::{Dispatch, Dispatcher};
use crate::process_table::ProcessTable;
use crate::registry::NameRegistry;
use crate::router::{RouterOptions, RouterTable};
use crate::signal::{Dest, Routed, Signal};
use crate::task_local;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use starlang_core::{reason, Atom, OtpError, Pid, Ref, Term};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct NodeShared {
    name: Atom,
    creation: u32,
    processes: Mutex<ProcessTable<ContextInner>>,
    names: NameRegistry,
    routers: RwLock<RouterTable>,
    refs: AtomicU64,
    dispatcher: Arc<Dispatcher>,
}

/// Where a resolved signal goes.
enum Resolved {
    /// A process on this node.
    Local(Context),
    /// The router carrying signals to the destination's node.
    Router(Context),
}

/// A process runtime node.
///
/// `Node` is a cheap, clonable handle; clones share the same tables.
/// Methods that queue signals or start processes must be called from
/// within a tokio runtime.
#[derive(Clone)]
pub struct Node {
    shared: Arc<NodeShared>,
}

impl Node {
    /// Creates a node from `config`.
    pub fn new(config: NodeConfig) -> Self {
        let name = Atom::new(&config.name);
        tracing::debug!(node = %name, creation = config.creation, "node started");
        Self {
            shared: Arc::new(NodeShared {
                name,
                creation: config.creation,
                processes: Mutex::new(ProcessTable::new(config.max_processes)),
                names: NameRegistry::new(),
                routers: RwLock::new(RouterTable::new(name)),
                refs: AtomicU64::new(0),
                dispatcher: Dispatcher::new(config.dispatch_batch),
            }),
        }
    }

    /// This node's name.
    pub fn name(&self) -> Atom {
        self.shared.name
    }

    /// This node's creation number.
    pub fn creation(&self) -> u32 {
        self.shared.creation
    }

    /// The pid that signals issued by the node itself (see
    /// [`deliver`](Self::deliver)) carry as their sender. It never names a
    /// live process.
    pub fn system_pid(&self) -> Pid {
        Pid::local(0, 0, self.shared.creation)
    }

    // ------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------

    /// Creates a reference unique on this node incarnation.
    pub fn make_ref(&self) -> Ref {
        let counter = self.shared.refs.fetch_add(1, Ordering::Relaxed);
        Ref::from_counter(counter, self.shared.creation)
    }

    /// Allocates a pid that no process will ever own.
    pub fn make_pid(&self) -> Result<Pid, OtpError> {
        let (id, serial) = self.shared.processes.lock().mint()?;
        Ok(Pid::local(id, serial, self.shared.creation))
    }

    /// Creates a process context with no body.
    ///
    /// The context is alive until it dies or every handle to it is dropped.
    /// Useful for driving a process by hand, for example from a test or
    /// from code bridging into the runtime.
    pub fn make_context(&self) -> Result<Context, OtpError> {
        let creation = self.shared.creation;
        let inner = self
            .shared
            .processes
            .lock()
            .insert_with(|id, serial| ContextInner::new(Pid::local(id, serial, creation), self.clone()))?;
        let ctx = Context::from_inner(inner);
        tracing::trace!(pid = %ctx.pid(), "context created");
        Ok(ctx)
    }

    // ------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------

    /// Spawns a process running `body`.
    ///
    /// Returns as soon as the process exists; the body starts later on its
    /// own task. When the body returns `Ok(())` the process exits `normal`,
    /// `Err(e)` exits with `e`'s reason, and a panic exits with
    /// `{panic, Message}`. If the process dies from a signal first, the body
    /// is dropped at its next suspension point.
    pub fn spawn<F, Fut>(&self, body: F) -> Result<Pid, OtpError>
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), OtpError>> + Send + 'static,
    {
        let ctx = self.make_context()?;
        let pid = ctx.pid();
        self.start(ctx, body);
        Ok(pid)
    }

    /// Spawns a process linked to `linked` from the start.
    pub fn spawn_link<F, Fut>(&self, linked: Pid, body: F) -> Result<Pid, OtpError>
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), OtpError>> + Send + 'static,
    {
        let ctx = self.make_context()?;
        let pid = ctx.pid();
        ctx.preset_link(linked);
        if self.signal(pid, Signal::Link, linked).is_err() {
            let _ = self.signal(linked, Signal::Exit(reason::noproc()), pid);
        }
        self.start(ctx, body);
        Ok(pid)
    }

    /// Spawns a process monitored by `watcher` from the start.
    pub fn spawn_monitor<F, Fut>(&self, watcher: Pid, body: F) -> Result<(Pid, Ref), OtpError>
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), OtpError>> + Send + 'static,
    {
        let ctx = self.make_context()?;
        let pid = ctx.pid();
        let reference = self.make_ref();
        ctx.preset_monitored_by(reference, watcher);
        if let Some(watcher) = self.lookup(watcher) {
            watcher.track_monitor(reference, pid);
        }
        self.start(ctx, body);
        Ok((pid, reference))
    }

    fn start<F, Fut>(&self, ctx: Context, body: F)
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), OtpError>> + Send + 'static,
    {
        tracing::debug!(pid = %ctx.pid(), "process spawned");
        tokio::spawn(async move {
            let run = {
                let ctx = ctx.clone();
                task_local::scope(ctx.clone(), async move { body(ctx).await })
            };

            let outcome = tokio::select! {
                biased;
                _ = ctx.exited() => return,
                outcome = AssertUnwindSafe(run).catch_unwind() => outcome,
            };

            match outcome {
                Ok(Ok(())) => ctx.die(reason::normal()),
                Ok(Err(err)) => ctx.die(err),
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    tracing::warn!(pid = %ctx.pid(), %message, "process panicked");
                    ctx.die(Term::tuple([Term::atom("panic"), Term::from(message)]));
                }
            }
        });
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Registers `name` for the live local process `pid`.
    ///
    /// Fails with `badarg` if the name is empty or `undefined`, if `pid` is
    /// not a live local process, or if the name is already taken. The name
    /// is released when the process dies.
    pub fn register(&self, pid: Pid, name: impl Into<Atom>) -> Result<(), OtpError> {
        let name = name.into();
        if name.is_empty() || name.as_str() == "undefined" {
            return Err(OtpError::badarg());
        }
        let Some(ctx) = self.lookup(pid).filter(Context::is_alive) else {
            return Err(OtpError::badarg());
        };
        if !self.shared.names.register(name, pid) {
            return Err(OtpError::badarg());
        }
        // The process may have died between the lookup and the insert, after
        // its names were already released.
        if !ctx.is_alive() {
            self.shared.names.unregister(name, pid);
            return Err(OtpError::badarg());
        }
        tracing::debug!(%pid, %name, "name registered");
        Ok(())
    }

    /// Removes `name` from `pid`, or every name `pid` holds when `name` is
    /// `None`. Names held by another process are left alone.
    pub fn unregister(&self, pid: Pid, name: Option<Atom>) {
        match name {
            Some(name) => {
                if self.shared.names.unregister(name, pid) {
                    tracing::debug!(%pid, %name, "name unregistered");
                }
            }
            None => {
                let removed = self.shared.names.unregister_all(pid);
                tracing::debug!(%pid, removed, "names unregistered");
            }
        }
    }

    /// Looks up a registered name.
    pub fn whereis(&self, name: impl Into<Atom>) -> Option<Pid> {
        self.shared.names.whereis(name.into())
    }

    /// Every registered name, sorted.
    pub fn registered(&self) -> Vec<Atom> {
        self.shared.names.registered()
    }

    // ------------------------------------------------------------------
    // Signals
    // ------------------------------------------------------------------

    /// Delivers `message` to `to`, ignoring failures.
    pub fn deliver(&self, to: impl Into<Dest>, message: impl Into<Term>) {
        let to = to.into();
        if let Err(err) = self.signal(self.system_pid(), Signal::Relay(message.into()), to) {
            tracing::trace!(%to, %err, "message dropped");
        }
    }

    /// Sends `signal` from `from` to `to`.
    ///
    /// - local pid: fails with `noproc` if no such process exists
    /// - name: fails with `noproc` if the name is not registered
    /// - `{name, node}` or remote pid: fails with `noconnection` if no
    ///   router is registered for the node
    ///
    /// Success means the signal was queued, not that it was handled.
    pub fn signal(&self, from: Pid, signal: Signal, to: impl Into<Dest>) -> Result<(), OtpError> {
        let to = to.into();
        match self.resolve(to)? {
            Resolved::Local(target) => {
                tracing::trace!(%from, %to, kind = signal.kind(), "signal queued");
                self.shared.dispatcher.enqueue(Dispatch {
                    target,
                    from,
                    signal,
                });
            }
            Resolved::Router(router) => {
                tracing::trace!(%from, %to, router = %router.pid(), kind = signal.kind(), "signal routed");
                let envelope = Routed { from, to, signal }.to_term();
                self.shared.dispatcher.enqueue(Dispatch {
                    target: router,
                    from,
                    signal: Signal::Relay(envelope),
                });
            }
        }
        Ok(())
    }

    fn resolve(&self, to: Dest) -> Result<Resolved, OtpError> {
        match to {
            Dest::Pid(pid) if pid.is_local() => self
                .lookup(pid)
                .map(Resolved::Local)
                .ok_or_else(OtpError::noproc),
            Dest::Pid(pid) => {
                let node = self
                    .node_name_at(pid.node())
                    .ok_or_else(OtpError::noconnection)?;
                self.router_for(node)
            }
            Dest::Name(name) => self
                .whereis(name)
                .and_then(|pid| self.lookup(pid))
                .map(Resolved::Local)
                .ok_or_else(OtpError::noproc),
            Dest::Remote(name, node) if node == self.shared.name => self.resolve(Dest::Name(name)),
            Dest::Remote(_, node) => self.router_for(node),
        }
    }

    fn router_for(&self, node: Atom) -> Result<Resolved, OtpError> {
        let router = self
            .shared
            .routers
            .read()
            .route(node)
            .ok_or_else(OtpError::noconnection)?;
        self.lookup(router)
            .map(Resolved::Router)
            .ok_or_else(OtpError::noconnection)
    }

    /// Links `a` and `b`.
    ///
    /// If `b` does not exist, `a` receives an exit signal from `b` with
    /// reason `noproc` (or `noconnection` when its node is unreachable).
    pub fn link(&self, a: Pid, b: Pid) {
        if a == b {
            return;
        }
        if let Err(err) = self.signal(a, Signal::Link, b) {
            let reason = if err.is_noconnection() {
                reason::noconnection()
            } else {
                reason::noproc()
            };
            let _ = self.signal(b, Signal::Exit(reason), a);
            return;
        }
        let _ = self.signal(b, Signal::Link, a);
    }

    /// Removes the link between `a` and `b`. Unlinking twice is harmless.
    pub fn unlink(&self, a: Pid, b: Pid) {
        let _ = self.signal(a, Signal::Unlink, b);
        let _ = self.signal(b, Signal::Unlink, a);
    }

    /// Makes `watcher` monitor `watchee` and returns the monitor reference.
    ///
    /// If `watchee` is already gone, `watcher` still gets a fresh reference
    /// and a `DOWN` message with reason `noproc` (or `noconnection` when its
    /// node is unreachable).
    pub fn monitor(&self, watcher: Pid, watchee: Pid) -> Ref {
        let reference = self.make_ref();
        if let Some(ctx) = self.lookup(watcher) {
            ctx.track_monitor(reference, watchee);
        }
        if let Err(err) = self.signal(watcher, Signal::Monitor(reference), watchee) {
            let reason = if err.is_noconnection() {
                reason::noconnection()
            } else {
                reason::noproc()
            };
            let _ = self.signal(watchee, Signal::Down(reference, reason), watcher);
        }
        reference
    }

    /// Cancels a monitor held by `watcher`. Unknown references are ignored.
    pub fn demonitor(&self, watcher: Pid, reference: Ref) {
        let Some(ctx) = self.lookup(watcher) else {
            return;
        };
        if let Some(watchee) = ctx.untrack_monitor(reference) {
            let _ = self.signal(watcher, Signal::Demonitor(reference), watchee);
        }
    }

    /// Sends an exit signal from `from` to `to`.
    pub fn exit(&self, from: Pid, to: Pid, reason: impl Into<Term>) -> Result<(), OtpError> {
        self.signal(from, Signal::Exit(reason.into()), to)
    }

    // ------------------------------------------------------------------
    // Routers
    // ------------------------------------------------------------------

    /// Registers the live local process `router` as a route to `node`.
    ///
    /// When several routers serve one node the lowest `cost` wins.
    /// Registering the same router again updates its cost and options.
    /// Routes are dropped when the router dies.
    pub fn register_router(
        &self,
        node: impl Into<Atom>,
        cost: u32,
        router: Pid,
        options: RouterOptions,
    ) -> Result<(), OtpError> {
        let node = node.into();
        if node == self.shared.name || node.is_empty() {
            return Err(OtpError::badarg());
        }
        let Some(ctx) = self.lookup(router).filter(Context::is_alive) else {
            return Err(OtpError::badarg());
        };
        self.shared
            .routers
            .write()
            .register(node, cost, router, options);
        if !ctx.is_alive() {
            self.shared.routers.write().unregister_router(router);
            return Err(OtpError::badarg());
        }
        tracing::debug!(%node, cost, %router, "router registered");
        Ok(())
    }

    /// Removes every route through `router`.
    pub fn unregister_router(&self, router: Pid) {
        let nodes = self.shared.routers.write().unregister_router(router);
        if !nodes.is_empty() {
            tracing::debug!(%router, ?nodes, "router unregistered");
        }
    }

    /// This node followed by every visible node that has a route, sorted.
    pub fn nodes(&self) -> Vec<Atom> {
        let mut nodes = vec![self.shared.name];
        nodes.extend(self.shared.routers.read().visible());
        nodes
    }

    /// The index remote pids from `node` carry, assigning one on first use.
    /// This node is always index 0.
    pub fn node_index(&self, node: impl Into<Atom>) -> u32 {
        let node = node.into();
        if let Some(index) = self.shared.routers.read().index_of(node) {
            return index;
        }
        self.shared.routers.write().intern(node)
    }

    /// The node name behind a pid's node index.
    pub fn node_name_at(&self, index: u32) -> Option<Atom> {
        self.shared.routers.read().name_at(index)
    }

    /// Builds the pid a process on `node` is known by here.
    pub fn remote_pid(&self, node: impl Into<Atom>, id: u32, serial: u32, creation: u32) -> Pid {
        let node = node.into();
        if node == self.shared.name {
            return Pid::local(id, serial, creation);
        }
        Pid::new(self.node_index(node), id, serial, creation)
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Returns `true` if `pid` is a live process on this node.
    pub fn is_alive(&self, pid: Pid) -> bool {
        self.lookup(pid).is_some_and(|ctx| ctx.is_alive())
    }

    /// Waits for `pid` to exit and returns its reason, or `None` if it is not
    /// a live local process.
    pub async fn await_exit(&self, pid: Pid) -> Option<Term> {
        let ctx = self.lookup(pid)?;
        Some(ctx.exited().await)
    }

    /// Every live process, in slot order.
    pub fn processes(&self) -> Vec<Pid> {
        let creation = self.shared.creation;
        self.shared
            .processes
            .lock()
            .occupied()
            .into_iter()
            .map(|(id, serial)| Pid::local(id, serial, creation))
            .collect()
    }

    /// Number of live processes.
    pub fn process_count(&self) -> usize {
        self.shared.processes.lock().len()
    }

    fn lookup(&self, pid: Pid) -> Option<Context> {
        if !pid.is_local() || pid.creation() != self.shared.creation {
            return None;
        }
        let inner = self.shared.processes.lock().get(pid.id(), pid.serial())?;
        Some(Context::from_inner(inner))
    }

    /// Drops everything the node holds for `pid`: its slot, names and routes.
    pub(crate) fn release(&self, pid: Pid) {
        let freed = self.shared.processes.lock().remove(pid.id(), pid.serial());
        let names = self.shared.names.unregister_all(pid);
        let routes = self.shared.routers.write().unregister_router(pid);
        tracing::trace!(%pid, freed, names, routes = routes.len(), "process released");
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(NodeConfig::default())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.shared.name)
            .field("creation", &self.shared.creation)
            .field("processes", &self.shared.processes.lock().len())
            .field("names", &self.shared.names.len())
            .field("pending_signals", &self.shared.dispatcher.pending())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refs_are_unique_and_ordered() {
        let node = Node::default();
        let a = node.make_ref();
        let b = node.make_ref();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[tokio::test]
    async fn test_pids_are_never_reused() {
        let node = Node::default();
        let first = node.make_context().unwrap();
        let first_pid = first.pid();
        first.die(reason::normal());

        let second = node.make_context().unwrap();
        assert_ne!(second.pid(), first_pid);
        assert_eq!(second.pid().id(), first_pid.id());
        assert!(!node.is_alive(first_pid));
        assert!(node.is_alive(second.pid()));
    }

    #[tokio::test]
    async fn test_dropped_context_is_reclaimed() {
        let node = Node::default();
        let ctx = node.make_context().unwrap();
        let pid = ctx.pid();
        ctx.register("transient").unwrap();
        assert_eq!(node.process_count(), 1);

        drop(ctx);

        assert_eq!(node.process_count(), 0);
        assert!(!node.is_alive(pid));
        assert_eq!(node.whereis("transient"), None);
    }

    #[tokio::test]
    async fn test_max_processes() {
        let node = Node::new(NodeConfig::new().max_processes(1));
        let _held = node.make_context().unwrap();
        let err = node.spawn(|_| async { Ok(()) }).unwrap_err();
        assert!(err.is("system_limit"));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_arguments() {
        let node = Node::default();
        let ctx = node.make_context().unwrap();
        let pid = ctx.pid();

        assert!(node.register(pid, "").unwrap_err().is_badarg());
        assert!(node.register(pid, "undefined").unwrap_err().is_badarg());
        assert!(node
            .register(node.make_pid().unwrap(), "ghost")
            .unwrap_err()
            .is_badarg());
        assert!(node
            .register(Pid::new(3, pid.id(), pid.serial(), 0), "remote")
            .unwrap_err()
            .is_badarg());

        node.register(pid, "taken").unwrap();
        let other = node.make_context().unwrap();
        assert!(node.register(other.pid(), "taken").unwrap_err().is_badarg());
        assert_eq!(node.registered(), vec![Atom::new("taken")]);
    }

    #[tokio::test]
    async fn test_unregister_only_touches_own_names() {
        let node = Node::default();
        let a = node.make_context().unwrap();
        let b = node.make_context().unwrap();
        a.register("a_name").unwrap();
        a.register("a_alias").unwrap();
        b.register("b_name").unwrap();

        node.unregister(a.pid(), Some(Atom::new("b_name")));
        assert_eq!(node.whereis("b_name"), Some(b.pid()));

        node.unregister(a.pid(), Some(Atom::new("a_alias")));
        assert_eq!(node.whereis("a_alias"), None);
        assert_eq!(node.whereis("a_name"), Some(a.pid()));

        node.unregister(a.pid(), None);
        assert_eq!(node.whereis("a_name"), None);
        assert_eq!(node.whereis("b_name"), Some(b.pid()));
    }

    #[tokio::test]
    async fn test_signal_errors() {
        let node = Node::new(NodeConfig::new().name("a@host"));
        let from = node.system_pid();

        let missing = node.make_pid().unwrap();
        assert!(node
            .signal(from, Signal::Relay(Term::Int(1)), missing)
            .unwrap_err()
            .is_noproc());
        assert!(node
            .signal(from, Signal::Relay(Term::Int(1)), "nobody")
            .unwrap_err()
            .is_noproc());
        assert!(node
            .signal(from, Signal::Relay(Term::Int(1)), ("nobody", "b@host"))
            .unwrap_err()
            .is_noconnection());
        assert!(node
            .signal(from, Signal::Relay(Term::Int(1)), Pid::new(9, 1, 0, 0))
            .unwrap_err()
            .is_noconnection());
    }

    #[tokio::test]
    async fn test_node_names() {
        let node = Node::new(NodeConfig::new().name("a@host").creation(2));
        assert_eq!(node.name(), Atom::new("a@host"));
        assert_eq!(node.creation(), 2);
        assert_eq!(node.node_index("a@host"), 0);

        let b = node.node_index("b@host");
        assert_eq!(b, 1);
        assert_eq!(node.node_name_at(b), Some(Atom::new("b@host")));
        assert_eq!(node.nodes(), vec![Atom::new("a@host")]);

        let remote = node.remote_pid("b@host", 4, 0, 7);
        assert!(!remote.is_local());
        assert_eq!(remote.node(), b);
        assert!(node.remote_pid("a@host", 4, 0, 2).is_local());
    }

    #[tokio::test]
    async fn test_register_router_validation() {
        let node = Node::new(NodeConfig::new().name("a@host"));
        let router = node.make_context().unwrap();

        assert!(node
            .register_router("a@host", 1, router.pid(), RouterOptions::new())
            .unwrap_err()
            .is_badarg());
        assert!(node
            .register_router("b@host", 1, node.make_pid().unwrap(), RouterOptions::new())
            .unwrap_err()
            .is_badarg());

        node.register_router("b@host", 1, router.pid(), RouterOptions::new())
            .unwrap();
        assert_eq!(node.nodes(), vec![Atom::new("a@host"), Atom::new("b@host")]);

        node.unregister_router(router.pid());
        assert_eq!(node.nodes(), vec![Atom::new("a@host")]);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
