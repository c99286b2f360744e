//! # starlang-runtime
//!
//! The Starlang process runtime: lightweight processes with selective-receive
//! mailboxes, links, monitors and exit trapping, hosted on a [`Node`].
//!
//! - [`MessageBox`]: FIFO mailbox with predicate-based, timeout-bounded
//!   consumption
//! - [`Context`]: the live handle of one process and its signal state machine
//! - [`Node`]: pid allocation, the process table, registered names, routes
//!   to other nodes, and signal dispatch
//!
//! Failure semantics follow Erlang: a process that dies sends `EXIT` to its
//! links and `DOWN` to its monitors. A linked process without `trap_exit`
//! dies with the same reason, while one that traps exits receives
//! `{'EXIT', From, Reason}` as a message instead. `kill` cannot be trapped.
//!
//! # Example
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use starlang_core::Term;
//! use starlang_runtime::{Node, ProcessFlag};
//!
//! let node = Node::default();
//! let supervisor = node.make_context().unwrap();
//! supervisor.process_flag(ProcessFlag::TrapExit, Some(true));
//!
//! let worker = supervisor
//!     .spawn_link(|ctx| async move { Err(ctx.exit_self(Term::atom("crashed"))) })
//!     .unwrap();
//!
//! let msg = supervisor.receive().await.unwrap();
//! assert_eq!(
//!     msg,
//!     Term::tuple([Term::atom("EXIT"), worker.into(), Term::atom("crashed")])
//! );
//! assert!(supervisor.is_alive());
//! # }
//! ```

#![deny(warnings)]
#![deny(missing_docs)]

mod config;
mod context;
mod dispatch;
mod mailbox;
mod node;
mod process_table;
mod registry;
mod router;
mod signal;
pub mod task_local;

pub use config::{NodeConfig, DEFAULT_DISPATCH_BATCH, DEFAULT_NODE_NAME};
pub use context::{Context, ProcessFlag, ProcessFlags};
pub use mailbox::{MailboxError, MessageBox};
pub use node::Node;
pub use router::RouterOptions;
pub use signal::{Dest, Routed, Signal};
