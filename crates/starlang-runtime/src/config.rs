//! Node configuration.

/// Default node name when none is configured.
pub const DEFAULT_NODE_NAME: &str = "nonode@nohost";

/// Default number of signals the dispatcher handles before yielding.
pub const DEFAULT_DISPATCH_BATCH: usize = 1024;

/// Configuration for a [`Node`](crate::Node).
///
/// Use the builder methods, then pass the result to
/// [`Node::new`](crate::Node::new).
///
/// # Examples
///
/// ```
/// use starlang_runtime::NodeConfig;
///
/// let config = NodeConfig::new()
///     .name("a@localhost")
///     .creation(3)
///     .max_processes(10_000);
/// assert_eq!(config.name, "a@localhost");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Node name (e.g., "a@localhost").
    pub name: String,
    /// Incarnation number stamped into every pid and ref.
    pub creation: u32,
    /// Maximum number of live processes, or `None` for no limit.
    pub max_processes: Option<usize>,
    /// Signals handled per dispatcher turn before yielding to the scheduler.
    pub dispatch_batch: usize,
}

impl NodeConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NODE_NAME.to_string(),
            creation: 0,
            max_processes: None,
            dispatch_batch: DEFAULT_DISPATCH_BATCH,
        }
    }

    /// Set the node name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the creation number.
    pub fn creation(mut self, creation: u32) -> Self {
        self.creation = creation;
        self
    }

    /// Limit the number of live processes.
    pub fn max_processes(mut self, max: usize) -> Self {
        self.max_processes = Some(max);
        self
    }

    /// Set the dispatcher batch size. Zero is treated as one.
    pub fn dispatch_batch(mut self, batch: usize) -> Self {
        self.dispatch_batch = batch.max(1);
        self
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::new()
    }
}
