//! Routes to other nodes.
//!
//! A router is a local process that carries signals to another node. Several
//! routers may serve the same node; the cheapest one wins, with ties going to
//! whichever registered first. Routes owned by a process disappear when it
//! dies.
//!
//! The table also interns node names. Index 0 is always the local node, and
//! remote pids carry the index of their node in this table.

use starlang_core::{Atom, Pid};
use std::collections::HashMap;

/// Options for a registered route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterOptions {
    /// Hidden nodes are reachable but not listed by [`Node::nodes`](crate::Node::nodes).
    pub hidden: bool,
}

impl RouterOptions {
    /// Default options: a visible route.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the route's node as hidden.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Route {
    router: Pid,
    cost: u32,
    options: RouterOptions,
}

#[derive(Debug)]
pub(crate) struct RouterTable {
    names: Vec<Atom>,
    indices: HashMap<Atom, u32>,
    routes: HashMap<Atom, Vec<Route>>,
}

impl RouterTable {
    pub(crate) fn new(local: Atom) -> Self {
        Self {
            names: vec![local],
            indices: HashMap::from([(local, 0)]),
            routes: HashMap::new(),
        }
    }

    /// Index of `name`, interning it on first use.
    pub(crate) fn intern(&mut self, name: Atom) -> u32 {
        if let Some(&index) = self.indices.get(&name) {
            return index;
        }
        let index = self.names.len() as u32;
        self.names.push(name);
        self.indices.insert(name, index);
        index
    }

    pub(crate) fn index_of(&self, name: Atom) -> Option<u32> {
        self.indices.get(&name).copied()
    }

    pub(crate) fn name_at(&self, index: u32) -> Option<Atom> {
        self.names.get(index as usize).copied()
    }

    /// Adds or updates the route through `router` to `node`.
    pub(crate) fn register(&mut self, node: Atom, cost: u32, router: Pid, options: RouterOptions) {
        self.intern(node);
        let routes = self.routes.entry(node).or_default();
        match routes.iter_mut().find(|route| route.router == router) {
            Some(route) => {
                route.cost = cost;
                route.options = options;
            }
            None => routes.push(Route {
                router,
                cost,
                options,
            }),
        }
    }

    /// Removes every route through `router`, returning the affected nodes.
    pub(crate) fn unregister_router(&mut self, router: Pid) -> Vec<Atom> {
        let mut affected = Vec::new();
        self.routes.retain(|node, routes| {
            let before = routes.len();
            routes.retain(|route| route.router != router);
            if routes.len() != before {
                affected.push(*node);
            }
            !routes.is_empty()
        });
        affected
    }

    /// The cheapest router to `node`.
    pub(crate) fn route(&self, node: Atom) -> Option<Pid> {
        self.routes
            .get(&node)?
            .iter()
            .enumerate()
            .min_by_key(|(position, route)| (route.cost, *position))
            .map(|(_, route)| route.router)
    }

    /// Reachable, visible nodes, sorted by name. Excludes the local node.
    pub(crate) fn visible(&self) -> Vec<Atom> {
        let mut nodes: Vec<Atom> = self
            .routes
            .iter()
            .filter(|(_, routes)| routes.iter().any(|route| !route.options.hidden))
            .map(|(node, _)| *node)
            .collect();
        nodes.sort();
        nodes
    }
}
