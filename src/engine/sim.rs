use log::debug;

use crate::config::PhysicsConfig;
use crate::solver;
use crate::state::NodeStateStore;
use crate::types::{GraphData, GroupAssignment, PositionMap, Vec2};

/// The single simulation implementation both engine variants drive. The
/// sync engine calls it inline; the worker thread owns one exclusively.
/// Sharing this core is what makes the variants numerically equivalent.
pub(crate) struct SimCore {
	config: PhysicsConfig,
	store: Option<NodeStateStore>,
	edges: Vec<(usize, usize)>,
	grouping: Option<GroupAssignment>,
}

impl SimCore {
	pub(crate) fn new(config: PhysicsConfig) -> Self {
		Self {
			config,
			store: None,
			edges: Vec::new(),
			grouping: None,
		}
	}

	/// (Re)creates the store, resolving edge endpoints to indices. Links
	/// referencing unknown nodes and self-loops are skipped.
	pub(crate) fn initialize(&mut self, graph: &GraphData) -> PositionMap {
		let store = NodeStateStore::new(graph, &self.config, self.grouping.as_ref());
		let mut edges = Vec::with_capacity(graph.links.len());
		for link in &graph.links {
			match (store.index_of(&link.source), store.index_of(&link.target)) {
				(Some(a), Some(b)) if a != b => edges.push((a, b)),
				_ => debug!("skipping unresolved link {} -> {}", link.source, link.target),
			}
		}
		debug!(
			"initialized simulation with {} nodes, {} edges",
			store.len(),
			edges.len()
		);
		let positions = store.positions();
		self.store = Some(store);
		self.edges = edges;
		positions
	}

	/// A tick against an uninitialized engine yields an empty map; stale
	/// callers are expected, not punished.
	pub(crate) fn tick(&mut self) -> PositionMap {
		match &mut self.store {
			Some(store) => {
				solver::step(store, &self.edges, &self.config);
				store.positions()
			}
			None => PositionMap::new(),
		}
	}

	pub(crate) fn set_node_position(&mut self, id: &str, pos: Vec2) {
		if let Some(store) = &mut self.store {
			store.set_position(id, pos);
		}
	}

	pub(crate) fn pin_node(&mut self, id: &str) {
		if let Some(store) = &mut self.store {
			store.pin(id);
		}
	}

	pub(crate) fn unpin_node(&mut self, id: &str) {
		if let Some(store) = &mut self.store {
			store.unpin(id);
		}
	}

	pub(crate) fn positions(&self) -> PositionMap {
		self.store.as_ref().map(|s| s.positions()).unwrap_or_default()
	}

	pub(crate) fn resize(&mut self, width: f64, height: f64) {
		self.config.width = width;
		self.config.height = height;
		if let Some(store) = &mut self.store {
			store.resize(width, height);
		}
	}

	/// Takes effect at the next `initialize`.
	pub(crate) fn set_grouping(&mut self, assignment: GroupAssignment) {
		self.grouping = Some(assignment);
	}
}
