use std::collections::HashMap;
use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::PhysicsConfig;
use crate::types::{GraphData, GroupAssignment, PositionMap, Vec2};

/// Kinematic state for one node. Owned exclusively by [`NodeStateStore`];
/// the solver integrates velocity/position, everything else goes through the
/// store's public operations.
#[derive(Clone, Debug)]
pub struct NodeState {
	pub id: String,
	pub pos: Vec2,
	pub vel: Vec2,
	pub pinned: bool,
}

/// Per-node kinematic state plus the id→index lookup the solver and engines
/// share. A pinned node's velocity is always zero and its position only
/// changes through [`NodeStateStore::set_position`].
pub struct NodeStateStore {
	nodes: Vec<NodeState>,
	index: HashMap<String, usize>,
	width: f64,
	height: f64,
}

impl NodeStateStore {
	/// Creates the store with seeded initial placement.
	///
	/// With a grouping assignment, communities are arranged on a circle
	/// around the canvas center and members jittered around their community
	/// center, giving the solver a head start that already reflects the
	/// intended clustering. Without one, nodes scatter uniformly inside the
	/// padded canvas.
	pub fn new(graph: &GraphData, config: &PhysicsConfig, grouping: Option<&GroupAssignment>) -> Self {
		let mut rng = StdRng::seed_from_u64(config.seed);
		let (cx, cy) = config.center();
		let mut nodes = Vec::with_capacity(graph.nodes.len());
		let mut index = HashMap::with_capacity(graph.nodes.len());

		// Community centers laid out on a circle, first-seen order.
		let community_centers = grouping.map(|assignment| {
			let mut keys: Vec<&str> = Vec::new();
			for node in &graph.nodes {
				if let Some(key) = assignment.get(&node.id) {
					if !keys.contains(&key.as_str()) {
						keys.push(key);
					}
				}
			}
			let radius = (config.width.min(config.height) / 2.0 - config.padding).max(0.0);
			let mut centers: HashMap<String, Vec2> = HashMap::with_capacity(keys.len());
			for (i, key) in keys.iter().enumerate() {
				let angle = (i as f64) * 2.0 * PI / keys.len().max(1) as f64;
				centers.insert(
					(*key).to_string(),
					Vec2::new(cx + radius * angle.cos(), cy + radius * angle.sin()),
				);
			}
			centers
		});

		for node in &graph.nodes {
			let community_center = community_centers
				.as_ref()
				.zip(grouping)
				.and_then(|(centers, assignment)| assignment.get(&node.id).and_then(|k| centers.get(k)));

			let pos = match community_center {
				Some(center) => {
					// Jitter radius scales with canvas size so communities
					// stay visually separated.
					let jitter = config.width.min(config.height) / 8.0;
					Vec2::new(
						center.x + rng.gen_range(-jitter..=jitter),
						center.y + rng.gen_range(-jitter..=jitter),
					)
				}
				None => Vec2::new(
					rng.gen_range(config.padding..=(config.width - config.padding)),
					rng.gen_range(config.padding..=(config.height - config.padding)),
				),
			};

			index.insert(node.id.clone(), nodes.len());
			nodes.push(NodeState {
				id: node.id.clone(),
				pos,
				vel: Vec2::default(),
				pinned: false,
			});
		}

		Self {
			nodes,
			index,
			width: config.width,
			height: config.height,
		}
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn nodes(&self) -> &[NodeState] {
		&self.nodes
	}

	pub fn nodes_mut(&mut self) -> &mut [NodeState] {
		&mut self.nodes
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	pub fn get(&self, id: &str) -> Option<&NodeState> {
		self.index_of(id).map(|i| &self.nodes[i])
	}

	/// Hands control of the node's position to the caller; the solver stops
	/// moving it but keeps it as a force source. Unknown ids are a no-op.
	pub fn pin(&mut self, id: &str) {
		if let Some(i) = self.index_of(id) {
			self.nodes[i].pinned = true;
			self.nodes[i].vel = Vec2::default();
		}
	}

	pub fn unpin(&mut self, id: &str) {
		if let Some(i) = self.index_of(id) {
			self.nodes[i].pinned = false;
		}
	}

	/// Overwrites the position and zeroes velocity, regardless of pin state.
	/// Used by drag updates and by the transition engine's final snap.
	pub fn set_position(&mut self, id: &str, pos: Vec2) {
		if let Some(i) = self.index_of(id) {
			self.nodes[i].pos = pos;
			self.nodes[i].vel = Vec2::default();
		}
	}

	/// Rescales positions proportionally about the canvas center for the new
	/// bounds. Velocities survive; nothing is re-randomized.
	pub fn resize(&mut self, width: f64, height: f64) {
		if width <= 0.0 || height <= 0.0 {
			return;
		}
		let (old_cx, old_cy) = (self.width / 2.0, self.height / 2.0);
		let (new_cx, new_cy) = (width / 2.0, height / 2.0);
		let (sx, sy) = (width / self.width, height / self.height);
		for node in &mut self.nodes {
			node.pos.x = new_cx + (node.pos.x - old_cx) * sx;
			node.pos.y = new_cy + (node.pos.y - old_cy) * sy;
		}
		self.width = width;
		self.height = height;
	}

	/// Fresh snapshot; the container is rebuilt on every call.
	pub fn positions(&self) -> PositionMap {
		self.nodes
			.iter()
			.map(|node| (node.id.clone(), node.pos))
			.collect()
	}
}
