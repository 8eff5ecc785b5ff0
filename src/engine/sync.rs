use super::{EngineError, InteractionThrottle, LayoutEngine, Pending, SimCore};
use crate::config::PhysicsConfig;
use crate::types::{GraphData, GraphNode, GroupAssignment, PositionMap, Vec2};

/// In-process engine: every operation executes inline on the caller's
/// thread and comes back as an already-resolved [`Pending`].
pub struct SyncEngine {
	core: SimCore,
	throttle: InteractionThrottle,
	community_getter: Option<Box<dyn Fn(&GraphNode) -> String>>,
}

impl SyncEngine {
	pub fn new(config: PhysicsConfig) -> Self {
		let throttle = InteractionThrottle::new(config.min_tick_interval);
		Self {
			core: SimCore::new(config),
			throttle,
			community_getter: None,
		}
	}

	/// Closure-based grouping, available on this variant only, since a callback
	/// cannot cross the worker boundary. The closure is resolved to a plain
	/// assignment when `initialize` runs, so downstream machinery only ever
	/// sees [`GroupAssignment`] data.
	pub fn set_community_getter(&mut self, getter: Box<dyn Fn(&GraphNode) -> String>) {
		self.community_getter = Some(getter);
	}
}

impl LayoutEngine for SyncEngine {
	fn initialize(&mut self, graph: GraphData) -> Pending<PositionMap> {
		if let Some(getter) = &self.community_getter {
			let assignment: GroupAssignment = graph
				.nodes
				.iter()
				.map(|node| (node.id.clone(), getter(node)))
				.collect();
			self.core.set_grouping(assignment);
		}
		Pending::ready(self.core.initialize(&graph))
	}

	fn tick(&mut self) -> Pending<PositionMap> {
		if !self.throttle.allow_tick() {
			return Pending::failed(EngineError::Throttled);
		}
		Pending::ready(self.core.tick())
	}

	fn set_node_position(&mut self, id: &str, pos: Vec2) -> Pending<()> {
		self.core.set_node_position(id, pos);
		Pending::ready(())
	}

	fn pin_node(&mut self, id: &str) -> Pending<()> {
		self.core.pin_node(id);
		Pending::ready(())
	}

	fn unpin_node(&mut self, id: &str) -> Pending<()> {
		self.core.unpin_node(id);
		Pending::ready(())
	}

	fn positions(&mut self) -> Pending<PositionMap> {
		Pending::ready(self.core.positions())
	}

	fn resize(&mut self, width: f64, height: f64) -> Pending<()> {
		self.core.resize(width, height);
		Pending::ready(())
	}

	fn set_grouping(&mut self, assignment: GroupAssignment) -> Pending<()> {
		self.core.set_grouping(assignment);
		Pending::ready(())
	}

	fn set_interacting(&mut self, interacting: bool) {
		self.throttle.set_interacting(interacting);
	}

	fn shutdown(&mut self) {
		// Nothing to release; the store dies with the engine.
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn graph() -> GraphData {
		GraphData {
			nodes: (0..6)
				.map(|i| GraphNode {
					id: format!("n{i}"),
					label: None,
					group: Some(i % 2),
				})
				.collect(),
			links: vec![],
		}
	}

	#[test]
	fn community_getter_seeds_grouped_placement() {
		let mut engine = SyncEngine::new(PhysicsConfig::default());
		engine.set_community_getter(Box::new(|node: &GraphNode| {
			node.group.unwrap_or(0).to_string()
		}));
		let positions = engine.initialize(graph()).wait().unwrap();

		// Nodes sharing a community jitter around one circle point, so
		// same-group nodes sit closer together than cross-group ones.
		let d_same = positions["n0"].sub(positions["n2"]).length();
		let d_cross = positions["n0"].sub(positions["n1"]).length();
		assert!(d_same < d_cross);
	}

	#[test]
	fn throttled_tick_reports_and_recovers() {
		let mut engine = SyncEngine::new(PhysicsConfig::default());
		engine.initialize(graph()).wait().unwrap();
		engine.set_interacting(true);
		engine.tick().wait().unwrap();
		assert_eq!(engine.tick().wait(), Err(EngineError::Throttled));

		engine.set_interacting(false);
		assert!(engine.tick().wait().is_ok());
	}
}
