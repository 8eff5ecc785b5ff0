//! Level-of-detail selection: which nodes and clusters the renderer should
//! draw for the current zoom. Consumes a built [`ClusterHierarchy`]; never
//! mutates physics state.

use std::collections::HashSet;

use crate::cluster::ClusterHierarchy;
use crate::config::LodConfig;

/// The render set for one zoom state: aggregate these clusters, draw these
/// nodes individually. Derived on every zoom update, never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LodRenderSet {
	/// Discrete zoom level; 0 is most zoomed out.
	pub level: i32,
	pub nodes: HashSet<String>,
	pub clusters: HashSet<String>,
}

/// Maps zoom to a render set over the last-built hierarchy.
///
/// Expansion state is a field of this instance, never shared between
/// managers. It persists across zoom changes until explicitly collapsed or
/// the manager is replaced alongside a hierarchy rebuild.
pub struct LodManager {
	config: LodConfig,
	expanded: HashSet<String>,
}

impl LodManager {
	pub fn new(config: LodConfig) -> Self {
		Self { config, expanded: HashSet::new() }
	}

	/// Marks a cluster as manually expanded; its members render individually
	/// at any zoom until [`LodManager::collapse_cluster`]. Idempotent.
	pub fn expand_cluster(&mut self, id: &str) {
		self.expanded.insert(id.to_string());
	}

	pub fn collapse_cluster(&mut self, id: &str) {
		self.expanded.remove(id);
	}

	pub fn is_expanded(&self, id: &str) -> bool {
		self.expanded.contains(id)
	}

	/// Discrete level for a zoom value: the number of configured thresholds
	/// at or below it.
	pub fn level_for_zoom(&self, zoom: f64) -> i32 {
		self.config.zoom_thresholds.iter().filter(|t| zoom >= **t).count() as i32
	}

	/// Recomputes the render set. Pure in (zoom, expansion set, hierarchy):
	/// the same inputs always produce the same set.
	///
	/// A cluster at or past the level's depth renders as an aggregate unless
	/// it was manually expanded or is smaller than the configured minimum;
	/// tiny aggregates save nothing and only add UI friction.
	pub fn update_zoom(&self, hierarchy: &ClusterHierarchy, zoom: f64) -> LodRenderSet {
		let level = self.level_for_zoom(zoom);
		let mut set = LodRenderSet {
			level,
			nodes: HashSet::new(),
			clusters: HashSet::new(),
		};
		for root in hierarchy.roots() {
			self.visit(hierarchy, root, 0, level, &mut set);
		}
		set
	}

	fn visit(
		&self,
		hierarchy: &ClusterHierarchy,
		id: &str,
		depth: i32,
		level: i32,
		set: &mut LodRenderSet,
	) {
		let aggregate = depth >= level
			&& !self.expanded.contains(id)
			&& hierarchy.member_count(id) >= self.config.min_cluster_size;
		if aggregate {
			set.clusters.insert(id.to_string());
			return;
		}
		for child in hierarchy.children(id) {
			if hierarchy.is_cluster(child) {
				self.visit(hierarchy, child, depth + 1, level, set);
			} else {
				set.nodes.insert(child.clone());
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::{GraphData, GraphNode, PositionMap, Vec2};

	fn fixture() -> (GraphData, ClusterHierarchy) {
		// Groups: "big" with 6 nodes, "small" with 2.
		let nodes: Vec<GraphNode> = (0..8)
			.map(|i| GraphNode {
				id: format!("n{i}"),
				label: None,
				group: Some(if i < 6 { 0 } else { 1 }),
			})
			.collect();
		let data = GraphData { nodes, links: vec![] };
		let positions: PositionMap = data
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), Vec2::new(i as f64, 0.0)))
			.collect();
		let hierarchy = ClusterHierarchy::build(&data, &positions, &|n: &GraphNode| {
			if n.group == Some(0) { "big".into() } else { "small".into() }
		});
		(data, hierarchy)
	}

	#[test]
	fn zoomed_out_aggregates_large_clusters_only() {
		let (_, hierarchy) = fixture();
		let manager = LodManager::new(LodConfig::default());
		let set = manager.update_zoom(&hierarchy, 0.1);

		assert_eq!(set.level, 0);
		assert!(set.clusters.contains("cluster:big"));
		// Two members are below the minimum cluster size of three.
		assert!(!set.clusters.contains("cluster:small"));
		assert!(set.nodes.contains("n6") && set.nodes.contains("n7"));
	}

	#[test]
	fn zoomed_in_renders_every_node_individually() {
		let (data, hierarchy) = fixture();
		let manager = LodManager::new(LodConfig::default());
		let set = manager.update_zoom(&hierarchy, 10.0);

		assert_eq!(set.level, 2);
		assert!(set.clusters.is_empty());
		assert_eq!(set.nodes.len(), data.nodes.len());
	}

	#[test]
	fn same_zoom_and_expansion_state_gives_identical_sets() {
		let (_, hierarchy) = fixture();
		let manager = LodManager::new(LodConfig::default());
		assert_eq!(
			manager.update_zoom(&hierarchy, 0.3),
			manager.update_zoom(&hierarchy, 0.3)
		);
	}

	#[test]
	fn manual_expansion_persists_across_zoom_changes() {
		let (_, hierarchy) = fixture();
		let mut manager = LodManager::new(LodConfig::default());
		manager.expand_cluster("cluster:big");

		for zoom in [0.1, 0.3, 0.1] {
			let set = manager.update_zoom(&hierarchy, zoom);
			assert!(!set.clusters.contains("cluster:big"));
			assert!(set.nodes.contains("n0"));
		}

		manager.collapse_cluster("cluster:big");
		let set = manager.update_zoom(&hierarchy, 0.1);
		assert!(set.clusters.contains("cluster:big"));
	}

	#[test]
	fn two_level_hierarchy_descends_one_depth_per_level() {
		let nodes: Vec<GraphNode> = (0..12)
			.map(|i| GraphNode {
				id: format!("n{i}"),
				label: None,
				group: Some((i % 4) as u32),
			})
			.collect();
		let data = GraphData { nodes, links: vec![] };
		let positions: PositionMap = data
			.nodes
			.iter()
			.map(|n| (n.id.clone(), Vec2::default()))
			.collect();
		let hierarchy = ClusterHierarchy::build_two_level(
			&data,
			&positions,
			&|n: &GraphNode| n.group.unwrap_or(0).to_string(),
			&|key| if key < "2" { "low".into() } else { "high".into() },
		);
		let manager = LodManager::new(LodConfig::default());

		// Level 0: superclusters only (each holds 6 nodes).
		let out = manager.update_zoom(&hierarchy, 0.1);
		assert!(out.clusters.contains("supercluster:low"));
		assert!(out.clusters.contains("supercluster:high"));
		assert!(out.nodes.is_empty());

		// Level 1: base clusters (each holds 3 nodes, at the minimum).
		let mid = manager.update_zoom(&hierarchy, 1.0);
		assert!(mid.clusters.contains("cluster:0"));
		assert_eq!(mid.clusters.len(), 4);
		assert!(mid.nodes.is_empty());

		// Level 2: individual nodes.
		let inner = manager.update_zoom(&hierarchy, 2.0);
		assert!(inner.clusters.is_empty());
		assert_eq!(inner.nodes.len(), 12);
	}
}
