//! Cluster hierarchy: nodes grouped by a community key into clusters, and
//! optionally clusters into superclusters. Built on demand from a snapshot
//! of the model and positions; never kept in sync automatically. A stale
//! hierarchy is by design: rebuild after structural changes is the
//! caller's responsibility, which keeps every per-frame lookup O(1).

use std::collections::HashMap;

use log::debug;

use crate::types::{GraphData, GraphNode, GroupAssignment, PositionMap, Vec2};

/// One cluster: its member ids (nodes, or sub-clusters for superclusters)
/// in insertion order, and an aggregate position at the members' centroid.
#[derive(Clone, Debug)]
pub struct ClusterNode {
	pub id: String,
	pub children: Vec<String>,
	pub x: f64,
	pub y: f64,
	/// Total leaf nodes underneath, across all levels.
	pub member_count: usize,
}

/// A strict containment tree over the node set: every node belongs to
/// exactly one base cluster, every cluster to at most one supercluster.
/// Read-only after build.
pub struct ClusterHierarchy {
	clusters: HashMap<String, ClusterNode>,
	/// Ancestor chain per node id, innermost cluster first.
	node_to_cluster: HashMap<String, Vec<String>>,
	roots: Vec<String>,
	depth: usize,
}

impl ClusterHierarchy {
	/// Single-level build from a grouping function.
	pub fn build(
		graph: &GraphData,
		positions: &PositionMap,
		grouping: &dyn Fn(&GraphNode) -> String,
	) -> Self {
		let assignment: GroupAssignment = graph
			.nodes
			.iter()
			.map(|node| (node.id.clone(), grouping(node)))
			.collect();
		Self::from_assignment(graph, positions, &assignment)
	}

	/// Single-level build from a plain assignment (the worker-safe form).
	/// Nodes missing from the assignment land in an `ungrouped` cluster so
	/// the partition stays total.
	pub fn from_assignment(
		graph: &GraphData,
		positions: &PositionMap,
		assignment: &GroupAssignment,
	) -> Self {
		let mut hierarchy = Self::base_level(graph, assignment);
		hierarchy.finish_base_positions(positions);
		debug!(
			"built hierarchy: {} clusters over {} nodes",
			hierarchy.roots.len(),
			graph.nodes.len()
		);
		hierarchy
	}

	/// Two-level build: base clusters from `grouping`, then superclusters
	/// by applying `super_key` to each base community key.
	pub fn build_two_level(
		graph: &GraphData,
		positions: &PositionMap,
		grouping: &dyn Fn(&GraphNode) -> String,
		super_key: &dyn Fn(&str) -> String,
	) -> Self {
		let assignment: GroupAssignment = graph
			.nodes
			.iter()
			.map(|node| (node.id.clone(), grouping(node)))
			.collect();
		let mut hierarchy = Self::base_level(graph, &assignment);
		hierarchy.finish_base_positions(positions);

		// Group base clusters under superclusters, preserving base order.
		let base_ids = std::mem::take(&mut hierarchy.roots);
		let mut super_order: Vec<String> = Vec::new();
		let mut super_children: HashMap<String, Vec<String>> = HashMap::new();
		for base_id in &base_ids {
			let key = base_id.strip_prefix("cluster:").unwrap_or(base_id);
			let super_id = format!("supercluster:{}", super_key(key));
			if !super_order.contains(&super_id) {
				super_order.push(super_id.clone());
			}
			super_children.entry(super_id).or_default().push(base_id.clone());
		}

		for super_id in &super_order {
			let children = super_children.remove(super_id).unwrap_or_default();
			let mut weight = 0usize;
			let mut centroid = Vec2::default();
			for child_id in &children {
				let child = &hierarchy.clusters[child_id];
				centroid.x += child.x * child.member_count as f64;
				centroid.y += child.y * child.member_count as f64;
				weight += child.member_count;
			}
			if weight > 0 {
				centroid = centroid.scale(1.0 / weight as f64);
			}
			for child_id in &children {
				for node_id in hierarchy.clusters[child_id].children.clone() {
					if let Some(chain) = hierarchy.node_to_cluster.get_mut(&node_id) {
						chain.push(super_id.clone());
					}
				}
			}
			hierarchy.clusters.insert(
				super_id.clone(),
				ClusterNode {
					id: super_id.clone(),
					children,
					x: centroid.x,
					y: centroid.y,
					member_count: weight,
				},
			);
		}

		hierarchy.roots = super_order;
		hierarchy.depth = 2;
		debug!(
			"built hierarchy: {} superclusters over {} base clusters",
			hierarchy.roots.len(),
			base_ids.len()
		);
		hierarchy
	}

	fn base_level(graph: &GraphData, assignment: &GroupAssignment) -> Self {
		let mut clusters: HashMap<String, ClusterNode> = HashMap::new();
		let mut node_to_cluster: HashMap<String, Vec<String>> = HashMap::new();
		let mut roots: Vec<String> = Vec::new();

		for node in &graph.nodes {
			let key = assignment
				.get(&node.id)
				.map(String::as_str)
				.unwrap_or("ungrouped");
			let cluster_id = format!("cluster:{key}");
			let cluster = clusters.entry(cluster_id.clone()).or_insert_with(|| {
				roots.push(cluster_id.clone());
				ClusterNode {
					id: cluster_id.clone(),
					children: Vec::new(),
					x: 0.0,
					y: 0.0,
					member_count: 0,
				}
			});
			cluster.children.push(node.id.clone());
			cluster.member_count += 1;
			node_to_cluster.insert(node.id.clone(), vec![cluster_id]);
		}

		Self { clusters, node_to_cluster, roots, depth: 1 }
	}

	/// Centroid of members with known positions; members the position map
	/// has already forgotten simply don't contribute.
	fn finish_base_positions(&mut self, positions: &PositionMap) {
		for id in &self.roots {
			let Some(cluster) = self.clusters.get_mut(id) else {
				continue;
			};
			let mut sum = Vec2::default();
			let mut known = 0usize;
			for member in &cluster.children {
				if let Some(pos) = positions.get(member) {
					sum = sum.add(*pos);
					known += 1;
				}
			}
			if known > 0 {
				cluster.x = sum.x / known as f64;
				cluster.y = sum.y / known as f64;
			}
		}
	}

	pub fn cluster(&self, id: &str) -> Option<&ClusterNode> {
		self.clusters.get(id)
	}

	/// Children of a cluster; empty for unknown ids; absence is a normal
	/// state, not an error.
	pub fn children(&self, id: &str) -> &[String] {
		self.clusters.get(id).map(|c| c.children.as_slice()).unwrap_or(&[])
	}

	/// A node's ancestor clusters, innermost first; empty for unknown ids.
	pub fn ancestors_of(&self, node_id: &str) -> &[String] {
		self.node_to_cluster
			.get(node_id)
			.map(|chain| chain.as_slice())
			.unwrap_or(&[])
	}

	/// The node's innermost cluster.
	pub fn cluster_of(&self, node_id: &str) -> Option<&str> {
		self.ancestors_of(node_id).first().map(String::as_str)
	}

	pub fn roots(&self) -> &[String] {
		&self.roots
	}

	/// Number of cluster levels (1 = flat, 2 = superclusters).
	pub fn depth(&self) -> usize {
		self.depth
	}

	pub fn is_cluster(&self, id: &str) -> bool {
		self.clusters.contains_key(id)
	}

	/// Leaf node count under a cluster; 0 for unknown ids.
	pub fn member_count(&self, id: &str) -> usize {
		self.clusters.get(id).map(|c| c.member_count).unwrap_or(0)
	}
}
