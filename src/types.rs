use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A node supplied by the caller. `group` is an optional community id used
/// for placement seeding and cluster building.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphNode {
	pub id: String,
	pub label: Option<String>,
	pub group: Option<u32>,
}

/// An undirected edge between two node ids. Endpoints that don't resolve to
/// known nodes are skipped at initialization.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphLink {
	pub source: String,
	pub target: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
}

/// 2D position/velocity/force vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
	pub x: f64,
	pub y: f64,
}

impl Vec2 {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn length(&self) -> f64 {
		(self.x * self.x + self.y * self.y).sqrt()
	}

	pub fn add(&self, other: Vec2) -> Self {
		Self::new(self.x + other.x, self.y + other.y)
	}

	pub fn sub(&self, other: Vec2) -> Self {
		Self::new(self.x - other.x, self.y - other.y)
	}

	pub fn scale(&self, factor: f64) -> Self {
		Self::new(self.x * factor, self.y * factor)
	}

	/// Unit vector, or zero when the length is zero.
	pub fn normalized(&self) -> Self {
		let len = self.length();
		if len > 0.0 { self.scale(1.0 / len) } else { *self }
	}
}

/// Node id to position, produced fresh on every tick. Consumers must not
/// assume the same container instance survives across ticks.
pub type PositionMap = HashMap<String, Vec2>;

/// Plain node-id to community-key assignment. The only grouping form that
/// may cross the worker boundary (a grouping closure cannot).
pub type GroupAssignment = HashMap<String, String>;
