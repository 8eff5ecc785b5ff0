use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Solver and canvas tunables. Immutable per simulation instance except
/// through the engine's `resize` operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhysicsConfig {
	/// Canvas width in world units.
	pub width: f64,
	/// Canvas height in world units.
	pub height: f64,
	/// Inner margin kept free when scattering initial positions.
	pub padding: f64,
	/// Pairwise repulsion constant (force ~ repulsion / d²).
	pub repulsion_strength: f64,
	/// Spring constant for edge attraction.
	pub spring_strength: f64,
	/// Rest length of edge springs.
	pub spring_length: f64,
	/// Linear pull toward the canvas center. Grows with displacement, so it
	/// dominates repulsion far from the center and keeps layouts bounded.
	pub centering_strength: f64,
	/// Per-tick velocity damping factor in (0, 1).
	pub damping: f64,
	/// Velocity cap per tick.
	pub max_velocity: f64,
	/// Integration step. The solver caps this so a misconfigured step cannot
	/// blow up the integration.
	pub time_step: f64,
	/// Barnes–Hut accuracy threshold: a cell whose size/distance ratio is
	/// below theta is approximated by its aggregate mass. Smaller theta is
	/// more accurate and more expensive; 0.0 degenerates to exact pairwise
	/// O(n²), values near 1.0 trade visible accuracy for speed.
	pub theta: f64,
	/// Maximum quadtree subdivision depth. Coincident points aggregate into
	/// one leaf at this depth instead of recursing forever.
	pub quadtree_max_depth: usize,
	/// Distance floor used in force denominators.
	pub min_separation: f64,
	/// Seed for initial placement. Layouts are reproducible for a fixed seed
	/// and node order.
	pub seed: u64,
	/// Minimum spacing between ticks while the caller reports active
	/// interaction (pan/zoom/drag). Soft QoS, not a correctness bound.
	pub min_tick_interval: Duration,
}

impl Default for PhysicsConfig {
	fn default() -> Self {
		Self {
			width: 800.0,
			height: 600.0,
			padding: 40.0,
			repulsion_strength: 10_000.0,
			spring_strength: 0.1,
			spring_length: 100.0,
			centering_strength: 0.005,
			damping: 0.85,
			max_velocity: 50.0,
			time_step: 1.0,
			theta: 0.8,
			quadtree_max_depth: 16,
			min_separation: 1.0,
			seed: 42,
			min_tick_interval: Duration::from_millis(50),
		}
	}
}

impl PhysicsConfig {
	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}
}

/// Level-of-detail tunables.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LodConfig {
	/// Ascending zoom thresholds. The render level is the number of
	/// thresholds at or below the current zoom; level 0 is most zoomed out.
	pub zoom_thresholds: Vec<f64>,
	/// Clusters with fewer members than this always render as individual
	/// nodes; aggregating them saves nothing and adds UI friction.
	pub min_cluster_size: usize,
}

impl Default for LodConfig {
	fn default() -> Self {
		Self {
			zoom_thresholds: vec![0.5, 1.5],
			min_cluster_size: 3,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_config_is_self_consistent() {
		let config = PhysicsConfig::default();
		assert!(config.damping > 0.0 && config.damping < 1.0);
		assert!(config.theta > 0.0);
		assert!(config.padding * 2.0 < config.width.min(config.height));
		assert_eq!(config.center(), (400.0, 300.0));
	}

	#[test]
	fn lod_thresholds_are_ascending() {
		let config = LodConfig::default();
		for pair in config.zoom_thresholds.windows(2) {
			assert!(pair[0] < pair[1]);
		}
	}
}
