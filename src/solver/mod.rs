//! Per-tick force computation: Barnes–Hut repulsion, spring attraction along
//! edges, and a linear centering pull, integrated with damped velocities.

mod quadtree;

pub use quadtree::{Quad, QuadTree};

use rayon::prelude::*;

use crate::config::PhysicsConfig;
use crate::state::NodeStateStore;
use crate::types::Vec2;

/// Upper bound on the integration step; slow frames can't blow up the
/// integration past this.
const MAX_TIME_STEP: f64 = 2.0;

/// Advances the store one simulation step.
///
/// `edges` are resolved node-index pairs. Pinned nodes contribute repulsion
/// and spring forces to their neighbors but are themselves never moved and
/// their velocity stays zero.
pub fn step(store: &mut NodeStateStore, edges: &[(usize, usize)], config: &PhysicsConfig) {
	if store.is_empty() {
		return;
	}

	let positions: Vec<Vec2> = store.nodes().iter().map(|n| n.pos).collect();
	let tree = QuadTree::build(&positions, config.quadtree_max_depth);
	let (cx, cy) = config.center();
	let center = Vec2::new(cx, cy);

	// Repulsion and centering are independent per node; the tree is shared
	// read-only across the parallel pass.
	let mut forces: Vec<Vec2> = positions
		.par_iter()
		.map(|&p| {
			let repulsion =
				tree.force_at(p, config.theta, config.repulsion_strength, config.min_separation);
			let centering = center.sub(p).scale(config.centering_strength);
			repulsion.add(centering)
		})
		.collect();

	// Spring attraction proportional to deviation from the rest length.
	for &(a, b) in edges {
		let delta = positions[b].sub(positions[a]);
		let dist = delta.length().max(config.min_separation);
		let magnitude = config.spring_strength * (dist - config.spring_length);
		let force = delta.normalized().scale(magnitude);
		forces[a] = forces[a].add(force);
		forces[b] = forces[b].sub(force);
	}

	let dt = config.time_step.min(MAX_TIME_STEP);
	for (i, node) in store.nodes_mut().iter_mut().enumerate() {
		if node.pinned {
			node.vel = Vec2::default();
			continue;
		}
		let mut vel = node.vel.add(forces[i].scale(dt)).scale(config.damping);
		let speed = vel.length();
		if speed > config.max_velocity {
			vel = vel.scale(config.max_velocity / speed);
		}
		node.vel = vel;
		node.pos = node.pos.add(vel.scale(dt));
	}
}
