//! Tweened node movement and whole-layout transitions, decoupled from the
//! simulation tick. The engine does no scheduling of its own: the host
//! drives it once per animation frame with a monotonic clock, which also
//! makes it trivial to test against a fake clock.

use std::collections::HashMap;

use crossbeam_channel::{Sender, bounded};
use serde::{Deserialize, Serialize};

use crate::engine::{EngineError, Pending};
use crate::types::{PositionMap, Vec2};

/// Easing curves. All of them map [0, 1] onto [0, 1] without overshoot, so
/// an interpolated position never leaves the start/target segment, which
/// is what makes cancellation safe at any instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
	Linear,
	EaseInQuad,
	EaseOutQuad,
	EaseInOutQuad,
	EaseInCubic,
	#[default]
	EaseOutCubic,
	EaseInOutCubic,
}

impl Easing {
	pub fn apply(self, t: f64) -> f64 {
		let t = t.clamp(0.0, 1.0);
		match self {
			Easing::Linear => t,
			Easing::EaseInQuad => t * t,
			Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
			Easing::EaseInOutQuad => {
				if t < 0.5 {
					2.0 * t * t
				} else {
					1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
				}
			}
			Easing::EaseInCubic => t * t * t,
			Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
			Easing::EaseInOutCubic => {
				if t < 0.5 {
					4.0 * t * t * t
				} else {
					1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
				}
			}
		}
	}
}

/// Duration is in the same unit as the clock passed to
/// [`TweenEngine::advance`] (conventionally seconds).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TweenOptions {
	pub duration: f64,
	pub easing: Easing,
}

impl Default for TweenOptions {
	fn default() -> Self {
		Self { duration: 0.5, easing: Easing::default() }
	}
}

struct Tween {
	from: Vec2,
	to: Vec2,
	start: f64,
	duration: f64,
	easing: Easing,
	group: Option<u64>,
}

struct Group {
	remaining: usize,
	done: Sender<Result<(), EngineError>>,
}

/// Position tween engine. One active tween per node: a newer tween for the
/// same node cancels and replaces the old one (last caller wins).
pub struct TweenEngine {
	tweens: HashMap<String, Tween>,
	groups: HashMap<u64, Group>,
	next_group: u64,
	now: f64,
}

impl Default for TweenEngine {
	fn default() -> Self {
		Self::new()
	}
}

impl TweenEngine {
	pub fn new() -> Self {
		Self {
			tweens: HashMap::new(),
			groups: HashMap::new(),
			next_group: 0,
			now: 0.0,
		}
	}

	/// Tweens one node from `from` to `to`.
	pub fn move_node(&mut self, id: &str, from: Vec2, to: Vec2, options: TweenOptions) {
		self.schedule(id, from, to, options, None);
	}

	/// Tweens several nodes with shared options.
	pub fn move_nodes(&mut self, moves: &[(String, Vec2, Vec2)], options: TweenOptions) {
		for (id, from, to) in moves {
			self.schedule(id, *from, *to, options, None);
		}
	}

	/// Animates every node present in both maps toward its target layout.
	/// The pending resolves once all constituent tweens have completed or
	/// been cancelled. Nodes the current map no longer knows are skipped;
	/// absence is a normal state.
	pub fn transition_to(
		&mut self,
		current: &PositionMap,
		targets: &PositionMap,
		options: TweenOptions,
	) -> Pending<()> {
		let moves: Vec<(&String, Vec2, Vec2)> = targets
			.iter()
			.filter_map(|(id, to)| current.get(id).map(|from| (id, *from, *to)))
			.collect();
		self.grouped(moves, options)
	}

	/// Cluster-expand feedback: members fly out from a focal point.
	pub fn expand_from_center(
		&mut self,
		center: Vec2,
		targets: &PositionMap,
		options: TweenOptions,
	) -> Pending<()> {
		let moves: Vec<(&String, Vec2, Vec2)> =
			targets.iter().map(|(id, to)| (id, center, *to)).collect();
		self.grouped(moves, options)
	}

	/// Cluster-collapse feedback: the listed nodes converge on a focal
	/// point.
	pub fn collapse_to_center(
		&mut self,
		current: &PositionMap,
		ids: &[String],
		center: Vec2,
		options: TweenOptions,
	) -> Pending<()> {
		let moves: Vec<(&String, Vec2, Vec2)> = ids
			.iter()
			.filter_map(|id| current.get(id).map(|from| (id, *from, center)))
			.collect();
		self.grouped(moves, options)
	}

	fn grouped(&mut self, moves: Vec<(&String, Vec2, Vec2)>, options: TweenOptions) -> Pending<()> {
		if moves.is_empty() {
			return Pending::ready(());
		}
		let group_id = self.next_group;
		self.next_group += 1;
		let (tx, rx) = bounded(1);
		self.groups.insert(group_id, Group { remaining: moves.len(), done: tx });
		for (id, from, to) in moves {
			let id = id.clone();
			self.schedule(&id, from, to, options, Some(group_id));
		}
		Pending::waiting(rx)
	}

	fn schedule(&mut self, id: &str, from: Vec2, to: Vec2, options: TweenOptions, group: Option<u64>) {
		// Last caller wins; the replaced tween counts as cancelled for its
		// group.
		if let Some(previous) = self.tweens.remove(id) {
			self.settle_group_member(previous.group);
		}
		self.tweens.insert(
			id.to_string(),
			Tween {
				from,
				to,
				start: self.now,
				duration: options.duration,
				easing: options.easing,
				group,
			},
		);
	}

	/// Advances all tweens to `now` and returns the interpolated positions
	/// to apply this frame. Completed tweens snap exactly to their target
	/// and are removed.
	pub fn advance(&mut self, now: f64) -> Vec<(String, Vec2)> {
		self.now = now;
		let mut updates = Vec::with_capacity(self.tweens.len());
		let mut finished: Vec<String> = Vec::new();

		for (id, tween) in &self.tweens {
			let t = if tween.duration <= 0.0 {
				1.0
			} else {
				((now - tween.start) / tween.duration).clamp(0.0, 1.0)
			};
			let eased = tween.easing.apply(t);
			let pos = tween.from.add(tween.to.sub(tween.from).scale(eased));
			updates.push((id.clone(), pos));
			if t >= 1.0 {
				finished.push(id.clone());
			}
		}

		for id in finished {
			if let Some(tween) = self.tweens.remove(&id) {
				self.settle_group_member(tween.group);
			}
		}
		updates
	}

	/// Halts one node's tween, leaving it wherever the last `advance` put
	/// it. Safe to call for unknown or already-finished ids.
	pub fn cancel_node(&mut self, id: &str) {
		if let Some(tween) = self.tweens.remove(id) {
			self.settle_group_member(tween.group);
		}
	}

	/// Halts everything in flight; group pendings resolve.
	pub fn cancel_all(&mut self) {
		let tweens = std::mem::take(&mut self.tweens);
		for tween in tweens.into_values() {
			self.settle_group_member(tween.group);
		}
	}

	pub fn is_animating(&self) -> bool {
		!self.tweens.is_empty()
	}

	fn settle_group_member(&mut self, group: Option<u64>) {
		let Some(group_id) = group else { return };
		let finished = match self.groups.get_mut(&group_id) {
			Some(state) => {
				state.remaining = state.remaining.saturating_sub(1);
				state.remaining == 0
			}
			None => false,
		};
		if finished {
			if let Some(state) = self.groups.remove(&group_id) {
				let _ = state.done.send(Ok(()));
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn options(duration: f64) -> TweenOptions {
		TweenOptions { duration, easing: Easing::Linear }
	}

	proptest! {
		#[test]
		fn easing_output_never_leaves_the_unit_interval(t in -1.0f64..2.0) {
			for easing in [
				Easing::Linear,
				Easing::EaseInQuad,
				Easing::EaseOutQuad,
				Easing::EaseInOutQuad,
				Easing::EaseInCubic,
				Easing::EaseOutCubic,
				Easing::EaseInOutCubic,
			] {
				let eased = easing.apply(t);
				prop_assert!((0.0..=1.0).contains(&eased));
			}
		}
	}

	#[test]
	fn tween_interpolates_and_snaps_to_target() {
		let mut engine = TweenEngine::new();
		engine.move_node("a", Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), options(1.0));
		assert!(engine.is_animating());

		let halfway = engine.advance(0.5);
		assert_eq!(halfway, vec![("a".to_string(), Vec2::new(5.0, 0.0))]);

		let done = engine.advance(1.0);
		assert_eq!(done, vec![("a".to_string(), Vec2::new(10.0, 0.0))]);
		assert!(!engine.is_animating());
	}

	#[test]
	fn transition_resolves_only_when_every_tween_finishes() {
		let mut engine = TweenEngine::new();
		let current: PositionMap =
			[("a", Vec2::new(0.0, 0.0)), ("b", Vec2::new(4.0, 4.0))]
				.into_iter()
				.map(|(id, p)| (id.to_string(), p))
				.collect();
		let targets: PositionMap =
			[("a", Vec2::new(8.0, 0.0)), ("b", Vec2::new(0.0, 0.0))]
				.into_iter()
				.map(|(id, p)| (id.to_string(), p))
				.collect();

		let mut pending = engine.transition_to(&current, &targets, options(1.0));
		engine.advance(0.5);
		assert_eq!(pending.try_take(), None);

		engine.advance(1.5);
		assert_eq!(pending.try_take(), Some(Ok(())));
	}

	#[test]
	fn cancellation_counts_toward_transition_completion() {
		let mut engine = TweenEngine::new();
		let current: PositionMap = [("a".to_string(), Vec2::default())].into_iter().collect();
		let targets: PositionMap =
			[("a".to_string(), Vec2::new(10.0, 10.0))].into_iter().collect();

		let pending = engine.transition_to(&current, &targets, options(1.0));
		engine.cancel_all();
		assert_eq!(pending.wait(), Ok(()));
		assert!(!engine.is_animating());
	}

	#[test]
	fn interpolation_stays_on_the_start_target_segment() {
		let mut engine = TweenEngine::new();
		let (from, to) = (Vec2::new(2.0, 2.0), Vec2::new(12.0, 7.0));
		engine.move_node("a", from, to, TweenOptions { duration: 1.0, easing: Easing::EaseInOutCubic });

		for step in 0..=20 {
			let now = step as f64 / 20.0;
			for (_, pos) in engine.advance(now) {
				// On-segment positions keep each coordinate inside the
				// from/to interval.
				assert!(pos.x >= from.x - 1e-9 && pos.x <= to.x + 1e-9);
				assert!(pos.y >= from.y - 1e-9 && pos.y <= to.y + 1e-9);
			}
		}
	}

	#[test]
	fn last_caller_wins_on_the_same_node() {
		let mut engine = TweenEngine::new();
		engine.move_node("a", Vec2::default(), Vec2::new(10.0, 0.0), options(1.0));
		engine.advance(0.5);
		engine.move_node("a", Vec2::new(5.0, 0.0), Vec2::new(0.0, 20.0), options(1.0));

		let updates = engine.advance(1.5);
		assert_eq!(updates, vec![("a".to_string(), Vec2::new(0.0, 20.0))]);
	}

	#[test]
	fn redundant_cancellation_is_a_no_op() {
		let mut engine = TweenEngine::new();
		engine.cancel_node("missing");
		engine.cancel_all();
		engine.move_node("a", Vec2::default(), Vec2::new(1.0, 0.0), options(0.0));
		engine.advance(0.1);
		engine.cancel_node("a");
	}

	#[test]
	fn expand_and_collapse_run_through_a_focal_point() {
		let mut engine = TweenEngine::new();
		let center = Vec2::new(50.0, 50.0);
		let targets: PositionMap = [
			("a".to_string(), Vec2::new(0.0, 0.0)),
			("b".to_string(), Vec2::new(100.0, 100.0)),
		]
		.into_iter()
		.collect();

		let pending = engine.expand_from_center(center, &targets, options(1.0));
		let first = engine.advance(0.0);
		for (_, pos) in &first {
			assert_eq!(*pos, center);
		}
		engine.advance(1.0);
		assert_eq!(pending.wait(), Ok(()));

		let ids: Vec<String> = targets.keys().cloned().collect();
		let pending = engine.collapse_to_center(&targets, &ids, center, options(1.0));
		engine.advance(2.0);
		assert_eq!(pending.wait(), Ok(()));
	}
}
