//! The simulation engine contract and its two interchangeable variants.
//!
//! Every operation returns a [`Pending`] result: the in-process variant
//! resolves it immediately, the worker-offloaded variant when the reply
//! arrives. Callers write one code path against [`LayoutEngine`] and never
//! branch on which variant they hold.

mod protocol;
mod sim;
mod sync;
mod worker;

pub use protocol::{Op, OpReply};
pub use sync::SyncEngine;
pub use worker::WorkerEngine;

pub(crate) use sim::SimCore;

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PhysicsConfig;
use crate::types::{GraphData, GroupAssignment, PositionMap, Vec2};

/// Transport and QoS conditions. Domain-level absences (unknown node ids,
/// tick before initialize) are deliberately not errors.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EngineError {
	#[error("worker thread is not available")]
	WorkerUnavailable,
	#[error("worker channel closed before a reply arrived")]
	ChannelClosed,
	#[error("a tick is already in flight")]
	TickInFlight,
	#[error("tick skipped by the interaction throttle")]
	Throttled,
}

enum PendingState<T> {
	Ready(Option<Result<T, EngineError>>),
	Waiting(Receiver<Result<T, EngineError>>),
}

/// A deferred operation result. The sync engine hands these back already
/// resolved; the worker engine resolves them when its reply lands.
pub struct Pending<T> {
	state: PendingState<T>,
}

impl<T> Pending<T> {
	pub fn ready(value: T) -> Self {
		Self { state: PendingState::Ready(Some(Ok(value))) }
	}

	pub fn failed(error: EngineError) -> Self {
		Self { state: PendingState::Ready(Some(Err(error))) }
	}

	pub(crate) fn waiting(rx: Receiver<Result<T, EngineError>>) -> Self {
		Self { state: PendingState::Waiting(rx) }
	}

	/// Blocks until the result is available. A closed reply channel settles
	/// as [`EngineError::ChannelClosed`] rather than hanging.
	pub fn wait(self) -> Result<T, EngineError> {
		match self.state {
			PendingState::Ready(value) => value.unwrap_or(Err(EngineError::ChannelClosed)),
			PendingState::Waiting(rx) => rx.recv().unwrap_or(Err(EngineError::ChannelClosed)),
		}
	}

	/// Non-blocking poll; `None` while the reply is still outstanding.
	pub fn try_take(&mut self) -> Option<Result<T, EngineError>> {
		match &mut self.state {
			PendingState::Ready(value) => value.take(),
			PendingState::Waiting(rx) => match rx.try_recv() {
				Ok(result) => Some(result),
				Err(TryRecvError::Empty) => None,
				Err(TryRecvError::Disconnected) => Some(Err(EngineError::ChannelClosed)),
			},
		}
	}
}

/// The one logical simulation contract both variants implement.
///
/// Operations behave identically across variants modulo latency. Grouping
/// crosses this interface only as a plain [`GroupAssignment`]; the
/// closure-based form lives on [`SyncEngine`] alone because a callback
/// cannot cross a thread boundary.
pub trait LayoutEngine {
	/// (Re)creates the node state store and returns initial positions.
	fn initialize(&mut self, graph: GraphData) -> Pending<PositionMap>;
	/// Advances the solver one step. May resolve to
	/// [`EngineError::TickInFlight`] or [`EngineError::Throttled`] when the
	/// step was dropped; both are ordinary, discardable outcomes for a
	/// frame-loop driver.
	fn tick(&mut self) -> Pending<PositionMap>;
	fn set_node_position(&mut self, id: &str, pos: Vec2) -> Pending<()>;
	fn pin_node(&mut self, id: &str) -> Pending<()>;
	fn unpin_node(&mut self, id: &str) -> Pending<()>;
	fn positions(&mut self) -> Pending<PositionMap>;
	/// Rescales simulation bounds; existing velocities survive.
	fn resize(&mut self, width: f64, height: f64) -> Pending<()>;
	/// Stores the community assignment used by the next `initialize`.
	fn set_grouping(&mut self, assignment: GroupAssignment) -> Pending<()>;
	/// Soft QoS toggle: while interacting, ticks are rate-limited to keep
	/// pan/zoom/drag smooth.
	fn set_interacting(&mut self, interacting: bool);
	/// Releases engine resources. In-flight pendings settle rather than
	/// hang; further operations fail with [`EngineError::WorkerUnavailable`]
	/// on the offloaded variant.
	fn shutdown(&mut self);
}

/// Which variant [`create_engine`] should construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
	/// Everything on the caller's thread.
	Sync,
	/// Solver and state store on a dedicated worker thread.
	Offloaded,
}

/// Builds an engine for the requested mode. If the worker thread cannot be
/// spawned the engine falls back to the sync variant: once, here, never
/// per-call.
pub fn create_engine(config: PhysicsConfig, mode: ExecutionMode) -> Box<dyn LayoutEngine> {
	match mode {
		ExecutionMode::Sync => Box::new(SyncEngine::new(config)),
		ExecutionMode::Offloaded => match WorkerEngine::spawn(config.clone()) {
			Ok(engine) => Box::new(engine),
			Err(err) => {
				warn!("layout worker unavailable ({err}), falling back to sync engine");
				Box::new(SyncEngine::new(config))
			}
		},
	}
}

/// Per-engine tick rate limiter. Owned by the engine instance so separate
/// simulations never share timer state.
pub(crate) struct InteractionThrottle {
	min_interval: Duration,
	interacting: bool,
	last_tick: Option<Instant>,
}

impl InteractionThrottle {
	pub(crate) fn new(min_interval: Duration) -> Self {
		Self { min_interval, interacting: false, last_tick: None }
	}

	pub(crate) fn set_interacting(&mut self, interacting: bool) {
		self.interacting = interacting;
	}

	/// False when the tick should be dropped for interaction smoothness.
	pub(crate) fn allow_tick(&mut self) -> bool {
		let now = Instant::now();
		if self.interacting {
			if let Some(last) = self.last_tick {
				if now.duration_since(last) < self.min_interval {
					return false;
				}
			}
		}
		self.last_tick = Some(now);
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pending_ready_resolves_immediately() {
		let mut pending = Pending::ready(7);
		assert_eq!(pending.try_take(), Some(Ok(7)));
		assert_eq!(pending.try_take(), None);
	}

	#[test]
	fn pending_settles_when_sender_is_dropped() {
		let (tx, rx) = crossbeam_channel::bounded::<Result<u32, EngineError>>(1);
		let pending = Pending::waiting(rx);
		drop(tx);
		assert_eq!(pending.wait(), Err(EngineError::ChannelClosed));
	}

	#[test]
	fn throttle_only_bites_while_interacting() {
		let mut throttle = InteractionThrottle::new(Duration::from_secs(60));
		assert!(throttle.allow_tick());
		assert!(throttle.allow_tick());

		throttle.set_interacting(true);
		assert!(!throttle.allow_tick());

		throttle.set_interacting(false);
		assert!(throttle.allow_tick());
	}
}
