use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use log::{debug, info};

use super::protocol::{Op, OpReply, ReplyTo, Request};
use super::{EngineError, InteractionThrottle, LayoutEngine, Pending, SimCore};
use crate::config::PhysicsConfig;
use crate::types::{GraphData, GroupAssignment, PositionMap, Vec2};

/// Caller-side proxy for a simulation running on a dedicated worker thread.
///
/// The worker owns the only [`SimCore`]; the proxy never touches node state.
/// Requests are processed strictly in submission order, so a position-set
/// issued before a tick is observed by that tick. There is no shared mutable
/// memory across the boundary, only requests and replies.
pub struct WorkerEngine {
	sender: Option<Sender<Request>>,
	handle: Option<JoinHandle<()>>,
	tick_in_flight: Arc<AtomicBool>,
	throttle: InteractionThrottle,
}

impl WorkerEngine {
	/// Spawns the worker thread. Failure here is the caller's cue to fall
	/// back to [`super::SyncEngine`] (see [`super::create_engine`]).
	pub fn spawn(config: PhysicsConfig) -> io::Result<Self> {
		let (sender, receiver) = unbounded::<Request>();
		let tick_in_flight = Arc::new(AtomicBool::new(false));
		let worker_flag = Arc::clone(&tick_in_flight);
		let throttle = InteractionThrottle::new(config.min_tick_interval);

		let handle = thread::Builder::new()
			.name("force-graph-worker".into())
			.spawn(move || worker_loop(receiver, worker_flag, config))?;
		info!("layout worker started");

		Ok(Self {
			sender: Some(sender),
			handle: Some(handle),
			tick_in_flight,
			throttle,
		})
	}

	fn request_positions(&self, op: Op) -> Pending<PositionMap> {
		let Some(sender) = &self.sender else {
			return Pending::failed(EngineError::WorkerUnavailable);
		};
		let (tx, rx) = bounded(1);
		match sender.send(Request { op, reply: ReplyTo::Positions(tx) }) {
			Ok(()) => Pending::waiting(rx),
			Err(_) => Pending::failed(EngineError::ChannelClosed),
		}
	}

	fn request_ack(&self, op: Op) -> Pending<()> {
		let Some(sender) = &self.sender else {
			return Pending::failed(EngineError::WorkerUnavailable);
		};
		let (tx, rx) = bounded(1);
		match sender.send(Request { op, reply: ReplyTo::Ack(tx) }) {
			Ok(()) => Pending::waiting(rx),
			Err(_) => Pending::failed(EngineError::ChannelClosed),
		}
	}
}

impl LayoutEngine for WorkerEngine {
	fn initialize(&mut self, graph: GraphData) -> Pending<PositionMap> {
		self.request_positions(Op::Initialize { graph })
	}

	fn tick(&mut self) -> Pending<PositionMap> {
		if !self.throttle.allow_tick() {
			debug!("tick skipped: interaction throttle");
			return Pending::failed(EngineError::Throttled);
		}
		let Some(sender) = &self.sender else {
			return Pending::failed(EngineError::WorkerUnavailable);
		};
		// Backpressure guard: never queue a second tick behind a slow one.
		if self.tick_in_flight.swap(true, Ordering::SeqCst) {
			debug!("tick dropped: previous tick still in flight");
			return Pending::failed(EngineError::TickInFlight);
		}
		let (tx, rx) = bounded(1);
		match sender.send(Request { op: Op::Tick, reply: ReplyTo::Positions(tx) }) {
			Ok(()) => Pending::waiting(rx),
			Err(_) => {
				// The worker will never clear a guard it never saw.
				self.tick_in_flight.store(false, Ordering::SeqCst);
				Pending::failed(EngineError::ChannelClosed)
			}
		}
	}

	fn set_node_position(&mut self, id: &str, pos: Vec2) -> Pending<()> {
		self.request_ack(Op::SetNodePosition { id: id.to_string(), pos })
	}

	fn pin_node(&mut self, id: &str) -> Pending<()> {
		self.request_ack(Op::PinNode { id: id.to_string() })
	}

	fn unpin_node(&mut self, id: &str) -> Pending<()> {
		self.request_ack(Op::UnpinNode { id: id.to_string() })
	}

	fn positions(&mut self) -> Pending<PositionMap> {
		self.request_positions(Op::GetPositions)
	}

	fn resize(&mut self, width: f64, height: f64) -> Pending<()> {
		self.request_ack(Op::Resize { width, height })
	}

	fn set_grouping(&mut self, assignment: GroupAssignment) -> Pending<()> {
		self.request_ack(Op::SetGrouping { assignment })
	}

	fn set_interacting(&mut self, interacting: bool) {
		self.throttle.set_interacting(interacting);
	}

	/// Closes the request channel and joins the worker. Replies already in
	/// flight still deliver; pendings whose request never ran settle as
	/// [`EngineError::ChannelClosed`] when the worker drops their reply
	/// route. Afterwards every operation fails with `WorkerUnavailable`.
	fn shutdown(&mut self) {
		if self.sender.take().is_some() {
			if let Some(handle) = self.handle.take() {
				let _ = handle.join();
			}
			self.tick_in_flight.store(false, Ordering::SeqCst);
			info!("layout worker stopped");
		}
	}
}

impl Drop for WorkerEngine {
	fn drop(&mut self) {
		self.shutdown();
	}
}

fn worker_loop(receiver: Receiver<Request>, tick_in_flight: Arc<AtomicBool>, config: PhysicsConfig) {
	let mut core = SimCore::new(config);
	for request in receiver.iter() {
		let is_tick = matches!(request.op, Op::Tick);
		let reply = apply(&mut core, request.op);
		request.reply.deliver(Ok(reply));
		// Cleared only after the reply is on its way; the guard upholds
		// "at most one tick in the queue" rather than a timing promise.
		if is_tick {
			tick_in_flight.store(false, Ordering::SeqCst);
		}
	}
	tick_in_flight.store(false, Ordering::SeqCst);
	debug!("layout worker request channel closed, exiting");
}

fn apply(core: &mut SimCore, op: Op) -> OpReply {
	match op {
		Op::Initialize { graph } => OpReply::Positions(core.initialize(&graph)),
		Op::Tick => OpReply::Positions(core.tick()),
		Op::SetNodePosition { id, pos } => {
			core.set_node_position(&id, pos);
			OpReply::Ack
		}
		Op::PinNode { id } => {
			core.pin_node(&id);
			OpReply::Ack
		}
		Op::UnpinNode { id } => {
			core.unpin_node(&id);
			OpReply::Ack
		}
		Op::GetPositions => OpReply::Positions(core.positions()),
		Op::Resize { width, height } => {
			core.resize(width, height);
			OpReply::Ack
		}
		Op::SetGrouping { assignment } => {
			core.set_grouping(assignment);
			OpReply::Ack
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::{GraphLink, GraphNode};

	fn graph() -> GraphData {
		GraphData {
			nodes: ["a", "b"]
				.iter()
				.map(|id| GraphNode {
					id: (*id).to_string(),
					label: None,
					group: None,
				})
				.collect(),
			links: vec![GraphLink { source: "a".into(), target: "b".into() }],
		}
	}

	#[test]
	fn requests_are_observed_in_submission_order() {
		let mut engine = WorkerEngine::spawn(PhysicsConfig::default()).unwrap();
		engine.initialize(graph()).wait().unwrap();

		// The position set is issued before the tick, so the tick must see
		// the node starting from (0, 0); pinned, it stays there.
		let _ = engine.pin_node("a");
		let _ = engine.set_node_position("a", Vec2::new(0.0, 0.0));
		let after_tick = engine.tick().wait().unwrap();
		assert_eq!(after_tick["a"], Vec2::new(0.0, 0.0));
		engine.shutdown();
	}

	#[test]
	fn shutdown_settles_subsequent_requests_without_hanging() {
		let mut engine = WorkerEngine::spawn(PhysicsConfig::default()).unwrap();
		engine.initialize(graph()).wait().unwrap();
		engine.shutdown();

		assert_eq!(
			engine.positions().wait(),
			Err(EngineError::WorkerUnavailable)
		);
		assert_eq!(engine.tick().wait(), Err(EngineError::WorkerUnavailable));
		// Redundant shutdown is harmless.
		engine.shutdown();
	}

	#[test]
	fn tick_guard_clears_after_each_completed_tick() {
		let mut engine = WorkerEngine::spawn(PhysicsConfig::default()).unwrap();
		engine.initialize(graph()).wait().unwrap();
		for _ in 0..5 {
			assert!(engine.tick().wait().is_ok());
		}
		engine.shutdown();
	}
}
