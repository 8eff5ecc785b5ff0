//! Worker boundary protocol: an operation tag with plain serializable
//! arguments, answered by a result or an error indicator. Nothing carrying
//! a function value may appear here; grouping crosses as a resolved
//! [`GroupAssignment`].

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use super::EngineError;
use crate::types::{GraphData, GroupAssignment, PositionMap, Vec2};

/// One engine operation in wire form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Op {
	Initialize { graph: GraphData },
	Tick,
	SetNodePosition { id: String, pos: Vec2 },
	PinNode { id: String },
	UnpinNode { id: String },
	GetPositions,
	Resize { width: f64, height: f64 },
	SetGrouping { assignment: GroupAssignment },
}

/// The operation's result in wire form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum OpReply {
	Positions(PositionMap),
	Ack,
}

/// Reply route for one request, typed by what the caller's [`super::Pending`]
/// expects.
pub(crate) enum ReplyTo {
	Positions(Sender<Result<PositionMap, EngineError>>),
	Ack(Sender<Result<(), EngineError>>),
}

impl ReplyTo {
	/// Delivers the worker's reply to whichever pending is waiting. A send
	/// failure means the caller discarded its pending; that's theirs to do.
	pub(crate) fn deliver(self, result: Result<OpReply, EngineError>) {
		match self {
			ReplyTo::Positions(tx) => {
				let mapped = result.map(|reply| match reply {
					OpReply::Positions(map) => map,
					OpReply::Ack => PositionMap::new(),
				});
				let _ = tx.send(mapped);
			}
			ReplyTo::Ack(tx) => {
				let _ = tx.send(result.map(|_| ()));
			}
		}
	}
}

/// Transport envelope: the serializable op plus its in-process reply route.
pub(crate) struct Request {
	pub(crate) op: Op,
	pub(crate) reply: ReplyTo,
}
