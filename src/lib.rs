//! Physics and layout core for a graph-visualization toolkit.
//!
//! A force-directed simulation (Barnes–Hut repulsion, edge springs, a
//! centering pull) computes node positions behind one [`LayoutEngine`]
//! contract with two interchangeable executions: in-process on the caller's
//! thread, or offloaded to a worker thread behind a message-passing proxy.
//! Alongside it, a [`ClusterHierarchy`] plus [`LodManager`] pick which
//! nodes or aggregate clusters a renderer should draw at the current zoom,
//! and a [`TweenEngine`] animates positions across layout changes.
//!
//! Rendering, hit-testing and input normalization are external consumers of
//! the positions and render sets produced here.

// Modules
mod animation;
mod cluster;
mod config;
mod engine;
mod lod;
mod solver;
mod state;
mod types;

pub use animation::{Easing, TweenEngine, TweenOptions};
pub use cluster::{ClusterHierarchy, ClusterNode};
pub use config::{LodConfig, PhysicsConfig};
pub use engine::{
	EngineError, ExecutionMode, LayoutEngine, Op, OpReply, Pending, SyncEngine, WorkerEngine,
	create_engine,
};
pub use lod::{LodManager, LodRenderSet};
pub use solver::{Quad, QuadTree};
pub use state::{NodeState, NodeStateStore};
pub use types::{GraphData, GraphLink, GraphNode, GroupAssignment, PositionMap, Vec2};
