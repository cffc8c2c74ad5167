//! In-process graph engine: graph store, DOT reader, layout engines and
//! renderers, driven through plugin contexts and reporting problems through
//! a process-wide diagnostic sink.

pub mod context;
pub mod diag;
pub mod graph;
pub mod html;
pub mod layout;
pub mod plugin;
pub mod read;
pub mod render;

pub use context::{Context, RenderData};
pub use graph::{Desc, EdgeId, Graph, NodeId, ObjKind, ObjRef, SubgraphId, Value};

/// An engine call failed. The reason was reported through [`diag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure;
