//! Engine contexts.
//!
//! A context is built from a fixed list of plugin libraries and owns the
//! name → implementation tables used to lay out and render graphs. Layouts
//! are stored on the graph (per subgraph view) and tagged with the id of the
//! context that produced them.

use std::collections::BTreeMap;
use std::ffi::{CStr, CString};
use std::sync::atomic::{AtomicU64, Ordering};

use super::Failure;
use super::diag;
use super::graph::{Graph, SubgraphId};
use super::layout::{self, LayoutEngine};
use super::plugin::{ApiKind, PluginImpl, PreloadedSymbol};
use super::render::Renderer;
use crate::config::EngineFlags;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Bytes produced by one render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderData(Vec<u8>);

impl RenderData {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

struct Registered<T: ?Sized + 'static> {
    quality: i32,
    imp: &'static T,
}

pub struct Context {
    id: u64,
    version: CString,
    layouts: BTreeMap<&'static str, Registered<dyn LayoutEngine>>,
    renderers: BTreeMap<&'static str, Registered<dyn Renderer>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("layouts", &self.layouts.keys().collect::<Vec<_>>())
            .field("renderers", &self.renderers.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn register<T: ?Sized>(
    table: &mut BTreeMap<&'static str, Registered<T>>,
    name: &'static str,
    quality: i32,
    imp: &'static T,
) {
    match table.get(name) {
        Some(existing) if existing.quality >= quality => {}
        _ => {
            table.insert(name, Registered { quality, imp });
        }
    }
}

impl Context {
    /// Build a context that knows every implementation in `symbols`.
    pub fn with_plugins(symbols: &[PreloadedSymbol]) -> Result<Context, Failure> {
        if symbols.is_empty() {
            diag::error("no plugin libraries were provided");
            return Err(Failure);
        }

        let mut layouts = BTreeMap::new();
        let mut renderers = BTreeMap::new();
        for sym in symbols {
            for api in sym.library.apis {
                for ty in api.types {
                    match ty.imp {
                        PluginImpl::Layout(imp) => register(&mut layouts, ty.name, ty.quality, imp),
                        PluginImpl::Render(imp) => register(&mut renderers, ty.name, ty.quality, imp),
                    }
                }
            }
            tracing::debug!(target: "viz::engine", symbol = sym.symbol, library = sym.library.name, "plugin library loaded");
        }

        let version = CString::new(env!("VIZ_ENGINE_VERSION")).map_err(|_| {
            diag::error("engine version string contains a NUL byte");
            Failure
        })?;

        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(target: "viz::engine", context = id, "context created");
        Ok(Context {
            id,
            version,
            layouts,
            renderers,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn version(&self) -> &CStr {
        &self.version
    }

    fn names(&self, kind: ApiKind) -> Vec<&'static str> {
        match kind {
            ApiKind::Layout => self.layouts.keys().copied().collect(),
            ApiKind::Render => self.renderers.keys().copied().collect(),
        }
    }

    /// Sorted, de-duplicated implementation names of `kind`.
    pub fn plugin_list(&self, kind: &str) -> Option<Vec<String>> {
        let Some(kind) = ApiKind::from_name(kind) else {
            diag::error(format!(
                "unknown plugin kind \"{kind}\". Use one of: device layout render"
            ));
            return None;
        };
        Some(self.names(kind).into_iter().map(str::to_string).collect())
    }

    /// Lay out the `sub` view of `graph` with `engine`, replacing any layout
    /// already attached to that view.
    pub fn layout(&self, graph: &mut Graph, sub: SubgraphId, engine: &str) -> Result<(), Failure> {
        self.free_layout(graph, sub);

        let Some(reg) = self.layouts.get(engine) else {
            diag::error(format!(
                "Layout type: \"{engine}\" not recognized. Use one of: {}",
                self.names(ApiKind::Layout).join(" ")
            ));
            return Err(Failure);
        };

        let flags = EngineFlags::current();
        let result = layout::compute(engine, reg.imp, graph, sub, self.id, &flags);
        tracing::debug!(
            target: "viz::engine",
            engine,
            nodes = result.nodes.len(),
            edges = result.edges.len(),
            "layout computed"
        );
        graph.attach_layout(sub, result);
        Ok(())
    }

    /// Drop the layout attached to the `sub` view, if any.
    pub fn free_layout(&self, graph: &mut Graph, sub: SubgraphId) {
        if let Some(old) = graph.detach_layout(sub) {
            tracing::trace!(target: "viz::engine", engine = %old.engine, "layout freed");
        }
    }

    pub fn render(&self, graph: &Graph, sub: SubgraphId, format: &str) -> Result<RenderData, Failure> {
        let Some(reg) = self.renderers.get(format) else {
            diag::error(format!(
                "Format: \"{format}\" not recognized. Use one of: {}",
                self.names(ApiKind::Render).join(" ")
            ));
            return Err(Failure);
        };
        // A layout is only valid for the context that produced it.
        let Some(layout) = graph.layout(sub).filter(|l| l.context == self.id) else {
            diag::error("Layout was not done");
            return Err(Failure);
        };

        let bytes = reg.imp.render(graph, sub, layout, &EngineFlags::current());
        tracing::debug!(target: "viz::engine", format, bytes = bytes.len(), "render complete");
        Ok(RenderData(bytes))
    }

    /// Release engine-side resources held for this context.
    pub fn finalize(&mut self) {
        tracing::debug!(target: "viz::engine", context = self.id, "context finalized");
    }
}
