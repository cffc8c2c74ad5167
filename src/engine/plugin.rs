//! Plugin descriptors.
//!
//! A plugin library is a static table of APIs, each listing named
//! implementations. Contexts are built from a list of libraries and register
//! every implementation by name; nothing is discovered at run time.

use std::fmt;

use super::layout::LayoutEngine;
use super::render::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApiKind {
    Layout,
    Render,
}

impl ApiKind {
    /// `device` names the same output formats as `render`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "layout" => Some(ApiKind::Layout),
            "render" | "device" => Some(ApiKind::Render),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ApiKind::Layout => "layout",
            ApiKind::Render => "render",
        }
    }
}

#[derive(Clone, Copy)]
pub enum PluginImpl {
    Layout(&'static dyn LayoutEngine),
    Render(&'static dyn Renderer),
}

impl fmt::Debug for PluginImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginImpl::Layout(_) => f.write_str("Layout(..)"),
            PluginImpl::Render(_) => f.write_str("Render(..)"),
        }
    }
}

/// One named implementation. Higher quality wins when names collide.
#[derive(Debug, Clone, Copy)]
pub struct PluginType {
    pub name: &'static str,
    pub quality: i32,
    pub imp: PluginImpl,
}

#[derive(Debug, Clone, Copy)]
pub struct PluginApi {
    pub kind: ApiKind,
    pub types: &'static [PluginType],
}

#[derive(Debug, Clone, Copy)]
pub struct PluginLibrary {
    pub name: &'static str,
    pub apis: &'static [PluginApi],
}

/// A library entry in a preloaded symbol table.
#[derive(Debug, Clone, Copy)]
pub struct PreloadedSymbol {
    pub symbol: &'static str,
    pub library: &'static PluginLibrary,
}
