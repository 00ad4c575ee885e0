#![doc(html_root_url = "https://docs.rs/xylem-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A minimal virtual DOM engine: [`mount`] realizes a declarative tree of
//! [`VNode`]s as host nodes, [`patch`] reconciles a previous and a next tree in
//! place with minimal host mutations, and keyed child lists are reordered by a
//! double-ended comparison with a linear fallback.
//!
//! The host tree itself sits behind the [`Dom`] driver trait;
//! [`MemoryDom`] implements it for native targets, `browser::BrowserDom` for
//! `wasm32` targets.

pub use hashbrown;

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

#[cfg(target_arch = "wasm32")]
pub mod browser;
pub mod component;
pub mod dom;
pub mod error;
pub mod memory;
pub mod mount;
pub mod patch;
pub mod vdom;

pub use component::{Component, ComponentFactory, FunctionalHandle, RenderFn, StatefulHandle};
pub use dom::Dom;
pub use error::Error;
pub use memory::MemoryDom;
pub use mount::mount;
pub use patch::patch;
pub use vdom::{ChildList, Content, EventHandler, Key, Kind, Namespace, PortalTarget, StyleMap, VData, VNode, VProp};
