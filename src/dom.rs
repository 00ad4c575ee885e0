use crate::{
	error::Error,
	vdom::{Namespace, PortalTarget, VProp},
};
use core::fmt::Debug;

/// The host-tree driver: every mutation the engine performs against the real tree goes
/// through one of these operations.
///
/// The engine never holds on to host nodes beyond the opaque [`Node`](`Dom::Node`)
/// handles it stores in virtual nodes; the driver owns the tree. Handles must stay
/// valid until the engine detaches the node they refer to.
///
/// Two implementations ship with this crate: [`MemoryDom`](`crate::memory::MemoryDom`)
/// for native targets and tests, and `BrowserDom` on top of
/// [***Document***](https://developer.mozilla.org/en-US/docs/Web/API/Document) for
/// `wasm32` targets.
pub trait Dom: 'static {
	type Node: Clone + PartialEq + Debug;

	fn create_element(&mut self, tag: &str, namespace: Namespace) -> Result<Self::Node, Error>;
	fn create_text(&mut self, text: &str) -> Result<Self::Node, Error>;
	fn set_text(&mut self, node: &Self::Node, text: &str) -> Result<(), Error>;

	/// Applies one data entry transition to `node`.
	///
	/// `prev`/`next` are the values at the same key in the previous and next virtual
	/// node; `None` means the key was or will be absent. How the entry lands on the
	/// host node is decided by [`categorize`].
	fn patch_data(&mut self, node: &Self::Node, key: &str, prev: Option<&VProp>, next: Option<&VProp>) -> Result<(), Error>;

	/// Inserts `node` into `parent` before `reference`, or at the end when `reference`
	/// is `None`. A node that is already attached elsewhere is detached first, like
	/// [***insertBefore***](https://developer.mozilla.org/en-US/docs/Web/API/Node/insertBefore).
	fn insert_before(&mut self, parent: &Self::Node, node: &Self::Node, reference: Option<&Self::Node>) -> Result<(), Error>;
	fn append_child(&mut self, parent: &Self::Node, node: &Self::Node) -> Result<(), Error>;
	fn remove_child(&mut self, parent: &Self::Node, node: &Self::Node) -> Result<(), Error>;
	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

	/// Resolves a portal mount point. Failure is fatal for the portal's subtree.
	fn resolve_target(&mut self, target: &PortalTarget<Self::Node>) -> Result<Self::Node, Error>;
}

/// How a data key lands on a host element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataCategory<'a> {
	/// `style`: each sub-property is applied individually, and sub-properties present
	/// only in the previous value are cleared.
	Style,
	/// `class`: the element's class string, set directly.
	Class,
	/// `on*`: an event listener for the suffix event name; the previous listener is
	/// removed and the next one added.
	Event(&'a str),
	/// A live DOM property rather than an attribute.
	Property,
	/// Anything else: a plain attribute.
	Attribute,
}

/// Classifies a data key for both drivers, mirroring the dispatch order of the
/// attribute setter: `style` and `class` first, then the event prefix, then the
/// property allowlist, then plain attributes.
#[must_use]
pub fn categorize(key: &str) -> DataCategory<'_> {
	match key {
		"style" => DataCategory::Style,
		"class" => DataCategory::Class,
		_ if key.len() > 2 && key.starts_with("on") => DataCategory::Event(&key[2..]),
		_ if is_dom_property(key) => DataCategory::Property,
		_ => DataCategory::Attribute,
	}
}

fn is_dom_property(key: &str) -> bool {
	matches!(key, "value" | "checked" | "selected" | "muted")
}
