use crate::{
	component::{ComponentFactory, FunctionalHandle, RenderFn, StatefulHandle},
	dom::Dom,
};
use core::{cell::RefCell, fmt};
use std::rc::Rc;

/// A virtual node's data map: attribute, property, style, class and listener entries,
/// keyed by the name the host driver dispatches on.
pub type VData = hashbrown::HashMap<String, VProp>;

/// The value of a `style` data entry: style sub-property name to value.
pub type StyleMap = hashbrown::HashMap<String, String>;

/// One position in a declarative tree, not yet (or no longer exactly) realized as
/// host-tree nodes.
///
/// A virtual node is created per render pass, mounted exactly once (which assigns its
/// host handle), and from then on only ever touched by the patch engine, which either
/// reuses it as the "previous" side of a reconciliation or discards it together with
/// its host representation. Its [`Kind`] never changes; an update that needs a
/// different kind at the same logical position replaces the node wholesale.
pub struct VNode<D: Dom> {
	key: Option<Key>,
	content: Content<D>,
	host: RefCell<Option<D::Node>>,
}

/// Per-kind payload of a [`VNode`]. Exactly one case per node kind, each carrying only
/// the state that is valid for that kind.
pub enum Content<D: Dom> {
	Element(ElementNode<D>),
	Text(String),
	Fragment(FragmentNode<D>),
	Portal(PortalNode<D>),
	Stateful(StatefulNode<D>),
	Functional(FunctionalNode<D>),
}

/// Child cardinality and payload in one: the list's shape *is* its tag.
pub enum ChildList<D: Dom> {
	None,
	One(Rc<VNode<D>>),
	/// Must be non-empty; an empty vector is a caller-contract violation answered
	/// with [`Error::EmptyChildList`](`crate::error::Error::EmptyChildList`).
	Many(Vec<Rc<VNode<D>>>),
}

pub struct ElementNode<D: Dom> {
	pub tag: String,
	pub namespace: Namespace,
	pub data: Rc<VData>,
	pub children: ChildList<D>,
}

pub struct FragmentNode<D: Dom> {
	pub children: ChildList<D>,
}

pub struct PortalNode<D: Dom> {
	pub target: PortalTarget<D::Node>,
	pub children: ChildList<D>,
	/// The host node `target` resolved to at mount time. Later patches reconcile into
	/// this before deciding whether the content has to relocate.
	pub(crate) resolved: RefCell<Option<D::Node>>,
}

pub struct StatefulNode<D: Dom> {
	pub factory: ComponentFactory<D>,
	pub data: Rc<VData>,
	pub(crate) handle: RefCell<Option<Rc<StatefulHandle<D>>>>,
}

pub struct FunctionalNode<D: Dom> {
	pub render: RenderFn<D>,
	pub data: Rc<VData>,
	pub(crate) handle: RefCell<Option<Rc<FunctionalHandle<D>>>>,
	pub(crate) produced: RefCell<Option<Rc<VNode<D>>>>,
}

/// Discriminant of a [`Content`], including the element namespace sub-case.
///
/// Two virtual nodes are reconcilable in place only when their kinds are equal;
/// anything else is a replace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
	Element(Namespace),
	Text,
	Fragment,
	Portal,
	Stateful,
	Functional,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
	Html,
	Svg,
}

/// Stable per-sibling identity for keyed reconciliation. Unique among keyed siblings;
/// unkeyed siblings match each other positionally.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
	Number(i64),
	Text(String),
}

impl From<i64> for Key {
	fn from(key: i64) -> Self {
		Key::Number(key)
	}
}
impl From<i32> for Key {
	fn from(key: i32) -> Self {
		Key::Number(key.into())
	}
}
impl From<&str> for Key {
	fn from(key: &str) -> Self {
		Key::Text(key.to_owned())
	}
}
impl From<String> for Key {
	fn from(key: String) -> Self {
		Key::Text(key)
	}
}

/// Where a portal mounts its children: a selector resolved by the host driver, or a
/// host node supplied directly.
#[derive(Clone, Debug, PartialEq)]
pub enum PortalTarget<N> {
	Selector(String),
	Node(N),
}

/// One data entry value. Which shapes are legal for a given key is decided by the
/// driver through [`categorize`](`crate::dom::categorize`).
#[derive(Clone, Debug, PartialEq)]
pub enum VProp {
	Text(String),
	Flag(bool),
	Style(StyleMap),
	Listener(EventHandler),
}

/// An event callback, shipped to the host driver as-is. The engine itself never
/// invokes it; equality is handler identity, so cloning a handler into the next
/// render pass keeps the driver from re-binding it.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn()>);

impl EventHandler {
	pub fn new(handler: impl Fn() + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self) {
		(self.0)()
	}

	#[must_use]
	pub fn identity(&self) -> usize {
		Rc::as_ptr(&self.0) as *const () as usize
	}
}

impl PartialEq for EventHandler {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for EventHandler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "EventHandler({:#x})", self.identity())
	}
}

impl<D: Dom> Clone for ChildList<D> {
	fn clone(&self) -> Self {
		match self {
			ChildList::None => ChildList::None,
			ChildList::One(child) => ChildList::One(child.clone()),
			ChildList::Many(children) => ChildList::Many(children.clone()),
		}
	}
}

impl<D: Dom> VNode<D> {
	pub fn element(tag: impl Into<String>, data: VData, children: ChildList<D>) -> Self {
		Self::new_element(tag, Namespace::Html, data, children)
	}

	pub fn svg(tag: impl Into<String>, data: VData, children: ChildList<D>) -> Self {
		Self::new_element(tag, Namespace::Svg, data, children)
	}

	fn new_element(tag: impl Into<String>, namespace: Namespace, data: VData, children: ChildList<D>) -> Self {
		Self::with_content(Content::Element(ElementNode {
			tag: tag.into(),
			namespace,
			data: Rc::new(data),
			children,
		}))
	}

	pub fn text(text: impl Into<String>) -> Self {
		Self::with_content(Content::Text(text.into()))
	}

	pub fn fragment(children: ChildList<D>) -> Self {
		Self::with_content(Content::Fragment(FragmentNode { children }))
	}

	pub fn portal(target: PortalTarget<D::Node>, children: ChildList<D>) -> Self {
		Self::with_content(Content::Portal(PortalNode {
			target,
			children,
			resolved: RefCell::new(None),
		}))
	}

	pub fn stateful(factory: ComponentFactory<D>, data: VData) -> Self {
		Self::with_content(Content::Stateful(StatefulNode {
			factory,
			data: Rc::new(data),
			handle: RefCell::new(None),
		}))
	}

	pub fn functional(render: RenderFn<D>, data: VData) -> Self {
		Self::with_content(Content::Functional(FunctionalNode {
			render,
			data: Rc::new(data),
			handle: RefCell::new(None),
			produced: RefCell::new(None),
		}))
	}

	fn with_content(content: Content<D>) -> Self {
		Self {
			key: None,
			content,
			host: RefCell::new(None),
		}
	}

	#[must_use]
	pub fn keyed(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn kind(&self) -> Kind {
		match &self.content {
			Content::Element(element) => Kind::Element(element.namespace),
			Content::Text(_) => Kind::Text,
			Content::Fragment(_) => Kind::Fragment,
			Content::Portal(_) => Kind::Portal,
			Content::Stateful(_) => Kind::Stateful,
			Content::Functional(_) => Kind::Functional,
		}
	}

	#[must_use]
	pub fn key(&self) -> Option<&Key> {
		self.key.as_ref()
	}

	#[must_use]
	pub fn content(&self) -> &Content<D> {
		&self.content
	}

	/// The host node this virtual node most recently produced. A non-owning
	/// observation handle: the host tree owns its nodes, the virtual node merely
	/// remembers where it is.
	#[must_use]
	pub fn host(&self) -> Option<D::Node> {
		self.host.borrow().clone()
	}

	pub(crate) fn set_host(&self, node: Option<D::Node>) {
		*self.host.borrow_mut() = node;
	}

	/// The live instance handle of a mounted stateful component node.
	#[must_use]
	pub fn stateful_handle(&self) -> Option<Rc<StatefulHandle<D>>> {
		match &self.content {
			Content::Stateful(stateful) => stateful.handle.borrow().clone(),
			_ => None,
		}
	}

	/// The memoized update handle of a mounted functional component node.
	#[must_use]
	pub fn functional_handle(&self) -> Option<Rc<FunctionalHandle<D>>> {
		match &self.content {
			Content::Functional(functional) => functional.handle.borrow().clone(),
			_ => None,
		}
	}

	/// The tree a mounted functional component node most recently produced.
	#[must_use]
	pub fn produced(&self) -> Option<Rc<VNode<D>>> {
		match &self.content {
			Content::Functional(functional) => functional.produced.borrow().clone(),
			_ => None,
		}
	}
}
