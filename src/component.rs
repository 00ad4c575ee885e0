use crate::{
	dom::Dom,
	error::Error,
	mount::mount_at,
	patch::patch,
	vdom::{Content, Namespace, VData, VNode},
};
use core::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::trace_span;

/// Instantiates a stateful component. Identity of the `Rc` is the component's
/// identity during reconciliation: two virtual nodes built from clones of the same
/// factory reconcile in place, anything else replaces.
pub type ComponentFactory<D> = Rc<dyn Fn() -> Box<dyn Component<D>>>;

/// A functional component: pure data in, tree out. Identity works as for
/// [`ComponentFactory`].
pub type RenderFn<D> = Rc<dyn Fn(&VData) -> Rc<VNode<D>>>;

/// A stateful component. Mounted exactly once, then updated through its
/// [`StatefulHandle`] until its virtual node is replaced or an ancestor's removal
/// cascades down to it.
pub trait Component<D: Dom> {
	/// Receives the owning virtual node's data snapshot, at mount and before every
	/// driven update.
	fn update_props(&mut self, _props: &Rc<VData>) {}

	fn render(&mut self) -> Rc<VNode<D>>;

	/// Post-mount hook, invoked once after the first rendered tree is attached.
	fn mounted(&mut self) {}

	/// Teardown hook. The engine guarantees at most one invocation, on whichever
	/// code path removes this instance's host representation.
	fn unmounted(&mut self) {}
}

/// The self-update record of a mounted stateful component: the instance, its most
/// recently rendered tree, the container it renders into, and a back-reference to
/// the virtual node currently owning it. Created once at first mount and carried
/// across patches by transfer from the previous virtual node to the next.
pub struct StatefulHandle<D: Dom> {
	component: RefCell<Box<dyn Component<D>>>,
	rendered: RefCell<Option<Rc<VNode<D>>>>,
	container: RefCell<D::Node>,
	owner: RefCell<Weak<VNode<D>>>,
	mounted: Cell<bool>,
	torn_down: Cell<bool>,
}

impl<D: Dom> StatefulHandle<D> {
	pub(crate) fn new(component: Box<dyn Component<D>>, container: D::Node, owner: &Rc<VNode<D>>) -> Rc<Self> {
		Rc::new(Self {
			component: RefCell::new(component),
			rendered: RefCell::new(None),
			container: RefCell::new(container),
			owner: RefCell::new(Rc::downgrade(owner)),
			mounted: Cell::new(false),
			torn_down: Cell::new(false),
		})
	}

	/// Re-points the handle at the virtual node that now owns it.
	pub(crate) fn adopt(&self, owner: &Rc<VNode<D>>, container: &D::Node) {
		*self.owner.borrow_mut() = Rc::downgrade(owner);
		*self.container.borrow_mut() = container.clone();
	}

	pub(crate) fn update_props(&self, props: &Rc<VData>) {
		self.component.borrow_mut().update_props(props);
	}

	/// Synchronously re-renders the component and reconciles the result against the
	/// previously rendered tree. This is the operation a component invokes on itself
	/// when its own state changed; it is also driven by the patch engine after a
	/// props update.
	pub fn update(&self, dom: &mut D) -> Result<(), Error> {
		self.update_at(dom, None)
	}

	pub(crate) fn update_at(&self, dom: &mut D, anchor: Option<&D::Node>) -> Result<(), Error> {
		let container = self.container.borrow().clone();
		let owner = self.owner.borrow().upgrade().ok_or(Error::OrphanedComponent)?;
		if self.mounted.get() {
			let span = trace_span!("Updating stateful component");
			let _enter = span.enter();
			let prev = self.rendered.borrow().clone().ok_or(Error::NotMounted)?;
			let next = self.component.borrow_mut().render();
			patch(dom, &prev, &next, &container)?;
			*self.rendered.borrow_mut() = Some(next.clone());
			owner.set_host(next.host());
		} else {
			let span = trace_span!("Mounting stateful component");
			let _enter = span.enter();
			let next = self.component.borrow_mut().render();
			mount_at(dom, &next, &container, Namespace::Html, anchor)?;
			*self.rendered.borrow_mut() = Some(next.clone());
			self.mounted.set(true);
			owner.set_host(next.host());
			self.component.borrow_mut().mounted();
		}
		Ok(())
	}

	pub(crate) fn rendered(&self) -> Option<Rc<VNode<D>>> {
		self.rendered.borrow().clone()
	}

	/// Fires the teardown hook; returns whether it actually ran. Idempotent.
	pub(crate) fn teardown(&self) -> bool {
		if self.torn_down.replace(true) {
			false
		} else {
			self.component.borrow_mut().unmounted();
			true
		}
	}
}

/// The memoized update record of a functional component position: the previous and
/// next virtual nodes occupying it and the container they render into. Built once at
/// first mount, transferred and retargeted in place on every subsequent patch.
pub struct FunctionalHandle<D: Dom> {
	prev: RefCell<Option<Rc<VNode<D>>>>,
	next: RefCell<Weak<VNode<D>>>,
	container: RefCell<D::Node>,
}

impl<D: Dom> FunctionalHandle<D> {
	pub(crate) fn new(next: &Rc<VNode<D>>, container: D::Node) -> Rc<Self> {
		Rc::new(Self {
			prev: RefCell::new(None),
			next: RefCell::new(Rc::downgrade(next)),
			container: RefCell::new(container),
		})
	}

	pub(crate) fn retarget(&self, prev: Rc<VNode<D>>, next: &Rc<VNode<D>>, container: &D::Node) {
		*self.prev.borrow_mut() = Some(prev);
		*self.next.borrow_mut() = Rc::downgrade(next);
		*self.container.borrow_mut() = container.clone();
	}

	/// Re-invokes the component function with the current data snapshot. First call
	/// mounts the produced tree; every later call reconciles it against the tree
	/// produced before.
	pub fn update(&self, dom: &mut D) -> Result<(), Error> {
		self.update_at(dom, None)
	}

	pub(crate) fn update_at(&self, dom: &mut D, anchor: Option<&D::Node>) -> Result<(), Error> {
		let container = self.container.borrow().clone();
		let next = self.next.borrow().upgrade().ok_or(Error::OrphanedComponent)?;
		let functional = match next.content() {
			Content::Functional(functional) => functional,
			_ => return Err(Error::MisplacedHandle),
		};

		let prev = self.prev.borrow().clone();
		if let Some(prev) = prev {
			let span = trace_span!("Updating functional component");
			let _enter = span.enter();
			let prev_tree = prev.produced().ok_or(Error::NotMounted)?;
			let next_tree = (functional.render)(&functional.data);
			*functional.produced.borrow_mut() = Some(next_tree.clone());
			patch(dom, &prev_tree, &next_tree, &container)?;
			next.set_host(next_tree.host());
		} else {
			let span = trace_span!("Mounting functional component");
			let _enter = span.enter();
			let tree = (functional.render)(&functional.data);
			mount_at(dom, &tree, &container, Namespace::Html, anchor)?;
			*functional.produced.borrow_mut() = Some(tree.clone());
			next.set_host(tree.host());
		}
		Ok(())
	}
}
