use crate::{
	component::{FunctionalHandle, StatefulHandle},
	dom::Dom,
	error::Error,
	vdom::{ChildList, Content, ElementNode, FragmentNode, Namespace, PortalNode, VNode},
};
use std::rc::Rc;
use tracing::trace_span;

/// First paint: realizes `vnode` as host nodes appended to `container` and assigns
/// its host handle. Mounting the same virtual node twice is a caller error.
pub fn mount<D: Dom>(dom: &mut D, vnode: &Rc<VNode<D>>, container: &D::Node) -> Result<(), Error> {
	mount_at(dom, vnode, container, Namespace::Html, None)
}

/// `ns` is the namespace context inherited from the nearest element ancestor;
/// `anchor` selects insert-before over append so keyed-diff insertions land mid-list.
pub(crate) fn mount_at<D: Dom>(dom: &mut D, vnode: &Rc<VNode<D>>, container: &D::Node, ns: Namespace, anchor: Option<&D::Node>) -> Result<(), Error> {
	match vnode.content() {
		Content::Element(element) => mount_element(dom, vnode, element, container, ns, anchor),
		Content::Text(text) => mount_text(dom, vnode, text, container, anchor),
		Content::Fragment(fragment) => mount_fragment(dom, vnode, fragment, container, ns, anchor),
		Content::Portal(portal) => mount_portal(dom, vnode, portal, container, anchor),
		Content::Stateful(_) => mount_stateful(dom, vnode, container, anchor),
		Content::Functional(_) => mount_functional(dom, vnode, container, anchor),
	}
}

fn attach<D: Dom>(dom: &mut D, container: &D::Node, node: &D::Node, anchor: Option<&D::Node>) -> Result<(), Error> {
	match anchor {
		Some(reference) => dom.insert_before(container, node, Some(reference)),
		None => dom.append_child(container, node),
	}
}

fn mount_element<D: Dom>(dom: &mut D, vnode: &Rc<VNode<D>>, element: &ElementNode<D>, container: &D::Node, ns: Namespace, anchor: Option<&D::Node>) -> Result<(), Error> {
	let span = trace_span!("Mounting element", tag = element.tag.as_str());
	let _enter = span.enter();

	let ns = match (element.namespace, ns) {
		(Namespace::Svg, _) | (_, Namespace::Svg) => Namespace::Svg,
		_ => Namespace::Html,
	};
	let el = dom.create_element(&element.tag, ns)?;
	for (key, value) in element.data.iter() {
		dom.patch_data(&el, key, None, Some(value))?;
	}
	match &element.children {
		ChildList::None => (),
		ChildList::One(child) => mount_at(dom, child, &el, ns, None)?,
		ChildList::Many(children) => {
			if children.is_empty() {
				return Err(Error::EmptyChildList);
			}
			for child in children {
				mount_at(dom, child, &el, ns, None)?;
			}
		}
	}
	vnode.set_host(Some(el.clone()));
	attach(dom, container, &el, anchor)
}

fn mount_text<D: Dom>(dom: &mut D, vnode: &Rc<VNode<D>>, text: &str, container: &D::Node, anchor: Option<&D::Node>) -> Result<(), Error> {
	let node = dom.create_text(text)?;
	vnode.set_host(Some(node.clone()));
	attach(dom, container, &node, anchor)
}

fn mount_fragment<D: Dom>(dom: &mut D, vnode: &Rc<VNode<D>>, fragment: &FragmentNode<D>, container: &D::Node, ns: Namespace, anchor: Option<&D::Node>) -> Result<(), Error> {
	let span = trace_span!("Mounting fragment");
	let _enter = span.enter();

	match &fragment.children {
		ChildList::None => {
			// A childless fragment still occupies one addressable position, so that
			// sibling-relative insertions next to it keep resolving.
			let placeholder = dom.create_text("")?;
			attach(dom, container, &placeholder, anchor)?;
			vnode.set_host(Some(placeholder));
		}
		ChildList::One(child) => {
			mount_at(dom, child, container, ns, anchor)?;
			vnode.set_host(child.host());
		}
		ChildList::Many(children) => {
			if children.is_empty() {
				return Err(Error::EmptyChildList);
			}
			for child in children {
				mount_at(dom, child, container, ns, anchor)?;
			}
			vnode.set_host(children[0].host());
		}
	}
	Ok(())
}

fn mount_portal<D: Dom>(dom: &mut D, vnode: &Rc<VNode<D>>, portal: &PortalNode<D>, container: &D::Node, anchor: Option<&D::Node>) -> Result<(), Error> {
	let span = trace_span!("Mounting portal");
	let _enter = span.enter();

	let target = dom.resolve_target(&portal.target)?;
	match &portal.children {
		ChildList::None => (),
		ChildList::One(child) => mount_at(dom, child, &target, Namespace::Html, None)?,
		ChildList::Many(children) => {
			if children.is_empty() {
				return Err(Error::EmptyChildList);
			}
			for child in children {
				mount_at(dom, child, &target, Namespace::Html, None)?;
			}
		}
	}
	*portal.resolved.borrow_mut() = Some(target);

	// The portal's content lives at the target, but its logical position in
	// `container` must stay addressable.
	let placeholder = dom.create_text("")?;
	attach(dom, container, &placeholder, anchor)?;
	vnode.set_host(Some(placeholder));
	Ok(())
}

fn mount_stateful<D: Dom>(dom: &mut D, vnode: &Rc<VNode<D>>, container: &D::Node, anchor: Option<&D::Node>) -> Result<(), Error> {
	let stateful = match vnode.content() {
		Content::Stateful(stateful) => stateful,
		_ => return Err(Error::MisplacedHandle),
	};
	let span = trace_span!("Mounting stateful component node");
	let _enter = span.enter();

	let component = (stateful.factory)();
	let handle = StatefulHandle::new(component, container.clone(), vnode);
	*stateful.handle.borrow_mut() = Some(handle.clone());
	handle.update_props(&stateful.data);
	handle.update_at(dom, anchor)
}

fn mount_functional<D: Dom>(dom: &mut D, vnode: &Rc<VNode<D>>, container: &D::Node, anchor: Option<&D::Node>) -> Result<(), Error> {
	let functional = match vnode.content() {
		Content::Functional(functional) => functional,
		_ => return Err(Error::MisplacedHandle),
	};
	let span = trace_span!("Mounting functional component node");
	let _enter = span.enter();

	let handle = FunctionalHandle::new(vnode, container.clone());
	*functional.handle.borrow_mut() = Some(handle.clone());
	handle.update_at(dom, anchor)
}
