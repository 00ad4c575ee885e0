use crate::{
	dom::Dom,
	error::Error,
	mount::mount_at,
	vdom::{ChildList, Content, ElementNode, FragmentNode, Namespace, PortalNode, VNode},
};
use hashbrown::HashSet;
use std::rc::Rc;
use tracing::{trace, trace_span};

/// Reconciles `next` against `prev`, which must be the mounted virtual node that
/// previously occupied the same logical position in `container`.
///
/// Host mutations are minimized: matching kinds are updated in place, mismatching
/// kinds (or element tags, or component identities) tear the previous host
/// representation down and mount `next` fresh in its place.
pub fn patch<D: Dom>(dom: &mut D, prev: &Rc<VNode<D>>, next: &Rc<VNode<D>>, container: &D::Node) -> Result<(), Error> {
	if prev.kind() != next.kind() {
		return replace(dom, prev, next, container);
	}
	match (prev.content(), next.content()) {
		(Content::Element(p), Content::Element(n)) => patch_element(dom, prev, next, p, n, container),
		(Content::Text(p), Content::Text(n)) => patch_text(dom, prev, next, p, n),
		(Content::Fragment(p), Content::Fragment(n)) => patch_fragment(dom, prev, next, p, n, container),
		(Content::Portal(p), Content::Portal(n)) => patch_portal(dom, prev, next, p, n),
		(Content::Stateful(..), Content::Stateful(..)) | (Content::Functional(..), Content::Functional(..)) => {
			patch_component(dom, prev, next, container)
		}
		_ => replace(dom, prev, next, container),
	}
}

/// Tears down `prev`'s host representation (running teardown hooks) and mounts
/// `next` fresh at the same sibling position.
fn replace<D: Dom>(dom: &mut D, prev: &Rc<VNode<D>>, next: &Rc<VNode<D>>, container: &D::Node) -> Result<(), Error> {
	let span = trace_span!("Replacing mismatched node");
	let _enter = span.enter();

	let anchor = host_after(dom, prev);
	remove(dom, prev, container)?;
	mount_at(dom, next, container, Namespace::Html, anchor.as_ref())
}

fn patch_element<D: Dom>(
	dom: &mut D,
	prev: &Rc<VNode<D>>,
	next: &Rc<VNode<D>>,
	p: &ElementNode<D>,
	n: &ElementNode<D>,
	container: &D::Node,
) -> Result<(), Error> {
	if p.tag != n.tag {
		return replace(dom, prev, next, container);
	}
	let span = trace_span!("Patching element", tag = n.tag.as_str());
	let _enter = span.enter();

	let el = prev.host().ok_or(Error::NotMounted)?;
	next.set_host(Some(el.clone()));

	for (key, value) in n.data.iter() {
		dom.patch_data(&el, key, p.data.get(key), Some(value))?;
	}
	for (key, value) in p.data.iter() {
		if !n.data.contains_key(key) {
			dom.patch_data(&el, key, Some(value), None)?;
		}
	}

	patch_children(dom, &p.children, &n.children, &el)
}

fn patch_text<D: Dom>(dom: &mut D, prev: &Rc<VNode<D>>, next: &Rc<VNode<D>>, p: &str, n: &str) -> Result<(), Error> {
	let node = prev.host().ok_or(Error::NotMounted)?;
	next.set_host(Some(node.clone()));
	if p != n {
		dom.set_text(&node, n)?;
	}
	Ok(())
}

fn patch_fragment<D: Dom>(
	dom: &mut D,
	prev: &Rc<VNode<D>>,
	next: &Rc<VNode<D>>,
	p: &FragmentNode<D>,
	n: &FragmentNode<D>,
	container: &D::Node,
) -> Result<(), Error> {
	let span = trace_span!("Patching fragment");
	let _enter = span.enter();

	match (&p.children, &n.children) {
		(ChildList::None, ChildList::None) => {
			next.set_host(prev.host());
			Ok(())
		}
		(ChildList::None, _) => {
			// The fragment gains children: they go where the placeholder stood, then
			// the placeholder retires.
			let placeholder = prev.host().ok_or(Error::NotMounted)?;
			mount_list(dom, &n.children, container, Some(&placeholder))?;
			dom.remove_child(container, &placeholder)?;
			next.set_host(adopted_host(&n.children)?);
			Ok(())
		}
		(_, ChildList::None) => {
			// The fragment empties: a placeholder takes over its position before the
			// children go away.
			let first = first_list_host(&p.children).ok_or(Error::NotMounted)?;
			let placeholder = dom.create_text("")?;
			dom.insert_before(container, &placeholder, Some(&first))?;
			remove_list(dom, &p.children, container)?;
			next.set_host(Some(placeholder));
			Ok(())
		}
		_ => {
			patch_children(dom, &p.children, &n.children, container)?;
			next.set_host(adopted_host(&n.children)?);
			Ok(())
		}
	}
}

fn mount_list<D: Dom>(dom: &mut D, children: &ChildList<D>, container: &D::Node, anchor: Option<&D::Node>) -> Result<(), Error> {
	match children {
		ChildList::None => Ok(()),
		ChildList::One(child) => mount_at(dom, child, container, Namespace::Html, anchor),
		ChildList::Many(children) => {
			if children.is_empty() {
				return Err(Error::EmptyChildList);
			}
			for child in children {
				mount_at(dom, child, container, Namespace::Html, anchor)?;
			}
			Ok(())
		}
	}
}

fn remove_list<D: Dom>(dom: &mut D, children: &ChildList<D>, container: &D::Node) -> Result<(), Error> {
	match children {
		ChildList::None => Ok(()),
		ChildList::One(child) => remove(dom, child, container),
		ChildList::Many(children) => {
			for child in children {
				remove(dom, child, container)?;
			}
			Ok(())
		}
	}
}

/// The fragment adoption rule: a single child's host, or the first of many.
fn adopted_host<D: Dom>(children: &ChildList<D>) -> Result<Option<D::Node>, Error> {
	match children {
		ChildList::None => Ok(None),
		ChildList::One(child) => Ok(child.host()),
		ChildList::Many(children) => children.first().map(|child| child.host()).ok_or(Error::EmptyChildList),
	}
}

fn first_list_host<D: Dom>(children: &ChildList<D>) -> Option<D::Node> {
	match children {
		ChildList::None => None,
		ChildList::One(child) => child.host(),
		ChildList::Many(children) => children.first().and_then(|child| child.host()),
	}
}

fn patch_portal<D: Dom>(
	dom: &mut D,
	prev: &Rc<VNode<D>>,
	next: &Rc<VNode<D>>,
	p: &PortalNode<D>,
	n: &PortalNode<D>,
) -> Result<(), Error> {
	let span = trace_span!("Patching portal");
	let _enter = span.enter();

	// Children reconcile where they physically are: the previously resolved target.
	let prev_target = p.resolved.borrow().clone().ok_or(Error::NotMounted)?;
	patch_children(dom, &p.children, &n.children, &prev_target)?;
	next.set_host(prev.host());

	if n.target == p.target {
		*n.resolved.borrow_mut() = Some(prev_target);
	} else {
		let new_target = dom.resolve_target(&n.target)?;
		trace!("Portal target changed; relocating content.");
		match &n.children {
			ChildList::None => (),
			ChildList::One(child) => relocate(dom, child, &new_target)?,
			ChildList::Many(children) => {
				for child in children {
					relocate(dom, child, &new_target)?;
				}
			}
		}
		*n.resolved.borrow_mut() = Some(new_target);
	}
	Ok(())
}

/// Moves a mounted subtree's host roots into `target`, in order, without remounting.
fn relocate<D: Dom>(dom: &mut D, vnode: &Rc<VNode<D>>, target: &D::Node) -> Result<(), Error> {
	match vnode.content() {
		Content::Element(_) | Content::Text(_) | Content::Portal(_) => {
			let node = vnode.host().ok_or(Error::NotMounted)?;
			dom.append_child(target, &node)
		}
		Content::Fragment(fragment) => match &fragment.children {
			ChildList::None => {
				let placeholder = vnode.host().ok_or(Error::NotMounted)?;
				dom.append_child(target, &placeholder)
			}
			ChildList::One(child) => relocate(dom, child, target),
			ChildList::Many(children) => {
				for child in children {
					relocate(dom, child, target)?;
				}
				Ok(())
			}
		},
		Content::Stateful(_) => {
			let rendered = vnode
				.stateful_handle()
				.and_then(|handle| handle.rendered())
				.ok_or(Error::NotMounted)?;
			relocate(dom, &rendered, target)
		}
		Content::Functional(_) => {
			let produced = vnode.produced().ok_or(Error::NotMounted)?;
			relocate(dom, &produced, target)
		}
	}
}

fn patch_component<D: Dom>(dom: &mut D, prev: &Rc<VNode<D>>, next: &Rc<VNode<D>>, container: &D::Node) -> Result<(), Error> {
	match (prev.content(), next.content()) {
		(Content::Stateful(p), Content::Stateful(n)) => {
			if !Rc::ptr_eq(&p.factory, &n.factory) {
				return replace(dom, prev, next, container);
			}
			let span = trace_span!("Patching stateful component node");
			let _enter = span.enter();

			// Transfer the live instance to the node that owns the position now.
			let handle = p.handle.borrow_mut().take().ok_or(Error::NotMounted)?;
			handle.update_props(&n.data);
			handle.adopt(next, container);
			*n.handle.borrow_mut() = Some(handle.clone());
			handle.update(dom)
		}
		(Content::Functional(p), Content::Functional(n)) => {
			if !Rc::ptr_eq(&p.render, &n.render) {
				return replace(dom, prev, next, container);
			}
			let span = trace_span!("Patching functional component node");
			let _enter = span.enter();

			let handle = p.handle.borrow_mut().take().ok_or(Error::NotMounted)?;
			handle.retarget(prev.clone(), next, container);
			*n.handle.borrow_mut() = Some(handle.clone());
			handle.update(dom)
		}
		_ => replace(dom, prev, next, container),
	}
}

/// Reconciles two child lists of one parent. All nine cardinality transitions are
/// handled here; only this routine decides sibling order and presence.
fn patch_children<D: Dom>(dom: &mut D, prev: &ChildList<D>, next: &ChildList<D>, container: &D::Node) -> Result<(), Error> {
	match (prev, next) {
		(ChildList::None, ChildList::None) => Ok(()),
		(ChildList::None, ChildList::One(n)) => mount_at(dom, n, container, Namespace::Html, None),
		(ChildList::None, ChildList::Many(ns)) => {
			if ns.is_empty() {
				return Err(Error::EmptyChildList);
			}
			for n in ns {
				mount_at(dom, n, container, Namespace::Html, None)?;
			}
			Ok(())
		}
		(ChildList::One(p), ChildList::None) => remove(dom, p, container),
		(ChildList::One(p), ChildList::One(n)) => patch(dom, p, n, container),
		(ChildList::One(p), ChildList::Many(ns)) => {
			if ns.is_empty() {
				return Err(Error::EmptyChildList);
			}
			let anchor = host_after(dom, p);
			remove(dom, p, container)?;
			for n in ns {
				mount_at(dom, n, container, Namespace::Html, anchor.as_ref())?;
			}
			Ok(())
		}
		(ChildList::Many(ps), ChildList::None) => {
			for p in ps {
				remove(dom, p, container)?;
			}
			Ok(())
		}
		(ChildList::Many(ps), ChildList::One(n)) => {
			let anchor = ps.last().and_then(|p| host_after(dom, p));
			for p in ps {
				remove(dom, p, container)?;
			}
			mount_at(dom, n, container, Namespace::Html, anchor.as_ref())
		}
		(ChildList::Many(ps), ChildList::Many(ns)) => {
			if ps.is_empty() || ns.is_empty() {
				return Err(Error::EmptyChildList);
			}
			diff_keyed_children(dom, ps, ns, container)
		}
	}
}

/// Double-ended keyed reconciliation of two non-empty child sequences.
///
/// The four end comparisons give O(1) amortized handling of append, prepend and
/// stable-order updates; only the fallback scans, and its cost is bounded by the
/// number of genuinely relocated or new items. Consumed old slots are tracked in a
/// parallel boolean sequence rather than by mutating the caller's list.
#[allow(clippy::too_many_lines)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
fn diff_keyed_children<D: Dom>(dom: &mut D, old: &[Rc<VNode<D>>], new: &[Rc<VNode<D>>], container: &D::Node) -> Result<(), Error> {
	let span = trace_span!("Diffing keyed children", old_len = old.len(), new_len = new.len());
	let _enter = span.enter();

	debug_assert_eq!(
		new.iter().filter(|n| n.key().is_some()).count(),
		new.iter().filter_map(|n| n.key()).collect::<HashSet<_>>().len(),
		"Duplicate sibling key encountered"
	);

	let mut consumed = vec![false; old.len()];
	let mut old_start: isize = 0;
	let mut old_end: isize = old.len() as isize - 1;
	let mut new_start: isize = 0;
	let mut new_end: isize = new.len() as isize - 1;

	while old_start <= old_end && new_start <= new_end {
		if consumed[old_start as usize] {
			// This slot's host node was already moved by the fallback below.
			old_start += 1;
			continue;
		}
		if consumed[old_end as usize] {
			old_end -= 1;
			continue;
		}
		let o_start = &old[old_start as usize];
		let o_end = &old[old_end as usize];
		let n_start = &new[new_start as usize];
		let n_end = &new[new_end as usize];

		if o_start.key() == n_start.key() {
			patch(dom, o_start, n_start, container)?;
			old_start += 1;
			new_start += 1;
		} else if o_end.key() == n_end.key() {
			patch(dom, o_end, n_end, container)?;
			old_end -= 1;
			new_end -= 1;
		} else if o_start.key() == n_end.key() {
			// The old head became the new tail: move it to just after the old tail.
			patch(dom, o_start, n_end, container)?;
			let moved = n_end.host().ok_or(Error::NotMounted)?;
			let reference = o_end.host().and_then(|node| dom.next_sibling(&node));
			dom.insert_before(container, &moved, reference.as_ref())?;
			old_start += 1;
			new_end -= 1;
		} else if o_end.key() == n_start.key() {
			// The old tail became the new head: move it to just before the old head.
			patch(dom, o_end, n_start, container)?;
			let moved = n_start.host().ok_or(Error::NotMounted)?;
			let reference = o_start.host();
			dom.insert_before(container, &moved, reference.as_ref())?;
			old_end -= 1;
			new_start += 1;
		} else {
			let anchor = o_start.host();
			let found = (old_start..=old_end).find(|&i| !consumed[i as usize] && old[i as usize].key() == n_start.key());
			match found {
				Some(i) => {
					patch(dom, &old[i as usize], n_start, container)?;
					let moved = n_start.host().ok_or(Error::NotMounted)?;
					dom.insert_before(container, &moved, anchor.as_ref())?;
					consumed[i as usize] = true;
				}
				None => {
					mount_at(dom, n_start, container, Namespace::Html, anchor.as_ref())?;
				}
			}
			new_start += 1;
		}
	}

	if old_start > old_end {
		// Pure insertions: everything left in the new range goes before the node the
		// old-start pointer came to rest on, or at the end if none survives there.
		let anchor = (old_start..old.len() as isize)
			.find(|&i| !consumed[i as usize])
			.and_then(|i| old[i as usize].host());
		for i in new_start..=new_end {
			mount_at(dom, &new[i as usize], container, Namespace::Html, anchor.as_ref())?;
		}
	} else if new_start > new_end {
		// Pure deletions.
		for i in old_start..=old_end {
			if !consumed[i as usize] {
				remove(dom, &old[i as usize], container)?;
			}
		}
	}
	Ok(())
}

/// Detaches a mounted virtual node's host representation from `container` and runs
/// the teardown pass over it.
pub(crate) fn remove<D: Dom>(dom: &mut D, vnode: &Rc<VNode<D>>, container: &D::Node) -> Result<(), Error> {
	detach(dom, vnode, container)?;
	teardown(vnode);
	Ok(())
}

fn detach<D: Dom>(dom: &mut D, vnode: &Rc<VNode<D>>, container: &D::Node) -> Result<(), Error> {
	match vnode.content() {
		Content::Element(_) | Content::Text(_) => {
			let node = vnode.host().ok_or(Error::NotMounted)?;
			dom.remove_child(container, &node)
		}
		Content::Fragment(fragment) => match &fragment.children {
			ChildList::None => {
				let placeholder = vnode.host().ok_or(Error::NotMounted)?;
				dom.remove_child(container, &placeholder)
			}
			ChildList::One(child) => detach(dom, child, container),
			ChildList::Many(children) => {
				for child in children {
					detach(dom, child, container)?;
				}
				Ok(())
			}
		},
		Content::Portal(portal) => {
			let target = portal.resolved.borrow().clone().ok_or(Error::NotMounted)?;
			match &portal.children {
				ChildList::None => (),
				ChildList::One(child) => detach(dom, child, &target)?,
				ChildList::Many(children) => {
					for child in children {
						detach(dom, child, &target)?;
					}
				}
			}
			let placeholder = vnode.host().ok_or(Error::NotMounted)?;
			dom.remove_child(container, &placeholder)
		}
		Content::Stateful(_) => {
			let rendered = vnode
				.stateful_handle()
				.and_then(|handle| handle.rendered())
				.ok_or(Error::NotMounted)?;
			detach(dom, &rendered, container)
		}
		Content::Functional(_) => {
			let produced = vnode.produced().ok_or(Error::NotMounted)?;
			detach(dom, &produced, container)
		}
	}
}

/// Fires `unmounted` for every stateful instance in the subtree, each at most once,
/// regardless of which removal path got here. No host-tree operations.
pub(crate) fn teardown<D: Dom>(vnode: &Rc<VNode<D>>) {
	match vnode.content() {
		Content::Text(_) => (),
		Content::Element(element) => teardown_list(&element.children),
		Content::Fragment(fragment) => teardown_list(&fragment.children),
		Content::Portal(portal) => teardown_list(&portal.children),
		Content::Stateful(_) => {
			if let Some(handle) = vnode.stateful_handle() {
				if handle.teardown() {
					trace!("Component instance torn down.");
				}
				if let Some(rendered) = handle.rendered() {
					teardown(&rendered);
				}
			}
		}
		Content::Functional(_) => {
			if let Some(produced) = vnode.produced() {
				teardown(&produced);
			}
		}
	}
}

fn teardown_list<D: Dom>(children: &ChildList<D>) {
	match children {
		ChildList::None => (),
		ChildList::One(child) => teardown(child),
		ChildList::Many(children) => {
			for child in children {
				teardown(child);
			}
		}
	}
}

/// The last host node a mounted virtual node contributes to its container.
fn last_host<D: Dom>(vnode: &Rc<VNode<D>>) -> Option<D::Node> {
	match vnode.content() {
		Content::Element(_) | Content::Text(_) | Content::Portal(_) => vnode.host(),
		Content::Fragment(fragment) => match &fragment.children {
			ChildList::None => vnode.host(),
			ChildList::One(child) => last_host(child),
			ChildList::Many(children) => children.last().and_then(last_host),
		},
		Content::Stateful(_) => vnode
			.stateful_handle()
			.and_then(|handle| handle.rendered())
			.and_then(|rendered| last_host(&rendered)),
		Content::Functional(_) => vnode.produced().and_then(|produced| last_host(&produced)),
	}
}

/// The host node immediately after a mounted virtual node's footprint, if any.
fn host_after<D: Dom>(dom: &D, vnode: &Rc<VNode<D>>) -> Option<D::Node> {
	last_host(vnode).and_then(|node| dom.next_sibling(&node))
}
