use std::rc::Rc;
use xylem_dom::{mount, patch, ChildList, Dom, Error, MemoryDom, Namespace, PortalTarget, VData, VNode};

type Node = Rc<VNode<MemoryDom>>;

fn paragraph(text: &str) -> Node {
	Rc::new(VNode::element(
		"p",
		VData::new(),
		ChildList::One(Rc::new(VNode::text(text))),
	))
}

#[test]
fn empty_fragment_occupies_one_position() {
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body", Namespace::Html).unwrap();

	let before: Node = Rc::new(VNode::element("header", VData::new(), ChildList::None));
	let fragment: Node = Rc::new(VNode::fragment(ChildList::None));
	let after: Node = Rc::new(VNode::element("footer", VData::new(), ChildList::None));
	mount(&mut dom, &before, &body).unwrap();
	mount(&mut dom, &fragment, &body).unwrap();
	mount(&mut dom, &after, &body).unwrap();

	let children = dom.children(body);
	assert_eq!(children.len(), 3);
	assert_eq!(dom.text(children[1]), Some(""));
	assert_eq!(fragment.host(), Some(children[1]));
}

#[test]
fn fragment_children_come_and_go_in_place() {
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body", Namespace::Html).unwrap();

	let before: Node = Rc::new(VNode::element("header", VData::new(), ChildList::None));
	let empty: Node = Rc::new(VNode::fragment(ChildList::None));
	let after: Node = Rc::new(VNode::element("footer", VData::new(), ChildList::None));
	mount(&mut dom, &before, &body).unwrap();
	mount(&mut dom, &empty, &body).unwrap();
	mount(&mut dom, &after, &body).unwrap();

	// Gaining children: they take the placeholder's position between the siblings.
	let filled: Node = Rc::new(VNode::fragment(ChildList::Many(vec![
		paragraph("a"),
		paragraph("b"),
	])));
	patch(&mut dom, &empty, &filled, &body).unwrap();

	let children = dom.children(body);
	assert_eq!(children.len(), 4);
	assert_eq!(dom.tag(children[0]), Some("header"));
	assert_eq!(dom.tag(children[1]), Some("p"));
	assert_eq!(dom.tag(children[2]), Some("p"));
	assert_eq!(dom.tag(children[3]), Some("footer"));
	assert_eq!(dom.text_content(body), "ab");
	// The fragment adopts its first child as its own host anchor.
	assert_eq!(filled.host(), Some(children[1]));

	// Emptying again: a placeholder takes the position back.
	let drained: Node = Rc::new(VNode::fragment(ChildList::None));
	patch(&mut dom, &filled, &drained, &body).unwrap();

	let children = dom.children(body);
	assert_eq!(children.len(), 3);
	assert_eq!(dom.text(children[1]), Some(""));
	assert_eq!(drained.host(), Some(children[1]));
	assert_eq!(dom.text_content(body), "");
}

#[test]
fn single_child_fragment_adopts_its_child() {
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body", Namespace::Html).unwrap();

	let fragment: Node = Rc::new(VNode::fragment(ChildList::One(paragraph("only"))));
	mount(&mut dom, &fragment, &body).unwrap();

	let children = dom.children(body);
	assert_eq!(children.len(), 1);
	assert_eq!(fragment.host(), Some(children[0]));
}

#[test]
fn portal_mounts_children_at_the_target() {
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body", Namespace::Html).unwrap();
	let overlay = dom.create_element("aside", Namespace::Html).unwrap();
	dom.register_target("#overlay", overlay);

	let portal: Node = Rc::new(VNode::portal(
		PortalTarget::Selector("#overlay".to_owned()),
		ChildList::Many(vec![paragraph("a"), paragraph("b")]),
	));
	mount(&mut dom, &portal, &body).unwrap();

	// Content lives at the target; the declared position holds a placeholder.
	assert_eq!(dom.children(overlay).len(), 2);
	assert_eq!(dom.text_content(overlay), "ab");
	let children = dom.children(body);
	assert_eq!(children.len(), 1);
	assert_eq!(dom.text(children[0]), Some(""));
	assert_eq!(portal.host(), Some(children[0]));
}

#[test]
fn portal_target_change_relocates_without_remounting() {
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body", Namespace::Html).unwrap();
	let first = dom.create_element("aside", Namespace::Html).unwrap();
	let second = dom.create_element("aside", Namespace::Html).unwrap();
	dom.register_target("#first", first);
	dom.register_target("#second", second);

	let prev: Node = Rc::new(VNode::portal(
		PortalTarget::Selector("#first".to_owned()),
		ChildList::Many(vec![paragraph("a"), paragraph("b")]),
	));
	mount(&mut dom, &prev, &body).unwrap();
	let moved = dom.children(first);
	dom.clear_mutations();

	let next: Node = Rc::new(VNode::portal(
		PortalTarget::Selector("#second".to_owned()),
		ChildList::Many(vec![paragraph("a"), paragraph("b")]),
	));
	patch(&mut dom, &prev, &next, &body).unwrap();

	assert!(dom.children(first).is_empty());
	assert_eq!(dom.children(second), moved);
	assert_eq!(next.host(), prev.host());
	let creations = dom.mutations().iter().filter(|mutation| mutation.is_creation()).count();
	assert_eq!(creations, 0, "relocation must move, not remount: {:?}", dom.mutations());
}

#[test]
fn unresolvable_portal_target_is_fatal() {
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body", Namespace::Html).unwrap();

	let portal: Node = Rc::new(VNode::portal(
		PortalTarget::Selector("#missing".to_owned()),
		ChildList::One(paragraph("lost")),
	));
	match mount(&mut dom, &portal, &body) {
		Err(Error::UnresolvedPortalTarget { target }) => assert_eq!(target, "#missing"),
		other => panic!("expected an unresolved-target error, got {:?}", other),
	}
}

#[test]
fn portal_accepts_a_direct_target_node() {
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body", Namespace::Html).unwrap();
	let overlay = dom.create_element("aside", Namespace::Html).unwrap();

	let portal: Node = Rc::new(VNode::portal(PortalTarget::Node(overlay), ChildList::One(paragraph("hi"))));
	mount(&mut dom, &portal, &body).unwrap();

	assert_eq!(dom.text_content(overlay), "hi");
}
