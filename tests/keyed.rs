use std::rc::Rc;
use xylem_dom::{memory::Mutation, mount, patch, ChildList, Dom, MemoryDom, Namespace, StyleMap, VData, VNode, VProp};

type Node = Rc<VNode<MemoryDom>>;

fn item(key: i64, color: Option<&str>) -> Node {
	let mut data = VData::new();
	if let Some(color) = color {
		let mut style = StyleMap::new();
		style.insert("color".to_owned(), color.to_owned());
		data.insert("style".to_owned(), VProp::Style(style));
	}
	Rc::new(
		VNode::element(
			"li",
			data,
			ChildList::One(Rc::new(VNode::text(key.to_string()))),
		)
		.keyed(key),
	)
}

fn list(keys: &[i64]) -> Node {
	Rc::new(VNode::element(
		"ul",
		VData::new(),
		ChildList::Many(keys.iter().map(|key| item(*key, None)).collect()),
	))
}

fn placements(dom: &MemoryDom) -> usize {
	dom.mutations().iter().filter(|mutation| mutation.is_placement()).count()
}

fn creations(dom: &MemoryDom) -> usize {
	dom.mutations().iter().filter(|mutation| mutation.is_creation()).count()
}

fn removals(dom: &MemoryDom) -> usize {
	dom.mutations()
		.iter()
		.filter(|mutation| matches!(mutation, Mutation::RemoveChild { .. }))
		.count()
}

#[test]
fn rotation_costs_a_single_move() {
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body", Namespace::Html).unwrap();

	let prev = list(&[1, 2, 3]);
	mount(&mut dom, &prev, &body).unwrap();
	let ul = prev.host().unwrap();
	assert_eq!(dom.text_content(ul), "123");
	dom.clear_mutations();

	let next = list(&[2, 3, 1]);
	patch(&mut dom, &prev, &next, &body).unwrap();

	assert_eq!(dom.text_content(ul), "231");
	assert_eq!(placements(&dom), 1, "reordering must move, not rebuild: {:?}", dom.mutations());
	assert_eq!(creations(&dom), 0);
	assert_eq!(removals(&dom), 0);
}

#[test]
fn keyed_update_reuses_moves_mounts_and_removes() {
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body", Namespace::Html).unwrap();

	let prev: Node = Rc::new(VNode::element(
		"ul",
		VData::new(),
		ChildList::Many(vec![item(1, Some("red")), item(2, None), item(3, None)]),
	));
	mount(&mut dom, &prev, &body).unwrap();
	let ul = prev.host().unwrap();
	let before = dom.children(ul);
	assert_eq!(dom.text_content(ul), "123");
	dom.clear_mutations();

	let next: Node = Rc::new(VNode::element(
		"ul",
		VData::new(),
		ChildList::Many(vec![item(2, None), item(4, None), item(1, Some("blue"))]),
	));
	patch(&mut dom, &prev, &next, &body).unwrap();

	let after = dom.children(ul);
	assert_eq!(dom.text_content(ul), "241");
	// Nodes 1 and 2 are the original host nodes, patched in place.
	assert_eq!(after[0], before[1]);
	assert_eq!(after[2], before[0]);
	assert_eq!(dom.style(before[0], "color"), Some("blue"));
	// Node 3 is gone, node 4 is the only fresh mount.
	assert!(!after.contains(&before[2]));
	assert_eq!(creations(&dom), 2); // the <li> and its text node
	assert_eq!(removals(&dom), 1);
}

#[test]
fn reorder_round_trips() {
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body", Namespace::Html).unwrap();

	let first = list(&[1, 2, 3]);
	mount(&mut dom, &first, &body).unwrap();
	let ul = first.host().unwrap();
	let original = dom.children(ul);

	let second = list(&[2, 3, 1]);
	patch(&mut dom, &first, &second, &body).unwrap();
	assert_eq!(dom.text_content(ul), "231");

	let third = list(&[1, 2, 3]);
	patch(&mut dom, &second, &third, &body).unwrap();
	assert_eq!(dom.text_content(ul), "123");
	assert_eq!(dom.children(ul), original);
}

#[test]
fn prepend_reuses_the_tail() {
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body", Namespace::Html).unwrap();

	let prev = list(&[2, 3]);
	mount(&mut dom, &prev, &body).unwrap();
	let ul = prev.host().unwrap();
	let before = dom.children(ul);
	dom.clear_mutations();

	let next = list(&[1, 2, 3]);
	patch(&mut dom, &prev, &next, &body).unwrap();

	let after = dom.children(ul);
	assert_eq!(dom.text_content(ul), "123");
	assert_eq!(&after[1..], &before[..]);
	assert_eq!(creations(&dom), 2); // the new <li> and its text node
	assert_eq!(removals(&dom), 0);
}

#[test]
fn unkeyed_children_match_positionally() {
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body", Namespace::Html).unwrap();

	let prev: Node = Rc::new(VNode::element(
		"p",
		VData::new(),
		ChildList::Many(vec![Rc::new(VNode::text("a")), Rc::new(VNode::text("b"))]),
	));
	mount(&mut dom, &prev, &body).unwrap();
	let p = prev.host().unwrap();
	dom.clear_mutations();

	let next: Node = Rc::new(VNode::element(
		"p",
		VData::new(),
		ChildList::Many(vec![Rc::new(VNode::text("c"))]),
	));
	patch(&mut dom, &prev, &next, &body).unwrap();

	assert_eq!(dom.text_content(p), "c");
	assert_eq!(creations(&dom), 0);
	assert_eq!(removals(&dom), 1);
	assert!(dom
		.mutations()
		.iter()
		.any(|mutation| matches!(mutation, Mutation::SetText { text, .. } if text == "c")));
}
