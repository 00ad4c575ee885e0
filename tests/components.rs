use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};
use xylem_dom::{
	mount, patch, ChildList, Component, ComponentFactory, Dom, MemoryDom, Namespace, RenderFn, StyleMap, VData, VNode,
	VProp,
};

type Node = Rc<VNode<MemoryDom>>;
type Log = Rc<RefCell<Vec<String>>>;

struct Swatch {
	color: &'static str,
	log: Log,
}

impl Component<MemoryDom> for Swatch {
	fn render(&mut self) -> Node {
		let mut style = StyleMap::new();
		style.insert("background".to_owned(), self.color.to_owned());
		let mut data = VData::new();
		data.insert("style".to_owned(), VProp::Style(style));
		Rc::new(VNode::element(
			"div",
			data,
			ChildList::One(Rc::new(VNode::text(self.color))),
		))
	}

	fn mounted(&mut self) {
		self.log.borrow_mut().push(format!("mounted {}", self.color));
	}

	fn unmounted(&mut self) {
		self.log.borrow_mut().push(format!("unmounted {}", self.color));
	}
}

struct Switcher {
	first: Rc<Cell<bool>>,
	red: ComponentFactory<MemoryDom>,
	blue: ComponentFactory<MemoryDom>,
}

impl Component<MemoryDom> for Switcher {
	fn render(&mut self) -> Node {
		let factory = if self.first.get() { self.red.clone() } else { self.blue.clone() };
		Rc::new(VNode::stateful(factory, VData::new()))
	}
}

fn swatch_factory(color: &'static str, log: &Log) -> ComponentFactory<MemoryDom> {
	let log = log.clone();
	Rc::new(move || {
		Box::new(Swatch {
			color,
			log: log.clone(),
		}) as Box<dyn Component<MemoryDom>>
	})
}

#[test]
fn component_swap_tears_down_exactly_once() {
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body", Namespace::Html).unwrap();
	let log: Log = Rc::new(RefCell::new(Vec::new()));
	let first = Rc::new(Cell::new(true));

	let switcher: ComponentFactory<MemoryDom> = Rc::new({
		let first = first.clone();
		let red = swatch_factory("red", &log);
		let blue = swatch_factory("blue", &log);
		move || {
			Box::new(Switcher {
				first: first.clone(),
				red: red.clone(),
				blue: blue.clone(),
			}) as Box<dyn Component<MemoryDom>>
		}
	});

	let vnode: Node = Rc::new(VNode::stateful(switcher, VData::new()));
	mount(&mut dom, &vnode, &body).unwrap();

	let red_el = dom.children(body)[0];
	assert_eq!(dom.style(red_el, "background"), Some("red"));
	assert_eq!(*log.borrow(), vec!["mounted red".to_owned()]);

	// External trigger: flip the state, then drive the component's own update.
	first.set(false);
	let handle = vnode.stateful_handle().unwrap();
	handle.update(&mut dom).unwrap();

	assert_eq!(
		*log.borrow(),
		vec!["mounted red".to_owned(), "unmounted red".to_owned(), "mounted blue".to_owned()]
	);

	let children = dom.children(body);
	assert_eq!(children.len(), 1);
	let blue_el = children[0];
	assert_ne!(blue_el, red_el);
	assert_eq!(dom.style(blue_el, "background"), Some("blue"));
	// The switcher's remembered root host follows the swap.
	assert_eq!(vnode.host(), Some(blue_el));
}

struct Greeter {
	label: String,
}

impl Component<MemoryDom> for Greeter {
	fn update_props(&mut self, props: &Rc<VData>) {
		if let Some(VProp::Text(label)) = props.get("label") {
			self.label = label.clone();
		}
	}

	fn render(&mut self) -> Node {
		Rc::new(VNode::element(
			"p",
			VData::new(),
			ChildList::One(Rc::new(VNode::text(self.label.clone()))),
		))
	}
}

fn label(text: &str) -> VData {
	let mut data = VData::new();
	data.insert("label".to_owned(), VProp::Text(text.to_owned()));
	data
}

#[test]
fn stateful_props_update_reconciles_in_place() {
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body", Namespace::Html).unwrap();

	let factory: ComponentFactory<MemoryDom> = Rc::new(|| {
		Box::new(Greeter {
			label: String::new(),
		}) as Box<dyn Component<MemoryDom>>
	});

	let prev: Node = Rc::new(VNode::stateful(factory.clone(), label("hi")));
	mount(&mut dom, &prev, &body).unwrap();
	let p = dom.children(body)[0];
	assert_eq!(dom.text_content(p), "hi");
	dom.clear_mutations();

	let next: Node = Rc::new(VNode::stateful(factory, label("yo")));
	patch(&mut dom, &prev, &next, &body).unwrap();

	assert_eq!(dom.children(body), vec![p]);
	assert_eq!(dom.text_content(p), "yo");
	// The live instance moved over to the next virtual node.
	assert!(prev.stateful_handle().is_none());
	assert!(next.stateful_handle().is_some());
	assert_eq!(next.host(), Some(p));
}

#[test]
fn functional_component_reuses_its_handle() {
	let mut dom = MemoryDom::new();
	let body = dom.create_element("body", Namespace::Html).unwrap();

	let render: RenderFn<MemoryDom> = Rc::new(|data: &VData| {
		let text = match data.get("label") {
			Some(VProp::Text(label)) => label.clone(),
			_ => String::new(),
		};
		Rc::new(VNode::element(
			"span",
			VData::new(),
			ChildList::One(Rc::new(VNode::text(text))),
		))
	});

	let prev: Node = Rc::new(VNode::functional(render.clone(), label("one")));
	mount(&mut dom, &prev, &body).unwrap();
	let span = dom.children(body)[0];
	assert_eq!(dom.text_content(span), "one");
	let handle = prev.functional_handle().unwrap();

	let next: Node = Rc::new(VNode::functional(render, label("two")));
	patch(&mut dom, &prev, &next, &body).unwrap();

	assert_eq!(dom.children(body), vec![span]);
	assert_eq!(dom.text_content(span), "two");
	assert!(prev.functional_handle().is_none());
	assert!(Rc::ptr_eq(&handle, &next.functional_handle().unwrap()));
	assert_eq!(next.host(), Some(span));
}
