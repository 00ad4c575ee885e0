#![cfg(target_arch = "wasm32")]

use std::rc::Rc;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use xylem_dom::{browser::BrowserDom, mount, patch, ChildList, VData, VNode};

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn create_and_patch() {
	tracing_wasm::set_as_global_default();

	let document = web_sys::window().unwrap().document().unwrap();
	let body: web_sys::Node = document.body().unwrap().into();
	let mut dom = BrowserDom::new(document);

	let prev = Rc::new(VNode::element(
		"div",
		VData::new(),
		ChildList::One(Rc::new(VNode::text("Hello xylem-dom!"))),
	));
	mount(&mut dom, &prev, &body).unwrap();
	assert_eq!(body.text_content().unwrap_or_default(), "Hello xylem-dom!");

	let next = Rc::new(VNode::element(
		"div",
		VData::new(),
		ChildList::One(Rc::new(VNode::text("Hello again!"))),
	));
	patch(&mut dom, &prev, &next, &body).unwrap();
	assert_eq!(body.text_content().unwrap_or_default(), "Hello again!");
}
