use crate::{
	dom::{categorize, DataCategory, Dom},
	error::Error,
	vdom::{EventHandler, Namespace, PortalTarget, VProp},
};
use hashbrown::{hash_map::Entry, HashMap};
use tracing::error;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Host driver over a live [***Document***](https://developer.mozilla.org/en-US/docs/Web/API/Document).
///
/// Event listeners are reference-counted per `BrowserDom` instance: each distinct
/// [`EventHandler`] is wrapped in one [`Closure`] for as long as at least one element
/// still binds it. Dropping the `BrowserDom` while listeners are still attached will
/// make them start throwing into JavaScript.
pub struct BrowserDom {
	document: web_sys::Document,
	listeners: ClosureCache,
}

impl BrowserDom {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			listeners: ClosureCache(HashMap::new()),
		}
	}

	/// Convenience constructor for the current window's document.
	#[must_use]
	pub fn for_window() -> Option<Self> {
		web_sys::window().and_then(|window| window.document()).map(Self::new)
	}
}

struct ClosureCache(HashMap<usize, (usize, Closure<dyn Fn(web_sys::Event)>)>);

impl ClosureCache {
	fn acquire(&mut self, handler: &EventHandler) -> js_sys::Function {
		match self.0.entry(handler.identity()) {
			Entry::Occupied(occupied) => {
				let (count, closure) = occupied.into_mut();
				*count += 1;
				closure.as_ref().unchecked_ref::<js_sys::Function>().clone()
			}
			Entry::Vacant(vacant) => {
				let handler = handler.clone();
				let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| handler.call()) as Box<dyn Fn(web_sys::Event)>);
				let (_, closure) = vacant.insert((1, closure));
				closure.as_ref().unchecked_ref::<js_sys::Function>().clone()
			}
		}
	}

	fn release(&mut self, handler: &EventHandler) -> Option<js_sys::Function> {
		let identity = handler.identity();
		let (function, unused) = match self.0.get_mut(&identity) {
			Some((count, closure)) => {
				*count -= 1;
				(closure.as_ref().unchecked_ref::<js_sys::Function>().clone(), *count == 0)
			}
			None => {
				error!("Tried to release an event listener that was never acquired.");
				return None;
			}
		};
		if unused {
			self.0.remove(&identity);
		}
		Some(function)
	}
}

fn structure(message: &str, error: &JsValue) -> Error {
	Error::Structure {
		message: format!("{}: {:?}", message, error),
	}
}

fn rejected(key: &str, message: String) -> Error {
	Error::RejectedData {
		key: key.to_owned(),
		message,
	}
}

fn style_of(node: &web_sys::Node) -> Result<web_sys::CssStyleDeclaration, Error> {
	if let Some(element) = node.dyn_ref::<web_sys::HtmlElement>() {
		Ok(element.style())
	} else if let Some(element) = node.dyn_ref::<web_sys::SvgElement>() {
		Ok(element.style())
	} else {
		Err(rejected("style", format!("{:?} has no style declaration", node)))
	}
}

fn element_of(node: &web_sys::Node, key: &str) -> Result<web_sys::Element, Error> {
	node.dyn_ref::<web_sys::Element>()
		.cloned()
		.ok_or_else(|| rejected(key, format!("{:?} is not an element", node)))
}

impl Dom for BrowserDom {
	type Node = web_sys::Node;

	fn create_element(&mut self, tag: &str, namespace: Namespace) -> Result<web_sys::Node, Error> {
		let element = match namespace {
			Namespace::Html => self.document.create_element(tag),
			Namespace::Svg => self.document.create_element_ns(Some(SVG_NAMESPACE), tag),
		}
		.map_err(|error| Error::CreateElement {
			tag: tag.to_owned(),
			message: format!("{:?}", error),
		})?;
		Ok(element.into())
	}

	fn create_text(&mut self, text: &str) -> Result<web_sys::Node, Error> {
		Ok(self.document.create_text_node(text).into())
	}

	fn set_text(&mut self, node: &web_sys::Node, text: &str) -> Result<(), Error> {
		match node.dyn_ref::<web_sys::CharacterData>() {
			Some(data) => {
				data.set_data(text);
				Ok(())
			}
			None => Err(Error::Structure {
				message: format!("{:?} is not a text node", node),
			}),
		}
	}

	fn patch_data(&mut self, node: &web_sys::Node, key: &str, prev: Option<&VProp>, next: Option<&VProp>) -> Result<(), Error> {
		match categorize(key) {
			DataCategory::Style => {
				let style = style_of(node)?;
				if let Some(VProp::Style(next)) = next {
					for (name, value) in next {
						style
							.set_property(name, value)
							.map_err(|error| rejected(key, format!("could not set {:?}: {:?}", name, error)))?;
					}
				}
				if let Some(VProp::Style(prev)) = prev {
					let keep = match next {
						Some(VProp::Style(next)) => Some(next),
						_ => None,
					};
					for name in prev.keys() {
						if keep.map_or(true, |next| !next.contains_key(name)) {
							style
								.remove_property(name)
								.map_err(|error| rejected(key, format!("could not clear {:?}: {:?}", name, error)))?;
						}
					}
				}
				Ok(())
			}
			DataCategory::Class => {
				let element = element_of(node, key)?;
				match next {
					Some(VProp::Text(class)) => element.set_class_name(class),
					None => element.set_class_name(""),
					Some(_) => return Err(rejected(key, "expected a class string".to_owned())),
				}
				Ok(())
			}
			DataCategory::Event(event) => {
				let prev = match prev {
					Some(VProp::Listener(handler)) => Some(handler),
					_ => None,
				};
				let next = match next {
					None => None,
					Some(VProp::Listener(handler)) => Some(handler),
					Some(_) => return Err(rejected(key, "expected an event listener".to_owned())),
				};
				if prev == next {
					return Ok(());
				}
				if let Some(handler) = prev {
					if let Some(function) = self.listeners.release(handler) {
						node.remove_event_listener_with_callback(event, &function)
							.map_err(|error| rejected(key, format!("could not remove listener: {:?}", error)))?;
					}
				}
				if let Some(handler) = next {
					let function = self.listeners.acquire(handler);
					node.add_event_listener_with_callback(event, &function)
						.map_err(|error| rejected(key, format!("could not add listener: {:?}", error)))?;
				}
				Ok(())
			}
			DataCategory::Property => {
				let value = match next {
					Some(VProp::Text(text)) => JsValue::from_str(text),
					Some(VProp::Flag(flag)) => JsValue::from_bool(*flag),
					None => JsValue::NULL,
					Some(_) => return Err(rejected(key, "expected a property value".to_owned())),
				};
				js_sys::Reflect::set(node.as_ref(), &JsValue::from_str(key), &value)
					.map_err(|error| rejected(key, format!("could not set property: {:?}", error)))?;
				Ok(())
			}
			DataCategory::Attribute => {
				let element = element_of(node, key)?;
				match next {
					Some(VProp::Text(value)) => element
						.set_attribute(key, value)
						.map_err(|error| rejected(key, format!("{:?}", error))),
					None => element
						.remove_attribute(key)
						.map_err(|error| rejected(key, format!("{:?}", error))),
					Some(_) => Err(rejected(key, "expected an attribute string".to_owned())),
				}
			}
		}
	}

	fn insert_before(&mut self, parent: &web_sys::Node, node: &web_sys::Node, reference: Option<&web_sys::Node>) -> Result<(), Error> {
		parent
			.insert_before(node, reference)
			.map(|_| ())
			.map_err(|error| structure("could not insert node", &error))
	}

	fn append_child(&mut self, parent: &web_sys::Node, node: &web_sys::Node) -> Result<(), Error> {
		parent
			.append_child(node)
			.map(|_| ())
			.map_err(|error| structure("could not append node", &error))
	}

	fn remove_child(&mut self, parent: &web_sys::Node, node: &web_sys::Node) -> Result<(), Error> {
		parent
			.remove_child(node)
			.map(|_| ())
			.map_err(|error| structure("could not remove node", &error))
	}

	fn next_sibling(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.next_sibling()
	}

	fn resolve_target(&mut self, target: &PortalTarget<web_sys::Node>) -> Result<web_sys::Node, Error> {
		match target {
			PortalTarget::Selector(selector) => match self.document.query_selector(selector) {
				Ok(Some(element)) => Ok(element.into()),
				_ => Err(Error::UnresolvedPortalTarget {
					target: selector.clone(),
				}),
			},
			PortalTarget::Node(node) => Ok(node.clone()),
		}
	}
}
