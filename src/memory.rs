use crate::{
	dom::{categorize, DataCategory, Dom},
	error::Error,
	vdom::{EventHandler, Namespace, PortalTarget, StyleMap, VProp},
};
use hashbrown::HashMap;

/// Opaque handle into a [`MemoryDom`]'s node store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

/// An in-memory host tree: the reference [`Dom`] implementation for native targets.
///
/// Beyond implementing the driver operations it records every *observable* mutation
/// in a journal (writing a value that is already present records nothing), so tests
/// can assert not only on the resulting tree but on how much work reconciliation
/// actually performed.
pub struct MemoryDom {
	nodes: Vec<NodeRecord>,
	targets: HashMap<String, NodeId>,
	journal: Vec<Mutation>,
}

struct NodeRecord {
	parent: Option<NodeId>,
	data: NodeData,
}

enum NodeData {
	Element(ElementRecord),
	Text(String),
}

struct ElementRecord {
	tag: String,
	namespace: Namespace,
	attributes: HashMap<String, String>,
	properties: HashMap<String, VProp>,
	style: StyleMap,
	class: Option<String>,
	listeners: HashMap<String, EventHandler>,
	children: Vec<NodeId>,
}

/// One observable host-tree change, in application order.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
	CreateElement { node: NodeId, tag: String, namespace: Namespace },
	CreateText { node: NodeId },
	SetText { node: NodeId, text: String },
	SetAttribute { node: NodeId, name: String, value: Option<String> },
	SetProperty { node: NodeId, name: String },
	SetStyle { node: NodeId, name: String, value: Option<String> },
	SetClass { node: NodeId, class: Option<String> },
	AddListener { node: NodeId, event: String },
	RemoveListener { node: NodeId, event: String },
	InsertBefore { parent: NodeId, node: NodeId, reference: Option<NodeId> },
	AppendChild { parent: NodeId, node: NodeId },
	RemoveChild { parent: NodeId, node: NodeId },
}

impl Mutation {
	/// Whether this mutation placed a node (insertion, append or move).
	#[must_use]
	pub fn is_placement(&self) -> bool {
		matches!(self, Mutation::InsertBefore { .. } | Mutation::AppendChild { .. })
	}

	/// Whether this mutation created a fresh host node.
	#[must_use]
	pub fn is_creation(&self) -> bool {
		matches!(self, Mutation::CreateElement { .. } | Mutation::CreateText { .. })
	}
}

impl MemoryDom {
	#[must_use]
	pub fn new() -> Self {
		Self {
			nodes: Vec::new(),
			targets: HashMap::new(),
			journal: Vec::new(),
		}
	}

	/// Registers a selector for portal resolution.
	pub fn register_target(&mut self, selector: impl Into<String>, node: NodeId) {
		self.targets.insert(selector.into(), node);
	}

	#[must_use]
	pub fn mutations(&self) -> &[Mutation] {
		&self.journal
	}

	pub fn clear_mutations(&mut self) {
		self.journal.clear();
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.record(node).and_then(|record| record.parent)
	}

	#[must_use]
	pub fn tag(&self, node: NodeId) -> Option<&str> {
		match self.record(node).map(|record| &record.data) {
			Some(NodeData::Element(element)) => Some(&element.tag),
			_ => None,
		}
	}

	#[must_use]
	pub fn text(&self, node: NodeId) -> Option<&str> {
		match self.record(node).map(|record| &record.data) {
			Some(NodeData::Text(text)) => Some(text),
			_ => None,
		}
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> Vec<NodeId> {
		match self.record(node).map(|record| &record.data) {
			Some(NodeData::Element(element)) => element.children.clone(),
			_ => Vec::new(),
		}
	}

	#[must_use]
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		match self.record(node).map(|record| &record.data) {
			Some(NodeData::Element(element)) => element.attributes.get(name).map(String::as_str),
			_ => None,
		}
	}

	#[must_use]
	pub fn property(&self, node: NodeId, name: &str) -> Option<&VProp> {
		match self.record(node).map(|record| &record.data) {
			Some(NodeData::Element(element)) => element.properties.get(name),
			_ => None,
		}
	}

	#[must_use]
	pub fn style(&self, node: NodeId, name: &str) -> Option<&str> {
		match self.record(node).map(|record| &record.data) {
			Some(NodeData::Element(element)) => element.style.get(name).map(String::as_str),
			_ => None,
		}
	}

	#[must_use]
	pub fn class(&self, node: NodeId) -> Option<&str> {
		match self.record(node).map(|record| &record.data) {
			Some(NodeData::Element(element)) => element.class.as_deref(),
			_ => None,
		}
	}

	#[must_use]
	pub fn listener(&self, node: NodeId, event: &str) -> Option<EventHandler> {
		match self.record(node).map(|record| &record.data) {
			Some(NodeData::Element(element)) => element.listeners.get(event).cloned(),
			_ => None,
		}
	}

	/// Concatenated text content of a subtree, in tree order.
	#[must_use]
	pub fn text_content(&self, node: NodeId) -> String {
		match self.record(node).map(|record| &record.data) {
			Some(NodeData::Element(element)) => {
				let children = element.children.clone();
				children.iter().map(|child| self.text_content(*child)).collect()
			}
			Some(NodeData::Text(text)) => text.clone(),
			None => String::new(),
		}
	}

	fn record(&self, node: NodeId) -> Option<&NodeRecord> {
		self.nodes.get(node.0 as usize)
	}

	fn alloc(&mut self, data: NodeData) -> NodeId {
		let id = NodeId(self.nodes.len() as u32);
		self.nodes.push(NodeRecord { parent: None, data });
		id
	}

	fn log(&mut self, mutation: Mutation) {
		self.journal.push(mutation);
	}

	fn element_mut(&mut self, node: NodeId) -> Result<&mut ElementRecord, Error> {
		match self.nodes.get_mut(node.0 as usize).map(|record| &mut record.data) {
			Some(NodeData::Element(element)) => Ok(element),
			_ => Err(Error::Structure {
				message: format!("{:?} is not an element", node),
			}),
		}
	}

	/// Silently unlinks `node` from its current parent; the matching journal entry is
	/// the placement that triggered the move, as with a real tree.
	fn unlink(&mut self, node: NodeId) {
		let parent = match self.record(node) {
			Some(record) => record.parent,
			None => None,
		};
		if let Some(parent) = parent {
			if let Some(NodeData::Element(element)) = self.nodes.get_mut(parent.0 as usize).map(|record| &mut record.data) {
				element.children.retain(|child| *child != node);
			}
		}
		if let Some(record) = self.nodes.get_mut(node.0 as usize) {
			record.parent = None;
		}
	}

	fn set_parent(&mut self, node: NodeId, parent: NodeId) -> Result<(), Error> {
		match self.nodes.get_mut(node.0 as usize) {
			Some(record) => {
				record.parent = Some(parent);
				Ok(())
			}
			None => Err(Error::Structure {
				message: format!("{:?} does not exist", node),
			}),
		}
	}

	fn patch_style(&mut self, node: NodeId, prev: Option<&StyleMap>, next: Option<&StyleMap>) -> Result<(), Error> {
		if let Some(next) = next {
			for (name, value) in next {
				let changed = {
					let element = self.element_mut(node)?;
					if element.style.get(name).map(String::as_str) == Some(value.as_str()) {
						false
					} else {
						element.style.insert(name.clone(), value.clone());
						true
					}
				};
				if changed {
					self.log(Mutation::SetStyle {
						node,
						name: name.clone(),
						value: Some(value.clone()),
					});
				}
			}
		}
		if let Some(prev) = prev {
			for name in prev.keys() {
				if next.map_or(true, |next| !next.contains_key(name)) {
					let removed = self.element_mut(node)?.style.remove(name).is_some();
					if removed {
						self.log(Mutation::SetStyle {
							node,
							name: name.clone(),
							value: None,
						});
					}
				}
			}
		}
		Ok(())
	}
}

impl Default for MemoryDom {
	fn default() -> Self {
		Self::new()
	}
}

fn rejected(key: &str, message: &str) -> Error {
	Error::RejectedData {
		key: key.to_owned(),
		message: message.to_owned(),
	}
}

impl Dom for MemoryDom {
	type Node = NodeId;

	fn create_element(&mut self, tag: &str, namespace: Namespace) -> Result<NodeId, Error> {
		let node = self.alloc(NodeData::Element(ElementRecord {
			tag: tag.to_owned(),
			namespace,
			attributes: HashMap::new(),
			properties: HashMap::new(),
			style: StyleMap::new(),
			class: None,
			listeners: HashMap::new(),
			children: Vec::new(),
		}));
		self.log(Mutation::CreateElement {
			node,
			tag: tag.to_owned(),
			namespace,
		});
		Ok(node)
	}

	fn create_text(&mut self, text: &str) -> Result<NodeId, Error> {
		let node = self.alloc(NodeData::Text(text.to_owned()));
		self.log(Mutation::CreateText { node });
		Ok(node)
	}

	fn set_text(&mut self, node: &NodeId, text: &str) -> Result<(), Error> {
		let node = *node;
		match self.nodes.get_mut(node.0 as usize).map(|record| &mut record.data) {
			Some(NodeData::Text(current)) => {
				if current != text {
					*current = text.to_owned();
					self.log(Mutation::SetText {
						node,
						text: text.to_owned(),
					});
				}
				Ok(())
			}
			_ => Err(Error::Structure {
				message: format!("{:?} is not a text node", node),
			}),
		}
	}

	fn patch_data(&mut self, node: &NodeId, key: &str, prev: Option<&VProp>, next: Option<&VProp>) -> Result<(), Error> {
		let node = *node;
		match categorize(key) {
			DataCategory::Style => {
				let prev = match prev {
					None => None,
					Some(VProp::Style(style)) => Some(style),
					Some(_) => return Err(rejected(key, "expected a style map")),
				};
				let next = match next {
					None => None,
					Some(VProp::Style(style)) => Some(style),
					Some(_) => return Err(rejected(key, "expected a style map")),
				};
				self.patch_style(node, prev, next)
			}
			DataCategory::Class => {
				let class = match next {
					None => None,
					Some(VProp::Text(class)) => Some(class.clone()),
					Some(_) => return Err(rejected(key, "expected a class string")),
				};
				let changed = {
					let element = self.element_mut(node)?;
					if element.class == class {
						false
					} else {
						element.class = class.clone();
						true
					}
				};
				if changed {
					self.log(Mutation::SetClass { node, class });
				}
				Ok(())
			}
			DataCategory::Event(event) => {
				let next = match next {
					None => None,
					Some(VProp::Listener(handler)) => Some(handler),
					Some(_) => return Err(rejected(key, "expected an event listener")),
				};
				match prev {
					None | Some(VProp::Listener(_)) => (),
					Some(_) => return Err(rejected(key, "expected an event listener")),
				}

				let current = self.element_mut(node)?.listeners.get(event).cloned();
				if current.as_ref() == next {
					return Ok(());
				}
				if current.is_some() {
					self.element_mut(node)?.listeners.remove(event);
					self.log(Mutation::RemoveListener {
						node,
						event: event.to_owned(),
					});
				}
				if let Some(handler) = next {
					self.element_mut(node)?.listeners.insert(event.to_owned(), handler.clone());
					self.log(Mutation::AddListener {
						node,
						event: event.to_owned(),
					});
				}
				Ok(())
			}
			DataCategory::Property => {
				let next = match next {
					None => None,
					Some(value @ (VProp::Text(_) | VProp::Flag(_))) => Some(value),
					Some(_) => return Err(rejected(key, "expected a property value")),
				};
				let changed = {
					let element = self.element_mut(node)?;
					match next {
						Some(value) => {
							if element.properties.get(key) == Some(value) {
								false
							} else {
								element.properties.insert(key.to_owned(), value.clone());
								true
							}
						}
						None => element.properties.remove(key).is_some(),
					}
				};
				if changed {
					self.log(Mutation::SetProperty {
						node,
						name: key.to_owned(),
					});
				}
				Ok(())
			}
			DataCategory::Attribute => {
				let value = match next {
					None => None,
					Some(VProp::Text(value)) => Some(value.clone()),
					Some(_) => return Err(rejected(key, "expected an attribute string")),
				};
				let changed = {
					let element = self.element_mut(node)?;
					match &value {
						Some(value) => {
							if element.attributes.get(key) == Some(value) {
								false
							} else {
								element.attributes.insert(key.to_owned(), value.clone());
								true
							}
						}
						None => element.attributes.remove(key).is_some(),
					}
				};
				if changed {
					self.log(Mutation::SetAttribute {
						node,
						name: key.to_owned(),
						value,
					});
				}
				Ok(())
			}
		}
	}

	fn insert_before(&mut self, parent: &NodeId, node: &NodeId, reference: Option<&NodeId>) -> Result<(), Error> {
		let (parent, node) = (*parent, *node);
		self.unlink(node);
		let reference = reference.copied();
		{
			let element = self.element_mut(parent)?;
			match reference {
				Some(reference) => {
					let index = element.children.iter().position(|child| *child == reference).ok_or(Error::Structure {
						message: format!("{:?} is not a child of {:?}", reference, parent),
					})?;
					element.children.insert(index, node);
				}
				None => element.children.push(node),
			}
		}
		self.set_parent(node, parent)?;
		self.log(Mutation::InsertBefore { parent, node, reference });
		Ok(())
	}

	fn append_child(&mut self, parent: &NodeId, node: &NodeId) -> Result<(), Error> {
		let (parent, node) = (*parent, *node);
		self.unlink(node);
		self.element_mut(parent)?.children.push(node);
		self.set_parent(node, parent)?;
		self.log(Mutation::AppendChild { parent, node });
		Ok(())
	}

	fn remove_child(&mut self, parent: &NodeId, node: &NodeId) -> Result<(), Error> {
		let (parent, node) = (*parent, *node);
		{
			let element = self.element_mut(parent)?;
			let index = element.children.iter().position(|child| *child == node).ok_or(Error::Structure {
				message: format!("{:?} is not a child of {:?}", node, parent),
			})?;
			element.children.remove(index);
		}
		if let Some(record) = self.nodes.get_mut(node.0 as usize) {
			record.parent = None;
		}
		self.log(Mutation::RemoveChild { parent, node });
		Ok(())
	}

	fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
		let parent = self.parent(*node)?;
		let children = match self.record(parent).map(|record| &record.data) {
			Some(NodeData::Element(element)) => &element.children,
			_ => return None,
		};
		let index = children.iter().position(|child| *child == *node)?;
		children.get(index + 1).copied()
	}

	fn resolve_target(&mut self, target: &PortalTarget<NodeId>) -> Result<NodeId, Error> {
		match target {
			PortalTarget::Selector(selector) => self.targets.get(selector).copied().ok_or_else(|| Error::UnresolvedPortalTarget {
				target: selector.clone(),
			}),
			PortalTarget::Node(node) => Ok(*node),
		}
	}
}
