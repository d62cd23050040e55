//! Render-ready projection of the editor's entities.
//!
//! Nothing in here is authoritative: every value is recomputed from elements and
//! connections, and projecting the same input twice gives the same output.

use std::collections::HashMap;

use crate::rest_types::{DeviceType, NetworkConnection, NetworkElement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
	Circle,
	Rectangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeSize {
	Small,
	Medium,
	Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStyle {
	pub shape: NodeShape,
	pub color: &'static str,
	pub size: NodeSize,
}

pub fn node_style(kind: &DeviceType) -> NodeStyle {
	use NodeShape::*;
	let (shape, color, size) = match kind {
		DeviceType::Edfa | DeviceType::MultibandAmp => (Rectangle, "red", NodeSize::Large),
		DeviceType::Transceiver => (Circle, "orange", NodeSize::Medium),
		DeviceType::Roadm => (Circle, "green", NodeSize::Medium),
		DeviceType::Fiber | DeviceType::RamanFiber => (Rectangle, "lightblue", NodeSize::Small),
		_ => (Circle, "gray", NodeSize::Medium),
	};
	NodeStyle { shape, color, size }
}

/// Fiber elements directly attached to a piece of equipment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiberNeighbours {
	/// Fiber whose output feeds this element
	pub fiber_in: Option<String>,
	/// Fiber fed by this element
	pub fiber_out: Option<String>,
}
impl FiberNeighbours {
	pub fn is_empty(&self) -> bool {
		self.fiber_in.is_none() && self.fiber_out.is_none()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
	pub element_id: String,
	pub label: String,
	pub kind: DeviceType,
	pub style: NodeStyle,
	pub draggable: bool,
	pub x: f64,
	pub y: f64,
	pub fiber: FiberNeighbours,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeView {
	pub connection_id: String,
	pub source: String,
	pub target: String,
	pub width: f32,
	pub color: &'static str,
	/// SVG dash array, `None` for a solid line
	pub dash: Option<&'static str>,
}

pub fn project_element(el: &NetworkElement) -> NodeView {
	let (x, y) = el.location().unwrap_or((0.0, 0.0));
	NodeView {
		element_id: el.element_id.clone(),
		label: format!("{} ({})", el.name, el.kind),
		kind: el.kind.clone(),
		style: node_style(&el.kind),
		draggable: !el.kind.is_fiber(),
		x,
		y,
		fiber: FiberNeighbours::default(),
	}
}

pub fn project_connection(connection_id: &str, conn: &NetworkConnection, elements: &HashMap<String, NetworkElement>) -> EdgeView {
	let is_fiber = |id: &str| elements.get(id).map(|el| el.kind.is_fiber()).unwrap_or(false);
	let (width, color, dash) = if is_fiber(&conn.from_node) || is_fiber(&conn.to_node) {
		(3.0, "lightblue", None)
	} else {
		(2.0, "gray", Some("4 4"))
	};

	EdgeView {
		connection_id: connection_id.to_owned(),
		source: conn.from_node.clone(),
		target: conn.to_node.clone(),
		width,
		color,
		dash,
	}
}

/// Which fiber slot of which element a connection fills, if any.
enum FiberLink<'a> {
	/// `(equipment, fiber)`: the fiber feeds the equipment
	In(&'a str, &'a str),
	/// `(equipment, fiber)`: the equipment feeds the fiber
	Out(&'a str, &'a str),
}

fn fiber_link<'a>(source: &'a str, target: &'a str, elements: &HashMap<String, NetworkElement>) -> Option<FiberLink<'a>> {
	let src = elements.get(source)?.kind.is_fiber();
	let dst = elements.get(target)?.kind.is_fiber();
	match (src, dst) {
		(true, false) => Some(FiberLink::In(target, source)),
		(false, true) => Some(FiberLink::Out(source, target)),
		_ => None,
	}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewModel {
	nodes: HashMap<String, NodeView>,
	edges: HashMap<String, EdgeView>,
}

impl ViewModel {
	/// Projects everything from scratch. Elements go first since edges and the
	/// fiber index look their endpoints up.
	pub fn build<'a, I>(elements: &HashMap<String, NetworkElement>, connections: I) -> ViewModel
		where I: IntoIterator<Item = (&'a String, &'a NetworkConnection)>
	{
		let mut view = ViewModel::default();
		for el in elements.values() {
			view.upsert_node(el);
		}

		let mut conns: Vec<_> = connections.into_iter().collect();
		conns.sort_by(|a, b| a.0.cmp(b.0));
		for (id, conn) in conns {
			view.upsert_edge(id, conn, elements);
		}
		view
	}

	pub fn nodes(&self) -> &HashMap<String, NodeView> { &self.nodes }
	pub fn edges(&self) -> &HashMap<String, EdgeView> { &self.edges }
	pub fn node(&self, element_id: &str) -> Option<&NodeView> { self.nodes.get(element_id) }
	pub fn edge(&self, connection_id: &str) -> Option<&EdgeView> { self.edges.get(connection_id) }

	/// Projects `el`, keeping the fiber annotation its connections produced.
	pub fn upsert_node(&mut self, el: &NetworkElement) {
		let mut node = project_element(el);
		if let Some(prev) = self.nodes.remove(&el.element_id) {
			node.fiber = prev.fiber;
		}
		self.nodes.insert(el.element_id.clone(), node);
	}

	pub fn remove_node(&mut self, element_id: &str) {
		self.nodes.remove(element_id);
	}

	pub fn upsert_edge(&mut self, connection_id: &str, conn: &NetworkConnection, elements: &HashMap<String, NetworkElement>) {
		if self.edges.contains_key(connection_id) {
			// endpoints may have moved
			self.remove_edge(connection_id, elements);
		}
		let edge = project_connection(connection_id, conn, elements);
		self.record_fiber(&edge.source, &edge.target, elements);
		self.edges.insert(connection_id.to_owned(), edge);
	}

	pub fn remove_edge(&mut self, connection_id: &str, elements: &HashMap<String, NetworkElement>) {
		if let Some(edge) = self.edges.remove(connection_id) {
			self.recompute_fiber(&edge.source, elements);
			self.recompute_fiber(&edge.target, elements);
		}
	}

	fn record_fiber(&mut self, source: &str, target: &str, elements: &HashMap<String, NetworkElement>) {
		match fiber_link(source, target, elements) {
			Some(FiberLink::In(equipment, fiber)) => {
				if let Some(node) = self.nodes.get_mut(equipment) {
					node.fiber.fiber_in = Some(fiber.to_owned());
				}
			},
			Some(FiberLink::Out(equipment, fiber)) => {
				if let Some(node) = self.nodes.get_mut(equipment) {
					node.fiber.fiber_out = Some(fiber.to_owned());
				}
			},
			None => {},
		}
	}

	/// Rebuilds one node's fiber slots from the remaining edges, in connection id order.
	fn recompute_fiber(&mut self, element_id: &str, elements: &HashMap<String, NetworkElement>) {
		let mut touching: Vec<(String, String, String)> = self.edges.values()
			.filter(|e| e.source == element_id || e.target == element_id)
			.map(|e| (e.connection_id.clone(), e.source.clone(), e.target.clone()))
			.collect();
		touching.sort();

		let mut fiber = FiberNeighbours::default();
		for (_, source, target) in &touching {
			match fiber_link(source, target, elements) {
				Some(FiberLink::In(equipment, f)) if equipment == element_id => fiber.fiber_in = Some(f.to_owned()),
				Some(FiberLink::Out(equipment, f)) if equipment == element_id => fiber.fiber_out = Some(f.to_owned()),
				_ => {},
			}
		}
		if let Some(node) = self.nodes.get_mut(element_id) {
			node.fiber = fiber;
		}
	}
}
