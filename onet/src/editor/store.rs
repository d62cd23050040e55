//! Identifier-keyed entity maps plus the network's singleton settings.
//!
//! Every mutation goes through a method here so the dirty flag cannot be
//! forgotten. While `loading` is set, mutations are not counted as edits.

use std::collections::HashMap;

use crate::rest::{Error, RResult};
use crate::rest_types as rt;

#[derive(Debug, Default)]
pub struct EntityStore {
	name: String,
	elements: HashMap<String, rt::NetworkElement>,
	connections: HashMap<String, rt::NetworkConnection>,
	services: HashMap<String, rt::NetworkService>,
	si: Option<rt::SpectrumInformation>,
	span: Option<rt::SpanParameters>,
	simulation_config: Option<rt::SimulationConfig>,

	loading: bool,
	dirty: bool,
	revision: u64,
}

/// A network response that passed the integrity checks.
#[derive(Debug)]
pub(crate) struct ValidDetail(rt::NetworkDetail);

impl ValidDetail {
	/// Every connection must carry an id and join two elements of the same response.
	pub fn check(detail: rt::NetworkDetail) -> RResult<ValidDetail> {
		let known: std::collections::HashSet<&str> = detail.elements.iter()
			.map(|el| el.element_id.as_str())
			.collect();

		for conn in &detail.connections {
			let id = conn.connection_id.as_deref().ok_or_else(|| Error::Integrity(
				format!("connection {} -> {} in network {} has no connection_id", conn.from_node, conn.to_node, detail.network_id)
			))?;
			for endpoint in [&conn.from_node, &conn.to_node] {
				if !known.contains(endpoint.as_str()) {
					return Err(Error::Integrity(format!("connection {} references unknown element {}", id, endpoint)));
				}
			}
		}
		Ok(ValidDetail(detail))
	}

	pub fn detail(&self) -> &rt::NetworkDetail { &self.0 }
	pub fn into_inner(self) -> rt::NetworkDetail { self.0 }
}

impl EntityStore {
	pub fn name(&self) -> &str { &self.name }
	pub fn elements(&self) -> &HashMap<String, rt::NetworkElement> { &self.elements }
	pub fn connections(&self) -> &HashMap<String, rt::NetworkConnection> { &self.connections }
	pub fn services(&self) -> &HashMap<String, rt::NetworkService> { &self.services }
	pub fn element(&self, id: &str) -> Option<&rt::NetworkElement> { self.elements.get(id) }
	pub fn connection(&self, id: &str) -> Option<&rt::NetworkConnection> { self.connections.get(id) }
	pub fn service(&self, id: &str) -> Option<&rt::NetworkService> { self.services.get(id) }
	pub fn si(&self) -> Option<&rt::SpectrumInformation> { self.si.as_ref() }
	pub fn span(&self) -> Option<&rt::SpanParameters> { self.span.as_ref() }
	pub fn simulation_config(&self) -> Option<&rt::SimulationConfig> { self.simulation_config.as_ref() }

	pub fn is_loading(&self) -> bool { self.loading }
	pub fn is_dirty(&self) -> bool { self.dirty }
	/// Bumped by every mutation, loading or not.
	pub fn revision(&self) -> u64 { self.revision }

	pub fn set_loading(&mut self, loading: bool) {
		self.loading = loading;
	}

	/// Clears the dirty flag if nothing changed since `revision` was read.
	pub fn mark_clean(&mut self, revision: u64) -> bool {
		if self.revision == revision {
			self.dirty = false;
		}
		!self.dirty
	}

	fn touch(&mut self) {
		self.revision += 1;
		if !self.loading {
			self.dirty = true;
		}
	}

	/// Ids of connections starting or ending at `element_id`, sorted.
	pub fn connections_touching(&self, element_id: &str) -> Vec<String> {
		let mut ids: Vec<String> = self.connections.iter()
			.filter(|(_, c)| c.touches(element_id))
			.map(|(id, _)| id.clone())
			.collect();
		ids.sort();
		ids
	}

	/// Swaps in a whole network. Does not count as an edit when done while loading.
	pub(crate) fn replace(&mut self, detail: ValidDetail) {
		let rt::NetworkDetail { network_name, elements, connections, services, si, span, simulation_config, .. } = detail.into_inner();
		self.name = network_name;
		self.elements = elements.into_iter().map(|el| (el.element_id.clone(), el)).collect();
		self.connections = connections.into_iter()
			.filter_map(|c| Some((c.connection_id.clone()?, c)))
			.collect();
		self.services = services.into_iter().map(|s| (s.service_id.clone(), s)).collect();
		self.si = si;
		self.span = span;
		self.simulation_config = simulation_config;
		self.touch();
	}

	pub fn set_name(&mut self, name: String) {
		if self.name != name {
			self.name = name;
			self.touch();
		}
	}

	/// Takes the name the server confirmed. Not an edit.
	pub(crate) fn adopt_name(&mut self, name: String) {
		self.name = name;
	}

	pub fn insert_element(&mut self, el: rt::NetworkElement) {
		self.elements.insert(el.element_id.clone(), el);
		self.touch();
	}

	/// Applies `f` to the element, if present, and returns the result.
	pub fn update_element<F>(&mut self, id: &str, f: F) -> Option<&rt::NetworkElement>
		where F: FnOnce(&mut rt::NetworkElement)
	{
		if !self.elements.contains_key(id) {
			return None;
		}
		self.touch();
		let el = self.elements.get_mut(id)?;
		f(el);
		Some(el)
	}

	/// UI-only state; never marks the network as edited.
	pub(crate) fn set_selected(&mut self, id: &str, selected: bool) {
		if let Some(el) = self.elements.get_mut(id) {
			el.ui.selected = selected;
		}
	}

	pub fn remove_element(&mut self, id: &str) -> Option<rt::NetworkElement> {
		let removed = self.elements.remove(id);
		if removed.is_some() {
			self.touch();
		}
		removed
	}

	/// Stores a connection under its id. Connections without one are refused.
	pub fn insert_connection(&mut self, conn: rt::NetworkConnection) -> RResult<&rt::NetworkConnection> {
		let id = conn.connection_id.clone()
			.ok_or_else(|| Error::Integrity(format!("connection {} -> {} has no connection_id", conn.from_node, conn.to_node)))?;
		self.touch();
		self.connections.insert(id.clone(), conn);
		Ok(&self.connections[&id])
	}

	pub fn remove_connection(&mut self, id: &str) -> Option<rt::NetworkConnection> {
		let removed = self.connections.remove(id);
		if removed.is_some() {
			self.touch();
		}
		removed
	}

	pub fn insert_service(&mut self, service: rt::NetworkService) {
		self.services.insert(service.service_id.clone(), service);
		self.touch();
	}

	pub fn remove_service(&mut self, id: &str) -> Option<rt::NetworkService> {
		let removed = self.services.remove(id);
		if removed.is_some() {
			self.touch();
		}
		removed
	}

	pub fn set_si(&mut self, si: rt::SpectrumInformation) {
		self.si = Some(si);
		self.touch();
	}

	pub fn set_span(&mut self, span: rt::SpanParameters) {
		self.span = Some(span);
		self.touch();
	}

	pub fn set_simulation_config(&mut self, config: rt::SimulationConfig) {
		self.simulation_config = Some(config);
		self.touch();
	}

	/// Everything a `PUT /networks/{id}` needs, with entities in id order.
	pub fn snapshot(&self, network_id: &str) -> rt::NetworkSnapshot {
		fn sorted<T: Clone>(map: &HashMap<String, T>) -> Vec<T> {
			let mut entries: Vec<(&String, &T)> = map.iter().collect();
			entries.sort_by(|a, b| a.0.cmp(b.0));
			entries.into_iter().map(|(_, v)| v.clone()).collect()
		}

		rt::NetworkSnapshot {
			network_id: network_id.to_owned(),
			network_name: self.name.clone(),
			elements: sorted(&self.elements),
			connections: sorted(&self.connections),
			services: sorted(&self.services),
			si: self.si.clone(),
			span: self.span.clone(),
			simulation_config: self.simulation_config.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn element(id: &str) -> rt::NetworkElement {
		rt::NetworkElement {
			element_id: id.into(),
			name: id.into(),
			kind: rt::DeviceType::Roadm,
			library_id: None,
			type_variety: None,
			params: Default::default(),
			metadata: Default::default(),
			ui: Default::default(),
		}
	}

	fn connection(id: Option<&str>, from: &str, to: &str) -> rt::NetworkConnection {
		rt::NetworkConnection { connection_id: id.map(String::from), from_node: from.into(), to_node: to.into() }
	}

	fn detail(connections: Vec<rt::NetworkConnection>) -> rt::NetworkDetail {
		rt::NetworkDetail {
			network_id: "n1".into(),
			network_name: "Ring".into(),
			created_at: String::new(),
			updated_at: String::new(),
			elements: vec![element("a"), element("b")],
			connections,
			services: Vec::new(),
			si: None,
			span: None,
			simulation_config: None,
		}
	}

	#[test]
	fn integrity_checks() {
		assert!(ValidDetail::check(detail(vec![connection(Some("c1"), "a", "b")])).is_ok());

		let missing_id = ValidDetail::check(detail(vec![connection(None, "a", "b")]));
		assert!(matches!(missing_id, Err(Error::Integrity(_))));

		let dangling = ValidDetail::check(detail(vec![connection(Some("c1"), "a", "ghost")]));
		match dangling {
			Err(Error::Integrity(msg)) => assert!(msg.contains("ghost"), "{}", msg),
			other => panic!("expected integrity error, got {:?}", other),
		}
	}

	#[test]
	fn loading_does_not_mark_dirty() {
		let mut store = EntityStore::default();
		store.set_loading(true);
		store.replace(ValidDetail::check(detail(vec![connection(Some("c1"), "a", "b")])).unwrap());
		store.set_loading(false);

		assert!(!store.is_dirty());
		assert_eq!(store.name(), "Ring");
		assert_eq!(store.connections_touching("a"), vec!["c1".to_string()]);

		store.set_name("Ring".into());
		assert!(!store.is_dirty(), "same name is not an edit");
		store.set_selected("a", true);
		assert!(!store.is_dirty());

		store.remove_connection("c1");
		assert!(store.is_dirty());
	}

	#[test]
	fn mark_clean_respects_later_edits() {
		let mut store = EntityStore::default();
		store.insert_element(element("a"));
		let rev = store.revision();
		store.insert_element(element("b"));

		assert!(!store.mark_clean(rev));
		assert!(store.mark_clean(store.revision()));
		assert!(!store.is_dirty());
	}

	#[test]
	fn snapshot_is_ordered_by_id() {
		let mut store = EntityStore::default();
		store.insert_element(element("z"));
		store.insert_element(element("a"));
		store.insert_element(element("m"));

		let ids: Vec<_> = store.snapshot("n1").elements.into_iter().map(|e| e.element_id).collect();
		assert_eq!(ids, ["a", "m", "z"]);
	}

	#[test]
	fn connections_need_ids() {
		let mut store = EntityStore::default();
		assert!(store.insert_connection(connection(None, "a", "b")).is_err());
		assert!(!store.is_dirty());
		assert!(store.insert_connection(connection(Some("c1"), "a", "b")).is_ok());
		assert!(store.connection("c1").is_some());
	}
}
