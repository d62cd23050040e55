//! Client-side model of one network being edited.
//!
//! [`NetworkEditor`] keeps a local copy of the active network in sync with the
//! server: every edit goes to the server first and is only applied locally once
//! the server accepted it. Alongside the entities it maintains a render-ready
//! [`ViewModel`], the selection/mode state and a dirty flag for
//! [`NetworkEditor::save_network_changes`].
//!
//! Actions take `&self`. The state lock is never held across a server call, so
//! independent actions interleave; a response that was overtaken by a newer
//! request for the same entity is dropped.

use std::collections::BTreeSet;

use futures::future::join_all;
use log::{debug, error, trace, warn};
use tokio::sync::{Mutex, MutexGuard};

use crate::api::{LibraryApi, NetworkApi};
use crate::notify::{Notice, Notifier};
use crate::rest::{Error, RResult};
use crate::rest_types as rt;

mod selection;
mod sequence;
mod store;
mod view;

pub use selection::{EditorMode, PendingConnection, Selection};
pub use sequence::{RequestSequencer, Ticket};
pub use store::EntityStore;
pub use view::{node_style, project_connection, project_element, EdgeView, FiberNeighbours, NodeShape, NodeSize, NodeStyle, NodeView, ViewModel};

use store::ValidDetail;

/// Equipment palette of the active network.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociatedLibrary {
	pub library_id: String,
	pub equipment: rt::LibraryEquipment,
}

#[derive(Debug, Default)]
pub struct EditorState {
	network_id: Option<String>,
	created_at: String,
	updated_at: String,
	store: EntityStore,
	view: ViewModel,
	selection: Selection,
	saving: bool,
	last_error: Option<String>,
	library: Option<AssociatedLibrary>,
	library_loading: bool,
	seq: RequestSequencer,
}

impl EditorState {
	pub fn network_id(&self) -> Option<&str> { self.network_id.as_deref() }
	pub fn network_name(&self) -> &str { self.store.name() }
	pub fn created_at(&self) -> &str { &self.created_at }
	pub fn updated_at(&self) -> &str { &self.updated_at }

	/// Entity maps and singletons.
	pub fn store(&self) -> &EntityStore { &self.store }
	pub fn view(&self) -> &ViewModel { &self.view }
	pub fn selection(&self) -> &Selection { &self.selection }

	pub fn selected_element(&self) -> Option<&rt::NetworkElement> {
		self.selection.element().and_then(|id| self.store.element(id))
	}

	/// True while the network is being fetched or saved.
	pub fn is_loading(&self) -> bool { self.store.is_loading() || self.saving }
	pub fn is_dirty(&self) -> bool { self.store.is_dirty() }
	/// Message of the last failed load or save.
	pub fn last_error(&self) -> Option<&str> { self.last_error.as_deref() }

	pub fn library(&self) -> Option<&AssociatedLibrary> { self.library.as_ref() }
	pub fn is_library_loading(&self) -> bool { self.library_loading }

	fn active(&self) -> Option<String> {
		self.network_id.clone()
	}

	fn is_active(&self, network_id: &str) -> bool {
		self.network_id.as_deref() == Some(network_id)
	}

	/// Back to an empty editor. Outstanding requests all become stale.
	fn reset(&mut self) {
		let mut seq = std::mem::take(&mut self.seq);
		seq.forget_all();
		*self = EditorState { seq, ..EditorState::default() };
	}

	/// Installs a freshly fetched network and returns the library to associate.
	fn apply_detail(&mut self, detail: ValidDetail) -> Option<String> {
		let library_id = library_candidate(&detail.detail().elements);
		self.created_at = detail.detail().created_at.clone();
		self.updated_at = detail.detail().updated_at.clone();
		self.store.replace(detail);
		self.view = ViewModel::build(self.store.elements(), self.store.connections());
		library_id
	}

	/// Stores a server-confirmed connection and projects it.
	fn put_connection(&mut self, conn: rt::NetworkConnection) -> RResult<rt::NetworkConnection> {
		let id = conn.connection_id.clone()
			.ok_or_else(|| Error::Integrity(format!("connection {} -> {} returned without a connection_id", conn.from_node, conn.to_node)))?;
		for endpoint in [&conn.from_node, &conn.to_node] {
			if self.store.element(endpoint).is_none() {
				return Err(Error::Integrity(format!("connection {} references unknown element {}", id, endpoint)));
			}
		}

		let stored = self.store.insert_connection(conn)?.clone();
		self.view.upsert_edge(&id, &stored, self.store.elements());
		Ok(stored)
	}

	fn drop_connection(&mut self, connection_id: &str) {
		if self.store.remove_connection(connection_id).is_some() {
			self.view.remove_edge(connection_id, self.store.elements());
			self.selection.forget_connection(connection_id);
		}
	}

	fn drop_element(&mut self, element_id: &str) {
		// normally already gone through the cascade
		for cid in self.store.connections_touching(element_id) {
			self.drop_connection(&cid);
		}
		if self.store.remove_element(element_id).is_some() {
			self.view.remove_node(element_id);
			self.selection.forget_element(element_id);
		}
	}

	fn select_element(&mut self, element_id: Option<String>) {
		if let Some(id) = &element_id {
			if self.store.element(id).is_none() {
				debug!("ignoring selection of unknown element {}", id);
				return;
			}
		}
		if let Some(prev) = self.selection.element().map(String::from) {
			self.store.set_selected(&prev, false);
		}
		if let Some(id) = &element_id {
			self.store.set_selected(id, true);
		}
		self.selection.select_element(element_id);
	}

	fn select_connection(&mut self, connection_id: Option<String>) {
		if let Some(prev) = self.selection.element().map(String::from) {
			self.store.set_selected(&prev, false);
		}
		self.selection.select_connection(connection_id);
	}
}

/// First library referenced by an element, in response order.
fn library_candidate(elements: &[rt::NetworkElement]) -> Option<String> {
	let mut ids = elements.iter().filter_map(|el| el.library_id.as_deref());
	let first = ids.next()?;
	let others: BTreeSet<&str> = ids.filter(|id| *id != first).collect();
	if !others.is_empty() {
		warn!("network references several equipment libraries, using {} and ignoring {:?}", first, others);
	}
	Some(first.to_owned())
}

pub struct NetworkEditor<A> {
	api: A,
	notifier: Notifier,
	state: Mutex<EditorState>,
}

impl<A> NetworkEditor<A> {
	pub fn new(api: A) -> NetworkEditor<A> {
		NetworkEditor::with_notifier(api, Notifier::new())
	}

	pub fn with_notifier(api: A, notifier: Notifier) -> NetworkEditor<A> {
		NetworkEditor {
			api,
			notifier,
			state: Mutex::new(EditorState::default()),
		}
	}

	pub fn api(&self) -> &A { &self.api }
	pub fn notifier(&self) -> &Notifier { &self.notifier }

	/// Read access to the editor state. Don't hold on to it across other editor calls.
	pub async fn state(&self) -> MutexGuard<'_, EditorState> {
		self.state.lock().await
	}

	/// Active network id plus a fresh ticket for `key`.
	async fn begin(&self, key: impl Into<String>) -> Option<(String, Ticket)> {
		let mut st = self.state.lock().await;
		let network_id = st.active()?;
		Some((network_id, st.seq.issue(key)))
	}

	/// The state, if `ticket` is still the newest request for its key on `network_id`.
	async fn current(&self, network_id: &str, ticket: &Ticket) -> Option<MutexGuard<'_, EditorState>> {
		let st = self.state.lock().await;
		if st.is_active(network_id) && st.seq.is_latest(ticket) {
			Some(st)
		} else {
			debug!("discarding stale response for {} (#{})", ticket.key(), ticket.seq());
			None
		}
	}
}

impl<A: NetworkApi + LibraryApi> NetworkEditor<A> {
	pub async fn load_network(&self, network_id: &str) -> RResult<()> {
		let ticket = {
			let mut st = self.state.lock().await;
			if st.is_active(network_id) && !st.store.elements().is_empty() {
				trace!("network {} already loaded", network_id);
				return Ok(());
			}
			st.reset();
			st.network_id = Some(network_id.to_owned());
			st.store.set_loading(true);
			st.seq.issue(sequence::NETWORK)
		};

		debug!("loading network {}", network_id);
		let result = self.api.fetch_network(network_id).await
			.and_then(ValidDetail::check);

		let library_id = {
			let mut st = match self.current(network_id, &ticket).await {
				Some(st) => st,
				None => return Ok(()),
			};
			let outcome = result.map(|detail| st.apply_detail(detail));
			st.store.set_loading(false);
			match outcome {
				Ok(library_id) => library_id,
				Err(e) => {
					error!("failed to load network {}: {}", network_id, e);
					st.network_id = None;
					st.last_error = Some(e.to_string());
					return Err(e);
				},
			}
		};

		if let Some(library_id) = library_id {
			if let Err(e) = self.load_associated_library(&library_id).await {
				warn!("network {} loaded without its equipment library {}: {}", network_id, library_id, e);
			}
		}
		Ok(())
	}

	/// Fetches the equipment of `library_id` for the active network, unless it is
	/// already the associated library.
	pub async fn load_associated_library(&self, library_id: &str) -> RResult<()> {
		let (network_id, ticket) = {
			let mut st = self.state.lock().await;
			let network_id = match st.active() {
				Some(id) => id,
				None => return Ok(()),
			};
			if st.library.as_ref().map(|lib| lib.library_id == library_id).unwrap_or(false) {
				trace!("library {} already associated", library_id);
				return Ok(());
			}
			st.library_loading = true;
			(network_id, st.seq.issue(sequence::LIBRARY))
		};

		let result = self.api.fetch_library_equipment(library_id).await;

		let mut st = match self.current(&network_id, &ticket).await {
			Some(st) => st,
			None => return Ok(()),
		};
		st.library_loading = false;
		match result {
			Ok(equipment) => {
				st.library = Some(AssociatedLibrary { library_id: library_id.to_owned(), equipment });
				Ok(())
			},
			Err(e) => {
				st.library = None;
				Err(e)
			},
		}
	}

	/// Creates an element. `position` ends up in `metadata.location`.
	pub async fn add_element(&self, data: rt::ElementPayload, position: Option<(f64, f64)>) -> RResult<Option<rt::NetworkElement>> {
		let network_id = match self.state.lock().await.active() {
			Some(id) => id,
			None => return Ok(None),
		};

		let mut created = self.api.create_element(&network_id, &data).await?;
		if let Some((x, y)) = position {
			created.set_location(x, y);
		}

		let mut st = self.state.lock().await;
		if !st.is_active(&network_id) {
			debug!("network changed while creating element {}", created.element_id);
			return Ok(None);
		}
		st.view.upsert_node(&created);
		st.store.insert_element(created.clone());
		Ok(Some(created))
	}

	pub async fn update_element(&self, element_id: &str, patch: rt::ElementFields) -> RResult<Option<rt::NetworkElement>> {
		let (network_id, payload, ticket) = {
			let mut st = self.state.lock().await;
			let network_id = match st.active() {
				Some(id) => id,
				None => return Ok(None),
			};
			let mut merged = match st.store.element(element_id) {
				Some(el) => el.clone(),
				None => {
					debug!("update of unknown element {}", element_id);
					return Ok(None);
				},
			};
			merged.apply(patch);
			(network_id, merged.payload(), st.seq.issue(sequence::element_key(element_id)))
		};

		let response = self.api.update_element(&network_id, element_id, &payload).await?;

		let mut st = match self.current(&network_id, &ticket).await {
			Some(st) => st,
			None => return Ok(None),
		};
		let updated = match st.store.update_element(element_id, |el| el.apply(response)) {
			Some(el) => el.clone(),
			None => return Ok(None),
		};
		st.view.upsert_node(&updated);
		Ok(Some(updated))
	}

	/// Deletes an element together with every connection attached to it.
	///
	/// The connections go first. If any of them could not be deleted the element
	/// is kept and [`Error::Cascade`] names the leftovers; the ones that were
	/// deleted stay deleted.
	pub async fn delete_element(&self, element_id: &str) -> RResult<bool> {
		let (network_id, attached) = {
			let mut st = self.state.lock().await;
			let network_id = match st.active() {
				Some(id) => id,
				None => return Ok(false),
			};
			if st.store.element(element_id).is_none() {
				return Ok(false);
			}
			// supersedes in-flight updates
			st.seq.issue(sequence::element_key(element_id));
			(network_id, st.store.connections_touching(element_id))
		};

		if !attached.is_empty() {
			debug!("deleting {} connection(s) attached to element {}", attached.len(), element_id);
			let results = join_all(attached.iter().map(|cid| self.api.delete_connection(&network_id, cid))).await;

			let mut st = self.state.lock().await;
			if !st.is_active(&network_id) {
				return Ok(false);
			}
			let mut failed = Vec::new();
			for (cid, result) in attached.into_iter().zip(results) {
				match result {
					Ok(_) => st.drop_connection(&cid),
					Err(e) => {
						warn!("could not delete connection {} of element {}: {}", cid, element_id, e);
						failed.push(cid);
					},
				}
			}
			if !failed.is_empty() {
				return Err(Error::Cascade { element_id: element_id.to_owned(), failed });
			}
		}

		self.api.delete_element(&network_id, element_id).await?;

		let mut st = self.state.lock().await;
		if !st.is_active(&network_id) {
			return Ok(false);
		}
		st.drop_element(element_id);
		Ok(true)
	}

	/// Links two distinct, known elements.
	pub async fn add_connection(&self, from: &str, to: &str) -> RResult<Option<rt::NetworkConnection>> {
		let network_id = {
			let st = self.state.lock().await;
			let network_id = match st.active() {
				Some(id) => id,
				None => return Ok(None),
			};
			if from == to || st.store.element(from).is_none() || st.store.element(to).is_none() {
				debug!("ignoring connection {} -> {}", from, to);
				return Ok(None);
			}
			network_id
		};

		let payload = rt::ConnectionEndpoints { from_node: from.to_owned(), to_node: to.to_owned() };
		let created = self.api.create_connection(&network_id, &payload).await?;

		let mut st = self.state.lock().await;
		if !st.is_active(&network_id) {
			return Ok(None);
		}
		st.put_connection(created).map(Some)
	}

	pub async fn update_connection(&self, connection_id: &str, from: &str, to: &str) -> RResult<Option<rt::NetworkConnection>> {
		let (network_id, ticket) = {
			let mut st = self.state.lock().await;
			let network_id = match st.active() {
				Some(id) => id,
				None => return Ok(None),
			};
			if st.store.connection(connection_id).is_none()
				|| from == to || st.store.element(from).is_none() || st.store.element(to).is_none()
			{
				debug!("ignoring update of connection {} to {} -> {}", connection_id, from, to);
				return Ok(None);
			}
			(network_id, st.seq.issue(sequence::connection_key(connection_id)))
		};

		let payload = rt::ConnectionEndpoints { from_node: from.to_owned(), to_node: to.to_owned() };
		let endpoints = self.api.update_connection(&network_id, connection_id, &payload).await?;

		let mut st = match self.current(&network_id, &ticket).await {
			Some(st) => st,
			None => return Ok(None),
		};
		if st.store.connection(connection_id).is_none() {
			return Ok(None);
		}
		st.put_connection(rt::NetworkConnection {
			connection_id: Some(connection_id.to_owned()),
			from_node: endpoints.from_node,
			to_node: endpoints.to_node,
		}).map(Some)
	}

	pub async fn delete_connection(&self, connection_id: &str) -> RResult<bool> {
		let network_id = {
			let mut st = self.state.lock().await;
			let network_id = match st.active() {
				Some(id) => id,
				None => return Ok(false),
			};
			if st.store.connection(connection_id).is_none() {
				return Ok(false);
			}
			st.seq.issue(sequence::connection_key(connection_id));
			network_id
		};

		self.api.delete_connection(&network_id, connection_id).await?;

		let mut st = self.state.lock().await;
		if !st.is_active(&network_id) {
			return Ok(false);
		}
		st.drop_connection(connection_id);
		Ok(true)
	}

	/// Adds a service between two known elements.
	pub async fn add_service(&self, service: &rt::NewService) -> RResult<Option<rt::NetworkService>> {
		let network_id = {
			let st = self.state.lock().await;
			let network_id = match st.active() {
				Some(id) => id,
				None => return Ok(None),
			};
			if st.store.element(&service.source_element_id).is_none() || st.store.element(&service.target_element_id).is_none() {
				debug!("ignoring service {} -> {}", service.source_element_id, service.target_element_id);
				return Ok(None);
			}
			network_id
		};

		let created = self.api.create_service(&network_id, service).await?;

		let mut st = self.state.lock().await;
		if !st.is_active(&network_id) {
			return Ok(None);
		}
		st.store.insert_service(created.clone());
		Ok(Some(created))
	}

	pub async fn update_service(&self, service_id: &str, update: &rt::ServiceUpdate) -> RResult<Option<rt::NetworkService>> {
		let (network_id, ticket) = {
			let mut st = self.state.lock().await;
			let network_id = match st.active() {
				Some(id) => id,
				None => return Ok(None),
			};
			if st.store.service(service_id).is_none() {
				return Ok(None);
			}
			(network_id, st.seq.issue(sequence::service_key(service_id)))
		};

		let updated = self.api.update_service(&network_id, service_id, update).await?;

		let mut st = match self.current(&network_id, &ticket).await {
			Some(st) => st,
			None => return Ok(None),
		};
		if st.store.service(service_id).is_none() {
			return Ok(None);
		}
		st.store.insert_service(updated.clone());
		Ok(Some(updated))
	}

	pub async fn delete_service(&self, service_id: &str) -> RResult<bool> {
		let network_id = {
			let mut st = self.state.lock().await;
			let network_id = match st.active() {
				Some(id) => id,
				None => return Ok(false),
			};
			if st.store.service(service_id).is_none() {
				return Ok(false);
			}
			st.seq.issue(sequence::service_key(service_id));
			network_id
		};

		self.api.delete_service(&network_id, service_id).await?;

		let mut st = self.state.lock().await;
		if !st.is_active(&network_id) {
			return Ok(false);
		}
		Ok(st.store.remove_service(service_id).is_some())
	}

	pub async fn update_spectrum_information(&self, si: &rt::SpectrumInformation) -> RResult<Option<rt::SpectrumInformation>> {
		let (network_id, ticket) = match self.begin(sequence::SPECTRUM).await {
			Some(started) => started,
			None => return Ok(None),
		};
		let saved = self.api.update_spectrum_information(&network_id, si).await?;
		Ok(self.current(&network_id, &ticket).await.map(|mut st| {
			st.store.set_si(saved.clone());
			saved
		}))
	}

	pub async fn update_span_parameters(&self, span: &rt::SpanParameters) -> RResult<Option<rt::SpanParameters>> {
		let (network_id, ticket) = match self.begin(sequence::SPAN).await {
			Some(started) => started,
			None => return Ok(None),
		};
		let saved = self.api.update_span_parameters(&network_id, span).await?;
		Ok(self.current(&network_id, &ticket).await.map(|mut st| {
			st.store.set_span(saved.clone());
			saved
		}))
	}

	pub async fn update_simulation_config(&self, config: &rt::SimulationConfig) -> RResult<Option<rt::SimulationConfig>> {
		let (network_id, ticket) = match self.begin(sequence::SIMULATION).await {
			Some(started) => started,
			None => return Ok(None),
		};
		let saved = self.api.update_simulation_config(&network_id, config).await?;
		Ok(self.current(&network_id, &ticket).await.map(|mut st| {
			st.store.set_simulation_config(saved.clone());
			saved
		}))
	}

	/// Sends the whole local network to the server, if anything changed.
	///
	/// Returns `Ok(true)` when a save went through. On failure the network stays
	/// dirty and the error is kept as [`EditorState::last_error`].
	pub async fn save_network_changes(&self) -> RResult<bool> {
		let (network_id, snapshot, revision) = {
			let mut st = self.state.lock().await;
			let network_id = match st.active() {
				Some(id) if st.store.is_dirty() => id,
				_ => {
					trace!("nothing to save");
					return Ok(false);
				},
			};
			if st.saving {
				debug!("save of network {} already in progress", network_id);
				return Ok(false);
			}
			st.saving = true;
			let snapshot = st.store.snapshot(&network_id);
			(network_id, snapshot, st.store.revision())
		};

		debug!("saving network {} ({} elements, {} connections)", network_id, snapshot.elements.len(), snapshot.connections.len());
		let result = self.api.replace_network(&network_id, &snapshot).await;

		let mut st = self.state.lock().await;
		if !st.is_active(&network_id) {
			return Ok(false);
		}
		st.saving = false;
		match result {
			Ok(saved) => {
				if st.store.mark_clean(revision) {
					st.store.adopt_name(saved.network_name);
				} else {
					debug!("network {} was edited during the save, keeping it dirty", network_id);
				}
				st.updated_at = saved.updated_at;
				st.last_error = None;
				drop(st);
				self.notifier.publish(Notice::success("Network saved successfully!"));
				Ok(true)
			},
			Err(e) => {
				error!("failed to save network {}: {}", network_id, e);
				st.last_error = Some(e.to_string());
				Err(e)
			},
		}
	}

	/// Local rename, sent with the next save.
	pub async fn rename(&self, name: impl Into<String>) -> bool {
		let mut st = self.state.lock().await;
		if st.network_id.is_none() {
			return false;
		}
		st.store.set_name(name.into());
		true
	}

	/// Forgets the active network entirely.
	pub async fn clear(&self) {
		self.state.lock().await.reset();
	}

	pub async fn select_element(&self, element_id: Option<&str>) {
		self.state.lock().await.select_element(element_id.map(String::from));
	}

	pub async fn select_connection(&self, connection_id: Option<&str>) {
		self.state.lock().await.select_connection(connection_id.map(String::from));
	}

	pub async fn set_mode(&self, mode: EditorMode) {
		self.state.lock().await.selection.set_mode(mode);
	}

	/// Node click in the canvas. In connect mode, the second of two different
	/// nodes creates the connection between them.
	pub async fn click_node(&self, element_id: &str) -> RResult<Option<rt::NetworkConnection>> {
		let pair = self.state.lock().await.selection.click_node(element_id);
		match pair {
			Some(rt::ConnectionEndpoints { from_node, to_node }) => self.add_connection(&from_node, &to_node).await,
			None => Ok(None),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn element(id: &str, library_id: Option<&str>) -> rt::NetworkElement {
		rt::NetworkElement {
			element_id: id.into(),
			name: id.into(),
			kind: rt::DeviceType::Edfa,
			library_id: library_id.map(String::from),
			type_variety: None,
			params: Default::default(),
			metadata: Default::default(),
			ui: Default::default(),
		}
	}

	#[test]
	fn first_referenced_library_wins() {
		let els = vec![element("a", None), element("b", Some("lib-2")), element("c", Some("lib-1"))];
		assert_eq!(library_candidate(&els).as_deref(), Some("lib-2"));
		assert_eq!(library_candidate(&[element("a", None)]), None);
	}

	#[test]
	fn reset_invalidates_outstanding_tickets() {
		let mut st = EditorState::default();
		st.network_id = Some("n1".into());
		let ticket = st.seq.issue(sequence::SPAN);

		st.reset();
		assert!(st.network_id().is_none());
		assert!(!st.seq.is_latest(&ticket));
	}
}
