use crate::rest_types::ConnectionEndpoints;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
	#[default]
	View,
	/// Clicking two nodes in a row links them
	Connect,
	EditParams,
}

/// Scratch pair collected while in [`EditorMode::Connect`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingConnection {
	pub source: Option<String>,
	pub target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
	element: Option<String>,
	connection: Option<String>,
	mode: EditorMode,
	pending: PendingConnection,
}

impl Selection {
	pub fn element(&self) -> Option<&str> { self.element.as_deref() }
	pub fn connection(&self) -> Option<&str> { self.connection.as_deref() }
	pub fn mode(&self) -> EditorMode { self.mode }
	pub fn pending(&self) -> &PendingConnection { &self.pending }

	pub fn select_element(&mut self, id: Option<String>) {
		match id {
			Some(id) => {
				self.element = Some(id);
				self.connection = None;
				if self.mode != EditorMode::Connect {
					self.mode = EditorMode::EditParams;
				}
			},
			None => {
				self.element = None;
				if self.mode == EditorMode::EditParams {
					self.mode = EditorMode::View;
				}
			},
		}
	}

	/// Any connection selection, including none, drops the element selection.
	pub fn select_connection(&mut self, id: Option<String>) {
		self.element = None;
		self.connection = id;
	}

	pub fn set_mode(&mut self, mode: EditorMode) {
		self.mode = mode;
		if mode != EditorMode::Connect {
			self.pending = PendingConnection::default();
		}
	}

	/// Feeds a node click to the connect gesture. Returns the completed pair once a
	/// second, different node is clicked.
	pub fn click_node(&mut self, id: &str) -> Option<ConnectionEndpoints> {
		if self.mode != EditorMode::Connect {
			return None;
		}

		match self.pending.source.take() {
			None => {
				self.pending.source = Some(id.to_owned());
				None
			},
			Some(source) if source == id => None,
			Some(source) => {
				self.pending.target = Some(id.to_owned());
				let pair = ConnectionEndpoints { from_node: source, to_node: id.to_owned() };
				self.pending = PendingConnection::default();
				Some(pair)
			},
		}
	}

	/// Drops every reference to an element that no longer exists.
	pub(crate) fn forget_element(&mut self, id: &str) {
		if self.element.as_deref() == Some(id) {
			self.select_element(None);
		}
		if self.pending.source.as_deref() == Some(id) {
			self.pending.source = None;
		}
	}

	pub(crate) fn forget_connection(&mut self, id: &str) {
		if self.connection.as_deref() == Some(id) {
			self.connection = None;
		}
	}
}
