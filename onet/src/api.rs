//! Resource clients for the two REST resources the service exposes.
//!
//! `rest::ApiClient` implements both traits over HTTP. The editor and the list
//! caches only depend on the traits, so they can run against any backend.

use async_trait::async_trait;
use serde_json::Value;

use crate::rest::RResult;
use crate::rest_types as rt;

#[async_trait]
pub trait NetworkApi: Send + Sync {
	async fn fetch_networks(&self) -> RResult<Vec<rt::NetworkListItem>>;
	async fn fetch_network(&self, network_id: &str) -> RResult<rt::NetworkDetail>;
	async fn create_network(&self, payload: &rt::NetworkName) -> RResult<rt::NetworkListItem>;
	/// Renames a network.
	async fn update_network(&self, network_id: &str, payload: &rt::NetworkName) -> RResult<rt::NetworkListItem>;
	/// Replaces the whole network with `snapshot`.
	async fn replace_network(&self, network_id: &str, snapshot: &rt::NetworkSnapshot) -> RResult<rt::NetworkListItem>;
	/// `Ok(None)` when the server acknowledged with an empty body.
	async fn delete_network(&self, network_id: &str) -> RResult<Option<rt::DeleteResponse>>;

	async fn export_network(&self, network_id: &str) -> RResult<rt::ExportedNetwork>;
	async fn import_network(&self, filename: &str, bytes: Vec<u8>) -> RResult<Value>;
	/// Imports a topology file into an existing network.
	async fn insert_topology(&self, network_id: &str, filename: &str, bytes: Vec<u8>) -> RResult<Value>;

	async fn create_element(&self, network_id: &str, payload: &rt::ElementPayload) -> RResult<rt::NetworkElement>;
	async fn update_element(&self, network_id: &str, element_id: &str, payload: &rt::ElementPayload) -> RResult<rt::ElementFields>;
	async fn delete_element(&self, network_id: &str, element_id: &str) -> RResult<Option<rt::DeleteResponse>>;

	async fn create_connection(&self, network_id: &str, payload: &rt::ConnectionEndpoints) -> RResult<rt::NetworkConnection>;
	async fn update_connection(&self, network_id: &str, connection_id: &str, payload: &rt::ConnectionEndpoints) -> RResult<rt::ConnectionEndpoints>;
	async fn delete_connection(&self, network_id: &str, connection_id: &str) -> RResult<Option<rt::DeleteResponse>>;

	async fn create_service(&self, network_id: &str, payload: &rt::NewService) -> RResult<rt::NetworkService>;
	async fn update_service(&self, network_id: &str, service_id: &str, payload: &rt::ServiceUpdate) -> RResult<rt::NetworkService>;
	async fn delete_service(&self, network_id: &str, service_id: &str) -> RResult<Option<rt::DeleteResponse>>;

	async fn update_spectrum_information(&self, network_id: &str, si: &rt::SpectrumInformation) -> RResult<rt::SpectrumInformation>;
	async fn update_span_parameters(&self, network_id: &str, span: &rt::SpanParameters) -> RResult<rt::SpanParameters>;
	async fn update_simulation_config(&self, network_id: &str, config: &rt::SimulationConfig) -> RResult<rt::SimulationConfig>;

	/// Starts a simulation. The payload and result are passed through untouched.
	async fn run_simulation(&self, network_id: &str, payload: &Value) -> RResult<Value>;
}

#[async_trait]
pub trait LibraryApi: Send + Sync {
	async fn fetch_libraries(&self) -> RResult<Vec<rt::LibraryListItem>>;
	async fn fetch_library_equipment(&self, library_id: &str) -> RResult<rt::LibraryEquipment>;
	async fn create_library(&self, payload: &rt::LibraryName) -> RResult<rt::LibraryListItem>;
	async fn update_library(&self, library_id: &str, payload: &rt::LibraryName) -> RResult<rt::LibraryListItem>;
	async fn delete_library(&self, library_id: &str) -> RResult<Option<rt::DeleteResponse>>;

	async fn add_equipment(&self, library_id: &str, template: &rt::EquipmentTemplate) -> RResult<rt::EquipmentTemplate>;
	/// Replaces the template `type_variety` of the template's category.
	async fn update_equipment(&self, library_id: &str, type_variety: &str, template: &rt::EquipmentTemplate) -> RResult<rt::EquipmentTemplate>;
	async fn delete_equipment(&self, library_id: &str, category: rt::EquipmentCategory, type_variety: &str) -> RResult<Option<rt::DeleteResponse>>;
}
