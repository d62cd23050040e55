use std::sync::OnceLock;

use async_trait::async_trait;
use log::{debug, error, trace};
use regex::Regex;
use reqwest::{Client, Method, RequestBuilder, Response};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::ClientConfig;
use crate::api::{LibraryApi, NetworkApi};
use crate::notify::{Notice, Notifier};
use crate::rest_types as rt;

pub type RResult<T> = Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("unable to reach the server")]
	Network(#[from] reqwest::Error),
	#[error(transparent)]
	Response(#[from] ApiError),
	#[error("unable to (de)serialize JSON")]
	Serialization(#[from] serde_json::Error),
	/// The server returned data the client cannot safely work with.
	#[error("inconsistent network data: {0}")]
	Integrity(String),
	/// Connections that still referenced an element could not all be removed.
	#[error("unable to remove connections {failed:?} attached to element {element_id}")]
	Cascade {
		element_id: String,
		failed: Vec<String>,
	},
}
impl Error {
	/// HTTP status of a server-reported error.
	pub fn status(&self) -> Option<u16> {
		match self {
			Error::Response(e) => Some(e.status),
			_ => None,
		}
	}
}

#[derive(Debug, Error)]
#[error("{method} {endpoint} -> {status}: {error_type}")]
pub struct ApiError {
	method: String,
	endpoint: String,
	status: u16,
	error_type: ApiErrorType,
}
impl ApiError {
	fn new(method: &Method, endpoint: impl Into<String>, status: u16, error_type: ApiErrorType) -> ApiError {
		ApiError {
			method: method.to_string(),
			endpoint: endpoint.into(),
			status,
			error_type,
		}
	}

	/// A server-reported failure carrying the user-facing message of the error body.
	pub fn server(method: &str, endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> ApiError {
		ApiError {
			method: method.to_owned(),
			endpoint: endpoint.into(),
			status,
			error_type: ApiErrorType::BadResponse { message: message.into(), body: String::new() },
		}
	}

	pub fn endpoint(&self) -> &str { &self.endpoint }
	pub fn status(&self) -> u16 { self.status }

	pub fn message(&self) -> &str {
		match &self.error_type {
			ApiErrorType::BadResponse { message, .. } => message,
			ApiErrorType::JsonDecode { .. } => "Unable to read JSON response as a proper type",
			ApiErrorType::Unknown(s) => s,
		}
	}
}

#[derive(Debug, Error)]
enum ApiErrorType {
	/// Catch-all
	#[error("{0}")]
	Unknown(String),

	/// Non-2xx response. `message` is what the user gets to see.
	#[error("{message}")]
	BadResponse { message: String, body: String },

	/// A 2xx body that does not match the expected type.
	#[error("unable to decode response ({source}): {body}")]
	JsonDecode { body: String, source: serde_json::Error },
}

#[derive(Debug, Clone, PartialEq)]
enum RawApiResponse {
	None,
	PlainText(String),
	Json(Value),
}
impl RawApiResponse {
	async fn extract(resp: Response) -> RResult<(u16, RawApiResponse)> {
		let status = resp.status().as_u16();
		let content_type = resp.headers()
			.get(header::CONTENT_TYPE)
			.and_then(|ct| ct.to_str().ok())
			.map(|ct| ct.to_ascii_lowercase());
		let text = resp.text().await?;

		if text.is_empty() {
			return Ok((status, RawApiResponse::None));
		}
		let raw = match content_type {
			Some(ct) if ct.starts_with("application/json") => match serde_json::from_str::<Value>(&text) {
				Ok(v) => RawApiResponse::Json(v),
				// error pages sometimes claim to be JSON
				Err(_) => RawApiResponse::PlainText(text),
			},
			_ => RawApiResponse::PlainText(text),
		};
		Ok((status, raw))
	}

	fn body_string(&self) -> String {
		match self {
			RawApiResponse::None => String::new(),
			RawApiResponse::PlainText(s) => s.clone(),
			RawApiResponse::Json(v) => v.to_string(),
		}
	}
}

/// The user-facing message of an error body: its `message` or `detail` string.
fn error_message(raw: &RawApiResponse) -> String {
	if let RawApiResponse::Json(Value::Object(body)) = raw {
		let msg = body.get("message")
			.and_then(Value::as_str)
			.or_else(|| body.get("detail").and_then(Value::as_str));
		if let Some(msg) = msg {
			return msg.to_owned();
		}
	}
	"Request failed".to_owned()
}

/// Filename of an export download: taken from an attachment `content-disposition`,
/// or `network-{id}-export.json` when there is none.
pub fn export_filename(disposition: Option<&str>, network_id: &str) -> String {
	static FILENAME: OnceLock<Regex> = OnceLock::new();
	let re = FILENAME.get_or_init(|| {
		Regex::new(r#"filename[^;=\n]*=("[^"]*"|'[^']*'|[^;\n]*)"#).expect("filename pattern is valid")
	});

	disposition
		.filter(|d| d.contains("attachment"))
		.and_then(|d| re.captures(d))
		.and_then(|caps| caps.get(1))
		.map(|m| m.as_str().replace(|c: char| c == '"' || c == '\'', ""))
		.map(|name| name.trim().to_owned())
		.filter(|name| !name.is_empty())
		.unwrap_or_else(|| format!("network-{}-export.json", network_id))
}

fn get_api_client(config: &ClientConfig) -> RResult<Client> {
	let mut hm = HeaderMap::new();
	hm.append(header::ACCEPT, HeaderValue::from_static("application/json"));

	Client::builder()
		.danger_accept_invalid_certs(config.accept_invalid_certs)
		.default_headers(hm)
		.build()
		.map_err(Error::Network)
}

/// HTTP access to the planning service.
///
/// Every non-2xx response is logged and published as a [`Notice`] before the
/// error is handed back to the caller.
#[derive(Debug, Clone)]
pub struct ApiClient {
	client: Client,
	base: String,
	notifier: Notifier,
}

impl ApiClient {
	pub fn new(config: &ClientConfig) -> RResult<ApiClient> {
		Ok(ApiClient {
			client: get_api_client(config)?,
			base: config.api_base.trim_end_matches('/').to_owned(),
			notifier: Notifier::new(),
		})
	}

	/// Publishes through `notifier` instead of a private channel.
	pub fn with_notifier(mut self, notifier: Notifier) -> ApiClient {
		self.notifier = notifier;
		self
	}

	pub fn notifier(&self) -> &Notifier {
		&self.notifier
	}

	pub fn base_url(&self) -> &str {
		&self.base
	}

	fn request<D: std::fmt::Display>(&self, method: Method, endpoint: D) -> RequestBuilder {
		self.client.request(method, format!("{}{}", self.base, endpoint).as_str())
	}

	fn report(&self, err: Error) -> Error {
		match &err {
			Error::Response(api) => {
				let body = match &api.error_type {
					ApiErrorType::BadResponse { body, .. } => body.as_str(),
					_ => "",
				};
				error!("API Error: {} {} {} {}", api.method, api.endpoint, api.status, body);
				self.notifier.publish(Notice::error(format!("API Error {}: {}", api.status, api.message())));
			},
			Error::Network(e) => {
				error!("Request failed: {}", e);
				self.notifier.publish(Notice::error(format!("Request failed: {}", e)));
			},
			_ => {},
		}
		err
	}

	/// Sends the request and splits the response into success body or reported error.
	async fn execute(&self, method: Method, endpoint: &str, rb: RequestBuilder) -> RResult<RawApiResponse> {
		trace!("{} {}", method, endpoint);
		let resp = rb.send().await.map_err(|e| self.report(Error::Network(e)))?;
		let (status, raw) = RawApiResponse::extract(resp).await.map_err(|e| self.report(e))?;
		debug!("{} {} -> {}", method, endpoint, status);

		if (200..300).contains(&status) {
			Ok(raw)
		} else {
			let error_type = ApiErrorType::BadResponse {
				message: error_message(&raw),
				body: raw.body_string(),
			};
			Err(self.report(ApiError::new(&method, endpoint, status, error_type).into()))
		}
	}

	fn decode<T: DeserializeOwned>(method: &Method, endpoint: &str, raw: RawApiResponse) -> RResult<T> {
		let value = match raw {
			RawApiResponse::Json(j) => j,
			RawApiResponse::None => Value::Null,
			RawApiResponse::PlainText(s) => Value::String(s),
		};
		serde_json::from_value::<T>(value.clone())
			.map_err(|source| ApiError::new(method, endpoint, 200, ApiErrorType::JsonDecode { body: value.to_string(), source }).into())
	}

	async fn get<T: DeserializeOwned>(&self, endpoint: String) -> RResult<T> {
		let raw = self.execute(Method::GET, &endpoint, self.request(Method::GET, &endpoint)).await?;
		Self::decode(&Method::GET, &endpoint, raw)
	}

	async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, method: Method, endpoint: String, body: &B) -> RResult<T> {
		let rb = self.request(method.clone(), &endpoint).json(body);
		let raw = self.execute(method.clone(), &endpoint, rb).await?;
		Self::decode(&method, &endpoint, raw)
	}

	async fn delete<T: DeserializeOwned>(&self, endpoint: String) -> RResult<Option<T>> {
		let raw = self.execute(Method::DELETE, &endpoint, self.request(Method::DELETE, &endpoint)).await?;
		Ok(Self::delete_ack(&endpoint, raw))
	}

	/// A delete that reached here succeeded; the body is only informational.
	fn delete_ack<T: DeserializeOwned>(endpoint: &str, raw: RawApiResponse) -> Option<T> {
		match raw {
			RawApiResponse::None => None,
			raw => match Self::decode(&Method::DELETE, endpoint, raw) {
				Ok(ack) => Some(ack),
				Err(e) => {
					debug!("ignoring unexpected delete acknowledgement: {}", e);
					None
				},
			},
		}
	}

	async fn upload(&self, endpoint: String, filename: &str, bytes: Vec<u8>) -> RResult<Value> {
		let form = Form::new().part("file", Part::bytes(bytes).file_name(filename.to_owned()));
		let rb = self.request(Method::POST, &endpoint).multipart(form);
		let raw = self.execute(Method::POST, &endpoint, rb).await?;
		Self::decode(&Method::POST, &endpoint, raw)
	}
}

#[async_trait]
impl NetworkApi for ApiClient {
	async fn fetch_networks(&self) -> RResult<Vec<rt::NetworkListItem>> {
		let resp: rt::NetworkListResponse = self.get("/networks".into()).await?;
		Ok(resp.networks)
	}

	async fn fetch_network(&self, network_id: &str) -> RResult<rt::NetworkDetail> {
		self.get(format!("/networks/{}", network_id)).await
	}

	async fn create_network(&self, payload: &rt::NetworkName) -> RResult<rt::NetworkListItem> {
		self.send_json(Method::POST, "/networks".into(), payload).await
	}

	async fn update_network(&self, network_id: &str, payload: &rt::NetworkName) -> RResult<rt::NetworkListItem> {
		self.send_json(Method::PUT, format!("/networks/{}", network_id), payload).await
	}

	async fn replace_network(&self, network_id: &str, snapshot: &rt::NetworkSnapshot) -> RResult<rt::NetworkListItem> {
		self.send_json(Method::PUT, format!("/networks/{}", network_id), snapshot).await
	}

	async fn delete_network(&self, network_id: &str) -> RResult<Option<rt::DeleteResponse>> {
		self.delete(format!("/networks/{}", network_id)).await
	}

	async fn export_network(&self, network_id: &str) -> RResult<rt::ExportedNetwork> {
		let endpoint = format!("/networks/{}/export", network_id);
		trace!("GET {}", endpoint);
		let resp = self.request(Method::GET, &endpoint)
			.send().await
			.map_err(|e| self.report(Error::Network(e)))?;

		let status = resp.status().as_u16();
		if !(200..300).contains(&status) {
			let (_, raw) = RawApiResponse::extract(resp).await.map_err(|e| self.report(e))?;
			let error_type = ApiErrorType::BadResponse { message: error_message(&raw), body: raw.body_string() };
			return Err(self.report(ApiError::new(&Method::GET, endpoint, status, error_type).into()));
		}

		let disposition = resp.headers()
			.get(header::CONTENT_DISPOSITION)
			.and_then(|d| d.to_str().ok())
			.map(str::to_owned);
		let bytes = resp.bytes().await.map_err(|e| self.report(Error::Network(e)))?;
		if bytes.is_empty() {
			let error_type = ApiErrorType::Unknown("No data received".into());
			return Err(self.report(ApiError::new(&Method::GET, endpoint, status, error_type).into()));
		}

		Ok(rt::ExportedNetwork {
			filename: export_filename(disposition.as_deref(), network_id),
			bytes: bytes.to_vec(),
		})
	}

	async fn import_network(&self, filename: &str, bytes: Vec<u8>) -> RResult<Value> {
		self.upload("/networks/import".into(), filename, bytes).await
	}

	async fn insert_topology(&self, network_id: &str, filename: &str, bytes: Vec<u8>) -> RResult<Value> {
		self.upload(format!("/networks/{}/import", network_id), filename, bytes).await
	}

	async fn create_element(&self, network_id: &str, payload: &rt::ElementPayload) -> RResult<rt::NetworkElement> {
		self.send_json(Method::POST, format!("/networks/{}/elements", network_id), payload).await
	}

	async fn update_element(&self, network_id: &str, element_id: &str, payload: &rt::ElementPayload) -> RResult<rt::ElementFields> {
		self.send_json(Method::PUT, format!("/networks/{}/elements/{}", network_id, element_id), payload).await
	}

	async fn delete_element(&self, network_id: &str, element_id: &str) -> RResult<Option<rt::DeleteResponse>> {
		self.delete(format!("/networks/{}/elements/{}", network_id, element_id)).await
	}

	async fn create_connection(&self, network_id: &str, payload: &rt::ConnectionEndpoints) -> RResult<rt::NetworkConnection> {
		self.send_json(Method::POST, format!("/networks/{}/connections", network_id), payload).await
	}

	async fn update_connection(&self, network_id: &str, connection_id: &str, payload: &rt::ConnectionEndpoints) -> RResult<rt::ConnectionEndpoints> {
		self.send_json(Method::PUT, format!("/networks/{}/connections/{}", network_id, connection_id), payload).await
	}

	async fn delete_connection(&self, network_id: &str, connection_id: &str) -> RResult<Option<rt::DeleteResponse>> {
		self.delete(format!("/networks/{}/connections/{}", network_id, connection_id)).await
	}

	async fn create_service(&self, network_id: &str, payload: &rt::NewService) -> RResult<rt::NetworkService> {
		self.send_json(Method::POST, format!("/networks/{}/services", network_id), payload).await
	}

	async fn update_service(&self, network_id: &str, service_id: &str, payload: &rt::ServiceUpdate) -> RResult<rt::NetworkService> {
		self.send_json(Method::PUT, format!("/networks/{}/services/{}", network_id, service_id), payload).await
	}

	async fn delete_service(&self, network_id: &str, service_id: &str) -> RResult<Option<rt::DeleteResponse>> {
		self.delete(format!("/networks/{}/services/{}", network_id, service_id)).await
	}

	async fn update_spectrum_information(&self, network_id: &str, si: &rt::SpectrumInformation) -> RResult<rt::SpectrumInformation> {
		self.send_json(Method::PUT, format!("/networks/{}/spectrum-information", network_id), si).await
	}

	async fn update_span_parameters(&self, network_id: &str, span: &rt::SpanParameters) -> RResult<rt::SpanParameters> {
		self.send_json(Method::PUT, format!("/networks/{}/span-parameters", network_id), span).await
	}

	async fn update_simulation_config(&self, network_id: &str, config: &rt::SimulationConfig) -> RResult<rt::SimulationConfig> {
		self.send_json(Method::PUT, format!("/networks/{}/simulation-config", network_id), config).await
	}

	async fn run_simulation(&self, network_id: &str, payload: &Value) -> RResult<Value> {
		self.send_json(Method::POST, format!("/networks/{}/simulate", network_id), payload).await
	}
}

fn equipment_path(library_id: &str, category: rt::EquipmentCategory) -> String {
	format!("/equipment-libraries/{}/equipment/{}", library_id, category.path_segment())
}

#[async_trait]
impl LibraryApi for ApiClient {
	async fn fetch_libraries(&self) -> RResult<Vec<rt::LibraryListItem>> {
		self.get("/equipment-libraries".into()).await
	}

	async fn fetch_library_equipment(&self, library_id: &str) -> RResult<rt::LibraryEquipment> {
		self.get(format!("/equipment-libraries/{}/equipment", library_id)).await
	}

	async fn create_library(&self, payload: &rt::LibraryName) -> RResult<rt::LibraryListItem> {
		self.send_json(Method::POST, "/equipment-libraries".into(), payload).await
	}

	async fn update_library(&self, library_id: &str, payload: &rt::LibraryName) -> RResult<rt::LibraryListItem> {
		self.send_json(Method::PUT, format!("/equipment-libraries/{}", library_id), payload).await
	}

	async fn delete_library(&self, library_id: &str) -> RResult<Option<rt::DeleteResponse>> {
		self.delete(format!("/equipment-libraries/{}", library_id)).await
	}

	async fn add_equipment(&self, library_id: &str, template: &rt::EquipmentTemplate) -> RResult<rt::EquipmentTemplate> {
		let category = template.category();
		let value: Value = self.send_json(Method::POST, equipment_path(library_id, category), template).await?;
		Ok(rt::EquipmentTemplate::from_value(category, value)?)
	}

	async fn update_equipment(&self, library_id: &str, type_variety: &str, template: &rt::EquipmentTemplate) -> RResult<rt::EquipmentTemplate> {
		let category = template.category();
		let endpoint = format!("{}/{}", equipment_path(library_id, category), urlencoding::encode(type_variety));
		let value: Value = self.send_json(Method::PUT, endpoint, template).await?;
		Ok(rt::EquipmentTemplate::from_value(category, value)?)
	}

	async fn delete_equipment(&self, library_id: &str, category: rt::EquipmentCategory, type_variety: &str) -> RResult<Option<rt::DeleteResponse>> {
		self.delete(format!("{}/{}", equipment_path(library_id, category), urlencoding::encode(type_variety))).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn error_message_prefers_message_then_detail() {
		let raw = RawApiResponse::Json(json!({ "message": "Network not found", "detail": "ignored" }));
		assert_eq!(error_message(&raw), "Network not found");

		let raw = RawApiResponse::Json(json!({ "detail": "Element type cannot change" }));
		assert_eq!(error_message(&raw), "Element type cannot change");

		// validation errors carry a list in `detail`
		let raw = RawApiResponse::Json(json!({ "detail": [{ "loc": ["body"], "msg": "field required" }] }));
		assert_eq!(error_message(&raw), "Request failed");

		assert_eq!(error_message(&RawApiResponse::PlainText("Bad Gateway".into())), "Request failed");
		assert_eq!(error_message(&RawApiResponse::None), "Request failed");
	}

	#[test]
	fn export_filename_from_attachment_header() {
		assert_eq!(export_filename(Some(r#"attachment; filename="ring.json""#), "n1"), "ring.json");
		assert_eq!(export_filename(Some("attachment; filename=mesh-export.json"), "n1"), "mesh-export.json");
		assert_eq!(export_filename(Some("attachment; filename='quoted.json'; size=42"), "n1"), "quoted.json");
	}

	#[test]
	fn export_filename_falls_back_to_default() {
		assert_eq!(export_filename(None, "n7"), "network-n7-export.json");
		assert_eq!(export_filename(Some(r#"inline; filename="shown.json""#), "n7"), "network-n7-export.json");
		assert_eq!(export_filename(Some("attachment"), "n7"), "network-n7-export.json");
	}

	#[test]
	fn equipment_paths_encode_type_variety() {
		let base = equipment_path("lib1", rt::EquipmentCategory::RamanFiber);
		assert_eq!(base, "/equipment-libraries/lib1/equipment/RamanFiber");
		assert_eq!(format!("{}/{}", base, urlencoding::encode("SSMF raman/v2")), "/equipment-libraries/lib1/equipment/RamanFiber/SSMF%20raman%2Fv2");
	}

	#[test]
	fn decode_reports_mismatched_body() {
		let raw = RawApiResponse::Json(json!({ "unexpected": true }));
		let err = ApiClient::decode::<rt::NetworkListItem>(&Method::GET, "/networks/n1", raw).unwrap_err();
		match err {
			Error::Response(api) => {
				assert_eq!(api.endpoint(), "/networks/n1");
				assert_eq!(api.message(), "Unable to read JSON response as a proper type");
			},
			other => panic!("unexpected error {:?}", other),
		}
	}

	#[test]
	fn any_successful_delete_body_is_accepted() {
		let ack = ApiClient::delete_ack::<rt::DeleteResponse>("/networks/n1/elements/t1", RawApiResponse::PlainText("Deleted".into()));
		assert_eq!(ack, None);

		let raw = RawApiResponse::Json(json!({ "status": "deleted" }));
		assert_eq!(ApiClient::delete_ack::<rt::DeleteResponse>("/networks/n1/connections/c1", raw), None);

		assert_eq!(ApiClient::delete_ack::<rt::DeleteResponse>("/networks/n1", RawApiResponse::None), None);

		let raw = RawApiResponse::Json(json!({ "message": "gone" }));
		let ack = ApiClient::delete_ack::<rt::DeleteResponse>("/networks/n1", raw).unwrap();
		assert_eq!(ack.message, "gone");
	}

	#[test]
	fn server_errors_expose_status() {
		let err: Error = ApiError::server("PUT", "/networks/n1", 409, "conflict").into();
		assert_eq!(err.status(), Some(409));
		assert_eq!(err.to_string(), "PUT /networks/n1 -> 409: conflict");
	}
}
