use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub type JsonObject = Map<String, Value>;

/// Equipment kind of a network element.
///
/// Tags the client does not know about are kept verbatim so they survive a save.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
	Transceiver,
	Fiber,
	Edfa,
	RamanFiber,
	Roadm,
	Fused,
	MultibandAmp,
	Other(String),
}
impl DeviceType {
	/// Fiber spans, including Raman-pumped ones.
	pub fn is_fiber(&self) -> bool {
		matches!(self, DeviceType::Fiber | DeviceType::RamanFiber)
	}
	pub fn as_str(&self) -> &str {
		match self {
			DeviceType::Transceiver => "Transceiver",
			DeviceType::Fiber => "Fiber",
			DeviceType::Edfa => "Edfa",
			DeviceType::RamanFiber => "RamanFiber",
			DeviceType::Roadm => "Roadm",
			DeviceType::Fused => "Fused",
			DeviceType::MultibandAmp => "Multiband Amp",
			DeviceType::Other(s) => s.as_str(),
		}
	}
}
impl From<String> for DeviceType {
	fn from(s: String) -> DeviceType {
		match s.as_str() {
			"Transceiver" => DeviceType::Transceiver,
			"Fiber" => DeviceType::Fiber,
			"Edfa" => DeviceType::Edfa,
			"RamanFiber" => DeviceType::RamanFiber,
			"Roadm" => DeviceType::Roadm,
			"Fused" => DeviceType::Fused,
			"Multiband Amp" | "Multiband-Amp" => DeviceType::MultibandAmp,
			_ => DeviceType::Other(s),
		}
	}
}
impl From<DeviceType> for String {
	fn from(dt: DeviceType) -> String {
		match dt {
			DeviceType::Other(s) => s,
			known => known.as_str().to_owned(),
		}
	}
}
impl fmt::Display for DeviceType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NetworkListItem {
	pub network_id: String,
	pub network_name: String,
	#[serde(default)]
	pub created_at: String,
	#[serde(default)]
	pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NetworkListResponse {
	#[serde(default)]
	pub networks: Vec<NetworkListItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NetworkDetail {
	pub network_id: String,
	pub network_name: String,
	#[serde(default)]
	pub created_at: String,
	#[serde(default)]
	pub updated_at: String,
	#[serde(default)]
	pub elements: Vec<NetworkElement>,
	#[serde(default)]
	pub connections: Vec<NetworkConnection>,
	#[serde(default)]
	pub services: Vec<NetworkService>,
	#[serde(rename = "SI")]
	pub si: Option<SpectrumInformation>,
	#[serde(rename = "Span")]
	pub span: Option<SpanParameters>,
	pub simulation_config: Option<SimulationConfig>,
}

/// Whole-network replacement body for `PUT /networks/{id}`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NetworkSnapshot {
	pub network_id: String,
	pub network_name: String,
	pub elements: Vec<NetworkElement>,
	pub connections: Vec<NetworkConnection>,
	pub services: Vec<NetworkService>,
	#[serde(rename = "SI")]
	pub si: Option<SpectrumInformation>,
	#[serde(rename = "Span")]
	pub span: Option<SpanParameters>,
	pub simulation_config: Option<SimulationConfig>,
}

/// Body of network create and rename calls.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NetworkName {
	pub network_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NetworkElement {
	pub element_id: String,
	pub name: String,
	#[serde(rename = "type")]
	pub kind: DeviceType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub library_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub type_variety: Option<String>,
	#[serde(default)]
	pub params: JsonObject,
	#[serde(default)]
	pub metadata: JsonObject,

	/// Editor-only state, never sent to or read from the server.
	#[serde(skip)]
	pub ui: ElementUi,
}
impl NetworkElement {
	/// `metadata.location` as an `(x, y)` pair, if both coordinates are numbers.
	pub fn location(&self) -> Option<(f64, f64)> {
		let loc = self.metadata.get("location")?.as_object()?;
		Some((loc.get("x")?.as_f64()?, loc.get("y")?.as_f64()?))
	}

	pub fn set_location(&mut self, x: f64, y: f64) {
		self.metadata.insert("location".into(), serde_json::json!({ "x": x, "y": y }));
	}

	/// Overlays every field present in `fields`; absent fields keep their value.
	pub fn apply(&mut self, fields: ElementFields) {
		let ElementFields { name, library_id, type_variety, params, metadata } = fields;
		if let Some(name) = name { self.name = name; }
		if let Some(lib) = library_id { self.library_id = Some(lib); }
		if let Some(tv) = type_variety { self.type_variety = Some(tv); }
		if let Some(params) = params { self.params = params; }
		if let Some(metadata) = metadata { self.metadata = metadata; }
	}

	/// The element as a request body: everything but the id and the UI state.
	pub fn payload(&self) -> ElementPayload {
		ElementPayload {
			name: self.name.clone(),
			kind: self.kind.clone(),
			library_id: self.library_id.clone(),
			type_variety: self.type_variety.clone(),
			params: self.params.clone(),
			metadata: self.metadata.clone(),
		}
	}
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ElementUi {
	pub selected: bool,
}

/// Body of element create/update calls.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ElementPayload {
	pub name: String,
	#[serde(rename = "type")]
	pub kind: DeviceType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub library_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub type_variety: Option<String>,
	#[serde(default)]
	pub params: JsonObject,
	#[serde(default)]
	pub metadata: JsonObject,
}
impl ElementPayload {
	pub fn new(name: impl Into<String>, kind: DeviceType) -> ElementPayload {
		ElementPayload {
			name: name.into(),
			kind,
			library_id: None,
			type_variety: None,
			params: JsonObject::new(),
			metadata: JsonObject::new(),
		}
	}
}

/// Element fields that may each be present or not: a local partial edit, or the
/// subset an update response carries. The device type is deliberately absent.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ElementFields {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub library_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub type_variety: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub params: Option<JsonObject>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub metadata: Option<JsonObject>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NetworkConnection {
	/// Always present on a well-behaved backend; see `editor` for how a missing id is handled.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub connection_id: Option<String>,
	pub from_node: String,
	pub to_node: String,
}
impl NetworkConnection {
	pub fn touches(&self, element_id: &str) -> bool {
		self.from_node == element_id || self.to_node == element_id
	}
}

/// Body of connection create/update calls, and the response of an update.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ConnectionEndpoints {
	pub from_node: String,
	pub to_node: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct TrafficRequirement {
	pub bandwidth: f64,
	pub latency: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NetworkService {
	pub service_id: String,
	pub source_element_id: String,
	pub target_element_id: String,
	pub traffic_requirement: TrafficRequirement,
	#[serde(default)]
	pub service_constraints: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewService {
	pub source_element_id: String,
	pub target_element_id: String,
	pub traffic_requirement: TrafficRequirement,
	#[serde(default)]
	pub service_constraints: Vec<Value>,
}

/// Endpoints of a service are fixed once created; only these may change.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ServiceUpdate {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub traffic_requirement: Option<TrafficRequirement>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub service_constraints: Option<Vec<Value>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpectrumInformation {
	pub f_min: f64,
	pub baud_rate: f64,
	pub f_max: f64,
	pub spacing: f64,
	pub power_dbm: f64,
	pub power_range_db: Vec<f64>,
	pub roll_off: f64,
	pub tx_osnr: f64,
	pub sys_margins: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpanParameters {
	pub power_mode: bool,
	pub delta_power_range_db: Vec<f64>,
	pub max_fiber_lineic_loss_for_raman: f64,
	pub target_extended_gain: f64,
	pub max_length: f64,
	pub length_units: String,
	pub max_loss: f64,
	pub padding: f64,
	#[serde(rename = "EOL")]
	pub eol: f64,
	pub con_in: f64,
	pub con_out: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SimulationConfig {
	pub raman_params: RamanParams,
	pub nli_params: NliParams,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RamanParams {
	pub flag: bool,
	pub result_spatial_resolution: f64,
	pub solver_spatial_resolution: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NliParams {
	pub method: String,
	pub dispersion_tolerance: f64,
	pub phase_shift_tolerance: f64,
	pub computed_channels: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeleteResponse {
	pub message: String,
}

/// A downloaded network export, kept as opaque bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedNetwork {
	pub filename: String,
	pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LibraryListItem {
	pub library_id: String,
	pub library_name: String,
	#[serde(default)]
	pub created_at: String,
	#[serde(default)]
	pub updated_at: String,
}

/// Body of library create and rename calls.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LibraryName {
	pub library_name: String,
}

/// Template collections of a library, as returned by `GET .../equipment`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct LibraryEquipment {
	#[serde(rename = "Edfa", default, skip_serializing_if = "Option::is_none")]
	pub edfa: Option<Vec<template::Edfa>>,
	#[serde(rename = "Fiber", default, skip_serializing_if = "Option::is_none")]
	pub fiber: Option<Vec<template::Fiber>>,
	#[serde(rename = "RamanFiber", default, skip_serializing_if = "Option::is_none")]
	pub raman_fiber: Option<Vec<template::RamanFiber>>,
	#[serde(rename = "Roadm", default, skip_serializing_if = "Option::is_none")]
	pub roadm: Option<Vec<template::Roadm>>,
	#[serde(rename = "Transceiver", default, skip_serializing_if = "Option::is_none")]
	pub transceiver: Option<Vec<template::Transceiver>>,
}
impl LibraryEquipment {
	/// `type_variety` names of one category, in library order.
	pub fn varieties(&self, category: EquipmentCategory) -> Vec<&str> {
		fn names<T>(list: &Option<Vec<T>>, tv: fn(&T) -> &str) -> Vec<&str> {
			list.iter().flatten().map(tv).collect()
		}
		match category {
			EquipmentCategory::Edfa => names(&self.edfa, |t| t.type_variety.as_str()),
			EquipmentCategory::Fiber => names(&self.fiber, |t| t.type_variety.as_str()),
			EquipmentCategory::RamanFiber => names(&self.raman_fiber, |t| t.fiber.type_variety.as_str()),
			EquipmentCategory::Roadm => names(&self.roadm, |t| t.type_variety.as_str()),
			EquipmentCategory::Transceiver => names(&self.transceiver, |t| t.type_variety.as_str()),
		}
	}
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EquipmentLibraryDetail {
	pub library_id: String,
	pub library_name: String,
	#[serde(default)]
	pub created_at: String,
	#[serde(default)]
	pub updated_at: String,
	#[serde(flatten)]
	pub equipment: LibraryEquipment,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipmentCategory {
	Edfa,
	Fiber,
	RamanFiber,
	Roadm,
	Transceiver,
}
impl EquipmentCategory {
	pub const ALL: [EquipmentCategory; 5] = [
		EquipmentCategory::Edfa,
		EquipmentCategory::Fiber,
		EquipmentCategory::RamanFiber,
		EquipmentCategory::Roadm,
		EquipmentCategory::Transceiver,
	];

	/// URL path segment: the capitalized category tag.
	pub fn path_segment(&self) -> &'static str {
		match self {
			EquipmentCategory::Edfa => "Edfa",
			EquipmentCategory::Fiber => "Fiber",
			EquipmentCategory::RamanFiber => "RamanFiber",
			EquipmentCategory::Roadm => "Roadm",
			EquipmentCategory::Transceiver => "Transceiver",
		}
	}
}
impl fmt::Display for EquipmentCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.path_segment())
	}
}

/// One library template of any category.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum EquipmentTemplate {
	Edfa(template::Edfa),
	Fiber(template::Fiber),
	RamanFiber(template::RamanFiber),
	Roadm(template::Roadm),
	Transceiver(template::Transceiver),
}
impl EquipmentTemplate {
	pub fn category(&self) -> EquipmentCategory {
		match self {
			EquipmentTemplate::Edfa(_) => EquipmentCategory::Edfa,
			EquipmentTemplate::Fiber(_) => EquipmentCategory::Fiber,
			EquipmentTemplate::RamanFiber(_) => EquipmentCategory::RamanFiber,
			EquipmentTemplate::Roadm(_) => EquipmentCategory::Roadm,
			EquipmentTemplate::Transceiver(_) => EquipmentCategory::Transceiver,
		}
	}

	pub fn type_variety(&self) -> &str {
		match self {
			EquipmentTemplate::Edfa(t) => &t.type_variety,
			EquipmentTemplate::Fiber(t) => &t.type_variety,
			EquipmentTemplate::RamanFiber(t) => &t.fiber.type_variety,
			EquipmentTemplate::Roadm(t) => &t.type_variety,
			EquipmentTemplate::Transceiver(t) => &t.type_variety,
		}
	}

	/// Decodes a template body; the shape is only known from its category.
	pub fn from_value(category: EquipmentCategory, value: Value) -> serde_json::Result<EquipmentTemplate> {
		Ok(match category {
			EquipmentCategory::Edfa => EquipmentTemplate::Edfa(serde_json::from_value(value)?),
			EquipmentCategory::Fiber => EquipmentTemplate::Fiber(serde_json::from_value(value)?),
			EquipmentCategory::RamanFiber => EquipmentTemplate::RamanFiber(serde_json::from_value(value)?),
			EquipmentCategory::Roadm => EquipmentTemplate::Roadm(serde_json::from_value(value)?),
			EquipmentCategory::Transceiver => EquipmentTemplate::Transceiver(serde_json::from_value(value)?),
		})
	}
}

pub mod template {
	use serde::{Deserialize, Serialize};
	use super::JsonObject;

	#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
	pub struct Edfa {
		pub type_variety: String,
		/// variable_gain, fixed_gain, dual_stage, multi_band, openroadm, ...
		pub type_def: String,
		pub allowed_for_design: bool,
		pub gain_min: f64,
		pub gain_flatmax: f64,
		pub p_max: f64,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub f_min: Option<f64>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub f_max: Option<f64>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub pmd: Option<f64>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub pdl: Option<f64>,

		// variable_gain
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub nf_min: Option<f64>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub nf_max: Option<f64>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub nf_coef: Option<Vec<f64>>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub out_voa_auto: Option<bool>,

		// fixed_gain
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub nf0: Option<f64>,

		// multi_band
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub amplifiers: Option<Vec<serde_json::Value>>,

		// dual_stage
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub preamp_variety: Option<String>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub booster_variety: Option<String>,

		#[serde(flatten)]
		pub extra: JsonObject,
	}

	#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
	pub struct FrequencyTable {
		pub value: Vec<f64>,
		pub frequency: Vec<f64>,
	}

	#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
	pub struct LumpedLoss {
		pub position: f64,
		pub loss: f64,
	}

	#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
	pub struct RamanCoefficient {
		pub reference_frequency: f64,
		pub g_0: f64,
	}

	#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
	pub struct Fiber {
		pub type_variety: String,
		pub dispersion: f64,
		pub effective_area: f64,
		pub pmd_coef: f64,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub dispersion_slope: Option<f64>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub dispersion_per_frequency: Option<FrequencyTable>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub gamma: Option<f64>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub lumped_losses: Option<Vec<LumpedLoss>>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub raman_coefficient: Option<RamanCoefficient>,

		#[serde(flatten)]
		pub extra: JsonObject,
	}

	#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
	#[serde(rename_all = "lowercase")]
	pub enum PumpDirection {
		Coprop,
		Counterprop,
	}

	#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
	pub struct RamanPump {
		pub power: f64,
		pub frequency: f64,
		pub propagation_direction: PumpDirection,
	}

	/// A fiber template with Raman pumping on top.
	#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
	pub struct RamanFiber {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub raman_pumps: Option<Vec<RamanPump>>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub temperature: Option<f64>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub loss_coef: Option<FrequencyTable>,

		#[serde(flatten)]
		pub fiber: Fiber,
	}

	#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
	pub struct RoadmRestrictions {
		pub preamp_variety_list: Vec<String>,
		pub booster_variety_list: Vec<String>,
	}

	#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
	pub struct Roadm {
		pub type_variety: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub target_pch_out_db: Option<f64>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub add_drop_osnr: Option<f64>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub pmd: Option<f64>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub pdl: Option<f64>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub restrictions: Option<RoadmRestrictions>,

		#[serde(flatten)]
		pub extra: JsonObject,
	}

	#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
	pub struct Penalty {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub chromatic_dispersion: Option<f64>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub pmd: Option<f64>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub pdl: Option<f64>,
		pub penalty_value: f64,
	}

	#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
	pub struct TransceiverMode {
		pub format: String,
		pub baud_rate: f64,
		#[serde(rename = "OSNR")]
		pub osnr: f64,
		pub bit_rate: f64,
		pub roll_off: Option<f64>,
		pub tx_osnr: f64,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub penalties: Option<Vec<Penalty>>,
		pub min_spacing: f64,
		pub cost: f64,
	}

	#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
	pub struct FrequencyRange {
		pub min: f64,
		pub max: f64,
	}

	#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
	pub struct Transceiver {
		pub type_variety: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub frequency: Option<FrequencyRange>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		pub mode: Option<Vec<TransceiverMode>>,

		#[serde(flatten)]
		pub extra: JsonObject,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn device_type_wire_names() {
		let dt: DeviceType = serde_json::from_value(json!("Multiband-Amp")).unwrap();
		assert_eq!(dt, DeviceType::MultibandAmp);
		assert_eq!(serde_json::to_value(&dt).unwrap(), json!("Multiband Amp"));

		let odd: DeviceType = serde_json::from_value(json!("Transponder")).unwrap();
		assert_eq!(odd, DeviceType::Other("Transponder".into()));
		assert_eq!(serde_json::to_value(&odd).unwrap(), json!("Transponder"));
		assert!(!odd.is_fiber());
		assert!(DeviceType::RamanFiber.is_fiber());
	}

	#[test]
	fn element_ui_state_is_not_serialized() {
		let mut el: NetworkElement = serde_json::from_value(json!({
			"element_id": "e1",
			"name": "amp",
			"type": "Edfa",
			"metadata": { "location": { "x": 4.0, "y": -2.5 } },
		})).unwrap();
		el.ui.selected = true;
		assert_eq!(el.location(), Some((4.0, -2.5)));

		let out = serde_json::to_value(&el).unwrap();
		assert!(out.get("ui").is_none());
		assert_eq!(out["type"], json!("Edfa"));
	}

	#[test]
	fn network_detail_singleton_keys() {
		let detail: NetworkDetail = serde_json::from_value(json!({
			"network_id": "n1",
			"network_name": "Ring",
			"elements": [],
			"connections": [{ "from_node": "a", "to_node": "b" }],
			"services": [],
			"SI": null,
			"Span": null,
			"simulation_config": null,
		})).unwrap();
		assert_eq!(detail.connections[0].connection_id, None);
		assert!(detail.si.is_none());
	}

	#[test]
	fn raman_fiber_template_flattens_fiber_fields() {
		let value = json!({
			"type_variety": "SSMF-raman",
			"dispersion": 1.67e-05,
			"effective_area": 83e-12,
			"pmd_coef": 1.265e-15,
			"temperature": 283,
			"raman_pumps": [{ "power": 0.2, "frequency": 205e12, "propagation_direction": "counterprop" }],
		});
		let tpl = EquipmentTemplate::from_value(EquipmentCategory::RamanFiber, value).unwrap();
		assert_eq!(tpl.type_variety(), "SSMF-raman");
		assert_eq!(tpl.category(), EquipmentCategory::RamanFiber);
		match tpl {
			EquipmentTemplate::RamanFiber(rf) => {
				assert_eq!(rf.temperature, Some(283.0));
				assert_eq!(rf.raman_pumps.unwrap()[0].propagation_direction, template::PumpDirection::Counterprop);
			},
			other => panic!("unexpected template {:?}", other),
		}
	}

	#[test]
	fn library_detail_flattens_categories() {
		let lib: EquipmentLibraryDetail = serde_json::from_value(json!({
			"library_id": "lib",
			"library_name": "default",
			"Roadm": [{ "type_variety": "default", "target_pch_out_db": -20 }],
		})).unwrap();
		assert_eq!(lib.equipment.varieties(EquipmentCategory::Roadm), vec!["default"]);
		assert!(lib.equipment.varieties(EquipmentCategory::Edfa).is_empty());
	}
}
