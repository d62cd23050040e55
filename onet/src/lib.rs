pub mod api;
pub mod editor;
pub mod lists;
pub mod notify;
pub mod rest_types;
pub mod rest;

pub use rest_types as rt;

pub const ENV_API_BASE: &str = "ONET_API_BASE";
pub const ENV_INSECURE: &str = "ONET_INSECURE";

/// Where the planning service lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
	/// Base URL every endpoint is appended to, e.g. `http://localhost:8000/api`
	pub api_base: String,
	/// Accept self-signed or otherwise invalid TLS certificates
	pub accept_invalid_certs: bool,
}
impl ClientConfig {
	pub fn new(api_base: impl Into<String>) -> ClientConfig {
		ClientConfig {
			api_base: api_base.into(),
			accept_invalid_certs: false,
		}
	}

	pub fn connect(&self) -> rest::RResult<rest::ApiClient> {
		rest::ApiClient::new(self)
	}
}

fn parse_flag(value: &str) -> Option<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" | "" => Some(false),
		_ => None,
	}
}

/// Used to get the client configuration from environment variables (ONET_API_BASE, ONET_INSECURE)
pub fn get_config_env() -> Result<ClientConfig, String> {
	let api_base = std::env::var(ENV_API_BASE)
		.map_err(|_| format!("Missing or invalid environment variable `{}`", ENV_API_BASE))?;
	if api_base.trim().is_empty() {
		return Err(format!("Environment variable `{}` is empty", ENV_API_BASE));
	}

	let accept_invalid_certs = match std::env::var(ENV_INSECURE) {
		Err(_) => false,
		Ok(v) => parse_flag(&v)
			.ok_or_else(|| format!("Environment variable `{}` must be a boolean, got {:?}", ENV_INSECURE, v))?,
	};

	Ok(ClientConfig {
		api_base: api_base.trim().to_owned(),
		accept_invalid_certs,
	})
}
