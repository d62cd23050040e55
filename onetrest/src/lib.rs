use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use serde_json::Value;

use onet::api::{LibraryApi, NetworkApi};
use onet::editor::NetworkEditor;
use onet::lists::{LibraryList, NetworkList};
use onet::rest::ApiClient;
use onet::rt;

#[derive(Parser)]
#[command(version, about)]
pub struct Args {
	/// Emit the raw JSON response
	#[arg(short)]
	json: bool,

	#[command(subcommand)]
	rootsubcmd: SubCmdRoot,
}
impl Args {
	pub async fn handle(&self, client: &ApiClient) -> Result<()> {
		match &self.rootsubcmd {
			SubCmdRoot::Networks => networks(self, client).await,
			SubCmdRoot::Network(NetworkID { network_id }) => network(self, client, network_id.trim()).await,
			SubCmdRoot::CreateNetwork { name } => {
				let created = client.create_network(&rt::NetworkName { network_name: name.clone() }).await?;
				print_item(self, &created, || format!("Created network {} ({})", created.network_name, created.network_id))
			},
			SubCmdRoot::RenameNetwork { network_id, name } => {
				let renamed = client.update_network(network_id, &rt::NetworkName { network_name: name.clone() }).await?;
				print_item(self, &renamed, || format!("Network {} is now \"{}\"", renamed.network_id, renamed.network_name))
			},
			SubCmdRoot::DeleteNetwork(NetworkID { network_id }) => {
				let resp = client.delete_network(network_id).await?;
				print_deleted(self, resp, || format!("Deleted network {}", network_id))
			},
			SubCmdRoot::Export { network_id, out_dir } => {
				let exported = client.export_network(network_id).await?;
				let path = out_dir.clone().unwrap_or_default().join(&exported.filename);
				std::fs::write(&path, &exported.bytes)
					.with_context(|| format!("unable to write {}", path.display()))?;
				println!("Wrote {} bytes to {}", exported.bytes.len(), path.display());
				Ok(())
			},
			SubCmdRoot::Import { file, into } => {
				let (filename, bytes) = read_upload(file)?;
				let result = match into {
					Some(network_id) => client.insert_topology(network_id, &filename, bytes).await?,
					None => client.import_network(&filename, bytes).await?,
				};
				print_value(self, &result, "Import finished")
			},
			SubCmdRoot::Simulate { network_id, payload } => {
				let payload: Value = match payload {
					Some(file) => {
						let text = std::fs::read_to_string(file)
							.with_context(|| format!("unable to read {}", file.display()))?;
						serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", file.display()))?
					},
					None => Value::Object(Default::default()),
				};
				let result = client.run_simulation(network_id, &payload).await?;
				print_value(self, &result, "Simulation finished")
			},
			SubCmdRoot::Libraries => libraries(self, client).await,
			SubCmdRoot::Library(LibraryID { library_id }) => library(self, client, library_id.trim()).await,
			SubCmdRoot::CreateLibrary { name } => {
				let created = client.create_library(&rt::LibraryName { library_name: name.clone() }).await?;
				print_item(self, &created, || format!("Created library {} ({})", created.library_name, created.library_id))
			},
			SubCmdRoot::DeleteLibrary(LibraryID { library_id }) => {
				let resp = client.delete_library(library_id).await?;
				print_deleted(self, resp, || format!("Deleted library {}", library_id))
			},
		}
	}
}

#[derive(Subcommand)]
pub enum SubCmdRoot {
	/// List all networks
	Networks,
	/// Show a network and the fiber spans attached to each element
	Network(NetworkID),
	CreateNetwork { name: String },
	RenameNetwork { network_id: String, name: String },
	DeleteNetwork(NetworkID),
	/// Download a network export
	Export {
		network_id: String,
		/// Directory to write the export into (defaults to the current directory)
		#[arg(short, long = "out")]
		out_dir: Option<PathBuf>,
	},
	/// Upload a network file, as a new network or into an existing one
	Import {
		file: PathBuf,
		#[arg(long)]
		into: Option<String>,
	},
	/// Run a simulation, optionally with a JSON request body read from a file
	Simulate {
		network_id: String,
		payload: Option<PathBuf>,
	},
	/// List all equipment libraries
	Libraries,
	/// Show the templates of an equipment library
	Library(LibraryID),
	CreateLibrary { name: String },
	DeleteLibrary(LibraryID),
}

#[derive(clap::Args)]
pub struct NetworkID {
	network_id: String,
}

#[derive(clap::Args)]
pub struct LibraryID {
	library_id: String,
}

fn print_item<T: serde::Serialize, F: FnOnce() -> String>(args: &Args, item: &T, human: F) -> Result<()> {
	if args.json {
		println!("{}", serde_json::to_string(item)?);
	} else {
		println!("{}", human());
	}
	Ok(())
}

fn print_deleted<F: FnOnce() -> String>(args: &Args, resp: Option<rt::DeleteResponse>, human: F) -> Result<()> {
	match (args.json, resp) {
		(true, Some(r)) => println!("{}", serde_json::to_string(&r)?),
		(true, None) => println!("{}", serde_json::to_string(&Value::Null)?),
		(false, Some(r)) if !r.message.trim().is_empty() => println!("{}", r.message.trim()),
		(false, _) => println!("{}", human()),
	}
	Ok(())
}

fn print_value(args: &Args, value: &Value, done: &str) -> Result<()> {
	if args.json {
		println!("{}", serde_json::to_string(value)?);
	} else {
		println!("{}", done);
		println!("{}", serde_json::to_string_pretty(value)?);
	}
	Ok(())
}

fn read_upload(file: &PathBuf) -> Result<(String, Vec<u8>)> {
	let bytes = std::fs::read(file).with_context(|| format!("unable to read {}", file.display()))?;
	let filename = file.file_name()
		.map(|n| n.to_string_lossy().into_owned())
		.unwrap_or_else(|| "network.json".to_owned());
	debug!("uploading {} ({} bytes)", filename, bytes.len());
	Ok((filename, bytes))
}

async fn networks(args: &Args, client: &ApiClient) -> Result<()> {
	let mut list = NetworkList::new();
	list.load(client).await?;

	if args.json {
		println!("{}", serde_json::to_string(list.items())?);
		return Ok(());
	}
	for n in list.items() {
		println!("{}\t{}\t(updated {})", n.network_id, n.network_name, n.updated_at);
	}
	Ok(())
}

async fn network(args: &Args, client: &ApiClient, network_id: &str) -> Result<()> {
	if args.json {
		let detail = client.fetch_network(network_id).await?;
		println!("{}", serde_json::to_string(&detail)?);
		return Ok(());
	}

	let editor = NetworkEditor::with_notifier(client.clone(), client.notifier().clone());
	editor.load_network(network_id).await
		.with_context(|| format!("unable to load network {}", network_id))?;

	let st = editor.state().await;
	let store = st.store();
	println!("Network {}, \"{}\"", network_id, st.network_name());
	println!("Created: {}, Updated: {}", st.created_at(), st.updated_at());
	println!("{} elements, {} connections, {} services", store.elements().len(), store.connections().len(), store.services().len());
	if let Some(lib) = st.library() {
		println!("Equipment library: {}", lib.library_id);
	}

	let mut nodes: Vec<_> = st.view().nodes().values().collect();
	nodes.sort_by(|a, b| a.element_id.cmp(&b.element_id));
	for node in nodes {
		let mut line = format!("  {}\t{}", node.element_id, node.label);
		if let Some(fiber) = &node.fiber.fiber_in {
			line.push_str(&format!("\tin: {}", fiber));
		}
		if let Some(fiber) = &node.fiber.fiber_out {
			line.push_str(&format!("\tout: {}", fiber));
		}
		println!("{}", line);
	}
	Ok(())
}

async fn libraries(args: &Args, client: &ApiClient) -> Result<()> {
	let mut list = LibraryList::new();
	list.load(client).await?;

	if args.json {
		println!("{}", serde_json::to_string(list.items())?);
		return Ok(());
	}
	for l in list.items() {
		println!("{}\t{}\t(updated {})", l.library_id, l.library_name, l.updated_at);
	}
	Ok(())
}

async fn library(args: &Args, client: &ApiClient, library_id: &str) -> Result<()> {
	let equipment = client.fetch_library_equipment(library_id).await?;
	if args.json {
		println!("{}", serde_json::to_string(&equipment)?);
		return Ok(());
	}

	println!("Library {}", library_id);
	for category in rt::EquipmentCategory::ALL {
		let varieties = equipment.varieties(category);
		if varieties.is_empty() {
			continue;
		}
		println!("{} ({}):", category, varieties.len());
		for v in varieties {
			println!("  {}", v);
		}
	}
	Ok(())
}
