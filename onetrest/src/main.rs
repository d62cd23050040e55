use anyhow::{anyhow, Result};
use clap::Parser;
use onet::get_config_env;

use onetrest::Args;

#[tokio::main]
async fn main() -> Result<()> {
	env_logger::init();
	let args: Args = Args::parse();

	let config = get_config_env().map_err(|e| anyhow!(e))?;
	let client = config.connect()?;

	args.handle(&client).await
}
