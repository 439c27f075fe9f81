//! `ucp-mcp-server` binary.

use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use ucp_mcp_server::{
    McpServer,
    observability::{LogFormat, init_observability},
};
use ucp_toolkit::{Toolkit, ToolkitConfig};

/// Serve UCP shopping tools to an MCP client over stdio.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, env = "UCP_CONFIG", conflicts_with = "merchant_url")]
    config: Option<PathBuf>,

    /// Merchant base URL, used when no config file is given.
    #[arg(long, env = "UCP_MERCHANT_URL")]
    merchant_url: Option<String>,

    /// Agent name sent in the `UCP-Agent` header.
    #[arg(long, env = "UCP_AGENT_NAME")]
    agent_name: Option<String>,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,
}

impl Cli {
    fn load_config(&self) -> Result<ToolkitConfig, Box<dyn std::error::Error>> {
        let mut config = match (&self.config, &self.merchant_url) {
            (Some(path), _) => ToolkitConfig::from_file(path)?,
            (None, Some(url)) => ToolkitConfig::new(url.clone()),
            (None, None) => return Err("either --config or --merchant-url is required".into()),
        };
        if let Some(agent_name) = &self.agent_name {
            config.agent_name.clone_from(agent_name);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_observability(cli.log_format);

    let config = cli.load_config()?;
    let server = McpServer::new(Toolkit::new(config)?);
    info!(
        merchant = server.toolkit().session().client().merchant_url(),
        products = server.toolkit().catalog().len(),
        "ucp-mcp-server listening on stdio"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = server.handle_line(&line).await {
            stdout.write_all(response.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    info!("stdin closed, shutting down");
    Ok(())
}
