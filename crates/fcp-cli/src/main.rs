//! FCP command-line client
//!
//! Talks to a peer-to-peer storage node over its FCP control port.

mod config;
mod progress;

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use config::Config;
use fcp_client::FcpClient;
use progress::{format_bytes, RequestProgress};

/// fcp - talk to a storage node over FCP
#[derive(Parser)]
#[command(name = "fcp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Node hostname (overrides the configuration file)
    #[arg(long)]
    host: Option<String>,

    /// Node FCP port (overrides the configuration file)
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the content behind a URI
    Get {
        /// URI to fetch
        #[arg(required = true)]
        uri: String,

        /// Write the content to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Insert a file under a URI
    Put {
        /// Target URI
        #[arg(required = true)]
        uri: String,

        /// File to insert
        #[arg(required = true)]
        file: PathBuf,

        /// Let the node read the file itself (runs the disk-access
        /// handshake) instead of sending the bytes in-band
        #[arg(long)]
        disk: bool,
    },

    /// List the node's peers
    Peers {
        /// Include peer metadata
        #[arg(long)]
        metadata: bool,

        /// Include volatile statistics
        #[arg(long)]
        volatile: bool,

        /// Remove the named peer instead of listing
        #[arg(long)]
        remove: Option<String>,
    },

    /// Generate a new SSK key pair
    Keygen,

    /// Show the node's configuration
    Config {
        /// Print the local configuration file path instead
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };
    config.validate()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose {
            "debug".to_string()
        } else {
            config.logging.filter.clone()
        })
        .init();

    let host = cli.host.unwrap_or_else(|| config.node.host.clone());
    let port = cli.port.unwrap_or(config.node.port);
    let client = FcpClient::new(host, port, config.node.client_name.clone());

    match cli.command {
        Commands::Get { uri, output } => {
            fetch(&client, uri, output).await?;
        }
        Commands::Put { uri, file, disk } => {
            insert(&client, uri, file, disk).await?;
        }
        Commands::Peers {
            metadata,
            volatile,
            remove,
        } => match remove {
            Some(node_identifier) => remove_peer(&client, node_identifier).await?,
            None => list_peers(&client, metadata, volatile).await?,
        },
        Commands::Keygen => {
            generate_keypair(&client).await?;
        }
        Commands::Config { path } => {
            if path {
                println!("{}", Config::default_path().display());
            } else {
                show_config(&client).await?;
            }
        }
    }

    client.close().await;
    Ok(())
}

/// Fetch a URI to a file or stdout
async fn fetch(client: &FcpClient, uri: String, output: Option<PathBuf>) -> anyhow::Result<()> {
    tracing::info!(%uri, "fetching");

    let progress = RequestProgress::new("Fetching");
    let bar = progress.clone();
    let data = client
        .client_get(&uri)
        .on_progress(move |p| bar.update(p))
        .execute()
        .await?;

    match data {
        Some(data) => {
            progress.finish_with_message(format!("Fetched {}", format_bytes(data.len())));
            let bytes = data.bytes()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    println!("Wrote {} to {}", format_bytes(data.len()), path.display());
                    if let Some(content_type) = data.content_type() {
                        println!("Content type: {content_type}");
                    }
                }
                None => {
                    std::io::stdout().write_all(&bytes)?;
                }
            }
        }
        None => {
            progress.abandon();
            anyhow::bail!("Data not found: {uri}");
        }
    }

    Ok(())
}

/// Insert a file under a URI
async fn insert(client: &FcpClient, uri: String, file: PathBuf, disk: bool) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {:?}", file);
    }
    let file_size = std::fs::metadata(&file)?.len();

    println!("File: {}", file.display());
    println!("Size: {}", format_bytes(file_size));
    println!("Target: {uri}");
    println!("Upload: {}", if disk { "disk" } else { "direct" });

    let progress = RequestProgress::new("Inserting");
    let bar = progress.clone();
    let command = client
        .client_put(&uri)
        .on_key_generated(|key| {
            tracing::info!(%key, "node generated the final URI");
        })
        .on_progress(move |p| bar.update(p));
    let command = if disk {
        command.from_file(&file)
    } else {
        command.from_bytes(std::fs::read(&file)?)
    };

    match command.execute().await? {
        Some(key) => {
            progress.finish_with_message("Insert complete".to_string());
            println!("Inserted under: {key}");
        }
        None => {
            progress.abandon();
            anyhow::bail!("Insert failed");
        }
    }

    Ok(())
}

/// List the node's peers
async fn list_peers(client: &FcpClient, metadata: bool, volatile: bool) -> anyhow::Result<()> {
    let mut command = client.list_peers();
    if metadata {
        command = command.include_metadata();
    }
    if volatile {
        command = command.include_volatile();
    }
    let peers = command.execute().await?;

    println!("Peers: {}", peers.len());
    for peer in &peers {
        println!(
            "  {}  {}",
            peer.identity().unwrap_or("<no identity>"),
            peer.my_name().unwrap_or("")
        );
    }

    Ok(())
}

/// Remove a peer
async fn remove_peer(client: &FcpClient, node_identifier: String) -> anyhow::Result<()> {
    if client.remove_peer(&node_identifier).execute().await? {
        println!("Removed peer {node_identifier}");
    } else {
        anyhow::bail!("No such peer: {node_identifier}");
    }
    Ok(())
}

/// Generate a new SSK key pair
async fn generate_keypair(client: &FcpClient) -> anyhow::Result<()> {
    let keypair = client.generate_keypair().execute().await?;

    println!("Insert URI:  {}", keypair.insert_uri);
    println!("Request URI: {}", keypair.request_uri);
    println!("\nKeep the insert URI secret; only it allows publishing updates.");

    Ok(())
}

/// Show the node's configuration
async fn show_config(client: &FcpClient) -> anyhow::Result<()> {
    let config = client.get_config().with_current().execute().await?;

    for (key, value) in config.fields() {
        if key != "Identifier" {
            println!("{key}={value}");
        }
    }

    Ok(())
}
