use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use scriptorium::connector::api::Router;
use scriptorium::connector::http;
use scriptorium::{Backend, Commands, Container, ContainerConfig};

#[derive(Parser)]
#[command(name = "scriptorium")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true, default_value = "~/.scriptorium")]
    data_dir: String,

    #[arg(long, global = true, value_enum, default_value = "duckdb")]
    backend: Backend,

    #[arg(long, global = true)]
    qdrant_url: Option<String>,

    #[arg(long, global = true, default_value = "chunks")]
    collection_name: String,

    #[arg(long, global = true)]
    mock_embeddings: bool,

    #[arg(long, global = true)]
    mock_chat: bool,

    /// Embedding dimensions (mock embeddings default to 384)
    #[arg(long, global = true)]
    dimensions: Option<usize>,

    #[arg(long, global = true, default_value = "700")]
    chunk_size: usize,

    #[arg(long, global = true, default_value = "100")]
    chunk_overlap: usize,

    /// HuggingFace tokenizer.json used to count chunk tokens
    #[arg(long, global = true)]
    tokenizer: Option<String>,

    #[arg(long, global = true, default_value = "0.85")]
    min_ocr_confidence: f32,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn container_config(&self) -> ContainerConfig {
        ContainerConfig {
            data_dir: expand_tilde(&self.data_dir),
            backend: self.backend,
            qdrant_url: self.qdrant_url.clone(),
            collection_name: self.collection_name.clone(),
            mock_embeddings: self.mock_embeddings,
            mock_chat: self.mock_chat,
            dimensions: self.dimensions,
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            tokenizer_path: self.tokenizer.clone(),
            min_ocr_confidence: self.min_ocr_confidence,
            show_progress: matches!(self.command, Commands::Ingest { .. }),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase())),
        )
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let container = Container::new(cli.container_config()).await?;

    if let Commands::Serve { port, public } = cli.command {
        let ip = if public {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        };
        return http::serve(Arc::new(container), SocketAddr::new(ip, port)).await;
    }

    let router = Router::new(&container);
    let output = router.route(cli.command).await?;
    println!("{}", output);

    Ok(())
}

fn expand_tilde(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            if path == "~" {
                return home.to_string_lossy().to_string();
            }
            return path.replacen("~", &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
