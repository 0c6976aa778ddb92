use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use phenoflow_core::{Phenoflow, ServiceConfig};
use phenoflow_store::{ContentStore, GitHubStore, MemoryStore, DEFAULT_TIMEOUT};
use std::io;
use std::sync::Arc;
use std::time::Duration;

mod config;
mod http_api;
mod routes;
mod server_security;

pub use http_api::ERROR_MESSAGE;
pub use routes::{router, LIVENESS_MESSAGE};

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "phenoflow")]
#[command(about = "Phenotype workflows stored as GitHub repositories", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (only warn/error logs to stderr)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the phenotype HTTP API
    Serve(ServeArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address, e.g. 127.0.0.1:3000 (default: loopback on $PORT)
    #[arg(long)]
    bind: Option<String>,

    /// Allow binding to non-loopback addresses
    #[arg(long)]
    public: bool,

    /// Upper bound in seconds for each call to the content store
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    request_timeout_secs: u64,

    /// Keep phenotypes in process memory instead of GitHub (nothing persists)
    #[arg(long)]
    in_memory: bool,
}

pub async fn main_entry() -> Result<()> {
    config::load_dotenv()?;
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Serve(args) => serve_http(args).await,
    }
}

fn build_store(args: &ServeArgs) -> Result<Arc<dyn ContentStore>> {
    if args.in_memory {
        log::warn!("Using the in-memory store; phenotypes are lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let timeout = Duration::from_secs(args.request_timeout_secs.max(1));
    let store_config = config::store_config(timeout)?;
    log::info!(
        "Content store: {} (owner {}, timeout {:?})",
        store_config.api_url,
        store_config.owner,
        store_config.timeout
    );
    let store = GitHubStore::new(store_config).context("Failed to build GitHub client")?;
    Ok(Arc::new(store))
}

async fn serve_http(args: ServeArgs) -> Result<()> {
    let target =
        server_security::BindTarget::resolve(args.bind.as_deref(), args.public).await?;
    log::debug!("Binding {} as {}", target.requested, target.addr);

    let store = build_store(&args)?;
    let service_config: ServiceConfig = config::service_config(args.in_memory)?;
    if service_config.seed_path.is_none() {
        log::debug!("No seed file configured; POST /initialise will fail");
    }
    let app = router(Phenoflow::new(store, service_config));

    let listener = tokio::net::TcpListener::bind(target.addr)
        .await
        .with_context(|| format!("Failed to bind {}", target.addr))?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");

    print_stdout(&format!("Phenoflow server listening on {base_url}"))?;
    if args.public {
        print_stdout(&format!(
            "Public bind enabled (--public). Resolved addresses: {}",
            target.resolved_list()
        ))?;
    }
    print_stdout(&format!("Try: curl {base_url}/"))?;

    axum::serve(listener, app).await?;
    Ok(())
}
