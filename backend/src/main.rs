//! Cheque backend CLI - serve the extraction and persistence API
//!
//! # Commands
//!
//! ```bash
//! cheque-backend serve                      # Start HTTP server (port 5000)
//! cheque-backend extract cheque.jpg         # Run the extractor on a file
//! cheque-backend list                       # Stored cheques
//! cheque-backend mark 3 validated           # Change a cheque's status
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cheque_backend::{
    extract_within, start_server, validate_upload, ChequeStatus, ChequeStore, SampleExtractor,
    ServerConfig, ServerResult, Upload,
};

#[derive(Parser)]
#[command(name = "cheque-backend")]
#[command(about = "Extraction and persistence service for scanned cheques", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Port to listen on (overrides CHEQUE_BACKEND_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory for stored cheques (overrides CHEQUE_DATA_DIR)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Simulated extraction time in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Run the extractor on a file and print the JSON answer
    Extract {
        /// Cheque scan (JPEG, PNG or PDF)
        input: PathBuf,
    },

    /// List stored cheques
    List {
        /// Directory for stored cheques (overrides CHEQUE_DATA_DIR)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// Change the status of a stored cheque
    Mark {
        /// Cheque ID
        id: u64,

        /// New status
        status: StatusArg,

        /// Directory for stored cheques (overrides CHEQUE_DATA_DIR)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Validated,
    Pending,
    Rejected,
}

impl From<StatusArg> for ChequeStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Validated => ChequeStatus::Validated,
            StatusArg::Pending => ChequeStatus::Pending,
            StatusArg::Rejected => ChequeStatus::Rejected,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let mut config = ServerConfig::from_env();

    let result = match cli.command {
        Commands::Serve {
            port,
            data_dir,
            delay_ms,
        } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(ms) = delay_ms {
                config.extraction_delay = Duration::from_millis(ms);
            }
            cmd_serve(&config).await
        }

        Commands::Extract { input } => cmd_extract(&config, &input).await,

        Commands::List { data_dir } => cmd_list(&data_dir.unwrap_or(config.data_dir)),

        Commands::Mark {
            id,
            status,
            data_dir,
        } => cmd_mark(&data_dir.unwrap_or(config.data_dir), id, status.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

async fn cmd_serve(config: &ServerConfig) -> ServerResult<()> {
    start_server(config).await
}

async fn cmd_extract(config: &ServerConfig, input: &Path) -> ServerResult<()> {
    eprintln!("📄 Extracting: {}", input.display());

    let bytes = fs::read(input)?;
    let format = validate_upload(&bytes, config.max_upload_size)?;
    eprintln!("   Format: {}", format);
    eprintln!("   Size: {} bytes", bytes.len());

    let upload = Upload {
        file_name: input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "cheque".to_string()),
        format,
        bytes,
    };

    let extractor = SampleExtractor::new(Duration::ZERO);
    let cheque = extract_within(&extractor, &upload, config.extraction_timeout).await?;

    println!("{}", serde_json::to_string_pretty(&cheque)?);
    Ok(())
}

fn cmd_list(data_dir: &Path) -> ServerResult<()> {
    let store = ChequeStore::with_dir(data_dir);

    if store.is_empty() {
        eprintln!("📋 No cheques stored in {}.", data_dir.display());
        return Ok(());
    }

    eprintln!("📋 Stored cheques ({}):\n", store.len());
    for cheque in store.list() {
        println!("  {:>4}  {:<16} {:>14}  {}", cheque.id, cheque.cheque_number, cheque.amount, cheque.status);
    }
    Ok(())
}

fn cmd_mark(data_dir: &Path, id: u64, status: ChequeStatus) -> ServerResult<()> {
    let mut store = ChequeStore::with_dir(data_dir);
    let cheque = store.set_status(id, status)?;
    eprintln!("✅ Cheque {} is now {}", cheque.id, cheque.status);
    Ok(())
}
