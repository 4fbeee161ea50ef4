//! Cheque intake CLI - scan, reconcile and store cheques
//!
//! # Commands
//!
//! ```bash
//! cheque-intake check cheque.jpg                     # Validate a file locally
//! cheque-intake scan cheque.jpg --set rib=0123...    # Extract, correct and save
//! cheque-intake shell                                # Interactive session
//! cheque-intake list                                 # Stored cheques
//! ```
//!
//! `--offline` swaps the HTTP service for an in-process one that answers with
//! a sample cheque.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{sleep_until, Instant};

use cheque_intake::{
    logging, Candidate, ChequeRecord, ChequeService, Completion, Dispatch,
    DocumentValidator, FieldName, HttpChequeService, IntakeConfig, IntakeError, IntakeResult,
    MockChequeService, NoticeLevel, PreviewStore, Session,
};

/// Simulated service delay in offline mode.
const OFFLINE_LATENCY: Duration = Duration::from_millis(800);

#[derive(Parser)]
#[command(name = "cheque-intake")]
#[command(about = "Scan cheques, reconcile extracted fields and store them", long_about = None)]
struct Cli {
    /// Base URL of the cheque service (overrides CHEQUE_SERVICE_URL)
    #[arg(long, global = true)]
    service_url: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a file against the type and size constraints
    Check {
        /// Cheque scan (JPEG, PNG or PDF)
        file: PathBuf,
    },

    /// Extract a cheque, apply corrections and save it
    Scan {
        /// Cheque scan (JPEG, PNG or PDF)
        file: PathBuf,

        /// Correct a field before saving, e.g. `--set rib=0123`
        #[arg(short, long = "set", value_parser = parse_assignment)]
        set: Vec<(FieldName, String)>,

        /// Use the in-process sample service
        #[arg(long)]
        offline: bool,
    },

    /// Interactive session
    Shell {
        /// Use the in-process sample service
        #[arg(long)]
        offline: bool,
    },

    /// List stored cheques
    List,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = IntakeConfig::from_env();
    if let Some(url) = cli.service_url {
        config = config.with_service_url(url);
    }

    let result = match cli.command {
        Commands::Check { file } => cmd_check(&config, &file),

        Commands::Scan { file, set, offline } => {
            if offline {
                cmd_scan(offline_service(), &config, &file, set).await
            } else {
                match http_service(&config) {
                    Ok(service) => cmd_scan(service, &config, &file, set).await,
                    Err(e) => Err(e),
                }
            }
        }

        Commands::Shell { offline } => {
            if offline {
                cmd_shell(offline_service(), &config).await
            } else {
                match http_service(&config) {
                    Ok(service) => cmd_shell(service, &config).await,
                    Err(e) => Err(e),
                }
            }
        }

        Commands::List => match http_service(&config) {
            Ok(service) => cmd_list(service.as_ref()).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn offline_service() -> Arc<MockChequeService> {
    Arc::new(MockChequeService::new().with_latency(OFFLINE_LATENCY))
}

fn http_service(config: &IntakeConfig) -> IntakeResult<Arc<HttpChequeService>> {
    Ok(Arc::new(HttpChequeService::new(config.clone())?))
}

fn parse_assignment(raw: &str) -> Result<(FieldName, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{}'", raw))?;
    let field = name.parse::<FieldName>().map_err(|e| e.to_string())?;
    Ok((field, value.to_string()))
}

fn read_candidate(file: &Path) -> IntakeResult<Candidate> {
    Candidate::from_path(file).map_err(IntakeError::from)
}

// =============================================================================
// Commands
// =============================================================================

fn cmd_check(config: &IntakeConfig, file: &Path) -> IntakeResult<()> {
    eprintln!("📄 Checking: {}", file.display());

    let candidate = read_candidate(file)?;
    let validator = DocumentValidator::new(PreviewStore::new(config.preview_dir.clone()));
    let media_type = validator.check(&candidate)?;

    eprintln!("   Type: {}", media_type);
    eprintln!("   Size: {} bytes", candidate.size());
    eprintln!("✅ Accepted");
    Ok(())
}

async fn cmd_scan<S: ChequeService + 'static>(
    service: Arc<S>,
    config: &IntakeConfig,
    file: &Path,
    edits: Vec<(FieldName, String)>,
) -> IntakeResult<()> {
    let mut session = Session::new(service, PreviewStore::new(config.preview_dir.clone()));

    let document = session.accept(read_candidate(file)?)?;
    eprintln!("📄 Accepted: {} ({}, {} bytes)", document.file_name(), document.media_type(), document.size());
    eprintln!("   Preview: {}", document.preview().path().display());

    session.extract()?;
    eprintln!("🔍 Extracting...");
    match session.settle().await {
        Some(Completion::Extracted { reliable_fields }) => {
            eprintln!("   {} of 10 fields reliable", reliable_fields);
        }
        _ => return Err(IntakeError::Failed(notice_text(&session))),
    }

    for (field, value) in edits {
        eprintln!("✏️  {} = {}", field, value);
        session.edit(field, value)?;
    }
    print_record(session.workflow().record());

    session.submit()?;
    eprintln!("💾 Saving...");
    match session.settle().await {
        Some(Completion::Saved) => {
            eprintln!("✅ {}", notice_text(&session));
            Ok(())
        }
        _ => Err(IntakeError::Failed(notice_text(&session))),
    }
}

async fn cmd_list<S: ChequeService + ?Sized>(service: &S) -> IntakeResult<()> {
    let cheques = service.list().await?;

    if cheques.is_empty() {
        println!("No cheques stored.");
        return Ok(());
    }

    println!("{:<6} {:<16} {:>14}  {}", "ID", "NUMBER", "AMOUNT", "STATUS");
    for cheque in &cheques {
        println!("{:<6} {:<16} {:>14}  {}", cheque.id, cheque.cheque_number, cheque.amount, cheque.status);
    }
    eprintln!("\n📋 {} cheque(s)", cheques.len());
    Ok(())
}

// =============================================================================
// Shell
// =============================================================================

const SHELL_HELP: &str = "\
Commands:
  open <file>            load a cheque scan
  extract                run extraction on the loaded scan
  review                 fill the form by hand without extraction
  show                   print the fields
  edit <field> <value>   correct a field (in review)
  submit                 save the record
  status                 stage, document and notice
  list                   stored cheques
  reset                  start over
  quit                   leave";

async fn cmd_shell<S: ChequeService + 'static>(service: Arc<S>, config: &IntakeConfig) -> IntakeResult<()> {
    let mut session = Session::new(service, PreviewStore::new(config.preview_dir.clone()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    eprintln!("{}", SHELL_HELP);
    prompt(&session);

    loop {
        let expiry = session.notice_expiry();

        tokio::select! {
            line = lines.next_line() => {
                let line = line.map_err(|e| IntakeError::Failed(format!("stdin: {}", e)))?;
                let Some(line) = line else { break };
                if !run_shell_command(&mut session, line.trim()).await {
                    break;
                }
                prompt(&session);
            }
            Some(completion) = session.settle() => {
                report_completion(&session, completion);
                prompt(&session);
            }
            _ = sleep_until(expiry.unwrap_or_else(Instant::now)), if expiry.is_some() => {
                session.expire_notice();
            }
        }
    }

    Ok(())
}

/// Run one shell line. Returns `false` when the operator wants to leave.
async fn run_shell_command<S: ChequeService + 'static>(session: &mut Session<S>, line: &str) -> bool {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let result: IntakeResult<()> = match command {
        "" => Ok(()),
        "quit" | "exit" => return false,
        "help" => {
            eprintln!("{}", SHELL_HELP);
            Ok(())
        }
        "open" if rest.is_empty() => Err(IntakeError::Failed("usage: open <file>".into())),
        "open" => read_candidate(Path::new(rest)).and_then(|candidate| {
            let document = session.accept(candidate)?;
            eprintln!("📄 {} ({}, {} bytes)", document.file_name(), document.media_type(), document.size());
            Ok(())
        }),
        "extract" => session.extract().map_err(IntakeError::from).map(|dispatch| match dispatch {
            Dispatch::Started(_) => eprintln!("🔍 Extraction started"),
            Dispatch::AlreadyPending => eprintln!("   Extraction already running"),
        }),
        "review" => session.enter_review().map_err(IntakeError::from),
        "show" => {
            print_record(session.workflow().record());
            Ok(())
        }
        "edit" => match rest.split_once(' ') {
            Some((name, value)) => name
                .parse::<FieldName>()
                .and_then(|field| session.edit(field, value.trim()))
                .map_err(IntakeError::from),
            None => Err(IntakeError::Failed("usage: edit <field> <value>".into())),
        },
        "submit" => session
            .submit()
            .map(|_| eprintln!("💾 Saving..."))
            .map_err(IntakeError::from),
        "status" => {
            print_status(session);
            Ok(())
        }
        "list" => cmd_list(session.service().as_ref()).await,
        "reset" => session.reset().map_err(IntakeError::from),
        other => Err(IntakeError::Failed(format!("unknown command '{}', try 'help'", other))),
    };

    if let Err(e) = result {
        eprintln!("❌ {}", e);
    }
    true
}

fn report_completion<S: ChequeService + 'static>(session: &Session<S>, completion: Completion) {
    match completion {
        Completion::Extracted { reliable_fields } => {
            eprintln!("\n✅ Extracted, {} of 10 fields reliable", reliable_fields);
            print_record(session.workflow().record());
        }
        Completion::Saved => eprintln!("\n✅ {}", notice_text(session)),
        Completion::ExtractionFailed | Completion::SaveFailed => {
            eprintln!("\n❌ {}", notice_text(session))
        }
        Completion::Stale => {}
    }
}

fn prompt<S: ChequeService + 'static>(session: &Session<S>) {
    eprint!("[{}]> ", session.workflow().stage());
}

fn print_status<S: ChequeService + 'static>(session: &Session<S>) {
    let workflow = session.workflow();
    eprintln!("Stage: {}", workflow.stage());
    match workflow.document() {
        Some(document) => eprintln!("Document: {} ({})", document.file_name(), document.id()),
        None => eprintln!("Document: none"),
    }
    if workflow.is_extracting() {
        eprintln!("Extraction in progress");
    }
    if workflow.is_submitting() {
        eprintln!("Save in progress");
    }
    if let Some(notice) = session.notice() {
        let marker = match notice.level {
            NoticeLevel::Success => "✅",
            NoticeLevel::Error => "❌",
        };
        eprintln!("Notice: {} {}", marker, notice.message);
    }
}

fn notice_text<S: ChequeService + 'static>(session: &Session<S>) -> String {
    session
        .notice()
        .map(|notice| notice.message.clone())
        .unwrap_or_else(|| "no outcome".to_string())
}

fn print_record(record: &ChequeRecord) {
    for (name, field) in record.iter() {
        let score = field
            .confidence
            .map(|c| format!("{:>3}%", c))
            .unwrap_or_else(|| "   -".to_string());
        println!("{:<16} {:<48} {} {}", name.label(), field.value, score, field.level());
    }
    println!("Reliable fields: {}/10", record.reliable_field_count());
}
