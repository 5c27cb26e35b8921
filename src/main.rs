//! codepad - command-line front end for the code workspace core

use clap::{Parser, Subcommand};
use codepad::{
    config::ConfigManager,
    language::language_for_filename,
    llm::connection::{ConnectionDiagnostics, KeyCheck, Reachability},
    utils::{config::ApiKeyResolver, errors::CodepadError},
    ChatEvent, Codepad, Config, FileId, Result, SessionId, Severity,
};
use colored::Colorize;
use futures::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// codepad: code workspace with diagnostics, formatting and AI assistance
#[derive(Parser)]
#[command(name = "codepad")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report heuristic diagnostics for a file
    Check {
        file: PathBuf,
        /// Language tag; detected from the extension when omitted
        #[arg(short = 'L', long)]
        language: Option<String>,
    },
    /// Print a reformatted copy of a file
    Format {
        file: PathBuf,
        #[arg(short = 'L', long)]
        language: Option<String>,
        /// Overwrite the file instead of printing
        #[arg(short, long)]
        write: bool,
    },
    /// Ask the assistant a question
    Chat {
        message: String,
        /// Print the reply as it is generated
        #[arg(short, long)]
        stream: bool,
        /// File to include as context
        #[arg(long)]
        context_file: Option<PathBuf>,
    },
    /// Generate code from a description
    Generate {
        description: String,
        #[arg(short = 'L', long, default_value = "python")]
        language: String,
    },
    /// Explain the code in a file
    Explain {
        file: PathBuf,
        #[arg(short = 'L', long)]
        language: Option<String>,
    },
    /// Find and fix bugs in a file
    Debug {
        file: PathBuf,
        #[arg(short = 'L', long)]
        language: Option<String>,
    },
    /// Show provider configuration and test connectivity
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    dotenv::dotenv().ok();

    if let Err(e) = run(cli).await {
        tracing::debug!(category = e.category(), "Command failed: {:?}", e);
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_manager = ConfigManager::load(cli.config)?;
    let config = config_manager.config();

    let level = cli
        .log_level
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level)?;

    info!("Starting codepad v{}", codepad::VERSION);

    let codepad = Codepad::from_config(config)?;
    let session = codepad.create_session().await;

    match cli.command {
        Commands::Check { file, language } => check(&codepad, &session, &file, language).await,
        Commands::Format {
            file,
            language,
            write,
        } => format(&codepad, &session, &file, language, write).await,
        Commands::Chat {
            message,
            stream,
            context_file,
        } => chat(&codepad, &session, &message, stream, context_file).await,
        Commands::Generate {
            description,
            language,
        } => {
            let code = codepad.generate(&session, &description, &language).await?;
            println!("{}", code);
            Ok(())
        }
        Commands::Explain { file, language } => {
            let (code, language) = read_source(&file, language)?;
            println!("{}", codepad.explain(&session, &code, &language).await?);
            Ok(())
        }
        Commands::Debug { file, language } => {
            let (code, language) = read_source(&file, language)?;
            println!("{}", codepad.debug(&session, &code, &language).await?);
            Ok(())
        }
        Commands::Status => status(&codepad, config).await,
    }
}

/// Initialize logging on stderr so command output stays clean
fn init_logging(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level)
        .map_err(|e| CodepadError::unknown(format!("Invalid log level: {}", e)))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CodepadError::unknown(format!("Failed to set logger: {}", e)))?;

    Ok(())
}

fn read_source(path: &Path, language: Option<String>) -> Result<(String, String)> {
    let content =
        std::fs::read_to_string(path).map_err(|e| CodepadError::file_system(path, e))?;
    let language = language.unwrap_or_else(|| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        language_for_filename(&name).to_string()
    });
    Ok((content, language))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load a file from disk into the session workspace
async fn load_into_session(codepad: &Codepad, session: &SessionId, path: &Path) -> Result<FileId> {
    let content =
        std::fs::read_to_string(path).map_err(|e| CodepadError::file_system(path, e))?;
    let created = codepad
        .add_file(session, &file_name(path), Some(&content), None)
        .await?;
    Ok(created.id)
}

async fn check(
    codepad: &Codepad,
    session: &SessionId,
    path: &Path,
    language: Option<String>,
) -> Result<()> {
    let diagnostics = match language {
        Some(language) => {
            let (content, _) = read_source(path, None)?;
            codepad.check_syntax(session, &content, &language).await?
        }
        None => {
            let id = load_into_session(codepad, session, path).await?;
            codepad.get_file(session, &id).await?.diagnostics
        }
    };

    if diagnostics.is_empty() {
        println!("{} {}", "✓".green(), "No issues found");
        return Ok(());
    }

    for diagnostic in &diagnostics {
        let severity = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        println!(
            "{}:{}: {}: {}",
            path.display(),
            diagnostic.line,
            severity,
            diagnostic.message
        );
    }
    Ok(())
}

async fn format(
    codepad: &Codepad,
    session: &SessionId,
    path: &Path,
    language: Option<String>,
    write: bool,
) -> Result<()> {
    let (content, language) = read_source(path, language)?;
    let formatted = codepad.format(session, &content, &language).await?;

    if write {
        std::fs::write(path, &formatted).map_err(|e| CodepadError::file_system(path, e))?;
        info!("Formatted {} as {}", path.display(), language);
    } else {
        print!("{}", formatted);
    }
    Ok(())
}

async fn chat(
    codepad: &Codepad,
    session: &SessionId,
    message: &str,
    stream: bool,
    context_file: Option<PathBuf>,
) -> Result<()> {
    let include_context = match &context_file {
        Some(path) => {
            let id = load_into_session(codepad, session, path).await?;
            codepad.set_current_file(session, &id).await?;
            true
        }
        None => false,
    };

    if !stream {
        let reply = codepad.chat(session, message, include_context).await?;
        println!("{}", reply.response);
        return Ok(());
    }

    let mut events = codepad.chat_stream(session, message, include_context).await?;
    let mut stdout = std::io::stdout();
    while let Some(event) = events.next().await {
        match event? {
            ChatEvent::Delta { text } => {
                print!("{}", text);
                stdout.flush()?;
            }
            ChatEvent::Done { .. } => println!(),
        }
    }
    Ok(())
}

async fn status(codepad: &Codepad, config: &Config) -> Result<()> {
    println!("{}", "codepad status".bold());
    println!("   Version:  {}", codepad::VERSION);
    println!("   Provider: {}", config.active_provider);
    println!("   Model:    {}", config.active_model());

    let env_key = ApiKeyResolver::env_key_name(&config.active_provider);
    let api_key = ApiKeyResolver::active_api_key(config);
    match &api_key {
        Some(key) => {
            let prefix: String = key.chars().take(10).collect();
            println!("   API key:  {}... ({} characters)", prefix, key.chars().count());
        }
        None => println!("   API key:  {} (set {})", "missing".red(), env_key),
    }

    let diagnostics = ConnectionDiagnostics::from_config(config)?;

    println!("\nEndpoints:");
    for check in diagnostics.check_endpoints().await {
        match check.reachability {
            Reachability::Reached { status, elapsed } => println!(
                "{} {} - status {} ({:.2}s)",
                "✓".green(),
                check.url,
                status,
                elapsed.as_secs_f64()
            ),
            Reachability::Unreachable { error } => {
                println!("{} {} - {}", "✗".red(), check.url, error)
            }
        }
    }

    let Some(api_key) = api_key else {
        return Ok(());
    };

    if diagnostics.supports_key_validation() {
        println!("\nValidating API key...");
        match diagnostics.validate_key(&api_key).await {
            Ok(KeyCheck::Valid { details }) => {
                println!("{} API key is valid", "✓".green());
                println!("   {}", details);
            }
            Ok(KeyCheck::Rejected { status, message }) => {
                println!("{} API key rejected: {} - {}", "✗".red(), status, message);
            }
            Err(e) => println!("{} Key validation failed ({}): {}", "✗".red(), e.kind(), e),
        }
    }

    println!("\nTesting connection...");
    match codepad.check_connectivity().await {
        Ok(reply) => {
            println!("{} Connection successful", "✓".green());
            println!("   Response: {}", reply.trim());
        }
        Err(CodepadError::Llm(e)) => {
            println!("{} Connection failed ({})", "✗".red(), e.kind());
            println!("   {}", e);
        }
        Err(e) => return Err(e),
    }
    Ok(())
}
