//! CLI entry point for `msgshell`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use humansize::{format_size, BINARY};

use msgshell::config::Config;
use msgshell::model::attachment::Attachment;
use msgshell::model::message::Message;
use msgshell::model::property::Properties;
use msgshell::MsgParser;

#[derive(Parser)]
#[command(name = "msgshell", version, about = "Inspect Outlook .msg files")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// MSG file to show
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a summary: subject, sender, recipients, attachments
    Show { path: PathBuf },
    /// Dump every property of the message, its recipients and attachments
    Dump {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        write: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = msgshell::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Some(Commands::Show { path }) => cmd_show(&path, &config),
        Some(Commands::Dump { path, json }) => cmd_dump(&path, json, &config),
        Some(Commands::Config { write }) => cmd_config(&config, write),
        Some(Commands::Completions { shell }) => cmd_completions(shell),
        Some(Commands::Manpage) => cmd_manpage(),
        None => match cli.file {
            Some(path) => cmd_show(&path, &config),
            None => {
                Cli::command().print_help()?;
                Ok(())
            }
        },
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = msgshell::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "msgshell.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "msgshell", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Print the effective configuration, optionally saving it.
fn cmd_config(config: &Config, write: bool) -> anyhow::Result<()> {
    if write {
        msgshell::config::save_config(config)?;
    }
    if let Some(path) = msgshell::config::config_file_path() {
        println!("# config: {}", path.display());
    }
    println!("# log:    {}", msgshell::config::log_file_path(config).display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn parse(path: &Path, config: &Config) -> anyhow::Result<Message> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    let start = Instant::now();
    let message = MsgParser::new(config.parser.clone()).parse_file(path)?;
    tracing::info!(elapsed = ?start.elapsed(), "Parsed message");
    Ok(message)
}

/// Show a human-readable summary of a message.
fn cmd_show(path: &Path, config: &Config) -> anyhow::Result<()> {
    let message = parse(path, config)?;
    let file_size = std::fs::metadata(path)?.len();

    println!();
    println!("  {:<14} {}", "File", path.display());
    println!("  {:<14} {}", "Size", format_size(file_size, BINARY));
    print_message_summary(&message, 0, config);
    println!();
    Ok(())
}

fn print_message_summary(message: &Message, depth: usize, config: &Config) {
    let pad = "    ".repeat(depth);
    let date = |d: Option<chrono::DateTime<chrono::Utc>>| {
        d.map(|d| d.format(&config.display.date_format).to_string())
    };

    let sender = match (message.sender_name(), message.sender_email()) {
        (Some(name), Some(email)) if name != email => Some(format!("{name} <{email}>")),
        (name, email) => email.or(name),
    };

    let fields = [
        ("Subject", message.subject()),
        ("From", sender),
        ("Sent", date(message.submit_time())),
        ("Received", date(message.delivery_time())),
        ("Class", message.message_class()),
        ("Message-ID", message.internet_message_id()),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("  {pad}{label:<14} {value}");
        }
    }

    if !message.recipients.is_empty() {
        println!("  {pad}Recipients ({}):", message.recipients.len());
        for r in &message.recipients {
            let kind = r
                .recipient_type()
                .map(|t| t.to_string())
                .unwrap_or_default();
            let name = r.display_name().unwrap_or_default();
            let email = r.email_address().unwrap_or_default();
            println!("  {pad}  {kind:<5} {name} <{email}>");
        }
    }

    if !message.attachments.is_empty() {
        println!("  {pad}Attachments ({}):", message.attachments.len());
        for attachment in &message.attachments {
            match attachment {
                Attachment::File(file) => {
                    let name = file.filename().unwrap_or_else(|| "(unnamed)".to_string());
                    let mime = file
                        .mime_type()
                        .unwrap_or_else(|| "application/octet-stream".to_string());
                    println!(
                        "  {pad}  {name}  ({mime}, {})",
                        format_size(file.size(), BINARY)
                    );
                }
                Attachment::Message(embedded) => {
                    let name = attachment
                        .display_name()
                        .unwrap_or_else(|| "(untitled)".to_string());
                    println!("  {pad}  [message] {name}");
                    print_message_summary(&embedded.message, depth + 1, config);
                }
            }
        }
    }
}

/// Dump every property, as text or JSON.
fn cmd_dump(path: &Path, json: bool, config: &Config) -> anyhow::Result<()> {
    let message = parse(path, config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&message)?);
    } else {
        dump_message(&message, 0, config.display.max_value_width);
    }
    Ok(())
}

fn dump_message(message: &Message, depth: usize, width: usize) {
    let pad = "  ".repeat(depth);
    println!("{pad}[message]");
    dump_properties(&message.properties, &pad, width);
    for (i, recipient) in message.recipients.iter().enumerate() {
        println!("{pad}[recipient {i}]");
        dump_properties(&recipient.properties, &pad, width);
    }
    for (i, attachment) in message.attachments.iter().enumerate() {
        match attachment {
            Attachment::File(file) => {
                println!("{pad}[attachment {i}] file");
                dump_properties(&file.properties, &pad, width);
            }
            Attachment::Message(embedded) => {
                println!("{pad}[attachment {i}] message");
                dump_properties(&embedded.properties, &pad, width);
                dump_message(&embedded.message, depth + 1, width);
            }
        }
    }
}

fn dump_properties(properties: &Properties, pad: &str, width: usize) {
    let codepage = properties.codepage();
    for (tag, value) in properties.iter() {
        let mut text = value.summary(codepage);
        if width > 0 && text.chars().count() > width {
            text = text.chars().take(width).collect::<String>() + "…";
        }
        println!("{pad}  {tag}  {:<14} {text}", tag.ty.to_string());
    }
}
