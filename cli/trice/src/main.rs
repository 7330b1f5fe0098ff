//! trice CLI — host-side decoder and ID manager for embedded trace streams.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use flexi_logger::{Logger, LoggerHandle};

#[derive(Parser)]
#[command(name = "trice", version, about = "Compact binary trace decoder")]
struct Cli {
    /// Verbose diagnostic logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a trace stream and display it
    Log {
        /// Source: a file path, "stdin", or "sim"
        #[arg(short = 's', long, default_value = "stdin")]
        source: String,
        /// Framing family (bare, wrap)
        #[arg(short = 'e', long, default_value = "bare")]
        encoding: String,
        /// ID list file
        #[arg(short = 'i', long = "idlist", default_value = "til.json")]
        idlist: PathBuf,
        /// Decryption passphrase ("none" disables the cipher)
        #[arg(long, default_value = "none")]
        password: String,
        /// Log the derived cipher key once
        #[arg(long = "key")]
        show_key: bool,
        /// Host timestamp mode (off, zero, utc)
        #[arg(long, default_value = "utc")]
        ts: String,
        /// Text prepended to every line
        #[arg(long, default_value = "")]
        prefix: String,
        /// Text appended to every line
        #[arg(long, default_value = "")]
        suffix: String,
        /// Channel tag handling (default, none, off)
        #[arg(long, default_value = "default")]
        color: String,
        /// Forward lines to a display server instead of stdout
        #[arg(long)]
        ds: bool,
        /// Start a display server if none answers (implies --ds)
        #[arg(long)]
        autostart: bool,
        /// Display server address
        #[arg(long, default_value = "localhost")]
        ipa: String,
        /// Display server port
        #[arg(long, default_value = "61497")]
        ipp: String,
    },
    /// Scan source trees and assign trace IDs
    Update {
        /// Source roots to scan (repeatable)
        #[arg(long = "src", default_value = ".")]
        src: Vec<PathBuf>,
        /// ID list file
        #[arg(short = 'i', long = "idlist", default_value = "til.json")]
        idlist: PathBuf,
        /// Report planned changes without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Reset every call-site ID in a source tree to zero
    Zero {
        /// Source roots to scan
        #[arg(long = "src", required = true)]
        src: Vec<PathBuf>,
        /// Report planned changes without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the standalone display server
    #[command(visible_alias = "ds")]
    DisplayServer {
        /// Address to listen on
        #[arg(long, default_value = "localhost")]
        ipa: String,
        /// Port to listen on
        #[arg(long, default_value = "61497")]
        ipp: String,
        /// Channel tag handling (default, none, off)
        #[arg(long, default_value = "default")]
        color: String,
    },
    /// Stop a running display server
    #[command(visible_alias = "sd")]
    Shutdown {
        /// Display server address
        #[arg(long, default_value = "localhost")]
        ipa: String,
        /// Display server port
        #[arg(long, default_value = "61497")]
        ipp: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let _logger = init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

/// Diagnostics go to stderr so decoded lines on stdout stay clean.
/// A logger that fails to start is not worth aborting the decode over.
fn init_logging(verbose: bool) -> Option<LoggerHandle> {
    let spec = if verbose { "debug" } else { "warn" };
    Logger::try_with_env_or_str(spec)
        .ok()?
        .log_to_stderr()
        .start()
        .ok()
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Log {
            source,
            encoding,
            idlist,
            password,
            show_key,
            ts,
            prefix,
            suffix,
            color,
            ds,
            autostart,
            ipa,
            ipp,
        } => commands::log::run(commands::log::LogOptions {
            source,
            encoding,
            idlist,
            password,
            show_key,
            ts,
            prefix,
            suffix,
            color,
            ds,
            autostart,
            ipa,
            ipp,
        }),

        Commands::Update {
            src,
            idlist,
            dry_run,
        } => commands::update::run(&src, &idlist, dry_run),

        Commands::Zero { src, dry_run } => commands::zero::run(&src, dry_run),

        Commands::DisplayServer { ipa, ipp, color } => {
            commands::display_server::run(&ipa, &ipp, &color)
        }

        Commands::Shutdown { ipa, ipp } => commands::shutdown::run(&ipa, &ipp),
    }
}
