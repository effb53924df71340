//! LearnHub CLI - a command-line client for the LearnHub learning platform.
//!
//! Log in once, then browse courses, enroll, read lessons and check your
//! dashboard. The session is kept between runs.

mod commands;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use learnhub_core::{App, Config};

#[derive(Parser, Debug)]
#[command(name = "learnhub", author, version, about = "LearnHub command-line client")]
struct Args {
    /// Backend API base URL (overrides the config file)
    #[arg(long, env = "LEARNHUB_API_URL", global = true)]
    api_url: Option<String>,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, env = "LEARNHUB_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and remember the session
    Login {
        /// Username (defaults to the last one used)
        username: Option<String>,
    },
    /// Create an account and log into it
    Register { username: String, email: String },
    /// Forget the session and revoke its token
    Logout,
    /// Show who is logged in
    Whoami,
    /// Print the account profile as the backend reports it
    Profile,
    /// List courses, optionally filtered by title/description
    Courses {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one course
    Course { slug: String },
    /// Enroll in a course
    Enroll { slug: String },
    /// List the lessons of a course
    Lessons { course: String },
    /// List the assessments of a lesson
    Assessments { course: String, lesson: String },
    /// List your messages in a course
    Messages { course: String },
    /// Send a message to a course's instructor
    Send {
        course: String,
        receiver: String,
        content: String,
    },
    /// Show your progress summary
    Dashboard,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<&PathBuf>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "learnhub.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let log_guard = init_tracing(args.log_dir.as_ref());
    info!("LearnHub CLI starting");

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }

    let (app, mut events) = App::open(config)?;
    let result = commands::run(&app, args.command).await;

    let notified = commands::print_events(&mut events);

    if let Err(e) = result {
        // Failures already shown as a notice are not repeated
        if !notified {
            eprintln!("Error: {}", e);
        }
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}
