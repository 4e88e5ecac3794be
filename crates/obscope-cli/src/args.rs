use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "obscope")]
#[command(about = "Local-first observatory daemon for AI coding agent sessions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Workspace directory for state (labels, plan history, config).
    /// Defaults to $OBSCOPE_PATH, then the XDG data dir, then ~/.obscope.
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[arg(long, default_value = "info", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run the tick loop in the foreground (default).
    Run,
    /// Print the most recent snapshot summary and exit.
    Status,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
