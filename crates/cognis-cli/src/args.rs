//! The gateway binary's command-line surface: `serve` runs the A2A
//! server and the priority broker; `agent-card`, `dlq`, `templates`, and
//! `metrics` give the brain's state a command-line view, the way the
//! teacher's `session`/`provider` namespaces do for its own workspace.

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "cognis")]
#[command(about = "Run and inspect a cognis agent brain", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Where the SQLite workspace and config.toml live.
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    #[arg(long, default_value = "info", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Plain => write!(f, "plain"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{s}")
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the A2A server, the priority broker, and the heartbeat sender")]
    Serve {
        #[arg(long, help = "Override the configured bind address (host:port)")]
        bind: Option<String>,
    },

    #[command(about = "Print this agent's A2A discovery card")]
    AgentCard,

    #[command(about = "Print the C6 health score and template counts")]
    Metrics,

    #[command(
        next_help_heading = "Dead-letter queue",
        about = "Inspect and retry tasks that exhausted their heartbeat deadline"
    )]
    Dlq {
        #[command(subcommand)]
        command: DlqCommand,
    },

    #[command(next_help_heading = "Reasoning templates", about = "Inspect and manage the template lifecycle")]
    Templates {
        #[command(subcommand)]
        command: TemplateCommand,
    },
}

#[derive(Subcommand)]
pub enum DlqCommand {
    #[command(about = "List dead-lettered tasks")]
    List {
        #[arg(long, default_value = "50", help = "Maximum number of entries to show")]
        limit: usize,
    },

    #[command(about = "Re-publish a dead-lettered task for redelivery")]
    Retry {
        #[arg(help = "The dead-lettered task's id")]
        task_id: String,
    },
}

#[derive(Subcommand)]
pub enum TemplateCommand {
    #[command(about = "List templates, optionally filtered by task type")]
    List {
        #[arg(long, help = "Restrict to templates for this task type")]
        task_type: Option<String>,
    },

    #[command(about = "Promote a template to Promoted status")]
    Promote {
        #[arg(help = "The template's id")]
        template_id: String,
    },

    #[command(about = "Mark a template Deprecated")]
    Deprecate {
        #[arg(help = "The template's id")]
        template_id: String,
    },
}
