use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

pub const CONFIG_ENV_VAR: &str = "CONSOLE_ACCESS_CONFIG";

#[derive(Debug, Parser)]
#[command(
    name = "console-access",
    about = "Inspect console permissions and the audit trail"
)]
pub struct ConsoleCliArgs {
    /// Security config file (TOML).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log decisions at debug level.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ask whether a role may perform an action. Exits 1 when denied.
    Check {
        role: String,
        resource: String,
        action: String,
    },

    /// Print the capability matrix.
    Matrix {
        #[arg(long, value_enum, default_value_t = MatrixFormat::Table)]
        format: MatrixFormat,
    },

    /// List the settings views and menu entries a session would see.
    Views {
        /// Role on the signed-in profile. Omit for an anonymous session.
        #[arg(long)]
        role: Option<String>,

        /// Evaluate a session whose profile is still loading.
        #[arg(long, conflicts_with = "role")]
        loading: bool,
    },

    /// Read or append to the persisted audit trail.
    Audit {
        /// Audit file; overrides `audit_file` from the config.
        #[arg(long)]
        file: Option<PathBuf>,

        #[command(subcommand)]
        command: AuditCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum AuditCommand {
    /// Append one event.
    Record {
        #[arg(long)]
        user: String,
        #[arg(long)]
        event: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// List events, newest first. Requires `logs:view` for `--as-role`.
    List {
        #[arg(long)]
        as_role: String,
        #[arg(long, value_enum, default_value_t = ListFormat::Json)]
        format: ListFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MatrixFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    Json,
    Markdown,
}

/// Fill unset options from the environment.
pub fn merge_with_env(args: &mut ConsoleCliArgs) {
    if args.config.is_none() {
        if let Ok(val) = std::env::var(CONFIG_ENV_VAR) {
            args.config = Some(PathBuf::from(val));
        }
    }
}
