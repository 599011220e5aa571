pub mod cli_args;
pub mod commands;

pub use cli_args::AuditCommand;
pub use cli_args::Command;
pub use cli_args::ConsoleCliArgs;
pub use cli_args::merge_with_env;
pub use commands::Outcome;
pub use commands::run;
