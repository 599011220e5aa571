use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use console_persist::AuditStore;
use console_persist::ExportFormat;
use console_persist::JsonFileStore;
use console_persist::export_audits;
use console_security::AccessGuard;
use console_security::Action;
use console_security::AuditRecord;
use console_security::CapabilityMatrix;
use console_security::Profile;
use console_security::SecurityConfig;
use console_security::SessionState;
use console_security::authorize_named;
use console_security::default_matrix;
use console_security::visible_menu;
use console_security::visible_views;

use crate::cli_args::AuditCommand;
use crate::cli_args::Command;
use crate::cli_args::ConsoleCliArgs;
use crate::cli_args::ListFormat;
use crate::cli_args::MatrixFormat;

/// Result of a command that completed without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Denied,
}

pub fn load_config(args: &ConsoleCliArgs) -> anyhow::Result<SecurityConfig> {
    match &args.config {
        Some(path) => SecurityConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(SecurityConfig::default()),
    }
}

pub fn run(args: ConsoleCliArgs, out: &mut impl Write) -> anyhow::Result<Outcome> {
    let config = load_config(&args)?;
    let guard = AccessGuard::new(default_matrix(), config.pending_profile);
    match args.command {
        Command::Check {
            role,
            resource,
            action,
        } => run_check(&role, &resource, &action, out),
        Command::Matrix { format } => run_matrix(default_matrix(), format, out),
        Command::Views { role, loading } => {
            let session = session_for(role.as_deref(), loading);
            run_views(&guard, &session, out)
        }
        Command::Audit { file, command } => {
            let path = file
                .or(config.audit_file)
                .context("no audit file: pass --file or set audit_file in the config")?;
            run_audit(&guard, path, command, out)
        }
    }
}

fn session_for(role: Option<&str>, loading: bool) -> SessionState {
    if loading {
        return SessionState::Loading;
    }
    match role {
        Some(role) => SessionState::Authenticated(Profile {
            username: "console-access".to_string(),
            role: Some(role.to_string()),
        }),
        None => SessionState::Anonymous,
    }
}

fn run_check(
    role: &str,
    resource: &str,
    action: &str,
    out: &mut impl Write,
) -> anyhow::Result<Outcome> {
    let allowed = authorize_named(role, resource, action);
    tracing::debug!(role, resource, action, allowed, "named access check");
    if allowed {
        writeln!(out, "allowed")?;
        Ok(Outcome::Success)
    } else {
        writeln!(out, "denied")?;
        Ok(Outcome::Denied)
    }
}

fn flag(allowed: bool) -> &'static str {
    if allowed { "yes" } else { "no" }
}

fn run_matrix(
    matrix: &CapabilityMatrix,
    format: MatrixFormat,
    out: &mut impl Write,
) -> anyhow::Result<Outcome> {
    match format {
        MatrixFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, matrix)?;
            writeln!(out)?;
        }
        MatrixFormat::Table => {
            writeln!(
                out,
                "{:<6} {:<8} {:<5} {:<7} {:<7} {:<7} download",
                "role", "resource", "view", "create", "update", "delete"
            )?;
            for (role, resource, permission) in matrix.rows() {
                let download = match permission.download {
                    Some(allowed) => flag(allowed),
                    None => "-",
                };
                writeln!(
                    out,
                    "{:<6} {:<8} {:<5} {:<7} {:<7} {:<7} {download}",
                    role.as_str(),
                    resource.as_str(),
                    flag(permission.allows(Action::View)),
                    flag(permission.allows(Action::Create)),
                    flag(permission.allows(Action::Update)),
                    flag(permission.allows(Action::Delete)),
                )?;
            }
        }
    }
    Ok(Outcome::Success)
}

fn run_views(
    guard: &AccessGuard<'_>,
    session: &SessionState,
    out: &mut impl Write,
) -> anyhow::Result<Outcome> {
    writeln!(out, "user: {}", session.display_name())?;
    writeln!(out, "views:")?;
    for view in visible_views(guard, session) {
        writeln!(out, "  {}", view.label())?;
    }
    writeln!(out, "menu:")?;
    for entry in visible_menu(guard, session) {
        writeln!(out, "  {}", entry.label())?;
    }
    Ok(Outcome::Success)
}

fn run_audit(
    guard: &AccessGuard<'_>,
    path: PathBuf,
    command: AuditCommand,
    out: &mut impl Write,
) -> anyhow::Result<Outcome> {
    let store = JsonFileStore::new(path);
    match command {
        AuditCommand::Record {
            user,
            event,
            description,
        } => {
            let mut record = AuditRecord::new(&event, &user);
            if let Some(description) = description.as_deref() {
                record = record.with_description(description);
            }
            let entry = store.append(record)?;
            writeln!(out, "recorded audit entry {}", entry.id)?;
            Ok(Outcome::Success)
        }
        AuditCommand::List { as_role, format } => {
            let session = session_for(Some(&as_role), false);
            let entries = match store.list_for(guard, &session) {
                Ok(entries) => entries,
                Err(console_persist::PersistError::Security(err)) => {
                    writeln!(out, "denied: {err}")?;
                    return Ok(Outcome::Denied);
                }
                Err(err) => return Err(err.into()),
            };
            let format = match format {
                ListFormat::Json => ExportFormat::Json,
                ListFormat::Markdown => ExportFormat::Markdown,
            };
            let rendered = export_audits(&entries, format)?;
            writeln!(out, "{}", rendered.trim_end())?;
            Ok(Outcome::Success)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    fn run_args(args: &[&str]) -> (anyhow::Result<Outcome>, String) {
        let parsed = ConsoleCliArgs::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        let result = run(parsed, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_check_allowed_and_denied() {
        let (result, out) = run_args(&["console-access", "check", "user", "export", "download"]);
        assert_eq!(result.unwrap(), Outcome::Success);
        assert_eq!(out, "allowed\n");

        let (result, out) = run_args(&["console-access", "check", "user", "config", "view"]);
        assert_eq!(result.unwrap(), Outcome::Denied);
        assert_eq!(out, "denied\n");
    }

    #[test]
    fn test_check_unknown_names() {
        let (result, _) = run_args(&["console-access", "check", "guest", "export", "view"]);
        assert_eq!(result.unwrap(), Outcome::Denied);
        let (result, _) = run_args(&["console-access", "check", "admin", "cameras", "view"]);
        assert_eq!(result.unwrap(), Outcome::Success);
    }

    #[test]
    fn test_matrix_table() {
        let (result, out) = run_args(&["console-access", "matrix"]);
        assert_eq!(result.unwrap(), Outcome::Success);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("role"));
        let export_row = lines
            .iter()
            .find(|line| line.starts_with("user   export"))
            .copied()
            .unwrap_or_default();
        assert_eq!(
            export_row.split_whitespace().collect::<Vec<_>>(),
            vec!["user", "export", "yes", "no", "no", "no", "yes"]
        );
    }

    #[test]
    fn test_matrix_json() {
        let (result, out) = run_args(&["console-access", "matrix", "--format", "json"]);
        assert_eq!(result.unwrap(), Outcome::Success);
        let parsed: CapabilityMatrix = serde_json::from_str(&out).unwrap();
        assert_eq!(&parsed, default_matrix());
    }

    #[test]
    fn test_views_for_user() {
        let (result, out) = run_args(&["console-access", "views", "--role", "user"]);
        assert_eq!(result.unwrap(), Outcome::Success);
        assert!(out.contains("UI settings"));
        assert!(!out.contains("audit logs"));
        assert!(out.contains("Download export"));
        assert!(!out.contains("  Settings"));
    }

    #[test]
    fn test_views_while_loading() {
        let (result, out) = run_args(&["console-access", "views", "--loading"]);
        assert_eq!(result.unwrap(), Outcome::Success);
        assert_eq!(out, "user: anonymous\nviews:\nmenu:\n");
    }

    #[test]
    fn test_audit_without_file_fails() {
        let (result, _) = run_args(&["console-access", "audit", "list", "--as-role", "admin"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_audit_record_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("audits.json");
        let file = file.to_str().unwrap();

        let (result, out) = run_args(&[
            "console-access",
            "audit",
            "--file",
            file,
            "record",
            "--user",
            "alice",
            "--event",
            "Export",
            "--description",
            "alice created an export for porch",
        ]);
        assert_eq!(result.unwrap(), Outcome::Success);
        assert_eq!(out, "recorded audit entry 1\n");

        let (result, out) = run_args(&[
            "console-access",
            "audit",
            "--file",
            file,
            "list",
            "--as-role",
            "user",
        ]);
        assert_eq!(result.unwrap(), Outcome::Denied);
        assert!(out.starts_with("denied:"));

        let (result, out) = run_args(&[
            "console-access",
            "audit",
            "--file",
            file,
            "list",
            "--as-role",
            "admin",
            "--format",
            "markdown",
        ]);
        assert_eq!(result.unwrap(), Outcome::Success);
        assert!(out.contains("alice created an export for porch"));
    }

    #[test]
    fn test_config_audit_file_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let audit = dir.path().join("trail.json");
        let config = dir.path().join("security.toml");
        std::fs::write(
            &config,
            format!("audit_file = {:?}\n", audit.to_str().unwrap()),
        )
        .unwrap();
        let config = config.to_str().unwrap();

        let (result, _) = run_args(&[
            "console-access",
            "--config",
            config,
            "audit",
            "record",
            "--user",
            "root",
            "--event",
            "Delete Export",
        ]);
        assert_eq!(result.unwrap(), Outcome::Success);
        assert!(audit.exists());
    }
}
