//! Account enumeration port.
//!
//! The engine never owns identity: local accounts are read-only facts
//! supplied by an external source as a flat name+enabled list. Sources are
//! re-queried on every resolution — account lists change between calls.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A local identity account, as reported by the identity source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Opaque pass-through metadata; never consulted by resolution.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Error, Diagnostic)]
pub enum AccountError {
    #[error("account source unavailable: {0}")]
    #[diagnostic(code(syzygy::accounts::unavailable))]
    Unavailable(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(syzygy::accounts::io))]
    Io(#[from] std::io::Error),

    #[error("failed to parse account list: {0}")]
    #[diagnostic(code(syzygy::accounts::parse))]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait AccountSource: Send + Sync {
    async fn list_accounts(&self) -> Result<Vec<Account>, AccountError>;

    /// Human-readable source identifier used in logs.
    fn source_name(&self) -> &'static str;
}

/// Fixed in-memory account list, for tests and statically-configured
/// deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticAccountSource {
    accounts: Vec<Account>,
}

impl StaticAccountSource {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl AccountSource for StaticAccountSource {
    async fn list_accounts(&self) -> Result<Vec<Account>, AccountError> {
        Ok(self.accounts.clone())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// Root structure of the accounts JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccountsFile {
    accounts: Vec<Account>,
}

/// Accounts from a JSON file: `{"accounts": [{"name": "alice", ...}, ...]}`.
#[derive(Debug, Clone)]
pub struct FileAccountSource {
    path: PathBuf,
}

impl FileAccountSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AccountSource for FileAccountSource {
    async fn list_accounts(&self) -> Result<Vec<Account>, AccountError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let file: AccountsFile = serde_json::from_str(&content)?;
        Ok(file.accounts)
    }

    fn source_name(&self) -> &'static str {
        "file"
    }
}

/// Accounts from an external command that prints a JSON account array on
/// stdout (e.g. the upstream CLI's `account list --output json`).
#[derive(Debug, Clone)]
pub struct CommandAccountSource {
    argv: Vec<String>,
}

impl CommandAccountSource {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

#[async_trait]
impl AccountSource for CommandAccountSource {
    async fn list_accounts(&self) -> Result<Vec<Account>, AccountError> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| AccountError::Unavailable("empty account command".to_string()))?;

        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await?;

        if !output.status.success() {
            return Err(AccountError::Unavailable(format!(
                "`{}` failed: {}",
                program,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let accounts: Vec<Account> = serde_json::from_slice(&output.stdout)?;
        Ok(accounts)
    }

    fn source_name(&self) -> &'static str {
        "command"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_enabled_defaults_to_true() {
        let account: Account = serde_json::from_str(r#"{"name": "alice"}"#).unwrap();
        assert!(account.enabled);
        assert!(account.capabilities.is_empty());

        let account: Account =
            serde_json::from_str(r#"{"name": "bob", "enabled": false, "capabilities": ["login"]}"#)
                .unwrap();
        assert!(!account.enabled);
        assert_eq!(account.capabilities, vec!["login"]);
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticAccountSource::new(vec![Account {
            name: "alice".into(),
            enabled: true,
            capabilities: Vec::new(),
        }]);
        let accounts = source.list_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(source.source_name(), "static");
    }

    #[tokio::test]
    async fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(
            &path,
            r#"{"accounts": [{"name": "alice"}, {"name": "bob", "enabled": false}]}"#,
        )
        .unwrap();

        let source = FileAccountSource::new(&path);
        let accounts = source.list_accounts().await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].name, "alice");
        assert!(!accounts[1].enabled);
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let source = FileAccountSource::new("/nonexistent/accounts.json");
        let err = source.list_accounts().await.unwrap_err();
        assert!(matches!(err, AccountError::Io(_)));
    }

    #[tokio::test]
    async fn test_command_source() {
        let source = CommandAccountSource::new(vec![
            "echo".to_string(),
            r#"[{"name": "alice", "enabled": true}]"#.to_string(),
        ]);
        let accounts = source.list_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].name, "alice");
    }

    #[tokio::test]
    async fn test_command_source_empty_argv() {
        let source = CommandAccountSource::new(Vec::new());
        let err = source.list_accounts().await.unwrap_err();
        assert!(matches!(err, AccountError::Unavailable(_)));
    }
}
