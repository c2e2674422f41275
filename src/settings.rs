use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    pub server: Server,
    pub store: Store,
    pub accounts: Accounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

/// Which backend holds the policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    File,
    Kubernetes,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub backend: StoreBackend,
    /// Document path for the `file` backend.
    pub path: PathBuf,
    /// ConfigMap name for the `kubernetes` backend.
    pub configmap: String,
    /// Namespace for the `kubernetes` backend.
    pub namespace: String,
}

/// Where the local account list comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountBackend {
    Static,
    File,
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Accounts {
    pub source: AccountBackend,
    /// Accounts JSON path for the `file` source.
    pub path: PathBuf,
    /// Argv for the `command` source, e.g. ["argocd", "account", "list", "--output", "json"].
    #[serde(default)]
    pub command: Vec<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: PathBuf::from("policy.csv"),
            configmap: "argocd-rbac-cm".to_string(),
            namespace: "argocd".to_string(),
        }
    }
}

impl Default for Accounts {
    fn default() -> Self {
        Self {
            source: AccountBackend::Static,
            path: PathBuf::from("accounts.json"),
            command: Vec::new(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        let builder = config::Config::builder()
            .set_default("server.host", Server::default().host)
            .into_diagnostic()?
            .set_default("server.port", Server::default().port)
            .into_diagnostic()?
            .set_default("store.backend", "file")
            .into_diagnostic()?
            .set_default(
                "store.path",
                Store::default().path.to_string_lossy().to_string(),
            )
            .into_diagnostic()?
            .set_default("store.configmap", Store::default().configmap)
            .into_diagnostic()?
            .set_default("store.namespace", Store::default().namespace)
            .into_diagnostic()?
            .set_default("accounts.source", "static")
            .into_diagnostic()?
            .set_default(
                "accounts.path",
                Accounts::default().path.to_string_lossy().to_string(),
            )
            .into_diagnostic()?;

        // Optional file
        let builder = if std::path::Path::new(path).exists() {
            builder.add_source(config::File::with_name(path))
        } else {
            builder
        };

        // Environment overrides: SYZYGY__SERVER__PORT=9090, etc.
        let builder =
            builder.add_source(config::Environment::with_prefix("SYZYGY").separator("__"));

        let cfg = builder.build().into_diagnostic()?;
        cfg.try_deserialize().into_diagnostic()
    }
}
