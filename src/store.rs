//! Policy document store port.
//!
//! The backing store is a single shared text document with no locking
//! contract: writers follow read-modify-write of the whole document, and a
//! concurrent writer between the read and the write causes a lost update.
//! This engine does not detect or recover from that race — callers needing
//! strict consistency must serialize writers externally. The port is kept
//! narrow so a future implementation can add an optimistic-concurrency token
//! without touching resolution logic.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("policy store unavailable: {0}")]
    #[diagnostic(code(syzygy::store::unavailable))]
    Unavailable(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(syzygy::store::io))]
    Io(#[from] std::io::Error),
}

/// Load/save boundary for the raw policy document text.
///
/// Timeouts, cancellation and retry policy all belong to implementations of
/// this trait; the engine propagates failures unchanged and never retries.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn load(&self) -> Result<String, StoreError>;
    async fn save(&self, raw: &str) -> Result<(), StoreError>;

    /// Human-readable backend identifier used in logs.
    fn store_name(&self) -> &'static str;
}

/// In-memory store: the reference implementation for tests and local
/// experimentation. Not durable.
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    raw: Arc<RwLock<String>>,
    saves: AtomicUsize,
}

impl MemoryPolicyStore {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            raw: Arc::new(RwLock::new(initial.into())),
            saves: AtomicUsize::new(0),
        }
    }

    /// Current document text, for test assertions.
    pub async fn contents(&self) -> String {
        self.raw.read().await.clone()
    }

    /// Number of completed `save` calls, for asserting that no-op outcomes
    /// perform no write-back.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn load(&self) -> Result<String, StoreError> {
        Ok(self.raw.read().await.clone())
    }

    async fn save(&self, raw: &str) -> Result<(), StoreError> {
        *self.raw.write().await = raw.to_string();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

/// File-backed store. A missing file loads as an empty document so a fresh
/// deployment can bootstrap its policy with the first grant.
#[derive(Debug, Clone)]
pub struct FilePolicyStore {
    path: PathBuf,
}

impl FilePolicyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PolicyStore for FilePolicyStore {
    async fn load(&self) -> Result<String, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, raw: &str) -> Result<(), StoreError> {
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "file"
    }
}

/// Shape of `kubectl get configmap -o json` output.
#[derive(Debug, Deserialize)]
struct ConfigMap {
    #[serde(default)]
    data: HashMap<String, String>,
}

fn patch_op(cm: &ConfigMap, key: &str) -> &'static str {
    if cm.data.contains_key(key) {
        "replace"
    } else {
        "add"
    }
}

/// Store backed by a Kubernetes ConfigMap, accessed by shelling out to
/// `kubectl`. The ConfigMap keeps the policy rows and the default-role
/// setting under two separate keys; this store splices the setting into the
/// document as a `policy.default=` line on load and splits it back out on
/// save, so the engine only ever sees one document.
#[derive(Debug, Clone)]
pub struct KubeConfigMapStore {
    configmap: String,
    namespace: String,
    csv_key: String,
    default_key: String,
}

impl KubeConfigMapStore {
    pub fn new(configmap: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            configmap: configmap.into(),
            namespace: namespace.into(),
            csv_key: "policy.csv".to_string(),
            default_key: "policy.default".to_string(),
        }
    }

    async fn fetch_configmap(&self) -> Result<ConfigMap, StoreError> {
        let output = self
            .run_kubectl(&[
                "get",
                "configmap",
                &self.configmap,
                "-n",
                &self.namespace,
                "-o",
                "json",
            ])
            .await?;

        serde_json::from_slice(&output).map_err(|e| {
            StoreError::Unavailable(format!(
                "unparseable ConfigMap `{}` response: {}",
                self.configmap, e
            ))
        })
    }

    async fn run_kubectl(&self, args: &[&str]) -> Result<Vec<u8>, StoreError> {
        let output = tokio::process::Command::new("kubectl")
            .args(args)
            .output()
            .await?;

        if !output.status.success() {
            return Err(StoreError::Unavailable(format!(
                "kubectl {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output.stdout)
    }

    /// Split the engine-facing document into the ConfigMap's two keys.
    fn split_document(&self, raw: &str) -> (String, Option<String>) {
        let mut csv = String::new();
        let mut default_value = None;
        for line in raw.lines() {
            if let Some((key, value)) = line.trim().split_once('=') {
                if key.trim() == self.default_key {
                    default_value = Some(value.trim().to_string());
                    continue;
                }
            }
            csv.push_str(line);
            csv.push('\n');
        }
        (csv, default_value)
    }
}

#[async_trait]
impl PolicyStore for KubeConfigMapStore {
    async fn load(&self) -> Result<String, StoreError> {
        let cm = self.fetch_configmap().await?;

        let mut raw = cm.data.get(&self.csv_key).cloned().unwrap_or_default();
        if !raw.is_empty() && !raw.ends_with('\n') {
            raw.push('\n');
        }
        if let Some(default) = cm.data.get(&self.default_key) {
            raw.push_str(&format!("{}={}\n", self.default_key, default));
        }
        Ok(raw)
    }

    async fn save(&self, raw: &str) -> Result<(), StoreError> {
        let (csv, default_value) = self.split_document(raw);

        // Key existence decides between a JSON-patch `add` and `replace`.
        let cm = self.fetch_configmap().await?;
        let csv_op = patch_op(&cm, &self.csv_key);
        let mut ops = vec![serde_json::json!({
            "op": csv_op,
            "path": format!("/data/{}", self.csv_key),
            "value": csv,
        })];
        if let Some(default) = default_value {
            let default_op = patch_op(&cm, &self.default_key);
            ops.push(serde_json::json!({
                "op": default_op,
                "path": format!("/data/{}", self.default_key),
                "value": default,
            }));
        }

        let patch = serde_json::to_string(&ops)
            .map_err(|e| StoreError::Unavailable(format!("failed to build patch: {}", e)))?;

        self.run_kubectl(&[
            "patch",
            "configmap",
            &self.configmap,
            "-n",
            &self.namespace,
            "--type=json",
            "-p",
            &patch,
        ])
        .await?;
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "kubernetes"
    }
}
