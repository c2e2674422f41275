use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{fmt, EnvFilter};

use syzygy::accounts::{
    AccountSource, CommandAccountSource, FileAccountSource, StaticAccountSource,
};
use syzygy::service::Reconciler;
use syzygy::settings::{AccountBackend, Settings, StoreBackend};
use syzygy::store::{FilePolicyStore, KubeConfigMapStore, MemoryPolicyStore, PolicyStore};
use syzygy::web;

#[derive(Parser, Debug)]
#[command(name = "syzygy", version, about = "RBAC policy reconciliation engine")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP reconciliation API
    Serve,
    /// List all known roles
    Roles,
    /// List the effective members of a role
    Members { role: String },
    /// List the effective roles of a subject
    SubjectRoles { subject: String },
    /// Grant a role to a subject
    Grant { subject: String, role: String },
    /// Revoke a role from a subject
    Revoke { subject: String, role: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let settings = Settings::load(&cli.config)?;
    tracing::debug!(?settings, "Loaded configuration");

    let reconciler = Arc::new(build_reconciler(&settings));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => web::serve(&settings, reconciler).await?,
        Command::Roles => {
            let roles = reconciler.list_roles().await?;
            print_json(&roles)?;
        }
        Command::Members { role } => {
            let members = reconciler.resolve_role_members(&role).await?;
            print_json(&members)?;
        }
        Command::SubjectRoles { subject } => {
            let roles = reconciler.resolve_subject_roles(&subject).await?;
            print_json(&roles)?;
        }
        Command::Grant { subject, role } => {
            let outcome = reconciler.grant_role(&subject, &role).await?;
            print_json(&outcome)?;
        }
        Command::Revoke { subject, role } => {
            let outcome = reconciler.revoke_role(&subject, &role).await?;
            print_json(&outcome)?;
        }
    }
    Ok(())
}

fn build_reconciler(settings: &Settings) -> Reconciler {
    let store: Arc<dyn PolicyStore> = match settings.store.backend {
        StoreBackend::File => Arc::new(FilePolicyStore::new(&settings.store.path)),
        StoreBackend::Kubernetes => Arc::new(KubeConfigMapStore::new(
            &settings.store.configmap,
            &settings.store.namespace,
        )),
        StoreBackend::Memory => Arc::new(MemoryPolicyStore::default()),
    };

    let accounts: Arc<dyn AccountSource> = match settings.accounts.source {
        AccountBackend::Static => Arc::new(StaticAccountSource::default()),
        AccountBackend::File => Arc::new(FileAccountSource::new(&settings.accounts.path)),
        AccountBackend::Command => {
            Arc::new(CommandAccountSource::new(settings.accounts.command.clone()))
        }
    };

    Reconciler::new(store, accounts)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).into_diagnostic()?
    );
    Ok(())
}
