use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use promobot_audit::AuditLog;
use promobot_channels::SimulatedSink;
use promobot_control::ControlSurface;
use promobot_core::PromobotConfig;
use promobot_roles::RoleRegistry;
use promobot_scheduler::{JobRuntime, RuntimeConfig};
use promobot_templates::TemplateStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promobot=info".into()),
        )
        .init();

    // load config: explicit path via PROMOBOT_CONFIG > ~/.promobot/promobot.toml
    let config_path = std::env::var("PROMOBOT_CONFIG").ok();
    let config = PromobotConfig::load(config_path.as_deref())?;
    info!(owner = config.owner_id, safe_mode = config.safe_mode, "config loaded");

    // single SQLite file for all subsystems; each gets its own connection
    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let bootstrap = rusqlite::Connection::open(db_path)?;
    bootstrap.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    drop(bootstrap);

    let roles = Arc::new(RoleRegistry::new(config.owner()));
    let audit = Arc::new(AuditLog::new(rusqlite::Connection::open(db_path)?)?);
    let templates = Arc::new(TemplateStore::new(rusqlite::Connection::open(db_path)?)?);

    // No real transport is wired here; the simulated sink logs every post.
    let sink = Arc::new(SimulatedSink);
    let runtime = JobRuntime::new(
        rusqlite::Connection::open(db_path)?,
        sink,
        Arc::clone(&roles),
        Arc::clone(&audit),
        RuntimeConfig::from(&config),
    )?;
    let restored = runtime.recover()?;
    info!(restored, "job runtime ready");

    let _surface = Arc::new(ControlSurface::new(
        runtime.clone(),
        roles,
        templates,
        audit,
    ));

    // Retention sweep: move long-terminal jobs out of the live set.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let retention = std::time::Duration::from_secs(config.retention.terminal_secs);
    let sweeper = tokio::spawn(retention_sweep(runtime, retention, shutdown_rx));

    info!("promobot daemon running — press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    let _ = shutdown_tx.send(true);
    let _ = sweeper.await;
    Ok(())
}

/// Periodically evict terminal jobs past the retention window.
async fn retention_sweep(
    runtime: JobRuntime,
    retention: std::time::Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                runtime.evict_terminal(retention);
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("retention sweep shutting down");
                    break;
                }
            }
        }
    }
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
