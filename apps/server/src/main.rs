use anyhow::Context;
use staffdesk_auth::{AuthService, AuthState, AuthStateBroadcaster};
use staffdesk_config::load as load_config;
use staffdesk_employees::EmployeeRepository;
use tokio::{fs, signal};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(env_filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("starting Staffdesk backend");

    let config = load_config().context("failed to load configuration")?;

    // The stores treat missing files as empty collections, but the
    // directories they live in must exist before the first save.
    fs::create_dir_all(&config.storage.data_dir)
        .await
        .with_context(|| format!("failed to create data directory {}", config.storage.data_dir))?;
    fs::create_dir_all(config.storage.users_dir())
        .await
        .with_context(|| {
            format!(
                "failed to create users directory {}",
                config.storage.users_dir().display()
            )
        })?;

    let employees = EmployeeRepository::new(
        config.storage.employees_path(),
        config.storage.on_corrupt,
    );
    let auth = AuthService::new(config.storage.users_path(), config.storage.on_corrupt);
    let broadcaster = AuthStateBroadcaster::new(auth.clone());

    let employee_count = employees
        .employees()
        .await
        .context("failed to read employee store")?
        .len();
    let user_count = auth
        .users()
        .await
        .context("failed to read user store")?
        .len();
    info!(employee_count, user_count, "record stores ready");

    // Audit-log subscriber: every login/logout transition is recorded.
    let mut auth_events = broadcaster.subscribe();
    tokio::spawn(async move {
        while let Ok(state) = auth_events.recv().await {
            match state {
                AuthState::Authenticated(claims) => {
                    info!(username = %claims.username, role = %claims.role, "audit: login")
                }
                AuthState::Anonymous => info!("audit: logout"),
            }
        }
    });

    info!("Staffdesk backend ready, waiting for shutdown signal");

    signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received, exiting");

    Ok(())
}
