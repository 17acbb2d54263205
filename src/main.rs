use dotenvy::dotenv;
use std::{sync::Arc, time::Duration};
use storefront::{
    api::{self, AppState},
    config::{database, seed, settings::Settings},
    core::user,
    errors::Result,
    notify::{DEFAULT_QUEUE_CAPACITY, LogMailer, Mailer, Notifier, SmtpMailer},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Settings
    let settings = Settings::from_env()
        .inspect_err(|e| error!("Critical error loading settings: {}", e))?;

    // 4. Database
    database::ensure_sqlite_dir(&settings.database_url)?;
    let db = database::create_connection(&settings.database_url)
        .await
        .inspect(|_| info!("Database connected successfully."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed default menu and content
    if settings.seed_path.exists() {
        let seed_config = seed::load_seed_config(&settings.seed_path)?;
        seed::apply_seed(&db, &seed_config)
            .await
            .inspect_err(|e| error!("Failed to apply seed data: {}", e))?;
    } else {
        warn!(path = %settings.seed_path.display(), "Seed file not found, skipping");
    }

    // 6. Admin account
    match &settings.bootstrap_admin {
        Some(bootstrap) => {
            user::ensure_bootstrap_admin(&db, bootstrap)
                .await
                .inspect_err(|e| error!("Failed to create admin account: {}", e))?;
        }
        None => warn!("ADMIN_PASSWORD not set, no admin account will be created"),
    }

    // 7. Notification worker
    let mailer: Arc<dyn Mailer> = match &settings.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp, &settings.from_email)?),
        None => Arc::new(LogMailer),
    };
    let (notifier, worker) =
        Notifier::spawn(mailer, settings.notify_email.clone(), DEFAULT_QUEUE_CAPACITY);

    // 8. Serve until shutdown
    api::serve(AppState::new(db, settings, notifier)).await?;

    // Every sender is gone once the router is dropped; let queued mail drain
    if tokio::time::timeout(Duration::from_secs(10), worker).await.is_err() {
        warn!("Notification worker did not finish in time");
    }

    Ok(())
}
