//! Mass contact delivery worker entry point.
//!
//! Runs the message (fan-out) and batch (send) workers against the Redis
//! queues until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use masscontact_common::Config;
use masscontact_core::adapters::{DbArchiveStore, DbCategoryStore, DbRecipientDirectory};
use masscontact_core::models::DeliveryDefaults;
use masscontact_core::providers::{ListProvider, RoleProvider};
use masscontact_core::{
    MessageDispatcher, OptOutFilter, ProviderRegistry, RecipientResolver, SmtpMailTransport,
};
use masscontact_db::repositories::{CategoryRepository, MessageRepository, UserRepository};
use masscontact_queue::{
    DeliveryQueue, QueueBackend, RedisQueue, ResolveContext, ResolveMessageJob, RetryConfig,
    SendBatchJob, SendContext, resolve_message_worker, run_worker, send_batch_worker,
};
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Log as JSON when `MASSCONTACT_LOG_FORMAT=json`.
fn init_tracing() {
    let json = std::env::var("MASSCONTACT_LOG_FORMAT").is_ok_and(|f| f == "json");

    tracing_subscriber::registry()
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "masscontact=info".into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting mass contact workers...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = masscontact_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    masscontact_db::migrate(&db).await?;
    info!("Migrations completed");

    // Connect to Redis and open both pipeline stages
    info!("Connecting to Redis...");
    let redis_conn = masscontact_queue::connect(&config.redis.url).await?;
    let messages: Arc<dyn QueueBackend<ResolveMessageJob>> = Arc::new(RedisQueue::new(
        redis_conn.clone(),
        &config.redis.prefix,
        "messages",
    ));
    let batches: Arc<dyn QueueBackend<SendBatchJob>> =
        Arc::new(RedisQueue::new(redis_conn, &config.redis.prefix, "batches"));
    info!("Connected to Redis job queue");

    // Nothing else consumes these queues yet, so anything in flight was
    // abandoned by a previous process.
    let recovered = messages.recover().await? + batches.recover().await?;
    if recovered > 0 {
        warn!(recovered, "Requeued items abandoned by a previous run");
    }

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let category_repo = CategoryRepository::new(Arc::clone(&db));
    let message_repo = MessageRepository::new(Arc::clone(&db));

    // Initialize services
    let directory = Arc::new(DbRecipientDirectory::new(user_repo.clone()));
    let registry = ProviderRegistry::new()
        .with(Arc::new(RoleProvider::new(user_repo.clone())))
        .with(Arc::new(ListProvider::new(user_repo)));
    let resolver = RecipientResolver::new(
        Arc::new(registry),
        OptOutFilter::new(config.mass_contact.optout_mode, directory.clone()),
    );
    let transport = Arc::new(SmtpMailTransport::new(&config.smtp)?);
    let dispatcher = MessageDispatcher::new(
        transport,
        directory,
        config.mass_contact.default_language.clone(),
    );

    let resolve_ctx = Arc::new(ResolveContext {
        categories: Arc::new(DbCategoryStore::new(category_repo)),
        resolver,
        archive: Arc::new(DbArchiveStore::new(message_repo)),
        queue: DeliveryQueue::new(messages.clone(), batches.clone()),
        defaults: DeliveryDefaults::from(&config.mass_contact),
        batch_size: config.mass_contact.batch_size,
    });
    let send_ctx = Arc::new(SendContext::new(dispatcher));

    // Start workers
    let retry = RetryConfig::from(&config.queue);
    let poll_interval = Duration::from_millis(config.queue.poll_interval_ms);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut workers = Vec::new();

    for _ in 0..config.queue.resolve_workers.max(1) {
        let ctx = Arc::clone(&resolve_ctx);
        workers.push(tokio::spawn(run_worker(
            "resolve",
            messages.clone(),
            retry.clone(),
            poll_interval,
            shutdown_rx.clone(),
            move |job| {
                let ctx = Arc::clone(&ctx);
                async move { resolve_message_worker(job, &ctx).await.map(|_| ()) }
            },
        )));
    }

    for _ in 0..config.queue.send_workers.max(1) {
        let ctx = Arc::clone(&send_ctx);
        workers.push(tokio::spawn(run_worker(
            "send",
            batches.clone(),
            retry.clone(),
            poll_interval,
            shutdown_rx.clone(),
            move |job| {
                let ctx = Arc::clone(&ctx);
                async move { send_batch_worker(job, &ctx).await }
            },
        )));
    }

    info!(
        resolve_workers = config.queue.resolve_workers.max(1),
        send_workers = config.queue.send_workers.max(1),
        "Workers started"
    );

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    for worker in workers {
        if let Err(e) = worker.await {
            warn!(error = %e, "Worker task ended abnormally");
        }
    }

    info!("Shutdown complete");
    Ok(())
}
