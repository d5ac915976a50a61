use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkmate_api::config::ServerConfig;
use checkmate_api::router::build_app_router;
use checkmate_api::state::AppState;
use checkmate_api::background;
use checkmate_db::repositories::UserRepo;
use checkmate_events::{EmailConfig, EmailDelivery, EventBus, NotificationDispatcher, PushDelivery, VapidConfig};
use checkmate_mpesa::{MpesaClient, MpesaConfig, PaymentGateway};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkmate_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = checkmate_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    checkmate_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    checkmate_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Bootstrap admin ---
    if let Some(admin_email) = &config.admin_email {
        match UserRepo::promote_to_admin(&pool, admin_email).await {
            Ok(true) => tracing::info!(email = %admin_email, "Bootstrap admin promoted"),
            Ok(false) => tracing::debug!(email = %admin_email, "Bootstrap admin not registered yet"),
            Err(e) => tracing::error!(error = %e, "Bootstrap admin promotion failed"),
        }
    }

    // --- Payment gateway ---
    let mpesa_config = MpesaConfig::from_env().expect("M-Pesa configuration invalid");
    let gateway: Arc<dyn PaymentGateway> = Arc::new(MpesaClient::new(mpesa_config));
    tracing::info!("Payment gateway configured");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    // --- Push notifications (optional) ---
    let mut vapid_public_key = None;
    let mut dispatcher_handle = None;
    if let Some(vapid) = VapidConfig::from_env() {
        vapid_public_key = Some(vapid.public_key.clone());
        let delivery = PushDelivery::new(vapid).expect("VAPID private key invalid");
        dispatcher_handle = Some(tokio::spawn(NotificationDispatcher::run(
            pool.clone(),
            delivery,
            event_bus.subscribe(),
        )));
        tracing::info!("Admin push notifications enabled");
    } else {
        tracing::info!("VAPID keys not set, push notifications disabled");
    }

    // --- Email (optional) ---
    let mailer = match EmailConfig::from_env() {
        Some(email_config) => {
            tracing::info!("SMTP mailer configured");
            Some(Arc::new(EmailDelivery::new(email_config)))
        }
        None => {
            tracing::info!("SMTP_HOST not set, email delivery disabled");
            None
        }
    };

    // --- Background jobs ---
    let cleanup_cancel = CancellationToken::new();
    let order_cleanup_handle = tokio::spawn(background::order_cleanup::run(
        pool.clone(),
        cleanup_cancel.clone(),
    ));
    let token_cleanup_handle = tokio::spawn(background::token_cleanup::run(
        pool.clone(),
        cleanup_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        gateway,
        mailer,
        vapid_public_key,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cleanup_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), order_cleanup_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), token_cleanup_handle).await;
    tracing::info!("Background jobs stopped");

    // Dropping the bus closes the broadcast channel, which ends the
    // dispatcher loop.
    drop(event_bus);
    if let Some(handle) = dispatcher_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    tracing::info!("Notification dispatcher shut down");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
