use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use pose_feedback_service::{
    config::Config,
    extractor::{ExtractionGate, HttpLandmarkExtractor},
    kinematics::KinematicCalculator,
    logging,
    pipeline::FramePipeline,
    pose::PoseCatalog,
    routes,
    session::{CloseReason, IdleReaper, SessionRegistry},
    state::AppState,
};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        host = %config.host,
        port = config.port,
        max_sessions = config.session.max_sessions,
        "Starting pose-feedback-service"
    );

    let extraction = match &config.extractor.url {
        Some(url) => {
            let extractor = HttpLandmarkExtractor::new(url.clone(), config.extractor.timeout)
                .context("failed to build landmark extractor client")?;
            info!(url = %url, max_in_flight = config.extractor.max_in_flight, "Landmark extractor configured");
            ExtractionGate::new(
                Arc::new(extractor),
                config.extractor.max_in_flight,
                config.extractor.timeout,
            )
        }
        None => {
            warn!("EXTRACTOR_URL not set; only client-side landmark frames will be processed");
            ExtractionGate::unavailable()
        }
    };

    let pipeline = Arc::new(FramePipeline::new(
        PoseCatalog::shared(),
        KinematicCalculator::new(config.extractor.min_visibility),
        extraction,
    ));
    let registry = SessionRegistry::new(pipeline, config.session_settings());

    let (reaper_shutdown, reaper_task) = IdleReaper::new(
        registry.clone(),
        config.session.idle_timeout,
        config.session.reaper_interval,
    )
    .spawn();

    let state = web::Data::new(AppState::new(registry.clone()));
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .disable_signals()
    .run();

    let server_handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;

        let _ = reaper_shutdown.send(());
        if let Err(e) = reaper_task.await {
            warn!(error = %e, "IdleReaper task failed");
        }

        let closed = registry.close_all(CloseReason::Shutdown).await;
        info!(closed, "Sessions closed, stopping HTTP server");
        server_handle.stop(true).await;
    });

    server.await.context("HTTP server error")?;
    info!("pose-feedback-service shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutting down gracefully...");
}
