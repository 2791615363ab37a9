use std::{process, time::Duration};

use pressroom::{
    application::error::AppError,
    config::{self, Command, Settings, WarmArgs},
    infra::{
        bootstrap::{ApplicationContext, build_application_context, content_source},
        cache_warmer::CacheWarmer,
        error::InfraError,
        http,
        telemetry,
    },
};
use tokio::signal;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let app = build_application_context(&settings, content_source(&settings)?);

    match command {
        Command::Serve(_) => run_serve(&settings, app).await,
        Command::Warm(args) => run_warm(app, args).await,
    }
}

async fn run_serve(settings: &Settings, app: ApplicationContext) -> Result<(), AppError> {
    if settings.cache.warm_on_startup && app.documents.is_some() {
        let warmer = CacheWarmer::new(app.content.clone());
        tokio::spawn(async move {
            if let Err(err) = warmer.warm_initial().await {
                warn!(target = "pressroom::cache_warmer", error = %err, "startup warm-up failed");
            }
        });
    }

    serve_http(settings, app).await
}

async fn run_warm(app: ApplicationContext, args: WarmArgs) -> Result<(), AppError> {
    let report = CacheWarmer::new(app.content)
        .by_slug(args.by_slug)
        .warm_initial()
        .await?;

    info!(
        listings = report.listings,
        documents = report.documents,
        failures = report.failures,
        "content API reachable"
    );
    Ok(())
}

async fn serve_http(settings: &Settings, app: ApplicationContext) -> Result<(), AppError> {
    let router = http::build_router(app.router_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(settings.server.graceful_shutdown))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

/// Resolves on Ctrl-C or SIGTERM, then arms a hard deadline for in-flight
/// requests.
async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!(grace_secs = grace.as_secs(), "shutdown signal received, draining connections");
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        error!("graceful shutdown deadline exceeded, exiting");
        process::exit(1);
    });
}
