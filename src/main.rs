// src/main.rs
use anyhow::Result;
use health_aggregator::{
    config::{self, Config},
    health::{HealthService, StatusStore},
    metrics::MetricsRegistry,
    probes,
    server::{RequestHandler, ServerBuilder},
};
use hyper::{Body, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("health_aggregator=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config(&config_path).await?;

    let metrics_registry = Arc::new(MetricsRegistry::new()?);
    let service = Arc::new(build_service(&config, &metrics_registry)?);

    // Initial pass, then one scheduled task per checker
    let check_tasks = service.start_background_check().await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if config.metrics.enabled {
        let metrics_addr: SocketAddr = ([0, 0, 0, 0], config.metrics.port).into();
        start_metrics_server(
            metrics_addr,
            metrics_registry.clone(),
            config.metrics.path.clone(),
            shutdown_rx.clone(),
        )?;
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Starting health server on {}", addr);

    let server = ServerBuilder::new(addr)
        .with_handler(RequestHandler::new(service.clone()))
        .with_shutdown(shutdown_signal());

    let result = server.serve().await;

    let _ = shutdown_tx.send(true);
    service.shutdown();
    for task in futures::future::join_all(check_tasks).await {
        if let Err(e) = task {
            error!("Scheduled health check task failed: {}", e);
        }
    }
    info!("All scheduled health checks stopped");

    result
}

fn build_service(config: &Config, metrics: &MetricsRegistry) -> Result<HealthService> {
    let collector = metrics.collector();
    let mut service = HealthService::new(Arc::new(StatusStore::new())).with_metrics(collector.clone());

    for check in &config.checks {
        // One probe instance per check, shared by both classes.
        let probe = probes::build_probe(check)?;
        let checker_config = check.checker_config();

        info!(
            checker = %check.name,
            kind = probe.kind(),
            readiness = check.readiness,
            liveness = check.liveness,
            "Registering health check"
        );

        if check.readiness {
            service.register_readiness(check.name.clone(), probe.clone(), checker_config);
        }
        if check.liveness {
            service.register_liveness(check.name.clone(), probe, checker_config);
        }
    }

    collector.set_registered_checkers(service.checker_count());
    Ok(service)
}

fn start_metrics_server(
    addr: SocketAddr,
    registry: Arc<MetricsRegistry>,
    path: String,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let metrics_path = Arc::new(path);
    let service_path = metrics_path.clone();

    let make_service = hyper::service::make_service_fn(move |_| {
        let registry = registry.clone();
        let path = service_path.clone();

        async move {
            Ok::<_, Infallible>(hyper::service::service_fn(move |req: Request<Body>| {
                let registry = registry.clone();
                let path = path.clone();

                async move { Ok::<_, Infallible>(metrics_response(&req, &registry, &path)) }
            }))
        }
    });

    let server = Server::try_bind(&addr)?
        .serve(make_service)
        .with_graceful_shutdown(async move {
            while shutdown_rx.changed().await.is_ok() {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        });

    info!(
        "Metrics server listening on http://{}{}",
        addr,
        metrics_path.as_str()
    );

    tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(())
}

fn metrics_response(req: &Request<Body>, registry: &MetricsRegistry, path: &str) -> Response<Body> {
    if req.uri().path() != path {
        return status_response(StatusCode::NOT_FOUND, "Not Found");
    }

    match registry.gather() {
        Ok(metrics) => {
            let mut response = Response::new(Body::from(metrics));
            response.headers_mut().insert(
                hyper::header::CONTENT_TYPE,
                hyper::header::HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            status_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics")
        }
    }
}

fn status_response(status: StatusCode, message: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
