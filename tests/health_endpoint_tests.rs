// tests/health_endpoint_tests.rs
use async_trait::async_trait;
use health_aggregator::health::{
    CheckResult, CheckerConfig, HealthChecker, HealthService, ProbeError, StatusStore,
};
use health_aggregator::probes::TcpProbe;
use health_aggregator::server::{RequestHandler, ServerBuilder, LIVENESS_PATH, READINESS_PATH};
use hyper::{Body, Method, Request, StatusCode};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct StaticChecker {
    error: Option<&'static str>,
    calls: AtomicUsize,
}

impl StaticChecker {
    fn up() -> Arc<Self> {
        Arc::new(Self {
            error: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn down(error: &'static str) -> Arc<Self> {
        Arc::new(Self {
            error: Some(error),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl HealthChecker for StaticChecker {
    async fn check_health(&self) -> CheckResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let duration = Duration::from_micros(12_400);
        match self.error {
            None => CheckResult::up(duration),
            Some(error) => CheckResult::down(ProbeError::Connect(error.to_string()), duration),
        }
    }

    fn kind(&self) -> &'static str {
        "static"
    }
}

fn config() -> CheckerConfig {
    CheckerConfig::new(Duration::from_millis(500), Duration::from_secs(1))
}

async fn get_json(handler: RequestHandler, path: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .unwrap();

    let response = handler.oneshot(request).await.unwrap();
    let status = response.status();
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_cache_in_both_classes_reports_healthy() {
    let cache = StaticChecker::up();
    let mut service = HealthService::new(Arc::new(StatusStore::new()));
    service.register_readiness("Cache", cache.clone(), config());
    service.register_liveness("Cache", cache.clone(), config());

    let service = Arc::new(service);
    let handles = service.start_background_check().await;
    let handler = RequestHandler::new(service.clone());

    for path in [READINESS_PATH, LIVENESS_PATH] {
        let (status, body) = get_json(handler.clone(), path).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["checks"].as_array().unwrap().len(), 1);
        assert_eq!(body["checks"][0]["name"], "Cache");
        assert_eq!(body["checks"][0]["status"], "UP");
        assert_eq!(body["checks"][0]["duration"], "12.4ms");
        assert!(body["checks"][0].get("error").is_none());
    }

    // The startup pass probed the shared dependency once for both classes.
    assert_eq!(cache.calls.load(Ordering::SeqCst), 1);

    service.shutdown();
    futures::future::join_all(handles).await;
}

#[tokio::test]
async fn test_down_database_reports_unhealthy_with_error() {
    let mut service = HealthService::new(Arc::new(StatusStore::new()));
    service.register_readiness("DB", StaticChecker::down("connection refused"), config());
    service.check_all_health().await;

    let handler = RequestHandler::new(Arc::new(service));
    let (status, body) = get_json(handler, READINESS_PATH).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"][0]["name"], "DB");
    assert_eq!(body["checks"][0]["status"], "DOWN");
    assert_eq!(body["checks"][0]["error"], "connection refused");
}

#[tokio::test]
async fn test_liveness_only_checker_is_absent_from_readiness() {
    let mut service = HealthService::new(Arc::new(StatusStore::new()));
    service.register_liveness("Queue", StaticChecker::up(), config());
    service.check_all_health().await;

    let handler = RequestHandler::new(Arc::new(service));

    let (_, readiness) = get_json(handler.clone(), READINESS_PATH).await;
    assert_eq!(readiness["status"], "healthy");
    assert!(readiness["checks"]
        .as_array()
        .unwrap()
        .iter()
        .all(|check| check["name"] != "Queue"));

    let (_, liveness) = get_json(handler, LIVENESS_PATH).await;
    assert_eq!(liveness["checks"][0]["name"], "Queue");
}

#[tokio::test]
async fn test_one_down_checker_makes_class_unhealthy() {
    let mut service = HealthService::new(Arc::new(StatusStore::new()));
    service.register_readiness("A", StaticChecker::up(), config());
    service.register_readiness("B", StaticChecker::down("timeout"), config());
    service.check_all_health().await;

    let handler = RequestHandler::new(Arc::new(service));
    let (_, body) = get_json(handler, READINESS_PATH).await;

    assert_eq!(body["status"], "unhealthy");
    let checks = body["checks"].as_array().unwrap();
    assert_eq!(checks.len(), 2);
    assert_eq!(checks[0]["name"], "A");
    assert_eq!(checks[1]["name"], "B");
}

#[tokio::test]
async fn test_unknown_path_and_method_are_rejected() {
    let handler = RequestHandler::new(Arc::new(HealthService::new(Arc::new(StatusStore::new()))));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = handler.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let request = Request::builder()
        .method(Method::POST)
        .uri(READINESS_PATH)
        .body(Body::empty())
        .unwrap();
    let response = handler.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get("allow").unwrap(), "GET");
}

#[tokio::test]
async fn test_server_serves_reports_over_tcp_until_shutdown() {
    let dependency = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dependency_addr = dependency.local_addr().unwrap();

    let mut service = HealthService::new(Arc::new(StatusStore::new()));
    service.register_readiness(
        "Kafka",
        Arc::new(TcpProbe::new(dependency_addr.to_string(), config())),
        config(),
    );
    service.check_all_health().await;

    let addr = {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap()
    };

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = ServerBuilder::new(addr)
        .with_handler(RequestHandler::new(Arc::new(service)))
        .with_shutdown(async move {
            let _ = stop_rx.await;
        });
    let server_task = tokio::spawn(server.serve());

    let url = format!("http://{}{}", addr, READINESS_PATH);
    let mut body = None;
    for _ in 0..50 {
        if let Ok(response) = reqwest::get(&url).await {
            body = Some(response.json::<Value>().await.unwrap());
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let body = body.expect("server should answer readiness requests");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"][0]["name"], "Kafka");

    stop_tx.send(()).unwrap();
    let served = tokio::time::timeout(Duration::from_secs(2), server_task)
        .await
        .expect("server should stop after shutdown signal")
        .unwrap();
    assert!(served.is_ok());
}
