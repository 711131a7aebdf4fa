use actix_web::http::StatusCode;
use actix_web::{test, App};
use pose_feedback_service::routes;
use pose_feedback_service::session::{SessionId, SessionSettings};
use serde_json::Value;

use super::support::{app_state, registry};

#[actix_rt::test]
async fn health_reports_degraded_without_extractor() {
    let registry = registry(SessionSettings::default());
    let app = test::init_service(
        App::new()
            .app_data(app_state(registry.clone()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["extractor"], false);
    assert_eq!(body["services"]["pose_engine"], true);
    assert_eq!(body["sessions"]["live"], 0);
    assert_eq!(body["sessions"]["max"], 100);
    assert_eq!(body["sessions"]["extractions_in_flight"], 0);
    assert_eq!(body["sessions"]["extractions_max"], 1);
}

#[actix_rt::test]
async fn sessions_endpoints_list_and_close() {
    let registry = registry(SessionSettings::default());
    let app = test::init_service(
        App::new()
            .app_data(app_state(registry.clone()))
            .configure(routes::configure),
    )
    .await;

    let id = SessionId::parse("carol").unwrap();
    let (handle, _outbound) = registry.register(id.clone()).unwrap();

    let req = test::TestRequest::get().uri("/sessions").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["id"], "carol");

    let req = test::TestRequest::get().uri("/sessions/carol").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::delete().uri("/sessions/carol").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(!registry.contains(&id));
    assert_eq!(handle.close_reason().map(|r| r.as_str()), Some("client_request"));

    // closing again is a no-op
    let req = test::TestRequest::delete().uri("/sessions/carol").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri("/sessions/carol").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn plain_http_to_websocket_route_creates_no_session() {
    let registry = registry(SessionSettings::default());
    let app = test::init_service(
        App::new()
            .app_data(app_state(registry.clone()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/ws/pose/dave").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/ws/yoga/dave").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/ws/pose/d$ve").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(registry.live_count(), 0);
}

#[actix_rt::test]
async fn metrics_endpoint_serves_text() {
    let registry = registry(SessionSettings::default());
    let app = test::init_service(
        App::new()
            .app_data(app_state(registry))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
