use actix_web::http::StatusCode;
use awc::error::WsClientError;
use awc::{ws, Client};
use futures_util::SinkExt;
use pose_feedback_service::session::{SessionId, SessionSettings};
use serde_json::json;

use super::support::{eventually, landmarks_json, next_json, registry, start_server};

#[actix_rt::test]
async fn websocket_streams_ordered_feedback() {
    let registry = registry(SessionSettings::default());
    let (addr, handle) = start_server(registry.clone()).await.expect("start server");

    let (_resp, mut connection) = Client::new()
        .ws(format!("http://{addr}/ws/pose/alice"))
        .connect()
        .await
        .expect("connect websocket client");

    let started = next_json(&mut connection).await;
    assert_eq!(started["type"], "session_started");
    assert_eq!(started["data"]["session_id"], "alice");

    let warrior = json!({"type": "pose_frame", "data": {"landmarks": landmarks_json(150.0, 90.0)}});
    connection
        .send(ws::Message::Text(warrior.to_string().into()))
        .await
        .unwrap();
    let empty = json!({"type": "pose_frame", "data": {"landmarks": null}});
    connection
        .send(ws::Message::Text(empty.to_string().into()))
        .await
        .unwrap();

    let feedback = next_json(&mut connection).await;
    assert_eq!(feedback["type"], "pose_correction");
    assert_eq!(feedback["data"]["sequence"], 1);
    assert_eq!(feedback["data"]["detected_pose"], "warrior_1");
    assert_eq!(
        feedback["data"]["corrections"],
        json!(["Increase left elbow angle by 30.0 degrees"])
    );
    assert_eq!(feedback["data"]["quality_score"], 95.8);

    let no_pose = next_json(&mut connection).await;
    assert_eq!(no_pose["type"], "no_pose_detected");
    assert_eq!(no_pose["data"]["sequence"], 2);

    connection
        .send(ws::Message::Text(json!({"type": "ping"}).to_string().into()))
        .await
        .unwrap();
    assert_eq!(next_json(&mut connection).await["type"], "pong");

    connection
        .send(ws::Message::Close(None))
        .await
        .unwrap();
    assert!(eventually(|| registry.live_count() == 0).await);

    handle.stop(true).await;
}

#[actix_rt::test]
async fn websocket_rejects_duplicate_session_id() {
    let registry = registry(SessionSettings::default());
    let (addr, handle) = start_server(registry.clone()).await.expect("start server");
    let client = Client::new();

    let (_resp, mut first) = client
        .ws(format!("http://{addr}/ws/pose/bob"))
        .connect()
        .await
        .expect("connect first client");
    assert_eq!(next_json(&mut first).await["type"], "session_started");

    match client.ws(format!("http://{addr}/ws/pose/bob")).connect().await {
        Err(WsClientError::InvalidResponseStatus(status)) => {
            assert_eq!(status, StatusCode::CONFLICT)
        }
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("duplicate session id was accepted"),
    }
    assert_eq!(registry.live_count(), 1);

    handle.stop(true).await;
}

#[actix_rt::test]
async fn websocket_rejects_when_full() {
    let registry = registry(SessionSettings {
        max_sessions: 1,
        ..SessionSettings::default()
    });
    let (addr, handle) = start_server(registry.clone()).await.expect("start server");
    let client = Client::new();

    let (_resp, mut first) = client
        .ws(format!("http://{addr}/ws/pose/only"))
        .connect()
        .await
        .expect("connect first client");
    assert_eq!(next_json(&mut first).await["type"], "session_started");

    match client.ws(format!("http://{addr}/ws/pose/other")).connect().await {
        Err(WsClientError::InvalidResponseStatus(status)) => {
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE)
        }
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("session accepted beyond capacity"),
    }

    handle.stop(true).await;
}

#[actix_rt::test]
async fn websocket_generates_id_and_survives_bad_frames() {
    let registry = registry(SessionSettings::default());
    let (addr, handle) = start_server(registry.clone()).await.expect("start server");

    let (_resp, mut connection) = Client::new()
        .ws(format!("http://{addr}/ws/pose/new"))
        .connect()
        .await
        .expect("connect websocket client");

    let started = next_json(&mut connection).await;
    let id = started["data"]["session_id"].as_str().unwrap().to_string();
    assert_ne!(id, "new");
    assert!(registry.contains(&SessionId::parse(&id).unwrap()));

    // no extractor configured: image frames fail, the session does not
    let image = json!({"type": "pose_frame", "data": {"image": "data:image/jpeg;base64,aGVsbG8="}});
    connection
        .send(ws::Message::Text(image.to_string().into()))
        .await
        .unwrap();
    let failed = next_json(&mut connection).await;
    assert_eq!(failed["type"], "processing_error");
    assert_eq!(failed["data"]["sequence"], 1);

    let shapeless = json!({"type": "pose_frame", "data": {}});
    connection
        .send(ws::Message::Text(shapeless.to_string().into()))
        .await
        .unwrap();
    let rejected = next_json(&mut connection).await;
    assert_eq!(rejected["type"], "processing_error");
    assert_eq!(rejected["data"]["sequence"], 2);

    let chat = json!({"type": "chat_message", "data": {"message": "how is my form?"}});
    connection
        .send(ws::Message::Text(chat.to_string().into()))
        .await
        .unwrap();
    let unsupported = next_json(&mut connection).await;
    assert_eq!(unsupported["type"], "error");
    assert!(unsupported["data"]["error"]
        .as_str()
        .unwrap()
        .contains("chat_message"));

    connection
        .send(ws::Message::Text("{not json".to_string().into()))
        .await
        .unwrap();
    assert_eq!(next_json(&mut connection).await["type"], "error");

    let tree = json!({"type": "pose_frame", "data": {"landmarks": landmarks_json(180.0, 115.0)}});
    connection
        .send(ws::Message::Text(tree.to_string().into()))
        .await
        .unwrap();
    let feedback = next_json(&mut connection).await;
    assert_eq!(feedback["type"], "pose_correction");
    assert_eq!(feedback["data"]["sequence"], 3);
    assert_eq!(feedback["data"]["detected_pose"], "tree");

    handle.stop(true).await;
}

#[actix_rt::test]
async fn websocket_yoga_path_opens_same_session_kind() {
    let registry = registry(SessionSettings::default());
    let (addr, handle) = start_server(registry.clone()).await.expect("start server");

    let (_resp, mut connection) = Client::new()
        .ws(format!("http://{addr}/ws/yoga/erin"))
        .connect()
        .await
        .expect("connect websocket client");

    let started = next_json(&mut connection).await;
    assert_eq!(started["type"], "session_started");
    assert_eq!(started["data"]["session_id"], "erin");

    let frame = json!({"type": "pose_frame", "data": {"landmarks": landmarks_json(180.0, 180.0)}});
    connection
        .send(ws::Message::Text(frame.to_string().into()))
        .await
        .unwrap();
    let feedback = next_json(&mut connection).await;
    assert_eq!(feedback["type"], "pose_correction");
    assert_eq!(feedback["data"]["sequence"], 1);

    // the id is shared across both paths
    match Client::new().ws(format!("http://{addr}/ws/pose/erin")).connect().await {
        Err(WsClientError::InvalidResponseStatus(status)) => {
            assert_eq!(status, StatusCode::CONFLICT)
        }
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("duplicate session id was accepted"),
    }

    handle.stop(true).await;
}
