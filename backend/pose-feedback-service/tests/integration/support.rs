use std::fmt::Debug;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use actix_web::{dev::ServerHandle, web, App, HttpServer};
use awc::ws;
use futures_util::{Stream, StreamExt};
use pose_feedback_service::{
    extractor::ExtractionGate,
    kinematics::KinematicCalculator,
    pipeline::FramePipeline,
    pose::PoseCatalog,
    routes,
    session::{SessionRegistry, SessionSettings},
    state::AppState,
};
use serde_json::{json, Value};

pub fn registry(settings: SessionSettings) -> SessionRegistry {
    let pipeline = FramePipeline::new(
        PoseCatalog::shared(),
        KinematicCalculator::default(),
        ExtractionGate::unavailable(),
    );
    SessionRegistry::new(Arc::new(pipeline), settings)
}

pub fn app_state(registry: SessionRegistry) -> web::Data<AppState> {
    web::Data::new(AppState::new(registry))
}

pub async fn start_server(registry: SessionRegistry) -> std::io::Result<(SocketAddr, ServerHandle)> {
    let state = app_state(registry);

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .workers(1)
    .listen(listener)?
    .run();

    let handle = server.handle();
    actix_rt::spawn(server);
    Ok((addr, handle))
}

/// 33 landmarks with the given (left elbow, left knee) angles; the other
/// tracked joints are straight.
pub fn landmarks_json(left_elbow: f64, left_knee: f64) -> Value {
    let mut points: Vec<(f64, f64)> = vec![(0.5, 0.5); 33];

    let joints = [
        ((11, 13, 15), (0.3, 0.3), left_elbow),
        ((12, 14, 16), (0.7, 0.3), 180.0),
        ((23, 25, 27), (0.3, 0.7), left_knee),
        ((24, 26, 28), (0.7, 0.7), 180.0),
    ];
    for ((proximal, vertex, distal), (vx, vy), degrees) in joints {
        let theta = f64::to_radians(degrees);
        points[proximal] = (vx, vy - 0.1);
        points[vertex] = (vx, vy);
        points[distal] = (vx + 0.1 * theta.sin(), vy - 0.1 * theta.cos());
    }

    Value::Array(
        points
            .into_iter()
            .enumerate()
            .map(|(id, (x, y))| json!({"id": id, "x": x, "y": y, "z": 0.0, "visibility": 0.99}))
            .collect(),
    )
}

/// Next text frame as JSON, skipping heartbeat pings.
pub async fn next_json<S, E>(connection: &mut S) -> Value
where
    S: Stream<Item = Result<ws::Frame, E>> + Unpin,
    E: Debug,
{
    loop {
        let frame = actix_rt::time::timeout(Duration::from_secs(5), connection.next())
            .await
            .expect("timed out waiting for frame")
            .expect("connection closed")
            .expect("frame data");
        match frame {
            ws::Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json frame"),
            ws::Frame::Ping(_) | ws::Frame::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Poll until `check` holds or a second passes.
pub async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        actix_rt::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
