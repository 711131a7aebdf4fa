use std::time::Duration;

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, TextEncoder,
};

use crate::session::CloseReason;

static FRAMES_PROCESSED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "pose_feedback_frames_processed_total",
            "Frames run through the pipeline, by outcome",
        ),
        &["outcome"],
    )
    .expect("failed to create pose_feedback_frames_processed_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register pose_feedback_frames_processed_total");
    counter
});

static FRAMES_REJECTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "pose_feedback_frames_rejected_total",
        "Frames rejected because the session backlog was full",
    )
    .expect("failed to create pose_feedback_frames_rejected_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register pose_feedback_frames_rejected_total");
    counter
});

static FRAME_LATENCY_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    let histogram = Histogram::with_opts(
        HistogramOpts::new(
            "pose_feedback_frame_latency_seconds",
            "Time from frame arrival to result, including queueing",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
        ]),
    )
    .expect("failed to create pose_feedback_frame_latency_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register pose_feedback_frame_latency_seconds");
    histogram
});

static SESSIONS_OPENED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "pose_feedback_sessions_opened_total",
        "Sessions registered",
    )
    .expect("failed to create pose_feedback_sessions_opened_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register pose_feedback_sessions_opened_total");
    counter
});

static SESSIONS_CLOSED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "pose_feedback_sessions_closed_total",
            "Sessions closed, by reason",
        ),
        &["reason"],
    )
    .expect("failed to create pose_feedback_sessions_closed_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register pose_feedback_sessions_closed_total");
    counter
});

static LIVE_SESSIONS: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new("pose_feedback_live_sessions", "Sessions currently live")
        .expect("failed to create pose_feedback_live_sessions");
    prometheus::default_registry()
        .register(Box::new(gauge.clone()))
        .expect("failed to register pose_feedback_live_sessions");
    gauge
});

pub fn observe_frame(outcome: &str, elapsed: Duration) {
    FRAMES_PROCESSED_TOTAL.with_label_values(&[outcome]).inc();
    FRAME_LATENCY_SECONDS.observe(elapsed.as_secs_f64());
}

pub fn frame_rejected() {
    FRAMES_REJECTED_TOTAL.inc();
}

pub fn session_opened() {
    SESSIONS_OPENED_TOTAL.inc();
    LIVE_SESSIONS.inc();
}

pub fn session_closed(reason: CloseReason) {
    SESSIONS_CLOSED_TOTAL
        .with_label_values(&[reason.as_str()])
        .inc();
    LIVE_SESSIONS.dec();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
