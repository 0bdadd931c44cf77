/// Video streaming metrics
///
/// HTTP request counters live in the shared `actix-middleware` crate; this
/// module only adds what is specific to video delivery.
use prometheus::IntCounterVec;

lazy_static::lazy_static! {
    /// Stream outcomes: `full`, `partial`, or the failure reason
    pub static ref VIDEO_STREAM_RESPONSES_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "video_stream_responses_total",
        "Video stream responses by outcome",
        &["outcome"]
    ).unwrap();
}

pub fn record_stream_outcome(outcome: &str) {
    VIDEO_STREAM_RESPONSES_TOTAL
        .with_label_values(&[outcome])
        .inc();
}
