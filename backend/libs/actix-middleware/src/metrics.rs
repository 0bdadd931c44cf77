//! Prometheus HTTP metrics
//!
//! Requests are labelled by the matched route pattern (`/api/posts/{post_id}`),
//! never the raw path. Durations stop at response headers, so a long video
//! stream counts as fast as its first byte.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Instant;

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::{ready, Ready};
use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGauge, TextEncoder};

/// Route label for requests no resource matched
const UNMATCHED_ROUTE: &str = "unmatched";

lazy_static::lazy_static! {
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "http_requests_total",
        "HTTP requests by method, route pattern and status",
        &["method", "route", "status"]
    ).unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = prometheus::register_histogram_vec!(
        "http_request_duration_seconds",
        "Time to response headers",
        &["method", "route", "status"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGauge = prometheus::register_int_gauge!(
        "http_requests_in_flight",
        "Requests currently being handled"
    ).unwrap();
}

/// Render the default registry in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Labels captured before the request is handed to the inner service
struct RequestLabels {
    method: String,
    route: String,
    started: Instant,
}

impl RequestLabels {
    fn capture(req: &ServiceRequest) -> Self {
        Self {
            method: req.method().to_string(),
            route: req
                .match_pattern()
                .unwrap_or_else(|| UNMATCHED_ROUTE.to_string()),
            started: Instant::now(),
        }
    }

    fn record(&self, status: u16) {
        let status = status.to_string();
        let labels = [self.method.as_str(), self.route.as_str(), status.as_str()];
        HTTP_REQUESTS_TOTAL.with_label_values(&labels).inc();
        HTTP_REQUEST_DURATION_SECONDS
            .with_label_values(&labels)
            .observe(self.started.elapsed().as_secs_f64());
    }
}

/// Decrements the in-flight gauge even when the handler future is dropped
struct InFlight;

impl InFlight {
    fn enter() -> Self {
        HTTP_REQUESTS_IN_FLIGHT.inc();
        InFlight
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        HTTP_REQUESTS_IN_FLIGHT.dec();
    }
}

/// Prometheus metrics middleware
pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = MetricsMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let labels = RequestLabels::capture(&req);

        Box::pin(async move {
            let _guard = InFlight::enter();
            match service.call(req).await {
                Ok(res) => {
                    labels.record(res.status().as_u16());
                    Ok(res)
                }
                Err(err) => {
                    labels.record(err.as_response_error().status_code().as_u16());
                    Err(err)
                }
            }
        })
    }
}
