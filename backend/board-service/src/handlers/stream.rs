/// Stream handler - byte-range video delivery
use actix_web::{
    body::SizedStream,
    http::{header, StatusCode},
    web, HttpRequest, HttpResponse,
};
use uuid::Uuid;
use video_core::responder::HEADER_CONTENT_LENGTH;

use crate::error::{AppError, Result};
use crate::metrics::record_stream_outcome;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// `GET /api/stream/{post_id}` with optional `Range: bytes=start-end`
pub async fn stream_video(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();

    let range = match req.headers().get(header::RANGE) {
        None => None,
        Some(value) => Some(value.to_str().map_err(|_| {
            record_stream_outcome("invalid_range");
            AppError::InvalidRange
        })?),
    };

    let response = match state
        .streamer
        .build_stream_response(post_id, &user.identity(), range)
        .await
    {
        Ok(response) => response,
        Err(err) => {
            record_stream_outcome(err.reason());
            tracing::warn!(
                post_id = %post_id,
                user_id = %user.0.id,
                reason = err.reason(),
                "video stream refused"
            );
            return Err(err.into());
        }
    };

    let status = StatusCode::from_u16(response.status)
        .map_err(|e| AppError::Internal(format!("invalid stream status: {}", e)))?;
    record_stream_outcome(if status == StatusCode::PARTIAL_CONTENT {
        "partial"
    } else {
        "full"
    });

    let length = response
        .header(HEADER_CONTENT_LENGTH)
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| AppError::Internal("stream response without length".to_string()))?;

    let mut builder = HttpResponse::build(status);
    for (name, value) in &response.headers {
        // The sized body emits Content-Length itself
        if !name.eq_ignore_ascii_case(HEADER_CONTENT_LENGTH) {
            builder.insert_header((*name, value.as_str()));
        }
    }

    Ok(builder.body(SizedStream::new(length, response.body)))
}
