use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, StatusCode},
    Error, HttpMessage, HttpResponse, ResponseError,
};
use crypto_core::jwt::SessionKeys;
use error_types::{error_codes, error_types as kinds, ErrorResponse};
use futures::future::{ready, Ready};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "access_token";

/// User ID extracted from the session token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

/// Session rejected before reaching the handler
#[derive(Debug)]
pub struct Unauthenticated(&'static str);

impl fmt::Display for Unauthenticated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl ResponseError for Unauthenticated {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Unauthorized()
            .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
            .json(ErrorResponse::new(
                "Unauthorized",
                self.0,
                401,
                kinds::AUTHENTICATION_ERROR,
                error_codes::TOKEN_INVALID,
            ))
    }
}

/// Pull the raw token from the session cookie, falling back to `Authorization: Bearer`
pub fn extract_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// JWT session middleware
///
/// Validates the session token and inserts [`UserId`] into request
/// extensions. Whether that user still exists and is active is the
/// service's concern.
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    keys: Arc<SessionKeys>,
}

impl JwtAuthMiddleware {
    pub fn new(keys: Arc<SessionKeys>) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    keys: Arc<SessionKeys>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let keys = self.keys.clone();

        Box::pin(async move {
            let Some(token) = extract_token(&req) else {
                return Ok(reject(req, Unauthenticated("Not authenticated")));
            };

            let user_id = match keys.user_id(&token) {
                Ok(user_id) => user_id,
                Err(e) => {
                    tracing::warn!(error = %e, path = %req.path(), "session token rejected");
                    return Ok(reject(req, Unauthenticated("Could not validate credentials")));
                }
            };

            req.extensions_mut().insert(UserId(user_id));

            service.call(req).await.map(|res| res.map_into_left_body())
        })
    }
}

fn reject<B>(req: ServiceRequest, err: Unauthenticated) -> ServiceResponse<EitherBody<B>> {
    req.error_response(err).map_into_right_body()
}

/// FromRequest implementation for UserId
impl actix_web::FromRequest for UserId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<UserId>() {
            Some(user_id) => ready(Ok(*user_id)),
            None => ready(Err(Unauthenticated("Not authenticated").into())),
        }
    }
}
