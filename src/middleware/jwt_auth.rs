/// Bearer-token authentication.
///
/// `JwtAuthMiddleware` guards whole scopes and stashes the caller's id in
/// request extensions. `UserId` is the handler-side extractor; it prefers
/// the middleware's extension but can authenticate on its own, so scopes
/// that mix public and protected routes skip the middleware and let each
/// protected handler demand a `UserId` parameter instead.
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::HeaderMap,
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use uuid::Uuid;

use crate::error::AppError;
use crate::security::jwt;

/// The authenticated caller's id.
#[derive(Debug, Clone)]
pub struct UserId(pub Uuid);

/// Validate the Authorization header and return the caller's id.
fn user_id_from_headers(headers: &HeaderMap) -> Result<UserId, AppError> {
    // Copy the header out before any caller touches extensions_mut;
    // overlapping RefCell borrows panic in actix-web 4.
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("invalid Authorization header".to_string()))?
        .to_string();

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("invalid Authorization scheme, expected Bearer".to_string())
    })?;

    let token_data = jwt::validate_access_token(token).map_err(|e| {
        tracing::debug!("token validation failed: {}", e);
        AppError::Unauthorized("invalid or expired token".to_string())
    })?;

    let user_id = Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| AppError::Unauthorized("invalid user id in token".to_string()))?;

    Ok(UserId(user_id))
}

/// Middleware factory for fully-protected scopes.
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            // Render auth failures through AppError's ResponseError impl
            // here instead of returning Err: the dispatcher would produce
            // the same response, but test::call_service panics on Err.
            let user_id = match user_id_from_headers(req.headers()) {
                Ok(user_id) => user_id,
                Err(e) => {
                    let (req, _payload) = req.into_parts();
                    let res = HttpResponse::from_error(Error::from(e)).map_into_right_body();
                    return Ok(ServiceResponse::new(req, res));
                }
            };
            req.extensions_mut().insert(user_id);

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user_id) = req.extensions().get::<UserId>().cloned() {
            return ready(Ok(user_id));
        }
        ready(user_id_from_headers(req.headers()).map_err(Error::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            actix_web::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let headers = HeaderMap::new();
        assert!(matches!(
            user_id_from_headers(&headers),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn non_bearer_scheme_is_unauthorized() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert!(matches!(
            user_id_from_headers(&headers),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn valid_bearer_token_yields_the_user_id() {
        // Same secrets as the jwt module tests: the key cell is shared
        // process state and re-initialization must be idempotent.
        crate::security::jwt::initialize_keys("test-access-secret", "test-refresh-secret").unwrap();
        let id = Uuid::new_v4();
        let token = crate::security::jwt::generate_access_token(id, "tester").unwrap();
        let headers = headers_with(&format!("Bearer {token}"));
        assert_eq!(user_id_from_headers(&headers).unwrap().0, id);
    }
}
