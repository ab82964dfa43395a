use crate::error::AppError;
use crate::models::CurrentUser;
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

// public paths
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            // exact matches
            exact_paths: vec![
                "/health",
                "/swagger-ui",
                "/api-docs/openapi.json",
                "/api/auth/login",
                "/api/auth/logout",
                "/api/pusher/auth",
                "/api/casino-group/pending-counts",
                "/api/dpay/webhook",
                "/api/optimum-pay/webhook",
            ],
            // prefix matches; qbet88 routes are guarded by x-api-key
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/api/qbet88/"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }
        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

fn is_admin_only(path: &str) -> bool {
    path == "/api/accounts" || path.starts_with("/api/accounts/")
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
    cookie_name: String,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService, cookie_name: impl Into<String>) -> Self {
        Self {
            jwt_service,
            cookie_name: cookie_name.into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            cookie_name: self.cookie_name.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    cookie_name: String,
    public_paths: PublicPaths,
}

impl<S> AuthMiddlewareService<S> {
    /// Session cookie first, then `Authorization: Bearer`.
    fn session_token(&self, req: &ServiceRequest) -> Option<String> {
        if let Some(cookie) = req.cookie(&self.cookie_name) {
            let value = cookie.value().trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
        req.headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // let CORS preflight through
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let path = req.path().to_string();
        let public = self.public_paths.is_public_path(&path);

        let claims = self
            .session_token(&req)
            .map(|token| self.jwt_service.verify_session_token(&token));

        match claims {
            Some(Ok(claims)) => {
                if is_admin_only(&path) && !claims.role.is_admin_tier() {
                    return Box::pin(async move { Err(AppError::Forbidden.into()) });
                }
                // public paths still see the session user (realtime auth)
                req.extensions_mut().insert(CurrentUser {
                    id: claims.sub,
                    username: claims.username,
                    role: claims.role,
                });
                Box::pin(self.service.call(req))
            }
            _ if public => Box::pin(self.service.call(req)),
            Some(Err(e)) => {
                log::debug!("Rejected session on {path}: {e}");
                let error = AppError::Unauthorized("Invalid session".to_string());
                Box::pin(async move { Err(error.into()) })
            }
            None => {
                let error = AppError::Unauthorized("Missing session".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

/// Session user set by the middleware; missing means unauthenticated.
pub fn current_user(req: &HttpRequest) -> Result<CurrentUser, AppError> {
    req.extensions()
        .get::<CurrentUser>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("Missing session".to_string()))
}

pub fn optional_user(req: &HttpRequest) -> Option<CurrentUser> {
    req.extensions().get::<CurrentUser>().cloned()
}
