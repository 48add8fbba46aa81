use crate::entities::UserRole;
use crate::error::{AppError, AppResult};
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// Identity attached to the request once the bearer token checks out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// Paths reachable without a token. A valid token is still attached there.
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
    // (method, prefix) pairs, public only for that method
    method_prefix_paths: Vec<(Method, &'static str)>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec![
                "/swagger-ui",
                "/swagger-ui/",
                "/api-docs/openapi.json",
                "/api/v1/auth/login",
                "/api/v1/auth/refresh",
            ],
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/webhook/", "/calendar/"],
            method_prefix_paths: vec![
                (Method::GET, "/api/v1/evenements"),
                (Method::POST, "/api/v1/evenements/"),
            ],
        }
    }

    fn is_public_path(&self, method: &Method, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }

        if self
            .prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
        {
            return true;
        }

        self.method_prefix_paths
            .iter()
            .any(|(m, prefix)| m == method && path.starts_with(prefix))
    }
}

fn is_admin_path(path: &str) -> bool {
    path.starts_with("/api/v1/admin/") || path == "/api/v1/admin"
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
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
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
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
        // CORS preflight
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        let is_public = self.public_paths.is_public_path(req.method(), req.path());
        let verified = bearer_token(&req).map(|t| self.jwt_service.verify_access_token(t));

        match verified {
            Some(Ok(claims)) => {
                let Ok(user_id) = claims.sub.parse::<i64>() else {
                    let error = AppError::AuthError("Jeton invalide".to_string());
                    return Box::pin(async move { Err(error.into()) });
                };
                let user = AuthUser {
                    user_id,
                    role: claims.role,
                };
                if is_admin_path(req.path()) && !user.is_admin() {
                    return Box::pin(async move { Err(AppError::Forbidden.into()) });
                }
                req.extensions_mut().insert(user);
                Box::pin(self.service.call(req))
            }
            // a bad token on a public path is treated as anonymous
            Some(Err(_)) | None if is_public => Box::pin(self.service.call(req)),
            Some(Err(_)) => {
                let error = AppError::AuthError("Jeton d'accès invalide ou expiré".to_string());
                Box::pin(async move { Err(error.into()) })
            }
            None => {
                let error = AppError::AuthError("Authentification requise".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

pub fn current_user(req: &HttpRequest) -> Option<AuthUser> {
    req.extensions().get::<AuthUser>().copied()
}

pub fn require_user(req: &HttpRequest) -> AppResult<AuthUser> {
    current_user(req).ok_or_else(|| AppError::AuthError("Authentification requise".to_string()))
}

pub fn require_admin(req: &HttpRequest) -> AppResult<AuthUser> {
    let user = require_user(req)?;
    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_public_paths() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path(&Method::GET, "/api/v1/evenements"));
        assert!(paths.is_public_path(&Method::GET, "/api/v1/evenements/4"));
        assert!(paths.is_public_path(&Method::POST, "/api/v1/evenements/4/inscriptions"));
        assert!(paths.is_public_path(&Method::POST, "/webhook/stripe"));
        assert!(paths.is_public_path(&Method::GET, "/calendar/evenements.ics"));
        assert!(paths.is_public_path(&Method::POST, "/api/v1/auth/login"));
        assert!(!paths.is_public_path(&Method::GET, "/api/v1/auth/me"));
        assert!(!paths.is_public_path(&Method::DELETE, "/api/v1/evenements/4"));
        assert!(!paths.is_public_path(&Method::POST, "/api/v1/payments/session"));
        assert!(!paths.is_public_path(&Method::GET, "/api/v1/admin/evenements"));
    }

    #[test]
    fn test_admin_paths() {
        assert!(is_admin_path("/api/v1/admin/evenements"));
        assert!(!is_admin_path("/api/v1/administration"));
        assert!(!is_admin_path("/api/v1/evenements"));
    }

    #[test]
    fn test_require_admin() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(require_user(&req), Err(AppError::AuthError(_))));

        req.extensions_mut().insert(AuthUser {
            user_id: 3,
            role: UserRole::Membre,
        });
        assert_eq!(require_user(&req).unwrap().user_id, 3);
        assert!(matches!(require_admin(&req), Err(AppError::Forbidden)));
    }
}
