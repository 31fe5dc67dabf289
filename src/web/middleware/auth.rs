use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use tracing::debug;

use crate::services::auth_service::SESSION_TTL_DAYS;
use crate::web::AppState;
use crate::web::models::RequestIdentity;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Looks for a session token in the `accessToken` cookie, then in a
/// `Bearer` Authorization header.
fn extract_token(jar: &CookieJar, req: &Request<AxumBody>) -> Option<String> {
    jar.get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|header| header.to_str().ok())
                .and_then(|header| header.strip_prefix("Bearer "))
                .map(|s| s.trim().to_string())
        })
}

/// Attaches a `RequestIdentity` to every request. Never rejects: a missing
/// or invalid token leaves the request anonymous and the resolvers decide.
pub async fn session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Response {
    let identity = match extract_token(&jar, &req) {
        Some(token) => match state.credentials.validate_token(&token) {
            Ok(user) => RequestIdentity::Authenticated(user),
            Err(_) => {
                debug!("Ignoring invalid session token.");
                RequestIdentity::Anonymous
            }
        },
        None => RequestIdentity::Anonymous,
    };

    req.extensions_mut().insert(identity);
    next.run(req).await
}

pub fn build_session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .build()
}

pub fn build_removal_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(authorization: Option<&str>) -> Request<AxumBody> {
        let mut builder = Request::builder().uri("/query");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(AxumBody::empty()).unwrap()
    }

    #[test]
    fn test_cookie_preferred_over_header() {
        let jar = CookieJar::new().add(Cookie::new(ACCESS_TOKEN_COOKIE, "from-cookie"));
        let req = request(Some("Bearer from-header"));
        assert_eq!(extract_token(&jar, &req).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_bearer_header_fallback() {
        let req = request(Some("Bearer from-header"));
        assert_eq!(extract_token(&CookieJar::new(), &req).as_deref(), Some("from-header"));

        let basic = request(Some("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_token(&CookieJar::new(), &basic), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = build_session_cookie("abc".to_string(), true).to_string();
        assert!(cookie.starts_with("accessToken=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=604800"));

        let removal = build_removal_cookie(false).to_string();
        assert!(removal.starts_with("accessToken=;"));
        assert!(removal.contains("Max-Age=0"));
        assert!(!removal.contains("Secure"));
    }
}
