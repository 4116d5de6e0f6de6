use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::{AUTHORIZATION, COOKIE},
    middleware::Next,
    response::Response,
};

use crate::{AppState, errors::AppError};

/// Cookie carrying the admin credential.
pub const CREDENTIAL_COOKIE: &str = "adminToken";

/// Middleware guarding the mutating routes. The request must carry the
/// admin credential in the `adminToken` cookie or an `Authorization: Bearer`
/// header; validation is stateless, re-checked against the configured
/// secret on every request.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match credential_from_request(&req) {
        Some(presented) if verify_secret(&presented, &state.config.admin_password) => {
            Ok(next.run(req).await)
        }
        Some(_) => {
            tracing::warn!("request with invalid admin credential");
            Err(AppError::Unauthorized("Unauthorized".to_string()))
        }
        None => Err(AppError::Unauthorized("Unauthorized".to_string())),
    }
}

/// `Set-Cookie` value for a fresh admin credential. HTTP-only and
/// SameSite=Strict; expiry is the only logout.
pub fn credential_cookie(secret: &str, ttl_secs: u64) -> String {
    format!(
        "{CREDENTIAL_COOKIE}={secret}; Max-Age={ttl_secs}; Path=/; HttpOnly; Secure; SameSite=Strict"
    )
}

/// Constant-time comparison of the presented credential against the
/// configured secret. The fold touches every byte regardless of where the
/// first mismatch sits; only the length check short-circuits.
pub fn verify_secret(presented: &str, secret: &str) -> bool {
    let a = presented.as_bytes();
    let b = secret.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn credential_from_request(req: &Request) -> Option<String> {
    let from_cookie = req
        .headers()
        .get(COOKIE)
        .and_then(|header| header.to_str().ok())
        .and_then(|raw| cookie_value(raw, CREDENTIAL_COOKIE));
    if from_cookie.is_some() {
        return from_cookie;
    }

    req.headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|raw| raw.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Extracts one cookie's value from a `Cookie` request header.
fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            (k == name).then(|| v.to_string())
        })
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_secret_verifies() {
        assert!(verify_secret("hunter2", "hunter2"));
    }

    #[test]
    fn wrong_secret_rejected() {
        assert!(!verify_secret("hunter3", "hunter2"));
        assert!(!verify_secret("", "hunter2"));
        assert!(!verify_secret("hunter22", "hunter2"));
    }

    #[test]
    fn cookie_value_found_among_pairs() {
        let header = "theme=dark; adminToken=hunter2; lang=en";
        assert_eq!(
            cookie_value(header, "adminToken"),
            Some("hunter2".to_string())
        );
    }

    #[test]
    fn cookie_value_absent() {
        assert_eq!(cookie_value("theme=dark", "adminToken"), None);
        assert_eq!(cookie_value("", "adminToken"), None);
    }

    #[test]
    fn cookie_name_is_exact_match() {
        assert_eq!(cookie_value("xadminToken=nope", "adminToken"), None);
    }

    #[test]
    fn credential_cookie_carries_required_attributes() {
        let cookie = credential_cookie("hunter2", 3600);
        assert!(cookie.starts_with("adminToken=hunter2"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/"));
    }
}
