use crate::common::AppError;
use crate::domains::auth::JwtService;
use axum::{middleware::Next, response::Response, Extension};
use std::sync::Arc;
use tracing::debug;

/// Authenticated user information from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    /// External identity-provider subject.
    pub kinde_id: String,
    /// Verified email from the identity provider.
    pub email: String,
    pub is_admin: bool,
}

impl AuthUser {
    /// Unwrap the optional extension, rejecting unauthenticated requests.
    pub fn require(auth: Option<Extension<AuthUser>>) -> Result<AuthUser, AppError> {
        auth.map(|Extension(user)| user).ok_or(AppError::Unauthorized)
    }

    /// Fail unless the authenticated subject owns `user_id`. Admins may act
    /// on any user.
    pub fn authorize_for(&self, user_id: &str) -> Result<(), AppError> {
        if self.is_admin || self.kinde_id == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// JWT authentication middleware
///
/// Extracts the JWT from the Authorization header, verifies it, and adds
/// AuthUser to request extensions. If no token or an invalid token, the
/// request continues without AuthUser (public access); handlers that need
/// auth call `AuthUser::require`.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_user = extract_auth_user(&request, &jwt_service);

    if let Some(user) = auth_user {
        debug!(
            "Authenticated user: {} (admin: {})",
            user.kinde_id, user.is_admin
        );
        request.extensions_mut().insert(user);
    } else {
        debug!("No valid authentication token");
    }

    next.run(request).await
}

/// Extract and verify JWT token from request
fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> Option<AuthUser> {
    // Get Authorization header
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;

    // Extract token (handle both "Bearer <token>" and raw token)
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);

    // Verify token
    let claims = jwt_service.verify_token(token).ok()?;

    Some(AuthUser {
        kinde_id: claims.sub,
        email: claims.email,
        is_admin: claims.is_admin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test_secret", "test_issuer".to_string())
    }

    fn request_with_auth(value: &str) -> axum::http::Request<axum::body::Body> {
        axum::http::Request::builder()
            .header("authorization", value)
            .body(axum::body::Body::empty())
            .unwrap()
    }

    #[test]
    fn extracts_token_with_bearer_prefix() {
        let jwt_service = service();
        let token = jwt_service
            .create_token("kp_42", "asha@example.com", true)
            .unwrap();

        let request = request_with_auth(&format!("Bearer {}", token));
        let auth_user = extract_auth_user(&request, &jwt_service).unwrap();
        assert_eq!(auth_user.kinde_id, "kp_42");
        assert!(auth_user.is_admin);
    }

    #[test]
    fn extracts_raw_token() {
        let jwt_service = service();
        let token = jwt_service
            .create_token("kp_42", "asha@example.com", false)
            .unwrap();

        let request = request_with_auth(&token);
        let auth_user = extract_auth_user(&request, &jwt_service).unwrap();
        assert_eq!(auth_user.kinde_id, "kp_42");
        assert!(!auth_user.is_admin);
    }

    #[test]
    fn missing_header_yields_none() {
        let request = axum::http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();
        assert!(extract_auth_user(&request, &service()).is_none());
    }

    #[test]
    fn garbage_token_yields_none() {
        let request = request_with_auth("Bearer not_a_token");
        assert!(extract_auth_user(&request, &service()).is_none());
    }

    #[test]
    fn authorize_for_matches_subject_or_admin() {
        let user = AuthUser {
            kinde_id: "kp_42".to_string(),
            email: "asha@example.com".to_string(),
            is_admin: false,
        };
        assert!(user.authorize_for("kp_42").is_ok());
        assert!(user.authorize_for("kp_other").is_err());

        let admin = AuthUser {
            is_admin: true,
            ..user
        };
        assert!(admin.authorize_for("kp_other").is_ok());
    }
}
