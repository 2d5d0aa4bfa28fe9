/// Authentication Routes
///
/// Signup, login, access token refresh and logout. Tokens are returned
/// in the body and as cookies; the refresh token only travels as a cookie.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthService, CookiePolicy, RequestCredentials};
use crate::error::{AppError, ErrorContext};
use crate::users::User;
use crate::validators::SignupInput;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response carrying a freshly minted access token
#[derive(Serialize)]
pub struct AccessTokenResponse {
    pub status: &'static str,
    pub access_token: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub status: &'static str,
    pub user: User,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// POST /auth/signup
///
/// # Errors
/// - 400: Validation errors, one message per failing field
/// - 409: Email already registered
pub async fn signup(
    form: web::Json<SignupInput>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_signup");

    let user = auth.signup(form.into_inner()).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(UserResponse {
        status: "success",
        user,
    }))
}

/// POST /auth/login
///
/// Sets the `access_token`, `refresh_token` and `logged_in` cookies.
///
/// # Errors
/// - 401: Invalid credentials, same message for unknown email and wrong password
/// - 503: Session store unavailable
pub async fn login(
    form: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
    cookies: web::Data<CookiePolicy>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let tokens = auth.login(&form.email, &form.password).await?;

    tracing::info!(request_id = %context.request_id, "User logged in successfully");

    Ok(HttpResponse::Ok()
        .cookie(cookies.access_token(&tokens.access_token))
        .cookie(cookies.refresh_token(&tokens.refresh_token))
        .cookie(cookies.logged_in())
        .json(AccessTokenResponse {
            status: "success",
            access_token: tokens.access_token,
        }))
}

/// POST /auth/refresh
///
/// Reads the refresh token from the `refresh_token` cookie and reissues
/// the `access_token` and `logged_in` cookies. The refresh token is not rotated.
///
/// # Errors
/// - 403: Missing or invalid refresh token, expired session, or unverified user
pub async fn refresh(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    cookies: web::Data<CookiePolicy>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");
    let credentials = RequestCredentials::from_request(&req);

    let access_token = auth.refresh_access_token(credentials.refresh_token()).await?;

    tracing::info!(request_id = %context.request_id, "Token refreshed successfully");

    Ok(HttpResponse::Ok()
        .cookie(cookies.access_token(&access_token))
        .cookie(cookies.logged_in())
        .json(AccessTokenResponse {
            status: "success",
            access_token,
        }))
}

/// POST /auth/logout
///
/// Deletes the caller's session and expires all three cookies.
///
/// # Errors
/// - 401: Not logged in
/// - 403: Session already expired or user no longer exists
pub async fn logout(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    cookies: web::Data<CookiePolicy>,
) -> Result<HttpResponse, AppError> {
    let credentials = RequestCredentials::from_request(&req);

    let user = auth.logout(&credentials).await?;
    let context = ErrorContext::new("user_logout").with_user_id(user.id.to_string());

    tracing::info!(
        request_id = %context.request_id,
        user_id = ?context.user_id,
        "User logged out successfully"
    );

    let mut response = HttpResponse::Ok();
    for cookie in cookies.cleared() {
        response.cookie(cookie);
    }
    Ok(response.json(StatusResponse { status: "success" }))
}
