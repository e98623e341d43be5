use crate::{
    auth::{
        auth::AuthUser,
        guard::SIGN_IN_ROUTE,
        jwt::{Subject, generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    error::AppError,
    model::{role::Role, user::NewUserAccount},
    models::{LoginReqDto, LoginResponse, RegisterReq, TokenPair, TokenType},
    store::HrStore,
    utils::email_cache,
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, error, info, instrument};

pub const MIN_PASSWORD_LEN: usize = 6;

fn token_error(e: jsonwebtoken::errors::Error) -> AppError {
    error!(error = %e, "Failed to sign token");
    AppError::Internal
}

fn expiry(exp: usize) -> DateTime<Utc> {
    DateTime::from_timestamp(exp as i64, 0).unwrap_or_else(Utc::now)
}

/// Issues an access/refresh pair and records the refresh token id.
async fn issue_tokens(
    subject: &Subject,
    store: &dyn HrStore,
    config: &Config,
) -> Result<TokenPair, AppError> {
    let access_token =
        generate_access_token(subject, &config.jwt_secret, config.access_token_ttl)
            .map_err(token_error)?;

    let (refresh_token, refresh_claims) =
        generate_refresh_token(subject, &config.jwt_secret, config.refresh_token_ttl)
            .map_err(token_error)?;

    debug!(
        user_id = subject.user_id,
        jti = %refresh_claims.jti,
        "Storing refresh token"
    );
    store
        .store_refresh_token(subject.user_id, &refresh_claims.jti, expiry(refresh_claims.exp))
        .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, store: &dyn HrStore) -> Result<bool, AppError> {
    // Moka cache, fast positive
    if email_cache::is_taken(email).await {
        return Ok(false);
    }

    // Store fallback
    if store.email_taken(email).await? {
        email_cache::mark_taken(email).await;
        return Ok(false);
    }

    Ok(true)
}

/// Sign-in landing page
#[utoipa::path(
    get,
    path = "/auth",
    responses(
        (status = 200, description = "Where to send credentials", body = Object, example = json!({
            "message": "Sign in required",
            "login": "/auth/login",
            "register": "/auth/register"
        }))
    ),
    tag = "Auth"
)]
pub async fn sign_in_page() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "Sign in required",
        "login": format!("{}/login", SIGN_IN_ROUTE),
        "register": format!("{}/register", SIGN_IN_ROUTE),
    }))
}

/// User registration handler
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account created", body = Object, example = json!({
            "message": "Account created successfully"
        })),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(store, user), fields(email = %user.email))]
pub async fn register(
    user: web::Json<RegisterReq>,
    store: web::Data<dyn HrStore>,
) -> Result<HttpResponse, AppError> {
    let email = user.email.trim().to_lowercase();
    let full_name = user.full_name.trim();

    if email.is_empty() || user.password.is_empty() || full_name.is_empty() {
        return Err(AppError::bad_request(
            "Email, password and full name must not be empty",
        ));
    }
    if !email.contains('@') {
        return Err(AppError::bad_request("Email is not valid"));
    }
    if user.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    if !is_email_available(&email, store.get_ref()).await? {
        return Err(AppError::conflict("Email already registered"));
    }

    let password_hash = hash_password(&user.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        AppError::Internal
    })?;

    let account = store
        .create_user(NewUserAccount {
            email: email.clone(),
            password_hash,
            role: Role::Employee,
            employee_id: None,
            full_name: full_name.to_string(),
        })
        .await?;

    email_cache::mark_taken(&email).await;
    info!(user_id = account.id, "Account created");

    Ok(HttpResponse::Created().json(json!({
        "message": "Account created successfully"
    })))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(store, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    store: web::Data<dyn HrStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    // 1️⃣ Basic validation
    if user.email.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(AppError::bad_request("Email and password required"));
    }

    // 2️⃣ Fetch account
    let email = user.email.trim().to_lowercase();
    let account = match store.find_user_by_email(&email).await? {
        Some(account) => {
            debug!(user_id = account.id, "User found");
            account
        }
        None => {
            info!("Invalid credentials: user not found");
            return Err(AppError::unauthorized("Invalid credentials"));
        }
    };

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&user.password, &account.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    // 4️⃣ Tokens
    let tokens = issue_tokens(&Subject::from(&account), store.get_ref(), &config).await?;

    // 5️⃣ Update last sign-in (non-fatal)
    if let Err(e) = store.touch_last_sign_in(account.id).await {
        error!(error = %e, "Failed to update last sign-in");
    }

    info!(role = %account.role, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        role: account.role,
        home: account.role.home().to_string(),
    }))
}

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Rotated token pair", body = TokenPair),
        (status = 401, description = "Missing, invalid, revoked or non-refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    store: web::Data<dyn HrStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let token = bearer(&req).ok_or_else(|| AppError::unauthorized("No token"))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::unauthorized("Invalid token"))?;

    if claims.token_type != TokenType::Refresh {
        return Err(AppError::unauthorized("Refresh token required"));
    }

    // 🔥 revoke old refresh token; an unknown or revoked jti ends here
    if !store.revoke_refresh_token(&claims.jti).await? {
        info!(user_id = claims.user_id, "Refresh with revoked or unknown token");
        return Err(AppError::unauthorized("Token revoked"));
    }

    // 👤 reload the account so role and profile link are current
    let account = store
        .find_user_by_id(claims.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))?;

    // 🔄 issue new pair
    let tokens = issue_tokens(&Subject::from(&account), store.get_ref(), &config).await?;

    Ok(HttpResponse::Ok().json(tokens))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Signed out (idempotent)")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    store: web::Data<dyn HrStore>,
    config: web::Data<Config>,
) -> impl Responder {
    // only a valid refresh token can sign out; anything else is a no-op
    let claims = match bearer(&req).map(|t| verify_token(t, &config.jwt_secret)) {
        Some(Ok(c)) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    if let Err(e) = store.revoke_refresh_token(&claims.jti).await {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}

/// Identity and navigation of the signed-in user
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current session", body = Object, example = json!({
            "user_id": 2,
            "email": "employee@company.com",
            "role": "employee",
            "employee_id": 1,
            "home": "/employee",
            "navigation": [{ "name": "Dashboard", "href": "/employee" }]
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "user_id": auth.user_id,
        "email": auth.email,
        "role": auth.role,
        "employee_id": auth.employee_id,
        "home": auth.role.home(),
        "navigation": auth.role.navigation(),
    }))
}
