use crate::{
    api::{attendance, department, employee, leave_request},
    auth::{guard::portal_guard, handlers, middleware::auth_middleware},
    config::Config,
    error::AppError,
    views,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{
    HttpRequest,
    error::{JsonPayloadError, PathError, QueryPayloadError},
    middleware::from_fn,
    web,
};
use anyhow::anyhow;
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {} per minute", requests_per_min))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

/// Rate limiters are built once and shared by every worker, so the quota
/// is per client across the whole server.
#[derive(Clone)]
pub struct Limiters {
    login: Limiter,
    register: Limiter,
    refresh: Limiter,
    protected: Limiter,
}

impl Limiters {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            register: build_limiter(config.rate_register_per_min)?,
            refresh: build_limiter(config.rate_refresh_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

// Extractor failures render like every other error
fn json_error(err: JsonPayloadError, _: &HttpRequest) -> actix_web::Error {
    AppError::bad_request(format!("Invalid request body: {}", err)).into()
}

fn query_error(err: QueryPayloadError, _: &HttpRequest) -> actix_web::Error {
    AppError::bad_request(format!("Invalid query string: {}", err)).into()
}

fn path_error(err: PathError, _: &HttpRequest) -> actix_web::Error {
    AppError::bad_request(format!("Invalid path parameter: {}", err)).into()
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &Limiters) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error));

    cfg.route("/", web::get().to(views::index));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .route("", web::get().to(handlers::sign_in_page))
            .service(
                web::resource("/login")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(limiters.register.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(limiters.refresh.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected API
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiters.protected.clone()) // rate limiting
            .route("/me", web::get().to(handlers::me))
            .route("/departments", web::get().to(department::list_departments))
            .service(
                web::scope("/employees")
                    // /employees
                    .service(web::resource("").route(web::post().to(employee::create_employee)))
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("").route(web::post().to(attendance::mark_attendance)))
                    .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                    .service(
                        web::resource("/check-out").route(web::post().to(attendance::check_out)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(web::resource("").route(web::post().to(leave_request::create_leave)))
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            ),
    );

    // Guarded pages
    cfg.service(
        web::scope("/admin")
            .wrap(from_fn(portal_guard))
            .route("", web::get().to(views::admin::dashboard))
            .route("/employees", web::get().to(views::admin::employees))
            .route("/attendance", web::get().to(views::admin::attendance))
            .route("/leaves", web::get().to(views::admin::leaves))
            .route("/payroll", web::get().to(views::admin::payroll)),
    );
    cfg.service(
        web::scope("/employee")
            .wrap(from_fn(portal_guard))
            .route("", web::get().to(views::employee::dashboard))
            .route("/attendance", web::get().to(views::employee::attendance))
            .route("/leaves", web::get().to(views::employee::leaves))
            .route("/salary", web::get().to(views::employee::salary)),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token   (pages also accept the access_token cookie)

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token + rotated refresh_token

#[cfg(test)]
mod tests {
    use super::build_limiter;
    use crate::model::employee::EmployeePatch;
    use crate::test_support::{
        admin_token, bearer, demo_store, refresh_token_for_admin, request, test_app,
    };
    use actix_web::{http::Method, http::StatusCode, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn zero_rate_still_builds_a_limiter() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(120_000).is_ok());
    }

    fn login(email: &str, password: &str) -> test::TestRequest {
        request()
            .method(Method::POST)
            .uri("/auth/login")
            .set_json(json!({ "email": email, "password": password }))
    }

    #[actix_web::test]
    async fn demo_accounts_sign_in_to_their_dashboards() {
        let app = test_app!(demo_store());

        let body: Value =
            test::call_and_read_body_json(&app, login("admin@company.com", "admin123").to_request()).await;
        assert_eq!(body["role"], "admin");
        assert_eq!(body["home"], "/admin");

        let body: Value =
            test::call_and_read_body_json(&app, login("Employee@Company.com", "employee123").to_request()).await;
        assert_eq!(body["home"], "/employee");

        let token = body["access_token"].as_str().unwrap();
        let req = request().uri("/api/me").insert_header(bearer(token)).to_request();
        let me: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(me["employee_id"], 1);
        assert_eq!(me["navigation"][3]["href"], "/employee/salary");

        let resp = test::call_service(&app, login("admin@company.com", "wrong").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let resp = test::call_service(&app, login("", "").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn refresh_rotates_and_old_token_is_dead() {
        let app = test_app!(demo_store());

        let body: Value =
            test::call_and_read_body_json(&app, login("admin@company.com", "admin123").to_request()).await;
        let refresh = body["refresh_token"].as_str().unwrap().to_string();
        let access = body["access_token"].as_str().unwrap().to_string();

        let call = |token: &str| {
            request()
                .method(Method::POST)
                .uri("/auth/refresh")
                .insert_header(bearer(token))
                .to_request()
        };

        // access tokens cannot refresh
        assert_eq!(test::call_service(&app, call(&access)).await.status(), StatusCode::UNAUTHORIZED);

        let rotated: Value = test::call_and_read_body_json(&app, call(&refresh)).await;
        assert!(rotated["refresh_token"].as_str().is_some_and(|t| t != refresh));

        assert_eq!(test::call_service(&app, call(&refresh)).await.status(), StatusCode::UNAUTHORIZED);

        // never stored
        let stray = refresh_token_for_admin();
        assert_eq!(test::call_service(&app, call(&stray)).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn logout_is_always_no_content() {
        let app = test_app!(demo_store());

        let body: Value =
            test::call_and_read_body_json(&app, login("admin@company.com", "admin123").to_request()).await;
        let refresh = body["refresh_token"].as_str().unwrap().to_string();

        for _ in 0..2 {
            let req = request()
                .method(Method::POST)
                .uri("/auth/logout")
                .insert_header(bearer(&refresh))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
        }

        let req = request().method(Method::POST).uri("/auth/logout").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = request()
            .method(Method::POST)
            .uri("/auth/refresh")
            .insert_header(bearer(&refresh))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn registration_creates_an_employee_account_once() {
        let app = test_app!(demo_store());

        let register = |email: &str, password: &str| {
            request()
                .method(Method::POST)
                .uri("/auth/register")
                .set_json(json!({ "email": email, "password": password, "full_name": "Jane Roe" }))
                .to_request()
        };

        let resp = test::call_service(&app, register("jane.roe.routes@company.com", "secret1")).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = test::call_service(&app, register("jane.roe.routes@company.com", "secret1")).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = test::call_service(&app, register("short.pw@company.com", "12345")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value =
            test::call_and_read_body_json(&app, login("jane.roe.routes@company.com", "secret1").to_request()).await;
        assert_eq!(body["role"], "employee");
    }

    #[actix_web::test]
    async fn malformed_json_is_a_400_with_error_body() {
        let app = test_app!(demo_store());
        let req = request()
            .method(Method::POST)
            .uri("/auth/login")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().is_some());
    }

    #[actix_web::test]
    async fn bad_query_and_path_values_are_json_errors() {
        let app = test_app!(demo_store());

        for uri in [
            "/admin/leaves?status=bogus",
            "/admin/attendance?date=yesterday",
            "/api/leave/abc",
        ] {
            let req = request()
                .uri(uri)
                .insert_header(bearer(&admin_token()))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert!(body["error"].as_str().is_some(), "{uri}");
        }
    }

    #[actix_web::test]
    async fn refresh_picks_up_a_newly_linked_profile() {
        let store = demo_store();
        let app = test_app!(store.clone());

        let req = request()
            .method(Method::POST)
            .uri("/auth/register")
            .set_json(json!({ "email": "alex.login@company.com", "password": "secret1", "full_name": "Alex Rivera" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let body: Value =
            test::call_and_read_body_json(&app, login("alex.login@company.com", "secret1").to_request()).await;
        let refresh = body["refresh_token"].as_str().unwrap().to_string();
        let user_id = store
            .find_user_by_email("alex.login@company.com")
            .await
            .unwrap()
            .unwrap()
            .id;

        // admin links EMP005 to the new account
        let patch = EmployeePatch {
            user_id: Some(user_id),
            ..Default::default()
        };
        store.update_employee(5, patch).await.unwrap().unwrap();

        let req = request()
            .method(Method::POST)
            .uri("/auth/refresh")
            .insert_header(bearer(&refresh))
            .to_request();
        let rotated: Value = test::call_and_read_body_json(&app, req).await;
        let access = rotated["access_token"].as_str().unwrap();

        let req = request().uri("/api/me").insert_header(bearer(access)).to_request();
        let me: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(me["employee_id"], 5);

        let req = request()
            .uri("/employee/salary")
            .insert_header(bearer(access))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn sign_in_page_is_public() {
        let app = test_app!(demo_store());
        let req = request().uri("/auth").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["login"], "/auth/login");
    }
}
