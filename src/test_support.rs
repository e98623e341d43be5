//! Helpers for service-level tests against the in-memory store.

use std::sync::Arc;

use actix_web::test::TestRequest;
use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    auth::jwt::{Subject, generate_access_token, generate_refresh_token},
    clock::Clock,
    config::Config,
    model::role::Role,
    store::{HrStore, MemoryStore},
};

pub const SECRET: &str = "test-secret";

/// Wednesday morning, before the late threshold. Every test app runs on it.
pub fn test_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 4)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .expect("test date")
}

pub fn test_config() -> Config {
    let mut config = Config::from_lookup(|key| {
        let value = match key {
            "SERVER_ADDR" => "127.0.0.1:0",
            "JWT_SECRET" => SECRET,
            "STORE_BACKEND" => "memory",
            "RATE_LOGIN_PER_MIN" | "RATE_REGISTER_PER_MIN" | "RATE_REFRESH_PER_MIN" => "600",
            "RATE_PROTECTED_PER_MIN" => "6000",
            _ => return None,
        };
        Some(value.to_string())
    })
    .expect("test config");
    config.clock = Clock::Fixed(test_now());
    config
}

/// Demo data with today's board on the test date.
pub fn demo_store() -> Arc<dyn HrStore> {
    Arc::new(MemoryStore::demo_on(test_now().date()).expect("demo data"))
}

fn subject(user_id: u64, email: &str, role: Role, employee_id: Option<u64>) -> Subject {
    Subject {
        user_id,
        email: email.to_string(),
        role: role.id(),
        employee_id,
    }
}

/// Access token for the seeded admin account.
pub fn admin_token() -> String {
    generate_access_token(&subject(1, "admin@company.com", Role::Admin, None), SECRET, 900)
        .expect("admin token")
}

/// Access token for the seeded employee account (linked to EMP001).
pub fn employee_token() -> String {
    generate_access_token(
        &subject(2, "employee@company.com", Role::Employee, Some(1)),
        SECRET,
        900,
    )
    .expect("employee token")
}

/// Employee-role account without an employee profile.
pub fn unlinked_employee_token() -> String {
    generate_access_token(&subject(9, "new@company.com", Role::Employee, None), SECRET, 900)
        .expect("unlinked token")
}

pub fn refresh_token_for_admin() -> String {
    generate_refresh_token(&subject(1, "admin@company.com", Role::Admin, None), SECRET, 900)
        .map(|(token, _)| token)
        .expect("refresh token")
}

/// Request with a peer address, which the rate limiter keys on.
pub fn request() -> TestRequest {
    TestRequest::default().peer_addr("127.0.0.1:40000".parse().expect("peer addr"))
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Initialises the full route table over `$store` (an `Arc<dyn HrStore>`).
macro_rules! test_app {
    ($store:expr) => {{
        let config = $crate::test_support::test_config();
        let limiters = $crate::routes::Limiters::from_config(&config).expect("limiters");
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(actix_web::middleware::NormalizePath::trim())
                .app_data(actix_web::web::Data::from($store))
                .app_data(actix_web::web::Data::new(config.clone()))
                .configure(|cfg| $crate::routes::configure(cfg, &config, &limiters)),
        )
        .await
    }};
}

pub(crate) use test_app;
