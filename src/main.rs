use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use std::sync::Arc;

mod api;
mod auth;
mod clock;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod store;
mod utils;
mod views;

#[cfg(test)]
mod test_support;

use config::{Config, StoreBackend};
use db::init_db;
use routes::Limiters;
use store::{HrStore, MemoryStore, MySqlStore};

use crate::docs::ApiDoc;
use crate::utils::email_cache;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let writer = if config.log_stdout {
        BoxMakeWriter::new(non_blocking.and(std::io::stdout))
    } else {
        BoxMakeWriter::new(non_blocking)
    };

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(backend = %config.store_backend, "Server starting...");

    let store: Arc<dyn HrStore> = match config.store_backend {
        StoreBackend::Mysql => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set when STORE_BACKEND=mysql")?;
            let pool = init_db(url, config.run_migrations).await?;
            Arc::new(MySqlStore::new(pool))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory demo store, changes are lost on restart");
            Arc::new(MemoryStore::demo()?)
        }
    };

    let limiters = Limiters::from_config(&config)?;

    let store_for_cache_warmup = store.clone();
    actix_web::rt::spawn(async move {
        // Warm up last 30 days of recent sign-ins in batches of 250
        if let Err(e) =
            email_cache::warmup_email_cache(store_for_cache_warmup.as_ref(), 30, 250).await
        {
            error!(error = ?e, "Failed to warmup email cache");
        }
    });

    let server_addr = config.server_addr.clone();
    let store_data: Data<dyn HrStore> = Data::from(store);
    let config_data = Data::new(config);

    HttpServer::new(move || {
        let config = config_data.clone();
        let limiters = limiters.clone();
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store_data.clone())
            .app_data(config.clone())
            .configure(move |cfg| routes::configure(cfg, &config, &limiters))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {}", server_addr))?
    .run()
    .await
    .context("Server error")
}
