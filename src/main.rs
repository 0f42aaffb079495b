use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::from_fn,
    web, App, Error, HttpServer,
};
use anyhow::Context;
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use crate::{config::Config, rate_limit::RateLimit, store::MessageStore, ui::Pages};

mod api;
mod config;
mod error;
mod headers;
mod rate_limit;
mod store;
mod trace;
mod ui;

fn app(
    store: web::Data<dyn MessageStore>,
    pages: web::Data<Pages>,
    rate_limit: RateLimit,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(rate_limit)
        .wrap(headers::security_headers())
        .wrap(headers::cors())
        .wrap(from_fn(trace::trace_request))
        .app_data(store)
        .app_data(pages)
        .configure(api::config)
        .configure(ui::config)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("HOST: {}", config.host);
    tracing::info!("PORT: {}", config.port);
    tracing::info!("STORE: {:?}", config.store);
    tracing::info!(
        "RATE LIMIT: {} requests per {}s",
        config.rate_limit.max_requests,
        config.rate_limit.window.as_secs()
    );

    let store: Arc<dyn MessageStore> = store::connect(&config.store)
        .await
        .with_context(|| format!("failed to initialize {} store", config.store.kind()))?;
    let store = web::Data::from(store);

    let pages = web::Data::new(Pages::new().context("failed to load page templates")?);

    let rate_limit = RateLimit::new(config.rate_limit.window, config.rate_limit.max_requests);

    let addr = config.bind_address();

    let server = HttpServer::new(move || app(store.clone(), pages.clone(), rate_limit.clone()))
        .bind(&addr)?;

    tracing::info!("Server is running on {}", addr);

    server.run().await?;

    Ok(())
}
