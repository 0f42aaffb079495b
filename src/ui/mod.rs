//! Server-rendered page shell under `/app`.
//!
//! Pages are static: the chat page shows a fixed greeting and the message
//! input never leaves the browser.

use actix_web::{http::StatusCode, web, HttpResponse};
use minijinja::{context, Environment};
use serde::Serialize;

use crate::error::ApiError;

const GREETING: &str = "Hello! How can I help you today?";

const MESSAGE_INPUT_JS: &str = include_str!("static/message-input.js");

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("templates/layout.html")),
    ("components.html", include_str!("templates/components.html")),
    ("chat.html", include_str!("templates/chat.html")),
    ("live.html", include_str!("templates/live.html")),
    ("settings.html", include_str!("templates/settings.html")),
    ("not_found.html", include_str!("templates/not_found.html")),
];

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One rendered chat bubble.
#[derive(Serialize, Debug, Clone)]
pub struct Bubble {
    pub content: String,
    pub role: Role,
}

impl Bubble {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Bubble {
            content: content.into(),
            role,
        }
    }
}

pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();

        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }

        Ok(Pages { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }

    pub fn chat(&self, messages: &[Bubble]) -> Result<String, minijinja::Error> {
        self.render("chat.html", context! { messages => messages })
    }
}

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

async fn chat(pages: web::Data<Pages>) -> Result<HttpResponse, ApiError> {
    let body = pages.chat(&[Bubble::new(Role::Assistant, GREETING)])?;

    Ok(html(StatusCode::OK, body))
}

async fn live(pages: web::Data<Pages>) -> Result<HttpResponse, ApiError> {
    Ok(html(StatusCode::OK, pages.render("live.html", context! {})?))
}

async fn settings(pages: web::Data<Pages>) -> Result<HttpResponse, ApiError> {
    Ok(html(StatusCode::OK, pages.render("settings.html", context! {})?))
}

async fn not_found(pages: web::Data<Pages>) -> Result<HttpResponse, ApiError> {
    Ok(html(StatusCode::NOT_FOUND, pages.render("not_found.html", context! {})?))
}

async fn message_input_script() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/javascript; charset=utf-8")
        .body(MESSAGE_INPUT_JS)
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/app")
            .service(web::resource(["", "/"]).route(web::get().to(chat)))
            .route("/live", web::get().to(live))
            .route("/settings", web::get().to(settings))
            .route("/static/message-input.js", web::get().to(message_input_script))
            .default_service(web::to(not_found)),
    );
}
