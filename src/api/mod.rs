use actix_web::{error, web, HttpResponse, Responder};
use shared::api::error::ErrorResponse;

pub mod ai;
pub mod chat;
pub mod files;
pub mod message;
pub mod settings;

const JSON_LIMIT: usize = 100 * 1024;

async fn liveness() -> impl Responder {
    "DARS Mini Backend is running!"
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            let response = HttpResponse::BadRequest().json(ErrorResponse::new(err.to_string()));

            error::InternalError::from_response(err, response).into()
        })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(liveness)).service(
        web::scope("/api")
            .app_data(json_config())
            .configure(message::config)
            .service(web::scope("/chats").configure(chat::config))
            .service(web::scope("/files").configure(files::config))
            .service(web::scope("/ai").configure(ai::config))
            .service(web::scope("/settings").configure(settings::config)),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test, App};

    use super::*;
    use crate::store::{memory::MemoryStore, MessageStore};

    const STUBS: &[(&str, &str, &str)] = &[
        ("POST", "/api/chats", "Create new chat"),
        ("GET", "/api/chats", "List all chats"),
        ("GET", "/api/chats/c1", "Get chat c1"),
        ("PATCH", "/api/chats/c1", "Update chat c1"),
        ("DELETE", "/api/chats/c1", "Delete chat c1"),
        ("POST", "/api/chats/c1/export", "Export chat c1"),
        ("POST", "/api/chats/c1/messages", "Send message to AI"),
        ("GET", "/api/chats/c1/messages", "Get chat messages"),
        ("PATCH", "/api/chats/c1/messages/m7", "Edit message m7"),
        ("DELETE", "/api/chats/c1/messages/m7", "Delete message m7"),
        ("POST", "/api/chats/c1/messages/m7/pin", "Pin/unpin message m7"),
        ("POST", "/api/chats/c1/messages/m7/translate", "Translate message m7"),
        ("POST", "/api/files/upload", "Upload file"),
        ("GET", "/api/files/f3", "Get file metadata f3"),
        ("DELETE", "/api/files/f3", "Delete file f3"),
        ("POST", "/api/ai/chat", "Send to Gemini API"),
        ("POST", "/api/ai/summarize", "Summarize conversation"),
        ("POST", "/api/ai/translate", "Translate text"),
        ("POST", "/api/ai/analyze-file", "Analyze uploaded file"),
        ("GET", "/api/settings", "Get user settings"),
        ("PATCH", "/api/settings", "Update settings"),
        ("GET", "/", "DARS Mini Backend is running!"),
    ];

    fn app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let store: Arc<dyn MessageStore> = Arc::new(MemoryStore::default());

        App::new()
            .app_data(web::Data::from(store))
            .configure(config)
    }

    #[actix_web::test]
    async fn stubs_answer_with_fixed_text() {
        let app = test::init_service(app()).await;

        for (method, uri, expected) in STUBS {
            let req = test::TestRequest::default()
                .method(method.parse().unwrap())
                .uri(uri)
                .to_request();
            let res = test::call_service(&app, req).await;

            assert_eq!(res.status(), StatusCode::OK, "{method} {uri}");
            let body = test::read_body(res).await;
            assert_eq!(body, expected.as_bytes(), "{method} {uri}");
        }
    }

    #[actix_web::test]
    async fn stubs_ignore_body_and_query() {
        let app = test::init_service(app()).await;

        let req = test::TestRequest::patch()
            .uri("/api/settings/?theme=dark")
            .set_json(serde_json::json!({ "theme": "dark" }))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "Update settings".as_bytes());

        let req = test::TestRequest::post()
            .uri("/api/chats/c1/messages/m7/pin?pinned=false")
            .set_payload("not json at all")
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "Pin/unpin message m7".as_bytes());
    }

    #[actix_web::test]
    async fn unparseable_json_is_400() {
        let app = test::init_service(app()).await;

        let req = test::TestRequest::post()
            .uri("/api/messages")
            .insert_header(("content-type", "application/json"))
            .set_payload("{ not json")
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(res).await;
        assert!(!body.error.is_empty());
    }
}
