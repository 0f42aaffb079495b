//! Chat management and chat-scoped message routes. None of these are backed
//! by the store yet; each answers with a fixed description.

use actix_web::{web, Responder};
use serde::Deserialize;

#[derive(Deserialize)]
struct MessagePath {
    id: String,
}

async fn create() -> impl Responder {
    "Create new chat"
}

async fn list() -> impl Responder {
    "List all chats"
}

async fn get(id: web::Path<String>) -> impl Responder {
    format!("Get chat {id}")
}

async fn update(id: web::Path<String>) -> impl Responder {
    format!("Update chat {id}")
}

async fn delete(id: web::Path<String>) -> impl Responder {
    format!("Delete chat {id}")
}

async fn export(id: web::Path<String>) -> impl Responder {
    format!("Export chat {id}")
}

async fn send_message() -> impl Responder {
    "Send message to AI"
}

async fn get_messages() -> impl Responder {
    "Get chat messages"
}

async fn edit_message(path: web::Path<MessagePath>) -> impl Responder {
    format!("Edit message {}", path.id)
}

async fn delete_message(path: web::Path<MessagePath>) -> impl Responder {
    format!("Delete message {}", path.id)
}

async fn pin_message(path: web::Path<MessagePath>) -> impl Responder {
    format!("Pin/unpin message {}", path.id)
}

async fn translate_message(path: web::Path<MessagePath>) -> impl Responder {
    format!("Translate message {}", path.id)
}

fn messages_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(["", "/"])
            .route(web::post().to(send_message))
            .route(web::get().to(get_messages)),
    )
    .service(
        web::resource("/{id}")
            .route(web::patch().to(edit_message))
            .route(web::delete().to(delete_message)),
    )
    .route("/{id}/pin", web::post().to(pin_message))
    .route("/{id}/translate", web::post().to(translate_message));
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(["", "/"])
            .route(web::post().to(create))
            .route(web::get().to(list)),
    )
    .service(web::scope("/{chat_id}/messages").configure(messages_config))
    .service(
        web::resource("/{id}")
            .route(web::get().to(get))
            .route(web::patch().to(update))
            .route(web::delete().to(delete)),
    )
    .route("/{id}/export", web::post().to(export));
}
