use actix_web::{web, Responder};
use shared::api::message::CreateRequest;

use crate::{error::ApiError, store::MessageStore};

async fn list(
    store: web::Data<dyn MessageStore>,
    chat_id: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let messages = store.list_messages(&chat_id).await?;

    Ok(web::Json(messages))
}

async fn create(
    store: web::Data<dyn MessageStore>,
    request: web::Json<CreateRequest>,
) -> Result<impl Responder, ApiError> {
    let inserted = store.insert_message(request.into_inner()).await?;

    Ok(web::Json(inserted))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/messages/{chat_id}", web::get().to(list))
        .route("/messages", web::post().to(create));
}
