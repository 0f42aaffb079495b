use actix_web::{web, Responder};

async fn upload() -> impl Responder {
    "Upload file"
}

async fn get(id: web::Path<String>) -> impl Responder {
    format!("Get file metadata {id}")
}

async fn delete(id: web::Path<String>) -> impl Responder {
    format!("Delete file {id}")
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/upload", web::post().to(upload)).service(
        web::resource("/{id}")
            .route(web::get().to(get))
            .route(web::delete().to(delete)),
    );
}
