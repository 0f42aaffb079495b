use actix_web::{web, Responder};

async fn get() -> impl Responder {
    "Get user settings"
}

async fn update() -> impl Responder {
    "Update settings"
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(["", "/"])
            .route(web::get().to(get))
            .route(web::patch().to(update)),
    );
}
