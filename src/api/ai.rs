use actix_web::{web, Responder};

async fn chat() -> impl Responder {
    "Send to Gemini API"
}

async fn summarize() -> impl Responder {
    "Summarize conversation"
}

async fn translate() -> impl Responder {
    "Translate text"
}

async fn analyze_file() -> impl Responder {
    "Analyze uploaded file"
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/chat", web::post().to(chat))
        .route("/summarize", web::post().to(summarize))
        .route("/translate", web::post().to(translate))
        .route("/analyze-file", web::post().to(analyze_file));
}
