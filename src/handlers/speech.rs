use actix_web::{web, Error, HttpResponse};
use log::info;

use crate::models::response::SpeechRequest;
use crate::services::BackendClient;

/// `POST /speech/text-to-speech` — synthesize the given text and stream the
/// audio back as-is.
pub async fn text_to_speech(
    request: web::Json<SpeechRequest>,
    backend: web::Data<BackendClient>,
) -> Result<HttpResponse, Error> {
    let request = request.into_inner();
    info!("Synthesizing speech for {} characters", request.text.len());

    match backend.text_to_speech(&request).await {
        Ok(audio) => Ok(HttpResponse::Ok().content_type("audio/mpeg").body(audio)),
        Err(e) => Ok(super::error_response(&e)),
    }
}
