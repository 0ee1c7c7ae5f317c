//! # Transcription Handlers
//!
//! Two ways in, one gateway:
//! - `POST /api/transcribe` takes `{ "base64Audio", "mimeType" }`, as sent by
//!   a browser that already encoded its recording
//! - `POST /api/transcribe/upload` takes a multipart form with an `audio`
//!   file field and does the encoding server-side
//!
//! Both validate before the first provider call, so a bad request never
//! costs a candidate attempt.

use super::run_gateway;
use crate::audio::{
    decoded_len, encode_base64, format_file_size, is_audio_mime, normalize_audio_mime,
    read_limited, strip_data_url,
};
use crate::error::{AppError, AppResult};
use crate::inference::{InferenceRequest, ProgressLog, ProgressReporter};
use crate::state::AppState;
use crate::workflow::{AppStatus, Workflow};
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

const LINK_STATUS: &str = "Establishing secure link";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeRequest {
    pub base64_audio: Option<String>,
    pub mime_type: Option<String>,
}

pub async fn transcribe(
    state: web::Data<AppState>,
    body: web::Json<TranscribeRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    // The payload forwarded upstream is exactly the one validated here.
    let audio = body
        .base64_audio
        .as_deref()
        .map(|audio| strip_data_url(audio.trim()).trim())
        .unwrap_or_default();
    let request = InferenceRequest::transcription(audio, body.mime_type.unwrap_or_default())?;

    let limit = state.get_config().limits.max_audio_bytes;
    let size = decoded_len(audio, limit)?;
    info!(bytes = size, "Transcription requested");

    let progress = ProgressLog::new();
    progress.report(LINK_STATUS);
    let completion = run_gateway(&state, &request, &progress).await?;

    Ok(HttpResponse::Ok().json(json!({
        "text": completion.text,
        "modelUsed": completion.model_used,
        "progress": progress.snapshot()
    })))
}

/// The `audio` part of an upload, fully buffered.
struct UploadedAudio {
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

pub async fn transcribe_upload(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let limit = state.get_config().limits.max_audio_bytes;
    let mut workflow = Workflow::new();
    workflow.transition(AppStatus::Uploading)?;

    let upload = match read_audio_field(&mut payload, limit).await {
        Ok(upload) => upload,
        Err(err) => {
            warn!(error = %err, "Upload rejected");
            workflow.fail(err.to_string())?;
            return Err(err);
        }
    };

    let mime_type = normalize_audio_mime(&upload.mime_type);
    let request = InferenceRequest::transcription(encode_base64(&upload.bytes), mime_type.clone())?;
    info!(
        file_name = %upload.file_name,
        mime_type = %mime_type,
        bytes = upload.bytes.len(),
        "Upload received"
    );

    workflow.transition(AppStatus::Processing)?;
    let progress = ProgressLog::new();
    progress.report(LINK_STATUS);

    match run_gateway(&state, &request, &progress).await {
        Ok(completion) => {
            workflow.transition(AppStatus::Completed)?;
            debug!(history = ?workflow.history(), "Upload workflow finished");
            Ok(HttpResponse::Ok().json(json!({
                "text": completion.text,
                "modelUsed": completion.model_used,
                "progress": progress.snapshot(),
                "fileName": upload.file_name,
                "size": format_file_size(upload.bytes.len() as u64),
                "mimeType": mime_type,
                "status": workflow.status()
            })))
        }
        Err(err) => {
            workflow.fail(err.to_string())?;
            warn!(
                history = ?workflow.history(),
                error = workflow.error().unwrap_or_default(),
                "Upload workflow failed"
            );
            Err(err)
        }
    }
}

async fn read_audio_field(payload: &mut Multipart, limit: usize) -> AppResult<UploadedAudio> {
    while let Some(item) = payload.next().await {
        let mut field: Field =
            item.map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;

        let (name, file_name) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_string),
                cd.get_filename().map(str::to_string),
            ),
            None => (None, None),
        };
        if name.as_deref() != Some("audio") {
            continue;
        }

        let mime_type = field
            .content_type()
            .map(ToString::to_string)
            .unwrap_or_default();
        if !is_audio_mime(&mime_type) {
            return Err(AppError::ValidationError(
                "Invalid data format. Standard audio required.".to_string(),
            ));
        }

        let bytes = read_limited(&mut field, limit).await?;
        return Ok(UploadedAudio {
            file_name: file_name.unwrap_or_else(|| "recording".to_string()),
            mime_type,
            bytes,
        });
    }

    Err(AppError::BadRequest(
        "Missing audio file field 'audio'".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::{json_config, routes, test_app};
    use super::*;
    use crate::config::AppConfig;
    use actix_web::{test, App};

    const BOUNDARY: &str = "scribeflowboundary";

    fn multipart_body(file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"{f}\"\r\n\
             Content-Type: {c}\r\n\r\n",
            b = BOUNDARY,
            f = file_name,
            c = content_type
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/transcribe/upload")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn test_transcribe_success() {
        let (state, client) =
            test_app::state(&[("A", Err("429 quota")), ("B", Ok("  hello world \n"))]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/transcribe")
            .set_json(json!({"base64Audio": encode_base64(b"RIFF"), "mimeType": "audio/wav"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["text"], "hello world");
        assert_eq!(body["modelUsed"], "B");
        assert_eq!(
            body["progress"],
            json!(["Establishing secure link", "Attempting A", "Attempting B"])
        );
        assert_eq!(*client.calls.lock().unwrap(), vec!["A", "B"]);
    }

    #[actix_web::test]
    async fn test_data_url_prefix_is_stripped() {
        let (state, _) = test_app::state(&[("A", Ok("ok"))]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes),
        )
        .await;

        let audio = format!("data:audio/webm;base64,{}", encode_base64(b"webm bytes"));
        let req = test::TestRequest::post()
            .uri("/api/transcribe")
            .set_json(json!({"base64Audio": audio, "mimeType": "audio/webm"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
    }

    #[actix_web::test]
    async fn test_surrounding_whitespace_is_not_forwarded() {
        let (state, client) = test_app::state(&[("A", Ok("ok"))]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/transcribe")
            .set_json(json!({"base64Audio": "  UklGRg==\n", "mimeType": "audio/wav"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
        assert_eq!(*client.payloads.lock().unwrap(), vec!["UklGRg=="]);
    }

    #[actix_web::test]
    async fn test_raised_audio_limit_applies_without_restart() {
        let (state, client) = test_app::state(&[("A", Ok("long recording"))]);
        let mut config = state.get_config();
        config.limits.max_audio_bytes = 1024;
        state.update_config(config).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .app_data(json_config(AppConfig::json_body_ceiling()))
                .configure(routes),
        )
        .await;

        let audio = encode_base64(&[3u8; 200 * 1024]);
        let post_audio = || {
            test::TestRequest::post()
                .uri("/api/transcribe")
                .set_json(json!({"base64Audio": audio, "mimeType": "audio/wav"}))
                .to_request()
        };

        assert_eq!(test::call_service(&app, post_audio()).await.status(), 413);
        assert!(client.calls.lock().unwrap().is_empty());

        let req = test::TestRequest::put()
            .uri("/api/v1/config")
            .set_json(json!({"limits": {"max_audio_bytes": 10_000_000}}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
        assert_eq!(state.get_config().limits.max_audio_bytes, 10_000_000);

        let resp = test::call_service(&app, post_audio()).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["text"], "long recording");
    }

    #[actix_web::test]
    async fn test_missing_mime_type_makes_no_attempt() {
        let (state, client) = test_app::state(&[("A", Ok("unused"))]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/transcribe")
            .set_json(json!({"base64Audio": "AAAA"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Missing audio data or mime type");
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_invalid_base64_is_400() {
        let (state, client) = test_app::state(&[("A", Ok("unused"))]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/transcribe")
            .set_json(json!({"base64Audio": "%%%not-base64%%%", "mimeType": "audio/wav"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_exhaustion_is_500_with_details() {
        let (state, _) =
            test_app::state(&[("A", Err("429")), ("B", Err("quota")), ("C", Err("limit"))]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/transcribe")
            .set_json(json!({"base64Audio": "AAAA", "mimeType": "audio/wav"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Transcription failed: all model candidates exhausted");
        assert!(body["details"].as_str().unwrap().contains("A, B, C"));
        assert_eq!(body["raw"], "provider returned 500: limit");
    }

    #[actix_web::test]
    async fn test_upload_normalizes_webm() {
        let (state, _) = test_app::state(&[("A", Ok("uploaded words"))]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes),
        )
        .await;

        let body = multipart_body("memo.webm", "audio/webm;codecs=opus", &[0u8; 2048]);
        let resp = test::call_service(&app, upload_request(body).to_request()).await;
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["text"], "uploaded words");
        assert_eq!(body["fileName"], "memo.webm");
        assert_eq!(body["mimeType"], "audio/webm");
        assert_eq!(body["size"], "2 KB");
        assert_eq!(body["status"], "COMPLETED");
    }

    #[actix_web::test]
    async fn test_upload_rejects_non_audio() {
        let (state, client) = test_app::state(&[("A", Ok("unused"))]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes),
        )
        .await;

        let body = multipart_body("notes.txt", "text/plain", b"not audio");
        let resp = test::call_service(&app, upload_request(body).to_request()).await;
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid data format. Standard audio required.");
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_upload_over_limit_is_413() {
        let (state, client) = test_app::state(&[("A", Ok("unused"))]);
        let mut config = state.get_config();
        config.limits.max_audio_bytes = 1024;
        state.update_config(config).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes),
        )
        .await;

        let body = multipart_body("big.wav", "audio/wav", &[1u8; 4096]);
        let resp = test::call_service(&app, upload_request(body).to_request()).await;
        assert_eq!(resp.status(), 413);
        assert!(client.calls.lock().unwrap().is_empty());
    }
}
