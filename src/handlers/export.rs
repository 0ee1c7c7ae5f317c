//! Transcript download: wraps the text in a `text/plain` attachment named
//! `ScribeFlow_<stem>.txt`, where the stem is the source file name up to its
//! first dot.

use crate::error::{AppError, AppResult};
use actix_web::http::header::{ContentDisposition, ContentType, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use serde::Deserialize;

const DEFAULT_STEM: &str = "Transcript";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub text: Option<String>,
    pub file_name: Option<String>,
}

pub async fn export_transcript(body: web::Json<ExportRequest>) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let text = body
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError("Missing transcript text".to_string()))?;

    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(export_file_name(
            body.file_name.as_deref(),
        ))],
    };

    Ok(HttpResponse::Ok()
        .insert_header(ContentType::plaintext())
        .insert_header(disposition)
        .body(text))
}

/// `ScribeFlow_<stem>.txt`. Path separators, quotes and control characters
/// are dropped from the stem; an empty result falls back to `Transcript`.
pub fn export_file_name(source: Option<&str>) -> String {
    let stem: String = source
        .unwrap_or_default()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .split('.')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect();
    let stem = stem.trim();

    format!(
        "ScribeFlow_{}.txt",
        if stem.is_empty() { DEFAULT_STEM } else { stem }
    )
}

#[cfg(test)]
mod tests {
    use super::super::{routes, test_app};
    use super::*;
    use actix_web::{test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_export_file_name() {
        assert_eq!(export_file_name(Some("meeting.final.webm")), "ScribeFlow_meeting.txt");
        assert_eq!(export_file_name(Some("uploads/call.wav")), "ScribeFlow_call.txt");
        assert_eq!(export_file_name(Some("say \"hi\".mp3")), "ScribeFlow_say hi.txt");
        assert_eq!(export_file_name(Some(".hidden")), "ScribeFlow_Transcript.txt");
        assert_eq!(export_file_name(None), "ScribeFlow_Transcript.txt");
    }

    #[actix_web::test]
    async fn test_export_returns_attachment() {
        let (state, _) = test_app::state(&[]);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/export")
            .set_json(json!({"text": "Speaker 1: hello", "fileName": "standup.m4a"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("content-disposition").unwrap(),
            "attachment; filename=\"ScribeFlow_standup.txt\""
        );
        assert!(resp
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let body = test::read_body(resp).await;
        assert_eq!(body, "Speaker 1: hello");
    }

    #[actix_web::test]
    async fn test_export_requires_text() {
        let app = test::init_service(
            App::new().route("/export", web::post().to(export_transcript)),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/export")
            .set_json(json!({"fileName": "a.wav"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }
}
