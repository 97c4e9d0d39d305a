use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method, header};
use axum::response::IntoResponse;
use axum::routing::post;
use eyre::{Result, WrapErr};
use log::{error, info};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::error::PipelineError;
use crate::pipeline::Pipeline;

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SummarizeParams {
    #[serde(rename = "videoUrl")]
    pub video_url: String,
}

/// Build the router with CORS opened to a single origin
pub fn router(state: AppState, allowed_origin: &str) -> Result<Router> {
    let origin = HeaderValue::from_str(allowed_origin)
        .wrap_err_with(|| format!("invalid allowed origin: {allowed_origin}"))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(Router::new()
        .route("/api/summarize", post(summarize_video))
        .layer(cors)
        .with_state(state))
}

async fn summarize_video(
    State(state): State<AppState>,
    Query(params): Query<SummarizeParams>,
) -> Result<impl IntoResponse, PipelineError> {
    let summary = state.pipeline.run(&params.video_url).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], summary))
}

/// Serve until Ctrl+C
pub async fn serve(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("binding to {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("running HTTP server")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {e}");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::Response;

    use crate::pipeline::tests::pipeline_with;
    use crate::summarize::tests::{GeminiStub, gemini_reply};

    async fn call(state: AppState, url: &str) -> Response {
        let params = SummarizeParams {
            video_url: url.to_string(),
        };
        match summarize_video(State(state), Query(params)).await {
            Ok(ok) => ok.into_response(),
            Err(err) => err.into_response(),
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_summary_is_response_body() {
        let bin = tempfile::tempdir().unwrap();
        let stub = GeminiStub::start(StatusCode::OK, gemini_reply("The summary.")).await;
        let pipeline = pipeline_with(bin.path(), "echo 'hello there' > clip.en.vtt", &stub);

        let response = call(AppState::new(pipeline), "https://youtu.be/abc").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_text(response).await, "The summary.");
    }

    #[tokio::test]
    async fn test_empty_transcript_is_500() {
        let bin = tempfile::tempdir().unwrap();
        let stub = GeminiStub::start(StatusCode::OK, gemini_reply("unused")).await;
        let script = "printf '\\n00:00:01.000 --> 00:00:02.000\\n\\n' > clip.en.vtt";
        let pipeline = pipeline_with(bin.path(), script, &stub);

        let response = call(AppState::new(pipeline), "https://youtu.be/abc").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "❌ Error: Extracted text is empty!");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_captions_is_500() {
        let bin = tempfile::tempdir().unwrap();
        let stub = GeminiStub::start(StatusCode::OK, gemini_reply("unused")).await;
        let pipeline = pipeline_with(bin.path(), "exit 1", &stub);

        let response = call(AppState::new(pipeline), "https://youtu.be/abc").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Error: Captions file not found.");
    }

    #[tokio::test]
    async fn test_malformed_gemini_reply_is_500() {
        let bin = tempfile::tempdir().unwrap();
        let stub = GeminiStub::start(StatusCode::OK, r#"{"candidates": [{}]}"#).await;
        let pipeline = pipeline_with(bin.path(), "echo words > clip.en.vtt", &stub);

        let response = call(AppState::new(pipeline), "https://youtu.be/abc").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.starts_with("Error parsing response: "));
    }

    #[tokio::test]
    async fn test_cors_over_http() {
        let bin = tempfile::tempdir().unwrap();
        let stub = GeminiStub::start(StatusCode::OK, gemini_reply("Served.")).await;
        let pipeline = pipeline_with(bin.path(), "echo words > clip.en.vtt", &stub);
        let app = router(AppState::new(pipeline), "http://localhost:3000").unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let resp = reqwest::Client::new()
            .post(format!("http://{addr}/api/summarize"))
            .query(&[("videoUrl", "https://youtu.be/abc")])
            .header(header::ORIGIN, "http://localhost:3000")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(
            resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(resp.text().await.unwrap(), "Served.");

        let missing = reqwest::Client::new()
            .post(format!("http://{addr}/api/summarize"))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_origin() {
        let stub_settings = crate::summarize::GeminiSettings::new("k");
        let pipeline = Pipeline::new(
            crate::captions::CaptionFetcher::new("yt-dlp", "en", std::time::Duration::from_secs(1)),
            crate::summarize::Summarizer::new(reqwest::Client::new(), stub_settings),
        );
        assert!(router(AppState::new(pipeline), "http://bad\norigin").is_err());
    }
}
