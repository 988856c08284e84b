//! Triage web router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the triage router.
///
/// - `GET /` questionnaire page
/// - `POST /` analyze submitted answers
/// - `GET /health` JSON status
pub fn triage_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/", get(endpoints::form::show).post(endpoints::form::submit))
        .route("/health", get(endpoints::health::check))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::{mpsc, Mutex};

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::engine_state::SharedEngine;
    use crate::pipeline::gemini::GeminiError;
    use crate::pipeline::rag::types::{AssessmentResult, QueryEngine};
    use crate::pipeline::rag::RagError;
    use crate::pipeline::storage::types::IndexStats;

    /// Echoes the answer line of each prompt; fails on the n-th call.
    struct ScriptedEngine {
        calls: Mutex<usize>,
        fail_on_call: Option<usize>,
    }

    impl QueryEngine for ScriptedEngine {
        fn query(&self, prompt: &str) -> Result<AssessmentResult, RagError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if Some(*calls) == self.fail_on_call {
                return Err(RagError::Model(GeminiError::RateLimited));
            }
            let answer = prompt
                .lines()
                .find(|l| l.starts_with("Answer: "))
                .unwrap_or("Answer: ?");
            Ok(AssessmentResult {
                text: format!("- Risk Level: <Medium> for {answer}"),
                sources: vec![],
                model: "mock".into(),
            })
        }
    }

    /// Blocks every query until the test releases it.
    struct GatedEngine {
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl QueryEngine for GatedEngine {
        fn query(&self, _prompt: &str) -> Result<AssessmentResult, RagError> {
            let _ = self.release.lock().unwrap().recv();
            Ok(AssessmentResult {
                text: "- Risk Level: Low".into(),
                sources: vec![],
                model: "mock".into(),
            })
        }
    }

    fn context(fail_on_call: Option<usize>) -> ApiContext {
        context_with(ScriptedEngine {
            calls: Mutex::new(0),
            fail_on_call,
        })
    }

    fn context_with(engine: impl QueryEngine + Send + Sync + 'static) -> ApiContext {
        let engine: &'static SharedEngine = Box::leak(Box::new(SharedEngine {
            engine: Box::new(engine),
            stats: IndexStats {
                documents: 2,
                chunks: 14,
                dimension: 768,
            },
            model: "gemini-1.5-flash".into(),
        }));
        ApiContext::new(engine)
    }

    fn form_post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn get_root_renders_form() {
        let app = triage_router(context(None));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Pregnancy Risk Triage Assistant"));
        assert!(html.contains("name=\"q10\""));
        assert!(!html.contains("Risk Analysis Summary"));
    }

    #[tokio::test]
    async fn health_reports_index_stats() {
        let app = triage_router(context(None));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["documents"], 2);
        assert_eq!(json["chunks"], 14);
        assert_eq!(json["embedding_dimension"], 768);
        assert_eq!(json["model"], "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn post_renders_results_for_answered_questions_only() {
        let app = triage_router(context(None));
        let response = app
            .oneshot(form_post("q0=Light+spotting&q1=&q9=Yes%2C+I%27m+40+with+BMI+33"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Risk Analysis Summary"));
        assert_eq!(html.matches("class=\"result\"").count(), 2);
        assert!(html.contains("&lt;Medium&gt; for Answer: Light spotting"));
        assert!(html.contains("Yes, I&#39;m 40 with BMI 33</textarea>"));
        let q1 = html.find("<strong>Q1:").unwrap();
        let q10 = html.find("<strong>Q10:").unwrap();
        assert!(q1 < q10);
    }

    #[tokio::test]
    async fn post_with_all_blank_answers_shows_no_blocks() {
        let app = triage_router(context(None));
        let response = app.oneshot(form_post("q0=+&q5=")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Risk Analysis Summary"));
        assert!(!html.contains("class=\"result\""));
    }

    #[tokio::test]
    async fn engine_failure_appends_error_after_earlier_results() {
        let app = triage_router(context(Some(2)));
        let response = app
            .oneshot(form_post("q0=Spotting&q3=Headache&q6=Thirsty"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert_eq!(html.matches("class=\"result\"").count(), 1);
        let result = html.find("for Answer: Spotting").unwrap();
        let failing = html.find("Analyzing Q4...").unwrap();
        let error = html.find("Analysis of Q4 failed").unwrap();
        assert!(result < failing && failing < error);
        assert!(!html.contains("Analyzing Q7..."));
        assert!(html.ends_with("</html>\n"));
    }

    #[tokio::test]
    async fn blocks_stream_in_question_order() {
        let app = triage_router(context(None));
        let response = app
            .oneshot(form_post("q1=Sharp+pain&q4=Fever&q10=30"))
            .await
            .unwrap();

        let html = body_text(response).await;
        let positions: Vec<usize> = [
            "</form>",
            "Risk Analysis Summary",
            "Analyzing Q2...",
            "for Answer: Sharp pain",
            "Analyzing Q5...",
            "for Answer: Fever",
            "Analyzing Q11...",
            "for Answer: 30",
            "</html>",
        ]
        .iter()
        .map(|marker| html.find(marker).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn form_arrives_before_analysis_finishes() {
        let (release_tx, release_rx) = mpsc::channel();
        let app = triage_router(context_with(GatedEngine {
            release: Mutex::new(release_rx),
        }));
        let response = app.oneshot(form_post("q0=Spotting")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut body = response.into_body();
        let first = body.frame().await.unwrap().unwrap().into_data().unwrap();
        let first = String::from_utf8(first.to_vec()).unwrap();
        assert!(first.contains("name=\"q0\">Spotting</textarea>"));
        assert!(!first.contains("class=\"result\""));

        release_tx.send(()).unwrap();
        let rest = body.collect().await.unwrap().to_bytes();
        let rest = String::from_utf8(rest.to_vec()).unwrap();
        assert_eq!(rest.matches("class=\"result\"").count(), 1);
    }

    #[tokio::test]
    async fn overlong_answer_is_rejected() {
        let app = triage_router(context(None));
        let long = "a".repeat(crate::api::types::MAX_ANSWER_CHARS + 1);
        let response = app.oneshot(form_post(&format!("q2={long}"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }
}
