//! Questionnaire page and submission handler.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use futures_util::stream;
use tokio::sync::mpsc;

use crate::api::error::ApiError;
use crate::api::render::{
    error_block, page_start, progress_line, render_page, result_block, summary_heading, PAGE_END,
};
use crate::api::types::{ApiContext, MAX_ANSWER_CHARS};
use crate::pipeline::rag::types::QueryEngine;
use crate::questionnaire::{collect_responses, Question};
use crate::session::{SessionController, SessionEvent};

/// Page fragments buffered between the analysis thread and the client.
const PAGE_CHUNK_BUFFER: usize = 16;

/// `GET /` — the empty questionnaire.
pub async fn show() -> Html<String> {
    Html(render_page(&[]))
}

/// `POST /` — re-render the form with answers retained, then stream a
/// progress line and a result block per answered question as each one
/// completes.
///
/// Engine calls are blocking and sequential, so the whole submission runs
/// on one blocking-pool thread that feeds the response body through a
/// channel. If the engine fails part-way, an error block follows the
/// results already sent.
pub async fn submit(
    State(ctx): State<ApiContext>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let responses = collect_responses(|q| fields.get(&q.field_name()).cloned());
    validate_lengths(&responses)?;

    let answered = responses.iter().filter(|(_, a)| !a.trim().is_empty()).count();
    tracing::info!(answered, "Questionnaire submitted");

    let (tx, rx) = mpsc::channel::<String>(PAGE_CHUNK_BUFFER);
    let engine = ctx.engine;
    tokio::task::spawn_blocking(move || {
        stream_submission(engine.engine.as_ref(), &responses, &tx);
    });

    let chunks = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
    });

    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        Body::from_stream(chunks),
    )
        .into_response())
}

/// Write the whole result page into `tx`, one fragment per event.
fn stream_submission<E>(engine: &E, responses: &[(Question, String)], tx: &mpsc::Sender<String>)
where
    E: QueryEngine + ?Sized,
{
    let send = |chunk: String| {
        if tx.blocking_send(chunk).is_err() {
            tracing::debug!("Client went away; dropping page fragment");
        }
    };

    send(page_start(responses));
    send(summary_heading());

    let outcome = SessionController::new().submit(responses, engine, &mut |event| match event {
        SessionEvent::Analyzing(question) => send(progress_line(question)),
        SessionEvent::Analyzed(analyzed) => send(result_block(analyzed)),
    });

    if let Err(e) = outcome {
        tracing::error!(error = %e, "Analysis failed");
        send(error_block(&e.to_string()));
    }
    send(PAGE_END.to_string());
}

fn validate_lengths(responses: &[(Question, String)]) -> Result<(), ApiError> {
    for (question, answer) in responses {
        let chars = answer.chars().count();
        if chars > MAX_ANSWER_CHARS {
            return Err(ApiError::BadRequest(format!(
                "Answer to Q{} is {chars} characters; the limit is {MAX_ANSWER_CHARS}",
                question.number
            )));
        }
    }
    Ok(())
}
