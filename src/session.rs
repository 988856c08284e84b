//! Drives one questionnaire submission through the query engine.
//!
//! Answers are processed strictly in question order, one engine call at a
//! time. Progress and each result are handed to the caller's sink as soon
//! as they happen, so a failure part-way leaves earlier results already
//! rendered.

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::pipeline::rag::prompt::build_prompt;
use crate::pipeline::rag::types::{AssessmentResult, QueryEngine};
use crate::pipeline::rag::RagError;
use crate::questionnaire::Question;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Analysis of Q{number} failed: {source}")]
    Analysis {
        number: usize,
        #[source]
        source: RagError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    /// Waiting on the engine for question `current` (1-based).
    Analyzing { current: usize },
}

/// One answered question with its assessment.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedAnswer {
    pub question: Question,
    pub answer: String,
    pub result: AssessmentResult,
}

/// What the controller reports while a submission runs.
#[derive(Debug, Clone, Copy)]
pub enum SessionEvent<'a> {
    /// The engine is about to be queried for this question.
    Analyzing(&'a Question),
    /// A result is ready.
    Analyzed(&'a AnalyzedAnswer),
}

/// Outcome of a completed submission.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionReport {
    pub analyzed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
}

pub struct SessionController {
    state: SessionState,
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Analyze every non-blank answer, in order.
    ///
    /// Blank (whitespace-only) answers are skipped without building a
    /// prompt. The first engine failure stops the submission; later
    /// answers are not processed.
    pub fn submit<E>(
        &mut self,
        responses: &[(Question, String)],
        engine: &E,
        on_event: &mut dyn FnMut(SessionEvent<'_>),
    ) -> Result<SessionReport, SessionError>
    where
        E: QueryEngine + ?Sized,
    {
        let start = Instant::now();
        let mut report = SessionReport::default();

        let outcome = self.run(responses, engine, on_event, &mut report);
        self.state = SessionState::Idle;

        report.duration_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            Ok(()) => tracing::info!(
                analyzed = report.analyzed,
                skipped = report.skipped,
                duration_ms = report.duration_ms,
                "Submission analyzed"
            ),
            Err(e) => tracing::warn!(
                analyzed = report.analyzed,
                error = %e,
                "Submission stopped on engine failure"
            ),
        }
        outcome.map(|()| report)
    }

    fn run<E>(
        &mut self,
        responses: &[(Question, String)],
        engine: &E,
        on_event: &mut dyn FnMut(SessionEvent<'_>),
        report: &mut SessionReport,
    ) -> Result<(), SessionError>
    where
        E: QueryEngine + ?Sized,
    {
        for (question, answer) in responses {
            if answer.trim().is_empty() {
                report.skipped += 1;
                continue;
            }

            self.state = SessionState::Analyzing {
                current: question.number,
            };
            tracing::debug!(
                question = question.number,
                category = question.category.as_str(),
                "Analyzing answer"
            );
            on_event(SessionEvent::Analyzing(question));

            let prompt = build_prompt(question.text, answer);
            let result = engine.query(&prompt).map_err(|source| SessionError::Analysis {
                number: question.number,
                source,
            })?;

            on_event(SessionEvent::Analyzed(&AnalyzedAnswer {
                question: *question,
                answer: answer.clone(),
                result,
            }));
            report.analyzed += 1;
        }
        Ok(())
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::pipeline::gemini::GeminiError;
    use crate::questionnaire::{collect_responses, questions, QUESTIONS};

    /// Records every prompt; optionally fails on the n-th call (1-based).
    struct RecordingEngine {
        prompts: RefCell<Vec<String>>,
        fail_on_call: Option<usize>,
    }

    impl RecordingEngine {
        fn new() -> Self {
            Self {
                prompts: RefCell::new(Vec::new()),
                fail_on_call: None,
            }
        }

        fn failing_on(call: usize) -> Self {
            Self {
                prompts: RefCell::new(Vec::new()),
                fail_on_call: Some(call),
            }
        }

        fn call_count(&self) -> usize {
            self.prompts.borrow().len()
        }
    }

    impl QueryEngine for RecordingEngine {
        fn query(&self, prompt: &str) -> Result<AssessmentResult, RagError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            if Some(self.call_count()) == self.fail_on_call {
                return Err(RagError::Model(GeminiError::RateLimited));
            }
            Ok(AssessmentResult {
                text: format!("- Risk Level: Low (call {})", self.call_count()),
                sources: vec![],
                model: "mock".into(),
            })
        }
    }

    fn answers(pairs: &[(usize, &str)]) -> Vec<(Question, String)> {
        collect_responses(|q| {
            pairs
                .iter()
                .find(|(n, _)| *n == q.number)
                .map(|(_, a)| a.to_string())
        })
    }

    #[test]
    fn blank_answers_are_skipped() {
        let engine = RecordingEngine::new();
        let responses = answers(&[(1, "   "), (2, "\n\t"), (3, "Moving less than usual")]);
        let mut rendered = Vec::new();

        let report = SessionController::new()
            .submit(&responses, &engine, &mut |event| {
                if let SessionEvent::Analyzed(a) = event {
                    rendered.push(a.question.number);
                }
            })
            .unwrap();

        assert_eq!(engine.call_count(), 1);
        assert_eq!(rendered, vec![3]);
        assert_eq!(report.analyzed, 1);
        assert_eq!(report.skipped, QUESTIONS.len() - 1);
    }

    #[test]
    fn engine_called_once_per_answer_in_question_order() {
        let engine = RecordingEngine::new();
        let responses = answers(&[(9, "No"), (2, "Sharp pain on the left"), (5, "38.9 fever")]);
        let mut rendered = Vec::new();

        SessionController::new()
            .submit(&responses, &engine, &mut |event| {
                if let SessionEvent::Analyzed(a) = event {
                    rendered.push(a.question.number);
                }
            })
            .unwrap();

        assert_eq!(rendered, vec![2, 5, 9]);
        let prompts = engine.prompts.borrow();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains(questions()[1].text));
        assert!(prompts[1].contains(questions()[4].text));
        assert!(prompts[2].contains(questions()[8].text));
    }

    #[test]
    fn first_pregnancy_scenario_builds_one_prompt() {
        let engine = RecordingEngine::new();
        let responses = answers(&[(10, "Yes, I'm 40 with BMI 33")]);
        let mut rendered = Vec::new();

        SessionController::new()
            .submit(&responses, &engine, &mut |event| {
                if let SessionEvent::Analyzed(a) = event {
                    rendered.push(a.clone());
                }
            })
            .unwrap();

        assert_eq!(engine.call_count(), 1);
        let prompt = &engine.prompts.borrow()[0];
        assert!(prompt.contains("Is this your first pregnancy? What is your age and pre-pregnancy BMI?"));
        assert!(prompt.contains("Yes, I'm 40 with BMI 33"));
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].answer, "Yes, I'm 40 with BMI 33");
        assert_eq!(rendered[0].result.to_string(), "- Risk Level: Low (call 1)");
    }

    #[test]
    fn all_blank_submission_makes_no_calls() {
        let engine = RecordingEngine::new();
        let responses = answers(&[]);
        let mut rendered = 0;

        let report = SessionController::new()
            .submit(&responses, &engine, &mut |_| rendered += 1)
            .unwrap();

        assert_eq!(engine.call_count(), 0);
        assert_eq!(rendered, 0);
        assert_eq!(report.analyzed, 0);
        assert_eq!(report.skipped, 11);
    }

    #[test]
    fn failure_on_third_answer_stops_submission() {
        let engine = RecordingEngine::failing_on(3);
        let responses = answers(&[
            (1, "No bleeding"),
            (3, "Fewer kicks"),
            (4, "Bad headache and swollen hands"),
            (6, "Some tightening"),
            (11, "31"),
        ]);
        let mut rendered = Vec::new();
        let mut controller = SessionController::new();

        let err = controller
            .submit(&responses, &engine, &mut |event| {
                if let SessionEvent::Analyzed(a) = event {
                    rendered.push(a.question.number);
                }
            })
            .unwrap_err();

        assert_eq!(rendered, vec![1, 3]);
        assert_eq!(engine.call_count(), 3);
        assert!(matches!(err, SessionError::Analysis { number: 4, .. }));
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn progress_precedes_each_result_and_marks_the_failing_question() {
        let engine = RecordingEngine::failing_on(2);
        let responses = answers(&[(2, "Sharp pain"), (7, "Very thirsty"), (8, "Dizzy")]);
        let mut events = Vec::new();

        let result = SessionController::new().submit(&responses, &engine, &mut |event| {
            events.push(match event {
                SessionEvent::Analyzing(q) => format!("analyzing {}", q.number),
                SessionEvent::Analyzed(a) => format!("analyzed {}", a.question.number),
            });
        });

        assert!(result.is_err());
        assert_eq!(events, vec!["analyzing 2", "analyzed 2", "analyzing 7"]);
    }

    #[test]
    fn controller_returns_to_idle_and_accepts_next_submission() {
        let engine = RecordingEngine::new();
        let mut controller = SessionController::new();
        let responses = answers(&[(11, "24 weeks")]);

        controller.submit(&responses, &engine, &mut |_| {}).unwrap();
        assert_eq!(controller.state(), SessionState::Idle);

        controller.submit(&responses, &engine, &mut |_| {}).unwrap();
        assert_eq!(engine.call_count(), 2);
    }
}
