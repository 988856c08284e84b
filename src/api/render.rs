//! Server-side HTML for the questionnaire page.

use crate::config::APP_NAME;
use crate::questionnaire::{questions, Question};
use crate::session::AnalyzedAnswer;

const PAGE_TITLE: &str = "Pregnancy Risk Checker";
const INTRO: &str = "Answer the following questions to assess symptom risk using WHO-based guidelines.";
const SUBMIT_LABEL: &str = "Analyze Responses";
const SUMMARY_HEADING: &str = "Risk Analysis Summary";

/// Closes the document opened by [`page_start`].
pub const PAGE_END: &str = "</body>
</html>
";

/// Escape text for HTML element content and double-quoted attributes.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// The complete questionnaire page with no results.
pub fn render_page(answers: &[(Question, String)]) -> String {
    format!("{}{PAGE_END}", page_start(answers))
}

/// Everything up to and including the form. `answers` pre-fills the
/// textareas; the document is left open for streamed results.
pub fn page_start(answers: &[(Question, String)]) -> String {
    let fields = questions()
        .iter()
        .map(|q| {
            let value = answers
                .iter()
                .find(|(aq, _)| aq.number == q.number)
                .map(|(_, a)| a.as_str())
                .unwrap_or("");
            render_field(q, value)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{PAGE_TITLE}</title>
<style>
body{{margin:0 auto;max-width:760px;padding:24px;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;color:#1c1917;background:#fafaf9}}
label{{display:block;font-weight:600;margin:16px 0 6px}}
textarea{{width:100%;min-height:64px;padding:8px;border:1px solid #d6d3d1;border-radius:8px;font:inherit}}
button{{margin-top:20px;padding:12px 20px;border:none;border-radius:8px;background:#2DD4BF;color:#fff;font-weight:600;cursor:pointer}}
pre{{white-space:pre-wrap;background:#f5f5f4;padding:12px;border-radius:8px}}
.answer{{font-style:italic}}
.progress{{color:#78716c}}
.progress:has(+ .result),.progress:has(+ .error){{display:none}}
.error{{background:#fef2f2;border:1px solid #fecaca;color:#991b1b;padding:12px;border-radius:8px}}
</style>
</head>
<body>
<h1>{APP_NAME}</h1>
<p>{INTRO}</p>
<form method="post" action="/">
{fields}
<button type="submit">{SUBMIT_LABEL}</button>
</form>
"##
    )
}

fn render_field(question: &Question, value: &str) -> String {
    let name = question.field_name();
    format!(
        "<label for=\"{name}\">{label}</label>\n<textarea id=\"{name}\" name=\"{name}\">{value}</textarea>",
        label = html_escape(&question.label()),
        value = html_escape(value),
    )
}

pub fn summary_heading() -> String {
    format!("<hr>\n<h2>{SUMMARY_HEADING}</h2>\n")
}

/// Shown while the engine works on `question`; hidden by CSS once the
/// next block arrives.
pub fn progress_line(question: &Question) -> String {
    format!("<p class=\"progress\">Analyzing Q{}...</p>\n", question.number)
}

pub fn result_block(analyzed: &AnalyzedAnswer) -> String {
    format!(
        "<section class=\"result\">\n<p><strong>{label}</strong></p>\n<p class=\"answer\">{answer}</p>\n<p><strong>Assessment</strong>:</p>\n<pre>{assessment}</pre>\n</section>\n<hr>\n",
        label = html_escape(&analyzed.question.label()),
        answer = html_escape(&analyzed.answer),
        assessment = html_escape(&analyzed.result.to_string()),
    )
}

pub fn error_block(message: &str) -> String {
    format!(
        "<div class=\"error\" role=\"alert\">Analysis stopped: {}</div>\n",
        html_escape(message)
    )
}
