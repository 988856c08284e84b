use super::types::{AssembledContext, ScoredChunk};

const MAX_CONTEXT_TOKENS: usize = 3000;

/// English text averages ~4 chars/token for subword tokenizers.
const CHARS_PER_TOKEN: usize = 4;

const MAX_CONTEXT_CHARS: usize = MAX_CONTEXT_TOKENS * CHARS_PER_TOKEN;

fn estimate_tokens(text: &str) -> usize {
    text.len() / CHARS_PER_TOKEN
}

/// Join retrieved passages into the context block of the QA template.
/// Highest score first; passages that would overflow the budget are dropped.
pub fn assemble_context(chunks: &[ScoredChunk]) -> AssembledContext {
    let mut ordered = chunks.to_vec();
    ordered.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut sections = Vec::new();
    let mut total_chars = 0;
    let mut chunks_included = Vec::new();

    for chunk in ordered {
        if total_chars >= MAX_CONTEXT_CHARS {
            break;
        }
        let section = format_chunk(&chunk);
        if total_chars + section.len() <= MAX_CONTEXT_CHARS {
            total_chars += section.len();
            sections.push(section);
            chunks_included.push(chunk);
        }
    }

    let text = sections.join("\n\n");
    let estimated_tokens = estimate_tokens(&text);

    AssembledContext {
        text,
        estimated_tokens,
        chunks_included,
    }
}

fn format_chunk(chunk: &ScoredChunk) -> String {
    let mut text = format!("[Source: {}", chunk.source_name);
    if let Some(ref title) = chunk.section_title {
        text.push_str(&format!(" > {title}"));
    }
    text.push_str("]\n");
    text.push_str(&chunk.content);
    text
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn scored(content: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk_id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            source_name: "who_anc.md".into(),
            section_title: None,
            content: content.into(),
            score,
        }
    }

    #[test]
    fn empty_context_produces_empty_text() {
        let assembled = assemble_context(&[]);
        assert!(assembled.text.is_empty());
        assert_eq!(assembled.estimated_tokens, 0);
        assert!(assembled.chunks_included.is_empty());
    }

    #[test]
    fn chunks_sorted_by_score() {
        let assembled = assemble_context(&[
            scored("Low relevance content that is long enough.", 0.3),
            scored("High relevance content that is long enough.", 0.9),
        ]);
        let high_pos = assembled.text.find("High relevance").unwrap();
        let low_pos = assembled.text.find("Low relevance").unwrap();
        assert!(high_pos < low_pos);
        assert_eq!(assembled.chunks_included[0].score, 0.9);
    }

    #[test]
    fn source_header_names_file_and_section() {
        let mut chunk = scored("Screen at 24 to 28 weeks.", 0.7);
        chunk.section_title = Some("Gestational Diabetes".into());
        let assembled = assemble_context(&[chunk]);
        assert!(assembled
            .text
            .starts_with("[Source: who_anc.md > Gestational Diabetes]\n"));
    }

    #[test]
    fn context_respects_token_budget() {
        let chunks: Vec<ScoredChunk> = (0..100).map(|_| scored(&"A ".repeat(500), 0.8)).collect();
        let assembled = assemble_context(&chunks);
        assert!(
            assembled.text.len() <= MAX_CONTEXT_CHARS + 200,
            "Context too large: {} chars",
            assembled.text.len()
        );
        assert!(assembled.chunks_included.len() < 100);
        assert!(!assembled.chunks_included.is_empty());
    }

    #[test]
    fn oversized_chunk_skipped_but_smaller_kept() {
        let assembled = assemble_context(&[
            scored(&"x".repeat(MAX_CONTEXT_CHARS + 1), 0.9),
            scored("Small passage that fits.", 0.5),
        ]);
        assert_eq!(assembled.chunks_included.len(), 1);
        assert!(assembled.text.contains("Small passage"));
    }
}
