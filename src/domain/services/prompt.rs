use crate::domain::SearchResult;

/// Chunks extracted below this confidence get an OCR note in the prompt context.
pub const LOW_OCR_CONFIDENCE_NOTE_THRESHOLD: f32 = 0.9;

pub const SYSTEM_PROMPT: &str = "\
You are an expert assistant for historical documents and manuscripts held in libraries and archives.

STRICT RULES:
1. Answer ONLY with information from the context fragments provided.
2. If the answer is NOT in the fragments, reply exactly: \"The answer does not appear in the provided documents.\"
3. ALWAYS cite sources after each statement using the format: [Source: {title} — p. {page}]
4. Be concise and scholarly (at most 250 words).
5. If sources contradict each other, say so explicitly.
6. Do NOT invent, speculate, or add outside knowledge.

ANSWER FORMAT:
- A direct answer to the question
- Citations inline where they apply
- A closing \"Sources consulted:\" section listing the cited documents";

/// Renders the numbered context block, one entry per retrieved chunk.
pub fn build_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let chunk = result.chunk();
            let confidence_note = match chunk.ocr_confidence() {
                Some(c) if c < LOW_OCR_CONFIDENCE_NOTE_THRESHOLD => {
                    format!(" [OCR: {:.1}%]", c * 100.0)
                }
                _ => String::new(),
            };
            format!(
                "[{}] '{}'\n    Source: {} — p. {}{}\n",
                i + 1,
                chunk.chunk_text(),
                chunk.display_title(),
                chunk.page_number(),
                confidence_note
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_user_prompt(query: &str, results: &[SearchResult]) -> String {
    format!(
        "User question: {query}\n\nDocument context:\n\n{context}\n\n\
         Instructions: answer in at most 250 words. Cite ALL sources using the format \
         [Source: title — p. page]. If there is not enough information, reply \
         \"The answer does not appear in the provided documents.\"\n",
        query = query,
        context = build_context(results)
    )
}

/// Returns `(system, user)` prompts for a grounded answer.
pub fn build_prompt(query: &str, results: &[SearchResult]) -> (&'static str, String) {
    (SYSTEM_PROMPT, build_user_prompt(query, results))
}
