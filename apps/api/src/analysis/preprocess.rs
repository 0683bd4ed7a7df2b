//! Text Preprocessor: shrinks oversized resumes through chunked summarization.
//!
//! Text at or under the threshold passes through untouched. Longer text is cut
//! into fixed-size character chunks, every chunk is summarized concurrently,
//! and the summaries are rejoined in chunk order.
//!
//! Failure policy: best effort. If any chunk fails, the step returns the
//! original text instead of a partially summarized one.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::analysis::prompts::{render, SUMMARIZE_PROMPT_TEMPLATE, SUMMARIZE_SYSTEM};
use crate::llm_client::{CompletionRequest, CompletionService};

/// Summaries are joined as paragraphs.
pub const CHUNK_SEPARATOR: &str = "\n\n";
const SUMMARY_MAX_TOKENS: u32 = 1024;

/// Result of summarizing one chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkOutcome {
    Summarized(String),
    Failed,
}

pub struct Preprocessor {
    llm: Arc<dyn CompletionService>,
    threshold_chars: usize,
    chunk_chars: usize,
}

impl Preprocessor {
    pub fn new(llm: Arc<dyn CompletionService>, threshold_chars: usize, chunk_chars: usize) -> Self {
        Self {
            llm,
            threshold_chars,
            chunk_chars: chunk_chars.max(1),
        }
    }

    pub fn needs_summarization(&self, text: &str) -> bool {
        text.chars().count() > self.threshold_chars
    }

    /// Returns `text` unchanged when under the threshold, otherwise the joined
    /// chunk summaries (or `text` again if summarization degraded).
    pub async fn preprocess(&self, text: &str) -> String {
        if !self.needs_summarization(text) {
            return text.to_string();
        }

        let chunks = split_into_chunks(text, self.chunk_chars);
        info!(
            "Resume content is {} chars (threshold {}), summarizing {} chunks",
            text.chars().count(),
            self.threshold_chars,
            chunks.len()
        );

        let outcomes = self.summarize_chunks(chunks).await;
        merge_chunk_outcomes(text, outcomes)
    }

    /// Summarizes all chunks concurrently and returns outcomes in chunk order.
    async fn summarize_chunks(&self, chunks: Vec<String>) -> Vec<ChunkOutcome> {
        let chunk_count = chunks.len();
        let mut tasks = JoinSet::new();

        for (index, chunk) in chunks.into_iter().enumerate() {
            let llm = Arc::clone(&self.llm);
            let request = CompletionRequest::text(
                SUMMARIZE_SYSTEM,
                build_summary_prompt(index, chunk_count, &chunk),
            )
            .with_max_tokens(SUMMARY_MAX_TOKENS);

            tasks.spawn(async move {
                let outcome = match llm.complete(request).await {
                    Ok(summary) if !summary.trim().is_empty() => {
                        ChunkOutcome::Summarized(summary.trim().to_string())
                    }
                    Ok(_) => {
                        warn!("Chunk {} returned an empty summary", index + 1);
                        ChunkOutcome::Failed
                    }
                    Err(e) => {
                        warn!("Chunk {} summarization failed: {e}", index + 1);
                        ChunkOutcome::Failed
                    }
                };
                (index, outcome)
            });
        }

        // Slots start as Failed so a panicked task counts as a failure.
        let mut outcomes = vec![ChunkOutcome::Failed; chunk_count];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = outcome,
                Err(e) => warn!("Chunk summarization task did not complete: {e}"),
            }
        }
        outcomes
    }
}

/// Splits on character (not byte) boundaries into pieces of at most `chunk_chars`.
pub fn split_into_chunks(text: &str, chunk_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_chars.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Joins summaries in order. Any `Failed` outcome, or a join that did not
/// actually shrink the text, yields the original text.
pub fn merge_chunk_outcomes(original: &str, outcomes: Vec<ChunkOutcome>) -> String {
    let mut summaries = Vec::with_capacity(outcomes.len());
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            ChunkOutcome::Summarized(summary) => summaries.push(summary),
            ChunkOutcome::Failed => {
                warn!(
                    "Chunk {} failed; passing resume content through unsummarized",
                    index + 1
                );
                return original.to_string();
            }
        }
    }

    let joined = summaries.join(CHUNK_SEPARATOR);
    if joined.chars().count() >= original.chars().count() {
        warn!("Chunk summaries were not shorter than the original; passing it through");
        return original.to_string();
    }
    joined
}

fn build_summary_prompt(index: usize, chunk_count: usize, chunk: &str) -> String {
    let chunk_index = (index + 1).to_string();
    let chunk_count = chunk_count.to_string();
    render(
        SUMMARIZE_PROMPT_TEMPLATE,
        &[
            ("chunk_index", chunk_index.as_str()),
            ("chunk_count", chunk_count.as_str()),
            ("chunk", chunk),
        ],
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::llm_client::LlmError;
    use crate::testing::ScriptedCompletion;

    /// Summarizes a chunk to `summary-<first char>`, finishing later chunks first.
    struct ReverseOrderSummarizer {
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
        calls: AtomicUsize,
        fail_on: Option<char>,
    }

    impl ReverseOrderSummarizer {
        fn new(fail_on: Option<char>) -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl CompletionService for ReverseOrderSummarizer {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

            let chunk = request
                .prompt
                .split("RESUME PART:\n")
                .nth(1)
                .expect("prompt carries the chunk");
            let marker = chunk.chars().next().expect("chunk is not empty");
            let rank = (b'z' - marker as u8) as u64;
            tokio::time::sleep(Duration::from_millis(10 * (rank + 1))).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if Some(marker) == self.fail_on {
                return Err(LlmError::EmptyContent);
            }
            Ok(format!("summary-{marker}"))
        }
    }

    /// `count` chunks of `size` chars, chunk i filled with the letter 'a' + i.
    fn lettered_text(count: usize, size: usize) -> String {
        (0..count)
            .map(|i| ((b'a' + i as u8) as char).to_string().repeat(size))
            .collect()
    }

    #[tokio::test]
    async fn test_under_threshold_is_identity_without_calls() {
        let llm = Arc::new(ScriptedCompletion::always("should not be used"));
        let preprocessor = Preprocessor::new(llm.clone(), 100, 40);

        let text = "Marketing manager, 5 years, increased revenue 40%";
        assert_eq!(preprocessor.preprocess(text).await, text);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_exactly_at_threshold_is_identity() {
        let llm = Arc::new(ScriptedCompletion::always("short"));
        let preprocessor = Preprocessor::new(llm.clone(), 10, 4);

        let text = "0123456789";
        assert_eq!(preprocessor.preprocess(text).await, text);
        assert_eq!(llm.call_count(), 0);
    }

    #[test]
    fn test_split_respects_char_boundaries() {
        let chunks = split_into_chunks("ééééé", 2);
        assert_eq!(chunks, vec!["éé", "éé", "é"]);
    }

    #[test]
    fn test_split_reassembles_to_original() {
        let text = lettered_text(3, 7);
        assert_eq!(split_into_chunks(&text, 5).concat(), text);
    }

    #[tokio::test(start_paused = true)]
    async fn test_summaries_rejoin_in_chunk_order() {
        let llm = Arc::new(ReverseOrderSummarizer::new(None));
        let preprocessor = Preprocessor::new(llm.clone(), 50, 100);

        let text = lettered_text(4, 100);
        let result = preprocessor.preprocess(&text).await;

        assert_eq!(
            result,
            "summary-a\n\nsummary-b\n\nsummary-c\n\nsummary-d"
        );
        assert_eq!(llm.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failed_chunk_degrades_to_original() {
        let llm = Arc::new(ReverseOrderSummarizer::new(Some('b')));
        let preprocessor = Preprocessor::new(llm.clone(), 50, 100);

        let text = lettered_text(3, 100);
        assert_eq!(preprocessor.preprocess(&text).await, text);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifty_thousand_chars_summarize_concurrently_and_shrink() {
        let llm = Arc::new(ReverseOrderSummarizer::new(None));
        let preprocessor = Preprocessor::new(llm.clone(), 12_000, 6_000);

        let text = lettered_text(9, 6_000);
        let text = &text[..50_000];
        let result = preprocessor.preprocess(text).await;

        assert_eq!(llm.calls.load(Ordering::SeqCst), 9);
        assert!(llm.peak_in_flight.load(Ordering::SeqCst) > 1);
        assert!(result.chars().count() < text.chars().count());
        assert!(result.starts_with("summary-a"));
        assert!(result.ends_with("summary-i"));
    }

    #[tokio::test]
    async fn test_blank_summary_counts_as_failure() {
        let llm = Arc::new(ScriptedCompletion::always("   "));
        let preprocessor = Preprocessor::new(llm, 10, 10);

        let text = "x".repeat(30);
        assert_eq!(preprocessor.preprocess(&text).await, text);
    }

    #[test]
    fn test_merge_rejects_summaries_that_do_not_shrink() {
        let outcomes = vec![
            ChunkOutcome::Summarized("a much longer summary".to_string()),
            ChunkOutcome::Summarized("than the text".to_string()),
        ];
        assert_eq!(merge_chunk_outcomes("tiny", outcomes), "tiny");
    }

    #[test]
    fn test_merge_joins_with_paragraph_separator() {
        let original = "x".repeat(200);
        let outcomes = vec![
            ChunkOutcome::Summarized("first".to_string()),
            ChunkOutcome::Summarized("second".to_string()),
        ];
        assert_eq!(merge_chunk_outcomes(&original, outcomes), "first\n\nsecond");
    }

    #[test]
    fn test_summary_prompt_numbers_chunks_from_one() {
        let prompt = build_summary_prompt(0, 3, "chunk body");
        assert!(prompt.contains("part 1 of 3"));
        assert!(prompt.ends_with("chunk body"));
    }
}
