//! Pipeline stages, tracked per request for correlation logging.

use std::fmt;
use std::time::Instant;

use tracing::debug;

/// `Idle → Preprocessing → [JobParsing] → Prompting → AwaitingCompletion →
/// Validating → [JobFit] → Persisting → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Preprocessing,
    JobParsing,
    Prompting,
    AwaitingCompletion,
    Validating,
    JobFit,
    Persisting,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Preprocessing => "preprocessing",
            PipelineStage::JobParsing => "job_parsing",
            PipelineStage::Prompting => "prompting",
            PipelineStage::AwaitingCompletion => "awaiting_completion",
            PipelineStage::Validating => "validating",
            PipelineStage::JobFit => "job_fit",
            PipelineStage::Persisting => "persisting",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Current stage plus the wall clock since the request started.
#[derive(Debug)]
pub struct StageTracker {
    stage: PipelineStage,
    started: Instant,
    visited: Vec<PipelineStage>,
}

impl StageTracker {
    pub fn start() -> Self {
        Self {
            stage: PipelineStage::Idle,
            started: Instant::now(),
            visited: vec![PipelineStage::Idle],
        }
    }

    pub fn enter(&mut self, stage: PipelineStage) {
        debug!(
            "Pipeline stage {} -> {} at {}ms",
            self.stage,
            stage,
            self.elapsed_ms()
        );
        self.stage = stage;
        self.visited.push(stage);
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn visited(&self) -> &[PipelineStage] {
        &self.visited
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_records_transitions_in_order() {
        let mut tracker = StageTracker::start();
        tracker.enter(PipelineStage::Preprocessing);
        tracker.enter(PipelineStage::Prompting);

        assert_eq!(tracker.stage(), PipelineStage::Prompting);
        assert_eq!(
            tracker.visited(),
            &[
                PipelineStage::Idle,
                PipelineStage::Preprocessing,
                PipelineStage::Prompting
            ]
        );
    }

    #[test]
    fn test_stage_display_is_snake_case() {
        assert_eq!(
            PipelineStage::AwaitingCompletion.to_string(),
            "awaiting_completion"
        );
        assert_eq!(PipelineStage::JobParsing.to_string(), "job_parsing");
    }
}
