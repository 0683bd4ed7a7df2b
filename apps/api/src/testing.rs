//! Test doubles and fixtures shared by module tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::analysis::models::ResumeReview;
use crate::analysis::prompts::{JOB_FIT_SYSTEM, JOB_PARSE_SYSTEM, SCORING_SYSTEM, SUMMARIZE_SYSTEM};
use crate::llm_client::{CompletionRequest, CompletionService, LlmError};

type Handler = dyn Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync;

/// A `CompletionService` driven by a closure. Records every request it receives.
pub struct ScriptedCompletion {
    handler: Box<Handler>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(
        handler: impl Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Requests whose system prompt matches `system`.
    pub fn calls_for(&self, system: &str) -> Vec<CompletionRequest> {
        self.calls()
            .into_iter()
            .filter(|r| r.system == system)
            .collect()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(request.clone());
        (self.handler)(&request)
    }
}

/// Canned responses per pipeline stage. `None` makes that stage's call fail
/// with `LlmError::EmptyContent`.
#[derive(Clone)]
pub struct StageScript {
    pub summary: Option<String>,
    pub job_parse: Option<String>,
    pub scoring: Option<String>,
    pub job_fit: Option<String>,
}

impl Default for StageScript {
    fn default() -> Self {
        Self {
            summary: Some("Summarized chunk.".to_string()),
            job_parse: Some(sample_job_json()),
            scoring: Some(sample_review_json()),
            job_fit: Some(sample_job_fit_narrative()),
        }
    }
}

impl StageScript {
    pub fn into_service(self) -> ScriptedCompletion {
        ScriptedCompletion::new(move |request| {
            let canned = if request.system == SUMMARIZE_SYSTEM {
                &self.summary
            } else if request.system == JOB_PARSE_SYSTEM {
                &self.job_parse
            } else if request.system == SCORING_SYSTEM {
                &self.scoring
            } else if request.system == JOB_FIT_SYSTEM {
                &self.job_fit
            } else {
                panic!("unexpected system prompt: {}", request.system)
            };
            canned.clone().ok_or(LlmError::EmptyContent)
        })
    }
}

pub const MARKETING_RESUME: &str = "Marketing manager, 5 years, increased revenue 40%";

pub const SEO_JOB_POSTING: &str = "<h2>Marketing Manager</h2><p>5+ years required, SEO skills</p>";

pub fn sample_review_value() -> serde_json::Value {
    json!({
        "overall_score": 72,
        "criteria": {
            "keyword_relevance": {
                "score": 7,
                "max_score": 10,
                "feedback": "Uses core marketing vocabulary but few channel-specific terms.",
                "evidence": ["marketing manager", "revenue"]
            },
            "achievements_metrics": {
                "score": 8,
                "max_score": 10,
                "feedback": "The 40% revenue increase is a strong, quantified outcome.",
                "evidence": ["increased revenue 40%"]
            },
            "structure_readability": {
                "score": 6,
                "max_score": 10,
                "feedback": "Content is a single line; sections and bullets are missing.",
                "evidence": ["single paragraph"]
            },
            "summary_clarity": {
                "score": 6,
                "max_score": 10,
                "feedback": "Role and tenure are clear but there is no positioning statement.",
                "evidence": ["Marketing manager, 5 years"]
            },
            "overall_polish": {
                "score": 7,
                "max_score": 10,
                "feedback": "Concise and error-free, though very sparse overall.",
                "evidence": ["no typos"]
            }
        },
        "sections": {
            "professional_summary": "Add a two-line summary naming your channels and market.",
            "work_experience": "List employers, dates, and two to four bullets per role.",
            "technical_skills": "Name the tools you use: SEO suites, analytics, CRM.",
            "education": "Add your degree and any marketing certifications.",
            "key_achievements": "The 40% revenue growth should headline this section."
        },
        "identified_skills": ["SEO", "Content Marketing", "Google Analytics", "Team Leadership"],
        "important_keywords": ["marketing", "revenue growth", "campaigns"],
        "suggested_improvements": [
            "Break experience into dated roles with bullets.",
            "Quantify campaign reach and budget.",
            "Add a skills section with named tools."
        ],
        "general_feedback": "A promising foundation with one strong metric; expand structure and detail to compete."
    })
}

pub fn sample_review_json() -> String {
    sample_review_value().to_string()
}

pub fn sample_review() -> ResumeReview {
    serde_json::from_value(sample_review_value()).unwrap()
}

pub fn sample_job_json() -> String {
    json!({
        "role_title": "Marketing Manager",
        "years_of_experience": 5,
        "industry": "Digital Marketing",
        "company": null,
        "primary_keywords": ["SEO", "marketing"],
        "summary": "Marketing manager role focused on organic growth.",
        "requirements": ["5+ years of marketing experience", "SEO skills"],
        "skills": ["SEO", "Content Strategy"]
    })
    .to_string()
}

pub fn sample_job_fit_narrative() -> String {
    "Skill gaps: the resume does not mention SEO tooling. Experience alignment: five years \
     matches the requirement. Keyword overlap: marketing, revenue. Action items: add SEO \
     results first, then campaign metrics."
        .to_string()
}
