// All LLM prompt constants for the analysis pipeline.
// Reuses cross-cutting fragments from llm_client::prompts.
// Templates use `{placeholder}` markers filled by `render` before sending.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("valid regex"));

/// Fills `{placeholder}` markers in one pass over the template. Substituted
/// values are never rescanned; unknown markers are left as they are.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            values
                .iter()
                .find(|(key, _)| *key == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// System prompt for chunk summarization.
pub const SUMMARIZE_SYSTEM: &str = "You are a careful resume condenser. \
    Shorten the text you are given without losing facts. \
    Respond with the condensed text only.";

/// Chunk summarization prompt. Replace `{chunk_index}`, `{chunk_count}`, `{chunk}`.
pub const SUMMARIZE_PROMPT_TEMPLATE: &str = r#"Condense part {chunk_index} of {chunk_count} of a resume.

RULES:
1. Preserve every date, number, percentage, currency amount, and metric VERBATIM
2. Preserve every technical term, tool, language, framework, certification, and employer name VERBATIM
3. Drop filler, repetition, and decorative wording
4. Do NOT add commentary, headings, or information that is not in the text
5. The text may start or end mid-sentence; condense what is there

RESUME PART:
{chunk}"#;

/// System prompt for job posting extraction: enforces JSON-only output.
pub const JOB_PARSE_SYSTEM: &str = "You are an expert job description analyst. \
    Extract structured information from a job posting. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Job posting extraction prompt. Replace `{job_text}` before sending.
pub const JOB_PARSE_PROMPT_TEMPLATE: &str = r#"Extract structured information from the following job posting.

Return a JSON object with this EXACT schema (no extra fields). Use null for anything the posting does not state:
{
  "role_title": "Senior Marketing Manager",
  "years_of_experience": 5,
  "industry": "E-commerce",
  "company": "Acme Corp",
  "primary_keywords": ["SEO", "demand generation"],
  "summary": "One or two sentences describing the role.",
  "requirements": ["5+ years in B2B marketing", "Experience owning a paid budget"],
  "skills": ["SEO", "Google Analytics", "HubSpot"]
}

Rules:
- "years_of_experience" is a number (the minimum stated), or null
- "requirements" keeps the order of the posting; one requirement per entry
- "skills" and "primary_keywords" contain no duplicates
- Copy skill and tool names exactly as written in the posting

JOB POSTING:
{job_text}"#;

/// System prompt for resume scoring: enforces JSON-only output.
pub const SCORING_SYSTEM: &str = "You are an expert resume reviewer and career coach. \
    Score resumes against a fixed rubric and give specific, actionable feedback. \
    You MUST respond with valid JSON only — a single JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Resume scoring prompt. Replace `{evidence_instruction}`, `{resume_text}`, `{job_context}`.
/// `{job_context}` is empty when no job description was parsed.
pub const SCORING_PROMPT_TEMPLATE: &str = r#"{evidence_instruction}

Evaluate the resume below against this rubric. Score every criterion from 1 to 10; "max_score" is always 10.

RUBRIC:
1. keyword_relevance (weight 30%): industry and role keywords an applicant tracking system would look for
2. achievements_metrics (weight 25%): quantified outcomes — numbers, percentages, money, time saved
3. structure_readability (weight 20%): clear sections, consistent formatting, scannable bullets
4. summary_clarity (weight 15%): a professional summary that states who the candidate is and what they offer
5. overall_polish (weight 10%): grammar, tone, consistency, concision

"overall_score" is 0 to 100 and should reflect the weighted rubric.

Return a JSON object with this EXACT schema:
{
  "overall_score": 72,
  "criteria": {
    "keyword_relevance": {"score": 7, "max_score": 10, "feedback": "At least 20 characters of specific feedback.", "evidence": ["keyword found in resume"]},
    "achievements_metrics": {"score": 8, "max_score": 10, "feedback": "...", "evidence": ["quoted achievement"]},
    "structure_readability": {"score": 6, "max_score": 10, "feedback": "...", "evidence": ["observation"]},
    "summary_clarity": {"score": 6, "max_score": 10, "feedback": "...", "evidence": ["observation"]},
    "overall_polish": {"score": 7, "max_score": 10, "feedback": "...", "evidence": ["observation"]}
  },
  "sections": {
    "professional_summary": "Feedback on the summary section.",
    "work_experience": "Feedback on the experience section.",
    "technical_skills": "Feedback on the skills section.",
    "education": "Feedback on the education section.",
    "key_achievements": "Feedback on achievements."
  },
  "identified_skills": ["at least 3 distinct skills found in the resume"],
  "important_keywords": ["at least 3 distinct keywords the resume should feature"],
  "suggested_improvements": ["at least 3 concrete, prioritized improvements"],
  "general_feedback": "At least 50 characters of overall assessment."
}

HARD RULES:
1. Every criterion has at least one evidence entry
2. Section feedback is at least 10 characters, even when a section is missing (say so)
3. Do NOT change the shape of the object, even when job context is provided

RESUME:
{resume_text}
{job_context}"#;

/// Heading that opens the job block in a scoring prompt.
pub const JOB_CONTEXT_HEADING: &str = "TARGET JOB CONTEXT";

/// Appended to the scoring prompt when a job description was parsed.
/// Replace `{role}`, `{experience}`, `{skills}`, `{requirements}`.
pub const JOB_CONTEXT_TEMPLATE: &str = r#"
TARGET JOB CONTEXT (weigh keyword relevance and improvements toward this role; the output shape stays the same):
- Role: {role}
- Required experience: {experience}
- Required skills: {skills}
- Key requirements:
{requirements}"#;

/// System prompt for the narrative job-fit analysis.
pub const JOB_FIT_SYSTEM: &str = "You are a senior recruiter writing candid, detailed \
    job-fit assessments for candidates. Write in plain prose with short headed sections.";

/// Job-fit prompt. Replace `{evidence_instruction}`, `{resume_text}`, `{job_json}`.
pub const JOB_FIT_PROMPT_TEMPLATE: &str = r#"{evidence_instruction}

Compare the resume with the structured job description and write a job-fit assessment of AT LEAST 500 words.

Cover, in this order:
1. Skill gaps: required skills the resume does not demonstrate
2. Experience alignment: how the candidate's years and scope compare to the requirement
3. Keyword overlap: which of the job's keywords already appear and which are missing
4. Action items: a prioritized list of concrete edits, most impactful first

JOB DESCRIPTION:
{job_json}

RESUME:
{resume_text}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_does_not_rescan_substituted_values() {
        let rendered = render(
            "{skills} / {resume_text}",
            &[("skills", "SEO {resume_text}"), ("resume_text", "RESUME")],
        );
        assert_eq!(rendered, "SEO {resume_text} / RESUME");
    }

    #[test]
    fn test_render_keeps_json_braces_and_unknown_markers() {
        let rendered = render(r#"{"score": 1} {missing} {chunk}"#, &[("chunk", "text")]);
        assert_eq!(rendered, r#"{"score": 1} {missing} text"#);
    }

    #[test]
    fn test_job_context_template_opens_with_heading() {
        assert!(JOB_CONTEXT_TEMPLATE.trim_start().starts_with(JOB_CONTEXT_HEADING));
    }
}
