// Shared prompt fragments.
// Each pipeline stage defines its own prompts in analysis/prompts.rs.
// This file contains cross-cutting fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every prompt that reads resume content.
pub const EVIDENCE_INSTRUCTION: &str = "\
    CRITICAL: Base every statement on the resume content provided. \
    Do NOT invent employers, dates, metrics, or skills that the text does not contain. \
    Quote the candidate's own wording when citing evidence.";
