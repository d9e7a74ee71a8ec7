// Shared prompt fragments.
// Each collaborator that calls the model keeps its own prompts.rs alongside it.

/// Appended to prompts whose answer is shown to the user verbatim.
pub const NO_PREAMBLE_INSTRUCTION: &str = "\
    Return ONLY the requested text. Do NOT add a preamble such as \"Here is the email\", \
    do NOT wrap it in quotes or code fences, and do NOT add notes after it.";
