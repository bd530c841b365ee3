// Cross-cutting system prompt fragments.
// Task-specific prompts live next to the code that uses them.

/// System prompt that pins the model to a bare numeric reply.
pub const NUMERIC_ONLY_SYSTEM: &str = "You are a precise evaluation assistant. \
    You MUST respond with a single integer only. \
    Do NOT include words, units, punctuation, or explanations.";
