// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Appended to prompts whose output is shown to job applicants verbatim.
pub const UNCERTAINTY_INSTRUCTION: &str =
    "誤りや不確実な点は断定せずに注意書きを入れてください。";

/// Keeps agent output short enough to be read in one sitting.
pub const CONCISE_INSTRUCTION: &str = "Keep it concise and practical.";

/// Fills `{name}` placeholders in one pass over `template`.
///
/// Substituted text is never rescanned, so braces inside user input stay as
/// written. Placeholders with no entry in `values` are left untouched.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let filled = tail.find('}').and_then(|close| {
            let name = &tail[1..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close + 1))
        });
        match filled {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
