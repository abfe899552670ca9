/// Fence marker delimiting code regions in completion text.
const FENCE: &str = "```";

/// Derives the spoken portion of a completion: every paired fenced code
/// region is removed (non-greedy, spans newlines), the surrounding
/// segments are joined with a single space, and the result is trimmed.
///
/// An unpaired trailing fence has no closing partner and is left in
/// place. May return an empty string when the completion is nothing but
/// code.
pub fn spoken_text(text: &str) -> String {
    let mut out = String::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        let after_open = &rest[open + FENCE.len()..];
        match after_open.find(FENCE) {
            Some(close) => {
                out.push_str(&rest[..open]);
                out.push(' ');
                rest = &after_open[close + FENCE.len()..];
            }
            None => break,
        }
    }

    out.push_str(rest);
    out.trim().to_string()
}
