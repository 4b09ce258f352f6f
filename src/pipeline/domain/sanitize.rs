//! Cleanup of tool output before parsing.

/// Warning prefix kubeadm writes ahead of its JSON output.
pub const DEFAULT_WARNING_PREFIX: &str = "W0508";

/// Drops every line up to and including the last line starting with
/// `prefix`. Output without such a line is returned unchanged.
#[must_use]
pub fn strip_warning_lines<'a>(output: &'a str, prefix: &str) -> &'a str {
    let mut rest = output;
    let mut cut = None;
    let mut offset = 0;
    while !rest.is_empty() {
        let line_len = rest.find('\n').map_or(rest.len(), |newline| newline + 1);
        let (line, tail) = rest.split_at(line_len);
        offset += line_len;
        if line.starts_with(prefix) {
            cut = Some(offset);
        }
        rest = tail;
    }
    cut.and_then(|start| output.get(start..)).unwrap_or(output)
}
