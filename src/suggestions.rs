//! # Error Suggestions
//!
//! Helpers for error messages that say what went wrong AND how to fix it.
//!
//! ```rust,ignore
//! use build_tools::suggestions;
//!
//! return Err(suggestions::unknown_tool("plugn", &["plugin", "app"]));
//! // Unknown tool: plugn
//! // hint: Did you mean 'plugin'?
//! ```

use std::path::Path;

/// Error for a tool name that is not registered.
///
/// Lists the registered tools and suggests the closest one.
pub fn unknown_tool(tool: &str, valid_tools: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(tool, valid_tools)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unknown tool: {tool}{did_you_mean}\n\n\
         Valid tools are: {tools}\n\
         hint: Run with --list-tools to see each tool's descriptor extension",
        tools = valid_tools.join(", ")
    )
}

/// Error for a descriptor path that does not exist.
pub fn descriptor_not_found(path: &Path, extension: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Descriptor not found: {path}\n\n\
         hint: Pass a descriptor file (*.{extension}) or a directory to scan\n\
         hint: Relative paths are resolved from the current directory",
        path = path.display()
    )
}

/// Trailing hint for an unknown token, or an empty string when nothing is
/// close enough.
pub fn did_you_mean(input: &str, candidates: &[&str]) -> String {
    find_similar(input, candidates)
        .map(|s| format!(" (did you mean '{s}'?)"))
        .unwrap_or_default()
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Comparison ignores ASCII case. Returns Some(candidate) if a close match is
/// found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let input = input.to_ascii_lowercase();
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(&input, &candidate.to_ascii_lowercase());
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0usize; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}
