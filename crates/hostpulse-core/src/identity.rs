//! Process identity normalization.
//!
//! Collapses the many raw records of one application (browser workers,
//! interpreter instances) into a single display name so their memory can be
//! summed together.

use std::path::Path;

/// Identity used when neither an executable path nor a process name is known.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Non-semantic suffixes removed from executable names (`firefox-esr`).
const STRIPPED_SUFFIXES: &[&str] = &["-esr"];

/// Lowercase technical name to display name. Exact matches only.
pub const FRIENDLY_NAMES: &[(&str, &str)] = &[
    ("code", "vscode"),
    ("chrome", "chrome"),
    ("chromium", "chrome"),
    ("java", "java"),
    ("python", "python"),
    ("python3", "python"),
    ("node", "nodejs"),
    ("docker", "docker"),
    ("slack", "slack"),
    ("teams", "teams"),
    ("zoom", "zoom"),
];

/// Look up a friendly label for `name`, ignoring ASCII case.
pub fn friendly_name(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    FRIENDLY_NAMES
        .iter()
        .find(|(raw, _)| *raw == lower)
        .map(|(_, label)| *label)
}

/// Remove the first matching non-semantic suffix, if any.
fn strip_suffix(name: &str) -> &str {
    for suffix in STRIPPED_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix) {
            if !stripped.is_empty() {
                return stripped;
            }
        }
    }
    name
}

/// Base filename of an executable path, if it has a usable one.
fn exe_base_name(exe: &Path) -> Option<&str> {
    exe.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
}

/// Derive the normalized identity for a process.
///
/// Prefers the executable's base filename, then the raw process name, then
/// [`UNKNOWN_IDENTITY`]. The result has known suffixes stripped and is passed
/// through [`FRIENDLY_NAMES`]; unmapped names keep their original case.
pub fn normalize_identity(name: &str, exe: Option<&Path>) -> String {
    let base = exe
        .and_then(exe_base_name)
        .or_else(|| Some(name.trim()).filter(|n| !n.is_empty()))
        .unwrap_or(UNKNOWN_IDENTITY);

    let base = strip_suffix(base);
    match friendly_name(base) {
        Some(label) => label.to_string(),
        None => base.to_string(),
    }
}
