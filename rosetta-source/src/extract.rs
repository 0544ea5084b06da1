use regex::Regex;
use std::sync::LazyLock;

/// Prefix shared by every canonical task URL.
pub const TASK_URL_PREFIX: &str = "http://rosettacode.org/wiki/";

// A `//` comment, anything, then the URL up to the next whitespace.
static TASK_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"//.*?(http://rosettacode\.org/wiki/\S+)")
        .expect("Failed to parse task URL pattern - this is a bug")
});

/// Return the first Rosetta Code task URL mentioned in a `//` comment.
///
/// Lines are scanned top to bottom and the scan stops at the first match. The
/// capture is returned verbatim: trailing punctuation is kept, trailing
/// whitespace never is.
///
/// ```
/// use rosetta_source::extract_url;
///
/// let src = "// Implements http://rosettacode.org/wiki/100_doors\nfn main() {}\n";
/// assert_eq!(extract_url(src).as_deref(), Some("http://rosettacode.org/wiki/100_doors"));
/// assert_eq!(extract_url("fn main() {}"), None);
/// ```
pub fn extract_url(source: &str) -> Option<String> {
    source
        .lines()
        .find_map(|line| TASK_URL.captures(line).map(|caps| caps[1].to_string()))
}
