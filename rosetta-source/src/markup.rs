/// The code as it appears inside the `<lang>` block: leading `//!` lines and
/// blank lines dropped, trailing whitespace trimmed.
pub fn code_block(code: &str) -> String {
    let body: Vec<&str> = code
        .lines()
        .skip_while(|line| {
            let t = line.trim();
            t.is_empty() || t.starts_with("//!")
        })
        .collect();
    body.join("\n").trim_end().to_string()
}

/// Render one language section of a task page.
///
/// ```
/// use rosetta_source::render_entry;
///
/// let markup = render_entry("Rust", &["Prints a greeting.".to_string()], "fn main() {}\n");
/// assert_eq!(
///     markup,
///     "=={{header|Rust}}==\nPrints a greeting.\n<lang rust>\nfn main() {}\n</lang>\n"
/// );
/// ```
pub fn render_entry(language: &str, docs: &[String], code: &str) -> String {
    let mut out = format!("=={{{{header|{language}}}}}==\n");
    let prose = docs.join("\n");
    let prose = prose.trim();
    if !prose.is_empty() {
        out.push_str(prose);
        out.push('\n');
    }
    out.push_str(&format!("<lang {}>\n", language.to_lowercase()));
    out.push_str(&code_block(code));
    out.push_str("\n</lang>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOORS: &str = "\
//! Implements http://rosettacode.org/wiki/100_doors
//!
//! Toggle every door on each pass.

// Plain comments stay.
fn main() {
    println!(\"doors\");
}

";

    #[test]
    fn strips_module_doc_header() {
        assert_eq!(
            code_block(DOORS),
            "// Plain comments stay.\nfn main() {\n    println!(\"doors\");\n}"
        );
    }

    #[test]
    fn only_the_leading_header_is_stripped() {
        let code = "//! Header.\nfn a() -> &'static str {\n    \"//! kept inside a string\"\n}\n";
        assert_eq!(
            code_block(code),
            "fn a() -> &'static str {\n    \"//! kept inside a string\"\n}"
        );
    }

    #[test]
    fn renders_docs_then_code() {
        let docs = vec![
            "Implements http://rosettacode.org/wiki/100_doors".to_string(),
            "Toggle every door on each pass.".to_string(),
        ];
        let markup = render_entry("Rust", &docs, DOORS);
        assert!(markup.starts_with("=={{header|Rust}}==\nImplements"));
        assert!(markup.contains("on each pass.\n<lang rust>\n// Plain comments stay."));
        assert!(markup.ends_with("}\n</lang>\n"));
    }

    #[test]
    fn blank_docs_are_omitted() {
        let markup = render_entry("Rust", &["  ".to_string()], "fn main() {}");
        assert_eq!(markup, "=={{header|Rust}}==\n<lang rust>\nfn main() {}\n</lang>\n");
    }
}
