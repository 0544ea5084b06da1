//! Module documentation pulled from `rustdoc`'s JSON output.
//!
//! `rustdoc` runs as an external process writing into a scratch directory.
//! Two JSON layouts are understood: the current one, where the crate root
//! item carries a `docs` string, and the older attribute layout where each
//! `//!` line is a `doc` attribute on `module.attrs`.

use async_trait::async_trait;
use rosetta_common::{Result, RobotError};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Produces the module-level documentation of a source file.
#[async_trait]
pub trait DocGenerator: Send + Sync {
    async fn module_docs(&self, path: &Path) -> Result<Vec<String>>;
}

/// [`DocGenerator`] backed by a `rustdoc` binary.
#[derive(Debug, Clone)]
pub struct RustdocGenerator {
    program: String,
    args: Vec<String>,
}

impl Default for RustdocGenerator {
    fn default() -> Self {
        Self::new("rustdoc", vec!["-Z".into(), "unstable-options".into()])
    }
}

impl RustdocGenerator {
    /// `args` go before the output flags; JSON output still needs
    /// `-Z unstable-options` on current toolchains.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Run rustdoc on `path` and return the parsed JSON document.
    pub async fn generate_json(&self, path: &Path) -> Result<Value> {
        let out_dir = tempfile::TempDir::new()?;
        let crate_name = crate_name_for(path);

        tracing::debug!(
            program = %self.program,
            path = %path.display(),
            crate_name = %crate_name,
            "rustdoc.start"
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .args(["--output-format", "json", "--crate-name"])
            .arg(&crate_name)
            .arg("-o")
            .arg(out_dir.path())
            .arg(path)
            .output()
            .await
            .map_err(|e| RobotError::DocGen(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(status = %output.status, stderr = %stderr.trim(), "rustdoc.failed");
            return Err(RobotError::DocGen(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let json_path = find_json_output(out_dir.path(), &crate_name)?;
        let raw = std::fs::read_to_string(&json_path)?;
        serde_json::from_str(&raw).map_err(|e| {
            RobotError::DocGen(format!("invalid JSON in {}: {e}", json_path.display()))
        })
    }
}

#[async_trait]
impl DocGenerator for RustdocGenerator {
    async fn module_docs(&self, path: &Path) -> Result<Vec<String>> {
        let doc = self.generate_json(path).await?;
        Ok(extract_module_docs(&doc))
    }
}

/// Crate name rustdoc will accept for a task file such as `100_doors.rs`.
pub fn crate_name_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.is_empty() {
        name.push_str("entry");
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "rc_");
    }
    name
}

// rustdoc names the file after the crate, but fall back to any *.json.
fn find_json_output(dir: &Path, crate_name: &str) -> Result<PathBuf> {
    let expected = dir.join(format!("{crate_name}.json"));
    if expected.is_file() {
        return Ok(expected);
    }
    std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|p| p.extension().is_some_and(|ext| ext == "json"))
        .ok_or_else(|| RobotError::DocGen(format!("no JSON output in {}", dir.display())))
}

/// Module documentation of a rustdoc JSON document, empty when it has none.
///
/// ```
/// use rosetta_source::extract_module_docs;
/// use serde_json::json;
///
/// let doc = json!({ "root": 0, "index": { "0": { "docs": "Count the doors." } } });
/// assert_eq!(extract_module_docs(&doc), vec!["Count the doors."]);
/// ```
pub fn extract_module_docs(doc: &Value) -> Vec<String> {
    root_item_docs(doc)
        .or_else(|| legacy_module_docs(doc))
        .unwrap_or_default()
}

fn root_item_docs(doc: &Value) -> Option<Vec<String>> {
    let key = match doc.get("root")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let docs = doc.get("index")?.get(&key)?.get("docs")?.as_str()?;
    Some(vec![docs.to_string()])
}

fn legacy_module_docs(doc: &Value) -> Option<Vec<String>> {
    let attrs = find_module_attrs(doc)?.as_array()?;
    let docs = attrs
        .iter()
        .filter_map(|attr| {
            let fields = attr.get("fields")?.as_array()?;
            if fields.first()?.as_str()? != "doc" {
                return None;
            }
            fields.get(1)?.as_str().map(str::to_string)
        })
        .collect();
    Some(docs)
}

fn find_module_attrs(v: &Value) -> Option<&Value> {
    match v {
        Value::Object(map) => map
            .get("module")
            .and_then(|m| m.get("attrs"))
            .or_else(|| map.values().find_map(find_module_attrs)),
        Value::Array(items) => items.iter().find_map(find_module_attrs),
        _ => None,
    }
}
