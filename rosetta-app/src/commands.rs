use anyhow::{Context, Result};
use rosetta_http::HttpClient;
use rosetta_source::{CodeEntry, DocGenerator, RustdocGenerator, code_block, render_entry};
use rosetta_web::{EditOutcome, EditTarget, PageFetcher, RosettaSite, WikiSession};
use std::io::Write;
use std::path::Path;

/// How a local entry compares with its task page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    NoUrl,
    /// URL found, wiki not contacted.
    Unchecked { url: String },
    NoRemoteEntry { url: String },
    UpToDate { url: String },
    Differs { url: String },
}

impl EntryStatus {
    pub fn report_line(&self, file: &Path) -> String {
        let file = file.display();
        match self {
            Self::NoUrl => format!("{file}: no URL found"),
            Self::Unchecked { url } => format!("{file}: {url}"),
            Self::NoRemoteEntry { url } => format!("{file}: {url} (missing on page)"),
            Self::UpToDate { url } => format!("{file}: {url} (up to date)"),
            Self::Differs { url } => format!("{file}: {url} (differs)"),
        }
    }
}

/// Everything needed to replace one section.
#[derive(Debug, Clone)]
pub struct UploadPlan {
    pub url: String,
    pub target: EditTarget,
    pub markup: String,
    pub summary: String,
}

pub struct Robot<D = RustdocGenerator, F = HttpClient> {
    docs: D,
    site: RosettaSite<F>,
    language: String,
}

impl<D: DocGenerator, F: PageFetcher> Robot<D, F> {
    pub fn new(docs: D, site: RosettaSite<F>, language: impl Into<String>) -> Self {
        Self {
            docs,
            site,
            language: language.into(),
        }
    }

    pub async fn check(&self, path: &Path, offline: bool) -> Result<EntryStatus> {
        let entry = CodeEntry::load(path)?;
        let Some(url) = entry.extract_url() else {
            return Ok(EntryStatus::NoUrl);
        };
        if offline {
            return Ok(EntryStatus::Unchecked { url });
        }

        let remote = self
            .site
            .fetch_markup(&url)
            .await
            .with_context(|| format!("fetching {url}"))?;
        let status = match remote {
            None => EntryStatus::NoRemoteEntry { url },
            Some(markup) if markup.replace("\r\n", "\n").contains(&code_block(&entry.code)) => {
                EntryStatus::UpToDate { url }
            }
            Some(_) => EntryStatus::Differs { url },
        };
        tracing::debug!(target: "app.check", file = %path.display(), status = ?status, "check.status");
        Ok(status)
    }

    pub async fn markup(&self, path: &Path) -> Result<String> {
        let entry = CodeEntry::load(path)?;
        self.render(&entry).await
    }

    async fn render(&self, entry: &CodeEntry) -> Result<String> {
        let docs = self
            .docs
            .module_docs(&entry.path)
            .await
            .with_context(|| format!("documenting {}", entry.path.display()))?;
        Ok(render_entry(&self.language, &docs, &entry.code))
    }

    /// `Ok(None)` when the file names no task page.
    pub async fn plan_upload(&self, path: &Path) -> Result<Option<UploadPlan>> {
        let entry = CodeEntry::load(path)?;
        let Some(url) = entry.extract_url() else {
            return Ok(None);
        };

        let edit_url = self
            .site
            .edit_section_url(&url)
            .await
            .with_context(|| format!("fetching {url}"))?
            .with_context(|| format!("no {} section on {url}", self.language))?;
        let target = EditTarget::from_edit_url(&edit_url)
            .with_context(|| format!("edit link without title/section: {edit_url}"))?;
        let markup = self.render(&entry).await?;

        let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
        Ok(Some(UploadPlan {
            url,
            target,
            markup,
            summary: format!("Update {} entry from {name}", self.language),
        }))
    }
}

/// Report on every file; returns the number of files that failed.
pub async fn run_check<D: DocGenerator, F: PageFetcher>(
    robot: &Robot<D, F>,
    files: &[impl AsRef<Path>],
    offline: bool,
    out_file: Option<&Path>,
    out: &mut impl Write,
) -> Result<usize> {
    let mut report = Vec::with_capacity(files.len());
    let mut failures = 0;
    for file in files {
        let file = file.as_ref();
        let line = match robot.check(file, offline).await {
            Ok(status) => status.report_line(file),
            Err(e) => {
                failures += 1;
                let error = format!("{e:#}");
                tracing::error!(target: "app.check", file = %file.display(), error = %error, "check.failed");
                format!("{}: error: {error}", file.display())
            }
        };
        writeln!(out, "{line}")?;
        report.push(line);
    }

    if let Some(path) = out_file {
        report.push(String::new());
        std::fs::write(path, report.join("\n"))
            .with_context(|| format!("writing report to {}", path.display()))?;
    }
    Ok(failures)
}

pub async fn run_markup<D: DocGenerator, F: PageFetcher>(
    robot: &Robot<D, F>,
    files: &[impl AsRef<Path>],
    out: &mut impl Write,
) -> Result<usize> {
    let mut failures = 0;
    for file in files {
        let file = file.as_ref();
        match robot.markup(file).await {
            Ok(markup) => writeln!(out, "\n*** {}\n{markup}", file.display())?,
            Err(e) => {
                failures += 1;
                let error = format!("{e:#}");
                tracing::error!(target: "app.markup", file = %file.display(), error = %error, "markup.failed");
                eprintln!("{}: error: {error}", file.display());
            }
        }
    }
    Ok(failures)
}

/// Upload each file through `wiki`; with no session only print the plan.
pub async fn run_upload<D: DocGenerator, F: PageFetcher>(
    robot: &Robot<D, F>,
    wiki: Option<&WikiSession>,
    files: &[impl AsRef<Path>],
    out: &mut impl Write,
) -> Result<usize> {
    let mut failures = 0;
    for file in files {
        let file = file.as_ref();
        match upload_one(robot, wiki, file, out).await {
            Ok(()) => {}
            Err(e) => {
                failures += 1;
                let error = format!("{e:#}");
                tracing::error!(target: "app.upload", file = %file.display(), error = %error, "upload.failed");
                eprintln!("{}: error: {error}", file.display());
            }
        }
    }
    Ok(failures)
}

async fn upload_one<D: DocGenerator, F: PageFetcher>(
    robot: &Robot<D, F>,
    wiki: Option<&WikiSession>,
    file: &Path,
    out: &mut impl Write,
) -> Result<()> {
    let Some(plan) = robot.plan_upload(file).await? else {
        writeln!(out, "{}: no URL found, skipped", file.display())?;
        return Ok(());
    };
    let EditTarget { title, section } = &plan.target;

    let Some(wiki) = wiki else {
        writeln!(
            out,
            "{}: would edit {title} section {section}\n{}",
            file.display(),
            plan.markup
        )?;
        return Ok(());
    };

    let outcome = wiki
        .edit_section(&plan.target, &plan.markup, &plan.summary)
        .await
        .with_context(|| format!("editing {}", plan.url))?;
    match outcome {
        EditOutcome::Saved { revision: Some(rev) } => {
            writeln!(out, "{}: saved {title} section {section} (revision {rev})", file.display())?
        }
        EditOutcome::Saved { revision: None } => {
            writeln!(out, "{}: saved {title} section {section}", file.display())?
        }
        EditOutcome::Unchanged => {
            writeln!(out, "{}: {title} section {section} unchanged", file.display())?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rosetta_http::HttpError;
    use rosetta_web::MarkupLocator;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct FixedDocs(Vec<String>);

    #[async_trait]
    impl DocGenerator for FixedDocs {
        async fn module_docs(&self, _path: &Path) -> rosetta_common::Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct Pages(HashMap<String, String>);

    impl Pages {
        fn with(mut self, url: &str, html: &str) -> Self {
            self.0.insert(url.to_string(), html.to_string());
            self
        }
    }

    #[async_trait]
    impl PageFetcher for Pages {
        async fn fetch_html(&self, url: &str) -> std::result::Result<String, HttpError> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| HttpError::Network(format!("no page for {url}")))
        }
    }

    const TASK: &str = "http://rosettacode.org/wiki/100_doors";
    const EDIT: &str = "http://rosettacode.org/mw/index.php?title=100_doors&action=edit&section=190";
    const TASK_HTML: &str = r#"<h2><span class="editsection">[<a href="/mw/index.php?title=100_doors&amp;action=edit&amp;section=190">edit</a>]</span>
        <span class="mw-headline" id="Rust">Rust</span></h2>"#;
    const DOORS: &str = "//! Implements http://rosettacode.org/wiki/100_doors\n\nfn main() {\n    println!(\"open\");\n}\n";

    fn robot(pages: Pages) -> Robot<FixedDocs, Pages> {
        Robot::new(
            FixedDocs(vec!["Toggle every door.".into()]),
            RosettaSite::new(pages, MarkupLocator::default()),
            "Rust",
        )
    }

    fn write(dir: &TempDir, name: &str, code: &str) -> PathBuf {
        let p = dir.path().join(name);
        std::fs::write(&p, code).unwrap();
        p
    }

    fn edit_page(markup: &str) -> String {
        format!("<textarea>{markup}</textarea>")
    }

    #[tokio::test]
    async fn offline_check_only_reports_the_url() {
        let tmp = TempDir::new().unwrap();
        let src = write(&tmp, "100_doors.rs", DOORS);
        let status = robot(Pages::default()).check(&src, true).await.unwrap();
        assert_eq!(status, EntryStatus::Unchecked { url: TASK.into() });
        assert!(status.report_line(&src).ends_with(&format!(": {TASK}")));
    }

    #[tokio::test]
    async fn check_compares_with_remote_markup() {
        let tmp = TempDir::new().unwrap();
        let src = write(&tmp, "100_doors.rs", DOORS);

        let same = Pages::default().with(TASK, TASK_HTML).with(
            EDIT,
            &edit_page("=={{header|Rust}}==\n&lt;lang rust&gt;\r\nfn main() {\r\n    println!(\"open\");\r\n}\r\n&lt;/lang&gt;"),
        );
        assert_eq!(
            robot(same).check(&src, false).await.unwrap(),
            EntryStatus::UpToDate { url: TASK.into() }
        );

        let stale = Pages::default()
            .with(TASK, TASK_HTML)
            .with(EDIT, &edit_page("&lt;lang rust&gt;fn main() {}&lt;/lang&gt;"));
        assert_eq!(
            robot(stale).check(&src, false).await.unwrap(),
            EntryStatus::Differs { url: TASK.into() }
        );

        let missing = Pages::default().with(TASK, "<h2><span id=\"C\">C</span></h2>");
        assert_eq!(
            robot(missing).check(&src, false).await.unwrap(),
            EntryStatus::NoRemoteEntry { url: TASK.into() }
        );
    }

    #[tokio::test]
    async fn check_keeps_going_and_writes_the_report() {
        let tmp = TempDir::new().unwrap();
        let doors = write(&tmp, "100_doors.rs", DOORS);
        let bare = write(&tmp, "bare.rs", "fn main() {}\n");
        let absent = tmp.path().join("absent.rs");
        let report = tmp.path().join("rosetta-check.txt");

        let mut out = Vec::new();
        let failures = run_check(
            &robot(Pages::default()),
            &[&absent, &bare, &doors],
            true,
            Some(&report),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(failures, 1);
        let printed = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("absent.rs: error:"));
        assert!(lines[1].ends_with("bare.rs: no URL found"));
        assert!(lines[2].ends_with(&format!("100_doors.rs: {TASK}")));
        assert_eq!(std::fs::read_to_string(&report).unwrap(), printed);
    }

    #[tokio::test]
    async fn markup_prints_a_banner_per_file() {
        let tmp = TempDir::new().unwrap();
        let src = write(&tmp, "100_doors.rs", DOORS);

        let mut out = Vec::new();
        let failures = run_markup(&robot(Pages::default()), &[&src], &mut out)
            .await
            .unwrap();

        assert_eq!(failures, 0);
        let printed = String::from_utf8(out).unwrap();
        assert_eq!(
            printed,
            format!(
                "\n*** {}\n=={{{{header|Rust}}}}==\nToggle every door.\n<lang rust>\nfn main() {{\n    println!(\"open\");\n}}\n</lang>\n\n",
                src.display()
            )
        );
    }

    #[tokio::test]
    async fn plan_upload_reads_the_edit_target() {
        let tmp = TempDir::new().unwrap();
        let src = write(&tmp, "100_doors.rs", DOORS);

        let plan = robot(Pages::default().with(TASK, TASK_HTML))
            .plan_upload(&src)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(plan.url, TASK);
        assert_eq!(plan.target.title, "100_doors");
        assert_eq!(plan.target.section, "190");
        assert!(plan.markup.starts_with("=={{header|Rust}}==\n"));
        assert_eq!(plan.summary, "Update Rust entry from 100_doors.rs");
    }

    #[tokio::test]
    async fn plan_upload_fails_without_a_section() {
        let tmp = TempDir::new().unwrap();
        let src = write(&tmp, "100_doors.rs", DOORS);
        let pages = Pages::default().with(TASK, "<h2><span id=\"Go\">Go</span></h2>");

        let err = robot(pages).plan_upload(&src).await.unwrap_err();
        assert!(format!("{err:#}").contains("no Rust section"));
    }

    #[tokio::test]
    async fn dry_run_upload_prints_without_posting() {
        let tmp = TempDir::new().unwrap();
        let src = write(&tmp, "100_doors.rs", DOORS);
        let bare = write(&tmp, "bare.rs", "fn main() {}\n");

        let mut out = Vec::new();
        let failures = run_upload(
            &robot(Pages::default().with(TASK, TASK_HTML)),
            None,
            &[&bare, &src],
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(failures, 0);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("bare.rs: no URL found, skipped"));
        assert!(printed.contains("would edit 100_doors section 190\n=={{header|Rust}}=="));
    }

    #[tokio::test]
    async fn upload_posts_the_rendered_section() {
        use serde_json::json;
        use wiremock::matchers::{body_string_contains, method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mw/api.php"))
            .and(query_param("type", "csrf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "query": { "tokens": { "csrftoken": "ct" } } })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/mw/api.php"))
            .and(body_string_contains("title=100_doors"))
            .and(body_string_contains("section=190"))
            .and(body_string_contains("Toggle+every+door."))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({ "edit": { "result": "Success", "newrevid": 77 } }),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let src = write(&tmp, "100_doors.rs", DOORS);
        let http = HttpClient::new(&server.uri()).unwrap().with_retries(0);
        let wiki = WikiSession::new(http, "mw/api.php");

        let mut out = Vec::new();
        let failures = run_upload(
            &robot(Pages::default().with(TASK, TASK_HTML)),
            Some(&wiki),
            &[&src],
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(failures, 0);
        assert!(String::from_utf8(out).unwrap().contains("saved 100_doors section 190 (revision 77)"));
    }
}
