use crate::locate::MarkupLocator;
use async_trait::async_trait;
use rosetta_http::{HttpClient, HttpError, RequestOpts};
use scraper::Html;
use std::time::Instant;

/// Anything that can GET a page by absolute URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String, HttpError>;
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch_html(&self, url: &str) -> Result<String, HttpError> {
        self.get_text(url, RequestOpts::absolute()).await
    }
}

/// Task pages on the wiki, read through a [`PageFetcher`].
pub struct RosettaSite<F = HttpClient> {
    fetcher: F,
    locator: MarkupLocator,
}

impl<F: PageFetcher> RosettaSite<F> {
    pub fn new(fetcher: F, locator: MarkupLocator) -> Self {
        Self { fetcher, locator }
    }

    pub fn locator(&self) -> &MarkupLocator {
        &self.locator
    }

    /// Fetch a task page and locate the edit form of our language section.
    pub async fn edit_section_url(&self, page_url: &str) -> Result<Option<String>, HttpError> {
        let html = self.fetcher.fetch_html(page_url).await?;
        // `Html` is not `Send`; keep it out of any await.
        let found = {
            let doc = Html::parse_document(&html);
            self.locator.find_edit_section_url(&doc)
        };
        if found.is_none() {
            tracing::info!(target: "web.site", page_url, "site.edit_section.absent");
        }
        Ok(found)
    }

    /// Current wiki markup of our language section on the task page at `page_url`.
    ///
    /// `Ok(None)` when the page has no section for the language (then only one
    /// request is made) or when the edit form has no textarea.
    pub async fn fetch_markup(&self, page_url: &str) -> Result<Option<String>, HttpError> {
        let started = Instant::now();
        let Some(edit_url) = self.edit_section_url(page_url).await? else {
            return Ok(None);
        };

        let html = self.fetcher.fetch_html(&edit_url).await?;
        let markup = {
            let doc = Html::parse_document(&html);
            self.locator.find_markup_text(&doc)
        };

        tracing::info!(
            target: "web.site",
            page_url,
            edit_url = %edit_url,
            found = markup.is_some(),
            markup_len = markup.as_ref().map(String::len).unwrap_or(0),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "site.fetch_markup"
        );
        Ok(markup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakePages {
        pages: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl FakePages {
        fn with(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for FakePages {
        async fn fetch_html(&self, url: &str) -> Result<String, HttpError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| HttpError::Network(format!("no page for {url}")))
        }
    }

    const TASK: &str = "http://rosettacode.org/wiki/100_doors";
    const EDIT: &str = "http://rosettacode.org/mw/index.php?title=100_doors&action=edit&section=190";

    const TASK_HTML: &str = r#"<h2><span class="editsection">[<a href="/mw/index.php?title=100_doors&amp;action=edit&amp;section=190">edit</a>]</span>
        <span class="mw-headline" id="Rust">Rust</span></h2>"#;

    #[tokio::test]
    async fn follows_edit_link_to_markup() {
        let pages = FakePages::default()
            .with(TASK, TASK_HTML)
            .with(EDIT, "<textarea>=={{header|Rust}}==</textarea>");
        let site = RosettaSite::new(pages, MarkupLocator::default());

        let markup = site.fetch_markup(TASK).await.unwrap();
        assert_eq!(markup.as_deref(), Some("=={{header|Rust}}=="));
        assert_eq!(site.fetcher.requested(), vec![TASK, EDIT]);
    }

    #[tokio::test]
    async fn missing_section_stops_after_one_request() {
        let pages = FakePages::default().with(TASK, "<h2><span id=\"Python\">Python</span></h2>");
        let site = RosettaSite::new(pages, MarkupLocator::default());

        assert_eq!(site.fetch_markup(TASK).await.unwrap(), None);
        assert_eq!(site.fetcher.requested(), vec![TASK]);
    }

    #[tokio::test]
    async fn edit_page_without_textarea_is_absent() {
        let pages = FakePages::default()
            .with(TASK, TASK_HTML)
            .with(EDIT, "<p>You do not have permission to edit this page.</p>");
        let site = RosettaSite::new(pages, MarkupLocator::default());

        assert_eq!(site.fetch_markup(TASK).await.unwrap(), None);
        assert_eq!(site.fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn fetch_failures_propagate() {
        let site = RosettaSite::new(FakePages::default(), MarkupLocator::default());
        let err = site.fetch_markup(TASK).await.unwrap_err();
        assert!(matches!(err, HttpError::Network(_)));
    }

    #[tokio::test]
    async fn failure_on_edit_page_propagates() {
        let pages = FakePages::default().with(TASK, TASK_HTML);
        let site = RosettaSite::new(pages, MarkupLocator::default());
        assert!(site.fetch_markup(TASK).await.is_err());
    }
}
