//! Lookups against a parsed task page and its edit form.
//!
//! Task pages render each language section as
//!
//! ```html
//! <h2>
//!   <span class="editsection">[<a href="/mw/index.php?title=...&action=edit&section=190">edit</a>]</span>
//!   <span class="mw-headline" id="Rust">Rust</span>
//! </h2>
//! ```
//!
//! so the edit link is found on the sibling *preceding* the anchor, not below it.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

pub const SITE_ORIGIN: &str = "http://rosettacode.org";
pub const LANGUAGE_ANCHOR: &str = "Rust";

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("Failed to parse link selector - this is a bug")
});

static TEXTAREA_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("textarea").expect("Failed to parse textarea selector - this is a bug")
});

/// The site origin and section anchor a lookup runs against.
#[derive(Debug, Clone)]
pub struct MarkupLocator {
    origin: Url,
    anchor: String,
}

impl Default for MarkupLocator {
    fn default() -> Self {
        Self {
            origin: Url::parse(SITE_ORIGIN).expect("SITE_ORIGIN is a valid URL"),
            anchor: LANGUAGE_ANCHOR.to_string(),
        }
    }
}

impl MarkupLocator {
    pub fn new(origin: Url, anchor: impl Into<String>) -> Self {
        Self {
            origin,
            anchor: anchor.into(),
        }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Absolute URL of the edit form for this locator's language section.
    ///
    /// ```
    /// use rosetta_web::locate::MarkupLocator;
    /// use scraper::Html;
    ///
    /// let doc = Html::parse_document(
    ///     r#"<h2><span><a href="/mw/index.php?title=Fasta&amp;action=edit&amp;section=4">edit</a></span>
    ///        <span id="Rust">Rust</span></h2>"#,
    /// );
    /// assert_eq!(
    ///     MarkupLocator::default().find_edit_section_url(&doc).as_deref(),
    ///     Some("http://rosettacode.org/mw/index.php?title=Fasta&action=edit&section=4")
    /// );
    /// ```
    pub fn find_edit_section_url(&self, doc: &Html) -> Option<String> {
        let anchor = doc
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().id() == Some(self.anchor.as_str()))?;

        let sibling = anchor.prev_siblings().find_map(ElementRef::wrap)?;
        let href = first_link(sibling)?;

        self.origin.join(href).ok().map(String::from)
    }

    /// Text of the first `<textarea>` in the document.
    pub fn find_markup_text(&self, doc: &Html) -> Option<String> {
        find_markup_text(doc)
    }
}

fn first_link(el: ElementRef<'_>) -> Option<&str> {
    if el.value().name() == "a" && let Some(href) = el.value().attr("href") {
        return Some(href);
    }
    el.select(&LINK_SELECTOR)
        .next()
        .and_then(|a| a.value().attr("href"))
}

/// [`MarkupLocator::find_edit_section_url`] with the default origin and anchor.
pub fn find_edit_section_url(doc: &Html) -> Option<String> {
    MarkupLocator::default().find_edit_section_url(doc)
}

/// Text of the first `<textarea>` in `doc`, or `None` when there is none.
pub fn find_markup_text(doc: &Html) -> Option<String> {
    doc.select(&TEXTAREA_SELECTOR)
        .next()
        .map(|el| el.text().collect())
}
