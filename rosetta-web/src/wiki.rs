//! Logged-in access to the MediaWiki action API: login and section edits.
//!
//! The session cookie lives in the [`HttpClient`]'s cookie store, so the same
//! client must be used for [`WikiSession::login`] and the edits that follow.

use rosetta_common::{Result, RobotError};
use rosetta_http::{HttpClient, HttpError, RequestOpts};
use serde::Deserialize;
use std::borrow::Cow;
use url::Url;

/// Page title and section number an edit-section URL points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTarget {
    pub title: String,
    pub section: String,
}

impl EditTarget {
    /// Decode `title` and `section` from an edit URL's query string.
    ///
    /// ```
    /// use rosetta_web::wiki::EditTarget;
    ///
    /// let t = EditTarget::from_edit_url(
    ///     "http://rosettacode.org/mw/index.php?title=100_doors&action=edit&section=190",
    /// )
    /// .unwrap();
    /// assert_eq!(t.title, "100_doors");
    /// assert_eq!(t.section, "190");
    /// ```
    pub fn from_edit_url(edit_url: &str) -> Option<Self> {
        let url = Url::parse(edit_url).ok()?;
        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .filter(|v| !v.is_empty())
        };
        Some(Self {
            title: param("title")?,
            section: param("section")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct TokensReply {
    query: Option<TokensQuery>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct TokensQuery {
    tokens: Tokens,
}

#[derive(Debug, Deserialize)]
struct Tokens {
    logintoken: Option<String>,
    csrftoken: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginReply {
    login: Option<LoginResult>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct LoginResult {
    result: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EditReply {
    edit: Option<EditResult>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct EditResult {
    result: String,
    #[serde(default)]
    newrevid: Option<u64>,
    #[serde(default)]
    nochange: Option<serde_json::Value>,
}

/// What a successful edit did to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Saved { revision: Option<u64> },
    Unchanged,
}

pub struct WikiSession {
    http: HttpClient,
    api_path: String,
}

impl WikiSession {
    /// `api_path` is resolved against the client's base, e.g. `mw/api.php`.
    pub fn new(http: HttpClient, api_path: impl Into<String>) -> Self {
        Self {
            http,
            api_path: api_path.into(),
        }
    }

    async fn token(&self, kind: &'static str) -> Result<String> {
        let opts = RequestOpts {
            query: Some(vec![
                ("action", Cow::Borrowed("query")),
                ("meta", Cow::Borrowed("tokens")),
                ("type", Cow::Borrowed(kind)),
                ("format", Cow::Borrowed("json")),
            ]),
            ..Default::default()
        };
        let reply: TokensReply = self
            .http
            .get_json(&self.api_path, opts)
            .await
            .map_err(wiki_err)?;
        if let Some(e) = reply.error {
            return Err(api_err("token", e));
        }
        let tokens = reply
            .query
            .map(|q| q.tokens)
            .ok_or_else(|| RobotError::Wiki(format!("no {kind} token in reply")))?;
        let token = match kind {
            "login" => tokens.logintoken,
            _ => tokens.csrftoken,
        };
        token.ok_or_else(|| RobotError::Wiki(format!("no {kind} token in reply")))
    }

    /// Log in with a bot password or account password.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let token = self.token("login").await?;
        let reply: LoginReply = self
            .http
            .post_form_json(
                &self.api_path,
                &[
                    ("action", "login"),
                    ("lgname", username),
                    ("lgpassword", password),
                    ("lgtoken", token.as_str()),
                ],
                json_format(),
            )
            .await
            .map_err(wiki_err)?;
        if let Some(e) = reply.error {
            return Err(api_err("login", e));
        }
        match reply.login {
            Some(l) if l.result == "Success" => {
                tracing::info!(target: "web.wiki", username, "wiki.login.success");
                Ok(())
            }
            Some(l) => Err(RobotError::Wiki(format!(
                "login {}: {}",
                l.result,
                l.reason.unwrap_or_default()
            ))),
            None => Err(RobotError::Wiki("login reply without result".into())),
        }
    }

    /// Replace one section of a page with `text`.
    pub async fn edit_section(
        &self,
        target: &EditTarget,
        text: &str,
        summary: &str,
    ) -> Result<EditOutcome> {
        let token = self.token("csrf").await?;
        let reply: EditReply = self
            .http
            .post_form_json(
                &self.api_path,
                &[
                    ("action", "edit"),
                    ("title", target.title.as_str()),
                    ("section", target.section.as_str()),
                    ("text", text),
                    ("summary", summary),
                    ("token", token.as_str()),
                ],
                json_format(),
            )
            .await
            .map_err(wiki_err)?;
        if let Some(e) = reply.error {
            return Err(api_err("edit", e));
        }
        let edit = reply
            .edit
            .ok_or_else(|| RobotError::Wiki("edit reply without result".into()))?;
        if edit.result != "Success" {
            return Err(RobotError::Wiki(format!("edit {}", edit.result)));
        }
        let outcome = if edit.nochange.is_some() {
            EditOutcome::Unchanged
        } else {
            EditOutcome::Saved {
                revision: edit.newrevid,
            }
        };
        tracing::info!(
            target: "web.wiki",
            title = %target.title,
            section = %target.section,
            outcome = ?outcome,
            "wiki.edit.done"
        );
        Ok(outcome)
    }
}

fn json_format() -> RequestOpts<'static> {
    RequestOpts {
        query: Some(vec![("format", Cow::Borrowed("json"))]),
        retries: Some(0),
        ..Default::default()
    }
}

fn wiki_err(e: HttpError) -> RobotError {
    RobotError::Wiki(e.to_string())
}

fn api_err(step: &str, e: ApiError) -> RobotError {
    RobotError::Wiki(format!("{step} failed: {}: {}", e.code, e.info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_target_needs_title_and_section() {
        assert_eq!(
            EditTarget::from_edit_url("http://rosettacode.org/mw/index.php?title=Fasta&action=edit"),
            None
        );
        assert_eq!(
            EditTarget::from_edit_url("http://rosettacode.org/mw/index.php?section=3&title="),
            None
        );
        assert_eq!(EditTarget::from_edit_url("not a url"), None);
    }

    #[test]
    fn edit_target_decodes_percent_escapes() {
        let t = EditTarget::from_edit_url(
            "http://rosettacode.org/mw/index.php?title=Greatest_element_of_a_list%2FRust&action=edit&section=7",
        )
        .unwrap();
        assert_eq!(t.title, "Greatest_element_of_a_list/Rust");
        assert_eq!(t.section, "7");
    }
}
