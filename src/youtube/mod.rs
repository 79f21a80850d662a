//! Fetching the signed-in user's subscription list from the YouTube Data API.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::settings::YoutubeSettings;
use crate::types::RemoteChannel;

mod auth;

const SUBSCRIPTIONS_URL: &str = "https://www.googleapis.com/youtube/v3/subscriptions";

/// Paging stops once more than this many channels have been collected.
pub const MAX_CHANNELS: usize = 300;

/// Anything that can produce the full remote subscription list.
pub trait SubscriptionSource {
    fn fetch_subscriptions(&mut self) -> Result<Vec<RemoteChannel>>;
}

impl SubscriptionSource for Vec<RemoteChannel> {
    fn fetch_subscriptions(&mut self) -> Result<Vec<RemoteChannel>> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPage {
    #[serde(default)]
    items: Vec<SubscriptionItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SubscriptionItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

impl SubscriptionPage {
    fn into_parts(self) -> (Vec<RemoteChannel>, Option<String>) {
        let channels = self
            .items
            .into_iter()
            .map(|item| RemoteChannel::new(item.id, item.snippet.title, item.snippet.description))
            .collect();
        let next = self.next_page_token.filter(|token| !token.is_empty());
        (channels, next)
    }
}

/// Follows page tokens until the list is exhausted or the channel cap is passed.
pub fn collect_pages(
    mut fetch_page: impl FnMut(Option<&str>) -> Result<SubscriptionPage>,
) -> Result<Vec<RemoteChannel>> {
    let mut channels = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = fetch_page(page_token.as_deref())?;
        let (mut batch, next) = page.into_parts();
        debug!(count = batch.len(), "received subscription page");
        channels.append(&mut batch);

        match next {
            Some(token) => page_token = Some(token),
            None => break,
        }
        if channels.len() > MAX_CHANNELS {
            break;
        }
    }

    Ok(channels)
}

pub struct YoutubeClient {
    http: reqwest::blocking::Client,
    settings: YoutubeSettings,
    credentials_file: PathBuf,
}

impl YoutubeClient {
    pub fn new(settings: YoutubeSettings, credentials_file: PathBuf) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("ysm/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            http,
            settings,
            credentials_file,
        })
    }

    fn fetch_page(&self, access_token: &str, page_token: Option<&str>) -> Result<SubscriptionPage> {
        let mut url = format!(
            "{SUBSCRIPTIONS_URL}?part=snippet&mine=true&maxResults={}",
            self.settings.max_results
        );
        if let Some(token) = page_token {
            url.push_str("&pageToken=");
            url.push_str(&urlencoding::encode(token));
        }

        let resp = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {access_token}"))
            .send()
            .context("list subscriptions")?;
        let page: SubscriptionPage = self
            .ensure_ok(resp, "list subscriptions")?
            .json()
            .context("parse subscriptions page")?;
        Ok(page)
    }

    fn ensure_ok(
        &self,
        resp: reqwest::blocking::Response,
        label: &str,
    ) -> Result<reqwest::blocking::Response> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            anyhow::bail!(
                "{label}: access denied ({status}); remove '{}' to sign in again",
                self.credentials_file.display()
            );
        }
        resp.error_for_status()
            .with_context(|| format!("{label} status"))
    }
}

impl SubscriptionSource for YoutubeClient {
    fn fetch_subscriptions(&mut self) -> Result<Vec<RemoteChannel>> {
        let access_token = auth::access_token(&self.http, &self.settings, &self.credentials_file)?;
        let channels = collect_pages(|page_token| self.fetch_page(&access_token, page_token))?;
        info!(count = channels.len(), "fetched subscriptions from youtube");
        Ok(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(ids: std::ops::Range<usize>, next: Option<&str>) -> SubscriptionPage {
        SubscriptionPage {
            items: ids
                .map(|id| SubscriptionItem {
                    id: format!("sub{id}"),
                    snippet: Snippet {
                        title: format!("Channel {id}"),
                        description: String::new(),
                    },
                })
                .collect(),
            next_page_token: next.map(str::to_string),
        }
    }

    #[test]
    fn parses_api_response() {
        let raw = r#"{
            "kind": "youtube#subscriptionListResponse",
            "nextPageToken": "CAUQAA",
            "items": [
                {"id": "abc", "snippet": {"title": "Foo", "description": "line one\nline two"}},
                {"id": "def", "snippet": {"title": "Bar"}}
            ]
        }"#;
        let page: SubscriptionPage = serde_json::from_str(raw).expect("valid page");
        let (channels, next) = page.into_parts();
        assert_eq!(next.as_deref(), Some("CAUQAA"));
        assert_eq!(
            channels,
            vec![
                RemoteChannel::new("abc", "Foo", "line one\nline two"),
                RemoteChannel::new("def", "Bar", ""),
            ]
        );
    }

    #[test]
    fn empty_page_token_ends_paging() {
        let page: SubscriptionPage =
            serde_json::from_str(r#"{"nextPageToken": "", "items": []}"#).expect("valid page");
        assert_eq!(page.into_parts().1, None);
    }

    #[test]
    fn follows_tokens_until_exhausted() -> Result<()> {
        let mut requested = Vec::new();
        let channels = collect_pages(|token| {
            requested.push(token.map(str::to_string));
            Ok(match token {
                None => page(0..2, Some("p2")),
                Some("p2") => page(2..3, None),
                Some(other) => panic!("unexpected token {other}"),
            })
        })?;
        assert_eq!(channels.len(), 3);
        assert_eq!(requested, vec![None, Some("p2".to_string())]);
        Ok(())
    }

    #[test]
    fn stops_after_passing_the_cap() -> Result<()> {
        let mut calls = 0;
        let channels = collect_pages(|_| {
            calls += 1;
            Ok(page(calls * 50..calls * 50 + 50, Some("more")))
        })?;
        assert_eq!(channels.len(), 350);
        assert_eq!(calls, 7);
        Ok(())
    }

    #[test]
    fn page_errors_propagate() {
        let err = collect_pages(|_| anyhow::bail!("boom")).expect_err("fetch fails");
        assert_eq!(err.to_string(), "boom");
    }
}
