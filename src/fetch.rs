//! Remote question source: `GET <host>/Questions`.
//!
//! The blocking client below is native only; the browser build goes through
//! `fetch` in the `web` module and shares the endpoint helpers.

#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use anyhow::{anyhow, Context, Result};
#[cfg(not(target_arch = "wasm32"))]
use log::{error, info};

#[cfg(not(target_arch = "wasm32"))]
use crate::question::Question;

/// Host serving the question list during development.
pub const DEFAULT_QUESTION_HOST: &str = "http://localhost:3000";

/// Builds the `<host>/Questions` endpoint URL.
pub fn questions_url(host: &str) -> String {
    format!("{}/Questions", host.trim_end_matches('/'))
}

/// HTTP client for the optional remote question source.
#[cfg(not(target_arch = "wasm32"))]
pub struct QuestionFetcher {
    host: String,
    client: reqwest::blocking::Client,
}

#[cfg(not(target_arch = "wasm32"))]
impl QuestionFetcher {
    pub fn new(host: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            host: host.into(),
            client,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Requests the question list, failing on transport errors and non-200 replies.
    pub fn try_fetch(&self) -> Result<Vec<Question>> {
        let url = questions_url(&self.host);
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("request to {url} failed"))?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(anyhow!(
                "{url} answered {} instead of 200 OK",
                response.status()
            ));
        }
        let questions: Vec<Question> = response
            .json()
            .with_context(|| format!("{url} did not return a question list"))?;
        Ok(questions)
    }

    /// Like [`try_fetch`](Self::try_fetch) but logs failures and yields `None`.
    pub fn fetch(&self) -> Option<Vec<Question>> {
        match self.try_fetch() {
            Ok(questions) => {
                info!("fetched {} question(s) from {}", questions.len(), self.host);
                Some(questions)
            }
            Err(err) => {
                error!("question fetch failed: {err:?}");
                None
            }
        }
    }
}

/// One-shot fetch from `host`. No retry.
#[cfg(not(target_arch = "wasm32"))]
pub fn fetch_questions(host: &str) -> Option<Vec<Question>> {
    match QuestionFetcher::new(host) {
        Ok(fetcher) => fetcher.fetch(),
        Err(err) => {
            error!("question fetch failed: {err:?}");
            None
        }
    }
}
