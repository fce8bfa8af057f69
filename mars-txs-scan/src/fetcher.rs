//! Indexer paging and task scan orchestration.
//!
//! For each task the scanner:
//! 1. Loads the resume cursor and the CSV written so far (unless `fresh`).
//! 2. Requests `/v1/txs` pages from the cursor offset, retrying transient
//!    failures with linear backoff.
//! 3. Folds every transaction into at most one row and rewrites the CSV
//!    after each page.
//! 4. Saves the cursor, marking it complete once a page has no `next`.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use mars_txs::{TxPage, aggregate};

use crate::config::{Config, RetryPolicy};
use crate::cursor::Cursor;
use crate::table::ResultTable;
use crate::tasks::ScanTask;

/// A failed page request, classified for the retry loop.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection-level failure (DNS, reset, TLS, ...).
    #[error("request to {url} failed")]
    Transport {
        /// Requested URL.
        url: String,
        /// The underlying client error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No response within the configured timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// Requested URL.
        url: String,
    },

    /// Non-success HTTP status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The body is not a transaction page.
    #[error("invalid response body from {url}")]
    Body {
        /// Requested URL.
        url: String,
        /// The underlying decode error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FetchError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Body { .. } => false,
        }
    }
}

/// Anything that serves `/v1/txs` pages for an account.
pub trait PageSource {
    /// Fetch the page of `account`'s history starting at `offset`.
    fn fetch_page(
        &self,
        account: &str,
        offset: u64,
        limit: u32,
    ) -> impl Future<Output = Result<TxPage, FetchError>> + Send;
}

/// HTTP client for a Terra FCD instance.
#[derive(Debug, Clone)]
pub struct FcdClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl FcdClient {
    /// Build a client for `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_owned(),
            timeout: config.request_timeout(),
        })
    }
}

impl PageSource for FcdClient {
    async fn fetch_page(&self, account: &str, offset: u64, limit: u32) -> Result<TxPage, FetchError> {
        let url = format!("{}/v1/txs", self.base_url);
        let request = self.http.get(&url).query(&[
            ("offset", offset.to_string()),
            ("account", account.to_owned()),
            ("limit", limit.to_string()),
        ]);

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| FetchError::Timeout { url: url.clone() })?
            .map_err(|e| transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| transport(&url, e))?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Body {
            url,
            source: Box::new(e),
        })
    }
}

fn transport(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_owned(),
        }
    } else {
        FetchError::Transport {
            url: url.to_owned(),
            source: Box::new(e),
        }
    }
}

/// Fetch one page, retrying transient failures according to `policy`.
///
/// # Errors
///
/// Returns the last error once retries are exhausted, or immediately for
/// non-transient failures.
pub async fn fetch_with_retry<S: PageSource + Sync>(
    source: &S,
    account: &str,
    offset: u64,
    limit: u32,
    policy: RetryPolicy,
) -> Result<TxPage> {
    let mut attempt = 0u32;
    loop {
        match source.fetch_page(account, offset, limit).await {
            Ok(page) => return Ok(page),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                let delay = policy.backoff(attempt);
                attempt += 1;
                tracing::warn!(
                    account,
                    offset,
                    attempt,
                    delay_secs = delay.as_secs(),
                    error = %e,
                    "indexer request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("fetching {account} at offset {offset} after {attempt} retries")
                });
            }
        }
    }
}

/// Outcome of one [`scan_task`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Pages fetched in this run.
    pub pages: u64,
    /// Rows added in this run.
    pub new_rows: usize,
    /// Rows in the CSV at the end of the run.
    pub total_rows: usize,
}

/// Scan `task`'s full history into `<data_dir>/<task.output>`.
///
/// Resumes from the task's cursor unless `fresh` is set. A scan that
/// already completed is not repeated.
///
/// # Errors
///
/// Returns an error if a page cannot be fetched, a transaction cannot be
/// decoded, or the CSV/cursor cannot be written. Pages processed before the
/// failure stay on disk and the next run resumes after them.
pub async fn scan_task<S: PageSource + Sync>(
    source: &S,
    task: &ScanTask,
    config: &Config,
    data_dir: &Path,
    fresh: bool,
) -> Result<ScanSummary> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;
    let csv_path = task.csv_path(data_dir);
    let cursor_path = task.cursor_path(data_dir);

    if fresh {
        Cursor::clear(&cursor_path)?;
    }

    let (mut table, mut offset) = match Cursor::load(&cursor_path)? {
        Some(cursor) if cursor.complete => {
            tracing::info!(task = task.name, rows = cursor.rows, "already complete");
            return Ok(ScanSummary {
                total_rows: cursor.rows,
                ..ScanSummary::default()
            });
        }
        Some(cursor) => {
            let mut table = ResultTable::read(&csv_path, task)?;
            if table.len() < cursor.rows {
                // Checkpointed rows are gone; only a full rescan recovers them.
                tracing::warn!(
                    task = task.name,
                    csv_rows = table.len(),
                    cursor_rows = cursor.rows,
                    "csv is missing checkpointed rows, rescanning from the start"
                );
                (ResultTable::new(task), 0)
            } else {
                if table.len() > cursor.rows {
                    tracing::warn!(
                        task = task.name,
                        csv_rows = table.len(),
                        cursor_rows = cursor.rows,
                        "csv is ahead of cursor, keeping cursor rows"
                    );
                    table.truncate(cursor.rows);
                }
                tracing::info!(task = task.name, offset = cursor.next_offset, rows = table.len(), "resuming");
                (table, cursor.next_offset)
            }
        }
        None => (ResultTable::new(task), 0),
    };

    tracing::info!(task = task.name, account = task.account, offset, "scanning");

    let mut summary = ScanSummary::default();
    loop {
        let page =
            fetch_with_retry(source, task.account, offset, config.page_limit, config.retry).await?;
        summary.pages += 1;

        let before = table.len();
        for tx in &page.txs {
            if let Some(row) = aggregate(tx, task.rules)? {
                tracing::info!(
                    task = task.name,
                    txhash = %row.txhash,
                    height = row.height,
                    sender = %row.sender,
                    amount_a = %row.amount_a,
                    amount_b = %row.amount_b,
                    "matched"
                );
                table.push(row);
            }
        }
        summary.new_rows += table.len() - before;

        table.write(&csv_path)?;
        let next = page.next_offset();
        Cursor::now(next.unwrap_or(offset), table.len(), next.is_none()).save(&cursor_path)?;

        tracing::info!(
            task = task.name,
            offset,
            txs = page.txs.len(),
            new_rows = table.len() - before,
            rows = table.len(),
            "page processed"
        );

        let Some(next) = next else { break };
        offset = next;
        if !config.page_delay().is_zero() {
            tokio::time::sleep(config.page_delay()).await;
        }
    }

    summary.total_rows = table.len();
    tracing::info!(
        task = task.name,
        pages = summary.pages,
        rows = summary.total_rows,
        path = %csv_path.display(),
        "scan complete"
    );
    Ok(summary)
}
