//! Contact form screening: minimum fill time, honeypot, per-client
//! throttling, then storage.
//!
//! Throttling is a convenience for honest visitors, not a security control.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::db;
use crate::error::AppError;
use crate::kv::KvStore;

pub const SUBMISSION_LOG_KEY: &str = "contact_form_submissions";

const RATE_LIMIT_WINDOW_MS: i64 = 60 * 60 * 1000;
const MAX_SUBMISSIONS_PER_WINDOW: usize = 3;
const MIN_INTERVAL_MS: i64 = 60 * 1000;
const LOG_RETENTION_MS: i64 = 24 * 60 * 60 * 1000;
const MIN_VISIBLE_MS: u64 = 3_000;

pub const SUCCESS_MESSAGE: &str =
    "Thank you! Your message has been received. We'll get back to you soon.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    /// Honeypot; real visitors never see it.
    #[serde(default)]
    pub website: Option<String>,
    /// How long the form was on screen before submit.
    #[serde(default)]
    pub elapsed_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    TooFast,
    Honeypot,
    TooMany { minutes: i64 },
    TooSoon { seconds: i64 },
    Incomplete,
}

impl Rejection {
    pub fn message(&self) -> String {
        match self {
            Rejection::TooFast => "Please take your time filling out the form.".to_string(),
            Rejection::Honeypot => "Spam detected. Submission blocked.".to_string(),
            Rejection::TooMany { minutes } => format!(
                "Too many submissions. Please try again in {minutes} minute{}.",
                plural(*minutes)
            ),
            Rejection::TooSoon { seconds } => format!(
                "Please wait {seconds} second{} before submitting again.",
                plural(*seconds)
            ),
            Rejection::Incomplete => "Please fill in your name, email, and message.".to_string(),
        }
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, Rejection::TooMany { .. } | Rejection::TooSoon { .. })
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 { "" } else { "s" }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Success,
    Error,
}

/// What the visitor is shown after submitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormOutcome {
    pub kind: OutcomeKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Accepted { public_id: String },
    Rejected(Rejection),
}

impl Submission {
    pub fn outcome(&self) -> FormOutcome {
        match self {
            Submission::Accepted { .. } => FormOutcome {
                kind: OutcomeKind::Success,
                message: SUCCESS_MESSAGE.to_string(),
            },
            Submission::Rejected(rejection) => FormOutcome {
                kind: OutcomeKind::Error,
                message: rejection.message(),
            },
        }
    }
}

/// Checks that need nothing but the form itself.
pub fn screen(form: &ContactForm) -> Result<(), Rejection> {
    if form.elapsed_ms.is_some_and(|ms| ms < MIN_VISIBLE_MS) {
        return Err(Rejection::TooFast);
    }
    if form
        .website
        .as_deref()
        .is_some_and(|value| !value.trim().is_empty())
    {
        return Err(Rejection::Honeypot);
    }
    Ok(())
}

pub fn validate_fields(form: &ContactForm) -> Result<(), Rejection> {
    let email_ok = form
        .email
        .trim()
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if form.name.trim().is_empty() || form.message.trim().is_empty() || !email_ok {
        return Err(Rejection::Incomplete);
    }
    Ok(())
}

/// `log` holds submission times in epoch milliseconds, oldest first.
pub fn check_rate_limit(log: &[i64], now_ms: i64) -> Result<(), Rejection> {
    let recent: Vec<i64> = log
        .iter()
        .copied()
        .filter(|ts| now_ms - ts < RATE_LIMIT_WINDOW_MS)
        .collect();

    if recent.len() >= MAX_SUBMISSIONS_PER_WINDOW {
        let oldest = recent[0];
        let wait_ms = RATE_LIMIT_WINDOW_MS - (now_ms - oldest);
        return Err(Rejection::TooMany {
            minutes: ceil_div(wait_ms, 60 * 1000),
        });
    }

    if let Some(last) = recent.last() {
        let since_last = now_ms - last;
        if since_last < MIN_INTERVAL_MS {
            return Err(Rejection::TooSoon {
                seconds: ceil_div(MIN_INTERVAL_MS - since_last, 1000),
            });
        }
    }
    Ok(())
}

fn ceil_div(value: i64, unit: i64) -> i64 {
    (value + unit - 1).div_euclid(unit)
}

/// Per-client list of recent submission timestamps.
pub struct SubmissionLog<'a> {
    kv: &'a dyn KvStore,
    key: String,
}

impl<'a> SubmissionLog<'a> {
    pub fn new(kv: &'a dyn KvStore, client: &str) -> Self {
        Self {
            kv,
            key: format!("{SUBMISSION_LOG_KEY}:{client}"),
        }
    }

    pub async fn load(&self) -> Vec<i64> {
        let Some(raw) = self.kv.get(&self.key).await else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<i64>>(&raw) {
            Ok(mut log) => {
                log.sort_unstable();
                log
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "discarding unreadable submission log");
                Vec::new()
            }
        }
    }

    /// Appends `now_ms` and keeps only the last 24 hours.
    pub async fn record(&self, mut log: Vec<i64>, now_ms: i64) {
        log.push(now_ms);
        log.retain(|ts| now_ms - ts < LOG_RETENTION_MS);
        match serde_json::to_string(&log) {
            Ok(raw) => {
                let retention = Duration::from_millis(LOG_RETENTION_MS as u64);
                self.kv.set(&self.key, raw, Some(retention)).await;
            }
            Err(err) => tracing::warn!(error = %err, "failed to record submission"),
        }
    }
}

/// One async lock per client, held from reading the log until it is rewritten.
#[derive(Default)]
pub struct SubmissionLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SubmissionLocks {
    pub async fn acquire(&self, client: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(client.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

/// Runs every check and, when they pass, stores the message.
pub async fn submit(
    pool: &SqlitePool,
    kv: &dyn KvStore,
    locks: &SubmissionLocks,
    client: &str,
    form: &ContactForm,
    now: DateTime<Utc>,
) -> Result<Submission, AppError> {
    if let Err(rejection) = screen(form) {
        return Ok(Submission::Rejected(rejection));
    }

    let now_ms = now.timestamp_millis();
    let _guard = locks.acquire(client).await;
    let log = SubmissionLog::new(kv, client);
    let previous = log.load().await;
    if let Err(rejection) = check_rate_limit(&previous, now_ms) {
        tracing::warn!(client, reason = ?rejection, "contact submission throttled");
        return Ok(Submission::Rejected(rejection));
    }

    if let Err(rejection) = validate_fields(form) {
        return Ok(Submission::Rejected(rejection));
    }

    let saved = db::insert_contact_message(
        pool,
        form.name.trim(),
        form.email.trim(),
        form.message.trim(),
        client,
    )
    .await?;
    log.record(previous, now_ms).await;
    tracing::info!(public_id = %saved.public_id, "contact message stored");

    Ok(Submission::Accepted {
        public_id: saved.public_id,
    })
}
