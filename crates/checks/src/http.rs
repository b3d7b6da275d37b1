//! HTTP reachability check.
//!
//! Probes a configured list of URLs and fails if any of them is
//! unreachable or answers outside the 2xx/3xx range. An optional
//! response-time threshold records slow endpoints in the result detail
//! without failing the check on its own.

use std::time::{Duration, Instant};

use hostcheck_core::check::{Check, CheckContext};
use hostcheck_core::config::CheckEntry;
use hostcheck_core::error::LoadError;
use hostcheck_core::result::CheckResult;

/// Default per-URL request timeout in seconds.
const DEFAULT_URL_TIMEOUT_SECS: u64 = 10;

/// Registry identifier for this check.
pub const IDENTIFIER: &str = "network.http";

/// Probes configured URLs over HTTP(S).
#[derive(Debug)]
pub struct HttpCheck {
    urls: Vec<String>,
    url_timeout: Duration,
    max_response_time_ms: Option<u64>,
}

impl HttpCheck {
    /// Build from a configuration entry.
    ///
    /// Required option: `urls` (non-empty array of strings).
    /// Optional: `url_timeout_secs`, `max_response_time_ms`.
    pub fn from_entry(entry: &CheckEntry) -> Result<Self, LoadError> {
        let urls = entry
            .option_str_list("urls")
            .ok_or_else(|| entry.invalid_option("urls", "required array of URL strings"))?;
        if urls.is_empty() {
            return Err(entry.invalid_option("urls", "must contain at least one URL"));
        }

        let url_timeout =
            Duration::from_secs(entry.option_u64("url_timeout_secs").unwrap_or(DEFAULT_URL_TIMEOUT_SECS));

        Ok(Self {
            urls,
            url_timeout,
            max_response_time_ms: entry.option_u64("max_response_time_ms"),
        })
    }

    fn probe(&self, client: &reqwest::blocking::Client, url: &str) -> UrlProbe {
        let start = Instant::now();
        match client.get(url).send() {
            Ok(response) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                let status = response.status();
                let ok = status.is_success() || status.is_redirection();
                let slow = self
                    .max_response_time_ms
                    .is_some_and(|max| elapsed_ms > max);
                UrlProbe {
                    line: format!("{url}: {} in {elapsed_ms}ms{}", status.as_u16(), if slow { " (slow)" } else { "" }),
                    ok,
                }
            }
            Err(e) => UrlProbe {
                line: format!("{url}: {e}"),
                ok: false,
            },
        }
    }
}

struct UrlProbe {
    line: String,
    ok: bool,
}

impl Check for HttpCheck {
    fn name(&self) -> &str {
        IDENTIFIER
    }

    fn description(&self) -> &str {
        "Verifies HTTP(S) reachability of the configured URLs"
    }

    fn run(&self, ctx: &CheckContext) -> CheckResult {
        let mut result = CheckResult::new(self.name(), self.description());
        let _ = result.mark_started();

        let client = match reqwest::blocking::Client::builder()
            .timeout(self.url_timeout)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                let _ = result.mark_error("failed to build HTTP client", Some(e.to_string()));
                return result;
            }
        };

        let mut lines = Vec::with_capacity(self.urls.len());
        let mut failures = 0;
        for url in &self.urls {
            if ctx.is_cancelled() {
                let _ = result.mark_error(
                    "check cancelled before all URLs were probed",
                    Some(lines.join("\n")),
                );
                return result;
            }
            let probe = self.probe(&client, url);
            tracing::debug!(url = %url, ok = probe.ok, "url probed");
            if !probe.ok {
                failures += 1;
            }
            lines.push(probe.line);
        }

        let detail = lines.join("\n");
        if failures > 0 {
            let _ = result.mark_failed(
                format!("{failures} of {} URLs unreachable", self.urls.len()),
                Some(detail),
            );
        } else {
            let _ = result.mark_passed(format!("all {} URLs reachable", self.urls.len()));
        }
        result
    }
}
