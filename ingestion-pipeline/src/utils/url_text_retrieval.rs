use std::{sync::OnceLock, time::Duration};

use common::{error::AppError, utils::ingest_limits::is_restricted_host};
use reqwest::redirect::{Action, Attempt, Policy};
use scraper::{Html, Selector};
use tracing::{info, warn};

const USER_AGENT: &str = concat!("site-qa-indexer/", env!("CARGO_PKG_VERSION"));
const PARAGRAPH_SEPARATOR: &str = "\n\n";
const MAX_REDIRECTS: usize = 10;

static PARAGRAPH_SELECTOR: OnceLock<Option<Selector>> = OnceLock::new();

/// HTTP client used for page fetches. The timeout bounds the whole request,
/// body included. Every redirect hop is held to the same host restriction as
/// the submitted URL unless `allow_private_hosts` is set.
pub fn build_http_client(
    timeout: Duration,
    allow_private_hosts: bool,
) -> Result<reqwest::Client, AppError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .redirect(Policy::custom(move |attempt| {
            follow_redirect(attempt, allow_private_hosts)
        }))
        .build()?;

    Ok(client)
}

fn follow_redirect(attempt: Attempt<'_>, allow_private_hosts: bool) -> Action {
    if attempt.previous().len() >= MAX_REDIRECTS {
        return attempt.error("too many redirects");
    }

    if !allow_private_hosts && is_restricted_host(attempt.url()) {
        warn!(target_url = %attempt.url(), "Refusing redirect to restricted host");
        return attempt.error("redirect to restricted host");
    }

    attempt.follow()
}

/// Fetches the raw document at `url`. Non-2xx statuses are errors.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String, AppError> {
    info!("Fetching URL: {}", url);
    let response = client.get(url).send().await?.error_for_status()?;
    let body = response.text().await?;

    Ok(body)
}

/// Text of every `<p>` element in document order. Paragraphs without any
/// non-whitespace text are dropped.
pub fn extract_paragraphs(document: &str) -> Vec<String> {
    let Some(selector) = PARAGRAPH_SELECTOR.get_or_init(|| Selector::parse("p").ok()) else {
        return Vec::new();
    };

    let html = Html::parse_document(document);
    html.select(selector)
        .map(|paragraph| paragraph.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
        .collect()
}

pub fn extract_text(document: &str) -> String {
    extract_paragraphs(document).join(PARAGRAPH_SEPARATOR)
}
