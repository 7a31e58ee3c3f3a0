use std::net::{Ipv4Addr, Ipv6Addr};

use tracing::warn;
use url::Host;

use super::config::AppConfig;
use crate::error::AppError;

/// Checks a site identifier before it is used as a registry key.
pub fn validate_site_id(config: &AppConfig, site_id: &str) -> Result<(), AppError> {
    if site_id.is_empty() {
        return Err(AppError::Validation("site_id must not be empty".to_string()));
    }

    if site_id.len() > config.max_site_id_len {
        return Err(AppError::Validation(format!(
            "site_id is too long. Maximum allowed is {} characters",
            config.max_site_id_len
        )));
    }

    if !site_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(AppError::Validation(
            "site_id may only contain ASCII letters, digits, '.', '_' and '-'".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_question(config: &AppConfig, question: &str) -> Result<(), AppError> {
    if question.trim().is_empty() {
        return Err(AppError::Validation("question must not be empty".to_string()));
    }

    if question.len() > config.max_question_bytes {
        return Err(AppError::Validation(format!(
            "question is too large. Maximum allowed is {} bytes",
            config.max_question_bytes
        )));
    }

    Ok(())
}

/// Parses an indexing URL and rejects schemes and hosts the fetcher must not reach.
pub fn validate_index_url(config: &AppConfig, raw: &str) -> Result<url::Url, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("url must not be empty".to_string()));
    }

    let url =
        url::Url::parse(trimmed).map_err(|_| AppError::Validation("Invalid URL".to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            warn!(%url, %scheme, "Rejected index URL due to unsupported scheme");
            return Err(AppError::Validation(
                "Unsupported URL scheme for indexing".to_string(),
            ));
        }
    }

    if url.host().is_none() {
        warn!(%url, "Rejected index URL missing host");
        return Err(AppError::Validation(
            "URL is missing a host component".to_string(),
        ));
    }

    if !config.allow_private_hosts && is_restricted_host(&url) {
        warn!(%url, "Rejected index URL pointing to restricted host");
        return Err(AppError::Validation(
            "Index URL host is not allowed".to_string(),
        ));
    }

    Ok(url)
}

/// True when `url` targets localhost or a loopback, private, link-local,
/// unspecified or multicast address. IPv4-mapped IPv6 addresses are checked
/// as the IPv4 address they carry.
pub fn is_restricted_host(url: &url::Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.');
            domain.eq_ignore_ascii_case("localhost")
                || domain.to_ascii_lowercase().ends_with(".localhost")
        }
        Some(Host::Ipv4(v4)) => is_restricted_v4(v4),
        Some(Host::Ipv6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => is_restricted_v4(v4),
            None => is_restricted_v6(v6),
        },
        None => true,
    }
}

fn is_restricted_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_multicast()
        || ip.is_broadcast()
}

fn is_restricted_v6(ip: Ipv6Addr) -> bool {
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        || ip.is_unique_local()
        || ip.is_unicast_link_local()
}
