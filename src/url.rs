//! Carrier URL handling.
//!
//! Tokens travel as the `t` query parameter of an HTTPS page URL. Token
//! characters are all URL-safe, so no percent-encoding is applied.

use thiserror::Error;

/// Query parameter that carries the token.
pub const TOKEN_PARAM: &str = "t";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("not a valid absolute URL: {0}")]
    Invalid(String),

    #[error("URL must use https: {0}")]
    NotHttps(String),

    #[error("domain not allowed: {0}")]
    DomainNotAllowed(String),
}

struct Parts<'a> {
    scheme: &'a str,
    authority: &'a str,
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

impl<'a> Parts<'a> {
    fn split(url: &'a str) -> Option<Self> {
        let (scheme, rest) = url.split_once("://")?;
        let valid_scheme = scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !valid_scheme {
            return None;
        }

        let (rest, fragment) = match rest.split_once('#') {
            Some((r, f)) => (r, Some(f)),
            None => (rest, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((r, q)) => (r, Some(q)),
            None => (rest, None),
        };
        let (authority, path) = match rest.find('/') {
            Some(i) => rest.split_at(i),
            None => (rest, ""),
        };

        Some(Self {
            scheme,
            authority,
            path,
            query,
            fragment,
        })
    }

    /// Host without userinfo or port, lowercased.
    fn host(&self) -> String {
        let host_port = match self.authority.rsplit_once('@') {
            Some((_, hp)) => hp,
            None => self.authority,
        };

        let host = if let Some(v6) = host_port.strip_prefix('[') {
            v6.split(']').next().unwrap_or_default()
        } else {
            host_port.split(':').next().unwrap_or_default()
        };

        host.to_ascii_lowercase()
    }
}

/// Returns `true` if `url` is absolute, uses `https` and names a host.
pub fn is_https_url(url: &str) -> bool {
    Parts::split(url)
        .is_some_and(|p| p.scheme.eq_ignore_ascii_case("https") && !p.host().is_empty())
}

/// Returns `true` if the host of `url` is one of `allowed` or a subdomain
/// of one of them. Comparison ignores case.
pub fn is_allowed_domain<I, S>(url: &str, allowed: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let Some(host) = Parts::split(url).map(|p| p.host()) else {
        return false;
    };
    if host.is_empty() {
        return false;
    }

    allowed.into_iter().any(|d| {
        let d = d.as_ref().trim().to_ascii_lowercase();
        !d.is_empty() && (host == d || host.ends_with(&format!(".{d}")))
    })
}

/// Checks that `url` is HTTPS and on an allowed domain.
pub fn validate_page_url<I, S>(url: &str, allowed: I) -> Result<(), UrlError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if Parts::split(url).is_none() {
        return Err(UrlError::Invalid(url.to_string()));
    }
    if !is_https_url(url) {
        return Err(UrlError::NotHttps(url.to_string()));
    }
    if !is_allowed_domain(url, allowed) {
        return Err(UrlError::DomainNotAllowed(url.to_string()));
    }
    Ok(())
}

/// Sets the `t` query parameter of `page_url` to `token`.
///
/// An existing `t` parameter is replaced; other parameters and the fragment
/// are kept as they are.
pub fn build_url(page_url: &str, token: &str) -> Result<String, UrlError> {
    let parts = Parts::split(page_url).ok_or_else(|| UrlError::Invalid(page_url.to_string()))?;

    let token_pair = format!("{TOKEN_PARAM}={token}");
    let mut query: Vec<&str> = parts
        .query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty() && param_name(pair) != TOKEN_PARAM)
        .collect();
    query.push(&token_pair);

    let mut url = format!(
        "{}://{}{}?{}",
        parts.scheme,
        parts.authority,
        parts.path,
        query.join("&")
    );
    if let Some(fragment) = parts.fragment {
        url.push('#');
        url.push_str(fragment);
    }
    Ok(url)
}

/// Returns the value of the `t` query parameter, if present and non-empty.
pub fn token_from_url(url: &str) -> Option<&str> {
    Parts::split(url)?
        .query?
        .split('&')
        .filter(|pair| param_name(pair) == TOKEN_PARAM)
        .filter_map(|pair| pair.split_once('=').map(|(_, v)| v))
        .find(|v| !v.is_empty())
}

fn param_name(pair: &str) -> &str {
    pair.split_once('=').map_or(pair, |(k, _)| k)
}
