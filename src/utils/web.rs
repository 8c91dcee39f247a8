use url::Url;

use crate::types::error::AppError;

pub fn get_user_agent(user_agent: Option<String>) -> String {
    if let Some(user_agent) = user_agent {
        user_agent
    } else {
        format!("{} - {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}

// Resolves `href` against `origin`. Bare host names such as "example.com" are
// treated as absolute http links rather than relative paths.
pub fn normalize_url(origin: &Url, href: &str) -> Result<Url, AppError> {
    let href = href.trim();

    if let Ok(url) = Url::parse(href) {
        return Ok(url);
    }

    if looks_like_host(href) {
        return Ok(Url::parse(&format!("http://{}", href))?);
    }

    Ok(origin.join(href)?)
}

// Canonical form used for link identity.
pub fn canonicalize(mut url: Url) -> Result<Url, AppError> {
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::Generic(format!(
                "unsupported link scheme: {}",
                scheme
            )));
        }
    }

    if url.host_str().is_none() {
        return Err(AppError::Generic(format!("link has no host: {}", url)));
    }

    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    let path = url.path().to_string();

    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Ok(url)
}

const FILE_EXTENSIONS: [&str; 10] = [
    "html", "htm", "php", "asp", "aspx", "jsp", "pdf", "txt", "xml", "json",
];

fn looks_like_host(href: &str) -> bool {
    let head = href.split('/').next().unwrap_or("");

    !href.starts_with('/')
        && !href.starts_with('.')
        && head.contains('.')
        && head
            .rsplit('.')
            .next()
            .map(|tld| {
                tld.len() >= 2
                    && tld.chars().all(|c| c.is_ascii_alphabetic())
                    && !FILE_EXTENSIONS.contains(&tld.to_ascii_lowercase().as_str())
            })
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_relative_and_absolute() {
        let origin = Url::parse("http://example.com/test/").unwrap();

        assert_eq!(
            normalize_url(&origin, "/wiki/Physics").unwrap().as_str(),
            "http://example.com/wiki/Physics"
        );
        assert_eq!(
            normalize_url(&origin, "testme").unwrap().as_str(),
            "http://example.com/test/testme"
        );
        assert_eq!(
            normalize_url(&origin, "testagain.com").unwrap().as_str(),
            "http://testagain.com/"
        );
        assert_eq!(
            normalize_url(&origin, "https://other.org/a").unwrap().as_str(),
            "https://other.org/a"
        );
    }

    #[test]
    fn test_relative_file_is_not_a_host() {
        let origin = Url::parse("http://example.com/docs/").unwrap();

        assert_eq!(
            normalize_url(&origin, "./index.html").unwrap().as_str(),
            "http://example.com/docs/index.html"
        );
    }

    #[test]
    fn test_file_names_stay_relative() {
        let origin = Url::parse("http://example.com/docs/").unwrap();

        assert_eq!(
            normalize_url(&origin, "index.html").unwrap().as_str(),
            "http://example.com/docs/index.html"
        );
    }

    #[test]
    fn test_canonicalize_rejects_other_schemes() {
        let url = Url::parse("mailto:someone@example.com").unwrap();

        assert!(canonicalize(url).is_err());
    }

    #[test]
    fn test_canonicalize_strips_fragment_and_trailing_slash() {
        let url = Url::parse("HTTP://Example.COM:80/wiki/Albert_Einstein/#Early_life").unwrap();

        assert_eq!(
            canonicalize(url).unwrap().as_str(),
            "http://example.com/wiki/Albert_Einstein"
        );
    }
}
