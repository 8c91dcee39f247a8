use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};
use url::Url;

use crate::{
    types::error::AppError,
    utils::web::{canonicalize, normalize_url},
};

/// Canonical identity of a crawl candidate.
///
/// Two textually different URIs that denote the same resource (host case,
/// default port, fragment, trailing slash) produce equal links.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link(Url);

impl Link {
    pub fn parse(uri: &str) -> Result<Self, AppError> {
        Ok(Self(canonicalize(Url::parse(uri.trim())?)?))
    }

    /// Resolves a possibly relative `href` against the URL a page was served
    /// from. The base is the raw URL, since canonical links lose the trailing
    /// slash that marks a directory.
    pub fn resolve(base: &Url, href: &str) -> Result<Self, AppError> {
        Ok(Self(canonicalize(normalize_url(base, href)?)?))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or("")
    }

    // Human readable key of the resource: the last path segment, percent
    // decoded, with underscores read as spaces ("Albert_Einstein" -> "Albert Einstein").
    pub fn title(&self) -> String {
        let segment = self
            .0
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .unwrap_or("");

        let decoded = urlencoding::decode(segment)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| segment.to_string());

        decoded.replace('_', " ")
    }
}

impl FromStr for Link {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Link::parse(s)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalent_uris_collapse() {
        let variants = [
            "https://en.wikipedia.org/wiki/Albert_Einstein",
            "https://en.wikipedia.org/wiki/Albert_Einstein/",
            "https://EN.Wikipedia.ORG/wiki/Albert_Einstein",
            "HTTPS://en.wikipedia.org:443/wiki/Albert_Einstein#Personal_life",
            "  https://en.wikipedia.org/wiki/Albert_Einstein?  ",
        ];

        let canonical = Link::parse(variants[0]).unwrap();

        for variant in variants {
            assert_eq!(Link::parse(variant).unwrap(), canonical, "{}", variant);
        }
    }

    #[test]
    fn test_path_case_is_significant() {
        let a = Link::parse("https://en.wikipedia.org/wiki/Physics").unwrap();
        let b = Link::parse("https://en.wikipedia.org/wiki/physics").unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_resolve_relative_href() {
        let base = Url::parse("https://en.wikipedia.org/wiki/Albert_Einstein").unwrap();
        let link = Link::resolve(&base, "/wiki/Special_relativity#History").unwrap();

        assert_eq!(
            link.as_str(),
            "https://en.wikipedia.org/wiki/Special_relativity"
        );
    }

    #[test]
    fn test_resolve_rejects_non_http() {
        let base = Url::parse("https://en.wikipedia.org/wiki/Albert_Einstein").unwrap();

        assert!(Link::resolve(&base, "javascript:void(0)").is_err());
        assert!(Link::resolve(&base, "mailto:info@wikipedia.org").is_err());
    }

    #[test]
    fn test_resolve_keeps_directory_of_base() {
        let base = Url::parse("http://example.com/docs/").unwrap();
        let link = Link::resolve(&base, "intro.html").unwrap();

        assert_eq!(link.as_str(), "http://example.com/docs/intro.html");
        assert_eq!(Link::parse(base.as_str()).unwrap().as_str(), "http://example.com/docs");
    }

    #[test]
    fn test_title() {
        let link = Link::parse("https://en.wikipedia.org/wiki/Mileva_Mari%C4%87/").unwrap();

        assert_eq!(link.title(), "Mileva Marić");
        assert_eq!(
            Link::parse("https://en.wikipedia.org/wiki/Help:Contents")
                .unwrap()
                .title(),
            "Help:Contents"
        );
        assert_eq!(Link::parse("https://example.com").unwrap().title(), "");
    }
}
