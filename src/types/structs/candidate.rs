use serde::Serialize;

use crate::types::structs::link::Link;

/// A link waiting in the frontier together with what was known when it was
/// discovered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub link: Link,
    // Text between the <a> tags that pointed at the link, if any
    pub anchor_text: Option<String>,
    // Hops from the seed
    pub depth: u32,
    // Ordering hint for the priority frontier, higher first
    pub priority: f64,
}

impl Candidate {
    pub fn seed(link: Link) -> Self {
        Self {
            link,
            anchor_text: None,
            depth: 0,
            priority: 1.0,
        }
    }

    pub fn discovered(link: Link, anchor_text: Option<String>, depth: u32, priority: f64) -> Self {
        let anchor_text = anchor_text
            .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|text| !text.is_empty());

        Self {
            link,
            anchor_text,
            depth,
            priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_text_is_collapsed() {
        let link = Link::parse("https://en.wikipedia.org/wiki/Physics").unwrap();
        let candidate =
            Candidate::discovered(link.clone(), Some("  theoretical\n   physics ".into()), 2, 0.5);

        assert_eq!(candidate.anchor_text.as_deref(), Some("theoretical physics"));

        let blank = Candidate::discovered(link, Some(" \n ".into()), 2, 0.5);

        assert_eq!(blank.anchor_text, None);
    }
}
