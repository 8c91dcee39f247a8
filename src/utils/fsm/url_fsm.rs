use std::{
    collections::{HashMap, HashSet},
    io::ErrorKind,
    sync::OnceLock,
};

use crate::{
    types::{error::AppError, structs::page::DiscoveredLink, traits::object_store::AsyncReadSeek},
    utils::fsm::stream_reader::StreamReader,
};

// Anchor text beyond this is dropped
const MAX_ANCHOR_CHARS: usize = 512;

#[derive(PartialEq, Eq)]
enum ParseState {
    ReadNewChar,
    ReadHtmlTag,
    ReadLink,
    Terminate,
}

static FOLLOWS_HTTP: OnceLock<HashSet<char>> = OnceLock::new();
fn follows_http() -> &'static HashSet<char> {
    FOLLOWS_HTTP.get_or_init(|| ['s', ':'].into_iter().collect())
}

static LEGAL_URL_CHARS: OnceLock<HashSet<char>> = OnceLock::new();
fn legal_url_chars() -> &'static HashSet<char> {
    LEGAL_URL_CHARS.get_or_init(|| {
        ('A'..='Z')
            .chain('a'..='z')
            .chain('0'..='9')
            .chain([
                '-', '.', '_', '~', ':', '/', '?', '#', '[', ']', '@', '!', '$', '%', '&', '(',
                ')', '*', '+', ',', ';', '=',
            ])
            .collect()
    })
}

static HREF: OnceLock<Vec<char>> = OnceLock::new();
fn href() -> &'static [char] {
    HREF.get_or_init(|| vec!['h', 'r', 'e', 'f', '='])
}

static TAG_QUOTES: OnceLock<HashSet<char>> = OnceLock::new();
fn tag_quotes() -> &'static HashSet<char> {
    TAG_QUOTES.get_or_init(|| ['"', '\''].into_iter().collect())
}

static ANCHOR_TAG: OnceLock<HashSet<char>> = OnceLock::new();
fn anchor_tag() -> &'static HashSet<char> {
    ANCHOR_TAG.get_or_init(|| ['a', 'A'].into_iter().collect())
}

static TAG_SPACE: OnceLock<HashSet<char>> = OnceLock::new();
fn tag_space() -> &'static HashSet<char> {
    TAG_SPACE.get_or_init(|| [' ', '\t', '\n', '\r'].into_iter().collect())
}

/// Streams through an html document collecting `<a href>` targets together
/// with the text between the anchor tags. With `include_bare_urls` it also
/// picks up http(s) URLs written out in plain text.
pub struct LinkExtractorFSM {
    reader: StreamReader,
    state: ParseState,
    include_bare_urls: bool,
    links: Vec<DiscoveredLink>,
}

impl LinkExtractorFSM {
    pub fn new(buf: Box<dyn AsyncReadSeek + Send + Unpin>, include_bare_urls: bool) -> Self {
        Self {
            reader: StreamReader::new(buf),
            state: ParseState::ReadNewChar,
            include_bare_urls,
            links: vec![],
        }
    }

    /// Runs the machine to the end of the stream. Links come back in document
    /// order, once per href, keeping the first non-empty anchor text seen.
    pub async fn perform(mut self) -> Result<Vec<DiscoveredLink>, AppError> {
        while self.state != ParseState::Terminate {
            match self.next().await {
                Ok(_) => continue,
                Err(AppError::IOError(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    self.state = ParseState::Terminate;
                }
                Err(e) => return Err(e),
            }
        }

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut links: Vec<DiscoveredLink> = vec![];

        for link in self.links {
            match index.get(&link.href) {
                Some(&i) => {
                    if links[i].anchor_text.is_none() {
                        links[i].anchor_text = link.anchor_text;
                    }
                }
                None => {
                    index.insert(link.href.clone(), links.len());
                    links.push(link);
                }
            }
        }

        Ok(links)
    }

    async fn next(&mut self) -> Result<(), AppError> {
        match self.state {
            ParseState::ReadNewChar => self.read_new_char().await,
            ParseState::ReadHtmlTag => {
                self.state = ParseState::ReadNewChar;
                self.read_html_tag().await
            }
            ParseState::ReadLink => {
                self.state = ParseState::ReadNewChar;
                self.read_link().await
            }
            ParseState::Terminate => Ok(()),
        }
    }

    async fn read_new_char(&mut self) -> Result<(), AppError> {
        loop {
            match self.reader.read_char().await? {
                'h' if self.include_bare_urls => {
                    self.state = ParseState::ReadLink;
                    break;
                }
                '<' => {
                    self.state = ParseState::ReadHtmlTag;
                    break;
                }
                _ => continue,
            }
        }
        Ok(())
    }

    async fn read_link(&mut self) -> Result<(), AppError> {
        let mut data = String::from("http");

        if !self.reader.match_next(&['t', 't', 'p'], true).await? {
            return Ok(());
        }

        match self.reader.match_next_or(follows_http(), true).await? {
            Some('s') => {
                if !self.reader.match_next(&[':'], true).await? {
                    return Ok(());
                }
                data.push_str("s:");
            }
            Some(_) => data.push(':'),
            None => return Ok(()),
        }

        if !self.reader.match_next(&['/', '/'], true).await? {
            return Ok(());
        }
        data.push_str("//");

        let rest = self.reader.get_until_mismatch(legal_url_chars()).await?;

        if !rest.is_empty() {
            data.push_str(&rest);
            self.links.push(DiscoveredLink::new(data, None));
        }

        Ok(())
    }

    async fn read_html_tag(&mut self) -> Result<(), AppError> {
        if self.reader.match_next_or(anchor_tag(), true).await?.is_none()
            || self.reader.match_next_or(tag_space(), true).await?.is_none()
        {
            return Ok(());
        }

        if !self.reader.read_until_match(href(), '>', true).await? {
            return Ok(());
        }

        let quote = match self.reader.match_next_or(tag_quotes(), true).await? {
            Some(quote) => quote,
            None => return Ok(()),
        };

        let (target, closed) = self.reader.read_until(quote, usize::MAX).await?;
        let target = target.trim().replace("&amp;", "&");

        if !closed || target.is_empty() {
            return Ok(());
        }

        self.links.push(DiscoveredLink::new(target, None));

        if !self.reader.skip_until('>').await? {
            return Ok(());
        }

        let text = self.read_anchor_text().await?;

        if let Some(link) = self.links.last_mut().filter(|_| !text.is_empty()) {
            link.anchor_text = Some(text);
        }

        Ok(())
    }

    // Text up to the closing </a>, with nested tags stripped. An anchor that
    // is never closed ends where the next one starts.
    async fn read_anchor_text(&mut self) -> Result<String, AppError> {
        let mut text = String::new();

        loop {
            let remaining = MAX_ANCHOR_CHARS.saturating_sub(text.chars().count());
            let (segment, open_tag) = self.reader.read_until('<', remaining).await?;
            text.push_str(&segment);
            text.push(' ');

            if !open_tag {
                break;
            }

            if self.reader.match_next(&['/', 'a', '>'], true).await?
                || self.reader.match_next(&['/', 'A', '>'], true).await?
            {
                break;
            }

            let position = self.reader.position().await?;
            if self.reader.match_next_or(anchor_tag(), false).await?.is_some()
                && self.reader.match_next_or(tag_space(), false).await?.is_some()
            {
                self.reader.set_position(position).await?;
                self.state = ParseState::ReadHtmlTag;
                break;
            }
            self.reader.set_position(position).await?;

            if !self.reader.skip_until('>').await? {
                break;
            }
        }

        Ok(decode_entities(&text.split_whitespace().collect::<Vec<_>>().join(" ")))
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
