//! Maps raw RSS and Atom documents onto one canonical feed shape.
//!
//! The document dialect is sniffed from its structure, never from HTTP
//! headers. Every field accessor degrades to an empty string or `None`, so a
//! sparse or sloppy feed still yields entries; only a document that is
//! neither a channel nor an Atom feed is rejected.

use super::error::IngestError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Naive layouts seen in the wild, interpreted as UTC.
const NAIVE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).expect("valid img regex")
});

static ATOM_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<((?:[\w.-]+:)?(?:published|updated))(\s[^>/]*)?>(.*?)</((?:[\w.-]+:)?(?:published|updated))\s*>",
    )
    .expect("valid atom date regex")
});

/// A parsed document, tagged by the dialect it was recognized as.
pub enum FeedDocument {
    Rss(Box<rss::Channel>),
    Atom(Box<atom_syndication::Feed>),
    Unrecognized(String),
}

impl FeedDocument {
    /// Channel-style roots win; entry-style (`<feed>`) roots are tried next.
    pub fn sniff(bytes: &[u8]) -> Self {
        let bytes = strip_preamble(bytes);

        let rss_error = match rss::Channel::read_from(bytes) {
            Ok(channel) => return FeedDocument::Rss(Box::new(channel)),
            Err(e) => e,
        };

        let atom = match std::str::from_utf8(bytes) {
            Ok(document) => {
                atom_syndication::Feed::read_from(normalize_atom_dates(document).as_bytes())
            }
            Err(_) => atom_syndication::Feed::read_from(bytes),
        };

        match atom {
            Ok(feed) => FeedDocument::Atom(Box::new(feed)),
            Err(atom_error) => FeedDocument::Unrecognized(format!(
                "not an RSS channel ({}) nor an Atom feed ({})",
                rss_error, atom_error
            )),
        }
    }

    pub fn into_normalized(self) -> Result<NormalizedFeed, IngestError> {
        match self {
            FeedDocument::Rss(channel) => Ok(map_rss_channel(&channel)),
            FeedDocument::Atom(feed) => Ok(map_atom_feed(&feed)),
            FeedDocument::Unrecognized(reason) => Err(IngestError::UnsupportedFormat(reason)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedFeed {
    pub title: String,
    pub description: String,
    pub link: String,
    pub entries: Vec<NormalizedEntry>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedEntry {
    pub title: String,
    pub link: String,
    pub description: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// Dedup key within a source. Explicit identifier, else the link.
    pub guid: String,
    pub content: String,
    pub thumbnail: Option<String>,
}

/// Parse raw feed bytes into a [`NormalizedFeed`].
pub fn normalize(bytes: &[u8]) -> Result<NormalizedFeed, IngestError> {
    FeedDocument::sniff(bytes).into_normalized()
}

/// Permissive date parsing. Anything unrecognized is `None`.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    // "UTC" is common but not a valid RFC 2822 zone
    if let Some(stripped) = value.strip_suffix(" UTC") {
        if let Ok(dt) = DateTime::parse_from_rfc2822(&format!("{} +0000", stripped)) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    NAIVE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn map_rss_channel(channel: &rss::Channel) -> NormalizedFeed {
    NormalizedFeed {
        title: text(Some(channel.title())),
        description: text(Some(channel.description())),
        link: text(Some(channel.link())),
        entries: channel.items().iter().filter_map(map_rss_item).collect(),
    }
}

fn map_rss_item(item: &rss::Item) -> Option<NormalizedEntry> {
    let dublin_core = item.dublin_core_ext();
    let link = text(item.link());
    let description = text(item.description());

    let author = optional_text(item.author())
        .or_else(|| {
            dublin_core.and_then(|dc| optional_text(dc.creators().first().map(String::as_str)))
        })
        .or_else(|| optional_text(rss_extension_value(item, "dc", "creator")));

    let published_at = item
        .pub_date()
        .and_then(parse_date)
        .or_else(|| {
            dublin_core
                .and_then(|dc| dc.dates().first())
                .and_then(|date| parse_date(date))
        })
        .or_else(|| rss_extension_value(item, "dc", "date").and_then(parse_date));

    let guid = first_non_empty([item.guid().map(|guid| guid.value()), Some(link.as_str())]);
    let content = first_non_empty([
        item.content(),
        rss_extension_value(item, "content", "encoded"),
        Some(description.as_str()),
    ]);

    let thumbnail = rss_thumbnail(item)
        .or_else(|| image_in_html(&content))
        .or_else(|| image_in_html(&description));

    accept(NormalizedEntry {
        title: text(item.title()),
        link,
        description,
        author,
        published_at,
        guid,
        content,
        thumbnail,
    })
}

fn rss_extension_value<'a>(item: &'a rss::Item, prefix: &str, name: &str) -> Option<&'a str> {
    item.extensions()
        .get(prefix)
        .and_then(|elements| elements.get(name))
        .and_then(|values| values.first())
        .and_then(|extension| extension.value())
}

fn rss_thumbnail(item: &rss::Item) -> Option<String> {
    if let Some(enclosure) = item.enclosure() {
        if enclosure.mime_type().starts_with("image/") {
            if let Some(url) = optional_text(Some(enclosure.url())) {
                return Some(url);
            }
        }
    }

    let media = item.extensions().get("media")?;
    media_thumbnail(
        media.get("thumbnail").into_iter().flatten().map(|ext| ext.attrs()),
        media.get("content").into_iter().flatten().map(|ext| ext.attrs()),
    )
}

fn map_atom_feed(feed: &atom_syndication::Feed) -> NormalizedFeed {
    NormalizedFeed {
        title: text(Some(feed.title().value.as_str())),
        description: text(feed.subtitle().map(|subtitle| subtitle.value.as_str())),
        link: atom_link(feed.links()),
        entries: feed.entries().iter().filter_map(map_atom_entry).collect(),
    }
}

fn map_atom_entry(entry: &atom_syndication::Entry) -> Option<NormalizedEntry> {
    let link = atom_link(entry.links());
    let summary = entry.summary().map(|summary| summary.value.as_str());
    let body = entry.content().and_then(|content| content.value());

    let published_at = entry
        .published()
        .map(to_utc)
        .or_else(|| Some(entry.updated()).filter(|updated| updated.timestamp() != 0).map(to_utc));

    let author = entry
        .authors()
        .first()
        .and_then(|person| optional_text(Some(person.name())));

    let content = first_non_empty([body, summary]);
    let thumbnail = atom_thumbnail(entry)
        .or_else(|| image_in_html(&content));

    accept(NormalizedEntry {
        title: text(Some(entry.title().value.as_str())),
        description: first_non_empty([summary, body]),
        guid: first_non_empty([Some(entry.id()), Some(link.as_str())]),
        link,
        author,
        published_at,
        content,
        thumbnail,
    })
}

fn atom_link(links: &[atom_syndication::Link]) -> String {
    links
        .iter()
        .find(|link| link.rel() == "alternate")
        .or_else(|| links.first())
        .map(|link| link.href().trim().to_string())
        .unwrap_or_default()
}

fn atom_thumbnail(entry: &atom_syndication::Entry) -> Option<String> {
    let enclosure = entry.links().iter().find(|link| {
        link.rel() == "enclosure"
            && link
                .mime_type()
                .map(|mime| mime.starts_with("image/"))
                .unwrap_or(false)
    });
    if let Some(url) = enclosure.and_then(|link| optional_text(Some(link.href()))) {
        return Some(url);
    }

    let media = entry.extensions().get("media")?;
    media_thumbnail(
        media.get("thumbnail").into_iter().flatten().map(|ext| ext.attrs()),
        media.get("content").into_iter().flatten().map(|ext| ext.attrs()),
    )
}

fn media_thumbnail<'a>(
    thumbnails: impl Iterator<Item = &'a BTreeMap<String, String>>,
    contents: impl Iterator<Item = &'a BTreeMap<String, String>>,
) -> Option<String> {
    let images = contents.filter(|attrs| {
        attrs
            .get("medium")
            .map(|medium| medium == "image")
            .or_else(|| attrs.get("type").map(|mime| mime.starts_with("image/")))
            .unwrap_or(false)
    });

    thumbnails
        .chain(images)
        .find_map(|attrs| optional_text(attrs.get("url").map(String::as_str)))
}

fn image_in_html(html: &str) -> Option<String> {
    IMG_SRC
        .captures(html)
        .and_then(|captures| captures.get(1))
        .and_then(|src| optional_text(Some(src.as_str())))
}

/// An entry with no identifier and no link cannot be deduplicated.
fn accept(entry: NormalizedEntry) -> Option<NormalizedEntry> {
    if entry.guid.is_empty() {
        tracing::debug!(title = %entry.title, "Dropping feed entry without guid or link");
        return None;
    }
    Some(entry)
}

fn to_utc(value: &DateTime<FixedOffset>) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

fn text(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn first_non_empty<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> String {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// The Atom reader only accepts RFC 3339 and fails the whole document on
/// anything else. Date elements are rewritten to RFC 3339 when `parse_date`
/// understands them and removed when it does not.
fn normalize_atom_dates(document: &str) -> Cow<'_, str> {
    ATOM_DATE.replace_all(document, |caps: &Captures| {
        if caps[1] != caps[4] {
            return caps[0].to_string();
        }

        let raw = caps[3].trim();
        let raw = raw
            .strip_prefix("<![CDATA[")
            .and_then(|inner| inner.strip_suffix("]]>"))
            .unwrap_or(raw);

        match parse_date(raw) {
            Some(date) => format!(
                "<{tag}{attrs}>{date}</{tag}>",
                tag = &caps[1],
                attrs = caps.get(2).map_or("", |m| m.as_str()),
                date = date.to_rfc3339()
            ),
            None => String::new(),
        }
    })
}

fn strip_preamble(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}
