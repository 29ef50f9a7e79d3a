//! Field extraction from raw feed items.
//!
//! A feed arrives already decomposed into item records; this module pulls
//! out the price, the address candidate and the UTC timestamp, and strips
//! the HTML out of descriptions. Every failure here is a per-item skip.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Primary address pattern: a map link carrying an explicit `loc:` query.
static RE_MAP_LOC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"maps\.google\.com/\?q=loc%3A([^"]+)""#).unwrap());

/// Fallback address pattern: the `Location:` line some feeds embed before a
/// list item.
static RE_ALT_LOC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-->Location: (.+?)\s*<li>").unwrap());

static RE_PRICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$(\d+)").unwrap());

static RE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<br[^>]*>").unwrap());
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?\w[^>]*?>").unwrap());
static RE_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#\d+;").unwrap());

/// One decomposed feed item, as delivered by a `FeedSource`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawItem {
    pub title: String,
    /// HTML-bearing description.
    pub description: String,
    pub link: String,
    /// RFC 3339 date-time with an explicit UTC offset.
    pub published: String,
}

/// An address extracted from an item description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressCandidate {
    pub text: String,
    /// True when the primary (map link) pattern matched.
    pub precise: bool,
}

#[derive(Debug, Clone)]
pub struct ParsedItem {
    pub title: String,
    pub price: u32,
    /// Tags stripped, line breaks normalized.
    pub description: String,
    pub link: String,
    pub created: DateTime<Utc>,
    pub address: AddressCandidate,
}

/// Per-item parse failures. All are non-retryable skips, surfaced only as
/// diagnostic counts.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("no dollar amount in title")]
    MissingPrice,

    #[error("no address pattern in description")]
    MissingAddress,

    #[error("malformed date: {0}")]
    BadDate(String),
}

pub fn parse_item(raw: &RawItem) -> Result<ParsedItem, ParseError> {
    let created = parse_feed_date(&raw.published)?;
    let price = max_price(&raw.title).ok_or(ParseError::MissingPrice)?;
    let address = extract_address(&raw.description).ok_or(ParseError::MissingAddress)?;

    Ok(ParsedItem {
        title: raw.title.clone(),
        price,
        description: strip_tags(&raw.description),
        link: raw.link.clone(),
        created,
        address,
    })
}

/// The maximum of all dollar amounts in a title, or None when there is none.
pub fn max_price(title: &str) -> Option<u32> {
    RE_PRICE
        .captures_iter(title)
        .filter_map(|c| c[1].parse::<u32>().ok())
        .max()
}

/// UTC timestamp from an RFC 3339 date-time with an explicit offset.
pub fn parse_feed_date(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ParseError::BadDate(raw.to_string()))
}

/// The more accurate map-link position is always preferred over the
/// fallback `Location:` line.
pub fn extract_address(description: &str) -> Option<AddressCandidate> {
    if let Some(captures) = RE_MAP_LOC.captures(description) {
        return Some(AddressCandidate {
            text: decode_address(&captures[1]),
            precise: true,
        });
    }
    RE_ALT_LOC.captures(description).map(|captures| AddressCandidate {
        text: captures[1].trim().to_string(),
        precise: false,
    })
}

/// Decode a `+`- and percent-escaped address from a map link query.
fn decode_address(escaped: &str) -> String {
    let spaced = escaped.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Strip HTML tags and normalize line breaks to a single `<br />` form.
pub fn strip_tags(html: &str) -> String {
    let flat = html.replace('\n', "");
    let with_breaks = RE_BREAK.replace_all(&flat, "\n");
    let no_tags = RE_TAG.replace_all(&with_breaks, "");
    let no_entities = RE_ENTITY.replace_all(&no_tags, " ");
    no_entities.trim().replace('\n', "<br />")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, description: &str, published: &str) -> RawItem {
        RawItem {
            title: title.to_string(),
            description: description.to_string(),
            link: "https://ads.example/123.html".to_string(),
            published: published.to_string(),
        }
    }

    const MAP_DESC: &str = r#"Sunny room.<br/> <a href="http://maps.google.com/?q=loc%3A123+Main+St">google map</a>"#;

    #[test]
    fn parses_price_and_precise_address() {
        let parsed = parse_item(&item(
            "Nice room $500 near campus",
            MAP_DESC,
            "2026-08-01T09:30:00-05:00",
        ))
        .unwrap();

        assert_eq!(parsed.price, 500);
        assert_eq!(parsed.address.text, "123 Main St");
        assert!(parsed.address.precise);
    }

    #[test]
    fn price_is_maximum_of_all_amounts() {
        assert_eq!(max_price("$450 now, was $600, deposit $200"), Some(600));
    }

    #[test]
    fn missing_price_rejects_item() {
        let err = parse_item(&item("Nice room near campus", MAP_DESC, "2026-08-01T09:30:00-05:00"))
            .unwrap_err();
        assert_eq!(err, ParseError::MissingPrice);
    }

    #[test]
    fn fallback_address_is_imprecise() {
        let desc = "Cozy place<!-- -->Location: Dinkytown <li>pets ok";
        let address = extract_address(desc).unwrap();
        assert_eq!(address.text, "Dinkytown");
        assert!(!address.precise);
    }

    #[test]
    fn map_link_wins_over_fallback_line() {
        let desc = format!("{MAP_DESC}<!-- -->Location: Somewhere Else <li>");
        let address = extract_address(&desc).unwrap();
        assert_eq!(address.text, "123 Main St");
        assert!(address.precise);
    }

    #[test]
    fn missing_address_rejects_item() {
        let err = parse_item(&item(
            "Nice room $500",
            "No location markers here",
            "2026-08-01T09:30:00-05:00",
        ))
        .unwrap_err();
        assert_eq!(err, ParseError::MissingAddress);
    }

    #[test]
    fn date_is_offset_adjusted_to_utc() {
        let created = parse_feed_date("2026-08-01T09:30:00-05:00").unwrap();
        assert_eq!(created.to_rfc3339(), "2026-08-01T14:30:00+00:00");
    }

    #[test]
    fn malformed_date_rejects_item() {
        let err = parse_item(&item("Room $500", MAP_DESC, "yesterday at noon")).unwrap_err();
        assert!(matches!(err, ParseError::BadDate(_)));
    }

    #[test]
    fn strip_tags_normalizes_breaks() {
        assert_eq!(strip_tags("Top floor<br>great view"), "Top floor<br />great view");
        assert_eq!(strip_tags("Top floor<br />great view"), "Top floor<br />great view");
    }

    #[test]
    fn strip_tags_removes_markup_and_entities() {
        assert_eq!(strip_tags("<p>hello</p>"), "hello");
        assert_eq!(strip_tags("A&#8217;s place"), "A s place");
        assert_eq!(strip_tags("a\nb"), "ab");
    }

    #[test]
    fn percent_escaped_address_is_decoded() {
        let desc = r#"<a href="http://maps.google.com/?q=loc%3A55%20Elm%20Ave%2C+Minneapolis">map</a>"#;
        let address = extract_address(desc).unwrap();
        assert_eq!(address.text, "55 Elm Ave, Minneapolis");
    }
}
