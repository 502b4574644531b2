//! Streaming extractors
//!
//! All extractors are pull readers over an [`AsyncBufRead`](tokio::io::AsyncBufRead)
//! built on `quick-xml`'s async tokenizer, so a document is converted while
//! it is still downloading:
//!
//! - [`listing::ListingReader`] - game identifiers from an HTML day listing
//! - [`scoreboard::ScoreboardReader`] - one typed game per `<game>` element of
//!   `master_scoreboard.xml`
//! - [`game::GameDocument`] - venue and teams from a game's `game.xml`
//!
//! A malformed game is reported as a recoverable [`DecodeError`] and the
//! reader moves on to the next one; a syntax error ends the document.

pub mod game;
pub mod listing;
pub mod scoreboard;

#[cfg(test)]
pub(crate) const SCOREBOARD_FIXTURE: &str = include_str!(
    "../../tests/fixtures/components/game/mlb/year_2017/month_05/day_29/master_scoreboard.xml"
);

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use quick_xml::events::BytesStart;
use std::collections::HashMap;

/// Extraction errors
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Tokenizer failure; the rest of the document is skipped
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    /// Unreadable attribute on an element
    #[error("invalid attribute: {0}")]
    Attribute(String),

    /// One game failed validation; extraction continues with the next
    #[error("invalid game {game}: {reason}")]
    InvalidGame {
        /// Game identifier or primary key as found in the document
        game: String,
        /// What was wrong
        reason: String,
    },

    /// A required element never appeared
    #[error("document has no <{0}> element")]
    Missing(&'static str),
}

impl DecodeError {
    /// Whether the reader can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DecodeError::Attribute(_) | DecodeError::InvalidGame { .. })
    }
}

/// Attribute map of one element with typed, validating getters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Attrs(HashMap<String, String>);

impl Attrs {
    /// Collect the XML attributes of `element`.
    pub(crate) fn from_element(element: &BytesStart<'_>) -> Result<Self, DecodeError> {
        let mut map = HashMap::new();
        for attr in element.attributes() {
            let attr = attr.map_err(|e| DecodeError::Attribute(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| DecodeError::Attribute(format!("{}: {}", key, e)))?
                .into_owned();
            map.insert(key, value);
        }
        Ok(Self(map))
    }

    /// Attribute text, empty when absent.
    pub(crate) fn text(&self, key: &str) -> String {
        self.0.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
    }

    /// Required integer attribute.
    pub(crate) fn id(&self, key: &str) -> Result<i64, String> {
        let raw = self.text(key);
        raw.parse::<i64>()
            .map_err(|_| format!("attribute {} is not an integer: {:?}", key, raw))
    }

    /// Lenient count: empty or non-numeric values (`x` in an unplayed
    /// inning) read as zero.
    pub(crate) fn count(&self, key: &str) -> u32 {
        self.text(key).parse::<u32>().unwrap_or(0)
    }

    /// `Y`/`N` switch; absent or empty reads as `false`.
    pub(crate) fn flag(&self, key: &str) -> Result<bool, String> {
        match self.text(key).as_str() {
            "Y" => Ok(true),
            "N" | "" => Ok(false),
            other => Err(format!("attribute {} is not Y/N: {:?}", key, other)),
        }
    }
}

/// Map a gameday time zone abbreviation onto its IANA zone.
pub fn time_zone(abbreviation: &str) -> Option<Tz> {
    match abbreviation.trim() {
        "ET" => Some(chrono_tz::America::New_York),
        "CT" => Some(chrono_tz::America::Chicago),
        "MT" => Some(chrono_tz::America::Denver),
        "MST" => Some(chrono_tz::America::Phoenix),
        "PT" => Some(chrono_tz::America::Los_Angeles),
        _ => None,
    }
}

/// Interpret a wall-clock time in `zone` as a UTC instant. Ambiguous times
/// (the repeated hour when DST ends) resolve to the earlier instant.
pub fn localize(naive: NaiveDateTime, zone: Tz) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

/// American or National League name for a league id.
pub fn league_name(id: i64) -> Option<&'static str> {
    match id {
        103 => Some("American League"),
        104 => Some("National League"),
        _ => None,
    }
}

/// Division name for an E/C/W code.
pub fn division_name(code: &str) -> Option<&'static str> {
    match code {
        "E" => Some("East"),
        "C" => Some("Central"),
        "W" => Some("West"),
        _ => None,
    }
}
