//! Game identifiers from an HTML day listing
//!
//! Day directories are served as plain index pages with one anchor per
//! entry. Anchors whose target's last path segment starts with `gid_` name a
//! game; everything else (parent links, scoreboards, media) is ignored.
//! The tokenizer runs in lenient mode so unclosed tags like `<br>` or `<hr>`
//! do not abort the page.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashSet;
use tokio::io::AsyncBufRead;
use tracing::warn;

use super::DecodeError;
use crate::resolver::{GameId, GAME_ID_PREFIX};

/// Pull reader yielding each distinct game id of a listing once.
pub struct ListingReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    seen: HashSet<GameId>,
    finished: bool,
}

impl<R: AsyncBufRead + Unpin> ListingReader<R> {
    /// Wrap a buffered byte source.
    pub fn new(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.trim_text(true);

        Self {
            reader,
            buf: Vec::new(),
            seen: HashSet::new(),
            finished: false,
        }
    }

    /// Next unseen game id, `Ok(None)` at the end of the page.
    pub async fn next_game_id(&mut self) -> Result<Option<GameId>, DecodeError> {
        while !self.finished {
            self.buf.clear();
            let event = match self.reader.read_event_into_async(&mut self.buf).await {
                Ok(event) => event,
                Err(e) => {
                    self.finished = true;
                    return Err(e.into());
                }
            };

            let candidate = match event {
                Event::Start(ref e) | Event::Empty(ref e) => anchor_target(e),
                Event::Eof => {
                    self.finished = true;
                    None
                }
                _ => None,
            };

            let Some(segment) = candidate else { continue };
            match GameId::parse(&segment) {
                Ok(id) => {
                    if self.seen.insert(id.clone()) {
                        return Ok(Some(id));
                    }
                }
                Err(e) => warn!("Skipping listing entry: {}", e),
            }
        }

        Ok(None)
    }

    /// Drain the page into a list, in document order.
    pub async fn collect_ids(mut self) -> Result<Vec<GameId>, DecodeError> {
        let mut ids = Vec::new();
        while let Some(id) = self.next_game_id().await? {
            ids.push(id);
        }
        Ok(ids)
    }
}

/// Last path segment of an anchor's `href` when it looks like a game dir.
fn anchor_target(element: &BytesStart<'_>) -> Option<String> {
    if !element.name().as_ref().eq_ignore_ascii_case(b"a") {
        return None;
    }

    for attr in element.html_attributes().flatten() {
        if !attr.key.as_ref().eq_ignore_ascii_case(b"href") {
            continue;
        }
        let href = attr.unescape_value().ok()?;
        let segment = href
            .trim()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        return segment.starts_with(GAME_ID_PREFIX).then_some(segment);
    }

    None
}
