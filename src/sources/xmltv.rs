//! XMLTV EPG ingestion
//!
//! Streaming quick-xml parser over an XMLTV document. Batches are pulled one
//! at a time from [`EpgBatchStream`], so callers can persist huge guides
//! while holding at most one batch of parsed records in memory. The caller
//! drops each batch before pulling the next.
//!
//! Malformed entries (missing channel id, unparseable records) are dropped
//! with a warning rather than failing the whole document.

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::warn;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{EpgChannelInfo, EpgProgram};
use crate::utils::url::UrlUtils;
use crate::utils::DecompressingHttpClient;

/// One persistence unit of EPG data
#[derive(Debug, Default)]
pub struct EpgBatch {
    pub programs: Vec<EpgProgram>,
    pub channel_infos: Vec<EpgChannelInfo>,
}

impl EpgBatch {
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty() && self.channel_infos.is_empty()
    }

    pub fn len(&self) -> usize {
        self.programs.len() + self.channel_infos.len()
    }
}

/// XMLTV guide ingestor for Xtream panels
pub struct XmltvIngestor<C: DecompressingHttpClient> {
    http_client: C,
    batch_size: usize,
}

impl<C: DecompressingHttpClient> XmltvIngestor<C> {
    pub fn new(http_client: C, batch_size: usize) -> Self {
        Self {
            http_client,
            batch_size: batch_size.max(1),
        }
    }

    /// Fetch the panel's XMLTV guide and return a stream of parsed batches
    pub async fn fetch(
        &self,
        base_url: &str,
        username: &str,
        password: &str,
    ) -> AppResult<EpgBatchStream> {
        let url = UrlUtils::build_xtream_xmltv_url(base_url, username, password);
        let content = self.http_client.fetch_bytes(&url).await?;
        Ok(self.batch_stream(content))
    }

    /// Parse XMLTV content as a stream of batches of at most `batch_size`
    /// records each
    pub fn batch_stream(&self, content: Vec<u8>) -> EpgBatchStream {
        EpgBatchStream::new(content, self.batch_size)
    }
}

/// Pull-based XMLTV parse: each [`EpgBatchStream::next_batch`] call drives
/// the reader just far enough to fill one batch
pub struct EpgBatchStream {
    reader: Reader<Cursor<Vec<u8>>>,
    batch_size: usize,
    buf: Vec<u8>,
    current_program: Option<ProgramInProgress>,
    current_channel: Option<ChannelInProgress>,
    current_text: String,
    dropped: usize,
    finished: bool,
}

impl EpgBatchStream {
    fn new(content: Vec<u8>, batch_size: usize) -> Self {
        let mut reader = Reader::from_reader(Cursor::new(content));
        reader.config_mut().trim_text(true);

        Self {
            reader,
            batch_size,
            buf: Vec::new(),
            current_program: None,
            current_channel: None,
            current_text: String::new(),
            dropped: 0,
            finished: false,
        }
    }

    /// Next batch of parsed records, or `None` once the document is consumed
    pub fn next_batch(&mut self) -> AppResult<Option<EpgBatch>> {
        if self.finished {
            return Ok(None);
        }

        let mut batch = EpgBatch::default();

        while batch.len() < self.batch_size {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(ref e)) => {
                    match e.name().as_ref() {
                        b"programme" => {
                            let attrs = parse_attributes(e);
                            self.current_program = Some(ProgramInProgress {
                                channel: attrs.get("channel").cloned().unwrap_or_default(),
                                start: attrs.get("start").cloned(),
                                stop: attrs.get("stop").cloned(),
                                title: None,
                                description: None,
                            });
                        }
                        b"channel" => {
                            let attrs = parse_attributes(e);
                            self.current_channel = Some(ChannelInProgress {
                                id: attrs.get("id").cloned().unwrap_or_default(),
                                display_name: None,
                                icon_url: None,
                            });
                        }
                        _ => {}
                    }
                    self.current_text.clear();
                }

                Ok(Event::End(ref e)) => {
                    match e.name().as_ref() {
                        b"title" => {
                            if let Some(ref mut program) = self.current_program {
                                if !self.current_text.trim().is_empty() {
                                    program.title =
                                        Some(self.current_text.trim().to_string());
                                }
                            }
                        }
                        b"desc" => {
                            if let Some(ref mut program) = self.current_program {
                                if !self.current_text.trim().is_empty() {
                                    program.description =
                                        Some(self.current_text.trim().to_string());
                                }
                            }
                        }
                        b"display-name" => {
                            if let Some(ref mut channel) = self.current_channel {
                                if channel.display_name.is_none()
                                    && !self.current_text.trim().is_empty()
                                {
                                    channel.display_name =
                                        Some(self.current_text.trim().to_string());
                                }
                            }
                        }
                        b"programme" => {
                            if let Some(in_progress) = self.current_program.take() {
                                match in_progress.finish() {
                                    Some(program) => batch.programs.push(program),
                                    None => self.dropped += 1,
                                }
                            }
                        }
                        b"channel" => {
                            if let Some(in_progress) = self.current_channel.take() {
                                match in_progress.finish() {
                                    Some(channel) => batch.channel_infos.push(channel),
                                    None => self.dropped += 1,
                                }
                            }
                        }
                        _ => {}
                    }
                    self.current_text.clear();
                }

                Ok(Event::Empty(ref e)) => {
                    if e.name().as_ref() == b"icon" {
                        if let Some(ref mut channel) = self.current_channel {
                            let attrs = parse_attributes(e);
                            if let Some(src) = attrs.get("src") {
                                channel.icon_url = Some(src.clone());
                            }
                        }
                    }
                }

                Ok(Event::Text(e)) => {
                    let text = std::str::from_utf8(&e).map_err(|e| {
                        AppError::source_error(format!("Invalid UTF-8 in XMLTV text: {e}"))
                    })?;
                    self.current_text.push_str(text);
                }

                Ok(Event::CData(e)) => {
                    let text = std::str::from_utf8(&e).map_err(|e| {
                        AppError::source_error(format!("Invalid UTF-8 in XMLTV CDATA: {e}"))
                    })?;
                    self.current_text.push_str(text);
                }

                Ok(Event::Eof) => {
                    self.finished = true;
                    if self.dropped > 0 {
                        warn!(
                            "Dropped {} XMLTV entries without a channel id",
                            self.dropped
                        );
                    }
                    break;
                }

                Err(e) => {
                    self.finished = true;
                    return Err(AppError::source_error(format!(
                        "XMLTV parsing error: {e}"
                    )));
                }

                _ => {}
            }
        }

        if batch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(batch))
        }
    }
}

struct ProgramInProgress {
    channel: String,
    start: Option<String>,
    stop: Option<String>,
    title: Option<String>,
    description: Option<String>,
}

impl ProgramInProgress {
    fn finish(self) -> Option<EpgProgram> {
        if self.channel.is_empty() {
            return None;
        }
        Some(EpgProgram {
            id: Uuid::new_v4(),
            channel_xmltv_id: self.channel,
            title: self.title.unwrap_or_default(),
            description: self.description,
            start_time: self.start.as_deref().and_then(parse_xmltv_time),
            stop_time: self.stop.as_deref().and_then(parse_xmltv_time),
        })
    }
}

struct ChannelInProgress {
    id: String,
    display_name: Option<String>,
    icon_url: Option<String>,
}

impl ChannelInProgress {
    fn finish(self) -> Option<EpgChannelInfo> {
        if self.id.is_empty() {
            return None;
        }
        Some(EpgChannelInfo {
            id: Uuid::new_v4(),
            channel_xmltv_id: self.id,
            display_name: self.display_name.unwrap_or_default(),
            icon_url: self.icon_url,
        })
    }
}

/// Parse an XMLTV timestamp (`20260829180000 +0000`)
///
/// Timestamps without a zone offset are treated as UTC. Unparseable values
/// map to `None` rather than failing the entry.
fn parse_xmltv_time(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(with_zone) = DateTime::parse_from_str(trimmed, "%Y%m%d%H%M%S %z") {
        return Some(with_zone.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse XML attributes into a HashMap
fn parse_attributes(element: &BytesStart) -> HashMap<String, String> {
    let mut attrs = HashMap::new();

    for attr in element.attributes().flatten() {
        if let (Ok(key), Ok(value)) = (
            std::str::from_utf8(attr.key.as_ref()),
            std::str::from_utf8(&attr.value),
        ) {
            attrs.insert(key.to_string(), value.to_string());
        }
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stream(batch_size: usize, content: &str) -> EpgBatchStream {
        EpgBatchStream::new(content.as_bytes().to_vec(), batch_size.max(1))
    }

    fn collect_batches(batch_size: usize, content: &str) -> Vec<EpgBatch> {
        let mut stream = stream(batch_size, content);
        let mut batches = Vec::new();
        while let Some(batch) = stream.next_batch().unwrap() {
            batches.push(batch);
        }
        batches
    }

    const GUIDE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tv>
  <channel id="one.tv">
    <display-name>Channel One</display-name>
    <icon src="http://icons/one.png"/>
  </channel>
  <channel id="two.tv">
    <display-name>Channel Two</display-name>
  </channel>
  <programme channel="one.tv" start="20260829180000 +0000" stop="20260829190000 +0000">
    <title>Evening News</title>
    <desc>Daily headlines.</desc>
  </programme>
  <programme channel="one.tv" start="20260829190000 +0200">
    <title>Late Movie</title>
  </programme>
  <programme start="20260829200000 +0000">
    <title>Orphan</title>
  </programme>
</tv>"#;

    #[test]
    fn parses_channels_and_programs() {
        let batches = collect_batches(1000, GUIDE);
        assert_eq!(batches.len(), 1);
        let batch = &batches[0];

        assert_eq!(batch.channel_infos.len(), 2);
        assert_eq!(batch.channel_infos[0].channel_xmltv_id, "one.tv");
        assert_eq!(batch.channel_infos[0].display_name, "Channel One");
        assert_eq!(
            batch.channel_infos[0].icon_url.as_deref(),
            Some("http://icons/one.png")
        );
        assert_eq!(batch.channel_infos[1].icon_url, None);

        // Program without a channel attribute is dropped
        assert_eq!(batch.programs.len(), 2);
        assert_eq!(batch.programs[0].title, "Evening News");
        assert_eq!(
            batch.programs[0].description.as_deref(),
            Some("Daily headlines.")
        );
        assert_eq!(
            batch.programs[0].start_time,
            Some(Utc.with_ymd_and_hms(2026, 8, 29, 18, 0, 0).unwrap())
        );
        assert_eq!(
            batch.programs[0].stop_time,
            Some(Utc.with_ymd_and_hms(2026, 8, 29, 19, 0, 0).unwrap())
        );
        // +0200 offset is converted to UTC
        assert_eq!(
            batch.programs[1].start_time,
            Some(Utc.with_ymd_and_hms(2026, 8, 29, 17, 0, 0).unwrap())
        );
        assert_eq!(batch.programs[1].stop_time, None);
    }

    #[test]
    fn batches_are_bounded_and_pulled_one_at_a_time() {
        let mut stream = stream(2, GUIDE);

        // Each pull yields at most one full batch; no batch accumulates
        // beyond the bound before being handed over
        let mut total = 0;
        let mut pulls = 0;
        while let Some(batch) = stream.next_batch().unwrap() {
            assert!(batch.len() <= 2);
            total += batch.len();
            pulls += 1;
        }
        assert_eq!(total, 4);
        assert!(pulls > 1);

        // Exhausted streams keep returning None
        assert!(stream.next_batch().unwrap().is_none());
    }

    #[test]
    fn naive_timestamps_are_treated_as_utc() {
        let parsed = parse_xmltv_time("20260829120000").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).unwrap());
        assert!(parse_xmltv_time("not a time").is_none());
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let mut stream = stream(100, "<tv><programme");
        assert!(stream.next_batch().is_err());
        // The stream stays finished after the error
        assert!(stream.next_batch().unwrap().is_none());
    }
}
