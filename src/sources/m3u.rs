//! M3U source handler
//!
//! Parses standard M3U playlists: a `#EXTM3U` header followed by
//! `#EXTINF:` metadata lines, each paired with the stream URL on the next
//! non-comment line. Attribute extraction covers the `tvg-id`, `tvg-logo`
//! and `group-title` markers; anything malformed simply yields an unset
//! field rather than failing the parse.

use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{AppResult, SourceError};
use crate::models::{Category, Channel, ContentKind, Playlist};
use crate::utils::DecompressingHttpClient;

/// Result of parsing one M3U document
#[derive(Debug, Default)]
pub struct M3uParseResult {
    pub channels: Vec<Channel>,
    /// Deduplicated by group title; channels sharing a group title reference
    /// the same category id
    pub categories: Vec<Category>,
}

/// M3U source handler
pub struct M3uSourceHandler<C: DecompressingHttpClient> {
    http_client: C,
}

impl<C: DecompressingHttpClient> M3uSourceHandler<C> {
    pub fn new(http_client: C) -> Self {
        Self { http_client }
    }

    /// Fetch and parse the playlist's M3U document
    pub async fn ingest(&self, playlist: &Playlist) -> AppResult<M3uParseResult> {
        let content = self.http_client.fetch_text(&playlist.url).await?;
        let result = parse_m3u_content(&content, playlist)?;
        info!(
            "Parsed {} channels and {} categories from M3U playlist '{}'",
            result.channels.len(),
            result.categories.len(),
            playlist.name
        );
        Ok(result)
    }
}

/// Parse M3U content into channels and categories linked to the playlist
///
/// Fails when the `#EXTM3U` header is missing. Every `#EXTINF`/URL pair
/// yields exactly one channel; a URL line with no preceding `#EXTINF` is
/// skipped.
pub fn parse_m3u_content(content: &str, playlist: &Playlist) -> AppResult<M3uParseResult> {
    let mut lines = content.lines();

    let header = lines
        .by_ref()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");
    if !header.starts_with("#EXTM3U") {
        return Err(SourceError::parse("m3u", "missing #EXTM3U header").into());
    }

    let mut channels = Vec::new();
    let mut categories: HashMap<String, Category> = HashMap::new();
    let mut current: Option<ExtinfEntry> = None;

    for (line_num, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("#EXTINF:") {
            current = Some(parse_extinf_line(line));
        } else if line.starts_with('#') {
            continue;
        } else if let Some(entry) = current.take() {
            let category_id = entry
                .group_title
                .as_deref()
                .filter(|title| !title.is_empty())
                .map(|title| {
                    categories
                        .entry(title.to_string())
                        .or_insert_with(|| Category {
                            id: Uuid::new_v4(),
                            playlist_id: playlist.id,
                            name: title.to_string(),
                            content_kind: ContentKind::Live,
                        })
                        .id
                });

            channels.push(Channel {
                id: Uuid::new_v4(),
                playlist_id: playlist.id,
                category_id,
                name: entry.name,
                stream_url: line.to_string(),
                logo_url: entry.logo_url,
                epg_id: entry.epg_id,
            });
        } else {
            warn!(
                "Stream URL without #EXTINF metadata at line {}, skipping",
                line_num + 2
            );
        }
    }

    debug!(
        "M3U parse produced {} channels across {} groups",
        channels.len(),
        categories.len()
    );

    Ok(M3uParseResult {
        channels,
        categories: categories.into_values().collect(),
    })
}

/// Metadata extracted from one `#EXTINF:` line
struct ExtinfEntry {
    name: String,
    group_title: Option<String>,
    logo_url: Option<String>,
    epg_id: Option<String>,
}

/// Parse an EXTINF line: `#EXTINF:duration attr="value" ...,title`
fn parse_extinf_line(line: &str) -> ExtinfEntry {
    let content = line.strip_prefix("#EXTINF:").unwrap_or(line);

    // The title follows the last comma; attributes precede it
    let (attrs_part, title) = match content.rfind(',') {
        Some(pos) => (&content[..pos], content[pos + 1..].trim()),
        None => (content, ""),
    };

    let attributes = parse_extinf_attributes(attrs_part);

    ExtinfEntry {
        name: title.to_string(),
        group_title: attributes.get("group-title").cloned(),
        logo_url: attributes.get("tvg-logo").cloned(),
        epg_id: attributes.get("tvg-id").cloned(),
    }
}

/// Parse `key="value"` pairs from the attribute section of an EXTINF line
fn parse_extinf_attributes(attrs_part: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();

    let mut chars = attrs_part.chars().peekable();
    let mut current_key = String::new();
    let mut current_value = String::new();
    let mut in_quotes = false;
    let mut in_key = false;
    let mut in_value = false;

    while let Some(ch) = chars.next() {
        match ch {
            ' ' | '\t' if !in_quotes => {
                if in_value {
                    if !current_key.is_empty() && !current_value.is_empty() {
                        attributes.insert(current_key.clone(), current_value.clone());
                    }
                    current_key.clear();
                    current_value.clear();
                    in_value = false;
                }
                in_key = true;
            }
            '=' if !in_quotes => {
                in_key = false;
                in_value = true;
                if chars.peek() == Some(&'"') {
                    chars.next();
                    in_quotes = true;
                }
            }
            '"' if in_value => {
                in_quotes = false;
                if !current_key.is_empty() {
                    attributes.insert(current_key.clone(), current_value.clone());
                }
                current_key.clear();
                current_value.clear();
                in_value = false;
            }
            _ => {
                if in_key {
                    current_key.push(ch);
                } else if in_value {
                    current_value.push(ch);
                }
            }
        }
    }

    if in_value && !current_key.is_empty() && !current_value.is_empty() {
        attributes.insert(current_key, current_value);
    }

    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlaylistType;
    use chrono::Utc;

    fn test_playlist() -> Playlist {
        Playlist {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            url: "http://example.com/playlist.m3u".to_string(),
            username: None,
            password: None,
            playlist_type: PlaylistType::M3u,
            last_updated: Utc::now(),
        }
    }

    const SAMPLE: &str = r#"#EXTM3U
#EXTINF:-1 tvg-id="bbc1.uk" tvg-logo="http://logos/bbc1.png" group-title="News",BBC One
http://host/stream/1.ts
#EXTINF:-1 tvg-id="cnn.us" group-title="News",CNN
http://host/stream/2.ts
#EXTINF:-1 group-title="Sports",ESPN
http://host/stream/3.ts
"#;

    #[test]
    fn parses_channels_and_groups() {
        let playlist = test_playlist();
        let result = parse_m3u_content(SAMPLE, &playlist).unwrap();

        assert_eq!(result.channels.len(), 3);
        assert_eq!(result.categories.len(), 2);

        let bbc = &result.channels[0];
        assert_eq!(bbc.name, "BBC One");
        assert_eq!(bbc.stream_url, "http://host/stream/1.ts");
        assert_eq!(bbc.logo_url.as_deref(), Some("http://logos/bbc1.png"));
        assert_eq!(bbc.epg_id.as_deref(), Some("bbc1.uk"));
        assert_eq!(bbc.playlist_id, playlist.id);
    }

    #[test]
    fn channels_in_same_group_share_a_category() {
        let result = parse_m3u_content(SAMPLE, &test_playlist()).unwrap();
        let bbc = &result.channels[0];
        let cnn = &result.channels[1];
        let espn = &result.channels[2];
        assert_eq!(bbc.category_id, cnn.category_id);
        assert_ne!(bbc.category_id, espn.category_id);
        assert!(bbc.category_id.is_some());
    }

    #[test]
    fn every_extinf_url_pair_yields_one_channel() {
        // Identical entries are kept; no deduplication on re-parse
        let content = "#EXTM3U\n#EXTINF:-1,A\nhttp://host/a.ts\n#EXTINF:-1,A\nhttp://host/a.ts\n";
        let result = parse_m3u_content(content, &test_playlist()).unwrap();
        assert_eq!(result.channels.len(), 2);
    }

    #[test]
    fn missing_header_fails() {
        let err = parse_m3u_content("#EXTINF:-1,A\nhttp://host/a.ts\n", &test_playlist());
        assert!(err.is_err());
        let err = parse_m3u_content("", &test_playlist());
        assert!(err.is_err());
    }

    #[test]
    fn header_after_blank_lines_is_accepted() {
        let content = "\n\n#EXTM3U\n#EXTINF:-1,A\nhttp://host/a.ts\n";
        let result = parse_m3u_content(content, &test_playlist()).unwrap();
        assert_eq!(result.channels.len(), 1);
    }

    #[test]
    fn url_without_extinf_is_skipped() {
        let content = "#EXTM3U\nhttp://host/orphan.ts\n#EXTINF:-1,A\nhttp://host/a.ts\n";
        let result = parse_m3u_content(content, &test_playlist()).unwrap();
        assert_eq!(result.channels.len(), 1);
        assert_eq!(result.channels[0].name, "A");
    }

    #[test]
    fn missing_attributes_yield_unset_fields() {
        let content = "#EXTM3U\n#EXTINF:-1,Bare\nhttp://host/bare.ts\n";
        let result = parse_m3u_content(content, &test_playlist()).unwrap();
        let channel = &result.channels[0];
        assert_eq!(channel.name, "Bare");
        assert!(channel.logo_url.is_none());
        assert!(channel.epg_id.is_none());
        assert!(channel.category_id.is_none());
        assert!(result.categories.is_empty());
    }

    #[test]
    fn comment_lines_between_pairs_are_ignored() {
        let content =
            "#EXTM3U\n#EXTINF:-1,A\n#EXTVLCOPT:network-caching=1000\nhttp://host/a.ts\n";
        let result = parse_m3u_content(content, &test_playlist()).unwrap();
        assert_eq!(result.channels.len(), 1);
        assert_eq!(result.channels[0].stream_url, "http://host/a.ts");
    }

    #[test]
    fn attribute_values_with_spaces_are_preserved() {
        let content =
            "#EXTM3U\n#EXTINF:-1 group-title=\"UK | News\",Sky News\nhttp://host/sky.ts\n";
        let result = parse_m3u_content(content, &test_playlist()).unwrap();
        assert_eq!(result.categories[0].name, "UK | News");
        assert_eq!(result.categories[0].content_kind, ContentKind::Live);
    }
}
