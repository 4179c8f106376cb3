//! Detail-page parsing and release persistence
//!
//! A detail document is a field/value list with a fixed label vocabulary.
//! Parsing is a pure function from HTML to a [`DetailDraft`]; persistence
//! resolves the draft's category, uploader, and tags through the entity
//! resolver and writes the release plus its tag relations inside the
//! process-wide write section.
//!
//! A release is either absent or fully populated. Any malformed or
//! unrecognized field makes the whole draft invalid; the caller skips that
//! release and nothing is persisted.

use crate::storage::{Release, Resolver, Storage, StoreHandle};
use crate::{DriftError, ScrapeError};
use chrono::{DateTime, NaiveDateTime, Utc};
use scraper::{ElementRef, Html, Selector};

/// Field values pulled out of one detail document, before entity resolution
#[derive(Debug, Clone, Default)]
pub struct DetailDraft {
    pub id: i64,
    pub title: String,
    pub info_hash: String,
    pub size_bytes: i64,
    pub file_count: i64,
    pub info_url: String,
    pub lang_spoken: String,
    pub lang_texted: String,
    pub uploaded_at: Option<DateTime<Utc>>,
    /// External category id and its displayed name
    pub category: Option<(i64, String)>,
    pub uploader: Option<String>,
    pub tags: Vec<String>,
}

/// Parses one detail document into a draft
///
/// # Arguments
///
/// * `html` - The detail page body
/// * `id` - The release id this page was fetched for
///
/// # Returns
///
/// * `Ok(DetailDraft)` - Every field was recognized and parsable
/// * `Err(ScrapeError)` - The draft is invalid; the release must be skipped
pub fn parse_detail(html: &str, id: i64) -> Result<DetailDraft, ScrapeError> {
    let document = Html::parse_document(html);

    let mut draft = DetailDraft {
        id,
        ..DetailDraft::default()
    };

    draft.title = select_first(&document, "#title")
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    // The info hash is the bare text of a details column, primary first
    draft.info_hash = own_text(select_first(&document, "#details .col1"));
    if draft.info_hash.is_empty() {
        draft.info_hash = own_text(select_first(&document, "#details .col2"));
    }
    if draft.info_hash.is_empty() {
        return Err(ScrapeError::EmptyInfoHash(id));
    }

    let mut unknown: Option<(String, String)> = None;

    if let (Ok(field_sel), Ok(value_sel), Ok(link_sel)) = (
        Selector::parse("#details dt"),
        Selector::parse("#details dd"),
        Selector::parse("a"),
    ) {
        let values: Vec<ElementRef> = document.select(&value_sel).collect();

        for (i, field_el) in document.select(&field_sel).enumerate() {
            let Some(value_el) = values.get(i) else {
                break;
            };

            let raw_label = field_el.text().collect::<String>();
            let label = raw_label.trim().trim_end_matches(':');
            let value_text = value_el.text().collect::<String>();

            match label {
                "Type" => {
                    let href = value_el
                        .select(&link_sel)
                        .next()
                        .and_then(|a| a.value().attr("href"))
                        .unwrap_or("");
                    let category_id = href
                        .split('/')
                        .nth(2)
                        .and_then(|segment| segment.parse::<i64>().ok())
                        .ok_or_else(|| ScrapeError::MalformedCategory(href.to_string()))?;
                    draft.category = Some((category_id, value_text.trim().to_string()));
                }

                "Files" => {
                    draft.file_count = value_text.trim().parse::<i64>().map_err(|_| {
                        ScrapeError::MalformedFileCount(value_text.trim().to_string())
                    })?;
                }

                "Size" => {
                    draft.size_bytes = parse_size(&value_text)?;
                }

                // Present on the page but redundant or volatile; not indexed
                "Info Hash" | "Seeders" | "Leechers" | "Comments" => {}

                "Tag(s)" => {
                    for link in value_el.select(&link_sel) {
                        let name = link.text().collect::<String>();
                        if !name.is_empty() {
                            draft.tags.push(name);
                        }
                    }
                }

                "Uploaded" => {
                    draft.uploaded_at = Some(parse_uploaded(&value_text)?);
                }

                "By" => {
                    draft.uploader = Some(value_text.trim().to_string());
                }

                "Info" => {
                    draft.info_url = value_el
                        .select(&link_sel)
                        .next()
                        .and_then(|a| a.value().attr("href"))
                        .unwrap_or("")
                        .to_string();
                }

                "Spoken language(s)" => {
                    draft.lang_spoken = value_text.trim().to_string();
                }

                "Texted language(s)" => {
                    draft.lang_texted = value_text.trim().to_string();
                }

                other => {
                    tracing::warn!(
                        "Unhandled detail field on release {}: [{}][{}]",
                        id,
                        other,
                        value_text.trim()
                    );
                    if unknown.is_none() {
                        unknown = Some((other.to_string(), value_text.trim().to_string()));
                    }
                }
            }
        }
    }

    if let Some((field, value)) = unknown {
        return Err(ScrapeError::UnknownField { field, value });
    }

    Ok(draft)
}

/// Resolves the draft's sub-entities and persists the release
///
/// The release row and its tag relations are written inside the process-wide
/// write section, after every sub-entity has been resolved.
///
/// # Returns
///
/// * `Ok(Some(Release))` - The release was persisted
/// * `Ok(None)` - The id was already indexed (a concurrent pass won the race)
/// * `Err(DriftError)` - The draft was incomplete or a store write failed
pub fn index_detail(store: &StoreHandle, draft: DetailDraft) -> Result<Option<Release>, DriftError> {
    let id = draft.id;

    let (category_id, category_name) = draft
        .category
        .ok_or(ScrapeError::MissingField { id, field: "Type" })?;
    let uploader_name = draft
        .uploader
        .ok_or(ScrapeError::MissingField { id, field: "By" })?;
    let uploaded_at = draft.uploaded_at.ok_or(ScrapeError::MissingField {
        id,
        field: "Uploaded",
    })?;

    let resolver = Resolver::new(store);
    let category_id = resolver.category(category_id, &category_name)?;
    let uploader_id = resolver.uploader(&uploader_name)?;

    let mut tag_ids = Vec::with_capacity(draft.tags.len());
    for name in &draft.tags {
        tag_ids.push(resolver.tag(name)?);
    }

    let release = Release {
        id,
        title: draft.title,
        info_hash: draft.info_hash,
        size_bytes: draft.size_bytes,
        file_count: draft.file_count,
        info_url: draft.info_url,
        lang_spoken: draft.lang_spoken,
        lang_texted: draft.lang_texted,
        uploaded_at,
        category_id,
        uploader_id,
    };

    let _section = store.write_section();

    // Overlapping listing passes can race the same id; first writer wins
    if store.with(|s| s.get_release(id))?.is_some() {
        return Ok(None);
    }

    store.with(|s| s.insert_release(&release))?;
    for tag_id in tag_ids {
        store.with(|s| s.relate_tag(id, tag_id))?;
    }

    Ok(Some(release))
}

/// First element matching a selector, if the selector is valid and matches
fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

/// Text directly inside an element, excluding its child elements
fn own_text(element: Option<ElementRef>) -> String {
    let Some(element) = element else {
        return String::new();
    };

    let mut text = String::new();
    for child in element.children() {
        if let Some(fragment) = child.value().as_text() {
            text.push_str(fragment);
        }
    }
    text.trim().to_string()
}

/// Extracts the byte count from a `"<human> (<n> Bytes)"` size value
fn parse_size(value: &str) -> Result<i64, ScrapeError> {
    let malformed = || ScrapeError::MalformedSize(value.trim().to_string());

    value
        .split('(')
        .nth(1)
        .map(str::trim_end)
        .and_then(|s| s.strip_suffix(')'))
        .map(str::trim_end)
        .and_then(|s| s.strip_suffix("Bytes"))
        .map(str::trim)
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(malformed)
}

/// Parses the fixed `YYYY-MM-DD HH:MM:SS UTC` upload timestamp
fn parse_uploaded(value: &str) -> Result<DateTime<Utc>, ScrapeError> {
    let malformed = || ScrapeError::MalformedTimestamp(value.trim().to_string());

    let naive = value
        .trim()
        .strip_suffix(" UTC")
        .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok())
        .ok_or_else(malformed)?;

    Ok(naive.and_utc())
}
