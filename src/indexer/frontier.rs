//! Frontier scanning over the listing page
//!
//! The listing's first row names the newest release id the site has handed
//! out. Everything between that id and the newest id we have durably indexed
//! is frontier territory: some ids are new, some were claimed by the site but
//! never published, and some were indexed by a concurrent job moments ago.
//!
//! The scan walks descending from the newest id. A stored release younger
//! than the freshness window is a claimed-but-possibly-incomplete slot, so
//! the scan keeps looking behind it; a stored release older than the window
//! is proof a prior pass already covered everything below, so the scan stops
//! there. Missing ids are emitted as fetch candidates.

use crate::storage::{Storage, StorageResult, StoreHandle};
use crate::ScrapeError;
use chrono::{DateTime, Duration, Utc};
use scraper::{Html, Selector};

/// Extracts the newest release id from the listing document
///
/// The first listing row's detail link encodes the id as the second path
/// segment (`/torrent/<id>/<name>`).
///
/// # Arguments
///
/// * `html` - The listing page body
///
/// # Returns
///
/// * `Ok(i64)` - The newest listed id
/// * `Err(ScrapeError)` - The listing has no parsable first-row link
pub fn newest_listed_id(html: &str) -> Result<i64, ScrapeError> {
    let document = Html::parse_document(html);

    let selector = Selector::parse("#searchResult tbody div.detName a")
        .map_err(|_| ScrapeError::ListingUnparsable)?;

    document
        .select(&selector)
        .next()
        .and_then(|link| link.value().attr("href"))
        .and_then(|href| href.split('/').nth(2))
        .and_then(|segment| segment.parse::<i64>().ok())
        .ok_or(ScrapeError::ListingUnparsable)
}

/// Lazy descending scan from the newest listed id down to 1
///
/// Yields ids that need fetching. The store is read one id at a time, so ids
/// below the stop point are never examined, and a caller that suspends
/// between items (e.g. waiting for fetch admission) pauses the scan with it.
pub struct FrontierScan<'a> {
    store: &'a StoreHandle,
    next: i64,
    window: Duration,
    now: DateTime<Utc>,
    done: bool,
}

impl<'a> FrontierScan<'a> {
    /// Starts a scan at `newest`, judging freshness against `now`
    pub fn new(store: &'a StoreHandle, newest: i64, window: Duration, now: DateTime<Utc>) -> Self {
        Self {
            store,
            next: newest,
            window,
            now,
            done: false,
        }
    }
}

impl Iterator for FrontierScan<'_> {
    type Item = StorageResult<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done && self.next >= 1 {
            let id = self.next;
            self.next -= 1;

            match self.store.with(|s| s.get_release(id)) {
                // Not indexed yet: this is a fetch candidate
                Ok(None) => return Some(Ok(id)),

                Ok(Some(release)) => {
                    if self.now - release.uploaded_at > self.window {
                        // Stale hit: a prior pass already covered everything older
                        tracing::info!("All caught up with recent releases");
                        self.done = true;
                        return None;
                    }
                    // Fresh hit: claimed but possibly still in flight, keep looking
                }

                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Release, SqliteStorage};
    use chrono::TimeZone;

    const LISTING: &str = r#"
        <html><body>
        <table id="searchResult">
        <thead><tr><th>Type</th><th>Name</th></tr></thead>
        <tbody>
        <tr>
            <td><div class="detName"><a href="/torrent/7842871/Newest.Release">Newest Release</a></div></td>
        </tr>
        <tr>
            <td><div class="detName"><a href="/torrent/7842870/Older.Release">Older Release</a></div></td>
        </tr>
        </tbody>
        </table>
        </body></html>
    "#;

    fn store_with(releases: &[(i64, DateTime<Utc>)]) -> StoreHandle {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.insert_category(100, "Video").unwrap();
        let uploader_id = storage.insert_uploader("tester").unwrap();

        for &(id, uploaded_at) in releases {
            storage
                .insert_release(&Release {
                    id,
                    title: format!("Release {}", id),
                    info_hash: "ABCDEF0123456789ABCDEF0123456789ABCDEF01".to_string(),
                    size_bytes: 1,
                    file_count: 1,
                    info_url: String::new(),
                    lang_spoken: String::new(),
                    lang_texted: String::new(),
                    uploaded_at,
                    category_id: 100,
                    uploader_id,
                })
                .unwrap();
        }

        StoreHandle::new(storage)
    }

    fn collect(scan: FrontierScan) -> Vec<i64> {
        scan.map(|item| item.unwrap()).collect()
    }

    #[test]
    fn test_newest_listed_id() {
        assert_eq!(newest_listed_id(LISTING).unwrap(), 7842871);
    }

    #[test]
    fn test_newest_listed_id_missing_container() {
        let err = newest_listed_id("<html><body><p>maintenance</p></body></html>");
        assert!(matches!(err, Err(ScrapeError::ListingUnparsable)));
    }

    #[test]
    fn test_newest_listed_id_non_numeric_segment() {
        let html = r#"<table id="searchResult"><tbody>
            <tr><td><div class="detName"><a href="/torrent/abc/Name">x</a></div></td></tr>
            </tbody></table>"#;
        assert!(newest_listed_id(html).is_err());
    }

    #[test]
    fn test_empty_store_emits_all_ids_down_to_one() {
        let store = store_with(&[]);
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let emitted = collect(FrontierScan::new(&store, 3, Duration::hours(24), now));
        assert_eq!(emitted, vec![3, 2, 1]);
    }

    #[test]
    fn test_fresh_hit_continues_stale_hit_stops() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let fresh = now - Duration::hours(1);
        let stale = now - Duration::hours(48);

        // 5 fresh, 4 stale, 3 fresh; scanning from 6
        let store = store_with(&[(5, fresh), (4, stale), (3, fresh)]);

        let emitted = collect(FrontierScan::new(&store, 6, Duration::hours(24), now));

        // 6 is missing (emitted), 5 is fresh (skipped), 4 is stale (stop);
        // 3 and below are never emitted even though 2 and 1 are missing
        assert_eq!(emitted, vec![6]);
    }

    #[test]
    fn test_boundary_age_counts_as_fresh() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let store = store_with(&[(2, now - Duration::hours(24))]);

        // Exactly window-old is not yet stale, so the scan continues to 1
        let emitted = collect(FrontierScan::new(&store, 2, Duration::hours(24), now));
        assert_eq!(emitted, vec![1]);
    }

    #[test]
    fn test_scan_never_goes_below_one() {
        let store = store_with(&[]);
        let now = Utc::now();

        let emitted = collect(FrontierScan::new(&store, 1, Duration::hours(24), now));
        assert_eq!(emitted, vec![1]);
    }
}
