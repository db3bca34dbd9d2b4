// crates/snapqueue-core/src/runtime/gallery.rs
// ============================================================================
// Module: Snapqueue Gallery Merge
// Description: Combined view of pending local records and confirmed remote items.
// Purpose: Derive each entry's sync state from where it came from.
// Dependencies: crate::core
// ============================================================================

//! Combined view of pending local records and confirmed remote items.

use crate::core::CatalogItem;
use crate::core::EntrySource;
use crate::core::EntryState;
use crate::core::GalleryEntry;
use crate::core::QueueRecord;

/// Merges local queue records and remote catalog items.
///
/// Local records come first, oldest first; they are always pending because a
/// record exists in the queue only until delivery is confirmed. Remote items
/// follow in server order and are always confirmed.
#[must_use]
pub fn merge(local: &[QueueRecord], remote: &[CatalogItem]) -> Vec<GalleryEntry> {
    let mut pending: Vec<&QueueRecord> = local.iter().collect();
    pending.sort_by_key(|record| (record.created_at, record.id));
    let local_entries = pending.into_iter().map(|record| GalleryEntry {
        source: EntrySource::Local(record.id),
        caption: record.caption.as_str().to_string(),
        image: record.payload.clone(),
        filename: Some(record.filename.clone()),
        created_at: Some(record.created_at),
        state: EntryState::Pending,
    });
    let remote_entries = remote.iter().map(|item| GalleryEntry {
        source: EntrySource::Remote(item.id.clone()),
        caption: item.caption.clone(),
        image: item.image_url.clone(),
        filename: None,
        created_at: None,
        state: EntryState::Confirmed,
    });
    local_entries.chain(remote_entries).collect()
}
