use crate::domain::{ThreadRef, TimelineEntry};

/// Compute where a reply to `entry` attaches.
///
/// `parent` is always `entry`. `root` is `entry` for a top-level post, otherwise the
/// root already recorded on `entry`, never its immediate parent.
pub fn resolve(entry: &TimelineEntry) -> ThreadRef {
    let parent = entry.strong_ref();
    let root = match &entry.reply {
        Some(existing) => existing.root.clone(),
        None => parent.clone(),
    };
    ThreadRef { parent, root }
}
