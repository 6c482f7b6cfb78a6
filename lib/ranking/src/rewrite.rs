//! Output copies of selected entries.
//!
//! Nothing here touches the corpus: every function takes an entry by
//! reference and hands back an owned, adjusted copy.

use ahash::AHashSet;
use blueprint_core::TemplateEntry;

/// Appended to the description of image-bearing entries when images are wanted
pub const IMAGE_URL_POLICY: &str =
    "IMAGE_URL_POLICY: use full HTTPS URLs (Unsplash or Picsum). No local filenames.";

/// Copy of `entry` ready to hand to a caller. Image keywords are normalized;
/// when `need_images` is set and the entry has an image slot, the URL policy
/// note is appended to the description once.
pub fn prepare_copy(entry: &TemplateEntry, need_images: bool) -> TemplateEntry {
    let mut copy = entry.clone();
    copy.image_keywords = normalize_keywords(&entry.image_keywords);

    if need_images && entry.has_image_slot() && !copy.description.contains(IMAGE_URL_POLICY) {
        copy.description = if copy.description.trim().is_empty() {
            IMAGE_URL_POLICY.to_string()
        } else {
            format!("{} {}", copy.description.trim_end(), IMAGE_URL_POLICY)
        };
    }
    copy
}

/// Lowercase, trim, drop blanks and repeats; first occurrence keeps its place
pub fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    let mut seen = AHashSet::new();
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .collect()
}

/// Case-insensitive union in encounter order, at most `cap` keywords
pub fn merge_keywords<'a, I>(lists: I, cap: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut seen = AHashSet::new();
    let mut merged = Vec::new();
    for keyword in lists.into_iter().flatten() {
        if merged.len() >= cap {
            break;
        }
        let key = keyword.trim().to_lowercase();
        if !key.is_empty() && seen.insert(key.clone()) {
            merged.push(key);
        }
    }
    merged
}
