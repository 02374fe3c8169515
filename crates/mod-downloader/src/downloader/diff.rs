//! Filtering config entries and reconciling them with the manifest

use std::collections::{BTreeSet, HashMap};

use crate::downloader::core::{DownloadError, Result};
use crate::downloader::manifest::DownloadedMod;
use crate::mods_config::{ModEntry, ModSide};

/// Outcome of comparing wanted mods with downloaded ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModDiff {
    /// Wanted but not downloaded yet
    pub updated: Vec<ModEntry>,
    /// Downloaded but no longer wanted
    pub removed: Vec<DownloadedMod>,
    /// Downloaded and still wanted
    pub keep: Vec<DownloadedMod>,
}

/// Entries wanted for `side` with the requested optional mods
///
/// Every id in `optional_ids` must name an optional entry.
pub fn filter_mods(mods: &[ModEntry], optional_ids: &BTreeSet<String>, side: Option<ModSide>) -> Result<Vec<ModEntry>> {
    let mut unmatched = optional_ids.clone();
    let filtered = mods
        .iter()
        .filter(|entry| {
            let wanted = !entry.optional || {
                let requested = optional_ids.contains(&entry.id);
                unmatched.remove(&entry.id);
                requested
            };
            let for_side = match (entry.side, side) {
                (Some(entry_side), Some(side)) => entry_side == side,
                _ => true,
            };
            wanted && for_side
        })
        .cloned()
        .collect();

    if !unmatched.is_empty() {
        return Err(DownloadError::OptionalModsNotFound {
            ids: unmatched.into_iter().collect(),
        });
    }
    Ok(filtered)
}

#[derive(Default)]
struct Pair {
    wanted: Option<ModEntry>,
    downloaded: Option<DownloadedMod>,
}

/// Classify mods by `(id, version_id)`
///
/// Output order follows first insertion: config entries, then manifest-only
/// entries. A later duplicate config entry replaces the earlier one in place.
/// The source is not part of the key, so changing only the source of a mod
/// does not download it again.
pub fn compute_mod_diff(mods: &[ModEntry], downloaded: &[DownloadedMod]) -> ModDiff {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut pairs: HashMap<(String, String), Pair> = HashMap::new();

    for entry in mods {
        let key = (entry.id.clone(), entry.version_id.clone());
        slot(&mut order, &mut pairs, key).wanted = Some(entry.clone());
    }
    for downloaded_mod in downloaded {
        let key = (downloaded_mod.id.clone(), downloaded_mod.version_id.clone());
        slot(&mut order, &mut pairs, key).downloaded = Some(downloaded_mod.clone());
    }

    let mut diff = ModDiff::default();
    for key in order {
        let Some(pair) = pairs.remove(&key) else {
            continue;
        };
        match (pair.wanted, pair.downloaded) {
            (Some(wanted), None) => diff.updated.push(wanted),
            (None, Some(downloaded_mod)) => diff.removed.push(downloaded_mod),
            (Some(_), Some(downloaded_mod)) => diff.keep.push(downloaded_mod),
            (None, None) => {}
        }
    }
    diff
}

fn slot<'a>(
    order: &mut Vec<(String, String)>,
    pairs: &'a mut HashMap<(String, String), Pair>,
    key: (String, String),
) -> &'a mut Pair {
    if !pairs.contains_key(&key) {
        order.push(key.clone());
    }
    pairs.entry(key).or_default()
}
