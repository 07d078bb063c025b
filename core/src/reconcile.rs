//! Merge of the three dictionary sources into one canonical entry set.
//!
//! Sources:
//! - CC-Canto: Cantonese-specific entries, already carrying jyutping and glosses.
//! - CC-CEDICT: Mandarin entries with glosses but no jyutping.
//! - CC-CEDICT-Canto: jyutping readings for CC-CEDICT headwords, no glosses.
//!
//! Phases run in order and each appends to the canonical set:
//! 1. seed with CC-Canto,
//! 2. join CC-CEDICT with CC-CEDICT-Canto on `(traditional, simplified, pinyin)`,
//! 3. add CC-CEDICT rows without a reading,
//! 4. add CC-CEDICT-Canto readings without a gloss.
//!
//! Phases 2-4 skip a row whose `(traditional, simplified, pinyin, english)` key
//! was already present when the phase began.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entry::{DictEntry, HeadwordKey, RowKey, SenseKey};

/// Rows added by each reconciliation phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub seeded: usize,
    pub joined: usize,
    pub cedict_orphans: usize,
    pub cedict_canto_orphans: usize,
}

impl ReconcileStats {
    pub fn total(&self) -> usize {
        self.seeded + self.joined + self.cedict_orphans + self.cedict_canto_orphans
    }
}

/// The canonical entry set in insertion order, with its phase statistics.
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    pub entries: Vec<DictEntry>,
    pub stats: ReconcileStats,
}

#[derive(Default)]
struct Canonical {
    entries: Vec<DictEntry>,
    rows: AHashSet<RowKey>,
    senses: AHashSet<SenseKey>,
}

impl Canonical {
    /// Insert unless the row is an exact duplicate. Returns true when added.
    fn push(&mut self, entry: DictEntry) -> bool {
        if !self.rows.insert(entry.row_key()) {
            return false;
        }
        self.senses.insert(entry.sense_key());
        self.entries.push(entry);
        true
    }

    /// Insert unless the sense was recorded before the phase began.
    fn push_guarded(&mut self, guard: &AHashSet<SenseKey>, entry: DictEntry) -> bool {
        if guard.contains(&entry.sense_key()) {
            return false;
        }
        self.push(entry)
    }
}

/// Reconcile the three loaded sources into the canonical entry set.
pub fn reconcile(canto: &[DictEntry], cedict: &[DictEntry], cedict_canto: &[DictEntry]) -> Reconciled {
    let mut canonical = Canonical::default();
    let mut stats = ReconcileStats::default();

    for entry in canto {
        if canonical.push(entry.clone()) {
            stats.seeded += 1;
        }
    }
    info!(added = stats.seeded, total = canonical.entries.len(), "seeded from CC-Canto");

    // Readings per headword, in source order.
    let mut readings: AHashMap<HeadwordKey, Vec<&DictEntry>> = AHashMap::new();
    for bridge in cedict_canto {
        readings.entry(bridge.headword_key()).or_default().push(bridge);
    }
    let cedict_headwords: AHashSet<HeadwordKey> = cedict.iter().map(DictEntry::headword_key).collect();

    let guard = canonical.senses.clone();
    for entry in cedict {
        let Some(bridges) = readings.get(&entry.headword_key()) else {
            continue;
        };
        for bridge in bridges {
            let joined = DictEntry {
                jyutping: bridge.jyutping.clone(),
                ..entry.clone()
            };
            if canonical.push_guarded(&guard, joined) {
                stats.joined += 1;
            }
        }
    }
    info!(added = stats.joined, total = canonical.entries.len(), "joined CC-CEDICT with CC-CEDICT-Canto");

    let guard = canonical.senses.clone();
    for entry in cedict {
        if readings.contains_key(&entry.headword_key()) {
            continue;
        }
        let orphan = DictEntry {
            jyutping: None,
            ..entry.clone()
        };
        if canonical.push_guarded(&guard, orphan) {
            stats.cedict_orphans += 1;
        }
    }
    info!(added = stats.cedict_orphans, total = canonical.entries.len(), "added CC-CEDICT orphans");

    let guard = canonical.senses.clone();
    for bridge in cedict_canto {
        if cedict_headwords.contains(&bridge.headword_key()) {
            continue;
        }
        let orphan = DictEntry {
            english: None,
            ..bridge.clone()
        };
        if canonical.push_guarded(&guard, orphan) {
            stats.cedict_canto_orphans += 1;
        }
    }
    info!(
        added = stats.cedict_canto_orphans,
        total = canonical.entries.len(),
        "added CC-CEDICT-Canto orphans"
    );

    Reconciled {
        entries: canonical.entries,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_dict_line;

    fn rows(lines: &[&str]) -> Vec<DictEntry> {
        lines.iter().flat_map(|l| parse_dict_line(l).unwrap()).collect()
    }

    #[test]
    fn full_coverage_join_has_no_orphans() {
        let cedict = rows(&["艦 舰 [jian4] /warship/naval vessel/", "朱 朱 [zhu1] /vermilion/"]);
        let bridge = rows(&["艦 舰 [jian4] {laam6}", "朱 朱 [zhu1] {zyu1}"]);
        let out = reconcile(&[], &cedict, &bridge);
        assert_eq!(out.stats.joined, 3);
        assert_eq!(out.stats.cedict_orphans, 0);
        assert_eq!(out.stats.cedict_canto_orphans, 0);
        assert!(out.entries.len() <= cedict.len() * bridge.len());
        assert!(out.entries.iter().all(|e| e.jyutping.is_some() && e.english.is_some()));
    }

    #[test]
    fn one_gloss_under_several_readings() {
        let cedict = rows(&["阮 阮 [ruan3] /surname Ruan/"]);
        let bridge = rows(&["阮 阮 [ruan3] {jyun2}", "阮 阮 [ruan3] {jyun5}"]);
        let out = reconcile(&[], &cedict, &bridge);
        let readings: Vec<_> = out.entries.iter().map(|e| e.jyutping.as_deref().unwrap()).collect();
        assert_eq!(readings, ["jyun2", "jyun5"]);
    }

    #[test]
    fn seeded_gloss_blocks_later_phases() {
        let canto = rows(&["吼 吼 [hou3] {haau1} /to roar/"]);
        let cedict = rows(&["吼 吼 [hou3] /to roar/bellow of rage/"]);
        let bridge = rows(&["吼 吼 [hou3] {hau3}"]);
        let out = reconcile(&canto, &cedict, &bridge);
        assert_eq!(out.stats.seeded, 1);
        assert_eq!(out.stats.joined, 1);
        assert_eq!(out.entries[1].english.as_deref(), Some("bellow of rage"));
        assert_eq!(out.entries[1].jyutping.as_deref(), Some("hau3"));
    }

    #[test]
    fn orphans_from_both_sides() {
        let cedict = rows(&["圓 圆 [yuan2] /round/", "咖啡 咖啡 [ka1 fei1] /coffee/"]);
        let bridge = rows(&["圓 圆 [yuan2] {jyun4}", "嘢 嘢 [ye3] {je5}"]);
        let out = reconcile(&[], &cedict, &bridge);
        assert_eq!(out.stats.joined, 1);
        assert_eq!(out.stats.cedict_orphans, 1);
        assert_eq!(out.stats.cedict_canto_orphans, 1);
        let coffee = out.entries.iter().find(|e| e.traditional == "咖啡").unwrap();
        assert_eq!(coffee.jyutping, None);
        let je = out.entries.iter().find(|e| e.traditional == "嘢").unwrap();
        assert_eq!(je.english, None);
        assert_eq!(out.stats.total(), out.entries.len());
    }

    #[test]
    fn exact_duplicates_collapse() {
        let canto = rows(&["嘢 嘢 [ye3] {je5} /thing/", "嘢 嘢 [ye3] {je5} /thing/"]);
        let bridge = rows(&["嘢 嘢 [ye3] {je5}", "嘢 嘢 [ye3] {je5}"]);
        let out = reconcile(&canto, &[], &bridge);
        assert_eq!(out.stats.seeded, 1);
        assert_eq!(out.stats.cedict_canto_orphans, 1);
        assert_eq!(out.entries.len(), 2);
    }

    #[test]
    fn reconciling_twice_is_stable() {
        let canto = rows(&["吼 吼 [hou3] {haau1} /to roar/to howl/"]);
        let cedict = rows(&["吼 吼 [hou3] /to roar/bellow of rage/"]);
        let bridge = rows(&["吼 吼 [hou3] {haau1}", "吼 吼 [hou3] {hau3}"]);
        let first = reconcile(&canto, &cedict, &bridge);
        let second = reconcile(&canto, &cedict, &bridge);
        assert_eq!(first.entries, second.entries);
        assert_eq!(first.stats, second.stats);
    }
}
