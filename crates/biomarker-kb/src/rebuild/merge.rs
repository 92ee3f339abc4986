//! Merge rules for folding a row's candidates into an existing record.

use crate::model::{BiomarkerComponent, EvidenceSource, Specimen};

/// What [`merge_evidence`] did with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceMerge {
    /// An existing entry already had the same evidence and every tag.
    Discarded,
    /// Same evidence as an existing entry; the new tags were unioned into it.
    TagsMerged { added: usize },
    /// New evidence, appended as its own entry.
    Appended,
}

/// Fold `candidate` into `existing`.
///
/// Entries that match on everything but tags are one piece of evidence, so
/// their tag sets are unioned instead of adding a second entry.
pub fn merge_evidence(existing: &mut Vec<EvidenceSource>, candidate: EvidenceSource) -> EvidenceMerge {
    for entry in existing.iter_mut() {
        if !entry.same_evidence(&candidate) {
            continue;
        }
        let added = entry.union_tags(&candidate.tags);
        return if added == 0 {
            EvidenceMerge::Discarded
        } else {
            EvidenceMerge::TagsMerged { added }
        };
    }

    existing.push(candidate);
    EvidenceMerge::Appended
}

/// Add `candidate` to the component unless a specimen with the same key is
/// already listed. Returns whether it was added.
pub fn merge_specimen(component: &mut BiomarkerComponent, candidate: Specimen) -> bool {
    if component.has_specimen(&candidate) {
        return false;
    }
    component.specimen.push(candidate);
    true
}
