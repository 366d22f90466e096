//! Per-event index of unused hits by detector element
//!
//! The index is rebuilt from the raw hit collections at the start of every
//! event. A hit leaves the index when it is attached to a track, which is what
//! prevents two tracks from sharing a hit: there is no separate "used" flag.
//! Whatever is still indexed after all tracks are processed is the leftover
//! output.

use std::collections::BTreeMap;

use crate::common::{CellIdCodec, DetectorElementId};
use crate::event::HitCollection;

use super::types::TrackerHit;

/// Unused hits of one subdetector, keyed by element
#[derive(Debug, Clone, PartialEq)]
pub struct SubdetectorHits {
    codec: CellIdCodec,
    elements: BTreeMap<DetectorElementId, Vec<TrackerHit>>,
}

impl SubdetectorHits {
    fn from_collection(collection: &HitCollection) -> Self {
        let mut elements: BTreeMap<DetectorElementId, Vec<TrackerHit>> = BTreeMap::new();
        for hit in &collection.hits {
            elements.entry(hit.element_id()).or_default().push(*hit);
        }
        Self {
            codec: collection.codec.clone(),
            elements,
        }
    }

    /// Cell identifier layout of the source collection
    #[inline]
    pub fn codec(&self) -> &CellIdCodec {
        &self.codec
    }

    /// Unused hits on an element (empty if none)
    #[inline]
    pub fn hits_on(&self, element: DetectorElementId) -> &[TrackerHit] {
        self.elements
            .get(&element)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Remove and return the hit at `position` on `element`.
    ///
    /// O(1): the last hit of the element takes the removed hit's place, so the
    /// order of the remaining hits changes.
    pub fn take(&mut self, element: DetectorElementId, position: usize) -> Option<TrackerHit> {
        let hits = self.elements.get_mut(&element)?;
        if position < hits.len() {
            Some(hits.swap_remove(position))
        } else {
            None
        }
    }

    /// Number of unused hits
    pub fn len(&self) -> usize {
        self.elements.values().map(Vec::len).sum()
    }

    /// Whether every hit has been used
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements that had hits at build time
    #[inline]
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Unused hits in ascending element order
    pub fn iter(&self) -> impl Iterator<Item = &TrackerHit> {
        self.elements.values().flatten()
    }
}

/// Unused hits of every configured subdetector
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HitIndex {
    subdetectors: Vec<Option<SubdetectorHits>>,
}

impl HitIndex {
    /// Build the index from the raw hit collections, one entry per configured
    /// subdetector. `None` marks a collection missing from the event.
    pub fn build(collections: &[Option<&HitCollection>]) -> Self {
        let subdetectors = collections
            .iter()
            .map(|c| c.map(SubdetectorHits::from_collection))
            .collect();
        Self { subdetectors }
    }

    /// Number of configured subdetectors
    #[inline]
    pub fn num_subdetectors(&self) -> usize {
        self.subdetectors.len()
    }

    /// Whether the subdetector's hit collection was present in the event
    #[inline]
    pub fn is_present(&self, subdetector: usize) -> bool {
        matches!(self.subdetectors.get(subdetector), Some(Some(_)))
    }

    /// Hits of one subdetector, if its collection was present
    #[inline]
    pub fn subdetector(&self, subdetector: usize) -> Option<&SubdetectorHits> {
        self.subdetectors.get(subdetector)?.as_ref()
    }

    /// Mutable hits of one subdetector, if its collection was present
    #[inline]
    pub fn subdetector_mut(&mut self, subdetector: usize) -> Option<&mut SubdetectorHits> {
        self.subdetectors.get_mut(subdetector)?.as_mut()
    }

    /// Total number of unused hits
    pub fn len(&self) -> usize {
        self.subdetectors.iter().flatten().map(SubdetectorHits::len).sum()
    }

    /// Whether no unused hits remain
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All unused hits, by subdetector then ascending element identifier
    pub fn leftovers(&self) -> Vec<TrackerHit> {
        self.subdetectors
            .iter()
            .flatten()
            .flat_map(SubdetectorHits::iter)
            .copied()
            .collect()
    }
}
