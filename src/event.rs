//! Event store: named, typed collections of one event
//!
//! Collections are a closed set of variants ([`Collection`]), so every
//! collection is homogeneous and typed access never needs a runtime downcast.

use std::collections::BTreeMap;

use crate::common::{CellIdCodec, CellIdError};
use crate::extrapolation::errors::ExtrapolationError;
use crate::extrapolation::output::ExtendedTrack;
use crate::extrapolation::types::{Track, TrackerHit};

/// A collection of tracker hits sharing one cell identifier layout
#[derive(Debug, Clone, PartialEq)]
pub struct HitCollection {
    /// Layout of the hits' cell identifiers
    pub codec: CellIdCodec,
    /// The hits
    pub hits: Vec<TrackerHit>,
    /// Whether the hits are references into other collections
    pub subset: bool,
}

impl HitCollection {
    /// Hits using the standard tracker layout
    pub fn new(hits: Vec<TrackerHit>) -> Self {
        Self {
            codec: CellIdCodec::ild(),
            hits,
            subset: false,
        }
    }

    /// Hits whose cell identifiers follow `encoding`
    pub fn with_encoding(encoding: &str, hits: Vec<TrackerHit>) -> Result<Self, CellIdError> {
        Ok(Self {
            codec: CellIdCodec::parse(encoding)?,
            hits,
            subset: false,
        })
    }

    /// Mark the collection as a subset of other collections
    pub fn as_subset(mut self) -> Self {
        self.subset = true;
        self
    }

    /// Number of hits
    #[inline]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether the collection holds no hits
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// A named collection stored in an event
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    /// Seed tracks
    Tracks(Vec<Track>),
    /// Extended tracks
    ExtendedTracks(Vec<ExtendedTrack>),
    /// Tracker hits
    Hits(HitCollection),
}

impl Collection {
    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            Collection::Tracks(v) => v.len(),
            Collection::ExtendedTracks(v) => v.len(),
            Collection::Hits(h) => h.len(),
        }
    }

    /// Whether the collection holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Variant name for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Collection::Tracks(_) => "tracks",
            Collection::ExtendedTracks(_) => "extended tracks",
            Collection::Hits(_) => "hits",
        }
    }
}

/// Read/write access to an event's collections
///
/// Asking for a collection that is not in the event is normal and returns `None`.
pub trait EventStore {
    /// Run number
    fn run_number(&self) -> u32;

    /// Event number within the run
    fn event_number(&self) -> u64;

    /// Look up a collection by name
    fn collection(&self, name: &str) -> Option<&Collection>;

    /// Add a collection; names must be unique within the event
    fn add_collection(&mut self, name: &str, collection: Collection)
        -> Result<(), ExtrapolationError>;

    /// Seed tracks stored under `name`, if present and of the right kind
    fn tracks(&self, name: &str) -> Option<&[Track]> {
        match self.collection(name)? {
            Collection::Tracks(tracks) => Some(tracks.as_slice()),
            other => {
                log::warn!(
                    "Collection {} holds {}, expected tracks; ignoring it",
                    name,
                    other.kind()
                );
                None
            }
        }
    }

    /// Hits stored under `name`, if present and of the right kind
    fn hits(&self, name: &str) -> Option<&HitCollection> {
        match self.collection(name)? {
            Collection::Hits(hits) => Some(hits),
            other => {
                log::warn!(
                    "Collection {} holds {}, expected hits; ignoring it",
                    name,
                    other.kind()
                );
                None
            }
        }
    }
}

/// In-memory event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    run_number: u32,
    event_number: u64,
    collections: BTreeMap<String, Collection>,
}

impl Event {
    /// Create an empty event
    pub fn new(run_number: u32, event_number: u64) -> Self {
        Self {
            run_number,
            event_number,
            collections: BTreeMap::new(),
        }
    }

    /// Builder-style insert, replacing any collection with the same name
    pub fn with_collection(mut self, name: &str, collection: Collection) -> Self {
        self.collections.insert(name.to_string(), collection);
        self
    }

    /// Names of all collections, sorted
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Extended tracks stored under `name`
    pub fn extended_tracks(&self, name: &str) -> Option<&[ExtendedTrack]> {
        match self.collections.get(name)? {
            Collection::ExtendedTracks(tracks) => Some(tracks.as_slice()),
            _ => None,
        }
    }
}

impl EventStore for Event {
    fn run_number(&self) -> u32 {
        self.run_number
    }

    fn event_number(&self) -> u64 {
        self.event_number
    }

    fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    fn add_collection(
        &mut self,
        name: &str,
        collection: Collection,
    ) -> Result<(), ExtrapolationError> {
        if self.collections.contains_key(name) {
            return Err(ExtrapolationError::DuplicateCollection {
                name: name.to_string(),
            });
        }
        self.collections.insert(name.to_string(), collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extrapolation::types::HitId;
    use nalgebra::Point3;

    #[test]
    fn test_typed_access() {
        let hits = HitCollection::new(vec![TrackerHit::new(
            HitId(1),
            3,
            Point3::new(1.0, 0.0, 0.0),
        )]);
        let event = Event::new(1, 7)
            .with_collection("Hits", Collection::Hits(hits))
            .with_collection("Seeds", Collection::Tracks(Vec::new()));

        assert_eq!(event.hits("Hits").map(|h| h.len()), Some(1));
        assert!(event.tracks("Seeds").is_some());
        assert!(event.tracks("Hits").is_none());
        assert!(event.hits("Missing").is_none());
        assert_eq!(event.collection_names().collect::<Vec<_>>(), vec!["Hits", "Seeds"]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut event = Event::new(0, 0);
        event
            .add_collection("Out", Collection::Tracks(Vec::new()))
            .unwrap();
        let err = event
            .add_collection("Out", Collection::ExtendedTracks(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, ExtrapolationError::DuplicateCollection { .. }));
    }

    #[test]
    fn test_custom_encoding() {
        let collection = HitCollection::with_encoding("subdet:5,layer:9,module:8,sensor:8", vec![])
            .unwrap()
            .as_subset();
        assert!(collection.subset);
        assert!(collection.is_empty());
        assert!(HitCollection::with_encoding("subdet", vec![]).is_err());
    }
}
