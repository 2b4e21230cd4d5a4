//! Per-event collection store.
//!
//! An [`Event`] carries the two input collections the corrector consumes and
//! the output collection it produces. A missing input collection is a hard
//! error, distinct from an empty-but-present one: the first means an upstream
//! stage never ran, the second is an ordinary quiet event.

use crate::candidate::{CorrectedCandidate, IsolatedTrackCandidate, RecoTrack};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised at the event boundary.
#[derive(Debug, Clone, Error)]
pub enum EventError {
    /// A required input collection was never stored in the event
    #[error("Missing collection: {0}")]
    MissingCollection(&'static str),

    /// An output collection was stored twice for the same event
    #[error("Duplicate collection: {0}")]
    DuplicateCollection(&'static str),
}

/// A single event's worth of collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    id: Uuid,

    /// Trigger-level candidates from the upstream filter
    candidates: Option<Vec<IsolatedTrackCandidate>>,

    /// Tracks from the offline-quality reconstruction pass
    tracks: Option<Vec<RecoTrack>>,

    /// Corrected candidates produced by the associator
    corrected: Option<Vec<CorrectedCandidate>>,
}

impl Event {
    /// Creates an empty event with a fresh id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            candidates: None,
            tracks: None,
            corrected: None,
        }
    }

    /// Creates an event pre-loaded with both input collections.
    pub fn with_inputs(
        candidates: Vec<IsolatedTrackCandidate>,
        tracks: Vec<RecoTrack>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            candidates: Some(candidates),
            tracks: Some(tracks),
            corrected: None,
        }
    }

    /// Returns the event identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stores the trigger candidate collection.
    pub fn set_candidates(&mut self, candidates: Vec<IsolatedTrackCandidate>) {
        self.candidates = Some(candidates);
    }

    /// Stores the reconstructed track collection.
    pub fn set_tracks(&mut self, tracks: Vec<RecoTrack>) {
        self.tracks = Some(tracks);
    }

    /// Trigger candidates, or an error if the filter stage never ran.
    pub fn candidates(&self) -> Result<&[IsolatedTrackCandidate], EventError> {
        self.candidates
            .as_deref()
            .ok_or(EventError::MissingCollection("candidates"))
    }

    /// Reconstructed tracks, or an error if the reconstruction never ran.
    pub fn tracks(&self) -> Result<&[RecoTrack], EventError> {
        self.tracks
            .as_deref()
            .ok_or(EventError::MissingCollection("tracks"))
    }

    /// Stores the corrected candidate collection. One store per event.
    pub fn put_corrected(
        &mut self,
        corrected: Vec<CorrectedCandidate>,
    ) -> Result<(), EventError> {
        if self.corrected.is_some() {
            return Err(EventError::DuplicateCollection("corrected"));
        }
        self.corrected = Some(corrected);
        Ok(())
    }

    /// Corrected candidates, or an error if the associator never ran.
    pub fn corrected(&self) -> Result<&[CorrectedCandidate], EventError> {
        self.corrected
            .as_deref()
            .ok_or(EventError::MissingCollection("corrected"))
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_inputs_are_errors() {
        let event = Event::new();
        assert!(matches!(
            event.candidates(),
            Err(EventError::MissingCollection("candidates"))
        ));
        assert!(matches!(
            event.tracks(),
            Err(EventError::MissingCollection("tracks"))
        ));
    }

    #[test]
    fn test_empty_collection_is_not_missing() {
        let event = Event::with_inputs(Vec::new(), Vec::new());
        assert!(event.candidates().unwrap().is_empty());
        assert!(event.tracks().unwrap().is_empty());
    }

    #[test]
    fn test_double_put_is_rejected() {
        let mut event = Event::new();
        event.put_corrected(Vec::new()).unwrap();
        assert!(matches!(
            event.put_corrected(Vec::new()),
            Err(EventError::DuplicateCollection("corrected"))
        ));
    }
}
