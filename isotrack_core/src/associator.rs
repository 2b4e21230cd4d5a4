//! The track associator - nearest-in-cone candidate correction.
//!
//! For every trigger-level candidate, scan the reconstructed track collection
//! and pick the track with the smallest angular distance to the candidate's
//! direction, provided that distance is inside the association cone. Each
//! accepted candidate is re-emitted with the matched track's index and a
//! verbatim copy of its isolation measurements.
//!
//! The scan is per-candidate independent: tracks are never consumed, so two
//! candidates may legitimately claim the same track.

use crate::candidate::{CorrectedCandidate, IsolatedTrackCandidate, RecoTrack};
use crate::event::{Event, EventError};
use crate::kinematics::Direction;
use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the TrackAssociator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociatorConfig {
    /// Maximum angular distance (radians) for a track to be accepted as a
    /// match. A candidate with no track inside the cone is dropped.
    pub cone_radius: f64,
}

impl Default for AssociatorConfig {
    fn default() -> Self {
        Self { cone_radius: 0.2 }
    }
}

// ============================================================================
// MATCH RESULT
// ============================================================================

/// A single candidate-to-track match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackMatch {
    /// Position of the selected track in the scanned collection
    pub index: usize,

    /// Angular distance between candidate and track at match time
    pub delta_r: f64,
}

// ============================================================================
// TRACK ASSOCIATOR (The Engine)
// ============================================================================

/// The corrector engine.
///
/// Stateless apart from its configuration: every call reads the two input
/// collections and returns a fresh output, with nothing cached between
/// invocations.
pub struct TrackAssociator {
    config: AssociatorConfig,
}

impl TrackAssociator {
    /// Creates a new associator with the given configuration.
    pub fn new(config: AssociatorConfig) -> Self {
        Self { config }
    }

    /// Creates a new associator with the default 0.2 rad cone.
    pub fn with_defaults() -> Self {
        Self::new(AssociatorConfig::default())
    }

    /// Returns the configured cone radius.
    pub fn cone_radius(&self) -> f64 {
        self.config.cone_radius
    }

    // ========================================================================
    // CORE SCAN
    // ========================================================================

    /// Finds the closest track to `seed` within the cone.
    ///
    /// Tracks are scanned in collection order and the running best is only
    /// replaced on a strictly smaller distance, so an exact tie keeps the
    /// earlier track. A non-finite distance fails both comparisons and is
    /// skipped; a non-positive cone rejects everything.
    pub fn best_match(&self, seed: &Direction, tracks: &[RecoTrack]) -> Option<TrackMatch> {
        let mut best: Option<TrackMatch> = None;

        for (index, track) in tracks.iter().enumerate() {
            let dr = seed.delta_r(&track.direction);
            if dr < self.config.cone_radius && best.map_or(true, |b| dr < b.delta_r) {
                best = Some(TrackMatch { index, delta_r: dr });
            }
        }

        best
    }

    // ========================================================================
    // ASSOCIATION
    // ========================================================================

    /// Corrects a candidate collection against a track collection.
    ///
    /// Output order follows candidate order; candidates with no track inside
    /// the cone are dropped, so the result is an order-preserving subsequence
    /// of the input with at most one entry per candidate.
    pub fn associate(
        &self,
        candidates: &[IsolatedTrackCandidate],
        tracks: &[RecoTrack],
    ) -> Vec<CorrectedCandidate> {
        candidates
            .iter()
            .filter_map(|candidate| {
                self.best_match(&candidate.direction, tracks)
                    .map(|m| CorrectedCandidate::from_seed(candidate, m.index))
            })
            .collect()
    }

    /// Same contract as [`associate`](Self::associate), evaluating candidates
    /// concurrently.
    ///
    /// Each candidate only reads the shared track slice and fills its own
    /// output slot; candidate order is restored by the indexed collect before
    /// unmatched slots are filtered out.
    #[cfg(feature = "parallel")]
    pub fn associate_parallel(
        &self,
        candidates: &[IsolatedTrackCandidate],
        tracks: &[RecoTrack],
    ) -> Vec<CorrectedCandidate> {
        use rayon::prelude::*;

        candidates
            .par_iter()
            .map(|candidate| {
                self.best_match(&candidate.direction, tracks)
                    .map(|m| CorrectedCandidate::from_seed(candidate, m.index))
            })
            .collect::<Vec<Option<CorrectedCandidate>>>()
            .into_iter()
            .flatten()
            .collect()
    }

    // ========================================================================
    // EVENT DRIVER
    // ========================================================================

    /// Runs the correction over one event.
    ///
    /// Fetches both input collections (a missing one surfaces as
    /// [`EventError::MissingCollection`]), associates, and stores the
    /// corrected collection back into the event. Returns the number of
    /// corrected candidates produced.
    pub fn process_event(&self, event: &mut Event) -> Result<usize, EventError> {
        let corrected = {
            let candidates = event.candidates()?;
            let tracks = event.tracks()?;
            self.associate(candidates, tracks)
        };

        let produced = corrected.len();
        event.put_corrected(corrected)?;
        Ok(produced)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use uuid::Uuid;

    fn candidate_at(eta: f64, phi: f64) -> IsolatedTrackCandidate {
        IsolatedTrackCandidate {
            direction: Direction::new(eta, phi),
            l1_seed: Uuid::new_v4(),
            max_pt_pixel: 9.3,
            sum_pt_pixel: 14.1,
            energy_in: 2.4,
            energy_out: 6.8,
            n_hit_in: 3,
            n_hit_out: 9,
            ecal_impact: Some(Direction::new(eta + 0.01, phi - 0.02)),
        }
    }

    #[test]
    fn test_no_tracks_no_output() {
        let associator = TrackAssociator::with_defaults();
        let candidates = vec![candidate_at(0.5, 1.0), candidate_at(-1.2, 2.8)];

        assert!(associator.associate(&candidates, &[]).is_empty());
    }

    #[test]
    fn test_no_candidates_no_output() {
        let associator = TrackAssociator::with_defaults();
        let tracks = vec![RecoTrack::new(10.0, 0.5, 1.0)];

        assert!(associator.associate(&[], &tracks).is_empty());
    }

    #[test]
    fn test_zero_cone_matches_nothing() {
        let associator = TrackAssociator::new(AssociatorConfig { cone_radius: 0.0 });
        let candidates = vec![candidate_at(0.5, 1.0)];
        // Even a track exactly on top of the candidate fails dR < 0
        let tracks = vec![RecoTrack::new(10.0, 0.5, 1.0)];

        assert!(associator.associate(&candidates, &tracks).is_empty());
    }

    #[test]
    fn test_selects_nearest_track_in_cone() {
        let associator = TrackAssociator::with_defaults();
        let candidates = vec![candidate_at(0.5, 1.0)];
        let tracks = vec![
            RecoTrack::new(12.0, 0.9, 1.0),   // dR = 0.4, outside cone
            RecoTrack::new(11.0, 0.52, 1.01), // dR ~ 0.022
        ];

        let out = associator.associate(&candidates, &tracks);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].track_index, 1);

        let m = associator
            .best_match(&candidates[0].direction, &tracks)
            .unwrap();
        assert_relative_eq!(m.delta_r, (0.02f64 * 0.02 + 0.01 * 0.01).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_tight_cone_rejects_all() {
        let associator = TrackAssociator::new(AssociatorConfig { cone_radius: 0.01 });
        let candidates = vec![candidate_at(0.5, 1.0)];
        let tracks = vec![
            RecoTrack::new(11.0, 0.52, 1.01),
            RecoTrack::new(12.0, 0.9, 1.0),
        ];

        assert!(associator.associate(&candidates, &tracks).is_empty());
    }

    #[test]
    fn test_tie_keeps_earlier_track() {
        let associator = TrackAssociator::with_defaults();
        let candidates = vec![candidate_at(0.0, 0.0)];
        // Both tracks at dR = 0.1, on opposite sides in eta
        let tracks = vec![
            RecoTrack::new(10.0, 0.1, 0.0),
            RecoTrack::new(10.0, -0.1, 0.0),
        ];

        let out = associator.associate(&candidates, &tracks);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].track_index, 0);
    }

    #[test]
    fn test_aux_fields_copied_verbatim() {
        let associator = TrackAssociator::with_defaults();
        let candidate = candidate_at(0.5, 1.0);
        let tracks = vec![RecoTrack::new(11.0, 0.52, 1.01)];

        let out = associator.associate(std::slice::from_ref(&candidate), &tracks);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].l1_seed, candidate.l1_seed);
        assert_eq!(out[0].max_pt_pixel, candidate.max_pt_pixel);
        assert_eq!(out[0].sum_pt_pixel, candidate.sum_pt_pixel);
        assert_eq!(out[0].energy_in, candidate.energy_in);
        assert_eq!(out[0].energy_out, candidate.energy_out);
        assert_eq!(out[0].n_hit_in, candidate.n_hit_in);
        assert_eq!(out[0].n_hit_out, candidate.n_hit_out);
        assert_eq!(out[0].ecal_impact, candidate.ecal_impact);
    }

    #[test]
    fn test_missing_ecal_impact_stays_missing() {
        let associator = TrackAssociator::with_defaults();
        let mut candidate = candidate_at(0.5, 1.0);
        candidate.ecal_impact = None;
        let tracks = vec![RecoTrack::new(11.0, 0.52, 1.01)];

        let out = associator.associate(std::slice::from_ref(&candidate), &tracks);
        assert!(out[0].ecal_impact.is_none());
    }

    #[test]
    fn test_non_finite_direction_is_no_match() {
        let associator = TrackAssociator::with_defaults();
        let mut candidate = candidate_at(0.5, 1.0);
        candidate.direction = Direction::new(f64::NAN, 1.0);
        let tracks = vec![RecoTrack::new(11.0, 0.5, 1.0)];

        assert!(associator
            .associate(std::slice::from_ref(&candidate), &tracks)
            .is_empty());

        // Non-finite track directions are skipped, finite ones still match
        let good = candidate_at(0.5, 1.0);
        let mixed = vec![
            RecoTrack::new(9.0, f64::NAN, 1.0),
            RecoTrack::new(11.0, 0.52, 1.01),
        ];
        let out = associator.associate(std::slice::from_ref(&good), &mixed);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].track_index, 1);
    }

    #[test]
    fn test_huge_cone_matches_everything_to_nearest() {
        let associator = TrackAssociator::new(AssociatorConfig {
            cone_radius: std::f64::consts::PI,
        });
        let candidates = vec![candidate_at(2.0, -3.0), candidate_at(-2.0, 3.0)];
        let tracks = vec![
            RecoTrack::new(10.0, 2.1, -3.0),
            RecoTrack::new(10.0, -1.9, 3.0),
        ];

        let out = associator.associate(&candidates, &tracks);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].track_index, 0);
        assert_eq!(out[1].track_index, 1);
    }

    #[test]
    fn test_shared_track_claims_allowed() {
        let associator = TrackAssociator::with_defaults();
        // Two candidates straddling a single track
        let candidates = vec![candidate_at(0.48, 1.0), candidate_at(0.52, 1.0)];
        let tracks = vec![RecoTrack::new(11.0, 0.5, 1.0)];

        let out = associator.associate(&candidates, &tracks);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].track_index, 0);
        assert_eq!(out[1].track_index, 0);
    }

    #[test]
    fn test_output_is_order_preserving_subsequence() {
        let associator = TrackAssociator::with_defaults();
        let orphan = candidate_at(3.0, -2.0); // nothing nearby
        let first = candidate_at(0.5, 1.0);
        let second = candidate_at(-1.0, 0.2);
        let candidates = vec![first.clone(), orphan, second.clone()];
        let tracks = vec![
            RecoTrack::new(11.0, -1.01, 0.21),
            RecoTrack::new(12.0, 0.51, 1.0),
        ];

        let out = associator.associate(&candidates, &tracks);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].l1_seed, first.l1_seed);
        assert_eq!(out[0].track_index, 1);
        assert_eq!(out[1].l1_seed, second.l1_seed);
        assert_eq!(out[1].track_index, 0);
    }

    #[test]
    fn test_process_event_requires_both_inputs() {
        let associator = TrackAssociator::with_defaults();

        let mut no_tracks = Event::new();
        no_tracks.set_candidates(vec![candidate_at(0.5, 1.0)]);
        assert!(matches!(
            associator.process_event(&mut no_tracks),
            Err(EventError::MissingCollection("tracks"))
        ));

        let mut no_candidates = Event::new();
        no_candidates.set_tracks(vec![RecoTrack::new(11.0, 0.5, 1.0)]);
        assert!(matches!(
            associator.process_event(&mut no_candidates),
            Err(EventError::MissingCollection("candidates"))
        ));
    }

    #[test]
    fn test_process_event_stores_output() {
        let associator = TrackAssociator::with_defaults();
        let mut event = Event::with_inputs(
            vec![candidate_at(0.5, 1.0), candidate_at(3.0, -2.0)],
            vec![RecoTrack::new(11.0, 0.52, 1.01)],
        );

        let produced = associator.process_event(&mut event).unwrap();
        assert_eq!(produced, 1);
        assert_eq!(event.corrected().unwrap().len(), 1);
        assert_eq!(event.corrected().unwrap()[0].track_index, 0);

        // Second pass on the same event must refuse to overwrite
        assert!(matches!(
            associator.process_event(&mut event),
            Err(EventError::DuplicateCollection("corrected"))
        ));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let associator = TrackAssociator::with_defaults();
        let candidates: Vec<_> = (0..40)
            .map(|i| candidate_at(-2.0 + 0.1 * i as f64, -3.0 + 0.15 * i as f64))
            .collect();
        let tracks: Vec<_> = (0..25)
            .map(|i| RecoTrack::new(5.0 + i as f64, -2.0 + 0.16 * i as f64, -3.0 + 0.24 * i as f64))
            .collect();

        assert_eq!(
            associator.associate(&candidates, &tracks),
            associator.associate_parallel(&candidates, &tracks)
        );
    }
}
