//! Data model for trigger candidates and reconstructed tracks.
//!
//! An [`IsolatedTrackCandidate`] is produced by the trigger-level filter: an
//! imprecise direction plus the isolation measurements accumulated around it.
//! A [`RecoTrack`] comes from the later reconstruction pass: a precise
//! direction but none of the isolation measurements. A
//! [`CorrectedCandidate`] binds the two together.

use crate::kinematics::Direction;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A trigger-level isolated-track candidate (read-only input).
///
/// Owned by the upstream filter stage; this crate never mutates one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolatedTrackCandidate {
    /// Track direction from the coarse online fit
    pub direction: Direction,

    /// Opaque reference to the level-1 trigger object that seeded this candidate
    pub l1_seed: Uuid,

    /// Highest transverse momentum among nearby pixel tracks (GeV)
    pub max_pt_pixel: f64,

    /// Summed transverse momentum of nearby pixel tracks (GeV)
    pub sum_pt_pixel: f64,

    /// Calorimeter energy sum inside the inner isolation radius (GeV)
    pub energy_in: f64,

    /// Calorimeter energy sum outside the inner isolation radius (GeV)
    pub energy_out: f64,

    /// Hit count inside the inner isolation radius
    pub n_hit_in: u32,

    /// Hit count outside the inner isolation radius
    pub n_hit_out: u32,

    /// Extrapolated impact point on the calorimeter surface, when the
    /// extrapolation succeeded
    pub ecal_impact: Option<Direction>,
}

/// A reconstructed track from the offline-quality pass (read-only input).
///
/// Referenced by its position in the owning collection, never copied into
/// the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoTrack {
    /// Transverse momentum (GeV)
    pub pt: f64,

    /// Fitted track direction
    pub direction: Direction,
}

impl RecoTrack {
    /// Creates a track from transverse momentum and direction.
    pub fn new(pt: f64, eta: f64, phi: f64) -> Self {
        Self {
            pt,
            direction: Direction::new(eta, phi),
        }
    }

    /// Momentum 3-vector [px, py, pz] in GeV.
    pub fn momentum(&self) -> Vector3<f64> {
        let Direction { eta, phi } = self.direction;
        Vector3::new(
            self.pt * phi.cos(),
            self.pt * phi.sin(),
            self.pt * eta.sinh(),
        )
    }
}

/// A candidate rebound to a reconstructed track.
///
/// `track_index` points into the track collection that was scanned at match
/// time. The reference is non-owning: it is only meaningful paired with that
/// same collection, and resolving it against anything else is a logic error
/// upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedCandidate {
    /// Index of the selected track in the input track collection
    pub track_index: usize,

    /// Level-1 seed reference carried over from the source candidate
    pub l1_seed: Uuid,

    /// See [`IsolatedTrackCandidate::max_pt_pixel`]
    pub max_pt_pixel: f64,

    /// See [`IsolatedTrackCandidate::sum_pt_pixel`]
    pub sum_pt_pixel: f64,

    /// See [`IsolatedTrackCandidate::energy_in`]
    pub energy_in: f64,

    /// See [`IsolatedTrackCandidate::energy_out`]
    pub energy_out: f64,

    /// See [`IsolatedTrackCandidate::n_hit_in`]
    pub n_hit_in: u32,

    /// See [`IsolatedTrackCandidate::n_hit_out`]
    pub n_hit_out: u32,

    /// See [`IsolatedTrackCandidate::ecal_impact`]
    pub ecal_impact: Option<Direction>,
}

impl CorrectedCandidate {
    /// Builds the output candidate: the selected track index plus a verbatim
    /// copy of every auxiliary field of the source candidate.
    pub fn from_seed(seed: &IsolatedTrackCandidate, track_index: usize) -> Self {
        Self {
            track_index,
            l1_seed: seed.l1_seed,
            max_pt_pixel: seed.max_pt_pixel,
            sum_pt_pixel: seed.sum_pt_pixel,
            energy_in: seed.energy_in,
            energy_out: seed.energy_out,
            n_hit_in: seed.n_hit_in,
            n_hit_out: seed.n_hit_out,
            ecal_impact: seed.ecal_impact,
        }
    }

    /// Resolves the track reference against the collection used at match time.
    pub fn resolve<'a>(&self, tracks: &'a [RecoTrack]) -> Option<&'a RecoTrack> {
        tracks.get(self.track_index)
    }
}
