//! IsoTrack Core - Isolated-Track Trigger Candidate Correction
//!
//! This library rebinds coarse trigger-level track candidates to the best
//! matching track from a later, higher-quality reconstruction pass:
//! 1. **Kinematics**: eta/phi directions and the combined angular metric (dR)
//! 2. **Data Model**: trigger candidates, reconstructed tracks, corrected output
//! 3. **Association**: nearest-in-cone matching, one corrected candidate per seed

pub mod associator;
pub mod candidate;
pub mod event;
pub mod kinematics;

// Re-export key types for convenience
pub use associator::{AssociatorConfig, TrackAssociator, TrackMatch};
pub use candidate::{CorrectedCandidate, IsolatedTrackCandidate, RecoTrack};
pub use event::{Event, EventError};
pub use kinematics::Direction;
