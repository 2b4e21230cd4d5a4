//! Ground truth oracle for simulation.
//!
//! The Oracle maintains the "God's eye view" of a simulated event:
//! - True particle directions within tracker acceptance
//! - Coarse trigger candidates (heavily smeared directions + isolation fields)
//! - Fine reconstructed tracks (lightly smeared) plus fake tracks
//!
//! It remembers which candidate and which track stem from the same true
//! particle, so the runner can score efficiency and purity.

use isotrack_core::{Direction, IsolatedTrackCandidate, RecoTrack};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;
use uuid::Uuid;

/// Tracker acceptance in pseudorapidity.
const ETA_MAX: f64 = 2.4;

/// A true particle in the simulated event.
#[derive(Debug, Clone)]
pub struct TruthParticle {
    /// Unique particle ID
    pub id: u64,

    /// True transverse momentum (GeV)
    pub pt: f64,

    /// True direction
    pub direction: Direction,
}

/// Generation knobs for one event.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Number of true particles per event
    pub particles: usize,

    /// Number of fake reconstructed tracks per event
    pub fakes: usize,

    /// Probability that a true particle leaves no reconstructed track
    pub track_drop_prob: f64,

    /// Angular smearing (per axis) of the trigger candidate direction
    pub candidate_sigma: f64,

    /// Angular smearing (per axis) of the reconstructed track direction
    pub track_sigma: f64,
}

/// One generated event with its truth bookkeeping.
#[derive(Debug, Clone)]
pub struct EventTruth {
    /// Trigger-level candidates, one per true particle
    pub candidates: Vec<IsolatedTrackCandidate>,

    /// Particle ID behind each candidate (parallel to `candidates`)
    pub candidate_truth: Vec<u64>,

    /// Reconstructed tracks in shuffled collection order
    pub tracks: Vec<RecoTrack>,

    /// Particle ID behind each track, `None` for fakes (parallel to `tracks`)
    pub track_truth: Vec<Option<u64>>,
}

impl EventTruth {
    /// Returns true if the particle behind candidate `i` left a track.
    pub fn is_matchable(&self, candidate_index: usize) -> bool {
        let pid = self.candidate_truth[candidate_index];
        self.track_truth.iter().any(|t| *t == Some(pid))
    }
}

/// The Oracle - generates events and keeps the truth.
pub struct Oracle {
    /// RNG for all event generation
    rng: ChaCha8Rng,

    /// Next particle ID
    next_id: u64,
}

impl Oracle {
    /// Creates an oracle from a physics seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_id: 0,
        }
    }

    /// Generates one event: particles, their trigger candidates, and the
    /// reconstructed track collection (true tracks minus drop-outs, plus
    /// fakes, shuffled).
    pub fn generate_event(&mut self, config: &GenerationConfig) -> EventTruth {
        let particles = self.spawn_particles(config.particles);

        let candidate_smear = Normal::new(0.0, config.candidate_sigma.max(1e-6))
            .expect("candidate smearing width");
        let track_smear =
            Normal::new(0.0, config.track_sigma.max(1e-6)).expect("track smearing width");

        let mut candidates = Vec::with_capacity(particles.len());
        let mut candidate_truth = Vec::with_capacity(particles.len());
        for particle in &particles {
            candidates.push(self.make_candidate(particle, &candidate_smear));
            candidate_truth.push(particle.id);
        }

        let mut tagged_tracks: Vec<(RecoTrack, Option<u64>)> = Vec::new();
        for particle in &particles {
            if self.rng.gen_bool(1.0 - config.track_drop_prob) {
                tagged_tracks.push((self.make_track(particle, &track_smear), Some(particle.id)));
            }
        }
        for _ in 0..config.fakes {
            tagged_tracks.push((self.make_fake_track(), None));
        }
        tagged_tracks.shuffle(&mut self.rng);

        let (tracks, track_truth) = tagged_tracks.into_iter().unzip();

        EventTruth {
            candidates,
            candidate_truth,
            tracks,
            track_truth,
        }
    }

    fn spawn_particles(&mut self, count: usize) -> Vec<TruthParticle> {
        (0..count)
            .map(|_| {
                let id = self.next_id;
                self.next_id += 1;
                TruthParticle {
                    id,
                    pt: self.rng.gen_range(5.0..60.0),
                    direction: Direction::new(
                        self.rng.gen_range(-ETA_MAX..ETA_MAX),
                        self.rng.gen_range(-PI..PI),
                    ),
                }
            })
            .collect()
    }

    fn make_candidate(
        &mut self,
        particle: &TruthParticle,
        smear: &Normal<f64>,
    ) -> IsolatedTrackCandidate {
        let direction = self.smeared(particle.direction, smear);
        let max_pt_pixel = particle.pt * self.rng.gen_range(0.6..1.0);

        // Calorimeter extrapolation occasionally fails online
        let ecal_impact = if self.rng.gen_bool(0.85) {
            Some(self.smeared(particle.direction, smear))
        } else {
            None
        };

        IsolatedTrackCandidate {
            direction,
            l1_seed: Uuid::from_u128(self.rng.gen()),
            max_pt_pixel,
            sum_pt_pixel: max_pt_pixel * self.rng.gen_range(1.0..1.5),
            energy_in: self.rng.gen_range(0.0..5.0),
            energy_out: self.rng.gen_range(0.0..12.0),
            n_hit_in: self.rng.gen_range(1..6),
            n_hit_out: self.rng.gen_range(4..20),
            ecal_impact,
        }
    }

    fn make_track(&mut self, particle: &TruthParticle, smear: &Normal<f64>) -> RecoTrack {
        let direction = self.smeared(particle.direction, smear);
        RecoTrack {
            pt: particle.pt * self.rng.gen_range(0.95..1.05),
            direction,
        }
    }

    fn make_fake_track(&mut self) -> RecoTrack {
        RecoTrack::new(
            self.rng.gen_range(0.5..10.0),
            self.rng.gen_range(-ETA_MAX..ETA_MAX),
            self.rng.gen_range(-PI..PI),
        )
    }

    fn smeared(&mut self, truth: Direction, smear: &Normal<f64>) -> Direction {
        Direction::new(
            truth.eta + smear.sample(&mut self.rng),
            truth.phi + smear.sample(&mut self.rng),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GenerationConfig {
        GenerationConfig {
            particles: 8,
            fakes: 4,
            track_drop_prob: 0.25,
            candidate_sigma: 0.03,
            track_sigma: 0.005,
        }
    }

    #[test]
    fn test_same_seed_same_event() {
        let mut a = Oracle::new(7);
        let mut b = Oracle::new(7);

        let ea = a.generate_event(&config());
        let eb = b.generate_event(&config());

        assert_eq!(ea.candidates, eb.candidates);
        assert_eq!(ea.tracks, eb.tracks);
        assert_eq!(ea.track_truth, eb.track_truth);
    }

    #[test]
    fn test_collection_shapes() {
        let mut oracle = Oracle::new(42);
        let truth = oracle.generate_event(&config());

        assert_eq!(truth.candidates.len(), 8);
        assert_eq!(truth.candidates.len(), truth.candidate_truth.len());
        assert_eq!(truth.tracks.len(), truth.track_truth.len());
        // True tracks can be dropped but fakes are always there
        assert!(truth.tracks.len() >= 4);
        assert!(truth.tracks.len() <= 12);
    }

    #[test]
    fn test_full_dropout_leaves_only_fakes() {
        let mut oracle = Oracle::new(3);
        let truth = oracle.generate_event(&GenerationConfig {
            track_drop_prob: 1.0,
            fakes: 3,
            ..config()
        });

        assert_eq!(truth.tracks.len(), 3);
        assert!(truth.track_truth.iter().all(|t| t.is_none()));
        assert!(!truth.is_matchable(0));
    }
}
