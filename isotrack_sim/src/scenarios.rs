//! Named association scenarios.

use crate::oracle::GenerationConfig;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// ASC-001: Well-separated particles, a couple of fakes
    Clean,

    /// ASC-002: Heavy fake-track pileup around real particles
    Pileup,

    /// ASC-003: Half the particles leave no reconstructed track
    Orphans,

    /// ASC-004: Empty track collection
    NoTracks,

    /// ASC-005: Cone far below the trigger direction resolution
    TightCone,

    /// ASC-006: Cone wide enough to accept everything
    WideCone,
}

/// Scenario-level generation and association settings.
#[derive(Debug, Clone)]
pub struct ScenarioParams {
    /// Event generation knobs
    pub generation: GenerationConfig,

    /// Association cone radius (radians)
    pub cone_radius: f64,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Clean,
            ScenarioId::Pileup,
            ScenarioId::Orphans,
            ScenarioId::NoTracks,
            ScenarioId::TightCone,
            ScenarioId::WideCone,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Clean => "clean",
            ScenarioId::Pileup => "pileup",
            ScenarioId::Orphans => "orphans",
            ScenarioId::NoTracks => "no_tracks",
            ScenarioId::TightCone => "tight_cone",
            ScenarioId::WideCone => "wide_cone",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Clean => "8 particles, 2 fakes, every candidate should rebind cleanly",
            ScenarioId::Pileup => "80 fake tracks, nearest-in-cone must still pick the real one",
            ScenarioId::Orphans => "50% tracking drop-out, orphaned candidates must fall away",
            ScenarioId::NoTracks => "no reconstructed tracks at all, output must be empty",
            ScenarioId::TightCone => "0.01 rad cone against 0.05 rad trigger resolution",
            ScenarioId::WideCone => "pi-wide cone degrades to match-everything-to-nearest",
        }
    }

    /// Returns the generation and association settings for this scenario.
    pub fn params(&self) -> ScenarioParams {
        let base = GenerationConfig {
            particles: 8,
            fakes: 2,
            track_drop_prob: 0.0,
            candidate_sigma: 0.03,
            track_sigma: 0.005,
        };

        match self {
            ScenarioId::Clean => ScenarioParams {
                generation: base,
                cone_radius: 0.2,
            },
            ScenarioId::Pileup => ScenarioParams {
                generation: GenerationConfig {
                    particles: 10,
                    fakes: 80,
                    ..base
                },
                cone_radius: 0.2,
            },
            ScenarioId::Orphans => ScenarioParams {
                generation: GenerationConfig {
                    particles: 10,
                    track_drop_prob: 0.5,
                    ..base
                },
                cone_radius: 0.2,
            },
            ScenarioId::NoTracks => ScenarioParams {
                generation: GenerationConfig {
                    particles: 6,
                    fakes: 0,
                    track_drop_prob: 1.0,
                    ..base
                },
                cone_radius: 0.2,
            },
            ScenarioId::TightCone => ScenarioParams {
                generation: GenerationConfig {
                    candidate_sigma: 0.05,
                    ..base
                },
                cone_radius: 0.01,
            },
            ScenarioId::WideCone => ScenarioParams {
                generation: GenerationConfig {
                    particles: 6,
                    fakes: 6,
                    ..base
                },
                cone_radius: std::f64::consts::PI,
            },
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clean" | "asc-001" => Ok(ScenarioId::Clean),
            "pileup" | "asc-002" => Ok(ScenarioId::Pileup),
            "orphans" | "asc-003" => Ok(ScenarioId::Orphans),
            "no_tracks" | "notracks" | "asc-004" => Ok(ScenarioId::NoTracks),
            "tight_cone" | "tightcone" | "asc-005" => Ok(ScenarioId::TightCone),
            "wide_cone" | "widecone" | "asc-006" => Ok(ScenarioId::WideCone),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
