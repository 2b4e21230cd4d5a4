//! IsoTrack Deterministic Simulation Harness
//!
//! Runs the corrector against synthetic events where the truth is known:
//! - **Oracle**: seeded generator for particles, trigger candidates, and
//!   reconstructed tracks (including drop-outs and fakes)
//! - **Scenarios**: named generation setups with acceptance criteria
//! - **Runner**: per-event invariant checks plus efficiency/purity grading
//!
//! All entropy derives from a single 64-bit seed, so any failing run is
//! reproducible from its seed number.

pub mod exporter;
pub mod oracle;
pub mod runner;
pub mod scenarios;

pub use exporter::{AssociationExport, EventFrame, MatchRecord};
pub use oracle::{EventTruth, GenerationConfig, Oracle, TruthParticle};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use scenarios::{ScenarioId, ScenarioParams};
