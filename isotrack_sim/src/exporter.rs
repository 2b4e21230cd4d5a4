//! JSON exporter for association results.
//!
//! Dumps per-event match lists so a run can be inspected offline.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// One candidate-to-track match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Candidate position in the event's candidate collection
    pub candidate: usize,

    /// Selected track position in the event's track collection
    pub track: usize,

    /// Angular distance at match time
    pub delta_r: f64,
}

/// A single event's association outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFrame {
    /// Event counter within the run
    pub event: usize,

    /// Input candidate count
    pub candidates: usize,

    /// Input track count
    pub tracks: usize,

    /// Matches found
    pub matches: Vec<MatchRecord>,
}

/// Complete run export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Cone radius used
    pub cone_radius: f64,

    /// All event frames
    pub frames: Vec<EventFrame>,

    /// Final result
    pub passed: bool,

    /// Final efficiency if applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,

    /// Final purity if applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purity: Option<f64>,
}

impl AssociationExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64, cone_radius: f64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            cone_radius,
            frames: Vec::new(),
            passed: false,
            efficiency: None,
            purity: None,
        }
    }

    /// Adds an event frame.
    pub fn add_frame(&mut self, frame: EventFrame) {
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, efficiency: Option<f64>, purity: Option<f64>) {
        self.passed = passed;
        self.efficiency = efficiency;
        self.purity = purity;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
