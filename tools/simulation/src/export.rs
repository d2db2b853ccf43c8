//! Report export
//!
//! Serializes round reports and scenario results to JSON for external
//! consumption.

use crate::config::SimulationConfig;
use crate::engine::RoundReport;
use crate::scenarios::ScenarioResult;
use serde::{Deserialize, Serialize};

/// Combined export containing all simulation outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationExport {
    pub version: String,
    pub config: SimulationConfig,
    pub report: RoundReport,
    pub scenarios: Vec<ScenarioResult>,
}

/// Build a complete simulation export.
pub fn build_export(
    config: &SimulationConfig,
    report: &RoundReport,
    scenarios: Vec<ScenarioResult>,
) -> SimulationExport {
    SimulationExport {
        version: crate::VERSION.to_string(),
        config: config.clone(),
        report: report.clone(),
        scenarios,
    }
}

/// Export complete simulation data as JSON.
pub fn export_json(export: &SimulationExport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(export)
}

/// Write export to a file path.
pub fn write_to_file(export: &SimulationExport, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
    let json = export_json(export)?;
    std::fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RoundSimulator;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            participants: 5,
            transfers: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_build_export() {
        let config = small_config();
        let report = RoundSimulator::run(config.clone()).unwrap();
        let export = build_export(&config, &report, Vec::new());
        assert_eq!(export.version, crate::VERSION);
        assert_eq!(export.report.transfers, 10);
    }

    #[test]
    fn test_amounts_exported_as_strings() {
        let config = small_config();
        let report = RoundSimulator::run(config.clone()).unwrap();
        let json = export_json(&build_export(&config, &report, Vec::new())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["report"]["pool"].is_string());
        assert_eq!(value["report"]["status_trace"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn test_write_to_file() {
        let config = small_config();
        let report = RoundSimulator::run(config.clone()).unwrap();
        let export = build_export(&config, &report, Vec::new());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("round.json");
        write_to_file(&export, &path).unwrap();

        let parsed: SimulationExport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.report, report);
    }
}
