use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileRunConfig {
    pub timestep: Option<f64>,
    pub steps: Option<u64>,
    pub first_step: Option<u64>,
    pub rank: Option<usize>,
    pub log_rank: Option<usize>,
    pub sample_period: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FilePolymer {
    #[serde(rename = "type")]
    pub polymer_type: usize,
    /// 1-based bead ids, in chain order.
    pub beads: Vec<usize>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileEntities {
    /// Bead table, relative to the scenario file.
    pub beads: Option<String>,
    #[serde(default)]
    pub polymers: Vec<FilePolymer>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileRegion {
    pub shape: String,
    pub axis: Option<String>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub centre: Option<[f64; 3]>,
    pub radius: Option<f64>,
}

/// One timed command. Which of the optional fields are required depends on
/// `command` and, for `attach-activity`, on `activity`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileCommand {
    #[serde(default)]
    pub step: u64,
    pub command: String,

    pub label: Option<String>,
    pub target: Option<String>,
    pub parent: Option<String>,
    pub child: Option<String>,
    pub bead_type: Option<usize>,
    pub polymer_type: Option<usize>,
    pub region: Option<FileRegion>,

    pub activity: Option<String>,
    pub start: Option<u64>,
    pub end: Option<u64>,
    pub direction: Option<[f64; 3]>,
    pub centre: Option<[f64; 3]>,
    pub magnitude: Option<f64>,
    pub rate: Option<f64>,
    pub amplitude: Option<f64>,
    pub period: Option<u64>,
    pub stiffness: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileOutput {
    pub checkpoint: Option<String>,
    pub samples_dir: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub run: Option<FileRunConfig>,
    pub entities: Option<FileEntities>,
    #[serde(default)]
    pub commands: Vec<FileCommand>,
    pub output: Option<FileOutput>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading scenario from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_full_scenario() {
        let config = FileConfig::parse(
            r#"
            [run]
            timestep = 0.01
            steps = 100
            sample-period = 10

            [entities]
            beads = "beads.csv"
            polymers = [{ type = 1, beads = [1, 2, 3] }]

            [[commands]]
            command = "select-bead-type"
            label = "T"
            bead-type = 3
            region = { shape = "slab", axis = "x", lower = 0.0, upper = 1.0 }

            [[commands]]
            step = 5
            command = "attach-activity"
            activity = "constant-force"
            label = "push"
            target = "T"
            start = 5
            end = 10
            direction = [1.0, 0.0, 0.0]
            magnitude = 2.0

            [output]
            checkpoint = "targets.rst"
            "#,
        )
        .unwrap();

        let run = config.run.unwrap();
        assert_eq!(run.timestep, Some(0.01));
        assert_eq!(run.sample_period, Some(10));
        assert_eq!(config.entities.unwrap().polymers[0].beads, vec![1, 2, 3]);
        assert_eq!(config.commands.len(), 2);
        assert_eq!(config.commands[0].step, 0);
        assert_eq!(config.commands[1].direction, Some([1.0, 0.0, 0.0]));
        assert_eq!(
            config.output.unwrap().checkpoint.as_deref(),
            Some("targets.rst")
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(FileConfig::parse("[run]\ntime-step = 1.0\n").is_err());
        assert!(
            FileConfig::parse("[[commands]]\ncommand = \"create-composite\"\nname = \"C\"\n")
                .is_err()
        );
    }

    #[test]
    fn from_file_reports_parse_errors_with_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[run\n").unwrap();
        assert!(matches!(
            FileConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
        assert!(matches!(
            FileConfig::from_file(&dir.path().join("absent.toml")),
            Err(CliError::Io(_))
        ));
    }
}
