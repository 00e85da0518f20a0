use super::defaults::DefaultsConfig;
use super::file::{FileCommand, FileConfig, FileRegion};
use super::models::{AppConfig, PolymerSpec};
use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use dpdtarget::core::decorators::ActivityWindow;
use dpdtarget::core::decorators::behavior::{
    ActivityKind, Behavior, CentreOfMassProbe, ConstantForce, LinearForce, RadialForce,
    SineForce, SpringForce, WorkMeter,
};
use dpdtarget::core::utils::geometry::Region;
use dpdtarget::core::utils::identifiers::{parse_activity_kind, parse_axis};
use dpdtarget::engine::commands::Command;
use dpdtarget::engine::config::RunConfigBuilder;
use nalgebra::{Point3, Vector3};
use std::path::{Path, PathBuf};

/// Merges the scenario file named by `args` with the command-line overrides.
pub fn build_config(args: &RunArgs) -> Result<AppConfig> {
    let file_config = FileConfig::from_file(&args.config)?;
    let base_dir = args
        .config
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    merge(file_config, args, &base_dir)
}

fn merge(mut file_config: FileConfig, args: &RunArgs, base_dir: &Path) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let run_file = file_config.run.take().unwrap_or_default();
    let run = RunConfigBuilder::new()
        .timestep(
            args.timestep
                .or(run_file.timestep)
                .unwrap_or(defaults.timestep),
        )
        .total_steps(args.steps.or(run_file.steps).unwrap_or(defaults.steps))
        .rank(run_file.rank.unwrap_or(defaults.rank))
        .log_rank(run_file.log_rank.unwrap_or(defaults.log_rank))
        .sample_period(run_file.sample_period.unwrap_or(defaults.sample_period))
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let resolve = |p: &str| -> PathBuf {
        let path = Path::new(p);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    };

    let entities = file_config.entities.take().unwrap_or_default();
    let output = file_config.output.take().unwrap_or_default();

    let commands = file_config
        .commands
        .into_iter()
        .enumerate()
        .map(|(i, c)| convert_command(i + 1, c))
        .collect::<Result<Vec<_>>>()?;

    Ok(AppConfig {
        run,
        first_step: args
            .first_step
            .or(run_file.first_step)
            .unwrap_or(defaults.first_step),
        beads_path: entities.beads.as_deref().map(resolve),
        polymers: entities
            .polymers
            .into_iter()
            .map(|p| PolymerSpec {
                polymer_type: p.polymer_type,
                bead_ids: p.beads,
            })
            .collect(),
        commands,
        restore_path: args.restore.clone(),
        checkpoint_path: args
            .output
            .clone()
            .or_else(|| output.checkpoint.as_deref().map(resolve)),
        samples_dir: args
            .samples_dir
            .clone()
            .or_else(|| output.samples_dir.as_deref().map(resolve)),
    })
}

/// Reports a missing field of the `index`-th command (1-based).
fn require<T>(value: Option<T>, index: usize, command: &str, field: &str) -> Result<T> {
    value.ok_or_else(|| {
        CliError::Config(format!(
            "Command #{} ('{}') requires '{}'.",
            index, command, field
        ))
    })
}

fn convert_command(index: usize, c: FileCommand) -> Result<(u64, Command)> {
    let name = c.command.as_str();
    let label = || require(c.label.clone(), index, name, "label");

    let command = match name {
        "select-bead-type" => Command::SelectBeadType {
            label: label()?,
            bead_type: require(c.bead_type, index, name, "bead-type")?,
            region: c
                .region
                .as_ref()
                .map(|r| convert_region(index, r))
                .transpose()?,
        },
        "select-polymer-type" => Command::SelectPolymerType {
            label: label()?,
            polymer_type: require(c.polymer_type, index, name, "polymer-type")?,
        },
        "create-composite" => Command::CreateComposite { label: label()? },
        "add-target" => Command::AddTarget {
            parent: require(c.parent.clone(), index, name, "parent")?,
            child: require(c.child.clone(), index, name, "child")?,
        },
        "remove-target-from-composite" => Command::RemoveTargetFromComposite {
            parent: require(c.parent.clone(), index, name, "parent")?,
            child: require(c.child.clone(), index, name, "child")?,
        },
        "remove-target" => Command::RemoveTarget { label: label()? },
        "change-bead-type" => Command::ChangeBeadType { label: label()? },
        "restore-previous-bead-type" => Command::RestorePreviousBeadType { label: label()? },
        "restore-original-bead-types" => Command::RestoreOriginalBeadTypes { label: label()? },
        "attach-activity" => {
            let start = c.start.unwrap_or(c.step);
            let end = require(c.end, index, name, "end")?;
            if start > end {
                return Err(CliError::Config(format!(
                    "Command #{} ('{}') has an empty window: start {} > end {}.",
                    index, name, start, end
                )));
            }
            Command::AttachActivity {
                label: label()?,
                target: require(c.target.clone(), index, name, "target")?,
                window: ActivityWindow::new(start, end),
                behavior: convert_behavior(index, &c)?,
            }
        }
        "remove-activity" => Command::RemoveActivity { label: label()? },
        other => {
            return Err(CliError::Config(format!(
                "Command #{} has unknown command '{}'.",
                index, other
            )));
        }
    };
    Ok((c.step, command))
}

fn convert_behavior(index: usize, c: &FileCommand) -> Result<Behavior> {
    let name = "attach-activity";
    let keyword = require(c.activity.as_deref(), index, name, "activity")?;
    let kind = parse_activity_kind(keyword).ok_or_else(|| {
        CliError::Config(format!(
            "Command #{} has unknown activity '{}'.",
            index, keyword
        ))
    })?;
    let direction = || {
        require(c.direction, index, name, "direction").map(|[x, y, z]| Vector3::new(x, y, z))
    };
    let magnitude = || require(c.magnitude, index, name, "magnitude");

    Ok(match kind {
        ActivityKind::ConstantForce => {
            Behavior::ConstantForce(ConstantForce::new(direction()?, magnitude()?))
        }
        ActivityKind::LinearForce => Behavior::LinearForce(LinearForce::new(
            direction()?,
            require(c.rate, index, name, "rate")?,
        )),
        ActivityKind::SineForce => Behavior::SineForce(SineForce::new(
            direction()?,
            require(c.amplitude, index, name, "amplitude")?,
            require(c.period, index, name, "period")?,
        )),
        ActivityKind::SpringForce => Behavior::SpringForce(SpringForce::new(require(
            c.stiffness,
            index,
            name,
            "stiffness",
        )?)),
        ActivityKind::RadialForce => {
            let [x, y, z] = require(c.centre, index, name, "centre")?;
            Behavior::RadialForce(RadialForce::new(Point3::new(x, y, z), magnitude()?))
        }
        ActivityKind::WorkDone => Behavior::WorkDone(WorkMeter::new()),
        ActivityKind::CentreOfMass => Behavior::CentreOfMass(CentreOfMassProbe::new(
            c.period.unwrap_or(1),
        )),
    })
}

fn convert_region(index: usize, r: &FileRegion) -> Result<Region> {
    let name = "select-bead-type";
    match r.shape.as_str() {
        "slab" => {
            let keyword = require(r.axis.as_deref(), index, name, "region.axis")?;
            let axis = parse_axis(keyword).ok_or_else(|| {
                CliError::Config(format!("Command #{} has unknown axis '{}'.", index, keyword))
            })?;
            Ok(Region::Slab {
                axis,
                lower: require(r.lower, index, name, "region.lower")?,
                upper: require(r.upper, index, name, "region.upper")?,
            })
        }
        "sphere" => {
            let [x, y, z] = require(r.centre, index, name, "region.centre")?;
            Ok(Region::Sphere {
                centre: Point3::new(x, y, z),
                radius: require(r.radius, index, name, "region.radius")?,
            })
        }
        other => Err(CliError::Config(format!(
            "Command #{} has unknown region shape '{}'.",
            index, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use dpdtarget::core::utils::geometry::Axis;
    use std::fs;
    use tempfile::tempdir;

    const SCENARIO: &str = r#"
        [run]
        timestep = 0.05
        steps = 20

        [entities]
        beads = "beads.csv"

        [[commands]]
        command = "select-bead-type"
        label = "T"
        bead-type = 3
        region = { shape = "slab", axis = "z", lower = 0.0, upper = 1.0 }

        [[commands]]
        step = 4
        command = "attach-activity"
        activity = "sine-force"
        label = "wave"
        target = "T"
        end = 12
        direction = [0.0, 0.0, 2.0]
        amplitude = 1.5
        period = 8

        [output]
        checkpoint = "out/targets.rst"
    "#;

    fn run_args(extra: &[&str], config: &Path) -> RunArgs {
        let mut argv = vec!["dpdtarget", "run", "-c", config.to_str().unwrap()];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            _ => panic!("Expected 'run' subcommand"),
        }
    }

    #[test]
    fn scenario_is_converted_with_paths_relative_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scenario.toml");
        fs::write(&path, SCENARIO).unwrap();

        let config = build_config(&run_args(&[], &path)).unwrap();
        assert_eq!(config.run.timestep, 0.05);
        assert_eq!(config.run.total_steps, 20);
        assert_eq!(config.run.sample_period, 100);
        assert_eq!(config.first_step, 1);
        assert_eq!(config.beads_path, Some(dir.path().join("beads.csv")));
        assert_eq!(config.checkpoint_path, Some(dir.path().join("out/targets.rst")));

        assert_eq!(
            config.commands[0],
            (
                0,
                Command::SelectBeadType {
                    label: "T".into(),
                    bead_type: 3,
                    region: Some(Region::Slab {
                        axis: Axis::Z,
                        lower: 0.0,
                        upper: 1.0
                    }),
                }
            )
        );
        let (step, attach) = &config.commands[1];
        assert_eq!(*step, 4);
        match attach {
            Command::AttachActivity { window, behavior, .. } => {
                assert_eq!(*window, ActivityWindow::new(4, 12));
                assert_eq!(
                    *behavior,
                    Behavior::SineForce(SineForce::new(Vector3::z(), 1.5, 8))
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_arguments_override_file_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scenario.toml");
        fs::write(&path, SCENARIO).unwrap();

        let args = run_args(&["--steps", "7", "--timestep", "0.2", "-o", "/tmp/x.rst"], &path);
        let config = build_config(&args).unwrap();
        assert_eq!(config.run.total_steps, 7);
        assert_eq!(config.run.timestep, 0.2);
        assert_eq!(config.checkpoint_path, Some(PathBuf::from("/tmp/x.rst")));
    }

    #[test]
    fn missing_command_fields_are_reported() {
        let file = FileConfig::parse("[[commands]]\ncommand = \"add-target\"\nparent = \"C\"\n")
            .unwrap();
        let dir = tempdir().unwrap();
        let args = run_args(&[], &dir.path().join("unused.toml"));
        let result = merge(file, &args, dir.path());
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("'child'")));
    }

    #[test]
    fn unknown_keywords_and_empty_windows_are_rejected() {
        let dir = tempdir().unwrap();
        let args = run_args(&[], &dir.path().join("unused.toml"));
        for scenario in [
            "[[commands]]\ncommand = \"explode\"\n",
            "[[commands]]\ncommand = \"attach-activity\"\nactivity = \"teleport\"\nlabel = \"a\"\ntarget = \"T\"\nend = 3\n",
            "[[commands]]\nstep = 9\ncommand = \"attach-activity\"\nactivity = \"work\"\nlabel = \"a\"\ntarget = \"T\"\nend = 3\n",
        ] {
            let file = FileConfig::parse(scenario).unwrap();
            assert!(matches!(merge(file, &args, dir.path()), Err(CliError::Config(_))));
        }
    }

    #[test]
    fn invalid_timestep_is_a_config_error() {
        let file = FileConfig::parse("[run]\ntimestep = 0.0\n").unwrap();
        let dir = tempdir().unwrap();
        let args = run_args(&[], &dir.path().join("unused.toml"));
        assert!(matches!(merge(file, &args, dir.path()), Err(CliError::Config(_))));
    }
}
