use super::geometry::Axis;
use crate::core::decorators::behavior::ActivityKind;
use crate::core::targets::TargetKind;
use phf::{Map, phf_map};

static TARGET_KIND_KEYWORDS: Map<&'static str, TargetKind> = phf_map! {
    "simple" => TargetKind::Simple,
    "bead" => TargetKind::Simple,
    "beads" => TargetKind::Simple,
    "polymer" => TargetKind::Polymer,
    "polymers" => TargetKind::Polymer,
    "composite" => TargetKind::Composite,
};

static ACTIVITY_KIND_KEYWORDS: Map<&'static str, ActivityKind> = phf_map! {
    "constant-force" => ActivityKind::ConstantForce,
    "linear-force" => ActivityKind::LinearForce,
    "sine-force" => ActivityKind::SineForce,
    "spring-force" => ActivityKind::SpringForce,
    "spring" => ActivityKind::SpringForce,
    "radial-force" => ActivityKind::RadialForce,
    "work-done" => ActivityKind::WorkDone,
    "work" => ActivityKind::WorkDone,
    "centre-of-mass" => ActivityKind::CentreOfMass,
    "center-of-mass" => ActivityKind::CentreOfMass,
    "com" => ActivityKind::CentreOfMass,
};

static AXIS_KEYWORDS: Map<&'static str, Axis> = phf_map! {
    "x" => Axis::X,
    "y" => Axis::Y,
    "z" => Axis::Z,
};

fn normalize(keyword: &str) -> String {
    keyword.trim().to_ascii_lowercase().replace('_', "-")
}

pub fn parse_target_kind(keyword: &str) -> Option<TargetKind> {
    TARGET_KIND_KEYWORDS.get(normalize(keyword).as_str()).copied()
}

pub fn parse_activity_kind(keyword: &str) -> Option<ActivityKind> {
    ACTIVITY_KIND_KEYWORDS
        .get(normalize(keyword).as_str())
        .copied()
}

pub fn parse_axis(keyword: &str) -> Option<Axis> {
    AXIS_KEYWORDS.get(normalize(keyword).as_str()).copied()
}
