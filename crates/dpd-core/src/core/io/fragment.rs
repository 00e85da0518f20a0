//! The target/decoration fragment of a simulation checkpoint.
//!
//! Layout (whitespace-separated scalars, one record per line):
//!
//! ```text
//! targetCount
//! kind id label                      # per target
//!   simple:    currentType originalType / typeLogSize / (newType oldType)* / beadCount / beadId*
//!   polymer:   polymerType / polymerCount / polymerId*
//!   composite: childCount / (childId childLabel)*
//! chainCount
//! baseLabel decoratorCount           # per decorated target
//!   kind label start end / params    # per decorator, innermost first
//! ```
//!
//! Bead and polymer ids are the 1-based persisted ids of the entity store.
//! Reading yields a [`RestartFragment`] whose references are still plain ids;
//! [`RestartFragment::resolve`] turns it into live targets once the entity store
//! has been loaded.

use super::factory::TargetFactory;
use super::restart::{RestartError, RestartReader, check_label};
use crate::core::decorators::behavior::{
    Behavior, CentreOfMassProbe, ConstantForce, LinearForce, RadialForce, SineForce, SpringForce,
    WorkMeter,
};
use crate::core::decorators::set::DecorationSet;
use crate::core::decorators::ActivityWindow;
use crate::core::models::ids::{TargetId, TargetKey};
use crate::core::models::store::EntityStore;
use crate::core::targets::composite::CompositeTarget;
use crate::core::targets::polymer::PolymerTarget;
use crate::core::targets::registry::TargetRegistry;
use crate::core::targets::simple::SimpleTarget;
use crate::core::targets::Target;
use crate::core::utils::identifiers::{parse_activity_kind, parse_target_kind};
use nalgebra::{Point3, Vector3};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use tracing::debug;

/// Payload of a target as read from disk, with entity references still unresolved.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UnresolvedPayload {
    Simple {
        current_type: usize,
        original_type: usize,
        type_log: BTreeMap<usize, usize>,
        bead_ids: Vec<usize>,
    },
    Polymer {
        polymer_type: usize,
        polymer_ids: Vec<usize>,
    },
    Composite {
        children: Vec<(usize, String)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UnresolvedTarget {
    id: usize,
    label: String,
    payload: UnresolvedPayload,
}

#[derive(Debug, Clone, PartialEq)]
struct UnresolvedDecorator {
    label: String,
    window: ActivityWindow,
    behavior: Behavior,
}

#[derive(Debug, Clone, PartialEq)]
struct UnresolvedChain {
    base_label: String,
    decorators: Vec<UnresolvedDecorator>,
}

/// A fully parsed but not yet resolved checkpoint fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct RestartFragment {
    targets: Vec<UnresolvedTarget>,
    chains: Vec<UnresolvedChain>,
}

// --- Writing ---

/// Writes every target of `registry` in id order, followed by the active decoration chains.
pub fn write_fragment(
    registry: &TargetRegistry,
    decorations: &DecorationSet,
    writer: &mut impl Write,
) -> Result<(), RestartError> {
    let targets = registry.iter();
    writeln!(writer, "{}", targets.len())?;
    for (_, target) in targets {
        writeln!(
            writer,
            "{} {} {}",
            target.kind(),
            target.id(),
            check_label(target.label())?
        )?;
        match target {
            Target::Simple(s) => write_simple(s, writer)?,
            Target::Polymer(p) => write_polymer(p, writer)?,
            Target::Composite(c) => write_composite(c, registry, writer)?,
        }
    }

    writeln!(writer, "{}", decorations.len())?;
    for (base_label, chain) in decorations.chains() {
        let decorators = chain.decorators();
        writeln!(writer, "{} {}", check_label(base_label)?, decorators.len())?;
        for d in decorators {
            let window = d.window();
            writeln!(
                writer,
                "{} {} {} {}",
                d.behavior().kind(),
                check_label(d.label())?,
                window.start,
                window.end
            )?;
            write_behavior(d.behavior(), writer)?;
        }
    }
    Ok(())
}

fn write_ids(ids: impl Iterator<Item = usize>, writer: &mut impl Write) -> std::io::Result<()> {
    let line: Vec<String> = ids.map(|id| id.to_string()).collect();
    writeln!(writer, "{}", line.join(" "))
}

fn write_simple(target: &SimpleTarget, writer: &mut impl Write) -> Result<(), RestartError> {
    writeln!(writer, "{} {}", target.current_type(), target.original_type())?;
    writeln!(writer, "{}", target.type_log().len())?;
    for (new_type, old_type) in target.type_log() {
        writeln!(writer, "{} {}", new_type, old_type)?;
    }
    writeln!(writer, "{}", target.bead_total())?;
    write_ids(target.beads().iter().map(|b| b.persisted_id()), writer)?;
    Ok(())
}

fn write_polymer(target: &PolymerTarget, writer: &mut impl Write) -> Result<(), RestartError> {
    writeln!(writer, "{}", target.polymer_type())?;
    writeln!(writer, "{}", target.polymer_total())?;
    write_ids(target.polymers().iter().map(|p| p.persisted_id()), writer)?;
    Ok(())
}

fn write_composite(
    target: &CompositeTarget,
    registry: &TargetRegistry,
    writer: &mut impl Write,
) -> Result<(), RestartError> {
    let children: Vec<(&str, TargetId)> = target
        .children()
        .filter_map(|(label, key)| registry.get(key).map(|t| (label, t.id())))
        .collect();
    writeln!(writer, "{}", children.len())?;
    for (label, id) in children {
        writeln!(writer, "{} {}", id, check_label(label)?)?;
    }
    Ok(())
}

fn write_vector(v: &Vector3<f64>, writer: &mut impl Write) -> std::io::Result<()> {
    write!(writer, "{} {} {}", v.x, v.y, v.z)
}

fn write_behavior(behavior: &Behavior, writer: &mut impl Write) -> Result<(), RestartError> {
    match behavior {
        Behavior::ConstantForce(f) => {
            write_vector(&f.direction, writer)?;
            writeln!(writer, " {}", f.magnitude)?;
        }
        Behavior::LinearForce(f) => {
            write_vector(&f.direction, writer)?;
            writeln!(writer, " {}", f.rate)?;
        }
        Behavior::SineForce(f) => {
            write_vector(&f.direction, writer)?;
            writeln!(writer, " {} {}", f.amplitude, f.period)?;
        }
        Behavior::SpringForce(f) => {
            writeln!(writer, "{} {}", f.stiffness, f.anchors.len())?;
            for anchor in &f.anchors {
                writeln!(writer, "{} {} {}", anchor.x, anchor.y, anchor.z)?;
            }
        }
        Behavior::RadialForce(f) => {
            write_vector(&f.centre.coords, writer)?;
            writeln!(writer, " {}", f.magnitude)?;
        }
        Behavior::WorkDone(m) => writeln!(writer, "{}", m.total)?,
        Behavior::CentreOfMass(p) => writeln!(writer, "{}", p.period)?,
    }
    Ok(())
}

// --- Reading ---

pub(crate) fn read_simple_payload(
    r: &mut RestartReader<'_>,
) -> Result<UnresolvedPayload, RestartError> {
    let current_type = r.read_count("current bead type")?;
    let original_type = r.read_count("original bead type")?;
    let log_size = r.read_count("type log size")?;
    let mut type_log = BTreeMap::new();
    for _ in 0..log_size {
        let new_type = r.read_count("type log new type")?;
        let old_type = r.read_count("type log old type")?;
        if new_type == old_type {
            return Err(r.invalid("type log entry", format!("type {new_type} maps onto itself")));
        }
        if type_log.insert(new_type, old_type).is_some() {
            return Err(r.invalid(
                "type log entry",
                format!("type {new_type} is logged twice"),
            ));
        }
    }
    let bead_count = r.read_count("bead count")?;
    let bead_ids = r.read_counts(bead_count, "bead id")?;
    Ok(UnresolvedPayload::Simple {
        current_type,
        original_type,
        type_log,
        bead_ids,
    })
}

pub(crate) fn read_polymer_payload(
    r: &mut RestartReader<'_>,
) -> Result<UnresolvedPayload, RestartError> {
    let polymer_type = r.read_count("polymer type")?;
    let count = r.read_count("polymer count")?;
    let polymer_ids = r.read_counts(count, "polymer id")?;
    Ok(UnresolvedPayload::Polymer {
        polymer_type,
        polymer_ids,
    })
}

pub(crate) fn read_composite_payload(
    r: &mut RestartReader<'_>,
) -> Result<UnresolvedPayload, RestartError> {
    let count = r.read_count("child count")?;
    let mut children = Vec::new();
    for _ in 0..count {
        let id = r.read_count("child id")?;
        let label = r.read_token("child label")?;
        children.push((id, label));
    }
    Ok(UnresolvedPayload::Composite { children })
}

fn read_vector(r: &mut RestartReader<'_>, field: &'static str) -> Result<Vector3<f64>, RestartError> {
    Ok(Vector3::new(
        r.read_f64(field)?,
        r.read_f64(field)?,
        r.read_f64(field)?,
    ))
}

pub(crate) fn read_constant_force(r: &mut RestartReader<'_>) -> Result<Behavior, RestartError> {
    Ok(Behavior::ConstantForce(ConstantForce {
        direction: read_vector(r, "force direction")?,
        magnitude: r.read_f64("force magnitude")?,
    }))
}

pub(crate) fn read_linear_force(r: &mut RestartReader<'_>) -> Result<Behavior, RestartError> {
    Ok(Behavior::LinearForce(LinearForce {
        direction: read_vector(r, "force direction")?,
        rate: r.read_f64("force rate")?,
    }))
}

pub(crate) fn read_sine_force(r: &mut RestartReader<'_>) -> Result<Behavior, RestartError> {
    let direction = read_vector(r, "force direction")?;
    let amplitude = r.read_f64("force amplitude")?;
    let period = r.read_u64("force period")?;
    if period == 0 {
        return Err(r.invalid("force period", "period must be positive"));
    }
    Ok(Behavior::SineForce(SineForce {
        direction,
        amplitude,
        period,
    }))
}

pub(crate) fn read_spring_force(r: &mut RestartReader<'_>) -> Result<Behavior, RestartError> {
    let stiffness = r.read_f64("spring stiffness")?;
    let count = r.read_count("anchor count")?;
    let anchors = (0..count)
        .map(|_| read_vector(r, "anchor position").map(Point3::from))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Behavior::SpringForce(SpringForce { stiffness, anchors }))
}

pub(crate) fn read_radial_force(r: &mut RestartReader<'_>) -> Result<Behavior, RestartError> {
    Ok(Behavior::RadialForce(RadialForce {
        centre: Point3::from(read_vector(r, "radial centre")?),
        magnitude: r.read_f64("force magnitude")?,
    }))
}

pub(crate) fn read_work_done(r: &mut RestartReader<'_>) -> Result<Behavior, RestartError> {
    Ok(Behavior::WorkDone(WorkMeter {
        total: r.read_f64("accumulated work")?,
        samples: Vec::new(),
    }))
}

pub(crate) fn read_centre_of_mass(r: &mut RestartReader<'_>) -> Result<Behavior, RestartError> {
    let period = r.read_u64("sample period")?;
    if period == 0 {
        return Err(r.invalid("sample period", "period must be positive"));
    }
    Ok(Behavior::CentreOfMass(CentreOfMassProbe::new(period)))
}

impl RestartFragment {
    /// Parses a whole fragment. Nothing is resolved against the entity store yet.
    pub fn read(
        reader: &mut RestartReader<'_>,
        factory: &TargetFactory,
    ) -> Result<Self, RestartError> {
        let target_count = reader.read_count("target count")?;
        let mut targets = Vec::new();
        for _ in 0..target_count {
            let keyword = reader.read_token("target kind")?;
            let kind = parse_target_kind(&keyword)
                .ok_or_else(|| reader.unknown_kind("target", keyword.clone()))?;
            let reader_fn = factory
                .target_reader(kind)
                .ok_or_else(|| reader.unknown_kind("target", keyword))?;
            let id = reader.read_count("target id")?;
            let label = reader.read_token("target label")?;
            let payload = reader_fn(reader)?;
            targets.push(UnresolvedTarget { id, label, payload });
        }

        let chain_count = reader.read_count("decoration chain count")?;
        let mut chains = Vec::new();
        for _ in 0..chain_count {
            let base_label = reader.read_token("decorated target label")?;
            let count = reader.read_count("decorator count")?;
            let mut decorators = Vec::new();
            for _ in 0..count {
                let keyword = reader.read_token("activity kind")?;
                let kind = parse_activity_kind(&keyword)
                    .ok_or_else(|| reader.unknown_kind("activity", keyword.clone()))?;
                let reader_fn = factory
                    .activity_reader(kind)
                    .ok_or_else(|| reader.unknown_kind("activity", keyword))?;
                let label = reader.read_token("activity label")?;
                let start = reader.read_u64("window start")?;
                let end = reader.read_u64("window end")?;
                if start > end {
                    return Err(reader.invalid("activity window", format!("{start} > {end}")));
                }
                let behavior = reader_fn(reader)?;
                decorators.push(UnresolvedDecorator {
                    label,
                    window: ActivityWindow::new(start, end),
                    behavior,
                });
            }
            chains.push(UnresolvedChain {
                base_label,
                decorators,
            });
        }

        Ok(Self { targets, chains })
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Resolves every persisted reference against a fully populated entity store.
    ///
    /// Simple and polymer targets are built first, then every composite is
    /// created empty and its children are linked by id through
    /// [`TargetRegistry::add_child`], so the containment checks run again.
    /// Decoration chains are re-attached innermost first.
    pub fn resolve(
        self,
        store: &EntityStore,
    ) -> Result<(TargetRegistry, DecorationSet), RestartError> {
        let mut registry = TargetRegistry::new();
        let mut by_id: HashMap<usize, TargetKey> = HashMap::new();
        let mut composites = Vec::new();

        let (leaves, branches): (Vec<_>, Vec<_>) = self
            .targets
            .into_iter()
            .partition(|t| !matches!(t.payload, UnresolvedPayload::Composite { .. }));

        for t in leaves.into_iter().chain(branches) {
            if by_id.contains_key(&t.id) {
                return Err(RestartError::DuplicateTargetId(t.id));
            }
            let id = TargetId(t.id);
            let target = match t.payload {
                UnresolvedPayload::Simple {
                    current_type,
                    original_type,
                    type_log,
                    bead_ids,
                } => {
                    let beads = bead_ids
                        .into_iter()
                        .map(|bid| {
                            store
                                .lookup_bead_by_id(bid)
                                .ok_or(RestartError::UnknownBead(bid))
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    Target::Simple(SimpleTarget::from_parts(
                        id,
                        t.label,
                        current_type,
                        original_type,
                        type_log,
                        beads,
                    ))
                }
                UnresolvedPayload::Polymer {
                    polymer_type,
                    polymer_ids,
                } => {
                    let polymers = polymer_ids
                        .into_iter()
                        .map(|pid| {
                            store
                                .lookup_polymer_by_id(pid)
                                .ok_or(RestartError::UnknownPolymer(pid))
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    Target::Polymer(PolymerTarget::new(id, &t.label, polymer_type, polymers))
                }
                UnresolvedPayload::Composite { children } => {
                    composites.push((t.id, children));
                    Target::Composite(CompositeTarget::new(id, &t.label))
                }
            };
            let key = registry.insert_restored(target)?;
            by_id.insert(t.id, key);
        }

        for (parent_id, children) in composites {
            let parent = by_id[&parent_id];
            for (child_id, child_label) in children {
                let child = *by_id
                    .get(&child_id)
                    .ok_or(RestartError::UnknownTarget(child_id))?;
                if registry.get(child).map(Target::label) != Some(child_label.as_str()) {
                    return Err(RestartError::ChildMismatch {
                        id: child_id,
                        label: child_label,
                    });
                }
                registry.add_child(parent, child)?;
            }
        }

        let mut decorations = DecorationSet::new();
        for chain in self.chains {
            let base = registry
                .find(&chain.base_label)
                .ok_or_else(|| RestartError::UnknownTargetLabel(chain.base_label.clone()))?;
            for d in chain.decorators {
                decorations.attach(&d.label, base, &chain.base_label, d.window, d.behavior)?;
            }
        }

        debug!(
            targets = registry.len(),
            chains = decorations.len(),
            "Resolved restart fragment"
        );
        Ok((registry, decorations))
    }
}
