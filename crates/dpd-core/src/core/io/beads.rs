use crate::core::models::bead::Bead;
use crate::core::models::ids::PolymerRef;
use crate::core::models::store::EntityStore;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// One row of a bead table. Velocity defaults to rest and mass to 1.
#[derive(Debug, Deserialize, Clone)]
struct BeadRecord {
    #[serde(rename = "type")]
    bead_type: usize,
    x: f64,
    y: f64,
    z: f64,
    #[serde(default)]
    vx: f64,
    #[serde(default)]
    vy: f64,
    #[serde(default)]
    vz: f64,
    #[serde(default = "unit_mass")]
    mass: f64,
}

fn unit_mass() -> f64 {
    1.0
}

#[derive(Debug, Error)]
pub enum EntityLoadError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Bead on row {row} of '{path}' has non-positive mass {mass}")]
    InvalidMass { path: String, row: usize, mass: f64 },
    #[error("Polymer #{polymer} refers to unknown bead id {bead}")]
    UnknownBead { polymer: usize, bead: usize },
    #[error("Polymer #{polymer} has no beads")]
    EmptyPolymer { polymer: usize },
}

/// Appends every bead of the CSV file at `path` to `store`.
///
/// The file has a header row with columns `type,x,y,z` and optionally
/// `vx,vy,vz,mass`. Beads receive persisted ids in row order, continuing from
/// whatever the store already holds.
///
/// # Return
///
/// Returns the number of beads added.
pub fn load_beads_csv(path: &Path, store: &mut EntityStore) -> Result<usize, EntityLoadError> {
    let label = path.to_string_lossy().to_string();
    let reader = csv::Reader::from_path(path).map_err(|e| EntityLoadError::Csv {
        path: label.clone(),
        source: e,
    })?;
    let added = read_records(reader, &label, store)?;
    info!(path = %label, beads = added, "Loaded bead table");
    Ok(added)
}

/// Same as [`load_beads_csv`] for an in-memory or already opened source.
pub fn read_beads_csv(source: impl Read, store: &mut EntityStore) -> Result<usize, EntityLoadError> {
    read_records(csv::Reader::from_reader(source), "<stream>", store)
}

fn read_records<R: Read>(
    mut reader: csv::Reader<R>,
    label: &str,
    store: &mut EntityStore,
) -> Result<usize, EntityLoadError> {
    // Rows are validated before any bead is inserted, so a bad table leaves the store untouched.
    let mut beads = Vec::new();
    for (row, result) in reader.deserialize::<BeadRecord>().enumerate() {
        let record = result.map_err(|e| EntityLoadError::Csv {
            path: label.to_string(),
            source: e,
        })?;
        if record.mass.is_nan() || record.mass <= 0.0 {
            return Err(EntityLoadError::InvalidMass {
                path: label.to_string(),
                row: row + 1,
                mass: record.mass,
            });
        }
        beads.push(
            Bead::new(0, record.bead_type, Point3::new(record.x, record.y, record.z))
                .with_velocity(Vector3::new(record.vx, record.vy, record.vz))
                .with_mass(record.mass),
        );
    }
    let added = beads.len();
    for bead in beads {
        store.insert_bead(bead);
    }
    Ok(added)
}

/// Builds a polymer from 1-based persisted bead ids.
pub fn add_polymer_by_ids(
    store: &mut EntityStore,
    polymer_type: usize,
    bead_ids: &[usize],
) -> Result<PolymerRef, EntityLoadError> {
    let polymer = store.polymer_count() + 1;
    if bead_ids.is_empty() {
        return Err(EntityLoadError::EmptyPolymer { polymer });
    }
    let beads = bead_ids
        .iter()
        .map(|&id| {
            store
                .lookup_bead_by_id(id)
                .ok_or(EntityLoadError::UnknownBead { polymer, bead: id })
        })
        .collect::<Result<Vec<_>, _>>()?;
    store
        .add_polymer(polymer_type, beads)
        .ok_or(EntityLoadError::EmptyPolymer { polymer })
}
