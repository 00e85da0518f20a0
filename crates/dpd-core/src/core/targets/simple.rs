use super::display::DisplayMapping;
use super::error::TargetError;
use crate::core::models::ids::{BeadRef, TargetId};
use crate::core::models::store::EntityStore;
use std::collections::BTreeMap;

/// A named set of beads sharing one logical type.
///
/// The target never owns its beads. It remembers the type the beads had when it
/// was created (`original_type`), the type they carry now (`current_type`), and a
/// log of forward type changes keyed by the new type so each one can be undone.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleTarget {
    pub(crate) id: TargetId,
    pub(crate) label: String,
    original_type: usize,
    current_type: usize,
    beads: Vec<BeadRef>,
    /// `new_type -> old_type`; at most one entry per new type, never self-mapping.
    type_log: BTreeMap<usize, usize>,
}

impl SimpleTarget {
    pub(crate) fn new(id: TargetId, label: &str, bead_type: usize, beads: Vec<BeadRef>) -> Self {
        Self {
            id,
            label: label.to_string(),
            original_type: bead_type,
            current_type: bead_type,
            beads,
            type_log: BTreeMap::new(),
        }
    }

    /// Rebuilds a target from restart data that has already been validated and resolved.
    pub(crate) fn from_parts(
        id: TargetId,
        label: String,
        current_type: usize,
        original_type: usize,
        type_log: BTreeMap<usize, usize>,
        beads: Vec<BeadRef>,
    ) -> Self {
        Self {
            id,
            label,
            original_type,
            current_type,
            beads,
            type_log,
        }
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn original_type(&self) -> usize {
        self.original_type
    }

    pub fn current_type(&self) -> usize {
        self.current_type
    }

    pub fn beads(&self) -> &[BeadRef] {
        &self.beads
    }

    pub fn bead_total(&self) -> usize {
        self.beads.len()
    }

    pub fn type_log(&self) -> &BTreeMap<usize, usize> {
        &self.type_log
    }

    fn check_type_pair(&self, new_type: usize, old_type: usize) -> Result<(), TargetError> {
        if new_type == old_type {
            return Err(TargetError::IdentityTypeMapping {
                label: self.label.clone(),
                bead_type: new_type,
            });
        }
        if self.type_log.contains_key(&new_type) {
            return Err(TargetError::DuplicateTypeMapping {
                label: self.label.clone(),
                new_type,
            });
        }
        Ok(())
    }

    /// Logs a forward type change and makes `new_type` current.
    ///
    /// # Errors
    ///
    /// Fails if `new_type == old_type` or if `new_type` already has a logged mapping.
    pub fn add_type_pair(&mut self, new_type: usize, old_type: usize) -> Result<(), TargetError> {
        self.check_type_pair(new_type, old_type)?;
        self.type_log.insert(new_type, old_type);
        self.current_type = new_type;
        Ok(())
    }

    /// Undoes the logged change to `new_type`, making the recorded old type current.
    ///
    /// # Return
    ///
    /// The type that is current after the undo.
    ///
    /// # Errors
    ///
    /// Fails if no mapping for `new_type` is logged.
    pub fn remove_type_pair(&mut self, new_type: usize) -> Result<usize, TargetError> {
        let old_type =
            self.type_log
                .remove(&new_type)
                .ok_or_else(|| TargetError::MissingTypeMapping {
                    label: self.label.clone(),
                    new_type,
                })?;
        self.current_type = old_type;
        Ok(old_type)
    }

    /// Empties the log and returns the target to its original type.
    pub fn clear_type_pairs(&mut self) {
        self.type_log.clear();
        self.current_type = self.original_type;
    }

    /// Retypes every bead of the target to `new_type` and logs the change.
    ///
    /// The beads are made visible and the display collaborator is told that
    /// `new_type` derives from the previous current type. The caller must supply
    /// a type no other bead carries.
    ///
    /// # Errors
    ///
    /// Fails without touching the store if the target is empty or the type log
    /// rejects the pair.
    pub fn change_all_bead_types(
        &mut self,
        new_type: usize,
        store: &mut EntityStore,
        display: &mut dyn DisplayMapping,
    ) -> Result<(), TargetError> {
        if self.beads.is_empty() {
            return Err(TargetError::EmptyTarget(self.label.clone()));
        }
        let old_type = self.current_type;
        self.check_type_pair(new_type, old_type)?;

        self.retype_beads(new_type, store);
        display.map_new_type(new_type, old_type);
        self.add_type_pair(new_type, old_type)
    }

    /// Undoes the most recent change to the current type, retyping the beads back.
    ///
    /// # Return
    ///
    /// The restored bead type.
    pub fn revert_bead_types(&mut self, store: &mut EntityStore) -> Result<usize, TargetError> {
        let restored = self.remove_type_pair(self.current_type)?;
        self.retype_beads(restored, store);
        Ok(restored)
    }

    /// Clears the log and retypes every bead to the original type.
    pub fn restore_original_bead_types(&mut self, store: &mut EntityStore) {
        self.clear_type_pairs();
        self.retype_beads(self.original_type, store);
    }

    fn retype_beads(&self, bead_type: usize, store: &mut EntityStore) {
        for &bead in &self.beads {
            if store.set_bead_type(bead, bead_type).is_some() {
                if let Some(b) = store.bead_mut(bead) {
                    b.visible = true;
                }
            }
        }
    }
}
