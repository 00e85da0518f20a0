use super::bead::Bead;
use super::ids::{BeadRef, PolymerRef};
use super::polymer::Polymer;
use nalgebra::{Point3, Vector3};

/// Owns every bead and polymer of a simulation rank.
///
/// Beads and polymers are stored densely in creation order. Internally they are
/// addressed by 0-based [`BeadRef`]/[`PolymerRef`] handles; at the persistence
/// boundary the same entities carry 1-based ids. The translation between the two
/// lives in [`lookup_bead_by_id`](Self::lookup_bead_by_id) and
/// [`lookup_polymer_by_id`](Self::lookup_polymer_by_id) only.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    beads: Vec<Bead>,
    polymers: Vec<Polymer>,
    /// One past the largest bead type ever seen or allocated.
    bead_type_total: usize,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bead of the given type at rest and returns its handle.
    pub fn add_bead(&mut self, bead_type: usize, position: Point3<f64>) -> BeadRef {
        let id = self.beads.len() + 1;
        self.insert_bead(Bead::new(id, bead_type, position))
    }

    /// Inserts a fully-specified bead, overwriting its `id` with the next
    /// 1-based persisted id.
    pub fn insert_bead(&mut self, mut bead: Bead) -> BeadRef {
        let index = self.beads.len();
        bead.id = index + 1;
        self.bead_type_total = self.bead_type_total.max(bead.bead_type + 1);
        self.beads.push(bead);
        BeadRef(index)
    }

    /// Adds a polymer built from existing beads.
    ///
    /// # Return
    ///
    /// Returns `None` if any of the bead handles does not belong to this store.
    pub fn add_polymer(&mut self, polymer_type: usize, beads: Vec<BeadRef>) -> Option<PolymerRef> {
        if beads.iter().any(|b| b.0 >= self.beads.len()) {
            return None;
        }
        let index = self.polymers.len();
        self.polymers
            .push(Polymer::new(index + 1, polymer_type, beads));
        Some(PolymerRef(index))
    }

    /// Resolves a 1-based persisted bead id to its 0-based handle.
    pub fn lookup_bead_by_id(&self, id: usize) -> Option<BeadRef> {
        let index = id.checked_sub(1)?;
        (index < self.beads.len()).then_some(BeadRef(index))
    }

    /// Resolves a 1-based persisted polymer id to its 0-based handle.
    pub fn lookup_polymer_by_id(&self, id: usize) -> Option<PolymerRef> {
        let index = id.checked_sub(1)?;
        (index < self.polymers.len()).then_some(PolymerRef(index))
    }

    pub fn bead(&self, bead: BeadRef) -> Option<&Bead> {
        self.beads.get(bead.0)
    }

    pub fn bead_mut(&mut self, bead: BeadRef) -> Option<&mut Bead> {
        self.beads.get_mut(bead.0)
    }

    pub fn polymer(&self, polymer: PolymerRef) -> Option<&Polymer> {
        self.polymers.get(polymer.0)
    }

    pub fn beads_iter(&self) -> impl Iterator<Item = (BeadRef, &Bead)> {
        self.beads.iter().enumerate().map(|(i, b)| (BeadRef(i), b))
    }

    pub fn beads_iter_mut(&mut self) -> impl Iterator<Item = (BeadRef, &mut Bead)> {
        self.beads
            .iter_mut()
            .enumerate()
            .map(|(i, b)| (BeadRef(i), b))
    }

    /// Returns every polymer in creation order.
    pub fn all_polymers(&self) -> impl Iterator<Item = (PolymerRef, &Polymer)> {
        self.polymers
            .iter()
            .enumerate()
            .map(|(i, p)| (PolymerRef(i), p))
    }

    pub fn bead_count(&self) -> usize {
        self.beads.len()
    }

    pub fn polymer_count(&self) -> usize {
        self.polymers.len()
    }

    pub fn beads_of_type(&self, bead_type: usize) -> Vec<BeadRef> {
        self.beads_iter()
            .filter(|(_, b)| b.bead_type == bead_type)
            .map(|(r, _)| r)
            .collect()
    }

    pub fn polymers_of_type(&self, polymer_type: usize) -> Vec<PolymerRef> {
        self.all_polymers()
            .filter(|(_, p)| p.polymer_type == polymer_type)
            .map(|(r, _)| r)
            .collect()
    }

    pub fn bead_type_total(&self) -> usize {
        self.bead_type_total
    }

    /// A bead type that no bead has carried so far.
    ///
    /// Nothing is reserved: the counter only moves once a bead is given the
    /// type through [`set_bead_type`](Self::set_bead_type).
    pub fn next_bead_type(&self) -> usize {
        self.bead_type_total
    }

    /// Sets the type of a bead, keeping the type counter consistent.
    pub fn set_bead_type(&mut self, bead: BeadRef, bead_type: usize) -> Option<()> {
        let slot = self.beads.get_mut(bead.0)?;
        slot.bead_type = bead_type;
        self.bead_type_total = self.bead_type_total.max(bead_type + 1);
        Some(())
    }

    /// Zeroes the force accumulator of every bead; called at the start of a step.
    pub fn clear_forces(&mut self) {
        for bead in &mut self.beads {
            bead.force = Vector3::zeros();
        }
    }

    /// Explicit Euler update of velocities and positions from the accumulated forces.
    pub fn advance(&mut self, dt: f64) {
        for bead in &mut self.beads {
            if bead.mass > 0.0 {
                bead.velocity += bead.force * (dt / bead.mass);
            }
            bead.position += bead.velocity * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_beads(types: &[usize]) -> EntityStore {
        let mut store = EntityStore::new();
        for (i, &t) in types.iter().enumerate() {
            store.add_bead(t, Point3::new(i as f64, 0.0, 0.0));
        }
        store
    }

    #[test]
    fn beads_receive_one_based_ids_in_creation_order() {
        let store = store_with_beads(&[0, 1, 2]);
        let ids: Vec<usize> = store.beads_iter().map(|(_, b)| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn lookup_bead_by_id_translates_to_zero_based_handles() {
        let store = store_with_beads(&[0, 0, 0]);
        assert_eq!(store.lookup_bead_by_id(1), Some(BeadRef(0)));
        assert_eq!(store.lookup_bead_by_id(3), Some(BeadRef(2)));
        assert_eq!(store.lookup_bead_by_id(0), None);
        assert_eq!(store.lookup_bead_by_id(4), None);
    }

    #[test]
    fn persisted_id_round_trips_through_lookup() {
        let store = store_with_beads(&[5, 6]);
        for (bead_ref, bead) in store.beads_iter() {
            assert_eq!(bead_ref.persisted_id(), bead.id);
            assert_eq!(store.lookup_bead_by_id(bead.id), Some(bead_ref));
        }
    }

    #[test]
    fn add_polymer_rejects_foreign_bead_handles() {
        let mut store = store_with_beads(&[0, 0]);
        assert!(store.add_polymer(1, vec![BeadRef(0), BeadRef(5)]).is_none());
        let polymer = store.add_polymer(1, vec![BeadRef(0), BeadRef(1)]).unwrap();
        assert_eq!(store.polymer(polymer).unwrap().id, 1);
        assert_eq!(store.lookup_polymer_by_id(1), Some(polymer));
        assert_eq!(store.lookup_polymer_by_id(2), None);
    }

    #[test]
    fn beads_and_polymers_can_be_filtered_by_type() {
        let mut store = store_with_beads(&[0, 1, 1, 2]);
        store.add_polymer(7, vec![BeadRef(0)]).unwrap();
        store.add_polymer(8, vec![BeadRef(1)]).unwrap();
        store.add_polymer(7, vec![BeadRef(2)]).unwrap();

        assert_eq!(store.beads_of_type(1), vec![BeadRef(1), BeadRef(2)]);
        assert_eq!(store.polymers_of_type(7), vec![PolymerRef(0), PolymerRef(2)]);
        assert!(store.polymers_of_type(9).is_empty());
    }

    #[test]
    fn next_bead_type_advances_only_when_a_bead_takes_it() {
        let mut store = store_with_beads(&[0, 3]);
        assert_eq!(store.next_bead_type(), 4);
        assert_eq!(store.next_bead_type(), 4);

        store.set_bead_type(BeadRef(1), 4).unwrap();
        assert_eq!(store.next_bead_type(), 5);
        store.set_bead_type(BeadRef(0), 10).unwrap();
        assert_eq!(store.next_bead_type(), 11);
    }

    #[test]
    fn advance_integrates_forces_and_clear_forces_resets_them() {
        let mut store = store_with_beads(&[0]);
        store.bead_mut(BeadRef(0)).unwrap().force = Vector3::new(2.0, 0.0, 0.0);

        store.advance(0.5);
        let bead = store.bead(BeadRef(0)).unwrap();
        assert_eq!(bead.velocity, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(bead.position, Point3::new(0.5, 0.0, 0.0));

        store.clear_forces();
        assert_eq!(store.bead(BeadRef(0)).unwrap().force, Vector3::zeros());
    }
}
