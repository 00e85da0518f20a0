use super::composite::CompositeTarget;
use super::error::TargetError;
use super::polymer::PolymerTarget;
use super::simple::SimpleTarget;
use super::Target;
use crate::core::models::ids::{BeadRef, PolymerRef, TargetId, TargetKey};
use crate::core::models::store::EntityStore;
use nalgebra::{Point3, Vector3};
use slotmap::SlotMap;
use std::collections::HashMap;
use tracing::debug;

/// Owns every target of a simulation rank and resolves labels to targets.
///
/// Composite targets refer to their children by [`TargetKey`], so a target can
/// be a member of several composites and still be addressed directly. All
/// aggregate queries recurse through this registry and are recomputed on every
/// call.
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: SlotMap<TargetKey, Target>,
    labels: HashMap<String, TargetKey>,
    next_id: usize,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> TargetId {
        self.next_id += 1;
        TargetId(self.next_id)
    }

    fn insert(&mut self, target: Target) -> Result<TargetKey, TargetError> {
        let label = target.label().to_string();
        if self.labels.contains_key(&label) {
            return Err(TargetError::DuplicateLabel(label));
        }
        let key = self.targets.insert(target);
        self.labels.insert(label, key);
        Ok(key)
    }

    pub fn create_simple(
        &mut self,
        label: &str,
        bead_type: usize,
        beads: Vec<BeadRef>,
    ) -> Result<TargetKey, TargetError> {
        self.ensure_label_free(label)?;
        let id = self.allocate_id();
        self.insert(Target::Simple(SimpleTarget::new(id, label, bead_type, beads)))
    }

    pub fn create_polymer(
        &mut self,
        label: &str,
        polymer_type: usize,
        polymers: Vec<PolymerRef>,
    ) -> Result<TargetKey, TargetError> {
        self.ensure_label_free(label)?;
        let id = self.allocate_id();
        self.insert(Target::Polymer(PolymerTarget::new(
            id,
            label,
            polymer_type,
            polymers,
        )))
    }

    pub fn create_composite(&mut self, label: &str) -> Result<TargetKey, TargetError> {
        self.ensure_label_free(label)?;
        let id = self.allocate_id();
        self.insert(Target::Composite(CompositeTarget::new(id, label)))
    }

    /// Inserts a target rebuilt from restart data, keeping its persisted id.
    pub(crate) fn insert_restored(&mut self, target: Target) -> Result<TargetKey, TargetError> {
        let id = target.id().0;
        let key = self.insert(target)?;
        self.next_id = self.next_id.max(id);
        Ok(key)
    }

    fn ensure_label_free(&self, label: &str) -> Result<(), TargetError> {
        if self.labels.contains_key(label) {
            Err(TargetError::DuplicateLabel(label.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn get(&self, key: TargetKey) -> Option<&Target> {
        self.targets.get(key)
    }

    pub fn get_mut(&mut self, key: TargetKey) -> Option<&mut Target> {
        self.targets.get_mut(key)
    }

    /// Looks up a target key by label.
    pub fn find(&self, label: &str) -> Option<TargetKey> {
        self.labels.get(label).copied()
    }

    /// Like [`find`](Self::find) but reports a missing label as an error.
    pub fn require(&self, label: &str) -> Result<TargetKey, TargetError> {
        self.find(label)
            .ok_or_else(|| TargetError::NotFound(label.to_string()))
    }

    pub fn by_label(&self, label: &str) -> Option<&Target> {
        self.find(label).and_then(|k| self.targets.get(k))
    }

    /// Returns the simple target with the given label for mutation.
    pub fn simple_mut(&mut self, label: &str) -> Result<&mut SimpleTarget, TargetError> {
        let key = self.require(label)?;
        self.targets[key]
            .as_simple_mut()
            .ok_or_else(|| TargetError::NotSimple(label.to_string()))
    }

    /// Returns every target ordered by id, i.e. by creation order.
    pub fn iter(&self) -> Vec<(TargetKey, &Target)> {
        let mut all: Vec<_> = self.targets.iter().collect();
        all.sort_by_key(|(_, t)| t.id());
        all
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Removes a target and unlinks it from every composite that lists it.
    pub fn remove(&mut self, label: &str) -> Result<Target, TargetError> {
        let key = self.require(label)?;
        self.labels.remove(label);
        for (_, target) in self.targets.iter_mut() {
            if let Target::Composite(c) = target {
                c.children.retain(|_, &mut child| child != key);
            }
        }
        self.targets
            .remove(key)
            .ok_or_else(|| TargetError::NotFound(label.to_string()))
    }

    /// Returns `true` if `label` names the target at `key` or any target reachable
    /// from it through composite membership.
    pub fn contains_label_recursively(&self, key: TargetKey, label: &str) -> bool {
        let Some(target) = self.targets.get(key) else {
            return false;
        };
        if target.label() == label {
            return true;
        }
        match target {
            Target::Composite(c) => c
                .children
                .iter()
                .any(|(l, &child)| l == label || self.contains_label_recursively(child, label)),
            _ => false,
        }
    }

    /// Adds the target labelled `child` to the composite labelled `parent`.
    ///
    /// The insertion is refused if either target is reachable from the other,
    /// which also rules out self-insertion and duplicate membership.
    pub fn add_target(&mut self, parent: &str, child: &str) -> Result<(), TargetError> {
        let parent_key = self.require(parent)?;
        let child_key = self.require(child)?;
        self.add_child(parent_key, child_key)
    }

    pub(crate) fn add_child(
        &mut self,
        parent_key: TargetKey,
        child_key: TargetKey,
    ) -> Result<(), TargetError> {
        let (parent_label, child_label) = match (self.get(parent_key), self.get(child_key)) {
            (Some(p), Some(c)) => (p.label().to_string(), c.label().to_string()),
            _ => return Err(TargetError::NotFound(format!("{:?}", child_key))),
        };
        if !self.targets[parent_key].is_composite() {
            return Err(TargetError::NotComposite(parent_label));
        }

        let ok = !self.contains_label_recursively(parent_key, &child_label)
            && !self.contains_label_recursively(child_key, &parent_label);
        if !ok {
            debug!(parent = %parent_label, child = %child_label, "Refusing composite insertion");
            return Err(TargetError::WouldCreateCycle {
                parent: parent_label,
                child: child_label,
            });
        }

        if let Target::Composite(c) = &mut self.targets[parent_key] {
            c.children.insert(child_label, child_key);
        }
        Ok(())
    }

    /// Removes the direct child labelled `child` from the composite `parent`.
    pub fn remove_target(&mut self, parent: &str, child: &str) -> Result<(), TargetError> {
        let parent_key = self.require(parent)?;
        match &mut self.targets[parent_key] {
            Target::Composite(c) => c
                .children
                .remove(child)
                .map(|_| ())
                .ok_or_else(|| TargetError::ChildNotFound {
                    parent: parent.to_string(),
                    child: child.to_string(),
                }),
            _ => Err(TargetError::NotComposite(parent.to_string())),
        }
    }

    /// Finds `label` among the direct children of `key`, then depth-first through
    /// each composite child in label order.
    pub fn find_recursively(&self, key: TargetKey, label: &str) -> Option<TargetKey> {
        let Some(Target::Composite(c)) = self.targets.get(key) else {
            return None;
        };
        if let Some(direct) = c.child(label) {
            return Some(direct);
        }
        c.children
            .values()
            .filter(|&&child| self.targets.get(child).is_some_and(Target::is_composite))
            .find_map(|&child| self.find_recursively(child, label))
    }

    /// Returns the current type of the first simple target found under `key`, in
    /// label order, or `None` when the subtree holds no simple target.
    pub fn first_bead_type(&self, key: TargetKey) -> Option<usize> {
        match self.targets.get(key)? {
            Target::Simple(s) => Some(s.current_type()),
            Target::Polymer(_) => None,
            Target::Composite(c) => c.children.values().find_map(|&child| {
                match self.targets.get(child)? {
                    Target::Simple(s) => Some(s.current_type()),
                    Target::Composite(_) => self.first_bead_type(child),
                    Target::Polymer(_) => None,
                }
            }),
        }
    }

    /// Every bead reachable from `key`. Overlapping members appear once per path.
    pub fn beads(&self, key: TargetKey, store: &EntityStore) -> Vec<BeadRef> {
        let mut out = Vec::new();
        self.collect_beads(key, store, &mut out);
        out
    }

    fn collect_beads(&self, key: TargetKey, store: &EntityStore, out: &mut Vec<BeadRef>) {
        match self.targets.get(key) {
            Some(Target::Simple(s)) => out.extend_from_slice(s.beads()),
            Some(Target::Polymer(p)) => out.extend(p.beads(store)),
            Some(Target::Composite(c)) => {
                for &child in c.children.values() {
                    self.collect_beads(child, store, out);
                }
            }
            None => {}
        }
    }

    /// Every polymer reachable from `key`.
    pub fn polymers(&self, key: TargetKey) -> Vec<PolymerRef> {
        match self.targets.get(key) {
            Some(Target::Polymer(p)) => p.polymers().to_vec(),
            Some(Target::Composite(c)) => c
                .children
                .values()
                .flat_map(|&child| self.polymers(child))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn bead_total(&self, key: TargetKey, store: &EntityStore) -> usize {
        match self.targets.get(key) {
            Some(Target::Simple(s)) => s.bead_total(),
            Some(Target::Polymer(p)) => p
                .polymers()
                .iter()
                .filter_map(|&r| store.polymer(r))
                .map(|poly| poly.len())
                .sum(),
            Some(Target::Composite(c)) => c
                .children
                .values()
                .map(|&child| self.bead_total(child, store))
                .sum(),
            None => 0,
        }
    }

    pub fn polymer_total(&self, key: TargetKey) -> usize {
        match self.targets.get(key) {
            Some(Target::Polymer(p)) => p.polymer_total(),
            Some(Target::Composite(c)) => c
                .children
                .values()
                .map(|&child| self.polymer_total(child))
                .sum(),
            _ => 0,
        }
    }

    /// Counts reachable beads whose type in the store is `bead_type`.
    pub fn bead_total_for_type(
        &self,
        key: TargetKey,
        bead_type: usize,
        store: &EntityStore,
    ) -> usize {
        self.beads(key, store)
            .into_iter()
            .filter_map(|b| store.bead(b))
            .filter(|b| b.bead_type == bead_type)
            .count()
    }

    /// Mass-weighted centre of all reachable beads, or `None` if there are none.
    pub fn centre_of_mass(&self, key: TargetKey, store: &EntityStore) -> Option<Point3<f64>> {
        let mut total_mass = 0.0;
        let mut weighted = Vector3::zeros();
        for bead in self
            .beads(key, store)
            .into_iter()
            .filter_map(|b| store.bead(b))
        {
            total_mass += bead.mass;
            weighted += bead.position.coords * bead.mass;
        }
        (total_mass > 0.0).then(|| Point3::from(weighted / total_mass))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_typed_beads(types: &[usize]) -> (EntityStore, Vec<BeadRef>) {
        let mut store = EntityStore::new();
        let beads = types
            .iter()
            .enumerate()
            .map(|(i, &t)| store.add_bead(t, Point3::new(i as f64, 0.0, 0.0)))
            .collect();
        (store, beads)
    }

    #[test]
    fn labels_are_unique_across_kinds() {
        let mut reg = TargetRegistry::new();
        reg.create_composite("A").unwrap();
        assert_eq!(
            reg.create_simple("A", 0, vec![]),
            Err(TargetError::DuplicateLabel("A".into()))
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn ids_are_assigned_in_creation_order() {
        let mut reg = TargetRegistry::new();
        reg.create_simple("s", 0, vec![]).unwrap();
        reg.create_composite("c").unwrap();
        let ids: Vec<_> = reg.iter().iter().map(|(_, t)| t.id()).collect();
        assert_eq!(ids, vec![TargetId(1), TargetId(2)]);
    }

    #[test]
    fn composite_insertion_is_refused_in_both_directions() {
        let mut reg = TargetRegistry::new();
        reg.create_composite("A").unwrap();
        reg.create_composite("B").unwrap();

        assert!(reg.add_target("A", "B").is_ok());
        assert!(matches!(
            reg.add_target("B", "A"),
            Err(TargetError::WouldCreateCycle { .. })
        ));

        let mut reg = TargetRegistry::new();
        reg.create_composite("A").unwrap();
        reg.create_composite("B").unwrap();
        assert!(reg.add_target("B", "A").is_ok());
        assert!(reg.add_target("A", "B").is_err());
    }

    #[test]
    fn transitive_cycles_and_self_insertion_are_refused() {
        let mut reg = TargetRegistry::new();
        for l in ["A", "B", "C"] {
            reg.create_composite(l).unwrap();
        }
        reg.add_target("A", "B").unwrap();
        reg.add_target("B", "C").unwrap();

        assert!(reg.add_target("C", "A").is_err());
        assert!(reg.add_target("A", "A").is_err());
        assert!(reg.add_target("A", "C").is_err(), "C is already reachable from A");
    }

    #[test]
    fn add_target_requires_a_composite_parent() {
        let mut reg = TargetRegistry::new();
        reg.create_simple("s", 0, vec![]).unwrap();
        reg.create_composite("c").unwrap();
        assert_eq!(
            reg.add_target("s", "c"),
            Err(TargetError::NotComposite("s".into()))
        );
        assert_eq!(
            reg.add_target("c", "missing"),
            Err(TargetError::NotFound("missing".into()))
        );
    }

    #[test]
    fn remove_target_only_removes_direct_children() {
        let mut reg = TargetRegistry::new();
        reg.create_composite("outer").unwrap();
        reg.create_composite("inner").unwrap();
        reg.create_simple("leaf", 0, vec![]).unwrap();
        reg.add_target("outer", "inner").unwrap();
        reg.add_target("inner", "leaf").unwrap();

        assert!(matches!(
            reg.remove_target("outer", "leaf"),
            Err(TargetError::ChildNotFound { .. })
        ));
        assert!(reg.remove_target("inner", "leaf").is_ok());
        assert_eq!(
            reg.by_label("inner").unwrap().as_composite().unwrap().child_count(),
            0
        );
    }

    #[test]
    fn find_recursively_prefers_direct_children_then_label_order() {
        let mut reg = TargetRegistry::new();
        let root = reg.create_composite("root").unwrap();
        reg.create_composite("a").unwrap();
        reg.create_composite("b").unwrap();
        reg.create_simple("x", 0, vec![]).unwrap();
        reg.create_simple("y", 0, vec![]).unwrap();
        reg.add_target("root", "b").unwrap();
        reg.add_target("root", "a").unwrap();
        reg.add_target("b", "x").unwrap();
        reg.add_target("a", "y").unwrap();

        assert_eq!(reg.find_recursively(root, "a"), reg.find("a"));
        assert_eq!(reg.find_recursively(root, "x"), reg.find("x"));
        assert_eq!(reg.find_recursively(root, "y"), reg.find("y"));
        assert_eq!(reg.find_recursively(root, "nope"), None);
    }

    #[test]
    fn first_bead_type_follows_lexicographic_label_order() {
        let (_, beads) = store_with_typed_beads(&[4, 9]);
        let mut reg = TargetRegistry::new();
        let root = reg.create_composite("root").unwrap();
        reg.create_simple("zeta", 9, vec![beads[1]]).unwrap();
        reg.create_composite("alpha").unwrap();
        reg.create_simple("mid", 4, vec![beads[0]]).unwrap();
        reg.create_polymer("aaa", 1, vec![]).unwrap();

        reg.add_target("root", "zeta").unwrap();
        reg.add_target("root", "aaa").unwrap();
        reg.add_target("root", "alpha").unwrap();
        assert_eq!(reg.first_bead_type(root), Some(9), "empty composite is skipped");

        reg.add_target("alpha", "mid").unwrap();
        assert_eq!(reg.first_bead_type(root), Some(4));
    }

    #[test]
    fn first_bead_type_is_none_without_simple_targets() {
        let mut reg = TargetRegistry::new();
        let root = reg.create_composite("root").unwrap();
        reg.create_polymer("p", 0, vec![]).unwrap();
        reg.add_target("root", "p").unwrap();
        assert_eq!(reg.first_bead_type(root), None);
    }

    #[test]
    fn bead_total_sums_leaves_over_three_levels() {
        let (store, b) = store_with_typed_beads(&[0, 0, 1, 1, 1, 2]);
        let mut reg = TargetRegistry::new();
        let top = reg.create_composite("top").unwrap();
        reg.create_composite("mid").unwrap();
        reg.create_composite("low").unwrap();
        reg.create_simple("s0", 0, vec![b[0], b[1]]).unwrap();
        reg.create_simple("s1", 1, vec![b[2], b[3], b[4]]).unwrap();
        reg.create_simple("s2", 2, vec![b[5]]).unwrap();

        reg.add_target("top", "s0").unwrap();
        reg.add_target("top", "mid").unwrap();
        reg.add_target("mid", "s1").unwrap();
        reg.add_target("mid", "low").unwrap();
        reg.add_target("low", "s2").unwrap();

        let leaves: usize = ["s0", "s1", "s2"]
            .iter()
            .map(|l| reg.bead_total(reg.find(l).unwrap(), &store))
            .sum();
        assert_eq!(reg.bead_total(top, &store), leaves);
        assert_eq!(reg.bead_total(top, &store), 6);
        assert_eq!(reg.beads(top, &store).len(), 6);
        assert_eq!(reg.bead_total_for_type(top, 1, &store), 3);
    }

    #[test]
    fn polymer_totals_and_beads_flow_through_composites() {
        let (mut store, b) = store_with_typed_beads(&[0, 0, 0]);
        let p1 = store.add_polymer(5, vec![b[0], b[1]]).unwrap();
        let p2 = store.add_polymer(5, vec![b[2]]).unwrap();

        let mut reg = TargetRegistry::new();
        let root = reg.create_composite("root").unwrap();
        reg.create_polymer("chains", 5, vec![p1, p2]).unwrap();
        reg.add_target("root", "chains").unwrap();

        assert_eq!(reg.polymer_total(root), 2);
        assert_eq!(reg.polymers(root), vec![p1, p2]);
        assert_eq!(reg.bead_total(root, &store), 3);
    }

    #[test]
    fn centre_of_mass_is_mass_weighted() {
        let mut store = EntityStore::new();
        let light = store.add_bead(0, Point3::new(0.0, 0.0, 0.0));
        let heavy = store.add_bead(0, Point3::new(4.0, 0.0, 0.0));
        store.bead_mut(heavy).unwrap().mass = 3.0;

        let mut reg = TargetRegistry::new();
        let key = reg.create_simple("pair", 0, vec![light, heavy]).unwrap();
        let empty = reg.create_simple("empty", 0, vec![]).unwrap();

        assert_eq!(reg.centre_of_mass(key, &store), Some(Point3::new(3.0, 0.0, 0.0)));
        assert_eq!(reg.centre_of_mass(empty, &store), None);
    }

    #[test]
    fn removing_a_target_unlinks_it_from_composites() {
        let mut reg = TargetRegistry::new();
        let root = reg.create_composite("root").unwrap();
        reg.create_simple("leaf", 0, vec![]).unwrap();
        reg.add_target("root", "leaf").unwrap();

        reg.remove("leaf").unwrap();
        assert!(reg.find("leaf").is_none());
        assert_eq!(reg.get(root).unwrap().as_composite().unwrap().child_count(), 0);
        assert_eq!(reg.remove("leaf"), Err(TargetError::NotFound("leaf".into())));
    }
}
