use super::behavior::Behavior;
use super::{ActivityWindow, Decorator, StepContext, TargetNode};
use crate::core::models::ids::TargetKey;
use crate::core::targets::error::TargetError;
use std::collections::BTreeMap;
use tracing::debug;

/// The active decoration chains of a simulation, one per decorated target.
///
/// Only the outermost link of each chain is registered here; executing it runs
/// the whole chain. Chains are executed in label order of their base targets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecorationSet {
    chains: BTreeMap<String, TargetNode>,
}

impl DecorationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps the target labelled `base_label` in a new outermost decorator.
    ///
    /// If the target is already decorated, its current outermost decorator is
    /// unregistered and becomes the inner link of the new one.
    ///
    /// # Errors
    ///
    /// Fails if `label` is already used by an active decorator or equals the
    /// base target's label, or if the window is empty.
    pub fn attach(
        &mut self,
        label: &str,
        base: TargetKey,
        base_label: &str,
        window: ActivityWindow,
        behavior: Behavior,
    ) -> Result<(), TargetError> {
        if window.start > window.end {
            return Err(TargetError::InvalidWindow {
                start: window.start,
                end: window.end,
            });
        }
        if label == base_label || self.is_active(label) {
            return Err(TargetError::DuplicateLabel(label.to_string()));
        }

        let inner = if self.outermost_label(base_label) != base_label {
            debug!(target_label = base_label, outer = %self.outermost_label(base_label), "Re-wrapping active decoration");
            self.chains
                .remove(base_label)
                .unwrap_or(TargetNode::Base(base))
        } else {
            TargetNode::Base(base)
        };

        let decorator = Decorator::new(label, inner, window, behavior);
        self.chains.insert(
            base_label.to_string(),
            TargetNode::Decorated(Box::new(decorator)),
        );
        Ok(())
    }

    /// Removes the decorator labelled `label` from whichever chain holds it.
    ///
    /// The wrapped target is untouched; decorators inside and outside the
    /// removed one stay attached in their original order.
    pub fn detach(&mut self, label: &str) -> Result<Decorator, TargetError> {
        let base_label = self
            .chains
            .iter()
            .find(|(_, node)| node.find(label).is_some())
            .map(|(base, _)| base.clone())
            .ok_or_else(|| TargetError::DecoratorNotFound(label.to_string()))?;

        let chain = self
            .chains
            .remove(&base_label)
            .ok_or_else(|| TargetError::DecoratorNotFound(label.to_string()))?;
        let (rest, detached) = chain.unlink(label);
        if rest.is_decorated() {
            self.chains.insert(base_label, rest);
        }
        detached.ok_or_else(|| TargetError::DecoratorNotFound(label.to_string()))
    }

    /// Detaches every decorator wrapping the target labelled `base_label`,
    /// innermost first.
    pub fn detach_all(&mut self, base_label: &str) -> Vec<Decorator> {
        let Some(mut node) = self.chains.remove(base_label) else {
            return Vec::new();
        };
        let mut detached = Vec::new();
        while let TargetNode::Decorated(mut d) = node {
            let base = d.inner.base();
            node = std::mem::replace(&mut d.inner, TargetNode::Base(base));
            detached.push(*d);
        }
        detached.reverse();
        detached
    }

    /// Label of the outermost link wrapping `base_label`; the base label itself
    /// when the target is undecorated.
    pub fn outermost_label<'a>(&'a self, base_label: &'a str) -> &'a str {
        match self.chains.get(base_label) {
            Some(TargetNode::Decorated(d)) => &d.label,
            _ => base_label,
        }
    }

    pub fn is_active(&self, label: &str) -> bool {
        self.decorator(label).is_some()
    }

    pub fn decorator(&self, label: &str) -> Option<&Decorator> {
        self.chains.values().find_map(|node| node.find(label))
    }

    pub fn chain(&self, base_label: &str) -> Option<&TargetNode> {
        self.chains.get(base_label)
    }

    pub fn chains(&self) -> impl Iterator<Item = (&str, &TargetNode)> {
        self.chains.iter().map(|(l, n)| (l.as_str(), n))
    }

    /// Number of decorated targets.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Reinstalls a complete chain read back from restart data.
    pub(crate) fn insert_chain(&mut self, base_label: &str, chain: TargetNode) {
        if chain.is_decorated() {
            self.chains.insert(base_label.to_string(), chain);
        }
    }

    /// Executes every active chain once for the step in `ctx`.
    pub fn execute(&mut self, ctx: &mut StepContext<'_>) {
        for node in self.chains.values_mut() {
            node.execute(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decorators::behavior::{ConstantForce, WorkMeter};
    use crate::core::models::store::EntityStore;
    use crate::core::targets::registry::TargetRegistry;
    use nalgebra::{Point3, Vector3};

    fn setup() -> (EntityStore, TargetRegistry, TargetKey) {
        let mut store = EntityStore::new();
        let bead = store.add_bead(0, Point3::origin());
        store.bead_mut(bead).unwrap().velocity = Vector3::new(1.0, 0.0, 0.0);
        let mut registry = TargetRegistry::new();
        let key = registry.create_simple("T", 0, vec![bead]).unwrap();
        (store, registry, key)
    }

    fn push() -> Behavior {
        Behavior::ConstantForce(ConstantForce::new(Vector3::x(), 2.0))
    }

    fn always() -> ActivityWindow {
        ActivityWindow::new(0, u64::MAX)
    }

    #[test]
    fn attach_stacks_decorators_outward() {
        let (_, _, key) = setup();
        let mut set = DecorationSet::new();
        assert_eq!(set.outermost_label("T"), "T");

        set.attach("d1", key, "T", always(), push()).unwrap();
        set.attach("d2", key, "T", always(), push()).unwrap();

        assert_eq!(set.outermost_label("T"), "d2");
        assert_eq!(set.chain("T").unwrap().labels(), vec!["d1", "d2"]);
        assert_eq!(set.chain("T").unwrap().base(), key);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn attach_rejects_reused_labels_and_empty_windows() {
        let (_, _, key) = setup();
        let mut set = DecorationSet::new();
        set.attach("d1", key, "T", always(), push()).unwrap();

        assert_eq!(
            set.attach("d1", key, "T", always(), push()),
            Err(TargetError::DuplicateLabel("d1".into()))
        );
        assert!(set.attach("T", key, "T", always(), push()).is_err());
        assert_eq!(
            set.attach("d2", key, "T", ActivityWindow::new(5, 4), push()),
            Err(TargetError::InvalidWindow { start: 5, end: 4 })
        );
    }

    #[test]
    fn detach_splices_out_inner_or_outer_links() {
        let (_, _, key) = setup();
        let mut set = DecorationSet::new();
        for l in ["d1", "d2", "d3"] {
            set.attach(l, key, "T", always(), push()).unwrap();
        }

        let removed = set.detach("d2").unwrap();
        assert_eq!(removed.label(), "d2");
        assert_eq!(removed.inner(), &TargetNode::Base(key));
        assert_eq!(set.chain("T").unwrap().labels(), vec!["d1", "d3"]);

        set.detach("d3").unwrap();
        assert_eq!(set.outermost_label("T"), "d1");

        set.detach("d1").unwrap();
        assert!(set.is_empty());
        assert_eq!(
            set.detach("d1").unwrap_err(),
            TargetError::DecoratorNotFound("d1".into())
        );
    }

    #[test]
    fn detach_all_returns_innermost_first() {
        let (_, _, key) = setup();
        let mut set = DecorationSet::new();
        set.attach("a", key, "T", always(), push()).unwrap();
        set.attach("b", key, "T", always(), push()).unwrap();

        let labels: Vec<String> = set
            .detach_all("T")
            .into_iter()
            .map(|d| d.label)
            .collect();
        assert_eq!(labels, vec!["a", "b"]);
        assert!(set.chain("T").is_none());
    }

    #[test]
    fn inner_decorators_execute_before_outer_ones() {
        let (mut store, registry, key) = setup();
        let mut set = DecorationSet::new();
        set.attach("force", key, "T", always(), push()).unwrap();
        set.attach(
            "work",
            key,
            "T",
            always(),
            Behavior::WorkDone(WorkMeter::new()),
        )
        .unwrap();

        let mut ctx = StepContext {
            step: 0,
            dt: 1.0,
            registry: &registry,
            store: &mut store,
        };
        set.execute(&mut ctx);

        let work = set.decorator("work").unwrap().behavior().samples()[0].values[0];
        assert_eq!(work, 2.0);
    }

    #[test]
    fn decorators_outside_their_window_do_nothing() {
        let (mut store, registry, key) = setup();
        let mut set = DecorationSet::new();
        set.attach("late", key, "T", ActivityWindow::new(3, 5), push())
            .unwrap();

        for step in [0, 6] {
            let mut ctx = StepContext {
                step,
                dt: 1.0,
                registry: &registry,
                store: &mut store,
            };
            set.execute(&mut ctx);
        }
        assert_eq!(store.beads_iter().next().unwrap().1.force, Vector3::zeros());
    }
}
