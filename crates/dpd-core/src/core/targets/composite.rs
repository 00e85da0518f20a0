use crate::core::models::ids::{TargetId, TargetKey};
use std::collections::BTreeMap;

/// A named container of other targets.
///
/// Children are held by key into the owning [`TargetRegistry`](super::registry::TargetRegistry)
/// and indexed by label. The map is ordered lexicographically by label, which
/// fixes the order of every recursive query over the composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeTarget {
    pub(crate) id: TargetId,
    pub(crate) label: String,
    pub(crate) children: BTreeMap<String, TargetKey>,
}

impl CompositeTarget {
    pub(crate) fn new(id: TargetId, label: &str) -> Self {
        Self {
            id,
            label: label.to_string(),
            children: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, TargetKey)> {
        self.children.iter().map(|(l, &k)| (l.as_str(), k))
    }

    pub fn child(&self, label: &str) -> Option<TargetKey> {
        self.children.get(label).copied()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}
