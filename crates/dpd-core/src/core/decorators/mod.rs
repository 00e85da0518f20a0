//! # Decorators
//!
//! Transient behaviours attached to a target without mutating it.
//!
//! A decoration chain is a singly-owned stack: each [`Decorator`] exclusively owns
//! the node it wraps, down to a [`TargetNode::Base`] leaf that refers to a target in
//! the registry. Executing a chain runs the innermost decorator's effect first and
//! the outermost last, so a measurement attached after a force observes that
//! force within the same step.

pub mod behavior;
pub mod set;

use crate::core::models::ids::TargetKey;
use crate::core::models::store::EntityStore;
use crate::core::targets::registry::TargetRegistry;
use behavior::Behavior;

/// Inclusive range of steps during which a decorator applies its effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityWindow {
    pub start: u64,
    pub end: u64,
}

impl ActivityWindow {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, step: u64) -> bool {
        self.start <= step && step <= self.end
    }

    /// Steps elapsed since the window opened.
    pub fn elapsed(&self, step: u64) -> u64 {
        step.saturating_sub(self.start)
    }
}

/// Everything a decorator may read or modify while executing one step.
pub struct StepContext<'a> {
    pub step: u64,
    pub dt: f64,
    pub registry: &'a TargetRegistry,
    pub store: &'a mut EntityStore,
}

/// One link of a decoration chain.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetNode {
    /// The undecorated target; executing it does nothing.
    Base(TargetKey),
    Decorated(Box<Decorator>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub(crate) label: String,
    pub(crate) inner: TargetNode,
    pub(crate) window: ActivityWindow,
    pub(crate) behavior: Behavior,
}

impl Decorator {
    pub fn new(label: &str, inner: TargetNode, window: ActivityWindow, behavior: Behavior) -> Self {
        Self {
            label: label.to_string(),
            inner,
            window,
            behavior,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn window(&self) -> ActivityWindow {
        self.window
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    pub fn inner(&self) -> &TargetNode {
        &self.inner
    }

    pub fn base(&self) -> TargetKey {
        self.inner.base()
    }

    pub fn into_behavior(self) -> Behavior {
        self.behavior
    }
}

impl TargetNode {
    /// The key of the target at the bottom of the chain.
    pub fn base(&self) -> TargetKey {
        let mut node = self;
        loop {
            match node {
                TargetNode::Base(key) => return *key,
                TargetNode::Decorated(d) => node = &d.inner,
            }
        }
    }

    pub fn is_decorated(&self) -> bool {
        matches!(self, TargetNode::Decorated(_))
    }

    /// Runs the chain for one step: inner links first, then this one.
    pub fn execute(&mut self, ctx: &mut StepContext<'_>) {
        let TargetNode::Decorated(decorator) = self else {
            return;
        };
        decorator.inner.execute(ctx);
        if decorator.window.contains(ctx.step) {
            let beads = ctx.registry.beads(decorator.inner.base(), &*ctx.store);
            let window = decorator.window;
            decorator.behavior.apply(&beads, window, ctx);
        }
    }

    /// Decorator labels from innermost to outermost.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels = Vec::new();
        let mut node = self;
        while let TargetNode::Decorated(d) = node {
            labels.push(d.label.as_str());
            node = &d.inner;
        }
        labels.reverse();
        labels
    }

    /// Decorators from innermost to outermost.
    pub fn decorators(&self) -> Vec<&Decorator> {
        let mut found = Vec::new();
        let mut node = self;
        while let TargetNode::Decorated(d) = node {
            found.push(d.as_ref());
            node = &d.inner;
        }
        found.reverse();
        found
    }

    pub fn find(&self, label: &str) -> Option<&Decorator> {
        let mut node = self;
        while let TargetNode::Decorated(d) = node {
            if d.label == label {
                return Some(d);
            }
            node = &d.inner;
        }
        None
    }

    /// Unlinks the decorator labelled `label`, splicing its inner node into its place.
    ///
    /// Returns the remaining chain and the detached decorator, whose `inner` is
    /// reset to the bare base so that dropping it releases nothing else.
    pub(crate) fn unlink(self, label: &str) -> (TargetNode, Option<Decorator>) {
        match self {
            TargetNode::Base(key) => (TargetNode::Base(key), None),
            TargetNode::Decorated(mut d) => {
                let base = d.inner.base();
                let inner = std::mem::replace(&mut d.inner, TargetNode::Base(base));
                if d.label == label {
                    (inner, Some(*d))
                } else {
                    let (rest, found) = inner.unlink(label);
                    d.inner = rest;
                    (TargetNode::Decorated(d), found)
                }
            }
        }
    }
}
