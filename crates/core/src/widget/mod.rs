//! Lifecycle and attribute plumbing shared by every widget.
//!
//! A widget moves through `Constructed -> Configured -> Active -> Disposed`.
//! Attributes may be applied in any order before activation and are
//! re-applied idempotently; observed attributes trigger synchronous
//! recomputation through [`Widget::attribute_changed`].

use std::collections::BTreeMap;

use crate::{Result, WidgetError};

/// Lifecycle phase of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Constructed,
    Configured,
    Active,
    Disposed,
}

/// Tracks the phase of a widget and rejects backwards moves.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    phase: Phase,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            phase: Phase::Constructed,
        }
    }
}

impl Lifecycle {
    /// Creates a lifecycle in the `Constructed` phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the widget is connected and not yet disposed.
    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Records that configuration happened. A no-op once active.
    pub fn configure(&mut self) -> Result<()> {
        match self.phase {
            Phase::Constructed => self.move_to(Phase::Configured),
            Phase::Configured | Phase::Active => Ok(()),
            Phase::Disposed => Err(self.invalid(Phase::Configured)),
        }
    }

    /// Moves to `Active`. Only reachable before activation.
    pub fn activate(&mut self) -> Result<()> {
        match self.phase {
            Phase::Constructed | Phase::Configured => self.move_to(Phase::Active),
            other => Err(WidgetError::InvalidTransition {
                from: other,
                to: Phase::Active,
            }),
        }
    }

    /// Returns `false` when the widget was already disposed.
    pub fn dispose(&mut self) -> bool {
        if self.phase == Phase::Disposed {
            return false;
        }
        self.phase = Phase::Disposed;
        true
    }

    /// Fails unless the widget is active.
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(self.invalid(Phase::Active))
        }
    }

    fn move_to(&mut self, next: Phase) -> Result<()> {
        tracing::trace!(from = ?self.phase, to = ?next, "lifecycle transition");
        self.phase = next;
        Ok(())
    }

    fn invalid(&self, to: Phase) -> WidgetError {
        WidgetError::InvalidTransition {
            from: self.phase,
            to,
        }
    }
}

/// String attributes of a widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: BTreeMap<String, String>,
}

impl Attributes {
    /// Creates an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of `name`, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Whether `name` is set.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Stores `value` and returns the previous one.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Option<String> {
        self.values.insert(name.to_string(), value.into())
    }

    /// Removes `name` and returns its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Attribute-driven public API of a widget.
pub trait Widget {
    /// Attribute names whose changes reach [`Widget::attribute_changed`].
    const OBSERVED: &'static [&'static str];

    fn attributes(&self) -> &Attributes;
    fn attributes_mut(&mut self) -> &mut Attributes;

    fn attribute_changed(&mut self, name: &str, old: Option<&str>, new: Option<&str>)
        -> Result<()>;

    fn observes(name: &str) -> bool {
        Self::OBSERVED.iter().any(|observed| *observed == name)
    }

    fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes().get(name)
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        let old = self.attributes_mut().set(name, value);
        if Self::observes(name) {
            self.attribute_changed(name, old.as_deref(), Some(value))?;
        }
        Ok(())
    }

    fn remove_attribute(&mut self, name: &str) -> Result<()> {
        let old = self.attributes_mut().remove(name);
        if old.is_some() && Self::observes(name) {
            self.attribute_changed(name, old.as_deref(), None)?;
        }
        Ok(())
    }
}
