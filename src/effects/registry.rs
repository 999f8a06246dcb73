//! Effect descriptors and the registries that key them by action kind.

use crate::core::INIT_KIND;
use crate::effects::error::{EffectError, RegistryError, RegistryViolation};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Forward callback: `(current state, effect data, first_time)`.
pub type RedoFn<S, D> = Arc<dyn Fn(&S, Option<&D>, bool) -> Result<(), EffectError> + Send + Sync>;

/// Backward or symmetric callback: `(current state, effect data)`.
pub type UndoFn<S, D> = Arc<dyn Fn(&S, Option<&D>) -> Result<(), EffectError> + Send + Sync>;

/// Callback run after every static-store dispatch of a kind.
pub type StaticEffectFn<S, A> = Arc<dyn Fn(&S, &A) -> Result<(), EffectError> + Send + Sync>;

type Check = Validation<(), NonEmptyVec<RegistryViolation>>;

/// Side effects tied to one action kind.
///
/// `on_redo` runs when the action is applied (first dispatch or redo),
/// `on_undo` when it is reverted, and `on_both` after either.
pub struct Effect<S, D> {
    pub(crate) on_redo: Option<RedoFn<S, D>>,
    pub(crate) on_undo: Option<UndoFn<S, D>>,
    pub(crate) on_both: Option<UndoFn<S, D>>,
}

impl<S, D> Effect<S, D> {
    pub fn new() -> Self {
        Self {
            on_redo: None,
            on_undo: None,
            on_both: None,
        }
    }

    /// Run when the action is applied. `first_time` is `true` only for the
    /// original dispatch, `false` when replayed by redo.
    pub fn on_redo<F>(mut self, callback: F) -> Self
    where
        F: Fn(&S, Option<&D>, bool) -> Result<(), EffectError> + Send + Sync + 'static,
    {
        self.on_redo = Some(Arc::new(callback));
        self
    }

    /// Run when the action is undone.
    pub fn on_undo<F>(mut self, callback: F) -> Self
    where
        F: Fn(&S, Option<&D>) -> Result<(), EffectError> + Send + Sync + 'static,
    {
        self.on_undo = Some(Arc::new(callback));
        self
    }

    /// Run on every transition across this action, in either direction.
    pub fn on_both<F>(mut self, callback: F) -> Self
    where
        F: Fn(&S, Option<&D>) -> Result<(), EffectError> + Send + Sync + 'static,
    {
        self.on_both = Some(Arc::new(callback));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.on_redo.is_none() && self.on_undo.is_none() && self.on_both.is_none()
    }
}

impl<S, D> Default for Effect<S, D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Effects for the historied store, keyed by action kind.
pub struct EffectRegistry<S, D> {
    effects: HashMap<String, Effect<S, D>>,
}

impl<S, D> EffectRegistry<S, D> {
    /// A registry with no effects.
    pub fn empty() -> Self {
        Self {
            effects: HashMap::new(),
        }
    }

    pub fn builder() -> EffectRegistryBuilder<S, D> {
        EffectRegistryBuilder::new()
    }

    pub fn get(&self, kind: &str) -> Option<&Effect<S, D>> {
        self.effects.get(kind)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl<S, D> Default for EffectRegistry<S, D> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builder that validates registrations before producing a registry.
///
/// All violations are accumulated and reported together.
///
/// # Example
///
/// ```rust
/// use rewind::effects::{Effect, EffectRegistry, RegistryViolation};
///
/// let result = EffectRegistry::<i32, ()>::builder()
///     .known_kinds(&["ADD", "REMOVE"])
///     .register("ADD", Effect::new().on_both(|_, _| Ok(())))
///     .register("RENAME", Effect::new().on_both(|_, _| Ok(())))
///     .register("REMOVE", Effect::new())
///     .build();
///
/// let err = result.err().unwrap();
/// assert_eq!(err.violations().len(), 2);
/// assert!(err.violations().contains(&RegistryViolation::UnknownKind { kind: "RENAME".into() }));
/// ```
pub struct EffectRegistryBuilder<S, D> {
    entries: Vec<(String, Effect<S, D>)>,
    known_kinds: Option<Vec<String>>,
}

impl<S, D> EffectRegistryBuilder<S, D> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            known_kinds: None,
        }
    }

    /// Restrict registrations to a closed action catalog.
    pub fn known_kinds(mut self, kinds: &[&str]) -> Self {
        self.known_kinds = Some(kinds.iter().map(|k| k.to_string()).collect());
        self
    }

    pub fn register(mut self, kind: impl Into<String>, effect: Effect<S, D>) -> Self {
        self.entries.push((kind.into(), effect));
        self
    }

    pub fn build(self) -> Result<EffectRegistry<S, D>, RegistryError> {
        let registrations: Vec<(&str, bool)> = self
            .entries
            .iter()
            .map(|(kind, effect)| (kind.as_str(), effect.is_empty()))
            .collect();
        validate_registrations(&registrations, self.known_kinds.as_deref())?;

        Ok(EffectRegistry {
            effects: self.entries.into_iter().collect(),
        })
    }
}

impl<S, D> Default for EffectRegistryBuilder<S, D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Effects for the static store: one callback per kind, run after dispatch.
pub struct StaticEffects<S, A> {
    effects: HashMap<String, StaticEffectFn<S, A>>,
}

impl<S, A> StaticEffects<S, A> {
    pub fn empty() -> Self {
        Self {
            effects: HashMap::new(),
        }
    }

    pub fn builder() -> StaticEffectsBuilder<S, A> {
        StaticEffectsBuilder {
            entries: Vec::new(),
            known_kinds: None,
        }
    }

    pub fn get(&self, kind: &str) -> Option<&StaticEffectFn<S, A>> {
        self.effects.get(kind)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl<S, A> Default for StaticEffects<S, A> {
    fn default() -> Self {
        Self::empty()
    }
}

pub struct StaticEffectsBuilder<S, A> {
    entries: Vec<(String, StaticEffectFn<S, A>)>,
    known_kinds: Option<Vec<String>>,
}

impl<S, A> StaticEffectsBuilder<S, A> {
    pub fn known_kinds(mut self, kinds: &[&str]) -> Self {
        self.known_kinds = Some(kinds.iter().map(|k| k.to_string()).collect());
        self
    }

    pub fn register<F>(mut self, kind: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&S, &A) -> Result<(), EffectError> + Send + Sync + 'static,
    {
        self.entries.push((kind.into(), Arc::new(callback)));
        self
    }

    pub fn build(self) -> Result<StaticEffects<S, A>, RegistryError> {
        let registrations: Vec<(&str, bool)> = self
            .entries
            .iter()
            .map(|(kind, _)| (kind.as_str(), false))
            .collect();
        validate_registrations(&registrations, self.known_kinds.as_deref())?;

        Ok(StaticEffects {
            effects: self.entries.into_iter().collect(),
        })
    }
}

fn check(violation: Option<RegistryViolation>) -> Check {
    match violation {
        Some(violation) => Validation::fail(violation),
        None => Validation::success(()),
    }
}

/// Validate `(kind, is_empty)` pairs, accumulating every violation.
fn validate_registrations(
    registrations: &[(&str, bool)],
    known_kinds: Option<&[String]>,
) -> Result<(), RegistryError> {
    let mut seen = HashSet::new();
    let mut checks: Vec<Check> = Vec::new();

    for (kind, is_empty) in registrations {
        let kind = kind.to_string();

        checks.push(check(is_empty.then(|| RegistryViolation::EmptyEffect {
            kind: kind.clone(),
        })));

        checks.push(check((kind == INIT_KIND).then(|| {
            RegistryViolation::ReservedKind { kind: kind.clone() }
        })));

        let duplicate = !seen.insert(kind.clone());
        checks.push(check(duplicate.then(|| RegistryViolation::DuplicateKind {
            kind: kind.clone(),
        })));

        if let Some(known) = known_kinds {
            let unknown = !known.contains(&kind);
            checks.push(check(unknown.then(|| RegistryViolation::UnknownKind {
                kind: kind.clone(),
            })));
        }
    }

    match Validation::all_vec(checks) {
        Validation::Success(_) => Ok(()),
        Validation::Failure(errors) => Err(RegistryError::Invalid(errors.iter().cloned().collect())),
    }
}
