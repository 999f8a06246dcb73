//! Actions and the records the history keeps of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Kind of the synthetic record at the root of every history.
pub const INIT_KIND: &str = "INIT";

/// A descriptor of an intended state transition.
///
/// The reducer receives the full action. The history only keeps the kind and
/// the effect payload, which is what effects are replayed with.
///
/// # Example
///
/// ```rust
/// use rewind::core::Action;
///
/// #[derive(Debug)]
/// enum CounterAction {
///     Add(i64),
///     Reset,
/// }
///
/// impl Action for CounterAction {
///     type EffectData = i64;
///
///     fn kind(&self) -> &str {
///         match self {
///             Self::Add(_) => "ADD",
///             Self::Reset => "RESET",
///         }
///     }
///
///     fn effect_data(&self) -> Option<i64> {
///         match self {
///             Self::Add(n) => Some(*n),
///             Self::Reset => None,
///         }
///     }
/// }
///
/// assert_eq!(CounterAction::Add(2).kind(), "ADD");
/// assert_eq!(CounterAction::Reset.effect_data(), None);
/// ```
pub trait Action: Debug + Send + Sync + 'static {
    /// Payload handed to effects when this action is applied or reverted.
    type EffectData: Clone + Debug + Send + Sync + 'static;

    /// Identifies the transition. Effects are looked up by this value.
    fn kind(&self) -> &str;

    /// Payload recorded alongside the kind. Defaults to none.
    fn effect_data(&self) -> Option<Self::EffectData> {
        None
    }
}

/// String-keyed action with an opaque JSON payload.
///
/// Use this when the action catalog is open-ended. Narrowing the payload is
/// left to the effect callback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasicAction {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_data: Option<serde_json::Value>,
}

impl BasicAction {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            effect_data: None,
        }
    }

    pub fn with_effect_data(mut self, data: serde_json::Value) -> Self {
        self.effect_data = Some(data);
        self
    }
}

impl Action for BasicAction {
    type EffectData = serde_json::Value;

    fn kind(&self) -> &str {
        &self.kind
    }

    fn effect_data(&self) -> Option<serde_json::Value> {
        self.effect_data.clone()
    }
}

/// Record of an applied action, kept in lock-step with the snapshot it produced.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionRecord<D> {
    /// Kind of the action that produced the matching snapshot
    pub kind: String,
    /// Payload replayed to effects
    pub effect_data: Option<D>,
    /// When the action was applied
    pub recorded_at: DateTime<Utc>,
}

impl<D> ActionRecord<D> {
    /// The synthetic record paired with the initial snapshot.
    pub fn init() -> Self {
        Self {
            kind: INIT_KIND.to_string(),
            effect_data: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn from_action<A>(action: &A) -> Self
    where
        A: Action<EffectData = D>,
    {
        Self {
            kind: action.kind().to_string(),
            effect_data: action.effect_data(),
            recorded_at: Utc::now(),
        }
    }

    pub fn is_init(&self) -> bool {
        self.kind == INIT_KIND
    }
}
