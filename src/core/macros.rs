//! Macros for declaring closed action catalogs.

/// Declare an action enum together with its kind catalog.
///
/// Each variant is mapped to a kind string. The generated `KINDS` constant
/// lists every kind, so an effect registry can reject registrations for
/// kinds the catalog does not contain. `kind_name()` returns the kind of a
/// value and is meant to back an `Action::kind` implementation.
///
/// # Example
///
/// ```
/// use rewind::action_enum;
/// use rewind::core::Action;
///
/// action_enum! {
///     #[derive(Debug, Clone)]
///     pub enum TodoAction {
///         Add { id: u32, text: String } => "TODO_ADD",
///         Toggle(u32) => "TODO_TOGGLE",
///         Clear => "TODO_CLEAR",
///     }
/// }
///
/// impl Action for TodoAction {
///     type EffectData = u32;
///
///     fn kind(&self) -> &str {
///         self.kind_name()
///     }
///
///     fn effect_data(&self) -> Option<u32> {
///         match self {
///             Self::Add { id, .. } | Self::Toggle(id) => Some(*id),
///             Self::Clear => None,
///         }
///     }
/// }
///
/// assert_eq!(TodoAction::KINDS, &["TODO_ADD", "TODO_TOGGLE", "TODO_CLEAR"]);
/// assert_eq!(TodoAction::Toggle(3).kind(), "TODO_TOGGLE");
/// ```
#[macro_export]
macro_rules! action_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
                $( ( $($tuple:ty),* $(,)? ) )?
                $( { $($field:ident : $field_ty:ty),* $(,)? } )?
                => $kind:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
                $( ( $($tuple),* ) )?
                $( { $($field : $field_ty),* } )?
            ),*
        }

        impl $name {
            /// Every kind this catalog can produce.
            pub const KINDS: &'static [&'static str] = &[$($kind),*];

            /// Kind string of this action.
            pub fn kind_name(&self) -> &'static str {
                match self {
                    $(Self::$variant { .. } => $kind),*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    action_enum! {
        #[derive(Debug, Clone, PartialEq)]
        enum EditorAction {
            Insert { at: usize, text: String } => "EDITOR_INSERT",
            Delete(usize, usize) => "EDITOR_DELETE",
            Save => "EDITOR_SAVE",
        }
    }

    #[test]
    fn kinds_cover_every_variant() {
        assert_eq!(
            EditorAction::KINDS,
            &["EDITOR_INSERT", "EDITOR_DELETE", "EDITOR_SAVE"]
        );
    }

    #[test]
    fn kind_name_matches_variant() {
        let insert = EditorAction::Insert {
            at: 0,
            text: "hi".to_string(),
        };
        assert_eq!(insert.kind_name(), "EDITOR_INSERT");
        assert_eq!(EditorAction::Delete(1, 2).kind_name(), "EDITOR_DELETE");
        assert_eq!(EditorAction::Save.kind_name(), "EDITOR_SAVE");
    }

    #[test]
    fn generated_enum_keeps_derives() {
        let save = EditorAction::Save;
        assert_eq!(save.clone(), EditorAction::Save);
    }
}
