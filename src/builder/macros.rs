//! Macros for ergonomic state type definitions.

/// Generate a state struct, its patch type and the `State` implementation.
///
/// Every field of the generated patch is optional and carries a fluent
/// setter; `apply` merges the fields that are present and retains the rest.
///
/// # Example
///
/// ```
/// use conflux::core::State;
/// use conflux::state_struct;
///
/// state_struct! {
///     pub struct Counter {
///         count: i64,
///         label: String,
///     }
///     patch: CounterPatch
/// }
///
/// let counter = Counter { count: 0, label: "boot".into() };
/// let next = counter.apply(&CounterPatch::default().count(3));
///
/// assert_eq!(next.count, 3);
/// assert_eq!(next.label, "boot");
/// ```
#[macro_export]
macro_rules! state_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty
            ),* $(,)?
        }

        patch: $patch:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field : $ty
            ),*
        }

        #[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
        $vis struct $patch {
            $(pub $field : Option<$ty>),*
        }

        impl $patch {
            $(
                $vis fn $field(mut self, value: $ty) -> Self {
                    self.$field = Some(value);
                    self
                }
            )*
        }

        impl $crate::core::State for $name {
            type Patch = $patch;

            fn apply(&self, patch: &$patch) -> Self {
                let mut next = self.clone();
                $(
                    if let Some(value) = &patch.$field {
                        next.$field = value.clone();
                    }
                )*
                next
            }
        }
    };
}
