//! # Schema Declaration

/// Declare a schema: a marker type, one [`Accessor`](crate::Accessor)
/// constant per field, and its [`Schema`](crate::Schema) registry.
///
/// Each field is `NAME: Type = "storage key" => default`. The default is an
/// expression evaluated on demand.
///
/// An optional `capabilities` block maps capability fields to declared fields.
///
/// ```ignore
/// pub mod font {
///     pub const IS_BOLD: CapabilityField<bool> = CapabilityField::new("FontSettings.isBold");
/// }
///
/// stored_schema! {
///     /// User preferences.
///     pub struct Preferences {
///         IS_BOLD: bool = "isBold" => false,
///         GREETING: String = "greeting" => "Hello".to_owned(),
///         UPDATED: Option<DateTime<Utc>> = "updatedDate" => None,
///     }
///     capabilities {
///         font::IS_BOLD => IS_BOLD,
///     }
/// }
/// ```
#[macro_export]
macro_rules! stored_schema {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty = $key:literal => $default:expr
            ),* $(,)?
        }
        $(
            capabilities {
                $( $capability:path => $target:ident ),* $(,)?
            }
        )?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        $vis struct $name;

        impl $name {
            $(
                $(#[$field_meta])*
                pub const $field: $crate::Accessor<$name, $ty> =
                    $crate::Accessor::new(stringify!($field), $key, || $default);
            )*
        }

        impl $crate::Schema for $name {
            const NAME: &'static str = stringify!($name);

            const FIELDS: &'static [&'static dyn $crate::Field<Self>] = &[
                $( &$name::$field ),*
            ];

            $(
                const CAPABILITIES: &'static [$crate::CapabilityBinding<Self>] = &[
                    $( $crate::CapabilityBinding::new($capability.id(), &$name::$target) ),*
                ];
            )?
        }
    };
}
