//! Typed records for the JSON documents inside a package.
//!
//! Every field is optional: older files omit fields that newer ones
//! always write, and an absent value must stay distinguishable from an
//! explicit zero. Unknown fields are ignored. Numbers are kept as
//! [`serde_json::Number`] so they are written back exactly as read.
//!
//! Fields that use one of the string grammars are typed with the codec
//! types ([`Point`](crate::codec::Point),
//! [`PointList`](crate::codec::PointList),
//! [`Archive`](crate::codec::Archive)); everything else maps one to one.

/// Declares a record whose fields are all `Option`al, camelCase on the
/// wire, and skipped when absent.
macro_rules! record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident: $ty:ty,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            $(
                $(#[$field_meta])*
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }
    };
}

/// Declares a closed integer enumeration with an `Unknown` fallback for
/// values outside the table.
macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Unknown(i64),
        }

        impl $name {
            pub fn from_i64(value: i64) -> Self {
                match value {
                    $($value => $name::$variant,)+
                    other => $name::Unknown(other),
                }
            }

            pub fn as_i64(self) -> i64 {
                match self {
                    $($name::$variant => $value,)+
                    $name::Unknown(other) => other,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($name::$variant => f.write_str(stringify!($variant)),)+
                    $name::Unknown(other) => write!(f, "{}({})", stringify!($name), other),
                }
            }
        }
    };
}

mod constants;
mod document;
mod layer;
mod style;

pub use constants::*;
pub use document::*;
pub use layer::*;
pub use style::*;

use serde_json::Number;

/// Tag a numeric field with its named enumeration.
fn tagged<T>(value: &Option<Number>, from_i64: fn(i64) -> T) -> Option<T> {
    value.as_ref().and_then(Number::as_i64).map(from_i64)
}
