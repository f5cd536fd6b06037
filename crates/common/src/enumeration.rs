//! Closed sets of named integral constants.
//!
//! Concrete enumerations are declared with the [`enumeration!`](crate::enumeration!)
//! macro, which fixes the ordered list of members once at compile time. Two
//! members are equal iff they are the same member, and ordering follows `id`.
//!
//! Values that must cross a type boundary (logs, storage rows, generic
//! validation) are carried as [`EnumerationValue`], whose comparison is
//! fallible: comparing values of two different enumeration types yields
//! [`EnumerationError::TypeMismatch`] instead of an arbitrary answer.

use std::cmp::Ordering;
use std::fmt;

use crate::EnumerationError;

/// Contract shared by every concrete enumeration type.
pub trait Enumeration:
    Copy + Eq + Ord + std::hash::Hash + fmt::Debug + Send + Sync + 'static
{
    /// Stable name of the enumeration type.
    const TYPE_NAME: &'static str;

    /// Integral id, unique within the enumeration type.
    fn id(&self) -> i32;

    /// Member name.
    fn name(&self) -> &'static str;

    /// Every declared member, in declaration order.
    fn all() -> &'static [Self];

    /// Looks up the member with the given id.
    fn from_id(id: i32) -> Result<Self, EnumerationError> {
        Self::all()
            .iter()
            .copied()
            .find(|member| member.id() == id)
            .ok_or(EnumerationError::UnknownId {
                type_name: Self::TYPE_NAME,
                id,
            })
    }

    /// Looks up the member with the given name (case-insensitive).
    fn from_name(name: &str) -> Result<Self, EnumerationError> {
        Self::all()
            .iter()
            .copied()
            .find(|member| member.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| EnumerationError::UnknownName {
                type_name: Self::TYPE_NAME,
                name: name.to_string(),
            })
    }

    /// Returns true if `id` names a declared member.
    fn is_declared(id: i32) -> bool {
        Self::all().iter().any(|member| member.id() == id)
    }

    /// Erases the concrete type.
    fn to_value(self) -> EnumerationValue {
        EnumerationValue {
            type_name: Self::TYPE_NAME,
            id: self.id(),
            name: self.name(),
        }
    }
}

/// Returns every declared member of `T`, in declaration order.
pub fn get_all<T: Enumeration>() -> &'static [T] {
    T::all()
}

/// Returns true when no id appears twice. Evaluated at compile time by
/// [`enumeration!`](crate::enumeration!).
#[doc(hidden)]
pub const fn ids_are_unique(ids: &[i32]) -> bool {
    let mut i = 0;
    while i < ids.len() {
        let mut j = i + 1;
        while j < ids.len() {
            if ids[i] == ids[j] {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

/// A type-erased enumeration member.
#[derive(Debug, Clone, Copy)]
pub struct EnumerationValue {
    type_name: &'static str,
    id: i32,
    name: &'static str,
}

impl EnumerationValue {
    /// Name of the concrete enumeration type this value came from.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Member id.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Member name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Compares by id, failing when `other` belongs to another enumeration type.
    pub fn try_compare(&self, other: &EnumerationValue) -> Result<Ordering, EnumerationError> {
        if self.type_name != other.type_name {
            return Err(EnumerationError::TypeMismatch {
                expected: self.type_name,
                found: other.type_name,
            });
        }
        Ok(self.id.cmp(&other.id))
    }

    /// Recovers the concrete member, failing on a type mismatch.
    pub fn downcast<T: Enumeration>(&self) -> Result<T, EnumerationError> {
        if self.type_name != T::TYPE_NAME {
            return Err(EnumerationError::TypeMismatch {
                expected: T::TYPE_NAME,
                found: self.type_name,
            });
        }
        T::from_id(self.id)
    }
}

// Values of different enumeration types are never equal.
impl PartialEq for EnumerationValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.id == other.id
    }
}

impl Eq for EnumerationValue {}

impl std::hash::Hash for EnumerationValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
        self.id.hash(state);
    }
}

// Incomparable across types; use `try_compare` to get the error.
impl PartialOrd for EnumerationValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_compare(other).ok()
    }
}

impl fmt::Display for EnumerationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Declares a concrete [`Enumeration`].
///
/// ```
/// common::enumeration! {
///     /// Traffic light colours.
///     pub enum Light {
///         Red = 1,
///         Amber = 2,
///         Green = 3,
///     }
/// }
///
/// use common::Enumeration;
/// assert_eq!(Light::all(), &[Light::Red, Light::Amber, Light::Green]);
/// assert_eq!(Light::from_id(2).unwrap(), Light::Amber);
/// assert!(Light::Red < Light::Green);
/// ```
///
/// Ids must be unique within the enumeration; a repeated id fails to compile:
///
/// ```compile_fail
/// common::enumeration! {
///     pub enum Light {
///         Red = 1,
///         Amber = 1,
///     }
/// }
/// ```
#[macro_export]
macro_rules! enumeration {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $id:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),+
        }

        const _: () = assert!(
            $crate::enumeration::ids_are_unique(&[ $( $id ),+ ]),
            concat!("duplicate id in enumeration ", stringify!($name))
        );

        impl $crate::Enumeration for $name {
            const TYPE_NAME: &'static str = stringify!($name);

            fn id(&self) -> i32 {
                match self {
                    $( Self::$variant => $id ),+
                }
            }

            fn name(&self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($variant) ),+
                }
            }

            fn all() -> &'static [Self] {
                &[ $( Self::$variant ),+ ]
            }
        }

        impl ::std::cmp::PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> ::std::option::Option<::std::cmp::Ordering> {
                ::std::option::Option::Some(::std::cmp::Ord::cmp(self, other))
            }
        }

        impl ::std::cmp::Ord for $name {
            fn cmp(&self, other: &Self) -> ::std::cmp::Ordering {
                $crate::Enumeration::id(self).cmp(&$crate::Enumeration::id(other))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::Enumeration::name(self))
            }
        }

        impl ::std::convert::TryFrom<i32> for $name {
            type Error = $crate::EnumerationError;

            fn try_from(id: i32) -> ::std::result::Result<Self, Self::Error> {
                <Self as $crate::Enumeration>::from_id(id)
            }
        }

        impl ::std::convert::From<$name> for $crate::EnumerationValue {
            fn from(member: $name) -> Self {
                $crate::Enumeration::to_value(member)
            }
        }
    };
}
