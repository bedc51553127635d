//! Renderable items passed to `explain`/`start`/`end`.
//!
//! A [`Value`] is a tagged union of an eager literal (already text), a
//! deferred thunk, and the [`RESULT`] placeholder consumed by the block
//! combinator. Thunks are forced **recursively** (a thunk may itself
//! produce another thunk) and only when a surviving record is actually
//! rendered, which is the laziness contract the engine relies on.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use std::fmt;
use std::sync::Arc;

/// Zero-argument deferred computation producing another renderable item.
pub type Thunk = dyn Fn() -> Value + Send + Sync;

/// One renderable item of a record's object sequence.
#[derive(Clone)]
pub enum Value {
    /// Eager literal, rendered at construction time.
    Text(String),
    /// Deferred computation, forced only when a surviving record is rendered.
    Lazy(Arc<Thunk>),
    /// Placeholder substituted with a block body's return value; see [`RESULT`].
    Result,
}

/// Placeholder for a block body's return value in the close-object sequence
/// of [`crate::Logger::block`].
pub const RESULT: Value = Value::Result;

impl Value {
    /// Force this item to text, resolving thunks recursively until a
    /// non-thunk value results.
    #[must_use]
    pub fn force(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Lazy(thunk) => thunk().force(),
            // Unsubstituted placeholder outside a block close; render a stub.
            Self::Result => "<result>".to_owned(),
        }
    }

    pub(crate) fn is_result(&self) -> bool {
        matches!(self, Self::Result)
    }
}

/// Wrap a computation as a lazily forced [`Value`].
///
/// The closure runs once per rendering handler, and never when the logger is
/// inactive or the record is dropped by gating.
pub fn lazy<T, F>(f: F) -> Value
where
    F: Fn() -> T + Send + Sync + 'static,
    T: Into<Value>,
{
    Value::Lazy(Arc::new(move || f().into()))
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
            Self::Result => f.write_str("Result"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

macro_rules! impl_from_display {
    ($($ty:ty),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::Text(v.to_string())
            }
        })*
    };
}

impl_from_display!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char);

/// Build a `Vec<Value>` from a mixed argument list.
///
/// ```
/// use explan_core::objects;
/// let args = objects!["Starting block ", 1];
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! objects {
    () => {
        ::std::vec::Vec::<$crate::value::Value>::new()
    };
    ($($item:expr),+ $(,)?) => {
        ::std::vec![$($crate::value::Value::from($item)),+]
    };
}
