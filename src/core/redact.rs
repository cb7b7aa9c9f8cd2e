//! Message arguments and redaction
//!
//! Arguments of a lazily rendered message are stored as [`Arg`] values. An
//! argument wrapped with [`Arg::redacted`] is always printed through
//! [`Redactable::redacted`]; its `Display` form never reaches a backend.

use std::fmt;
use std::sync::Arc;

/// A value with a safe-to-log representation
///
/// `redacted` is the only text a backend ever sees for the value. Leave
/// `Display` unimplemented on secret types so they cannot be passed to
/// [`Arg::value`] by mistake:
///
/// ```
/// use rust_log_router::{Arg, Redactable};
///
/// struct Credentials { user: String, password: String }
///
/// impl Redactable for Credentials {
///     fn redacted(&self) -> String {
///         format!("{}:********", self.user)
///     }
/// }
///
/// let creds = Credentials { user: "fooser".into(), password: "t0ps3cr3t".into() };
/// assert_eq!(Arg::redacted(creds).render(), "fooser:********");
/// ```
///
/// ```compile_fail
/// use rust_log_router::{Arg, Redactable};
///
/// struct Credentials { user: String, password: String }
///
/// impl Redactable for Credentials {
///     fn redacted(&self) -> String {
///         format!("{}:********", self.user)
///     }
/// }
///
/// let creds = Credentials { user: "fooser".into(), password: "t0ps3cr3t".into() };
/// let _ = Arg::value(creds);
/// ```
pub trait Redactable: Send + Sync {
    /// Must be free of side effects; it runs on every render
    fn redacted(&self) -> String;
}

/// One argument of a message
#[derive(Clone)]
pub enum Arg {
    Value(Arc<dyn fmt::Display + Send + Sync>),
    Redacted(Arc<dyn Redactable>),
}

impl Arg {
    /// An argument printed through its `Display` form as is
    ///
    /// A type that implements both `Display` and [`Redactable`] prints its
    /// raw form here; wrap such values with [`Arg::redacted`].
    pub fn value<T: fmt::Display + Send + Sync + 'static>(value: T) -> Self {
        Arg::Value(Arc::new(value))
    }

    pub fn redacted<T: Redactable + 'static>(value: T) -> Self {
        Arg::Redacted(Arc::new(value))
    }

    pub fn is_redacted(&self) -> bool {
        matches!(self, Arg::Redacted(_))
    }

    /// Text substituted into the message
    pub fn render(&self) -> String {
        match self {
            Arg::Value(value) => value.to_string(),
            Arg::Redacted(value) => value.redacted(),
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(value) => f.debug_tuple("Value").field(&value.to_string()).finish(),
            Arg::Redacted(value) => f.debug_tuple("Redacted").field(&value.redacted()).finish(),
        }
    }
}

macro_rules! impl_from_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::value(value)
                }
            }
        )*
    };
}

impl_from_display!(
    String, &'static str, char, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128,
    usize, f32, f64,
);

/// Render a `{}` format string against its arguments
///
/// `{{` and `}}` are literal braces. Placeholders with no argument left render
/// as `{MISSING}`; surplus arguments are appended, space separated.
pub(crate) fn render_format(format: &str, args: &[Arg]) -> String {
    let mut out = String::with_capacity(format.len() + args.len() * 8);
    let mut args_iter = args.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' if chars.peek() == Some(&'}') => {
                chars.next();
                match args_iter.next() {
                    Some(arg) => out.push_str(&arg.render()),
                    None => out.push_str("{MISSING}"),
                }
            }
            _ => out.push(c),
        }
    }

    for arg in args_iter {
        out.push(' ');
        out.push_str(&arg.render());
    }
    out
}

/// Join arguments with single spaces
pub(crate) fn render_args(args: &[Arg]) -> String {
    args.iter().map(Arg::render).collect::<Vec<_>>().join(" ")
}
