//! Precondition guards for the checked accessor layer.
//!
//! Every accessor that narrows a term word to a more specific kind states
//! its precondition with `precondition!`. When debug assertions or the
//! `checked` feature are enabled, the predicate is evaluated and a failure
//! panics with the predicate, the offending word and the caller's location.
//! Otherwise the guard folds away to nothing and the accessor is a bare mask
//! or shift.
use core::panic::Location;

/// Whether accessor preconditions are evaluated in this build
pub const ENABLED: bool = cfg!(any(debug_assertions, feature = "checked"));

/// Checks a predicate over a term word (or raw value) in checked builds.
///
/// Two forms are accepted:
///
/// * `precondition!(term.is_boxed())`, a predicate method on `OpaqueTerm`
/// * `precondition!(is_taggable_pointer(ptr as usize))`, a free function over
///   a raw word
macro_rules! precondition {
    ($term:ident . $pred:ident ()) => {
        if $crate::term::precondition::ENABLED && !$term.$pred() {
            $crate::term::precondition::violated(stringify!($pred), $term.raw());
        }
    };
    ($pred:ident ($value:expr)) => {
        if $crate::term::precondition::ENABLED && !$pred($value) {
            $crate::term::precondition::violated(stringify!($pred), $value as usize);
        }
    };
}

/// Reports a failed accessor precondition.
///
/// The reported location is that of the accessor's caller, since every
/// checked accessor is itself `#[track_caller]` in checked builds.
#[cold]
#[inline(never)]
#[track_caller]
pub fn violated(predicate: &'static str, word: usize) -> ! {
    let location = Location::caller();
    panic!(
        "precondition failed: {}({:#x}) at {}:{}:{}",
        predicate,
        word,
        location.file(),
        location.line(),
        location.column()
    )
}
