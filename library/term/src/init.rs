//! The startup check of the representation invariants.
//!
//! Most facts the encoding relies on are checked at compile time. The ones
//! that depend on how the layouts actually overlap in memory, or that range
//! over every subtag and family, are checked here once before any term is
//! built. There is no degraded mode: a failure is fatal.
use core::mem;
use std::process;

use log::{debug, error};
use parking_lot::Once;

use crate::arch::{self, WORD_SIZE};
use crate::error::InvariantError;
use crate::term::{self, Family, Header, MagicRef, OrdinaryRef, Subtag, MAX_ARITY};

/// Parameters of the startup check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvariantConfig {
    /// The value ordinary references carry in their marker slot
    pub ordinary_ref_marker: u32,
    /// The pointer pattern stored in a probe magic reference; the most
    /// marker-like pointer an allocator could hand out
    pub probe_pointer: usize,
}
impl Default for InvariantConfig {
    fn default() -> Self {
        Self {
            ordinary_ref_marker: term::ORDINARY_REF_MARKER,
            probe_pointer: !3,
        }
    }
}

static VERIFIED: Once = Once::new();

/// Checks the representation invariants of this build, once per process.
///
/// If any invariant does not hold, the violation is logged and the process
/// aborts. Nothing built on this crate can run correctly in that case, so
/// the failure cannot be caught.
pub fn verify_representation_invariants() {
    VERIFIED.call_once(|| abort_on_violation(&InvariantConfig::default()));
}

fn abort_on_violation(config: &InvariantConfig) {
    match check_representation(config) {
        Ok(()) => debug!(target: "term", "term representation invariants hold"),
        Err(err) => {
            error!(target: "term", "term representation invariant violated: {}", err);
            process::abort();
        }
    }
}

/// Checks the representation invariants against `config`, every time it is
/// called.
///
/// # Panics
///
/// Panics if any invariant does not hold, after logging the violation.
pub fn enforce_representation(config: &InvariantConfig) {
    match check_representation(config) {
        Ok(()) => debug!(target: "term", "term representation invariants hold"),
        Err(err) => {
            error!(target: "term", "term representation invariant violated: {}", err);
            panic!("term representation invariant violated: {}", err);
        }
    }
}

/// Runs every startup check, returning the first violation found
pub fn check_representation(config: &InvariantConfig) -> Result<(), InvariantError> {
    check_ref_layout()?;
    check_ref_marker(config)?;
    check_families()?;
    check_arity_bounds()
}

fn check_ref_layout() -> Result<(), InvariantError> {
    let ordinary = mem::size_of::<OrdinaryRef>();
    let magic = mem::size_of::<MagicRef>();
    if arch::REF_MARKER_DISCIPLINE {
        if ordinary != magic {
            return Err(InvariantError::RefLayout(
                "ordinary and magic references differ in size",
            ));
        }
        if ordinary != (1 + arch::ORDINARY_REF_ARITY) * WORD_SIZE {
            return Err(InvariantError::RefLayout(
                "reference size does not match its header arity",
            ));
        }
        match term::marker_offset() {
            Some(offset) if offset >= WORD_SIZE && offset + 4 <= 2 * WORD_SIZE => Ok(()),
            _ => Err(InvariantError::RefLayout(
                "marker slot does not overlap the magic binary pointer",
            )),
        }
    } else if ordinary == magic {
        Err(InvariantError::RefLayout(
            "ordinary and magic references cannot be told apart by arity",
        ))
    } else {
        Ok(())
    }
}

#[cfg(target_pointer_width = "64")]
fn check_ref_marker(config: &InvariantConfig) -> Result<(), InvariantError> {
    let probe = term::probe_magic_layout(config.probe_pointer);
    // Both layouts are plain words, so reading across them is well-defined
    let marker = unsafe { probe.ordinary.marker() };
    if marker == config.ordinary_ref_marker {
        Err(InvariantError::MarkerCollision {
            marker,
            pointer: config.probe_pointer,
        })
    } else {
        Ok(())
    }
}

#[cfg(not(target_pointer_width = "64"))]
fn check_ref_marker(_config: &InvariantConfig) -> Result<(), InvariantError> {
    Ok(())
}

fn check_families() -> Result<(), InvariantError> {
    for family in Family::ALL {
        for subtag in Subtag::ALL {
            let by_mask = family.matches(subtag.bits());
            let by_definition = family.contains(subtag);
            let mask = family.mask();
            if by_mask && !by_definition {
                return Err(InvariantError::FamilyOverlap {
                    family,
                    subtag,
                    mask,
                });
            }
            if by_definition && !by_mask {
                return Err(InvariantError::FamilyMiss {
                    family,
                    subtag,
                    mask,
                });
            }
        }
    }
    Ok(())
}

fn check_arity_bounds() -> Result<(), InvariantError> {
    for subtag in Subtag::ALL {
        let header = Header::new(subtag, MAX_ARITY);
        if Subtag::from_header_tag(header.as_term().raw()) != Some(subtag)
            || header.arity() != MAX_ARITY
        {
            return Err(InvariantError::ArityOverflow(subtag));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn reference_build_passes() {
        assert_eq!(check_representation(&InvariantConfig::default()), Ok(()));
    }

    #[test]
    fn verify_is_idempotent() {
        verify_representation_invariants();
        verify_representation_invariants();
        assert!(VERIFIED.state().done());
    }

    /// Runs the abort path in a child copy of this test binary, since it
    /// takes the whole process down
    #[cfg(target_pointer_width = "64")]
    #[test]
    fn colliding_marker_aborts_the_process() {
        const CHILD_VAR: &str = "FIREFLY_TERM_ABORT_CHILD";
        const NAME: &str = "init::tests::colliding_marker_aborts_the_process";

        if std::env::var_os(CHILD_VAR).is_some() {
            let config = InvariantConfig {
                ordinary_ref_marker: !3usize as u32,
                ..InvariantConfig::default()
            };
            abort_on_violation(&config);
            return;
        }

        let status = process::Command::new(std::env::current_exe().unwrap())
            .args([NAME, "--exact", "--test-threads=1"])
            .env(CHILD_VAR, "1")
            .stdout(process::Stdio::null())
            .stderr(process::Stdio::null())
            .status()
            .unwrap();
        assert!(!status.success());
        // Killed by a signal rather than exiting with a panic's status code
        #[cfg(unix)]
        assert_eq!(status.code(), None);
    }

    #[test]
    fn passing_check_does_not_abort() {
        abort_on_violation(&InvariantConfig::default());
    }
}
