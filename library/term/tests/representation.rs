use pretty_assertions::assert_eq;

use firefly_term::{
    check_representation, enforce_representation, verify_representation_invariants,
    InvariantConfig, InvariantError,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn startup_check_passes_on_this_build() {
    init_logging();
    assert_eq!(check_representation(&InvariantConfig::default()), Ok(()));
    verify_representation_invariants();
    // Subsequent calls are no-ops
    verify_representation_invariants();
}

#[cfg(target_pointer_width = "64")]
#[test]
fn colliding_marker_is_detected() {
    init_logging();
    let config = InvariantConfig {
        ordinary_ref_marker: !3usize as u32,
        ..InvariantConfig::default()
    };
    assert_eq!(
        check_representation(&config),
        Err(InvariantError::MarkerCollision {
            marker: 0xFFFF_FFFC,
            pointer: !3,
        })
    );
}

#[cfg(target_pointer_width = "64")]
#[test]
#[should_panic(expected = "cannot differentiate between magic and ordinary references")]
fn colliding_marker_is_fatal() {
    init_logging();
    let config = InvariantConfig {
        ordinary_ref_marker: !3usize as u32,
        ..InvariantConfig::default()
    };
    enforce_representation(&config);
}

#[test]
fn probe_pointer_must_be_aligned_to_collide() {
    // An unaligned probe could forge any marker, but no allocation returns one
    let config = InvariantConfig {
        probe_pointer: !7,
        ..InvariantConfig::default()
    };
    assert_eq!(check_representation(&config), Ok(()));
}
