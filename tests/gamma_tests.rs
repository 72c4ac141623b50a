//! Gamma Codec Tests
//!
//! Tests for:
//! - linearize/delinearize: true inverse pair at gamma 2.2
//! - endpoint and midpoint values
//! - componentwise vector variants agreeing with the scalar functions

use glam::{Vec3, Vec4};

use veil::gamma::{delinearize, delinearize3, delinearize4, linearize, linearize3, linearize4};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// Round-trip
// ============================================================================

#[test]
fn round_trip_over_full_range() {
    for i in 0..=256 {
        let c = i as f32 / 256.0;
        assert!(
            approx(delinearize(linearize(c)), c),
            "delinearize(linearize({c})) diverged"
        );
        assert!(
            approx(linearize(delinearize(c)), c),
            "linearize(delinearize({c})) diverged"
        );
    }
}

#[test]
fn endpoints_are_fixed_points() {
    assert!(approx(linearize(0.0), 0.0));
    assert!(approx(linearize(1.0), 1.0));
    assert!(approx(delinearize(0.0), 0.0));
    assert!(approx(delinearize(1.0), 1.0));
}

#[test]
fn midpoint_matches_power_curve() {
    // 0.5^2.2
    assert!(approx(linearize(0.5), 0.217_637_64));
    assert!(linearize(0.5) < 0.5, "linearize must darken mid tones");
    assert!(delinearize(0.5) > 0.5, "delinearize must brighten mid tones");
}

#[test]
fn linearize_is_monotonic() {
    let mut prev = linearize(0.0);
    for i in 1..=64 {
        let next = linearize(i as f32 / 64.0);
        assert!(next > prev);
        prev = next;
    }
}

// ============================================================================
// Vector variants
// ============================================================================

#[test]
fn vec3_variant_is_componentwise() {
    let c = Vec3::new(0.2, 0.5, 0.9);
    let lin = linearize3(c);
    assert!(approx(lin.x, linearize(0.2)));
    assert!(approx(lin.y, linearize(0.5)));
    assert!(approx(lin.z, linearize(0.9)));

    let back = delinearize3(lin);
    assert!(approx(back.x, 0.2) && approx(back.y, 0.5) && approx(back.z, 0.9));
}

#[test]
fn vec4_variant_applies_curve_to_alpha() {
    let c = Vec4::new(0.2, 0.5, 0.9, 0.5);
    let lin = linearize4(c);
    assert!(approx(lin.w, linearize(0.5)), "alpha must get the same curve");

    let back = delinearize4(lin);
    assert!(approx(back.w, 0.5));
}
