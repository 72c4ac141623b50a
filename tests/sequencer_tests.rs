//! Pass Sequencing & Configuration Tests
//!
//! Tests for:
//! - PassSequencer: role exclusivity and alternation, pass-0-only read
//!   clear, lifecycle violation handling, aborted-frame recovery
//! - resize_action: idempotent resizes, minimum-size rejection
//! - DepthPeelingSettings: clamping and enable logic

use veil::buffers::{BufferSize, MIN_BUFFER_SIZE, ResizeAction, resize_action};
use veil::sequencer::PassSequencer;
use veil::settings::{DEFAULT_PASSES, DepthPeelingSettings, MAX_PASSES};

// ============================================================================
// PassSequencer: roles and clears
// ============================================================================

#[test]
fn starts_uninitialized_until_first_draw_loop() {
    let mut seq = PassSequencer::new();
    assert!(seq.is_uninitialized());
    assert!(seq.begin_draw_loop());
    assert!(!seq.is_uninitialized());
}

#[test]
fn roles_are_exclusive_and_swap_every_pass() {
    let mut seq = PassSequencer::new();
    seq.begin_draw_loop();

    let mut previous_write = None;
    for pass in 0..6 {
        let plan = seq.begin_pass(pass).expect("pass should begin");

        // Exactly one reader and one writer, never the same set.
        assert_ne!(plan.read, plan.write);
        assert_eq!(plan.read, seq.read_set());
        assert_eq!(plan.write, seq.write_set());

        // readSet(n) == writeSet(n-1)
        if let Some(prev) = previous_write {
            assert_eq!(plan.read, prev);
        }
        previous_write = Some(plan.write);

        assert!(seq.end_pass());
    }
    assert!(seq.end_draw_loop());
}

#[test]
fn read_set_cleared_on_first_pass_only() {
    let mut seq = PassSequencer::new();
    seq.begin_draw_loop();

    for pass in 0..4 {
        let plan = seq.begin_pass(pass).unwrap();
        assert_eq!(
            plan.clear_read,
            pass == 0,
            "read clear allowed on pass 0 only"
        );
        seq.end_pass();
    }
    seq.end_draw_loop();
}

#[test]
fn next_draw_loop_clears_read_set_again() {
    let mut seq = PassSequencer::new();

    for _frame in 0..3 {
        seq.begin_draw_loop();
        assert!(seq.begin_pass(0).unwrap().clear_read);
        seq.end_pass();
        assert!(!seq.begin_pass(1).unwrap().clear_read);
        seq.end_pass();
        seq.end_draw_loop();
    }
}

#[test]
fn aborted_pass_is_discarded_by_next_draw_loop() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut seq = PassSequencer::new();
    seq.begin_draw_loop();
    seq.begin_pass(0).unwrap();
    // Frame aborts here without end_pass; the next frame recovers.
    assert!(seq.begin_draw_loop());
    assert!(seq.begin_pass(0).is_some());
}

// ============================================================================
// PassSequencer: lifecycle violations (debug builds assert)
// ============================================================================

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "out of order")]
fn out_of_order_pass_index_is_a_contract_violation() {
    let mut seq = PassSequencer::new();
    seq.begin_draw_loop();
    let _ = seq.begin_pass(1);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "invalid state")]
fn nested_begin_pass_is_a_contract_violation() {
    let mut seq = PassSequencer::new();
    seq.begin_draw_loop();
    let _ = seq.begin_pass(0);
    let _ = seq.begin_pass(1);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "without a matching begin_pass")]
fn end_pass_without_begin_is_a_contract_violation() {
    let mut seq = PassSequencer::new();
    seq.begin_draw_loop();
    let _ = seq.end_pass();
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "invalid state")]
fn end_draw_loop_without_any_pass_is_a_contract_violation() {
    let mut seq = PassSequencer::new();
    seq.begin_draw_loop();
    let _ = seq.end_draw_loop();
}

// ============================================================================
// Resize decisions
// ============================================================================

#[test]
fn first_resize_allocates() {
    let size = BufferSize::new(800, 600);
    assert_eq!(resize_action(None, size), ResizeAction::Reallocate);
}

#[test]
fn resize_to_same_size_keeps_allocations() {
    let size = BufferSize::new(800, 600);
    assert_eq!(resize_action(Some(size), size), ResizeAction::Keep);
}

#[test]
fn resize_to_new_size_reallocates() {
    let old = BufferSize::new(800, 600);
    let new = BufferSize::new(1024, 768);
    assert_eq!(resize_action(Some(old), new), ResizeAction::Reallocate);
}

#[test]
fn undersized_requests_are_rejected_per_side() {
    let old = Some(BufferSize::new(800, 600));
    let thin = BufferSize::new(MIN_BUFFER_SIZE - 1, 600);
    let flat = BufferSize::new(800, MIN_BUFFER_SIZE - 1);
    let zero = BufferSize::new(0, 0);

    assert_eq!(resize_action(old, thin), ResizeAction::Reject);
    assert_eq!(resize_action(old, flat), ResizeAction::Reject);
    assert_eq!(resize_action(None, zero), ResizeAction::Reject);
}

#[test]
fn minimum_size_is_accepted() {
    let min = BufferSize::new(MIN_BUFFER_SIZE, MIN_BUFFER_SIZE);
    assert!(min.meets_minimum());
    assert_eq!(resize_action(None, min), ResizeAction::Reallocate);
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn settings_default_is_disabled_with_default_passes() {
    let settings = DepthPeelingSettings::default();
    assert!(!settings.is_enabled());
    assert_eq!(settings.num_passes(), DEFAULT_PASSES);
}

#[test]
fn enabling_turns_the_loop_on() {
    let mut settings = DepthPeelingSettings::new();
    settings.set_enabled(true);
    assert!(settings.is_enabled());
    settings.set_enabled(false);
    assert!(!settings.is_enabled());
}

#[test]
fn pass_count_clamps_to_bounds() {
    let mut settings = DepthPeelingSettings::new();

    settings.set_num_passes(0);
    assert_eq!(settings.num_passes(), 1);

    settings.set_num_passes(MAX_PASSES + 10);
    assert_eq!(settings.num_passes(), MAX_PASSES);

    let built = DepthPeelingSettings::new().with_passes(6);
    assert_eq!(built.num_passes(), 6);
}
