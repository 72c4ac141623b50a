//! Shader Injection Tests
//!
//! Tests for:
//! - disabled mode: pure pass-through entry point, no peeling code at all
//! - enabled mode: prologue, epilogue, and read bindings present around the
//!   untouched base module
//! - the extension-point contract: typed errors for each violation
//! - vertex validation: unchanged source, VertexOutput required

use veil::errors::VeilError;
use veil::shader::ShaderInjector;

const BASE_FRAGMENT: &str = r"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
}

fn shade(v_in: VertexOutput) -> vec4<f32> {
    return v_in.color;
}
";

const BASE_VERTEX: &str = r"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
}

@vertex
fn vs_main(@location(0) pos: vec3<f32>, @location(1) color: vec4<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(pos, 1.0);
    out.color = color;
    return out;
}
";

// ============================================================================
// Disabled mode (pass-through)
// ============================================================================

#[test]
fn disabled_injection_is_pure_passthrough() {
    let injector = ShaderInjector::new(false);
    let out = injector.inject_fragment_shader(BASE_FRAGMENT).unwrap();

    // The computed color goes straight to the single output.
    assert!(out.contains("-> @location(0) vec4<f32>"));
    assert!(out.contains("return shade(v_in);"));

    // No peeling code path exists in the module.
    assert!(!out.contains("peel_depth_in"));
    assert!(!out.contains("peel_front_in"));
    assert!(!out.contains("PeelOutput"));
    assert!(!out.contains("nearest_depth"));
    assert!(!out.contains("peel_lin"));
}

// ============================================================================
// Enabled mode
// ============================================================================

#[test]
fn enabled_injection_wraps_base_with_prologue_and_epilogue() {
    let injector = ShaderInjector::new(true);
    let out = injector.inject_fragment_shader(BASE_FRAGMENT).unwrap();

    // Base module carried over untouched.
    assert!(out.contains("fn shade(v_in: VertexOutput) -> vec4<f32>"));

    // Generated entry point with the three-target output.
    assert!(out.contains("fn fs_main(v_in: VertexOutput) -> PeelOutput"));

    // Prologue: read the stored interval and classify.
    assert!(out.contains("textureLoad(peel_depth_in"));
    assert!(out.contains("textureLoad(peel_front_in"));
    assert!(out.contains("let nearest_depth = -last_depth.x;"));
    assert!(out.contains("out.depth = vec2<f32>(-frag_depth, frag_depth);"));

    // Epilogue: gamma-correct front compositing and back routing.
    assert!(out.contains("peel_non_lin3(peel_lin3(front.rgb)"));
    assert!(out.contains("out.back_color = shaded;"));

    // The shading bug flag color.
    assert!(out.contains("vec4<f32>(1.0, 0.0, 0.0, 1.0)"));
}

#[test]
fn enabled_injection_binds_the_fixed_read_slots() {
    let injector = ShaderInjector::new(true);
    let out = injector.inject_fragment_shader(BASE_FRAGMENT).unwrap();

    assert!(out.contains("@group(3) @binding(0) var peel_depth_in"));
    assert!(out.contains("@group(3) @binding(1) var peel_front_in"));
}

#[test]
fn prefix_exposes_declarations_and_gamma_helpers() {
    let prefix = ShaderInjector::fragment_shader_prefix().unwrap();

    assert!(prefix.contains("struct PeelOutput"));
    assert!(prefix.contains("const PEEL_MAX_DEPTH: f32 = 99999.0;"));
    assert!(prefix.contains("fn peel_lin(v: f32)"));
    assert!(prefix.contains("fn peel_non_lin3"));
    assert!(prefix.contains("@group(3) @binding(0)"));
}

// ============================================================================
// Contract violations
// ============================================================================

fn injection_reason(result: veil::errors::Result<String>) -> String {
    match result {
        Err(VeilError::ShaderInjection { reason, .. }) => reason,
        other => panic!("expected ShaderInjection error, got {other:?}"),
    }
}

#[test]
fn missing_shade_function_is_rejected() {
    let base = "struct VertexOutput { @builtin(position) position: vec4<f32> }";
    let reason = injection_reason(ShaderInjector::new(true).inject_fragment_shader(base));
    assert!(reason.contains("extension point"));
}

#[test]
fn missing_vertex_output_struct_is_rejected() {
    let base = "fn shade(v_in: Varyings) -> vec4<f32> { return vec4<f32>(1.0); }";
    let reason = injection_reason(ShaderInjector::new(true).inject_fragment_shader(base));
    assert!(reason.contains("VertexOutput"));
}

#[test]
fn missing_position_builtin_is_rejected() {
    let base = "
struct VertexOutput { @location(0) color: vec4<f32> }
fn shade(v_in: VertexOutput) -> vec4<f32> { return v_in.color; }
";
    let reason = injection_reason(ShaderInjector::new(true).inject_fragment_shader(base));
    assert!(reason.contains("@builtin(position)"));
}

#[test]
fn existing_entry_point_is_rejected() {
    let base = "
struct VertexOutput { @builtin(position) position: vec4<f32> }
fn shade(v_in: VertexOutput) -> vec4<f32> { return vec4<f32>(1.0); }
@fragment fn fs_main(v_in: VertexOutput) -> @location(0) vec4<f32> { return shade(v_in); }
";
    let reason = injection_reason(ShaderInjector::new(true).inject_fragment_shader(base));
    assert!(reason.contains("fs_main"));
}

// ============================================================================
// Vertex stage
// ============================================================================

#[test]
fn vertex_module_passes_through_unchanged() {
    let injector = ShaderInjector::new(true);
    let out = injector.inject_vertex_shader(BASE_VERTEX).unwrap();
    assert_eq!(out, BASE_VERTEX);
}

#[test]
fn vertex_module_without_shared_output_is_rejected() {
    let injector = ShaderInjector::new(true);
    let result = injector.inject_vertex_shader("@vertex fn vs_main() {}");
    assert!(matches!(
        result,
        Err(VeilError::ShaderInjection { stage: "vertex", .. })
    ));
}
