//! Shader Composition & Module Cache
//!
//! WGSL for the peeling subsystem comes from two places, mirroring the two
//! compilation paths of the host engine's shader manager:
//!
//! | Path | Use case | Source |
//! |------|----------|--------|
//! | minijinja template | injected material shaders, final composite | `templates/` (rust-embed) |
//! | raw WGSL string    | blend-back utility pass                    | `include_str!`            |
//!
//! [`ShaderInjector`] turns a host material's fragment module into its
//! peeling-aware variant. The contract replaces fragile `void main()` string
//! splicing with a single well-defined extension point: the base module
//! defines
//!
//! ```wgsl
//! struct VertexOutput {
//!     @builtin(position) position: vec4<f32>,
//!     // ... material varyings ...
//! }
//!
//! fn shade(v_in: VertexOutput) -> vec4<f32> { /* material shading */ }
//! ```
//!
//! and the injector appends a generated `fs_main` around `shade` — the
//! peeling prologue (depth classification against the read buffers), the
//! call into the unmodified material code, and the epilogue (near/far
//! output routing with gamma-correct front compositing). Base-module
//! formatting is irrelevant; the base source is interpolated as template
//! *data*, never re-parsed as template text.

use std::sync::OnceLock;

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, Error, ErrorKind, context};
use rust_embed::RustEmbed;
use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_128;

use crate::errors::{Result, VeilError};
use crate::slots;

/// Raw WGSL of the blend-back accumulation program.
pub const BLEND_BACK_WGSL: &str = include_str!("blend_back.wgsl");

static SHADER_ENV: OnceLock<Environment<'static>> = OnceLock::new();

#[derive(RustEmbed)]
#[folder = "src/shader/templates"]
struct ShaderAssets;

fn get_env() -> &'static Environment<'static> {
    SHADER_ENV.get_or_init(|| {
        let mut env = Environment::new();

        let syntax = SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .line_statement_prefix("$$")
            .build()
            .expect("Failed to configure Jinja2 syntax");

        env.set_syntax(syntax);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(minijinja::UndefinedBehavior::SemiStrict);

        env.set_loader(shader_loader);

        env.set_path_join_callback(|name, _parent| format!("chunks/{name}").into());

        env
    })
}

fn shader_loader(name: &str) -> std::result::Result<Option<String>, Error> {
    let filename = if std::path::Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wgsl"))
    {
        name.to_string()
    } else {
        format!("{name}.wgsl")
    };

    if let Some(file) = ShaderAssets::get(&filename)
        && let Ok(source) = std::str::from_utf8(file.data.as_ref())
    {
        return Ok(Some(source.to_string()));
    }

    Err(Error::new(
        ErrorKind::TemplateNotFound,
        format!("shader template {filename} not embedded"),
    ))
}

fn render(name: &str, ctx: minijinja::Value) -> Result<String> {
    let template = get_env().get_template(name)?;
    Ok(template.render(ctx)?)
}

// ============================================================================
// ShaderCache
// ============================================================================

/// Centralized `ShaderModule` cache keyed by xxh3-128 of the final WGSL.
///
/// The two fixed internal programs and any re-rendered templates dedupe
/// here, so identical source never compiles twice.
pub struct ShaderCache {
    module_cache: FxHashMap<u128, wgpu::ShaderModule>,
}

impl Default for ShaderCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            module_cache: FxHashMap::default(),
        }
    }

    /// Compiles `source` (or returns the cached module).
    pub fn get_or_compile(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        source: &str,
    ) -> &wgpu::ShaderModule {
        let hash = xxh3_128(source.as_bytes());
        self.module_cache.entry(hash).or_insert_with(|| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        })
    }

    /// Number of cached modules.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.module_cache.len()
    }
}

/// Renders the final-composite program's WGSL.
pub fn final_composite_source() -> Result<String> {
    render("final_composite", context! {})
}

// ============================================================================
// ShaderInjector
// ============================================================================

/// Composes peeling-aware shader variants from host material shaders.
#[derive(Debug, Clone, Copy)]
pub struct ShaderInjector {
    enabled: bool,
}

impl ShaderInjector {
    /// Creates an injector. With `enabled == false` the produced fragment
    /// entry point assigns the material's computed color straight to the
    /// output — no peeling code paths exist in the module at all.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Whether injected shaders carry the peeling prologue/epilogue.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The declarations an injected fragment module sees ahead of the entry
    /// point: read-buffer bindings, the three-target output struct, and the
    /// gamma helpers. Exposed for hosts that assemble shader source
    /// themselves.
    pub fn fragment_shader_prefix() -> Result<String> {
        let gamma = render("chunks/gamma", context! {})?;
        let prefix = render(
            "chunks/peel_prefix",
            context! {
                read_group => slots::READ_GROUP,
                read_depth_binding => slots::READ_DEPTH_BINDING,
                read_front_binding => slots::READ_FRONT_BINDING,
            },
        )?;
        Ok(format!("{gamma}\n{prefix}"))
    }

    /// Produces the full fragment module for a base material source.
    ///
    /// The base module must define `fn shade(v_in: VertexOutput) ->
    /// vec4<f32>` and a `VertexOutput` struct carrying
    /// `@builtin(position)`, and must not define `fs_main` itself.
    pub fn inject_fragment_shader(&self, base: &str) -> Result<String> {
        validate_fragment_contract(base)?;

        render(
            "peel_fragment",
            context! {
                base => base,
                peeling => self.enabled,
                read_group => slots::READ_GROUP,
                read_depth_binding => slots::READ_DEPTH_BINDING,
                read_front_binding => slots::READ_FRONT_BINDING,
            },
        )
    }

    /// Validates a vertex module for use with peeling and returns it
    /// unchanged — peeling needs no vertex-stage changes, only the
    /// guarantee that `VertexOutput.position` reaches the fragment stage.
    pub fn inject_vertex_shader(&self, base: &str) -> Result<String> {
        if !base.contains("VertexOutput") {
            return Err(VeilError::ShaderInjection {
                stage: "vertex",
                reason: "vertex module must emit the shared VertexOutput struct".into(),
            });
        }
        Ok(base.to_string())
    }
}

fn validate_fragment_contract(base: &str) -> Result<()> {
    if !base.contains("fn shade") {
        return Err(VeilError::ShaderInjection {
            stage: "fragment",
            reason: "missing extension point `fn shade(v_in: VertexOutput) -> vec4<f32>`".into(),
        });
    }
    if !base.contains("struct VertexOutput") {
        return Err(VeilError::ShaderInjection {
            stage: "fragment",
            reason: "missing `struct VertexOutput` declaration".into(),
        });
    }
    if !base.contains("@builtin(position)") {
        return Err(VeilError::ShaderInjection {
            stage: "fragment",
            reason: "VertexOutput must carry `@builtin(position)` for the depth test".into(),
        });
    }
    if base.contains("fn fs_main") {
        return Err(VeilError::ShaderInjection {
            stage: "fragment",
            reason: "base module already defines fs_main; the entry point is generated".into(),
        });
    }
    Ok(())
}
