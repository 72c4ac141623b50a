//! Fixed Binding Slot Assignments
//!
//! Depth peeling reserves a deterministic, collision-free set of shader
//! binding slots so buffers never need runtime negotiation. The full table:
//!
//! | Resource                    | Role        | Slot                                  |
//! |-----------------------------|-------------|---------------------------------------|
//! | depth-extrema target        | write       | color attachment 0 of the peel pass   |
//! | front-color target          | write       | color attachment 1 of the peel pass   |
//! | back-color target           | write       | color attachment 2 of the peel pass   |
//! | depth-extrema texture       | read        | group `READ_GROUP`, binding 0         |
//! | front-color texture         | read        | group `READ_GROUP`, binding 1         |
//! | back-color texture          | blend-back  | group 0, binding 0 (internal program) |
//! | front + blend-back textures | composite   | group 0, bindings 0/1 (internal)      |
//!
//! `READ_GROUP` is group 3: groups 0–2 carry the host's global / material /
//! object resources in a conventional forward pipeline, leaving 3 for
//! per-subsystem screen resources. Host material shaders produced by
//! [`ShaderInjector`](crate::shader::ShaderInjector) reference exactly these
//! slots; changing them is a breaking shader-ABI change.
//!
//! The slot set is a static resource, not reference-counted: at most one
//! buffer set may hold the read role and one the write role at any time,
//! which the role checks in [`crate::buffers`] enforce.

/// Bind group index for read-side peeling textures in host material shaders.
pub const READ_GROUP: u32 = 3;

/// Binding index of the read-side depth-extrema texture within [`READ_GROUP`].
pub const READ_DEPTH_BINDING: u32 = 0;

/// Binding index of the read-side front-color texture within [`READ_GROUP`].
pub const READ_FRONT_BINDING: u32 = 1;

/// Color attachment index of the write-side depth-extrema target.
pub const ATTACH_DEPTH: usize = 0;

/// Color attachment index of the write-side front-color target.
pub const ATTACH_FRONT: usize = 1;

/// Color attachment index of the write-side back-color target.
pub const ATTACH_BACK: usize = 2;

/// Texture format of the depth-extrema targets. Two 32-bit float channels;
/// MAX-blending this format requires `wgpu::Features::FLOAT32_BLENDABLE`.
pub const DEPTH_EXTREMA_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg32Float;

/// Texture format of the color accumulators (front, back, blend-back).
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
