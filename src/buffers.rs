//! Peeling Render Targets
//!
//! Two [`PeelBufferSet`]s ping-pong between read and write roles across the
//! peeling loop; the single [`BlendBackBuffer`] accumulates back-layer
//! contributions for the whole loop.
//!
//! Each set owns three targets:
//!
//! | Attachment | Format       | Contents                                     |
//! |------------|--------------|----------------------------------------------|
//! | 0          | `Rg32Float`  | encoded depth extrema `(-nearest, farthest)` |
//! | 1          | `Rgba16Float`| front color accumulated over resolved layers |
//! | 2          | `Rgba16Float`| this pass's back-layer color                 |
//!
//! Every texel is an independent accumulator, never an image to be sampled:
//! all reads are `textureLoad` texel fetches, so no sampler exists and no
//! filtering or wrapping can ever occur.
//!
//! Roles are caller-declared and mutually exclusive. Asking a set to write
//! while it holds the read role (or vice versa) is a programming error —
//! fatal in debug builds, a logged no-op in release.

use crate::slots;

/// Minimum extent per side. Resizes below this are rejected.
pub const MIN_BUFFER_SIZE: u32 = 4;

// ============================================================================
// BufferSize
// ============================================================================

/// Render target dimensions in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSize {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

impl BufferSize {
    /// Creates a new size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` when both sides meet [`MIN_BUFFER_SIZE`].
    #[inline]
    #[must_use]
    pub fn meets_minimum(self) -> bool {
        self.width >= MIN_BUFFER_SIZE && self.height >= MIN_BUFFER_SIZE
    }

    fn extent(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

/// Outcome of a resize request against the last applied size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAction {
    /// Size unchanged; existing allocations stay.
    Keep,
    /// New valid size; reallocate every target.
    Reallocate,
    /// Below the minimum threshold; log and keep previous state untouched.
    Reject,
}

/// Decides what a resize request requires. Pure so the idempotence and
/// rejection rules are testable without a device.
#[must_use]
pub fn resize_action(last: Option<BufferSize>, requested: BufferSize) -> ResizeAction {
    if !requested.meets_minimum() {
        return ResizeAction::Reject;
    }
    if last == Some(requested) {
        return ResizeAction::Keep;
    }
    ResizeAction::Reallocate
}

// ============================================================================
// PeelBufferSet
// ============================================================================

/// Declared role of a buffer set within the current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// No role assigned yet (before the first pass of a frame).
    Unassigned,
    /// Source of last pass's depth interval and carried front color.
    Read,
    /// Target of this pass's peel outputs.
    Write,
}

/// One complete set of peeling render targets plus its read-side bind group.
pub struct PeelBufferSet {
    label: &'static str,
    role: Role,

    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    front_texture: wgpu::Texture,
    front_view: wgpu::TextureView,
    back_texture: wgpu::Texture,
    back_view: wgpu::TextureView,

    /// Bind group exposing depth + front color at the fixed read slots.
    read_bind_group: wgpu::BindGroup,
    /// Bind group exposing the back color to the blend-back program.
    back_input_bind_group: wgpu::BindGroup,
}

fn clear_attachment(
    view: &wgpu::TextureView,
    color: wgpu::Color,
) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(color),
            store: wgpu::StoreOp::Store,
        },
        depth_slice: None,
    })
}

fn load_attachment(view: &wgpu::TextureView) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Load,
            store: wgpu::StoreOp::Store,
        },
        depth_slice: None,
    })
}

fn create_target(
    device: &wgpu::Device,
    size: BufferSize,
    format: wgpu::TextureFormat,
    label: &str,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: size.extent(),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

impl PeelBufferSet {
    /// Allocates all three targets at `size` and builds the read-side and
    /// blend-back-input bind groups. The caller validates `size` first via
    /// [`resize_action`].
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        size: BufferSize,
        label: &'static str,
        read_layout: &wgpu::BindGroupLayout,
        single_texture_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let (depth_texture, depth_view) = create_target(
            device,
            size,
            slots::DEPTH_EXTREMA_FORMAT,
            &format!("Peel Depth Extrema ({label})"),
        );
        let (front_texture, front_view) = create_target(
            device,
            size,
            slots::COLOR_FORMAT,
            &format!("Peel Front Color ({label})"),
        );
        let (back_texture, back_view) = create_target(
            device,
            size,
            slots::COLOR_FORMAT,
            &format!("Peel Back Color ({label})"),
        );

        let read_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("Peel Read BindGroup ({label})")),
            layout: read_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: slots::READ_DEPTH_BINDING,
                    resource: wgpu::BindingResource::TextureView(&depth_view),
                },
                wgpu::BindGroupEntry {
                    binding: slots::READ_FRONT_BINDING,
                    resource: wgpu::BindingResource::TextureView(&front_view),
                },
            ],
        });

        let back_input_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("Peel BlendBack Input BindGroup ({label})")),
            layout: single_texture_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&back_view),
            }],
        });

        Self {
            label,
            role: Role::Unassigned,
            depth_texture,
            depth_view,
            front_texture,
            front_view,
            back_texture,
            back_view,
            read_bind_group,
            back_input_bind_group,
        }
    }

    /// Declares this set's role for the current pass.
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    /// Current declared role.
    #[inline]
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    fn check_role(&self, expected: Role, op: &str) -> bool {
        if self.role == expected {
            return true;
        }
        debug_assert!(
            false,
            "{op} on buffer set {} with role {:?} (expected {expected:?})",
            self.label, self.role
        );
        log::error!(
            "{op} on buffer set {} with role {:?} (expected {expected:?}); skipping",
            self.label,
            self.role
        );
        false
    }

    /// Clears the depth-extrema target to the encoded pair `depth_clear` and
    /// both color targets to transparent black, in one render pass with
    /// per-attachment clear values.
    pub fn clear(&self, encoder: &mut wgpu::CommandEncoder, depth_clear: [f32; 2]) {
        let depth_color = wgpu::Color {
            r: f64::from(depth_clear[0]),
            g: f64::from(depth_clear[1]),
            b: 0.0,
            a: 0.0,
        };
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&format!("Peel Clear ({})", self.label)),
            color_attachments: &[
                clear_attachment(&self.depth_view, depth_color),
                clear_attachment(&self.front_view, wgpu::Color::TRANSPARENT),
                clear_attachment(&self.back_view, wgpu::Color::TRANSPARENT),
            ],
            ..Default::default()
        });
    }

    /// Begins the geometry render pass targeting this set's three
    /// attachments. The clears for this pass were already issued, so all
    /// attachments load. Requires the write role.
    pub fn begin_scene_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
    ) -> Option<wgpu::RenderPass<'e>> {
        if !self.check_role(Role::Write, "begin_scene_pass") {
            return None;
        }
        Some(encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&format!("Peel Scene Pass ({})", self.label)),
            color_attachments: &[
                load_attachment(&self.depth_view),
                load_attachment(&self.front_view),
                load_attachment(&self.back_view),
            ],
            ..Default::default()
        }))
    }

    /// Binds this set's depth and front-color textures at the fixed read
    /// slots. Requires the read role.
    pub fn bind_for_reading(&self, pass: &mut wgpu::RenderPass<'_>) {
        if !self.check_role(Role::Read, "bind_for_reading") {
            return;
        }
        pass.set_bind_group(slots::READ_GROUP, &self.read_bind_group, &[]);
    }

    /// Bind group feeding this set's back color into the blend-back program.
    #[inline]
    #[must_use]
    pub fn back_input_bind_group(&self) -> &wgpu::BindGroup {
        &self.back_input_bind_group
    }

    /// Front-color texture view (final composite input).
    #[inline]
    #[must_use]
    pub fn front_view(&self) -> &wgpu::TextureView {
        &self.front_view
    }

    /// Depth-extrema texture (diagnostics).
    #[inline]
    #[must_use]
    pub fn depth_texture(&self) -> &wgpu::Texture {
        &self.depth_texture
    }

    /// Front-color texture (diagnostics).
    #[inline]
    #[must_use]
    pub fn front_texture(&self) -> &wgpu::Texture {
        &self.front_texture
    }

    /// Back-color texture (diagnostics).
    #[inline]
    #[must_use]
    pub fn back_texture(&self) -> &wgpu::Texture {
        &self.back_texture
    }

    /// Set label ("Set A" / "Set B").
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Releases GPU memory eagerly instead of waiting for drop.
    pub fn destroy(&self) {
        self.depth_texture.destroy();
        self.front_texture.destroy();
        self.back_texture.destroy();
    }
}

// ============================================================================
// BlendBackBuffer
// ============================================================================

/// The single accumulator every pass's back color is blended into. Not
/// ping-ponged; cleared once per draw loop and read by the final composite.
pub struct BlendBackBuffer {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl BlendBackBuffer {
    /// Allocates the accumulator at `size`.
    #[must_use]
    pub fn new(device: &wgpu::Device, size: BufferSize) -> Self {
        let (texture, view) =
            create_target(device, size, slots::COLOR_FORMAT, "Peel BlendBack Accumulator");
        Self { texture, view }
    }

    /// Clears the accumulator to transparent black. Issued once per draw
    /// loop — clearing per pass would discard cross-pass accumulation.
    pub fn clear(&self, encoder: &mut wgpu::CommandEncoder) {
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Peel BlendBack Clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            ..Default::default()
        });
    }

    /// Accumulator texture view (blend-back target, composite input).
    #[inline]
    #[must_use]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Accumulator texture (diagnostics).
    #[inline]
    #[must_use]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// Releases GPU memory eagerly.
    pub fn destroy(&self) {
        self.texture.destroy();
    }
}
