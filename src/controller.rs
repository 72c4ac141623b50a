//! Depth Peeling Pass Controller
//!
//! [`DepthPeeling`] owns every GPU resource of the peeling loop — both
//! ping-pong buffer sets, the blend-back accumulator, the two fixed
//! fullscreen programs and the shader module cache — and sequences the
//! per-frame pass protocol the host's render loop drives:
//!
//! ```text
//! peeling.begin_draw_loop(device, &mut encoder, w, h);
//! for i in 0..peeling.pass_count() {
//!     peeling.begin_pass(&mut encoder, i);
//!     if let Some(mut pass) = peeling.scene_pass(&mut encoder) {
//!         // host draws all transparent geometry with injected shaders
//!     }
//!     peeling.end_pass(device, &mut encoder);
//! }
//! peeling.end_draw_loop(device, &mut encoder, &surface_view, surface_format);
//! ```
//!
//! Every internal draw and clear runs inside its own `wgpu::RenderPass`, so
//! no pipeline, bind-group, or blend state ever leaks into the host's
//! encoder-level assumptions.
//!
//! # Failure policy
//!
//! Nothing here unwinds into the host's render loop. Missing GPU features,
//! undersized viewports, and template failures are logged and degrade to
//! skipped work — the worst observable outcome is a frame without the
//! peeling effect. Lifecycle misuse (out-of-order hooks, wrong-role binds)
//! is a programming error: fatal in debug builds, logged no-op in release.

use crate::buffers::{
    BlendBackBuffer, BufferSize, PeelBufferSet, ResizeAction, Role, resize_action,
};
use crate::compositor::{BlendBackPass, FinalCompositePass};
use crate::diagnostics::{CaptureBuffer, CaptureFrame, CaptureRole};
use crate::peel;
use crate::sequencer::PassSequencer;
use crate::settings::DepthPeelingSettings;
use crate::shader::ShaderCache;
use crate::slots;

/// MAX blend: with the negated near channel this computes a running
/// min/max over every fragment submitted to the peel pass.
const PEEL_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Max,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Max,
    },
};

/// The resizable targets: both peel sets, the accumulator, and the
/// composite input bind groups (front color of each set + accumulator).
struct Targets {
    sets: [PeelBufferSet; 2],
    blend_back: BlendBackBuffer,
    composite_bind_groups: [wgpu::BindGroup; 2],
}

/// Device-lifetime resources allocated once on the first draw loop.
struct GpuState {
    read_layout: wgpu::BindGroupLayout,
    blend_back_pass: BlendBackPass,
    final_pass: FinalCompositePass,
    targets: Option<Targets>,
}

/// The depth peeling pass controller.
pub struct DepthPeeling {
    settings: DepthPeelingSettings,
    sequencer: PassSequencer,
    shaders: ShaderCache,
    gpu: Option<GpuState>,
    last_size: Option<BufferSize>,
    alloc_generation: u64,
    /// Set when the device lacks a required feature; peeling stays off.
    feature_blocked: bool,
    disposed: bool,
}

impl DepthPeeling {
    /// Creates the controller. GPU resources are allocated lazily on the
    /// first [`begin_draw_loop`](Self::begin_draw_loop).
    #[must_use]
    pub fn new(settings: DepthPeelingSettings) -> Self {
        Self {
            settings,
            sequencer: PassSequencer::new(),
            shaders: ShaderCache::new(),
            gpu: None,
            last_size: None,
            alloc_generation: 0,
            feature_blocked: false,
            disposed: false,
        }
    }

    // ========================================================================
    // Configuration queries
    // ========================================================================

    /// Returns `true` when the host should run the peeling loop this frame.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.settings.is_enabled() && !self.feature_blocked && !self.disposed
    }

    /// Number of peeling passes the host should iterate.
    #[inline]
    #[must_use]
    pub fn pass_count(&self) -> u32 {
        self.settings.num_passes()
    }

    /// Read access to the settings.
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &DepthPeelingSettings {
        &self.settings
    }

    /// Mutable access to the settings.
    #[inline]
    pub fn settings_mut(&mut self) -> &mut DepthPeelingSettings {
        &mut self.settings
    }

    /// `true` once buffers exist at a valid size.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.gpu.as_ref().is_some_and(|gpu| gpu.targets.is_some())
    }

    /// Bumps whenever the render targets are (re)allocated. Resizing to the
    /// current size must not change this.
    #[inline]
    #[must_use]
    pub fn alloc_generation(&self) -> u64 {
        self.alloc_generation
    }

    /// Last size the targets were allocated at.
    #[inline]
    #[must_use]
    pub fn buffer_size(&self) -> Option<BufferSize> {
        self.last_size
    }

    // ========================================================================
    // Host pipeline integration
    // ========================================================================

    /// The color target states a peeling-variant material pipeline must be
    /// built with: the three peel attachments, all MAX-blended. Such
    /// pipelines must also disable back-face culling (both faces contribute
    /// to the extrema) and conventional depth testing (peeling replaces it).
    #[must_use]
    pub fn peel_color_targets() -> [Option<wgpu::ColorTargetState>; 3] {
        let target = |format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: Some(PEEL_BLEND),
                write_mask: wgpu::ColorWrites::ALL,
            })
        };
        [
            target(slots::DEPTH_EXTREMA_FORMAT),
            target(slots::COLOR_FORMAT),
            target(slots::COLOR_FORMAT),
        ]
    }

    /// Layout of the fixed read-slot bind group (`slots::READ_GROUP`) for
    /// host pipeline layouts. `None` before the first draw loop.
    #[must_use]
    pub fn read_bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.gpu.as_ref().map(|gpu| &gpu.read_layout)
    }

    // ========================================================================
    // Lifecycle hooks
    // ========================================================================

    /// Starts a frame's peeling loop: allocates device-lifetime resources on
    /// first call, resizes targets when the viewport changed, and clears the
    /// blend-back accumulator (its only clear in the whole loop).
    pub fn begin_draw_loop(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        width: u32,
        height: u32,
    ) {
        if self.disposed {
            log::warn!("begin_draw_loop on a disposed DepthPeeling; ignoring");
            return;
        }
        if !self.settings.is_enabled() || self.feature_blocked {
            return;
        }

        if self.gpu.is_none() {
            if !device
                .features()
                .contains(wgpu::Features::FLOAT32_BLENDABLE)
            {
                // Blending the Rg32Float extrema target is the heart of the
                // algorithm; without it peeling cannot run at all.
                log::error!(
                    "Depth peeling disabled: device lacks FLOAT32_BLENDABLE \
                     (required to MAX-blend the Rg32Float depth-extrema target)"
                );
                self.feature_blocked = true;
                return;
            }
            self.gpu = Some(Self::init_gpu(device));
        }

        self.resize(device, BufferSize::new(width, height));

        if !self.is_ready() {
            return;
        }
        if !self.sequencer.begin_draw_loop() {
            return;
        }

        if let Some(targets) = self.gpu.as_ref().and_then(|gpu| gpu.targets.as_ref()) {
            targets.blend_back.clear(encoder);
        }
    }

    /// Swaps buffer roles and issues the clears for pass `pass_index`.
    ///
    /// The write set is always cleared to the empty-interval sentinel and
    /// transparent black. On pass 0 only, the read set is additionally
    /// cleared to the full `[0, 1]` range — later passes must read the
    /// previous pass's results unmodified.
    pub fn begin_pass(&mut self, encoder: &mut wgpu::CommandEncoder, pass_index: u32) {
        if !self.is_ready() {
            return;
        }
        let Some(plan) = self.sequencer.begin_pass(pass_index) else {
            return;
        };
        let Some(targets) = self.gpu.as_mut().and_then(|gpu| gpu.targets.as_mut()) else {
            return;
        };

        log::trace!(
            "peel pass {pass_index}: read {:?}, write {:?}",
            plan.read,
            plan.write
        );

        targets.sets[plan.read.index()].set_role(Role::Read);
        targets.sets[plan.write.index()].set_role(Role::Write);

        targets.sets[plan.write.index()].clear(encoder, peel::CLEAR_EMPTY);
        if plan.clear_read {
            targets.sets[plan.read.index()].clear(encoder, peel::CLEAR_FULL_RANGE);
        }
    }

    /// Begins the geometry render pass over the write set's three
    /// attachments, with the read set's textures pre-bound at
    /// [`slots::READ_GROUP`]. The host submits all transparent geometry into
    /// the returned pass using pipelines built from
    /// [`peel_color_targets`](Self::peel_color_targets).
    pub fn scene_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
    ) -> Option<wgpu::RenderPass<'e>> {
        if !self.is_ready() {
            return None;
        }
        if !self.sequencer.in_pass() {
            debug_assert!(false, "scene_pass outside begin_pass/end_pass");
            log::error!("scene_pass outside begin_pass/end_pass; ignoring");
            return None;
        }
        let targets = self.gpu.as_ref()?.targets.as_ref()?;

        let mut pass =
            targets.sets[self.sequencer.write_set().index()].begin_scene_pass(encoder)?;
        targets.sets[self.sequencer.read_set().index()].bind_for_reading(&mut pass);
        Some(pass)
    }

    /// Re-binds the read-slot textures on `pass`. Needed only by hosts that
    /// reset bind state between draws; [`scene_pass`](Self::scene_pass)
    /// already bound them once.
    pub fn bind_read_uniforms(&self, pass: &mut wgpu::RenderPass<'_>) {
        if let Some(targets) = self.gpu.as_ref().and_then(|gpu| gpu.targets.as_ref()) {
            targets.sets[self.sequencer.read_set().index()].bind_for_reading(pass);
        }
    }

    /// Ends the pass: blends the write set's back color into the blend-back
    /// accumulator (discarding unresolved zero-alpha texels).
    pub fn end_pass(&mut self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder) {
        if !self.is_ready() {
            return;
        }
        if !self.sequencer.end_pass() {
            return;
        }
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let Some(targets) = gpu.targets.as_ref() else {
            return;
        };

        gpu.blend_back_pass.run(
            device,
            &mut self.shaders,
            encoder,
            targets.blend_back.view(),
            targets.sets[self.sequencer.write_set().index()].back_input_bind_group(),
        );
    }

    /// Finishes the loop: composites the last write set's front color over
    /// the blend-back accumulator onto the host's surface.
    pub fn end_draw_loop(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        surface_format: wgpu::TextureFormat,
    ) {
        if !self.is_ready() {
            return;
        }
        if !self.sequencer.end_draw_loop() {
            return;
        }
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let Some(targets) = gpu.targets.as_ref() else {
            return;
        };

        gpu.final_pass.run(
            device,
            &mut self.shaders,
            encoder,
            surface_view,
            surface_format,
            &targets.composite_bind_groups[self.sequencer.write_set().index()],
        );
    }

    /// Releases all GPU resources. Safe to call at most once per instance;
    /// further calls (and further lifecycle hooks) are logged no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(gpu) = self.gpu.take()
            && let Some(targets) = gpu.targets
        {
            for set in &targets.sets {
                set.destroy();
            }
            targets.blend_back.destroy();
        }
        self.last_size = None;
        log::debug!("DepthPeeling disposed");
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Visits every live peeling buffer for capture. Call between
    /// `begin_pass` and `end_draw_loop` so both sets hold a role; sets
    /// without a role are skipped.
    pub fn visit_buffers(&self, mut hook: impl FnMut(CaptureFrame<'_>)) {
        let Some(targets) = self.gpu.as_ref().and_then(|gpu| gpu.targets.as_ref()) else {
            return;
        };

        for set in &targets.sets {
            let role = match set.role() {
                Role::Read => CaptureRole::Read,
                Role::Write => CaptureRole::Write,
                Role::Unassigned => continue,
            };
            for (buffer, texture) in [
                (CaptureBuffer::FrontColor, set.front_texture()),
                (CaptureBuffer::BackColor, set.back_texture()),
                (CaptureBuffer::DepthNear, set.depth_texture()),
                (CaptureBuffer::DepthFar, set.depth_texture()),
            ] {
                hook(CaptureFrame {
                    buffer,
                    role,
                    label: set.label(),
                    texture,
                });
            }
        }

        hook(CaptureFrame {
            buffer: CaptureBuffer::BlendBack,
            role: CaptureRole::Accumulator,
            label: "BlendBack",
            texture: targets.blend_back.texture(),
        });
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn init_gpu(device: &wgpu::Device) -> GpuState {
        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let read_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Peel Read BindGroup Layout"),
            entries: &[
                texture_entry(slots::READ_DEPTH_BINDING),
                texture_entry(slots::READ_FRONT_BINDING),
            ],
        });

        GpuState {
            read_layout,
            blend_back_pass: BlendBackPass::new(device),
            final_pass: FinalCompositePass::new(device),
            targets: None,
        }
    }

    fn resize(&mut self, device: &wgpu::Device, requested: BufferSize) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        match resize_action(self.last_size, requested) {
            ResizeAction::Keep => {}
            ResizeAction::Reject => {
                log::error!(
                    "Depth peeling resize rejected: {}x{} is below the minimum of {} texels",
                    requested.width,
                    requested.height,
                    crate::buffers::MIN_BUFFER_SIZE
                );
            }
            ResizeAction::Reallocate => {
                if let Some(old) = gpu.targets.take() {
                    for set in &old.sets {
                        set.destroy();
                    }
                    old.blend_back.destroy();
                }

                let sets = [
                    PeelBufferSet::new(
                        device,
                        requested,
                        "Set A",
                        &gpu.read_layout,
                        gpu.blend_back_pass.input_layout(),
                    ),
                    PeelBufferSet::new(
                        device,
                        requested,
                        "Set B",
                        &gpu.read_layout,
                        gpu.blend_back_pass.input_layout(),
                    ),
                ];
                let blend_back = BlendBackBuffer::new(device, requested);

                let composite_bind_groups = [0_usize, 1].map(|i| {
                    device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some(&format!("Peel Composite BindGroup ({})", sets[i].label())),
                        layout: gpu.final_pass.input_layout(),
                        entries: &[
                            wgpu::BindGroupEntry {
                                binding: 0,
                                resource: wgpu::BindingResource::TextureView(sets[i].front_view()),
                            },
                            wgpu::BindGroupEntry {
                                binding: 1,
                                resource: wgpu::BindingResource::TextureView(blend_back.view()),
                            },
                        ],
                    })
                });

                gpu.targets = Some(Targets {
                    sets,
                    blend_back,
                    composite_bind_groups,
                });
                self.last_size = Some(requested);
                self.alloc_generation += 1;
                log::debug!(
                    "Depth peeling buffers allocated at {}x{} (generation {})",
                    requested.width,
                    requested.height,
                    self.alloc_generation
                );
            }
        }
    }
}
