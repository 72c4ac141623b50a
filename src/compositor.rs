//! Blend-Back Accumulation & Final Composite Passes
//!
//! The two fixed fullscreen programs of the peeling loop:
//!
//! - [`BlendBackPass`] runs at the end of every pass, blending the
//!   just-written back-layer color into the persistent blend-back
//!   accumulator with standard over-compositing
//!   (`SRC_ALPHA / ONE_MINUS_SRC_ALPHA` color, `ONE / ONE_MINUS_SRC_ALPHA`
//!   alpha). Unresolved texels (alpha 0) are discarded in the shader so
//!   they cannot clobber prior passes' accumulation.
//! - [`FinalCompositePass`] runs once after the last pass, merging the
//!   accumulated front color over the accumulated back color with the
//!   gamma-correct over formula and drawing to the host's surface with
//!   `ONE / ONE_MINUS_SRC_ALPHA` blending.
//!
//! Both draw a bufferless fullscreen triangle (`draw(0..3, 0..1)`) inside
//! their own render pass, so no pipeline or bind state leaks into the
//! host's encoder.
//!
//! Pipelines are built lazily. The blend-back target format is fixed, so
//! that pass holds a single pipeline; the final composite renders into
//! whatever surface format the host presents, cached per format.

use rustc_hash::FxHashMap;

use crate::shader::{self, ShaderCache};
use crate::slots;

/// Blend state of the blend-back accumulation draw.
const BLEND_BACK_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Blend state of the final on-screen composite draw.
const FINAL_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
};

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    module: &wgpu::ShaderModule,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} Layout")),
        bind_group_layouts: &[Some(layout)],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

// ============================================================================
// BlendBackPass
// ============================================================================

/// The per-pass back-color accumulation draw.
pub struct BlendBackPass {
    /// Bind group layout: [back-color texture]
    layout: wgpu::BindGroupLayout,
    pipeline: Option<wgpu::RenderPipeline>,
}

impl BlendBackPass {
    /// Creates the pass. Only the layout is allocated; the pipeline is
    /// built on first use.
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Peel BlendBack BindGroup Layout"),
            entries: &[texture_entry(0)],
        });
        Self {
            layout,
            pipeline: None,
        }
    }

    /// Layout for the per-set back-color input bind groups.
    #[inline]
    #[must_use]
    pub fn input_layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, shaders: &mut ShaderCache) {
        if self.pipeline.is_some() {
            return;
        }
        log::debug!("Compiling blend-back pipeline");
        let module = shaders.get_or_compile(device, "Peel BlendBack Shader", shader::BLEND_BACK_WGSL);
        self.pipeline = Some(create_fullscreen_pipeline(
            device,
            "Peel BlendBack Pipeline",
            module,
            &self.layout,
            slots::COLOR_FORMAT,
            BLEND_BACK_BLEND,
        ));
    }

    /// Blends `back_input` (the write set's back color) into the
    /// accumulator view.
    pub fn run(
        &mut self,
        device: &wgpu::Device,
        shaders: &mut ShaderCache,
        encoder: &mut wgpu::CommandEncoder,
        accumulator: &wgpu::TextureView,
        back_input: &wgpu::BindGroup,
    ) {
        self.ensure_pipeline(device, shaders);
        let Some(pipeline) = &self.pipeline else {
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Peel BlendBack Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: accumulator,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            ..Default::default()
        });

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, back_input, &[]);
        pass.draw(0..3, 0..1);
    }
}

// ============================================================================
// FinalCompositePass
// ============================================================================

/// The end-of-loop composite onto the host's surface.
pub struct FinalCompositePass {
    /// Bind group layout: [front-color texture, blend-back texture]
    layout: wgpu::BindGroupLayout,
    /// Cached pipelines by output format — typically 1 entry.
    local_cache: FxHashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
}

impl FinalCompositePass {
    /// Creates the pass with its input layout.
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Peel Final Composite BindGroup Layout"),
            entries: &[texture_entry(0), texture_entry(1)],
        });
        Self {
            layout,
            local_cache: FxHashMap::default(),
        }
    }

    /// Layout for the per-set composite input bind groups.
    #[inline]
    #[must_use]
    pub fn input_layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    fn ensure_pipeline(
        &mut self,
        device: &wgpu::Device,
        shaders: &mut ShaderCache,
        format: wgpu::TextureFormat,
    ) -> bool {
        if self.local_cache.contains_key(&format) {
            return true;
        }
        let source = match shader::final_composite_source() {
            Ok(source) => source,
            Err(err) => {
                log::error!("Final composite shader failed to render: {err}");
                return false;
            }
        };
        log::debug!("Compiling final composite pipeline for format {format:?}");
        let module = shaders.get_or_compile(device, "Peel Final Composite Shader", &source);
        let pipeline = create_fullscreen_pipeline(
            device,
            "Peel Final Composite Pipeline",
            module,
            &self.layout,
            format,
            FINAL_BLEND,
        );
        self.local_cache.insert(format, pipeline);
        true
    }

    /// Composites front over accumulated back into `surface_view`.
    pub fn run(
        &mut self,
        device: &wgpu::Device,
        shaders: &mut ShaderCache,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        surface_format: wgpu::TextureFormat,
        inputs: &wgpu::BindGroup,
    ) {
        if !self.ensure_pipeline(device, shaders, surface_format) {
            return;
        }
        let pipeline = &self.local_cache[&surface_format];

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Peel Final Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            ..Default::default()
        });

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, inputs, &[]);
        pass.draw(0..3, 0..1);
    }
}
