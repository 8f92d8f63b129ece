//! Material system: linked shader programs with a named uniform interface
//!
//! A [`Material`] owns one linked program made of a vertex stage and a fragment
//! stage. Loading is two-staged like a classic shader compiler: each stage is
//! compiled on its own, then both are linked into a render pipeline. A failure
//! at any step leaves the material invalid.
//!
//! Uniform values are written by name into a CPU-side copy of the program's
//! uniform block. The renderer snapshots that block for every draw, so each
//! draw observes the values set right before it.

use std::{fmt, num::NonZeroU64, path::Path, sync::Arc};

use cgmath::{Matrix4, Vector3, Vector4};
use thiserror::Error;

use super::uniform_layout::{
    reflect_stage, UniformBlockLayout, UniformKind, UNIFORM_BLOCK_BINDING,
};
use crate::gfx::scene::vertex::Vertex;
use crate::wgpu_utils::binding_types;

/// Shader stage of a material program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn naga_stage(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("VERTEX"),
            ShaderStage::Fragment => f.write_str("FRAGMENT"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MaterialError {
    #[error("failed to read shader source '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("shader compilation error ({stage}): {diagnostic}")]
    Compile {
        stage: ShaderStage,
        diagnostic: String,
    },

    #[error("shader linking failed: {diagnostic}")]
    Link { diagnostic: String },
}

/// A value that can be written into a uniform block member
pub trait UniformValue {
    const KIND: UniformKind;

    fn bytes(&self) -> &[u8];
}

impl UniformValue for f32 {
    const KIND: UniformKind = UniformKind::F32;

    fn bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl UniformValue for i32 {
    const KIND: UniformKind = UniformKind::I32;

    fn bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl UniformValue for Vector3<f32> {
    const KIND: UniformKind = UniformKind::Vec3;

    fn bytes(&self) -> &[u8] {
        let array: &[f32; 3] = self.as_ref();
        bytemuck::bytes_of(array)
    }
}

impl UniformValue for Vector4<f32> {
    const KIND: UniformKind = UniformKind::Vec4;

    fn bytes(&self) -> &[u8] {
        let array: &[f32; 4] = self.as_ref();
        bytemuck::bytes_of(array)
    }
}

impl UniformValue for Matrix4<f32> {
    const KIND: UniformKind = UniformKind::Mat4;

    fn bytes(&self) -> &[u8] {
        // cgmath matrices are column-major, which is what WGSL expects
        let array: &[f32; 16] = self.as_ref();
        bytemuck::bytes_of(array)
    }
}

/// Attachment formats every material pipeline is built against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TargetFormats {
    pub color: wgpu::TextureFormat,
    pub depth: wgpu::TextureFormat,
}

/// A successfully compiled stage, before linking
struct CompiledStage {
    source: String,
    entry_point: String,
    module: naga::Module,
}

/// GPU state retained after a successful link
struct LinkedProgram {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    uniform_layout: Option<UniformBlockLayout>,
}

/// Material definition: one linked program plus its uniform values
///
/// Materials are shared between scene objects through `Rc<RefCell<Material>>`.
pub struct Material {
    device: Arc<wgpu::Device>,
    formats: TargetFormats,
    program: Option<LinkedProgram>,
    uniform_data: Vec<u8>,
    active: bool,
    label: String,

    // Bind group over the renderer's uniform arena, tagged with the arena generation
    bind_group: Option<(u64, wgpu::BindGroup)>,
}

impl Material {
    /// Creates an invalid material. Load a program before drawing with it.
    pub fn new(
        device: Arc<wgpu::Device>,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            device,
            formats: TargetFormats {
                color: color_format,
                depth: depth_format,
            },
            program: None,
            uniform_data: Vec::new(),
            active: false,
            label: "Material".to_string(),
            bind_group: None,
        }
    }

    /// Builder pattern: set the debug label used for GPU objects
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Reads both stage sources in full and loads them
    pub fn load_from_files(
        &mut self,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<(), MaterialError> {
        let vertex_source = read_source(vertex_path.as_ref());
        let fragment_source = read_source(fragment_path.as_ref());

        match (vertex_source, fragment_source) {
            (Ok(vertex), Ok(fragment)) => self.load_from_source(&vertex, &fragment),
            (Err(e), _) | (_, Err(e)) => {
                log::error!("{e}");
                self.release();
                Err(e)
            }
        }
    }

    /// Compiles both stages and links them into a program
    ///
    /// On failure the diagnostic is logged, any previous program is released
    /// and the material is left invalid.
    pub fn load_from_source(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<(), MaterialError> {
        self.release();

        let result = compile_stage(ShaderStage::Vertex, vertex_source).and_then(|vertex| {
            let fragment = compile_stage(ShaderStage::Fragment, fragment_source)?;
            self.link(vertex, fragment)
        });

        match result {
            Ok(program) => {
                let block_size = program
                    .uniform_layout
                    .as_ref()
                    .map_or(0, |layout| layout.size as usize);
                self.uniform_data = vec![0; block_size];
                self.program = Some(program);
                log::debug!(
                    "Linked material '{}' ({} uniform bytes)",
                    self.label,
                    block_size
                );
                Ok(())
            }
            Err(e) => {
                log::error!("{e}");
                Err(e)
            }
        }
    }

    fn link(
        &self,
        vertex: CompiledStage,
        fragment: CompiledStage,
    ) -> Result<LinkedProgram, MaterialError> {
        let vertex_resources = reflect_stage(&vertex.module);
        let fragment_resources = reflect_stage(&fragment.module);

        if let Some(binding) = vertex_resources
            .unsupported_bindings
            .iter()
            .chain(fragment_resources.unsupported_bindings.iter())
            .next()
        {
            return Err(MaterialError::Link {
                diagnostic: format!(
                    "resource at @group({}) @binding({}) cannot be provided; \
                     materials only bind a uniform block at @group(0) @binding(0)",
                    binding.group, binding.binding
                ),
            });
        }

        let mut visibility = wgpu::ShaderStages::NONE;
        if vertex_resources.uniform_block.is_some() {
            visibility |= wgpu::ShaderStages::VERTEX;
        }
        if fragment_resources.uniform_block.is_some() {
            visibility |= wgpu::ShaderStages::FRAGMENT;
        }

        let uniform_layout = match (
            vertex_resources.uniform_block,
            fragment_resources.uniform_block,
        ) {
            (Some(a), Some(b)) if a != b => {
                return Err(MaterialError::Link {
                    diagnostic: "uniform block layout differs between vertex and fragment stage"
                        .to_string(),
                });
            }
            (Some(a), _) => Some(a),
            (None, b) => b,
        };

        // Validation errors raised while creating GPU objects are link failures
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} vertex", self.label)),
            source: wgpu::ShaderSource::Wgsl(vertex.source.as_str().into()),
        });
        let fragment_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} fragment", self.label)),
            source: wgpu::ShaderSource::Wgsl(fragment.source.as_str().into()),
        });

        let bind_group_layout = uniform_layout.as_ref().map(|layout| {
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(&format!("{} Uniform Layout", self.label)),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: UNIFORM_BLOCK_BINDING,
                        visibility,
                        ty: binding_types::uniform_dynamic(layout.size as u64),
                        count: None,
                    }],
                })
        });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> =
            bind_group_layout.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", self.label)),
                bind_group_layouts: &bind_group_layouts,
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&self.label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some(&vertex.entry_point),
                    buffers: &[Vertex::desc()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: Some(&fragment.entry_point),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.formats.color,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: self.formats.depth,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(MaterialError::Link {
                diagnostic: error.to_string(),
            });
        }

        // Shader modules are dropped here; the pipeline keeps what it needs
        Ok(LinkedProgram {
            pipeline,
            bind_group_layout,
            uniform_layout,
        })
    }

    /// True iff a program is currently linked
    pub fn is_valid(&self) -> bool {
        self.program.is_some()
    }

    /// Marks the program as the active rendering state. No-op if invalid.
    pub fn use_program(&mut self) {
        if self.program.is_some() {
            self.active = true;
        }
    }

    pub fn unuse_program(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Sets a uniform by name
    ///
    /// Names the program does not declare, and values whose type does not
    /// match the declaration, are ignored. On an invalid material this is a
    /// no-op.
    pub fn set_uniform<V: UniformValue>(&mut self, name: &str, value: V) {
        let Some(layout) = self
            .program
            .as_ref()
            .and_then(|program| program.uniform_layout.as_ref())
        else {
            return;
        };

        let Some(slot) = layout.find(name) else {
            log::trace!("Uniform '{}' not found in '{}'", name, self.label);
            return;
        };

        if slot.kind != V::KIND {
            log::trace!(
                "Uniform '{}' in '{}' is {:?}, ignoring {:?} value",
                name,
                self.label,
                slot.kind,
                V::KIND
            );
            return;
        }

        let offset = slot.offset as usize;
        let bytes = value.bytes();
        self.uniform_data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Current contents of the uniform block
    pub fn uniform_data(&self) -> &[u8] {
        &self.uniform_data
    }

    /// Reflected uniform block layout, if the program declares one
    pub fn uniform_layout(&self) -> Option<&UniformBlockLayout> {
        self.program
            .as_ref()
            .and_then(|program| program.uniform_layout.as_ref())
    }

    pub fn pipeline(&self) -> Option<&wgpu::RenderPipeline> {
        self.program.as_ref().map(|program| &program.pipeline)
    }

    /// Bind group exposing `binding_size` bytes of `buffer` at a dynamic offset
    ///
    /// The bind group is rebuilt whenever `generation` changes, which happens
    /// when the renderer reallocates its uniform arena.
    pub fn uniform_bind_group(
        &mut self,
        buffer: &wgpu::Buffer,
        binding_size: u64,
        generation: u64,
    ) -> Option<&wgpu::BindGroup> {
        let layout = self.program.as_ref()?.bind_group_layout.as_ref()?;

        let stale = !matches!(&self.bind_group, Some((cached, _)) if *cached == generation);
        if stale {
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{} Uniform Bind Group", self.label)),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: UNIFORM_BLOCK_BINDING,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer,
                        offset: 0,
                        size: NonZeroU64::new(binding_size),
                    }),
                }],
            });
            self.bind_group = Some((generation, bind_group));
        }

        self.bind_group.as_ref().map(|(_, bind_group)| bind_group)
    }

    /// Releases the linked program; the material becomes invalid
    pub fn release(&mut self) {
        self.program = None;
        self.bind_group = None;
        self.uniform_data.clear();
        self.active = false;
    }
}

fn read_source(path: &Path) -> Result<String, MaterialError> {
    std::fs::read_to_string(path).map_err(|source| MaterialError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Parses and validates one stage and locates its entry point
fn compile_stage(stage: ShaderStage, source: &str) -> Result<CompiledStage, MaterialError> {
    let compile_error = |diagnostic: String| MaterialError::Compile { stage, diagnostic };

    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    );
    validator
        .validate(&module)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;

    let entry_point = module
        .entry_points
        .iter()
        .find(|entry| entry.stage == stage.naga_stage())
        .map(|entry| entry.name.clone())
        .ok_or_else(|| {
            compile_error(format!(
                "no @{} entry point found",
                stage.to_string().to_lowercase()
            ))
        })?;

    Ok(CompiledStage {
        source: source.to_string(),
        entry_point,
        module,
    })
}

impl fmt::Debug for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Material")
            .field("label", &self.label)
            .field("valid", &self.is_valid())
            .field("active", &self.active)
            .field("uniform_bytes", &self.uniform_data.len())
            .finish()
    }
}
