//! Uniform block reflection for WGSL programs
//!
//! Materials expose a name → value uniform interface. WGSL has no uniform
//! locations, so names are resolved against the uniform block declared at
//! `@group(0) @binding(0)` by reflecting the parsed module with naga.

use naga::{AddressSpace, ResourceBinding, TypeInner, VectorSize};

/// Bind group and binding slot of the material uniform block
pub const UNIFORM_BLOCK_GROUP: u32 = 0;
pub const UNIFORM_BLOCK_BINDING: u32 = 0;

/// Value types a uniform member can be set with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    F32,
    I32,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    /// Number of bytes written when a value of this kind is set
    pub fn size(self) -> usize {
        match self {
            UniformKind::F32 | UniformKind::I32 => 4,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat4 => 64,
        }
    }

    fn from_type(inner: &TypeInner) -> Option<Self> {
        match *inner {
            TypeInner::Scalar(scalar) if scalar == naga::Scalar::F32 => Some(UniformKind::F32),
            TypeInner::Scalar(scalar) if scalar == naga::Scalar::I32 => Some(UniformKind::I32),
            TypeInner::Vector {
                size: VectorSize::Tri,
                scalar,
            } if scalar == naga::Scalar::F32 => Some(UniformKind::Vec3),
            TypeInner::Vector {
                size: VectorSize::Quad,
                scalar,
            } if scalar == naga::Scalar::F32 => Some(UniformKind::Vec4),
            TypeInner::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Quad,
                scalar,
            } if scalar == naga::Scalar::F32 => Some(UniformKind::Mat4),
            _ => None,
        }
    }
}

/// One settable member of the uniform block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: String,
    pub offset: u32,
    pub kind: UniformKind,
}

/// Reflected layout of the material uniform block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlockLayout {
    /// Total size of the block in bytes, including trailing padding
    pub size: u32,
    /// Members with a supported value type, in declaration order
    pub slots: Vec<UniformSlot>,
}

impl UniformBlockLayout {
    /// Resolves a uniform name. `None` plays the role of a negative location.
    pub fn find(&self, name: &str) -> Option<&UniformSlot> {
        self.slots.iter().find(|slot| slot.name == name)
    }
}

/// Everything the link step needs to know about a compiled stage's resources
#[derive(Debug, Default)]
pub struct StageResources {
    pub uniform_block: Option<UniformBlockLayout>,
    /// Bindings other than the uniform block, which materials cannot provide
    pub unsupported_bindings: Vec<ResourceBinding>,
}

/// Walks the module's global variables and collects its resource bindings
pub fn reflect_stage(module: &naga::Module) -> StageResources {
    let mut resources = StageResources::default();

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = var.binding.as_ref() else {
            continue;
        };

        let is_block_slot =
            binding.group == UNIFORM_BLOCK_GROUP && binding.binding == UNIFORM_BLOCK_BINDING;
        if var.space != AddressSpace::Uniform || !is_block_slot {
            resources.unsupported_bindings.push(binding.clone());
            continue;
        }

        let ty = &module.types[var.ty];
        let layout = match ty.inner {
            TypeInner::Struct { ref members, span } => {
                let slots = members
                    .iter()
                    .filter_map(|member| {
                        let name = member.name.clone()?;
                        let kind = UniformKind::from_type(&module.types[member.ty].inner)?;
                        Some(UniformSlot {
                            name,
                            offset: member.offset,
                            kind,
                        })
                    })
                    .collect();
                UniformBlockLayout { size: span, slots }
            }
            // A bare `var<uniform> name: T` is addressable by the variable name
            ref inner => {
                let size = inner.size(module.to_ctx());
                let slots = match (var.name.clone(), UniformKind::from_type(inner)) {
                    (Some(name), Some(kind)) => vec![UniformSlot {
                        name,
                        offset: 0,
                        kind,
                    }],
                    _ => Vec::new(),
                };
                UniformBlockLayout { size, slots }
            }
        };

        resources.uniform_block = Some(layout);
    }

    resources
}
