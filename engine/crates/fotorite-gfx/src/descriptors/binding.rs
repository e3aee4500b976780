//! shader binding 的描述，以及到 Vulkan descriptor 的转换

use std::collections::HashSet;

use ash::vk;

use crate::{
    error::GfxError,
    resources::{
        handles::{BufferHandle, ImageHandle, SamplerHandle},
        resource_state::ResourceState,
    },
};

/// shader 中资源的种类，命名与 HLSL 保持一致
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    ConstantBuffer,
    StructuredBuffer,
    RWStructuredBuffer,
    /// texel buffer，暂不支持
    Buffer,
    /// texel buffer，暂不支持
    RWBuffer,
    Texture,
    RWTexture,
    Sampler,
}

impl DescriptorType {
    pub const ALL: [Self; 8] = [
        Self::ConstantBuffer,
        Self::StructuredBuffer,
        Self::RWStructuredBuffer,
        Self::Buffer,
        Self::RWBuffer,
        Self::Texture,
        Self::RWTexture,
        Self::Sampler,
    ];

    #[inline]
    pub fn to_vk_descriptor_type(self) -> vk::DescriptorType {
        match self {
            Self::ConstantBuffer => vk::DescriptorType::UNIFORM_BUFFER,
            Self::StructuredBuffer | Self::RWStructuredBuffer => vk::DescriptorType::STORAGE_BUFFER,
            Self::Buffer => vk::DescriptorType::UNIFORM_TEXEL_BUFFER,
            Self::RWBuffer => vk::DescriptorType::STORAGE_TEXEL_BUFFER,
            Self::Texture => vk::DescriptorType::SAMPLED_IMAGE,
            Self::RWTexture => vk::DescriptorType::STORAGE_IMAGE,
            Self::Sampler => vk::DescriptorType::SAMPLER,
        }
    }

    /// 资源在 dispatch 之前需要切换到的状态，sampler 没有状态
    #[inline]
    pub fn required_state(self) -> Option<ResourceState> {
        match self {
            Self::ConstantBuffer => Some(ResourceState::ConstantBuffer),
            Self::StructuredBuffer | Self::Buffer | Self::Texture => Some(ResourceState::ShaderResource),
            Self::RWStructuredBuffer | Self::RWBuffer | Self::RWTexture => Some(ResourceState::UnorderedAccess),
            Self::Sampler => None,
        }
    }

    /// 只有 image 类型的 descriptor 有 layout
    #[inline]
    pub fn image_layout(self) -> Option<vk::ImageLayout> {
        match self {
            Self::Texture => Some(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
            Self::RWTexture => Some(vk::ImageLayout::GENERAL),
            _ => None,
        }
    }

    #[inline]
    pub fn is_texel_buffer(self) -> bool {
        matches!(self, Self::Buffer | Self::RWBuffer)
    }
}

impl TryFrom<u32> for DescriptorType {
    type Error = GfxError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL.get(value as usize).copied().ok_or(GfxError::UnknownDescriptorType(value))
    }
}

/// pipeline layout 中的一个 binding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindingLayoutEntry {
    pub binding: u32,
    pub kind: DescriptorType,
    /// 数组长度，必须大于 0
    ///
    /// 大于 1 的数组只能用于创建 pipeline layout，dispatch 时一个 binding 只能绑定一个资源，
    /// 带有数组 binding 的 pipeline 无法 dispatch
    pub count: u32,
}

impl BindingLayoutEntry {
    #[inline]
    pub fn new(binding: u32, kind: DescriptorType) -> Self {
        Self { binding, kind, count: 1 }
    }

    #[inline]
    pub fn to_vk_binding(&self) -> vk::DescriptorSetLayoutBinding<'static> {
        vk::DescriptorSetLayoutBinding::default()
            .binding(self.binding)
            .descriptor_type(self.kind.to_vk_descriptor_type())
            .descriptor_count(self.count)
            .stage_flags(vk::ShaderStageFlags::COMPUTE)
    }
}

/// 绑定到某个 binding 上的资源
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    Buffer(BufferHandle),
    Image(ImageHandle),
    Sampler(SamplerHandle),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    pub binding: u32,
    pub resource: ResourceRef,
}

impl Binding {
    #[inline]
    pub fn buffer(binding: u32, buffer: BufferHandle) -> Self {
        Self {
            binding,
            resource: ResourceRef::Buffer(buffer),
        }
    }

    #[inline]
    pub fn image(binding: u32, image: ImageHandle) -> Self {
        Self {
            binding,
            resource: ResourceRef::Image(image),
        }
    }

    #[inline]
    pub fn sampler(binding: u32, sampler: SamplerHandle) -> Self {
        Self {
            binding,
            resource: ResourceRef::Sampler(sampler),
        }
    }
}

/// 每个 entry 的 count 都大于 0，且 binding 不重复
pub fn validate_binding_layout(layout: &[BindingLayoutEntry]) {
    let mut seen = HashSet::with_capacity(layout.len());
    for entry in layout {
        assert!(entry.count > 0, "binding {} has a zero descriptor count", entry.binding);
        assert!(seen.insert(entry.binding), "binding {} appears more than once in the layout", entry.binding);
    }
}

/// binding set 必须与 layout 一一对应，且 layout 中不能有数组 binding
pub fn validate_binding_set(layout: &[BindingLayoutEntry], bindings: &[Binding]) {
    assert_eq!(
        layout.len(),
        bindings.len(),
        "binding set has {} entries but the pipeline layout has {}",
        bindings.len(),
        layout.len()
    );
    for (entry, binding) in layout.iter().zip(bindings) {
        assert_eq!(
            entry.binding, binding.binding,
            "binding index mismatch: layout expects {}, got {}",
            entry.binding, binding.binding
        );
        assert_eq!(
            entry.count, 1,
            "binding {} is an array of {} descriptors, only single descriptors can be bound",
            entry.binding, entry.count
        );
    }
}
