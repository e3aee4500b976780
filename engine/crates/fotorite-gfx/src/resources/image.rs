use ash::vk;

use crate::resources::{
    resource_state::ResourceState,
    usage::{MemoryType, ResourceUsage},
};

/// image 的像素格式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    R8Unorm,
    #[default]
    Rgba8Unorm,
    R32Float,
    Rgba16Float,
    Rgba32Float,
}

impl Format {
    #[inline]
    pub fn to_vk_format(self) -> vk::Format {
        match self {
            Format::R8Unorm => vk::Format::R8_UNORM,
            Format::Rgba8Unorm => vk::Format::R8G8B8A8_UNORM,
            Format::R32Float => vk::Format::R32_SFLOAT,
            Format::Rgba16Float => vk::Format::R16G16B16A16_SFLOAT,
            Format::Rgba32Float => vk::Format::R32G32B32A32_SFLOAT,
        }
    }

    #[inline]
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Format::R8Unorm => 1,
            Format::Rgba8Unorm | Format::R32Float => 4,
            Format::Rgba16Float => 8,
            Format::Rgba32Float => 16,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub usage: ResourceUsage,
    pub memory: MemoryType,
}

/// 目前只记录 image 的描述以及状态，不会创建 vk::Image
pub struct GfxImage {
    desc: ImageDesc,
    pub(crate) state: ResourceState,
}

// init
impl GfxImage {
    pub fn new(desc: &ImageDesc) -> Self {
        Self {
            desc: *desc,
            state: ResourceState::Undefined,
        }
    }
}

// getters
impl GfxImage {
    #[inline]
    pub fn desc(&self) -> &ImageDesc {
        &self.desc
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.desc.width,
            height: self.desc.height,
        }
    }

    #[inline]
    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// 完整图像所占的字节数
    #[inline]
    pub fn byte_size(&self) -> u64 {
        self.desc.width as u64 * self.desc.height as u64 * self.desc.format.bytes_per_pixel() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_bookkeeping() {
        let image = GfxImage::new(&ImageDesc {
            width: 64,
            height: 32,
            format: Format::Rgba32Float,
            usage: ResourceUsage::UNORDERED_ACCESS,
            memory: MemoryType::Device,
        });
        assert_eq!(image.state(), ResourceState::Undefined);
        assert_eq!(image.extent(), vk::Extent2D { width: 64, height: 32 });
        assert_eq!(image.byte_size(), 64 * 32 * 16);
        assert_eq!(image.desc().format.to_vk_format(), vk::Format::R32G32B32A32_SFLOAT);
    }

    #[test]
    fn test_format_sizes() {
        assert_eq!(Format::R8Unorm.bytes_per_pixel(), 1);
        assert_eq!(Format::Rgba8Unorm.bytes_per_pixel(), 4);
        assert_eq!(Format::Rgba16Float.bytes_per_pixel(), 8);
    }
}
