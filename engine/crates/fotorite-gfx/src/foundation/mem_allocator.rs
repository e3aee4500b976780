use std::ops::Deref;

use ash::vk;

use crate::{error::GfxResult, vk_check};

/// vma 的封装
pub struct GfxMemAllocator {
    inner: vk_mem::Allocator,
}

impl GfxMemAllocator {
    /// vma 需要引用 Instance 以及 Device，
    /// 因此需要在其他部分都初始化完成后再初始化 vma，并在 Device 销毁之前销毁
    pub fn new(instance: &ash::Instance, pdevice: vk::PhysicalDevice, device: &ash::Device) -> GfxResult<Self> {
        let mut vma_ci = vk_mem::AllocatorCreateInfo::new(instance, device, pdevice);
        vma_ci.vulkan_api_version = vk::API_VERSION_1_3;

        let vma = unsafe { vk_check!(vk_mem::Allocator::new(vma_ci)) }?;

        Ok(Self { inner: vma })
    }
}

impl Deref for GfxMemAllocator {
    type Target = vk_mem::Allocator;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
