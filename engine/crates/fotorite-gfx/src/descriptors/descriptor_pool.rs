use std::rc::Rc;

use ash::vk;

use crate::{
    error::GfxResult,
    foundation::{debug_messenger::DebugType, device::GfxDevice},
    vk_check,
};

/// 描述符池创建信息
pub struct GfxDescriptorPoolCreateInfo {
    flags: vk::DescriptorPoolCreateFlags,
    max_sets: u32,
    pool_sizes: Vec<vk::DescriptorPoolSize>,
}

impl GfxDescriptorPoolCreateInfo {
    /// # 参数
    /// - flags: 创建标志
    /// - max_sets: 最大描述符集数量
    /// - pool_sizes: 每种类型描述符的最大数量
    #[inline]
    pub fn new(flags: vk::DescriptorPoolCreateFlags, max_sets: u32, pool_sizes: Vec<vk::DescriptorPoolSize>) -> Self {
        Self {
            flags,
            max_sets,
            pool_sizes,
        }
    }

    /// context 共享的 descriptor pool：每次 dispatch 分配一个 set，在 context wait 之后释放
    pub fn transient_sets() -> Self {
        let pool_size = |ty, descriptor_count| vk::DescriptorPoolSize { ty, descriptor_count };
        Self::new(
            vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET,
            512,
            vec![
                pool_size(vk::DescriptorType::UNIFORM_BUFFER, 256),
                pool_size(vk::DescriptorType::STORAGE_BUFFER, 1024),
                pool_size(vk::DescriptorType::UNIFORM_TEXEL_BUFFER, 64),
                pool_size(vk::DescriptorType::STORAGE_TEXEL_BUFFER, 64),
                pool_size(vk::DescriptorType::SAMPLED_IMAGE, 256),
                pool_size(vk::DescriptorType::STORAGE_IMAGE, 256),
                pool_size(vk::DescriptorType::SAMPLER, 256),
            ],
        )
    }

    #[inline]
    fn vk_info(&self) -> vk::DescriptorPoolCreateInfo<'_> {
        vk::DescriptorPoolCreateInfo::default().flags(self.flags).max_sets(self.max_sets).pool_sizes(&self.pool_sizes)
    }
}

/// 描述符池
pub struct GfxDescriptorPool {
    handle: vk::DescriptorPool,
    device: Rc<GfxDevice>,
    destroyed: bool,
}

// init & destroy
impl GfxDescriptorPool {
    pub fn new(device: Rc<GfxDevice>, ci: &GfxDescriptorPoolCreateInfo, debug_name: &str) -> GfxResult<Self> {
        let handle = unsafe { vk_check!(device.create_descriptor_pool(&ci.vk_info(), None)) }?;
        let pool = Self {
            handle,
            device,
            destroyed: false,
        };
        pool.device.set_debug_name(&pool, debug_name);
        Ok(pool)
    }

    pub fn destroy(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.handle, None);
        }
        self.destroyed = true;
    }
}

// getters
impl GfxDescriptorPool {
    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.handle
    }
}

// tools
impl GfxDescriptorPool {
    pub fn allocate_set(&self, layout: vk::DescriptorSetLayout) -> GfxResult<vk::DescriptorSet> {
        let info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.handle)
            .set_layouts(std::slice::from_ref(&layout));
        let sets = unsafe { vk_check!(self.device.allocate_descriptor_sets(&info)) }?;
        Ok(sets[0])
    }

    pub fn free_sets(&self, sets: &[vk::DescriptorSet]) -> GfxResult<()> {
        if sets.is_empty() {
            return Ok(());
        }
        unsafe { vk_check!(self.device.free_descriptor_sets(self.handle, sets)) }
    }
}

impl DebugType for GfxDescriptorPool {
    fn debug_type_name() -> &'static str {
        "GfxDescriptorPool"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

impl Drop for GfxDescriptorPool {
    fn drop(&mut self) {
        debug_assert!(self.destroyed, "GfxDescriptorPool must be destroyed manually.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_pool_info() {
        let ci = GfxDescriptorPoolCreateInfo::transient_sets();
        let info = ci.vk_info();
        assert!(info.flags.contains(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET));
        assert_eq!(info.max_sets, 512);
        assert_eq!(info.pool_size_count as usize, ci.pool_sizes.len());
        assert!(ci.pool_sizes.iter().any(|s| s.ty == vk::DescriptorType::STORAGE_BUFFER && s.descriptor_count == 1024));
    }
}
