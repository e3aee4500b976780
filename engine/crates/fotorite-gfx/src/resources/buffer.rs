use std::ptr;

use ash::vk;
use vk_mem::Alloc;

use crate::{
    error::{GfxError, GfxResult},
    foundation::{debug_messenger::DebugType, device::GfxDevice, mem_allocator::GfxMemAllocator},
    resources::{
        memory::find_memory_type,
        resource_state::ResourceState,
        usage::{MemoryType, ResourceUsage},
    },
    vk_check,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferDesc {
    /// 字节数，不能为 0
    pub size: u64,
    pub usage: ResourceUsage,
    pub memory: MemoryType,
}

impl BufferDesc {
    /// 实际创建 vk::Buffer 时使用的 usage
    ///
    /// 所有 buffer 都带有 TRANSFER_SRC | TRANSFER_DST，
    /// device local 的 buffer 只能通过 staging buffer 读写
    pub fn vk_usage(&self) -> vk::BufferUsageFlags {
        self.usage.to_vk_buffer_usage() | vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST
    }
}

pub struct GfxBuffer {
    handle: vk::Buffer,
    allocation: vk_mem::Allocation,

    size: vk::DeviceSize,
    usage: ResourceUsage,
    memory: MemoryType,

    /// 最后一次 barrier 之后的状态
    pub(crate) state: ResourceState,
}
impl DebugType for GfxBuffer {
    fn debug_type_name() -> &'static str {
        "GfxBuffer"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
// init & destroy
impl GfxBuffer {
    /// 通过 first-fit 选择 memory type，然后通过 vma 分配并绑定内存
    ///
    /// 任何一步失败都会释放之前创建的对象
    pub fn new(
        device: &GfxDevice,
        allocator: &GfxMemAllocator,
        mem_props: &vk::PhysicalDeviceMemoryProperties,
        desc: &BufferDesc,
        name: impl AsRef<str>,
    ) -> GfxResult<Self> {
        assert!(desc.size > 0, "buffer size must not be zero");

        let buffer_ci = vk::BufferCreateInfo::default()
            .size(desc.size)
            .usage(desc.vk_usage())
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let buffer = unsafe { vk_check!(device.create_buffer(&buffer_ci, None)) }?;

        let allocation = unsafe { Self::allocate_and_bind(device, allocator, mem_props, desc.memory, buffer) };
        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        let buffer = Self {
            handle: buffer,
            allocation,
            size: desc.size,
            usage: desc.usage,
            memory: desc.memory,
            state: ResourceState::Undefined,
        };
        device.set_debug_name(&buffer, name);
        Ok(buffer)
    }

    unsafe fn allocate_and_bind(
        device: &GfxDevice,
        allocator: &GfxMemAllocator,
        mem_props: &vk::PhysicalDeviceMemoryProperties,
        memory: MemoryType,
        buffer: vk::Buffer,
    ) -> GfxResult<vk_mem::Allocation> {
        unsafe {
            let mem_reqs = device.get_buffer_memory_requirements(buffer);
            let required = memory.required_flags();
            let type_index = find_memory_type(mem_props, mem_reqs.memory_type_bits, required).ok_or(
                GfxError::NoCompatibleMemoryType {
                    type_bits: mem_reqs.memory_type_bits,
                    required,
                },
            )?;

            let alloc_ci = vk_mem::AllocationCreateInfo {
                required_flags: required,
                memory_type_bits: 1 << type_index,
                ..Default::default()
            };
            let mut allocation = vk_check!(allocator.allocate_memory(&mem_reqs, &alloc_ci))?;
            if let Err(e) = vk_check!(allocator.bind_buffer_memory(&mut allocation, buffer)) {
                allocator.free_memory(&mut allocation);
                return Err(e);
            }
            Ok(allocation)
        }
    }

    #[inline]
    pub fn destroy(mut self, allocator: &GfxMemAllocator) {
        unsafe {
            allocator.destroy_buffer(self.handle, &mut self.allocation);
        }
    }
}
// getter
impl GfxBuffer {
    #[inline]
    pub fn vk_buffer(&self) -> vk::Buffer {
        self.handle
    }

    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    #[inline]
    pub fn usage(&self) -> ResourceUsage {
        self.usage
    }

    #[inline]
    pub fn memory(&self) -> MemoryType {
        self.memory
    }

    #[inline]
    pub fn state(&self) -> ResourceState {
        self.state
    }
}
// tools
impl GfxBuffer {
    /// 检查 `[offset, offset + len)` 是否在 buffer 内
    #[inline]
    pub fn assert_range(&self, offset: vk::DeviceSize, len: usize) {
        let end = offset.checked_add(len as vk::DeviceSize);
        assert!(
            end.is_some_and(|end| end <= self.size),
            "range [{offset}, {offset} + {len}) is out of buffer bounds (size {})",
            self.size
        );
    }

    /// 通过 mem map 的方式将 data 写入到 buffer 的 offset 处
    ///
    /// 只能用于 host 可见的 buffer
    pub fn write_host(&mut self, allocator: &GfxMemAllocator, offset: vk::DeviceSize, data: &[u8]) -> GfxResult<()> {
        assert_eq!(self.memory, MemoryType::Host, "write_host requires a host visible buffer");
        self.assert_range(offset, data.len());
        if data.is_empty() {
            return Ok(());
        }

        unsafe {
            let mapped = vk_check!(allocator.map_memory(&mut self.allocation))?;
            ptr::copy_nonoverlapping(data.as_ptr(), mapped.add(offset as usize), data.len());
            allocator.unmap_memory(&mut self.allocation);
        }
        Ok(())
    }

    /// 通过 mem map 的方式从 buffer 的 offset 处读取数据
    pub fn read_host(&mut self, allocator: &GfxMemAllocator, offset: vk::DeviceSize, data: &mut [u8]) -> GfxResult<()> {
        assert_eq!(self.memory, MemoryType::Host, "read_host requires a host visible buffer");
        self.assert_range(offset, data.len());
        if data.is_empty() {
            return Ok(());
        }

        unsafe {
            let mapped = vk_check!(allocator.map_memory(&mut self.allocation))?;
            ptr::copy_nonoverlapping(mapped.add(offset as usize) as *const u8, data.as_mut_ptr(), data.len());
            allocator.unmap_memory(&mut self.allocation);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_buffer_is_a_transfer_target() {
        let desc = BufferDesc {
            size: 16,
            usage: ResourceUsage::CONSTANT_BUFFER,
            memory: MemoryType::Device,
        };
        let usage = desc.vk_usage();
        assert!(usage.contains(vk::BufferUsageFlags::UNIFORM_BUFFER));
        assert!(usage.contains(vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST));

        let staging = BufferDesc {
            size: 16,
            usage: ResourceUsage::empty(),
            memory: MemoryType::Host,
        };
        assert_eq!(staging.vk_usage(), vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST);
    }
}
