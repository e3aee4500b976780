use ash::vk;

bitflags::bitflags! {
    /// 资源的用途，可以组合
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ResourceUsage: u32 {
        const CONSTANT_BUFFER = 1 << 0;
        const UNORDERED_ACCESS = 1 << 1;
        const SHADER_RESOURCE = 1 << 2;
        const TRANSFER_SRC = 1 << 3;
        const TRANSFER_DST = 1 << 4;
    }
}

impl ResourceUsage {
    pub fn to_vk_buffer_usage(self) -> vk::BufferUsageFlags {
        let mut flags = vk::BufferUsageFlags::empty();
        if self.contains(Self::CONSTANT_BUFFER) {
            flags |= vk::BufferUsageFlags::UNIFORM_BUFFER;
        }
        // structured buffer 不论只读还是读写，都是 storage buffer
        if self.intersects(Self::UNORDERED_ACCESS | Self::SHADER_RESOURCE) {
            flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
        }
        if self.contains(Self::TRANSFER_SRC) {
            flags |= vk::BufferUsageFlags::TRANSFER_SRC;
        }
        if self.contains(Self::TRANSFER_DST) {
            flags |= vk::BufferUsageFlags::TRANSFER_DST;
        }
        flags
    }
}

/// 资源所在的内存
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MemoryType {
    /// host 可见，可以直接 map
    Host,
    /// 只有 device 可以访问，需要通过 staging buffer 传输
    #[default]
    Device,
}

impl MemoryType {
    /// 选择 memory type 时必须具备的属性
    #[inline]
    pub fn required_flags(self) -> vk::MemoryPropertyFlags {
        match self {
            MemoryType::Host => vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            MemoryType::Device => vk::MemoryPropertyFlags::DEVICE_LOCAL,
        }
    }
}
