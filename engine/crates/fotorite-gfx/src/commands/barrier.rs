use ash::vk;

/// barrier 使用的 src 和 dst 访问 mask
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GfxBarrierMask {
    pub src_stage: vk::PipelineStageFlags2,
    pub dst_stage: vk::PipelineStageFlags2,
    pub src_access: vk::AccessFlags2,
    pub dst_access: vk::AccessFlags2,
}

/// 便捷创建 buffer memory barrier 的结构体
pub struct GfxBufferBarrier {
    inner: vk::BufferMemoryBarrier2<'static>,
}

impl Default for GfxBufferBarrier {
    fn default() -> Self {
        Self {
            inner: vk::BufferMemoryBarrier2 {
                src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                ..Default::default()
            },
        }
    }
}

impl GfxBufferBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inner(&self) -> &vk::BufferMemoryBarrier2<'_> {
        &self.inner
    }

    #[inline]
    pub fn mask(mut self, mask: GfxBarrierMask) -> Self {
        self.inner.src_stage_mask = mask.src_stage;
        self.inner.dst_stage_mask = mask.dst_stage;
        self.inner.src_access_mask = mask.src_access;
        self.inner.dst_access_mask = mask.dst_access;
        self
    }

    #[inline]
    pub fn buffer(mut self, buffer: vk::Buffer, offset: vk::DeviceSize, size: vk::DeviceSize) -> Self {
        self.inner.buffer = buffer;
        self.inner.offset = offset;
        self.inner.size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_barrier_builder() {
        let mask = GfxBarrierMask {
            src_stage: vk::PipelineStageFlags2::TRANSFER,
            dst_stage: vk::PipelineStageFlags2::COMPUTE_SHADER,
            src_access: vk::AccessFlags2::TRANSFER_WRITE,
            dst_access: vk::AccessFlags2::SHADER_STORAGE_READ,
        };
        let barrier = GfxBufferBarrier::new().mask(mask).buffer(vk::Buffer::null(), 0, vk::WHOLE_SIZE);
        let inner = barrier.inner();

        assert_eq!(inner.src_stage_mask, vk::PipelineStageFlags2::TRANSFER);
        assert_eq!(inner.dst_access_mask, vk::AccessFlags2::SHADER_STORAGE_READ);
        assert_eq!(inner.src_queue_family_index, vk::QUEUE_FAMILY_IGNORED);
        assert_eq!(inner.dst_queue_family_index, vk::QUEUE_FAMILY_IGNORED);
        assert_eq!(inner.offset, 0);
        assert_eq!(inner.size, vk::WHOLE_SIZE);
    }
}
