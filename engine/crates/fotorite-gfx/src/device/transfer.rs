//! buffer 的读写以及拷贝
//!
//! host 可见的 buffer 直接通过 map 读写；device local 的 buffer 需要经过一个 staging buffer，
//! 并在录制过程中通过 [`Device::flush_context`] 同步等待。

use ash::vk;

use crate::{
    basic::color::LabelColor,
    device::{Device, context::TransientResource},
    error::GfxResult,
    resources::{
        buffer::BufferDesc,
        handles::{BufferHandle, ContextHandle},
        resource_state::ResourceState,
        usage::{MemoryType, ResourceUsage},
    },
};

impl Device {
    /// 将 data 写入 buffer 的 offset 处
    ///
    /// device local 的 buffer 要求 context 处于录制状态，并且会在录制过程中提交一次
    pub fn write_buffer(
        &mut self,
        ctx: ContextHandle,
        buffer: BufferHandle,
        offset: vk::DeviceSize,
        data: &[u8],
    ) -> GfxResult<()> {
        let _span = tracy_client::span!("Device::write_buffer");
        let gfx_buffer = self.buffers.get_mut(buffer).unwrap_or_else(|| panic!("invalid buffer handle {:?}", buffer));
        gfx_buffer.assert_range(offset, data.len());
        if data.is_empty() {
            return Ok(());
        }

        match gfx_buffer.memory() {
            MemoryType::Host => gfx_buffer.write_host(&self.allocator, offset, data),
            MemoryType::Device => self.write_buffer_staged(ctx, buffer, offset, data),
        }
    }

    /// 从 buffer 的 offset 处读取 data.len() 个字节
    pub fn read_buffer(
        &mut self,
        ctx: ContextHandle,
        buffer: BufferHandle,
        offset: vk::DeviceSize,
        data: &mut [u8],
    ) -> GfxResult<()> {
        let _span = tracy_client::span!("Device::read_buffer");
        let gfx_buffer = self.buffers.get_mut(buffer).unwrap_or_else(|| panic!("invalid buffer handle {:?}", buffer));
        gfx_buffer.assert_range(offset, data.len());
        if data.is_empty() {
            return Ok(());
        }

        match gfx_buffer.memory() {
            MemoryType::Host => gfx_buffer.read_host(&self.allocator, offset, data),
            MemoryType::Device => self.read_buffer_staged(ctx, buffer, offset, data),
        }
    }

    /// 录制 buffer 之间的拷贝，src 和 dst 会分别切换到 TransferSrc 和 TransferDst
    pub fn copy_buffer(
        &mut self,
        ctx: ContextHandle,
        src: BufferHandle,
        src_offset: vk::DeviceSize,
        dst: BufferHandle,
        dst_offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) {
        self.context(ctx).state.assert_recording();
        assert_ne!(src, dst, "copy_buffer requires two different buffers");
        self.buffer_ref(src).assert_range(src_offset, size as usize);
        self.buffer_ref(dst).assert_range(dst_offset, size as usize);
        if size == 0 {
            return;
        }

        self.transition_buffer(ctx, src, ResourceState::TransferSrc);
        self.transition_buffer(ctx, dst, ResourceState::TransferDst);

        let region = vk::BufferCopy {
            src_offset,
            dst_offset,
            size,
        };
        let cmd = &self.context(ctx).command_buffer;
        cmd.cmd_copy_buffer(self.buffer_ref(src), self.buffer_ref(dst), std::slice::from_ref(&region));
    }
}

// staging
impl Device {
    fn create_staging_buffer(&mut self, size: usize) -> GfxResult<BufferHandle> {
        self.create_buffer(&BufferDesc {
            size: size as u64,
            usage: ResourceUsage::TRANSFER_SRC | ResourceUsage::TRANSFER_DST,
            memory: MemoryType::Host,
        })
    }

    fn write_buffer_staged(
        &mut self,
        ctx: ContextHandle,
        buffer: BufferHandle,
        offset: vk::DeviceSize,
        data: &[u8],
    ) -> GfxResult<()> {
        self.context(ctx).state.assert_recording();

        let staging = self.create_staging_buffer(data.len())?;
        let written = self.buffers.get_mut(staging).map_or(Ok(()), |b| b.write_host(&self.allocator, 0, data));
        if let Err(e) = written {
            self.destroy_buffer(staging);
            return Err(e);
        }

        // staging 在 flush 之后才注册，否则会在这次 wait 中被回收
        let flushed = self.flush_context(ctx);
        self.add_transient(ctx, TransientResource::Buffer(staging));
        flushed?;

        self.context(ctx).command_buffer.begin_label("write_buffer", LabelColor::COLOR_TRANSFER);
        self.copy_buffer(ctx, staging, 0, buffer, offset, data.len() as vk::DeviceSize);
        self.context(ctx).command_buffer.end_label();
        Ok(())
    }

    fn read_buffer_staged(
        &mut self,
        ctx: ContextHandle,
        buffer: BufferHandle,
        offset: vk::DeviceSize,
        data: &mut [u8],
    ) -> GfxResult<()> {
        self.context(ctx).state.assert_recording();

        let staging = self.create_staging_buffer(data.len())?;
        self.context(ctx).command_buffer.begin_label("read_buffer", LabelColor::COLOR_TRANSFER);
        self.copy_buffer(ctx, buffer, offset, staging, 0, data.len() as vk::DeviceSize);
        self.host_read_barrier(ctx, staging);
        self.context(ctx).command_buffer.end_label();

        let flushed = self.flush_context(ctx);
        self.add_transient(ctx, TransientResource::Buffer(staging));
        flushed?;

        self.buffers.get_mut(staging).map_or(Ok(()), |b| b.read_host(&self.allocator, 0, data))
    }
}
