use ash::vk;

use crate::{
    commands::barrier::{GfxBarrierMask, GfxBufferBarrier},
    device::Device,
    resources::{
        handles::{BufferHandle, ContextHandle},
        resource_state::ResourceState,
    },
};

impl Device {
    /// 录制一个覆盖整个 buffer 的 barrier，并记录新的状态
    ///
    /// 即使新旧状态相同也会插入 barrier
    pub(crate) fn transition_buffer(&mut self, ctx: ContextHandle, buffer: BufferHandle, new_state: ResourceState) {
        let gfx_buffer =
            self.buffers.get_mut(buffer).unwrap_or_else(|| panic!("invalid buffer handle {:?}", buffer));
        let barrier = GfxBufferBarrier::new()
            .mask(gfx_buffer.state.transition_mask(new_state))
            .buffer(gfx_buffer.vk_buffer(), 0, vk::WHOLE_SIZE);
        gfx_buffer.state = new_state;

        let ctx = self.contexts.get(ctx).unwrap_or_else(|| panic!("invalid context handle {:?}", ctx));
        ctx.command_buffer.buffer_memory_barrier(vk::DependencyFlags::empty(), &[barrier]);
    }

    /// 让 host 能够读取 transfer 写入的数据
    pub(crate) fn host_read_barrier(&self, ctx: ContextHandle, buffer: BufferHandle) {
        let gfx_buffer = self.buffers.get(buffer).unwrap_or_else(|| panic!("invalid buffer handle {:?}", buffer));
        let src = gfx_buffer.state.access_info();
        let barrier = GfxBufferBarrier::new()
            .mask(GfxBarrierMask {
                src_stage: src.stage,
                dst_stage: vk::PipelineStageFlags2::HOST,
                src_access: src.access,
                dst_access: vk::AccessFlags2::HOST_READ,
            })
            .buffer(gfx_buffer.vk_buffer(), 0, vk::WHOLE_SIZE);

        self.context(ctx).command_buffer.buffer_memory_barrier(vk::DependencyFlags::empty(), &[barrier]);
    }
}
