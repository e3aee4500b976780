//! context 的生命周期：`begin` → 录制 → `submit` → `wait`
//!
//! `wait` 返回之后，context 在录制期间创建的临时资源以及 descriptor set 都会被回收。

use std::time::Duration;

use ash::vk;

use crate::{
    commands::{command_buffer::GfxCommandBuffer, fence::GfxFence, submit_info::GfxSubmitInfo},
    device::Device,
    error::{GfxError, GfxResult},
    resources::handles::{BufferHandle, ContextHandle, ImageHandle, PipelineHandle, SamplerHandle, ShaderHandle},
};

/// 超过这个时间 fence 还没有 signal，就认为 device 已经不可用
pub const CONTEXT_WAIT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContextState {
    /// 刚创建或者 wait 完成
    #[default]
    Idle,
    Recording,
    /// 已提交，等待 wait
    Submitted,
}

impl ContextState {
    #[inline]
    fn assert_can_begin(self) {
        assert!(self != ContextState::Recording, "context is already recording");
        assert!(self != ContextState::Submitted, "context must be waited before it begins again");
    }

    #[inline]
    pub(crate) fn assert_recording(self) {
        assert!(self == ContextState::Recording, "context is not recording (state: {self:?})");
    }

    #[inline]
    fn assert_can_wait(self) {
        assert!(self != ContextState::Recording, "context must be submitted before waiting");
    }
}

/// 只在某个 context 的一次录制中使用的资源，在 `wait` 之后销毁
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransientResource {
    Buffer(BufferHandle),
    Image(ImageHandle),
    Sampler(SamplerHandle),
    Pipeline(PipelineHandle),
    Shader(ShaderHandle),
}

pub struct GfxContext {
    pub(crate) command_buffer: GfxCommandBuffer,
    fence: GfxFence,
    pub(crate) state: ContextState,

    transient_resources: Vec<TransientResource>,
    descriptor_sets: Vec<vk::DescriptorSet>,
}

impl GfxContext {
    fn new(command_buffer: GfxCommandBuffer, fence: GfxFence) -> Self {
        Self {
            command_buffer,
            fence,
            state: ContextState::Idle,
            transient_resources: vec![],
            descriptor_sets: vec![],
        }
    }

    #[inline]
    pub fn state(&self) -> ContextState {
        self.state
    }

    #[inline]
    pub fn transient_resources(&self) -> &[TransientResource] {
        &self.transient_resources
    }

    #[inline]
    pub(crate) fn add_descriptor_set(&mut self, set: vk::DescriptorSet) {
        self.descriptor_sets.push(set);
    }
}

// 创建与销毁
impl Device {
    pub fn create_context(&mut self) -> GfxResult<ContextHandle> {
        let command_buffer = GfxCommandBuffer::new(&self.command_pool, "context")?;
        // 以 signaled 状态创建，第一次 submit 之前的 wait 会立即返回
        let fence = match GfxFence::new(self.gfx_device.clone(), true, "context") {
            Ok(fence) => fence,
            Err(e) => {
                command_buffer.free();
                return Err(e);
            }
        };

        let handle = self.contexts.alloc(GfxContext::new(command_buffer, fence));
        log::debug!("create context {:?}", handle);
        Ok(handle)
    }

    /// 已提交的 context 会先等待执行完成
    ///
    /// 等待失败时 command buffer 可能仍在执行，此时 context 不会被释放
    pub fn destroy_context(&mut self, handle: ContextHandle) {
        let Some(state) = self.contexts.get(handle).map(GfxContext::state) else {
            return;
        };
        if state == ContextState::Submitted {
            if let Err(e) = self.context(handle).fence.wait(CONTEXT_WAIT_TIMEOUT) {
                log::error!("failed to wait context {:?}, leaking it: {}", handle, e);
                return;
            }
        }
        if let Err(e) = self.reclaim_context(handle) {
            log::error!("failed to reclaim context {:?}: {}", handle, e);
        }

        if let Some(ctx) = self.contexts.free(handle) {
            ctx.command_buffer.free();
            ctx.fence.destroy();
            log::debug!("destroy context {:?}", handle);
        }
    }
}

// 生命周期
impl Device {
    /// context 不能处于录制状态，且上一次提交必须已经 wait
    pub fn begin(&mut self, handle: ContextHandle) -> GfxResult<()> {
        let ctx = self.context_mut(handle);
        ctx.state.assert_can_begin();

        ctx.fence.reset()?;
        ctx.command_buffer.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, "context")?;
        ctx.state = ContextState::Recording;
        Ok(())
    }

    pub fn submit(&mut self, handle: ContextHandle) -> GfxResult<()> {
        let _span = tracy_client::span!("Device::submit");
        let ctx = self.contexts.get_mut(handle).unwrap_or_else(|| panic!("invalid context handle {:?}", handle));
        ctx.state.assert_recording();

        ctx.command_buffer.end()?;
        self.queue.submit(&[GfxSubmitInfo::new(&[&ctx.command_buffer])], Some(&ctx.fence))?;
        ctx.state = ContextState::Submitted;
        Ok(())
    }

    /// 阻塞等待 context 执行完成，然后回收临时资源以及 descriptor set
    ///
    /// 超时会返回 [`GfxError::FenceTimeout`]，此时 device 应当被视为不可用
    pub fn wait(&mut self, handle: ContextHandle) -> GfxResult<()> {
        let _span = tracy_client::span!("Device::wait");
        let ctx = self.context(handle);
        ctx.state.assert_can_wait();

        ctx.fence.wait(CONTEXT_WAIT_TIMEOUT).inspect_err(|e| {
            if matches!(e, GfxError::FenceTimeout(_)) {
                log::error!("context {:?} did not finish in {:?}", handle, CONTEXT_WAIT_TIMEOUT);
            }
        })?;

        self.reclaim_context(handle)?;
        self.context_mut(handle).state = ContextState::Idle;
        Ok(())
    }

    /// 在录制过程中强制提交并等待，然后重新开始录制
    ///
    /// device local buffer 的读写都经过这里
    // TODO: 使用可复用的 staging ring 代替这里的同步等待
    pub(crate) fn flush_context(&mut self, handle: ContextHandle) -> GfxResult<()> {
        let _span = tracy_client::span!("Device::flush_context");
        self.submit(handle)?;
        self.wait(handle)?;
        self.begin(handle)
    }

    /// 将资源的所有权交给 context，下一次 `wait` 完成之后按种类销毁
    ///
    /// 资源在当前录制中仍然可以使用
    pub fn add_transient(&mut self, handle: ContextHandle, resource: TransientResource) {
        self.context_mut(handle).transient_resources.push(resource);
    }

    /// 销毁 context 上的临时资源，释放 descriptor set
    fn reclaim_context(&mut self, handle: ContextHandle) -> GfxResult<()> {
        let ctx = self.context_mut(handle);
        let transient_resources = std::mem::take(&mut ctx.transient_resources);
        let descriptor_sets = std::mem::take(&mut ctx.descriptor_sets);

        for resource in transient_resources {
            match resource {
                TransientResource::Buffer(h) => self.destroy_buffer(h),
                TransientResource::Image(h) => self.destroy_image(h),
                TransientResource::Sampler(h) => self.destroy_sampler(h),
                TransientResource::Pipeline(h) => self.destroy_pipeline(h),
                TransientResource::Shader(h) => self.destroy_shader(h),
            }
        }
        self.descriptor_pool.free_sets(&descriptor_sets)
    }
}

// getters
impl Device {
    #[inline]
    pub fn context_state(&self, handle: ContextHandle) -> Option<ContextState> {
        self.contexts.get(handle).map(GfxContext::state)
    }

    #[inline]
    pub(crate) fn context(&self, handle: ContextHandle) -> &GfxContext {
        self.contexts.get(handle).unwrap_or_else(|| panic!("invalid context handle {:?}", handle))
    }

    #[inline]
    pub(crate) fn context_mut(&mut self, handle: ContextHandle) -> &mut GfxContext {
        self.contexts.get_mut(handle).unwrap_or_else(|| panic!("invalid context handle {:?}", handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_and_waited_contexts_can_begin() {
        ContextState::Idle.assert_can_begin();
        ContextState::Idle.assert_can_wait();
        ContextState::Submitted.assert_can_wait();
        ContextState::Recording.assert_recording();
    }

    #[test]
    #[should_panic(expected = "already recording")]
    fn test_begin_while_recording() {
        ContextState::Recording.assert_can_begin();
    }

    #[test]
    #[should_panic(expected = "must be waited")]
    fn test_begin_without_wait() {
        ContextState::Submitted.assert_can_begin();
    }

    #[test]
    #[should_panic(expected = "not recording")]
    fn test_submit_while_idle() {
        ContextState::Idle.assert_recording();
    }

    #[test]
    #[should_panic(expected = "must be submitted before waiting")]
    fn test_wait_while_recording() {
        ContextState::Recording.assert_can_wait();
    }
}
