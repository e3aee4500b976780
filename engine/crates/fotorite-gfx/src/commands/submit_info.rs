use ash::vk;
use itertools::Itertools;

use crate::commands::command_buffer::GfxCommandBuffer;

/// Gfx 关于 submitInfo 的封装，更易用
///
/// 只有单个 queue，提交之间通过 fence 同步，因此不包含 semaphore
pub struct GfxSubmitInfo {
    command_buffers: Vec<vk::CommandBufferSubmitInfo<'static>>,
}

impl GfxSubmitInfo {
    pub fn new(commands: &[&GfxCommandBuffer]) -> Self {
        let command_buffers = commands
            .iter()
            .map(|cmd| vk::CommandBufferSubmitInfo::default().command_buffer(cmd.vk_handle()))
            .collect_vec();

        Self { command_buffers }
    }

    #[inline]
    pub fn submit_info(&self) -> vk::SubmitInfo2<'_> {
        // 暂时不使用 flags
        vk::SubmitInfo2::default().command_buffer_infos(&self.command_buffers)
    }
}
