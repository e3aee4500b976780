use std::{cell::Cell, ffi::CString, rc::Rc};

use ash::vk;
use itertools::Itertools;

use crate::{
    basic::color::LabelColor,
    commands::{barrier::GfxBufferBarrier, command_pool::GfxCommandPool},
    error::GfxResult,
    foundation::{debug_messenger::DebugType, device::GfxDevice},
    resources::buffer::GfxBuffer,
    vk_check,
};

/// 命令缓冲封装
///
/// 只包含 compute 与 transfer 会用到的命令。
///
/// # 使用示例
/// ```ignore
/// let cmd = GfxCommandBuffer::new(&pool, "my-context")?;
/// cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, "my-context")?;
/// cmd.cmd_bind_pipeline(vk::PipelineBindPoint::COMPUTE, pipeline);
/// cmd.cmd_dispatch(glam::uvec3(16, 1, 1));
/// cmd.end()?;
/// ```
pub struct GfxCommandBuffer {
    vk_handle: vk::CommandBuffer,
    command_pool_handle: vk::CommandPool,
    device: Rc<GfxDevice>,

    /// 尚未结束的 debug label 数量，没有开启 debug utils 时同样会计数
    label_depth: Cell<u32>,
}
// new & init
impl GfxCommandBuffer {
    pub fn new(command_pool: &GfxCommandPool, debug_name: &str) -> GfxResult<Self> {
        let device = command_pool.device().clone();
        let info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool.handle())
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffers = unsafe { vk_check!(device.allocate_command_buffers(&info)) }?;
        let cmd_buffer = GfxCommandBuffer {
            vk_handle: command_buffers[0],
            command_pool_handle: command_pool.handle(),
            device,
            label_depth: Cell::new(0),
        };
        cmd_buffer.device.set_debug_name(&cmd_buffer, debug_name);
        Ok(cmd_buffer)
    }

    /// 将 command buffer 归还给创建它的 pool
    pub fn free(self) {
        unsafe {
            self.device.free_command_buffers(self.command_pool_handle, std::slice::from_ref(&self.vk_handle));
        }
    }
}
// Basic 命令
impl GfxCommandBuffer {
    /// 开始录制 command
    ///
    /// pool 带有 RESET_COMMAND_BUFFER 标志，begin 会隐式 reset 之前录制的内容
    #[inline]
    pub fn begin(&self, usage_flag: vk::CommandBufferUsageFlags, debug_label_name: &str) -> GfxResult<()> {
        unsafe {
            vk_check!(
                self.device
                    .begin_command_buffer(self.vk_handle, &vk::CommandBufferBeginInfo::default().flags(usage_flag))
            )
        }?;
        self.label_depth.set(0);
        self.begin_label(debug_label_name, LabelColor::COLOR_CMD);
        Ok(())
    }

    /// 结束录制 command
    ///
    /// 结束 debug label
    #[inline]
    pub fn end(&self) -> GfxResult<()> {
        assert_eq!(self.label_depth.get(), 1, "unbalanced debug labels at the end of the command buffer");
        self.end_label();
        unsafe { vk_check!(self.device.end_command_buffer(self.vk_handle)) }
    }
}
// getters
impl GfxCommandBuffer {
    /// getter
    #[inline]
    pub fn vk_handle(&self) -> vk::CommandBuffer {
        self.vk_handle
    }

    #[inline]
    pub fn label_depth(&self) -> u32 {
        self.label_depth.get()
    }
}
// 数据传输类型
impl GfxCommandBuffer {
    /// - command type: action
    /// - 支持的 queue：transfer，graphics，compute
    #[inline]
    pub fn cmd_copy_buffer(&self, src: &GfxBuffer, dst: &GfxBuffer, regions: &[vk::BufferCopy]) {
        unsafe {
            self.device.cmd_copy_buffer(self.vk_handle, src.vk_buffer(), dst.vk_buffer(), regions);
        }
    }

    /// - command type: state
    /// - 支持的 queue: graphics, compute
    #[inline]
    pub fn cmd_push_constants(
        &self,
        pipeline_layout: vk::PipelineLayout,
        stage: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) {
        unsafe {
            self.device.cmd_push_constants(self.vk_handle, pipeline_layout, stage, offset, data);
        }
    }
}
// 计算着色器相关命令
impl GfxCommandBuffer {
    /// - command type: state
    /// - supported queue types: graphics, compute
    #[inline]
    pub fn bind_descriptor_sets(
        &self,
        bind_point: vk::PipelineBindPoint,
        pipeline_layout: vk::PipelineLayout,
        first_set: u32,
        descriptor_sets: &[vk::DescriptorSet],
    ) {
        unsafe {
            self.device.cmd_bind_descriptor_sets(
                self.vk_handle,
                bind_point,
                pipeline_layout,
                first_set,
                descriptor_sets,
                &[],
            );
        }
    }

    /// - command type: state
    /// - supported queue types: graphics, compute
    #[inline]
    pub fn cmd_bind_pipeline(&self, bind_point: vk::PipelineBindPoint, pipeline: vk::Pipeline) {
        unsafe {
            self.device.cmd_bind_pipeline(self.vk_handle, bind_point, pipeline);
        }
    }

    /// - command type: action
    /// - supported queue types: compute
    #[inline]
    pub fn cmd_dispatch(&self, group_cnt: glam::UVec3) {
        unsafe {
            self.device.cmd_dispatch(self.vk_handle, group_cnt.x, group_cnt.y, group_cnt.z);
        }
    }
}
// 同步相关命令
impl GfxCommandBuffer {
    /// - command type: synchronize
    /// - supported queue types: graphics, compute, transfer
    #[inline]
    pub fn buffer_memory_barrier(&self, dependency_flags: vk::DependencyFlags, barriers: &[GfxBufferBarrier]) {
        let barriers = barriers.iter().map(|b| *b.inner()).collect_vec();
        let dependency_info =
            vk::DependencyInfo::default().buffer_memory_barriers(&barriers).dependency_flags(dependency_flags);
        unsafe {
            self.device.cmd_pipeline_barrier2(self.vk_handle, &dependency_info);
        }
    }
}
// debug 相关命令
impl GfxCommandBuffer {
    /// 没有开启 debug utils 时什么也不做
    ///
    /// - command type: state, action
    /// - supported queue type: graphics, compute
    #[inline]
    pub fn begin_label(&self, label_name: &str, label_color: glam::Vec4) {
        self.label_depth.set(self.label_depth.get() + 1);
        let Some(debug_utils) = self.device.debug_utils() else {
            return;
        };
        // label 中有 nul 时仍然需要开启一个 label，保证与 end_label 配对
        let name = CString::new(label_name).unwrap_or_default();
        unsafe {
            debug_utils.cmd_begin_debug_utils_label(
                self.vk_handle,
                &vk::DebugUtilsLabelEXT::default().label_name(name.as_c_str()).color(label_color.into()),
            );
        }
    }

    /// - command type: state, action
    /// - supported queue type: graphics, compute
    #[inline]
    pub fn end_label(&self) {
        let depth = self.label_depth.get();
        assert!(depth > 0, "end_label without a matching begin_label");
        self.label_depth.set(depth - 1);
        if let Some(debug_utils) = self.device.debug_utils() {
            unsafe {
                debug_utils.cmd_end_debug_utils_label(self.vk_handle);
            }
        }
    }
}
impl DebugType for GfxCommandBuffer {
    fn debug_type_name() -> &'static str {
        "GfxCommandBuffer"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.vk_handle
    }
}
