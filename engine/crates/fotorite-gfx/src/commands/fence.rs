use std::{rc::Rc, time::Duration};

use ash::vk;

use crate::{
    error::{GfxError, GfxResult},
    foundation::{debug_messenger::DebugType, device::GfxDevice},
    vk_check,
};

/// # Destroy
/// 不实现 Drop，需要手动 destroy
pub struct GfxFence {
    fence: vk::Fence,
    device: Rc<GfxDevice>,
}

impl DebugType for GfxFence {
    fn debug_type_name() -> &'static str {
        "GfxFence"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.fence
    }
}

// 创建与销毁
impl GfxFence {
    /// # param
    /// * signaled - 是否创建时就 signaled
    pub fn new(device: Rc<GfxDevice>, signaled: bool, debug_name: &str) -> GfxResult<Self> {
        let fence_flags = if signaled { vk::FenceCreateFlags::SIGNALED } else { vk::FenceCreateFlags::empty() };
        let fence_ci = vk::FenceCreateInfo::default().flags(fence_flags);
        let fence = unsafe { vk_check!(device.create_fence(&fence_ci, None)) }?;

        let fence = Self { fence, device };
        fence.device.set_debug_name(&fence, debug_name);
        Ok(fence)
    }

    #[inline]
    pub fn destroy(self) {
        unsafe {
            self.device.destroy_fence(self.fence, None);
        }
    }
}

// getters
impl GfxFence {
    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }
}

// tools
impl GfxFence {
    /// 阻塞等待 fence，超时后返回 [`GfxError::FenceTimeout`]
    pub fn wait(&self, timeout: Duration) -> GfxResult<()> {
        let timeout_ns = u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX);
        let result = unsafe { self.device.wait_for_fences(std::slice::from_ref(&self.fence), true, timeout_ns) };
        match result {
            Ok(()) => Ok(()),
            Err(vk::Result::TIMEOUT) => Err(GfxError::FenceTimeout(timeout)),
            Err(result) => Err(GfxError::Vk {
                call: "wait_for_fences",
                site: concat!(file!(), ":", line!()),
                result,
            }),
        }
    }

    #[inline]
    pub fn reset(&self) -> GfxResult<()> {
        unsafe { vk_check!(self.device.reset_fences(std::slice::from_ref(&self.fence))) }
    }
}
