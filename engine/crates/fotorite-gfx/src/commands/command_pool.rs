use std::rc::Rc;

use ash::vk;

use crate::{
    commands::command_queue::GfxQueueFamily,
    error::GfxResult,
    foundation::{debug_messenger::DebugType, device::GfxDevice},
    vk_check,
};

/// command pool 是和 queue family 绑定的，而不是和 queue 绑定的
pub struct GfxCommandPool {
    handle: vk::CommandPool,
    _queue_family: GfxQueueFamily,
    device: Rc<GfxDevice>,

    debug_name: String,
    valid: bool,
}
// init & destory
impl GfxCommandPool {
    pub fn new(
        device: Rc<GfxDevice>,
        queue_family: GfxQueueFamily,
        flags: vk::CommandPoolCreateFlags,
        debug_name: &str,
    ) -> GfxResult<Self> {
        let pool = unsafe {
            vk_check!(device.create_command_pool(
                &vk::CommandPoolCreateInfo::default().queue_family_index(queue_family.queue_family_index).flags(flags),
                None,
            ))
        }?;

        let command_pool = Self {
            handle: pool,
            _queue_family: queue_family,
            device,
            debug_name: debug_name.to_string(),
            valid: true,
        };
        command_pool.device.set_debug_name(&command_pool, debug_name);
        Ok(command_pool)
    }

    pub fn destroy(&mut self) {
        unsafe {
            self.device.destroy_command_pool(self.handle, None);
        }
        self.valid = false;
    }
}

// getters
impl GfxCommandPool {
    /// getter
    #[inline]
    pub fn handle(&self) -> vk::CommandPool {
        self.handle
    }

    #[inline]
    pub fn device(&self) -> &Rc<GfxDevice> {
        &self.device
    }
}

impl DebugType for GfxCommandPool {
    fn debug_type_name() -> &'static str {
        "GfxCommandPool"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

impl Drop for GfxCommandPool {
    fn drop(&mut self) {
        assert!(!self.valid, "CommandPool must be destroyed manually.");
        log::info!("Dropping CommandPool: {}", self.debug_name);
    }
}
