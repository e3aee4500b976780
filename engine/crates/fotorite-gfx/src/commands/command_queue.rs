use std::rc::Rc;

use ash::vk;
use itertools::Itertools;

use crate::{
    commands::{fence::GfxFence, submit_info::GfxSubmitInfo},
    error::GfxResult,
    foundation::{debug_messenger::DebugType, device::GfxDevice},
    vk_check,
};

#[derive(Clone, Debug)]
pub struct GfxQueueFamily {
    pub name: String,
    pub queue_family_index: u32,
    pub queue_flags: vk::QueueFlags,
    pub queue_count: u32,
}

pub struct GfxCommandQueue {
    vk_queue: vk::Queue,
    queue_family: GfxQueueFamily,
    device: Rc<GfxDevice>,
}

// new & init
impl GfxCommandQueue {
    /// 取出 queue family 中的第 0 个 queue
    pub fn new(device: Rc<GfxDevice>, queue_family: GfxQueueFamily, debug_name: &str) -> Self {
        let vk_queue = unsafe { device.get_device_queue(queue_family.queue_family_index, 0) };
        let queue = Self {
            vk_queue,
            queue_family,
            device,
        };
        queue.device.set_debug_name(&queue, debug_name);
        queue
    }
}

// getters
impl GfxCommandQueue {
    #[inline]
    pub fn vk_queue(&self) -> vk::Queue {
        self.vk_queue
    }

    #[inline]
    pub fn queue_family(&self) -> &GfxQueueFamily {
        &self.queue_family
    }
}

// tools
impl GfxCommandQueue {
    pub fn submit(&self, batches: &[GfxSubmitInfo], fence: Option<&GfxFence>) -> GfxResult<()> {
        let _span = tracy_client::span!("GfxCommandQueue::submit");
        let batches = batches.iter().map(|b| b.submit_info()).collect_vec();
        unsafe {
            vk_check!(self.device.queue_submit2(
                self.vk_queue,
                &batches,
                fence.map_or(vk::Fence::null(), |f| f.handle()),
            ))
        }
    }
}

impl DebugType for GfxCommandQueue {
    fn debug_type_name() -> &'static str {
        "GfxCommandQueue"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.vk_queue
    }
}
