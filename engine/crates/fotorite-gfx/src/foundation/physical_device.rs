use std::ffi::CStr;

use ash::vk;
use itertools::Itertools;

use crate::{
    commands::command_queue::GfxQueueFamily,
    error::{GfxError, GfxResult},
    foundation::debug_messenger::DebugType,
    vk_check,
};

/// 表示一张物理显卡
pub struct GfxPhysicalDevice {
    pub(crate) vk_handle: vk::PhysicalDevice,

    /// 当前 gpu 的基础属性
    pub(crate) basic_props: vk::PhysicalDeviceProperties,

    /// 用于选择 buffer 的 memory type
    pub(crate) mem_props: vk::PhysicalDeviceMemoryProperties,

    /// 所有命令都提交到这个 queue family
    pub(crate) compute_queue_family: GfxQueueFamily,
}

impl GfxPhysicalDevice {
    /// 选择一张支持 Vulkan 1.3 且有 compute queue 的显卡
    ///
    /// 优先选择独立显卡，如果没有则选择第一个可用的显卡
    pub fn pick(instance: &ash::Instance) -> GfxResult<Self> {
        let pdevices = unsafe { vk_check!(instance.enumerate_physical_devices()) }?;
        pdevices
            .into_iter()
            .filter_map(|pdevice| GfxPhysicalDevice::new(pdevice, instance))
            // 优先使用独立显卡
            .find_or_first(GfxPhysicalDevice::is_descrete_gpu)
            .ok_or(GfxError::NoPhysicalDevice)
    }

    /// 不满足要求时返回 None
    fn new(pdevice: vk::PhysicalDevice, instance: &ash::Instance) -> Option<Self> {
        unsafe {
            let basic_props = instance.get_physical_device_properties(pdevice);
            let device_name = CStr::from_ptr(basic_props.device_name.as_ptr());

            if basic_props.api_version < vk::API_VERSION_1_3 {
                log::info!("skip gpu {:?}: vulkan 1.3 is not supported", device_name);
                return None;
            }

            let queue_family_props = instance.get_physical_device_queue_family_properties(pdevice);
            log::debug!("gpu {:?} queue family props:\n{:#?}", device_name, queue_family_props);

            let Some(compute_queue_family) = Self::find_compute_queue_family(&queue_family_props) else {
                log::info!("skip gpu {:?}: no compute queue", device_name);
                return None;
            };

            log::info!("found gpu: {:?}", device_name);
            Some(Self {
                vk_handle: pdevice,
                basic_props,
                mem_props: instance.get_physical_device_memory_properties(pdevice),
                compute_queue_family,
            })
        }
    }

    /// 优先选择全能的 queue family（graphics + compute），其次是任意支持 compute 的 queue family
    pub(crate) fn find_compute_queue_family(props: &[vk::QueueFamilyProperties]) -> Option<GfxQueueFamily> {
        let find_queue_family = |name: &str, include_flags: vk::QueueFlags| {
            props
                .iter()
                .enumerate()
                .find(|(_, props)| props.queue_count > 0 && props.queue_flags.contains(include_flags))
                .map(|(family_idx, props)| GfxQueueFamily {
                    name: name.to_string(),
                    queue_family_index: family_idx as u32,
                    queue_flags: props.queue_flags,
                    queue_count: props.queue_count,
                })
        };

        find_queue_family("gfx", vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)
            .or_else(|| find_queue_family("compute", vk::QueueFlags::COMPUTE))
    }

    #[inline]
    /// 当前 gpu 是否是独立显卡
    pub fn is_descrete_gpu(&self) -> bool {
        self.basic_props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU
    }

    #[inline]
    pub fn device_name(&self) -> String {
        self.basic_props.device_name_as_c_str().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
    }
}

impl DebugType for GfxPhysicalDevice {
    fn debug_type_name() -> &'static str {
        "GfxPhysicalDevice"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.vk_handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_prefers_graphics_compute_family() {
        let props = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
        ];
        let queue_family = GfxPhysicalDevice::find_compute_queue_family(&props).unwrap();
        assert_eq!(queue_family.queue_family_index, 2);
        assert_eq!(queue_family.name, "gfx");
    }

    #[test]
    fn test_falls_back_to_compute_only_family() {
        let props = [family(vk::QueueFlags::TRANSFER), family(vk::QueueFlags::COMPUTE)];
        let queue_family = GfxPhysicalDevice::find_compute_queue_family(&props).unwrap();
        assert_eq!(queue_family.queue_family_index, 1);
        assert_eq!(queue_family.name, "compute");
    }

    #[test]
    fn test_no_compute_family() {
        let props = [family(vk::QueueFlags::TRANSFER), family(vk::QueueFlags::GRAPHICS)];
        assert!(GfxPhysicalDevice::find_compute_queue_family(&props).is_none());
    }
}
