use std::{cell::Cell, ffi::CString, ops::Deref};

use ash::vk;

use crate::{error::GfxResult, foundation::debug_messenger::DebugType, vk_check};

/// Vulkan 逻辑设备封装
///
/// 只有 compute 与 transfer 的需求，因此只开启 synchronization2 这一个 feature。
/// debug utils 只有在 instance 开启了对应 extension 时才存在。
pub struct GfxDevice {
    /// 核心 Vulkan 设备 API
    pub(crate) device: ash::Device,
    /// 调试工具扩展 API
    pub(crate) debug_utils: Option<ash::ext::debug_utils::Device>,

    destroyed: Cell<bool>,
}

// 构造与销毁
impl GfxDevice {
    pub fn new(
        instance: &ash::Instance,
        pdevice: vk::PhysicalDevice,
        queue_create_info: &[vk::DeviceQueueCreateInfo],
        debug_utils_enabled: bool,
    ) -> GfxResult<Self> {
        let _span = tracy_client::span!("GfxDevice::new");

        // MirrorClampToEdge 的 sampler 需要这个 feature，不支持时只记录日志
        let mirror_clamp_to_edge = unsafe {
            let mut supported_vk12 = vk::PhysicalDeviceVulkan12Features::default();
            let mut supported = vk::PhysicalDeviceFeatures2::default().push_next(&mut supported_vk12);
            instance.get_physical_device_features2(pdevice, &mut supported);
            supported_vk12.sampler_mirror_clamp_to_edge == vk::TRUE
        };
        if !mirror_clamp_to_edge {
            log::warn!("samplerMirrorClampToEdge is not supported by this gpu");
        }

        let mut vk12_features =
            vk::PhysicalDeviceVulkan12Features::default().sampler_mirror_clamp_to_edge(mirror_clamp_to_edge);
        let mut vk13_features = vk::PhysicalDeviceVulkan13Features::default().synchronization2(true);
        let mut all_features =
            vk::PhysicalDeviceFeatures2::default().push_next(&mut vk12_features).push_next(&mut vk13_features);

        let device_create_info =
            vk::DeviceCreateInfo::default().queue_create_infos(queue_create_info).push_next(&mut all_features);

        let device = unsafe { vk_check!(instance.create_device(pdevice, &device_create_info, None)) }?;
        let debug_utils = debug_utils_enabled.then(|| ash::ext::debug_utils::Device::new(instance, &device));

        Ok(Self {
            device,
            debug_utils,
            destroyed: Cell::new(false),
        })
    }

    pub fn destroy(&self) {
        log::info!("destroying device");
        self.destroyed.set(true);

        unsafe {
            self.device.destroy_device(None);
        }
    }
}

// getters
impl GfxDevice {
    #[inline]
    pub fn vk_handle(&self) -> vk::Device {
        self.device.handle()
    }

    #[inline]
    pub fn debug_utils(&self) -> Option<&ash::ext::debug_utils::Device> {
        self.debug_utils.as_ref()
    }
}

// tools
impl GfxDevice {
    /// 没有开启 debug utils 时什么也不做
    ///
    /// 设置名字失败并不影响功能，只记录日志
    pub fn set_debug_name<T: DebugType>(&self, handle: &T, name: impl AsRef<str>) {
        let Some(debug_utils) = &self.debug_utils else {
            return;
        };

        let debug_name = format!("{}::{}", T::debug_type_name(), name.as_ref());
        let Ok(debug_name) = CString::new(debug_name) else {
            log::warn!("debug name contains nul byte: {:?}", name.as_ref());
            return;
        };
        let result = unsafe {
            debug_utils.set_debug_utils_object_name(
                &vk::DebugUtilsObjectNameInfoEXT::default()
                    .object_name(debug_name.as_c_str())
                    .object_handle(handle.vk_handle()),
            )
        };
        if let Err(e) = result {
            log::warn!("failed to set debug name {:?}: {:?}", debug_name, e);
        }
    }

    #[inline]
    pub fn wait_idle(&self) -> GfxResult<()> {
        unsafe { vk_check!(self.device.device_wait_idle()) }
    }
}

impl Deref for GfxDevice {
    type Target = ash::Device;
    fn deref(&self) -> &Self::Target {
        &self.device
    }
}
impl Drop for GfxDevice {
    fn drop(&mut self) {
        debug_assert!(self.destroyed.get(), "GfxDevice must be destroyed before being dropped.");
    }
}
impl DebugType for GfxDevice {
    fn debug_type_name() -> &'static str {
        "GfxDevice"
    }
    fn vk_handle(&self) -> impl vk::Handle {
        self.device.handle()
    }
}
