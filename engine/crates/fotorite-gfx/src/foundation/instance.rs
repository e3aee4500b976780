use std::ffi::{CStr, CString, c_char};

use ash::vk;
use itertools::Itertools;

use crate::{error::GfxResult, foundation::debug_messenger::GfxDebugMsger, vk_check};

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

pub struct GfxInstance {
    pub(crate) ash_instance: ash::Instance,

    /// 是否开启了 validation layer 以及 debug utils
    debug_utils_enabled: bool,
    destroyed: bool,
}

impl GfxInstance {
    /// 设置所需的 layers 和 extensions，创建 vk instance
    ///
    /// 请求 validation 但 layer 不存在时，只输出警告，不会失败
    pub fn new(vk_entry: &ash::Entry, app_name: &str, enable_validation: bool) -> GfxResult<Self> {
        let app_name = CString::new(app_name).unwrap_or_else(|_| c"fotorite".to_owned());
        let app_info = vk::ApplicationInfo::default()
            .api_version(vk::API_VERSION_1_3) // synchronization2 需要 1.3
            .application_name(app_name.as_c_str())
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(c"no engine")
            .engine_version(vk::make_api_version(0, 1, 0, 0));

        let debug_utils_enabled = enable_validation && Self::validation_supported(vk_entry)?;

        let enabled_layers: Vec<*const c_char> =
            if debug_utils_enabled { vec![VALIDATION_LAYER.as_ptr()] } else { vec![] };
        let enabled_extensions: Vec<*const c_char> =
            if debug_utils_enabled { vec![vk::EXT_DEBUG_UTILS_NAME.as_ptr()] } else { vec![] };

        log::info!(
            "instance layers: [{}], extensions: [{}]",
            enabled_layers.iter().map(|l| unsafe { CStr::from_ptr(*l) }.to_string_lossy()).join(", "),
            enabled_extensions.iter().map(|e| unsafe { CStr::from_ptr(*e) }.to_string_lossy()).join(", ")
        );

        let mut instance_ci = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&enabled_extensions)
            .enabled_layer_names(&enabled_layers);

        // 为 instance info 添加 debug messenger，以捕获 create/destroy instance 时的消息
        let mut debug_utils_messenger_ci = GfxDebugMsger::debug_utils_messenger_ci();
        if debug_utils_enabled {
            instance_ci = instance_ci.push_next(&mut debug_utils_messenger_ci);
        }

        let ash_instance = unsafe { vk_check!(vk_entry.create_instance(&instance_ci, None)) }?;

        Ok(Self {
            ash_instance,
            debug_utils_enabled,
            destroyed: false,
        })
    }

    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        log::info!("Destroying GfxInstance");
        unsafe {
            self.ash_instance.destroy_instance(None);
        }
        self.destroyed = true;
    }

    /// validation layer 以及 debug utils extension 是否都可用
    fn validation_supported(vk_entry: &ash::Entry) -> GfxResult<bool> {
        let layers = unsafe { vk_check!(vk_entry.enumerate_instance_layer_properties()) }?;
        let has_layer =
            layers.iter().any(|layer| layer.layer_name_as_c_str().is_ok_and(|name| name == VALIDATION_LAYER));
        if !has_layer {
            log::warn!("{:?} is not installed, validation is disabled", VALIDATION_LAYER);
            return Ok(false);
        }

        let exts = unsafe { vk_check!(vk_entry.enumerate_instance_extension_properties(None)) }?;
        let has_ext = exts
            .iter()
            .any(|ext| ext.extension_name_as_c_str().is_ok_and(|name| name == vk::EXT_DEBUG_UTILS_NAME));
        if !has_ext {
            log::warn!("{:?} is not supported, validation is disabled", vk::EXT_DEBUG_UTILS_NAME);
        }
        Ok(has_ext)
    }
}

impl Drop for GfxInstance {
    fn drop(&mut self) {
        debug_assert!(self.destroyed, "GfxInstance must be destroyed before being dropped.");
    }
}

// getters
impl GfxInstance {
    #[inline]
    pub fn ash_instance(&self) -> &ash::Instance {
        &self.ash_instance
    }

    #[inline]
    pub fn debug_utils_enabled(&self) -> bool {
        self.debug_utils_enabled
    }
}
