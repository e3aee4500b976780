use std::ffi::CStr;

use ash::vk;

use crate::{error::GfxResult, vk_check};

/// validation layer 的消息回调，将消息转发到 `log`
pub struct GfxDebugMsger {
    vk_debug_utils_instance: ash::ext::debug_utils::Instance,
    vk_debug_utils_messenger: vk::DebugUtilsMessengerEXT,

    destroyed: bool,
}

impl GfxDebugMsger {
    pub fn new(vk_entry: &ash::Entry, instance: &ash::Instance) -> GfxResult<Self> {
        let loader = ash::ext::debug_utils::Instance::new(vk_entry, instance);

        let create_info = Self::debug_utils_messenger_ci();
        let debug_messenger = unsafe { vk_check!(loader.create_debug_utils_messenger(&create_info, None)) }?;

        Ok(Self {
            vk_debug_utils_instance: loader,
            vk_debug_utils_messenger: debug_messenger,
            destroyed: false,
        })
    }

    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        log::info!("Destroying GfxDebugMsger");
        unsafe {
            self.vk_debug_utils_instance.destroy_debug_utils_messenger(self.vk_debug_utils_messenger, None);
        }
        self.destroyed = true;
    }
}

impl Drop for GfxDebugMsger {
    fn drop(&mut self) {
        debug_assert!(self.destroyed, "GfxDebugMsger must be destroyed before being dropped.");
    }
}

/// debug messenger 的回调函数
/// # Safety
/// 由 Vulkan loader 调用，`p_callback_data` 在回调期间有效
unsafe extern "system" fn vk_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = unsafe { *p_callback_data };

    let msg = if callback_data.p_message.is_null() {
        std::borrow::Cow::from("")
    } else {
        unsafe { CStr::from_ptr(callback_data.p_message).to_string_lossy() }
    };

    // 部分 layer 会输出 json，其中 MainMessage 字段带有换行符，需要单独输出
    let mut json_value = serde_json::from_str::<serde_json::Value>(msg.as_ref());
    let mut json_obj = json_value.as_mut().ok().and_then(|v| v.as_object_mut());
    let main_msg = json_obj.as_mut().and_then(|obj| obj.remove("MainMessage"));
    let main_msg_str = main_msg.as_ref().and_then(|value| value.as_str()).unwrap_or_default();
    let total_msg_str =
        json_obj.and_then(|obj| serde_json::to_string_pretty(&obj).ok()).unwrap_or_else(|| msg.to_string());

    let format_msg = format!("VK: [{:?}] {}\n{}", message_type, total_msg_str, main_msg_str);

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => log::error!("{}", format_msg),
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => log::warn!("{}", format_msg),
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => log::info!("{}", format_msg),
        _ => log::debug!("{}", format_msg),
    };

    // 只有 layer developer 才需要返回 True
    vk::FALSE
}

// 构造过程辅助函数
impl GfxDebugMsger {
    pub fn debug_msg_type() -> vk::DebugUtilsMessageTypeFlagsEXT {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
    }

    /// 所有级别的消息都会转发，由 `log` 的过滤器决定是否输出
    pub fn debug_msg_severity() -> vk::DebugUtilsMessageSeverityFlagsEXT {
        vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
            | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
    }

    /// 用于创建 debug messenger 的结构体
    ///
    /// 也会被挂到 instance create info 上，以便捕获 instance 创建过程中的消息
    pub fn debug_utils_messenger_ci() -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
        vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(Self::debug_msg_severity())
            .message_type(Self::debug_msg_type())
            .pfn_user_callback(Some(vk_debug_callback))
    }
}

/// 可以设置 debug name 的 Vulkan 对象
pub trait DebugType {
    fn debug_type_name() -> &'static str;
    fn vk_handle(&self) -> impl vk::Handle;
}
