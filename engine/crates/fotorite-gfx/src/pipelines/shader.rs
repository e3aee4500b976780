use std::ffi::{CStr, CString};

use ash::vk;

use crate::{
    error::{GfxError, GfxResult},
    foundation::{debug_messenger::DebugType, device::GfxDevice},
    vk_check,
};

#[derive(Clone, Copy, Debug)]
pub struct ShaderDesc<'a> {
    /// SPIR-V 字节码，长度必须是 4 的倍数
    pub code: &'a [u8],
    pub entry_point: &'a str,
}

/// # Destroy
///
/// 需要手动调用 `destroy` 方法来释放资源。
pub struct GfxShader {
    handle: vk::ShaderModule,
    entry_point: CString,
}
impl GfxShader {
    pub fn new(device: &GfxDevice, desc: &ShaderDesc, debug_name: &str) -> GfxResult<Self> {
        let entry_point =
            CString::new(desc.entry_point).map_err(|_| GfxError::InvalidEntryPoint(desc.entry_point.to_string()))?;
        let shader_code = ash::util::read_spv(&mut std::io::Cursor::new(desc.code)).map_err(GfxError::InvalidShader)?;

        let shader_module_info = vk::ShaderModuleCreateInfo::default().code(&shader_code);
        let handle = unsafe { vk_check!(device.create_shader_module(&shader_module_info, None)) }?;

        let shader = Self { handle, entry_point };
        device.set_debug_name(&shader, debug_name);
        Ok(shader)
    }

    #[inline]
    pub fn destroy(self, device: &GfxDevice) {
        unsafe {
            device.destroy_shader_module(self.handle, None);
        }
    }
}
// getters
impl GfxShader {
    #[inline]
    pub fn handle(&self) -> vk::ShaderModule {
        self.handle
    }

    #[inline]
    pub fn entry_point(&self) -> &CStr {
        &self.entry_point
    }
}
impl DebugType for GfxShader {
    fn debug_type_name() -> &'static str {
        "GfxShader"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
