//! 预编译 shader 的绑定
//!
//! shader 源码位于 `shaders/src`，编译产物（SPIR-V）位于 `shaders/compiled`，
//! 通过 `include_bytes!` 嵌入到二进制中。
//!
//! 不存在全局的 shader 表：需要创建 shader 的地方显式持有一个 [`ShaderBlobProvider`]。

mod registry;

pub use registry::{EmbeddedShaders, ShaderBlobProvider, ShaderId};

/// `test_buffer_cs` 的 push constant
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TestBufferPushConstant {
    /// 参与计算的元素个数
    pub count: u32,
}

/// `test_image_cs` 的 push constant
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TestImagePushConstant {
    /// 图像分辨率
    pub res: [u32; 2],
}
