use std::time::Duration;

use ash::vk;

/// GFX 层中所有可恢复的错误
///
/// 调用方的编程错误（错误的 handle、binding 对不上、group count 为 0 等）不会出现在这里，
/// 这些情况会直接 panic。
#[derive(Debug, thiserror::Error)]
pub enum GfxError {
    /// Vulkan 调用失败，包含调用位置以及返回值
    #[error("{site} VK error:\n{call} failed with result {result:?}")]
    Vk {
        call: &'static str,
        site: &'static str,
        result: vk::Result,
    },

    #[error("failed to load the vulkan library: {0}")]
    Loading(#[from] ash::LoadingError),

    #[error("no suitable Vulkan device available")]
    NoPhysicalDevice,

    #[error("no memory type matches type bits {type_bits:#b} with properties {required:?}")]
    NoCompatibleMemoryType {
        type_bits: u32,
        required: vk::MemoryPropertyFlags,
    },

    /// fence 在限定时间内没有 signal，此时 device 应当被视为不可用
    #[error("context fence was not signaled within {0:?}")]
    FenceTimeout(Duration),

    #[error("invalid SPIR-V blob: {0}")]
    InvalidShader(#[source] std::io::Error),

    #[error("invalid shader entry point: {0:?}")]
    InvalidEntryPoint(String),

    #[error("unknown descriptor type: {0}")]
    UnknownDescriptorType(u32),

    #[error("not implemented: {0}")]
    Unsupported(&'static str),
}

pub type GfxResult<T> = Result<T, GfxError>;

/// 将 `VkResult<T>` 转换为 [`GfxResult<T>`]，并记录调用的代码以及位置
///
/// ```ignore
/// let fence = unsafe { vk_check!(device.create_fence(&info, None)) }?;
/// ```
#[macro_export]
macro_rules! vk_check {
    ($call:expr) => {
        ($call).map_err(|result| $crate::error::GfxError::Vk {
            call: stringify!($call),
            site: concat!(file!(), ":", line!()),
            result,
        })
    };
}
