//! fotorite 的 GFX 层
//!
//! 在 Vulkan 之上提供一个很薄的资源管理层：
//! - 所有资源（shader、buffer、image、sampler、pipeline、context）都存放在 [`resources::pool::Pool`] 中，
//!   外部只持有带代数的 [`resources::handles::Handle`]
//! - [`device::Device`] 负责资源的创建与销毁、context 的生命周期、数据传输以及 compute dispatch
//! - buffer 的 [`resources::resource_state::ResourceState`] 会被自动追踪，并在使用前插入 barrier
//!
//! `Device` 不是线程安全的，调用方需要自行串行化访问。

pub mod basic;
pub mod commands;
pub mod descriptors;
pub mod device;
pub mod error;
pub mod foundation;
pub mod pipelines;
pub mod resources;

pub use device::{
    Device, DeviceDesc,
    context::{ContextState, TransientResource},
    dispatch::DispatchDesc,
};
pub use error::{GfxError, GfxResult};
