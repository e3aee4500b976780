//! [`Device`]：所有 GPU 资源的拥有者
//!
//! 资源通过 `create_*` 创建，返回带代数的 handle；通过 `destroy_*` 销毁。
//! 录制命令需要先创建 context，然后 `begin` → 若干操作 → `submit` → `wait`。

use std::{mem::ManuallyDrop, rc::Rc};

use ash::vk;
use itertools::Itertools;

use crate::{
    commands::{command_pool::GfxCommandPool, command_queue::GfxCommandQueue},
    descriptors::{
        descriptor_pool::{GfxDescriptorPool, GfxDescriptorPoolCreateInfo},
        sampler::GfxSampler,
    },
    device::context::GfxContext,
    error::GfxResult,
    foundation::{
        debug_messenger::GfxDebugMsger, device::GfxDevice, instance::GfxInstance, mem_allocator::GfxMemAllocator,
        physical_device::GfxPhysicalDevice,
    },
    pipelines::{compute_pipeline::GfxPipeline, shader::GfxShader},
    resources::{
        buffer::GfxBuffer,
        handles::{BufferTag, ContextTag, ImageTag, PipelineTag, SamplerTag, ShaderTag},
        image::GfxImage,
        pool::Pool,
    },
};

pub mod context;
pub mod dispatch;
pub mod resources;
pub mod state_tracking;
pub mod transfer;

#[cfg(test)]
mod tests;

#[derive(Clone, Debug)]
pub struct DeviceDesc {
    /// 开启 VK_LAYER_KHRONOS_validation，layer 不存在时只输出警告
    pub enable_validation_layers: bool,
    pub app_name: String,
}

impl Default for DeviceDesc {
    fn default() -> Self {
        Self {
            enable_validation_layers: false,
            app_name: "fotorite".to_string(),
        }
    }
}

/// GPU 设备以及其上的所有资源
///
/// 内部使用 `Rc`，因此既不是 `Send` 也不是 `Sync`，调用方需要自行串行化访问。
///
/// 资源状态是按照录制顺序追踪的：同时有多个 context 在执行且访问同一个资源时，状态追踪是不正确的。
pub struct Device {
    pub(crate) shaders: Pool<GfxShader, ShaderTag>,
    pub(crate) buffers: Pool<GfxBuffer, BufferTag>,
    pub(crate) images: Pool<GfxImage, ImageTag>,
    pub(crate) samplers: Pool<GfxSampler, SamplerTag>,
    pub(crate) pipelines: Pool<GfxPipeline, PipelineTag>,
    pub(crate) contexts: Pool<GfxContext, ContextTag>,

    pub(crate) descriptor_pool: GfxDescriptorPool,
    pub(crate) command_pool: GfxCommandPool,
    /// 需要在 gfx_device 之前销毁
    pub(crate) allocator: ManuallyDrop<GfxMemAllocator>,
    pub(crate) queue: GfxCommandQueue,
    pub(crate) gfx_device: Rc<GfxDevice>,
    pub(crate) pdevice: GfxPhysicalDevice,
    debug_msger: Option<GfxDebugMsger>,
    instance: GfxInstance,
    _entry: ash::Entry,

    /// span 需要一个正在运行的 client
    _tracy: tracy_client::Client,
}

// new & init
impl Device {
    pub fn new(desc: &DeviceDesc) -> GfxResult<Self> {
        let tracy = tracy_client::Client::start();
        let _span = tracy_client::span!("Device::new");

        let entry = unsafe { ash::Entry::load() }?;
        let mut instance = GfxInstance::new(&entry, &desc.app_name, desc.enable_validation_layers)?;

        let mut debug_msger = None;
        if instance.debug_utils_enabled() {
            match GfxDebugMsger::new(&entry, instance.ash_instance()) {
                Ok(msger) => debug_msger = Some(msger),
                Err(e) => {
                    instance.destroy();
                    return Err(e);
                }
            }
        }

        match Self::init_device(&instance) {
            Ok((pdevice, gfx_device, queue, allocator, command_pool, descriptor_pool)) => Ok(Self {
                shaders: Pool::new(),
                buffers: Pool::new(),
                images: Pool::new(),
                samplers: Pool::new(),
                pipelines: Pool::new(),
                contexts: Pool::new(),

                descriptor_pool,
                command_pool,
                allocator: ManuallyDrop::new(allocator),
                queue,
                gfx_device,
                pdevice,
                debug_msger,
                instance,
                _entry: entry,
                _tracy: tracy,
            }),
            Err(e) => {
                if let Some(msger) = &mut debug_msger {
                    msger.destroy();
                }
                instance.destroy();
                Err(e)
            }
        }
    }

    /// 失败时会销毁这一步中已经创建的对象
    #[allow(clippy::type_complexity)]
    fn init_device(
        instance: &GfxInstance,
    ) -> GfxResult<(
        GfxPhysicalDevice,
        Rc<GfxDevice>,
        GfxCommandQueue,
        GfxMemAllocator,
        GfxCommandPool,
        GfxDescriptorPool,
    )> {
        let pdevice = GfxPhysicalDevice::pick(instance.ash_instance())?;
        let queue_family = pdevice.compute_queue_family.clone();
        log::info!(
            "using gpu: {}, queue family: {}({})",
            pdevice.device_name(),
            queue_family.name,
            queue_family.queue_family_index
        );

        let queue_priorities = [1.0];
        let queue_ci = vk::DeviceQueueCreateInfo::default()
            .queue_family_index(queue_family.queue_family_index)
            .queue_priorities(&queue_priorities);
        let gfx_device = Rc::new(GfxDevice::new(
            instance.ash_instance(),
            pdevice.vk_handle,
            std::slice::from_ref(&queue_ci),
            instance.debug_utils_enabled(),
        )?);

        gfx_device.set_debug_name(&pdevice, pdevice.device_name());
        gfx_device.set_debug_name(gfx_device.as_ref(), "fotorite");
        let queue = GfxCommandQueue::new(gfx_device.clone(), queue_family.clone(), "main");

        match Self::init_device_objects(instance, &pdevice, &gfx_device) {
            Ok((allocator, command_pool, descriptor_pool)) => {
                Ok((pdevice, gfx_device, queue, allocator, command_pool, descriptor_pool))
            }
            Err(e) => {
                gfx_device.destroy();
                Err(e)
            }
        }
    }

    fn init_device_objects(
        instance: &GfxInstance,
        pdevice: &GfxPhysicalDevice,
        gfx_device: &Rc<GfxDevice>,
    ) -> GfxResult<(GfxMemAllocator, GfxCommandPool, GfxDescriptorPool)> {
        let allocator = GfxMemAllocator::new(instance.ash_instance(), pdevice.vk_handle, gfx_device)?;

        let mut command_pool = match GfxCommandPool::new(
            gfx_device.clone(),
            pdevice.compute_queue_family.clone(),
            vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            "contexts",
        ) {
            Ok(pool) => pool,
            Err(e) => {
                drop(allocator);
                return Err(e);
            }
        };

        let descriptor_pool = match GfxDescriptorPool::new(
            gfx_device.clone(),
            &GfxDescriptorPoolCreateInfo::transient_sets(),
            "transient-sets",
        ) {
            Ok(pool) => pool,
            Err(e) => {
                command_pool.destroy();
                drop(allocator);
                return Err(e);
            }
        };

        Ok((allocator, command_pool, descriptor_pool))
    }
}

// getters
impl Device {
    #[inline]
    pub fn gfx_device(&self) -> &Rc<GfxDevice> {
        &self.gfx_device
    }

    #[inline]
    pub fn physical_device(&self) -> &GfxPhysicalDevice {
        &self.pdevice
    }

    #[inline]
    pub fn validation_enabled(&self) -> bool {
        self.debug_msger.is_some()
    }

    #[inline]
    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    #[inline]
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    #[inline]
    pub fn live_images(&self) -> usize {
        self.images.len()
    }

    #[inline]
    pub fn live_samplers(&self) -> usize {
        self.samplers.len()
    }

    #[inline]
    pub fn live_pipelines(&self) -> usize {
        self.pipelines.len()
    }

    #[inline]
    pub fn live_contexts(&self) -> usize {
        self.contexts.len()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        let _span = tracy_client::span!("Device::drop");
        log::info!("destroying device");

        if let Err(e) = self.gfx_device.wait_idle() {
            log::error!("failed to wait device idle: {}", e);
        }

        for ctx in self.contexts.handles().collect_vec() {
            self.destroy_context(ctx);
        }
        for pipeline in self.pipelines.handles().collect_vec() {
            self.destroy_pipeline(pipeline);
        }
        for shader in self.shaders.handles().collect_vec() {
            self.destroy_shader(shader);
        }
        for sampler in self.samplers.handles().collect_vec() {
            self.destroy_sampler(sampler);
        }
        for image in self.images.handles().collect_vec() {
            self.destroy_image(image);
        }
        for buffer in self.buffers.handles().collect_vec() {
            self.destroy_buffer(buffer);
        }

        self.descriptor_pool.destroy();
        self.command_pool.destroy();
        unsafe {
            ManuallyDrop::drop(&mut self.allocator);
        }
        self.gfx_device.destroy();
        if let Some(msger) = &mut self.debug_msger {
            msger.destroy();
        }
        self.instance.destroy();
    }
}
