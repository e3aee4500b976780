use fotorite_shader_binding::{ShaderBlobProvider, ShaderId};

use crate::{
    descriptors::sampler::{GfxSampler, SamplerDesc},
    device::Device,
    error::GfxResult,
    pipelines::{
        compute_pipeline::{GfxPipeline, PipelineDesc},
        shader::{GfxShader, ShaderDesc},
    },
    resources::{
        buffer::{BufferDesc, GfxBuffer},
        handles::{BufferHandle, ImageHandle, PipelineHandle, SamplerHandle, ShaderHandle},
        image::{GfxImage, ImageDesc},
    },
};

// 资源的创建
//
// 原生对象都在分配 slot 之前创建，失败时不会占用 slot
impl Device {
    pub fn create_shader(&mut self, desc: &ShaderDesc) -> GfxResult<ShaderHandle> {
        let shader = GfxShader::new(&self.gfx_device, desc, desc.entry_point)?;
        let handle = self.shaders.alloc(shader);
        log::debug!("create shader {:?}", handle);
        Ok(handle)
    }

    /// 从 registry 中取出 SPIR-V，入口函数由 [`ShaderId::entry_point`] 决定
    pub fn create_shader_from_registry(
        &mut self,
        registry: &impl ShaderBlobProvider,
        id: ShaderId,
    ) -> GfxResult<ShaderHandle> {
        let desc = ShaderDesc {
            code: registry.get_shader_blob(id),
            entry_point: id.entry_point(),
        };
        let shader = GfxShader::new(&self.gfx_device, &desc, id.name())?;
        let handle = self.shaders.alloc(shader);
        log::debug!("create shader {:?} from {}", handle, id.name());
        Ok(handle)
    }

    pub fn create_buffer(&mut self, desc: &BufferDesc) -> GfxResult<BufferHandle> {
        let _span = tracy_client::span!("Device::create_buffer");
        let buffer = GfxBuffer::new(
            &self.gfx_device,
            &self.allocator,
            &self.pdevice.mem_props,
            desc,
            format!("{}-{:?}", desc.size, desc.memory),
        )?;
        let handle = self.buffers.alloc(buffer);
        log::debug!("create buffer {:?}: {:?}", handle, desc);
        Ok(handle)
    }

    /// 只记录描述，不会创建 vk::Image
    pub fn create_image(&mut self, desc: &ImageDesc) -> ImageHandle {
        let handle = self.images.alloc(GfxImage::new(desc));
        log::debug!("create image {:?}: {:?}", handle, desc);
        handle
    }

    pub fn create_sampler(&mut self, desc: &SamplerDesc) -> GfxResult<SamplerHandle> {
        let sampler = GfxSampler::new(&self.gfx_device, desc, "sampler")?;
        let handle = self.samplers.alloc(sampler);
        log::debug!("create sampler {:?}: {:?}", handle, desc);
        Ok(handle)
    }

    /// shader handle 无效时 panic
    pub fn create_pipeline(&mut self, desc: &PipelineDesc) -> GfxResult<PipelineHandle> {
        let shader = self.shaders.get(desc.shader).unwrap_or_else(|| panic!("invalid shader handle {:?}", desc.shader));
        let pipeline = GfxPipeline::new(&self.gfx_device, desc, shader, "compute")?;
        let handle = self.pipelines.alloc(pipeline);
        log::debug!("create pipeline {:?} with shader {:?}", handle, desc.shader);
        Ok(handle)
    }
}

// 资源的销毁
//
// 无效的 handle 直接忽略
impl Device {
    pub fn destroy_shader(&mut self, handle: ShaderHandle) {
        if let Some(shader) = self.shaders.free(handle) {
            shader.destroy(&self.gfx_device);
            log::debug!("destroy shader {:?}", handle);
        }
    }

    pub fn destroy_buffer(&mut self, handle: BufferHandle) {
        if let Some(buffer) = self.buffers.free(handle) {
            buffer.destroy(&self.allocator);
            log::debug!("destroy buffer {:?}", handle);
        }
    }

    pub fn destroy_image(&mut self, handle: ImageHandle) {
        if self.images.free(handle).is_some() {
            log::debug!("destroy image {:?}", handle);
        }
    }

    pub fn destroy_sampler(&mut self, handle: SamplerHandle) {
        if let Some(sampler) = self.samplers.free(handle) {
            sampler.destroy(&self.gfx_device);
            log::debug!("destroy sampler {:?}", handle);
        }
    }

    pub fn destroy_pipeline(&mut self, handle: PipelineHandle) {
        if let Some(pipeline) = self.pipelines.free(handle) {
            pipeline.destroy(&self.gfx_device);
            log::debug!("destroy pipeline {:?}", handle);
        }
    }
}

// getters
impl Device {
    #[inline]
    pub fn buffer(&self, handle: BufferHandle) -> Option<&GfxBuffer> {
        self.buffers.get(handle)
    }

    #[inline]
    pub fn image(&self, handle: ImageHandle) -> Option<&GfxImage> {
        self.images.get(handle)
    }

    #[inline]
    pub fn sampler(&self, handle: SamplerHandle) -> Option<&GfxSampler> {
        self.samplers.get(handle)
    }

    #[inline]
    pub fn pipeline(&self, handle: PipelineHandle) -> Option<&GfxPipeline> {
        self.pipelines.get(handle)
    }

    #[inline]
    pub fn shader(&self, handle: ShaderHandle) -> Option<&GfxShader> {
        self.shaders.get(handle)
    }

    /// handle 无效时 panic
    #[inline]
    pub(crate) fn buffer_ref(&self, handle: BufferHandle) -> &GfxBuffer {
        self.buffers.get(handle).unwrap_or_else(|| panic!("invalid buffer handle {:?}", handle))
    }
}
