use ash::vk;
use itertools::Itertools;

use crate::{
    descriptors::binding::{BindingLayoutEntry, validate_binding_layout},
    error::{GfxError, GfxResult},
    foundation::{debug_messenger::DebugType, device::GfxDevice},
    pipelines::shader::GfxShader,
    resources::handles::ShaderHandle,
    vk_check,
};

#[derive(Clone, Debug)]
pub struct PipelineDesc {
    pub shader: ShaderHandle,
    pub binding_layout: Vec<BindingLayoutEntry>,
    /// push constant 的字节数，0 表示没有 push constant
    pub push_constants_size: u32,
}

/// compute pipeline 以及它的 set layout、pipeline layout
///
/// 只有一个 descriptor set，位于 set 0
pub struct GfxPipeline {
    shader: ShaderHandle,
    binding_layout: Vec<BindingLayoutEntry>,
    push_constants_size: u32,

    set_layout: vk::DescriptorSetLayout,
    pipeline_layout: vk::PipelineLayout,
    pipeline: vk::Pipeline,
}

// new & destroy
impl GfxPipeline {
    /// 任意一步失败时，会销毁之前创建的对象
    pub fn new(device: &GfxDevice, desc: &PipelineDesc, shader: &GfxShader, debug_name: &str) -> GfxResult<Self> {
        let _span = tracy_client::span!("GfxPipeline::new");

        validate_binding_layout(&desc.binding_layout);
        assert!(
            desc.push_constants_size % 4 == 0,
            "push constant size must be a multiple of 4, got {}",
            desc.push_constants_size
        );

        let vk_bindings = desc.binding_layout.iter().map(BindingLayoutEntry::to_vk_binding).collect_vec();
        let set_layout_ci = vk::DescriptorSetLayoutCreateInfo::default().bindings(&vk_bindings);
        let set_layout = unsafe { vk_check!(device.create_descriptor_set_layout(&set_layout_ci, None)) }?;

        let push_constant_range = vk::PushConstantRange::default()
            .stage_flags(vk::ShaderStageFlags::COMPUTE)
            .offset(0)
            .size(desc.push_constants_size);
        let push_constant_ranges: &[vk::PushConstantRange] =
            if desc.push_constants_size > 0 { std::slice::from_ref(&push_constant_range) } else { &[] };

        let pipeline_layout_ci = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(std::slice::from_ref(&set_layout))
            .push_constant_ranges(push_constant_ranges);
        let pipeline_layout = match unsafe { vk_check!(device.create_pipeline_layout(&pipeline_layout_ci, None)) } {
            Ok(layout) => layout,
            Err(e) => {
                unsafe { device.destroy_descriptor_set_layout(set_layout, None) };
                return Err(e);
            }
        };

        let stage_info = vk::PipelineShaderStageCreateInfo::default()
            .module(shader.handle())
            .stage(vk::ShaderStageFlags::COMPUTE)
            .name(shader.entry_point());
        let pipeline_ci = vk::ComputePipelineCreateInfo::default().stage(stage_info).layout(pipeline_layout);
        let pipeline = unsafe {
            device.create_compute_pipelines(vk::PipelineCache::null(), std::slice::from_ref(&pipeline_ci), None)
        };
        let pipeline = match pipeline {
            Ok(pipelines) => pipelines[0],
            Err((_, result)) => {
                unsafe {
                    device.destroy_pipeline_layout(pipeline_layout, None);
                    device.destroy_descriptor_set_layout(set_layout, None);
                }
                return Err(GfxError::Vk {
                    call: "create_compute_pipelines",
                    site: concat!(file!(), ":", line!()),
                    result,
                });
            }
        };

        let pipeline = Self {
            shader: desc.shader,
            binding_layout: desc.binding_layout.clone(),
            push_constants_size: desc.push_constants_size,
            set_layout,
            pipeline_layout,
            pipeline,
        };
        device.set_debug_name(&pipeline, debug_name);
        Ok(pipeline)
    }

    /// 与创建顺序相反
    pub fn destroy(self, device: &GfxDevice) {
        unsafe {
            device.destroy_pipeline(self.pipeline, None);
            device.destroy_pipeline_layout(self.pipeline_layout, None);
            device.destroy_descriptor_set_layout(self.set_layout, None);
        }
    }
}

// getters
impl GfxPipeline {
    #[inline]
    pub fn shader(&self) -> ShaderHandle {
        self.shader
    }

    #[inline]
    pub fn binding_layout(&self) -> &[BindingLayoutEntry] {
        &self.binding_layout
    }

    #[inline]
    pub fn push_constants_size(&self) -> u32 {
        self.push_constants_size
    }

    #[inline]
    pub fn set_layout(&self) -> vk::DescriptorSetLayout {
        self.set_layout
    }

    #[inline]
    pub fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }

    #[inline]
    pub fn vk_pipeline(&self) -> vk::Pipeline {
        self.pipeline
    }
}

impl DebugType for GfxPipeline {
    fn debug_type_name() -> &'static str {
        "GfxPipeline"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.pipeline
    }
}
