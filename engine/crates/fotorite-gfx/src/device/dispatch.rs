use ash::vk;
use itertools::Itertools;

use crate::{
    basic::color::LabelColor,
    descriptors::{
        binding::{Binding, BindingLayoutEntry, DescriptorType, ResourceRef, validate_binding_set},
        write_descriptor_set::GfxWriteDescriptorSet,
    },
    device::Device,
    error::{GfxError, GfxResult},
    resources::handles::{ContextHandle, PipelineHandle},
};

/// 一次 compute dispatch
#[derive(Clone, Copy, Debug)]
pub struct DispatchDesc<'a> {
    pub pipeline: PipelineHandle,
    /// 与 pipeline 的 binding layout 一一对应
    pub binding_set: &'a [Binding],
    /// 长度必须等于 pipeline 的 push constant 大小
    pub push_constants: &'a [u8],
    pub group_count: [u32; 3],
}

impl Device {
    /// 录制一次 compute dispatch
    ///
    /// 所有绑定的 buffer 会先切换到 binding 要求的状态，然后分配并写入 descriptor set。
    /// texel buffer 以及 image 的绑定会返回 [`GfxError::Unsupported`]，此时不会录制任何命令
    pub fn dispatch(&mut self, ctx: ContextHandle, desc: &DispatchDesc) -> GfxResult<()> {
        let _span = tracy_client::span!("Device::dispatch");
        self.context(ctx).state.assert_recording();
        assert!(
            desc.group_count.iter().all(|&count| count > 0),
            "group count must be non-zero: {:?}",
            desc.group_count
        );

        let pipeline =
            self.pipelines.get(desc.pipeline).unwrap_or_else(|| panic!("invalid pipeline handle {:?}", desc.pipeline));
        let layout = pipeline.binding_layout().to_vec();
        let push_constants_size = pipeline.push_constants_size();
        let (set_layout, pipeline_layout, vk_pipeline) =
            (pipeline.set_layout(), pipeline.pipeline_layout(), pipeline.vk_pipeline());

        validate_binding_set(&layout, desc.binding_set);
        assert_eq!(
            desc.push_constants.len(),
            push_constants_size as usize,
            "push constant size mismatch: pipeline expects {} bytes",
            push_constants_size
        );
        for (entry, binding) in layout.iter().zip(desc.binding_set) {
            self.check_binding(entry, binding)?;
        }

        // 按照 binding 的顺序插入 barrier
        for (entry, binding) in layout.iter().zip(desc.binding_set) {
            if let (Some(state), ResourceRef::Buffer(buffer)) = (entry.kind.required_state(), binding.resource) {
                self.transition_buffer(ctx, buffer, state);
            }
        }

        let set = self.descriptor_pool.allocate_set(set_layout)?;
        self.context_mut(ctx).add_descriptor_set(set);

        let writes = layout
            .iter()
            .zip(desc.binding_set)
            .map(|(entry, binding)| self.descriptor_write(set, entry, binding))
            .collect_vec();
        GfxWriteDescriptorSet::with_writes(&writes, |writes| unsafe {
            self.gfx_device.update_descriptor_sets(writes, &[]);
        });

        let cmd = &self.context(ctx).command_buffer;
        cmd.begin_label("dispatch", LabelColor::COLOR_DISPATCH);
        cmd.cmd_bind_pipeline(vk::PipelineBindPoint::COMPUTE, vk_pipeline);
        cmd.bind_descriptor_sets(vk::PipelineBindPoint::COMPUTE, pipeline_layout, 0, &[set]);
        if push_constants_size > 0 {
            cmd.cmd_push_constants(pipeline_layout, vk::ShaderStageFlags::COMPUTE, 0, desc.push_constants);
        }
        cmd.cmd_dispatch(glam::UVec3::from_array(desc.group_count));
        cmd.end_label();
        Ok(())
    }

    /// 资源种类与 binding 不匹配或者 handle 无效时 panic
    fn check_binding(&self, entry: &BindingLayoutEntry, binding: &Binding) -> GfxResult<()> {
        use DescriptorType as D;
        if entry.kind.is_texel_buffer() {
            return Err(GfxError::Unsupported("texel buffer descriptors"));
        }
        match (entry.kind, binding.resource) {
            (D::ConstantBuffer | D::StructuredBuffer | D::RWStructuredBuffer, ResourceRef::Buffer(buffer)) => {
                assert!(self.buffers.is_valid(buffer), "binding {}: invalid buffer handle {:?}", entry.binding, buffer);
                Ok(())
            }
            (D::Texture | D::RWTexture, ResourceRef::Image(image)) => {
                assert!(self.images.is_valid(image), "binding {}: invalid image handle {:?}", entry.binding, image);
                Err(GfxError::Unsupported("image descriptors"))
            }
            (D::Sampler, ResourceRef::Sampler(sampler)) => {
                assert!(
                    self.samplers.is_valid(sampler),
                    "binding {}: invalid sampler handle {:?}",
                    entry.binding,
                    sampler
                );
                Ok(())
            }
            (kind, resource) => panic!("binding {}: {:?} cannot be bound as {:?}", entry.binding, resource, kind),
        }
    }

    fn descriptor_write(
        &self,
        set: vk::DescriptorSet,
        entry: &BindingLayoutEntry,
        binding: &Binding,
    ) -> GfxWriteDescriptorSet {
        let descriptor_type = entry.kind.to_vk_descriptor_type();
        match binding.resource {
            ResourceRef::Buffer(buffer) => GfxWriteDescriptorSet::buffer(
                set,
                entry.binding,
                descriptor_type,
                vec![vk::DescriptorBufferInfo {
                    buffer: self.buffer_ref(buffer).vk_buffer(),
                    offset: 0,
                    range: vk::WHOLE_SIZE,
                }],
            ),
            ResourceRef::Sampler(sampler) => {
                let sampler =
                    self.samplers.get(sampler).unwrap_or_else(|| panic!("invalid sampler handle {:?}", sampler));
                GfxWriteDescriptorSet::image(
                    set,
                    entry.binding,
                    descriptor_type,
                    vec![vk::DescriptorImageInfo::default().sampler(sampler.handle())],
                )
            }
            ResourceRef::Image(image) => unreachable!("image {:?} should have been rejected by check_binding", image),
        }
    }
}
