use ash::vk;
use itertools::Itertools;

/// 对 vk::WriteDescriptorSet 的封装，持有 buffer info 以及 image info 的所有权
pub struct GfxWriteDescriptorSet {
    pub dst_set: vk::DescriptorSet,
    pub dst_binding: u32,
    pub dst_array_element: u32,
    pub descriptor_type: vk::DescriptorType,

    pub buffer_infos: Vec<vk::DescriptorBufferInfo>,
    pub image_infos: Vec<vk::DescriptorImageInfo>,
}
impl GfxWriteDescriptorSet {
    pub fn buffer(
        dst_set: vk::DescriptorSet,
        dst_binding: u32,
        descriptor_type: vk::DescriptorType,
        buffers: Vec<vk::DescriptorBufferInfo>,
    ) -> Self {
        Self {
            dst_set,
            dst_binding,
            dst_array_element: 0,
            descriptor_type,
            buffer_infos: buffers,
            image_infos: vec![],
        }
    }

    pub fn image(
        dst_set: vk::DescriptorSet,
        dst_binding: u32,
        descriptor_type: vk::DescriptorType,
        images: Vec<vk::DescriptorImageInfo>,
    ) -> Self {
        Self {
            dst_set,
            dst_binding,
            dst_array_element: 0,
            descriptor_type,
            buffer_infos: vec![],
            image_infos: images,
        }
    }

    pub fn to_vk_type(&self) -> vk::WriteDescriptorSet<'_> {
        assert!(
            self.buffer_infos.is_empty() != self.image_infos.is_empty(),
            "Only one of buffer_infos or image_infos should be set in GfxWriteDescriptorSet"
        );

        let write = vk::WriteDescriptorSet::default()
            .dst_set(self.dst_set)
            .dst_binding(self.dst_binding)
            .dst_array_element(self.dst_array_element)
            .descriptor_type(self.descriptor_type);
        // 选择 buffer ptr 还是 image ptr，是由 descriptor type 控制的
        if self.buffer_infos.is_empty() {
            write.image_info(&self.image_infos)
        } else {
            write.buffer_info(&self.buffer_infos)
        }
    }

    pub fn with_writes(writes: &[Self], cbk: impl FnOnce(&[vk::WriteDescriptorSet])) {
        let writes = writes.iter().map(|w| w.to_vk_type()).collect_vec();
        cbk(&writes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_write() {
        let write = GfxWriteDescriptorSet::buffer(
            vk::DescriptorSet::null(),
            2,
            vk::DescriptorType::STORAGE_BUFFER,
            vec![vk::DescriptorBufferInfo {
                buffer: vk::Buffer::null(),
                offset: 0,
                range: vk::WHOLE_SIZE,
            }],
        );
        let vk_write = write.to_vk_type();
        assert_eq!(vk_write.dst_binding, 2);
        assert_eq!(vk_write.descriptor_count, 1);
        assert_eq!(vk_write.descriptor_type, vk::DescriptorType::STORAGE_BUFFER);
        assert!(!vk_write.p_buffer_info.is_null());
    }

    #[test]
    fn test_sampler_write() {
        let write = GfxWriteDescriptorSet::image(
            vk::DescriptorSet::null(),
            0,
            vk::DescriptorType::SAMPLER,
            vec![vk::DescriptorImageInfo::default().sampler(vk::Sampler::null())],
        );
        GfxWriteDescriptorSet::with_writes(&[write], |writes| {
            assert_eq!(writes.len(), 1);
            assert_eq!(writes[0].descriptor_count, 1);
            assert!(!writes[0].p_image_info.is_null());
        });
    }

    #[test]
    #[should_panic(expected = "Only one of buffer_infos or image_infos")]
    fn test_empty_write() {
        let write =
            GfxWriteDescriptorSet::buffer(vk::DescriptorSet::null(), 0, vk::DescriptorType::UNIFORM_BUFFER, vec![]);
        let _ = write.to_vk_type();
    }
}
