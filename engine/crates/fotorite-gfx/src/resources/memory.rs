use ash::vk;

/// 在 memory type 列表中找到第一个满足条件的 memory type
///
/// - `type_bits`: 来自 `vk::MemoryRequirements::memory_type_bits`，第 i 位表示第 i 个 memory type 可用
/// - `required`: 必须具备的属性
pub fn find_memory_type(
    mem_props: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    required: vk::MemoryPropertyFlags,
) -> Option<u32> {
    let count = (mem_props.memory_type_count as usize).min(vk::MAX_MEMORY_TYPES);
    mem_props.memory_types[..count]
        .iter()
        .enumerate()
        .find(|(idx, memory_type)| type_bits & (1 << idx) != 0 && memory_type.property_flags.contains(required))
        .map(|(idx, _)| idx as u32)
}
