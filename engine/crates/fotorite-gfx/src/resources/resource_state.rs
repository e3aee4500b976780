//! 资源状态定义
//!
//! 将资源在某个 pass 中的用途映射到 Vulkan 的 pipeline stage、access mask 和 image layout，
//! 用于自动计算 barrier。

use ash::vk;

use crate::commands::barrier::GfxBarrierMask;

/// 资源当前所处的用途
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// 初始状态，不关心内容
    #[default]
    Undefined,
    /// 作为 uniform buffer 读取
    ConstantBuffer,
    /// 在 shader 中读写
    UnorderedAccess,
    /// 在 shader 中只读
    ShaderResource,
    /// 传输源
    TransferSrc,
    /// 传输目标
    TransferDst,
}

/// 某个状态下访问资源所需的 stage、access 以及 layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateAccess {
    pub stage: vk::PipelineStageFlags2,
    pub access: vk::AccessFlags2,
    /// 只对 image 有意义
    pub layout: vk::ImageLayout,
}

impl StateAccess {
    #[inline]
    pub const fn new(stage: vk::PipelineStageFlags2, access: vk::AccessFlags2, layout: vk::ImageLayout) -> Self {
        Self { stage, access, layout }
    }
}

impl ResourceState {
    pub const ALL: [Self; 6] = [
        Self::Undefined,
        Self::ConstantBuffer,
        Self::UnorderedAccess,
        Self::ShaderResource,
        Self::TransferSrc,
        Self::TransferDst,
    ];

    /// 状态表
    pub const fn access_info(self) -> StateAccess {
        match self {
            Self::Undefined => StateAccess::new(
                vk::PipelineStageFlags2::TOP_OF_PIPE,
                vk::AccessFlags2::NONE,
                vk::ImageLayout::UNDEFINED,
            ),
            Self::ConstantBuffer => StateAccess::new(
                vk::PipelineStageFlags2::COMPUTE_SHADER,
                vk::AccessFlags2::UNIFORM_READ,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            ),
            Self::UnorderedAccess => StateAccess::new(
                vk::PipelineStageFlags2::COMPUTE_SHADER,
                vk::AccessFlags2::from_raw(
                    vk::AccessFlags2::SHADER_STORAGE_READ.as_raw() | vk::AccessFlags2::SHADER_STORAGE_WRITE.as_raw(),
                ),
                vk::ImageLayout::GENERAL,
            ),
            Self::ShaderResource => StateAccess::new(
                vk::PipelineStageFlags2::COMPUTE_SHADER,
                vk::AccessFlags2::SHADER_READ,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            ),
            Self::TransferSrc => StateAccess::new(
                vk::PipelineStageFlags2::TRANSFER,
                vk::AccessFlags2::TRANSFER_READ,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            ),
            Self::TransferDst => StateAccess::new(
                vk::PipelineStageFlags2::TRANSFER,
                vk::AccessFlags2::TRANSFER_WRITE,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            ),
        }
    }

    /// 从当前状态切换到 `new_state` 所需的 barrier mask
    ///
    /// 即使两个状态相同也会返回完整的 mask：barrier 总是会被插入
    #[inline]
    pub fn transition_mask(self, new_state: ResourceState) -> GfxBarrierMask {
        let src = self.access_info();
        let dst = new_state.access_info();
        GfxBarrierMask {
            src_stage: src.stage,
            dst_stage: dst.stage,
            src_access: src.access,
            dst_access: dst.access,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_table() {
        let undefined = ResourceState::Undefined.access_info();
        assert_eq!(undefined.stage, vk::PipelineStageFlags2::TOP_OF_PIPE);
        assert_eq!(undefined.access, vk::AccessFlags2::NONE);
        assert_eq!(undefined.layout, vk::ImageLayout::UNDEFINED);

        let uav = ResourceState::UnorderedAccess.access_info();
        assert_eq!(uav.stage, vk::PipelineStageFlags2::COMPUTE_SHADER);
        assert!(uav.access.contains(vk::AccessFlags2::SHADER_STORAGE_READ));
        assert!(uav.access.contains(vk::AccessFlags2::SHADER_STORAGE_WRITE));
        assert_eq!(uav.layout, vk::ImageLayout::GENERAL);

        assert_eq!(ResourceState::ShaderResource.access_info().layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        assert_eq!(ResourceState::ConstantBuffer.access_info().access, vk::AccessFlags2::UNIFORM_READ);
        assert_eq!(ResourceState::TransferSrc.access_info().layout, vk::ImageLayout::TRANSFER_SRC_OPTIMAL);
        assert_eq!(ResourceState::TransferDst.access_info().access, vk::AccessFlags2::TRANSFER_WRITE);
    }

    #[test]
    fn test_transition_mask() {
        let mask = ResourceState::UnorderedAccess.transition_mask(ResourceState::TransferSrc);
        assert_eq!(mask.src_stage, vk::PipelineStageFlags2::COMPUTE_SHADER);
        assert_eq!(mask.dst_stage, vk::PipelineStageFlags2::TRANSFER);
        assert!(mask.src_access.contains(vk::AccessFlags2::SHADER_STORAGE_WRITE));
        assert_eq!(mask.dst_access, vk::AccessFlags2::TRANSFER_READ);
    }

    #[test]
    fn test_same_state_transition_is_not_empty() {
        for state in ResourceState::ALL {
            let mask = state.transition_mask(state);
            let info = state.access_info();
            assert_eq!(mask.src_stage, info.stage);
            assert_eq!(mask.dst_stage, info.stage);
        }
    }
}
