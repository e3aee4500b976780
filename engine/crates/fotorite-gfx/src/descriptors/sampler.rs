use ash::vk;

use crate::{
    error::GfxResult,
    foundation::{debug_messenger::DebugType, device::GfxDevice},
    vk_check,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SamplerFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SamplerMipMapMode {
    Nearest,
    #[default]
    Linear,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SamplerAddressMode {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
    MirrorClampToEdge,
}

impl SamplerFilter {
    #[inline]
    pub fn to_vk(self) -> vk::Filter {
        match self {
            Self::Nearest => vk::Filter::NEAREST,
            Self::Linear => vk::Filter::LINEAR,
        }
    }
}

impl SamplerMipMapMode {
    #[inline]
    pub fn to_vk(self) -> vk::SamplerMipmapMode {
        match self {
            Self::Nearest => vk::SamplerMipmapMode::NEAREST,
            Self::Linear => vk::SamplerMipmapMode::LINEAR,
        }
    }
}

impl SamplerAddressMode {
    #[inline]
    pub fn to_vk(self) -> vk::SamplerAddressMode {
        match self {
            Self::Repeat => vk::SamplerAddressMode::REPEAT,
            Self::MirroredRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
            Self::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
            Self::ClampToBorder => vk::SamplerAddressMode::CLAMP_TO_BORDER,
            Self::MirrorClampToEdge => vk::SamplerAddressMode::MIRROR_CLAMP_TO_EDGE,
        }
    }
}

/// 默认配置：linear，repeat
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SamplerDesc {
    pub mag_filter: SamplerFilter,
    pub min_filter: SamplerFilter,
    pub mip_map_mode: SamplerMipMapMode,
    pub address_mode_u: SamplerAddressMode,
    pub address_mode_v: SamplerAddressMode,
    pub address_mode_w: SamplerAddressMode,
}

impl SamplerDesc {
    pub fn to_vk_create_info(&self) -> vk::SamplerCreateInfo<'static> {
        vk::SamplerCreateInfo::default()
            .mag_filter(self.mag_filter.to_vk())
            .min_filter(self.min_filter.to_vk())
            .mipmap_mode(self.mip_map_mode.to_vk())
            .address_mode_u(self.address_mode_u.to_vk())
            .address_mode_v(self.address_mode_v.to_vk())
            .address_mode_w(self.address_mode_w.to_vk())
            .anisotropy_enable(false)
            .max_anisotropy(1.0)
            .border_color(vk::BorderColor::FLOAT_TRANSPARENT_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE)
    }
}

pub struct GfxSampler {
    handle: vk::Sampler,
    desc: SamplerDesc,
}
impl DebugType for GfxSampler {
    fn debug_type_name() -> &'static str {
        "GfxSampler"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

impl GfxSampler {
    pub fn new(device: &GfxDevice, desc: &SamplerDesc, debug_name: &str) -> GfxResult<Self> {
        let handle = unsafe { vk_check!(device.create_sampler(&desc.to_vk_create_info(), None)) }?;
        let sampler = Self { handle, desc: *desc };
        device.set_debug_name(&sampler, debug_name);
        Ok(sampler)
    }

    #[inline]
    pub fn destroy(self, device: &GfxDevice) {
        unsafe {
            device.destroy_sampler(self.handle, None);
        }
    }

    /// getter
    #[inline]
    pub fn handle(&self) -> vk::Sampler {
        self.handle
    }

    #[inline]
    pub fn desc(&self) -> &SamplerDesc {
        &self.desc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_enum_maps() {
        assert_eq!(SamplerFilter::Nearest.to_vk(), vk::Filter::NEAREST);
        assert_eq!(SamplerFilter::Linear.to_vk(), vk::Filter::LINEAR);
        assert_eq!(SamplerMipMapMode::Nearest.to_vk(), vk::SamplerMipmapMode::NEAREST);
        assert_eq!(SamplerMipMapMode::Linear.to_vk(), vk::SamplerMipmapMode::LINEAR);

        let address_modes = [
            (SamplerAddressMode::Repeat, vk::SamplerAddressMode::REPEAT),
            (SamplerAddressMode::MirroredRepeat, vk::SamplerAddressMode::MIRRORED_REPEAT),
            (SamplerAddressMode::ClampToEdge, vk::SamplerAddressMode::CLAMP_TO_EDGE),
            (SamplerAddressMode::ClampToBorder, vk::SamplerAddressMode::CLAMP_TO_BORDER),
            (SamplerAddressMode::MirrorClampToEdge, vk::SamplerAddressMode::MIRROR_CLAMP_TO_EDGE),
        ];
        for (mode, vk_mode) in address_modes {
            assert_eq!(mode.to_vk(), vk_mode);
        }
    }

    #[test]
    fn test_sampler_create_info() {
        let desc = SamplerDesc {
            mag_filter: SamplerFilter::Linear,
            min_filter: SamplerFilter::Nearest,
            address_mode_v: SamplerAddressMode::ClampToEdge,
            ..Default::default()
        };
        let info = desc.to_vk_create_info();
        assert_eq!(info.mag_filter, vk::Filter::LINEAR);
        assert_eq!(info.min_filter, vk::Filter::NEAREST);
        assert_eq!(info.mipmap_mode, vk::SamplerMipmapMode::LINEAR);
        assert_eq!(info.address_mode_u, vk::SamplerAddressMode::REPEAT);
        assert_eq!(info.address_mode_v, vk::SamplerAddressMode::CLAMP_TO_EDGE);
        assert_eq!(info.anisotropy_enable, vk::FALSE);
        assert_eq!(info.max_lod, vk::LOD_CLAMP_NONE);
    }
}
