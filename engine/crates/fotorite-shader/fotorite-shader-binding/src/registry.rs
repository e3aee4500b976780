/// 所有预编译 shader 的标识
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShaderId {
    /// `result[i] = a[i] + b[i]`，每个 group 64 个线程
    ///
    /// - binding 0: `StructuredBuffer<float> a`
    /// - binding 1: `StructuredBuffer<float> b`
    /// - binding 2: `RWStructuredBuffer<float> result`
    /// - push constant: [`crate::TestBufferPushConstant`]
    TestBufferCs,
    /// `dst = src * 2 + 1`，每个 group 32x32 个线程
    ///
    /// - binding 0: `Texture2D<float4> src`
    /// - binding 1: `RWTexture2D<float4> dst`
    /// - push constant: [`crate::TestImagePushConstant`]
    TestImageCs,
}

impl ShaderId {
    pub const ALL: [ShaderId; 2] = [ShaderId::TestBufferCs, ShaderId::TestImageCs];

    /// shader 的入口函数
    #[inline]
    pub fn entry_point(self) -> &'static str {
        "main"
    }

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            ShaderId::TestBufferCs => "test_buffer_cs",
            ShaderId::TestImageCs => "test_image_cs",
        }
    }
}

/// shader blob 的来源
///
/// 生产环境使用 [`EmbeddedShaders`]，测试中可以提供自己的实现。
pub trait ShaderBlobProvider {
    /// 返回 SPIR-V 字节码
    fn get_shader_blob(&self, id: ShaderId) -> &[u8];
}

/// 嵌入在二进制中的 shader
#[derive(Default, Clone, Copy)]
pub struct EmbeddedShaders;

static TEST_BUFFER_CS: &[u8] = include_bytes!("../shaders/compiled/test_buffer_cs.spv");
static TEST_IMAGE_CS: &[u8] = include_bytes!("../shaders/compiled/test_image_cs.spv");

impl EmbeddedShaders {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl ShaderBlobProvider for EmbeddedShaders {
    fn get_shader_blob(&self, id: ShaderId) -> &[u8] {
        match id {
            ShaderId::TestBufferCs => TEST_BUFFER_CS,
            ShaderId::TestImageCs => TEST_IMAGE_CS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPIRV_MAGIC: u32 = 0x0723_0203;

    #[test]
    fn test_embedded_blobs_are_spirv() {
        let shaders = EmbeddedShaders::new();
        for id in ShaderId::ALL {
            let blob = shaders.get_shader_blob(id);
            assert!(blob.len() >= 20, "{} is too short", id.name());
            assert_eq!(blob.len() % 4, 0, "{} is not word aligned", id.name());

            let magic = u32::from_le_bytes([blob[0], blob[1], blob[2], blob[3]]);
            assert_eq!(magic, SPIRV_MAGIC, "{} has a bad magic number", id.name());
        }
    }

    #[test]
    fn test_blobs_are_distinct() {
        let shaders = EmbeddedShaders::new();
        assert_ne!(
            shaders.get_shader_blob(ShaderId::TestBufferCs),
            shaders.get_shader_blob(ShaderId::TestImageCs)
        );
    }

    struct FakeShaders;
    impl ShaderBlobProvider for FakeShaders {
        fn get_shader_blob(&self, _id: ShaderId) -> &[u8] {
            &[]
        }
    }

    #[test]
    fn test_registry_can_be_replaced() {
        fn blob_len(provider: &impl ShaderBlobProvider) -> usize {
            provider.get_shader_blob(ShaderId::TestBufferCs).len()
        }
        assert_eq!(blob_len(&FakeShaders), 0);
        assert!(blob_len(&EmbeddedShaders) > 0);
    }
}
