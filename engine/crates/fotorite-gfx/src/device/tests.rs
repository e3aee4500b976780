use fotorite_shader_binding::{EmbeddedShaders, ShaderId, TestBufferPushConstant, TestImagePushConstant};

use crate::{
    descriptors::{
        binding::{Binding, BindingLayoutEntry, DescriptorType},
        sampler::{SamplerDesc, SamplerFilter},
    },
    device::{
        Device, DeviceDesc,
        context::{ContextState, TransientResource},
        dispatch::DispatchDesc,
    },
    error::GfxError,
    pipelines::compute_pipeline::PipelineDesc,
    resources::{
        buffer::BufferDesc,
        handles::{BufferHandle, PipelineHandle},
        image::{Format, ImageDesc},
        resource_state::ResourceState,
        usage::{MemoryType, ResourceUsage},
    },
};

const ELEMENT_COUNT: usize = 1024;
const GROUP_SIZE: u32 = 64;

fn test_device() -> Device {
    fotorite_crate_tools::init_log::init_test_log();
    Device::new(&DeviceDesc {
        enable_validation_layers: true,
        ..Default::default()
    })
    .unwrap()
}

fn storage_buffer(device: &mut Device, size: u64, memory: MemoryType) -> anyhow::Result<BufferHandle> {
    Ok(device.create_buffer(&BufferDesc {
        size,
        usage: ResourceUsage::SHADER_RESOURCE | ResourceUsage::UNORDERED_ACCESS,
        memory,
    })?)
}

fn elementwise_add_pipeline(device: &mut Device, extra: &[BindingLayoutEntry]) -> anyhow::Result<PipelineHandle> {
    let shader = device.create_shader_from_registry(&EmbeddedShaders::new(), ShaderId::TestBufferCs)?;
    let mut binding_layout = vec![
        BindingLayoutEntry::new(0, DescriptorType::StructuredBuffer),
        BindingLayoutEntry::new(1, DescriptorType::StructuredBuffer),
        BindingLayoutEntry::new(2, DescriptorType::RWStructuredBuffer),
    ];
    binding_layout.extend_from_slice(extra);

    Ok(device.create_pipeline(&PipelineDesc {
        shader,
        binding_layout,
        push_constants_size: size_of::<TestBufferPushConstant>() as u32,
    })?)
}

#[test]
#[ignore = "requires a Vulkan device"]
fn test_create_sampler_and_buffer() -> anyhow::Result<()> {
    let mut device = test_device();

    let sampler = device.create_sampler(&SamplerDesc {
        mag_filter: SamplerFilter::Linear,
        min_filter: SamplerFilter::Nearest,
        ..Default::default()
    })?;
    let buffer = storage_buffer(&mut device, 1024, MemoryType::Device)?;
    assert_eq!(device.live_samplers(), 1);
    assert_eq!(device.live_buffers(), 1);

    device.destroy_sampler(sampler);
    device.destroy_buffer(buffer);
    assert_eq!(device.live_samplers(), 0);
    assert_eq!(device.live_buffers(), 0);
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
fn test_host_buffer_round_trip() -> anyhow::Result<()> {
    let mut device = test_device();
    let ctx = device.create_context()?;

    for (len, offset) in [(0usize, 0u64), (1, 0), (4096, 0), (1000, 96)] {
        let buffer = storage_buffer(&mut device, 4096 + 96, MemoryType::Host)?;
        let data = (0..len).map(|i| (i * 7 % 251) as u8).collect::<Vec<_>>();
        device.write_buffer(ctx, buffer, offset, &data)?;

        let mut read_back = vec![0u8; len];
        device.read_buffer(ctx, buffer, offset, &mut read_back)?;
        assert_eq!(read_back, data, "len {len} at offset {offset}");

        // host 路径不会录制任何命令，也不会改变状态
        assert_eq!(device.buffer(buffer).map(|b| b.state()), Some(ResourceState::Undefined));
        device.destroy_buffer(buffer);
    }

    device.destroy_context(ctx);
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
fn test_device_buffer_round_trip() -> anyhow::Result<()> {
    let mut device = test_device();
    let ctx = device.create_context()?;
    let buffer = storage_buffer(&mut device, 4096, MemoryType::Device)?;

    let data = (0..1024).map(|i| i as f32 * 0.5).collect::<Vec<_>>();
    device.begin(ctx)?;
    device.write_buffer(ctx, buffer, 0, bytemuck::cast_slice(&data))?;

    let mut read_back = vec![0f32; 1024];
    device.read_buffer(ctx, buffer, 0, bytemuck::cast_slice_mut(&mut read_back))?;
    device.submit(ctx)?;
    device.wait(ctx)?;

    assert_eq!(read_back, data);
    assert_eq!(device.live_buffers(), 1, "staging buffers are reclaimed by wait");
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
fn test_elementwise_add() -> anyhow::Result<()> {
    let mut device = test_device();
    let ctx = device.create_context()?;
    let pipeline = elementwise_add_pipeline(&mut device, &[])?;

    let size = (ELEMENT_COUNT * size_of::<f32>()) as u64;
    let a = storage_buffer(&mut device, size, MemoryType::Device)?;
    let b = storage_buffer(&mut device, size, MemoryType::Device)?;
    let result = storage_buffer(&mut device, size, MemoryType::Device)?;

    let a_data = (0..ELEMENT_COUNT).map(|i| i as f32).collect::<Vec<_>>();
    let b_data = (0..ELEMENT_COUNT).map(|i| 2.0 * i as f32 + 0.25).collect::<Vec<_>>();

    device.begin(ctx)?;
    device.write_buffer(ctx, a, 0, bytemuck::cast_slice(&a_data))?;
    device.write_buffer(ctx, b, 0, bytemuck::cast_slice(&b_data))?;

    let push_constant = TestBufferPushConstant {
        count: ELEMENT_COUNT as u32,
    };
    device.dispatch(
        ctx,
        &DispatchDesc {
            pipeline,
            binding_set: &[Binding::buffer(0, a), Binding::buffer(1, b), Binding::buffer(2, result)],
            push_constants: bytemuck::bytes_of(&push_constant),
            group_count: [(ELEMENT_COUNT as u32).div_ceil(GROUP_SIZE), 1, 1],
        },
    )?;
    assert_eq!(device.buffer(a).map(|b| b.state()), Some(ResourceState::ShaderResource));
    assert_eq!(device.buffer(result).map(|b| b.state()), Some(ResourceState::UnorderedAccess));

    let mut output = vec![0f32; ELEMENT_COUNT];
    device.read_buffer(ctx, result, 0, bytemuck::cast_slice_mut(&mut output))?;
    device.submit(ctx)?;
    device.wait(ctx)?;

    for (i, value) in output.iter().enumerate() {
        assert_eq!(*value, a_data[i] + b_data[i], "element {i}");
    }
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
#[should_panic(expected = "binding set has 2 entries")]
fn test_binding_set_length_mismatch() {
    let mut device = test_device();
    let ctx = device.create_context().unwrap();
    let pipeline = elementwise_add_pipeline(&mut device, &[]).unwrap();
    let a = storage_buffer(&mut device, 16, MemoryType::Device).unwrap();

    device.begin(ctx).unwrap();
    let _ = device.dispatch(
        ctx,
        &DispatchDesc {
            pipeline,
            binding_set: &[Binding::buffer(0, a), Binding::buffer(1, a)],
            push_constants: bytemuck::bytes_of(&TestBufferPushConstant { count: 4 }),
            group_count: [1, 1, 1],
        },
    );
}

#[test]
#[ignore = "requires a Vulkan device"]
#[should_panic(expected = "binding index mismatch")]
fn test_binding_index_mismatch() {
    let mut device = test_device();
    let ctx = device.create_context().unwrap();
    let pipeline = elementwise_add_pipeline(&mut device, &[]).unwrap();
    let a = storage_buffer(&mut device, 16, MemoryType::Device).unwrap();

    device.begin(ctx).unwrap();
    let _ = device.dispatch(
        ctx,
        &DispatchDesc {
            pipeline,
            binding_set: &[Binding::buffer(0, a), Binding::buffer(1, a), Binding::buffer(3, a)],
            push_constants: bytemuck::bytes_of(&TestBufferPushConstant { count: 4 }),
            group_count: [1, 1, 1],
        },
    );
}

#[test]
#[ignore = "requires a Vulkan device"]
#[should_panic(expected = "group count must be non-zero")]
fn test_zero_group_count() {
    let mut device = test_device();
    let ctx = device.create_context().unwrap();
    let pipeline = elementwise_add_pipeline(&mut device, &[]).unwrap();
    let a = storage_buffer(&mut device, 16, MemoryType::Device).unwrap();

    device.begin(ctx).unwrap();
    let _ = device.dispatch(
        ctx,
        &DispatchDesc {
            pipeline,
            binding_set: &[Binding::buffer(0, a), Binding::buffer(1, a), Binding::buffer(2, a)],
            push_constants: bytemuck::bytes_of(&TestBufferPushConstant { count: 4 }),
            group_count: [1, 0, 1],
        },
    );
}

#[test]
#[ignore = "requires a Vulkan device"]
fn test_texel_buffer_is_unsupported() -> anyhow::Result<()> {
    let mut device = test_device();
    let ctx = device.create_context()?;
    let pipeline = elementwise_add_pipeline(&mut device, &[BindingLayoutEntry::new(3, DescriptorType::Buffer)])?;
    let a = storage_buffer(&mut device, 16, MemoryType::Device)?;

    device.begin(ctx)?;
    let result = device.dispatch(
        ctx,
        &DispatchDesc {
            pipeline,
            binding_set: &[Binding::buffer(0, a), Binding::buffer(1, a), Binding::buffer(2, a), Binding::buffer(3, a)],
            push_constants: bytemuck::bytes_of(&TestBufferPushConstant { count: 4 }),
            group_count: [1, 1, 1],
        },
    );
    assert!(matches!(result, Err(GfxError::Unsupported(_))));
    // 没有录制任何 barrier
    assert_eq!(device.buffer(a).map(|b| b.state()), Some(ResourceState::Undefined));

    device.submit(ctx)?;
    device.wait(ctx)?;
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
fn test_image_binding_is_unsupported() -> anyhow::Result<()> {
    let mut device = test_device();
    let ctx = device.create_context()?;
    let shader = device.create_shader_from_registry(&EmbeddedShaders::new(), ShaderId::TestImageCs)?;
    let pipeline = device.create_pipeline(&PipelineDesc {
        shader,
        binding_layout: vec![
            BindingLayoutEntry::new(0, DescriptorType::Texture),
            BindingLayoutEntry::new(1, DescriptorType::RWTexture),
        ],
        push_constants_size: size_of::<TestImagePushConstant>() as u32,
    })?;

    let image_desc = ImageDesc {
        width: 64,
        height: 64,
        format: Format::Rgba32Float,
        usage: ResourceUsage::SHADER_RESOURCE | ResourceUsage::UNORDERED_ACCESS,
        memory: MemoryType::Device,
    };
    let src = device.create_image(&image_desc);
    let dst = device.create_image(&image_desc);
    assert_eq!(device.image(src).map(|i| *i.desc()), Some(image_desc));

    device.begin(ctx)?;
    let result = device.dispatch(
        ctx,
        &DispatchDesc {
            pipeline,
            binding_set: &[Binding::image(0, src), Binding::image(1, dst)],
            push_constants: bytemuck::bytes_of(&TestImagePushConstant { res: [64, 64] }),
            group_count: [2, 2, 1],
        },
    );
    assert!(matches!(result, Err(GfxError::Unsupported(_))));
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
fn test_double_destroy_is_noop() -> anyhow::Result<()> {
    let mut device = test_device();

    let buffer = storage_buffer(&mut device, 64, MemoryType::Host)?;
    device.destroy_buffer(buffer);
    device.destroy_buffer(buffer);
    assert_eq!(device.live_buffers(), 0);

    // slot 被复用，但旧的 handle 仍然无效
    let reused = storage_buffer(&mut device, 64, MemoryType::Host)?;
    assert_eq!(reused.id(), buffer.id());
    assert_ne!(reused, buffer);
    assert!(device.buffer(buffer).is_none());
    assert!(device.buffer(reused).is_some());

    let ctx = device.create_context()?;
    device.destroy_context(ctx);
    device.destroy_context(ctx);
    assert_eq!(device.live_contexts(), 0);
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
fn test_context_reuse_reclaims_staging() -> anyhow::Result<()> {
    let mut device = test_device();
    let ctx = device.create_context()?;
    let buffer = storage_buffer(&mut device, 256, MemoryType::Device)?;

    // 第一次 submit 之前的 wait 会立即返回
    device.wait(ctx)?;

    let live_before = device.live_buffers();
    for round in 0..3u8 {
        device.begin(ctx)?;
        assert_eq!(device.context_state(ctx), Some(ContextState::Recording));
        device.write_buffer(ctx, buffer, 0, &[round; 256])?;
        assert!(device.live_buffers() > live_before);

        device.submit(ctx)?;
        assert_eq!(device.context_state(ctx), Some(ContextState::Submitted));
        device.wait(ctx)?;
        device.wait(ctx)?;
        assert_eq!(device.context_state(ctx), Some(ContextState::Idle));
        assert_eq!(device.live_buffers(), live_before);
    }
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
#[should_panic(expected = "already recording")]
fn test_begin_twice() {
    let mut device = test_device();
    let ctx = device.create_context().unwrap();
    device.begin(ctx).unwrap();
    let _ = device.begin(ctx);
}

#[test]
#[ignore = "requires a Vulkan device"]
#[should_panic(expected = "out of buffer bounds")]
fn test_write_out_of_range() {
    let mut device = test_device();
    let ctx = device.create_context().unwrap();
    let buffer = storage_buffer(&mut device, 16, MemoryType::Host).unwrap();
    let _ = device.write_buffer(ctx, buffer, 8, &[0u8; 9]);
}

#[test]
#[ignore = "requires a Vulkan device"]
fn test_invalid_shader_is_rejected() -> anyhow::Result<()> {
    let mut device = test_device();
    let result = device.create_shader(&crate::pipelines::shader::ShaderDesc {
        code: &[0x03, 0x02, 0x23],
        entry_point: "main",
    });
    assert!(matches!(result, Err(GfxError::InvalidShader(_))));
    assert_eq!(device.live_shaders(), 0);
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
fn test_transients_of_every_kind_are_reclaimed() -> anyhow::Result<()> {
    let mut device = test_device();
    let ctx = device.create_context()?;

    device.begin(ctx)?;
    let buffer = storage_buffer(&mut device, 64, MemoryType::Device)?;
    let image = device.create_image(&ImageDesc {
        width: 4,
        height: 4,
        format: Format::R32Float,
        usage: ResourceUsage::SHADER_RESOURCE,
        memory: MemoryType::Device,
    });
    let sampler = device.create_sampler(&SamplerDesc::default())?;
    let pipeline = elementwise_add_pipeline(&mut device, &[])?;
    let shader = device.pipeline(pipeline).map(|p| p.shader()).unwrap();

    for resource in [
        TransientResource::Buffer(buffer),
        TransientResource::Image(image),
        TransientResource::Sampler(sampler),
        TransientResource::Pipeline(pipeline),
        TransientResource::Shader(shader),
    ] {
        device.add_transient(ctx, resource);
    }
    assert_eq!(
        (device.live_buffers(), device.live_images(), device.live_samplers()),
        (1, 1, 1)
    );
    assert_eq!((device.live_pipelines(), device.live_shaders()), (1, 1));

    device.submit(ctx)?;
    device.wait(ctx)?;
    assert_eq!(
        (device.live_buffers(), device.live_images(), device.live_samplers()),
        (0, 0, 0)
    );
    assert_eq!((device.live_pipelines(), device.live_shaders()), (0, 0));
    assert!(device.buffer(buffer).is_none());
    assert!(device.image(image).is_none());
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
fn test_staged_transfers_keep_labels_balanced() -> anyhow::Result<()> {
    let mut device = test_device();
    let ctx = device.create_context()?;
    let buffer = storage_buffer(&mut device, 128, MemoryType::Device)?;

    device.begin(ctx)?;
    let label_depth = |device: &Device| device.context(ctx).command_buffer.label_depth();
    assert_eq!(label_depth(&device), 1);

    device.write_buffer(ctx, buffer, 0, &[7u8; 128])?;
    assert_eq!(label_depth(&device), 1);

    let mut out = [0u8; 64];
    device.read_buffer(ctx, buffer, 64, &mut out)?;
    assert_eq!(label_depth(&device), 1);
    assert_eq!(out, [7u8; 64]);

    device.submit(ctx)?;
    device.wait(ctx)?;
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
fn test_destroy_context_keeps_it_when_wait_fails() -> anyhow::Result<()> {
    let mut device = test_device();
    let ctx = device.create_context()?;

    // begin 会 reset fence，之后不提交，fence 永远不会 signal
    device.begin(ctx)?;
    device.context_mut(ctx).state = ContextState::Submitted;
    device.destroy_context(ctx);
    assert_eq!(device.live_contexts(), 1);
    assert_eq!(device.context_state(ctx), Some(ContextState::Submitted));

    device.context_mut(ctx).state = ContextState::Recording;
    device.destroy_context(ctx);
    assert_eq!(device.live_contexts(), 0);
    Ok(())
}
