//! Unit tests for DescriptorAllocator

use crate::descriptor::{pool_sizes, DescriptorAllocator, DescriptorSetLayoutDesc, DescriptorType};
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::GraphicsDevice;

fn setup(multiplier: u32) -> (MockGraphicsDevice, DescriptorAllocator<MockGraphicsDevice>) {
    (MockGraphicsDevice::new(), DescriptorAllocator::new(multiplier))
}

// ============================================================================
// POOL SIZES
// ============================================================================

#[test]
fn test_pool_sizes_follow_weights() {
    let sizes = pool_sizes(512);
    let count = |ty: DescriptorType| sizes.iter().find(|s| s.ty == ty).unwrap().count;

    assert_eq!(sizes.len(), 11);
    assert_eq!(count(DescriptorType::CombinedImageSampler), 2048);
    assert_eq!(count(DescriptorType::SampledImage), 2048);
    assert_eq!(count(DescriptorType::UniformBuffer), 1024);
    assert_eq!(count(DescriptorType::StorageBuffer), 1024);
    assert_eq!(count(DescriptorType::Sampler), 256);
    assert_eq!(count(DescriptorType::InputAttachment), 256);
    assert_eq!(count(DescriptorType::StorageImage), 512);
}

#[test]
fn test_pool_sizes_never_zero() {
    assert!(pool_sizes(1).iter().all(|s| s.count >= 1));
}

// ============================================================================
// ALLOCATION
// ============================================================================

#[test]
fn test_allocate_creates_pool_lazily() {
    let (device, mut allocator) = setup(4);
    assert_eq!(allocator.pools_created(), 0);

    let layout = device.create_descriptor_set_layout(&DescriptorSetLayoutDesc::default()).unwrap();
    allocator.allocate_set(&device, &layout).unwrap();
    assert_eq!(allocator.pools_created(), 1);
    assert_eq!(allocator.used_pool_count(), 1);
}

#[test]
fn test_allocate_beyond_one_pool_is_transparent() {
    let (device, mut allocator) = setup(512);
    let layout = device.create_descriptor_set_layout(&DescriptorSetLayoutDesc::default()).unwrap();

    let sets: Vec<_> = (0..600).map(|_| allocator.allocate_set(&device, &layout).unwrap()).collect();

    assert_eq!(sets.len(), 600);
    assert_eq!(allocator.pools_created(), 2);
    assert_eq!(sets[511].index, 511);
    assert_eq!(sets[512].index, 0);
    assert_ne!(sets[511].pool, sets[512].pool);
    assert_eq!(device.state().sets_allocated, 600);
}

#[test]
fn test_multiplier_zero_is_raised_to_one() {
    let device = MockGraphicsDevice::new();
    let mut allocator = DescriptorAllocator::<MockGraphicsDevice>::new(0);
    let layout = device.create_descriptor_set_layout(&DescriptorSetLayoutDesc::default()).unwrap();

    allocator.allocate_set(&device, &layout).unwrap();
    allocator.allocate_set(&device, &layout).unwrap();
    assert_eq!(allocator.pools_created(), 2);
}

// ============================================================================
// RESET / DISPOSE
// ============================================================================

#[test]
fn test_reset_moves_pools_to_free_list() {
    let (device, mut allocator) = setup(2);
    let layout = device.create_descriptor_set_layout(&DescriptorSetLayoutDesc::default()).unwrap();
    for _ in 0..5 {
        allocator.allocate_set(&device, &layout).unwrap();
    }
    assert_eq!(allocator.used_pool_count(), 3);

    allocator.reset_pools(&device).unwrap();
    assert_eq!(allocator.used_pool_count(), 0);
    assert_eq!(allocator.free_pool_count(), 3);
}

#[test]
fn test_reset_pools_are_reused_before_creating() {
    let (device, mut allocator) = setup(2);
    let layout = device.create_descriptor_set_layout(&DescriptorSetLayoutDesc::default()).unwrap();
    for _ in 0..4 {
        allocator.allocate_set(&device, &layout).unwrap();
    }
    allocator.reset_pools(&device).unwrap();
    for _ in 0..4 {
        allocator.allocate_set(&device, &layout).unwrap();
    }

    assert_eq!(allocator.pools_created(), 2);
    assert_eq!(device.state().pools_created, 2);
    assert_eq!(allocator.free_pool_count(), 0);
}

#[test]
fn test_dispose_destroys_every_pool() {
    let (device, mut allocator) = setup(1);
    let layout = device.create_descriptor_set_layout(&DescriptorSetLayoutDesc::default()).unwrap();
    for _ in 0..3 {
        allocator.allocate_set(&device, &layout).unwrap();
    }
    allocator.reset_pools(&device).unwrap();
    allocator.allocate_set(&device, &layout).unwrap();
    device.clear_events();

    allocator.dispose_pools();
    let destroyed = device.event_list().iter().filter(|e| e.starts_with("destroy_pool:")).count();
    assert_eq!(destroyed, 3);
    assert_eq!(allocator.used_pool_count() + allocator.free_pool_count(), 0);
}
