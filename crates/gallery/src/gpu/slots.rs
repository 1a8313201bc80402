//! wgpu textures behind the current and next slots.
//!
//! Both slots share one sampler and one bind group. Uploads write in place
//! when the size is unchanged and reallocate the texture otherwise.

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::cache::Bitmap;
use crate::slots::{Slot, TextureSlots, PLACEHOLDER_PIXEL};

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct SlotTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl SlotTexture {
    fn create(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        slot: Slot,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(&format!("{} image texture", slot.label())),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXTURE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            pixels,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }

    fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue, slot: Slot) -> Self {
        Self::create(device, queue, slot, 1, 1, &PLACEHOLDER_PIXEL)
    }

    fn write(&self, queue: &wgpu::Queue, pixels: &[u8]) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * 4),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

/// The two image textures plus their shared bind group (set 1).
///
/// Uploads of the same dimensions reuse the existing texture; a size change
/// allocates a new one and rebuilds the bind group.
pub(crate) struct GpuTextureSlots {
    device: wgpu::Device,
    queue: wgpu::Queue,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    current: SlotTexture,
    next: SlotTexture,
    bind_group: wgpu::BindGroup,
    max_dimension: u32,
}

impl GpuTextureSlots {
    pub(crate) fn new(device: &wgpu::Device, queue: &wgpu::Queue, max_dimension: u32) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("image slot layout"),
            entries: &build_slot_layout_entries(),
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("image slot sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let current = SlotTexture::placeholder(device, queue, Slot::Current);
        let next = SlotTexture::placeholder(device, queue, Slot::Next);
        let bind_group = build_bind_group(device, &layout, &sampler, &current, &next);

        Self {
            device: device.clone(),
            queue: queue.clone(),
            layout,
            sampler,
            current,
            next,
            bind_group,
            max_dimension: max_dimension.max(1),
        }
    }

    pub(crate) fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub(crate) fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut SlotTexture {
        match slot {
            Slot::Current => &mut self.current,
            Slot::Next => &mut self.next,
        }
    }

    fn store(&mut self, slot: Slot, width: u32, height: u32, pixels: &[u8]) {
        let existing = match slot {
            Slot::Current => &self.current,
            Slot::Next => &self.next,
        };
        if existing.width == width && existing.height == height {
            existing.write(&self.queue, pixels);
            return;
        }

        let replacement = SlotTexture::create(&self.device, &self.queue, slot, width, height, pixels);
        *self.slot_mut(slot) = replacement;
        self.bind_group = build_bind_group(
            &self.device,
            &self.layout,
            &self.sampler,
            &self.current,
            &self.next,
        );
        tracing::debug!(slot = slot.label(), width, height, "image slot reallocated");
    }
}

impl TextureSlots for GpuTextureSlots {
    fn upload(&mut self, slot: Slot, bitmap: &Bitmap) {
        let (width, height, pixels) = fit_to_limit(bitmap, self.max_dimension);
        self.store(slot, width, height, &pixels);
    }

    fn reset_to_placeholder(&mut self, slot: Slot) {
        self.store(slot, 1, 1, &PLACEHOLDER_PIXEL);
    }
}

/// Downscales bitmaps the device cannot hold in a single texture.
fn fit_to_limit(bitmap: &Bitmap, max_dimension: u32) -> (u32, u32, Cow<'_, [u8]>) {
    let (width, height) = (bitmap.width(), bitmap.height());
    if width <= max_dimension && height <= max_dimension {
        return (width, height, Cow::Borrowed(bitmap.pixels()));
    }

    let scale = max_dimension as f64 / width.max(height) as f64;
    let target_width = ((width as f64 * scale).floor() as u32).clamp(1, max_dimension);
    let target_height = ((height as f64 * scale).floor() as u32).clamp(1, max_dimension);
    let Some(source) = RgbaImage::from_raw(width, height, bitmap.pixels().to_vec()) else {
        tracing::warn!(url = %bitmap.url(), "bitmap buffer does not match its size; using placeholder");
        return (1, 1, Cow::Borrowed(&PLACEHOLDER_PIXEL));
    };
    tracing::warn!(
        url = %bitmap.url(),
        width,
        height,
        target_width,
        target_height,
        "image exceeds texture limit; downscaling"
    );
    let resized = imageops::resize(&source, target_width, target_height, FilterType::Triangle);
    (target_width, target_height, Cow::Owned(resized.into_raw()))
}

fn build_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    current: &SlotTexture,
    next: &SlotTexture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("image slot bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&current.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&next.view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

pub(crate) fn build_slot_layout_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(4);
    for slot in 0..2u32 {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: slot * 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: slot * 2 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    entries
}
