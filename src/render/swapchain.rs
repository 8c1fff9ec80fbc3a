//! Per-eye ring of render targets
//!
//! The headset-facing images live here. Each eye owns `length` colour textures
//! and one depth texture. A frame renders into the current image, `commit`
//! publishes it and moves the ring forward; the mirror only ever samples the
//! last committed image.

use glam::UVec2;
use tracing::debug;
use wgpu::{CommandEncoder, Device, RenderPass, Texture, TextureView};

use crate::camera::Eye;

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Index bookkeeping for one eye's ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainRing {
    length: usize,
    current: usize,
    last_committed: Option<usize>,
}

impl SwapchainRing {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(1),
            current: 0,
            last_committed: None,
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Image the next frame renders into
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn last_committed(&self) -> Option<usize> {
        self.last_committed
    }

    /// Publishes the current image and returns its index
    pub fn commit(&mut self) -> usize {
        let committed = self.current;
        self.last_committed = Some(committed);
        self.current = (self.current + 1) % self.length;
        committed
    }
}

struct EyeImages {
    ring: SwapchainRing,
    colors: Vec<(Texture, TextureView)>,
    depth: (Texture, TextureView),
}

pub struct StereoSwapchain {
    size: UVec2,
    eyes: [EyeImages; 2],
}

impl StereoSwapchain {
    pub fn new(device: &Device, size: UVec2, length: u32) -> Self {
        let size = size.max(UVec2::ONE);
        let eyes = Eye::BOTH.map(|eye| {
            let ring = SwapchainRing::new(length as usize);
            let colors = (0..ring.len())
                .map(|i| {
                    create_target(
                        device,
                        &format!("Eye Swapchain {} #{i}", eye.label()),
                        size,
                        COLOR_FORMAT,
                        wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                    )
                })
                .collect();
            let depth = create_target(
                device,
                &format!("Eye Depth {}", eye.label()),
                size,
                DEPTH_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            );
            EyeImages {
                ring,
                colors,
                depth,
            }
        });

        debug!(
            width = size.x,
            height = size.y,
            length = eyes[0].ring.len(),
            "Stereo swapchain created"
        );

        Self { size, eyes }
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn ring(&self, eye: Eye) -> &SwapchainRing {
        &self.eyes[eye.index()].ring
    }

    /// Opens a pass on the eye's current image with colour and depth cleared
    pub fn begin_eye<'e>(
        &self,
        encoder: &'e mut CommandEncoder,
        eye: Eye,
        clear: wgpu::Color,
    ) -> RenderPass<'e> {
        let images = &self.eyes[eye.index()];
        let (_, color_view) = &images.colors[images.ring.current()];

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(match eye {
                Eye::Left => "Left Eye Pass",
                Eye::Right => "Right Eye Pass",
            }),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &images.depth.1,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }

    pub fn commit(&mut self, eye: Eye) -> usize {
        self.eyes[eye.index()].ring.commit()
    }

    pub fn last_committed(&self, eye: Eye) -> Option<&TextureView> {
        let images = &self.eyes[eye.index()];
        images
            .ring
            .last_committed()
            .map(|index| &images.colors[index].1)
    }
}

fn create_target(
    device: &Device,
    label: &str,
    size: UVec2,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> (Texture, TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.x,
            height: size.y,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_is_committed_before_the_first_frame() {
        let ring = SwapchainRing::new(3);
        assert_eq!(ring.current(), 0);
        assert_eq!(ring.last_committed(), None);
    }

    #[test]
    fn commit_publishes_current_and_wraps() {
        let mut ring = SwapchainRing::new(3);
        assert_eq!(ring.commit(), 0);
        assert_eq!(ring.commit(), 1);
        assert_eq!(ring.commit(), 2);
        assert_eq!(ring.current(), 0);
        assert_eq!(ring.last_committed(), Some(2));
    }

    #[test]
    fn committed_image_is_never_the_one_being_drawn() {
        let mut ring = SwapchainRing::new(2);
        for _ in 0..5 {
            ring.commit();
            assert_ne!(ring.last_committed(), Some(ring.current()));
        }
    }

    #[test]
    fn zero_length_becomes_single_image() {
        let mut ring = SwapchainRing::new(0);
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.commit(), 0);
        assert_eq!(ring.current(), 0);
    }
}
