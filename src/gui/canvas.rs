use glam::UVec2;
use tracing::warn;

/// Fits `size` inside `max_side` on both axes, keeping its aspect ratio
pub fn clamp_canvas_size(size: UVec2, max_side: u32) -> UVec2 {
    let size = size.max(UVec2::ONE);
    let longest = size.max_element();
    if longest <= max_side {
        return size;
    }
    let scaled = |v: u32| {
        let v = u64::from(v) * u64::from(max_side) / u64::from(longest);
        (v as u32).clamp(1, max_side)
    };
    UVec2::new(scaled(size.x), scaled(size.y))
}

/// Off-screen target the GUI is drawn into before it is mapped onto the panel
pub struct GuiCanvas {
    /// The underlying wgpu texture
    pub texture: wgpu::Texture,
    /// The view of the texture for rendering and sampling
    pub view: wgpu::TextureView,
    size: UVec2,
}

impl GuiCanvas {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    pub fn new(device: &wgpu::Device, size: UVec2) -> Self {
        let size = Self::fit_to_device(device, size);
        let (texture, view) = Self::create_texture(device, size);
        Self {
            texture,
            view,
            size,
        }
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Recreates the texture when `size` differs, returning whether it did
    pub fn resize(&mut self, device: &wgpu::Device, size: UVec2) -> bool {
        let size = Self::fit_to_device(device, size);
        if self.size == size {
            return false;
        }

        let (texture, view) = Self::create_texture(device, size);
        self.texture = texture;
        self.view = view;
        self.size = size;
        true
    }

    /// Opens a pass over the whole canvas cleared to `background` (linear RGBA)
    pub fn begin_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        background: [f32; 4],
    ) -> wgpu::RenderPass<'e> {
        let [r, g, b, a] = background.map(f64::from);
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("GUI Canvas Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }

    fn fit_to_device(device: &wgpu::Device, requested: UVec2) -> UVec2 {
        let max_side = device.limits().max_texture_dimension_2d;
        let size = clamp_canvas_size(requested, max_side);
        if size != requested.max(UVec2::ONE) {
            warn!(
                requested.width = requested.x,
                requested.height = requested.y,
                width = size.x,
                height = size.y,
                max_side,
                "GUI canvas exceeds the device texture limit, clamping"
            );
        }
        size
    }

    fn create_texture(device: &wgpu::Device, size: UVec2) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("GUI Canvas"),
            size: wgpu::Extent3d {
                width: size.x,
                height: size.y,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        (texture, view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_within_the_limit_are_kept() {
        assert_eq!(
            clamp_canvas_size(UVec2::new(1600, 600), 8192),
            UVec2::new(1600, 600)
        );
        assert_eq!(clamp_canvas_size(UVec2::ZERO, 8192), UVec2::ONE);
    }

    #[test]
    fn oversized_canvas_shrinks_to_the_limit() {
        let size = clamp_canvas_size(UVec2::new(20000, 600), 8192);
        assert_eq!(size.x, 8192);
        assert_eq!(size.y, 245);
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        let size = clamp_canvas_size(UVec2::new(100_000, 1), 2048);
        assert_eq!(size, UVec2::new(2048, 1));
    }
}
