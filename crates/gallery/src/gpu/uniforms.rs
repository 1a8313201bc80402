use bytemuck::{Pod, Zeroable};

/// Host mirror of the `GalleryParams` uniform block declared in
/// [`crate::shader::FRAGMENT_PRELUDE`]. Field order and padding follow std140.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GalleryUniforms {
    pub resolution: [f32; 2],
    pub pointer: [f32; 2],
    pub time: f32,
    pub transition: f32,
    pub direction: f32,
    pub distortion: f32,
    pub image_size: [f32; 2],
    pub padding: [f32; 2],
}

unsafe impl Zeroable for GalleryUniforms {}
unsafe impl Pod for GalleryUniforms {}

impl GalleryUniforms {
    pub fn new(width: u32, height: u32, distortion: f32) -> Self {
        Self {
            resolution: [width.max(1) as f32, height.max(1) as f32],
            pointer: [0.5, 0.5],
            time: 0.0,
            transition: 0.0,
            direction: 1.0,
            distortion,
            image_size: [1.0, 1.0],
            padding: [0.0; 2],
        }
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.resolution = [width.max(1) as f32, height.max(1) as f32];
    }

    pub fn aspect(&self) -> f32 {
        self.resolution[0] / self.resolution[1].max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_std140_block() {
        assert_eq!(std::mem::size_of::<GalleryUniforms>(), 48);
        assert_eq!(std::mem::offset_of!(GalleryUniforms, time), 16);
        assert_eq!(std::mem::offset_of!(GalleryUniforms, distortion), 28);
        assert_eq!(std::mem::offset_of!(GalleryUniforms, image_size), 32);
    }

    #[test]
    fn starts_centred_and_forward() {
        let uniforms = GalleryUniforms::new(800, 400, 0.8);
        assert_eq!(uniforms.pointer, [0.5, 0.5]);
        assert_eq!(uniforms.direction, 1.0);
        assert!((uniforms.aspect() - 2.0).abs() < f32::EPSILON);
        assert_eq!(bytemuck::bytes_of(&uniforms).len(), 48);
    }
}
