#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    // BGRA8 in little-endian memory, alpha left at 0
    (b as u32) | ((g as u32) << 8) | ((r as u32) << 16)
}

#[inline]
pub fn unpack_rgb(c: u32) -> (u8, u8, u8) {
    ((c >> 16) as u8, (c >> 8) as u8, c as u8)
}

/// Scales every channel of `c` by `brightness` (expected in `[0, 1]`).
#[inline]
pub fn shade_rgb(c: u32, brightness: f32) -> u32 {
    if brightness >= 1.0 {
        return c;
    }
    let (r, g, b) = unpack_rgb(c);
    let scale = |v: u8| (v as f32 * brightness.max(0.0)) as u8;
    pack_rgb(scale(r), scale(g), scale(b))
}

/// Row-major frame of packed pixels, reused across frames.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    /// Copies out column `x`, top to bottom.
    pub fn column(&self, x: usize) -> Vec<u32> {
        (0..self.height).map(|y| self.get(x, y)).collect()
    }

    /// Reallocates only when the size actually changes.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.pixels = vec![0; width * height];
        }
    }
}

/// Perpendicular wall distance per screen column; `f32::INFINITY` where no
/// wall was hit.
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    depths: Vec<f32>,
}

impl DepthBuffer {
    pub fn new(width: usize) -> Self {
        Self {
            depths: vec![f32::INFINITY; width],
        }
    }

    #[inline]
    pub fn get(&self, column: usize) -> f32 {
        self.depths[column]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.depths
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.depths
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    pub fn resize(&mut self, width: usize) {
        self.depths.resize(width, f32::INFINITY);
    }
}
