use rayon::{
    iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Precomputed nearest source pixel for every destination row and column.
#[derive(Debug, Clone, Default)]
pub struct ScaleLut {
    src_x: Vec<usize>,
    src_y: Vec<usize>,
}

impl ScaleLut {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> Self {
        Self {
            src_x: nearest_indices(dst_w, src_w),
            src_y: nearest_indices(dst_h, src_h),
        }
    }

    #[inline]
    pub fn dst_width(&self) -> usize {
        self.src_x.len()
    }

    #[inline]
    pub fn dst_height(&self) -> usize {
        self.src_y.len()
    }
}

fn nearest_indices(dst: usize, src: usize) -> Vec<usize> {
    if src == 0 {
        return vec![0; dst];
    }
    let scale = src as f32 / dst as f32;
    (0..dst)
        .map(|i| (((i as f32 + 0.5) * scale) as usize).min(src - 1))
        .collect()
}

/// Nearest-neighbour stretch of `src` (width `sw`) into `dst`, keeping the
/// blocky texel look. Rows are processed in parallel.
pub fn blit_nearest(dst: &mut [u32], src: &[u32], sw: usize, lut: &ScaleLut) {
    let dw = lut.dst_width();
    if dw == 0 {
        return;
    }
    dst.par_chunks_mut(dw)
        .zip(lut.src_y.par_iter())
        .for_each(|(dst_row, &sy)| {
            let src_row = &src[sy * sw..(sy + 1) * sw];
            for (px, &sx) in dst_row.iter_mut().zip(&lut.src_x) {
                *px = src_row[sx];
            }
        });
}
