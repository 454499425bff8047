use rayon::iter::{IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;

use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::error::Result;
use crate::framebuffer::{DepthBuffer, Framebuffer, shade_rgb};
use crate::projector::{ColumnProjector, ColumnSpan};
use crate::raycaster::{RayHit, cast_column};
use crate::texture::TextureSet;
use crate::world::WorldGrid;

/// World plus the textures it references, checked against each other.
#[derive(Debug, Clone)]
pub struct Scene {
    world: WorldGrid,
    textures: TextureSet,
}

impl Scene {
    /// Fails if any wall references a texture id missing from `textures`.
    pub fn new(world: WorldGrid, textures: TextureSet) -> Result<Self> {
        textures.validate_world(&world)?;
        log::info!(
            "scene ready: {} wall cells, {} textures of {}x{}",
            world.len(),
            textures.len(),
            textures.size(),
            textures.size()
        );
        Ok(Self { world, textures })
    }

    #[inline]
    pub fn world(&self) -> &WorldGrid {
        &self.world
    }

    #[inline]
    pub fn textures(&self) -> &TextureSet {
        &self.textures
    }
}

/// Ray result for one screen column of the last frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnSample {
    pub hit: Option<RayHit>,
    pub span: Option<ColumnSpan>,
    /// Distance fade applied to the wall texels, 1.0 when fading is off.
    pub brightness: f32,
    texture_slot: Option<usize>,
}

/// Owns the frame and depth buffers and redraws them once per frame.
pub struct FrameRenderer {
    config: RenderConfig,
    framebuffer: Framebuffer,
    depth: DepthBuffer,
    columns: Vec<ColumnSample>,
}

impl FrameRenderer {
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            framebuffer: Framebuffer::new(config.width, config.height),
            depth: DepthBuffer::new(config.width),
            columns: vec![ColumnSample::default(); config.width],
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    #[inline]
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    #[inline]
    pub fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    /// Per-column hits and slabs from the last `render`.
    #[inline]
    pub fn columns(&self) -> &[ColumnSample] {
        &self.columns
    }

    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        let mut config = self.config.clone();
        config.width = width;
        config.height = height;
        config.validate()?;

        log::debug!("framebuffer resized to {width}x{height}");
        self.framebuffer.resize(width, height);
        self.depth.resize(width);
        self.columns.resize(width, ColumnSample::default());
        self.config = config;
        Ok(())
    }

    /// Draws one frame from `camera`'s point of view.
    ///
    /// Columns are traced first (left to right, or on the rayon pool when
    /// `parallel` is set), then rows are filled from the traced slabs. Both
    /// paths produce identical pixels.
    pub fn render(&mut self, camera: &Camera, scene: &Scene) -> &Framebuffer {
        let Self {
            config,
            framebuffer,
            depth,
            columns,
        } = self;
        let config = &*config;

        let width = config.width;
        let height = config.height;
        let max_distance = config.max_trace_distance;
        let projector = ColumnProjector::new(camera, width, height, scene.textures.size());

        let trace = |(x, (sample, z)): (usize, (&mut ColumnSample, &mut f32))| {
            let hit = cast_column(camera, &scene.world, x, width, max_distance);
            *z = hit.map_or(f32::INFINITY, |h| h.perp_distance);
            *sample = match hit {
                Some(h) => ColumnSample {
                    hit,
                    span: Some(projector.project(&h)),
                    brightness: config.wall_brightness(h.perp_distance),
                    texture_slot: scene.textures.slot(h.wall.texture),
                },
                None => ColumnSample {
                    brightness: 1.0,
                    ..ColumnSample::default()
                },
            };
            debug_assert!(
                hit.is_none() || sample.texture_slot.is_some(),
                "scene validated every texture id"
            );
        };

        if config.parallel {
            columns
                .par_iter_mut()
                .zip(depth.as_mut_slice().par_iter_mut())
                .enumerate()
                .for_each(trace);
        } else {
            columns
                .iter_mut()
                .zip(depth.as_mut_slice().iter_mut())
                .enumerate()
                .for_each(trace);
        }

        let rows = RowFill {
            columns: &columns[..],
            textures: &scene.textures,
            ceiling: config.ceiling_rgb(),
            floor: config.floor_rgb(),
            horizon: height / 2,
        };

        if config.parallel {
            framebuffer
                .pixels_mut()
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| rows.fill(y, row));
        } else {
            framebuffer
                .pixels_mut()
                .chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| rows.fill(y, row));
        }

        framebuffer
    }
}

struct RowFill<'a> {
    columns: &'a [ColumnSample],
    textures: &'a TextureSet,
    ceiling: u32,
    floor: u32,
    horizon: usize,
}

impl RowFill<'_> {
    #[inline]
    fn fill(&self, y: usize, row: &mut [u32]) {
        for (px, column) in row.iter_mut().zip(self.columns) {
            // slots were resolved in the trace pass, so this is a plain index
            let texture = column.texture_slot.and_then(|slot| self.textures.by_slot(slot));
            *px = match column.span.zip(texture) {
                Some((span, _)) if y < span.top_row => self.ceiling,
                Some((span, _)) if y > span.bottom_row => self.floor,
                Some((span, texture)) => shade_rgb(
                    texture.pixel(span.texture_column, span.texture_row(y)),
                    column.brightness,
                ),
                None if y < self.horizon => self.ceiling,
                None => self.floor,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::{pack_rgb, unpack_rgb};
    use crate::math::Vec2;
    use crate::texture::Texture;
    use crate::world::{Cell, TextureId, WallDescriptor};
    use std::f32::consts::FRAC_PI_2;

    fn config(parallel: bool) -> RenderConfig {
        RenderConfig {
            width: 64,
            height: 48,
            max_trace_distance: 32.0,
            parallel,
            ..RenderConfig::default()
        }
    }

    fn boxed_scene() -> Scene {
        let mut world = WorldGrid::new();
        for i in -4..=4 {
            world.insert(Cell::new(i, 4), WallDescriptor::new(1));
            world.insert(Cell::new(i, -4), WallDescriptor::new(2));
            world.insert(Cell::new(4, i), WallDescriptor::new(1));
            world.insert(Cell::new(-4, i), WallDescriptor::new(2));
        }
        let mut textures = TextureSet::new(8).unwrap();
        textures
            .insert(TextureId(1), Texture::solid(8, pack_rgb(255, 0, 0)).unwrap())
            .unwrap();
        let checker = crate::texture::TexturePattern::Checker;
        textures
            .insert(
                TextureId(2),
                Texture::procedural(checker, 8, pack_rgb(0, 0, 255)).unwrap(),
            )
            .unwrap();
        Scene::new(world, textures).unwrap()
    }

    #[test]
    fn scene_rejects_unknown_texture() {
        let world: WorldGrid = [(Cell::new(1, 1), WallDescriptor::new(9))]
            .into_iter()
            .collect();
        let textures = TextureSet::new(8).unwrap();
        assert!(Scene::new(world, textures).is_err());
    }

    #[test]
    fn renderer_rejects_bad_config() {
        let mut cfg = config(false);
        cfg.width = 0;
        assert!(FrameRenderer::new(cfg).is_err());
    }

    #[test]
    fn empty_world_is_ceiling_and_floor() {
        let scene = Scene::new(WorldGrid::new(), TextureSet::new(8).unwrap()).unwrap();
        let cam = Camera::facing(Vec2::new(0.5, 0.5), 0.0, FRAC_PI_2).unwrap();
        let mut renderer = FrameRenderer::new(config(false)).unwrap();
        let cfg = renderer.config().clone();

        let fb = renderer.render(&cam, &scene);
        for x in [0, 31, 63] {
            let col = fb.column(x);
            assert!(col[..24].iter().all(|&p| p == cfg.ceiling_rgb()));
            assert!(col[24..].iter().all(|&p| p == cfg.floor_rgb()));
        }
        assert!(renderer.depth().as_slice().iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn wall_column_is_textured_between_ceiling_and_floor() {
        let scene = boxed_scene();
        let cam = Camera::facing(Vec2::new(0.5, 0.5), FRAC_PI_2, FRAC_PI_2).unwrap();
        let mut renderer = FrameRenderer::new(config(false)).unwrap();
        let cfg = renderer.config().clone();
        renderer.render(&cam, &scene);

        let sample = renderer.columns()[32];
        let span = sample.span.unwrap();
        assert_eq!(sample.hit.unwrap().cell.y, 4);
        let col = renderer.framebuffer().column(32);
        assert!(col[..span.top_row].iter().all(|&p| p == cfg.ceiling_rgb()));
        assert!(col[span.top_row..=span.bottom_row]
            .iter()
            .all(|&p| p == pack_rgb(255, 0, 0)));
        assert!(col[span.bottom_row + 1..].iter().all(|&p| p == cfg.floor_rgb()));
        assert!((renderer.depth().get(32) - 3.5).abs() < 1e-3);
    }

    #[test]
    fn farther_walls_fade_darker() {
        let world: WorldGrid = (-20..=20)
            .map(|y| (Cell::new(10, y), WallDescriptor::new(1)))
            .collect();
        let mut textures = TextureSet::new(8).unwrap();
        textures
            .insert(TextureId(1), Texture::solid(8, pack_rgb(255, 0, 0)).unwrap())
            .unwrap();
        let scene = Scene::new(world, textures).unwrap();

        let mut renderer = FrameRenderer::new(RenderConfig {
            fade_distance: 16.0,
            ..config(true)
        })
        .unwrap();
        let mut red_at = |x: f32| {
            let cam = Camera::facing(Vec2::new(x, 0.5), 0.0, FRAC_PI_2).unwrap();
            let (r, _, _) = unpack_rgb(renderer.render(&cam, &scene).get(32, 24));
            (r, renderer.columns()[32].brightness)
        };

        let (near, near_brightness) = red_at(6.5);
        let (far, far_brightness) = red_at(0.5);
        assert!((near_brightness - (1.0 - 3.5 / 16.0)).abs() < 1e-4);
        assert!((far_brightness - (1.0 - 9.5 / 16.0)).abs() < 1e-4);
        assert!(near > far, "near {near}, far {far}");
        assert!(far > 0);

        let mut unfaded = FrameRenderer::new(config(true)).unwrap();
        let cam = Camera::facing(Vec2::new(0.5, 0.5), 0.0, FRAC_PI_2).unwrap();
        assert_eq!(unfaded.render(&cam, &scene).get(32, 24), pack_rgb(255, 0, 0));
    }

    #[test]
    fn parallel_matches_sequential() {
        let scene = boxed_scene();
        let mut cam = Camera::facing(Vec2::new(-1.3, 0.7), 0.4, 1.2).unwrap();
        let mut seq = FrameRenderer::new(config(false)).unwrap();
        let mut par = FrameRenderer::new(config(true)).unwrap();

        for _ in 0..8 {
            cam.rotate(0.7);
            let a = seq.render(&cam, &scene).pixels().to_vec();
            let b = par.render(&cam, &scene).pixels().to_vec();
            assert_eq!(a, b);
            assert_eq!(seq.depth().as_slice(), par.depth().as_slice());
        }
    }

    #[test]
    fn resize_reallocates_buffers() {
        let scene = boxed_scene();
        let cam = Camera::facing(Vec2::new(0.5, 0.5), 0.0, FRAC_PI_2).unwrap();
        let mut renderer = FrameRenderer::new(config(true)).unwrap();
        renderer.resize(100, 30).unwrap();
        let fb = renderer.render(&cam, &scene);
        assert_eq!((fb.width(), fb.height()), (100, 30));
        assert_eq!(fb.pixels().len(), 3000);
        assert_eq!(renderer.depth().len(), 100);
        assert!(renderer.depth().as_slice().iter().all(|d| d.is_finite()));
        assert!(renderer.resize(0, 10).is_err());
    }
}
