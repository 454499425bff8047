use std::collections::HashMap;
use std::path::Path;

use crate::error::{RaycastError, Result};
use crate::framebuffer::{pack_rgb, unpack_rgb};
use crate::world::{TextureId, WorldGrid};

/// Fallback patterns for textures that have no image file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexturePattern {
    Bricks,
    Checker,
    Stripes,
}

/// Square, power-of-two texture of packed 0RGB pixels, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    size: u32,
    pixels: Vec<u32>,
}

impl Texture {
    pub fn from_pixels(size: u32, pixels: Vec<u32>) -> Result<Self> {
        check_size(size)?;
        if pixels.len() != (size * size) as usize {
            return Err(RaycastError::InvalidConfig(format!(
                "texture of size {size} needs {} pixels, got {}",
                size * size,
                pixels.len()
            )));
        }
        Ok(Self { size, pixels })
    }

    pub fn solid(size: u32, color: u32) -> Result<Self> {
        check_size(size)?;
        Ok(Self {
            size,
            pixels: vec![color; (size * size) as usize],
        })
    }

    /// Decodes an image file (any format the `image` crate reads).
    pub fn from_image_file(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .map_err(|source| RaycastError::Image {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();

        let (width, height) = img.dimensions();
        if width != height {
            return Err(RaycastError::TextureNotSquare { width, height });
        }
        let pixels = img.pixels().map(|p| pack_rgb(p[0], p[1], p[2])).collect();
        let texture = Self::from_pixels(width, pixels)?;
        log::debug!("decoded texture {} ({width}x{height})", path.display());
        Ok(texture)
    }

    pub fn procedural(pattern: TexturePattern, size: u32, color: u32) -> Result<Self> {
        check_size(size)?;
        let (r, g, b) = unpack_rgb(color);
        let dark = pack_rgb(r / 2, g / 2, b / 2);
        let cell = (size / 8).max(1);

        let mut pixels = Vec::with_capacity((size * size) as usize);
        for row in 0..size {
            for col in 0..size {
                let lit = match pattern {
                    TexturePattern::Bricks => {
                        // running bond: every other course shifted half a brick
                        let course = row / cell;
                        let shift = if course % 2 == 0 { 0 } else { cell * 2 };
                        row % cell != 0 && (col + shift) % (cell * 4) != 0
                    }
                    TexturePattern::Checker => ((row / cell) + (col / cell)) % 2 == 0,
                    TexturePattern::Stripes => (col / cell) % 2 == 0,
                };
                pixels.push(if lit { color } else { dark });
            }
        }
        Ok(Self { size, pixels })
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Pixel at texture column `col`, row `row` (row 0 is the top).
    #[inline]
    pub fn pixel(&self, col: u32, row: u32) -> u32 {
        debug_assert!(col < self.size && row < self.size);
        self.pixels[(row * self.size + col) as usize]
    }
}

/// All wall textures, sharing one size.
///
/// Textures live in a dense vector; the id map only resolves ids to slots,
/// so a frame can look each id up once and index afterwards.
#[derive(Debug, Clone)]
pub struct TextureSet {
    size: u32,
    slots: HashMap<TextureId, usize>,
    textures: Vec<Texture>,
}

impl TextureSet {
    pub fn new(size: u32) -> Result<Self> {
        check_size(size)?;
        Ok(Self {
            size,
            slots: HashMap::new(),
            textures: Vec::new(),
        })
    }

    pub fn insert(&mut self, id: TextureId, texture: Texture) -> Result<()> {
        if texture.size != self.size {
            return Err(RaycastError::TextureSize {
                texture: id,
                expected: self.size,
                found: texture.size,
            });
        }
        match self.slots.get(&id) {
            Some(&slot) => self.textures[slot] = texture,
            None => {
                self.slots.insert(id, self.textures.len());
                self.textures.push(texture);
            }
        }
        Ok(())
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.slot(id).and_then(|slot| self.by_slot(slot))
    }

    /// Dense index of `id`, stable until the set is modified.
    #[inline]
    pub fn slot(&self, id: TextureId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    #[inline]
    pub fn by_slot(&self, slot: usize) -> Option<&Texture> {
        self.textures.get(slot)
    }

    pub fn contains(&self, id: TextureId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn get_pixel(&self, id: TextureId, col: u32, row: u32) -> Option<u32> {
        self.get(id).map(|t| t.pixel(col, row))
    }

    /// Fails on the lowest cell whose wall references a texture not in the set.
    pub fn validate_world(&self, world: &WorldGrid) -> Result<()> {
        let missing = world
            .iter()
            .filter(|(_, wall)| !self.contains(wall.texture))
            .min_by_key(|(cell, _)| *cell);

        match missing {
            Some((cell, wall)) => Err(RaycastError::UnknownTexture {
                cell,
                texture: wall.texture,
            }),
            None => Ok(()),
        }
    }
}

const FALLBACK_COLORS: [(u8, u8, u8); 6] = [
    (170, 74, 68),
    (136, 136, 150),
    (92, 130, 88),
    (160, 132, 80),
    (84, 100, 160),
    (150, 90, 140),
];

/// Builds the set for `world`: ids listed in `files` are decoded from disk,
/// any other id the world references gets a procedural stand-in.
pub fn load_texture_set(
    size: u32,
    files: &[(TextureId, &Path)],
    world: &WorldGrid,
) -> Result<TextureSet> {
    let mut set = TextureSet::new(size)?;
    for &(id, path) in files {
        set.insert(id, Texture::from_image_file(path)?)?;
    }

    let mut missing: Vec<TextureId> = world
        .iter()
        .map(|(_, wall)| wall.texture)
        .filter(|id| !set.contains(*id))
        .collect();
    missing.sort_unstable();
    missing.dedup();

    for id in missing {
        log::warn!("no image for texture {id}, using a generated pattern");
        let (r, g, b) = FALLBACK_COLORS[id.0 as usize % FALLBACK_COLORS.len()];
        let pattern = match id.0 % 3 {
            1 => TexturePattern::Bricks,
            2 => TexturePattern::Checker,
            _ => TexturePattern::Stripes,
        };
        set.insert(id, Texture::procedural(pattern, size, pack_rgb(r, g, b))?)?;
    }

    log::info!("loaded {} textures ({} from files)", set.len(), files.len());
    Ok(set)
}

fn check_size(size: u32) -> Result<()> {
    if size.is_power_of_two() {
        Ok(())
    } else {
        Err(RaycastError::TextureSizeNotPowerOfTwo(size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Cell, WallDescriptor};

    #[test]
    fn size_must_be_power_of_two() {
        assert!(TextureSet::new(64).is_ok());
        assert!(matches!(
            TextureSet::new(48),
            Err(RaycastError::TextureSizeNotPowerOfTwo(48))
        ));
        assert!(Texture::solid(0, 0).is_err());
    }

    #[test]
    fn set_rejects_mismatched_size() {
        let mut set = TextureSet::new(64).unwrap();
        let err = set
            .insert(TextureId(1), Texture::solid(32, 0).unwrap())
            .unwrap_err();
        assert!(matches!(err, RaycastError::TextureSize { found: 32, .. }));
        assert!(set.is_empty());
    }

    #[test]
    fn get_pixel_is_row_major() {
        let pixels = (0..16).collect();
        let mut set = TextureSet::new(4).unwrap();
        set.insert(TextureId(3), Texture::from_pixels(4, pixels).unwrap())
            .unwrap();
        assert_eq!(set.get_pixel(TextureId(3), 1, 2), Some(9));
        assert_eq!(set.get_pixel(TextureId(4), 1, 2), None);
    }

    #[test]
    fn replacing_a_texture_keeps_its_slot() {
        let mut set = TextureSet::new(4).unwrap();
        set.insert(TextureId(5), Texture::solid(4, 1).unwrap()).unwrap();
        set.insert(TextureId(2), Texture::solid(4, 2).unwrap()).unwrap();
        let slot = set.slot(TextureId(5)).unwrap();

        set.insert(TextureId(5), Texture::solid(4, 3).unwrap()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.slot(TextureId(5)), Some(slot));
        assert_eq!(set.by_slot(slot).unwrap().pixel(0, 0), 3);
        assert_eq!(set.slot(TextureId(9)), None);
    }

    #[test]
    fn validate_reports_missing_texture() {
        let mut set = TextureSet::new(8).unwrap();
        set.insert(TextureId(1), Texture::solid(8, 0).unwrap())
            .unwrap();
        let world: WorldGrid = [
            (Cell::new(0, 0), WallDescriptor::new(1)),
            (Cell::new(4, 2), WallDescriptor::new(7)),
            (Cell::new(3, 9), WallDescriptor::new(7)),
        ]
        .into_iter()
        .collect();

        match set.validate_world(&world) {
            Err(RaycastError::UnknownTexture { cell, texture }) => {
                assert_eq!(cell, Cell::new(3, 9));
                assert_eq!(texture, TextureId(7));
            }
            other => panic!("expected UnknownTexture, got {other:?}"),
        }

        set.insert(TextureId(7), Texture::solid(8, 0).unwrap())
            .unwrap();
        assert!(set.validate_world(&world).is_ok());
    }

    #[test]
    fn procedural_uses_both_shades() {
        let color = pack_rgb(200, 100, 50);
        for pattern in [
            TexturePattern::Bricks,
            TexturePattern::Checker,
            TexturePattern::Stripes,
        ] {
            let tex = Texture::procedural(pattern, 64, color).unwrap();
            let lit = tex.pixels.iter().filter(|&&p| p == color).count();
            assert!(lit > 0 && lit < tex.pixels.len(), "{pattern:?}");
        }
    }

    #[test]
    fn loads_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wall.png");
        let img = image::RgbImage::from_fn(8, 8, |x, y| image::Rgb([x as u8 * 10, y as u8 * 10, 7]));
        img.save(&path).unwrap();

        let tex = Texture::from_image_file(&path).unwrap();
        assert_eq!(tex.size(), 8);
        assert_eq!(tex.pixel(3, 5), pack_rgb(30, 50, 7));
    }

    #[test]
    fn load_set_fills_missing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.png");
        image::RgbImage::from_pixel(16, 16, image::Rgb([1, 2, 3]))
            .save(&path)
            .unwrap();
        let world: WorldGrid = [
            (Cell::new(0, 0), WallDescriptor::new(1)),
            (Cell::new(1, 0), WallDescriptor::new(4)),
        ]
        .into_iter()
        .collect();

        let set = load_texture_set(16, &[(TextureId(1), path.as_path())], &world).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get_pixel(TextureId(1), 0, 0), Some(pack_rgb(1, 2, 3)));
        assert!(set.contains(TextureId(4)));
        assert!(set.validate_world(&world).is_ok());
    }

    #[test]
    fn load_set_rejects_wrong_file_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        image::RgbImage::new(32, 32).save(&path).unwrap();
        let err = load_texture_set(16, &[(TextureId(1), path.as_path())], &WorldGrid::new())
            .unwrap_err();
        assert!(matches!(err, RaycastError::TextureSize { expected: 16, found: 32, .. }));
    }

    #[test]
    fn rejects_non_square_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        image::RgbImage::new(16, 8).save(&path).unwrap();
        assert!(matches!(
            Texture::from_image_file(&path),
            Err(RaycastError::TextureNotSquare {
                width: 16,
                height: 8
            })
        ));
    }
}
