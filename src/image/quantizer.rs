use crate::color::RGBColorFormat;
use crate::error::Error;
use crate::image::{PixelFormat, Raster};
use crate::Result;

/// 4x4 ordered dither thresholds, row major.
#[rustfmt::skip]
const BAYER_MATRIX: [i32; 16] = [
     0,  8,  2, 10,
    12,  4, 14,  6,
     3, 11,  1,  9,
    15,  7, 13,  5,
];

const BUCKET_COUNT: usize = 256;

/// Clamps `value` into `0..=255` without branching.
fn saturate(value: i32) -> u8 {
    let value = value & -((value >= 0) as i32);
    (value | ((255 - value) >> 31)) as u8
}

fn dither_offset(x: usize, y: usize) -> i32 {
    BAYER_MATRIX[((y & 3) << 2) + (x & 3)] << 1
}

/// 3 bits red, 3 bits green, 2 bits blue.
fn bucket_index(color: RGBColorFormat<u8>) -> u8 {
    (color.red >> 5 << 5) | (color.green >> 5 << 2) | (color.blue >> 6)
}

#[derive(Clone, Copy, Debug, Default)]
struct ColorBucket {
    sum: RGBColorFormat<u64>,
    count: u64,
}

impl ColorBucket {
    fn add(&mut self, color: RGBColorFormat<u8>) {
        self.sum += color;
        self.count += 1;
    }

    fn palette_entry(&self) -> RGBColorFormat<u8> {
        if self.count == 0 {
            RGBColorFormat::black()
        } else {
            self.sum.mean(self.count)
        }
    }
}

/// Reduces 24-bit images to 256 colors on a fixed 3-3-2 grid.
///
/// Every pixel is assigned to its grid cell while the cell's color sums are
/// collected. The palette entry of a cell is the mean of the pixels that
/// landed in it, so colors stay close to the source even though the grid
/// itself is fixed.
pub struct UniformQuantizer {
    dither: bool,
}

impl UniformQuantizer {
    pub fn new(dither: bool) -> Self {
        UniformQuantizer { dither }
    }

    pub fn quantize(&self, image: &Raster) -> Result<Raster> {
        if image.format() != PixelFormat::Rgb24 {
            return Err(Error::QuantizationRequiresRgb24(image.format()));
        }
        let mut output = Raster::new(image.width(), image.height(), PixelFormat::Indexed8, true)?;
        let mut buckets = [ColorBucket::default(); BUCKET_COUNT];

        for (y, (source, target)) in image.rows().zip(output.rows_mut()).enumerate() {
            for (x, (pixel, index)) in source.chunks_exact(3).zip(target.iter_mut()).enumerate() {
                let offset = if self.dither { dither_offset(x, y) } else { 0 };
                let color = RGBColorFormat::new(
                    saturate(pixel[0] as i32 + offset),
                    saturate(pixel[1] as i32 + offset),
                    saturate(pixel[2] as i32 + offset),
                );
                *index = bucket_index(color);
                buckets[*index as usize].add(color);
            }
        }

        if let Some(palette) = output.palette_mut() {
            for (entry, bucket) in palette.iter_mut().zip(buckets.iter()) {
                *entry = bucket.palette_entry();
            }
        }
        log::debug!(
            "{} of {} palette entries in use",
            buckets.iter().filter(|bucket| bucket.count > 0).count(),
            BUCKET_COUNT
        );
        Ok(output)
    }
}
