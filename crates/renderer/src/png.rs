//! PNG encoding for rendered tiles.
//!
//! Density tiles use few distinct colors at low point counts and many once a
//! hue gradient builds up, so the encoder picks per image:
//! - **Indexed PNG (color type 3)** when the tile has at most 256 colors
//! - **RGBA PNG (color type 6)** otherwise

use image::RgbaImage;
use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Write;

use density_common::{DensityError, DensityResult};

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096;

type Palette = Vec<[u8; 4]>;

/// Encode a rendered image, choosing indexed or RGBA output.
pub fn encode_png(image: &RgbaImage) -> DensityResult<Vec<u8>> {
    let (width, height) = image.dimensions();
    encode_rgba_auto(image.as_raw(), width as usize, height as usize)
}

/// Encode raw RGBA bytes (4 per pixel, row-major) with automatic mode
/// selection.
pub fn encode_rgba_auto(pixels: &[u8], width: usize, height: usize) -> DensityResult<Vec<u8>> {
    check_len(pixels, width, height)?;

    let palette = if pixels.len() / 4 >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels)
    } else {
        extract_palette_sequential(pixels)
    };

    match palette {
        Some((palette, indices)) => encode_indexed(width, height, &palette, &indices),
        None => encode_rgba(pixels, width, height),
    }
}

fn check_len(pixels: &[u8], width: usize, height: usize) -> DensityResult<()> {
    if pixels.len() != width * height * 4 {
        return Err(DensityError::Encode(format!(
            "expected {} bytes for {}x{} RGBA, got {}",
            width * height * 4,
            width,
            height,
            pixels.len()
        )));
    }
    Ok(())
}

#[inline(always)]
fn pack_color(px: &[u8]) -> u32 {
    u32::from_le_bytes([px[0], px[1], px[2], px[3]])
}

fn extract_palette_sequential(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let packed = pack_color(px);
        let index = match color_to_index.get(&packed) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push(packed.to_le_bytes());
                color_to_index.insert(packed, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Two parallel passes: collect per-chunk color sets and bail out once the
/// merged set exceeds the palette, then map every pixel to its index.
fn extract_palette_parallel(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let chunk_pixels = (pixels.len() / 4 / rayon::current_num_threads()).max(256);
    let chunk_size = chunk_pixels * 4;

    let unique: Vec<u32> = pixels
        .par_chunks(chunk_size)
        .flat_map(|chunk| {
            let mut local: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
            for px in chunk.chunks_exact(4) {
                local.insert(pack_color(px), ());
                if local.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            local.into_keys().collect::<Vec<_>>()
        })
        .collect();

    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    for packed in unique {
        if !color_to_index.contains_key(&packed) {
            if palette.len() >= MAX_PALETTE_SIZE {
                return None;
            }
            color_to_index.insert(packed, palette.len() as u8);
            palette.push(packed.to_le_bytes());
        }
    }

    let mut indices = vec![0u8; pixels.len() / 4];
    indices
        .par_chunks_mut(chunk_pixels)
        .zip(pixels.par_chunks(chunk_size))
        .for_each(|(out, src)| {
            for (idx, px) in out.iter_mut().zip(src.chunks_exact(4)) {
                *idx = color_to_index.get(&pack_color(px)).copied().unwrap_or(0);
            }
        });

    Some((palette, indices))
}

/// Indexed PNG from a palette and one index byte per pixel.
pub fn encode_indexed(
    width: usize,
    height: usize,
    palette: &[[u8; 4]],
    indices: &[u8],
) -> DensityResult<Vec<u8>> {
    if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE {
        return Err(DensityError::Encode(format!(
            "palette size {} out of range",
            palette.len()
        )));
    }
    if indices.len() != width * height {
        return Err(DensityError::Encode(format!(
            "expected {} indices, got {}",
            width * height,
            indices.len()
        )));
    }

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(indices, width, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Truecolor-with-alpha PNG.
pub fn encode_rgba(pixels: &[u8], width: usize, height: usize) -> DensityResult<Vec<u8>> {
    check_len(pixels, width, height)?;

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));

    let idat = deflate_scanlines(pixels, width * 4, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn ihdr(width: usize, height: usize, color_type: u8) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&(width as u32).to_be_bytes());
    data[4..8].copy_from_slice(&(height as u32).to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type;
    // compression, filter and interlace methods stay 0
    data
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each `row_bytes` scanline with filter type 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> DensityResult<Vec<u8>> {
    let mut raw = Vec::with_capacity(height * (1 + row_bytes));
    for row in data.chunks_exact(row_bytes.max(1)).take(height) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&raw)
        .map_err(|e| DensityError::Encode(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| DensityError::Encode(format!("IDAT compression failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn decode(png: &[u8]) -> RgbaImage {
        image::load_from_memory(png).unwrap().to_rgba8()
    }

    #[test]
    fn test_palette_dedups_colors() {
        let pixels = [
            255, 0, 0, 255, //
            0, 0, 0, 0, //
            0, 0, 255, 128, //
            255, 0, 0, 255,
        ];

        let (palette, indices) = extract_palette_sequential(&pixels).unwrap();
        assert_eq!(palette.len(), 3);
        assert_eq!(indices, vec![0, 1, 2, 0]);
        assert_eq!(palette[2], [0, 0, 255, 128]);
    }

    #[test]
    fn test_parallel_palette_matches_pixels() {
        let mut img = RgbaImage::new(128, 128);
        for (x, y, px) in img.enumerate_pixels_mut() {
            let level = ((x / 8 + y / 8) % 40) as u8;
            *px = Rgba([0, 106, 255, level * 6]);
        }

        let (palette, indices) = extract_palette_parallel(img.as_raw()).unwrap();
        assert_eq!(palette.len(), 40);
        for (i, px) in img.pixels().enumerate() {
            assert_eq!(palette[indices[i] as usize], px.0);
        }
    }

    #[test]
    fn test_too_many_colors_returns_none() {
        let mut pixels = Vec::new();
        for i in 0..300u32 {
            pixels.extend_from_slice(&[(i % 256) as u8, (i / 256) as u8, 0, 255]);
        }
        assert!(extract_palette_sequential(&pixels).is_none());
    }

    #[test]
    fn test_sparse_density_tile_is_indexed_and_decodes() {
        let mut img = RgbaImage::new(256, 256);
        img.put_pixel(10, 20, Rgba([64, 128, 255, 180]));
        img.put_pixel(200, 30, Rgba([255, 255, 255, 255]));

        let png = encode_png(&img).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
        // color type byte of IHDR
        assert_eq!(png[25], 3);

        let decoded = decode(&png);
        assert_eq!(decoded.dimensions(), (256, 256));
        assert_eq!(decoded.get_pixel(10, 20), &Rgba([64, 128, 255, 180]));
        assert_eq!(decoded.get_pixel(200, 30), &Rgba([255, 255, 255, 255]));
        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_gradient_tile_falls_back_to_rgba() {
        let mut img = RgbaImage::new(64, 64);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgba([x as u8 * 4, y as u8 * 4, 200, 255]);
        }

        let png = encode_png(&img).unwrap();
        assert_eq!(png[25], 6);
        assert_eq!(decode(&png), img);
    }

    #[test]
    fn test_length_mismatch_is_error() {
        let err = encode_rgba_auto(&[0u8; 12], 2, 2).unwrap_err();
        assert!(matches!(err, DensityError::Encode(_)));
    }
}
