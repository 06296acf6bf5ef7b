//! Uncompressed 24-bit BMP decoding.

use std::path::Path;

use corelib::{AssetError, AssetResult};

use crate::texture::TextureData;

pub const HEADER_SIZE: usize = 54;

const OFFSET_DATA_POS: usize = 0x0A;
const OFFSET_WIDTH: usize = 0x12;
const OFFSET_HEIGHT: usize = 0x16;
const OFFSET_BPP: usize = 0x1C;
const OFFSET_COMPRESSION: usize = 0x1E;
const OFFSET_IMAGE_SIZE: usize = 0x22;

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Load a BMP file into tightly packed BGR8 rows, bottom row first.
pub fn load_bmp_from_path(path: impl AsRef<Path>) -> AssetResult<TextureData> {
    let path = path.as_ref();
    log::info!("Loading BMP texture from {:?}", path);
    let bytes = corelib::read_file(path)?;
    let texture = decode_bmp(&bytes)?;
    log::info!(
        "Loaded BMP {:?}: {}x{}",
        path,
        texture.width,
        texture.height
    );
    Ok(texture)
}

/// Decode an in-memory BMP. Only `BI_RGB` 24 bits per pixel is supported.
pub fn decode_bmp(bytes: &[u8]) -> AssetResult<TextureData> {
    if bytes.len() < HEADER_SIZE {
        return Err(AssetError::MalformedTexture(format!(
            "BMP header truncated ({} of {} bytes)",
            bytes.len(),
            HEADER_SIZE
        )));
    }
    if &bytes[..2] != b"BM" {
        return Err(AssetError::MalformedTexture("missing BMP signature".into()));
    }

    let compression = read_u32(bytes, OFFSET_COMPRESSION);
    if compression != 0 {
        return Err(AssetError::UnsupportedFormat(format!(
            "BMP compression {compression}"
        )));
    }
    let bpp = read_u16(bytes, OFFSET_BPP);
    if bpp != 24 {
        return Err(AssetError::UnsupportedFormat(format!(
            "BMP with {bpp} bits per pixel"
        )));
    }

    let data_pos = match read_u32(bytes, OFFSET_DATA_POS) as usize {
        0 => HEADER_SIZE,
        pos => pos,
    };
    let width = read_u32(bytes, OFFSET_WIDTH) as i32;
    let raw_height = read_u32(bytes, OFFSET_HEIGHT) as i32;
    let image_size = read_u32(bytes, OFFSET_IMAGE_SIZE);
    log::debug!(
        "BMP header: {}x{}, data at {}, image size {}",
        width,
        raw_height,
        data_pos,
        image_size
    );

    if width <= 0 || raw_height == 0 {
        return Err(AssetError::MalformedTexture(format!(
            "BMP has invalid dimensions {width}x{raw_height}"
        )));
    }
    let width = width as u32;
    let height = raw_height.unsigned_abs();
    let top_down = raw_height < 0;

    let row_len = width as usize * 3;
    let stride = row_len.next_multiple_of(4);
    let needed = stride.checked_mul(height as usize).ok_or_else(|| {
        AssetError::MalformedTexture(format!("BMP dimensions {width}x{height} overflow"))
    })?;
    // 0 means unspecified; rows are read by padded stride either way.
    if image_size != 0 && (image_size as usize) < needed {
        return Err(AssetError::MalformedTexture(format!(
            "BMP image size {image_size} is smaller than {needed} bytes of {width}x{height} rows"
        )));
    }
    let pixels = bytes
        .get(data_pos..)
        .and_then(|rest| rest.get(..needed))
        .ok_or_else(|| {
            AssetError::MalformedTexture(format!(
                "BMP pixel data truncated: need {} bytes at offset {}, file has {}",
                needed,
                data_pos,
                bytes.len()
            ))
        })?;

    let mut rows: Vec<&[u8]> = pixels
        .chunks_exact(stride)
        .map(|row| &row[..row_len])
        .collect();
    if top_down {
        rows.reverse();
    }

    Ok(TextureData::new_bgr8(width, height, rows.concat()))
}
