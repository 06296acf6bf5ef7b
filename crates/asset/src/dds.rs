//! DDS container decoding for block-compressed (DXT1/DXT3/DXT5) textures.
//!
//! The compressed blocks are sliced per mip level and handed over as-is; no
//! pixel decompression happens on the CPU.

use std::{fmt, ops::Range, path::Path};

use corelib::{AssetError, AssetResult};

pub const MAGIC: &[u8; 4] = b"DDS ";
pub const HEADER_SIZE: usize = 124;

// Byte offsets inside the 124-byte header (which starts after the magic).
const OFFSET_HEIGHT: usize = 8;
const OFFSET_WIDTH: usize = 12;
const OFFSET_LINEAR_SIZE: usize = 16;
const OFFSET_MIPMAP_COUNT: usize = 24;
const OFFSET_FOURCC: usize = 80;

/// Block compression formats recognized in the header's FourCC field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompressionFormat {
    Dxt1,
    Dxt3,
    Dxt5,
}

impl CompressionFormat {
    pub const DXT1_FOURCC: u32 = u32::from_le_bytes(*b"DXT1");
    pub const DXT3_FOURCC: u32 = u32::from_le_bytes(*b"DXT3");
    pub const DXT5_FOURCC: u32 = u32::from_le_bytes(*b"DXT5");

    pub fn from_fourcc(fourcc: u32) -> Option<Self> {
        match fourcc {
            Self::DXT1_FOURCC => Some(Self::Dxt1),
            Self::DXT3_FOURCC => Some(Self::Dxt3),
            Self::DXT5_FOURCC => Some(Self::Dxt5),
            _ => None,
        }
    }

    pub fn fourcc(self) -> u32 {
        match self {
            Self::Dxt1 => Self::DXT1_FOURCC,
            Self::Dxt3 => Self::DXT3_FOURCC,
            Self::Dxt5 => Self::DXT5_FOURCC,
        }
    }

    /// Bytes per 4x4 block.
    pub fn block_size(self) -> usize {
        match self {
            Self::Dxt1 => 8,
            Self::Dxt3 | Self::Dxt5 => 16,
        }
    }

    /// Size of one level, rounded up to whole 4x4 blocks, or `None` if it
    /// does not fit in `usize`.
    pub fn level_size(self, width: u32, height: u32) -> Option<usize> {
        let blocks_x = (width as usize).div_ceil(4);
        let blocks_y = (height as usize).div_ceil(4);
        blocks_x
            .checked_mul(blocks_y)?
            .checked_mul(self.block_size())
    }
}

impl fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dxt1 => "DXT1",
            Self::Dxt3 => "DXT3",
            Self::Dxt5 => "DXT5",
        };
        f.write_str(name)
    }
}

/// Decoder switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DdsOptions {
    /// Require the whole declared payload (`linear_size * 2` for mip-mapped
    /// files) to be present. When off, a shorter payload is accepted as long
    /// as every mip level still fits.
    pub strict_payload: bool,
}

impl Default for DdsOptions {
    fn default() -> Self {
        Self {
            strict_payload: true,
        }
    }
}

/// Header fields the decoder needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DdsHeader {
    pub height: u32,
    pub width: u32,
    pub linear_size: u32,
    pub mipmap_count: u32,
    pub fourcc: u32,
}

impl DdsHeader {
    pub fn parse(header: &[u8]) -> AssetResult<Self> {
        if header.len() < HEADER_SIZE {
            return Err(AssetError::MalformedTexture(format!(
                "DDS header truncated ({} of {} bytes)",
                header.len(),
                HEADER_SIZE
            )));
        }
        let field = |offset: usize| {
            u32::from_le_bytes([
                header[offset],
                header[offset + 1],
                header[offset + 2],
                header[offset + 3],
            ])
        };
        Ok(Self {
            height: field(OFFSET_HEIGHT),
            width: field(OFFSET_WIDTH),
            linear_size: field(OFFSET_LINEAR_SIZE),
            mipmap_count: field(OFFSET_MIPMAP_COUNT),
            fourcc: field(OFFSET_FOURCC),
        })
    }

    /// Bytes the header declares for all levels together.
    pub fn declared_payload(&self) -> usize {
        let linear = self.linear_size as usize;
        if self.mipmap_count > 1 {
            linear.saturating_mul(2)
        } else {
            linear
        }
    }
}

/// One mip level inside [`DdsTexture::data`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MipLevel {
    pub level: u32,
    pub width: u32,
    pub height: u32,
    pub range: Range<usize>,
}

/// Decoded DDS texture: all levels' compressed blocks back-to-back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DdsTexture {
    pub width: u32,
    pub height: u32,
    pub mipmap_count: u32,
    pub format: CompressionFormat,
    pub data: Vec<u8>,
    pub levels: Vec<MipLevel>,
}

impl DdsTexture {
    /// Compressed blocks of one level.
    pub fn level_data(&self, level: &MipLevel) -> &[u8] {
        &self.data[level.range.clone()]
    }

    /// `(level, width, height, bytes)` in upload order.
    pub fn iter_levels(&self) -> impl Iterator<Item = (u32, u32, u32, &[u8])> + '_ {
        self.levels
            .iter()
            .map(|l| (l.level, l.width, l.height, self.level_data(l)))
    }

    /// Returns `true` if the level table exactly covers `data`.
    pub fn is_valid(&self) -> bool {
        let mut offset = 0;
        for l in &self.levels {
            let expected = self.format.level_size(l.width, l.height);
            if l.range.start != offset || Some(l.range.len()) != expected {
                return false;
            }
            offset = l.range.end;
        }
        offset == self.data.len() && !self.levels.is_empty()
    }
}

/// Load a DDS texture from a file path.
pub fn load_dds_from_path(path: impl AsRef<Path>, options: DdsOptions) -> AssetResult<DdsTexture> {
    let path = path.as_ref();
    log::info!("Loading DDS texture from {:?}", path);
    let bytes = corelib::read_file(path)?;
    let texture = decode_dds(&bytes, options)?;
    log::info!(
        "Loaded DDS {:?}: {}x{} {} with {} levels ({} bytes)",
        path,
        texture.width,
        texture.height,
        texture.format,
        texture.levels.len(),
        texture.data.len()
    );
    Ok(texture)
}

/// Decode a DDS file already in memory.
pub fn decode_dds(bytes: &[u8], options: DdsOptions) -> AssetResult<DdsTexture> {
    let Some(magic) = bytes.get(..MAGIC.len()) else {
        return Err(AssetError::MalformedTexture(
            "file too short for DDS magic".into(),
        ));
    };
    if magic != MAGIC {
        return Err(AssetError::MalformedTexture(format!(
            "bad DDS magic {:?}",
            String::from_utf8_lossy(magic)
        )));
    }

    let header = DdsHeader::parse(&bytes[MAGIC.len()..])?;
    log::debug!("DDS header: {:?}", header);

    let format = CompressionFormat::from_fourcc(header.fourcc).ok_or_else(|| {
        AssetError::UnsupportedFormat(format!(
            "DDS FourCC {:?} (0x{:08x})",
            String::from_utf8_lossy(&header.fourcc.to_le_bytes()),
            header.fourcc
        ))
    })?;

    let payload_start = MAGIC.len() + HEADER_SIZE;
    let available = bytes.len() - payload_start;
    let declared = header.declared_payload();
    let payload_len = if available >= declared {
        declared
    } else if options.strict_payload {
        return Err(AssetError::MalformedTexture(format!(
            "DDS payload truncated: {} of {} bytes",
            available, declared
        )));
    } else {
        log::warn!(
            "DDS payload shorter than declared ({} of {} bytes), continuing",
            available,
            declared
        );
        available
    };
    let payload = &bytes[payload_start..payload_start + payload_len];

    // Files without the mip-count flag store 0.
    let mipmap_count = header.mipmap_count.max(1);
    // A u32 dimension halves to 1 within 32 levels; the count itself is untrusted.
    let mut levels = Vec::with_capacity(mipmap_count.min(32) as usize);
    let (mut width, mut height) = (header.width, header.height);
    let mut offset = 0usize;

    for level in 0..mipmap_count {
        if width == 0 && height == 0 {
            break;
        }
        let size = format.level_size(width, height).ok_or_else(|| {
            AssetError::MalformedTexture(format!(
                "DDS level {} size overflows ({}x{})",
                level, width, height
            ))
        })?;
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= payload.len())
            .ok_or_else(|| {
                AssetError::MalformedTexture(format!(
                    "DDS level {} ({}x{}, {} bytes) exceeds payload of {} bytes",
                    level,
                    width,
                    height,
                    size,
                    payload.len()
                ))
            })?;
        levels.push(MipLevel {
            level,
            width,
            height,
            range: offset..end,
        });
        offset = end;
        width = (width / 2).max(1);
        height = (height / 2).max(1);
    }

    if levels.is_empty() {
        return Err(AssetError::MalformedTexture(
            "DDS texture has zero dimensions".into(),
        ));
    }

    Ok(DdsTexture {
        width: header.width,
        height: header.height,
        mipmap_count: header.mipmap_count,
        format,
        data: payload[..offset].to_vec(),
        levels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_dds(width: u32, height: u32, mips: u32, fourcc: &[u8; 4], linear: u32, payload: usize) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
        header[OFFSET_HEIGHT..OFFSET_HEIGHT + 4].copy_from_slice(&height.to_le_bytes());
        header[OFFSET_WIDTH..OFFSET_WIDTH + 4].copy_from_slice(&width.to_le_bytes());
        header[OFFSET_LINEAR_SIZE..OFFSET_LINEAR_SIZE + 4].copy_from_slice(&linear.to_le_bytes());
        header[OFFSET_MIPMAP_COUNT..OFFSET_MIPMAP_COUNT + 4].copy_from_slice(&mips.to_le_bytes());
        header[OFFSET_FOURCC..OFFSET_FOURCC + 4].copy_from_slice(fourcc);
        bytes.extend_from_slice(&header);
        bytes.extend((0..payload).map(|i| (i % 251) as u8));
        bytes
    }

    #[test]
    fn fourcc_values_match_ascii() {
        assert_eq!(CompressionFormat::DXT1_FOURCC, 0x3154_5844);
        assert_eq!(CompressionFormat::DXT3_FOURCC, 0x3354_5844);
        assert_eq!(CompressionFormat::DXT5_FOURCC, 0x3554_5844);
        assert_eq!(
            CompressionFormat::from_fourcc(0x3554_5844),
            Some(CompressionFormat::Dxt5)
        );
    }

    #[test]
    fn dxt1_mip_chain_level_sizes() {
        let bytes = build_dds(128, 128, 9, b"DXT1", 8192, 16384);
        let tex = decode_dds(&bytes, DdsOptions::default()).unwrap();
        let sizes: Vec<usize> = tex.levels.iter().map(|l| l.range.len()).collect();
        assert_eq!(sizes, vec![8192, 2048, 512, 128, 32, 8, 8, 8, 8]);
        let dims: Vec<(u32, u32)> = tex.levels.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(dims[7], (1, 1));
        assert_eq!(dims[8], (1, 1));
        assert_eq!(tex.data.len(), sizes.iter().sum::<usize>());
        assert!(tex.is_valid());
    }

    #[test]
    fn level_slices_are_back_to_back() {
        let bytes = build_dds(16, 8, 3, b"DXT5", 128, 256);
        let tex = decode_dds(&bytes, DdsOptions::default()).unwrap();
        assert_eq!(tex.format, CompressionFormat::Dxt5);
        let levels: Vec<_> = tex.iter_levels().collect();
        assert_eq!(levels.len(), 3);
        assert_eq!((levels[0].1, levels[0].2, levels[0].3.len()), (16, 8, 128));
        assert_eq!((levels[1].1, levels[1].2, levels[1].3.len()), (8, 4, 32));
        assert_eq!((levels[2].1, levels[2].2, levels[2].3.len()), (4, 2, 16));
        let payload = &bytes[MAGIC.len() + HEADER_SIZE..];
        assert_eq!(levels[1].3, &payload[128..160]);
        assert_eq!(levels[2].3, &payload[160..176]);
    }

    #[test]
    fn non_power_of_two_rounds_up_to_blocks() {
        assert_eq!(CompressionFormat::Dxt1.level_size(5, 3), Some(2 * 8));
        assert_eq!(CompressionFormat::Dxt3.level_size(1, 1), Some(16));
        assert_eq!(CompressionFormat::Dxt5.level_size(9, 9), Some(9 * 16));
    }

    #[test]
    fn single_level_reads_linear_size() {
        let bytes = build_dds(8, 8, 1, b"DXT3", 64, 64);
        let tex = decode_dds(&bytes, DdsOptions::default()).unwrap();
        assert_eq!(tex.levels.len(), 1);
        assert_eq!(tex.data.len(), 64);

        let bytes = build_dds(8, 8, 0, b"DXT3", 64, 64);
        let tex = decode_dds(&bytes, DdsOptions::default()).unwrap();
        assert_eq!(tex.levels.len(), 1);
    }

    #[test]
    fn bad_magic_is_malformed() {
        let mut bytes = build_dds(4, 4, 1, b"DXT1", 8, 8);
        bytes[..4].copy_from_slice(b"DDX ");
        let err = decode_dds(&bytes, DdsOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::MalformedTexture(_)));

        let err = decode_dds(b"DD", DdsOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::MalformedTexture(_)));
    }

    #[test]
    fn truncated_header_is_malformed() {
        let bytes = build_dds(4, 4, 1, b"DXT1", 8, 8);
        let err = decode_dds(&bytes[..60], DdsOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::MalformedTexture(_)));
    }

    #[test]
    fn unknown_fourcc_is_unsupported() {
        let bytes = build_dds(4, 4, 1, b"ATI2", 16, 16);
        let err = decode_dds(&bytes, DdsOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedFormat(_)));
        assert!(err.to_string().contains("ATI2"));
    }

    #[test]
    fn short_payload_strict_and_lenient() {
        // 64x64 DXT1 full chain needs 2048+512+128+32+8+8+8 = 2744 bytes,
        // but the header declares 2 * 2048.
        let bytes = build_dds(64, 64, 7, b"DXT1", 2048, 2744);
        let err = decode_dds(&bytes, DdsOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::MalformedTexture(_)));

        let lenient = DdsOptions {
            strict_payload: false,
        };
        let tex = decode_dds(&bytes, lenient).unwrap();
        assert_eq!(tex.levels.len(), 7);
        assert_eq!(tex.data.len(), 2744);
        assert!(tex.is_valid());

        let err = decode_dds(&bytes[..bytes.len() - 1], lenient).unwrap_err();
        assert!(matches!(err, AssetError::MalformedTexture(_)));
    }

    #[test]
    fn level_beyond_payload_is_malformed() {
        // Declared linear size too small for the stated dimensions.
        let bytes = build_dds(64, 64, 1, b"DXT1", 100, 100);
        let err = decode_dds(&bytes, DdsOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::MalformedTexture(_)));
    }

    #[test]
    fn huge_dimensions_are_malformed() {
        let bytes = build_dds(u32::MAX, u32::MAX, 1, b"DXT5", 16, 16);
        let err = decode_dds(&bytes, DdsOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::MalformedTexture(_)));
        assert_eq!(CompressionFormat::Dxt5.level_size(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn huge_mip_count_stops_at_payload_end() {
        let bytes = build_dds(4, 4, u32::MAX, b"DXT1", 8, 16);
        let err = decode_dds(&bytes, DdsOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::MalformedTexture(_)));
    }

    #[test]
    fn zero_dimensions_are_malformed() {
        let bytes = build_dds(0, 0, 3, b"DXT1", 0, 0);
        let err = decode_dds(&bytes, DdsOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::MalformedTexture(_)));
    }

    #[test]
    fn load_from_path() {
        let path = std::env::temp_dir().join(format!("asset-dds-test-{}.dds", std::process::id()));
        std::fs::write(&path, build_dds(4, 4, 1, b"DXT1", 8, 8)).unwrap();
        let tex = load_dds_from_path(&path, DdsOptions::default()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!((tex.width, tex.height), (4, 4));

        let err = load_dds_from_path(&path, DdsOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::FileUnavailable { .. }));
    }
}
