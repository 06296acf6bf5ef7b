//! Uncompressed texture data and skybox cubemaps.

use std::path::Path;

use corelib::{AssetError, AssetResult};

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
    /// Blue-green-red byte order, as stored by BMP.
    Bgr8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::Bgr8 => 3,
        }
    }
}

impl TextureData {
    /// Create a new texture with given dimensions and RGBA8 format.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self::new(width, height, TextureFormat::Rgba8, data)
    }

    /// Create a new texture with given dimensions and BGR8 format.
    pub fn new_bgr8(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self::new(width, height, TextureFormat::Bgr8, data)
    }

    fn new(width: u32, height: u32, format: TextureFormat, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * format.bytes_per_pixel() as usize,
            "Data size doesn't match {:?} format",
            format
        );
        Self {
            data,
            width,
            height,
            format,
        }
    }

    /// Load texture from PNG file, converted to RGBA8.
    pub fn load_png<P: AsRef<Path>>(path: P) -> AssetResult<Self> {
        let path = path.as_ref();
        log::info!("Loading texture from {:?}", path);

        let reader =
            image::ImageReader::open(path).map_err(|e| AssetError::file_unavailable(path, e))?;
        let img = reader.decode().map_err(|e| match e {
            image::ImageError::Unsupported(u) => {
                AssetError::UnsupportedFormat(format!("{}: {}", path.display(), u))
            }
            other => AssetError::MalformedTexture(format!("{}: {}", path.display(), other)),
        })?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let data = rgba.into_raw();

        log::info!("Loaded texture {}x{} with {} bytes", width, height, data.len());

        Ok(Self::new_rgba8(width, height, data))
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        self.format.bytes_per_pixel()
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size =
            self.width as usize * self.height as usize * self.bytes_per_pixel() as usize;
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }
}

/// Six square faces of equal size, in +X, -X, +Y, -Y, +Z, -Z order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CubemapData {
    pub faces: [TextureData; 6],
}

impl CubemapData {
    /// File stems of the faces, in upload order.
    pub const FACE_NAMES: [&'static str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

    /// Load `px.png`, `nx.png`, ... from `dir`.
    pub fn load_dir(dir: impl AsRef<Path>) -> AssetResult<Self> {
        let dir = dir.as_ref();
        log::info!("Loading cubemap from {:?}", dir);

        let mut faces = Vec::with_capacity(6);
        for name in Self::FACE_NAMES {
            faces.push(TextureData::load_png(dir.join(format!("{name}.png")))?);
        }
        let faces: [TextureData; 6] = faces
            .try_into()
            .map_err(|_| AssetError::MalformedTexture("cubemap needs six faces".into()))?;
        Self::from_faces(faces)
    }

    /// Validate that all faces are square and share one size.
    pub fn from_faces(faces: [TextureData; 6]) -> AssetResult<Self> {
        let size = faces[0].width;
        for (name, face) in Self::FACE_NAMES.iter().zip(&faces) {
            if face.width != face.height {
                return Err(AssetError::MalformedTexture(format!(
                    "cubemap face {} is not square ({}x{})",
                    name, face.width, face.height
                )));
            }
            if face.width != size {
                return Err(AssetError::MalformedTexture(format!(
                    "cubemap face {} is {}px, expected {}px",
                    name, face.width, size
                )));
            }
        }
        Ok(Self { faces })
    }

    pub fn face_size(&self) -> u32 {
        self.faces[0].width
    }
}
