//! Frame buffer types for decoded video frames in CPU memory.
//!
//! The cache stores frames in the decoder's native format (BGR, as OpenCV
//! and most FFmpeg software paths emit) and converts to the presentation
//! format on read.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Pixel format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit BGR (decoder-native)
    #[default]
    Bgr8,
    /// 8-bit RGB (presentation)
    Rgb8,
    /// 8-bit grayscale
    Gray8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bgr8 | Self::Rgb8 => 3,
            Self::Gray8 => 1,
        }
    }
}

/// A plane of pixel data with stride information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlane {
    /// Raw pixel data
    pub data: Vec<u8>,
    /// Bytes per row (may include padding)
    pub stride: usize,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per pixel
    pub bytes_per_pixel: usize,
}

impl FramePlane {
    /// Create a new frame plane with the given dimensions.
    pub fn new(width: u32, height: u32, bytes_per_pixel: usize) -> Self {
        // Align stride to 64 bytes for SIMD and GPU compatibility
        let min_stride = (width as usize) * bytes_per_pixel;
        let stride = (min_stride + 63) & !63;
        let data = vec![0u8; stride * height as usize];
        Self {
            data,
            stride,
            width,
            height,
            bytes_per_pixel,
        }
    }

    /// Get a row of pixel data (without stride padding).
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        let end = start + (self.width as usize * self.bytes_per_pixel);
        &self.data[start..end]
    }

    /// Get a mutable row of pixel data (without stride padding).
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        let end = start + (self.width as usize * self.bytes_per_pixel);
        &mut self.data[start..end]
    }
}

/// A video frame in CPU memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixel format
    pub format: PixelFormat,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel data planes (single-plane for all supported formats)
    pub planes: SmallVec<[FramePlane; 1]>,
}

impl FrameBuffer {
    /// Create a new zero-filled frame buffer.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let planes = smallvec::smallvec![FramePlane::new(
            width,
            height,
            format.bytes_per_pixel()
        )];
        Self {
            format,
            width,
            height,
            planes,
        }
    }

    /// Total memory usage of this frame in bytes.
    pub fn memory_size(&self) -> usize {
        self.planes.iter().map(|p| p.data.len()).sum()
    }

    /// Get the primary plane (plane 0).
    #[inline]
    pub fn primary_plane(&self) -> &FramePlane {
        &self.planes[0]
    }

    /// Get the primary plane mutably.
    #[inline]
    pub fn primary_plane_mut(&mut self) -> &mut FramePlane {
        &mut self.planes[0]
    }

    /// Convert to the RGB presentation format.
    ///
    /// BGR swaps channel order per pixel, grayscale replicates the single
    /// channel. An RGB input is returned as a plain copy.
    pub fn to_rgb(&self) -> FrameBuffer {
        match self.format {
            PixelFormat::Rgb8 => self.clone(),
            PixelFormat::Bgr8 => {
                let mut out = FrameBuffer::new(self.width, self.height, PixelFormat::Rgb8);
                let src = self.primary_plane();
                let dst = out.primary_plane_mut();
                for y in 0..self.height {
                    let src_row = src.row(y);
                    let dst_row = dst.row_mut(y);
                    for x in 0..self.width as usize {
                        let i = x * 3;
                        dst_row[i] = src_row[i + 2];
                        dst_row[i + 1] = src_row[i + 1];
                        dst_row[i + 2] = src_row[i];
                    }
                }
                out
            }
            PixelFormat::Gray8 => {
                let mut out = FrameBuffer::new(self.width, self.height, PixelFormat::Rgb8);
                let src = self.primary_plane();
                let dst = out.primary_plane_mut();
                for y in 0..self.height {
                    let src_row = src.row(y);
                    let dst_row = dst.row_mut(y);
                    for x in 0..self.width as usize {
                        let v = src_row[x];
                        let i = x * 3;
                        dst_row[i] = v;
                        dst_row[i + 1] = v;
                        dst_row[i + 2] = v;
                    }
                }
                out
            }
        }
    }

    /// Create a test pattern frame (color bars) in the given format.
    pub fn test_pattern(width: u32, height: u32, format: PixelFormat) -> Self {
        let mut frame = Self::new(width, height, format);
        let bpp = format.bytes_per_pixel();
        let plane = frame.primary_plane_mut();

        // Color bars pattern (8 bars), RGB order
        let colors: [[u8; 3]; 8] = [
            [255, 255, 255], // White
            [255, 255, 0],   // Yellow
            [0, 255, 255],   // Cyan
            [0, 255, 0],     // Green
            [255, 0, 255],   // Magenta
            [255, 0, 0],     // Red
            [0, 0, 255],     // Blue
            [0, 0, 0],       // Black
        ];

        for y in 0..height {
            let row = plane.row_mut(y);
            for x in 0..width {
                let bar = (x * 8 / width) as usize;
                let [r, g, b] = colors[bar];
                let i = x as usize * bpp;
                match format {
                    PixelFormat::Rgb8 => {
                        row[i] = r;
                        row[i + 1] = g;
                        row[i + 2] = b;
                    }
                    PixelFormat::Bgr8 => {
                        row[i] = b;
                        row[i + 1] = g;
                        row[i + 2] = r;
                    }
                    PixelFormat::Gray8 => {
                        row[i] = ((r as u16 + g as u16 + b as u16) / 3) as u8;
                    }
                }
            }
        }

        frame
    }
}
