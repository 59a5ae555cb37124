//! Video frame type and pixel-level processing

use image::{imageops, GrayImage, RgbImage};

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Create a black frame of the given size (useful for tests and padding)
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            data: vec![0; (width * height * 3) as usize],
            width,
            height,
            timestamp_ns: 0,
            sequence: 0,
        }
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        if idx + 2 >= self.data.len() {
            return None;
        }
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Set pixel at (x, y); out-of-bounds writes are ignored
    pub fn put_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        if idx + 2 < self.data.len() {
            self.data[idx..idx + 3].copy_from_slice(&rgb);
        }
    }

    /// Convert to an owned `RgbImage` for drawing and warping
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// Build a frame from an annotated `RgbImage`, keeping capture metadata
    pub fn from_rgb_image(image: RgbImage, timestamp_ns: u64, sequence: u32) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Convert to grayscale using the BT.601 luminance weights
    pub fn to_luma_image(&self) -> GrayImage {
        let mut gray = Vec::with_capacity((self.width * self.height) as usize);
        for pixel in self.data.chunks_exact(3) {
            let y = (pixel[0] as f32 * 0.299 + pixel[1] as f32 * 0.587 + pixel[2] as f32 * 0.114)
                as u8;
            gray.push(y);
        }
        GrayImage::from_raw(self.width, self.height, gray)
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }

    /// Crop a region of the frame
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Option<VideoFrame> {
        if x + w > self.width || y + h > self.height {
            return None;
        }

        let mut cropped = Vec::with_capacity((w * h * 3) as usize);
        for row in y..(y + h) {
            let start = ((row * self.width + x) * 3) as usize;
            let end = start + (w * 3) as usize;
            cropped.extend_from_slice(&self.data[start..end]);
        }

        Some(VideoFrame {
            data: cropped,
            width: w,
            height: h,
            timestamp_ns: self.timestamp_ns,
            sequence: self.sequence,
        })
    }

    /// Resize the frame with bilinear filtering
    pub fn resize(&self, new_width: u32, new_height: u32) -> VideoFrame {
        let resized = imageops::resize(
            &self.to_rgb_image(),
            new_width,
            new_height,
            imageops::FilterType::Triangle,
        );
        VideoFrame {
            data: resized.into_raw(),
            width: new_width,
            height: new_height,
            timestamp_ns: self.timestamp_ns,
            sequence: self.sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> VideoFrame {
        let mut frame = VideoFrame::blank(width, height);
        for y in 0..height {
            for x in 0..width {
                frame.put_pixel(x, y, [(x % 256) as u8, (y % 256) as u8, 128]);
            }
        }
        frame
    }

    #[test]
    fn test_pixel_roundtrip_and_bounds() {
        let mut frame = VideoFrame::blank(8, 4);
        frame.put_pixel(3, 2, [10, 20, 30]);

        assert_eq!(frame.get_pixel(3, 2), Some([10, 20, 30]));
        assert_eq!(frame.get_pixel(8, 0), None);
        assert_eq!(frame.get_pixel(0, 4), None);
    }

    #[test]
    fn test_crop_region() {
        let frame = gradient_frame(16, 16);
        let cropped = frame.crop(4, 4, 8, 8).unwrap();

        assert_eq!(cropped.width, 8);
        assert_eq!(cropped.height, 8);
        assert_eq!(cropped.get_pixel(0, 0), frame.get_pixel(4, 4));
        assert!(frame.crop(10, 10, 8, 8).is_none());
    }

    #[test]
    fn test_luma_conversion() {
        let mut frame = VideoFrame::blank(2, 1);
        frame.put_pixel(0, 0, [255, 255, 255]);

        let gray = frame.to_luma_image();
        assert!(gray.get_pixel(0, 0).0[0] > 250);
        assert_eq!(gray.get_pixel(1, 0).0[0], 0);
    }

    #[test]
    fn test_rgb_image_roundtrip() {
        let frame = gradient_frame(6, 5);
        let image = frame.to_rgb_image();
        let back = VideoFrame::from_rgb_image(image, frame.timestamp_ns, frame.sequence);

        assert_eq!(back.width, 6);
        assert_eq!(back.height, 5);
        assert_eq!(back.data, frame.data);
    }

    #[test]
    fn test_resize_dimensions() {
        let frame = gradient_frame(16, 8);
        let resized = frame.resize(8, 4);
        assert_eq!(resized.width, 8);
        assert_eq!(resized.height, 4);
        assert_eq!(resized.data.len(), 8 * 4 * 3);
    }
}
