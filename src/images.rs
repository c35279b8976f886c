/// Image loading for cards and the viewer
///
/// Downloads a pin's image and reads its natural dimensions, which the
/// layout needs to replace the estimated card height. Decoding is
/// CPU-bound, so it runs on the blocking pool. Originals larger than
/// `max_edge` are scaled down before they are kept; the reported size is
/// always the natural one.

use iced::widget::image::Handle;
use image::imageops::FilterType;
use tokio::task;

use crate::api::ApiClient;
use crate::error::ViewerError;
use crate::state::ImageSize;

/// A downloaded image, ready for display
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub handle: Handle,
    pub size: ImageSize,
}

/// Download and decode the image of one pin
pub async fn load_image(api: ApiClient, image_url: String, max_edge: u32) -> Result<LoadedImage, ViewerError> {
    let bytes = api.fetch_image(&image_url).await?;

    // Spawn blocking because decoding large originals is CPU-intensive
    task::spawn_blocking(move || decode_image(bytes, max_edge))
        .await
        .map_err(|e| ViewerError::Decode(format!("task join error: {}", e)))?
}

/// Blocking implementation: read dimensions, shrink and decode into RGBA
fn decode_image(bytes: Vec<u8>, max_edge: u32) -> Result<LoadedImage, ViewerError> {
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| ViewerError::Decode(format!("image: {}", e)))?;

    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(ViewerError::Decode("image: zero-sized".to_string()));
    }

    let decoded = if width.max(height) > max_edge {
        decoded.resize(max_edge, max_edge, FilterType::Triangle)
    } else {
        decoded
    };

    let rgba = decoded.into_rgba8();
    log::debug!(
        "📷 Decoded image: {}x{} (kept at {}x{})",
        width,
        height,
        rgba.width(),
        rgba.height()
    );

    Ok(LoadedImage {
        handle: Handle::from_rgba(rgba.width(), rgba.height(), rgba.into_raw()),
        size: ImageSize { width, height },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_reports_natural_size() {
        let loaded = decode_image(png(30, 45), 1600).unwrap();
        assert_eq!(loaded.size, ImageSize { width: 30, height: 45 });
    }

    #[test]
    fn test_large_image_is_shrunk_but_keeps_natural_size() {
        let loaded = decode_image(png(600, 900), 300).unwrap();
        assert_eq!(loaded.size, ImageSize { width: 600, height: 900 });
        match loaded.handle {
            Handle::Rgba { width, height, .. } => assert_eq!((width, height), (200, 300)),
            other => panic!("expected rgba handle, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let result = decode_image(b"definitely not an image".to_vec(), 1600);
        assert!(matches!(result, Err(ViewerError::Decode(_))));
    }
}
