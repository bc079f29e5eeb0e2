//! Crop rasterization against an abstract host rendering surface.

use std::io::Cursor;

use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use thiserror::Error;

use crate::geometry::{BoundingBox, DisplayRect, Point, Size};
use crate::workspace::mapper::{LayoutSnapshot, LayoutSource};
use crate::workspace::ViewportTransform;

/// Largest side a drawing surface may have; mirrors common canvas limits.
const MAX_SURFACE_SIDE: u32 = 16_384;
const MAX_SURFACE_PIXELS: u64 = 268_435_456;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("render surface unavailable for {width}x{height}")]
    RenderSurfaceUnavailable { width: u32, height: u32 },
    #[error("region {region:?} does not overlap the {image_width}x{image_height} source image")]
    RegionOutOfBounds {
        region: DisplayRect,
        image_width: u32,
        image_height: u32,
    },
    #[error("image element has no usable css box ({width}x{height})")]
    DegenerateLayout { width: f64, height: f64 },
    #[error("failed to encode crop: {source}")]
    Encode {
        #[source]
        source: image::ImageError,
    },
}

pub type RasterResult<T> = std::result::Result<T, RasterError>;

/// Encoded crop handed to the product collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropPayload {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Source-image pixels to sample, already intersected with the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRegion {
    pub rect: DisplayRect,
}

/// Host rendering environment: layout queries, scratch surfaces, region
/// drawing and serialization. Nothing else is required of the host.
pub trait RenderHost: LayoutSource {
    type Surface;

    fn acquire_surface(&self, width: u32, height: u32) -> Option<Self::Surface>;
    fn draw_region(&self, surface: &mut Self::Surface, region: SourceRegion) -> RasterResult<()>;
    fn encode(&self, surface: Self::Surface) -> RasterResult<Vec<u8>>;
}

/// Intersects a native-space rectangle with the source pixel grid.
pub fn clamp_region_to_image(
    region: DisplayRect,
    image_width: u32,
    image_height: u32,
) -> Option<DisplayRect> {
    let left = region.x.max(0.0);
    let top = region.y.max(0.0);
    let right = region.right().min(f64::from(image_width));
    let bottom = region.bottom().min(f64::from(image_height));
    if !(right > left && bottom > top) {
        return None;
    }
    Some(DisplayRect::new(left, top, right - left, bottom - top))
}

/// Rasterizes `native_rect` at native resolution. The region is clamped to the
/// source image; a region with no overlap fails with `RegionOutOfBounds`.
pub fn rasterize<H: RenderHost + ?Sized>(
    host: &H,
    native_rect: DisplayRect,
) -> RasterResult<CropPayload> {
    let layout = host.layout();
    let out_of_bounds = || RasterError::RegionOutOfBounds {
        region: native_rect,
        image_width: layout.natural_width,
        image_height: layout.natural_height,
    };
    let rect = clamp_region_to_image(native_rect, layout.natural_width, layout.natural_height)
        .ok_or_else(out_of_bounds)?;

    let width = rect.w.round() as u32;
    let height = rect.h.round() as u32;
    if width == 0 || height == 0 {
        return Err(out_of_bounds());
    }

    let mut surface = host
        .acquire_surface(width, height)
        .ok_or(RasterError::RenderSurfaceUnavailable { width, height })?;
    host.draw_region(&mut surface, SourceRegion { rect })?;
    let png = host.encode(surface)?;

    tracing::debug!(width, height, region = ?rect, bytes = png.len(), "crop rasterized");
    Ok(CropPayload { png, width, height })
}

/// In-process host backed by a decoded `RgbaImage`.
///
/// Layout is derived from the CSS box the image is shown at, the element's
/// untransformed origin and the last viewport synced into it.
#[derive(Debug, Clone)]
pub struct ImageRenderHost {
    source: RgbaImage,
    css_size: Size,
    element_origin: Point,
    viewport: ViewportTransform,
}

impl ImageRenderHost {
    /// Host showing `source` at its native size.
    pub fn new(source: RgbaImage) -> Self {
        let css_size = Size::new(f64::from(source.width()), f64::from(source.height()));
        Self::with_css_size(source, css_size)
    }

    pub fn with_css_size(source: RgbaImage, css_size: Size) -> Self {
        Self {
            source,
            css_size,
            element_origin: Point::default(),
            viewport: ViewportTransform::new(),
        }
    }

    pub fn source(&self) -> &RgbaImage {
        &self.source
    }

    pub fn set_element_origin(&mut self, origin: Point) {
        self.element_origin = origin;
    }

    pub fn sync_viewport(&mut self, viewport: &ViewportTransform) {
        self.viewport = *viewport;
    }
}

impl LayoutSource for ImageRenderHost {
    fn layout(&self) -> LayoutSnapshot {
        let top_left = self.viewport.apply(Point::default());
        let scale = self.viewport.scale();
        LayoutSnapshot {
            bounds: BoundingBox::new(
                self.element_origin.x + top_left.x,
                self.element_origin.y + top_left.y,
                self.css_size.width * scale,
                self.css_size.height * scale,
            ),
            css_size: self.css_size,
            natural_width: self.source.width(),
            natural_height: self.source.height(),
        }
    }
}

impl RenderHost for ImageRenderHost {
    type Surface = RgbaImage;

    fn acquire_surface(&self, width: u32, height: u32) -> Option<RgbaImage> {
        if width == 0 || height == 0 || width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
            return None;
        }
        if u64::from(width) * u64::from(height) > MAX_SURFACE_PIXELS {
            return None;
        }
        Some(RgbaImage::new(width, height))
    }

    fn draw_region(&self, surface: &mut RgbaImage, region: SourceRegion) -> RasterResult<()> {
        let rect = region.rect;
        let aligned = rect.x.fract() == 0.0
            && rect.y.fract() == 0.0
            && rect.w == f64::from(surface.width())
            && rect.h == f64::from(surface.height());
        if aligned {
            let block = imageops::crop_imm(
                &self.source,
                rect.x as u32,
                rect.y as u32,
                surface.width(),
                surface.height(),
            )
            .to_image();
            imageops::replace(surface, &block, 0, 0);
            return Ok(());
        }

        // Sample at each output pixel centre mapped into the fractional region.
        let step_x = rect.w / f64::from(surface.width());
        let step_y = rect.h / f64::from(surface.height());
        for (x, y, pixel) in surface.enumerate_pixels_mut() {
            let source_x = rect.x + (f64::from(x) + 0.5) * step_x - 0.5;
            let source_y = rect.y + (f64::from(y) + 0.5) * step_y - 0.5;
            *pixel = sample_bilinear(&self.source, source_x, source_y);
        }
        Ok(())
    }

    fn encode(&self, surface: RgbaImage) -> RasterResult<Vec<u8>> {
        encode_png(&surface)
    }
}

/// Bilinear sample at pixel-index coordinates; edges are clamped.
fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let max_x = f64::from(image.width().saturating_sub(1));
    let max_y = f64::from(image.height().saturating_sub(1));
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);
    let (x0, y0) = (x.floor(), y.floor());
    let (x1, y1) = ((x0 + 1.0).min(max_x), (y0 + 1.0).min(max_y));
    let (fx, fy) = (x - x0, y - y0);

    let top_left = image.get_pixel(x0 as u32, y0 as u32);
    let top_right = image.get_pixel(x1 as u32, y0 as u32);
    let bottom_left = image.get_pixel(x0 as u32, y1 as u32);
    let bottom_right = image.get_pixel(x1 as u32, y1 as u32);

    let mut channels = [0u8; 4];
    for (index, channel) in channels.iter_mut().enumerate() {
        let top = f64::from(top_left[index]) * (1.0 - fx) + f64::from(top_right[index]) * fx;
        let bottom =
            f64::from(bottom_left[index]) * (1.0 - fx) + f64::from(bottom_right[index]) * fx;
        *channel = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(channels)
}

/// Lossless PNG at the strongest compression setting.
pub fn encode_png(image: &RgbaImage) -> RasterResult<Vec<u8>> {
    let mut bytes = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut bytes),
        CompressionType::Best,
        PngFilter::Adaptive,
    );
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|source| RasterError::Encode { source })?;
    Ok(bytes)
}
