use crate::color::{apply_dark_filter, parse_color};
use crate::fonts::FontBackend;
use crate::svg::{SvgOptions, scene_to_svg};
use crate::{Diagnostics, RasterError, Rasterizer, Result};
use scrawl_core::scene::{DimensionScale, MIME_JPEG, MIME_PNG, MIME_SVG};
use scrawl_core::{GeometryEstimator, RenderScene};

pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Pixel size and scale factor of one export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterGeometry {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
}

/// Export scale first, then `maxWidthOrHeight` shrinks the scale so the longer side fits.
pub fn raster_geometry(width: f64, height: f64, scene: &RenderScene) -> RasterGeometry {
    let mut dims = scene
        .export
        .dimensions
        .filter(|d| d.scale.is_finite() && d.scale > 0.0)
        .unwrap_or(DimensionScale { scale: 1.0 })
        .apply(width, height);
    if let Some(max) = scene
        .export
        .max_width_or_height
        .filter(|m| m.is_finite() && *m > 0.0)
    {
        let longest = dims.width.max(dims.height);
        if longest > max {
            dims = DimensionScale {
                scale: dims.scale * max / longest,
            }
            .apply(width, height);
        }
    }
    RasterGeometry {
        width: dims.width.ceil().max(1.0) as u32,
        height: dims.height.ceil().max(1.0) as u32,
        scale: dims.scale as f32,
    }
}

/// JPEG quality from the `(0, 1]` export quality.
pub fn jpeg_quality(quality: Option<f64>) -> u8 {
    quality
        .filter(|q| q.is_finite() && *q > 0.0)
        .map_or(DEFAULT_JPEG_QUALITY, |q| (q.min(1.0) * 100.0).round().max(1.0) as u8)
}

/// Renders scenes through `usvg`/`resvg` with a shared font database.
#[derive(Debug, Clone)]
pub struct ResvgRasterizer {
    fonts: FontBackend,
    estimator: GeometryEstimator,
}

impl ResvgRasterizer {
    pub fn new(fonts: FontBackend) -> Self {
        Self {
            fonts,
            estimator: GeometryEstimator::default(),
        }
    }

    pub fn with_estimator(mut self, estimator: GeometryEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn fonts(&self) -> &FontBackend {
        &self.fonts
    }

    pub fn render_svg(&self, scene: &RenderScene, diagnostics: &mut Diagnostics) -> String {
        scene_to_svg(
            scene,
            &self.estimator,
            SvgOptions { standalone: true },
            diagnostics,
        )
        .svg
    }

    pub fn render_pixmap(
        &self,
        scene: &RenderScene,
        diagnostics: &mut Diagnostics,
    ) -> Result<tiny_skia::Pixmap> {
        let doc = scene_to_svg(scene, &self.estimator, SvgOptions::default(), diagnostics);
        let opt = self.fonts.usvg_options();
        let tree =
            usvg::Tree::from_str(&doc.svg, &opt).map_err(|e| RasterError::SvgParse(e.to_string()))?;

        let geo = raster_geometry(doc.viewport.width, doc.viewport.height, scene);
        let mut pixmap = tiny_skia::Pixmap::new(geo.width, geo.height).ok_or(
            RasterError::PixmapAlloc {
                width: geo.width,
                height: geo.height,
            },
        )?;

        let app_state = &scene.app_state;
        if app_state.export_background {
            match parse_color(&app_state.view_background_color) {
                Some(color) => pixmap.fill(color),
                None => diagnostics.push(format!(
                    "unsupported background color `{}`, rendering transparent",
                    app_state.view_background_color
                )),
            }
        }

        // The tree is sized to the viewport; only the export scale remains.
        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(geo.scale, geo.scale),
            &mut pixmap.as_mut(),
        );

        if app_state.export_with_dark_mode {
            apply_dark_filter(&mut pixmap);
        }
        tracing::debug!(
            width = geo.width,
            height = geo.height,
            scale = geo.scale,
            dark = app_state.export_with_dark_mode,
            "scene rasterized"
        );
        Ok(pixmap)
    }

    pub fn render_png(
        &self,
        scene: &RenderScene,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<u8>> {
        let pixmap = self.render_pixmap(scene, diagnostics)?;
        pixmap.encode_png().map_err(|_| RasterError::PngEncode)
    }

    pub fn render_jpeg(
        &self,
        scene: &RenderScene,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<u8>> {
        let app_state = &scene.app_state;
        if app_state.export_background {
            let Some(color) = parse_color(&app_state.view_background_color) else {
                return Err(RasterError::JpegBackground);
            };
            if color.alpha() != 1.0 {
                return Err(RasterError::JpegOpaqueBackgroundRequired);
            }
        } else {
            return Err(RasterError::JpegOpaqueBackgroundRequired);
        }

        let pixmap = self.render_pixmap(scene, diagnostics)?;
        let (w, h) = (pixmap.width(), pixmap.height());

        // The background is opaque, so every pixel has alpha 255 and the channel can be dropped.
        let rgba = pixmap.data();
        let mut rgb = vec![0u8; (w as usize) * (h as usize) * 3];
        for (src, dst) in rgba.chunks_exact(4).zip(rgb.chunks_exact_mut(3)) {
            dst.copy_from_slice(&src[..3]);
        }

        let mut out = Vec::new();
        let mut enc = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut out,
            jpeg_quality(scene.export.quality),
        );
        enc.encode(&rgb, w, h, image::ExtendedColorType::Rgb8)
            .map_err(|_| RasterError::JpegEncode)?;
        Ok(out)
    }
}

impl Rasterizer for ResvgRasterizer {
    fn rasterize(&self, scene: &RenderScene, diagnostics: &mut Diagnostics) -> Result<Vec<u8>> {
        match scene.export.mime_type.as_str() {
            MIME_PNG => self.render_png(scene, diagnostics),
            MIME_JPEG => self.render_jpeg(scene, diagnostics),
            MIME_SVG => Ok(self.render_svg(scene, diagnostics).into_bytes()),
            other => Err(RasterError::UnsupportedMimeType(other.to_string())),
        }
    }
}
