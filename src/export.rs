//! Raster, SVG and vector exports of the current signature.

use std::fmt::Write as _;
use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use egui::Color32;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, VectorError};
use crate::history::History;
use crate::smoothing::Segment;
use crate::surface::SurfaceSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    /// Flattened onto the background color (white when transparent)
    Jpeg { quality: u8 },
    Svg,
    Vector,
}

impl ExportFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg { .. } => "image/jpeg",
            ExportFormat::Svg => "image/svg+xml",
            ExportFormat::Vector => "application/json",
        }
    }
}

/// An encoded raster snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn to_data_url(&self) -> String {
        data_url(self.mime, &self.bytes)
    }
}

/// One stroke of the vector interchange format: its segments in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorStroke(pub Vec<Segment>);

/// Resolution-independent signature: strokes in history order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorSignature(pub Vec<VectorStroke>);

impl VectorSignature {
    pub fn from_history(history: &History) -> Self {
        Self(
            history
                .strokes()
                .iter()
                .map(|stroke| VectorStroke(stroke.segments().to_vec()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses and validates vector data
    pub fn from_json(json: &str) -> Result<Self, VectorError> {
        let signature: VectorSignature = serde_json::from_str(json)?;
        signature.validate()?;
        Ok(signature)
    }

    pub fn validate(&self) -> Result<(), VectorError> {
        for (stroke, VectorStroke(segments)) in self.0.iter().enumerate() {
            for (segment, seg) in segments.iter().enumerate() {
                let coords = [seg.start, seg.control, seg.end];
                if coords.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
                    return Err(VectorError::InvalidCoordinate { stroke, segment });
                }
                if [seg.start_width, seg.end_width]
                    .iter()
                    .any(|w| !w.is_finite() || *w < 0.0)
                {
                    return Err(VectorError::InvalidWidth { stroke, segment });
                }
            }
        }
        Ok(())
    }
}

/// Result of an export; `Empty` when there is nothing drawn yet
#[derive(Debug, Clone, PartialEq)]
pub enum Exported {
    Empty,
    Image(EncodedImage),
    Svg(String),
    Vector(VectorSignature),
}

impl Exported {
    pub fn is_empty(&self) -> bool {
        matches!(self, Exported::Empty)
    }

    /// `None` for [`Exported::Empty`]
    pub fn to_data_url(&self) -> Result<Option<String>, ExportError> {
        Ok(match self {
            Exported::Empty => None,
            Exported::Image(image) => Some(image.to_data_url()),
            Exported::Svg(svg) => Some(data_url("image/svg+xml", svg.as_bytes())),
            Exported::Vector(vector) => {
                Some(data_url("application/json", vector.to_json()?.as_bytes()))
            }
        })
    }
}

/// Read-only view over everything an export needs
#[derive(Debug, Clone, Copy)]
pub struct ExportEngine<'a> {
    pub history: &'a History,
    pub pixels: &'a RgbaImage,
    pub size: SurfaceSize,
    pub background_color: Color32,
}

impl ExportEngine<'_> {
    pub fn export(&self, format: ExportFormat) -> Result<Exported, ExportError> {
        if self.history.is_empty() {
            return Ok(Exported::Empty);
        }
        Ok(match format {
            ExportFormat::Png => Exported::Image(self.encode_png()?),
            ExportFormat::Jpeg { quality } => Exported::Image(self.encode_jpeg(quality)?),
            ExportFormat::Svg => Exported::Svg(self.render_svg()),
            ExportFormat::Vector => Exported::Vector(VectorSignature::from_history(self.history)),
        })
    }

    fn encode_png(&self) -> Result<EncodedImage, ExportError> {
        let mut bytes = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(self.encoded(ExportFormat::Png, bytes))
    }

    fn encode_jpeg(&self, quality: u8) -> Result<EncodedImage, ExportError> {
        let flat = flatten(self.pixels, self.background_color);
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).encode_image(&flat)?;
        Ok(self.encoded(ExportFormat::Jpeg { quality }, bytes))
    }

    fn encoded(&self, format: ExportFormat, bytes: Vec<u8>) -> EncodedImage {
        let (width, height) = self.pixels.dimensions();
        EncodedImage {
            mime: format.mime(),
            width,
            height,
            bytes,
        }
    }

    fn render_svg(&self) -> String {
        let SurfaceSize { width, height } = self.size;
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}">"#
        );
        if self.background_color.a() > 0 {
            let (fill, opacity) = svg_color(self.background_color);
            let _ = write!(
                svg,
                r#"<rect width="100%" height="100%" fill="{fill}" fill-opacity="{opacity}"/>"#
            );
        }

        for stroke in self.history.strokes() {
            let (color, opacity) = svg_color(stroke.color());
            for seg in stroke.segments() {
                if seg.is_dot() {
                    let _ = write!(
                        svg,
                        r#"<circle cx="{:.3}" cy="{:.3}" r="{:.3}" fill="{color}" fill-opacity="{opacity}"/>"#,
                        seg.start.x,
                        seg.start.y,
                        seg.start_width * 0.5
                    );
                } else {
                    let _ = write!(
                        svg,
                        r#"<path d="M {:.3},{:.3} Q {:.3},{:.3} {:.3},{:.3}" stroke="{color}" stroke-opacity="{opacity}" stroke-width="{:.3}" stroke-linecap="round" fill="none"/>"#,
                        seg.start.x,
                        seg.start.y,
                        seg.control.x,
                        seg.control.y,
                        seg.end.x,
                        seg.end.y,
                        (seg.start_width + seg.end_width) * 0.5
                    );
                }
            }
        }
        svg.push_str("</svg>");
        svg
    }
}

fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

fn svg_color(color: Color32) -> (String, String) {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    (
        format!("#{r:02x}{g:02x}{b:02x}"),
        format!("{:.3}", a as f32 / 255.0),
    )
}

/// Composite straight-alpha pixels over an opaque backdrop
fn flatten(pixels: &RgbaImage, background: Color32) -> RgbImage {
    let backdrop = if background.a() == 0 {
        [255, 255, 255]
    } else {
        let [r, g, b, _] = background.to_srgba_unmultiplied();
        [r, g, b]
    };
    RgbImage::from_fn(pixels.width(), pixels.height(), |x, y| {
        let [r, g, b, a] = pixels.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let mix = |s: u8, d: u8| (s as f32 * alpha + d as f32 * (1.0 - alpha)).round() as u8;
        Rgb([mix(r, backdrop[0]), mix(g, backdrop[1]), mix(b, backdrop[2])])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::Stroke;
    use egui::Pos2;

    fn history() -> History {
        let mut history = History::new();
        history.push(Stroke::new_ref(
            Color32::BLACK,
            vec![
                Segment::line(Pos2::new(1.0, 1.0), Pos2::new(5.0, 1.0), 1.0, 2.0),
                Segment::dot(Pos2::new(8.0, 8.0), 0.5),
            ],
        ));
        history
    }

    fn engine<'a>(history: &'a History, pixels: &'a RgbaImage) -> ExportEngine<'a> {
        ExportEngine {
            history,
            pixels,
            size: SurfaceSize::new(10, 10).unwrap(),
            background_color: Color32::TRANSPARENT,
        }
    }

    #[test]
    fn test_empty_history_exports_empty() {
        let history = History::new();
        let pixels = RgbaImage::new(10, 10);
        for format in [ExportFormat::Png, ExportFormat::Svg, ExportFormat::Vector] {
            let exported = engine(&history, &pixels).export(format).unwrap();
            assert!(exported.is_empty());
            assert_eq!(exported.to_data_url().unwrap(), None);
        }
    }

    #[test]
    fn test_png_export_decodes_back() {
        let history = history();
        let pixels = RgbaImage::from_pixel(10, 10, image::Rgba([1, 2, 3, 4]));
        let Exported::Image(png) = engine(&history, &pixels).export(ExportFormat::Png).unwrap()
        else {
            panic!("expected an image");
        };
        assert_eq!(png.mime, "image/png");
        let decoded = image::load_from_memory(&png.bytes).unwrap().to_rgba8();
        assert_eq!(decoded, pixels);
        assert!(png.to_data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_jpeg_export_is_opaque() {
        let history = history();
        let pixels = RgbaImage::new(10, 10);
        let Exported::Image(jpeg) = engine(&history, &pixels)
            .export(ExportFormat::Jpeg { quality: 90 })
            .unwrap()
        else {
            panic!("expected an image");
        };
        let decoded = image::load_from_memory(&jpeg.bytes).unwrap().to_rgb8();
        // Transparent pixels are flattened onto white
        assert!(decoded.get_pixel(5, 5).0.iter().all(|c| *c > 240));
    }

    #[test]
    fn test_vector_json_shape() {
        let history = history();
        let pixels = RgbaImage::new(10, 10);
        let Exported::Vector(vector) = engine(&history, &pixels)
            .export(ExportFormat::Vector)
            .unwrap()
        else {
            panic!("expected vector data");
        };
        let json: serde_json::Value = serde_json::from_str(&vector.to_json().unwrap()).unwrap();
        let first = &json[0][0];
        assert_eq!(first["startPoint"]["x"], 1.0);
        assert_eq!(first["endPoint"]["x"], 5.0);
        assert_eq!(first["startWidth"], 1.0);
        assert_eq!(first["endWidth"], 2.0);
        assert!(json[0][1]["controlPoint"].is_object());
    }

    #[test]
    fn test_vector_validation_rejects_negative_width() {
        let json = r#"[[{"startPoint":{"x":0,"y":0},"controlPoint":{"x":1,"y":0},"endPoint":{"x":2,"y":0},"startWidth":-1,"endWidth":1}]]"#;
        assert!(matches!(
            VectorSignature::from_json(json),
            Err(VectorError::InvalidWidth { stroke: 0, segment: 0 })
        ));
        assert!(VectorSignature::from_json("{").is_err());
    }

    #[test]
    fn test_svg_contains_paths_and_dots() {
        let history = history();
        let pixels = RgbaImage::new(10, 10);
        let Exported::Svg(svg) = engine(&history, &pixels).export(ExportFormat::Svg).unwrap() else {
            panic!("expected svg");
        };
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"<path d="M 1.000,1.000 Q 3.000,1.000 5.000,1.000""#));
        assert!(svg.contains(r#"<circle cx="8.000" cy="8.000" r="0.250""#));
        assert!(!svg.contains("<rect"));
        assert!(svg.ends_with("</svg>"));
    }
}
