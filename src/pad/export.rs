use crate::pad::model::{PadModel, Stroke};
use crate::pad::options::{LineCap, PadColor, PadOptions, SaveFormat};
use crate::pad::render::Surface;
use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use image::{ImageOutputFormat, RgbImage, RgbaImage};
use std::fmt::Write as _;
use std::io::Cursor;

const JPEG_QUALITY: u8 = 90;

/// Encode the current drawing as a `data:` URL in the configured format.
///
/// Returns `Ok(None)` when nothing has been drawn: an empty pad never
/// produces output.
pub fn export_data_url(
    surface: &Surface,
    model: &PadModel,
    options: &PadOptions,
) -> Result<Option<String>> {
    if model.is_empty() {
        return Ok(None);
    }
    let url = match options.save_format {
        SaveFormat::Png => encode_raster(surface, SaveFormat::Png)?,
        SaveFormat::Jpeg => encode_raster(surface, SaveFormat::Jpeg)?,
        SaveFormat::Svg => {
            let document = svg_document(model, surface, options);
            format!(
                "data:{};base64,{}",
                SaveFormat::Svg.mime(),
                general_purpose::STANDARD.encode(document.as_bytes())
            )
        }
    };
    Ok(Some(url))
}

fn encode_raster(surface: &Surface, format: SaveFormat) -> Result<String> {
    let img = surface
        .to_image()
        .context("surface buffer does not match its dimensions")?;
    let mut bytes = Vec::new();
    match format {
        SaveFormat::Jpeg => {
            // JPEG has no alpha channel; flatten over opaque white first.
            flatten_over(&img, PadColor::WHITE)
                .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Jpeg(JPEG_QUALITY))
        }
        _ => img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png),
    }
    .with_context(|| format!("encode {}", format.mime()))?;
    Ok(format!(
        "data:{};base64,{}",
        format.mime(),
        general_purpose::STANDARD.encode(&bytes)
    ))
}

/// Source-over composite of a straight-alpha image onto a solid background.
pub fn flatten_over(img: &RgbaImage, background: PadColor) -> RgbImage {
    let mut out = RgbImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let src_a = pixel[3] as f32 / 255.0;
        let blend = |src: u8, dst: u8| -> u8 {
            (src as f32 * src_a + dst as f32 * (1.0 - src_a))
                .round()
                .clamp(0.0, 255.0) as u8
        };
        out.put_pixel(
            x,
            y,
            image::Rgb([
                blend(pixel[0], background.r),
                blend(pixel[1], background.g),
                blend(pixel[2], background.b),
            ]),
        );
    }
    out
}

/// Reconstruct a minimal vector document from the retained point+width
/// sequences. Each stroke becomes a closed filled outline built by offsetting
/// every point half its local thickness along the perpendicular of the
/// forward direction; dots become circles.
pub fn svg_document(model: &PadModel, surface: &Surface, options: &PadOptions) -> String {
    let (logical_w, logical_h) = surface.logical_size();
    let fill = options.line_color.to_hex();

    let mut body = String::new();
    for stroke in &model.strokes {
        if let Some(element) = stroke_element(stroke, &fill, options.line_cap) {
            body.push_str(&element);
        }
    }

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" \
         viewBox=\"0 0 {:.1} {:.1}\" stroke-linejoin=\"{}\" stroke-linecap=\"{}\">\n{}</svg>\n",
        surface.width(),
        surface.height(),
        logical_w,
        logical_h,
        options.line_join.as_svg(),
        options.line_cap.as_svg(),
        body
    )
}

fn stroke_element(stroke: &Stroke, fill: &str, cap: LineCap) -> Option<String> {
    // Collapse consecutive duplicate positions; they carry no direction.
    let mut points = Vec::with_capacity(stroke.points.len());
    for point in &stroke.points {
        let duplicate = points
            .last()
            .is_some_and(|last: &crate::pad::model::StrokePoint| {
                last.x == point.x && last.y == point.y
            });
        if !duplicate {
            points.push(*point);
        }
    }

    if points.is_empty() {
        return None;
    }
    if points.len() == 1 {
        let point = points[0];
        return Some(format!(
            "  <circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\"/>\n",
            point.x,
            point.y,
            (point.width / 2.0).max(0.1),
            fill
        ));
    }

    let mut element = format!("  <path d=\"{}\" fill=\"{}\"/>\n", outline_path(&points, cap), fill);
    if cap == LineCap::Round {
        for endpoint in [&points[0], &points[points.len() - 1]] {
            let _ = write!(
                element,
                "  <circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\"/>\n",
                endpoint.x,
                endpoint.y,
                (endpoint.width / 2.0).max(0.1),
                fill
            );
        }
    }
    Some(element)
}

fn outline_path(points: &[crate::pad::model::StrokePoint], cap: LineCap) -> String {
    let mut top = Vec::with_capacity(points.len());
    let mut bottom = Vec::with_capacity(points.len());

    for (index, point) in points.iter().enumerate() {
        // Forward-point direction: toward the next sample, or from the
        // previous one at the tail.
        let (ahead, behind) = if index + 1 < points.len() {
            (&points[index + 1], point)
        } else {
            (point, &points[index - 1])
        };
        let dx = ahead.x - behind.x;
        let dy = ahead.y - behind.y;
        let len = (dx * dx + dy * dy).sqrt().max(f32::EPSILON);
        let normal = (-dy / len, dx / len);
        let half = (point.width / 2.0).max(0.1);

        let (mut px, mut py) = (point.x, point.y);
        if cap == LineCap::Square {
            // Square caps extend the stroke half a width past its endpoints.
            if index == 0 {
                px -= dx / len * half;
                py -= dy / len * half;
            } else if index == points.len() - 1 {
                px += dx / len * half;
                py += dy / len * half;
            }
        }
        top.push((px + normal.0 * half, py + normal.1 * half));
        bottom.push((px - normal.0 * half, py - normal.1 * half));
    }

    let mut path = String::new();
    for (index, (x, y)) in top.iter().enumerate() {
        let verb = if index == 0 { 'M' } else { 'L' };
        let _ = write!(path, "{verb} {x:.2},{y:.2} ");
    }
    for (x, y) in bottom.iter().rev() {
        let _ = write!(path, "L {x:.2},{y:.2} ");
    }
    path.push('Z');
    path
}
