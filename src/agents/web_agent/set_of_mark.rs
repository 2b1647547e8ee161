use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::rect::Rect;
use rand::Rng;
use rusttype::{point, Font, Scale};

use crate::agents::web_agent::types::{AnnotatedImage, AnnotationMap, ElementCenter, Label, Position};
use crate::tools::chrome::types::{PageElement, VisibleRect};
use crate::types::error::{AppError, AppResult};

/// Tags that get a label, in no particular order; labels follow document order.
pub const INTERACTIVE_TAGS: [&str; 6] = ["TEXTAREA", "SELECT", "BUTTON", "A", "IFRAME", "VIDEO"];

/// Raster pixels per logical page pixel.
pub const DEFAULT_SCALE: f64 = 2.0;

const FONT_DATA: &[u8] = include_bytes!("../../../assets/DejaVuSans.ttf");
const LABEL_FONT_PX: f32 = 12.0;
const LABEL_PADDING: i32 = 3;
const STROKE_WIDTH: i32 = 2;
const DASH_LEN: f32 = 6.0;
const GAP_LEN: f32 = 4.0;
const GOLDEN_RATIO_CONJUGATE: f64 = 0.618_033_988_749_895;

pub fn is_interactive(tag: &str) -> bool {
    INTERACTIVE_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// Filtered elements with their labels: label = 1 + position in the
/// filtered sequence.
pub fn label_elements(elements: &[PageElement]) -> Vec<(Label, &PageElement)> {
    elements
        .iter()
        .filter(|e| is_interactive(&e.tag) && !e.rects.is_empty())
        .zip(1..)
        .map(|(element, label)| (label, element))
        .collect()
}

/// The label map alone. Position is the scaled centroid of the element's
/// first visible rect.
pub fn build_annotation_map(elements: &[PageElement], scale: f64) -> AnnotationMap {
    label_elements(elements)
        .into_iter()
        .map(|(label, element)| {
            let (x, y) = element.rects[0].scaled(scale).center();
            let center = ElementCenter {
                position: Position { x, y },
                tag: element.tag.clone(),
                link: element.link.clone(),
            };
            (label, center)
        })
        .collect()
}

/// Draws dashed outlines and label badges for every interactive element onto
/// the screenshot and returns the PNG together with its label map.
pub fn add_set_of_mark<R: Rng>(
    elements: &[PageElement],
    screenshot: &[u8],
    scale: f64,
    rng: &mut R,
) -> AppResult<AnnotatedImage> {
    if screenshot.is_empty() {
        return Err(AppError::Annotation("screenshot buffer is empty".into()));
    }
    let mut canvas = image::load_from_memory(screenshot)
        .map_err(|e| AppError::Annotation(format!("failed to decode screenshot: {}", e)))?
        .to_rgba8();
    let font = Font::try_from_bytes(FONT_DATA)
        .ok_or_else(|| AppError::Annotation("Failed to load font".into()))?;
    let font_scale = Scale::uniform(LABEL_FONT_PX * scale.max(1.0) as f32);

    // 每次标注随机选择起始色相，相邻标签按黄金比例错开
    let hue_origin: f64 = rng.gen();
    for (idx, (label, element)) in label_elements(elements).into_iter().enumerate() {
        let color = stroke_color(hue_origin, idx);
        for rect in &element.rects {
            _draw_roi(&mut canvas, label, &font, font_scale, &rect.scaled(scale), color);
        }
    }

    let (width, height) = canvas.dimensions();
    let mut image = Vec::new();
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut image), ImageOutputFormat::Png)
        .map_err(|e| AppError::Annotation(format!("PNG encode: {}", e)))?;

    Ok(AnnotatedImage {
        image,
        map: build_annotation_map(elements, scale),
        width,
        height,
    })
}

/// Ratio of raster width to viewport width, when both are known.
pub fn observed_scale(raster_width: u32, viewport_width: f64) -> Option<f64> {
    (viewport_width > 0.0).then(|| raster_width as f64 / viewport_width)
}

fn stroke_color(hue_origin: f64, index: usize) -> Rgba<u8> {
    let hue = (hue_origin + index as f64 * GOLDEN_RATIO_CONJUGATE).fract();
    let [r, g, b] = hsv_to_rgb(hue, 0.85, 0.9);
    Rgba([r, g, b, 255])
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [u8; 3] {
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match sector as i64 % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [(r * 255.0).round() as u8, (g * 255.0).round() as u8, (b * 255.0).round() as u8]
}

fn text_color_for(background: Rgba<u8>) -> Rgba<u8> {
    let [r, g, b, _] = background.0;
    let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    if luma > 150.0 {
        Rgba([0, 0, 0, 255])
    } else {
        Rgba([255, 255, 255, 255])
    }
}

fn _draw_roi(
    canvas: &mut RgbaImage,
    label: Label,
    font: &Font<'_>,
    scale: Scale,
    rect: &VisibleRect,
    color: Rgba<u8>,
) {
    let (w, h) = canvas.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let max_x = w as i32 - 1;
    let max_y = h as i32 - 1;
    let left = (rect.left.round() as i32).clamp(0, max_x);
    let top = (rect.top.round() as i32).clamp(0, max_y);
    let right = (rect.right.round() as i32).clamp(0, max_x);
    let bottom = (rect.bottom.round() as i32).clamp(0, max_y);
    if right <= left || bottom <= top {
        return;
    }

    // 虚线边框，向内加粗
    for t in 0..STROKE_WIDTH {
        let (l, tp, r, b) = ((left + t) as f32, (top + t) as f32, (right - t) as f32, (bottom - t) as f32);
        draw_dashed_line(canvas, (l, tp), (r, tp), color);
        draw_dashed_line(canvas, (r, tp), (r, b), color);
        draw_dashed_line(canvas, (r, b), (l, b), color);
        draw_dashed_line(canvas, (l, b), (l, tp), color);
    }

    // 标签底色与边框同色，锚定在左上角
    let text = label.to_string();
    let v_metrics = font.v_metrics(scale);
    let glyphs: Vec<_> = font.layout(&text, scale, point(0.0, v_metrics.ascent)).collect();
    let text_width = glyphs
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
        .ceil() as i32;
    let text_height = (v_metrics.ascent - v_metrics.descent).ceil() as i32;

    let badge_w = (text_width + 2 * LABEL_PADDING).min(w as i32);
    let badge_h = (text_height + 2 * LABEL_PADDING).min(h as i32);
    let badge_x = left.min(w as i32 - badge_w).max(0);
    let badge_y = top.min(h as i32 - badge_h).max(0);
    draw_filled_rect_mut(
        canvas,
        Rect::at(badge_x, badge_y).of_size(badge_w.max(1) as u32, badge_h.max(1) as u32),
        color,
    );
    draw_text_mut(
        canvas,
        text_color_for(color),
        badge_x + LABEL_PADDING,
        badge_y + LABEL_PADDING,
        scale,
        font,
        &text,
    );
}

fn draw_dashed_line(canvas: &mut RgbaImage, start: (f32, f32), end: (f32, f32), color: Rgba<u8>) {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 {
        return;
    }
    let (ux, uy) = (dx / length, dy / length);
    let mut offset = 0.0;
    while offset < length {
        let stop = (offset + DASH_LEN).min(length);
        draw_line_segment_mut(
            canvas,
            (start.0 + ux * offset, start.1 + uy * offset),
            (start.0 + ux * stop, start.1 + uy * stop),
            color,
        );
        offset += DASH_LEN + GAP_LEN;
    }
}
