//! Flowing A4 page writer on top of `printpdf`.
//!
//! Keeps a vertical cursor in millimetres and starts a new page whenever the
//! next block would cross the bottom margin.

use std::io::BufWriter;

use printpdf::path::PaintMode;
use printpdf::*;

use super::ReportError;

pub const PAGE_W: f32 = 210.0;
pub const PAGE_H: f32 = 297.0;
pub const MARGIN_X: f32 = 20.0;
const MARGIN_TOP: f32 = 15.0;
const MARGIN_BOTTOM: f32 = 20.0;

/// Usable width between the side margins.
pub const CONTENT_W: f32 = PAGE_W - 2.0 * MARGIN_X;

const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb8(pub u8, pub u8, pub u8);

impl Rgb8 {
    fn color(self) -> Color {
        Color::Rgb(Rgb::new(
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
            None,
        ))
    }
}

impl From<(u8, u8, u8)> for Rgb8 {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Rgb8(r, g, b)
    }
}

pub mod palette {
    use super::Rgb8;

    pub const DARK_GREEN: Rgb8 = Rgb8(0x1B, 0x43, 0x32);
    pub const MID_GREEN: Rgb8 = Rgb8(0x2D, 0x6A, 0x4F);
    pub const ACCENT_GREEN: Rgb8 = Rgb8(0x52, 0xB7, 0x88);
    pub const LIGHT_GREEN: Rgb8 = Rgb8(0xD8, 0xF3, 0xDC);
    pub const DANGER_RED: Rgb8 = Rgb8(0xC0, 0x39, 0x2B);
    pub const LIGHT_GRAY: Rgb8 = Rgb8(0xF8, 0xF9, 0xFA);
    pub const MID_GRAY: Rgb8 = Rgb8(0x6C, 0x75, 0x7D);
    pub const DARK_GRAY: Rgb8 = Rgb8(0x34, 0x3A, 0x40);
    pub const WHITE: Rgb8 = Rgb8(0xFF, 0xFF, 0xFF);
    pub const WINE: Rgb8 = Rgb8(0x6B, 0x27, 0x37);
    pub const BLUSH: Rgb8 = Rgb8(0xFF, 0xF5, 0xF5);
    pub const AMBER_TINT: Rgb8 = Rgb8(0xFF, 0xF8, 0xE1);
}

#[derive(Debug, Clone, Copy)]
pub enum Weight {
    Regular,
    Bold,
    Italic,
}

/// Colours for a header-plus-striped-rows table.
#[derive(Debug, Clone, Copy)]
pub struct TableStyle {
    pub header_bg: Rgb8,
    pub stripe: Rgb8,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            header_bg: palette::DARK_GREEN,
            stripe: palette::LIGHT_GREEN,
        }
    }
}

pub struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    /// Distance of the cursor from the page bottom, in mm.
    y: f32,
    pages: usize,
}

impl PageWriter {
    pub fn new(title: &str) -> Result<Self, ReportError> {
        let (doc, page1, layer1) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let layer = doc.get_page(page1).get_layer(layer1);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::Pdf(format!("PDF font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportError::Pdf(format!("PDF font error: {e}")))?;
        let italic = doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(|e| ReportError::Pdf(format!("PDF font error: {e}")))?;

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            italic,
            y: PAGE_H - MARGIN_TOP,
            pages: 1,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// Start a new page when fewer than `height` mm remain.
    pub fn ensure_space(&mut self, height: f32) {
        if self.y - height >= MARGIN_BOTTOM {
            return;
        }
        self.pages += 1;
        let (page, layer) =
            self.doc
                .add_page(Mm(PAGE_W), Mm(PAGE_H), format!("Layer {}", self.pages));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_H - MARGIN_TOP;
    }

    pub fn space(&mut self, mm: f32) {
        self.y -= mm;
        if self.y < MARGIN_BOTTOM {
            self.ensure_space(f32::MAX);
        }
    }

    fn font(&self, weight: Weight) -> &IndirectFontRef {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
            Weight::Italic => &self.italic,
        }
    }

    fn fill_rect(&self, x: f32, bottom: f32, width: f32, height: f32, color: Rgb8) {
        self.layer.set_fill_color(color.color());
        let rect = Rect::new(Mm(x), Mm(bottom), Mm(x + width), Mm(bottom + height))
            .with_mode(PaintMode::Fill);
        self.layer.add_rect(rect);
    }

    fn text_at(&self, text: &str, size: f32, x: f32, baseline: f32, weight: Weight, color: Rgb8) {
        self.layer.set_fill_color(color.color());
        self.layer
            .use_text(pdf_safe(text), size, Mm(x), Mm(baseline), self.font(weight));
    }

    /// Full-width coloured bar with a line of text inside.
    pub fn banner(&mut self, text: &str, size: f32, height: f32, bg: Rgb8, fg: Rgb8) {
        self.ensure_space(height);
        let bottom = self.y - height;
        self.fill_rect(MARGIN_X, bottom, CONTENT_W, height, bg);
        let text_w = text_width(text, size);
        let x = MARGIN_X + ((CONTENT_W - text_w) / 2.0).max(4.0);
        self.text_at(text, size, x, bottom + height / 2.0 - size * PT_TO_MM / 3.0, Weight::Bold, fg);
        self.y = bottom;
    }

    /// Numbered section heading: light bar with a darker left stripe.
    pub fn section_header(&mut self, text: &str) {
        let height = 10.0;
        // Keep the heading with at least a few lines of its content.
        self.ensure_space(height + 20.0);
        let bottom = self.y - height;
        self.fill_rect(MARGIN_X, bottom, CONTENT_W, height, palette::LIGHT_GREEN);
        self.fill_rect(MARGIN_X, bottom, 1.8, height, palette::MID_GREEN);
        self.text_at(text, 11.0, MARGIN_X + 5.0, bottom + 3.2, Weight::Bold, palette::DARK_GREEN);
        self.y = bottom;
        self.space(3.5);
    }

    /// Solid stage bar used in the symptom progression.
    pub fn stage_bar(&mut self, text: &str) {
        let height = 7.5;
        self.ensure_space(height + 10.0);
        let bottom = self.y - height;
        self.fill_rect(MARGIN_X, bottom, CONTENT_W, height, palette::MID_GREEN);
        self.text_at(text, 9.0, MARGIN_X + 3.5, bottom + 2.4, Weight::Bold, palette::WHITE);
        self.y = bottom;
        self.space(1.5);
    }

    /// Wrapped paragraph starting at `indent` mm from the left margin.
    pub fn paragraph(&mut self, text: &str, size: f32, weight: Weight, color: Rgb8, indent: f32) {
        let leading = leading_for(size);
        let width = CONTENT_W - indent;
        for line in wrap_text(text, chars_for(width, size)) {
            self.ensure_space(leading);
            self.y -= leading;
            self.text_at(&line, size, MARGIN_X + indent, self.y, weight, color);
        }
    }

    /// Single centred line.
    pub fn centered(&mut self, text: &str, size: f32, color: Rgb8) {
        let leading = leading_for(size);
        self.ensure_space(leading);
        self.y -= leading;
        let x = MARGIN_X + ((CONTENT_W - text_width(text, size)) / 2.0).max(0.0);
        self.text_at(text, size, x, self.y, Weight::Regular, color);
    }

    /// Bold label followed by wrapped text on the same first line.
    pub fn labelled(&mut self, label: &str, text: &str, size: f32) {
        let leading = leading_for(size);
        let label_w = text_width(label, size) + 2.0;
        let lines = wrap_text(text, chars_for(CONTENT_W - label_w, size));
        for (i, line) in lines.iter().enumerate() {
            self.ensure_space(leading);
            self.y -= leading;
            if i == 0 {
                self.text_at(label, size, MARGIN_X, self.y, Weight::Bold, palette::DARK_GRAY);
            }
            self.text_at(line, size, MARGIN_X + label_w, self.y, Weight::Regular, palette::DARK_GRAY);
        }
    }

    /// Thin horizontal rule across the content width.
    pub fn rule(&mut self, color: Rgb8) {
        self.ensure_space(1.0);
        self.fill_rect(MARGIN_X, self.y - 0.3, CONTENT_W, 0.3, color);
        self.y -= 0.3;
    }

    /// Header row plus striped body rows. `widths` are fractions of the
    /// content width and must match the column count.
    pub fn table(&mut self, headers: &[&str], widths: &[f32], rows: &[Vec<String>], style: TableStyle) {
        let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        self.table_row(&header_cells, widths, 9.0, Weight::Bold, palette::WHITE, style.header_bg);
        for (i, row) in rows.iter().enumerate() {
            let bg = if i % 2 == 0 { palette::WHITE } else { style.stripe };
            self.table_row(row, widths, 9.0, Weight::Regular, palette::DARK_GRAY, bg);
        }
    }

    /// One row of cells sharing a background. Cells wrap independently and
    /// the row is as tall as its tallest cell.
    pub fn table_row(
        &mut self,
        cells: &[String],
        widths: &[f32],
        size: f32,
        weight: Weight,
        fg: Rgb8,
        bg: Rgb8,
    ) {
        self.styled_row(cells, widths, size, &|_| (weight, fg, bg));
    }

    /// Row where each column may have its own weight and colours.
    pub fn styled_row(
        &mut self,
        cells: &[String],
        widths: &[f32],
        size: f32,
        style: &dyn Fn(usize) -> (Weight, Rgb8, Rgb8),
    ) {
        let pad = 2.2;
        let leading = leading_for(size);
        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .zip(widths)
            .map(|(cell, frac)| wrap_text(cell, chars_for(frac * CONTENT_W - 2.0 * pad, size)))
            .collect();
        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(1);
        let height = line_count as f32 * leading + 2.0 * pad;

        self.ensure_space(height);
        let bottom = self.y - height;
        let mut x = MARGIN_X;
        for (col, (lines, frac)) in wrapped.iter().zip(widths).enumerate() {
            let (weight, fg, bg) = style(col);
            let width = frac * CONTENT_W;
            self.fill_rect(x, bottom, width, height, bg);
            let mut baseline = self.y - pad;
            for line in lines {
                baseline -= leading;
                self.text_at(line, size, x + pad, baseline + 1.0, weight, fg);
            }
            x += width;
        }
        self.y = bottom;
    }

    /// Embed an image centred on a light panel, scaled to fit `max_w` × `max_h` mm.
    pub fn image(&mut self, img: &::image::DynamicImage, max_w: f32, max_h: f32) {
        use ::image::GenericImageView;

        const DPI: f32 = 300.0;
        let (px_w, px_h) = img.dimensions();
        if px_w == 0 || px_h == 0 {
            return;
        }
        let native_w = px_w as f32 / DPI * 25.4;
        let native_h = px_h as f32 / DPI * 25.4;
        let scale = (max_w / native_w).min(max_h / native_h);
        let (draw_w, draw_h) = (native_w * scale, native_h * scale);

        let panel_h = draw_h + 6.0;
        self.ensure_space(panel_h);
        let bottom = self.y - panel_h;
        self.fill_rect(MARGIN_X, bottom, CONTENT_W, panel_h, palette::LIGHT_GRAY);

        let pdf_image = Image::from_dynamic_image(img);
        pdf_image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN_X + (CONTENT_W - draw_w) / 2.0)),
                translate_y: Some(Mm(bottom + 3.0)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(DPI),
                ..Default::default()
            },
        );
        self.y = bottom;
    }

    pub fn finish(self) -> Result<Vec<u8>, ReportError> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| ReportError::Pdf(format!("PDF save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| ReportError::Pdf(format!("PDF buffer error: {e}")))
    }
}

fn leading_for(size: f32) -> f32 {
    size * PT_TO_MM * 1.45
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_EM * PT_TO_MM
}

/// Characters that fit on one line of `width` mm at `size` pt.
fn chars_for(width: f32, size: f32) -> usize {
    ((width / (size * AVG_GLYPH_EM * PT_TO_MM)) as usize).max(8)
}

/// Simple word-wrap helper for PDF text rendering.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.chars().count() + word.chars().count() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Fold text to the ASCII subset the builtin fonts render reliably.
pub fn pdf_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '–' | '—' | '‑' => out.push('-'),
            '≥' => out.push_str(">="),
            '≤' => out.push_str("<="),
            '°' => out.push_str(" deg"),
            '·' | '•' => out.push('-'),
            '©' => out.push_str("(c)"),
            '‘' | '’' => out.push('\''),
            '“' | '”' => out.push('"'),
            '×' => out.push('x'),
            c if c.is_ascii() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_width() {
        let lines = wrap_text("one two three four five six", 9);
        assert_eq!(lines, vec!["one two", "three", "four five", "six"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }

    #[test]
    fn pdf_safe_folds_typography() {
        assert_eq!(pdf_safe("18–24°C"), "18-24 degC");
        assert_eq!(pdf_safe("spacing ≥ 30 cm"), "spacing >= 30 cm");
        assert_eq!(pdf_safe("Stage 1 — Early"), "Stage 1 - Early");
        assert_eq!(pdf_safe("© 2026 · x"), "(c) 2026 - x");
        assert_eq!(pdf_safe("plain"), "plain");
    }

    #[test]
    fn long_content_flows_onto_new_pages() {
        let mut writer = PageWriter::new("flow").unwrap();
        for i in 0..200 {
            writer.paragraph(&format!("line {i}"), 10.0, Weight::Regular, palette::DARK_GRAY, 0.0);
        }
        assert!(writer.page_count() > 1);
        let bytes = writer.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
