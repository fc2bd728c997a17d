//! PDF rendering of page descriptions using lopdf
//!
//! Content streams are written by hand with the standard Type1 Times faces.
//! Output depends only on the page description and the page geometry: no
//! creation dates or document IDs are written, so rendering the same
//! description twice yields identical bytes.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use crate::document::{Color, PageDescription, QuestionBlock, TextAlign, TextLine, Watermark};
use crate::error::Result;
use crate::export::RenderEngine;
use crate::fonts::{FontFace, FontSet};
use crate::layout::{calculate_safe_area, ContentArea, Length, PageGeometry};

/// Line height as a multiple of the font size
const LINE_SPACING: f64 = 1.2;
/// Space after the question prompt
const PROMPT_GAP: f64 = 5.0;
/// Space after each option
const OPTION_GAP: f64 = 3.0;

/// Pages finished so far plus the one being drawn
struct PageWriter {
    pages: Vec<String>,
    content: String,
    cursor: f64,
}

/// Renders page descriptions to PDF bytes
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    fonts: &'static FontSet,
    geometry: PageGeometry,
}

impl PdfRenderer {
    /// Create a renderer for A4 pages
    ///
    /// Takes the registered font set, so fonts must be registered first.
    pub fn new(fonts: &'static FontSet) -> Self {
        Self {
            fonts,
            geometry: PageGeometry::default(),
        }
    }

    /// Use a different page geometry
    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Render a page description into a complete PDF file
    pub fn render_document(&self, description: &PageDescription) -> Result<Vec<u8>> {
        let pages = self.layout_pages(description);
        let title = description
            .header
            .lines
            .first()
            .map(|line| line.text.as_str())
            .unwrap_or("");

        let mut doc = self.build_document(&pages, title)?;

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;

        debug!(
            pages = pages.len(),
            bytes = buffer.len(),
            sections = description.sections.len(),
            "rendered PDF"
        );

        Ok(buffer)
    }

    /// Lay the description out into one content stream per page
    fn layout_pages(&self, description: &PageDescription) -> Vec<String> {
        let footer = &description.footer;
        let footer_height =
            footer.text.style.font_size * LINE_SPACING + self.geometry.footer_rule_gap.pt();
        let area = calculate_safe_area(&self.geometry, Length::from_pt(footer_height));
        let available = area.top - area.bottom;

        let mut out = PageWriter {
            pages: Vec::new(),
            content: self.start_page(description),
            cursor: area.top,
        };

        // Header appears once, at the top of the first page
        for line in &description.header.lines {
            out.cursor =
                self.draw_line(&mut out.content, line, area.left, area.width(), out.cursor);
        }
        out.cursor -= self.geometry.header_gap.pt();

        // Sections are placed row by row; a row that fits on a page is never split
        let mut rows: BTreeMap<usize, Vec<&QuestionBlock>> = BTreeMap::new();
        for section in &description.sections {
            rows.entry(section.slot.row).or_default().push(section);
        }

        for row in rows.values() {
            let row_height = row
                .iter()
                .map(|section| self.section_height(section, section.slot.width * area.width()))
                .fold(0.0, f64::max);

            if row_height > available {
                // Taller than a whole page: stack the sections and continue line by line
                for section in row {
                    self.flow_section(&mut out, description, section, area);
                }
                continue;
            }

            if out.cursor - row_height < area.bottom && out.cursor < area.top {
                self.break_page(&mut out, description, area.top);
            }

            for section in row {
                let x = area.left + section.slot.x * area.width();
                let width = section.slot.width * area.width();

                let mut y = self.draw_line(&mut out.content, &section.prompt, x, width, out.cursor)
                    - PROMPT_GAP;
                for option in &section.options {
                    y = self.draw_line(&mut out.content, option, x, width, y) - OPTION_GAP;
                }
                if let Some(answer) = &section.answer {
                    self.draw_line(&mut out.content, answer, x, width, y);
                }
            }

            out.cursor -= row_height;
        }

        self.finish_page(&mut out.content, description);
        out.pages.push(out.content);
        out.pages
    }

    fn break_page(&self, out: &mut PageWriter, description: &PageDescription, top: f64) {
        self.finish_page(&mut out.content, description);
        let next = self.start_page(description);
        out.pages.push(std::mem::replace(&mut out.content, next));
        out.cursor = top;
    }

    /// Draw one section, starting a new page whenever the next wrapped line
    /// would cross into the footer
    fn flow_section(
        &self,
        out: &mut PageWriter,
        description: &PageDescription,
        section: &QuestionBlock,
        area: ContentArea,
    ) {
        let x = area.left + section.slot.x * area.width();
        let width = section.slot.width * area.width();

        let flow_line = |out: &mut PageWriter, line: &TextLine| {
            let line_height = line.style.font_size * LINE_SPACING;
            for text in self.wrap(line, width) {
                if out.cursor - line_height < area.bottom && out.cursor < area.top {
                    self.break_page(out, description, area.top);
                }
                self.draw_wrapped(&mut out.content, line, &text, x, width, out.cursor);
                out.cursor -= line_height;
            }
        };

        flow_line(out, &section.prompt);
        out.cursor -= PROMPT_GAP;
        for option in &section.options {
            flow_line(out, option);
            out.cursor -= OPTION_GAP;
        }
        if let Some(answer) = &section.answer {
            flow_line(out, answer);
        }
        out.cursor -= self.geometry.section_gap.pt();
    }

    /// Height of a section including its trailing gap
    fn section_height(&self, section: &QuestionBlock, width: f64) -> f64 {
        let line_height = |line: &TextLine| {
            self.wrap(line, width).len() as f64 * line.style.font_size * LINE_SPACING
        };

        let mut height = line_height(&section.prompt) + PROMPT_GAP;
        for option in &section.options {
            height += line_height(option) + OPTION_GAP;
        }
        if let Some(answer) = &section.answer {
            height += line_height(answer);
        }
        height + self.geometry.section_gap.pt()
    }

    fn wrap(&self, line: &TextLine, width: f64) -> Vec<String> {
        let face = self.fonts.face(line.style.bold);
        wrap_text(face, &line.text, line.style.font_size, width)
    }

    /// Start a page: the watermark goes underneath everything else
    fn start_page(&self, description: &PageDescription) -> String {
        let mut content = String::new();
        if let Some(ref watermark) = description.watermark {
            self.draw_watermark(&mut content, watermark);
        }
        content
    }

    /// Draw a (possibly wrapped) line with its top at `top`, returning the
    /// y coordinate below it
    fn draw_line(
        &self,
        content: &mut String,
        line: &TextLine,
        x: f64,
        width: f64,
        top: f64,
    ) -> f64 {
        let line_height = line.style.font_size * LINE_SPACING;
        let mut y = top;

        for text in self.wrap(line, width) {
            self.draw_wrapped(content, line, &text, x, width, y);
            y -= line_height;
        }

        y
    }

    /// Draw one already-wrapped piece of `line` with its top at `top`
    fn draw_wrapped(
        &self,
        content: &mut String,
        line: &TextLine,
        text: &str,
        x: f64,
        width: f64,
        top: f64,
    ) {
        let style = &line.style;
        let face = self.fonts.face(style.bold);
        let baseline = top - style.font_size;
        let text_x = match style.align {
            TextAlign::Left => x,
            TextAlign::Center => x + (width - face.text_width(text, style.font_size)) / 2.0,
        };
        write_text(content, face, style.font_size, style.color, text_x, baseline, text);
    }

    /// Footer rule and text, anchored to the bottom margin
    fn finish_page(&self, content: &mut String, description: &PageDescription) {
        let footer = &description.footer;
        let style = &footer.text.style;
        let page_width = self.geometry.page.width.pt();
        let inset = self.geometry.footer_inset.pt();
        let bottom = self.geometry.footer_bottom.pt();
        let text_height = style.font_size * LINE_SPACING;

        if footer.rule {
            let rule_y = bottom + text_height + self.geometry.footer_rule_gap.pt();
            content.push_str("q\n0 0 0 RG\n1 w\n");
            content.push_str(&format!(
                "{} {} m\n{} {} l\nS\nQ\n",
                fmt_num(inset),
                fmt_num(rule_y),
                fmt_num(page_width - inset),
                fmt_num(rule_y)
            ));
        }

        let face = self.fonts.face(style.bold);
        let footer_width = page_width - 2.0 * inset;
        let text_width = face.text_width(&footer.text.text, style.font_size);
        let x = match style.align {
            TextAlign::Left => inset,
            TextAlign::Center => inset + (footer_width - text_width) / 2.0,
        };
        let baseline = bottom + (text_height - style.font_size);
        write_text(content, face, style.font_size, style.color, x, baseline, &footer.text.text);
    }

    fn draw_watermark(&self, content: &mut String, watermark: &Watermark) {
        let face = self.fonts.face(true);
        let (sin, cos) = watermark.angle_degrees.to_radians().sin_cos();
        let half_width = face.text_width(&watermark.text, watermark.font_size) / 2.0;
        let half_height = watermark.font_size / 3.0;
        let center_x = self.geometry.page.width.pt() / 2.0;
        let center_y = self.geometry.page.height.pt() / 2.0;

        // Rotate about the page center so the text's midpoint lands there
        let tx = center_x - half_width * cos + half_height * sin;
        let ty = center_y - half_width * sin - half_height * cos;

        content.push_str("q\nBT\n");
        content.push_str(&format!("/{} {} Tf\n", face.resource_name, fmt_num(watermark.font_size)));
        content.push_str(&format!("{} rg\n", fmt_color(watermark.color)));
        content.push_str(&format!(
            "{} {} {} {} {} {} Tm\n",
            fmt_num(cos),
            fmt_num(sin),
            fmt_num(-sin),
            fmt_num(cos),
            fmt_num(tx),
            fmt_num(ty)
        ));
        content.push_str(&format!("({}) Tj\n", escape_pdf_string(&watermark.text)));
        content.push_str("ET\nQ\n");
    }

    /// Assemble pages, fonts, and the catalog into a document
    fn build_document(&self, pages: &[String], title: &str) -> Result<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for face in self.fonts.faces() {
            let font_id = add_standard_font(&mut doc, face);
            fonts.set(face.resource_name, Object::Reference(font_id));
        }
        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(fonts));
        let resources_id = doc.add_object(Object::Dictionary(resources));

        let media_box = Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(self.geometry.page.width.pt() as f32),
            Object::Real(self.geometry.page.height.pt() as f32),
        ]);

        let mut kids = Vec::with_capacity(pages.len());
        for content in pages {
            let stream = Stream::new(Dictionary::new(), content.clone().into_bytes());
            let content_id = doc.add_object(stream);

            let mut page = Dictionary::new();
            page.set("Type", Object::Name(b"Page".to_vec()));
            page.set("Parent", Object::Reference(pages_id));
            page.set("MediaBox", media_box.clone());
            page.set("Resources", Object::Reference(resources_id));
            page.set("Contents", Object::Reference(content_id));
            kids.push(Object::Reference(doc.add_object(Object::Dictionary(page))));
        }

        let mut pages_object = Dictionary::new();
        pages_object.set("Type", Object::Name(b"Pages".to_vec()));
        pages_object.set("Count", Object::Integer(kids.len() as i64));
        pages_object.set("Kids", Object::Array(kids));
        doc.objects.insert(pages_id, Object::Dictionary(pages_object));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(Object::Dictionary(catalog));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut info = Dictionary::new();
        if !title.is_empty() {
            info.set("Title", text_string(title));
        }
        info.set("Producer", Object::string_literal("exam-papers"));
        let info_id = doc.add_object(Object::Dictionary(info));
        doc.trailer.set("Info", Object::Reference(info_id));

        doc.compress();
        Ok(doc)
    }
}

impl RenderEngine for PdfRenderer {
    fn render(&self, description: &PageDescription) -> Result<Vec<u8>> {
        self.render_document(description)
    }

    fn extension(&self) -> &str {
        "pdf"
    }
}

/// Add one of the standard 14 fonts (no embedding needed)
fn add_standard_font(doc: &mut Document, face: &FontFace) -> ObjectId {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(face.base_font.as_bytes().to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    doc.add_object(Object::Dictionary(font))
}

fn write_text(
    content: &mut String,
    face: &FontFace,
    font_size: f64,
    color: Color,
    x: f64,
    y: f64,
    text: &str,
) {
    if text.is_empty() {
        return;
    }
    content.push_str("BT\n");
    content.push_str(&format!("/{} {} Tf\n", face.resource_name, fmt_num(font_size)));
    content.push_str(&format!("{} rg\n", fmt_color(color)));
    content.push_str(&format!("1 0 0 1 {} {} Tm\n", fmt_num(x), fmt_num(y)));
    content.push_str(&format!("({}) Tj\n", escape_pdf_string(text)));
    content.push_str("ET\n");
}

/// A PDF text string for the document information dictionary
///
/// ASCII is written as a literal; anything else as UTF-16BE with a byte
/// order mark.
pub fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Greedy word wrap to `max_width` points
///
/// Words wider than the line are kept whole on their own line. Empty text
/// still yields one (blank) line.
pub fn wrap_text(face: &FontFace, text: &str, font_size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if face.text_width(&candidate, font_size) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Escape text for a PDF literal string in WinAnsiEncoding
///
/// Latin-1 characters become octal escapes; characters WinAnsi cannot
/// represent become `?`.
pub fn escape_pdf_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            ' '..='~' => escaped.push(ch),
            _ => match win_ansi_code(ch) {
                Some(code) => escaped.push_str(&format!("\\{:03o}", code)),
                None => escaped.push('?'),
            },
        }
    }
    escaped
}

fn win_ansi_code(ch: char) -> Option<u8> {
    match ch {
        '\u{a0}'..='\u{ff}' => Some(ch as u32 as u8),
        '€' => Some(0x80),
        '‘' => Some(0x91),
        '’' => Some(0x92),
        '“' => Some(0x93),
        '”' => Some(0x94),
        '•' => Some(0x95),
        '–' => Some(0x96),
        '—' => Some(0x97),
        _ => None,
    }
}

fn fmt_num(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

fn fmt_color(color: Color) -> String {
    format!(
        "{} {} {}",
        fmt_num(color.r as f64 / 255.0),
        fmt_num(color.g as f64 / 255.0),
        fmt_num(color.b as f64 / 255.0)
    )
}
