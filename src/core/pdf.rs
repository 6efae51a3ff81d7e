//! Minimal text-only PDF writer
//!
//! Lays plain text out on fixed-size pages using the standard Helvetica
//! fonts, so no font files are embedded. Lines starting with `# ` are set
//! as bold headings. Text is encoded as WinAnsi (Latin-1 plus the usual
//! typographic punctuation); `₹` is written as `Rs.`. Other characters
//! (Devanagari, for one) have no glyph in these fonts: strict mode fails
//! the render, lenient mode replaces them with `?`.

use crate::core::error::RenderError;
use crate::core::filter::FilterParseMode;
use std::fmt::Write as _;

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";
/// Average Helvetica glyph width as a fraction of the font size
const GLYPH_WIDTH: f64 = 0.55;
const LEADING: f64 = 1.4;

/// WinAnsi codes 0x80..=0x9F; `None` marks the unassigned slots
const WINANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20ac}'), None, Some('\u{201a}'), Some('\u{0192}'),
    Some('\u{201e}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02c6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017d}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201c}'),
    Some('\u{201d}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02dc}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203a}'),
    Some('\u{0153}'), None, Some('\u{017e}'), Some('\u{0178}'),
];

/// Characters without a WinAnsi code that have a plain spelling
const SUBSTITUTIONS: &[(char, &str)] = &[('\u{20b9}', "Rs."), ('\u{2212}', "-")];

/// Page geometry in PDF points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub font_size: f64,
    pub heading_size: f64,
}

impl PageLayout {
    /// A4 with 1in top/bottom and 0.5in side margins
    pub fn a4() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
            margin_top: 72.0,
            margin_right: 36.0,
            margin_bottom: 72.0,
            margin_left: 36.0,
            font_size: 11.0,
            heading_size: 14.0,
        }
    }

    fn text_width(&self) -> f64 {
        self.width - self.margin_left - self.margin_right
    }

    fn text_height(&self) -> f64 {
        self.height - self.margin_top - self.margin_bottom
    }

    fn chars_per_line(&self, size: f64) -> usize {
        ((self.text_width() / (size * GLYPH_WIDTH)).floor() as usize).max(1)
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Heading(String),
    Body(String),
    Blank,
}

/// One positioned line of text
struct Placed {
    font: &'static str,
    size: f64,
    y: f64,
    text: String,
}

/// Render `text` to PDF bytes
pub fn write_text_pdf(text: &str, layout: &PageLayout, mode: FilterParseMode) -> Result<Vec<u8>, RenderError> {
    if layout.text_width() <= layout.font_size || layout.text_height() <= layout.heading_size * LEADING {
        return Err(RenderError::Pdf("page margins leave no room for text".to_string()));
    }

    let text = prepare_text(text, mode)?;
    let pages = paginate(&parse_blocks(&text), layout);
    Ok(serialize(&pages, layout))
}

/// Apply [`SUBSTITUTIONS`] and check every character can be encoded
fn prepare_text(text: &str, mode: FilterParseMode) -> Result<String, RenderError> {
    let mut out = String::with_capacity(text.len());
    let mut unsupported: Vec<char> = Vec::new();
    for c in text.chars() {
        if let Some((_, spelling)) = SUBSTITUTIONS.iter().find(|(from, _)| *from == c) {
            out.push_str(spelling);
        } else if matches!(c, '\n' | '\r' | '\t') || winansi_byte(c).is_some() {
            out.push(c);
        } else {
            if !unsupported.contains(&c) {
                unsupported.push(c);
            }
            out.push('?');
        }
    }
    if unsupported.is_empty() {
        return Ok(out);
    }

    let listed = unsupported
        .iter()
        .map(|c| format!("U+{:04X}", u32::from(*c)))
        .collect::<Vec<_>>()
        .join(", ");
    match mode {
        FilterParseMode::Strict => Err(RenderError::Pdf(format!(
            "no glyph in the built-in fonts for {}",
            listed
        ))),
        FilterParseMode::Lenient => {
            tracing::warn!(characters = %listed, "no glyph in the built-in fonts, writing '?'");
            Ok(out)
        }
    }
}

fn winansi_byte(c: char) -> Option<u8> {
    match c {
        ' '..='~' | '\u{a0}'..='\u{ff}' => u8::try_from(u32::from(c)).ok(),
        _ => WINANSI_HIGH
            .iter()
            .position(|slot| *slot == Some(c))
            .and_then(|i| u8::try_from(0x80 + i).ok()),
    }
}

fn parse_blocks(text: &str) -> Vec<Block> {
    text.lines()
        .map(|line| {
            let line = line.trim_end();
            if let Some(heading) = line.strip_prefix("# ") {
                Block::Heading(heading.trim().to_string())
            } else if line.trim().is_empty() {
                Block::Blank
            } else {
                Block::Body(line.to_string())
            }
        })
        .collect()
}

/// Greedy word wrap; words longer than a line are split
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let indent: String = text.chars().take_while(|c| *c == ' ').collect();
    let mut lines = Vec::new();
    let mut current = indent;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.trim().is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed = if current.trim().is_empty() { word.chars().count() } else { word.chars().count() + 1 };
        if current.chars().count() + needed > max_chars && !current.trim().is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.trim().is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.trim().is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn paginate(blocks: &[Block], layout: &PageLayout) -> Vec<Vec<Placed>> {
    let top = layout.height - layout.margin_top;
    let mut pages: Vec<Vec<Placed>> = vec![Vec::new()];
    let mut y = top;

    for block in blocks {
        let (font, size, lines) = match block {
            Block::Heading(text) => (BOLD_FONT, layout.heading_size, wrap(text, layout.chars_per_line(layout.heading_size))),
            Block::Body(text) => (REGULAR_FONT, layout.font_size, wrap(text, layout.chars_per_line(layout.font_size))),
            Block::Blank => (REGULAR_FONT, layout.font_size, vec![String::new()]),
        };
        for line in lines {
            let advance = size * LEADING;
            if y - advance < layout.margin_bottom {
                pages.push(Vec::new());
                y = top;
            }
            y -= advance;
            if line.is_empty() {
                continue;
            }
            if let Some(page) = pages.last_mut() {
                page.push(Placed {
                    font,
                    size,
                    y,
                    text: line,
                });
            }
        }
    }
    pages
}

/// WinAnsi bytes with PDF string escapes
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            '\t' | '\r' => out.push(b' '),
            _ => out.push(winansi_byte(c).unwrap_or(b'?')),
        }
    }
    out
}

fn content_stream(lines: &[Placed], layout: &PageLayout) -> Vec<u8> {
    let mut out = Vec::new();
    for line in lines {
        out.extend_from_slice(
            format!(
                "BT /{} {} Tf {:.2} {:.2} Td (",
                line.font, line.size, layout.margin_left, line.y
            )
            .as_bytes(),
        );
        out.extend_from_slice(&encode_text(&line.text));
        out.extend_from_slice(b") Tj ET\n");
    }
    out
}

struct ObjectWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl ObjectWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, body: &str) {
        self.begin();
        self.buf.extend_from_slice(body.as_bytes());
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, data: &[u8]) {
        self.begin();
        self.buf
            .extend_from_slice(format!("<< /Length {} >>\nstream\n", data.len()).as_bytes());
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn begin(&mut self) {
        self.offsets.push(self.buf.len());
        let number = self.offsets.len();
        self.buf.extend_from_slice(format!("{} 0 obj\n", number).as_bytes());
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", self.offsets.len() + 1);
        for offset in &self.offsets {
            let _ = write!(xref, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            self.offsets.len() + 1,
            xref_offset
        );
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}

/// Object numbers: 1 catalog, 2 page tree, 3-4 fonts, then a page object
/// and its content stream for each page.
fn serialize(pages: &[Vec<Placed>], layout: &PageLayout) -> Vec<u8> {
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 5 + i * 2).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");

    let mut writer = ObjectWriter::new();
    writer.object("<< /Type /Catalog /Pages 2 0 R >>");
    writer.object(&format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids,
        pages.len()
    ));
    writer.object("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>");
    writer.object("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>");

    for (page, id) in pages.iter().zip(&page_ids) {
        writer.object(&format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /{} 3 0 R /{} 4 0 R >> >> /Contents {} 0 R >>",
            layout.width,
            layout.height,
            REGULAR_FONT,
            BOLD_FONT,
            id + 1
        ));
        writer.stream(&content_stream(page, layout));
    }

    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One char per byte so string offsets equal byte offsets
    fn as_text(bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|b| if b.is_ascii() { *b as char } else { '.' })
            .collect()
    }

    fn page_count(pdf: &str) -> usize {
        pdf.matches("/Type /Page ").count()
    }

    #[test]
    fn test_document_structure() {
        let pdf = write_text_pdf("# Title\n\nHello world", &PageLayout::a4(), FilterParseMode::Strict).unwrap();
        let text = as_text(&pdf);
        assert!(pdf.starts_with(b"%PDF-1.4"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("/F2 14 Tf"));
        assert!(text.contains("(Hello world) Tj"));
        assert_eq!(page_count(&text), 1);
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let pdf = write_text_pdf("one\ntwo", &PageLayout::a4(), FilterParseMode::Strict).unwrap();
        let text = as_text(&pdf);
        let xref_start: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|rest| rest.lines().next())
            .and_then(|n| n.parse().ok())
            .unwrap();
        assert!(text[xref_start..].starts_with("xref"));

        let entries: Vec<&str> = text[xref_start..].lines().skip(3).take_while(|l| l.ends_with(" n ")).collect();
        assert_eq!(entries.len(), 6);
        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            assert!(text[offset..].starts_with(&format!("{} 0 obj", i + 1)));
        }
    }

    #[test]
    fn test_long_text_spans_pages() {
        let body = (0..200).map(|i| format!("Line {}", i)).collect::<Vec<_>>().join("\n");
        let text = as_text(&write_text_pdf(&body, &PageLayout::a4(), FilterParseMode::Strict).unwrap());
        assert!(page_count(&text) > 1);
        assert!(text.contains("(Line 199) Tj"));
    }

    #[test]
    fn test_escaping_and_replacement() {
        assert_eq!(encode_text("a (b) \\c"), b"a \\(b\\) \\\\c".to_vec());
        assert_eq!(encode_text("é"), vec![0xE9]);
        assert_eq!(encode_text("5\u{2013}7 \u{201c}x\u{201d} \u{20ac}"), vec![b'5', 0x96, b'7', b' ', 0x93, b'x', 0x94, b' ', 0x80]);
        assert_eq!(encode_text("\u{0905}\u{7f}"), b"??".to_vec());
    }

    #[test]
    fn test_rupee_is_spelled_out() {
        let text = prepare_text("Amount: \u{20b9}5,00,000", FilterParseMode::Strict).unwrap();
        assert_eq!(text, "Amount: Rs.5,00,000");

        let pdf = as_text(&write_text_pdf("\u{20b9}100", &PageLayout::a4(), FilterParseMode::Strict).unwrap());
        assert!(pdf.contains("(Rs.100) Tj"));
    }

    #[test]
    fn test_strict_rejects_characters_without_glyphs() {
        let err = write_text_pdf("Investor: \u{0906}\u{0936}\u{093e}", &PageLayout::a4(), FilterParseMode::Strict)
            .unwrap_err();
        assert!(matches!(err, RenderError::Pdf(_)));
        assert!(err.to_string().contains("U+0906, U+0936, U+093E"));

        let err = write_text_pdf("bell\u{7}", &PageLayout::a4(), FilterParseMode::Strict).unwrap_err();
        assert!(err.to_string().contains("U+0007"));
    }

    #[test]
    fn test_lenient_writes_placeholders() {
        let text = prepare_text("\u{0906}\u{0936}\u{093e} Rao", FilterParseMode::Lenient).unwrap();
        assert_eq!(text, "??? Rao");

        let pdf = as_text(&write_text_pdf("\u{0906} Rao", &PageLayout::a4(), FilterParseMode::Lenient).unwrap());
        assert!(pdf.contains("(? Rao) Tj"));
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("aaa bbb ccc", 7), vec!["aaa bbb", "ccc"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("", 10), vec![""]);
    }

    #[test]
    fn test_empty_text_gives_one_blank_page() {
        let text = as_text(&write_text_pdf("", &PageLayout::a4(), FilterParseMode::Strict).unwrap());
        assert_eq!(page_count(&text), 1);
    }

    #[test]
    fn test_impossible_margins_rejected() {
        let layout = PageLayout {
            margin_left: 400.0,
            margin_right: 400.0,
            ..PageLayout::a4()
        };
        assert!(write_text_pdf("x", &layout, FilterParseMode::Lenient).is_err());
    }
}
