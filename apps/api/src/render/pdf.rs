//! A4 PDF writer over `lopdf`.
//!
//! Text uses the base-14 Helvetica family with WinAnsiEncoding, so nothing is
//! embedded and widths come from `font_metrics`. Streams are left uncompressed and
//! the document carries no `/ID` or dates; the same input always yields the same bytes.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, StringFormat};

use super::font_metrics::{get_metrics, PdfFont};
use super::layout::{self, Block, ContactItem, PROJECT_LINK_LABEL};
use super::RenderError;
use crate::models::resume::ResumeDraft;

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 30.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const LEADING: f32 = 1.4;

const NAME_SIZE: f32 = 24.0;
const SECTION_SIZE: f32 = 14.0;
const ENTRY_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 10.0;
const BADGE_SIZE: f32 = 9.0;
const BULLET_INDENT: f32 = 10.0;

type Rgb = [f32; 3];
const BLACK: Rgb = [0.0, 0.0, 0.0];
const NAME_COLOR: Rgb = [0.176, 0.216, 0.282]; // #2d3748
const MUTED: Rgb = [0.443, 0.502, 0.588]; // #718096
const ACCENT: Rgb = [0.169, 0.424, 0.690]; // #2b6cb0
const BADGE_FILL: Rgb = [0.922, 0.973, 1.0]; // #ebf8ff
const RULE: Rgb = [0.8, 0.8, 0.8]; // #ccc

/// Renders the tailored résumé.
pub fn render_resume(draft: &ResumeDraft) -> Result<Vec<u8>, RenderError> {
    render_blocks(&layout::resume_blocks(draft))
}

/// Renders the cover letter, preceded by the résumé header when `draft` is given.
pub fn render_cover_letter(text: &str, draft: Option<&ResumeDraft>) -> Result<Vec<u8>, RenderError> {
    render_blocks(&layout::cover_letter_blocks(text, draft))
}

fn render_blocks(blocks: &[Block]) -> Result<Vec<u8>, RenderError> {
    let mut writer = PageWriter::new();
    for block in blocks {
        writer.block(block);
    }
    writer.finish()
}

/// Maps text to WinAnsiEncoding bytes. Characters outside the code page become `?`.
pub fn win_ansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

struct LinkArea {
    rect: [f32; 4],
    url: String,
}

#[derive(Default)]
struct PageContent {
    ops: Vec<Operation>,
    links: Vec<LinkArea>,
}

/// Top-down cursor over a growing list of pages.
struct PageWriter {
    finished: Vec<PageContent>,
    current: PageContent,
    /// Top of the free area on the current page, in PDF user space (origin bottom-left).
    y: f32,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            finished: Vec::new(),
            current: PageContent::default(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn at_page_top(&self) -> bool {
        self.y >= PAGE_HEIGHT - MARGIN
    }

    /// Starts a new page unless `height` still fits. A block taller than a page is
    /// never pushed forward from an empty page.
    fn ensure_space(&mut self, height: f32) {
        if self.y - height < MARGIN && !self.at_page_top() {
            let done = std::mem::take(&mut self.current);
            self.finished.push(done);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn skip(&mut self, height: f32) {
        self.y -= height;
    }

    fn text(&mut self, font: PdfFont, size: f32, color: Rgb, x: f32, baseline: f32, s: &str) {
        let ops = &mut self.current.ops;
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font.resource_name().as_bytes().to_vec()), size.into()],
        ));
        ops.push(Operation::new(
            "rg",
            vec![color[0].into(), color[1].into(), color[2].into()],
        ));
        ops.push(Operation::new(
            "Tm",
            vec![
                1.0_f32.into(),
                0.0_f32.into(),
                0.0_f32.into(),
                1.0_f32.into(),
                x.into(),
                baseline.into(),
            ],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(win_ansi(s), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    fn fill_rect(&mut self, color: Rgb, x: f32, y: f32, width: f32, height: f32) {
        let ops = &mut self.current.ops;
        ops.push(Operation::new(
            "rg",
            vec![color[0].into(), color[1].into(), color[2].into()],
        ));
        ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), width.into(), height.into()],
        ));
        ops.push(Operation::new("f", vec![]));
    }

    fn rule(&mut self, color: Rgb, y: f32) {
        let ops = &mut self.current.ops;
        ops.push(Operation::new(
            "RG",
            vec![color[0].into(), color[1].into(), color[2].into()],
        ));
        ops.push(Operation::new("w", vec![1.0_f32.into()]));
        ops.push(Operation::new("m", vec![MARGIN.into(), y.into()]));
        ops.push(Operation::new("l", vec![(PAGE_WIDTH - MARGIN).into(), y.into()]));
        ops.push(Operation::new("S", vec![]));
    }

    fn link(&mut self, x: f32, baseline: f32, width: f32, size: f32, url: &str) {
        self.current.links.push(LinkArea {
            rect: [x, baseline - size * 0.25, x + width, baseline + size],
            url: url.to_string(),
        });
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Header { name, contacts } => self.header(name, contacts),
            Block::SectionTitle(title) => self.section_title(title),
            Block::Paragraph(text) => {
                self.wrapped(text, PdfFont::Helvetica, BODY_SIZE, BLACK, MARGIN, CONTENT_WIDTH);
                self.skip(BODY_SIZE);
            }
            Block::Entry {
                title,
                link,
                meta,
                bullets,
            } => self.entry(title, link.as_deref(), meta, bullets),
            Block::Row { left, right } => self.row(left, right),
            Block::Badges(items) => self.badges(items),
            Block::LetterLine(line) => {
                if line.trim().is_empty() {
                    self.ensure_space(ENTRY_SIZE * LEADING);
                    self.skip(ENTRY_SIZE * LEADING);
                } else {
                    self.wrapped(line, PdfFont::Helvetica, ENTRY_SIZE, BLACK, MARGIN, CONTENT_WIDTH);
                }
            }
        }
    }

    /// Draws word-wrapped lines, breaking pages between lines as needed.
    fn wrapped(&mut self, text: &str, font: PdfFont, size: f32, color: Rgb, x: f32, width: f32) {
        let line_height = size * LEADING;
        for line in get_metrics(font).wrap(text, size, width) {
            self.ensure_space(line_height);
            self.text(font, size, color, x, self.y - size, &line);
            self.skip(line_height);
        }
    }

    fn header(&mut self, name: &str, contacts: &[ContactItem]) {
        if !name.is_empty() {
            let bold = get_metrics(PdfFont::HelveticaBold);
            let width = bold.width_pt(name, NAME_SIZE);
            let x = ((PAGE_WIDTH - width) / 2.0).max(MARGIN);
            self.text(PdfFont::HelveticaBold, NAME_SIZE, NAME_COLOR, x, self.y - NAME_SIZE, name);
            self.skip(NAME_SIZE * 1.2 + 8.0);
        }

        if !contacts.is_empty() {
            let regular = get_metrics(PdfFont::Helvetica);
            let separator = "  |  ";
            let label = |item: &ContactItem| match item {
                ContactItem::Text(text) => text.clone(),
                ContactItem::Link { label, .. } => label.clone(),
            };
            let total: f32 = contacts
                .iter()
                .map(|item| regular.width_pt(&label(item), BODY_SIZE))
                .sum::<f32>()
                + regular.width_pt(separator, BODY_SIZE) * (contacts.len() - 1) as f32;

            let baseline = self.y - BODY_SIZE;
            let mut x = ((PAGE_WIDTH - total) / 2.0).max(MARGIN);
            for (i, item) in contacts.iter().enumerate() {
                if i > 0 {
                    self.text(PdfFont::Helvetica, BODY_SIZE, MUTED, x, baseline, separator);
                    x += regular.width_pt(separator, BODY_SIZE);
                }
                let text = label(item);
                let width = regular.width_pt(&text, BODY_SIZE);
                match item {
                    ContactItem::Text(_) => {
                        self.text(PdfFont::Helvetica, BODY_SIZE, MUTED, x, baseline, &text);
                    }
                    ContactItem::Link { url, .. } => {
                        self.text(PdfFont::Helvetica, BODY_SIZE, ACCENT, x, baseline, &text);
                        self.link(x, baseline, width, BODY_SIZE, url);
                    }
                }
                x += width;
            }
            self.skip(BODY_SIZE * LEADING);
        }

        self.skip(15.0);
        self.rule(RULE, self.y);
        self.skip(20.0);
    }

    fn section_title(&mut self, title: &str) {
        // Keep the title together with at least one line of its section.
        self.ensure_space(15.0 + SECTION_SIZE * LEADING + 6.0 + ENTRY_SIZE * LEADING);
        if !self.at_page_top() {
            self.skip(15.0);
        }
        self.text(
            PdfFont::HelveticaBold,
            SECTION_SIZE,
            ACCENT,
            MARGIN,
            self.y - SECTION_SIZE,
            &title.to_uppercase(),
        );
        self.skip(SECTION_SIZE * LEADING + 6.0);
    }

    fn entry(&mut self, title: &str, link: Option<&str>, meta: &str, bullets: &[String]) {
        let bold = get_metrics(PdfFont::HelveticaBold);
        let regular = get_metrics(PdfFont::Helvetica);
        let italic = get_metrics(PdfFont::HelveticaOblique);

        let meta_width = italic.width_pt(meta, BODY_SIZE);
        let link_width = link
            .map(|_| regular.width_pt(PROJECT_LINK_LABEL, ENTRY_SIZE) + 4.0)
            .unwrap_or(0.0);
        let title_width = (CONTENT_WIDTH - meta_width - link_width - 12.0).max(CONTENT_WIDTH / 3.0);
        let title_lines = bold.wrap(title, ENTRY_SIZE, title_width);
        let line_height = ENTRY_SIZE * LEADING;

        self.ensure_space(line_height * title_lines.len().max(1) as f32 + BODY_SIZE * LEADING);

        let first_baseline = self.y - ENTRY_SIZE;
        if !meta.is_empty() {
            self.text(
                PdfFont::HelveticaOblique,
                BODY_SIZE,
                MUTED,
                PAGE_WIDTH - MARGIN - meta_width,
                first_baseline,
                meta,
            );
        }

        let mut last_end = MARGIN;
        let mut last_baseline = first_baseline;
        for line in &title_lines {
            let baseline = self.y - ENTRY_SIZE;
            self.text(PdfFont::HelveticaBold, ENTRY_SIZE, BLACK, MARGIN, baseline, line);
            last_end = MARGIN + bold.width_pt(line, ENTRY_SIZE);
            last_baseline = baseline;
            self.skip(line_height);
        }
        if title_lines.is_empty() {
            self.skip(line_height);
        }

        if let Some(url) = link {
            let x = last_end + 4.0;
            let width = regular.width_pt(PROJECT_LINK_LABEL, ENTRY_SIZE);
            self.text(PdfFont::Helvetica, ENTRY_SIZE, ACCENT, x, last_baseline, PROJECT_LINK_LABEL);
            self.link(x, last_baseline, width, ENTRY_SIZE, url);
        }

        self.skip(2.0);
        let bullet_line = BODY_SIZE * LEADING;
        for bullet in bullets {
            let lines = regular.wrap(bullet, BODY_SIZE, CONTENT_WIDTH - BULLET_INDENT);
            self.ensure_space(bullet_line);
            self.text(PdfFont::Helvetica, BODY_SIZE, BLACK, MARGIN, self.y - BODY_SIZE, "•");
            if lines.is_empty() {
                self.skip(bullet_line);
            }
            for line in lines {
                self.ensure_space(bullet_line);
                self.text(
                    PdfFont::Helvetica,
                    BODY_SIZE,
                    BLACK,
                    MARGIN + BULLET_INDENT,
                    self.y - BODY_SIZE,
                    &line,
                );
                self.skip(bullet_line);
            }
        }
        self.skip(8.0);
    }

    fn row(&mut self, left: &str, right: &str) {
        let regular = get_metrics(PdfFont::Helvetica);
        let line_height = BODY_SIZE * LEADING;
        self.ensure_space(line_height);

        let baseline = self.y - BODY_SIZE;
        self.text(PdfFont::HelveticaBold, BODY_SIZE, BLACK, MARGIN, baseline, left);
        let right_width = regular.width_pt(right, BODY_SIZE);
        self.text(
            PdfFont::Helvetica,
            BODY_SIZE,
            BLACK,
            PAGE_WIDTH - MARGIN - right_width,
            baseline,
            right,
        );
        self.skip(line_height + 4.0);
    }

    fn badges(&mut self, items: &[String]) {
        const PAD_X: f32 = 6.0;
        const PAD_Y: f32 = 2.0;
        const GAP: f32 = 8.0;
        let regular = get_metrics(PdfFont::Helvetica);
        let badge_height = BADGE_SIZE + 2.0 * PAD_Y + 2.0;
        let row_height = badge_height + 6.0;

        let mut x = MARGIN;
        self.ensure_space(row_height);
        for item in items {
            let width = regular.width_pt(item, BADGE_SIZE) + 2.0 * PAD_X;
            if x > MARGIN && x + width > PAGE_WIDTH - MARGIN {
                x = MARGIN;
                self.skip(row_height);
                self.ensure_space(row_height);
            }
            let bottom = self.y - badge_height;
            self.fill_rect(BADGE_FILL, x, bottom, width, badge_height);
            self.text(
                PdfFont::Helvetica,
                BADGE_SIZE,
                ACCENT,
                x + PAD_X,
                bottom + PAD_Y + 2.5,
                item,
            );
            x += width + GAP;
        }
        self.skip(row_height);
    }

    fn finish(mut self) -> Result<Vec<u8>, RenderError> {
        self.finished.push(self.current);

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for font in PdfFont::ALL {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource_name(), font_id);
        }

        let mut kids: Vec<Object> = Vec::with_capacity(self.finished.len());
        for page in self.finished {
            let content = Content {
                operations: page.ops,
            };
            let content_id = doc.add_object(lopdf::Stream::new(dictionary! {}, content.encode()?));

            let annots: Vec<Object> = page
                .links
                .into_iter()
                .map(|link| Object::Reference(doc.add_object(link_annotation(&link))))
                .collect();

            let mut page_dict = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! { "Font" => fonts.clone() },
                "MediaBox" => vec![
                    0.0_f32.into(),
                    0.0_f32.into(),
                    PAGE_WIDTH.into(),
                    PAGE_HEIGHT.into(),
                ],
            };
            if !annots.is_empty() {
                page_dict.set("Annots", annots);
            }
            kids.push(Object::Reference(doc.add_object(page_dict)));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out)?;
        Ok(out)
    }
}

fn link_annotation(link: &LinkArea) -> Dictionary {
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => link.rect.iter().map(|v| Object::from(*v)).collect::<Vec<_>>(),
        "Border" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
        "A" => dictionary! {
            "S" => "URI",
            "URI" => Object::string_literal(link.url.as_str()),
        },
    }
}
