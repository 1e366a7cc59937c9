//! WordprocessingML (.docx) writer.
//!
//! A .docx is a zip of XML parts. Only the parts Word needs are emitted: content
//! types, the package relationship, the document, styles, numbering (for bullets),
//! and the document relationships that back hyperlinks. Every zip entry carries
//! the DOS epoch timestamp so output is reproducible.

use std::io::{Cursor, Write as _};

use zip::write::SimpleFileOptions;

use super::layout::{self, Block, ContactItem, PROJECT_LINK_LABEL};
use super::RenderError;
use crate::models::resume::ResumeDraft;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

/// Relationship ids below this are reserved for styles and numbering.
const FIRST_LINK_REL: usize = 3;
/// Right tab stop at the text edge of an A4 page with 600-twip margins.
const RIGHT_TAB_TWIPS: u32 = 10_706;

pub fn render_resume_docx(draft: &ResumeDraft) -> Result<Vec<u8>, RenderError> {
    package(&layout::resume_blocks(draft))
}

pub fn render_cover_letter_docx(
    text: &str,
    draft: Option<&ResumeDraft>,
) -> Result<Vec<u8>, RenderError> {
    package(&layout::cover_letter_blocks(text, draft))
}

fn package(blocks: &[Block]) -> Result<Vec<u8>, RenderError> {
    let mut body = BodyWriter::default();
    for block in blocks {
        body.block(block);
    }

    let document_xml = body.document_xml();
    let document_rels = body.relationships_xml();

    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644);

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let parts: [(&str, &str); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", PACKAGE_RELS_XML),
        ("word/document.xml", document_xml.as_str()),
        ("word/styles.xml", STYLES_XML),
        ("word/numbering.xml", NUMBERING_XML),
        ("word/_rels/document.xml.rels", document_rels.as_str()),
    ];
    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Escapes text for element content and attribute values. Characters XML 1.0
/// cannot represent are dropped.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

#[derive(Default)]
struct BodyWriter {
    xml: String,
    links: Vec<String>,
}

impl BodyWriter {
    fn link_id(&mut self, url: &str) -> String {
        self.links.push(url.to_string());
        format!("rId{}", FIRST_LINK_REL + self.links.len() - 1)
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Header { name, contacts } => self.header(name, contacts),
            Block::SectionTitle(title) => {
                self.xml.push_str(&format!(
                    "<w:p><w:pPr><w:pStyle w:val=\"Heading1\"/></w:pPr>{}</w:p>",
                    run(title, "")
                ));
            }
            Block::Paragraph(text) | Block::LetterLine(text) => {
                if text.is_empty() {
                    self.xml.push_str("<w:p></w:p>");
                } else {
                    self.xml.push_str(&format!("<w:p>{}</w:p>", run(text, "")));
                }
            }
            Block::Entry {
                title,
                link,
                meta,
                bullets,
            } => {
                let mut p = tabbed_paragraph_start();
                p.push_str(&run(title, "<w:b/><w:i/>"));
                if let Some(url) = link {
                    let id = self.link_id(url);
                    p.push_str(&run(" ", ""));
                    p.push_str(&hyperlink(&id, PROJECT_LINK_LABEL));
                }
                if !meta.is_empty() {
                    p.push_str("<w:r><w:tab/></w:r>");
                    p.push_str(&run(meta, "<w:b/><w:i/>"));
                }
                p.push_str("</w:p>");
                self.xml.push_str(&p);

                for bullet in bullets {
                    self.xml.push_str(&format!(
                        "<w:p><w:pPr><w:pStyle w:val=\"ListBullet\"/><w:numPr><w:ilvl w:val=\"0\"/><w:numId w:val=\"1\"/></w:numPr></w:pPr>{}</w:p>",
                        run(bullet, "")
                    ));
                }
            }
            Block::Row { left, right } => {
                self.xml.push_str(&format!(
                    "{}{}<w:r><w:tab/></w:r>{}</w:p>",
                    tabbed_paragraph_start(),
                    run(left, "<w:b/>"),
                    run(right, "")
                ));
            }
            Block::Badges(items) => {
                self.xml
                    .push_str(&format!("<w:p>{}</w:p>", run(&items.join(" • "), "")));
            }
        }
    }

    fn header(&mut self, name: &str, contacts: &[ContactItem]) {
        if !name.is_empty() {
            self.xml.push_str(&format!(
                "<w:p><w:pPr><w:pStyle w:val=\"Title\"/><w:jc w:val=\"center\"/></w:pPr>{}</w:p>",
                run(name, "")
            ));
        }
        if contacts.is_empty() {
            return;
        }

        let mut p = String::from("<w:p><w:pPr><w:jc w:val=\"center\"/></w:pPr>");
        for (i, item) in contacts.iter().enumerate() {
            if i > 0 {
                p.push_str(&run(" | ", ""));
            }
            match item {
                ContactItem::Text(text) => p.push_str(&run(text, "")),
                ContactItem::Link { label, url } => {
                    let id = self.link_id(url);
                    p.push_str(&hyperlink(&id, label));
                }
            }
        }
        p.push_str("</w:p>");
        self.xml.push_str(&p);
    }

    fn document_xml(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <w:document xmlns:w=\"{W_NS}\" xmlns:r=\"{R_NS}\"><w:body>{}\
             <w:sectPr><w:pgSz w:w=\"11906\" w:h=\"16838\"/>\
             <w:pgMar w:top=\"600\" w:right=\"600\" w:bottom=\"600\" w:left=\"600\" w:header=\"0\" w:footer=\"0\" w:gutter=\"0\"/>\
             </w:sectPr></w:body></w:document>",
            self.xml
        )
    }

    fn relationships_xml(&self) -> String {
        let mut out = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
             <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>\
             <Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering\" Target=\"numbering.xml\"/>",
        );
        for (i, url) in self.links.iter().enumerate() {
            out.push_str(&format!(
                "<Relationship Id=\"rId{}\" Type=\"{REL_HYPERLINK}\" Target=\"{}\" TargetMode=\"External\"/>",
                FIRST_LINK_REL + i,
                xml_escape(url)
            ));
        }
        out.push_str("</Relationships>");
        out
    }
}

fn run(text: &str, props: &str) -> String {
    let rpr = if props.is_empty() {
        String::new()
    } else {
        format!("<w:rPr>{props}</w:rPr>")
    };
    format!(
        "<w:r>{rpr}<w:t xml:space=\"preserve\">{}</w:t></w:r>",
        xml_escape(text)
    )
}

fn hyperlink(rel_id: &str, label: &str) -> String {
    format!(
        "<w:hyperlink r:id=\"{rel_id}\" w:history=\"1\">{}</w:hyperlink>",
        run(label, "<w:rStyle w:val=\"Hyperlink\"/>")
    )
}

fn tabbed_paragraph_start() -> String {
    format!(
        "<w:p><w:pPr><w:tabs><w:tab w:val=\"right\" w:pos=\"{RIGHT_TAB_TWIPS}\"/></w:tabs></w:pPr>"
    )
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>
</Types>
"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>
"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="Helvetica" w:hAnsi="Helvetica" w:cs="Helvetica"/><w:sz w:val="20"/></w:rPr></w:rPrDefault>
    <w:pPrDefault><w:pPr><w:spacing w:after="60" w:line="276" w:lineRule="auto"/></w:pPr></w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Title">
    <w:name w:val="Title"/><w:basedOn w:val="Normal"/>
    <w:rPr><w:b/><w:color w:val="2D3748"/><w:sz w:val="48"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/>
    <w:pPr><w:keepNext/><w:spacing w:before="300" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr>
    <w:rPr><w:b/><w:caps/><w:color w:val="2B6CB0"/><w:sz w:val="28"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="ListBullet">
    <w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/>
    <w:pPr><w:spacing w:after="20"/></w:pPr>
  </w:style>
  <w:style w:type="character" w:styleId="Hyperlink">
    <w:name w:val="Hyperlink"/>
    <w:rPr><w:color w:val="2B6CB0"/><w:u w:val="single"/></w:rPr>
  </w:style>
</w:styles>
"#;

const NUMBERING_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:abstractNum w:abstractNumId="0">
    <w:multiLevelType w:val="hybridMultilevel"/>
    <w:lvl w:ilvl="0">
      <w:start w:val="1"/>
      <w:numFmt w:val="bullet"/>
      <w:lvlText w:val="•"/>
      <w:lvlJc w:val="left"/>
      <w:pPr><w:ind w:left="360" w:hanging="360"/></w:pPr>
    </w:lvl>
  </w:abstractNum>
  <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
</w:numbering>
"#;

#[cfg(test)]
mod tests {
    use std::io::Read as _;

    use super::*;
    use crate::models::resume::fixtures::{full_draft, minimal_draft};

    fn part(docx: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_package_has_required_parts() {
        let docx = render_resume_docx(&full_draft()).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(docx.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/styles.xml",
            "word/numbering.xml",
            "word/_rels/document.xml.rels",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let draft = full_draft();
        assert_eq!(
            render_resume_docx(&draft).unwrap(),
            render_resume_docx(&draft).unwrap()
        );
    }

    #[test]
    fn test_bullet_paragraphs_match_descriptions() {
        let draft = full_draft();
        let document = part(&render_resume_docx(&draft).unwrap(), "word/document.xml");
        let expected = draft.experience.iter().map(|e| e.description.len()).sum::<usize>()
            + draft.projects.iter().map(|p| p.description.len()).sum::<usize>();

        assert_eq!(document.matches("<w:numPr>").count(), expected);
        assert!(document.contains("Cut p99 latency of the billing API by 40%"));
    }

    #[test]
    fn test_empty_sections_have_no_headings() {
        let document = part(&render_resume_docx(&minimal_draft()).unwrap(), "word/document.xml");
        assert!(!document.contains("Key Projects"));
        assert!(!document.contains(">Education<"));
        assert!(!document.contains("Certifications &amp; Training"));
        assert!(document.contains(">Experience<"));
        assert!(document.contains(">Skills<"));

        let full = part(&render_resume_docx(&full_draft()).unwrap(), "word/document.xml");
        assert!(full.contains("Certifications &amp; Training"));
        assert_eq!(full.matches("w:val=\"Heading1\"").count(), 6);
    }

    #[test]
    fn test_linkedin_is_a_real_hyperlink() {
        let docx = render_resume_docx(&full_draft()).unwrap();
        let document = part(&docx, "word/document.xml");
        let rels = part(&docx, "word/_rels/document.xml.rels");

        assert!(document.contains("<w:hyperlink r:id=\"rId3\""));
        assert!(document.contains("LinkedIn Profile"));
        assert!(document.contains("<w:hyperlink r:id=\"rId4\""));
        assert!(rels.contains(
            "Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink\" Target=\"https://linkedin.com/in/jdoe\" TargetMode=\"External\""
        ));
        assert_eq!(rels.matches("TargetMode=\"External\"").count(), 2);
    }

    #[test]
    fn test_entry_run_is_bold_italic() {
        let document = part(&render_resume_docx(&full_draft()).unwrap(), "word/document.xml");
        assert!(document.contains(
            "<w:r><w:rPr><w:b/><w:i/></w:rPr><w:t xml:space=\"preserve\">Senior Engineer | Acme Corp</w:t></w:r>"
        ));
    }

    #[test]
    fn test_cover_letter_one_paragraph_per_line() {
        let text = "Dear team,\n\nI built tinykv & shipped it.\nBest,\nJane";
        let document = part(
            &render_cover_letter_docx(text, None).unwrap(),
            "word/document.xml",
        );
        assert_eq!(document.matches("</w:p>").count(), 5);
        assert!(document.contains("tinykv &amp; shipped"));
        assert!(!document.contains("w:hyperlink"));

        let with_header = part(
            &render_cover_letter_docx(text, Some(&full_draft())).unwrap(),
            "word/document.xml",
        );
        assert!(with_header.contains("w:val=\"Title\""));
        assert_eq!(with_header.matches("</w:p>").count(), 7);
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(
            xml_escape("a<b>&\"c'\u{1}"),
            "a&lt;b&gt;&amp;&quot;c&apos;"
        );
    }
}
