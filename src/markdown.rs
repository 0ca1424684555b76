//! Docx block to Markdown conversion
//!
//! Converts the structured block representation returned by the document API
//! into Markdown text. Embedded images are emitted as bare token placeholders;
//! the download pipeline later rewrites each placeholder to the local path of
//! the downloaded asset.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::DocxDocument;

/// Block type codes used by the docx API
mod block_type {
    pub const PAGE: i64 = 1;
    pub const TEXT: i64 = 2;
    pub const HEADING1: i64 = 3;
    pub const HEADING9: i64 = 11;
    pub const BULLET: i64 = 12;
    pub const ORDERED: i64 = 13;
    pub const CODE: i64 = 14;
    pub const QUOTE: i64 = 15;
    pub const TODO: i64 = 17;
    pub const DIVIDER: i64 = 22;
    pub const IMAGE: i64 = 27;
}

/// Inline formatting applied to a text run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TextElementStyle {
    /// Bold
    #[serde(default)]
    pub bold: bool,
    /// Italic
    #[serde(default)]
    pub italic: bool,
    /// Strikethrough
    #[serde(default)]
    pub strikethrough: bool,
    /// Inline code
    #[serde(default)]
    pub inline_code: bool,
    /// Hyperlink target, if any
    #[serde(default)]
    pub link: Option<Link>,
}

/// Hyperlink target of a text run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Link {
    /// Percent-encoded target URL
    pub url: String,
}

/// A run of styled text
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TextRun {
    /// The literal text content
    pub content: String,
    /// Styling applied to the run
    #[serde(default)]
    pub text_element_style: Option<TextElementStyle>,
}

/// One element of a text block (only text runs are rendered)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TextElement {
    /// Styled text run, if this element is one
    #[serde(default)]
    pub text_run: Option<TextRun>,
}

/// Paragraph-level style of a text block
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TextStyle {
    /// For todo blocks: whether the item is checked
    #[serde(default)]
    pub done: bool,
}

/// Payload shared by all text-carrying block types
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TextBlock {
    /// Paragraph style
    #[serde(default)]
    pub style: TextStyle,
    /// The text elements making up the paragraph
    #[serde(default)]
    pub elements: Vec<TextElement>,
}

/// Payload of an image block
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageBlock {
    /// Media token of the image (download key)
    pub token: String,
}

/// One structured content block of a docx document
///
/// The API returns blocks flattened in document order. Each block type keeps
/// its payload under a type-specific key; unknown types carry none of them
/// and degrade to nothing when rendered.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DocxBlock {
    /// Unique block id
    #[serde(default)]
    pub block_id: String,
    /// Numeric block type code
    pub block_type: i64,
    /// Text payload for paragraph-like types (text, headings, lists, ...)
    #[serde(default)]
    pub text: Option<TextBlock>,
    /// Level 1 heading payload
    #[serde(default)]
    pub heading1: Option<TextBlock>,
    /// Level 2 heading payload
    #[serde(default)]
    pub heading2: Option<TextBlock>,
    /// Level 3 heading payload
    #[serde(default)]
    pub heading3: Option<TextBlock>,
    /// Level 4 heading payload
    #[serde(default)]
    pub heading4: Option<TextBlock>,
    /// Level 5 heading payload
    #[serde(default)]
    pub heading5: Option<TextBlock>,
    /// Level 6 heading payload
    #[serde(default)]
    pub heading6: Option<TextBlock>,
    /// Level 7 heading payload
    #[serde(default)]
    pub heading7: Option<TextBlock>,
    /// Level 8 heading payload
    #[serde(default)]
    pub heading8: Option<TextBlock>,
    /// Level 9 heading payload
    #[serde(default)]
    pub heading9: Option<TextBlock>,
    /// Bullet list item payload
    #[serde(default)]
    pub bullet: Option<TextBlock>,
    /// Ordered list item payload
    #[serde(default)]
    pub ordered: Option<TextBlock>,
    /// Code block payload
    #[serde(default)]
    pub code: Option<TextBlock>,
    /// Quote payload
    #[serde(default)]
    pub quote: Option<TextBlock>,
    /// Todo item payload
    #[serde(default)]
    pub todo: Option<TextBlock>,
    /// Image payload
    #[serde(default)]
    pub image: Option<ImageBlock>,
}

impl DocxBlock {
    fn heading_payload(&self, level: usize) -> Option<&TextBlock> {
        match level {
            1 => self.heading1.as_ref(),
            2 => self.heading2.as_ref(),
            3 => self.heading3.as_ref(),
            4 => self.heading4.as_ref(),
            5 => self.heading5.as_ref(),
            6 => self.heading6.as_ref(),
            7 => self.heading7.as_ref(),
            8 => self.heading8.as_ref(),
            9 => self.heading9.as_ref(),
            _ => None,
        }
    }
}

/// Converts docx blocks to Markdown and records encountered asset tokens
///
/// One renderer instance is used per document; [`image_tokens`](Self::image_tokens)
/// exposes the tokens in the order their placeholders appear in the output.
#[derive(Debug, Default)]
pub struct MarkdownRenderer {
    image_tokens: Vec<String>,
}

impl MarkdownRenderer {
    /// Create a fresh renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Asset tokens encountered during the last [`render`](Self::render) call
    pub fn image_tokens(&self) -> &[String] {
        &self.image_tokens
    }

    /// Render a document's blocks as Markdown
    ///
    /// A block whose type-specific payload is missing is malformed input and
    /// fails the conversion.
    pub fn render(&mut self, document: &DocxDocument, blocks: &[DocxBlock]) -> Result<String> {
        let mut out = String::new();
        let mut ordered_index = 0u64;

        for block in blocks {
            // Ordered-list numbering restarts at the first non-ordered block
            if block.block_type != block_type::ORDERED {
                ordered_index = 0;
            }

            match block.block_type {
                // The page block mirrors the document title, which the header
                // block already carries
                block_type::PAGE => {}
                block_type::TEXT => {
                    let text = self.require_payload(document, block, block.text.as_ref())?;
                    out.push_str(&render_elements(&text.elements));
                    out.push_str("\n\n");
                }
                t if (block_type::HEADING1..=block_type::HEADING9).contains(&t) => {
                    let level = (t - block_type::HEADING1 + 1) as usize;
                    let payload = block.heading_payload(level);
                    let text = self.require_payload(document, block, payload)?;
                    out.push_str(&"#".repeat(level));
                    out.push(' ');
                    out.push_str(&render_elements(&text.elements));
                    out.push_str("\n\n");
                }
                block_type::BULLET => {
                    let text = self.require_payload(document, block, block.bullet.as_ref())?;
                    out.push_str("- ");
                    out.push_str(&render_elements(&text.elements));
                    out.push('\n');
                }
                block_type::ORDERED => {
                    ordered_index += 1;
                    let text = self.require_payload(document, block, block.ordered.as_ref())?;
                    out.push_str(&format!("{}. ", ordered_index));
                    out.push_str(&render_elements(&text.elements));
                    out.push('\n');
                }
                block_type::CODE => {
                    let text = self.require_payload(document, block, block.code.as_ref())?;
                    out.push_str("```\n");
                    out.push_str(&render_plain(&text.elements));
                    out.push_str("\n```\n\n");
                }
                block_type::QUOTE => {
                    let text = self.require_payload(document, block, block.quote.as_ref())?;
                    out.push_str("> ");
                    out.push_str(&render_elements(&text.elements));
                    out.push_str("\n\n");
                }
                block_type::TODO => {
                    let text = self.require_payload(document, block, block.todo.as_ref())?;
                    let marker = if text.style.done { "[x]" } else { "[ ]" };
                    out.push_str(&format!("- {} ", marker));
                    out.push_str(&render_elements(&text.elements));
                    out.push('\n');
                }
                block_type::DIVIDER => {
                    out.push_str("---\n\n");
                }
                block_type::IMAGE => {
                    let image = block.image.as_ref().ok_or_else(|| {
                        Error::Converter(format!(
                            "document {}: image block {} has no image payload",
                            document.document_id, block.block_id
                        ))
                    })?;
                    self.image_tokens.push(image.token.clone());
                    out.push_str(&format!("![]({})\n\n", image.token));
                }
                // Unknown block types degrade to their text payload, if any
                _ => {
                    if let Some(text) = &block.text {
                        out.push_str(&render_elements(&text.elements));
                        out.push_str("\n\n");
                    }
                }
            }
        }

        Ok(out.trim_end().to_string())
    }

    fn require_payload<'a>(
        &self,
        document: &DocxDocument,
        block: &DocxBlock,
        payload: Option<&'a TextBlock>,
    ) -> Result<&'a TextBlock> {
        payload.ok_or_else(|| {
            Error::Converter(format!(
                "document {}: block {} (type {}) has no payload",
                document.document_id, block.block_id, block.block_type
            ))
        })
    }
}

/// Render text elements with inline Markdown formatting
fn render_elements(elements: &[TextElement]) -> String {
    let mut out = String::new();
    for element in elements {
        let Some(run) = &element.text_run else {
            continue;
        };
        let style = run.text_element_style.clone().unwrap_or_default();
        let mut piece = run.content.clone();

        if style.inline_code {
            piece = format!("`{}`", piece);
        } else {
            if style.bold {
                piece = format!("**{}**", piece);
            }
            if style.italic {
                piece = format!("*{}*", piece);
            }
            if style.strikethrough {
                piece = format!("~~{}~~", piece);
            }
        }
        if let Some(link) = &style.link {
            let url = percent_decode(&link.url);
            piece = format!("[{}]({})", piece, url);
        }
        out.push_str(&piece);
    }
    out
}

/// Render text elements without formatting (code blocks)
fn render_plain(elements: &[TextElement]) -> String {
    elements
        .iter()
        .filter_map(|e| e.text_run.as_ref())
        .map(|r| r.content.as_str())
        .collect()
}

/// Decode the percent-encoding the API applies to link URLs
fn percent_decode(encoded: &str) -> String {
    let bytes = encoded.as_bytes();
    let mut buf = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Some(byte) = decode_hex_pair(&bytes[i + 1..i + 3]) {
                buf.push(byte);
                i += 3;
                continue;
            }
        }
        buf.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(buf).unwrap_or_else(|_| encoded.to_string())
}

fn decode_hex_pair(pair: &[u8]) -> Option<u8> {
    let s = std::str::from_utf8(pair).ok()?;
    u8::from_str_radix(s, 16).ok()
}
