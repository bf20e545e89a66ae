use std::io::{self, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::RenderError;
use crate::pdf::fonts::Font;
use crate::pdf::graphics::Color;
use crate::pdf::images::{ImageFormat, LogoImage};
use crate::pdf::objects::{ObjId, PdfObject};
use crate::pdf::writer::{encode_text, format_number, PdfWriter};

const CATALOG_OBJ: ObjId = ObjId(1, 0);
const PAGES_OBJ: ObjId = ObjId(2, 0);
const FIRST_FONT_OBJ_NUM: u32 = 3;

/// Handle to an image registered with [`PdfDocument::add_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageId(pub usize);

impl ImageId {
    fn resource_name(&self) -> String {
        format!("Im{}", self.0 + 1)
    }
}

/// Page-oriented PDF builder.
///
/// Coordinates follow PDF's bottom-left origin. Pages stay in memory until
/// [`end_document`](Self::end_document) so that a finished page can be
/// re-opened with [`open_page`](Self::open_page) and drawn over, which is how
/// "Page i/N" stamps are added once N is known.
pub struct PdfDocument<W: Write> {
    writer: PdfWriter<W>,
    info: Vec<(String, String)>,
    pages: Vec<Page>,
    open: Option<OpenPage>,
    images: Vec<LogoImage>,
    compress: bool,
}

struct Page {
    width: f64,
    height: f64,
    content: Vec<u8>,
}

#[derive(Clone, Copy)]
struct OpenPage {
    index: usize,
    /// `false` when re-opened for an overlay.
    is_new: bool,
}

impl<W: Write> PdfDocument<W> {
    /// Start a document on `writer`. The header is written immediately;
    /// everything else is written by `end_document`.
    pub fn new(writer: W) -> io::Result<Self> {
        let mut writer = PdfWriter::new(writer);
        writer.write_header()?;
        Ok(PdfDocument {
            writer,
            info: Vec::new(),
            pages: Vec::new(),
            open: None,
            images: Vec::new(),
            compress: false,
        })
    }

    /// Flate-compress content streams and PNG image data.
    pub fn set_compression(&mut self, compress: bool) -> &mut Self {
        self.compress = compress;
        self
    }

    /// Set a document info entry such as `Title` or `Creator`.
    pub fn set_info(&mut self, key: &str, value: &str) -> &mut Self {
        self.info.push((key.to_string(), value.to_string()));
        self
    }

    /// Register an image once; it can then be drawn on any page.
    pub fn add_image(&mut self, image: &LogoImage) -> ImageId {
        self.images.push(image.clone());
        ImageId(self.images.len() - 1)
    }

    /// Begin a new page. An open page is closed first.
    pub fn begin_page(&mut self, width: f64, height: f64) -> &mut Self {
        self.open = None;
        self.pages.push(Page {
            width,
            height,
            content: Vec::new(),
        });
        self.open = Some(OpenPage {
            index: self.pages.len() - 1,
            is_new: true,
        });
        self
    }

    /// Re-open a completed page (1-based) to append content over it.
    pub fn open_page(&mut self, page_num: usize) -> Result<&mut Self, RenderError> {
        let count = self.page_count();
        if page_num == 0 || page_num > count {
            return Err(RenderError::PageOutOfRange {
                requested: page_num,
                count,
            });
        }
        self.open = Some(OpenPage {
            index: page_num - 1,
            is_new: false,
        });
        Ok(self)
    }

    /// Close the open page.
    pub fn end_page(&mut self) -> Result<(), RenderError> {
        match self.open.take() {
            Some(_) => Ok(()),
            None => Err(RenderError::NoOpenPage("end_page")),
        }
    }

    /// Number of completed pages; a freshly begun page is not counted until
    /// it ends.
    pub fn page_count(&self) -> usize {
        match self.open {
            Some(OpenPage { is_new: true, .. }) => self.pages.len() - 1,
            _ => self.pages.len(),
        }
    }

    fn ops(&mut self, ops: &str) -> &mut Self {
        debug_assert!(self.open.is_some(), "drawing with no open page");
        if let Some(open) = self.open {
            self.pages[open.index]
                .content
                .extend_from_slice(ops.as_bytes());
        }
        self
    }

    /// Append pre-built content bytes (table rows).
    pub(crate) fn raw_ops(&mut self, bytes: &[u8]) -> &mut Self {
        debug_assert!(self.open.is_some(), "drawing with no open page");
        if let Some(open) = self.open {
            self.pages[open.index].content.extend_from_slice(bytes);
        }
        self
    }

    pub fn save_state(&mut self) -> &mut Self {
        self.ops("q\n")
    }

    pub fn restore_state(&mut self) -> &mut Self {
        self.ops("Q\n")
    }

    pub fn set_fill_color(&mut self, c: Color) -> &mut Self {
        let s = format!("{} rg\n", color_operands(c));
        self.ops(&s)
    }

    pub fn set_stroke_color(&mut self, c: Color) -> &mut Self {
        let s = format!("{} RG\n", color_operands(c));
        self.ops(&s)
    }

    pub fn set_line_width(&mut self, w: f64) -> &mut Self {
        let s = format!("{} w\n", format_number(w));
        self.ops(&s)
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> &mut Self {
        let s = format!(
            "{} {} {} {} re\n",
            format_number(x),
            format_number(y),
            format_number(w),
            format_number(h),
        );
        self.ops(&s)
    }

    pub fn fill(&mut self) -> &mut Self {
        self.ops("f\n")
    }

    pub fn stroke(&mut self) -> &mut Self {
        self.ops("S\n")
    }

    /// Place one line of text with its baseline at `(x, y)`.
    pub fn place_text(&mut self, text: &str, x: f64, y: f64, font: Font, size: f64) -> &mut Self {
        let mut op = format!(
            "BT\n/{} {} Tf\n{} {} Td\n(",
            font.resource_name(),
            format_number(size),
            format_number(x),
            format_number(y),
        )
        .into_bytes();
        op.extend_from_slice(&encode_text(text));
        op.extend_from_slice(b") Tj\nET\n");
        self.raw_ops(&op)
    }

    /// Place text so that it ends at `right_x`.
    pub fn place_text_right(
        &mut self,
        text: &str,
        right_x: f64,
        y: f64,
        font: Font,
        size: f64,
    ) -> &mut Self {
        let x = right_x - font.measure(text, size);
        self.place_text(text, x, y, font, size)
    }

    /// Draw a registered image with its lower-left corner at `(x, y)`.
    pub fn draw_image(&mut self, id: ImageId, x: f64, y: f64, w: f64, h: f64) -> &mut Self {
        let s = format!(
            "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
            format_number(w),
            format_number(h),
            format_number(x),
            format_number(y),
            id.resource_name(),
        );
        self.ops(&s)
    }

    fn encode_stream(&self, data: Vec<u8>) -> io::Result<(Vec<u8>, bool)> {
        if !self.compress {
            return Ok((data, false));
        }
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&data)?;
        Ok((encoder.finish()?, true))
    }

    /// Write fonts, images, pages, info, catalog and xref. Consumes the
    /// document and returns the inner writer.
    pub fn end_document(mut self) -> Result<W, RenderError> {
        self.open = None;
        let mut next_obj = FIRST_FONT_OBJ_NUM;

        let mut font_entries = Vec::new();
        for font in Font::ALL {
            let id = ObjId(next_obj, 0);
            next_obj += 1;
            let dict = PdfObject::dict(vec![
                ("Type", PdfObject::name("Font")),
                ("Subtype", PdfObject::name("Type1")),
                ("BaseFont", PdfObject::name(font.base_name())),
                ("Encoding", PdfObject::name("WinAnsiEncoding")),
            ]);
            self.writer.write_object(id, &dict)?;
            font_entries.push((font.resource_name(), PdfObject::Reference(id)));
        }

        let mut image_entries = Vec::new();
        let images = std::mem::take(&mut self.images);
        for (i, image) in images.into_iter().enumerate() {
            let id = self.write_image(image, &mut next_obj)?;
            image_entries.push((ImageId(i).resource_name(), PdfObject::Reference(id)));
        }

        let mut resources = vec![("Font", PdfObject::dict(font_entries))];
        if !image_entries.is_empty() {
            resources.push((
                "XObject",
                PdfObject::Dictionary(image_entries),
            ));
        }
        let resources = PdfObject::dict(resources);

        let mut kids = Vec::new();
        let pages = std::mem::take(&mut self.pages);
        for page in pages {
            let content_id = ObjId(next_obj, 0);
            let page_id = ObjId(next_obj + 1, 0);
            next_obj += 2;

            let (data, compressed) = self.encode_stream(page.content)?;
            let dict = if compressed {
                vec![("Filter", PdfObject::name("FlateDecode"))]
            } else {
                vec![]
            };
            self.writer
                .write_object(content_id, &PdfObject::stream(dict, data))?;

            let page_dict = PdfObject::dict(vec![
                ("Type", PdfObject::name("Page")),
                ("Parent", PdfObject::Reference(PAGES_OBJ)),
                ("MediaBox", PdfObject::rect(page.width, page.height)),
                ("Contents", PdfObject::Reference(content_id)),
                ("Resources", resources.clone()),
            ]);
            self.writer.write_object(page_id, &page_dict)?;
            kids.push(PdfObject::Reference(page_id));
        }

        let info_id = if self.info.is_empty() {
            None
        } else {
            let id = ObjId(next_obj, 0);
            let entries = self
                .info
                .iter()
                .map(|(k, v)| (k.as_str(), PdfObject::text(v)))
                .collect();
            self.writer.write_object(id, &PdfObject::dict(entries))?;
            Some(id)
        };

        let count = kids.len() as i64;
        let pages = PdfObject::dict(vec![
            ("Type", PdfObject::name("Pages")),
            ("Kids", PdfObject::Array(kids)),
            ("Count", PdfObject::Integer(count)),
        ]);
        self.writer.write_object(PAGES_OBJ, &pages)?;

        let catalog = PdfObject::dict(vec![
            ("Type", PdfObject::name("Catalog")),
            ("Pages", PdfObject::Reference(PAGES_OBJ)),
        ]);
        self.writer.write_object(CATALOG_OBJ, &catalog)?;
        self.writer.write_xref_and_trailer(CATALOG_OBJ, info_id)?;

        Ok(self.writer.into_inner())
    }

    /// Write an image XObject (plus its soft mask) and return its id.
    fn write_image(&mut self, image: LogoImage, next_obj: &mut u32) -> io::Result<ObjId> {
        let smask_id = match image.smask {
            Some(alpha) => {
                let id = ObjId(*next_obj, 0);
                *next_obj += 1;
                let (data, compressed) = self.encode_stream(alpha)?;
                let mut dict = vec![
                    ("Type", PdfObject::name("XObject")),
                    ("Subtype", PdfObject::name("Image")),
                    ("Width", PdfObject::Integer(image.width as i64)),
                    ("Height", PdfObject::Integer(image.height as i64)),
                    ("ColorSpace", PdfObject::name("DeviceGray")),
                    ("BitsPerComponent", PdfObject::Integer(8)),
                ];
                if compressed {
                    dict.push(("Filter", PdfObject::name("FlateDecode")));
                }
                self.writer.write_object(id, &PdfObject::stream(dict, data))?;
                Some(id)
            }
            None => None,
        };

        let id = ObjId(*next_obj, 0);
        *next_obj += 1;
        let mut dict = vec![
            ("Type", PdfObject::name("XObject")),
            ("Subtype", PdfObject::name("Image")),
            ("Width", PdfObject::Integer(image.width as i64)),
            ("Height", PdfObject::Integer(image.height as i64)),
            ("ColorSpace", PdfObject::name(image.color_space.pdf_name())),
            ("BitsPerComponent", PdfObject::Integer(8)),
        ];
        let data = match image.format {
            // Already compressed; never Flate on top.
            ImageFormat::Jpeg => {
                dict.push(("Filter", PdfObject::name("DCTDecode")));
                image.data
            }
            ImageFormat::Png => {
                let (data, compressed) = self.encode_stream(image.data)?;
                if compressed {
                    dict.push(("Filter", PdfObject::name("FlateDecode")));
                }
                data
            }
        };
        if let Some(smask) = smask_id {
            dict.push(("SMask", PdfObject::Reference(smask)));
        }
        self.writer.write_object(id, &PdfObject::stream(dict, data))?;
        Ok(id)
    }
}

fn color_operands(c: Color) -> String {
    format!(
        "{} {} {}",
        format_number(c.r),
        format_number(c.g),
        format_number(c.b)
    )
}
