use std::io::{self, Write};

use crate::pdf::fonts::win_ansi_byte;
use crate::pdf::objects::{ObjId, PdfObject};

/// Serializes PDF objects to a `Write` target, tracking byte offsets for
/// the cross-reference table.
pub struct PdfWriter<W: Write> {
    writer: W,
    offset: usize,
    xref_entries: Vec<(u32, usize)>,
}

impl<W: Write> PdfWriter<W> {
    pub fn new(writer: W) -> Self {
        PdfWriter {
            writer,
            offset: 0,
            xref_entries: Vec::new(),
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.offset += data.len();
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.write_bytes(s.as_bytes())
    }

    /// PDF 1.7 header followed by the binary marker comment.
    pub fn write_header(&mut self) -> io::Result<()> {
        self.write_str("%PDF-1.7\n")?;
        self.write_bytes(b"%\xe2\xe3\xcf\xd3\n")
    }

    /// Write an indirect object and record its offset.
    pub fn write_object(&mut self, id: ObjId, obj: &PdfObject) -> io::Result<()> {
        self.xref_entries.push((id.0, self.offset));
        self.write_str(&format!("{} {} obj\n", id.0, id.1))?;
        self.write_value(obj)?;
        self.write_str("\nendobj\n")
    }

    fn write_entries(&mut self, entries: &[(String, PdfObject)]) -> io::Result<()> {
        for (key, val) in entries {
            self.write_str(" /")?;
            self.write_str(key)?;
            self.write_str(" ")?;
            self.write_value(val)?;
        }
        Ok(())
    }

    fn write_value(&mut self, obj: &PdfObject) -> io::Result<()> {
        match obj {
            PdfObject::Integer(n) => self.write_str(&n.to_string()),
            PdfObject::Real(f) => self.write_str(&format_number(*f)),
            PdfObject::Name(name) => {
                self.write_str("/")?;
                self.write_str(name)
            }
            PdfObject::Text(s) => {
                self.write_str("(")?;
                self.write_bytes(&encode_text(s))?;
                self.write_str(")")
            }
            PdfObject::Array(items) => {
                self.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.write_str(" ")?;
                    }
                    self.write_value(item)?;
                }
                self.write_str("]")
            }
            PdfObject::Dictionary(entries) => {
                self.write_str("<<")?;
                self.write_entries(entries)?;
                self.write_str(" >>")
            }
            PdfObject::Stream { dict, data } => {
                self.write_str("<<")?;
                self.write_entries(dict)?;
                self.write_str(&format!(" /Length {} >>\nstream\n", data.len()))?;
                self.write_bytes(data)?;
                self.write_str("\nendstream")
            }
            PdfObject::Reference(id) => self.write_str(&format!("{} {} R", id.0, id.1)),
        }
    }

    /// Write the xref table, trailer, `startxref` and `%%EOF`.
    pub fn write_xref_and_trailer(&mut self, root: ObjId, info: Option<ObjId>) -> io::Result<()> {
        let xref_offset = self.offset;
        self.xref_entries.sort_by_key(|&(num, _)| num);
        let size = self.xref_entries.last().map_or(0, |&(num, _)| num) + 1;

        self.write_str(&format!("xref\n0 {}\n", size))?;
        // Every entry is exactly 20 bytes, CRLF-terminated.
        self.write_bytes(b"0000000000 65535 f\r\n")?;
        let mut entries = std::mem::take(&mut self.xref_entries).into_iter().peekable();
        for obj_num in 1..size {
            match entries.next_if(|&(num, _)| num == obj_num) {
                Some((_, off)) => self.write_str(&format!("{:010} 00000 n\r\n", off))?,
                None => self.write_bytes(b"0000000000 00000 f\r\n")?,
            }
        }

        self.write_str("trailer\n")?;
        self.write_str(&format!("<< /Size {} /Root {} {} R", size, root.0, root.1))?;
        if let Some(info) = info {
            self.write_str(&format!(" /Info {} {} R", info.0, info.1))?;
        }
        self.write_str(" >>\n")?;
        self.write_str(&format!("startxref\n{}\n%%EOF\n", xref_offset))
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Encode text for a literal string: WinAnsi bytes with `\`, `(` and `)`
/// escaped.
pub fn encode_text(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' | '(' | ')' => {
                out.push(b'\\');
                out.push(ch as u8);
            }
            '\n' | '\r' | '\t' => out.push(b' '),
            _ => out.push(win_ansi_byte(ch)),
        }
    }
    out
}

/// Format a number for object and content-stream output: integers bare,
/// fractions with at most four decimals, never scientific notation.
pub fn format_number(v: f64) -> String {
    if v == v.floor() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{:.4}", v);
        let s = s.trim_end_matches('0').trim_end_matches('.');
        if s == "-0" {
            "0".to_string()
        } else {
            s.to_string()
        }
    }
}
