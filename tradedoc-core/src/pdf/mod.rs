//! Minimal PDF writer: built-in Helvetica fonts, rectangles and lines, one
//! logo image, and pages that stay open for a second drawing pass.

pub mod document;
pub mod fonts;
pub mod graphics;
pub mod images;
pub mod objects;
pub mod table;
pub mod writer;
