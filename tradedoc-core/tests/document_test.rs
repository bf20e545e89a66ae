use tradedoc_core::pdf::fonts::Font;
use tradedoc_core::pdf::graphics::Color;
use tradedoc_core::PdfDocument;

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn make_doc() -> PdfDocument<Vec<u8>> {
    PdfDocument::new(Vec::<u8>::new()).unwrap()
}

#[test]
fn three_pages_with_stamps() {
    let mut doc = make_doc();
    for i in 1..=3 {
        doc.begin_page(595.28, 841.89);
        doc.place_text(&format!("Corps {}", i), 40.0, 700.0, Font::Helvetica, 10.0);
        doc.end_page().unwrap();
    }
    for i in 1..=3 {
        doc.open_page(i).unwrap();
        doc.place_text_right(&format!("Page {}/3", i), 555.0, 30.0, Font::Helvetica, 8.0);
        doc.end_page().unwrap();
    }
    assert_eq!(doc.page_count(), 3);
    let bytes = doc.end_document().unwrap();
    assert!(contains(&bytes, b"/Count 3"));
    for i in 1..=3 {
        assert!(contains(&bytes, format!("(Page {}/3) Tj", i).as_bytes()));
    }
}

#[test]
fn french_text_is_win_ansi_encoded() {
    let mut doc = make_doc();
    doc.begin_page(595.28, 841.89);
    doc.place_text("Reçu — 12 €", 40.0, 700.0, Font::HelveticaBold, 10.0);
    doc.end_page().unwrap();
    let bytes = doc.end_document().unwrap();
    assert!(contains(&bytes, b"(Re\xe7u \x97 12 \x80) Tj"));
    assert!(contains(&bytes, b"/BaseFont /Helvetica-Bold"));
}

#[test]
fn parentheses_are_escaped() {
    let mut doc = make_doc();
    doc.begin_page(595.28, 841.89);
    doc.place_text("Remise (5 %)", 40.0, 700.0, Font::Helvetica, 9.0);
    let bytes = doc.end_document().unwrap();
    assert!(contains(&bytes, b"(Remise \\(5 %\\)) Tj"));
}

#[test]
fn filled_band_behind_text() {
    let mut doc = make_doc();
    doc.begin_page(595.28, 841.89);
    doc.save_state()
        .set_fill_color(Color::BRAND)
        .rect(40.0, 780.0, 515.28, 22.0)
        .fill()
        .restore_state();
    doc.end_page().unwrap();
    let bytes = doc.end_document().unwrap();
    assert!(contains(&bytes, b"q\n0.118 0.227 0.373 rg\n40 780 515.28 22 re\nf\nQ\n"));
}
