/// Quote example: a two-page devis with mixed tax rates, a zero-rated line
/// and a validity date.
///
/// Run with:
///   cargo run --example generate_quote -p tradedoc-demos -- [document.json] [logo.png]
///
/// Writes demos/output/quote.pdf
mod common;

use std::error::Error;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    common::init_logging();

    let mut args = std::env::args().skip(1);
    let document = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| common::data_dir().join("quote.json"));
    let logo = args.next().map(PathBuf::from);

    let path = common::render_file(
        &document,
        &common::data_dir().join("config.json"),
        logo.as_deref(),
        "quote",
    )?;
    println!("Written: {}", path.display());
    Ok(())
}
