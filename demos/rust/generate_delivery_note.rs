/// Delivery note example: items arrive inside a `$values` envelope under
/// capitalised keys, with persisted totals and two signature areas.
///
/// Run with:
///   cargo run --example generate_delivery_note -p tradedoc-demos
///
/// Writes demos/output/delivery_note.pdf
mod common;

use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    common::init_logging();

    let data = common::data_dir();
    let path = common::render_file(
        &data.join("delivery_note.json"),
        &data.join("config.json"),
        None,
        "delivery_note",
    )?;
    println!("Written: {}", path.display());
    Ok(())
}
