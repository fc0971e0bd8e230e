use textpdf_core::{
    render, render_single_stream, Color, DocumentMeta, LayoutBlock,
    PageGeometry, Typography,
};

fn main() -> textpdf_core::Result<()> {
    let mut blocks = vec![
        LayoutBlock::heading("A Test Document"),
        LayoutBlock::paragraph(
            "Created with textpdf. Text is set in Helvetica and wrapped \
             by an average character width.",
        ),
        LayoutBlock::rule(),
        LayoutBlock::paragraph("Highlighted (with parentheses)")
            .with_color(Color::from_hex("#c0392b").unwrap_or_default()),
    ];
    for i in 1..=60 {
        blocks.push(LayoutBlock::paragraph(format!(
            "Paragraph {} of the flowing body text.",
            i
        )));
    }

    let paginated = render(
        &blocks,
        &PageGeometry::letter(),
        &Typography::default(),
        &DocumentMeta::new("A Test Document"),
    )?;
    paginated.save("sample_output.pdf")?;
    println!(
        "Generated: sample_output.pdf ({} pages)",
        paginated.page_count
    );

    let single = render_single_stream(&blocks, &PageGeometry::a4())?;
    single.save("sample_single.pdf")?;
    println!(
        "Generated: sample_single.pdf ({} of {} blocks)",
        single.blocks_emitted, single.blocks_supplied
    );
    Ok(())
}
