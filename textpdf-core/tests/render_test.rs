use chrono::NaiveDate;
use textpdf_core::{
    is_well_formed, render, render_single_stream, verify_xref, Color,
    DocumentMeta, Error, EscapeMode, LayoutBlock, Margins, PageGeometry,
    RenderMode, RenderOptions, Renderer, Typography,
};

/// Helper: check if `haystack` contains `needle`.
fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn count_bytes(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

fn fixed_meta() -> DocumentMeta {
    let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(14, 30, 0)
        .unwrap();
    DocumentMeta::new("Report").with_timestamp(ts)
}

fn sample_blocks() -> Vec<LayoutBlock> {
    vec![
        LayoutBlock::heading("Title"),
        LayoutBlock::paragraph("Hello world"),
    ]
}

/// 520 four-letter words: 40 full lines at 12pt on US Letter.
fn long_paragraph() -> LayoutBlock {
    LayoutBlock::paragraph(vec!["word"; 520].join(" "))
}

#[test]
fn header_and_trailer_layout() {
    let out = render(
        &sample_blocks(),
        &PageGeometry::letter(),
        &Typography::default(),
        &fixed_meta(),
    )
    .unwrap();
    let bytes = out.bytes();

    assert!(bytes.starts_with(b"%PDF-1.4\n"));
    assert!(bytes.ends_with(b"%%EOF\n"));
    let text = String::from_utf8_lossy(bytes);
    let xref = text.find("\nxref\n").unwrap();
    let trailer = text.rfind("trailer").unwrap();
    let startxref = text.rfind("startxref").unwrap();
    assert!(xref < trailer);
    assert!(trailer < startxref);
    assert!(is_well_formed(bytes));
}

#[test]
fn xref_offsets_point_at_objects() {
    let out = render(
        &[long_paragraph(), LayoutBlock::rule()],
        &PageGeometry::letter(),
        &Typography::default(),
        &fixed_meta(),
    )
    .unwrap();
    let bytes = out.bytes();
    assert_eq!(verify_xref(bytes).unwrap(), out.object_count);

    let start = find_bytes(bytes, b"\nxref\n0 ").unwrap() + 8;
    let header_end = find_bytes(&bytes[start..], b"\n").unwrap() + start;
    let size: usize = std::str::from_utf8(&bytes[start..header_end])
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(size, out.object_count + 1);

    let entries = &bytes[header_end + 1..];
    for n in 1..size {
        let entry = &entries[n * 20..n * 20 + 20];
        let offset: usize = std::str::from_utf8(&entry[..10])
            .unwrap()
            .parse()
            .unwrap();
        let expected = format!("{} 0 obj", n);
        assert!(bytes[offset..].starts_with(expected.as_bytes()));
    }
}

#[test]
fn first_block_positions() {
    let out = render(
        &sample_blocks(),
        &PageGeometry::letter(),
        &Typography::default(),
        &fixed_meta(),
    )
    .unwrap();
    let bytes = out.bytes();

    // Heading: 18pt bold, baseline one font size below the top
    // margin.
    assert!(contains_bytes(
        bytes,
        b"BT\n/F2 18 Tf\n0.200 0.200 0.200 rg\n72 702 Td\n(Title) Tj\nET\n"
    ));
    // Paragraph follows the heading line and one blank line.
    assert!(contains_bytes(bytes, b"/F1 12 Tf"));
    assert!(contains_bytes(bytes, b"72 666 Td\n(Hello world) Tj"));
    assert!(contains_bytes(bytes, b"/BaseFont /Helvetica-Bold"));
    assert!(contains_bytes(bytes, b"/Encoding /WinAnsiEncoding"));
}

#[test]
fn bold_font_only_when_used() {
    let out = render(
        &[LayoutBlock::paragraph("plain")],
        &PageGeometry::letter(),
        &Typography::default(),
        &DocumentMeta::none(),
    )
    .unwrap();
    let bytes = out.bytes();
    assert!(!contains_bytes(bytes, b"Helvetica-Bold"));
    assert!(contains_bytes(bytes, b"/BaseFont /Helvetica"));
    assert!(!contains_bytes(bytes, b"/Info"));
    // Catalog, Pages, Page, Contents, Helvetica.
    assert_eq!(out.object_count, 5);
}

#[test]
fn multi_page_count() {
    let out = render(
        &[long_paragraph()],
        &PageGeometry::letter(),
        &Typography::default(),
        &fixed_meta(),
    )
    .unwrap();
    assert_eq!(out.page_count, 2);
    assert!(!out.truncated);
    assert_eq!(out.blocks_emitted, 1);
    let bytes = out.bytes();
    assert!(contains_bytes(bytes, b"/Count 2"));
    assert_eq!(count_bytes(bytes, b"/Type /Page "), 2);
    // Relative moves between wrapped lines.
    assert!(contains_bytes(bytes, b"0 -16.8 Td"));
    assert!(is_well_formed(bytes));
}

#[test]
fn empty_input_yields_one_page() {
    let out = render(
        &[],
        &PageGeometry::letter(),
        &Typography::default(),
        &DocumentMeta::none(),
    )
    .unwrap();
    assert_eq!(out.page_count, 1);
    let bytes = out.bytes();
    assert!(contains_bytes(bytes, b"/Count 1"));
    assert!(contains_bytes(bytes, b"/Length 0"));
    assert!(is_well_formed(bytes));
}

#[test]
fn identical_inputs_identical_bytes() {
    let blocks = vec![
        LayoutBlock::heading("Same"),
        long_paragraph(),
        LayoutBlock::rule(),
    ];
    let a = render(
        &blocks,
        &PageGeometry::a4(),
        &Typography::default(),
        &fixed_meta(),
    )
    .unwrap();
    let b = render(
        &blocks,
        &PageGeometry::a4(),
        &Typography::default(),
        &fixed_meta(),
    )
    .unwrap();
    assert_eq!(a.bytes(), b.bytes());
    assert!(contains_bytes(a.bytes(), b"/CreationDate (D:20240309143000)"));
}

#[test]
fn block_color_and_rule() {
    let red = Color::from_hex("#ff0000").unwrap();
    let out = render(
        &[
            LayoutBlock::paragraph("warning").with_color(red),
            LayoutBlock::rule(),
        ],
        &PageGeometry::letter(),
        &Typography::default(),
        &DocumentMeta::none(),
    )
    .unwrap();
    let bytes = out.bytes();
    assert!(contains_bytes(bytes, b"1.000 0.000 0.000 rg"));
    assert!(contains_bytes(bytes, b"0.6 G\n1 w\n72 "));
    assert!(contains_bytes(bytes, b"540 "));
    assert_eq!(out.blocks_emitted, 2);
}

#[test]
fn non_ascii_text_keeps_offsets() {
    let out = render(
        &[LayoutBlock::paragraph("caf\u{e9} \u{20ac}5")],
        &PageGeometry::letter(),
        &Typography::default(),
        &fixed_meta(),
    )
    .unwrap();
    let bytes = out.bytes();
    assert!(contains_bytes(bytes, b"(caf\xe9 \x805) Tj"));
    assert!(verify_xref(bytes).is_ok());
}

#[test]
fn single_stream_truncates() {
    let geometry = PageGeometry::new(300.0, 300.0, Margins::uniform(20.0));
    let blocks: Vec<LayoutBlock> = (0..30)
        .map(|i| LayoutBlock::paragraph(format!("Line {}", i)))
        .collect();
    let out = render_single_stream(&blocks, &geometry).unwrap();

    // 260pt of content height, 22.8pt per block.
    assert_eq!(out.blocks_supplied, 30);
    assert_eq!(out.blocks_emitted, 11);
    assert!(out.truncated);
    assert_eq!(out.page_count, 1);

    let bytes = out.bytes();
    assert_eq!(count_bytes(bytes, b"BT\n"), 11);
    assert!(contains_bytes(bytes, b"(Line 10) Tj"));
    assert!(!contains_bytes(bytes, b"(Line 11) Tj"));
    assert!(contains_bytes(bytes, b"/Count 1"));
    assert!(is_well_formed(bytes));
}

#[test]
fn single_stream_first_block_too_tall() {
    let geometry = PageGeometry::new(200.0, 200.0, Margins::uniform(80.0));
    let out = render_single_stream(
        &[LayoutBlock::heading("Too big").with_font_size(24.0)],
        &geometry,
    )
    .unwrap();
    assert_eq!(out.blocks_emitted, 0);
    assert!(out.truncated);
    assert!(contains_bytes(out.bytes(), b"/Length 0"));
    assert!(is_well_formed(out.bytes()));
}

#[test]
fn escape_mode_per_layout() {
    let options = RenderOptions::new();
    assert_eq!(
        options.escape_for(RenderMode::Paginated),
        EscapeMode::Preserve
    );
    assert_eq!(
        options.escape_for(RenderMode::SingleStream),
        EscapeMode::Collapse
    );
    let forced = options.with_escape(EscapeMode::Preserve);
    assert_eq!(
        forced.escape_for(RenderMode::SingleStream),
        EscapeMode::Preserve
    );
}

#[test]
fn input_too_large() {
    let renderer = Renderer::new(
        RenderOptions::new().with_max_input_bytes(10),
    );
    let err = renderer
        .render(
            &[LayoutBlock::paragraph("more than ten bytes")],
            RenderMode::Paginated,
            &DocumentMeta::none(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InputTooLarge { size: 19, limit: 10 }
    ));
}

#[test]
fn out_of_range_values_are_clamped() {
    let geometry = PageGeometry::new(10.0, 99999.0, Margins::uniform(500.0));
    let out = render(
        &[LayoutBlock::paragraph("tiny").with_font_size(2.0)],
        &geometry,
        &Typography::new(100.0, 0.1),
        &DocumentMeta::none(),
    )
    .unwrap();
    let bytes = out.bytes();
    assert!(contains_bytes(bytes, b"/MediaBox [0 0 200.0 3000.0]"));
    assert!(contains_bytes(bytes, b"/F1 8 Tf"));
    assert!(is_well_formed(bytes));
}

#[test]
fn renderer_shared_across_threads() {
    let renderer = Renderer::default();
    let blocks = vec![long_paragraph()];
    let meta = fixed_meta();

    let outputs: Vec<Vec<u8>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| {
                    renderer
                        .render(&blocks, RenderMode::Paginated, &meta)
                        .unwrap()
                        .into_bytes()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(outputs.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn save_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("out.pdf");
    let out = render(
        &sample_blocks(),
        &PageGeometry::letter(),
        &Typography::default(),
        &fixed_meta(),
    )
    .unwrap();
    out.save(&path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), out.bytes());
}

#[test]
fn save_reports_io_errors() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();
    let out = render(
        &[],
        &PageGeometry::letter(),
        &Typography::default(),
        &DocumentMeta::none(),
    )
    .unwrap();
    let err = out.save(blocker.join("out.pdf")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn infinite_margins_render_finite_coordinates() {
    let blocks = vec![
        LayoutBlock::paragraph("before"),
        LayoutBlock::rule().with_margins(f64::INFINITY, f64::NAN),
        LayoutBlock::paragraph("after").with_margins(f64::NAN, f64::INFINITY),
    ];
    for mode in [RenderMode::Paginated, RenderMode::SingleStream] {
        let out = Renderer::default()
            .render(&blocks, mode, &DocumentMeta::none())
            .unwrap();
        let bytes = out.bytes();
        assert!(!contains_bytes(bytes, b"inf"), "{:?}", mode);
        assert!(!contains_bytes(bytes, b"NaN"), "{:?}", mode);
        assert!(contains_bytes(bytes, b"(before) Tj"));
        assert!(is_well_formed(bytes));
        verify_xref(bytes).unwrap();
    }
}
