use textpdf_core::content::build_items;
use textpdf_core::layout::{
    break_lines, lines_per_page, max_chars_per_line, paginate, wrap_text,
    LineItem,
};
use textpdf_core::{LayoutBlock, Margins, PageGeometry, Typography};

fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}

#[test]
fn letter_page_capacity() {
    let geometry = PageGeometry::letter();
    let typography = Typography::default();
    assert_eq!(max_chars_per_line(geometry.content_width(), 12.0), 65);
    assert_eq!(lines_per_page(&geometry, typography.line_height_pt()), 38);
}

#[test]
fn wrapped_lines_respect_limit() {
    let text = "The quick brown fox jumps over the lazy dog and keeps \
                running through an extraordinarily long meadow";
    for max in [1, 5, 10, 17, 40] {
        for line in wrap_text(text, max) {
            assert!(line.chars().count() <= max, "{:?} > {}", line, max);
            assert!(!line.is_empty());
        }
    }
}

#[test]
fn wrapping_keeps_every_word() {
    let text = "alpha beta gamma delta epsilon";
    let lines = wrap_text(text, 11);
    assert_eq!(lines, vec!["alpha beta", "gamma delta", "epsilon"]);
    assert_eq!(lines.join(" "), text);
}

#[test]
fn overlong_word_is_split() {
    let lines = wrap_text("abcdefghij xy", 4);
    assert_eq!(lines, vec!["abcd", "efgh", "ij", "xy"]);
    assert_eq!(lines.concat(), "abcdefghijxy");
    assert!(lines.iter().all(|l| l.chars().count() <= 4));
}

#[test]
fn uniform_lines_fill_whole_pages() {
    let geometry = PageGeometry::letter();
    let typography = Typography::default();
    // 13 words per 65-character line, 40 lines.
    let items =
        build_items(&[LayoutBlock::paragraph(words(520))], &typography);
    let lines = break_lines(&items, &geometry, &typography);
    assert_eq!(lines.len(), 40);

    let pages = paginate(lines, &geometry);
    assert_eq!(pages.len(), 2);
    let per_page = lines_per_page(&geometry, typography.line_height_pt());
    assert_eq!(pages[0].text_line_count(), per_page);
    assert_eq!(pages[1].text_line_count(), 40 - per_page);
}

#[test]
fn blank_line_between_text_blocks() {
    let geometry = PageGeometry::letter();
    let typography = Typography::default();
    let items = build_items(
        &[
            LayoutBlock::paragraph("one"),
            LayoutBlock::paragraph(""),
            LayoutBlock::paragraph("two"),
            LayoutBlock::rule(),
            LayoutBlock::paragraph("three"),
        ],
        &typography,
    );
    let lines = break_lines(&items, &geometry, &typography);
    let kinds: Vec<&str> = lines
        .iter()
        .map(|l| match l {
            LineItem::Text(_) => "text",
            LineItem::Blank { .. } => "blank",
            LineItem::Rule { .. } => "rule",
        })
        .collect();
    assert_eq!(kinds, vec!["text", "blank", "text", "rule", "text"]);
}

#[test]
fn no_page_starts_with_blank() {
    let geometry = PageGeometry::new(300.0, 300.0, Margins::uniform(50.0));
    let typography = Typography::default();
    let blocks: Vec<LayoutBlock> = (0..40)
        .map(|i| LayoutBlock::paragraph(format!("paragraph {}", i)))
        .collect();
    let items = build_items(&blocks, &typography);
    let lines = break_lines(&items, &geometry, &typography);
    let pages = paginate(lines, &geometry);

    assert!(pages.len() > 1);
    for page in &pages {
        assert!(!matches!(
            page.items.first(),
            Some(LineItem::Blank { .. })
        ));
        let used: f64 = page.items.iter().map(LineItem::advance).sum();
        assert!(used <= geometry.content_height() + 1e-6);
    }
}

#[test]
fn empty_input_still_has_one_page() {
    let geometry = PageGeometry::letter();
    let pages = paginate(Vec::new(), &geometry);
    assert_eq!(pages.len(), 1);
    assert!(pages[0].items.is_empty());
}

#[test]
fn tiny_content_area_still_fits_one_character() {
    let geometry = PageGeometry::new(200.0, 200.0, Margins::uniform(80.0));
    assert_eq!(max_chars_per_line(geometry.content_width(), 24.0), 2);
    assert_eq!(max_chars_per_line(0.0, 12.0), 1);
    assert_eq!(lines_per_page(&geometry, 50.0), 1);
}
