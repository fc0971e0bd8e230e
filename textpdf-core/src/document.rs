use std::collections::BTreeSet;

use chrono::{NaiveDateTime, Utc};
use log::debug;

use crate::error::{Error, Result};
use crate::fonts::FontResource;
use crate::model::{DocumentMeta, PageGeometry};
use crate::objects::{ObjId, PdfObject};
use crate::validate::verify_xref;
use crate::writer::{PdfVersion, PdfWriter};

/// All indirect objects of one document.
///
/// Ids are handed out sequentially from 1 and never reused. An id
/// can be reserved before its object exists, so objects may refer
/// forward (a page names its font before the font is built).
#[derive(Debug, Default)]
pub struct ObjectGraph {
    slots: Vec<Option<PdfObject>>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        ObjectGraph { slots: Vec::new() }
    }

    /// Reserve the next id without an object.
    pub fn reserve(&mut self) -> ObjId {
        self.slots.push(None);
        ObjId(self.slots.len() as u32)
    }

    /// Append an object under the next id.
    pub fn push(&mut self, obj: PdfObject) -> ObjId {
        self.slots.push(Some(obj));
        ObjId(self.slots.len() as u32)
    }

    /// Provide the object for a reserved id.
    pub fn fill(&mut self, id: ObjId, obj: PdfObject) -> Result<()> {
        let slot = id
            .0
            .checked_sub(1)
            .and_then(|i| self.slots.get_mut(i as usize))
            .ok_or_else(|| {
                Error::Assembly(format!("object {} was never reserved", id.0))
            })?;
        if slot.is_some() {
            return Err(Error::Assembly(format!(
                "object {} filled twice",
                id.0
            )));
        }
        *slot = Some(obj);
        Ok(())
    }

    pub fn get(&self, id: ObjId) -> Option<&PdfObject> {
        let index = id.0.checked_sub(1)? as usize;
        self.slots.get(index)?.as_ref()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Serialize the header, every object in id order, the xref
    /// table and the trailer. The xref table is then checked
    /// against the buffer; a mismatch is an assembly error.
    pub fn to_bytes(
        &self,
        version: PdfVersion,
        root: ObjId,
        info: Option<ObjId>,
    ) -> Result<Vec<u8>> {
        let mut writer = PdfWriter::new(Vec::new());
        writer.write_header(version)?;
        for (i, slot) in self.slots.iter().enumerate() {
            let id = ObjId(i as u32 + 1);
            let obj = slot.as_ref().ok_or_else(|| {
                Error::Assembly(format!("object {} reserved but never filled", id.0))
            })?;
            writer.write_object(id, obj)?;
        }
        writer.write_xref_and_trailer(root, info)?;

        let written = writer.xref_entries().len();
        let bytes = writer.into_inner();
        let verified = verify_xref(&bytes)
            .map_err(|e| Error::Assembly(e.to_string()))?;
        if verified != written {
            return Err(Error::Assembly(format!(
                "xref lists {} objects, {} were written",
                verified, written
            )));
        }
        Ok(bytes)
    }
}

/// A fully wired object graph ready for serialization.
#[derive(Debug)]
pub struct AssembledDocument {
    pub graph: ObjectGraph,
    pub catalog: ObjId,
    pub pages: ObjId,
    pub info: Option<ObjId>,
}

impl AssembledDocument {
    pub fn to_bytes(&self, version: PdfVersion) -> Result<Vec<u8>> {
        self.graph.to_bytes(version, self.catalog, self.info)
    }
}

/// Build the object graph for a set of page content streams.
///
/// Id layout: 1 Catalog, 2 Pages, then a Page and its Contents
/// stream per page, then Helvetica, then Helvetica-Bold when any
/// page uses it, then the Info dictionary if `meta` has one.
pub fn assemble(
    contents: Vec<Vec<u8>>,
    fonts_used: &BTreeSet<FontResource>,
    geometry: &PageGeometry,
    meta: &DocumentMeta,
) -> Result<AssembledDocument> {
    let mut graph = ObjectGraph::new();
    let catalog = graph.reserve();
    let pages = graph.reserve();

    let page_ids: Vec<(ObjId, ObjId)> = contents
        .iter()
        .map(|_| (graph.reserve(), graph.reserve()))
        .collect();

    let mut fonts = vec![(FontResource::Regular, graph.reserve())];
    if fonts_used.contains(&FontResource::Bold) {
        fonts.push((FontResource::Bold, graph.reserve()));
    }

    let font_dict = PdfObject::dict(
        fonts
            .iter()
            .map(|(font, id)| (font.pdf_name(), PdfObject::reference(*id)))
            .collect(),
    );

    for (data, &(page_id, content_id)) in
        contents.into_iter().zip(&page_ids)
    {
        let page = PdfObject::dict(vec![
            ("Type", PdfObject::name("Page")),
            ("Parent", PdfObject::reference(pages)),
            (
                "MediaBox",
                PdfObject::array(vec![
                    PdfObject::Integer(0),
                    PdfObject::Integer(0),
                    PdfObject::Real(geometry.width),
                    PdfObject::Real(geometry.height),
                ]),
            ),
            (
                "Resources",
                PdfObject::dict(vec![("Font", font_dict.clone())]),
            ),
            ("Contents", PdfObject::reference(content_id)),
        ]);
        graph.fill(page_id, page)?;
        graph.fill(content_id, PdfObject::stream(vec![], data))?;
    }

    for (font, id) in &fonts {
        graph.fill(*id, font.to_pdf_object())?;
    }

    let info = if meta.has_info() {
        let timestamp = meta
            .timestamp
            .unwrap_or_else(|| Utc::now().naive_utc());
        Some(graph.push(info_dictionary(meta, timestamp)))
    } else {
        None
    };

    let kids = page_ids
        .iter()
        .map(|(page_id, _)| PdfObject::reference(*page_id))
        .collect();
    graph.fill(
        pages,
        PdfObject::dict(vec![
            ("Type", PdfObject::name("Pages")),
            ("Kids", PdfObject::Array(kids)),
            ("Count", PdfObject::Integer(page_ids.len() as i64)),
        ]),
    )?;
    graph.fill(
        catalog,
        PdfObject::dict(vec![
            ("Type", PdfObject::name("Catalog")),
            ("Pages", PdfObject::reference(pages)),
        ]),
    )?;

    debug!(
        "assembled {} objects for {} pages",
        graph.len(),
        page_ids.len()
    );

    Ok(AssembledDocument {
        graph,
        catalog,
        pages,
        info,
    })
}

/// PDF date string, `D:YYYYMMDDHHmmSS`.
pub fn pdf_date(timestamp: &NaiveDateTime) -> String {
    timestamp.format("D:%Y%m%d%H%M%S").to_string()
}

fn info_dictionary(meta: &DocumentMeta, timestamp: NaiveDateTime) -> PdfObject {
    let date = pdf_date(&timestamp);
    let mut entries = Vec::new();
    if let Some(title) = &meta.title {
        entries.push(("Title", PdfObject::literal_string(title)));
    }
    if let Some(producer) = &meta.producer {
        entries.push(("Producer", PdfObject::literal_string(producer)));
    }
    if let Some(creator) = &meta.creator {
        entries.push(("Creator", PdfObject::literal_string(creator)));
    }
    entries.push(("CreationDate", PdfObject::literal_string(&date)));
    entries.push(("ModDate", PdfObject::literal_string(&date)));
    PdfObject::dict(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
    }

    #[test]
    fn reserve_then_fill() {
        let mut graph = ObjectGraph::new();
        let a = graph.reserve();
        let b = graph.push(PdfObject::Integer(2));
        assert_eq!((a, b), (ObjId(1), ObjId(2)));
        assert!(graph.get(a).is_none());
        graph.fill(a, PdfObject::Integer(1)).unwrap();
        assert_eq!(graph.get(a), Some(&PdfObject::Integer(1)));
    }

    #[test]
    fn fill_twice_is_an_error() {
        let mut graph = ObjectGraph::new();
        let id = graph.push(PdfObject::Integer(1));
        let err = graph.fill(id, PdfObject::Integer(2)).unwrap_err();
        assert!(matches!(err, Error::Assembly(_)));
        assert!(graph.fill(ObjId(9), PdfObject::Integer(2)).is_err());
        assert!(graph.fill(ObjId(0), PdfObject::Integer(2)).is_err());
    }

    #[test]
    fn unfilled_reservation_aborts_serialization() {
        let mut graph = ObjectGraph::new();
        let root = graph.reserve();
        let err = graph
            .to_bytes(PdfVersion::V1_4, root, None)
            .unwrap_err();
        assert!(matches!(err, Error::Assembly(_)));
    }

    #[test]
    fn object_layout_with_bold_and_info() {
        let fonts: BTreeSet<_> =
            [FontResource::Regular, FontResource::Bold].into();
        let meta = DocumentMeta::new("T").with_timestamp(fixed_time());
        let doc = assemble(
            vec![b"BT ET".to_vec(), Vec::new()],
            &fonts,
            &PageGeometry::letter(),
            &meta,
        )
        .unwrap();

        assert_eq!(doc.catalog, ObjId(1));
        assert_eq!(doc.pages, ObjId(2));
        // 2 pages * (page + contents) = ids 3..=6, fonts 7 and 8.
        assert_eq!(doc.info, Some(ObjId(9)));
        assert_eq!(doc.graph.len(), 9);

        let pages = doc.graph.get(ObjId(2)).unwrap();
        assert_eq!(pages.get("Count"), Some(&PdfObject::Integer(2)));
        let page = doc.graph.get(ObjId(3)).unwrap();
        assert_eq!(
            page.get("Contents"),
            Some(&PdfObject::Reference(ObjId(4)))
        );
        let bold = doc.graph.get(ObjId(8)).unwrap();
        assert_eq!(
            bold.get("BaseFont"),
            Some(&PdfObject::name("Helvetica-Bold"))
        );
    }

    #[test]
    fn regular_font_only_without_headings() {
        let fonts: BTreeSet<_> = [FontResource::Regular].into();
        let doc = assemble(
            vec![Vec::new()],
            &fonts,
            &PageGeometry::letter(),
            &DocumentMeta::none(),
        )
        .unwrap();
        assert_eq!(doc.graph.len(), 5);
        assert_eq!(doc.info, None);
        let bytes = doc.to_bytes(PdfVersion::V1_4).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(!text.contains("Helvetica-Bold"));
        assert!(text.contains("/Font << /F1 5 0 R >>"));
    }

    #[test]
    fn info_dates() {
        assert_eq!(pdf_date(&fixed_time()), "D:20240309140507");
        let meta = DocumentMeta::new("Report")
            .with_creator("tests")
            .with_timestamp(fixed_time());
        let info = info_dictionary(&meta, fixed_time());
        assert_eq!(
            info.get("CreationDate"),
            Some(&PdfObject::literal_string("D:20240309140507"))
        );
        assert_eq!(info.get("ModDate"), info.get("CreationDate"));
        assert!(info.get("Producer").is_some());
    }
}
