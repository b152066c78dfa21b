//! Synthetic PDFs for tests.

use crate::pdf::PdfError;
use lopdf::{Document, Object, Stream, dictionary};

/// Build a PDF with `pages` empty pages of `width_pt` x `height_pt` points.
///
/// The MediaBox sits on the page tree root, so every page inherits it.
pub fn sample_pdf(pages: u32, width_pt: f32, height_pt: f32) -> Result<Vec<u8>, PdfError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            page_id.into()
        })
        .collect();

    let tree = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => i64::from(pages),
        "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(tree));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
