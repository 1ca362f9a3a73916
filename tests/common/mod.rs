//! Shared fixtures for integration tests
//!
//! Fixture PDFs are written object by object so each test controls exactly
//! which AcroForm dictionaries it exercises.

#![allow(dead_code)]

use std::sync::{Mutex, MutexGuard, OnceLock};

/// Minimal PDF writer producing a classic cross-reference table
pub struct RawPdf {
    objects: Vec<Option<Vec<u8>>>,
}

impl RawPdf {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Reserve an object number to be filled in later with `set`
    pub fn reserve(&mut self) -> usize {
        self.objects.push(None);
        self.objects.len()
    }

    pub fn set(&mut self, id: usize, body: &str) {
        self.objects[id - 1] = Some(body.as_bytes().to_vec());
    }

    pub fn add(&mut self, body: &str) -> usize {
        let id = self.reserve();
        self.set(id, body);
        id
    }

    pub fn add_stream(&mut self, dict: &str, content: &str) -> usize {
        let id = self.reserve();
        let body = format!(
            "<< {} /Length {} >>\nstream\n{}\nendstream",
            dict,
            content.len(),
            content
        );
        self.objects[id - 1] = Some(body.into_bytes());
        id
    }

    pub fn finish(self, root: usize) -> Vec<u8> {
        let mut out: Vec<u8> = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets = Vec::with_capacity(self.objects.len());

        for (i, body) in self.objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
            out.extend_from_slice(body.as_deref().unwrap_or(b"null"));
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", self.objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
                self.objects.len() + 1,
                root,
                xref
            )
            .as_bytes(),
        );
        out
    }
}

const FONT: &str = "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>";
const PAGE_TEXT: &str = "BT /Helv 18 Tf 72 740 Td (Application Form) Tj ET";

fn on_appearance(pdf: &mut RawPdf) -> usize {
    pdf.add_stream(
        "/Type /XObject /Subtype /Form /BBox [0 0 20 20]",
        "0 g 4 4 12 12 re f",
    )
}

fn off_appearance(pdf: &mut RawPdf) -> usize {
    pdf.add_stream("/Type /XObject /Subtype /Form /BBox [0 0 20 20]", "")
}

/// Catalog, page tree and single page around the given widgets
fn single_page_form(
    pdf: &mut RawPdf,
    page: usize,
    font: usize,
    fields: &[usize],
    widgets: &[usize],
) -> usize {
    let pages = pdf.reserve();
    let contents = pdf.add_stream("", PAGE_TEXT);
    pdf.set(
        page,
        &format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 612 792] /Contents {} 0 R \
             /Resources << /Font << /Helv {} 0 R >> >> /Annots [{}] >>",
            pages,
            contents,
            font,
            refs(widgets)
        ),
    );
    pdf.set(
        pages,
        &format!("<< /Type /Pages /Kids [{} 0 R] /Count 1 >>", page),
    );
    pdf.add(&format!(
        "<< /Type /Catalog /Pages {} 0 R /AcroForm << /Fields [{}] /NeedAppearances true \
         /DA (/Helv 0 Tf 0 g) /DR << /Font << /Helv {} 0 R >> >> >> >>",
        pages,
        refs(fields),
        font
    ))
}

fn refs(ids: &[usize]) -> String {
    ids.iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One page with an empty text field `Name` and an unchecked checkbox `Agree`
pub fn name_agree_form() -> Vec<u8> {
    let mut pdf = RawPdf::new();
    let font = pdf.add(FONT);
    let page = pdf.reserve();
    let on = on_appearance(&mut pdf);
    let off = off_appearance(&mut pdf);

    let name = pdf.add(&format!(
        "<< /Type /Annot /Subtype /Widget /FT /Tx /T (Name) /Rect [100 680 300 700] \
         /P {} 0 R /F 4 /DA (/Helv 12 Tf 0 g) >>",
        page
    ));
    let agree = pdf.add(&format!(
        "<< /Type /Annot /Subtype /Widget /FT /Btn /T (Agree) /Rect [100 640 120 660] \
         /P {} 0 R /F 4 /V /Off /AS /Off /MK << /CA (4) >> \
         /AP << /N << /Yes {} 0 R /Off {} 0 R >> >> >>",
        page, on, off
    ));

    let root = single_page_form(&mut pdf, page, font, &[name, agree], &[name, agree]);
    pdf.finish(root)
}

/// One page with every field variant:
///
/// - `Name`: text field holding `Bob`
/// - `Agree`: checked checkbox
/// - `Color`: radio group of two widgets with `Red` selected
/// - `Country`: dropdown over `Canada`, `Mexico` with `Mexico` selected
/// - `Submit`: push button
/// - `Signature1`: signature field
/// - `Toppings`: list box
pub fn mixed_form() -> Vec<u8> {
    let mut pdf = RawPdf::new();
    let font = pdf.add(FONT);
    let page = pdf.reserve();
    let on = on_appearance(&mut pdf);
    let off = off_appearance(&mut pdf);

    let name = pdf.add(&format!(
        "<< /Type /Annot /Subtype /Widget /FT /Tx /T (Name) /V (Bob) /Rect [100 700 300 720] \
         /P {} 0 R /F 4 /DA (/Helv 12 Tf 0 g) >>",
        page
    ));
    let agree = pdf.add(&format!(
        "<< /Type /Annot /Subtype /Widget /FT /Btn /T (Agree) /Rect [100 660 120 680] \
         /P {} 0 R /F 4 /V /Yes /AS /Yes /MK << /CA (4) >> \
         /AP << /N << /Yes {} 0 R /Off {} 0 R >> >> >>",
        page, on, off
    ));

    let color = pdf.reserve();
    let red = pdf.add(&format!(
        "<< /Type /Annot /Subtype /Widget /Parent {} 0 R /Rect [100 620 120 640] \
         /P {} 0 R /F 4 /AS /Red /MK << /CA (l) >> /AP << /N << /Red {} 0 R /Off {} 0 R >> >> >>",
        color, page, on, off
    ));
    let blue = pdf.add(&format!(
        "<< /Type /Annot /Subtype /Widget /Parent {} 0 R /Rect [140 620 160 640] \
         /P {} 0 R /F 4 /AS /Off /MK << /CA (l) >> /AP << /N << /Blue {} 0 R /Off {} 0 R >> >> >>",
        color, page, on, off
    ));
    pdf.set(
        color,
        &format!(
            "<< /FT /Btn /Ff 49152 /T (Color) /V /Red /Kids [{} 0 R {} 0 R] >>",
            red, blue
        ),
    );

    let country = pdf.add(&format!(
        "<< /Type /Annot /Subtype /Widget /FT /Ch /Ff 131072 /T (Country) \
         /Opt [(Canada) (Mexico)] /V (Mexico) /I [1] /Rect [100 570 300 590] \
         /P {} 0 R /F 4 /DA (/Helv 12 Tf 0 g) >>",
        page
    ));
    let submit = pdf.add(&format!(
        "<< /Type /Annot /Subtype /Widget /FT /Btn /Ff 65536 /T (Submit) \
         /Rect [100 520 200 545] /P {} 0 R /F 4 /MK << /CA (Submit) >> >>",
        page
    ));
    let signature = pdf.add(&format!(
        "<< /Type /Annot /Subtype /Widget /FT /Sig /T (Signature1) \
         /Rect [100 460 300 500] /P {} 0 R /F 4 >>",
        page
    ));
    let toppings = pdf.add(&format!(
        "<< /Type /Annot /Subtype /Widget /FT /Ch /T (Toppings) \
         /Opt [(Cheese) (Olives)] /Rect [100 380 300 440] /P {} 0 R /F 4 \
         /DA (/Helv 12 Tf 0 g) >>",
        page
    ));

    let root = single_page_form(
        &mut pdf,
        page,
        font,
        &[name, agree, color, country, submit, signature, toppings],
        &[name, agree, red, blue, country, submit, signature, toppings],
    );
    pdf.finish(root)
}

/// One page of static text and no AcroForm
pub fn plain_document() -> Vec<u8> {
    let mut pdf = RawPdf::new();
    let font = pdf.add(FONT);
    let contents = pdf.add_stream("", PAGE_TEXT);
    let pages = pdf.reserve();
    let page = pdf.add(&format!(
        "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 612 792] /Contents {} 0 R \
         /Resources << /Font << /Helv {} 0 R >> >> >>",
        pages, contents, font
    ));
    pdf.set(
        pages,
        &format!("<< /Type /Pages /Kids [{} 0 R] /Count 1 >>", page),
    );
    let root = pdf.add(&format!("<< /Type /Catalog /Pages {} 0 R >>", pages));
    pdf.finish(root)
}

/// Whether a PDFium library can be bound in this environment
pub fn pdfium_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| {
        let available = pdf_form_mcp::pdf::create_pdfium(None).is_ok();
        if !available {
            eprintln!("PDFium library not found, skipping PDFium-backed tests");
        }
        available
    })
}

/// Serialize PDFium-backed tests; the library must not be bound concurrently
pub fn pdfium_lock() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(|e| e.into_inner())
}
