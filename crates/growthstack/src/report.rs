//! Full-audit report document: a cover page plus one page per pillar, each
//! listing up to five keywords and the word-wrapped narrative.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, Rgb,
};

use crate::error::AppError;
use crate::model::AuditResult;
use crate::pillar::Pillar;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const LINE_STEP_MM: f32 = 5.0;
// Approximate character budget for 9pt Helvetica across a 170mm column.
const BODY_WRAP_COLUMNS: usize = 95;
const MAX_KEYWORDS_PER_PAGE: usize = 5;

/// Renderer input contract for one pillar page.
pub struct ReportPage {
    pub title: String,
    pub description: String,
    pub keywords: Vec<(String, String)>,
    pub narrative: String,
}

pub struct AuditReport {
    domain: String,
    pages: Vec<ReportPage>,
}

impl AuditReport {
    pub fn new(domain: &str, results: &[(Pillar, AuditResult)]) -> Self {
        let pages = results
            .iter()
            .map(|(pillar, result)| ReportPage {
                title: pillar.name().to_uppercase(),
                description: pillar.info().description.to_string(),
                keywords: result
                    .keywords
                    .iter()
                    .take(MAX_KEYWORDS_PER_PAGE)
                    .map(|k| (k.term.clone(), k.intent.to_string()))
                    .collect(),
                narrative: result.text.clone(),
            })
            .collect();
        Self {
            domain: domain.to_string(),
            pages,
        }
    }

    pub fn pages(&self) -> &[ReportPage] {
        &self.pages
    }

    /// `GrowthStack_KeywordsAudit_<domain>.pdf`, every non-alphanumeric
    /// character of the domain replaced by an underscore.
    pub fn file_name(&self) -> String {
        let slug: String = self
            .domain
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("GrowthStack_KeywordsAudit_{slug}.pdf")
    }

    pub fn render_pdf(&self, path: &Path) -> Result<(), AppError> {
        let (doc, cover_page, cover_layer) = PdfDocument::new(
            "GrowthStack Forensic Domain Audit",
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "cover",
        );
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_err)?;
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_err)?;

        let cover = doc.get_page(cover_page).get_layer(cover_layer);
        cover.set_fill_color(Color::Rgb(Rgb::new(0.23, 0.51, 0.96, None)));
        cover.use_text("GROWTHSTACK", 36.0, Mm(MARGIN_MM), from_top(80.0), &bold);
        cover.set_fill_color(Color::Rgb(Rgb::new(0.06, 0.09, 0.16, None)));
        cover.use_text(
            "FORENSIC DOMAIN AUDIT",
            18.0,
            Mm(MARGIN_MM),
            from_top(95.0),
            &bold,
        );
        cover.use_text(self.domain.as_str(), 12.0, Mm(MARGIN_MM), from_top(110.0), &regular);

        for page in &self.pages {
            render_pillar_page(&doc, page, &bold, &regular);
        }

        let file = File::create(path)?;
        doc.save(&mut BufWriter::new(file)).map_err(pdf_err)?;
        Ok(())
    }
}

fn render_pillar_page(
    doc: &PdfDocumentReference,
    page: &ReportPage,
    bold: &IndirectFontRef,
    regular: &IndirectFontRef,
) {
    let (page_idx, layer_idx) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "pillar");
    let mut layer = doc.get_page(page_idx).get_layer(layer_idx);
    layer.set_fill_color(Color::Rgb(Rgb::new(0.06, 0.09, 0.16, None)));

    layer.use_text(page.title.as_str(), 22.0, Mm(MARGIN_MM), from_top(30.0), bold);
    layer.use_text(
        page.description.as_str(),
        10.0,
        Mm(MARGIN_MM),
        from_top(40.0),
        regular,
    );
    layer.use_text("KEYWORDS", 12.0, Mm(MARGIN_MM), from_top(65.0), bold);

    let mut y = 75.0;
    for (term, intent) in &page.keywords {
        layer.use_text(
            format!("- {term} ({intent})"),
            10.0,
            Mm(MARGIN_MM + 5.0),
            from_top(y),
            regular,
        );
        y += 7.0;
    }

    layer.use_text("STRATEGY", 12.0, Mm(MARGIN_MM), from_top(y + 10.0), bold);
    y += 20.0;

    for line in wrap_text(&page.narrative, BODY_WRAP_COLUMNS) {
        if y > PAGE_HEIGHT_MM - MARGIN_MM {
            // Narrative overflow continues on a fresh page.
            let (next_page, next_layer) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "pillar-continued");
            layer = doc.get_page(next_page).get_layer(next_layer);
            layer.set_fill_color(Color::Rgb(Rgb::new(0.06, 0.09, 0.16, None)));
            y = MARGIN_MM + 10.0;
        }
        layer.use_text(line.as_str(), 9.0, Mm(MARGIN_MM), from_top(y), regular);
        y += LINE_STEP_MM;
    }
}

fn from_top(y_mm: f32) -> Mm {
    Mm(PAGE_HEIGHT_MM - y_mm)
}

fn pdf_err(e: printpdf::Error) -> AppError {
    AppError::Report(e.to_string())
}

/// Greedy word wrap preserving paragraph breaks. A single word longer than
/// the budget stays on its own line.
fn wrap_text(text: &str, max_columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.chars().count() + 1 + word.chars().count() <= max_columns {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}
