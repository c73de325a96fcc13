//! Extractor for the gallery page ("Galerie des drapeaux des pays du monde").
//!
//! Flags sit in `toccolours` tables, one country per cell: a thumbnail image
//! plus a caption whose last link points to the country article.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{Candidate, ImageRef};

static FLAG_TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table.toccolours").unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static FILE_IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img.mw-file-element").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// Walk the gallery tables and yield every usable flag cell.
pub fn candidates(doc: &Html) -> impl Iterator<Item = Candidate> + '_ {
    doc.select(&FLAG_TABLE)
        .flat_map(|table| table.select(&CELL))
        .filter_map(candidate_from_cell)
}

fn candidate_from_cell(cell: ElementRef) -> Option<Candidate> {
    let img = cell.select(&FILE_IMAGE).next()?;

    // Some cells hold coats of arms or seals in the same table structure;
    // only caption text mentioning "Drapeau" marks an actual flag.
    let text: String = cell.text().collect::<Vec<_>>().join(" ");
    if !text.contains("Drapeau") {
        return None;
    }

    // Compound names link several articles; by convention the last link in
    // the cell is the country article.
    let label = cell
        .select(&LINK)
        .last()
        .map(|a| a.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())?;

    let src = img.value().attr("src")?.trim();
    if src.is_empty() {
        return None;
    }

    Some(Candidate {
        label,
        image: ImageRef::Embedded(src.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(body: &str) -> String {
        format!(
            r#"<table class="toccolours"><tr><td>{}</td></tr></table>"#,
            body
        )
    }

    #[test]
    fn extracts_label_from_last_link() {
        let html = cell(
            r#"<img class="mw-file-element" src="//upload.wikimedia.org/x/Flag.svg">
               <a href="/wiki/Fichier:Flag.svg">Drapeau</a> de l'<a href="/wiki/Alg%C3%A9rie">Algérie</a>"#,
        );
        let doc = Html::parse_document(&html);
        let found: Vec<_> = candidates(&doc).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "Algérie");
        assert_eq!(
            found[0].image,
            ImageRef::Embedded("//upload.wikimedia.org/x/Flag.svg".into())
        );
    }

    #[test]
    fn requires_flag_marker_in_cell_text() {
        let html = cell(
            r#"<img class="mw-file-element" src="//upload.wikimedia.org/x/Arms.svg">
               <a href="/wiki/Fichier:Arms.svg">Armoiries</a> de la <a href="/wiki/France">France</a>"#,
        );
        let doc = Html::parse_document(&html);
        assert_eq!(candidates(&doc).count(), 0);
    }

    #[test]
    fn skips_cells_without_file_image() {
        let html = cell(r#"Drapeau de la <a href="/wiki/France">France</a>"#);
        let doc = Html::parse_document(&html);
        assert_eq!(candidates(&doc).count(), 0);
    }

    #[test]
    fn ignores_tables_without_toccolours_class() {
        let html = r#"<table><tr><td>
            <img class="mw-file-element" src="//upload.wikimedia.org/x/Flag.svg">
            Drapeau du <a href="/wiki/Togo">Togo</a>
        </td></tr></table>"#;
        let doc = Html::parse_document(html);
        assert_eq!(candidates(&doc).count(), 0);
    }

    #[test]
    fn several_cells_yield_several_candidates() {
        let html = r#"<table class="toccolours"><tr>
            <td><img class="mw-file-element" src="//u/a.svg">Drapeau de l'<a href="/wiki/A">Albanie</a></td>
            <td><img class="mw-file-element" src="//u/b.svg">Drapeau de l'<a href="/wiki/B">Andorre</a></td>
            <td></td>
        </tr></table>"#;
        let doc = Html::parse_document(html);
        let labels: Vec<_> = candidates(&doc).map(|c| c.label).collect();
        assert_eq!(labels, vec!["Albanie", "Andorre"]);
    }
}
