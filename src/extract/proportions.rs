//! Extractor for the proportions page ("Liste des drapeaux nationaux par
//! proportions").
//!
//! Flags are listed in wikitables, one country per row. The first cell names
//! the country and sometimes carries a thumbnail; many rows have no image at
//! all and need the locator's fallback search.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{Candidate, ImageRef};

static WIKITABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table.wikitable").unwrap());
static ANY_TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td, th").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Link texts that appear in country cells but never name a country.
const GENERIC_TOKENS: [&str; 3] = ["drapeau", "flag", "image"];

/// Walk every table row and yield the rows naming a country.
pub fn candidates(doc: &Html) -> impl Iterator<Item = Candidate> + '_ {
    let mut tables: Vec<ElementRef> = doc.select(&WIKITABLE).collect();
    if tables.is_empty() {
        tables = doc.select(&ANY_TABLE).collect();
    }
    tables
        .into_iter()
        .flat_map(|table| table.select(&ROW))
        .filter_map(candidate_from_row)
}

fn candidate_from_row(row: ElementRef) -> Option<Candidate> {
    let cells: Vec<ElementRef> = row.select(&CELL).collect();
    // Country + proportions at minimum; header-ish or spanning rows drop out.
    if cells.len() < 2 {
        return None;
    }
    let first = cells[0];

    let label = first
        .select(&LINK)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            if href.starts_with("/wiki/File:") || href.starts_with("/wiki/Category:") {
                return None;
            }
            let text = a.text().collect::<String>().trim().to_string();
            if text.chars().count() <= 2 {
                return None;
            }
            if GENERIC_TOKENS.contains(&text.to_lowercase().as_str()) {
                return None;
            }
            Some(text)
        })
        .next()?;

    let image = first
        .select(&IMAGE)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())
        .map(|src| ImageRef::Embedded(src.to_string()))
        .unwrap_or(ImageRef::Lookup);

    Some(Candidate { label, image })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &str) -> String {
        format!(r#"<table class="wikitable">{}</table>"#, rows)
    }

    #[test]
    fn takes_first_country_link_with_embedded_image() {
        let html = table(
            r#"<tr>
                 <td><img src="//u/thumb/a/ab/X.svg/40px-X.svg.png">
                     <a href="/wiki/File:X.svg">Drapeau</a>
                     <a href="/wiki/Belgique">Belgique</a></td>
                 <td>2:3</td>
               </tr>"#,
        );
        let doc = Html::parse_document(&html);
        let found: Vec<_> = candidates(&doc).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "Belgique");
        assert_eq!(
            found[0].image,
            ImageRef::Embedded("//u/thumb/a/ab/X.svg/40px-X.svg.png".into())
        );
    }

    #[test]
    fn rows_without_image_become_lookup_candidates() {
        let html = table(
            r#"<tr><td><a href="/wiki/N%C3%A9pal">Népal</a></td><td>4:3</td></tr>"#,
        );
        let doc = Html::parse_document(&html);
        let found: Vec<_> = candidates(&doc).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "Népal");
        assert_eq!(found[0].image, ImageRef::Lookup);
    }

    #[test]
    fn filters_file_category_and_generic_links() {
        let html = table(
            r#"<tr><td>
                 <a href="/wiki/File:Y.svg">Y.svg</a>
                 <a href="/wiki/Category:Drapeaux">Drapeaux nationaux</a>
                 <a href="/wiki/Drapeau">Drapeau</a>
                 <a href="/wiki/Su%C3%A8de">Suède</a>
               </td><td>5:8</td></tr>"#,
        );
        let doc = Html::parse_document(&html);
        let found: Vec<_> = candidates(&doc).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "Suède");
    }

    #[test]
    fn short_link_texts_do_not_count_as_countries() {
        let html = table(r#"<tr><td><a href="/wiki/Io">Io</a></td><td>1:2</td></tr>"#);
        let doc = Html::parse_document(&html);
        assert_eq!(candidates(&doc).count(), 0);
    }

    #[test]
    fn rows_with_a_single_cell_are_skipped() {
        let html = table(r#"<tr><td><a href="/wiki/France">France</a></td></tr>"#);
        let doc = Html::parse_document(&html);
        assert_eq!(candidates(&doc).count(), 0);
    }

    #[test]
    fn falls_back_to_plain_tables_when_no_wikitable() {
        let html = r#"<table><tr>
            <td><a href="/wiki/Japon">Japon</a></td><td>2:3</td>
        </tr></table>"#;
        let doc = Html::parse_document(html);
        let found: Vec<_> = candidates(&doc).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "Japon");
    }
}
