//! Resolve an extracted image reference to a full-resolution asset URL.
//!
//! The gallery page embeds a thumbnail for every flag, so resolution is a
//! pure URL rewrite. The proportions page often has no image at all; for
//! those rows resolution is a cascade of heuristics, each cheap to try and
//! safe to fail, ordered from most to least reliable.

use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use crate::download::LOOKUP_TIMEOUT;
use crate::extract::ImageRef;

const WIKI_BASE: &str = "https://fr.wikipedia.org";
const COMMONS_BASE: &str = "https://commons.wikimedia.org";

static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Labels whose article lookup does not lead to the flag file: disputed
/// territories, partially recognized states, French exonyms.
const OVERRIDES: &[(&str, &str)] = &[
    ("Abkhazie", "Flag_of_the_Republic_of_Abkhazia.svg"),
    ("Chypre du Nord", "Flag_of_the_Turkish_Republic_of_Northern_Cyprus.svg"),
    ("Haut-Karabagh", "Flag_of_Artsakh.svg"),
    ("Kosovo", "Flag_of_Kosovo.svg"),
    ("Ossétie du Sud", "Flag_of_South_Ossetia.svg"),
    ("Palestine", "Flag_of_Palestine.svg"),
    ("Sahara occidental", "Flag_of_the_Sahrawi_Arab_Democratic_Republic.svg"),
    ("Somaliland", "Flag_of_Somaliland.svg"),
    ("Taïwan", "Flag_of_the_Republic_of_China.svg"),
    ("Transnistrie", "Flag_of_Transnistria_(state).svg"),
];

/// Derive the stored file extension from a resolved URL's path.
pub fn sniff_extension(url: &str) -> &'static str {
    let path = url.split('?').next().unwrap_or(url).to_ascii_lowercase();
    if path.ends_with(".svg") {
        ".svg"
    } else if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        ".jpg"
    } else {
        ".png"
    }
}

/// Canonicalize an embedded `src`: add the protocol to scheme-relative URLs
/// and rewrite Wikimedia thumbnail renditions to the original asset:
/// `.../thumb/7/77/Flag.svg/120px-Flag.svg.png` → `.../7/77/Flag.svg`.
pub fn canonical_image_url(src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }
    let mut url = if src.starts_with("http") {
        src.to_string()
    } else {
        format!("https:{}", src)
    };
    if url.contains("/thumb/") {
        url = url.replace("/thumb/", "/");
        if let Some(idx) = url.rfind('/') {
            url.truncate(idx);
        }
    }
    Some(url)
}

pub struct Locator {
    client: Client,
    wiki_base: String,
    commons_base: String,
}

impl Locator {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            wiki_base: WIKI_BASE.to_string(),
            commons_base: COMMONS_BASE.to_string(),
        }
    }

    /// Point the locator at different hosts. Used by tests.
    pub fn with_bases(client: Client, wiki_base: &str, commons_base: &str) -> Self {
        Self {
            client,
            wiki_base: wiki_base.to_string(),
            commons_base: commons_base.to_string(),
        }
    }

    /// Resolve a reference to a downloadable URL, or `None` when every
    /// heuristic comes up empty.
    pub async fn locate(&self, label: &str, image: &ImageRef) -> Option<String> {
        match image {
            ImageRef::Embedded(src) => canonical_image_url(src),
            ImageRef::Lookup => self.search(label).await,
        }
    }

    async fn search(&self, label: &str) -> Option<String> {
        let title = label.replace(' ', "_");

        // Known-problematic labels resolve through the curated table first.
        if let Some((_, file)) = OVERRIDES.iter().find(|(l, _)| *l == label) {
            if let Some(url) = self.probe_commons_file(file).await {
                return Some(url);
            }
        }

        if let Some(url) = self.summary_thumbnail(&title).await {
            return Some(url);
        }

        for filename in filename_patterns(&title) {
            if let Some(url) = self.probe_commons_file(&filename).await {
                return Some(url);
            }
        }

        // Last resort: let Commons itself resolve the conventional filename.
        // Low confidence — the file may exist yet not be this country's flag.
        self.filepath_probe(&format!("Flag_of_{}.svg", title)).await
    }

    /// Ask the REST summary endpoint for the article's thumbnail.
    async fn summary_thumbnail(&self, title: &str) -> Option<String> {
        let url = format!(
            "{}/api/rest_v1/page/summary/{}",
            self.wiki_base,
            urlencoding::encode(title)
        );
        let resp = self
            .client
            .get(&url)
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let summary: serde_json::Value = resp.json().await.ok()?;
        let source = summary.get("thumbnail")?.get("source")?.as_str()?;
        debug!("Summary thumbnail for {}: {}", title, source);
        Some(source.to_string())
    }

    /// Fetch the Commons description page for `filename` and pull the
    /// original-asset URL out of it.
    async fn probe_commons_file(&self, filename: &str) -> Option<String> {
        let url = format!(
            "{}/wiki/File:{}",
            self.commons_base,
            urlencoding::encode(filename)
        );
        let resp = self
            .client
            .get(&url)
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let html = resp.text().await.ok()?;
        original_file_url(&html, filename)
    }

    /// Existence probe through the Special:FilePath redirect; the final URL
    /// after redirects is the asset itself.
    async fn filepath_probe(&self, filename: &str) -> Option<String> {
        let url = format!(
            "{}/wiki/Special:FilePath/{}",
            self.commons_base,
            urlencoding::encode(filename)
        );
        let resp = self
            .client
            .head(&url)
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        debug!("FilePath probe hit for {}", filename);
        Some(resp.url().to_string())
    }
}

/// Conventional Commons filenames for a country title, most common first.
fn filename_patterns(title: &str) -> [String; 5] {
    [
        format!("Flag_of_{}.svg", title),
        format!("Flag_of_{}.png", title),
        format!("Flag_of_the_{}.svg", title),
        format!("Drapeau_de_{}.svg", title),
        format!("{}_flag.svg", title),
    ]
}

/// Parse a Commons file-description page for the original asset URL.
///
/// Tried in order: the "Original file" anchor, any upload-host anchor naming
/// the file, any `<img>` naming the file (thumbnail rewrite applied).
fn original_file_url(html: &str, filename: &str) -> Option<String> {
    let doc = Html::parse_document(html);

    for a in doc.select(&LINK) {
        let text: String = a.text().collect::<String>().trim().to_string();
        if text == "Original file" || text == "Fichier d'origine" {
            if let Some(href) = a.value().attr("href") {
                return canonical_image_url(href);
            }
        }
    }

    for a in doc.select(&LINK) {
        if let Some(href) = a.value().attr("href") {
            if href.contains("upload.wikimedia.org") && href.contains(filename) {
                return canonical_image_url(href);
            }
        }
    }

    doc.select(&IMAGE)
        .filter_map(|img| img.value().attr("src"))
        .find(|src| src.contains(filename))
        .and_then(canonical_image_url)
}
