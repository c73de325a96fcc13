//! Orchestrator: extraction → resolution → download → catalog commit, one
//! candidate at a time. Wikimedia rate limits aggressively, so the loop is
//! deliberately sequential with an explicit pause between downloads.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use scraper::Html;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::download::{self, RetryPolicy};
use crate::extract::{self, Candidate};
use crate::locate::{sniff_extension, Locator};
use crate::normalize::normalize;

const GALLERY_URL: &str =
    "https://fr.wikipedia.org/wiki/Galerie_des_drapeaux_des_pays_du_monde";
const PROPORTIONS_URL: &str =
    "https://fr.wikipedia.org/wiki/Liste_des_drapeaux_nationaux_par_proportions";

/// Which of the two source pages a run harvests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Gallery,
    Proportions,
}

/// One pipeline variant: page, retry budget, inter-download pacing.
pub struct Source {
    pub kind: PageKind,
    pub page_url: String,
    pub retries: u32,
    pub pause: Duration,
}

impl Source {
    /// The gallery page embeds every flag, so downloads come thick and fast;
    /// it gets the larger retry budget and the shorter pause.
    pub fn gallery() -> Self {
        Self {
            kind: PageKind::Gallery,
            page_url: GALLERY_URL.to_string(),
            retries: 5,
            pause: Duration::from_millis(500),
        }
    }

    /// The proportions page needs per-country lookups on top of downloads,
    /// so it paces itself more conservatively.
    pub fn proportions() -> Self {
        Self {
            kind: PageKind::Proportions,
            page_url: PROPORTIONS_URL.to_string(),
            retries: 3,
            pause: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Default)]
pub struct RunStats {
    pub downloaded: usize,
    pub errors: usize,
    pub labels_seen: usize,
}

/// Harvest one source page into `flag_dir`, committing each flag to the
/// catalog as it lands. Already-cataloged identifiers are skipped without
/// any network traffic.
pub async fn run(
    source: &Source,
    flag_dir: &Path,
    catalog: &mut Catalog,
    limit: Option<usize>,
) -> Result<RunStats> {
    fs::create_dir_all(flag_dir)
        .with_context(|| format!("Failed to create {}", flag_dir.display()))?;

    let client = download::client()?;
    let locator = Locator::new(client.clone());
    let policy = RetryPolicy::new(source.retries);

    // The source page is the one fetch that must succeed.
    info!("Fetching {}", source.page_url);
    let page = download::fetch_text(&client, &source.page_url)
        .await
        .map_err(|e| anyhow!("Failed to fetch source page {}: {}", source.page_url, e))?;
    info!("Page fetched ({} bytes)", page.len());

    let mut candidates: Vec<Candidate> = {
        let doc = Html::parse_document(&page);
        match source.kind {
            PageKind::Gallery => extract::gallery::candidates(&doc).collect(),
            PageKind::Proportions => extract::proportions::candidates(&doc).collect(),
        }
    };
    if let Some(n) = limit {
        candidates.truncate(n);
    }
    info!("{} candidates extracted", candidates.len());

    let pb = ProgressBar::new(candidates.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut stats = RunStats::default();
    let mut seen: HashSet<String> = HashSet::new();

    for cand in candidates {
        pb.inc(1);
        if !seen.insert(cand.label.clone()) {
            continue;
        }

        let id = normalize(&cand.label);
        if id.is_empty() {
            continue;
        }
        if catalog.contains(&id) {
            continue;
        }
        pb.set_message(cand.label.clone());

        let Some(url) = locator.locate(&cand.label, &cand.image).await else {
            warn!("No flag image found for {}", cand.label);
            stats.errors += 1;
            continue;
        };
        let ext = sniff_extension(&url);

        match download::fetch_bytes(&client, &url, policy).await {
            Ok(bytes) => {
                let path = flag_dir.join(format!("{}{}", id, ext));
                // A bad candidate must not sink the rest of the run; only
                // losing the source page itself is fatal.
                if let Err(e) = fs::write(&path, &bytes) {
                    warn!("Failed to write {}: {}", path.display(), e);
                    stats.errors += 1;
                } else {
                    catalog.commit(&id, &cand.label)?;
                    stats.downloaded += 1;
                    info!("[{:3}] {} -> {}{}", catalog.len(), cand.label, id, ext);
                }
            }
            Err(e) => {
                warn!("Download failed for {}: {}", cand.label, e);
                stats.errors += 1;
            }
        }

        // Stay under the implicit rate limit whatever the outcome was.
        tokio::time::sleep(source.pause).await;
    }

    pb.finish_and_clear();
    stats.labels_seen = seen.len();
    Ok(stats)
}
