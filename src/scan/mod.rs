//! Vulnerability-scan export.
//!
//! Walks the cursor-paginated service listing of one footprint and flattens
//! every service into (CPE × issue) finding rows. The cursor and the row
//! accumulator are locals of [`collect_findings`]; nothing is shared between
//! runs.

pub mod client;
pub mod flatten;
pub mod types;

pub use client::{HttpScanSource, ScanSource};
pub use flatten::flatten_service;
pub use types::{FindingRow, ScanPage, Service};

use tracing::{info, warn};

use crate::error::ScanError;

/// Result of walking every page.
#[derive(Debug, Clone, Default)]
pub struct ScanExport {
    pub rows: Vec<FindingRow>,
    pub pages: usize,
    /// False when pagination stopped early (fetch failure or page limit).
    pub complete: bool,
}

/// Fetch pages until the cursor runs out, flattening services as they arrive.
///
/// A failure on the first page is returned as an error. A failure on a later
/// page stops pagination and keeps what was collected, flagged incomplete.
pub async fn collect_findings(
    source: &dyn ScanSource,
    max_pages: usize,
) -> Result<ScanExport, ScanError> {
    let mut export = ScanExport::default();
    let mut cursor: Option<String> = None;

    loop {
        if export.pages >= max_pages {
            warn!(max_pages, "Page limit reached, stopping pagination");
            return Ok(export);
        }

        let page = match source.fetch_page(cursor.as_deref()).await {
            Ok(page) => page,
            Err(e) if export.pages == 0 => return Err(e),
            Err(e) => {
                warn!(
                    pages = export.pages,
                    error = %e,
                    "Scan page fetch failed, keeping partial results"
                );
                return Ok(export);
            }
        };
        export.pages += 1;

        for service in &page.services {
            export.rows.extend(flatten_service(service));
        }

        match page.cursor.filter(|c| !c.is_empty()) {
            Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                warn!(cursor = %next, "Scan API repeated a cursor, stopping pagination");
                return Ok(export);
            }
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    export.complete = true;
    info!(
        pages = export.pages,
        rows = export.rows.len(),
        "Scan export collected"
    );
    Ok(export)
}
