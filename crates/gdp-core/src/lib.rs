pub mod annotate;
pub mod config;
pub mod error;
pub mod extraction;
pub mod matching;
pub mod model;
pub mod parsing;
pub mod severity;

use config::AnalyzerConfig;
use error::{DocumentKind, GdpError, Stage};
use extraction::{ensure_pdf, PageContent, PdfExtractor, ProgressSink};
use matching::PageMode;
use model::{AnalysisResult, DepScope, Diagnostic, DiagnosticKind, DiagnosticSeverity};
use tracing::{info, warn};

/// Main API entry point: evaluate a GDP advisory against an arrivals list.
///
/// Reads the DEP SCOPE from the advisory, matches every arrivals page
/// against it and returns totals, a severity rating and a highlighted copy
/// of the arrivals PDF. Per-page problems end up in
/// `AnalysisResult::diagnostics`; only unusable input or a failing
/// extraction backend is returned as an error.
pub fn analyze(
    advisory_bytes: &[u8],
    arrivals_bytes: &[u8],
    extractor: &dyn PdfExtractor,
    config: &AnalyzerConfig,
    progress: &dyn ProgressSink,
) -> Result<AnalysisResult, GdpError> {
    ensure_pdf(advisory_bytes, "advisory")?;
    ensure_pdf(arrivals_bytes, "arrivals")?;

    let mut diagnostics = Vec::new();

    let dep_scope = analyze_scope(advisory_bytes, extractor, config, progress)?;
    if dep_scope.is_empty() {
        warn!("no region codes found in advisory");
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::ScopeNotFound,
            None,
            "no DEP SCOPE region codes found in the advisory; no flight can match",
        ));
    } else {
        info!(scope = %dep_scope, "DEP SCOPE");
    }

    let pages = extractor
        .extract_pages(arrivals_bytes, progress)
        .map_err(|e| e.in_stage(DocumentKind::Arrivals, Stage::Extract))?;

    let time_window = parsing::window::extract_time_window(pages.iter().map(PageContent::text));

    let mut impacted = Vec::new();
    let mut pages_read = 0;
    for page in &pages {
        let matches = matching::match_page(page, &dep_scope, config);
        if matches.mode != PageMode::Skipped {
            pages_read += 1;
        }
        impacted.extend(matches.rows);
        diagnostics.extend(matches.diagnostics);
    }

    if pages_read == 0 {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::PageSkipped,
            None,
            "no arrivals table with flight and departure-center columns was found",
        ));
    }

    let totals = matching::aggregate(&impacted);
    let rating = severity::classify_mean_delay(totals.mean_delay);
    info!(
        impacted = totals.count,
        total = totals.total_delay,
        mean = %totals.mean_delay.round_dp(1),
        %rating,
        "arrivals matched"
    );

    let annotated_pdf = annotate_arrivals(arrivals_bytes, &pages, &impacted, config, &mut diagnostics);

    Ok(AnalysisResult {
        dep_scope,
        time_window,
        impacted,
        total_delay: totals.total_delay,
        mean_delay: totals.mean_delay.round_dp(1),
        rating,
        diagnostics,
        annotated_pdf,
    })
}

/// Extract the DEP SCOPE from an advisory document alone.
pub fn analyze_scope(
    advisory_bytes: &[u8],
    extractor: &dyn PdfExtractor,
    config: &AnalyzerConfig,
    progress: &dyn ProgressSink,
) -> Result<DepScope, GdpError> {
    ensure_pdf(advisory_bytes, "advisory")?;
    let pages = extractor
        .extract_pages(advisory_bytes, progress)
        .map_err(|e| e.in_stage(DocumentKind::Advisory, Stage::Extract))?;

    let text = pages
        .iter()
        .map(PageContent::text)
        .collect::<Vec<_>>()
        .join("\n");
    Ok(parsing::scope::recognize_scope(&text, &config.scope.denylist))
}

/// Highlight impacted flights; on failure fall back to the untouched document.
fn annotate_arrivals(
    arrivals_bytes: &[u8],
    pages: &[PageContent],
    impacted: &[model::ImpactedRow],
    config: &AnalyzerConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<u8> {
    let (marks, misses) = annotate::plan_highlights(pages, impacted);
    diagnostics.extend(misses);

    match annotate::apply_highlights(arrivals_bytes, &marks, &config.annotation) {
        Ok(bytes) => bytes,
        Err(e) => {
            let e = e.in_stage(DocumentKind::Arrivals, Stage::Annotate);
            warn!(error = %e, "highlighting failed, returning the document unannotated");
            let mut diagnostic = Diagnostic::new(
                DiagnosticKind::AnnotationMiss,
                None,
                format!("highlights could not be written: {e}"),
            );
            diagnostic.severity = DiagnosticSeverity::Important;
            diagnostics.push(diagnostic);
            arrivals_bytes.to_vec()
        }
    }
}
