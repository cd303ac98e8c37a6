use gdp_core::model::{AnalysisResult, DepScope, DiagnosticSeverity, RowSource};

pub fn print(result: &AnalysisResult) {
    println!("=== GDP impact ===\n");

    println!("  Impacted flights: {}", result.impacted_count());
    println!("  Mean delay:       {} min", result.mean_delay);
    println!("  Total delay:      {} min", result.total_delay);
    println!("  Impact rating:    {}", result.rating);
    println!();
    println!("  Time window:      {}", result.time_window);
    if result.scope_missing() {
        println!("  DEP SCOPE:        (none found)");
    } else {
        println!("  DEP SCOPE:        {}", result.dep_scope);
    }
    println!();

    if !result.impacted.is_empty() {
        let id_width = result
            .impacted
            .iter()
            .map(|r| r.flight_id.len())
            .max()
            .unwrap_or(6)
            .max("Flight".len());
        let dep_width = result
            .impacted
            .iter()
            .map(|r| r.departure_center.len())
            .max()
            .unwrap_or(6)
            .max("Dep".len());

        println!(
            "  {:<id_width$}  {:<dep_width$}  {:>5}  Page",
            "Flight", "Dep", "Delay"
        );
        for row in &result.impacted {
            let marker = if row.source == RowSource::OcrLine { " (?)" } else { "" };
            println!(
                "  {:<id_width$}  {:<dep_width$}  {:>5}  {}{}",
                row.flight_id, row.departure_center, row.delay_minutes, row.page_number, marker
            );
        }
        println!();
    }

    if result.low_confidence() {
        println!("  (?) read from scanned text without a table; check these rows by hand.");
        println!();
    }

    if !result.diagnostics.is_empty() {
        println!("  Diagnostics:");
        for d in &result.diagnostics {
            let level = match d.severity {
                DiagnosticSeverity::Critical => "critical",
                DiagnosticSeverity::Important => "warning",
                DiagnosticSeverity::Info => "info",
            };
            println!("    [{level}] {}", d.message);
        }
        println!();
    }
}

pub fn print_scope(scope: &DepScope) {
    if scope.is_empty() {
        println!("No DEP SCOPE region codes found.");
        return;
    }
    println!("DEP SCOPE ({} code(s)):", scope.len());
    for code in scope.iter() {
        println!("  {code}");
    }
}
