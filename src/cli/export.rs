use std::path::PathBuf;

use colored::Colorize;

use super::{Context, ExportTarget, BROWSER_ENV};
use crate::account::Route;
use crate::error::Result;
use crate::export::{file_name, load_all_sections, load_section, merged_csv, section_csv, write_file, MERGED_TITLE};
use crate::filter::Filter;
use crate::models::ReportKind;
use crate::print::{print_document, ChartDir, PrintDocument, PrintSurface, SystemBrowser};
use crate::settings::shellexpand_path;

fn output_path(ctx: &Context, output: Option<String>, default_name: String) -> PathBuf {
    match output {
        Some(p) => PathBuf::from(shellexpand_path(&p)),
        None => ctx.settings.exports_dir().join(default_name),
    }
}

pub fn csv(target: ExportTarget, filter: Filter, output: Option<String>) -> Result<()> {
    let ctx = Context::open()?;
    ctx.require(Route::AdminOnly)?;

    let (title, contents, rows) = match target {
        ExportTarget::Kind(kind) => {
            let section = load_section(&ctx.store, kind, &filter)?;
            (kind.title(), section_csv(&section)?, section.rows.len())
        }
        ExportTarget::All => {
            let sections = load_all_sections(&ctx.store, &filter)?;
            let rows = sections.iter().map(|s| s.rows.len()).sum();
            (MERGED_TITLE, merged_csv(&sections)?, rows)
        }
    };
    if rows == 0 {
        println!("{}", format!("Seçilen dönem için kayıt bulunamadı ({}).", filter.describe()).yellow());
    }

    let path = output_path(&ctx, output, file_name(title, &filter, "csv"));
    let written = write_file(&path, &contents)?;
    tracing::info!(path = %written.display(), rows, "csv exported");
    println!("Wrote {}", written.display());
    Ok(())
}

pub fn print(
    kind: ReportKind,
    filter: Filter,
    charts: Option<String>,
    output: Option<String>,
    open: bool,
) -> Result<()> {
    let ctx = Context::open()?;
    ctx.require(Route::AdminOnly)?;

    let section = load_section(&ctx.store, kind, &filter)?;
    let mut doc = PrintDocument::new(kind.title(), &section)
        .with_subtitle(format!("{} - {}", ctx.settings.organization, filter.describe()));
    if let Some(dir) = charts {
        let source = ChartDir::new(shellexpand_path(&dir));
        doc = doc.with_charts(&source, &[kind.chart_id()]);
    }

    let path = output_path(&ctx, output, file_name(kind.title(), &filter, "html"));
    let browser;
    let surface: Option<&dyn PrintSurface> = if open {
        browser = SystemBrowser::new(std::env::var(BROWSER_ENV).ok());
        Some(&browser)
    } else {
        None
    };
    let written = print_document(&doc, &path, surface)?;
    tracing::info!(path = %written.display(), charts = doc.charts.len(), "print document written");
    println!("Wrote {}", written.display());
    Ok(())
}
