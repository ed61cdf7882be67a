use colored::Colorize;
use comfy_table::{Cell, Table};

use super::{build_filter, Context};
use crate::account::Route;
use crate::error::Result;
use crate::fmt::number;
use crate::models::ReportKind;
use crate::months::format_month_name;
use crate::reports;

fn warn_failed(failed: &[ReportKind]) {
    for kind in failed {
        eprintln!("{}", crate::view::load_error_message(*kind).yellow());
    }
}

pub fn overview() -> Result<()> {
    let ctx = Context::open()?;
    ctx.require(Route::AdminOnly)?;
    let data = reports::overview(&ctx.store, None);
    warn_failed(&data.failed);

    let mut counts = Table::new();
    counts.set_header(vec!["Kategori", "Kayıt"]);
    for kind in ReportKind::ALL {
        counts.add_row(vec![Cell::new(kind.label()), Cell::new(data.count(kind))]);
    }
    counts.add_row(vec![Cell::new("Toplam".bold()), Cell::new(data.total())]);
    println!("Genel Bakış\n{counts}");

    if data.trend.is_empty() {
        println!("Henüz aylık veri yok.");
        return Ok(());
    }
    let mut header = vec!["Ay".to_string()];
    header.extend(ReportKind::ALL.iter().map(|k| k.label().to_string()));
    let mut trend = Table::new();
    trend.set_header(header);
    for row in &data.trend {
        let mut cells = vec![Cell::new(format_month_name(&row.month))];
        cells.extend(ReportKind::ALL.iter().map(|k| Cell::new(row.count(*k))));
        trend.add_row(cells);
    }
    println!("Son {} Ay\n{trend}", reports::TREND_MONTHS);
    if let Some(month) = &data.last_month {
        println!("Son ay: {}", format_month_name(month));
    }
    Ok(())
}

pub fn run(year: Option<String>, month: Option<String>) -> Result<()> {
    let ctx = Context::open()?;
    let user = ctx.require(Route::Protected)?;

    let mine = reports::submissions_by_kind(&ctx.store, &user.uid);
    let mut own = Table::new();
    own.set_header(vec!["Kategori", "Gönderim"]);
    for kind in ReportKind::ALL {
        own.add_row(vec![
            Cell::new(kind.label()),
            Cell::new(mine.get(&kind).copied().unwrap_or(0)),
        ]);
    }
    println!("Gönderimleriniz\n{own}");

    if !user.is_admin() {
        return Ok(());
    }

    let filter = build_filter(year, month, None);
    let totals = reports::dashboard_totals(&ctx.store, &filter);
    warn_failed(&totals.failed);

    let mut table = Table::new();
    table.set_header(vec!["Gösterge", "Toplam"]);
    table.add_row(vec![Cell::new("CİMER Başvurusu"), Cell::new(number(totals.applications))]);
    table.add_row(vec![Cell::new("Web Ziyaretçi"), Cell::new(number(totals.visitors))]);
    table.add_row(vec![Cell::new("Sosyal Medya Takipçi"), Cell::new(number(totals.followers))]);
    table.add_row(vec![Cell::new("RPA Mail"), Cell::new(number(totals.emails))]);
    table.add_row(vec![Cell::new("Haber"), Cell::new(number(totals.news))]);
    println!("Özet ({})\n{table}", filter.describe());
    Ok(())
}
