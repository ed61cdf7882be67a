use colored::Colorize;
use comfy_table::{Cell, Table};

use super::Context;
use crate::account::Route;
use crate::error::Result;
use crate::filter::{available_months, available_years, Filter, Selector};
use crate::fmt::{compact, lira, number, percent};
use crate::models::{
    CimerReport, NewsReport, Record, ReportKind, RpaReport, SocialMediaReport, WebAnalyticsReport,
};
use crate::months::{format_month_name, month_options, MonthKey};
use crate::reports::{self, RankedItem, SeriesMode, SuccessBand};
use crate::store::DocumentStore;
use crate::view::ReportView;

/// Load one category into a view with `filter` applied. A failed fetch leaves
/// the view empty with its error set.
fn load<T: Record>(store: &dyn DocumentStore, filter: Filter) -> ReportView<T> {
    let mut view = ReportView::new();
    *view.filter_mut() = filter;
    view.reload(store);
    view
}

/// Visible records, or `None` after printing the view's error.
fn visible_or_report<T: Record>(view: &ReportView<T>) -> Option<Vec<T>> {
    if let Some(message) = view.error() {
        eprintln!("{}", message.red());
        return None;
    }
    let visible = view.visible();
    if visible.is_empty() {
        println!("Seçilen dönem için kayıt bulunamadı ({}).", view.filter().describe());
        return None;
    }
    Some(visible)
}

fn ranking_table(name_header: &str, value_header: &str, items: &[RankedItem], fmt: fn(f64) -> String) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", name_header, value_header]);
    for (i, item) in items.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&item.name),
            Cell::new(fmt(item.value)),
        ]);
    }
    table
}

fn band_cell(band: Option<SuccessBand>) -> Cell {
    match band {
        Some(SuccessBand::High) => Cell::new(SuccessBand::High.label().green()),
        Some(SuccessBand::Medium) => Cell::new(SuccessBand::Medium.label().yellow()),
        Some(SuccessBand::Low) => Cell::new(SuccessBand::Low.label().red()),
        None => Cell::new("-"),
    }
}

fn opt(value: Option<f64>, fmt: fn(f64) -> String) -> String {
    value.map_or_else(|| "-".to_string(), fmt)
}

fn count(value: f64) -> String {
    number(value.round() as u64)
}

fn heading(kind: ReportKind, filter: &Filter) {
    println!("{} ({})", kind.title().bold(), filter.describe());
    println!();
}

fn cimer(store: &dyn DocumentStore, filter: Filter) {
    let view = load::<CimerReport>(store, filter);
    let Some(records) = visible_or_report(&view) else { return };
    heading(ReportKind::Cimer, view.filter());

    let summary = reports::cimer_summary(&records);
    println!("Toplam Başvuru:     {}", number(summary.applications));
    println!("İşlenen Başvuru:    {}", number(summary.processed));
    println!("Başarı Oranı:       {}", percent(summary.rate));
    println!("Ort. İşlem Süresi:  {} gün", opt(summary.avg_processing_time, compact));
    println!();

    let mut table = Table::new();
    table.set_header(vec!["Ay", "Başvuru", "İşlenen", "Başarı Oranı", "Durum"]);
    for row in reports::cimer_series(&records) {
        table.add_row(vec![
            Cell::new(format_month_name(&row.month)),
            Cell::new(number(row.applications)),
            Cell::new(number(row.processed)),
            Cell::new(percent(row.rate)),
            band_cell(row.band),
        ]);
    }
    println!("Aylık Başvurular\n{table}");

    let departments = reports::cimer_departments(&records);
    if !departments.is_empty() {
        println!("En Çok Başvuru Alan Birimler\n{}", ranking_table("Birim", "Ort. Oran", &departments, percent));
    }
    let topics = reports::cimer_topics(&records);
    if !topics.is_empty() {
        println!("En Sık Başvuru Konuları\n{}", ranking_table("Konu", "Başvuru", &topics, count));
    }
}

fn rpa(store: &dyn DocumentStore, filter: Filter) {
    let view = load::<RpaReport>(store, filter);
    let Some(records) = visible_or_report(&view) else { return };
    heading(ReportKind::Rpa, view.filter());

    let mut table = Table::new();
    table.set_header(vec!["Ay", "Gelen Mail", "Dağıtılan Mail", "Verimlilik"]);
    for row in reports::rpa_series(&records) {
        table.add_row(vec![
            Cell::new(format_month_name(&row.month)),
            Cell::new(number(row.incoming)),
            Cell::new(number(row.sent)),
            Cell::new(percent(row.efficiency)),
        ]);
    }
    println!("Aylık Mail Dağıtımı\n{table}");

    let recipients = reports::rpa_recipients(&records);
    if !recipients.is_empty() {
        println!("En Çok Mail Alan Adresler\n{}", ranking_table("Email", "Mail", &recipients, count));
    }
    let departments = reports::rpa_departments(&records);
    if !departments.is_empty() {
        println!("En Çok Mail Alan Birimler\n{}", ranking_table("Birim", "Ay", &departments, count));
    }
}

fn social(store: &dyn DocumentStore, filter: Filter, combined: bool) {
    let view = load::<SocialMediaReport>(store, filter);
    let Some(records) = visible_or_report(&view) else { return };
    heading(ReportKind::SocialMedia, view.filter());

    let mode = if combined { SeriesMode::Combined } else { SeriesMode::ByPlatform };
    let mut table = Table::new();
    table.set_header(vec![
        "Ay", "Platform", "Takipçi", "Yeni Takipçi", "Gönderi", "Beğeni", "Yorum", "Görüntülenme",
    ]);
    for row in reports::social_series(&records, mode) {
        table.add_row(vec![
            Cell::new(format_month_name(&row.month)),
            Cell::new(row.platform.map_or("Tümü", |p| p.name())),
            Cell::new(number(row.followers)),
            Cell::new(number(row.new_followers)),
            Cell::new(number(row.posts)),
            Cell::new(number(row.likes)),
            Cell::new(number(row.comments)),
            Cell::new(number(row.views)),
        ]);
    }
    println!("Aylık Performans\n{table}");

    let mut latest = Table::new();
    latest.set_header(vec!["Platform", "Son Ay", "Takipçi"]);
    for row in reports::latest_followers(&records) {
        latest.add_row(vec![
            Cell::new(row.platform.name()),
            Cell::new(format_month_name(&row.month)),
            Cell::new(number(row.followers)),
        ]);
    }
    println!("Güncel Takipçi Sayıları\n{latest}");
}

fn news(store: &dyn DocumentStore, filter: Filter) {
    let view = load::<NewsReport>(store, filter);
    let Some(records) = visible_or_report(&view) else { return };
    heading(ReportKind::News, view.filter());

    let mut table = Table::new();
    table.set_header(vec![
        "Ay", "Dönem", "Haber (Yazılı/TV/İnternet)", "Toplam Haber", "Reklam Eşdeğeri", "Toplam Erişim",
    ]);
    for row in reports::news_series(&records) {
        table.add_row(vec![
            Cell::new(format_month_name(&row.month)),
            Cell::new(row.period_label()),
            Cell::new(format!(
                "{} / {} / {}",
                number(row.news_count.print),
                number(row.news_count.tv),
                number(row.news_count.internet)
            )),
            Cell::new(number(row.news_count.total())),
            Cell::new(lira(row.ad_equivalent.total())),
            Cell::new(number(row.reach.total())),
        ]);
    }
    println!("Aylık Haberler\n{table}");
}

fn web(store: &dyn DocumentStore, filter: Filter) {
    let view = load::<WebAnalyticsReport>(store, filter);
    let Some(records) = visible_or_report(&view) else { return };
    heading(ReportKind::WebAnalytics, view.filter());

    let mut table = Table::new();
    table.set_header(vec![
        "Ay", "Web Ziyaretçi", "Portal Ziyaretçi", "Web Sayfa Görüntüleme", "Portal Sayfa Görüntüleme",
        "Ort. Oturum (dk)", "Hemen Çıkma",
    ]);
    for row in reports::web_series(&records) {
        table.add_row(vec![
            Cell::new(format_month_name(&row.month)),
            Cell::new(number(row.website_visitors)),
            Cell::new(number(row.portal_visitors)),
            Cell::new(number(row.website_page_views)),
            Cell::new(number(row.portal_page_views)),
            Cell::new(opt(row.avg_session_duration, compact)),
            Cell::new(opt(row.bounce_rate, percent)),
        ]);
    }
    println!("Aylık Ziyaretler\n{table}");
}

pub fn run(kind: ReportKind, filter: Filter, combined: bool) -> Result<()> {
    let ctx = Context::open()?;
    ctx.require(Route::AdminOnly)?;
    match kind {
        ReportKind::Cimer => cimer(&ctx.store, filter),
        ReportKind::Rpa => rpa(&ctx.store, filter),
        ReportKind::SocialMedia => social(&ctx.store, filter, combined),
        ReportKind::News => news(&ctx.store, filter),
        ReportKind::WebAnalytics => web(&ctx.store, filter),
    }
    Ok(())
}

pub fn periods(kind: ReportKind, year: Option<String>) -> Result<()> {
    let ctx = Context::open()?;
    ctx.require(Route::AdminOnly)?;
    let docs = ctx.store.query_all(kind.collection())?;
    let year = Selector::from_option(year.as_deref());

    let years = available_years(&docs);
    if years.is_empty() {
        println!("Henüz {} kaydı yok.", kind.label());
        return Ok(());
    }
    println!("Yıllar:  {}", years.join(", "));

    let mut table = Table::new();
    table.set_header(vec!["Kod", "Ay"]);
    for month in available_months(&docs, &year) {
        table.add_row(vec![Cell::new(month.code()), Cell::new(month.name())]);
    }
    println!("Aylar ({})\n{table}", year.label());
    Ok(())
}

pub fn months(since: Option<i32>) -> Result<()> {
    let now = MonthKey::current();
    let start = since.unwrap_or(now.year() - 1);
    let mut table = Table::new();
    table.set_header(vec!["Kod", "Ay"]);
    for option in month_options(start, now) {
        table.add_row(vec![Cell::new(option.code), Cell::new(option.label)]);
    }
    println!("Seçilebilir Aylar\n{table}");
    Ok(())
}
