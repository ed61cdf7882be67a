//! Flat CSV sheets per category and the merged all-categories document.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};

use crate::error::{ReportError, Result};
use crate::filter::Filter;
use crate::fmt::{compact, decimal, number, percent};
use crate::models::{
    CimerReport, NewsReport, Record, ReportKind, RpaReport, SocialMediaReport, WebAnalyticsReport,
};
use crate::months::format_month_name;
use crate::reports::rate;
use crate::store::{fetch_records, DocumentStore};

pub const MERGED_TITLE: &str = "Tüm Raporlar";
const LIST_SEPARATOR: &str = "; ";

/// Column layout and row shaping for one record kind.
pub trait Sheet: Record {
    fn headers() -> &'static [&'static str];
    fn row(&self) -> Vec<String>;
}

fn created(record: &impl Record) -> String {
    record
        .meta()
        .created_at
        .map(|t: DateTime<Utc>| t.with_timezone(&Local).format("%d.%m.%Y").to_string())
        .unwrap_or_default()
}

fn opt_number(v: Option<u64>) -> String {
    v.map(number).unwrap_or_default()
}

fn opt_decimal(v: Option<f64>) -> String {
    v.map(compact).unwrap_or_default()
}

impl Sheet for NewsReport {
    fn headers() -> &'static [&'static str] {
        &[
            "Ay",
            "İçerik",
            "Basın Haber Sayısı",
            "TV Haber Sayısı",
            "İnternet Haber Sayısı",
            "Toplam Haber",
            "Basın Reklam Eşdeğeri (TL)",
            "TV Reklam Eşdeğeri (TL)",
            "İnternet Reklam Eşdeğeri (TL)",
            "Basın Toplam Erişim",
            "TV Toplam Erişim",
            "İnternet Toplam Erişim",
            "Oluşturma Tarihi",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            format_month_name(&self.meta.month),
            self.period.map(|p| p.label().to_string()).unwrap_or_default(),
            number(self.news_count.print),
            number(self.news_count.tv),
            number(self.news_count.internet),
            number(self.news_count.total()),
            decimal(self.ad_equivalent.print, 2),
            decimal(self.ad_equivalent.tv, 2),
            decimal(self.ad_equivalent.internet, 2),
            number(self.total_reach.print),
            number(self.total_reach.tv),
            number(self.total_reach.internet),
            created(self),
        ]
    }
}

impl Sheet for SocialMediaReport {
    fn headers() -> &'static [&'static str] {
        &[
            "Ay",
            "Platform",
            "Takipçi Sayısı",
            "Yeni Takipçi",
            "Gönderi Sayısı",
            "Beğeni",
            "Yorum",
            "Görüntülenme",
            "Retweet",
            "Paylaşım",
            "Yeniden Paylaşım",
            "En Çok Etkileşim",
            "Oluşturma Tarihi",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            format_month_name(&self.meta.month),
            self.platform.name().to_string(),
            number(self.followers),
            opt_number(self.new_followers),
            number(self.posts),
            number(self.likes),
            number(self.comments),
            opt_number(self.views),
            opt_number(self.retweets),
            opt_number(self.shares),
            opt_number(self.reshares),
            self.most_engaged_post.clone().unwrap_or_default(),
            created(self),
        ]
    }
}

impl Sheet for WebAnalyticsReport {
    fn headers() -> &'static [&'static str] {
        &[
            "Ay",
            "Web Sitesi Ziyaretçi",
            "Portal Ziyaretçi",
            "Web Sitesi Sayfa Görüntüleme",
            "Portal Sayfa Görüntüleme",
            "Ort. Oturum Süresi (dk)",
            "Hemen Çıkma Oranı",
            "Web Sitesi Popüler Sayfalar",
            "Portal Popüler Sayfalar",
            "Oluşturma Tarihi",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            format_month_name(&self.meta.month),
            number(self.visitors.website),
            number(self.visitors.portal),
            number(self.page_views.website),
            number(self.page_views.portal),
            opt_decimal(self.avg_session_duration),
            self.bounce_rate.map(percent).unwrap_or_default(),
            self.top_pages.website.join(LIST_SEPARATOR),
            self.top_pages.portal.join(LIST_SEPARATOR),
            created(self),
        ]
    }
}

impl Sheet for CimerReport {
    fn headers() -> &'static [&'static str] {
        &[
            "Ay",
            "Başvuru Sayısı",
            "İşlenen Başvuru",
            "Başarı Oranı",
            "Ort. İşlem Süresi (Gün)",
            "En Çok Başvuru Alan Birimler",
            "En Sık Başvuru Konuları",
            "Oluşturma Tarihi",
        ]
    }

    fn row(&self) -> Vec<String> {
        let departments: Vec<String> = self
            .top_departments
            .iter()
            .map(|d| format!("{}: %{}", d.name, compact(d.rate)))
            .collect();
        let topics: Vec<String> = self
            .application_topics
            .iter()
            .map(|t| format!("{}: {}", t.topic, number(t.count)))
            .collect();
        vec![
            format_month_name(&self.meta.month),
            number(self.applications),
            number(self.processed_applications),
            percent(rate(self.processed_applications as f64, self.applications as f64)),
            opt_decimal(self.average_processing_time),
            departments.join(LIST_SEPARATOR),
            topics.join(LIST_SEPARATOR),
            created(self),
        ]
    }
}

impl Sheet for RpaReport {
    fn headers() -> &'static [&'static str] {
        &[
            "Ay",
            "Gelen Mail",
            "Gönderilen Mail",
            "Verimlilik",
            "En Çok Mail Alanlar",
            "En Çok Dağıtılan Birimler",
            "Oluşturma Tarihi",
        ]
    }

    fn row(&self) -> Vec<String> {
        let recipients: Vec<String> = self
            .top_email_recipients
            .iter()
            .map(|r| format!("{}: {}", r.email, number(r.count)))
            .collect();
        vec![
            format_month_name(&self.meta.month),
            number(self.incoming_emails),
            number(self.sent_emails),
            percent(rate(self.sent_emails as f64, self.incoming_emails as f64)),
            recipients.join(LIST_SEPARATOR),
            self.top_departments.join(LIST_SEPARATOR),
            created(self),
        ]
    }
}

/// One category's table, already shaped into display strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: ReportKind,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Section {
    pub fn of<T: Sheet>(records: &[T]) -> Self {
        Self {
            kind: T::KIND,
            headers: T::headers().iter().map(|h| h.to_string()).collect(),
            rows: records.iter().map(Sheet::row).collect(),
        }
    }

    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn csv_failure(e: impl std::fmt::Display) -> ReportError {
    ReportError::csv_export(e.to_string())
}

fn write_rows(title: Option<&str>, section: &Section) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    if let Some(title) = title {
        wtr.write_record([title]).map_err(csv_failure)?;
    }
    wtr.write_record(&section.headers).map_err(csv_failure)?;
    for row in &section.rows {
        wtr.write_record(row).map_err(csv_failure)?;
    }
    wtr.into_inner().map_err(csv_failure)
}

fn into_text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(csv_failure)
}

/// Header plus one line per record. An empty section yields the header alone.
pub fn section_csv(section: &Section) -> Result<String> {
    into_text(write_rows(None, section)?)
}

pub fn to_csv<T: Sheet>(records: &[T]) -> Result<String> {
    section_csv(&Section::of(records))
}

/// Every non-empty section under its title row, separated by blank lines.
pub fn merged_csv(sections: &[Section]) -> Result<String> {
    let mut out = Vec::new();
    for section in sections.iter().filter(|s| !s.is_empty()) {
        if !out.is_empty() {
            out.push(b'\n');
        }
        out.extend(write_rows(Some(section.title()), section)?);
    }
    into_text(out)
}

fn fetch_section<T: Sheet>(store: &dyn DocumentStore, filter: &Filter) -> Result<Section> {
    let records: Vec<T> = fetch_records(store).map_err(csv_failure)?;
    Ok(Section::of(&filter.apply(&records)))
}

/// Load and filter one category into a section.
pub fn load_section(store: &dyn DocumentStore, kind: ReportKind, filter: &Filter) -> Result<Section> {
    match kind {
        ReportKind::News => fetch_section::<NewsReport>(store, filter),
        ReportKind::SocialMedia => fetch_section::<SocialMediaReport>(store, filter),
        ReportKind::WebAnalytics => fetch_section::<WebAnalyticsReport>(store, filter),
        ReportKind::Cimer => fetch_section::<CimerReport>(store, filter),
        ReportKind::Rpa => fetch_section::<RpaReport>(store, filter),
    }
}

pub fn load_all_sections(store: &dyn DocumentStore, filter: &Filter) -> Result<Vec<Section>> {
    ReportKind::ALL
        .iter()
        .map(|kind| load_section(store, *kind, filter))
        .collect()
}

fn ascii_fold(c: char) -> Option<char> {
    let folded = match c {
        'ç' => 'c',
        'Ç' => 'C',
        'ğ' => 'g',
        'Ğ' => 'G',
        'ı' => 'i',
        'İ' => 'I',
        'ö' => 'o',
        'Ö' => 'O',
        'ş' => 's',
        'Ş' => 'S',
        'ü' => 'u',
        'Ü' => 'U',
        c if c.is_ascii_alphanumeric() || c == '-' => c,
        _ => return None,
    };
    Some(folded)
}

/// ASCII-safe token: Turkish letters folded, everything else collapsed to `_`.
pub fn ascii_safe(text: &str) -> String {
    let mut out = String::new();
    for c in text.trim().chars() {
        match ascii_fold(c) {
            Some(c) => out.push(c),
            None if !out.ends_with('_') => out.push('_'),
            None => {}
        }
    }
    out.trim_matches('_').to_string()
}

/// `<title>_<year|all>[_<month>].<ext>`
pub fn file_name(title: &str, filter: &Filter, ext: &str) -> String {
    let mut name = format!("{}_{}", ascii_safe(title), ascii_safe(filter.year().label()));
    if let Some(month) = filter.month().value() {
        name.push('_');
        name.push_str(&ascii_safe(month));
    }
    format!("{name}.{ext}")
}

pub fn write_file(path: &Path, contents: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(path.to_path_buf())
}
