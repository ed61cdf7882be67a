use std::collections::{BTreeMap, HashMap};

use crate::filter::{Filter, Filterable};
use crate::models::{
    Channels, CimerReport, NewsPeriod, NewsReport, Platform, Record, ReportKind, RpaReport,
    SocialMediaReport, WebAnalyticsReport,
};
use crate::store::{fetch_records, Document, DocumentStore};

pub const TOP_DEPARTMENTS: usize = 10;
pub const TOP_TOPICS: usize = 8;
pub const TOP_RECIPIENTS: usize = 10;
pub const TREND_MONTHS: usize = 6;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// `numerator / denominator * 100`, or 0 when there is nothing to divide by.
pub fn rate(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return 0.0;
    }
    numerator / denominator * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessBand {
    High,
    Medium,
    Low,
}

impl SuccessBand {
    /// Band for a ratio. A zero denominator has no band at all.
    pub fn classify(numerator: f64, denominator: f64) -> Option<Self> {
        if denominator == 0.0 {
            return None;
        }
        let r = rate(numerator, denominator);
        Some(if r >= 90.0 {
            SuccessBand::High
        } else if r >= 70.0 {
            SuccessBand::Medium
        } else {
            SuccessBand::Low
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            SuccessBand::High => "Yüksek",
            SuccessBand::Medium => "Orta",
            SuccessBand::Low => "Düşük",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedItem {
    pub name: String,
    pub value: f64,
}

/// Sum of counts, pinned at `u64::MAX` rather than overflowing.
fn saturating_sum<I: IntoIterator<Item = u64>>(values: I) -> u64 {
    values.into_iter().fold(0, u64::saturating_add)
}

fn ranked(totals: BTreeMap<String, f64>, limit: usize) -> Vec<RankedItem> {
    let mut items: Vec<RankedItem> = totals
        .into_iter()
        .map(|(name, value)| RankedItem { name, value })
        .collect();
    // stable sort keeps ties in name order
    items.sort_by(|a, b| b.value.total_cmp(&a.value));
    items.truncate(limit);
    items
}

fn accumulate<I>(entries: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = (String, f64)>,
{
    let mut totals = BTreeMap::new();
    for (name, value) in entries {
        let name = name.trim().to_string();
        if name.is_empty() {
            continue;
        }
        *totals.entry(name).or_insert(0.0) += value;
    }
    totals
}

/// Sum per key, highest first.
pub fn top_by_sum<I>(entries: I, limit: usize) -> Vec<RankedItem>
where
    I: IntoIterator<Item = (String, f64)>,
{
    ranked(accumulate(entries), limit)
}

/// Sum per key divided by the number of contributing records, highest first.
pub fn top_by_mean<I>(entries: I, record_count: usize, limit: usize) -> Vec<RankedItem>
where
    I: IntoIterator<Item = (String, f64)>,
{
    if record_count == 0 {
        return Vec::new();
    }
    let n = record_count as f64;
    let means = accumulate(entries)
        .into_iter()
        .map(|(name, sum)| (name, sum / n))
        .collect();
    ranked(means, limit)
}

/// Fold records into one accumulator per month, ascending by month key.
/// Records without a month are skipped.
fn group_by_month<T, A, F>(records: &[T], mut fold: F) -> BTreeMap<String, A>
where
    T: Filterable,
    A: Default,
    F: FnMut(&mut A, &T),
{
    let mut groups: BTreeMap<String, A> = BTreeMap::new();
    for record in records {
        if let Some(month) = record.month_key() {
            fold(groups.entry(month.to_string()).or_default(), record);
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// CİMER
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CimerRow {
    pub month: String,
    pub applications: u64,
    pub processed: u64,
    pub rate: f64,
    pub band: Option<SuccessBand>,
}

#[derive(Default)]
struct CimerAcc {
    applications: u64,
    processed: u64,
}

pub fn cimer_series(records: &[CimerReport]) -> Vec<CimerRow> {
    group_by_month(records, |acc: &mut CimerAcc, r: &CimerReport| {
        acc.applications = acc.applications.saturating_add(r.applications);
        acc.processed = acc.processed.saturating_add(r.processed_applications);
    })
    .into_iter()
    .map(|(month, acc)| {
        let (processed, applications) = (acc.processed as f64, acc.applications as f64);
        CimerRow {
            month,
            applications: acc.applications,
            processed: acc.processed,
            rate: rate(processed, applications),
            band: SuccessBand::classify(processed, applications),
        }
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CimerSummary {
    pub applications: u64,
    pub processed: u64,
    pub rate: f64,
    /// Mean over records that reported a processing time.
    pub avg_processing_time: Option<f64>,
}

pub fn cimer_summary(records: &[CimerReport]) -> CimerSummary {
    let applications = saturating_sum(records.iter().map(|r| r.applications));
    let processed = saturating_sum(records.iter().map(|r| r.processed_applications));
    CimerSummary {
        applications,
        processed,
        rate: rate(processed as f64, applications as f64),
        avg_processing_time: mean(records.iter().filter_map(|r| r.average_processing_time)),
    }
}

/// Departments by mean share across all filtered records.
pub fn cimer_departments(records: &[CimerReport]) -> Vec<RankedItem> {
    top_by_mean(
        records
            .iter()
            .flat_map(|r| r.top_departments.iter().map(|d| (d.name.clone(), d.rate))),
        records.len(),
        TOP_DEPARTMENTS,
    )
}

pub fn cimer_topics(records: &[CimerReport]) -> Vec<RankedItem> {
    top_by_sum(
        records
            .iter()
            .flat_map(|r| r.application_topics.iter().map(|t| (t.topic.clone(), t.count as f64))),
        TOP_TOPICS,
    )
}

// ---------------------------------------------------------------------------
// RPA
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RpaRow {
    pub month: String,
    pub incoming: u64,
    pub sent: u64,
    pub efficiency: f64,
}

pub fn rpa_series(records: &[RpaReport]) -> Vec<RpaRow> {
    group_by_month(records, |acc: &mut (u64, u64), r: &RpaReport| {
        acc.0 = acc.0.saturating_add(r.incoming_emails);
        acc.1 = acc.1.saturating_add(r.sent_emails);
    })
    .into_iter()
    .map(|(month, (incoming, sent))| RpaRow {
        month,
        incoming,
        sent,
        efficiency: rate(sent as f64, incoming as f64),
    })
    .collect()
}

pub fn rpa_recipients(records: &[RpaReport]) -> Vec<RankedItem> {
    top_by_sum(
        records
            .iter()
            .flat_map(|r| r.top_email_recipients.iter().map(|e| (e.email.clone(), e.count as f64))),
        TOP_RECIPIENTS,
    )
}

/// Legacy department lists carry no counts; each appearance counts once.
pub fn rpa_departments(records: &[RpaReport]) -> Vec<RankedItem> {
    top_by_sum(
        records
            .iter()
            .flat_map(|r| r.top_departments.iter().map(|d| (d.clone(), 1.0))),
        TOP_DEPARTMENTS,
    )
}

// ---------------------------------------------------------------------------
// Social media
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesMode {
    /// One row per (month, platform).
    ByPlatform,
    /// One row per month, summed across platforms.
    Combined,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SocialRow {
    pub month: String,
    pub platform: Option<Platform>,
    pub followers: u64,
    pub posts: u64,
    pub likes: u64,
    pub comments: u64,
    pub views: u64,
    pub new_followers: u64,
    pub reports: usize,
}

impl SocialRow {
    fn add(&mut self, r: &SocialMediaReport) {
        self.followers = self.followers.saturating_add(r.followers);
        self.posts = self.posts.saturating_add(r.posts);
        self.likes = self.likes.saturating_add(r.likes);
        self.comments = self.comments.saturating_add(r.comments);
        self.views = self.views.saturating_add(r.views.unwrap_or(0));
        self.new_followers = self.new_followers.saturating_add(r.new_followers.unwrap_or(0));
        self.reports += 1;
    }
}

pub fn social_series(records: &[SocialMediaReport], mode: SeriesMode) -> Vec<SocialRow> {
    let mut rows: BTreeMap<(String, Option<Platform>), SocialRow> = BTreeMap::new();
    for r in records {
        let Some(month) = r.month_key() else { continue };
        let platform = match mode {
            SeriesMode::ByPlatform => Some(r.platform),
            SeriesMode::Combined => None,
        };
        rows.entry((month.to_string(), platform))
            .or_insert_with(|| SocialRow {
                month: month.to_string(),
                platform,
                ..Default::default()
            })
            .add(r);
    }
    rows.into_values().collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatestFollowers {
    pub platform: Platform,
    pub month: String,
    pub followers: u64,
}

/// Follower count from each platform's most recent month, in platform order.
pub fn latest_followers(records: &[SocialMediaReport]) -> Vec<LatestFollowers> {
    let mut latest: BTreeMap<Platform, LatestFollowers> = BTreeMap::new();
    for r in records {
        let Some(month) = r.month_key() else { continue };
        let newer = latest
            .get(&r.platform)
            .map_or(true, |seen| month > seen.month.as_str());
        if newer {
            latest.insert(
                r.platform,
                LatestFollowers {
                    platform: r.platform,
                    month: month.to_string(),
                    followers: r.followers,
                },
            );
        }
    }
    latest.into_values().collect()
}

// ---------------------------------------------------------------------------
// News
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsRow {
    pub month: String,
    pub period: Option<NewsPeriod>,
    pub news_count: Channels<u64>,
    pub ad_equivalent: Channels<f64>,
    pub reach: Channels<u64>,
}

impl NewsRow {
    pub fn period_label(&self) -> &'static str {
        self.period.map_or("-", |p| p.label())
    }
}

pub fn news_series(records: &[NewsReport]) -> Vec<NewsRow> {
    let mut rows: BTreeMap<(String, Option<NewsPeriod>), NewsRow> = BTreeMap::new();
    for r in records {
        let Some(month) = r.month_key() else { continue };
        let row = rows
            .entry((month.to_string(), r.period))
            .or_insert_with(|| NewsRow {
                month: month.to_string(),
                period: r.period,
                ..Default::default()
            });
        row.news_count += r.news_count;
        row.ad_equivalent += r.ad_equivalent;
        row.reach += r.total_reach;
    }
    rows.into_values().collect()
}

// ---------------------------------------------------------------------------
// Web analytics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebRow {
    pub month: String,
    pub website_visitors: u64,
    pub portal_visitors: u64,
    pub website_page_views: u64,
    pub portal_page_views: u64,
    pub avg_session_duration: Option<f64>,
    pub bounce_rate: Option<f64>,
}

#[derive(Default)]
struct WebAcc {
    row: WebRow,
    durations: Vec<f64>,
    bounces: Vec<f64>,
}

fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

pub fn web_series(records: &[WebAnalyticsReport]) -> Vec<WebRow> {
    group_by_month(records, |acc: &mut WebAcc, r: &WebAnalyticsReport| {
        acc.row.website_visitors = acc.row.website_visitors.saturating_add(r.visitors.website);
        acc.row.portal_visitors = acc.row.portal_visitors.saturating_add(r.visitors.portal);
        acc.row.website_page_views = acc.row.website_page_views.saturating_add(r.page_views.website);
        acc.row.portal_page_views = acc.row.portal_page_views.saturating_add(r.page_views.portal);
        acc.durations.extend(r.avg_session_duration);
        acc.bounces.extend(r.bounce_rate);
    })
    .into_iter()
    .map(|(month, acc)| WebRow {
        month,
        avg_session_duration: mean(acc.durations),
        bounce_rate: mean(acc.bounces),
        ..acc.row
    })
    .collect()
}

// ---------------------------------------------------------------------------
// Cross-category overview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TrendRow {
    pub month: String,
    pub counts: BTreeMap<ReportKind, usize>,
}

impl TrendRow {
    pub fn count(&self, kind: ReportKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub counts: BTreeMap<ReportKind, usize>,
    pub trend: Vec<TrendRow>,
    pub last_month: Option<String>,
    /// Categories whose fetch failed and count as zero.
    pub failed: Vec<ReportKind>,
}

impl Overview {
    pub fn count(&self, kind: ReportKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

fn fetch_documents(store: &dyn DocumentStore, kind: ReportKind) -> Option<Vec<Document>> {
    match store.query_all(kind.collection()) {
        Ok(docs) => Some(docs),
        Err(e) => {
            tracing::warn!(
                collection = kind.collection().name(),
                error = %e,
                "category fetch failed, counting as empty"
            );
            None
        }
    }
}

/// Record counts per category and the trailing monthly trend.
///
/// With a filter, only matching records are counted. A category that cannot
/// be fetched contributes zero and is listed in `failed`.
pub fn overview(store: &dyn DocumentStore, filter: Option<&Filter>) -> Overview {
    let mut counts = BTreeMap::new();
    let mut months: BTreeMap<String, BTreeMap<ReportKind, usize>> = BTreeMap::new();
    let mut failed = Vec::new();

    for kind in ReportKind::ALL {
        let docs = match fetch_documents(store, kind) {
            Some(docs) => docs,
            None => {
                failed.push(kind);
                counts.insert(kind, 0);
                continue;
            }
        };
        let docs = match filter {
            Some(f) => f.apply(&docs),
            None => docs,
        };
        counts.insert(kind, docs.len());
        for doc in &docs {
            if let Some(month) = doc.month() {
                *months
                    .entry(month.to_string())
                    .or_default()
                    .entry(kind)
                    .or_insert(0) += 1;
            }
        }
    }

    let skip = months.len().saturating_sub(TREND_MONTHS);
    let trend: Vec<TrendRow> = months
        .into_iter()
        .skip(skip)
        .map(|(month, counts)| TrendRow { month, counts })
        .collect();
    let last_month = trend.last().map(|row| row.month.clone());

    Overview {
        counts,
        trend,
        last_month,
        failed,
    }
}

// ---------------------------------------------------------------------------
// Dashboard totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardTotals {
    pub applications: u64,
    pub visitors: u64,
    pub followers: u64,
    pub emails: u64,
    pub news: u64,
    pub failed: Vec<ReportKind>,
}

fn filtered_or_empty<T: Record>(
    store: &dyn DocumentStore,
    filter: &Filter,
    failed: &mut Vec<ReportKind>,
) -> Vec<T> {
    match fetch_records::<T>(store) {
        Ok(records) => filter.apply(&records),
        Err(e) => {
            tracing::warn!(
                collection = T::KIND.collection().name(),
                error = %e,
                "category fetch failed, counting as empty"
            );
            failed.push(T::KIND);
            Vec::new()
        }
    }
}

/// Headline sums, each category filtered on its own by the same year and month.
pub fn dashboard_totals(store: &dyn DocumentStore, filter: &Filter) -> DashboardTotals {
    let mut failed = Vec::new();

    let news: Vec<NewsReport> = filtered_or_empty(store, filter, &mut failed);
    let social: Vec<SocialMediaReport> = filtered_or_empty(store, filter, &mut failed);
    let web: Vec<WebAnalyticsReport> = filtered_or_empty(store, filter, &mut failed);
    let cimer: Vec<CimerReport> = filtered_or_empty(store, filter, &mut failed);
    let rpa: Vec<RpaReport> = filtered_or_empty(store, filter, &mut failed);

    DashboardTotals {
        applications: saturating_sum(cimer.iter().map(|r| r.applications)),
        visitors: saturating_sum(web.iter().flat_map(|r| [r.visitors.website, r.visitors.portal])),
        followers: saturating_sum(social.iter().map(|r| r.followers)),
        emails: saturating_sum(rpa.iter().flat_map(|r| [r.incoming_emails, r.sent_emails])),
        news: saturating_sum(news.iter().map(|r| r.news_count.total())),
        failed,
    }
}

/// Record counts per category for the signed-in user's own submissions.
pub fn submissions_by_kind(
    store: &dyn DocumentStore,
    user_id: &str,
) -> HashMap<ReportKind, usize> {
    let value = serde_json::Value::String(user_id.to_string());
    ReportKind::ALL
        .iter()
        .map(|kind| {
            let n = store
                .query_eq(kind.collection(), "userId", &value)
                .map(|docs| docs.len())
                .unwrap_or_else(|e| {
                    tracing::warn!(collection = kind.collection().name(), error = %e, "count failed");
                    0
                });
            (*kind, n)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReportError, Result};
    use crate::filter::Selector;
    use crate::models::{
        Collection, DepartmentShare, RecipientCount, RecordMeta, Sites, TopicCount,
    };
    use crate::store::tests::test_store;
    use crate::store::{insert_record, SqliteStore};
    use serde_json::Value;

    fn meta(month: &str) -> RecordMeta {
        RecordMeta {
            month: month.to_string(),
            year: month.get(..4).and_then(|y| y.parse().ok()),
            user_id: "u1".to_string(),
            ..Default::default()
        }
    }

    fn cimer(month: &str, applications: u64, processed: u64) -> CimerReport {
        CimerReport {
            meta: meta(month),
            applications,
            processed_applications: processed,
            ..Default::default()
        }
    }

    fn dept(name: &str, rate: f64) -> DepartmentShare {
        DepartmentShare { name: name.to_string(), rate }
    }

    /// Delegates to SQLite but refuses one collection.
    struct FlakyStore<'a> {
        inner: &'a SqliteStore,
        failing: Collection,
    }

    impl FlakyStore<'_> {
        fn check(&self, c: Collection) -> Result<()> {
            if c == self.failing {
                Err(ReportError::Other("permission denied".into()))
            } else {
                Ok(())
            }
        }
    }

    impl DocumentStore for FlakyStore<'_> {
        fn insert(&self, c: Collection, data: Value) -> Result<String> {
            self.check(c)?;
            self.inner.insert(c, data)
        }
        fn set(&self, c: Collection, id: &str, data: Value) -> Result<()> {
            self.check(c)?;
            self.inner.set(c, id, data)
        }
        fn get(&self, c: Collection, id: &str) -> Result<Option<Document>> {
            self.check(c)?;
            self.inner.get(c, id)
        }
        fn update(&self, c: Collection, id: &str, patch: Value) -> Result<()> {
            self.check(c)?;
            self.inner.update(c, id, patch)
        }
        fn delete(&self, c: Collection, id: &str) -> Result<()> {
            self.check(c)?;
            self.inner.delete(c, id)
        }
        fn query_all(&self, c: Collection) -> Result<Vec<Document>> {
            self.check(c)?;
            self.inner.query_all(c)
        }
        fn query_eq(&self, c: Collection, field: &str, value: &Value) -> Result<Vec<Document>> {
            self.check(c)?;
            self.inner.query_eq(c, field, value)
        }
    }

    fn seed(store: &SqliteStore) {
        insert_record(store, &cimer("2025-01", 100, 90)).unwrap();
        insert_record(store, &cimer("2025-02", 50, 50)).unwrap();
        let mut news = NewsReport { meta: meta("2025-01"), ..Default::default() };
        news.news_count = Channels { print: 2, tv: 3, internet: 5 };
        insert_record(store, &news).unwrap();
        let mut social = SocialMediaReport::new(meta("2025-02"), Platform::X);
        social.followers = 1200;
        insert_record(store, &social).unwrap();
        let web = WebAnalyticsReport {
            meta: meta("2024-12"),
            visitors: Sites { website: 700, portal: 300 },
            ..Default::default()
        };
        insert_record(store, &web).unwrap();
        let rpa = RpaReport {
            meta: meta("2025-01"),
            incoming_emails: 40,
            sent_emails: 30,
            ..Default::default()
        };
        insert_record(store, &rpa).unwrap();
    }

    #[test]
    fn test_rate_guards_zero_denominator() {
        assert_eq!(rate(5.0, 0.0), 0.0);
        assert_eq!(rate(0.0, 0.0), 0.0);
        assert_eq!(rate(45.0, 50.0), 90.0);
        assert!(SuccessBand::classify(5.0, 0.0).is_none());
        assert_eq!(SuccessBand::classify(90.0, 100.0), Some(SuccessBand::High));
        assert_eq!(SuccessBand::classify(70.0, 100.0), Some(SuccessBand::Medium));
        assert_eq!(SuccessBand::classify(69.9, 100.0), Some(SuccessBand::Low));
    }

    #[test]
    fn test_cimer_series_scenario() {
        let records = vec![cimer("2025-02", 50, 50), cimer("2025-01", 100, 90), cimer("2024-11", 10, 1)];
        let filtered = Filter::from_options(Some("2025"), Some("all"), None).apply(&records);
        assert_eq!(filtered.len(), 2);
        let series = cimer_series(&filtered);
        let points: Vec<(&str, f64)> = series.iter().map(|r| (r.month.as_str(), r.rate)).collect();
        assert_eq!(points, vec![("2025-01", 90.0), ("2025-02", 100.0)]);
    }

    #[test]
    fn test_cimer_zero_applications_has_no_band() {
        let series = cimer_series(&[cimer("2025-03", 0, 0)]);
        assert_eq!(series[0].rate, 0.0);
        assert!(series[0].rate.is_finite());
        assert_eq!(series[0].band, None);
    }

    #[test]
    fn test_duplicate_months_are_summed() {
        let series = cimer_series(&[cimer("2025-01", 100, 90), cimer("2025-01", 100, 50)]);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].applications, 200);
        assert_eq!(series[0].rate, 70.0);
    }

    #[test]
    fn test_huge_counts_saturate_instead_of_overflowing() {
        let series = cimer_series(&[cimer("2025-01", u64::MAX, u64::MAX), cimer("2025-01", 1, 1)]);
        assert_eq!(series[0].applications, u64::MAX);
        assert_eq!(series[0].processed, u64::MAX);
        assert_eq!(cimer_summary(&[cimer("2025-01", u64::MAX, 0), cimer("2025-02", 5, 0)]).applications, u64::MAX);

        let mut a = NewsReport { meta: meta("2025-01"), ..Default::default() };
        a.news_count = Channels { print: u64::MAX, tv: 1, internet: 1 };
        let rows = news_series(&[a.clone(), a]);
        assert_eq!(rows[0].news_count.print, u64::MAX);
        assert_eq!(rows[0].news_count.total(), u64::MAX);
    }

    #[test]
    fn test_department_mean_divides_by_record_count() {
        let mut a = cimer("2025-01", 1, 1);
        a.top_departments = vec![dept("Rare", 100.0), dept("Common", 10.0)];
        let mut b = cimer("2025-02", 1, 1);
        b.top_departments = vec![dept("Common", 10.0)];
        let mut c = cimer("2025-03", 1, 1);
        c.top_departments = vec![dept("Common", 10.0)];

        let ranking = cimer_departments(&[a, b, c]);
        assert_eq!(ranking[0].name, "Rare");
        assert!((ranking[0].value - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(ranking[1].name, "Common");
        assert!((ranking[1].value - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_department_ranking_truncates_to_ten() {
        let mut r = cimer("2025-01", 1, 1);
        r.top_departments = (0..15).map(|i| dept(&format!("D{i:02}"), i as f64)).collect();
        let ranking = cimer_departments(&[r]);
        assert_eq!(ranking.len(), TOP_DEPARTMENTS);
        assert_eq!(ranking[0].name, "D14");
    }

    #[test]
    fn test_topics_summed_and_capped_at_eight() {
        let mut a = cimer("2025-01", 1, 1);
        a.application_topics = (0..10)
            .map(|i| TopicCount { topic: format!("T{i}"), count: i })
            .collect();
        let mut b = cimer("2025-02", 1, 1);
        b.application_topics = vec![TopicCount { topic: "T0".into(), count: 100 }];
        let topics = cimer_topics(&[a, b]);
        assert_eq!(topics.len(), TOP_TOPICS);
        assert_eq!(topics[0].name, "T0");
        assert_eq!(topics[0].value, 100.0);
    }

    #[test]
    fn test_rpa_series_and_rankings() {
        let a = RpaReport {
            meta: meta("2025-01"),
            incoming_emails: 40,
            sent_emails: 30,
            top_email_recipients: vec![
                RecipientCount { email: "a@k.gov.tr".into(), count: 5 },
                RecipientCount { email: "b@k.gov.tr".into(), count: 9 },
            ],
            ..Default::default()
        };
        let b = RpaReport {
            meta: meta("2025-02"),
            top_email_recipients: vec![RecipientCount { email: "a@k.gov.tr".into(), count: 6 }],
            top_departments: vec!["İK".into(), "Hukuk".into(), "İK".into()],
            ..Default::default()
        };
        let series = rpa_series(&[b.clone(), a.clone()]);
        assert_eq!(series[0].month, "2025-01");
        assert_eq!(series[0].efficiency, 75.0);
        assert_eq!(series[1].efficiency, 0.0);

        let recipients = rpa_recipients(&[a.clone(), b.clone()]);
        assert_eq!(recipients[0].name, "a@k.gov.tr");
        assert_eq!(recipients[0].value, 11.0);

        let depts = rpa_departments(&[a, b]);
        assert_eq!(depts[0].name, "İK");
        assert_eq!(depts[0].value, 2.0);
    }

    #[test]
    fn test_social_modes_are_distinct() {
        let mut x = SocialMediaReport::new(meta("2025-01"), Platform::X);
        x.followers = 100;
        let mut ig = SocialMediaReport::new(meta("2025-01"), Platform::Instagram);
        ig.followers = 50;
        let mut x2 = SocialMediaReport::new(meta("2025-02"), Platform::X);
        x2.followers = 120;
        let records = vec![x2, ig, x];

        let by_platform = social_series(&records, SeriesMode::ByPlatform);
        assert_eq!(by_platform.len(), 3);
        assert_eq!(by_platform[0].month, "2025-01");
        assert!(by_platform.iter().all(|r| r.platform.is_some()));

        let combined = social_series(&records, SeriesMode::Combined);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined[0].followers, 150);
        assert_eq!(combined[0].reports, 2);

        let latest = latest_followers(&records);
        assert_eq!(latest[0].platform, Platform::X);
        assert_eq!(latest[0].followers, 120);
        assert_eq!(latest[1].followers, 50);
    }

    #[test]
    fn test_news_keyed_by_month_and_period() {
        let mut a = NewsReport { meta: meta("2025-01"), period: Some(NewsPeriod::Turksat), ..Default::default() };
        a.news_count = Channels { print: 1, tv: 1, internet: 1 };
        let mut b = NewsReport { meta: meta("2025-01"), period: Some(NewsPeriod::AhmetHamdiAtalay), ..Default::default() };
        b.news_count = Channels { print: 2, tv: 0, internet: 0 };
        let c = a.clone();
        let rows = news_series(&[a, b, c]);
        assert_eq!(rows.len(), 2);
        let turksat = rows.iter().find(|r| r.period == Some(NewsPeriod::Turksat)).unwrap();
        assert_eq!(turksat.news_count.total(), 6);
        assert_eq!(turksat.period_label(), "Türksat");
    }

    #[test]
    fn test_web_series_sums_and_averages() {
        let a = WebAnalyticsReport {
            meta: meta("2025-01"),
            visitors: Sites { website: 100, portal: 10 },
            bounce_rate: Some(40.0),
            ..Default::default()
        };
        let b = WebAnalyticsReport {
            meta: meta("2025-01"),
            visitors: Sites { website: 50, portal: 5 },
            bounce_rate: Some(60.0),
            avg_session_duration: Some(3.0),
            ..Default::default()
        };
        let rows = web_series(&[a, b]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].website_visitors, 150);
        assert_eq!(rows[0].bounce_rate, Some(50.0));
        assert_eq!(rows[0].avg_session_duration, Some(3.0));
    }

    #[test]
    fn test_missing_nested_fields_count_as_zero() {
        let r: CimerReport = serde_json::from_str(r#"{"month": "2025-01"}"#).unwrap();
        assert!(cimer_departments(&[r.clone()]).is_empty());
        assert_eq!(cimer_series(&[r])[0].applications, 0);
    }

    #[test]
    fn test_overview_counts_and_trend() {
        let (_dir, store) = test_store();
        seed(&store);
        let ov = overview(&store, None);
        assert_eq!(ov.count(ReportKind::Cimer), 2);
        assert_eq!(ov.count(ReportKind::WebAnalytics), 1);
        assert_eq!(ov.total(), 6);
        assert_eq!(ov.last_month.as_deref(), Some("2025-02"));
        let jan = ov.trend.iter().find(|r| r.month == "2025-01").unwrap();
        assert_eq!(jan.count(ReportKind::Cimer), 1);
        assert_eq!(jan.count(ReportKind::News), 1);
        assert_eq!(jan.count(ReportKind::Rpa), 1);
        assert!(ov.failed.is_empty());
    }

    #[test]
    fn test_overview_trend_keeps_last_six_months() {
        let (_dir, store) = test_store();
        for m in 1..=9 {
            insert_record(&store, &cimer(&format!("2024-{m:02}"), 1, 1)).unwrap();
        }
        let ov = overview(&store, None);
        assert_eq!(ov.trend.len(), TREND_MONTHS);
        assert_eq!(ov.trend[0].month, "2024-04");
        assert_eq!(ov.last_month.as_deref(), Some("2024-09"));
    }

    #[test]
    fn test_overview_survives_one_failing_category() {
        let (_dir, store) = test_store();
        seed(&store);
        let flaky = FlakyStore { inner: &store, failing: Collection::CimerReports };
        let ov = overview(&flaky, None);
        assert_eq!(ov.failed, vec![ReportKind::Cimer]);
        assert_eq!(ov.count(ReportKind::Cimer), 0);
        assert_eq!(ov.count(ReportKind::News), 1);
        assert_eq!(ov.count(ReportKind::SocialMedia), 1);
        assert_eq!(ov.count(ReportKind::WebAnalytics), 1);
        assert_eq!(ov.count(ReportKind::Rpa), 1);
    }

    #[test]
    fn test_dashboard_totals_filter_each_category() {
        let (_dir, store) = test_store();
        seed(&store);
        let all = dashboard_totals(&store, &Filter::new());
        assert_eq!(all.applications, 150);
        assert_eq!(all.visitors, 1000);
        assert_eq!(all.followers, 1200);
        assert_eq!(all.emails, 70);
        assert_eq!(all.news, 10);

        let mut jan = Filter::new();
        jan.set_year(Selector::parse("2025"));
        jan.set_month(Selector::parse("2025-01"));
        let t = dashboard_totals(&store, &jan);
        assert_eq!(t.applications, 100);
        assert_eq!(t.visitors, 0);
        assert_eq!(t.followers, 0);
        assert_eq!(t.news, 10);
    }

    #[test]
    fn test_dashboard_totals_zero_for_failed_category() {
        let (_dir, store) = test_store();
        seed(&store);
        let flaky = FlakyStore { inner: &store, failing: Collection::RpaReports };
        let t = dashboard_totals(&flaky, &Filter::new());
        assert_eq!(t.emails, 0);
        assert_eq!(t.applications, 150);
        assert_eq!(t.failed, vec![ReportKind::Rpa]);
    }

    #[test]
    fn test_submissions_by_kind() {
        let (_dir, store) = test_store();
        seed(&store);
        let counts = submissions_by_kind(&store, "u1");
        assert_eq!(counts[&ReportKind::Cimer], 2);
        assert_eq!(submissions_by_kind(&store, "other")[&ReportKind::Cimer], 0);
    }
}
