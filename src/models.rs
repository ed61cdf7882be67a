use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Document store collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    NewsReports,
    SocialMediaReports,
    WebAnalyticsReports,
    CimerReports,
    RpaReports,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::NewsReports => "newsReports",
            Collection::SocialMediaReports => "socialMediaReports",
            Collection::WebAnalyticsReports => "webAnalyticsReports",
            Collection::CimerReports => "cimerReports",
            Collection::RpaReports => "rpaReports",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The five monthly report categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportKind {
    News,
    SocialMedia,
    WebAnalytics,
    Cimer,
    Rpa,
}

impl ReportKind {
    pub const ALL: [ReportKind; 5] = [
        ReportKind::News,
        ReportKind::SocialMedia,
        ReportKind::WebAnalytics,
        ReportKind::Cimer,
        ReportKind::Rpa,
    ];

    pub fn collection(&self) -> Collection {
        match self {
            ReportKind::News => Collection::NewsReports,
            ReportKind::SocialMedia => Collection::SocialMediaReports,
            ReportKind::WebAnalytics => Collection::WebAnalyticsReports,
            ReportKind::Cimer => Collection::CimerReports,
            ReportKind::Rpa => Collection::RpaReports,
        }
    }

    /// Display title used for report headings and export file names.
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::News => "Haber Raporları",
            ReportKind::SocialMedia => "Sosyal Medya Raporları",
            ReportKind::WebAnalytics => "Web Analitik Raporları",
            ReportKind::Cimer => "CİMER Raporları",
            ReportKind::Rpa => "RPA Raporları",
        }
    }

    /// Short label for summary tables.
    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::News => "Haberler",
            ReportKind::SocialMedia => "Sosyal Medya",
            ReportKind::WebAnalytics => "Web Analitik",
            ReportKind::Cimer => "CİMER",
            ReportKind::Rpa => "RPA Rapor",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::News => "news",
            ReportKind::SocialMedia => "social-media",
            ReportKind::WebAnalytics => "web-analytics",
            ReportKind::Cimer => "cimer",
            ReportKind::Rpa => "rpa",
        }
    }

    /// Id of the on-page chart container captured when printing this category.
    pub fn chart_id(&self) -> String {
        format!("{}-chart", self.slug())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .iter()
            .copied()
            .find(|k| k.slug() == s)
            .ok_or_else(|| {
                format!("unknown report kind '{s}' (news, social-media, web-analytics, cimer, rpa)")
            })
    }
}

/// Fields shared by every report document.
///
/// `year` is written alongside `month` but is not trusted on read; filters
/// derive the year from `month`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub month: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A typed report document living in one collection.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const KIND: ReportKind;

    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;

    fn platform_name(&self) -> Option<&str> {
        None
    }
}

/// A metric broken down by media channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Channels<T> {
    #[serde(default)]
    pub print: T,
    #[serde(default)]
    pub tv: T,
    #[serde(default)]
    pub internet: T,
}

/// Addition that stops at the numeric ceiling instead of overflowing.
pub trait Tally: Copy {
    fn tally(self, rhs: Self) -> Self;
}

impl Tally for u64 {
    fn tally(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl Tally for f64 {
    fn tally(self, rhs: Self) -> Self {
        self + rhs
    }
}

impl<T: Tally> Channels<T> {
    pub fn total(&self) -> T {
        self.print.tally(self.tv).tally(self.internet)
    }
}

impl<T: Tally> std::ops::AddAssign for Channels<T> {
    fn add_assign(&mut self, rhs: Self) {
        self.print = self.print.tally(rhs.print);
        self.tv = self.tv.tally(rhs.tv);
        self.internet = self.internet.tally(rhs.internet);
    }
}

/// A metric split between the public website and the internal portal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sites<T> {
    #[serde(default)]
    pub website: T,
    #[serde(default)]
    pub portal: T,
}

/// Organizational unit a news report was filed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NewsPeriod {
    #[serde(rename = "ahmet-hamdi-atalay")]
    AhmetHamdiAtalay,
    #[serde(rename = "turksat")]
    Turksat,
}

impl NewsPeriod {
    pub fn label(&self) -> &'static str {
        match self {
            NewsPeriod::AhmetHamdiAtalay => "Ahmet Hamdi Atalay",
            NewsPeriod::Turksat => "Türksat",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsReport {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<NewsPeriod>,
    #[serde(default)]
    pub news_count: Channels<u64>,
    #[serde(default)]
    pub ad_equivalent: Channels<f64>,
    #[serde(default)]
    pub total_reach: Channels<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    X,
    Instagram,
    LinkedIn,
    Facebook,
    YouTube,
    NextSosyal,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::X,
        Platform::Instagram,
        Platform::LinkedIn,
        Platform::Facebook,
        Platform::YouTube,
        Platform::NextSosyal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Platform::X => "X",
            Platform::Instagram => "Instagram",
            Platform::LinkedIn => "LinkedIn",
            Platform::Facebook => "Facebook",
            Platform::YouTube => "YouTube",
            Platform::NextSosyal => "NextSosyal",
        }
    }

    pub fn has_retweets(&self) -> bool {
        matches!(self, Platform::X)
    }

    pub fn has_shares(&self) -> bool {
        matches!(self, Platform::LinkedIn | Platform::Facebook)
    }

    pub fn has_reshares(&self) -> bool {
        matches!(self, Platform::NextSosyal)
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown platform '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialMediaReport {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub platform: Platform,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub posts: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_followers: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweets: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reshares: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_engaged_post: Option<String>,
}

impl SocialMediaReport {
    /// An empty report for one platform; counters start at zero.
    pub fn new(meta: RecordMeta, platform: Platform) -> Self {
        Self {
            meta,
            platform,
            followers: 0,
            posts: 0,
            likes: 0,
            comments: 0,
            views: None,
            new_followers: None,
            retweets: None,
            shares: None,
            reshares: None,
            most_engaged_post: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAnalyticsReport {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub visitors: Sites<u64>,
    #[serde(default)]
    pub page_views: Sites<u64>,
    #[serde(default)]
    pub top_pages: Sites<Vec<String>>,
    /// Minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_session_duration: Option<f64>,
    /// Percent, 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounce_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepartmentShare {
    #[serde(default)]
    pub name: String,
    /// Percentage share of the month's applications, not a count.
    #[serde(default)]
    pub rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicCount {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CimerReport {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub applications: u64,
    #[serde(default)]
    pub processed_applications: u64,
    /// Days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_processing_time: Option<f64>,
    #[serde(default)]
    pub top_departments: Vec<DepartmentShare>,
    #[serde(default)]
    pub application_topics: Vec<TopicCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipientCount {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpaReport {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default, alias = "totalEmails")]
    pub incoming_emails: u64,
    #[serde(default, alias = "distributedEmails")]
    pub sent_emails: u64,
    #[serde(default)]
    pub top_email_recipients: Vec<RecipientCount>,
    /// Legacy shape: up to three department names, no counts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_departments: Vec<String>,
    /// Hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_response_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automation_rate: Option<f64>,
}

macro_rules! impl_record {
    ($ty:ty, $kind:expr) => {
        impl Record for $ty {
            const KIND: ReportKind = $kind;

            fn meta(&self) -> &RecordMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut RecordMeta {
                &mut self.meta
            }
        }
    };
}

impl_record!(NewsReport, ReportKind::News);
impl_record!(WebAnalyticsReport, ReportKind::WebAnalytics);
impl_record!(CimerReport, ReportKind::Cimer);
impl_record!(RpaReport, ReportKind::Rpa);

impl Record for SocialMediaReport {
    const KIND: ReportKind = ReportKind::SocialMedia;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn platform_name(&self) -> Option<&str> {
        Some(self.platform.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "staff", alias = "personel")]
    Staff,
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// The account record written right after sign-up: staff, awaiting approval.
    pub fn registered(uid: &str, email: &str) -> Self {
        Self {
            uid: uid.to_string(),
            email: email.to_string(),
            role: Role::Staff,
            is_approved: false,
            created_at: Some(Utc::now()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
