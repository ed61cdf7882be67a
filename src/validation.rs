//! Checks run on drafts before anything is written.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ReportError, Result};
use crate::models::{
    CimerReport, NewsReport, Record, RecordMeta, RpaReport, SocialMediaReport, WebAnalyticsReport,
};
use crate::months::MonthKey;

pub const MIN_PASSWORD_LEN: usize = 6;

const MISSING_FIELDS: &str = "Tüm gerekli alanları doldurun";

fn invalid(message: impl Into<String>) -> ReportError {
    ReportError::Validation(message.into())
}

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"))
        .is_match(email.trim())
}

/// Registration form: all fields present, passwords equal and long enough.
pub fn validate_registration(email: &str, password: &str, confirm: &str) -> Result<()> {
    if email.trim().is_empty() || password.is_empty() || confirm.is_empty() {
        return Err(invalid("Tüm alanları doldurun"));
    }
    if password != confirm {
        return Err(invalid("Şifreler eşleşmiyor"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid("Şifre en az 6 karakter olmalıdır"));
    }
    if !is_valid_email(email) {
        return Err(invalid("Geçersiz email adresi."));
    }
    Ok(())
}

fn validate_meta(meta: &RecordMeta) -> Result<()> {
    if meta.month.trim().is_empty() {
        return Err(invalid(MISSING_FIELDS));
    }
    let key = MonthKey::parse(&meta.month)
        .ok_or_else(|| invalid(format!("Geçersiz ay: {} (YYYY-AA bekleniyor)", meta.month)))?;
    if let Some(year) = meta.year {
        if year != key.year() {
            return Err(invalid(format!(
                "Yıl ({year}) ay ile uyuşmuyor ({})",
                meta.month
            )));
        }
    }
    Ok(())
}

fn check_percent(label: &str, value: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&value) || value.is_nan() {
        return Err(invalid(format!("{label} 0-100 arasında olmalıdır")));
    }
    Ok(())
}

pub trait Validate {
    fn validate(&self) -> Result<()>;

    /// Tidy a draft before validation.
    fn normalize(&mut self) {}
}

impl Validate for NewsReport {
    fn validate(&self) -> Result<()> {
        validate_meta(&self.meta)?;
        let ad = self.ad_equivalent;
        if [ad.print, ad.tv, ad.internet].iter().any(|v| *v < 0.0 || v.is_nan()) {
            return Err(invalid("Reklam eşdeğeri negatif olamaz"));
        }
        Ok(())
    }
}

impl Validate for SocialMediaReport {
    fn validate(&self) -> Result<()> {
        validate_meta(&self.meta)
    }
}

impl Validate for WebAnalyticsReport {
    fn validate(&self) -> Result<()> {
        validate_meta(&self.meta)?;
        if let Some(rate) = self.bounce_rate {
            check_percent("Hemen çıkma oranı", rate)?;
        }
        if self.avg_session_duration.map_or(false, |d| d < 0.0) {
            return Err(invalid("Ortalama oturum süresi negatif olamaz"));
        }
        Ok(())
    }
}

impl Validate for CimerReport {
    fn validate(&self) -> Result<()> {
        validate_meta(&self.meta)?;
        for dept in &self.top_departments {
            check_percent(&format!("{} oranı", dept.name), dept.rate)?;
        }
        Ok(())
    }

    // blank rows left over from list inputs are not data
    fn normalize(&mut self) {
        self.top_departments.retain(|d| !d.name.trim().is_empty());
        self.application_topics.retain(|t| !t.topic.trim().is_empty());
    }
}

impl Validate for RpaReport {
    fn validate(&self) -> Result<()> {
        validate_meta(&self.meta)?;
        if self.sent_emails > self.incoming_emails {
            return Err(invalid("Dağıtılan mail sayısı toplam mail sayısından fazla olamaz"));
        }
        if let Some(rate) = self.automation_rate {
            check_percent("Otomasyon oranı", rate)?;
        }
        Ok(())
    }
}

/// Fill the derived `year`, tidy the draft, then validate.
pub fn prepare<T: Record + Validate>(record: &mut T) -> Result<()> {
    record.normalize();
    let meta = record.meta_mut();
    meta.month = meta.month.trim().to_string();
    if meta.year.is_none() {
        meta.year = MonthKey::parse(&meta.month).map(|k| k.year());
    }
    record.validate()
}
