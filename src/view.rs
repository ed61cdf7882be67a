//! State behind one loaded report screen.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;
use crate::filter::Filter;
use crate::models::{Record, ReportKind};
use crate::store::{fetch_records, DocumentStore};

/// Hands out request tickets; only the newest ticket may publish its result.
#[derive(Debug, Default)]
pub struct RequestGuard {
    latest: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

pub fn load_error_message(kind: ReportKind) -> String {
    let subject = match kind {
        ReportKind::News => "Haber raporlarını",
        ReportKind::SocialMedia => "Sosyal medya raporlarını",
        ReportKind::WebAnalytics => "Web analitik raporlarını",
        ReportKind::Cimer => "CİMER raporlarını",
        ReportKind::Rpa => "RPA raporlarını",
    };
    format!("{subject} yüklerken hata oluştu.")
}

/// Records of one category plus the loading flag, active filter and a dismissible error.
#[derive(Debug)]
pub struct ReportView<T> {
    records: Vec<T>,
    filter: Filter,
    loading: bool,
    error: Option<String>,
    guard: RequestGuard,
}

impl<T: Record> Default for ReportView<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            filter: Filter::new(),
            loading: false,
            error: None,
            guard: RequestGuard::new(),
        }
    }
}

impl<T: Record> ReportView<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Records narrowed by the active filter.
    pub fn visible(&self) -> Vec<T> {
        self.filter.apply(&self.records)
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut Filter {
        &mut self.filter
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Start a fetch. The returned ticket must accompany its result.
    pub fn begin(&mut self) -> Ticket {
        self.loading = true;
        self.guard.issue()
    }

    /// Publish a fetch result. Returns false when a newer fetch superseded it.
    pub fn finish(&mut self, ticket: Ticket, result: Result<Vec<T>>) -> bool {
        if !self.guard.is_current(ticket) {
            tracing::debug!(
                collection = T::KIND.collection().name(),
                "discarding stale fetch result"
            );
            return false;
        }
        self.loading = false;
        match result {
            Ok(records) => {
                self.records = records;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(collection = T::KIND.collection().name(), error = %e, "fetch failed");
                self.records = Vec::new();
                self.error = Some(load_error_message(T::KIND));
            }
        }
        true
    }

    pub fn reload(&mut self, store: &dyn DocumentStore) {
        let ticket = self.begin();
        let result = fetch_records::<T>(store);
        self.finish(ticket, result);
    }

    /// Patch one loaded record in place after its write was confirmed.
    pub fn replace(&mut self, record: T) {
        let id = record.meta().id.clone();
        let mut records = self.records.clone();
        if let Some(slot) = records.iter_mut().find(|r| r.meta().id == id) {
            *slot = record;
        }
        self.records = records;
    }

    pub fn remove(&mut self, id: &str) {
        self.records = self
            .records
            .iter()
            .filter(|r| r.meta().id != id)
            .cloned()
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::filter::Selector;
    use crate::models::{CimerReport, RecordMeta};

    fn cimer(id: &str, month: &str) -> CimerReport {
        CimerReport {
            meta: RecordMeta {
                id: id.to_string(),
                month: month.to_string(),
                ..Default::default()
            },
            applications: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_guard_only_latest_is_current() {
        let guard = RequestGuard::new();
        let first = guard.issue();
        let second = guard.issue();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
    }

    #[test]
    fn test_slow_stale_fetch_does_not_overwrite_newer_result() {
        let mut view: ReportView<CimerReport> = ReportView::new();
        let all_years = view.begin();
        let only_2024 = view.begin();
        assert!(view.finish(only_2024, Ok(vec![cimer("b", "2024-05")])));
        assert!(!view.finish(all_years, Ok(vec![cimer("a", "2023-01"), cimer("b", "2024-05")])));
        assert_eq!(view.records().len(), 1);
        assert_eq!(view.records()[0].meta.id, "b");
        assert!(!view.is_loading());
    }

    #[test]
    fn test_loading_flag_spans_fetch() {
        let mut view: ReportView<CimerReport> = ReportView::new();
        assert!(!view.is_loading());
        let t = view.begin();
        assert!(view.is_loading());
        view.finish(t, Ok(Vec::new()));
        assert!(!view.is_loading());
    }

    #[test]
    fn test_failed_fetch_empties_records_and_sets_dismissible_error() {
        let mut view: ReportView<CimerReport> = ReportView::new();
        let t = view.begin();
        view.finish(t, Ok(vec![cimer("a", "2025-01")]));
        let t = view.begin();
        view.finish(t, Err(ReportError::Other("permission denied".into())));
        assert!(view.records().is_empty());
        assert_eq!(view.error(), Some("CİMER raporlarını yüklerken hata oluştu."));
        view.dismiss_error();
        assert_eq!(view.error(), None);
    }

    #[test]
    fn test_visible_applies_filter() {
        let mut view: ReportView<CimerReport> = ReportView::new();
        let t = view.begin();
        view.finish(t, Ok(vec![cimer("a", "2025-01"), cimer("b", "2024-05")]));
        view.filter_mut().set_year(Selector::parse("2024"));
        let visible = view.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].meta.id, "b");
    }

    #[test]
    fn test_local_patch_and_remove() {
        let mut view: ReportView<CimerReport> = ReportView::new();
        let t = view.begin();
        view.finish(t, Ok(vec![cimer("a", "2025-01"), cimer("b", "2025-02")]));
        let mut edited = cimer("a", "2025-01");
        edited.applications = 99;
        view.replace(edited);
        assert_eq!(view.records()[0].applications, 99);
        view.remove("b");
        assert_eq!(view.records().len(), 1);
    }
}
