//! Print-ready HTML: title, timestamp, captured chart markup and the data table.
//!
//! PDF bytes are never produced here. The document opens in a browser whose
//! print dialog does the rest.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Local};

use crate::error::{ReportError, Result};
use crate::export::{write_file, Section};

pub const POPUP_BLOCKED: &str = "Pop-up engellenmiş. Lütfen pop-up'ları açın.";

const PRINT_CSS: &str = "
@page { size: A4; margin: 2cm; }
body { font-family: Arial, sans-serif; line-height: 1.6; }
.header { text-align: center; margin-bottom: 30px; }
.date { font-size: 14px; color: #666; }
.chart-container { margin: 30px 0; text-align: center; max-width: 100%; page-break-inside: avoid; break-inside: avoid; }
.chart-container svg, .chart-container img { max-width: 100% !important; height: auto !important; }
table { width: 100%; border-collapse: collapse; margin: 20px 0; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f8f9fa; font-weight: bold; }
h1 { color: #333; margin-bottom: 10px; }
h2 { color: #555; margin: 30px 0 15px 0; }
@media print {
  body { font-size: 12px; color: #000; }
  .no-print { display: none !important; }
  th, td { border: 1px solid #000; }
  h1 { font-size: 24px; }
  h2 { font-size: 18px; }
}
";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Already-rendered chart markup, looked up by container id.
pub trait ChartSource {
    fn capture(&self, id: &str) -> Option<String>;
}

/// Charts saved as `<id>.svg` or `<id>.html` in one directory.
pub struct ChartDir {
    dir: PathBuf,
}

impl ChartDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ChartSource for ChartDir {
    fn capture(&self, id: &str) -> Option<String> {
        ["svg", "html"].iter().find_map(|ext| {
            let path = self.dir.join(format!("{id}.{ext}"));
            match std::fs::read_to_string(&path) {
                Ok(markup) if !markup.trim().is_empty() => Some(markup),
                Ok(_) => None,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not read chart");
                    None
                }
            }
        })
    }
}

pub struct PrintDocument<'a> {
    pub title: String,
    pub subtitle: Option<String>,
    pub generated_at: DateTime<Local>,
    pub charts: Vec<String>,
    pub table: &'a Section,
}

impl<'a> PrintDocument<'a> {
    pub fn new(title: impl Into<String>, table: &'a Section) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            generated_at: Local::now(),
            charts: Vec::new(),
            table,
        }
    }

    /// Pull chart markup for the given container ids; missing charts are skipped.
    pub fn with_charts(mut self, source: &dyn ChartSource, ids: &[String]) -> Self {
        self.charts = ids.iter().filter_map(|id| source.capture(id)).collect();
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    fn render_table(&self, html: &mut String) {
        if self.table.is_empty() {
            html.push_str("<p>Seçilen dönem için kayıt bulunamadı.</p>\n");
            return;
        }
        html.push_str("<table>\n<thead><tr>");
        for h in &self.table.headers {
            html.push_str(&format!("<th>{}</th>", escape_html(h)));
        }
        html.push_str("</tr></thead>\n<tbody>\n");
        for row in &self.table.rows {
            html.push_str("<tr>");
            for cell in row {
                html.push_str(&format!("<td>{}</td>", escape_html(cell)));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n");
    }

    pub fn render(&self) -> String {
        let title = escape_html(&self.title);
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"tr\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{title}</title>\n<style>{PRINT_CSS}</style>\n</head>\n<body>\n"));
        html.push_str(&format!("<div class=\"header\">\n<h1>{title}</h1>\n"));
        if let Some(sub) = &self.subtitle {
            html.push_str(&format!("<p>{}</p>\n", escape_html(sub)));
        }
        html.push_str(&format!(
            "<p class=\"date\">Rapor Tarihi: {}</p>\n</div>\n",
            self.generated_at.format("%d.%m.%Y %H:%M")
        ));
        if !self.charts.is_empty() {
            html.push_str("<h2>Grafik Analizleri</h2>\n");
            for chart in &self.charts {
                html.push_str("<div class=\"chart-container\">\n");
                html.push_str(chart);
                html.push_str("\n</div>\n");
            }
        }
        html.push_str("<h2>Veri Tablosu</h2>\n");
        self.render_table(&mut html);
        html.push_str(
            "<script>\nwindow.onload = function () {\n  window.print();\n  window.onafterprint = function () { window.close(); };\n};\n</script>\n",
        );
        html.push_str("</body>\n</html>\n");
        html
    }
}

/// Somewhere a rendered document can be shown for printing.
pub trait PrintSurface {
    fn open(&self, path: &Path) -> Result<()>;
}

/// The desktop's default browser, or an explicit launcher command.
pub struct SystemBrowser {
    launcher: Option<String>,
}

impl SystemBrowser {
    pub fn new(launcher: Option<String>) -> Self {
        Self { launcher }
    }

    fn command(&self) -> Command {
        if let Some(launcher) = &self.launcher {
            return Command::new(launcher);
        }
        if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]);
            cmd
        } else {
            Command::new("xdg-open")
        }
    }
}

impl PrintSurface for SystemBrowser {
    fn open(&self, path: &Path) -> Result<()> {
        let status = self.command().arg(path).status();
        match status {
            Ok(s) if s.success() => Ok(()),
            Ok(s) => {
                tracing::warn!(status = %s, "browser launcher exited with failure");
                Err(ReportError::pdf_export(POPUP_BLOCKED))
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not start browser launcher");
                Err(ReportError::pdf_export(POPUP_BLOCKED))
            }
        }
    }
}

/// Write the document and, if a surface is given, open it there for printing.
pub fn print_document(
    doc: &PrintDocument<'_>,
    path: &Path,
    surface: Option<&dyn PrintSurface>,
) -> Result<PathBuf> {
    let written = write_file(path, &doc.render())
        .map_err(|e| ReportError::pdf_export(e.to_string()))?;
    if let Some(surface) = surface {
        surface.open(&written)?;
    }
    Ok(written)
}
