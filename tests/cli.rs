use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
        }
    }

    fn data_dir(&self) -> PathBuf {
        self.home.path().join("data")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("raporlama").unwrap();
        cmd.env("HOME", self.home.path())
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .env_remove("RAPORLAMA_PASSWORD_CONFIRM")
            .env("RAPORLAMA_PASSWORD", "gizli123");
        cmd
    }

    fn init(&self) {
        self.cmd()
            .args(["init", "--data-dir"])
            .arg(self.data_dir())
            .assert()
            .success()
            .stdout(predicate::str::contains("Database:"));
    }

    fn register(&self, email: &str) {
        self.cmd()
            .args(["register", email])
            .assert()
            .success()
            .stdout(predicate::str::contains("onay bekliyor"));
    }

    fn db(&self) -> rusqlite::Connection {
        rusqlite::Connection::open(self.data_dir().join("raporlama.db")).unwrap()
    }

    fn uid(&self, email: &str) -> String {
        self.db()
            .query_row("SELECT uid FROM credentials WHERE email = ?1", [email], |r| r.get(0))
            .unwrap()
    }

    /// Role elevation has no command; it is done directly in the database.
    fn promote(&self, email: &str) {
        let uid = self.uid(email);
        self.db()
            .execute(
                "UPDATE documents SET data = json_set(data, '$.role', 'admin', '$.isApproved', json('true')) \
                 WHERE collection = 'users' AND id = ?1",
                [uid],
            )
            .unwrap();
    }

    fn write_json(&self, name: &str, body: &str) -> PathBuf {
        let path = self.home.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("raporlama")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("submit"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("users"));
}

#[test]
fn test_commands_before_init_point_to_init() {
    let sb = Sandbox::new();
    sb.cmd()
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("raporlama init"));
}

#[test]
fn test_unknown_kind_is_rejected_by_parser() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["mine", "press"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("press"));
}

#[test]
fn test_signed_out_user_is_told_to_log_in() {
    let sb = Sandbox::new();
    sb.init();
    sb.cmd()
        .args(["mine", "cimer"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("raporlama login"));
}

#[test]
fn test_registration_rejects_mismatched_passwords() {
    let sb = Sandbox::new();
    sb.init();
    sb.cmd()
        .env("RAPORLAMA_PASSWORD_CONFIRM", "baska123")
        .args(["register", "personel@kurum.gov.tr"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Şifreler eşleşmiyor"));
}

#[test]
fn test_new_account_waits_for_approval() {
    let sb = Sandbox::new();
    sb.init();
    sb.register("personel@kurum.gov.tr");

    sb.cmd()
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("staff"))
        .stdout(predicate::str::contains("onay bekliyor"));

    let body = sb.write_json("cimer.json", r#"{"month": "2025-01", "applications": 10}"#);
    sb.cmd()
        .args(["submit", "cimer"])
        .arg(&body)
        .assert()
        .failure()
        .stderr(predicate::str::contains("onaylanmamış"));
}

#[test]
fn test_wrong_password_is_rejected() {
    let sb = Sandbox::new();
    sb.init();
    sb.register("personel@kurum.gov.tr");
    sb.cmd().arg("logout").assert().success();
    sb.cmd()
        .env("RAPORLAMA_PASSWORD", "yanlis99")
        .args(["login", "personel@kurum.gov.tr"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Yanlış şifre"));
}

#[test]
fn test_csv_export_with_no_records_writes_header_only() {
    let sb = Sandbox::new();
    sb.init();
    sb.register("admin@kurum.gov.tr");
    sb.promote("admin@kurum.gov.tr");

    let out = sb.home.path().join("cimer.csv");
    sb.cmd()
        .args(["export", "csv", "cimer", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));
    let csv = read(&out);
    assert_eq!(csv.lines().count(), 1);
    assert!(csv.starts_with("Ay,Başvuru Sayısı"));
}

#[test]
fn test_admin_approves_staff_who_can_then_submit() {
    let sb = Sandbox::new();
    sb.init();
    sb.register("admin@kurum.gov.tr");
    sb.promote("admin@kurum.gov.tr");
    sb.register("personel@kurum.gov.tr");
    let staff_uid = sb.uid("personel@kurum.gov.tr");

    // staff cannot reach admin commands
    sb.cmd().args(["users", "list"]).assert().failure();

    sb.cmd().args(["login", "admin@kurum.gov.tr"]).assert().success();
    sb.cmd()
        .args(["users", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("personel@kurum.gov.tr"))
        .stdout(predicate::str::contains("Bekliyor"));
    sb.cmd()
        .args(["users", "approve", &staff_uid])
        .assert()
        .success()
        .stdout(predicate::str::contains("Onaylandı"));

    sb.cmd().args(["login", "personel@kurum.gov.tr"]).assert().success();
    let body = sb.write_json(
        "cimer.json",
        r#"{"month": "2025-01", "applications": 100, "processedApplications": 90,
            "topDepartments": [{"name": "Bilgi İşlem", "rate": 40}]}"#,
    );
    sb.cmd()
        .args(["submit", "cimer"])
        .arg(&body)
        .assert()
        .success()
        .stdout(predicate::str::contains("kaydedildi"));
    sb.cmd()
        .args(["mine", "cimer"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ocak 2025"));

    sb.cmd().args(["login", "admin@kurum.gov.tr"]).assert().success();
    sb.cmd()
        .args(["report", "cimer", "--year", "2025"])
        .assert()
        .success()
        .stdout(predicate::str::contains("%90,0"))
        .stdout(predicate::str::contains("Bilgi İşlem"));

    let out = sb.home.path().join("all.csv");
    sb.cmd()
        .args(["export", "csv", "all", "--output"])
        .arg(&out)
        .assert()
        .success();
    let csv = read(&out);
    assert!(csv.starts_with("CİMER Raporları\n"));
    assert!(csv.contains("Ocak 2025,100,90,\"%90,0\""));
}

#[test]
fn test_invalid_rpa_submission_is_refused() {
    let sb = Sandbox::new();
    sb.init();
    sb.register("admin@kurum.gov.tr");
    sb.promote("admin@kurum.gov.tr");
    let body = sb.write_json("rpa.json", r#"{"month": "2025-02", "incomingEmails": 5, "sentEmails": 8}"#);
    sb.cmd()
        .args(["submit", "rpa"])
        .arg(&body)
        .assert()
        .failure()
        .stderr(predicate::str::contains("fazla olamaz"));
}

#[test]
fn test_print_document_is_written_without_opening() {
    let sb = Sandbox::new();
    sb.init();
    sb.register("admin@kurum.gov.tr");
    sb.promote("admin@kurum.gov.tr");
    sb.cmd()
        .args(["export", "print", "rpa"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RPA_Raporlari_all.html"));
    let html = read(&sb.data_dir().join("exports").join("RPA_Raporlari_all.html"));
    assert!(html.contains("Rapor Tarihi"));
}

#[test]
fn test_print_open_failure_reports_blocked_popup() {
    let sb = Sandbox::new();
    sb.init();
    sb.register("admin@kurum.gov.tr");
    sb.promote("admin@kurum.gov.tr");
    sb.cmd()
        .env("RAPORLAMA_BROWSER", "/nonexistent/browser")
        .args(["export", "print", "cimer", "--open"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Pop-up engellenmiş"));
}

#[test]
fn test_malformed_year_never_reaches_export_path() {
    let sb = Sandbox::new();
    sb.init();
    sb.register("admin@kurum.gov.tr");
    sb.promote("admin@kurum.gov.tr");
    sb.cmd()
        .args(["export", "csv", "cimer", "--year", "../../20 25"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected YYYY"));
    assert!(!sb.home.path().join("20 25.csv").exists());
}
