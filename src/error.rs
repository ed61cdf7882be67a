use thiserror::Error;

use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Validation(String),

    #[error("Kayıt bulunamadı: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("{format} oluşturma hatası: {message}")]
    Export { format: &'static str, message: String },

    #[error("Hesabınız henüz onaylanmamış. Admin onayını bekleyin.")]
    PendingApproval,

    #[error("Bu işlem için yetkiniz yok.")]
    Forbidden,

    #[error("Oturum açık değil. Önce `raporlama login` ile giriş yapın.")]
    NotSignedIn,

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl ReportError {
    pub fn csv_export(message: impl Into<String>) -> Self {
        ReportError::Export { format: "CSV", message: message.into() }
    }

    pub fn pdf_export(message: impl Into<String>) -> Self {
        ReportError::Export { format: "PDF", message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
