use std::path::Path;

use chrono::Utc;
use comfy_table::{Cell, Table};
use serde_json::{Map, Value};

use super::Context;
use crate::account::Route;
use crate::error::{ReportError, Result};
use crate::export::Sheet;
use crate::models::{
    CimerReport, NewsReport, Record, ReportKind, RpaReport, SocialMediaReport, User,
    WebAnalyticsReport,
};
use crate::store::{fetch_owned, insert_record, DocumentStore};
use crate::validation::{prepare, Validate};

/// Fields the submitter never controls.
const SERVER_FIELDS: [&str; 4] = ["id", "userId", "createdAt", "updatedAt"];

fn read_body(file: &str) -> Result<Map<String, Value>> {
    let content = std::fs::read_to_string(Path::new(file))?;
    match serde_json::from_str(&content)? {
        Value::Object(map) => Ok(map),
        _ => Err(ReportError::Validation(
            "Rapor dosyası bir JSON nesnesi olmalıdır".to_string(),
        )),
    }
}

fn strip_server_fields(map: &mut Map<String, Value>) {
    for key in SERVER_FIELDS {
        map.remove(key);
    }
}

fn decode_draft<T: Record>(map: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(map))
        .map_err(|e| ReportError::Validation(format!("Geçersiz rapor verisi: {e}")))
}

fn may_modify(user: &User, owner: &str) -> bool {
    user.is_admin() || user.uid == owner
}

/// Validate and store a new report owned by `user`.
pub fn create<T: Record + Validate>(
    store: &dyn DocumentStore,
    user: &User,
    mut body: Map<String, Value>,
) -> Result<String> {
    strip_server_fields(&mut body);
    let mut record: T = decode_draft(body)?;
    prepare(&mut record)?;
    let meta = record.meta_mut();
    meta.user_id = user.uid.clone();
    meta.created_at = Some(Utc::now());
    let id = insert_record(store, &record)?;
    tracing::info!(kind = T::KIND.slug(), id = %id, month = %record.meta().month, "report submitted");
    Ok(id)
}

/// Merge `patch` into a stored report and validate the result before writing.
///
/// The stored document is replaced as a whole, keeping its original `createdAt`,
/// so legacy field names never sit next to their canonical form and a `null`
/// in the patch clears the field.
pub fn edit<T: Record + Validate>(
    store: &dyn DocumentStore,
    user: &User,
    id: &str,
    mut patch: Map<String, Value>,
) -> Result<T> {
    let collection = T::KIND.collection();
    let doc = store.get(collection, id)?.ok_or_else(|| ReportError::NotFound {
        collection: collection.name().to_string(),
        id: id.to_string(),
    })?;
    let owner = doc.data.get("userId").and_then(Value::as_str).unwrap_or_default();
    if !may_modify(user, owner) {
        return Err(ReportError::Forbidden);
    }
    strip_server_fields(&mut patch);
    // a changed month means the stored year is stale
    if patch.contains_key("month") && !patch.contains_key("year") {
        patch.insert("year".to_string(), Value::Null);
    }

    let created_at = doc.data.get("createdAt").cloned();
    // canonical field names first, falling back to the raw body when it no longer decodes
    let mut merged = match doc.decode::<T>().map(|current| serde_json::to_value(&current)) {
        Ok(Ok(Value::Object(map))) => map,
        _ => match doc.data {
            Value::Object(map) => map,
            _ => Map::new(),
        },
    };
    merged.extend(patch);
    merged.retain(|_, v| !v.is_null());
    let mut record: T = decode_draft(merged)?;
    prepare(&mut record)?;
    record.meta_mut().updated_at = Some(Utc::now());

    let mut data = serde_json::to_value(&record)?;
    if let (Value::Object(map), Some(created)) = (&mut data, created_at) {
        map.insert("createdAt".to_string(), created);
    }
    store.set(collection, id, data)?;
    record.meta_mut().id = id.to_string();
    tracing::info!(kind = T::KIND.slug(), id, by = %user.uid, "report updated");
    Ok(record)
}

/// Permanently delete a report. Owners and admins only.
pub fn remove(store: &dyn DocumentStore, user: &User, kind: ReportKind, id: &str) -> Result<()> {
    let collection = kind.collection();
    let doc = store.get(collection, id)?.ok_or_else(|| ReportError::NotFound {
        collection: collection.name().to_string(),
        id: id.to_string(),
    })?;
    let owner = doc.data.get("userId").and_then(Value::as_str).unwrap_or_default();
    if !may_modify(user, owner) {
        return Err(ReportError::Forbidden);
    }
    store.delete(collection, id)?;
    tracing::info!(kind = kind.slug(), id, by = %user.uid, "report deleted");
    Ok(())
}

fn owned_table<T: Sheet>(store: &dyn DocumentStore, user: &User) -> Result<(usize, Table)> {
    let records: Vec<T> = fetch_owned(store, &user.uid)?;
    let mut table = Table::new();
    let mut header = vec!["ID"];
    header.extend_from_slice(T::headers());
    table.set_header(header);
    for record in &records {
        let mut row = vec![Cell::new(&record.meta().id)];
        row.extend(record.row().into_iter().map(Cell::new));
        table.add_row(row);
    }
    Ok((records.len(), table))
}

pub fn submit(kind: ReportKind, file: &str) -> Result<()> {
    let ctx = Context::open()?;
    let user = ctx.require(Route::Protected)?;
    let body = read_body(file)?;
    let id = match kind {
        ReportKind::News => create::<NewsReport>(&ctx.store, &user, body)?,
        ReportKind::SocialMedia => create::<SocialMediaReport>(&ctx.store, &user, body)?,
        ReportKind::WebAnalytics => create::<WebAnalyticsReport>(&ctx.store, &user, body)?,
        ReportKind::Cimer => create::<CimerReport>(&ctx.store, &user, body)?,
        ReportKind::Rpa => create::<RpaReport>(&ctx.store, &user, body)?,
    };
    println!("{} kaydedildi: {id}", kind.label());
    Ok(())
}

pub fn update(kind: ReportKind, id: &str, file: &str) -> Result<()> {
    let ctx = Context::open()?;
    let user = ctx.require(Route::Protected)?;
    let patch = read_body(file)?;
    let month = match kind {
        ReportKind::News => edit::<NewsReport>(&ctx.store, &user, id, patch)?.meta.month,
        ReportKind::SocialMedia => edit::<SocialMediaReport>(&ctx.store, &user, id, patch)?.meta.month,
        ReportKind::WebAnalytics => edit::<WebAnalyticsReport>(&ctx.store, &user, id, patch)?.meta.month,
        ReportKind::Cimer => edit::<CimerReport>(&ctx.store, &user, id, patch)?.meta.month,
        ReportKind::Rpa => edit::<RpaReport>(&ctx.store, &user, id, patch)?.meta.month,
    };
    println!("{} güncellendi: {id} ({month})", kind.label());
    Ok(())
}

pub fn delete(kind: ReportKind, id: &str) -> Result<()> {
    let ctx = Context::open()?;
    let user = ctx.require(Route::Protected)?;
    remove(&ctx.store, &user, kind, id)?;
    println!("{} silindi: {id}", kind.label());
    Ok(())
}

pub fn mine(kind: ReportKind) -> Result<()> {
    let ctx = Context::open()?;
    let user = ctx.require(Route::Protected)?;
    let (count, table) = match kind {
        ReportKind::News => owned_table::<NewsReport>(&ctx.store, &user)?,
        ReportKind::SocialMedia => owned_table::<SocialMediaReport>(&ctx.store, &user)?,
        ReportKind::WebAnalytics => owned_table::<WebAnalyticsReport>(&ctx.store, &user)?,
        ReportKind::Cimer => owned_table::<CimerReport>(&ctx.store, &user)?,
        ReportKind::Rpa => owned_table::<RpaReport>(&ctx.store, &user)?,
    };
    if count == 0 {
        println!("Henüz {} kaydınız yok.", kind.label());
        return Ok(());
    }
    println!("{} ({count})\n{table}", kind.title());
    Ok(())
}
