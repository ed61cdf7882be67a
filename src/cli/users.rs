use colored::Colorize;
use comfy_table::{Cell, Table};

use super::Context;
use crate::account::{list_staff, set_approval, Route};
use crate::error::{ReportError, Result};
use crate::store::get_user;

pub fn list() -> Result<()> {
    let ctx = Context::open()?;
    ctx.require(Route::AdminOnly)?;
    let users = list_staff(&ctx.store)?;
    if users.is_empty() {
        println!("Kayıtlı personel yok.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["UID", "Email", "Kayıt Tarihi", "Durum"]);
    for user in &users {
        let status = if user.is_approved {
            "Onaylı".green()
        } else {
            "Bekliyor".yellow()
        };
        table.add_row(vec![
            Cell::new(&user.uid),
            Cell::new(&user.email),
            Cell::new(
                user.created_at
                    .map(|t| t.format("%d.%m.%Y").to_string())
                    .unwrap_or_default(),
            ),
            Cell::new(status),
        ]);
    }
    println!("Personel\n{table}");
    Ok(())
}

fn change(uid: &str, approved: bool) -> Result<()> {
    let ctx = Context::open()?;
    let admin = ctx.require(Route::AdminOnly)?;
    let user = get_user(&ctx.store, uid)?.ok_or_else(|| ReportError::NotFound {
        collection: "users".to_string(),
        id: uid.to_string(),
    })?;
    set_approval(&ctx.store, &admin, uid, approved)?;
    if approved {
        println!("Onaylandı: {}", user.email);
    } else {
        println!("Onay kaldırıldı: {}", user.email);
    }
    Ok(())
}

pub fn approve(uid: &str) -> Result<()> {
    change(uid, true)
}

pub fn revoke(uid: &str) -> Result<()> {
    change(uid, false)
}
