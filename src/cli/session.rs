use colored::Colorize;
use zeroize::Zeroize;

use super::{read_confirmation, read_password, Context, PASSWORD_ENV};
use crate::account::{self, current_user};
use crate::auth::{Identity, IdentityProvider};
use crate::error::Result;
use crate::models::User;

fn log_session_change(identity: Option<&Identity>) {
    match identity {
        Some(id) => tracing::debug!(uid = %id.uid, "session opened"),
        None => tracing::debug!("session closed"),
    }
}

fn status_label(user: &User) -> colored::ColoredString {
    if user.is_approved {
        "onaylı".green()
    } else {
        "onay bekliyor".yellow()
    }
}

pub fn register(email: &str) -> Result<()> {
    let ctx = Context::open()?;
    let auth = ctx.identity();
    auth.observe(Box::new(log_session_change));

    let mut password = read_password("Şifre: ", PASSWORD_ENV)?;
    let mut confirm = read_confirmation(&password)?;
    let result = account::register(&ctx.store, &auth, email, &password, &confirm);
    password.zeroize();
    confirm.zeroize();
    let user = result?;

    println!("Hesap oluşturuldu: {}", user.email);
    println!("Durum: {}", status_label(&user));
    if !user.is_approved {
        println!("Rapor girebilmek için bir yöneticinin hesabınızı onaylaması gerekiyor.");
    }
    Ok(())
}

pub fn login(email: &str) -> Result<()> {
    let ctx = Context::open()?;
    let auth = ctx.identity();
    auth.observe(Box::new(log_session_change));

    let mut password = read_password("Şifre: ", PASSWORD_ENV)?;
    let result = account::sign_in(&ctx.store, &auth, email, &password);
    password.zeroize();
    let user = result?;

    println!("Giriş yapıldı: {} ({})", user.email, user.role.as_str());
    if !user.is_approved {
        println!("{}", "Hesabınız henüz onaylanmamış. Admin onayını bekleyin.".yellow());
    }
    Ok(())
}

pub fn logout() -> Result<()> {
    let ctx = Context::open()?;
    let auth = ctx.identity();
    auth.observe(Box::new(log_session_change));
    auth.sign_out()?;
    println!("Çıkış yapıldı.");
    Ok(())
}

pub fn whoami() -> Result<()> {
    let ctx = Context::open()?;
    match current_user(&ctx.store, &ctx.identity())? {
        Some(user) => {
            println!("Email:      {}", user.email);
            println!("UID:        {}", user.uid);
            println!("Rol:        {}", user.role.as_str());
            println!("Durum:      {}", status_label(&user));
            println!("Kurum:      {}", ctx.settings.organization);
        }
        None => println!("Oturum açık değil."),
    }
    Ok(())
}
