//! Account gate: who is signed in, and what they may reach.

use serde_json::json;

use crate::auth::{Identity, IdentityProvider};
use crate::error::{ReportError, Result};
use crate::models::{Collection, Role, User};
use crate::store::{get_user, put_user, DocumentStore};
use crate::validation::validate_registration;

/// How a screen or command is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Login and registration. Approved users have no business here.
    Public,
    /// Report entry and personal history.
    Protected,
    /// Account approval, category reports, overview.
    AdminOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    Allow,
    RedirectLogin,
    PendingApproval,
    RedirectDashboard,
}

pub fn decide(user: Option<&User>, route: Route) -> Access {
    match (route, user) {
        (Route::Public, Some(u)) if u.is_approved => Access::RedirectDashboard,
        (Route::Public, _) => Access::Allow,
        (_, None) => Access::RedirectLogin,
        (_, Some(u)) if !u.is_approved => Access::PendingApproval,
        (Route::AdminOnly, Some(u)) if !u.is_admin() => Access::RedirectDashboard,
        _ => Access::Allow,
    }
}

/// Load the account record for a signed-in identity.
///
/// A missing record is created as unapproved staff. If the store cannot be
/// read the same unapproved profile is returned without being saved.
pub fn resolve_user(store: &dyn DocumentStore, identity: &Identity) -> User {
    match get_user(store, &identity.uid) {
        Ok(Some(user)) => user,
        Ok(None) => {
            let user = User::registered(&identity.uid, &identity.email);
            if let Err(e) = put_user(store, &user) {
                tracing::warn!(uid = %identity.uid, error = %e, "could not create user record");
            }
            user
        }
        Err(e) => {
            tracing::warn!(uid = %identity.uid, error = %e, "user lookup failed, using fallback profile");
            User::registered(&identity.uid, &identity.email)
        }
    }
}

pub fn current_user(store: &dyn DocumentStore, auth: &dyn IdentityProvider) -> Result<Option<User>> {
    Ok(auth
        .current_session()?
        .map(|identity| resolve_user(store, &identity)))
}

/// The signed-in user, if the route lets them through.
pub fn require(store: &dyn DocumentStore, auth: &dyn IdentityProvider, route: Route) -> Result<User> {
    let user = current_user(store, auth)?;
    match decide(user.as_ref(), route) {
        Access::Allow => user.ok_or(ReportError::NotSignedIn),
        Access::RedirectLogin => Err(ReportError::NotSignedIn),
        Access::PendingApproval => Err(ReportError::PendingApproval),
        Access::RedirectDashboard => Err(ReportError::Forbidden),
    }
}

/// Create the identity and its pending staff record.
pub fn register(
    store: &dyn DocumentStore,
    auth: &dyn IdentityProvider,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<User> {
    validate_registration(email, password, confirm)?;
    let identity = auth.sign_up(email, password)?;
    let user = User::registered(&identity.uid, &identity.email);
    put_user(store, &user)?;
    Ok(user)
}

pub fn sign_in(
    store: &dyn DocumentStore,
    auth: &dyn IdentityProvider,
    email: &str,
    password: &str,
) -> Result<User> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ReportError::Validation("Tüm alanları doldurun".to_string()));
    }
    let identity = auth.sign_in(email, password)?;
    Ok(resolve_user(store, &identity))
}

/// Staff accounts, newest first. Matches on the decoded role so the legacy
/// `personel` spelling is listed too.
pub fn list_staff(store: &dyn DocumentStore) -> Result<Vec<User>> {
    let docs = store.query_all(Collection::Users)?;
    let mut users = Vec::new();
    for doc in docs {
        match serde_json::from_value::<User>(doc.data) {
            Ok(user) if user.role == Role::Staff => users.push(user),
            Ok(_) => {}
            Err(e) => tracing::warn!(collection = "users", id = %doc.id, error = %e, "skipping undecodable user"),
        }
    }
    Ok(users)
}

pub fn set_approval(store: &dyn DocumentStore, admin: &User, uid: &str, approved: bool) -> Result<()> {
    if !admin.is_admin() {
        return Err(ReportError::Forbidden);
    }
    store.update(Collection::Users, uid, json!({ "isApproved": approved }))?;
    tracing::info!(uid, approved, by = %admin.uid, "approval changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::LocalIdentity;
    use crate::store::tests::test_store;
    use crate::store::Document;
    use serde_json::Value;

    struct BrokenStore;

    impl DocumentStore for BrokenStore {
        fn insert(&self, _: Collection, _: Value) -> Result<String> {
            Err(ReportError::Other("offline".into()))
        }
        fn set(&self, _: Collection, _: &str, _: Value) -> Result<()> {
            Err(ReportError::Other("offline".into()))
        }
        fn get(&self, _: Collection, _: &str) -> Result<Option<Document>> {
            Err(ReportError::Other("offline".into()))
        }
        fn update(&self, _: Collection, _: &str, _: Value) -> Result<()> {
            Err(ReportError::Other("offline".into()))
        }
        fn delete(&self, _: Collection, _: &str) -> Result<()> {
            Err(ReportError::Other("offline".into()))
        }
        fn query_all(&self, _: Collection) -> Result<Vec<Document>> {
            Err(ReportError::Other("offline".into()))
        }
        fn query_eq(&self, _: Collection, _: &str, _: &Value) -> Result<Vec<Document>> {
            Err(ReportError::Other("offline".into()))
        }
    }

    fn user(role: Role, approved: bool) -> User {
        let mut u = User::registered("u1", "a@b.com");
        u.role = role;
        u.is_approved = approved;
        u
    }

    #[test]
    fn test_route_decisions() {
        assert_eq!(decide(None, Route::Protected), Access::RedirectLogin);
        assert_eq!(decide(None, Route::Public), Access::Allow);
        let pending = user(Role::Staff, false);
        assert_eq!(decide(Some(&pending), Route::Protected), Access::PendingApproval);
        assert_eq!(decide(Some(&pending), Route::AdminOnly), Access::PendingApproval);
        assert_eq!(decide(Some(&pending), Route::Public), Access::Allow);
        let staff = user(Role::Staff, true);
        assert_eq!(decide(Some(&staff), Route::Protected), Access::Allow);
        assert_eq!(decide(Some(&staff), Route::AdminOnly), Access::RedirectDashboard);
        assert_eq!(decide(Some(&staff), Route::Public), Access::RedirectDashboard);
        let admin = user(Role::Admin, true);
        assert_eq!(decide(Some(&admin), Route::AdminOnly), Access::Allow);
    }

    #[test]
    fn test_new_registration_waits_for_approval() {
        let (_dir, store) = test_store();
        let auth = LocalIdentity::new(store.conn());
        let created = register(&store, &auth, "yeni@kurum.gov.tr", "secret1", "secret1").unwrap();
        assert_eq!(created.role, Role::Staff);
        assert!(!created.is_approved);

        let err = require(&store, &auth, Route::Protected).unwrap_err();
        assert!(matches!(err, ReportError::PendingApproval));

        let mut admin = User::registered("admin-1", "admin@kurum.gov.tr");
        admin.role = Role::Admin;
        admin.is_approved = true;
        set_approval(&store, &admin, &created.uid, true).unwrap();

        let allowed = require(&store, &auth, Route::Protected).unwrap();
        assert_eq!(allowed.uid, created.uid);
        assert!(matches!(
            require(&store, &auth, Route::AdminOnly),
            Err(ReportError::Forbidden)
        ));
    }

    #[test]
    fn test_registration_validation_happens_before_sign_up() {
        let (_dir, store) = test_store();
        let auth = LocalIdentity::new(store.conn());
        assert!(register(&store, &auth, "a@b.com", "secret1", "secret2").is_err());
        assert_eq!(auth.current_session().unwrap(), None);
    }

    #[test]
    fn test_signed_out_is_sent_to_login() {
        let (_dir, store) = test_store();
        let auth = LocalIdentity::new(store.conn());
        assert!(matches!(
            require(&store, &auth, Route::Protected),
            Err(ReportError::NotSignedIn)
        ));
    }

    #[test]
    fn test_missing_user_record_is_created() {
        let (_dir, store) = test_store();
        let identity = Identity { uid: "u9".into(), email: "u9@b.com".into() };
        let user = resolve_user(&store, &identity);
        assert!(!user.is_approved);
        assert!(get_user(&store, "u9").unwrap().is_some());
    }

    #[test]
    fn test_store_failure_falls_back_to_pending_staff() {
        let identity = Identity { uid: "u9".into(), email: "u9@b.com".into() };
        let user = resolve_user(&BrokenStore, &identity);
        assert_eq!(user.role, Role::Staff);
        assert!(!user.is_approved);
        assert_eq!(user.email, "u9@b.com");
    }

    #[test]
    fn test_only_admins_change_approval() {
        let (_dir, store) = test_store();
        put_user(&store, &User::registered("u2", "b@b.com")).unwrap();
        let staff = user(Role::Staff, true);
        assert!(matches!(
            set_approval(&store, &staff, "u2", true),
            Err(ReportError::Forbidden)
        ));
        let staff_list = list_staff(&store).unwrap();
        assert_eq!(staff_list.len(), 1);
        assert!(!staff_list[0].is_approved);
    }

    #[test]
    fn test_staff_list_includes_legacy_role_and_skips_admins() {
        let (_dir, store) = test_store();
        store
            .set(
                Collection::Users,
                "old",
                json!({"uid": "old", "email": "old@kurum.gov.tr", "role": "personel", "isApproved": false}),
            )
            .unwrap();
        put_user(&store, &User::registered("new", "new@kurum.gov.tr")).unwrap();
        let mut admin = User::registered("boss", "boss@kurum.gov.tr");
        admin.role = Role::Admin;
        put_user(&store, &admin).unwrap();

        let mut uids: Vec<String> = list_staff(&store).unwrap().into_iter().map(|u| u.uid).collect();
        uids.sort();
        assert_eq!(uids, vec!["new", "old"]);
    }
}
