use rusqlite::Connection;
use uniact_core::{
    AccountService, AccountStatus, AuditRecorder, AuditRepository, AuthError, PlainTextVerifier,
    ServiceError, SqliteAuditRepository, SqliteUserRepository, TokenAuthority, UserRepository,
    ValidationError,
};

const SECRET: &[u8] = b"account-flows-secret";

fn account_service(
    conn: &Connection,
) -> AccountService<SqliteUserRepository<'_>, SqliteAuditRepository<'_>, PlainTextVerifier> {
    AccountService::new(
        SqliteUserRepository::new(conn),
        AuditRecorder::new(SqliteAuditRepository::new(conn)),
        PlainTextVerifier,
        TokenAuthority::new(SECRET.to_vec()),
    )
}

#[test]
fn register_normalizes_email_and_rejects_case_insensitive_duplicates() {
    let conn = uniact_core::db::open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let user = service
        .register("Kim@Uni.EDU", "pw-one", "student")
        .unwrap();
    assert_eq!(user.email, "kim@uni.edu");

    let err = service
        .register("kim@uni.edu", "pw-two", "student")
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateEmail { .. }));
}

#[test]
fn register_rejects_malformed_email_before_any_write() {
    let conn = uniact_core::db::open_db_in_memory().unwrap();
    let service = account_service(&conn);

    let err = service
        .register("not-an-email", "pw", "student")
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = service.register("kim@uni.edu", "pw", "dean").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::UnknownRole(_))
    ));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn login_issues_a_verifiable_token() {
    let conn = uniact_core::db::open_db_in_memory().unwrap();
    let service = account_service(&conn);
    service.register("kim@uni.edu", "pw", "student").unwrap();

    let outcome = service.login("kim@uni.edu", "pw").unwrap();

    let repo = SqliteUserRepository::new(&conn);
    let verified = TokenAuthority::new(SECRET.to_vec())
        .verify(&outcome.token, &repo)
        .unwrap();
    assert_eq!(verified.uuid, outcome.user.uuid);
}

#[test]
fn failed_logins_are_indistinct_and_audited() {
    let conn = uniact_core::db::open_db_in_memory().unwrap();
    let service = account_service(&conn);
    service.register("kim@uni.edu", "pw", "student").unwrap();

    for (email, password) in [("kim@uni.edu", "wrong"), ("nobody@uni.edu", "pw")] {
        let err = service.login(email, password).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Auth(AuthError::InvalidCredentials)
        ));
    }

    let audit = SqliteAuditRepository::new(&conn);
    let failures = audit
        .list_recent(10)
        .unwrap()
        .into_iter()
        .filter(|entry| entry.action == "LOGIN_FAILURE")
        .count();
    assert_eq!(failures, 2);
}

#[test]
fn inactive_accounts_cannot_login() {
    let conn = uniact_core::db::open_db_in_memory().unwrap();
    let service = account_service(&conn);
    let user = service.register("kim@uni.edu", "pw", "student").unwrap();

    SqliteUserRepository::new(&conn)
        .set_account_status(user.uuid, AccountStatus::Inactive)
        .unwrap();

    let err = service.login("kim@uni.edu", "pw").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Auth(AuthError::IdentityInactive)
    ));
}

#[test]
fn change_password_revokes_outstanding_tokens() {
    let conn = uniact_core::db::open_db_in_memory().unwrap();
    let service = account_service(&conn);
    let user = service.register("kim@uni.edu", "pw", "student").unwrap();

    let outcome = service.login("kim@uni.edu", "pw").unwrap();

    let epoch = service
        .change_password(user.uuid, "pw", "pw-rotated", &outcome.user)
        .unwrap();
    assert_eq!(epoch, 1);

    let repo = SqliteUserRepository::new(&conn);
    let err = TokenAuthority::new(SECRET.to_vec())
        .verify(&outcome.token, &repo)
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenRevoked));

    // The new password works and mints a fresh, valid token.
    let fresh = service.login("kim@uni.edu", "pw-rotated").unwrap();
    TokenAuthority::new(SECRET.to_vec())
        .verify(&fresh.token, &repo)
        .unwrap();
}

#[test]
fn change_password_checks_actor_rights_and_current_password() {
    let conn = uniact_core::db::open_db_in_memory().unwrap();
    let service = account_service(&conn);
    let user = service.register("kim@uni.edu", "pw", "student").unwrap();
    let rival = service
        .register("rival@uni.edu", "pw", "student")
        .unwrap();
    let admin = service
        .register("admin@uni.edu", "pw", "admin")
        .unwrap();

    assert!(matches!(
        service
            .change_password(user.uuid, "pw", "stolen", &rival)
            .unwrap_err(),
        ServiceError::Policy(_)
    ));
    assert!(matches!(
        service
            .change_password(user.uuid, "guessed-wrong", "stolen", &user)
            .unwrap_err(),
        ServiceError::Auth(AuthError::InvalidCredentials)
    ));

    // Admin resets without presenting the current password.
    let epoch = service
        .change_password(user.uuid, "", "reset-by-admin", &admin)
        .unwrap();
    assert_eq!(epoch, 1);
}

#[test]
fn account_status_toggle_is_admin_only() {
    let conn = uniact_core::db::open_db_in_memory().unwrap();
    let service = account_service(&conn);
    let user = service.register("kim@uni.edu", "pw", "student").unwrap();
    let admin = service
        .register("admin@uni.edu", "pw", "admin")
        .unwrap();

    assert!(matches!(
        service
            .set_account_status(user.uuid, AccountStatus::Inactive, &user)
            .unwrap_err(),
        ServiceError::Policy(_)
    ));

    service
        .set_account_status(user.uuid, AccountStatus::Inactive, &admin)
        .unwrap();
    let stored = SqliteUserRepository::new(&conn)
        .get_user(user.uuid)
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, AccountStatus::Inactive);
}
