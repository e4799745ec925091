use uniact_core::db::open_db_in_memory;
use uniact_core::{
    AccountStatus, AuthError, Role, SqliteUserRepository, TokenAuthority, User, UserRepository,
};

const NOW: i64 = 1_750_000_000_000;
const ONE_DAY_MS: i64 = 24 * 60 * 60 * 1000;

fn seeded_student(repo: &SqliteUserRepository<'_>) -> User {
    let user = User::new("mira@uni.edu", "hash", Role::Student);
    repo.create_user(&user).unwrap();
    user
}

#[test]
fn fresh_token_verifies_to_the_live_account() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);
    let user = seeded_student(&repo);
    let authority = TokenAuthority::new(b"secret".to_vec());

    let token = authority.issue_at(&user, NOW);
    let verified = authority.verify_at(&token, &repo, NOW + ONE_DAY_MS).unwrap();

    assert_eq!(verified.uuid, user.uuid);
    assert_eq!(verified.email, "mira@uni.edu");
    assert_eq!(verified.role, Role::Student);
}

#[test]
fn token_expires_after_seven_days() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);
    let user = seeded_student(&repo);
    let authority = TokenAuthority::new(b"secret".to_vec());

    let token = authority.issue_at(&user, NOW);

    // Still alive just before the window closes.
    authority
        .verify_at(&token, &repo, NOW + 7 * ONE_DAY_MS - 1)
        .unwrap();

    let err = authority
        .verify_at(&token, &repo, NOW + 7 * ONE_DAY_MS)
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenExpired));
}

#[test]
fn password_rotation_revokes_earlier_tokens_before_expiry() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);
    let user = seeded_student(&repo);
    let authority = TokenAuthority::new(b"secret".to_vec());

    let token = authority.issue_at(&user, NOW);
    authority.verify_at(&token, &repo, NOW + 1).unwrap();

    let epoch = repo.rotate_password(user.uuid, "new-hash").unwrap();
    assert_eq!(epoch, 1);

    // Well inside the validity window, yet revoked — not expired.
    let err = authority.verify_at(&token, &repo, NOW + 2).unwrap_err();
    assert!(matches!(err, AuthError::TokenRevoked));

    // A token minted after the rotation works again.
    let reloaded = repo.get_user(user.uuid).unwrap().unwrap();
    let fresh = authority.issue_at(&reloaded, NOW + 3);
    authority.verify_at(&fresh, &repo, NOW + 4).unwrap();
}

#[test]
fn token_for_vanished_subject_fails_identity_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);
    let authority = TokenAuthority::new(b"secret".to_vec());

    // Never persisted, so the subject cannot be reloaded.
    let ghost = User::new("ghost@uni.edu", "hash", Role::Student);
    let token = authority.issue_at(&ghost, NOW);

    let err = authority.verify_at(&token, &repo, NOW + 1).unwrap_err();
    assert!(matches!(err, AuthError::IdentityNotFound));
}

#[test]
fn token_for_deactivated_account_fails_identity_inactive() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn);
    let user = seeded_student(&repo);
    let authority = TokenAuthority::new(b"secret".to_vec());

    let token = authority.issue_at(&user, NOW);
    repo.set_account_status(user.uuid, AccountStatus::Inactive)
        .unwrap();

    let err = authority.verify_at(&token, &repo, NOW + 1).unwrap_err();
    assert!(matches!(err, AuthError::IdentityInactive));
}

#[test]
fn auth_errors_map_to_the_401_class() {
    assert_eq!(AuthError::TokenExpired.http_status(), 401);
    assert_eq!(AuthError::TokenRevoked.http_status(), 401);
    assert_eq!(AuthError::MissingToken.http_status(), 401);
    assert_eq!(AuthError::InvalidCredentials.http_status(), 401);
}
