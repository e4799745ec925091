use rusqlite::Connection;
use uniact_core::{
    Activity, ActivityCategory, ActivityRepository, ApplicationService, ApplicationStatus,
    AuditRecorder, Notification, NotificationFanout, NotificationKind, NotificationRepository,
    RepoError, Role, SqliteActivityRepository, SqliteApplicationRepository, SqliteAuditRepository,
    SqliteNotificationRepository, SqliteUserRepository, User, UserRepository,
};
use uuid::Uuid;

fn app_service(
    conn: &Connection,
) -> ApplicationService<
    SqliteApplicationRepository<'_>,
    SqliteActivityRepository<'_>,
    SqliteNotificationRepository<'_>,
    SqliteUserRepository<'_>,
    SqliteAuditRepository<'_>,
> {
    ApplicationService::new(
        SqliteApplicationRepository::new(conn),
        SqliteActivityRepository::new(conn),
        NotificationFanout::new(
            SqliteNotificationRepository::new(conn),
            SqliteUserRepository::new(conn),
        ),
        AuditRecorder::new(SqliteAuditRepository::new(conn)),
    )
}

fn seed_user(conn: &Connection, email: &str, role: Role) -> User {
    let user = User::new(email, "hash", role);
    SqliteUserRepository::new(conn).create_user(&user).unwrap();
    user
}

fn seed_activity(conn: &Connection, owner: &User, capacity: i64) -> Activity {
    let activity = Activity::new(
        "Garden volunteering",
        ActivityCategory::Volunteer,
        1_760_000_000_000,
        capacity,
        owner.uuid,
    );
    SqliteActivityRepository::new(conn)
        .create_activity(&activity)
        .unwrap();
    activity
}

#[test]
fn owner_who_is_also_admin_receives_one_copy() {
    let conn = uniact_core::db::open_db_in_memory().unwrap();
    // The activity owner holds the admin role, so owner-copy and admin-copy
    // resolve to the same recipient.
    let owner_admin = seed_user(&conn, "owner-admin@uni.edu", Role::Admin);
    let student = seed_user(&conn, "stu@uni.edu", Role::Student);
    let activity = seed_activity(&conn, &owner_admin, 5);
    let service = app_service(&conn);

    service.submit(&student, activity.uuid).unwrap();

    let notifications = SqliteNotificationRepository::new(&conn);
    assert_eq!(
        notifications
            .list_for_recipient(owner_admin.uuid, true)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn decision_notifications_carry_the_decision_kind() {
    let conn = uniact_core::db::open_db_in_memory().unwrap();
    let coordinator = seed_user(&conn, "coord@uni.edu", Role::Coordinator);
    let student = seed_user(&conn, "stu@uni.edu", Role::Student);
    let activity = seed_activity(&conn, &coordinator, 5);
    let service = app_service(&conn);

    let application = service.submit(&student, activity.uuid).unwrap();
    service
        .set_status(
            application.uuid,
            ApplicationStatus::Approved,
            None,
            &coordinator,
        )
        .unwrap();

    let notifications = SqliteNotificationRepository::new(&conn);
    let student_inbox = notifications.list_for_recipient(student.uuid, true).unwrap();
    assert!(
        student_inbox
            .iter()
            .any(|notification| notification.kind == NotificationKind::Approval),
        "student must receive the approval notification"
    );

    let staff_inbox = notifications
        .list_for_recipient(coordinator.uuid, true)
        .unwrap();
    assert!(
        staff_inbox
            .iter()
            .any(|notification| notification.kind == NotificationKind::Approval),
        "owner receives an informational copy of the same kind"
    );
}

#[test]
fn mark_read_flips_only_the_read_flag() {
    let conn = uniact_core::db::open_db_in_memory().unwrap();
    let student = seed_user(&conn, "stu@uni.edu", Role::Student);
    let notifications = SqliteNotificationRepository::new(&conn);

    let notification =
        Notification::new(student.uuid, NotificationKind::Announcement, "welcome");
    notifications.insert_batch(&[notification.clone()]).unwrap();

    notifications.mark_read(notification.uuid).unwrap();

    assert!(notifications
        .list_for_recipient(student.uuid, true)
        .unwrap()
        .is_empty());
    let all = notifications
        .list_for_recipient(student.uuid, false)
        .unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].is_read);
    assert_eq!(all[0].body, "welcome");
}

#[test]
fn mark_read_on_missing_notification_is_not_found() {
    let conn = uniact_core::db::open_db_in_memory().unwrap();
    let notifications = SqliteNotificationRepository::new(&conn);

    let err = notifications.mark_read(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));
}

#[test]
fn batch_insert_is_all_or_nothing() {
    let conn = uniact_core::db::open_db_in_memory().unwrap();
    let student = seed_user(&conn, "stu@uni.edu", Role::Student);
    let notifications = SqliteNotificationRepository::new(&conn);

    // Second row violates the recipient FK, so the whole batch must roll
    // back.
    let batch = [
        Notification::new(student.uuid, NotificationKind::Announcement, "ok"),
        Notification::new(Uuid::new_v4(), NotificationKind::Announcement, "orphan"),
    ];
    notifications.insert_batch(&batch).unwrap_err();

    assert!(notifications
        .list_for_recipient(student.uuid, false)
        .unwrap()
        .is_empty());
}
