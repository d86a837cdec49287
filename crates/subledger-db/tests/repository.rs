use chrono::NaiveDate;
use subledger_db::{
    Channel, ClientUpdate, DbError, DeliveryStatus, NewClient, NewNotification, NewService,
    NewSubscription, RecordStatus, Service, SubscriptionDb,
};
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const TODAY: (i32, u32, u32) = (2026, 10, 19);

fn today() -> NaiveDate {
    date(TODAY.0, TODAY.1, TODAY.2)
}

async fn open() -> (TempDir, SubscriptionDb) {
    let dir = tempfile::tempdir().unwrap();
    let db = SubscriptionDb::open(&dir.path().join("subscriptions.db"))
        .await
        .unwrap();
    (dir, db)
}

async fn add_client(db: &SubscriptionDb, name: &str, whatsapp: Option<&str>) -> i64 {
    db.create_client(
        &NewClient {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            whatsapp: whatsapp.map(str::to_string),
            notes: None,
        },
        today(),
    )
    .await
    .unwrap()
    .id
}

async fn thirty_day_service(db: &SubscriptionDb) -> Service {
    db.list_active_services()
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.duration_days == 30)
        .unwrap()
}

async fn subscribe(db: &SubscriptionDb, client_id: i64, service: &Service, start: NaiveDate) -> i64 {
    db.create_subscription(&NewSubscription {
        client_id,
        service_id: service.id,
        start_date: start,
        amount_paid: service.price,
        payment_method: "UPI".to_string(),
        transaction_id: None,
        auto_renewal: false,
    })
    .await
    .unwrap()
    .id
}

/// Start date that makes a 30-day subscription end `days` after today.
fn start_for_end_in(days: i64) -> NaiveDate {
    today() + chrono::Duration::days(days - 30)
}

#[tokio::test]
async fn seeds_five_services_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subscriptions.db");

    let db = SubscriptionDb::open(&path).await.unwrap();
    assert_eq!(db.list_services().await.unwrap().len(), 5);
    db.close().await;

    let reopened = SubscriptionDb::open(&path).await.unwrap();
    let services = reopened.list_services().await.unwrap();
    assert_eq!(services.len(), 5);
    assert!(services.iter().any(|s| s.duration_days == 365));
}

#[tokio::test]
async fn duplicate_email_is_a_conflict_and_adds_no_row() {
    let (_dir, db) = open().await;
    add_client(&db, "Asha", None).await;

    let err = db
        .create_client(
            &NewClient {
                name: "Someone Else".into(),
                email: "asha@example.com".into(),
                ..NewClient::default()
            },
            today(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Conflict(_)), "got {err:?}");
    assert_eq!(db.list_clients().await.unwrap().len(), 1);

    let found = db.find_client_by_email(" asha@example.com ").await.unwrap();
    assert_eq!(found.map(|c| c.name).as_deref(), Some("Asha"));
    assert!(db.find_client_by_email("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn updating_to_a_taken_email_is_a_conflict() {
    let (_dir, db) = open().await;
    add_client(&db, "Asha", None).await;
    let ravi = add_client(&db, "Ravi", None).await;

    let mut update = ClientUpdate::from(db.get_client(ravi).await.unwrap());
    update.email = "asha@example.com".into();

    assert!(matches!(
        db.update_client(ravi, &update).await,
        Err(DbError::Conflict(_))
    ));
    assert!(matches!(
        db.update_client(9999, &update).await,
        Err(DbError::Conflict(_)) | Err(DbError::NotFound(_))
    ));
}

#[tokio::test]
async fn end_date_is_fixed_at_creation() {
    let (_dir, db) = open().await;
    let client = add_client(&db, "Asha", None).await;
    let service = thirty_day_service(&db).await;

    let start = date(2026, 3, 1);
    let id = subscribe(&db, client, &service, start).await;

    let mut longer = NewService::from(service.clone());
    longer.duration_days = 90;
    db.update_service(service.id, &longer).await.unwrap();

    let subscription = db.get_subscription(id).await.unwrap();
    assert_eq!(subscription.start_date, start);
    assert_eq!(subscription.end_date, date(2026, 3, 31));
    assert_eq!(subscription.status, RecordStatus::Active);
}

#[tokio::test]
async fn expiring_matches_the_exact_day_only() {
    let (_dir, db) = open().await;
    let service = thirty_day_service(&db).await;

    let mut ids = Vec::new();
    for (name, days) in [("Today", 0), ("Tomorrow", 1), ("Week", 7), ("Later", 40)] {
        let client = add_client(&db, name, None).await;
        ids.push(subscribe(&db, client, &service, start_for_end_in(days)).await);
    }

    assert_eq!(expiring_ids(&db, 0).await, vec![ids[0]]);
    assert_eq!(expiring_ids(&db, 1).await, vec![ids[1]]);
    assert_eq!(expiring_ids(&db, 7).await, vec![ids[2]]);
    assert!(expiring_ids(&db, 30).await.is_empty());
    assert!(expiring_ids(&db, 2).await.is_empty());
}

async fn expiring_ids(db: &SubscriptionDb, days: i64) -> Vec<i64> {
    db.list_expiring_on(today(), days)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.id)
        .collect()
}

#[tokio::test]
async fn active_subscriptions_skip_ended_ones_and_sort_by_end_date() {
    let (_dir, db) = open().await;
    let service = thirty_day_service(&db).await;

    let a = add_client(&db, "Asha", Some("+911111111111")).await;
    let b = add_client(&db, "Ravi", None).await;
    let late = subscribe(&db, a, &service, start_for_end_in(20)).await;
    let soon = subscribe(&db, b, &service, start_for_end_in(3)).await;
    subscribe(&db, b, &service, start_for_end_in(-1)).await;

    let active = db.list_active_subscriptions_on(today()).await.unwrap();
    let ids: Vec<i64> = active.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![soon, late]);

    let first = &active[0];
    assert_eq!(first.client_name, "Ravi");
    assert_eq!(first.service_name, service.name);
    assert_eq!(first.days_remaining(today()), 3);
    assert_eq!(active[1].whatsapp.as_deref(), Some("+911111111111"));

    assert_eq!(db.subscription_history().await.unwrap().len(), 3);
}

#[tokio::test]
async fn empty_store_returns_empty_views() {
    let (_dir, db) = open().await;

    assert!(db.list_clients().await.unwrap().is_empty());
    assert!(db.list_active_subscriptions_on(today()).await.unwrap().is_empty());
    assert!(db.list_expiring_on(today(), 1).await.unwrap().is_empty());
    assert!(db.monthly_growth().await.unwrap().is_empty());
    assert!(db.notification_history(100).await.unwrap().is_empty());
}

#[tokio::test]
async fn deactivated_services_leave_the_active_list_but_keep_history() {
    let (_dir, db) = open().await;
    let client = add_client(&db, "Asha", None).await;
    let service = thirty_day_service(&db).await;
    subscribe(&db, client, &service, today()).await;

    db.deactivate_service(service.id).await.unwrap();

    let active = db.list_active_services().await.unwrap();
    assert_eq!(active.len(), 4);
    assert!(active.iter().all(|s| s.id != service.id));
    assert_eq!(db.list_services().await.unwrap().len(), 5);
    assert_eq!(db.subscription_history().await.unwrap().len(), 1);
    assert!(matches!(db.deactivate_service(9999).await, Err(DbError::NotFound(_))));
}

#[tokio::test]
async fn service_names_are_unique() {
    let (_dir, db) = open().await;
    let existing = thirty_day_service(&db).await;

    let err = db
        .create_service(&NewService {
            name: existing.name.clone(),
            description: None,
            price: 1.0,
            duration_days: 7,
            status: RecordStatus::Active,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Conflict(_)));
}

#[tokio::test]
async fn subscriptions_need_existing_client_and_service() {
    let (_dir, db) = open().await;
    let service = thirty_day_service(&db).await;

    let err = db
        .create_subscription(&NewSubscription {
            client_id: 42,
            service_id: service.id,
            start_date: today(),
            amount_paid: 10.0,
            payment_method: "Cash".into(),
            transaction_id: None,
            auto_renewal: true,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::NotFound(_)));
}

#[tokio::test]
async fn removing_inactive_clients_keeps_active_ones() {
    let (_dir, db) = open().await;
    let asha = add_client(&db, "Asha", None).await;
    let ravi = add_client(&db, "Ravi", None).await;
    let meera = add_client(&db, "Meera", None).await;

    for id in [ravi, meera] {
        let mut update = ClientUpdate::from(db.get_client(id).await.unwrap());
        update.status = RecordStatus::Inactive;
        db.update_client(id, &update).await.unwrap();
    }

    assert_eq!(db.remove_inactive_clients().await.unwrap(), 2);
    let remaining: Vec<i64> = db.list_clients().await.unwrap().iter().map(|c| c.id).collect();
    assert_eq!(remaining, vec![asha]);
}

#[tokio::test]
async fn deleting_a_client_drops_subscriptions_and_keeps_the_log() {
    let (_dir, db) = open().await;
    let client = add_client(&db, "Asha", None).await;
    let service = thirty_day_service(&db).await;
    subscribe(&db, client, &service, today()).await;
    db.log_notification(
        &NewNotification {
            client_id: client,
            service_name: &service.name,
            channel: Channel::Email,
            status: DeliveryStatus::Sent,
            message: "hello",
        },
        today(),
    )
    .await
    .unwrap();

    db.delete_client(client).await.unwrap();

    assert!(db.subscription_history().await.unwrap().is_empty());
    let history = db.notification_history(10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].client_id, None);
    assert_eq!(history[0].client_name, None);
    assert!(matches!(db.delete_client(client).await, Err(DbError::NotFound(_))));
}

#[tokio::test]
async fn notification_log_truncates_messages() {
    let (_dir, db) = open().await;
    let client = add_client(&db, "Asha", None).await;
    let long = "x".repeat(900);

    let record = db
        .log_notification(
            &NewNotification {
                client_id: client,
                service_name: "EQUITY Premium",
                channel: Channel::WhatsApp,
                status: DeliveryStatus::Failed,
                message: &long,
            },
            today(),
        )
        .await
        .unwrap();

    assert_eq!(record.message.as_deref().map(str::len), Some(500));
    assert_eq!(record.channel, Channel::WhatsApp);
    assert_eq!(record.status, DeliveryStatus::Failed);
    assert_eq!(record.scheduled_date, today());
    assert_eq!(record.sent_date, Some(today()));

    let history = db.notification_history(10).await.unwrap();
    assert_eq!(history[0].client_name.as_deref(), Some("Asha"));
}

#[tokio::test]
async fn reports_aggregate_revenue() {
    let (_dir, db) = open().await;
    let service = thirty_day_service(&db).await;
    let asha = add_client(&db, "Asha", None).await;
    let ravi = add_client(&db, "Ravi", None).await;

    subscribe(&db, asha, &service, date(2026, 9, 25)).await;
    subscribe(&db, ravi, &service, date(2026, 10, 2)).await;
    subscribe(&db, asha, &service, date(2026, 10, 10)).await;

    let october = db
        .revenue_between(date(2026, 10, 1), date(2026, 10, 31))
        .await
        .unwrap();
    assert_eq!(october.len(), 2);
    assert_eq!(db.revenue_rows().await.unwrap().len(), 3);

    let growth = db.monthly_growth().await.unwrap();
    let months: Vec<&str> = growth.iter().map(|g| g.month.as_str()).collect();
    assert_eq!(months, vec!["2026-09", "2026-10"]);
    assert_eq!(growth[1].new_subscriptions, 2);
    assert_eq!(growth[1].unique_clients, 2);
    assert!((growth[1].revenue - 2.0 * service.price).abs() < f64::EPSILON);

    let by_service = db.revenue_by_service_on(today()).await.unwrap();
    assert_eq!(by_service.len(), 1);
    assert_eq!(by_service[0].subscriptions, 3);

    let counts = db.counts().await.unwrap();
    assert_eq!((counts.clients, counts.services, counts.subscriptions), (2, 5, 3));
}

#[tokio::test]
async fn scheduler_state_round_trips() {
    let (_dir, db) = open().await;

    assert_eq!(db.last_run_date("expiry").await.unwrap(), None);
    db.set_last_run_date("expiry", date(2026, 10, 18)).await.unwrap();
    db.set_last_run_date("expiry", today()).await.unwrap();
    assert_eq!(db.last_run_date("expiry").await.unwrap(), Some(today()));
}

#[tokio::test]
async fn backup_writes_a_readable_copy() {
    let (dir, db) = open().await;
    add_client(&db, "Asha", None).await;

    let target = dir.path().join("backups").join("copy.db");
    db.backup_to(&target).await.unwrap();

    let copy = SubscriptionDb::open(&target).await.unwrap();
    assert_eq!(copy.list_clients().await.unwrap().len(), 1);
}
