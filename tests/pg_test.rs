//! Postgres smoke tests. These need a running database, so they are ignored
//! by default; point `DATABASE_URL` at a postgres instance with rights to
//! create databases and run `cargo test -- --ignored`.

use chrono::NaiveDate;
use dotenv::dotenv;
use lunchvote_server::domain::admission::Ballot;
use lunchvote_server::domain::{EmployeeId, NewEmployee, NewMenu};
use lunchvote_server::store::postgres::{new_pool_with, PgStore};
use lunchvote_server::store::{Store, StoreError};
use sqlx::postgres::PgConnectOptions;
use sqlx::PgPool;

struct TestDb {
    db_name: String,
    pool: PgPool,
    admin_options: PgConnectOptions,
}

impl TestDb {
    /// Creates a throwaway database with a random name and migrates it.
    async fn new() -> Self {
        dotenv().ok();
        let admin_options: PgConnectOptions = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set for postgres tests")
            .parse()
            .unwrap();
        let db_name = format!("lunchvote_test_{}", uuid::Uuid::new_v4().simple());

        let admin_pool = new_pool_with(admin_options.clone()).await.unwrap();
        sqlx::query(&format!("CREATE DATABASE {db_name}"))
            .execute(&admin_pool)
            .await
            .unwrap();

        let pool = new_pool_with(admin_options.clone().database(&db_name))
            .await
            .unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();

        Self {
            db_name,
            pool,
            admin_options,
        }
    }

    async fn drop_db(self) {
        self.pool.close().await;
        let admin_pool = new_pool_with(self.admin_options.clone()).await.unwrap();
        sqlx::query(&format!("DROP DATABASE {}", self.db_name))
            .execute(&admin_pool)
            .await
            .unwrap();
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
}

async fn seed_employee(store: &PgStore, username: &str) -> EmployeeId {
    store
        .create_employee(NewEmployee {
            username: username.into(),
            email: format!("{username}@example.com"),
            password_hash: "$argon2id$test".into(),
        })
        .await
        .unwrap()
        .id
}

#[actix_rt::test]
#[ignore = "requires DATABASE_URL pointing at a postgres instance"]
async fn ballot_round_trip_and_daily_uniqueness() {
    let db = TestDb::new().await;
    let store = PgStore::new(db.pool.clone());

    let employee = seed_employee(&store, "ada").await;
    let restaurant = store.create_restaurant("Trattoria").await.unwrap();
    let menu = store
        .create_menu(NewMenu {
            restaurant_id: restaurant.id,
            date: date(),
            items: vec!["soup".into(), "bread".into()],
        })
        .await
        .unwrap();

    // duplicate (restaurant, date) upload hits the unique constraint
    let dup = store
        .create_menu(NewMenu {
            restaurant_id: restaurant.id,
            date: date(),
            items: vec![],
        })
        .await;
    assert!(matches!(dup, Err(StoreError::Duplicate)));

    let ballot = Ballot {
        lines: vec![(menu.id, 2)],
    };
    let votes = store.record_ballot(employee, date(), &ballot).await.unwrap();
    assert_eq!(votes.len(), 1);
    assert!(store.has_voted(employee, date()).await.unwrap());

    let second = store.record_ballot(employee, date(), &ballot).await;
    assert!(matches!(second, Err(StoreError::AlreadyVoted)));

    let menus = store.menus_for_date(date()).await.unwrap();
    assert_eq!(menus.len(), 1);
    assert_eq!(menus[0].items, vec!["soup".to_owned(), "bread".to_owned()]);

    let ledger = store.votes_for_date(date()).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].points, 2);

    db.drop_db().await;
}

#[actix_rt::test]
#[ignore = "requires DATABASE_URL pointing at a postgres instance"]
async fn concurrent_ballots_commit_exactly_once() {
    let db = TestDb::new().await;
    let store = PgStore::new(db.pool.clone());

    let employee = seed_employee(&store, "bob").await;
    let r1 = store.create_restaurant("One").await.unwrap();
    let r2 = store.create_restaurant("Two").await.unwrap();
    let m1 = store
        .create_menu(NewMenu {
            restaurant_id: r1.id,
            date: date(),
            items: vec![],
        })
        .await
        .unwrap();
    let m2 = store
        .create_menu(NewMenu {
            restaurant_id: r2.id,
            date: date(),
            items: vec![],
        })
        .await
        .unwrap();

    let first = Ballot {
        lines: vec![(m1.id, 1)],
    };
    let second = Ballot {
        lines: vec![(m2.id, 2)],
    };
    let (a, b) = tokio::join!(
        store.record_ballot(employee, date(), &first),
        store.record_ballot(employee, date(), &second)
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert_eq!(store.votes_for_date(date()).await.unwrap().len(), 1);

    db.drop_db().await;
}
