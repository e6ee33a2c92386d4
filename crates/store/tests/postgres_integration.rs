//! PostgreSQL integration tests
//!
//! These tests share one PostgreSQL container and truncate the tables before
//! each test. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use chrono::{Duration, SubsecRound, Utc};
use common::{
    Money, Order, OrderId, OrderItem, OrderItemId, OrderStatus, Product, ProductId, Role, User,
    UserId,
};
use serial_test::serial;
use sqlx::{Connection, PgConnection, PgPool};
use store::{OrderStore, PostgresStore, ProductCatalog, StoreError, UserDirectory};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_items, orders, products, users")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

fn test_user(role: Role) -> User {
    let id = UserId::new();
    User {
        id,
        role,
        fullname: "Test User".to_string(),
        username: format!("user-{id}"),
        email: format!("{id}@example.com"),
        telephone: None,
        password_hash: "hash".to_string(),
    }
}

fn test_product(cents: i64) -> Product {
    Product {
        id: ProductId::new(),
        name: "Widget".to_string(),
        description: "A widget".to_string(),
        price: Money::from_cents(cents),
        stock: 100,
    }
}

fn test_order(user_id: UserId, lines: &[(&Product, u32)]) -> Order {
    let id = OrderId::new();
    // Postgres keeps microseconds; truncate so round-trips compare equal.
    let now = Utc::now().trunc_subsecs(6);
    let items: Vec<OrderItem> = lines
        .iter()
        .map(|(p, quantity)| OrderItem {
            id: OrderItemId::new(),
            order_id: id,
            product_id: p.id,
            quantity: *quantity,
            unit_price: p.price,
            total_price: p.price.checked_mul(*quantity).unwrap(),
        })
        .collect();
    Order {
        id,
        user_id,
        total_price: items
            .iter()
            .map(|i| i.total_price)
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
            .unwrap(),
        status: OrderStatus::Pending,
        created_at: now,
        updated_at: now,
        items,
    }
}

async fn count(store: &PostgresStore, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(store.pool())
        .await
        .unwrap()
}

#[tokio::test]
#[serial]
async fn find_user_and_product() {
    let store = get_test_store().await;
    let user = test_user(Role::Admin);
    let product = test_product(1999);
    store.insert_user(&user).await.unwrap();
    store.insert_product(&product).await.unwrap();

    let found_user = store.find_user(user.id).await.unwrap().unwrap();
    assert_eq!(found_user, user);

    let found_product = store.find_product(product.id).await.unwrap().unwrap();
    assert_eq!(found_product, product);

    assert!(store.find_user(UserId::new()).await.unwrap().is_none());
    assert!(store.find_product(ProductId::new()).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn create_and_find_order_with_items() {
    let store = get_test_store().await;
    let user = test_user(Role::User);
    let p1 = test_product(1000);
    let p2 = test_product(500);
    store.insert_user(&user).await.unwrap();
    store.insert_product(&p1).await.unwrap();
    store.insert_product(&p2).await.unwrap();

    let order = test_order(user.id, &[(&p1, 2), (&p2, 3)]);
    store.create_order(&order).await.unwrap();

    let found = store.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(found, order);
    assert_eq!(found.total_price, Money::from_cents(3500));

    // Repeated reads return identical data.
    let again = store.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(found, again);
}

#[tokio::test]
#[serial]
async fn create_with_missing_product_rolls_back() {
    let store = get_test_store().await;
    let user = test_user(Role::User);
    let p1 = test_product(1000);
    let ghost = test_product(500);
    store.insert_user(&user).await.unwrap();
    store.insert_product(&p1).await.unwrap();

    let order = test_order(user.id, &[(&p1, 1), (&ghost, 1)]);
    let result = store.create_order(&order).await;

    assert!(matches!(
        result,
        Err(StoreError::MissingReference {
            entity: "product",
            ..
        })
    ));
    assert_eq!(count(&store, "orders").await, 0);
    assert_eq!(count(&store, "order_items").await, 0);
}

#[tokio::test]
#[serial]
async fn create_with_missing_user_fails() {
    let store = get_test_store().await;
    let p1 = test_product(1000);
    store.insert_product(&p1).await.unwrap();

    let order = test_order(UserId::new(), &[(&p1, 1)]);
    let result = store.create_order(&order).await;

    assert!(matches!(
        result,
        Err(StoreError::MissingReference { entity: "user", .. })
    ));
    assert_eq!(count(&store, "orders").await, 0);
}

#[tokio::test]
#[serial]
async fn list_orders_sorted_by_creation() {
    let store = get_test_store().await;
    let user = test_user(Role::User);
    let other = test_user(Role::User);
    let p1 = test_product(1000);
    store.insert_user(&user).await.unwrap();
    store.insert_user(&other).await.unwrap();
    store.insert_product(&p1).await.unwrap();

    let mut later = test_order(user.id, &[(&p1, 1)]);
    later.created_at = later.created_at + Duration::seconds(5);
    let earlier = test_order(user.id, &[(&p1, 2)]);
    let foreign = test_order(other.id, &[(&p1, 3)]);

    store.create_order(&later).await.unwrap();
    store.create_order(&earlier).await.unwrap();
    store.create_order(&foreign).await.unwrap();

    let orders = store.list_orders_for_user(user.id).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, earlier.id);
    assert_eq!(orders[1].id, later.id);
    assert_eq!(orders[0].items.len(), 1);
}

#[tokio::test]
#[serial]
async fn status_updates() {
    let store = get_test_store().await;
    let user = test_user(Role::User);
    let p1 = test_product(1000);
    store.insert_user(&user).await.unwrap();
    store.insert_product(&p1).await.unwrap();
    let order = test_order(user.id, &[(&p1, 1)]);
    store.create_order(&order).await.unwrap();

    let now = Utc::now();
    assert!(
        store
            .transition_status(order.id, OrderStatus::Pending, OrderStatus::Canceled, now)
            .await
            .unwrap()
    );
    assert!(
        !store
            .transition_status(order.id, OrderStatus::Pending, OrderStatus::Shipped, now)
            .await
            .unwrap()
    );

    assert!(
        store
            .update_status(order.id, OrderStatus::Completed, now)
            .await
            .unwrap()
    );
    assert!(
        !store
            .update_status(OrderId::new(), OrderStatus::Completed, now)
            .await
            .unwrap()
    );

    let stored = store.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Completed);
    assert!(stored.updated_at >= order.updated_at);
}

#[tokio::test]
#[serial]
async fn load_details_keeps_price_snapshot() {
    let store = get_test_store().await;
    let user = test_user(Role::User);
    let mut p1 = test_product(1000);
    store.insert_user(&user).await.unwrap();
    store.insert_product(&p1).await.unwrap();
    let order = test_order(user.id, &[(&p1, 2)]);
    store.create_order(&order).await.unwrap();

    p1.price = Money::from_cents(9999);
    store.insert_product(&p1).await.unwrap();

    let details = store.load_order_details(order.id).await.unwrap().unwrap();
    assert_eq!(details.user.as_ref().map(|u| u.id), Some(user.id));
    assert_eq!(details.product(p1.id).map(|p| p.price), Some(p1.price));
    assert_eq!(details.order.items[0].unit_price, Money::from_cents(1000));
    assert_eq!(details.order.total_price, Money::from_cents(2000));

    assert!(
        store
            .load_order_details(OrderId::new())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
#[serial]
async fn create_dropped_before_commit_leaves_nothing() {
    let store = get_test_store().await;
    let user = test_user(Role::User);
    let p1 = test_product(1000);
    let p2 = test_product(500);
    store.insert_user(&user).await.unwrap();
    store.insert_product(&p1).await.unwrap();
    store.insert_product(&p2).await.unwrap();
    let order = test_order(user.id, &[(&p1, 1), (&p2, 2), (&p1, 3)]);

    // Hold a lock on order_items so the write stalls after the order row
    // is inserted but before any item row or the commit.
    let info = get_container_info().await;
    let mut blocker = PgConnection::connect(&info.connection_string)
        .await
        .unwrap();
    let mut lock = blocker.begin().await.unwrap();
    sqlx::query("LOCK TABLE order_items IN ACCESS EXCLUSIVE MODE")
        .execute(&mut *lock)
        .await
        .unwrap();

    let outcome = tokio::time::timeout(
        std::time::Duration::from_millis(500),
        store.create_order(&order),
    )
    .await;
    assert!(outcome.is_err(), "create_order should still be waiting on the lock");

    lock.rollback().await.unwrap();

    // Terminate whatever session the dropped write left behind.
    sqlx::query(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
         WHERE datname = current_database() AND pid <> pg_backend_pid()",
    )
    .execute(&mut blocker)
    .await
    .unwrap();

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&mut blocker)
        .await
        .unwrap();
    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
        .fetch_one(&mut blocker)
        .await
        .unwrap();
    assert_eq!(orders, 0);
    assert_eq!(items, 0);

    blocker.close().await.unwrap();
}
