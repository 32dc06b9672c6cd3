//! Cart, checkout and IPN flows against a real PostgreSQL.
//!
//! Set `TEST_DATABASE_URL` (or `DATABASE_URL`) to run these; without either
//! they return early. IPN handling commits its own transaction, so those
//! tests write rows with unique names instead of rolling back.

use axum::http::StatusCode;
use bookstore_core::PaymentStatus;
use bookstore_http::services::orders::{create_from_cart, place_order, prepare_checkout, PlaceOrder};
use bookstore_http::services::{cart, ipn};
use bookstore_orm::models::{AddressInput, Book, BookChanges, NewBook, NewPayment, NewUser, Order, User};
use bookstore_orm::repositories::{addresses, books, carts, orders, payments, users};
use bookstore_orm::{PgConnection, PgPool, Postgres, Transaction};
use bookstore_payments::vnpay::{canonical_query, sign};
use bookstore_payments::{IpnReply, VnpayConfig, VnpayGateway};
use chrono::NaiveDate;
use serial_test::serial;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const HASH_SECRET: &str = "SECRETKEY";

struct TestDatabase {
    pool: PgPool,
}

impl TestDatabase {
    async fn new() -> Option<Self> {
        let Ok(database_url) = std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL"))
        else {
            eprintln!("TEST_DATABASE_URL not set, skipping");
            return None;
        };
        let pool = PgPool::connect(&database_url).await.expect("connect to test database");
        bookstore_orm::migrate(&pool).await.expect("run migrations");
        Some(Self { pool })
    }

    async fn with_transaction() -> Option<(Self, Transaction<'static, Postgres>)> {
        let db = Self::new().await?;
        let tx = db.pool.begin().await.expect("begin transaction");
        Some((db, tx))
    }
}

fn unique() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos() as u64;
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}{}", nanos % 1_000_000_000_000, n)
}

async fn seed_user(conn: &mut PgConnection) -> User {
    let suffix = unique();
    users::insert(
        &mut *conn,
        &NewUser {
            user_name: format!("u{}", &suffix[..suffix.len().min(18)]),
            email: format!("u{}@bookstore.test", suffix),
            password: "not-a-real-hash".to_string(),
        },
    )
    .await
    .unwrap()
}

async fn seed_address(conn: &mut PgConnection, user: &User) -> i64 {
    addresses::create(
        &mut *conn,
        user.id,
        &AddressInput {
            street: "12 Tran Hung Dao".to_string(),
            building_name: "Block A".to_string(),
            city: "Hanoi".to_string(),
            state: "Hoan Kiem".to_string(),
            country: "Vietnam".to_string(),
            pincode: "100000".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_book(conn: &mut PgConnection, price: f64, quantity: i32) -> Book {
    books::create(
        &mut *conn,
        &NewBook {
            title: format!("Book {}", unique()),
            author: "Nguyen Du".to_string(),
            description: "A long poem".to_string(),
            category: "Poetry".to_string(),
            price,
            publisher: "Kim Dong".to_string(),
            publication_date: NaiveDate::from_ymd_opt(1820, 1, 1).unwrap(),
            language: "Vietnamese".to_string(),
            reading_age: 12,
            pages: 320,
            dimension: None,
            quantity,
            discount: 0.0,
            image_url: None,
        },
    )
    .await
    .unwrap()
}

fn gateway() -> VnpayGateway {
    VnpayGateway::new(VnpayConfig {
        tmn_code: "DEMO".to_string(),
        hash_secret: HASH_SECRET.to_string(),
        pay_url: "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string(),
        return_url: "https://shop.example.com/return".to_string(),
    })
}

/// Signed IPN query for an order
fn notification(order_code: &str, amount: i64, response_code: &str) -> Vec<(String, String)> {
    let mut params = BTreeMap::new();
    params.insert("vnp_Amount".to_string(), amount.to_string());
    params.insert("vnp_ResponseCode".to_string(), response_code.to_string());
    params.insert("vnp_TransactionStatus".to_string(), response_code.to_string());
    params.insert("vnp_TransactionNo".to_string(), "14000001".to_string());
    params.insert("vnp_TxnRef".to_string(), order_code.to_string());
    let signature = sign(HASH_SECRET, &canonical_query(&params)).unwrap();

    let mut params: Vec<(String, String)> = params.into_iter().collect();
    params.push(("vnp_SecureHash".to_string(), signature));
    params
}

/// A committed pending VNPAY order for two copies of a 250,000 VND book
struct PendingOrder {
    user: User,
    book: Book,
    order: Order,
    cart_id: i64,
}

const AMOUNT_VND: i64 = 500_000;

async fn pending_vnpay_order(pool: &PgPool) -> PendingOrder {
    let mut conn = pool.acquire().await.unwrap();
    let user = seed_user(&mut conn).await;
    let address_id = seed_address(&mut conn, &user).await;
    let book = seed_book(&mut conn, 10.0, 5).await;
    cart::add_book(&mut conn, user.id, book.id, 2).await.unwrap();

    let checkout = prepare_checkout(&mut conn, user.id, address_id).await.unwrap();
    let payment = payments::insert(
        &mut *conn,
        &NewPayment {
            payment_method: "VNPAY".to_string(),
            pg_payment_id: None,
            pg_status: Some(PaymentStatus::Pending.as_str().to_string()),
            pg_response_message: None,
            pg_name: Some("VNPAY".to_string()),
        },
    )
    .await
    .unwrap();
    let order = create_from_cart(&mut conn, &user.email, &checkout, &payment, PaymentStatus::Pending)
        .await
        .unwrap();
    orders::set_amount_vnd(&mut *conn, order.id, AMOUNT_VND).await.unwrap();

    PendingOrder {
        user,
        book,
        order,
        cart_id: checkout.cart.id,
    }
}

async fn reload(pool: &PgPool, order: &Order) -> (Order, Option<String>) {
    let order = orders::find(pool, order.id).await.unwrap().unwrap();
    let payment = payments::find(pool, order.payment_id.unwrap()).await.unwrap().unwrap();
    (order, payment.pg_status)
}

#[tokio::test]
#[serial]
async fn test_ipn_success_takes_stock_clears_cart_and_marks_paid() {
    let Some(db) = TestDatabase::new().await else { return };
    let pending = pending_vnpay_order(&db.pool).await;
    let code = pending.order.order_code.clone().unwrap();

    let reply = ipn::handle(&db.pool, &gateway(), notification(&code, AMOUNT_VND * 100, "00")).await;
    assert_eq!(reply, IpnReply::confirmed());

    let book = books::find(&db.pool, pending.book.id).await.unwrap().unwrap();
    assert_eq!(book.quantity, 3);
    assert!(carts::lines(&db.pool, pending.cart_id).await.unwrap().is_empty());
    let cart = carts::find_by_user(&db.pool, pending.user.id).await.unwrap().unwrap();
    assert_eq!(cart.total_price, 0.0);

    let (order, pg_status) = reload(&db.pool, &pending.order).await;
    assert_eq!(order.payment_status, "PAID");
    assert!(order.paid_at.is_some());
    assert_eq!(pg_status.as_deref(), Some("SUCCESS"));
}

#[tokio::test]
#[serial]
async fn test_repeated_ipn_is_already_confirmed_and_takes_stock_once() {
    let Some(db) = TestDatabase::new().await else { return };
    let pending = pending_vnpay_order(&db.pool).await;
    let code = pending.order.order_code.clone().unwrap();

    let first = ipn::handle(&db.pool, &gateway(), notification(&code, AMOUNT_VND * 100, "00")).await;
    let second = ipn::handle(&db.pool, &gateway(), notification(&code, AMOUNT_VND * 100, "00")).await;

    assert_eq!(first, IpnReply::confirmed());
    assert_eq!(second, IpnReply::already_confirmed());
    let book = books::find(&db.pool, pending.book.id).await.unwrap().unwrap();
    assert_eq!(book.quantity, 3);
}

#[tokio::test]
#[serial]
async fn test_declined_ipn_marks_the_order_failed() {
    let Some(db) = TestDatabase::new().await else { return };
    let pending = pending_vnpay_order(&db.pool).await;
    let code = pending.order.order_code.clone().unwrap();

    let reply = ipn::handle(&db.pool, &gateway(), notification(&code, AMOUNT_VND * 100, "24")).await;
    assert_eq!(reply, IpnReply::payment_failed());

    let (order, pg_status) = reload(&db.pool, &pending.order).await;
    assert_eq!(order.payment_status, "FAILED");
    assert!(order.paid_at.is_none());
    assert_eq!(pg_status.as_deref(), Some("FAILED"));

    let book = books::find(&db.pool, pending.book.id).await.unwrap().unwrap();
    assert_eq!(book.quantity, 5);
    assert_eq!(carts::lines(&db.pool, pending.cart_id).await.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn test_ipn_with_wrong_amount_changes_nothing() {
    let Some(db) = TestDatabase::new().await else { return };
    let pending = pending_vnpay_order(&db.pool).await;
    let code = pending.order.order_code.clone().unwrap();

    let reply = ipn::handle(&db.pool, &gateway(), notification(&code, (AMOUNT_VND - 1) * 100, "00")).await;
    assert_eq!(reply, IpnReply::invalid_amount());

    let (order, _) = reload(&db.pool, &pending.order).await;
    assert_eq!(order.payment_status, "PENDING");
    let book = books::find(&db.pool, pending.book.id).await.unwrap().unwrap();
    assert_eq!(book.quantity, 5);
}

#[tokio::test]
#[serial]
async fn test_ipn_for_unknown_order_is_01() {
    let Some(db) = TestDatabase::new().await else { return };
    let code = format!("ORD20250101-{}-ZZZZ", unique());

    let reply = ipn::handle(&db.pool, &gateway(), notification(&code, 100, "00")).await;
    assert_eq!(reply, IpnReply::order_not_found());
}

#[tokio::test]
#[serial]
async fn test_place_order_refuses_lines_beyond_stock() {
    let Some((_db, mut tx)) = TestDatabase::with_transaction().await else { return };
    let user = seed_user(&mut tx).await;
    let address_id = seed_address(&mut tx, &user).await;
    let book = seed_book(&mut tx, 10.0, 5).await;
    cart::add_book(&mut tx, user.id, book.id, 3).await.unwrap();

    let changes = BookChanges {
        quantity: Some(2),
        ..Default::default()
    };
    books::update(&mut *tx, book.id, &changes).await.unwrap();

    let input = PlaceOrder {
        address_id,
        ..Default::default()
    };
    let err = place_order(&mut tx, &user, "COD", input).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.message(), format!("Insufficient stock for {}", book.title));

    let book = books::find(&mut *tx, book.id).await.unwrap().unwrap();
    assert_eq!(book.quantity, 2);
}

#[tokio::test]
#[serial]
async fn test_place_order_stores_the_payment_method_as_given() {
    let Some((_db, mut tx)) = TestDatabase::with_transaction().await else { return };
    let user = seed_user(&mut tx).await;
    let address_id = seed_address(&mut tx, &user).await;
    let book = seed_book(&mut tx, 10.0, 5).await;
    cart::add_book(&mut tx, user.id, book.id, 2).await.unwrap();

    let input = PlaceOrder {
        address_id,
        ..Default::default()
    };
    place_order(&mut tx, &user, " cod ", input).await.unwrap();

    let placed = orders::list_by_email(&mut *tx, &user.email).await.unwrap();
    assert_eq!(placed.len(), 1);
    let payment = payments::find(&mut *tx, placed[0].payment_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.payment_method, "cod");

    let book = books::find(&mut *tx, book.id).await.unwrap().unwrap();
    assert_eq!(book.quantity, 3);
}

#[tokio::test]
#[serial]
async fn test_adding_a_book_twice_is_a_conflict() {
    let Some((_db, mut tx)) = TestDatabase::with_transaction().await else { return };
    let user = seed_user(&mut tx).await;
    let book = seed_book(&mut tx, 10.0, 5).await;

    cart::add_book(&mut tx, user.id, book.id, 1).await.unwrap();
    let err = cart::add_book(&mut tx, user.id, book.id, 1).await.unwrap_err();

    assert_eq!(err.status_code(), StatusCode::CONFLICT);
    assert_eq!(err.message(), format!("Book {} already exists in the cart", book.title));
}

#[tokio::test]
#[serial]
async fn test_deleting_a_book_recalculates_cart_totals() {
    let Some((_db, mut tx)) = TestDatabase::with_transaction().await else { return };
    let user = seed_user(&mut tx).await;
    let kept = seed_book(&mut tx, 12.5, 5).await;
    let removed = seed_book(&mut tx, 30.0, 5).await;

    cart::add_book(&mut tx, user.id, kept.id, 2).await.unwrap();
    cart::add_book(&mut tx, user.id, removed.id, 1).await.unwrap();
    let before = carts::find_by_user(&mut *tx, user.id).await.unwrap().unwrap();
    assert_eq!(before.total_price, 55.0);

    assert!(books::delete(&mut tx, removed.id).await.unwrap());

    let after = carts::find_by_user(&mut *tx, user.id).await.unwrap().unwrap();
    assert_eq!(after.total_price, 25.0);
    let lines = carts::lines(&mut *tx, after.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].book_id, kept.id);
}
