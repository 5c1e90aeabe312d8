use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Booking, BookingStatus, Provider};

/// Read/write access to provider records. Injected into the handlers so
/// tests can substitute an in-memory fake; a repository error is treated as
/// storage being unavailable and surfaces as a hard request failure.
#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Provider>>;
    async fn get(&self, id: &str) -> anyhow::Result<Option<Provider>>;
    async fn upsert(&self, provider: &Provider) -> anyhow::Result<()>;
    async fn delete(&self, id: &str) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> anyhow::Result<()>;
    async fn get(&self, id: &str) -> anyhow::Result<Option<Booking>>;
    async fn list(&self, status: Option<&str>, limit: i64) -> anyhow::Result<Vec<Booking>>;
    async fn update(&self, booking: &Booking) -> anyhow::Result<bool>;
    async fn set_status(&self, id: &str, status: &BookingStatus) -> anyhow::Result<bool>;
}

pub struct SqliteProviderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteProviderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ProviderRepository for SqliteProviderRepository {
    async fn list(&self) -> anyhow::Result<Vec<Provider>> {
        let conn = self.conn.lock().unwrap();
        queries::list_providers(&conn)
    }

    async fn get(&self, id: &str) -> anyhow::Result<Option<Provider>> {
        let conn = self.conn.lock().unwrap();
        queries::get_provider(&conn, id)
    }

    async fn upsert(&self, provider: &Provider) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        queries::upsert_provider(&conn, provider)
    }

    async fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let conn = self.conn.lock().unwrap();
        queries::delete_provider(&conn, id)
    }
}

pub struct SqliteBookingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBookingRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn create(&self, booking: &Booking) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        queries::create_booking(&conn, booking)
    }

    async fn get(&self, id: &str) -> anyhow::Result<Option<Booking>> {
        let conn = self.conn.lock().unwrap();
        queries::get_booking_by_id(&conn, id)
    }

    async fn list(&self, status: Option<&str>, limit: i64) -> anyhow::Result<Vec<Booking>> {
        let conn = self.conn.lock().unwrap();
        queries::get_all_bookings(&conn, status, limit)
    }

    async fn update(&self, booking: &Booking) -> anyhow::Result<bool> {
        let conn = self.conn.lock().unwrap();
        queries::update_booking(&conn, booking)
    }

    async fn set_status(&self, id: &str, status: &BookingStatus) -> anyhow::Result<bool> {
        let conn = self.conn.lock().unwrap();
        queries::update_booking_status(&conn, id, status)
    }
}
