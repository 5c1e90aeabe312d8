use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Booking, BookingStatus, Gender, Provider, ProviderStatus, SelectedSlot, WeeklyAvailability,
};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

// ── Providers ──

pub fn upsert_provider(conn: &Connection, provider: &Provider) -> anyhow::Result<()> {
    let availability = provider.availability.to_value().to_string();
    let created_at = provider.created_at.format(DATETIME_FMT).to_string();
    let updated_at = provider.updated_at.format(DATETIME_FMT).to_string();

    conn.execute(
        "INSERT INTO providers (id, display_name, gender, age_group, status, timezone, availability, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
           display_name = excluded.display_name,
           gender = excluded.gender,
           age_group = excluded.age_group,
           status = excluded.status,
           timezone = excluded.timezone,
           availability = excluded.availability,
           updated_at = excluded.updated_at",
        params![
            provider.id,
            provider.display_name,
            provider.gender.as_str(),
            provider.age_group.map(|g| g.as_str()),
            provider.status.as_str(),
            provider.timezone,
            availability,
            created_at,
            updated_at,
        ],
    )?;
    Ok(())
}

pub fn list_providers(conn: &Connection) -> anyhow::Result<Vec<Provider>> {
    let mut stmt = conn.prepare(
        "SELECT id, display_name, gender, age_group, status, timezone, availability, created_at, updated_at
         FROM providers ORDER BY display_name ASC",
    )?;

    let rows = stmt.query_map([], |row| Ok(parse_provider_row(row)))?;

    let mut providers = vec![];
    for row in rows {
        providers.push(row??);
    }
    Ok(providers)
}

pub fn get_provider(conn: &Connection, id: &str) -> anyhow::Result<Option<Provider>> {
    let result = conn.query_row(
        "SELECT id, display_name, gender, age_group, status, timezone, availability, created_at, updated_at
         FROM providers WHERE id = ?1",
        params![id],
        |row| Ok(parse_provider_row(row)),
    );

    match result {
        Ok(provider) => Ok(Some(provider?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn delete_provider(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM providers WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_provider_row(row: &rusqlite::Row) -> anyhow::Result<Provider> {
    let id: String = row.get(0)?;
    let display_name: String = row.get(1)?;
    let gender_str: String = row.get(2)?;
    let age_group_str: Option<String> = row.get(3)?;
    let status_str: String = row.get(4)?;
    let timezone: String = row.get(5)?;
    let availability_json: String = row.get(6)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;

    let gender = Gender::parse(&gender_str)
        .ok_or_else(|| anyhow::anyhow!("provider {id}: invalid gender: {gender_str}"))?;

    Ok(Provider {
        id,
        display_name,
        gender,
        age_group: age_group_str.as_deref().and_then(crate::models::AgeGroup::parse),
        status: ProviderStatus::parse(&status_str),
        timezone,
        availability: WeeklyAvailability::from_json(&availability_json),
        created_at: parse_datetime(&created_at_str),
        updated_at: parse_datetime(&updated_at_str),
    })
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let selected_slots = serde_json::to_string(&booking.selected_slots)?;
    let booking_date = booking.booking_date.format(DATETIME_FMT).to_string();
    let renewal_date = booking.renewal_date.map(|d| d.format(DATE_FMT).to_string());
    let created_at = booking.created_at.format(DATETIME_FMT).to_string();
    let updated_at = booking.updated_at.format(DATETIME_FMT).to_string();

    conn.execute(
        "INSERT INTO bookings (id, provider_id, customer_gender, customer_age, selected_slots, timezone, booking_date, renewal_date, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            booking.id,
            booking.provider_id,
            booking.customer_gender.as_str(),
            booking.customer_age,
            selected_slots,
            booking.timezone,
            booking_date,
            renewal_date,
            booking.status.as_str(),
            created_at,
            updated_at,
        ],
    )?;
    Ok(())
}

pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let selected_slots = serde_json::to_string(&booking.selected_slots)?;
    let booking_date = booking.booking_date.format(DATETIME_FMT).to_string();
    let renewal_date = booking.renewal_date.map(|d| d.format(DATE_FMT).to_string());
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();

    let count = conn.execute(
        "UPDATE bookings SET provider_id = ?1, selected_slots = ?2, booking_date = ?3, renewal_date = ?4, status = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            booking.provider_id,
            selected_slots,
            booking_date,
            renewal_date,
            booking.status.as_str(),
            now,
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: &BookingStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            "SELECT id, provider_id, customer_gender, customer_age, selected_slots, timezone, booking_date, renewal_date, status, created_at, updated_at \
             FROM bookings WHERE status = ?1 ORDER BY created_at DESC LIMIT ?2"
                .to_string(),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            "SELECT id, provider_id, customer_gender, customer_age, selected_slots, timezone, booking_date, renewal_date, status, created_at, updated_at \
             FROM bookings ORDER BY created_at DESC LIMIT ?1"
                .to_string(),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, provider_id, customer_gender, customer_age, selected_slots, timezone, booking_date, renewal_date, status, created_at, updated_at \
         FROM bookings WHERE id = ?1",
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let provider_id: Option<String> = row.get(1)?;
    let gender_str: String = row.get(2)?;
    let customer_age: u32 = row.get(3)?;
    let selected_slots_json: String = row.get(4)?;
    let timezone: String = row.get(5)?;
    let booking_date_str: String = row.get(6)?;
    let renewal_date_str: Option<String> = row.get(7)?;
    let status_str: String = row.get(8)?;
    let created_at_str: String = row.get(9)?;
    let updated_at_str: String = row.get(10)?;

    let customer_gender = Gender::parse(&gender_str)
        .ok_or_else(|| anyhow::anyhow!("booking {id}: invalid gender: {gender_str}"))?;

    // Stored slots are historical data; a record with a damaged slot list
    // still loads, minus the damaged entries.
    let selected_slots: Vec<SelectedSlot> = serde_json::from_str::<serde_json::Value>(&selected_slots_json)
        .ok()
        .and_then(|v| v.as_array().cloned())
        .map(|items| {
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect()
        })
        .unwrap_or_default();

    Ok(Booking {
        id,
        provider_id,
        customer_gender,
        customer_age,
        selected_slots,
        timezone,
        booking_date: parse_datetime(&booking_date_str),
        renewal_date: renewal_date_str
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, DATE_FMT).ok()),
        status: BookingStatus::parse(&status_str),
        created_at: parse_datetime(&created_at_str),
        updated_at: parse_datetime(&updated_at_str),
    })
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{AgeGroup, DayOfWeek, TimeOfDay};

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn sample_provider(id: &str) -> Provider {
        let now = Utc::now().naive_utc();
        Provider {
            id: id.to_string(),
            display_name: "Amal".to_string(),
            gender: Gender::Female,
            age_group: Some(AgeGroup::Adult),
            status: ProviderStatus::Active,
            timezone: "Asia/Dubai".to_string(),
            availability: WeeklyAvailability::from_json(r#"{"sunday":["09:00:00","10:00:00"]}"#),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_booking(id: &str) -> Booking {
        let now = Utc::now().naive_utc();
        Booking {
            id: id.to_string(),
            provider_id: None,
            customer_gender: Gender::Female,
            customer_age: 27,
            selected_slots: vec![SelectedSlot {
                day: DayOfWeek::Sunday,
                time: TimeOfDay::parse("09:00:00").unwrap(),
                display_time: "13:00".to_string(),
                timezone: "Asia/Dubai".to_string(),
            }],
            timezone: "Asia/Dubai".to_string(),
            booking_date: now,
            renewal_date: NaiveDate::from_ymd_opt(2026, 9, 1),
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_provider_round_trip() {
        let conn = setup_db();
        let provider = sample_provider("p1");
        upsert_provider(&conn, &provider).unwrap();

        let loaded = get_provider(&conn, "p1").unwrap().unwrap();
        assert_eq!(loaded.display_name, "Amal");
        assert_eq!(loaded.gender, Gender::Female);
        assert_eq!(loaded.age_group, Some(AgeGroup::Adult));
        assert_eq!(loaded.availability, provider.availability);
    }

    #[test]
    fn test_provider_upsert_overwrites() {
        let conn = setup_db();
        let mut provider = sample_provider("p1");
        upsert_provider(&conn, &provider).unwrap();

        provider.status = ProviderStatus::Inactive;
        provider.display_name = "Amal K.".to_string();
        upsert_provider(&conn, &provider).unwrap();

        let providers = list_providers(&conn).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].status, ProviderStatus::Inactive);
        assert_eq!(providers[0].display_name, "Amal K.");
    }

    #[test]
    fn test_provider_delete() {
        let conn = setup_db();
        upsert_provider(&conn, &sample_provider("p1")).unwrap();
        assert!(delete_provider(&conn, "p1").unwrap());
        assert!(!delete_provider(&conn, "p1").unwrap());
        assert!(get_provider(&conn, "p1").unwrap().is_none());
    }

    #[test]
    fn test_booking_round_trip() {
        let conn = setup_db();
        let booking = sample_booking("b1");
        create_booking(&conn, &booking).unwrap();

        let loaded = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(loaded.customer_age, 27);
        assert_eq!(loaded.selected_slots, booking.selected_slots);
        assert_eq!(loaded.renewal_date, booking.renewal_date);
        assert_eq!(loaded.status, BookingStatus::Pending);
    }

    #[test]
    fn test_booking_status_filter() {
        let conn = setup_db();
        create_booking(&conn, &sample_booking("b1")).unwrap();
        create_booking(&conn, &sample_booking("b2")).unwrap();
        update_booking_status(&conn, "b2", &BookingStatus::Approved).unwrap();

        let pending = get_all_bookings(&conn, Some("pending"), 50).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "b1");

        let all = get_all_bookings(&conn, None, 50).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_update_booking_keeps_stored_slots_verbatim() {
        let conn = setup_db();
        let mut booking = sample_booking("b1");
        create_booking(&conn, &booking).unwrap();

        booking.provider_id = Some("p9".to_string());
        booking.status = BookingStatus::Approved;
        assert!(update_booking(&conn, &booking).unwrap());

        let loaded = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(loaded.provider_id.as_deref(), Some("p9"));
        // Slot identity survives untouched.
        assert_eq!(loaded.selected_slots[0].time.storage(), "09:00:00");
    }

    #[test]
    fn test_booking_with_damaged_slot_json_still_loads() {
        let conn = setup_db();
        let booking = sample_booking("b1");
        create_booking(&conn, &booking).unwrap();

        conn.execute(
            "UPDATE bookings SET selected_slots = ?1 WHERE id = ?2",
            params![r#"[{"day":"sunday","time":"09:00:00","display_time":"13:00","timezone":"Asia/Dubai"},{"broken":true}]"#, "b1"],
        )
        .unwrap();

        let loaded = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(loaded.selected_slots.len(), 1);
    }

    #[test]
    fn test_missing_rows_return_none() {
        let conn = setup_db();
        assert!(get_provider(&conn, "nope").unwrap().is_none());
        assert!(get_booking_by_id(&conn, "nope").unwrap().is_none());
    }
}
