//! Reservation tools: list slots, book, cancel.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ToolError, ToolKind};
use crate::reservations::{parse_date, parse_time, ReservationBook};

#[derive(Debug, Deserialize)]
struct ListSlotsArgs {
    date: String,
}

#[derive(Debug, Deserialize)]
struct BookArgs {
    date: String,
    time: String,
    name: String,
    #[serde(alias = "number_persons", deserialize_with = "party_size")]
    party_size: i64,
}

#[derive(Debug, Deserialize)]
struct CancelArgs {
    date: String,
    time: String,
}

pub(super) fn parameters_schema(kind: ToolKind) -> Value {
    let date = json!({
        "type": "string",
        "description": "Date of the reservation. Format YYYY-mm-dd"
    });
    let time = json!({
        "type": "string",
        "description": "Time slot. Format HH:MM"
    });

    match kind {
        ToolKind::ListSlots => json!({
            "type": "object",
            "properties": { "date": date },
            "required": ["date"]
        }),
        ToolKind::Book => json!({
            "type": "object",
            "properties": {
                "date": date,
                "time": time,
                "name": {
                    "type": "string",
                    "description": "Name of the person booking the table"
                },
                "party_size": {
                    "type": "integer",
                    "description": "Number of persons on the reservation"
                }
            },
            "required": ["date", "time", "name", "party_size"]
        }),
        ToolKind::Cancel => json!({
            "type": "object",
            "properties": { "date": date, "time": time },
            "required": ["date", "time"]
        }),
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(kind: ToolKind, args: Value) -> Result<T, ToolError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments {
        tool: kind.name(),
        reason: e.to_string(),
    })
}

/// Models sometimes quote numbers; accept `2` and `"2"` alike.
fn party_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("party_size must be an integer, got {}", n))),
        Value::String(s) => s.trim().parse().map_err(|_| {
            de::Error::custom(format!("party_size must be an integer, got \"{}\"", s))
        }),
        other => Err(de::Error::custom(format!(
            "party_size must be an integer, got {}",
            other
        ))),
    }
}

pub(super) async fn list_slots(book: &ReservationBook, args: Value) -> Result<Value, ToolError> {
    let args: ListSlotsArgs = parse_args(ToolKind::ListSlots, args)?;
    let date = parse_date(&args.date)?;
    Ok(book.list_slots(date).await?.to_json())
}

pub(super) async fn book(book: &ReservationBook, args: Value) -> Result<Value, ToolError> {
    let args: BookArgs = parse_args(ToolKind::Book, args)?;
    let date = parse_date(&args.date)?;
    let time = parse_time(&args.time)?;
    book.book(date, time, &args.name, args.party_size).await?;
    Ok(Value::Null)
}

pub(super) async fn cancel(book: &ReservationBook, args: Value) -> Result<Value, ToolError> {
    let args: CancelArgs = parse_args(ToolKind::Cancel, args)?;
    let date = parse_date(&args.date)?;
    let time = parse_time(&args.time)?;
    Ok(Value::Bool(book.cancel(date, time).await?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::super::ToolRegistry;
    use super::*;
    use crate::reservations::{BookingPolicy, ReservationError, Schedule};

    fn registry() -> ToolRegistry {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ToolRegistry::new(Arc::new(ReservationBook::new(
            today,
            &Schedule::default(),
            BookingPolicy::Reject,
        )))
    }

    async fn list_day(tools: &ToolRegistry, date: &str) -> Value {
        let listed = tools
            .execute("list_slots", json!({ "date": date }))
            .await
            .expect("list");
        serde_json::from_str(&listed).expect("json")
    }

    #[tokio::test]
    async fn book_list_cancel_scenario() {
        let tools = registry();

        let booked = tools
            .execute(
                "book",
                json!({"date": "2024-01-01", "time": "19:00", "name": "Alice", "party_size": 2}),
            )
            .await
            .expect("book");
        assert_eq!(booked, "null");

        let listed = list_day(&tools, "2024-01-01").await;
        assert_eq!(listed["19:00"], json!({"name": "Alice", "party_size": 2}));
        assert_eq!(listed.as_object().map(|m| m.len()), Some(8));

        let cancelled = tools
            .execute("cancel", json!({"date": "2024-01-01", "time": "19:00"}))
            .await
            .expect("cancel");
        assert_eq!(cancelled, "true");

        let listed = list_day(&tools, "2024-01-01").await;
        assert_eq!(listed["19:00"], Value::Null);
    }

    #[tokio::test]
    async fn legacy_argument_names_and_quoted_numbers_are_accepted() {
        let tools = registry();
        tools
            .execute(
                "book_table",
                json!({
                    "date": "2024-01-02",
                    "time": "18:30",
                    "name": "Bob",
                    "number_persons": "3"
                }),
            )
            .await
            .expect("book");

        let slots = tools
            .book()
            .list_slots(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
            .await
            .expect("list");
        assert_eq!(slots.to_json()["18:30"]["party_size"], 3);
    }

    #[tokio::test]
    async fn malformed_arguments_are_dispatch_errors() {
        let tools = registry();

        let err = tools.execute("book", json!({"date": "2024-01-01"})).await.unwrap_err();
        assert!(err.is_dispatch_error());
        assert!(matches!(err, ToolError::InvalidArguments { tool: "book", .. }));

        let err = tools
            .execute(
                "book",
                json!({"date": "2024-01-01", "time": "19:00", "name": "Al", "party_size": "two"}),
            )
            .await
            .unwrap_err();
        assert!(err.is_dispatch_error());

        let err = tools.execute("list_slots", Value::Null).await.unwrap_err();
        assert!(err.is_dispatch_error());

        let err = tools.execute("order_food", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref name) if name == "order_food"));
    }

    #[tokio::test]
    async fn store_validation_surfaces_as_reservation_errors() {
        let tools = registry();

        let err = tools.execute("list_slots", json!({"date": "2023-12-31"})).await.unwrap_err();
        assert!(matches!(err, ToolError::Reservation(ReservationError::InvalidDate(_))));
        assert!(!err.is_dispatch_error());

        let err = tools
            .execute("cancel", json!({"date": "2024-01-01", "time": "7pm"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Reservation(ReservationError::InvalidTimeSlot(_))));
    }
}
