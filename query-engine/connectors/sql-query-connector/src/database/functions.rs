//! SQL functions the filter renderer relies on.

use chrono::{Datelike, Timelike};
use query_structure::{format_date, format_time, parse_date, parse_datetime, parse_time, DatePart};
use regex::Regex;
use rusqlite::{
    functions::FunctionFlags,
    types::{Value as SqlValue, ValueRef},
    Connection,
};
use std::sync::Arc;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub(crate) fn register(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    // `text REGEXP pattern` calls `regexp(pattern, text)`.
    conn.create_scalar_function("regexp", 2, flags, |ctx| {
        let regex: Arc<Regex> = ctx.get_or_create_aux(0, |raw| -> Result<_, BoxError> {
            Ok(Regex::new(raw.as_str()?)?)
        })?;

        match ctx.get_raw(1) {
            ValueRef::Null => Ok(None),
            raw => {
                let text = raw
                    .as_str()
                    .map_err(|err| rusqlite::Error::UserFunctionError(err.into()))?;

                Ok(Some(regex.is_match(text)))
            }
        }
    })?;

    conn.create_scalar_function("date_part", 2, flags, |ctx| {
        let part: String = ctx.get(0)?;
        let value: Option<String> = ctx.get(1)?;

        Ok(value
            .and_then(|value| date_part(&part, &value))
            .unwrap_or(SqlValue::Null))
    })?;

    Ok(())
}

/// Extracts part of a stored date, datetime or time. `None` when the part
/// does not apply to the value, e.g. the hour of a date.
pub(crate) fn date_part(part: &str, text: &str) -> Option<SqlValue> {
    let (date, time) = if let Ok(datetime) = parse_datetime(text) {
        (Some(datetime.date()), Some(datetime.time()))
    } else if let Ok(date) = parse_date(text) {
        (Some(date), None)
    } else {
        (None, Some(parse_time(text).ok()?))
    };

    let value = match DatePart::parse(part)? {
        DatePart::Date => SqlValue::Text(format_date(&date?)),
        DatePart::Time => SqlValue::Text(format_time(&time?)),
        DatePart::Year => SqlValue::Integer(date?.year().into()),
        DatePart::IsoYear => SqlValue::Integer(date?.iso_week().year().into()),
        DatePart::Quarter => SqlValue::Integer((date?.month0() / 3 + 1).into()),
        DatePart::Month => SqlValue::Integer(date?.month().into()),
        DatePart::Week => SqlValue::Integer(date?.iso_week().week().into()),
        DatePart::IsoWeekDay => SqlValue::Integer(date?.weekday().number_from_monday().into()),
        DatePart::WeekDay => SqlValue::Integer(date?.weekday().number_from_sunday().into()),
        DatePart::Day => SqlValue::Integer(date?.day().into()),
        DatePart::Hour => SqlValue::Integer(time?.hour().into()),
        DatePart::Minute => SqlValue::Integer(time?.minute().into()),
        DatePart::Second => SqlValue::Integer(time?.second().into()),
    };

    Some(value)
}
