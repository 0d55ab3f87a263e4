// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Display formatting for pt-BR money and dates, plus the inverse parsers
//! used when decoding wire payloads and form fields.

use anyhow::{Context, Result, bail};
use time::macros::format_description;
use time::Date;

/// Cents to `R$ 1.234,56`.
pub fn format_brl_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let reais = cents / 100;
    let remainder = cents % 100;

    let digits = reais.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{sign}R$ {grouped},{remainder:02}")
}

pub fn format_optional_brl(cents: Option<i64>) -> String {
    match cents {
        Some(cents) => format_brl_cents(cents),
        None => "A combinar".to_owned(),
    }
}

/// `2026-08-29` to `29/08/2026`.
pub fn format_date_br(date: Date) -> String {
    date.format(&format_description!("[day]/[month]/[year]"))
        .unwrap_or_else(|_| date.to_string())
}

pub fn format_optional_date_br(date: Option<Date>) -> String {
    match date {
        Some(date) => format_date_br(date),
        None => "N/A".to_owned(),
    }
}

/// Parses the REST service's `YYYY-MM-DD` date columns.
pub fn parse_wire_date(raw: &str) -> Result<Date> {
    Date::parse(raw.trim(), &format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("invalid date {raw:?}; expected YYYY-MM-DD"))
}

pub fn format_wire_date(date: Date) -> String {
    date.format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

/// Parses user-entered prices. Accepts `120`, `120,50`, and `120.50`;
/// empty input means "price not set yet".
pub fn parse_optional_cents(raw: &str) -> Result<Option<i64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let normalized = trimmed.replace(',', ".");
    let (whole, frac) = match normalized.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (normalized.as_str(), ""),
    };

    if frac.len() > 2 || !frac.chars().all(|ch| ch.is_ascii_digit()) {
        bail!("invalid price {raw:?}; use at most two decimal places");
    }

    let whole: i64 = whole
        .parse()
        .with_context(|| format!("invalid price {raw:?}"))?;
    if whole < 0 {
        bail!("price cannot be negative, got {raw:?}");
    }

    let mut frac_cents: i64 = 0;
    if !frac.is_empty() {
        frac_cents = frac.parse::<i64>().with_context(|| format!("invalid price {raw:?}"))?;
        if frac.len() == 1 {
            frac_cents *= 10;
        }
    }

    Ok(Some(whole * 100 + frac_cents))
}
