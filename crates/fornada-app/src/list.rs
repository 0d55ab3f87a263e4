// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Order-list view-model: a pure function from a raw data snapshot plus
//! filter state to display rows and pagination metadata. No I/O happens
//! here; loading and rendering live in the gateway and tui crates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::format::{format_date_br, format_optional_brl};
use crate::ids::{OrderId, UserId};
use crate::model::{Customer, Order, OrderStatus};

pub const DEFAULT_PAGE_SIZE: usize = 3;

/// The "ativos" summary-card shortcut: approved plus in production.
pub const ACTIVE_STATUSES: [OrderStatus; 2] = [OrderStatus::Aprovado, OrderStatus::EmProducao];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    Any,
    One(OrderStatus),
    Group(Vec<OrderStatus>),
}

impl StatusFilter {
    pub fn matches(&self, status: OrderStatus) -> bool {
        match self {
            Self::Any => true,
            Self::One(wanted) => *wanted == status,
            Self::Group(wanted) => wanted.contains(&status),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Any => "todos".to_owned(),
            Self::One(status) => status.label().to_owned(),
            Self::Group(statuses) => statuses
                .iter()
                .map(|status| status.label())
                .collect::<Vec<_>>()
                .join("+"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: Month,
}

impl YearMonth {
    pub fn parse(raw: &str) -> Option<Self> {
        let (year, month) = raw.trim().split_once('-')?;
        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        let year: i32 = year.parse().ok()?;
        let month: u8 = month.parse().ok()?;
        let month = Month::try_from(month).ok()?;
        Some(Self { year, month })
    }

    pub const fn contains(self, date: Date) -> bool {
        date.year() == self.year && date.month() as u8 == self.month as u8
    }

    pub fn label(self) -> String {
        format!("{:02}/{}", self.month as u8, self.year)
    }
}

impl From<Date> for YearMonth {
    fn from(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Filter and pagination state for the order list. Owned by the list screen;
/// nothing outside the view-model layer mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub search: String,
    pub status: StatusFilter,
    pub month: Option<YearMonth>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: StatusFilter::Any,
            month: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListFilter {
    /// Any filter change other than paging restarts at page one.
    pub fn reset_page(&mut self) {
        self.page = 1;
    }

    pub fn is_filtered(&self) -> bool {
        !self.search.trim().is_empty() || self.status != StatusFilter::Any || self.month.is_some()
    }
}

/// One rendered line of the order list: raw order fields joined with the
/// resolved customer and pre-formatted display strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub id: OrderId,
    pub theme: String,
    pub customer_name: String,
    pub customer_whatsapp: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub delivery_label: &'static str,
    pub event_date: Option<Date>,
    pub event_date_label: String,
    pub price_label: String,
    pub editable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderListPage {
    pub rows: Vec<OrderRow>,
    pub page: usize,
    pub total_pages: usize,
    pub total_filtered: usize,
}

impl OrderListPage {
    pub fn pager_label(&self) -> String {
        format!("página {} de {}", self.page, self.total_pages.max(1))
    }
}

/// Applies the filter stages in order: free text, then status, then month.
/// Orders without an event date are excluded while a month filter is active.
pub fn filter_orders<'a>(
    orders: &'a [Order],
    customers: &HashMap<UserId, Customer>,
    filter: &ListFilter,
) -> Vec<&'a Order> {
    let needle = filter.search.trim().to_lowercase();

    orders
        .iter()
        .filter(|order| {
            if needle.is_empty() {
                return true;
            }
            let name_matches = customers
                .get(&order.customer_id)
                .map(|customer| customer.name.to_lowercase().contains(&needle))
                .unwrap_or(false);
            name_matches || order.theme.to_lowercase().contains(&needle)
        })
        .filter(|order| filter.status.matches(order.status))
        .filter(|order| match filter.month {
            None => true,
            Some(month) => order.event_date.is_some_and(|date| month.contains(date)),
        })
        .collect()
}

/// Builds the visible page. The requested page is clamped into
/// `[1, total_pages]` so a shrinking result set never strands the view on
/// an empty page.
pub fn build_order_list_page(
    orders: &[Order],
    customers: &HashMap<UserId, Customer>,
    filter: &ListFilter,
) -> OrderListPage {
    let filtered = filter_orders(orders, customers, filter);
    let page_size = filter.page_size.max(1);
    let total_filtered = filtered.len();
    let total_pages = total_filtered.div_ceil(page_size);
    let page = filter.page.clamp(1, total_pages.max(1));

    let start = (page - 1) * page_size;
    let rows = filtered
        .into_iter()
        .skip(start)
        .take(page_size)
        .map(|order| order_row(order, customers))
        .collect();

    OrderListPage {
        rows,
        page,
        total_pages,
        total_filtered,
    }
}

fn order_row(order: &Order, customers: &HashMap<UserId, Customer>) -> OrderRow {
    let (customer_name, customer_whatsapp) = match customers.get(&order.customer_id) {
        Some(customer) => (customer.name.clone(), customer.whatsapp.clone()),
        None => ("N/A".to_owned(), "N/A".to_owned()),
    };

    OrderRow {
        id: order.id,
        theme: order.theme.clone(),
        customer_name,
        customer_whatsapp,
        status: order.status,
        status_label: order.status.label(),
        status_class: order.status.as_str(),
        delivery_label: order.delivery.label(),
        event_date: order.event_date,
        event_date_label: match order.event_date {
            Some(date) => format_date_br(date),
            None => "N/A".to_owned(),
        },
        price_label: format_optional_brl(order.price_cents),
        editable: order.editable_by_customer(),
    }
}

/// Sequences overlapping list reloads. Each reload takes a token from
/// `begin`; a response is applied only if `admit` accepts its token, so a
/// slow early response cannot overwrite a newer one.
#[derive(Debug, Clone, Default)]
pub struct ReloadGate {
    issued: u64,
    admitted: u64,
}

impl ReloadGate {
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn admit(&mut self, token: u64) -> bool {
        if token < self.admitted {
            return false;
        }
        self.admitted = token;
        true
    }
}
