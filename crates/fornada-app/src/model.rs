// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pendente,
    Aprovado,
    EmProducao,
    Finalizado,
    Entregue,
    Cancelado,
}

impl OrderStatus {
    pub const ALL: [Self; 6] = [
        Self::Pendente,
        Self::Aprovado,
        Self::EmProducao,
        Self::Finalizado,
        Self::Entregue,
        Self::Cancelado,
    ];

    /// Canonical wire form: lowercase ASCII with hyphen separators.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pendente => "pendente",
            Self::Aprovado => "aprovado",
            Self::EmProducao => "em-producao",
            Self::Finalizado => "finalizado",
            Self::Entregue => "entregue",
            Self::Cancelado => "cancelado",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pendente => "Pendente",
            Self::Aprovado => "Aprovado",
            Self::EmProducao => "Em Produção",
            Self::Finalizado => "Finalizado",
            Self::Entregue => "Entregue",
            Self::Cancelado => "Cancelado",
        }
    }

    /// Accepts any casing, accented or plain letters, and space/underscore/hyphen
    /// separators. `"Em Produção"`, `"em_producao"`, and `"em-producao"` all map
    /// to the same variant.
    pub fn parse(value: &str) -> Option<Self> {
        match fold_status_text(value).as_str() {
            "pendente" => Some(Self::Pendente),
            "aprovado" => Some(Self::Aprovado),
            "em-producao" => Some(Self::EmProducao),
            "finalizado" => Some(Self::Finalizado),
            "entregue" => Some(Self::Entregue),
            "cancelado" => Some(Self::Cancelado),
            _ => None,
        }
    }

    /// Unknown or absent statuses render as Pendente rather than failing.
    pub fn normalize(value: &str) -> Self {
        Self::parse(value).unwrap_or(Self::Pendente)
    }
}

fn fold_status_text(value: &str) -> String {
    let mut folded = String::with_capacity(value.len());
    for ch in value.trim().chars() {
        let mapped = match ch {
            ' ' | '_' => '-',
            'á' | 'à' | 'â' | 'ã' | 'Á' | 'À' | 'Â' | 'Ã' => 'a',
            'é' | 'ê' | 'É' | 'Ê' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'ô' | 'õ' | 'Ó' | 'Ô' | 'Õ' => 'o',
            'ú' | 'Ú' => 'u',
            'ç' | 'Ç' => 'c',
            other => other.to_ascii_lowercase(),
        };
        folded.push(mapped);
    }
    folded
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryKind {
    Retirar,
    Entregar,
}

impl DeliveryKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Retirar => "RETIRAR",
            Self::Entregar => "ENTREGAR",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Retirar => "Retirada",
            Self::Entregar => "Entrega",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "RETIRAR" => Some(Self::Retirar),
            "ENTREGAR" => Some(Self::Entregar),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Cliente,
    Admin,
    Superadmin,
}

impl UserRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cliente => "cliente",
            Self::Admin => "admin",
            Self::Superadmin => "superadmin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cliente" => Some(Self::Cliente),
            "admin" => Some(Self::Admin),
            "superadmin" => Some(Self::Superadmin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanKind {
    Gratuito,
    Premium,
}

impl PlanKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gratuito => "gratuito",
            Self::Premium => "premium",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Gratuito => "Gratuito",
            Self::Premium => "Premium",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gratuito" => Some(Self::Gratuito),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }
}

/// Orders a free plan may carry per calendar month, keyed on event date.
pub const FREE_PLAN_MONTHLY_ORDER_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    pub admin_id: UserId,
    pub theme: String,
    pub size_cm: Option<i32>,
    pub event_date: Option<Date>,
    pub delivery: DeliveryKind,
    pub description: String,
    pub note: String,
    pub delivery_address: Option<String>,
    pub status: OrderStatus,
    pub price_cents: Option<i64>,
    pub created_at: OffsetDateTime,
}

impl Order {
    /// Customers may only touch orders an admin has not yet picked up.
    pub const fn editable_by_customer(&self) -> bool {
        matches!(self.status, OrderStatus::Pendente)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub landmark: String,
}

impl Address {
    /// Complement and landmark stay optional; everything else must be filled
    /// before a delivery order can be placed.
    pub fn is_complete(&self) -> bool {
        [
            &self.street,
            &self.number,
            &self.neighborhood,
            &self.city,
            &self.state,
            &self.postal_code,
        ]
        .iter()
        .all(|part| !part.trim().is_empty())
    }

    pub fn full_line(&self) -> String {
        [
            self.street.as_str(),
            self.number.as_str(),
            self.complement.as_str(),
            self.neighborhood.as_str(),
            self.city.as_str(),
            self.state.as_str(),
            self.postal_code.as_str(),
            self.landmark.as_str(),
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub user_id: UserId,
    pub name: String,
    pub whatsapp: String,
    pub email: String,
    pub address: Address,
    pub photo_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub admin_id: UserId,
    pub kind: PlanKind,
    pub active: bool,
    pub activated_on: Date,
    pub expires_on: Option<Date>,
}

impl Plan {
    /// A premium plan past its expiration date no longer counts as premium.
    /// Free plans never expire.
    pub fn is_expired(&self, today: Date) -> bool {
        match (self.kind, self.expires_on) {
            (PlanKind::Premium, Some(expires_on)) => expires_on < today,
            _ => false,
        }
    }

    pub fn summary_line(&self, today: Date) -> String {
        if self.is_expired(today) {
            format!("{} (vencido)", self.kind.label())
        } else {
            self.kind.label().to_owned()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DashboardTotals {
    pub revenue_month_cents: i64,
    pub revenue_year_cents: i64,
    pub order_count: usize,
    pub customer_count: usize,
    pub orders_per_month: [usize; 12],
}

impl DashboardTotals {
    /// Revenue and the histogram only count orders that went past approval.
    pub fn from_orders(orders: &[Order], customers: usize, today: Date) -> Self {
        let mut totals = Self {
            customer_count: customers,
            order_count: orders.len(),
            ..Self::default()
        };

        for order in orders {
            if matches!(order.status, OrderStatus::Pendente | OrderStatus::Cancelado) {
                continue;
            }
            let Some(event_date) = order.event_date else {
                continue;
            };
            if event_date.year() != today.year() {
                continue;
            }

            let month_index = event_date.month() as usize - 1;
            totals.orders_per_month[month_index] += 1;

            if let Some(price) = order.price_cents {
                totals.revenue_year_cents += price;
                if event_date.month() == today.month() {
                    totals.revenue_month_cents += price;
                }
            }
        }

        totals
    }
}
