// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Wire records for the REST service. Column names stay in the service's
//! Portuguese schema; conversions normalize them into the app model.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use fornada_app::{
    format_wire_date, parse_wire_date, Address, Customer, DeliveryKind, Order, OrderId,
    OrderStatus, Plan, PlanId, PlanKind, UserId, UserRole,
};

use crate::{error::GatewayError, NewOrder, OrderPatch, ProfilePatch};

#[derive(Debug, Clone, Deserialize)]
pub struct OrderRecord {
    pub id: i64,
    #[serde(rename = "id_cliente")]
    pub customer_id: String,
    #[serde(rename = "admin_id")]
    pub admin_id: String,
    #[serde(rename = "tema")]
    pub theme: String,
    #[serde(rename = "tamanho_bolo_cm", default)]
    pub size_cm: Option<i32>,
    #[serde(rename = "data_evento", default)]
    pub event_date: Option<String>,
    #[serde(rename = "tipo_entrega", default)]
    pub delivery: Option<String>,
    #[serde(rename = "descricao_pedido", default)]
    pub description: Option<String>,
    #[serde(rename = "observacao_pedido", default)]
    pub note: Option<String>,
    #[serde(rename = "endereco_entrega_completo", default)]
    pub delivery_address: Option<String>,
    #[serde(rename = "status_pedido", default)]
    pub status: Option<String>,
    #[serde(rename = "valor_pedido", default)]
    pub price: Option<f64>,
    #[serde(rename = "data_pedido")]
    pub created_at: String,
}

impl TryFrom<OrderRecord> for Order {
    type Error = GatewayError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        let event_date = match record.event_date.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(
                parse_wire_date(raw).map_err(|error| GatewayError::service(error.to_string()))?,
            ),
            _ => None,
        };

        let created_at = OffsetDateTime::parse(&record.created_at, &Rfc3339).map_err(|_| {
            GatewayError::service(format!("invalid data_pedido timestamp {:?}", record.created_at))
        })?;

        Ok(Order {
            id: OrderId::new(record.id),
            customer_id: UserId::new(record.customer_id),
            admin_id: UserId::new(record.admin_id),
            theme: record.theme,
            size_cm: record.size_cm,
            event_date,
            // Historical rows carry mixed-case values; anything unrecognized
            // falls back to pickup, the kind with no address requirement.
            delivery: record
                .delivery
                .as_deref()
                .and_then(DeliveryKind::parse)
                .unwrap_or(DeliveryKind::Retirar),
            description: record.description.unwrap_or_default(),
            note: record.note.unwrap_or_default(),
            delivery_address: record.delivery_address.filter(|line| !line.trim().is_empty()),
            status: OrderStatus::normalize(record.status.as_deref().unwrap_or("")),
            price_cents: record.price.map(reais_to_cents),
            created_at,
        })
    }
}

fn reais_to_cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

#[derive(Debug, Clone, Serialize)]
pub struct NewOrderRecord {
    #[serde(rename = "id_cliente")]
    pub customer_id: String,
    #[serde(rename = "admin_id")]
    pub admin_id: String,
    #[serde(rename = "tema")]
    pub theme: String,
    #[serde(rename = "tamanho_bolo_cm")]
    pub size_cm: Option<i32>,
    #[serde(rename = "data_evento")]
    pub event_date: String,
    #[serde(rename = "tipo_entrega")]
    pub delivery: &'static str,
    #[serde(rename = "descricao_pedido")]
    pub description: String,
    #[serde(rename = "observacao_pedido")]
    pub note: String,
    #[serde(rename = "endereco_entrega_completo")]
    pub delivery_address: Option<String>,
    #[serde(rename = "status_pedido")]
    pub status: &'static str,
}

impl From<&NewOrder> for NewOrderRecord {
    fn from(order: &NewOrder) -> Self {
        Self {
            customer_id: order.customer_id.as_str().to_owned(),
            admin_id: order.admin_id.as_str().to_owned(),
            theme: order.theme.clone(),
            size_cm: order.size_cm,
            event_date: format_wire_date(order.event_date),
            delivery: order.delivery.as_str(),
            description: order.description.clone(),
            note: order.note.clone(),
            delivery_address: order.delivery_address.clone(),
            // New orders always start pending; the admin moves them forward.
            status: OrderStatus::Pendente.as_str(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderPatchRecord {
    #[serde(rename = "tema")]
    pub theme: String,
    #[serde(rename = "tamanho_bolo_cm")]
    pub size_cm: Option<i32>,
    #[serde(rename = "data_evento")]
    pub event_date: String,
    #[serde(rename = "tipo_entrega")]
    pub delivery: &'static str,
    #[serde(rename = "descricao_pedido")]
    pub description: String,
    #[serde(rename = "observacao_pedido")]
    pub note: String,
    #[serde(rename = "endereco_entrega_completo")]
    pub delivery_address: Option<String>,
}

impl From<&OrderPatch> for OrderPatchRecord {
    fn from(patch: &OrderPatch) -> Self {
        Self {
            theme: patch.theme.clone(),
            size_cm: patch.size_cm,
            event_date: format_wire_date(patch.event_date),
            delivery: patch.delivery.as_str(),
            description: patch.description.clone(),
            note: patch.note.clone(),
            delivery_address: patch.delivery_address.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusPatchRecord {
    #[serde(rename = "status_pedido")]
    pub status: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "tipo", default)]
    pub role: Option<String>,
    #[serde(rename = "rua", default)]
    pub street: Option<String>,
    #[serde(rename = "numero_casa", default)]
    pub number: Option<String>,
    #[serde(rename = "complemento", default)]
    pub complement: Option<String>,
    #[serde(rename = "bairro", default)]
    pub neighborhood: Option<String>,
    #[serde(rename = "cidade", default)]
    pub city: Option<String>,
    #[serde(rename = "estado", default)]
    pub state: Option<String>,
    #[serde(rename = "cep", default)]
    pub postal_code: Option<String>,
    #[serde(rename = "ponto_referencia", default)]
    pub landmark: Option<String>,
    #[serde(rename = "foto_perfil_url", default)]
    pub photo_path: Option<String>,
}

impl UserRecord {
    pub fn role(&self) -> UserRole {
        self.role
            .as_deref()
            .and_then(UserRole::parse)
            .unwrap_or(UserRole::Cliente)
    }
}

impl From<UserRecord> for Customer {
    fn from(record: UserRecord) -> Self {
        Customer {
            user_id: UserId::new(record.id),
            name: record.name.unwrap_or_default(),
            whatsapp: record.whatsapp.unwrap_or_default(),
            email: record.email.unwrap_or_default(),
            address: Address {
                street: record.street.unwrap_or_default(),
                number: record.number.unwrap_or_default(),
                complement: record.complement.unwrap_or_default(),
                neighborhood: record.neighborhood.unwrap_or_default(),
                city: record.city.unwrap_or_default(),
                state: record.state.unwrap_or_default(),
                postal_code: record.postal_code.unwrap_or_default(),
                landmark: record.landmark.unwrap_or_default(),
            },
            photo_path: record.photo_path.filter(|path| !path.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfilePatchRecord {
    #[serde(rename = "nome")]
    pub name: String,
    pub whatsapp: String,
    #[serde(rename = "rua")]
    pub street: String,
    #[serde(rename = "numero_casa")]
    pub number: String,
    #[serde(rename = "complemento")]
    pub complement: String,
    #[serde(rename = "bairro")]
    pub neighborhood: String,
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "cep")]
    pub postal_code: String,
    #[serde(rename = "ponto_referencia")]
    pub landmark: String,
}

impl From<&ProfilePatch> for ProfilePatchRecord {
    fn from(patch: &ProfilePatch) -> Self {
        Self {
            name: patch.name.clone(),
            whatsapp: patch.whatsapp.clone(),
            street: patch.address.street.clone(),
            number: patch.address.number.clone(),
            complement: patch.address.complement.clone(),
            neighborhood: patch.address.neighborhood.clone(),
            city: patch.address.city.clone(),
            state: patch.address.state.clone(),
            postal_code: patch.address.postal_code.clone(),
            landmark: patch.address.landmark.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanRecord {
    pub id: i64,
    #[serde(rename = "admin_id")]
    pub admin_id: String,
    #[serde(rename = "plano", default)]
    pub kind: Option<String>,
    #[serde(rename = "ativo", default)]
    pub active: bool,
    #[serde(rename = "data_ativacao")]
    pub activated_on: String,
    #[serde(rename = "data_vencimento", default)]
    pub expires_on: Option<String>,
}

impl TryFrom<PlanRecord> for Plan {
    type Error = GatewayError;

    fn try_from(record: PlanRecord) -> Result<Self, Self::Error> {
        let activated_on = parse_wire_date(&record.activated_on)
            .map_err(|error| GatewayError::service(error.to_string()))?;
        let expires_on = match record.expires_on.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(
                parse_wire_date(raw).map_err(|error| GatewayError::service(error.to_string()))?,
            ),
            _ => None,
        };

        Ok(Plan {
            id: PlanId::new(record.id),
            admin_id: UserId::new(record.admin_id),
            kind: record
                .kind
                .as_deref()
                .and_then(PlanKind::parse)
                .unwrap_or(PlanKind::Gratuito),
            active: record.active,
            activated_on,
            expires_on,
        })
    }
}

/// Session payload from the auth endpoint. Only the fields the app needs.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUserRecord {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}
