// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Client for the hosted bakery backend: a capability trait covering every
//! remote operation the app performs, an HTTP implementation speaking the
//! service's REST dialect, and the typed error taxonomy call sites match on.

mod error;
mod http;
mod plan;
pub mod wire;

pub use error::{GatewayError, GatewayErrorKind};
pub use http::HttpGateway;
pub use plan::{CapCheck, check_monthly_cap, resolve_active_plan};

use fornada_app::{
    Customer, DeliveryKind, Order, OrderId, OrderStatus, Plan, UserId, UserRole, YearMonth,
};
use time::Date;

/// The signed-in identity plus the profile fields the UI shows in its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderScope {
    /// Every order the signed-in admin can see.
    All,
    /// Orders belonging to one customer.
    Customer(UserId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSort {
    IdDesc,
    CreatedDesc,
}

impl OrderSort {
    pub(crate) const fn query_value(self) -> &'static str {
        match self {
            Self::IdDesc => "id.desc",
            Self::CreatedDesc => "data_pedido.desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub scope: OrderScope,
    pub sort: OrderSort,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            scope: OrderScope::All,
            sort: OrderSort::IdDesc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: UserId,
    pub admin_id: UserId,
    pub theme: String,
    pub size_cm: Option<i32>,
    pub event_date: Date,
    pub delivery: DeliveryKind,
    pub description: String,
    pub note: String,
    pub delivery_address: Option<String>,
}

/// Fields a customer may change while an order is still pending. Status and
/// price are admin-only and deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPatch {
    pub theme: String,
    pub size_cm: Option<i32>,
    pub event_date: Date,
    pub delivery: DeliveryKind,
    pub description: String,
    pub note: String,
    pub delivery_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: String,
    pub whatsapp: String,
    pub address: fornada_app::Address,
}

/// Every remote operation the app performs, as a seam between the UI runtime
/// and the wire. `HttpGateway` talks to the real service; the testkit crate
/// provides an in-memory implementation.
pub trait Gateway {
    /// `Ok(None)` means no session, which is a normal logged-out state and
    /// never an error.
    fn current_user(&mut self) -> Result<Option<SessionUser>, GatewayError>;
    fn sign_out(&mut self) -> Result<(), GatewayError>;
    fn request_password_reset(&mut self, email: &str) -> Result<(), GatewayError>;

    fn list_orders(&mut self, query: &OrderQuery) -> Result<Vec<Order>, GatewayError>;
    fn get_order(&mut self, id: OrderId) -> Result<Order, GatewayError>;
    fn create_order(&mut self, order: &NewOrder) -> Result<Order, GatewayError>;
    fn update_order(&mut self, id: OrderId, patch: &OrderPatch) -> Result<Order, GatewayError>;
    fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), GatewayError>;
    fn delete_order(&mut self, id: OrderId) -> Result<(), GatewayError>;

    fn list_customers(&mut self) -> Result<Vec<Customer>, GatewayError>;
    fn get_customer(&mut self, id: &UserId) -> Result<Customer, GatewayError>;
    fn update_customer_profile(
        &mut self,
        id: &UserId,
        patch: &ProfilePatch,
    ) -> Result<(), GatewayError>;

    fn active_plan(&mut self, admin_id: &UserId) -> Result<Option<Plan>, GatewayError>;
    /// Count-only query; the rows themselves are never transferred.
    fn count_orders_in_month(
        &mut self,
        admin_id: &UserId,
        month: YearMonth,
    ) -> Result<usize, GatewayError>;
}
