// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! In-memory `Gateway` implementation plus demo fixtures. Used by the
//! `--demo` launch mode and by runtime tests that need a backend without
//! a network.

use std::collections::VecDeque;

use time::{Date, Duration, Month, OffsetDateTime};

use fornada_app::{
    Address, Customer, DeliveryKind, Order, OrderId, OrderStatus, Plan, PlanId, PlanKind, UserId,
    UserRole, YearMonth,
};
use fornada_gateway::{
    Gateway, GatewayError, GatewayErrorKind, NewOrder, OrderPatch, OrderQuery, OrderScope,
    OrderSort, ProfilePatch, SessionUser, resolve_active_plan,
};

const CAKE_THEMES: [&str; 10] = [
    "Dinossauros",
    "Unicórnio",
    "Futebol",
    "Jardim Encantado",
    "Super Heróis",
    "Praia",
    "Floresta",
    "Circo",
    "Galáxia",
    "Borboletas",
];

const CUSTOMER_NAMES: [&str; 6] = [
    "Maria Souza",
    "João Pereira",
    "Ana Lima",
    "Carlos Ferreira",
    "Beatriz Ramos",
    "Pedro Alves",
];

const DESCRIPTIONS: [&str; 4] = [
    "Bolo de chocolate com brigadeiro",
    "Bolo de baunilha com chantilly",
    "Bolo red velvet com cream cheese",
    "Bolo de cenoura com cobertura de chocolate",
];

pub const DEMO_ADMIN_ID: &str = "admin-demo";

/// Vec-backed gateway. Operations behave like the hosted service from the
/// app's point of view; `fail_next` injects one failure for error-path tests.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    orders: Vec<Order>,
    customers: Vec<Customer>,
    plans: Vec<Plan>,
    session: Option<SessionUser>,
    next_order_id: i64,
    injected_failures: VecDeque<GatewayError>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            next_order_id: 1,
            ..Self::default()
        }
    }

    pub fn sign_in(&mut self, user: SessionUser) {
        self.session = Some(user);
    }

    /// Queues an error returned by the next gateway call.
    pub fn fail_next(&mut self, error: GatewayError) {
        self.injected_failures.push_back(error);
    }

    pub fn insert_customer(&mut self, customer: Customer) {
        self.customers.push(customer);
    }

    pub fn insert_plan(&mut self, plan: Plan) {
        self.plans.push(plan);
    }

    pub fn insert_order(&mut self, mut order: Order) -> OrderId {
        let id = OrderId::new(self.next_order_id);
        self.next_order_id += 1;
        order.id = id;
        self.orders.push(order);
        id
    }

    pub fn set_order_status(&mut self, id: OrderId, status: OrderStatus) {
        if let Some(order) = self.orders.iter_mut().find(|order| order.id == id) {
            order.status = status;
        }
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    fn take_injected(&mut self) -> Result<(), GatewayError> {
        match self.injected_failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Gateway for MemoryGateway {
    fn current_user(&mut self) -> Result<Option<SessionUser>, GatewayError> {
        self.take_injected()?;
        Ok(self.session.clone())
    }

    fn sign_out(&mut self) -> Result<(), GatewayError> {
        self.take_injected()?;
        self.session = None;
        Ok(())
    }

    fn request_password_reset(&mut self, _email: &str) -> Result<(), GatewayError> {
        self.take_injected()
    }

    fn list_orders(&mut self, query: &OrderQuery) -> Result<Vec<Order>, GatewayError> {
        self.take_injected()?;
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|order| match &query.scope {
                OrderScope::All => true,
                OrderScope::Customer(customer_id) => order.customer_id == *customer_id,
            })
            .cloned()
            .collect();
        match query.sort {
            OrderSort::IdDesc => orders.sort_by(|a, b| b.id.cmp(&a.id)),
            OrderSort::CreatedDesc => orders.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        Ok(orders)
    }

    fn get_order(&mut self, id: OrderId) -> Result<Order, GatewayError> {
        self.take_injected()?;
        self.orders
            .iter()
            .find(|order| order.id == id)
            .cloned()
            .ok_or_else(|| {
                GatewayError::new(
                    GatewayErrorKind::NotFound,
                    format!("order {} not found", id.get()),
                )
            })
    }

    fn create_order(&mut self, order: &NewOrder) -> Result<Order, GatewayError> {
        self.take_injected()?;
        let created = Order {
            id: OrderId::new(0),
            customer_id: order.customer_id.clone(),
            admin_id: order.admin_id.clone(),
            theme: order.theme.clone(),
            size_cm: order.size_cm,
            event_date: Some(order.event_date),
            delivery: order.delivery,
            description: order.description.clone(),
            note: order.note.clone(),
            delivery_address: order.delivery_address.clone(),
            status: OrderStatus::Pendente,
            price_cents: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let id = self.insert_order(created);
        self.get_order(id)
    }

    fn update_order(&mut self, id: OrderId, patch: &OrderPatch) -> Result<Order, GatewayError> {
        self.take_injected()?;
        let order = self
            .orders
            .iter_mut()
            .find(|order| order.id == id)
            .ok_or_else(|| {
                GatewayError::new(
                    GatewayErrorKind::NotFound,
                    format!("order {} not found", id.get()),
                )
            })?;
        order.theme = patch.theme.clone();
        order.size_cm = patch.size_cm;
        order.event_date = Some(patch.event_date);
        order.delivery = patch.delivery;
        order.description = patch.description.clone();
        order.note = patch.note.clone();
        order.delivery_address = patch.delivery_address.clone();
        Ok(order.clone())
    }

    fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), GatewayError> {
        self.take_injected()?;
        self.set_order_status(id, status);
        Ok(())
    }

    fn delete_order(&mut self, id: OrderId) -> Result<(), GatewayError> {
        self.take_injected()?;
        let before = self.orders.len();
        self.orders.retain(|order| order.id != id);
        if self.orders.len() == before {
            return Err(GatewayError::new(
                GatewayErrorKind::NotFound,
                format!("order {} not found", id.get()),
            ));
        }
        Ok(())
    }

    fn list_customers(&mut self) -> Result<Vec<Customer>, GatewayError> {
        self.take_injected()?;
        Ok(self.customers.clone())
    }

    fn get_customer(&mut self, id: &UserId) -> Result<Customer, GatewayError> {
        self.take_injected()?;
        self.customers
            .iter()
            .find(|customer| customer.user_id == *id)
            .cloned()
            .ok_or_else(|| {
                GatewayError::new(
                    GatewayErrorKind::NotFound,
                    format!("customer {} not found", id.as_str()),
                )
            })
    }

    fn update_customer_profile(
        &mut self,
        id: &UserId,
        patch: &ProfilePatch,
    ) -> Result<(), GatewayError> {
        self.take_injected()?;
        let customer = self
            .customers
            .iter_mut()
            .find(|customer| customer.user_id == *id)
            .ok_or_else(|| {
                GatewayError::new(
                    GatewayErrorKind::NotFound,
                    format!("customer {} not found", id.as_str()),
                )
            })?;
        customer.name = patch.name.clone();
        customer.whatsapp = patch.whatsapp.clone();
        customer.address = patch.address.clone();
        Ok(())
    }

    fn active_plan(&mut self, admin_id: &UserId) -> Result<Option<Plan>, GatewayError> {
        self.take_injected()?;
        let plans: Vec<Plan> = self
            .plans
            .iter()
            .filter(|plan| plan.admin_id == *admin_id && plan.active)
            .cloned()
            .collect();
        Ok(resolve_active_plan(plans, OffsetDateTime::now_utc().date()))
    }

    fn count_orders_in_month(
        &mut self,
        admin_id: &UserId,
        month: YearMonth,
    ) -> Result<usize, GatewayError> {
        self.take_injected()?;
        Ok(self
            .orders
            .iter()
            .filter(|order| order.admin_id == *admin_id)
            .filter(|order| order.event_date.is_some_and(|date| month.contains(date)))
            .count())
    }
}

pub fn demo_customer(index: usize) -> Customer {
    let name = CUSTOMER_NAMES[index % CUSTOMER_NAMES.len()];
    let complete = index % 3 != 2;
    Customer {
        user_id: UserId::new(format!("cliente-{}", index + 1)),
        name: name.to_owned(),
        whatsapp: format!("419999{:05}", index),
        email: format!("cliente{}@example.com", index + 1),
        address: if complete {
            Address {
                street: "Rua das Flores".to_owned(),
                number: format!("{}", 100 + index),
                complement: String::new(),
                neighborhood: "Centro".to_owned(),
                city: "Curitiba".to_owned(),
                state: "PR".to_owned(),
                postal_code: "80000-000".to_owned(),
                landmark: String::new(),
            }
        } else {
            Address::default()
        },
        photo_path: None,
    }
}

pub fn demo_order(index: usize, customer_id: &UserId, event_date: Date) -> Order {
    let statuses = [
        OrderStatus::Pendente,
        OrderStatus::Aprovado,
        OrderStatus::EmProducao,
        OrderStatus::Finalizado,
        OrderStatus::Entregue,
        OrderStatus::Cancelado,
    ];
    Order {
        id: OrderId::new(0),
        customer_id: customer_id.clone(),
        admin_id: UserId::from(DEMO_ADMIN_ID),
        theme: CAKE_THEMES[index % CAKE_THEMES.len()].to_owned(),
        size_cm: Some(15 + (index % 4) as i32 * 5),
        event_date: Some(event_date),
        delivery: if index % 2 == 0 {
            DeliveryKind::Retirar
        } else {
            DeliveryKind::Entregar
        },
        description: DESCRIPTIONS[index % DESCRIPTIONS.len()].to_owned(),
        note: String::new(),
        delivery_address: None,
        status: statuses[index % statuses.len()],
        price_cents: Some(8_000 + (index as i64) * 1_500),
        created_at: OffsetDateTime::now_utc() - Duration::days(index as i64),
    }
}

/// Seeds a signed-in admin, a handful of customers, orders spread across
/// statuses and months, and an active free plan.
pub fn seed_demo(gateway: &mut MemoryGateway, role: UserRole) {
    let today = OffsetDateTime::now_utc().date();

    for index in 0..CUSTOMER_NAMES.len() {
        gateway.insert_customer(demo_customer(index));
    }

    for index in 0..10 {
        let customer_id = UserId::new(format!("cliente-{}", index % CUSTOMER_NAMES.len() + 1));
        let event_date = today + Duration::days((index as i64 - 4) * 9);
        let mut order = demo_order(index, &customer_id, event_date);
        if order.delivery == DeliveryKind::Entregar {
            order.delivery_address = Some(demo_customer(index % CUSTOMER_NAMES.len()).address.full_line());
        }
        gateway.insert_order(order);
    }

    gateway.insert_plan(Plan {
        id: PlanId::new(1),
        admin_id: UserId::from(DEMO_ADMIN_ID),
        kind: PlanKind::Gratuito,
        active: true,
        activated_on: Date::from_calendar_date(today.year(), Month::January, 1)
            .unwrap_or(today),
        expires_on: None,
    });

    let session = match role {
        UserRole::Cliente => SessionUser {
            id: UserId::from("cliente-1"),
            email: "cliente1@example.com".to_owned(),
            name: CUSTOMER_NAMES[0].to_owned(),
            role,
        },
        UserRole::Admin | UserRole::Superadmin => SessionUser {
            id: UserId::from(DEMO_ADMIN_ID),
            email: "confeitaria@example.com".to_owned(),
            name: "Confeitaria Demo".to_owned(),
            role,
        },
    };
    gateway.sign_in(session);
}

#[cfg(test)]
mod tests {
    use super::{seed_demo, MemoryGateway, DEMO_ADMIN_ID};
    use fornada_app::{OrderId, OrderStatus, UserId, UserRole, YearMonth};
    use fornada_gateway::{
        Gateway, GatewayError, GatewayErrorKind, OrderQuery, OrderScope, OrderSort,
    };
    use time::OffsetDateTime;

    #[test]
    fn seeded_demo_has_session_customers_and_orders() {
        let mut gateway = MemoryGateway::new();
        seed_demo(&mut gateway, UserRole::Admin);

        let session = gateway.current_user().expect("session fetch succeeds");
        assert_eq!(
            session.expect("admin session").id,
            UserId::from(DEMO_ADMIN_ID)
        );
        assert!(!gateway.list_customers().expect("customers").is_empty());
        assert_eq!(gateway.order_count(), 10);
    }

    #[test]
    fn list_orders_scopes_and_sorts() {
        let mut gateway = MemoryGateway::new();
        seed_demo(&mut gateway, UserRole::Admin);

        let all = gateway
            .list_orders(&OrderQuery::default())
            .expect("list orders");
        assert!(all.windows(2).all(|pair| pair[0].id > pair[1].id));

        let scoped = gateway
            .list_orders(&OrderQuery {
                scope: OrderScope::Customer(UserId::from("cliente-1")),
                sort: OrderSort::IdDesc,
            })
            .expect("scoped list");
        assert!(!scoped.is_empty());
        assert!(
            scoped
                .iter()
                .all(|order| order.customer_id == UserId::from("cliente-1"))
        );
    }

    #[test]
    fn injected_failure_surfaces_once() {
        let mut gateway = MemoryGateway::new();
        seed_demo(&mut gateway, UserRole::Admin);
        gateway.fail_next(GatewayError::new(
            GatewayErrorKind::Connection,
            "cannot reach service",
        ));

        let error = gateway
            .list_orders(&OrderQuery::default())
            .expect_err("first call fails");
        assert_eq!(error.kind, GatewayErrorKind::Connection);

        gateway
            .list_orders(&OrderQuery::default())
            .expect("second call succeeds");
    }

    #[test]
    fn monthly_count_tracks_event_dates() {
        let mut gateway = MemoryGateway::new();
        seed_demo(&mut gateway, UserRole::Admin);

        let today = OffsetDateTime::now_utc().date();
        let month = YearMonth::from(today);
        let count = gateway
            .count_orders_in_month(&UserId::from(DEMO_ADMIN_ID), month)
            .expect("count succeeds");
        assert!(count >= 1, "seed places orders around the current month");
    }

    #[test]
    fn delete_missing_order_is_not_found() {
        let mut gateway = MemoryGateway::new();
        let error = gateway
            .delete_order(OrderId::new(404))
            .expect_err("missing order delete fails");
        assert_eq!(error.kind, GatewayErrorKind::NotFound);
    }

    #[test]
    fn status_updates_apply() {
        let mut gateway = MemoryGateway::new();
        seed_demo(&mut gateway, UserRole::Admin);

        gateway
            .update_order_status(OrderId::new(1), OrderStatus::Entregue)
            .expect("status update succeeds");
        let order = gateway.get_order(OrderId::new(1)).expect("order exists");
        assert_eq!(order.status, OrderStatus::Entregue);
    }
}
