// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use time::OffsetDateTime;
use url::Url;

use fornada_app::{
    Order, OrderFormInput, OrderId, OrderStatus, ProfileFormInput, UserId, UserRole, YearMonth,
    delivery_address, format_optional_date_br,
};
use fornada_gateway::{
    CapCheck, Gateway, NewOrder, OrderPatch, OrderQuery, OrderScope, OrderSort, ProfilePatch,
    SessionUser, check_monthly_cap,
};
use fornada_tui::{AppRuntime, RuntimeContext};

/// Bridges the terminal front end to a [`Gateway`]. Holds the business rules
/// that sit above the wire: role-based list scoping, the pending-only edit
/// window, the free-plan monthly cap, and the WhatsApp share link.
pub struct GatewayRuntime<G: Gateway> {
    gateway: G,
    session: Option<SessionUser>,
    bakery_admin: Option<UserId>,
    page_size: usize,
}

impl<G: Gateway> GatewayRuntime<G> {
    pub fn new(gateway: G, bakery_admin: Option<UserId>, page_size: usize) -> Self {
        Self {
            gateway,
            session: None,
            bakery_admin,
            page_size,
        }
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    fn ensure_session(&mut self) -> Result<SessionUser> {
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }
        let session = self
            .gateway
            .current_user()?
            .ok_or_else(|| anyhow!("sessão expirada -- faça login e atualize [auth].token"))?;
        self.session = Some(session.clone());
        Ok(session)
    }

    /// The account whose plan governs order intake: the admin's own account
    /// when one is signed in, otherwise the configured confeitaria.
    fn plan_account(&mut self) -> Result<Option<UserId>> {
        let session = self.ensure_session()?;
        Ok(match session.role {
            UserRole::Admin | UserRole::Superadmin => Some(session.id),
            UserRole::Cliente => self.bakery_admin.clone(),
        })
    }

    fn check_order_cap(&mut self) -> Result<()> {
        let Some(admin_id) = self.plan_account()? else {
            return Ok(());
        };
        let today = OffsetDateTime::now_utc().date();
        match check_monthly_cap(&mut self.gateway, &admin_id, YearMonth::from(today), today)? {
            CapCheck::Allowed => Ok(()),
            CapCheck::Blocked { used, limit } => bail!(
                "o plano gratuito permite {limit} pedidos por mês ({used} já usados) -- faça upgrade para o premium"
            ),
            CapCheck::NoActivePlan => {
                bail!("a confeitaria está sem plano ativo -- renove o plano para receber pedidos")
            }
        }
    }

    fn guarded_order(&mut self, id: OrderId) -> Result<Order> {
        let session = self.ensure_session()?;
        let order = self.gateway.get_order(id)?;
        if session.role == UserRole::Cliente && order.customer_id != session.id {
            bail!("o pedido #{} pertence a outro cliente", id.get());
        }
        Ok(order)
    }

    fn resolve_delivery_address(
        &mut self,
        customer_id: &UserId,
        input: &OrderFormInput,
    ) -> Result<Option<String>> {
        let customer = self
            .gateway
            .get_customer(customer_id)
            .context("carregar o perfil do cliente")?;
        delivery_address(input.delivery, &customer.address)
    }
}

impl<G: Gateway> AppRuntime for GatewayRuntime<G> {
    fn context(&mut self) -> Result<RuntimeContext> {
        let session = self.ensure_session()?;
        let plan_line = match session.role {
            UserRole::Admin | UserRole::Superadmin => {
                let today = OffsetDateTime::now_utc().date();
                match self.gateway.active_plan(&session.id)? {
                    Some(plan) => Some(plan.summary_line(today)),
                    None => Some("sem plano ativo".to_owned()),
                }
            }
            UserRole::Cliente => None,
        };
        Ok(RuntimeContext {
            viewer_name: session.name,
            role: session.role,
            plan_line,
            page_size: self.page_size,
        })
    }

    fn load_orders(&mut self) -> Result<Vec<Order>> {
        let session = self.ensure_session()?;
        let scope = match session.role {
            UserRole::Cliente => OrderScope::Customer(session.id),
            UserRole::Admin | UserRole::Superadmin => OrderScope::All,
        };
        let orders = self.gateway.list_orders(&OrderQuery {
            scope,
            sort: OrderSort::IdDesc,
        })?;
        Ok(orders)
    }

    fn load_customers(&mut self) -> Result<Vec<fornada_app::Customer>> {
        Ok(self.gateway.list_customers()?)
    }

    fn load_order(&mut self, id: OrderId) -> Result<Order> {
        self.guarded_order(id)
    }

    fn begin_edit(&mut self, id: OrderId) -> Result<OrderFormInput> {
        let order = self.guarded_order(id)?;
        if !order.editable_by_customer() {
            bail!(
                "o pedido #{} não está mais pendente ({}) -- a lista foi atualizada",
                id.get(),
                order.status.label()
            );
        }
        Ok(OrderFormInput {
            theme: order.theme,
            size_cm: order.size_cm,
            event_date: order.event_date,
            delivery: order.delivery,
            description: order.description,
            note: order.note,
        })
    }

    fn submit_create(&mut self, input: &OrderFormInput) -> Result<()> {
        let session = self.ensure_session()?;
        if session.role != UserRole::Cliente {
            bail!("pedidos são criados pelo cliente -- entre com um perfil de cliente");
        }
        let admin_id = self.bakery_admin.clone().ok_or_else(|| {
            anyhow!("confeitaria não configurada -- defina [service].admin_id no config")
        })?;

        input.validate(OffsetDateTime::now_utc().date())?;
        self.check_order_cap()?;
        let event_date = input
            .event_date
            .ok_or_else(|| anyhow!("data do evento ausente"))?;
        let delivery_address = self.resolve_delivery_address(&session.id, input)?;

        self.gateway.create_order(&NewOrder {
            customer_id: session.id,
            admin_id,
            theme: input.theme.clone(),
            size_cm: input.size_cm,
            event_date,
            delivery: input.delivery,
            description: input.description.clone(),
            note: input.note.clone(),
            delivery_address,
        })?;
        Ok(())
    }

    fn submit_edit(&mut self, id: OrderId, input: &OrderFormInput) -> Result<()> {
        // The order may have advanced since the form opened; re-check before
        // writing anything.
        let order = self.guarded_order(id)?;
        if !order.editable_by_customer() {
            bail!(
                "o pedido #{} não está mais pendente ({}) e não pode ser editado",
                id.get(),
                order.status.label()
            );
        }

        input.validate(OffsetDateTime::now_utc().date())?;
        let event_date = input
            .event_date
            .ok_or_else(|| anyhow!("data do evento ausente"))?;
        let delivery_address = self.resolve_delivery_address(&order.customer_id, input)?;

        self.gateway.update_order(
            id,
            &OrderPatch {
                theme: input.theme.clone(),
                size_cm: input.size_cm,
                event_date,
                delivery: input.delivery,
                description: input.description.clone(),
                note: input.note.clone(),
                delivery_address,
            },
        )?;
        Ok(())
    }

    fn update_status(&mut self, id: OrderId, status: OrderStatus) -> Result<()> {
        let session = self.ensure_session()?;
        if session.role == UserRole::Cliente {
            bail!("apenas a confeitaria altera o status do pedido");
        }
        self.gateway.update_order_status(id, status)?;
        Ok(())
    }

    fn delete_order(&mut self, id: OrderId) -> Result<()> {
        let session = self.ensure_session()?;
        let order = self.guarded_order(id)?;
        // Customers may only cancel orders the bakery has not picked up yet.
        if session.role == UserRole::Cliente && !order.editable_by_customer() {
            bail!(
                "o pedido #{} não está mais pendente ({}) e não pode ser cancelado",
                id.get(),
                order.status.label()
            );
        }
        self.gateway.delete_order(id)?;
        Ok(())
    }

    fn load_profile(&mut self) -> Result<ProfileFormInput> {
        let session = self.ensure_session()?;
        let customer = self
            .gateway
            .get_customer(&session.id)
            .context("carregar o perfil")?;
        Ok(ProfileFormInput {
            name: customer.name,
            whatsapp: customer.whatsapp,
            address: customer.address,
        })
    }

    fn submit_profile(&mut self, input: &ProfileFormInput) -> Result<()> {
        let session = self.ensure_session()?;
        input.validate()?;
        self.gateway.update_customer_profile(
            &session.id,
            &ProfilePatch {
                name: input.name.clone(),
                whatsapp: input.whatsapp.clone(),
                address: input.address.clone(),
            },
        )?;
        Ok(())
    }

    fn share_link(&mut self, id: OrderId) -> Result<String> {
        let order = self.guarded_order(id)?;
        let customer = self.gateway.get_customer(&order.customer_id)?;
        let message = format!(
            "Olá, {}! Atualização do pedido #{} ({}): {}. Evento: {}.",
            customer.name,
            order.id.get(),
            order.theme,
            order.status.label(),
            format_optional_date_br(order.event_date),
        );
        whatsapp_link(&customer.whatsapp, &message)
    }
}

/// Builds a `wa.me` link from a stored phone number. Formatting characters
/// are stripped and the Brazilian country code is added when missing.
pub fn whatsapp_link(whatsapp: &str, message: &str) -> Result<String> {
    let digits: String = whatsapp.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 10 {
        bail!("whatsapp do cliente inválido: {whatsapp:?}");
    }
    let full = if digits.starts_with("55") && digits.len() >= 12 {
        digits
    } else {
        format!("55{digits}")
    };
    let mut url =
        Url::parse(&format!("https://wa.me/{full}")).context("montar o link do WhatsApp")?;
    url.query_pairs_mut().append_pair("text", message);
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::{GatewayRuntime, whatsapp_link};
    use fornada_app::{DeliveryKind, OrderFormInput, OrderId, OrderStatus, UserId, UserRole};
    use fornada_gateway::{Gateway, GatewayError, GatewayErrorKind, SessionUser};
    use fornada_testkit::{DEMO_ADMIN_ID, MemoryGateway, demo_customer, demo_order, seed_demo};
    use fornada_tui::AppRuntime;
    use time::{Duration, OffsetDateTime};

    fn admin_runtime() -> GatewayRuntime<MemoryGateway> {
        let mut gateway = MemoryGateway::new();
        seed_demo(&mut gateway, UserRole::Admin);
        GatewayRuntime::new(gateway, Some(UserId::from(DEMO_ADMIN_ID)), 3)
    }

    fn cliente_runtime() -> GatewayRuntime<MemoryGateway> {
        let mut gateway = MemoryGateway::new();
        seed_demo(&mut gateway, UserRole::Cliente);
        GatewayRuntime::new(gateway, Some(UserId::from(DEMO_ADMIN_ID)), 3)
    }

    fn valid_input() -> OrderFormInput {
        OrderFormInput {
            theme: "Dinossauros".to_owned(),
            size_cm: Some(20),
            event_date: Some(OffsetDateTime::now_utc().date() + Duration::days(400)),
            delivery: DeliveryKind::Retirar,
            description: "Bolo de chocolate".to_owned(),
            note: String::new(),
        }
    }

    #[test]
    fn context_reports_admin_plan_line() {
        let mut runtime = admin_runtime();
        let context = runtime.context().expect("context loads");
        assert_eq!(context.role, UserRole::Admin);
        assert!(context.plan_line.is_some());
        assert_eq!(context.page_size, 3);
    }

    #[test]
    fn context_without_session_is_an_error() {
        let mut runtime = GatewayRuntime::new(MemoryGateway::new(), None, 3);
        let error = runtime.context().expect_err("no session seeded");
        assert!(error.to_string().contains("sessão expirada"));
    }

    #[test]
    fn admin_sees_every_order_and_cliente_only_their_own() {
        let mut admin = admin_runtime();
        let all = admin.load_orders().expect("admin list");
        assert_eq!(all.len(), 10);

        let mut cliente = cliente_runtime();
        let own = cliente.load_orders().expect("cliente list");
        assert!(!own.is_empty());
        assert!(
            own.iter()
                .all(|order| order.customer_id == UserId::from("cliente-1"))
        );
        assert!(own.len() < all.len());
    }

    #[test]
    fn cliente_cannot_open_another_customers_order() {
        let mut cliente = cliente_runtime();
        let foreign = cliente
            .load_orders()
            .expect("cliente list")
            .first()
            .cloned()
            .expect("has orders");
        // Find an id that belongs to someone else.
        let mut admin = admin_runtime();
        let other = admin
            .load_orders()
            .expect("admin list")
            .into_iter()
            .find(|order| order.customer_id != foreign.customer_id)
            .expect("other customer exists");

        let error = cliente
            .load_order(other.id)
            .expect_err("foreign order denied");
        assert!(error.to_string().contains("outro cliente"));
    }

    #[test]
    fn begin_edit_refuses_a_non_pending_order() {
        let mut runtime = admin_runtime();
        let approved = runtime
            .load_orders()
            .expect("orders load")
            .into_iter()
            .find(|order| order.status == OrderStatus::Aprovado)
            .expect("seed has an approved order");

        let error = runtime
            .begin_edit(approved.id)
            .expect_err("approved orders are frozen");
        assert!(error.to_string().contains("não está mais pendente"));
    }

    #[test]
    fn begin_edit_returns_the_pending_order_fields() {
        let mut runtime = admin_runtime();
        let pending = runtime
            .load_orders()
            .expect("orders load")
            .into_iter()
            .find(|order| order.status == OrderStatus::Pendente)
            .expect("seed has a pending order");

        let input = runtime.begin_edit(pending.id).expect("pending is editable");
        assert_eq!(input.theme, pending.theme);
        assert_eq!(input.event_date, pending.event_date);
    }

    #[test]
    fn create_is_reserved_for_customers() {
        let mut runtime = admin_runtime();
        let error = runtime
            .submit_create(&valid_input())
            .expect_err("admins do not place orders");
        assert!(error.to_string().contains("cliente"));
    }

    #[test]
    fn create_succeeds_for_a_customer_under_the_cap() {
        let mut gateway = MemoryGateway::new();
        gateway.insert_customer(demo_customer(0));
        gateway.insert_plan(fornada_app::Plan {
            id: fornada_app::PlanId::new(1),
            admin_id: UserId::from(DEMO_ADMIN_ID),
            kind: fornada_app::PlanKind::Gratuito,
            active: true,
            activated_on: OffsetDateTime::now_utc().date(),
            expires_on: None,
        });
        gateway.sign_in(SessionUser {
            id: UserId::from("cliente-1"),
            email: "maria@example.com".to_owned(),
            name: "Maria Souza".to_owned(),
            role: UserRole::Cliente,
        });
        let mut runtime = GatewayRuntime::new(gateway, Some(UserId::from(DEMO_ADMIN_ID)), 3);

        runtime.submit_create(&valid_input()).expect("create ok");
        assert_eq!(runtime.load_orders().expect("list").len(), 1);
    }

    #[test]
    fn free_plan_cap_blocks_the_sixth_order_of_the_month() {
        let mut gateway = MemoryGateway::new();
        gateway.insert_customer(demo_customer(0));
        gateway.insert_plan(fornada_app::Plan {
            id: fornada_app::PlanId::new(1),
            admin_id: UserId::from(DEMO_ADMIN_ID),
            kind: fornada_app::PlanKind::Gratuito,
            active: true,
            activated_on: OffsetDateTime::now_utc().date(),
            expires_on: None,
        });
        // Five orders already land in the current month.
        let today = OffsetDateTime::now_utc().date();
        for index in 0..5 {
            gateway.insert_order(demo_order(index, &UserId::from("cliente-1"), today));
        }
        gateway.sign_in(SessionUser {
            id: UserId::from("cliente-1"),
            email: "maria@example.com".to_owned(),
            name: "Maria Souza".to_owned(),
            role: UserRole::Cliente,
        });
        let mut runtime = GatewayRuntime::new(gateway, Some(UserId::from(DEMO_ADMIN_ID)), 3);

        let error = runtime
            .submit_create(&valid_input())
            .expect_err("cap reached");
        assert!(error.to_string().contains("5 pedidos por mês"));
    }

    #[test]
    fn delivery_order_requires_a_complete_profile_address() {
        let mut gateway = MemoryGateway::new();
        // demo_customer index 2 has an empty address.
        let mut customer = demo_customer(2);
        customer.user_id = UserId::from("cliente-1");
        gateway.insert_customer(customer);
        gateway.insert_plan(fornada_app::Plan {
            id: fornada_app::PlanId::new(1),
            admin_id: UserId::from(DEMO_ADMIN_ID),
            kind: fornada_app::PlanKind::Premium,
            active: true,
            activated_on: OffsetDateTime::now_utc().date(),
            expires_on: Some(OffsetDateTime::now_utc().date() + Duration::days(30)),
        });
        gateway.sign_in(SessionUser {
            id: UserId::from("cliente-1"),
            email: "ana@example.com".to_owned(),
            name: "Ana Lima".to_owned(),
            role: UserRole::Cliente,
        });
        let mut runtime = GatewayRuntime::new(gateway, Some(UserId::from(DEMO_ADMIN_ID)), 3);

        let input = OrderFormInput {
            delivery: DeliveryKind::Entregar,
            ..valid_input()
        };
        let error = runtime
            .submit_create(&input)
            .expect_err("incomplete address blocks delivery");
        assert!(error.to_string().contains("endereço incompleto"));
    }

    #[test]
    fn status_updates_are_admin_only() {
        let mut cliente = cliente_runtime();
        let order = cliente
            .load_orders()
            .expect("orders load")
            .first()
            .cloned()
            .expect("has orders");
        let error = cliente
            .update_status(order.id, OrderStatus::Aprovado)
            .expect_err("cliente cannot change status");
        assert!(error.to_string().contains("confeitaria"));

        let mut admin = admin_runtime();
        admin
            .update_status(order.id, OrderStatus::Aprovado)
            .expect("admin updates status");
    }

    #[test]
    fn delete_removes_the_order() {
        let mut runtime = admin_runtime();
        let before = runtime.load_orders().expect("orders load");
        let id = before.first().map(|order| order.id).expect("has orders");

        runtime.delete_order(id).expect("delete ok");
        let after = runtime.load_orders().expect("orders reload");
        assert_eq!(after.len(), before.len() - 1);
        assert!(after.iter().all(|order| order.id != id));
    }

    #[test]
    fn cliente_cannot_delete_a_non_pending_order() {
        let mut gateway = MemoryGateway::new();
        seed_demo(&mut gateway, UserRole::Cliente);
        // demo_order index 1 carries status Aprovado.
        let today = OffsetDateTime::now_utc().date();
        let approved = gateway.insert_order(demo_order(1, &UserId::from("cliente-1"), today));
        let mut runtime = GatewayRuntime::new(gateway, Some(UserId::from(DEMO_ADMIN_ID)), 3);

        let error = runtime
            .delete_order(approved)
            .expect_err("approved orders cannot be cancelled by the customer");
        assert!(error.to_string().contains("não pode ser cancelado"));

        let pending = runtime
            .load_orders()
            .expect("orders load")
            .into_iter()
            .find(|order| order.status == OrderStatus::Pendente)
            .expect("seed has a pending order");
        runtime
            .delete_order(pending.id)
            .expect("pending orders stay cancellable");
    }

    #[test]
    fn admin_can_delete_regardless_of_status() {
        let mut runtime = admin_runtime();
        let delivered = runtime
            .load_orders()
            .expect("orders load")
            .into_iter()
            .find(|order| order.status == OrderStatus::Entregue)
            .expect("seed has a delivered order");
        runtime.delete_order(delivered.id).expect("admin delete ok");
    }

    #[test]
    fn profile_round_trips_through_the_gateway() {
        let mut runtime = cliente_runtime();
        let mut profile = runtime.load_profile().expect("profile loads");
        assert_eq!(profile.name, "Maria Souza");

        profile.whatsapp = "(41) 98888-7777".to_owned();
        profile.address.street = "Avenida Sete de Setembro".to_owned();
        runtime.submit_profile(&profile).expect("profile saves");

        let reloaded = runtime.load_profile().expect("profile reloads");
        assert_eq!(reloaded.whatsapp, "(41) 98888-7777");
        assert_eq!(reloaded.address.street, "Avenida Sete de Setembro");
    }

    #[test]
    fn profile_submit_rejects_an_invalid_whatsapp() {
        let mut runtime = cliente_runtime();
        let mut profile = runtime.load_profile().expect("profile loads");
        profile.whatsapp = "9999".to_owned();

        let error = runtime
            .submit_profile(&profile)
            .expect_err("short numbers fail validation");
        assert!(error.to_string().contains("whatsapp"));
    }

    #[test]
    fn gateway_failures_surface_with_their_message() {
        let mut gateway = MemoryGateway::new();
        seed_demo(&mut gateway, UserRole::Admin);
        let mut runtime = GatewayRuntime::new(gateway, None, 3);
        runtime.context().expect("session loads");

        runtime.gateway_mut().fail_next(GatewayError::new(
            GatewayErrorKind::RateLimited,
            "too many requests -- wait a minute and retry",
        ));
        let error = runtime.load_orders().expect_err("injected failure");
        assert!(error.to_string().contains("too many requests"));
    }

    #[test]
    fn share_link_targets_the_customer_whatsapp() {
        let mut runtime = admin_runtime();
        let order = runtime
            .load_orders()
            .expect("orders load")
            .first()
            .cloned()
            .expect("has orders");

        let link = runtime.share_link(order.id).expect("link builds");
        assert!(link.starts_with("https://wa.me/55"));
        assert!(link.contains("text="));
    }

    #[test]
    fn whatsapp_link_strips_formatting_and_adds_country_code() {
        let link = whatsapp_link("(41) 99999-0000", "Olá, Maria!").expect("valid number");
        assert!(link.starts_with("https://wa.me/5541999990000?text="));

        let already_coded = whatsapp_link("+55 41 99999-0000", "oi").expect("valid number");
        assert!(already_coded.starts_with("https://wa.me/5541999990000"));
    }

    #[test]
    fn whatsapp_link_rejects_short_numbers() {
        let error = whatsapp_link("9999", "oi").expect_err("too short");
        assert!(error.to_string().contains("inválido"));
    }
}
