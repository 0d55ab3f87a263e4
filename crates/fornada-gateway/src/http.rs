// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use std::time::Duration;
use time::{Date, OffsetDateTime};
use url::Url;

use fornada_app::{
    format_wire_date, Customer, Order, OrderId, OrderStatus, Plan, UserId, YearMonth,
};

use crate::error::{GatewayError, GatewayErrorKind};
use crate::wire::{
    AuthUserRecord, NewOrderRecord, OrderPatchRecord, OrderRecord, PlanRecord, ProfilePatchRecord,
    StatusPatchRecord, UserRecord,
};
use crate::{Gateway, NewOrder, OrderPatch, OrderQuery, OrderScope, ProfilePatch, SessionUser};

const ORDERS: &str = "pedidos";
const USERS: &str = "usuarios";
const PLANS: &str = "planos";

/// Blocking client for the hosted REST service. One instance per session;
/// the access token identifies the signed-in user and row-level security on
/// the service side scopes what each role can see.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: Url,
    api_key: String,
    access_token: Option<String>,
    http: HttpClient,
}

impl HttpGateway {
    pub fn new(
        base_url: &str,
        api_key: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let trimmed = base_url.trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(GatewayError::service("service.base_url must not be empty"));
        }
        if api_key.trim().is_empty() {
            return Err(GatewayError::service("service.api_key must not be empty"));
        }

        let base_url = Url::parse(trimmed)
            .map_err(|error| GatewayError::service(format!("invalid base_url {trimmed:?}: {error}")))?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| GatewayError::service(format!("build HTTP client: {error}")))?;

        Ok(Self {
            base_url,
            api_key: api_key.to_owned(),
            access_token,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn endpoint(&self, segments: &[&str], params: &[(&str, String)]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| GatewayError::service("base_url cannot carry path segments"))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn rest(&self, collection: &str, params: &[(&str, String)]) -> Result<Url, GatewayError> {
        self.endpoint(&["rest", "v1", collection], params)
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("apikey", &self.api_key);
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request.bearer_auth(&self.api_key),
        }
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = self
            .with_auth(request)
            .send()
            .map_err(|error| GatewayError::connection(self.base_url(), &error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GatewayError::from_response(status.as_u16(), &body));
        }
        Ok(response)
    }

    fn decode_orders(response: Response) -> Result<Vec<Order>, GatewayError> {
        let records: Vec<OrderRecord> = response
            .json()
            .map_err(|error| GatewayError::service(format!("decode order rows: {error}")))?;
        records.into_iter().map(Order::try_from).collect()
    }
}

impl Gateway for HttpGateway {
    fn current_user(&mut self) -> Result<Option<SessionUser>, GatewayError> {
        let url = self.endpoint(&["auth", "v1", "user"], &[])?;
        let auth_user: AuthUserRecord = match self.send(self.http.get(url)) {
            Ok(response) => response
                .json()
                .map_err(|error| GatewayError::service(format!("decode session user: {error}")))?,
            // A missing session is the normal logged-out state.
            Err(error) if error.kind == GatewayErrorKind::AuthMissing => return Ok(None),
            Err(error) => return Err(error),
        };

        let url = self.rest(
            USERS,
            &[
                ("select", "*".to_owned()),
                ("id", format!("eq.{}", auth_user.id)),
            ],
        )?;
        let profiles: Vec<UserRecord> = self
            .send(self.http.get(url))?
            .json()
            .map_err(|error| GatewayError::service(format!("decode profile row: {error}")))?;

        let email = auth_user.email.unwrap_or_default();
        let (name, role) = match profiles.into_iter().next() {
            Some(profile) => {
                let role = profile.role();
                (profile.name.unwrap_or_default(), role)
            }
            None => (String::new(), fornada_app::UserRole::Cliente),
        };

        Ok(Some(SessionUser {
            id: UserId::new(auth_user.id),
            email,
            name,
            role,
        }))
    }

    fn sign_out(&mut self) -> Result<(), GatewayError> {
        let url = self.endpoint(&["auth", "v1", "logout"], &[])?;
        self.send(self.http.post(url))?;
        self.access_token = None;
        Ok(())
    }

    fn request_password_reset(&mut self, email: &str) -> Result<(), GatewayError> {
        let url = self.endpoint(&["auth", "v1", "recover"], &[])?;
        self.send(
            self.http
                .post(url)
                .json(&serde_json::json!({ "email": email })),
        )?;
        Ok(())
    }

    fn list_orders(&mut self, query: &OrderQuery) -> Result<Vec<Order>, GatewayError> {
        let mut params = vec![("select", "*".to_owned())];
        if let OrderScope::Customer(customer_id) = &query.scope {
            params.push(("id_cliente", format!("eq.{}", customer_id.as_str())));
        }
        params.push(("order", query.sort.query_value().to_owned()));

        let url = self.rest(ORDERS, &params)?;
        Self::decode_orders(self.send(self.http.get(url))?)
    }

    fn get_order(&mut self, id: OrderId) -> Result<Order, GatewayError> {
        let url = self.rest(
            ORDERS,
            &[("select", "*".to_owned()), ("id", format!("eq.{}", id.get()))],
        )?;
        let orders = Self::decode_orders(self.send(self.http.get(url))?)?;
        orders.into_iter().next().ok_or_else(|| {
            GatewayError::new(GatewayErrorKind::NotFound, format!("order {} not found", id.get()))
        })
    }

    fn create_order(&mut self, order: &NewOrder) -> Result<Order, GatewayError> {
        let url = self.rest(ORDERS, &[])?;
        let response = self.send(
            self.http
                .post(url)
                .header("Prefer", "return=representation")
                .json(&NewOrderRecord::from(order)),
        )?;
        let mut created = Self::decode_orders(response)?;
        created
            .pop()
            .ok_or_else(|| GatewayError::service("create returned no row"))
    }

    fn update_order(&mut self, id: OrderId, patch: &OrderPatch) -> Result<Order, GatewayError> {
        let url = self.rest(ORDERS, &[("id", format!("eq.{}", id.get()))])?;
        let response = self.send(
            self.http
                .patch(url)
                .header("Prefer", "return=representation")
                .json(&OrderPatchRecord::from(patch)),
        )?;
        let mut updated = Self::decode_orders(response)?;
        updated.pop().ok_or_else(|| {
            GatewayError::new(GatewayErrorKind::NotFound, format!("order {} not found", id.get()))
        })
    }

    fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), GatewayError> {
        let url = self.rest(ORDERS, &[("id", format!("eq.{}", id.get()))])?;
        self.send(self.http.patch(url).json(&StatusPatchRecord {
            status: status.as_str(),
        }))?;
        Ok(())
    }

    fn delete_order(&mut self, id: OrderId) -> Result<(), GatewayError> {
        let url = self.rest(ORDERS, &[("id", format!("eq.{}", id.get()))])?;
        self.send(self.http.delete(url))?;
        Ok(())
    }

    fn list_customers(&mut self) -> Result<Vec<Customer>, GatewayError> {
        let url = self.rest(
            USERS,
            &[
                ("select", "*".to_owned()),
                ("tipo", "eq.cliente".to_owned()),
            ],
        )?;
        let records: Vec<UserRecord> = self
            .send(self.http.get(url))?
            .json()
            .map_err(|error| GatewayError::service(format!("decode customer rows: {error}")))?;
        Ok(records.into_iter().map(Customer::from).collect())
    }

    fn get_customer(&mut self, id: &UserId) -> Result<Customer, GatewayError> {
        let url = self.rest(
            USERS,
            &[
                ("select", "*".to_owned()),
                ("id", format!("eq.{}", id.as_str())),
            ],
        )?;
        let records: Vec<UserRecord> = self
            .send(self.http.get(url))?
            .json()
            .map_err(|error| GatewayError::service(format!("decode customer row: {error}")))?;
        records.into_iter().next().map(Customer::from).ok_or_else(|| {
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
        let url = self.rest(USERS, &[("id", format!("eq.{}", id.as_str()))])?;
        self.send(self.http.patch(url).json(&ProfilePatchRecord::from(patch)))?;
        Ok(())
    }

    fn active_plan(&mut self, admin_id: &UserId) -> Result<Option<Plan>, GatewayError> {
        let url = self.rest(
            PLANS,
            &[
                ("select", "*".to_owned()),
                ("admin_id", format!("eq.{}", admin_id.as_str())),
                ("ativo", "eq.true".to_owned()),
            ],
        )?;
        let records: Vec<PlanRecord> = self
            .send(self.http.get(url))?
            .json()
            .map_err(|error| GatewayError::service(format!("decode plan rows: {error}")))?;
        let plans = records
            .into_iter()
            .map(Plan::try_from)
            .collect::<Result<Vec<Plan>, GatewayError>>()?;
        Ok(crate::plan::resolve_active_plan(
            plans,
            OffsetDateTime::now_utc().date(),
        ))
    }

    fn count_orders_in_month(
        &mut self,
        admin_id: &UserId,
        month: YearMonth,
    ) -> Result<usize, GatewayError> {
        let (first, last) = month_bounds(month)?;
        let url = self.rest(
            ORDERS,
            &[
                ("select", "id".to_owned()),
                ("admin_id", format!("eq.{}", admin_id.as_str())),
                ("data_evento", format!("gte.{}", format_wire_date(first))),
                ("data_evento", format!("lte.{}", format_wire_date(last))),
            ],
        )?;
        let response = self.send(
            self.http
                .get(url)
                .header("Prefer", "count=exact")
                .header("Range", "0-0"),
        )?;

        let content_range = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| GatewayError::service("count response missing content-range"))?;
        parse_exact_count(content_range)
            .ok_or_else(|| GatewayError::service(format!("unparseable content-range {content_range:?}")))
    }
}

fn month_bounds(month: YearMonth) -> Result<(Date, Date), GatewayError> {
    let last_day = time::util::days_in_year_month(month.year, month.month);
    let first = Date::from_calendar_date(month.year, month.month, 1)
        .map_err(|error| GatewayError::service(error.to_string()))?;
    let last = Date::from_calendar_date(month.year, month.month, last_day)
        .map_err(|error| GatewayError::service(error.to_string()))?;
    Ok((first, last))
}

/// `content-range: 0-0/7` or `*/0` when the range is empty.
fn parse_exact_count(content_range: &str) -> Option<usize> {
    content_range.rsplit('/').next()?.trim().parse().ok()
}
