// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Plan gating: which plan governs an admin's account and whether the free
//! tier's monthly order cap blocks a new order.

use time::Date;

use fornada_app::{Plan, PlanKind, UserId, YearMonth, FREE_PLAN_MONTHLY_ORDER_LIMIT};

use crate::{Gateway, GatewayError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapCheck {
    Allowed,
    /// Free tier exhausted for the month; the admin must upgrade.
    Blocked { used: usize, limit: usize },
    /// No active plan row at all; ordering is suspended.
    NoActivePlan,
}

/// Picks the plan that governs the account when several rows are active.
/// An unexpired premium wins; an expired premium is ignored in favor of a
/// free row when one exists, and only returned when nothing else is.
pub fn resolve_active_plan(plans: Vec<Plan>, today: Date) -> Option<Plan> {
    let mut free = None;
    let mut expired_premium = None;

    for plan in plans {
        match plan.kind {
            PlanKind::Premium if !plan.is_expired(today) => return Some(plan),
            PlanKind::Premium => expired_premium = Some(plan),
            PlanKind::Gratuito => free = Some(plan),
        }
    }

    free.or(expired_premium)
}

/// Free plans may carry at most [`FREE_PLAN_MONTHLY_ORDER_LIMIT`] orders
/// whose event date falls in the given month. Premium plans are uncapped
/// while unexpired; an expired premium counts as free.
pub fn check_monthly_cap<G: Gateway + ?Sized>(
    gateway: &mut G,
    admin_id: &UserId,
    month: YearMonth,
    today: Date,
) -> Result<CapCheck, GatewayError> {
    let Some(plan) = gateway.active_plan(admin_id)? else {
        return Ok(CapCheck::NoActivePlan);
    };

    if plan.kind == PlanKind::Premium && !plan.is_expired(today) {
        return Ok(CapCheck::Allowed);
    }

    let used = gateway.count_orders_in_month(admin_id, month)?;
    if used >= FREE_PLAN_MONTHLY_ORDER_LIMIT {
        Ok(CapCheck::Blocked {
            used,
            limit: FREE_PLAN_MONTHLY_ORDER_LIMIT,
        })
    } else {
        Ok(CapCheck::Allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_active_plan;
    use fornada_app::{Plan, PlanId, PlanKind, UserId};
    use time::{Date, Month};

    fn plan(id: i64, kind: PlanKind, expires_on: Option<Date>) -> Plan {
        Plan {
            id: PlanId::new(id),
            admin_id: UserId::from("admin-1"),
            kind,
            active: true,
            activated_on: Date::from_calendar_date(2026, Month::January, 1)
                .expect("valid activation date"),
            expires_on,
        }
    }

    fn today() -> Date {
        Date::from_calendar_date(2026, Month::August, 29).expect("valid date")
    }

    #[test]
    fn unexpired_premium_wins_over_free() {
        let premium_expiry = Date::from_calendar_date(2026, Month::December, 31).expect("date");
        let resolved = resolve_active_plan(
            vec![
                plan(1, PlanKind::Gratuito, None),
                plan(2, PlanKind::Premium, Some(premium_expiry)),
            ],
            today(),
        )
        .expect("plan resolved");
        assert_eq!(resolved.id.get(), 2);
    }

    #[test]
    fn expired_premium_defers_to_free_row() {
        let past = Date::from_calendar_date(2026, Month::March, 1).expect("date");
        let resolved = resolve_active_plan(
            vec![
                plan(1, PlanKind::Premium, Some(past)),
                plan(2, PlanKind::Gratuito, None),
            ],
            today(),
        )
        .expect("plan resolved");
        assert_eq!(resolved.kind, PlanKind::Gratuito);
    }

    #[test]
    fn lone_expired_premium_is_still_reported() {
        let past = Date::from_calendar_date(2026, Month::March, 1).expect("date");
        let resolved = resolve_active_plan(vec![plan(1, PlanKind::Premium, Some(past))], today())
            .expect("plan resolved");
        assert!(resolved.is_expired(today()));
    }

    #[test]
    fn no_rows_resolves_to_none() {
        assert!(resolve_active_plan(Vec::new(), today()).is_none());
    }
}
