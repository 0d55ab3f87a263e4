// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use time::Date;

use crate::model::{Address, DeliveryKind};

pub const MIN_CAKE_SIZE_CM: i32 = 10;
pub const MAX_CAKE_SIZE_CM: i32 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFormInput {
    pub theme: String,
    pub size_cm: Option<i32>,
    pub event_date: Option<Date>,
    pub delivery: DeliveryKind,
    pub description: String,
    pub note: String,
}

impl OrderFormInput {
    pub fn blank() -> Self {
        Self {
            theme: String::new(),
            size_cm: None,
            event_date: None,
            delivery: DeliveryKind::Retirar,
            description: String::new(),
            note: String::new(),
        }
    }

    pub fn validate(&self, today: Date) -> Result<()> {
        if self.theme.trim().is_empty() {
            bail!("tema is required -- enter a cake theme and retry");
        }
        match self.event_date {
            None => bail!("data do evento is required -- pick the event date and retry"),
            // The bakery needs lead time; same-day and past dates are out.
            Some(event_date) if event_date <= today => {
                bail!("data do evento must be after {today} -- pick a future date");
            }
            Some(_) => {}
        }
        if self.description.trim().is_empty() {
            bail!("descrição is required -- describe the cake and retry");
        }
        if let Some(size) = self.size_cm
            && !(MIN_CAKE_SIZE_CM..=MAX_CAKE_SIZE_CM).contains(&size)
        {
            bail!(
                "tamanho must be between {MIN_CAKE_SIZE_CM} and {MAX_CAKE_SIZE_CM} cm, got {size}"
            );
        }
        Ok(())
    }
}

/// Resolves the address line stored on a delivery order. Pickup orders carry
/// no address; delivery orders require the customer profile address to be
/// complete before any request goes out.
pub fn delivery_address(delivery: DeliveryKind, address: &Address) -> Result<Option<String>> {
    match delivery {
        DeliveryKind::Retirar => Ok(None),
        DeliveryKind::Entregar => {
            if !address.is_complete() {
                bail!(
                    "endereço incompleto -- fill in rua, número, bairro, cidade, estado e CEP in your profile before requesting delivery"
                );
            }
            Ok(Some(address.full_line()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFormInput {
    pub name: String,
    pub whatsapp: String,
    pub address: Address,
}

impl ProfileFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("nome is required -- enter your name and retry");
        }
        let digits = self
            .whatsapp
            .chars()
            .filter(char::is_ascii_digit)
            .count();
        if !(10..=13).contains(&digits) {
            bail!("whatsapp must contain 10 to 13 digits, got {digits}");
        }
        Ok(())
    }
}
