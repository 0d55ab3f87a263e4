// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use fornada_app::{
    ACTIVE_STATUSES, AppCommand, AppEvent, AppMode, AppState, Customer, DashboardTotals, FormMode,
    FormPhase, ListFilter, Order, OrderFormInput, OrderId, OrderListPage, OrderStatus,
    ProfileFormInput, ReloadGate, StatusFilter, Toast, ToastKind, UserId, UserRole, YearMonth,
    build_order_list_page, format_brl_cents, format_optional_brl, format_optional_date_br,
    format_wire_date, parse_wire_date,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::collections::HashMap;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::{Date, OffsetDateTime};

/// Who is looking at the screen. Controls which row actions are offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeContext {
    pub viewer_name: String,
    pub role: UserRole,
    pub plan_line: Option<String>,
    pub page_size: usize,
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self {
            viewer_name: String::new(),
            role: UserRole::Cliente,
            plan_line: None,
            page_size: fornada_app::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Backend seam for the terminal front end. The CLI wires this to the hosted
/// service; tests and `--demo` wire it to an in-memory gateway.
pub trait AppRuntime {
    fn context(&mut self) -> Result<RuntimeContext>;
    fn load_orders(&mut self) -> Result<Vec<Order>>;
    fn load_customers(&mut self) -> Result<Vec<Customer>>;
    fn load_order(&mut self, id: OrderId) -> Result<Order>;
    /// Re-reads the order and returns form contents only while it is still
    /// pending; a stale row fails with a message for the toast line.
    fn begin_edit(&mut self, id: OrderId) -> Result<OrderFormInput>;
    fn submit_create(&mut self, input: &OrderFormInput) -> Result<()>;
    fn submit_edit(&mut self, id: OrderId, input: &OrderFormInput) -> Result<()>;
    fn update_status(&mut self, id: OrderId, status: OrderStatus) -> Result<()>;
    fn delete_order(&mut self, id: OrderId) -> Result<()>;
    fn share_link(&mut self, id: OrderId) -> Result<String>;
    fn load_profile(&mut self) -> Result<ProfileFormInput>;
    fn submit_profile(&mut self, input: &ProfileFormInput) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearToast { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputMode {
    None,
    Search(String),
    Month(String),
}

impl Default for InputMode {
    fn default() -> Self {
        Self::None
    }
}

/// Editable string drafts for the order form. Parsed and validated on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDraft {
    pub theme: String,
    pub size_cm: String,
    pub event_date: String,
    pub delivery: fornada_app::DeliveryKind,
    pub description: String,
    pub note: String,
    pub field: usize,
}

impl Default for FormDraft {
    fn default() -> Self {
        Self {
            theme: String::new(),
            size_cm: String::new(),
            event_date: String::new(),
            delivery: fornada_app::DeliveryKind::Retirar,
            description: String::new(),
            note: String::new(),
            field: 0,
        }
    }
}

const FORM_FIELD_COUNT: usize = 6;
const FORM_FIELD_LABELS: [&str; FORM_FIELD_COUNT] = [
    "tema",
    "tamanho (cm)",
    "data do evento (AAAA-MM-DD)",
    "entrega",
    "descrição",
    "observação",
];

impl FormDraft {
    fn from_input(input: &OrderFormInput) -> Self {
        Self {
            theme: input.theme.clone(),
            size_cm: input.size_cm.map(|cm| cm.to_string()).unwrap_or_default(),
            event_date: input
                .event_date
                .map(format_wire_date)
                .unwrap_or_default(),
            delivery: input.delivery,
            description: input.description.clone(),
            note: input.note.clone(),
            field: 0,
        }
    }

    fn to_input(&self, today: Date) -> Result<OrderFormInput> {
        let size_cm = match self.size_cm.trim() {
            "" => None,
            text => Some(
                text.parse::<i32>()
                    .with_context(|| format!("tamanho inválido: {text:?}"))?,
            ),
        };
        let event_date = match self.event_date.trim() {
            "" => None,
            text => Some(parse_wire_date(text)?),
        };
        let input = OrderFormInput {
            theme: self.theme.trim().to_owned(),
            size_cm,
            event_date,
            delivery: self.delivery,
            description: self.description.trim().to_owned(),
            note: self.note.trim().to_owned(),
        };
        input.validate(today)?;
        Ok(input)
    }

    fn active_value_mut(&mut self) -> Option<&mut String> {
        match self.field {
            0 => Some(&mut self.theme),
            1 => Some(&mut self.size_cm),
            2 => Some(&mut self.event_date),
            4 => Some(&mut self.description),
            5 => Some(&mut self.note),
            _ => None,
        }
    }
}

const PROFILE_FIELD_COUNT: usize = 10;
const PROFILE_FIELD_LABELS: [&str; PROFILE_FIELD_COUNT] = [
    "nome",
    "whatsapp",
    "rua",
    "número",
    "complemento",
    "bairro",
    "cidade",
    "estado",
    "CEP",
    "ponto de referência",
];

/// Editable drafts for the profile form, one string per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    pub values: [String; PROFILE_FIELD_COUNT],
    pub field: usize,
}

impl ProfileDraft {
    fn from_input(input: &ProfileFormInput) -> Self {
        Self {
            values: [
                input.name.clone(),
                input.whatsapp.clone(),
                input.address.street.clone(),
                input.address.number.clone(),
                input.address.complement.clone(),
                input.address.neighborhood.clone(),
                input.address.city.clone(),
                input.address.state.clone(),
                input.address.postal_code.clone(),
                input.address.landmark.clone(),
            ],
            field: 0,
        }
    }

    fn to_input(&self) -> Result<ProfileFormInput> {
        let [name, whatsapp, street, number, complement, neighborhood, city, state, postal_code, landmark] =
            self.values.clone();
        let input = ProfileFormInput {
            name: name.trim().to_owned(),
            whatsapp: whatsapp.trim().to_owned(),
            address: fornada_app::Address {
                street: street.trim().to_owned(),
                number: number.trim().to_owned(),
                complement: complement.trim().to_owned(),
                neighborhood: neighborhood.trim().to_owned(),
                city: city.trim().to_owned(),
                state: state.trim().to_owned(),
                postal_code: postal_code.trim().to_owned(),
                landmark: landmark.trim().to_owned(),
            },
        };
        input.validate()?;
        Ok(input)
    }
}

#[derive(Debug, Default)]
struct ViewData {
    context: RuntimeContext,
    orders: Vec<Order>,
    customers: HashMap<UserId, Customer>,
    filter: ListFilter,
    selected_row: usize,
    input: InputMode,
    form: Option<FormDraft>,
    profile: Option<ProfileDraft>,
    detail: Option<Order>,
    load_error: Option<String>,
    reload_gate: ReloadGate,
    toast_token: u64,
    help_visible: bool,
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    match runtime.context() {
        Ok(context) => {
            view_data.filter.page_size = context.page_size;
            view_data.context = context;
        }
        Err(error) => {
            view_data.load_error = Some(format!("falha ao carregar a sessão: {error:#}"));
        }
    }
    reload(runtime, &mut view_data);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearToast { token } if token == view_data.toast_token => {
                state.dispatch(AppCommand::ClearToast);
            }
            InternalEvent::ClearToast { .. } => {}
        }
    }
}

fn schedule_toast_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearToast { token });
    });
}

fn emit_toast(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: ToastKind,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::ShowToast(kind, message.into()));
    view_data.toast_token = view_data.toast_token.saturating_add(1);
    schedule_toast_clear(internal_tx, view_data.toast_token);
}

/// Reloads orders and customers through the stale-response gate: a reload
/// begun before a newer one completed is discarded instead of applied. On
/// failure the previous rows stay on screen next to an inline error line.
fn reload<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData) {
    let token = view_data.reload_gate.begin();
    let loaded = runtime.load_orders().and_then(|orders| {
        let customers = runtime.load_customers()?;
        Ok((orders, customers))
    });
    match loaded {
        Ok((orders, customers)) => {
            if !view_data.reload_gate.admit(token) {
                return;
            }
            view_data.orders = orders;
            view_data.customers = customers
                .into_iter()
                .map(|customer| (customer.user_id.clone(), customer))
                .collect();
            view_data.load_error = None;
        }
        Err(error) => {
            view_data.load_error = Some(format!("falha ao carregar pedidos: {error:#}"));
        }
    }
}

fn current_page(view_data: &ViewData) -> OrderListPage {
    build_order_list_page(&view_data.orders, &view_data.customers, &view_data.filter)
}

fn selected_order_id(view_data: &ViewData, page: &OrderListPage) -> Option<OrderId> {
    page.rows
        .get(view_data.selected_row.min(page.rows.len().saturating_sub(1)))
        .map(|row| row.id)
}

/// Cycle for the `s` key: every status once, then the "ativos" group
/// (aprovado + em produção), then back to no filter.
fn next_status_filter(current: &StatusFilter) -> StatusFilter {
    let group = StatusFilter::Group(ACTIVE_STATUSES.to_vec());
    match current {
        StatusFilter::Any => StatusFilter::One(OrderStatus::ALL[0]),
        StatusFilter::One(status) => {
            let position = OrderStatus::ALL
                .iter()
                .position(|candidate| candidate == status)
                .unwrap_or(0);
            match OrderStatus::ALL.get(position + 1) {
                Some(next) => StatusFilter::One(*next),
                None => group,
            }
        }
        StatusFilter::Group(_) => StatusFilter::Any,
    }
}

fn next_order_status(status: OrderStatus) -> OrderStatus {
    let position = OrderStatus::ALL
        .iter()
        .position(|candidate| *candidate == status)
        .unwrap_or(0);
    OrderStatus::ALL[(position + 1) % OrderStatus::ALL.len()]
}

/// Counts for the dashboard cards above the list. "ativos" groups the
/// statuses a confeitaria is actively working on.
pub fn summary_cards(orders: &[Order]) -> Vec<(&'static str, usize)> {
    let mut cards: Vec<(&'static str, usize)> = OrderStatus::ALL
        .iter()
        .map(|status| {
            (
                status.label(),
                orders.iter().filter(|order| order.status == *status).count(),
            )
        })
        .collect();
    cards.push((
        "Ativos",
        orders
            .iter()
            .filter(|order| ACTIVE_STATUSES.contains(&order.status))
            .count(),
    ));
    cards
}

/// The admin revenue line under the cards. Customers never see it.
pub fn totals_line(orders: &[Order], customer_count: usize, today: Date) -> String {
    let totals = DashboardTotals::from_orders(orders, customer_count, today);
    format!(
        "receita do mês: {}  |  receita do ano: {}  |  pedidos: {}  |  clientes: {}",
        format_brl_cents(totals.revenue_month_cents),
        format_brl_cents(totals.revenue_year_cents),
        totals.order_count,
        totals.customer_count,
    )
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if !matches!(view_data.input, InputMode::None) {
        handle_input_mode_key(state, view_data, internal_tx, key);
        return false;
    }

    match state.mode {
        AppMode::Form(_) => {
            handle_form_key(state, runtime, view_data, internal_tx, key);
            false
        }
        AppMode::Detail(_) => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                view_data.detail = None;
                state.dispatch(AppCommand::CloseOverlay);
            }
            false
        }
        AppMode::ConfirmDelete(id) => {
            handle_confirm_delete_key(state, runtime, view_data, internal_tx, id, key);
            false
        }
        AppMode::Profile => {
            handle_profile_key(state, runtime, view_data, internal_tx, key);
            false
        }
        AppMode::Nav => handle_nav_key(state, runtime, view_data, internal_tx, key),
    }
}

fn handle_profile_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(draft) = view_data.profile.as_mut() else {
        state.dispatch(AppCommand::CloseOverlay);
        return;
    };

    match key.code {
        KeyCode::Esc => {
            view_data.profile = None;
            state.dispatch(AppCommand::CloseOverlay);
        }
        KeyCode::Tab | KeyCode::Down => {
            draft.field = (draft.field + 1) % PROFILE_FIELD_COUNT;
        }
        KeyCode::BackTab | KeyCode::Up => {
            draft.field = draft.field.checked_sub(1).unwrap_or(PROFILE_FIELD_COUNT - 1);
        }
        KeyCode::Backspace => {
            draft.values[draft.field].pop();
        }
        KeyCode::Char(ch) => {
            draft.values[draft.field].push(ch);
        }
        KeyCode::Enter => submit_profile_form(state, runtime, view_data, internal_tx),
        _ => {}
    }
}

fn submit_profile_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(draft) = view_data.profile.as_ref() else {
        return;
    };

    let input = match draft.to_input() {
        Ok(input) => input,
        Err(error) => {
            emit_toast(
                state,
                view_data,
                internal_tx,
                ToastKind::Warning,
                format!("{error:#}"),
            );
            return;
        }
    };

    match runtime.submit_profile(&input) {
        Ok(()) => {
            view_data.profile = None;
            state.dispatch(AppCommand::CloseOverlay);
            // The address feeds delivery orders and the list join.
            reload(runtime, view_data);
            emit_toast(
                state,
                view_data,
                internal_tx,
                ToastKind::Success,
                "perfil atualizado",
            );
        }
        Err(error) => {
            emit_toast(
                state,
                view_data,
                internal_tx,
                ToastKind::Error,
                format!("falha ao salvar o perfil: {error:#}"),
            );
        }
    }
}

fn handle_input_mode_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let mode = std::mem::take(&mut view_data.input);
    match (mode, key.code) {
        (InputMode::Search(buffer), KeyCode::Enter) => {
            view_data.filter.search = buffer;
            view_data.filter.reset_page();
            view_data.selected_row = 0;
        }
        (InputMode::Month(buffer), KeyCode::Enter) => {
            let trimmed = buffer.trim();
            if trimmed.is_empty() {
                view_data.filter.month = None;
                view_data.filter.reset_page();
            } else {
                match YearMonth::parse(trimmed) {
                    Some(month) => {
                        view_data.filter.month = Some(month);
                        view_data.filter.reset_page();
                        view_data.selected_row = 0;
                    }
                    None => {
                        emit_toast(
                            state,
                            view_data,
                            internal_tx,
                            ToastKind::Warning,
                            format!("mês inválido: {trimmed:?} (use AAAA-MM)"),
                        );
                    }
                }
            }
        }
        (_, KeyCode::Esc) => {}
        (InputMode::Search(mut buffer), KeyCode::Backspace) => {
            buffer.pop();
            view_data.input = InputMode::Search(buffer);
        }
        (InputMode::Month(mut buffer), KeyCode::Backspace) => {
            buffer.pop();
            view_data.input = InputMode::Month(buffer);
        }
        (InputMode::Search(mut buffer), KeyCode::Char(ch)) => {
            buffer.push(ch);
            view_data.input = InputMode::Search(buffer);
        }
        (InputMode::Month(mut buffer), KeyCode::Char(ch)) => {
            if ch.is_ascii_digit() || ch == '-' {
                buffer.push(ch);
            }
            view_data.input = InputMode::Month(buffer);
        }
        (mode, _) => view_data.input = mode,
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(draft) = view_data.form.as_mut() else {
        state.dispatch(AppCommand::CloseOverlay);
        return;
    };

    match key.code {
        KeyCode::Esc => {
            let events = state.dispatch(AppCommand::CloseOverlay);
            if events
                .iter()
                .any(|event| matches!(event, AppEvent::ModeChanged(_)))
            {
                view_data.form = None;
            }
        }
        KeyCode::Tab | KeyCode::Down => {
            draft.field = (draft.field + 1) % FORM_FIELD_COUNT;
        }
        KeyCode::BackTab | KeyCode::Up => {
            draft.field = draft.field.checked_sub(1).unwrap_or(FORM_FIELD_COUNT - 1);
        }
        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if draft.field == 3 => {
            draft.delivery = match draft.delivery {
                fornada_app::DeliveryKind::Retirar => fornada_app::DeliveryKind::Entregar,
                fornada_app::DeliveryKind::Entregar => fornada_app::DeliveryKind::Retirar,
            };
        }
        KeyCode::Backspace => {
            if let Some(value) = draft.active_value_mut() {
                value.pop();
            }
        }
        KeyCode::Char(ch) => {
            if let Some(value) = draft.active_value_mut() {
                value.push(ch);
            }
        }
        KeyCode::Enter => submit_form(state, runtime, view_data, internal_tx),
        _ => {}
    }
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let AppMode::Form(form_mode) = state.mode else {
        return;
    };
    let Some(draft) = view_data.form.as_ref() else {
        return;
    };

    let input = match draft.to_input(OffsetDateTime::now_utc().date()) {
        Ok(input) => input,
        Err(error) => {
            emit_toast(
                state,
                view_data,
                internal_tx,
                ToastKind::Warning,
                format!("{error:#}"),
            );
            return;
        }
    };

    if state.dispatch(AppCommand::BeginSubmit).is_empty() {
        return;
    }

    let outcome = match form_mode {
        FormMode::Create => runtime.submit_create(&input),
        FormMode::Edit(id) => runtime.submit_edit(id, &input),
    };

    match outcome {
        Ok(()) => {
            let events = state.dispatch(AppCommand::SubmitSucceeded);
            view_data.form = None;
            if events
                .iter()
                .any(|event| matches!(event, AppEvent::ReloadRequested))
            {
                reload(runtime, view_data);
            }
            emit_toast(
                state,
                view_data,
                internal_tx,
                ToastKind::Success,
                "pedido salvo",
            );
        }
        Err(error) => {
            state.dispatch(AppCommand::SubmitFailed);
            emit_toast(
                state,
                view_data,
                internal_tx,
                ToastKind::Error,
                format!("falha ao salvar o pedido: {error:#}"),
            );
        }
    }
}

fn handle_confirm_delete_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    id: OrderId,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            state.dispatch(AppCommand::CloseOverlay);
            match runtime.delete_order(id) {
                Ok(()) => {
                    reload(runtime, view_data);
                    emit_toast(
                        state,
                        view_data,
                        internal_tx,
                        ToastKind::Success,
                        "pedido excluído",
                    );
                }
                Err(error) => {
                    emit_toast(
                        state,
                        view_data,
                        internal_tx,
                        ToastKind::Error,
                        format!("falha ao excluir o pedido: {error:#}"),
                    );
                }
            }
        }
        KeyCode::Char('n') | KeyCode::Esc => {
            state.dispatch(AppCommand::CloseOverlay);
        }
        _ => {}
    }
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let page = current_page(view_data);
    match (key.code, key.modifiers) {
        (KeyCode::Char('?'), _) => view_data.help_visible = true,
        (KeyCode::Char('j') | KeyCode::Down, _) => {
            if view_data.selected_row + 1 < page.rows.len() {
                view_data.selected_row += 1;
            }
        }
        (KeyCode::Char('k') | KeyCode::Up, _) => {
            view_data.selected_row = view_data.selected_row.saturating_sub(1);
        }
        (KeyCode::Char('n'), KeyModifiers::NONE) => {
            if page.page < page.total_pages {
                view_data.filter.page = page.page + 1;
                view_data.selected_row = 0;
            }
        }
        (KeyCode::Char('p'), KeyModifiers::NONE) => {
            if page.page > 1 {
                view_data.filter.page = page.page - 1;
                view_data.selected_row = 0;
            }
        }
        (KeyCode::Char('/'), _) => {
            view_data.input = InputMode::Search(view_data.filter.search.clone());
        }
        (KeyCode::Char('m'), KeyModifiers::NONE) => {
            let seed = view_data
                .filter
                .month
                .map(|month| format!("{}-{:02}", month.year, month.month as u8))
                .unwrap_or_default();
            view_data.input = InputMode::Month(seed);
        }
        (KeyCode::Char('s'), KeyModifiers::NONE) => {
            view_data.filter.status = next_status_filter(&view_data.filter.status);
            view_data.filter.reset_page();
            view_data.selected_row = 0;
        }
        (KeyCode::Char('c'), KeyModifiers::NONE) => {
            let page_size = view_data.filter.page_size;
            view_data.filter = ListFilter {
                page_size,
                ..ListFilter::default()
            };
            view_data.selected_row = 0;
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            reload(runtime, view_data);
            if let Ok(context) = runtime.context() {
                view_data.context = context;
            }
            emit_toast(
                state,
                view_data,
                internal_tx,
                ToastKind::Info,
                "lista atualizada",
            );
        }
        (KeyCode::Char('o'), KeyModifiers::NONE) => {
            view_data.form = Some(FormDraft::default());
            state.dispatch(AppCommand::OpenCreateForm);
        }
        (KeyCode::Char('u'), KeyModifiers::NONE) => match runtime.load_profile() {
            Ok(input) => {
                view_data.profile = Some(ProfileDraft::from_input(&input));
                state.dispatch(AppCommand::OpenProfileForm);
            }
            Err(error) => emit_toast(
                state,
                view_data,
                internal_tx,
                ToastKind::Error,
                format!("falha ao carregar o perfil: {error:#}"),
            ),
        },
        (KeyCode::Enter, _) => {
            if let Some(id) = selected_order_id(view_data, &page) {
                match runtime.load_order(id) {
                    Ok(order) => {
                        view_data.detail = Some(order);
                        state.dispatch(AppCommand::OpenDetail(id));
                    }
                    Err(error) => emit_toast(
                        state,
                        view_data,
                        internal_tx,
                        ToastKind::Error,
                        format!("falha ao abrir o pedido: {error:#}"),
                    ),
                }
            }
        }
        (KeyCode::Char('e'), KeyModifiers::NONE) => {
            if let Some(id) = selected_order_id(view_data, &page) {
                match runtime.begin_edit(id) {
                    Ok(input) => {
                        view_data.form = Some(FormDraft::from_input(&input));
                        state.dispatch(AppCommand::OpenEditForm(id));
                    }
                    Err(error) => {
                        reload(runtime, view_data);
                        emit_toast(
                            state,
                            view_data,
                            internal_tx,
                            ToastKind::Warning,
                            format!("{error:#}"),
                        );
                    }
                }
            }
        }
        (KeyCode::Char('d'), KeyModifiers::NONE) => {
            if let Some(id) = selected_order_id(view_data, &page) {
                state.dispatch(AppCommand::OpenDeleteConfirm(id));
            }
        }
        (KeyCode::Char('S'), _) => {
            if view_data.context.role == UserRole::Cliente {
                emit_toast(
                    state,
                    view_data,
                    internal_tx,
                    ToastKind::Warning,
                    "apenas administradores alteram o status",
                );
            } else if let Some(row) = page
                .rows
                .get(view_data.selected_row.min(page.rows.len().saturating_sub(1)))
            {
                let next = next_order_status(row.status);
                match runtime.update_status(row.id, next) {
                    Ok(()) => {
                        reload(runtime, view_data);
                        emit_toast(
                            state,
                            view_data,
                            internal_tx,
                            ToastKind::Success,
                            format!("status atualizado para {}", next.label()),
                        );
                    }
                    Err(error) => emit_toast(
                        state,
                        view_data,
                        internal_tx,
                        ToastKind::Error,
                        format!("falha ao atualizar o status: {error:#}"),
                    ),
                }
            }
        }
        (KeyCode::Char('w'), KeyModifiers::NONE) => {
            if let Some(id) = selected_order_id(view_data, &page) {
                match runtime.share_link(id) {
                    Ok(link) => emit_toast(
                        state,
                        view_data,
                        internal_tx,
                        ToastKind::Info,
                        format!("compartilhar: {link}"),
                    ),
                    Err(error) => emit_toast(
                        state,
                        view_data,
                        internal_tx,
                        ToastKind::Error,
                        format!("falha ao montar o link: {error:#}"),
                    ),
                }
            }
        }
        _ => {}
    }
    false
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(view_data))
        .block(Block::default().title("fornada").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    render_list(frame, layout[1], view_data);

    let toast_widget = Paragraph::new(status_text(state, view_data))
        .style(toast_style(state))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(toast_widget, layout[2]);

    if let Some(order) = &view_data.detail {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let detail = Paragraph::new(detail_text(order, view_data))
            .block(Block::default().title("pedido").borders(Borders::ALL));
        frame.render_widget(detail, area);
    }

    if let AppMode::ConfirmDelete(id) = state.mode {
        let area = centered_rect(50, 20, frame.area());
        frame.render_widget(Clear, area);
        let confirm = Paragraph::new(format!(
            "Excluir o pedido #{}? Essa ação não pode ser desfeita.\n\n[y] excluir   [n] cancelar",
            id.get()
        ))
        .block(
            Block::default()
                .title("confirmar exclusão")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Red)),
        );
        frame.render_widget(confirm, area);
    }

    if let Some(draft) = &view_data.form {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let title = match state.mode {
            AppMode::Form(FormMode::Edit(id)) => format!("editar pedido #{}", id.get()),
            _ => "novo pedido".to_owned(),
        };
        let form = Paragraph::new(form_text(draft, state))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(form, area);
    }

    if let Some(draft) = &view_data.profile {
        let area = centered_rect(60, 80, frame.area());
        frame.render_widget(Clear, area);
        let profile = Paragraph::new(profile_text(draft))
            .block(Block::default().title("meu perfil").borders(Borders::ALL));
        frame.render_widget(profile, area);
    }

    if view_data.help_visible {
        let area = centered_rect(80, 72, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("ajuda").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_list(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let page = current_page(view_data);

    let admin_view = view_data.context.role != UserRole::Cliente;
    let summary_height = if admin_view { 2 } else { 1 };
    let body_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(summary_height),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let mut summary = summary_cards(&view_data.orders)
        .iter()
        .map(|(label, count)| format!("{label}: {count}"))
        .collect::<Vec<String>>()
        .join("  |  ");
    if admin_view {
        summary.push('\n');
        summary.push_str(&totals_line(
            &view_data.orders,
            view_data.customers.len(),
            OffsetDateTime::now_utc().date(),
        ));
    }
    frame.render_widget(Paragraph::new(summary), body_layout[0]);

    let header_cells = ["#", "tema", "cliente", "evento", "status", "valor", "entrega"]
        .iter()
        .map(|title| Cell::from(*title).style(Style::default().add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells);

    let selected = view_data.selected_row.min(page.rows.len().saturating_sub(1));
    let rows = page.rows.iter().enumerate().map(|(index, row)| {
        let style = if index == selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Row::new([
            Cell::from(row.id.get().to_string()),
            Cell::from(row.theme.clone()),
            Cell::from(row.customer_name.clone()),
            Cell::from(row.event_date_label.clone()),
            Cell::from(row.status_label),
            Cell::from(row.price_label.clone()),
            Cell::from(row.delivery_label),
        ])
        .style(style)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Min(14),
            Constraint::Min(14),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(9),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("pedidos"));
    frame.render_widget(table, body_layout[1]);

    let mut footer = page.pager_label();
    if let Some(error) = &view_data.load_error {
        footer = format!("{footer}  |  {error}");
    }
    frame.render_widget(
        Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
        body_layout[2],
    );
}

fn header_text(view_data: &ViewData) -> String {
    let mut parts = vec![format!(
        "{} ({})",
        view_data.context.viewer_name,
        role_label(view_data.context.role)
    )];
    if let Some(plan) = &view_data.context.plan_line {
        parts.push(plan.clone());
    }
    parts.push(filter_label(&view_data.filter));
    parts.join("  |  ")
}

fn filter_label(filter: &ListFilter) -> String {
    if !filter.is_filtered() {
        return "sem filtros".to_owned();
    }
    let mut parts = Vec::new();
    if !filter.search.trim().is_empty() {
        parts.push(format!("busca: {:?}", filter.search.trim()));
    }
    if filter.status != StatusFilter::Any {
        parts.push(format!("status: {}", filter.status.label()));
    }
    if let Some(month) = filter.month {
        parts.push(format!("mês: {}", month.label()));
    }
    parts.join(", ")
}

const fn role_label(role: UserRole) -> &'static str {
    match role {
        UserRole::Cliente => "cliente",
        UserRole::Admin => "confeitaria",
        UserRole::Superadmin => "superadmin",
    }
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    match &view_data.input {
        InputMode::Search(buffer) => return format!("busca: {buffer}▏ (enter aplica, esc cancela)"),
        InputMode::Month(buffer) => {
            return format!("mês (AAAA-MM): {buffer}▏ (enter aplica, esc cancela)");
        }
        InputMode::None => {}
    }
    match &state.toast {
        Some(Toast { message, .. }) => message.clone(),
        None => "? ajuda  /busca  s status  m mês  o novo  enter detalhe  ctrl+q sair".to_owned(),
    }
}

fn toast_style(state: &AppState) -> Style {
    let color = match state.toast.as_ref().map(|toast| toast.kind) {
        Some(ToastKind::Success) => Color::Green,
        Some(ToastKind::Warning) => Color::Yellow,
        Some(ToastKind::Error) => Color::Red,
        Some(ToastKind::Info) | None => Color::White,
    };
    Style::default().fg(color)
}

fn detail_text(order: &Order, view_data: &ViewData) -> String {
    let customer = view_data.customers.get(&order.customer_id);
    let customer_name = customer.map_or("N/A", |customer| customer.name.as_str());
    let whatsapp = customer.map_or("N/A", |customer| customer.whatsapp.as_str());
    let size = order
        .size_cm
        .map(|cm| format!("{cm} cm"))
        .unwrap_or_else(|| "N/A".to_owned());
    let address = order.delivery_address.as_deref().unwrap_or("N/A");
    [
        format!("pedido #{}", order.id.get()),
        format!("tema: {}", order.theme),
        format!("cliente: {customer_name} ({whatsapp})"),
        format!("evento: {}", format_optional_date_br(order.event_date)),
        format!("tamanho: {size}"),
        format!("entrega: {}", order.delivery.label()),
        format!("endereço: {address}"),
        format!("status: {}", order.status.label()),
        format!("valor: {}", format_optional_brl(order.price_cents)),
        format!("descrição: {}", order.description),
        format!("observação: {}", order.note),
    ]
    .join("\n")
}

fn form_text(draft: &FormDraft, state: &AppState) -> String {
    let values = [
        draft.theme.clone(),
        draft.size_cm.clone(),
        draft.event_date.clone(),
        draft.delivery.label().to_owned(),
        draft.description.clone(),
        draft.note.clone(),
    ];
    let mut lines: Vec<String> = FORM_FIELD_LABELS
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (label, value))| {
            let marker = if index == draft.field { ">" } else { " " };
            format!("{marker} {label}: {value}")
        })
        .collect();
    lines.push(String::new());
    if state.form_phase == FormPhase::Submitting {
        lines.push("salvando...".to_owned());
    } else {
        lines.push("tab campo  espaço alterna entrega  enter salva  esc cancela".to_owned());
    }
    lines.join("\n")
}

fn profile_text(draft: &ProfileDraft) -> String {
    let mut lines: Vec<String> = PROFILE_FIELD_LABELS
        .iter()
        .zip(&draft.values)
        .enumerate()
        .map(|(index, (label, value))| {
            let marker = if index == draft.field { ">" } else { " " };
            format!("{marker} {label}: {value}")
        })
        .collect();
    lines.push(String::new());
    lines.push("tab campo  enter salva  esc cancela".to_owned());
    lines.join("\n")
}

fn help_overlay_text() -> String {
    [
        "j/k     selecionar pedido",
        "n/p     próxima/anterior página",
        "/       busca por cliente ou tema",
        "s       filtro de status (inclui \"ativos\")",
        "m       filtro por mês (AAAA-MM)",
        "c       limpar filtros",
        "enter   detalhe do pedido",
        "o       novo pedido",
        "u       editar perfil",
        "e       editar pedido pendente",
        "S       avançar status (confeitaria)",
        "d       excluir pedido",
        "w       link do WhatsApp",
        "r       recarregar",
        "?/esc   fechar a ajuda",
        "ctrl+q  sair",
    ]
    .join("\n")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
