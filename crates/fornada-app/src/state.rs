// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::OrderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(OrderId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Editing,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    Form(FormMode),
    Detail(OrderId),
    ConfirmDelete(OrderId),
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub form_phase: FormPhase,
    pub toast: Option<Toast>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            form_phase: FormPhase::Editing,
            toast: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    OpenCreateForm,
    OpenEditForm(OrderId),
    OpenDetail(OrderId),
    OpenDeleteConfirm(OrderId),
    OpenProfileForm,
    CloseOverlay,
    BeginSubmit,
    SubmitFailed,
    SubmitSucceeded,
    ShowToast(ToastKind, String),
    ClearToast,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    FormPhaseChanged(FormPhase),
    /// The list snapshot must be fetched again (successful submit or delete).
    ReloadRequested,
    ToastShown(Toast),
    ToastCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::OpenCreateForm => self.enter_mode(AppMode::Form(FormMode::Create)),
            AppCommand::OpenEditForm(id) => self.enter_mode(AppMode::Form(FormMode::Edit(id))),
            AppCommand::OpenDetail(id) => self.enter_mode(AppMode::Detail(id)),
            AppCommand::OpenDeleteConfirm(id) => self.enter_mode(AppMode::ConfirmDelete(id)),
            AppCommand::OpenProfileForm => self.enter_mode(AppMode::Profile),
            AppCommand::CloseOverlay => {
                // A submit in flight keeps its overlay until it resolves.
                if self.form_phase == FormPhase::Submitting {
                    return Vec::new();
                }
                self.enter_mode(AppMode::Nav)
            }
            AppCommand::BeginSubmit => {
                if !matches!(self.mode, AppMode::Form(_))
                    || self.form_phase == FormPhase::Submitting
                {
                    return Vec::new();
                }
                self.form_phase = FormPhase::Submitting;
                vec![AppEvent::FormPhaseChanged(self.form_phase)]
            }
            AppCommand::SubmitFailed => {
                if self.form_phase != FormPhase::Submitting {
                    return Vec::new();
                }
                self.form_phase = FormPhase::Editing;
                vec![AppEvent::FormPhaseChanged(self.form_phase)]
            }
            AppCommand::SubmitSucceeded => {
                if self.form_phase != FormPhase::Submitting {
                    return Vec::new();
                }
                self.form_phase = FormPhase::Editing;
                self.mode = AppMode::Nav;
                vec![
                    AppEvent::FormPhaseChanged(self.form_phase),
                    AppEvent::ModeChanged(self.mode),
                    AppEvent::ReloadRequested,
                ]
            }
            AppCommand::ShowToast(kind, message) => {
                let toast = Toast { kind, message };
                self.toast = Some(toast.clone());
                vec![AppEvent::ToastShown(toast)]
            }
            AppCommand::ClearToast => {
                self.toast = None;
                vec![AppEvent::ToastCleared]
            }
        }
    }

    fn enter_mode(&mut self, mode: AppMode) -> Vec<AppEvent> {
        self.mode = mode;
        if !matches!(mode, AppMode::Form(_)) {
            self.form_phase = FormPhase::Editing;
        }
        vec![AppEvent::ModeChanged(self.mode)]
    }
}
