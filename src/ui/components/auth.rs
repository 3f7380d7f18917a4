// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Account page: login, registration and logout.

use eframe::egui;

use crate::config::Session;
use crate::ui::components::{UiEvent, hint};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    Register,
}

impl AuthAction {
    fn success_message(self) -> &'static str {
        match self {
            Self::Login => "Logged in.",
            Self::Register => "Account created.",
        }
    }
}

/// Token and role handed back by the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grant {
    pub username: String,
    pub token: String,
    pub role: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthModel {
    pub username: String,
    pub password: String,
    pub busy: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthMsg {
    UsernameChanged(String),
    PasswordChanged(String),
    Submit(AuthAction),
    Finished {
        action: AuthAction,
        result: Result<Grant, String>,
    },
    Logout,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthCommand {
    Authenticate {
        action: AuthAction,
        username: String,
        password: String,
    },
}

pub fn update(
    model: &mut AuthModel,
    msg: AuthMsg,
    session: &mut Session,
    cmds: &mut Vec<AuthCommand>,
) -> Option<UiEvent> {
    match msg {
        AuthMsg::UsernameChanged(name) => {
            model.username = name;
            None
        }
        AuthMsg::PasswordChanged(password) => {
            model.password = password;
            None
        }
        AuthMsg::Submit(action) => {
            if model.busy {
                return None;
            }
            let username = model.username.trim();
            if username.is_empty() || model.password.is_empty() {
                return Some(UiEvent::error("Username and password are required."));
            }
            model.busy = true;
            cmds.push(AuthCommand::Authenticate {
                action,
                username: username.to_string(),
                password: model.password.clone(),
            });
            None
        }
        AuthMsg::Finished { action, result } => {
            model.busy = false;
            model.password.clear();
            match result {
                Ok(grant) => {
                    log::info!("signed in as {}", grant.username);
                    session.set(grant.username, grant.token, grant.role);
                    Some(UiEvent::info(action.success_message()))
                }
                Err(err) => Some(UiEvent::error(err)),
            }
        }
        AuthMsg::Logout => {
            session.clear();
            model.password.clear();
            Some(UiEvent::info("Logged out."))
        }
    }
}

pub fn view(ui: &mut egui::Ui, model: &AuthModel, session: &Session) -> Vec<AuthMsg> {
    let mut msgs = Vec::new();

    ui.heading("Account");
    ui.add_space(6.0);

    if session.is_logged_in() {
        ui.horizontal(|ui| {
            ui.label(format!(
                "{} Signed in as {}",
                egui_phosphor::regular::USER_CIRCLE,
                session.username().unwrap_or("?")
            ));
            if let Some(role) = session.role() {
                ui.weak(format!("({role})"));
            }
        });
        ui.add_space(6.0);
        if ui
            .button(format!("{} Log out", egui_phosphor::regular::SIGN_OUT))
            .clicked()
        {
            msgs.push(AuthMsg::Logout);
        }
        return msgs;
    }

    hint(ui, "Sign in or create an account.");
    ui.add_space(4.0);
    egui::Grid::new("auth_form")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label("Username");
            let mut username = model.username.clone();
            if ui
                .add(egui::TextEdit::singleline(&mut username).desired_width(220.0))
                .changed()
            {
                msgs.push(AuthMsg::UsernameChanged(username));
            }
            ui.end_row();

            ui.label("Password");
            let mut password = model.password.clone();
            if ui
                .add(
                    egui::TextEdit::singleline(&mut password)
                        .password(true)
                        .desired_width(220.0),
                )
                .changed()
            {
                msgs.push(AuthMsg::PasswordChanged(password));
            }
            ui.end_row();
        });

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        ui.add_enabled_ui(!model.busy, |ui| {
            if ui
                .button(format!("{} Log in", egui_phosphor::regular::SIGN_IN))
                .clicked()
            {
                msgs.push(AuthMsg::Submit(AuthAction::Login));
            }
            if ui.button("Register").clicked() {
                msgs.push(AuthMsg::Submit(AuthAction::Register));
            }
        });
        if model.busy {
            ui.add(egui::Spinner::new().size(14.0));
        }
    });

    msgs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_queue_nothing() {
        let mut model = AuthModel::default();
        let mut session = Session::default();
        let mut cmds = Vec::new();
        let event = update(&mut model, AuthMsg::Submit(AuthAction::Login), &mut session, &mut cmds);
        assert!(event.is_some_and(|e| e.is_error));
        assert!(cmds.is_empty());
    }

    #[test]
    fn login_stores_session_and_logout_clears_it() {
        let mut model = AuthModel::default();
        let mut session = Session::default();
        let mut cmds = Vec::new();
        update(&mut model, AuthMsg::UsernameChanged(" ana ".into()), &mut session, &mut cmds);
        update(&mut model, AuthMsg::PasswordChanged("pw".into()), &mut session, &mut cmds);
        update(&mut model, AuthMsg::Submit(AuthAction::Login), &mut session, &mut cmds);
        assert_eq!(
            cmds.pop(),
            Some(AuthCommand::Authenticate {
                action: AuthAction::Login,
                username: "ana".into(),
                password: "pw".into(),
            })
        );

        update(
            &mut model,
            AuthMsg::Finished {
                action: AuthAction::Login,
                result: Ok(Grant {
                    username: "ana".into(),
                    token: "tok".into(),
                    role: Some("admin".into()),
                }),
            },
            &mut session,
            &mut cmds,
        );
        assert!(session.is_logged_in());
        assert_eq!(session.role(), Some("admin"));
        assert!(model.password.is_empty());

        update(&mut model, AuthMsg::Logout, &mut session, &mut cmds);
        assert!(!session.is_logged_in());
    }

    #[test]
    fn failed_login_leaves_session_empty() {
        let mut model = AuthModel::default();
        let mut session = Session::default();
        let mut cmds = Vec::new();
        model.busy = true;
        let event = update(
            &mut model,
            AuthMsg::Finished {
                action: AuthAction::Register,
                result: Err("Username already exists".into()),
            },
            &mut session,
            &mut cmds,
        )
        .unwrap();
        assert_eq!(event, UiEvent::error("Username already exists"));
        assert!(!session.is_logged_in());
        assert!(!model.busy);
    }
}
