// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Long-running AI job page (theme descriptions, translation) with live progress.

use eframe::egui;

use crate::models::progress::{JobProgress, StreamHandle, StreamJob, StreamState};
use crate::ui::components::{UiEvent, hint};

#[derive(Clone, Debug, PartialEq)]
pub struct JobModel {
    job: StreamJob,
    pub input: String,
    pub progress: JobProgress,
    next_id: u64,
}

impl JobModel {
    pub fn new(job: StreamJob) -> Self {
        Self {
            job,
            input: String::new(),
            progress: JobProgress::default(),
            next_id: 1,
        }
    }

    pub fn job(&self) -> StreamJob {
        self.job
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobMsg {
    InputChanged(String),
    Submit,
    Cancel,
    Opened { id: u64 },
    Event { id: u64, data: String },
    Lost { id: u64 },
}

#[derive(Clone, Debug)]
pub enum JobCommand {
    Start {
        job: StreamJob,
        input: String,
        handle: StreamHandle,
    },
}

pub fn update(model: &mut JobModel, msg: JobMsg, cmds: &mut Vec<JobCommand>) -> Option<UiEvent> {
    match msg {
        JobMsg::InputChanged(text) => {
            model.input = text;
            None
        }
        JobMsg::Submit => {
            let input = model.input.trim();
            if input.is_empty() {
                return Some(UiEvent::error(model.job.empty_input_message()));
            }
            let handle = StreamHandle::new(model.next_id);
            model.next_id += 1;
            log::info!("starting {} job #{}", model.job.endpoint(), handle.id);
            model.progress.start(handle.clone());
            cmds.push(JobCommand::Start {
                job: model.job,
                input: input.to_string(),
                handle,
            });
            None
        }
        JobMsg::Cancel => {
            model.progress.cancel();
            None
        }
        JobMsg::Opened { id } => {
            model.progress.opened(id);
            None
        }
        JobMsg::Event { id, data } => {
            if model.progress.apply(id, &data) && model.progress.state == StreamState::Complete {
                return Some(UiEvent::info(format!("{} finished.", model.job.title())));
            }
            None
        }
        JobMsg::Lost { id } => {
            if model.progress.connection_lost(id) {
                return Some(UiEvent::error(model.progress.status.clone()));
            }
            None
        }
    }
}

pub fn view(ui: &mut egui::Ui, model: &JobModel) -> Vec<JobMsg> {
    let mut msgs = Vec::new();
    let (label, placeholder) = match model.job {
        StreamJob::ThemeDescriptions => ("Theme", "e.g. summer, minimalist"),
        StreamJob::TranslateProducts => ("Language", "e.g. German"),
    };
    let running = model.progress.state.is_active();

    ui.heading(model.job.title());
    ui.add_space(6.0);
    ui.horizontal(|ui| {
        ui.label(label);
        let mut input = model.input.clone();
        let response = ui.add_enabled(
            !running,
            egui::TextEdit::singleline(&mut input)
                .hint_text(placeholder)
                .desired_width(240.0),
        );
        if response.changed() {
            msgs.push(JobMsg::InputChanged(input));
        }
        let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if running {
            if ui
                .button(format!("{} Cancel", egui_phosphor::regular::STOP))
                .clicked()
            {
                msgs.push(JobMsg::Cancel);
            }
        } else if ui
            .button(format!("{} Start", egui_phosphor::regular::PLAY))
            .clicked()
            || enter
        {
            msgs.push(JobMsg::Submit);
        }
    });
    ui.add_space(8.0);

    let progress = &model.progress;
    match progress.state {
        StreamState::Idle => hint(ui, "No job running."),
        _ => {
            let fraction = progress.percent() as f32 / 100.0;
            ui.add(
                egui::ProgressBar::new(fraction)
                    .desired_width(360.0)
                    .show_percentage()
                    .animate(running),
            );
            ui.label(format!("{} / {}", progress.progress, progress.total));
            let color = if progress.state == StreamState::Failed {
                egui::Color32::from_rgb(200, 80, 80)
            } else {
                ui.visuals().text_color()
            };
            ui.label(egui::RichText::new(&progress.status).color(color));
        }
    }

    msgs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(model: &mut JobModel) -> u64 {
        let mut cmds = Vec::new();
        update(model, JobMsg::InputChanged("summer".into()), &mut cmds);
        update(model, JobMsg::Submit, &mut cmds);
        match cmds.pop() {
            Some(JobCommand::Start { handle, input, .. }) => {
                assert_eq!(input, "summer");
                handle.id
            }
            None => panic!("expected start command"),
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        let mut model = JobModel::new(StreamJob::TranslateProducts);
        let mut cmds = Vec::new();
        let event = update(&mut model, JobMsg::Submit, &mut cmds).unwrap();
        assert_eq!(event.message, "Please enter a language.");
        assert!(cmds.is_empty());
        assert_eq!(model.progress.state, StreamState::Idle);
    }

    #[test]
    fn progress_then_complete() {
        let mut model = JobModel::new(StreamJob::ThemeDescriptions);
        let id = started(&mut model);
        let mut cmds = Vec::new();
        update(&mut model, JobMsg::Opened { id }, &mut cmds);
        update(
            &mut model,
            JobMsg::Event {
                id,
                data: r#"{"progress":3,"total":10,"status":"processing"}"#.into(),
            },
            &mut cmds,
        );
        assert_eq!(model.progress.percent(), 30);
        assert_eq!(model.progress.status, "Processing 3 of 10...");

        let event = update(
            &mut model,
            JobMsg::Event {
                id,
                data: r#"{"progress":10,"total":10,"status":"complete"}"#.into(),
            },
            &mut cmds,
        );
        assert!(event.is_some_and(|e| !e.is_error));
        assert_eq!(model.progress.percent(), 100);
        assert_eq!(model.progress.status, "Done!");
        assert_eq!(model.progress.active_id(), None);

        update(
            &mut model,
            JobMsg::Event {
                id,
                data: r#"{"progress":1,"total":10,"status":"processing"}"#.into(),
            },
            &mut cmds,
        );
        assert_eq!(model.progress.status, "Done!");
        assert!(update(&mut model, JobMsg::Lost { id }, &mut cmds).is_none());
    }

    #[test]
    fn restart_ignores_the_old_stream() {
        let mut model = JobModel::new(StreamJob::ThemeDescriptions);
        let first = started(&mut model);
        let second = started(&mut model);
        assert_ne!(first, second);

        let mut cmds = Vec::new();
        assert!(update(&mut model, JobMsg::Lost { id: first }, &mut cmds).is_none());
        assert_eq!(model.progress.state, StreamState::Connecting);

        let event = update(&mut model, JobMsg::Lost { id: second }, &mut cmds).unwrap();
        assert!(event.is_error);
        assert_eq!(model.progress.state, StreamState::Failed);
    }

    #[test]
    fn cancel_returns_to_idle() {
        let mut model = JobModel::new(StreamJob::ThemeDescriptions);
        let id = started(&mut model);
        let mut cmds = Vec::new();
        update(&mut model, JobMsg::Cancel, &mut cmds);
        assert_eq!(model.progress.state, StreamState::Idle);
        update(
            &mut model,
            JobMsg::Event {
                id,
                data: r#"{"progress":1,"total":2,"status":"processing"}"#.into(),
            },
            &mut cmds,
        );
        assert_eq!(model.progress.state, StreamState::Idle);
    }
}
