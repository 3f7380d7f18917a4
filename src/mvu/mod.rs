// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Root Model-View-Update kernel wiring page state, messages, and commands.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::api::types::{BulkEdit, ProductRef, ProductUpdate, SearchQuery};
use crate::api::{ApiClient, ApiError, StreamEnd, StreamSignal};
use crate::config::{AppConfig, Session, Settings, UiConfig};
use crate::models::field::{FieldDefinition, FieldRegistry};
use crate::models::progress::{StreamHandle, StreamJob};
use crate::models::record::RecordId;
use crate::ui::components::auth::{self, AuthAction, AuthCommand, AuthModel, AuthMsg, Grant};
use crate::ui::components::fields::{self, FieldsCommand, FieldsModel, FieldsMsg};
use crate::ui::components::product_form::{
    self, ProductFormCommand, ProductFormModel, ProductFormMsg,
};
use crate::ui::components::products::{self, ProductsCommand, ProductsModel, ProductsMsg};
use crate::ui::components::progress::{self, JobCommand, JobModel, JobMsg};
use crate::ui::components::search::{self, SearchCommand, SearchModel, SearchMsg};
use crate::ui::components::transfer::{self, TransferCommand, TransferModel, TransferMsg};
use crate::ui::components::UiEvent;

/// Navigation targets in the side panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Page {
    #[default]
    Fields,
    AddField,
    Products,
    AddProduct,
    Search,
    AiTheme,
    Translate,
    Data,
    Account,
}

impl Page {
    pub const ALL: [Page; 9] = [
        Page::Fields,
        Page::AddField,
        Page::Products,
        Page::AddProduct,
        Page::Search,
        Page::AiTheme,
        Page::Translate,
        Page::Data,
        Page::Account,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Page::Fields => "Fields",
            Page::AddField => "Add Field",
            Page::Products => "Products",
            Page::AddProduct => "Add Product",
            Page::Search => "Search",
            Page::AiTheme => "AI Theme",
            Page::Translate => "Translate",
            Page::Data => "Data",
            Page::Account => "Account",
        }
    }

    pub fn icon(self) -> &'static str {
        use egui_phosphor::regular as icons;
        match self {
            Page::Fields => icons::LIST_BULLETS,
            Page::AddField => icons::PLUS_SQUARE,
            Page::Products => icons::PACKAGE,
            Page::AddProduct => icons::PLUS_CIRCLE,
            Page::Search => icons::MAGNIFYING_GLASS,
            Page::AiTheme => icons::SPARKLE,
            Page::Translate => icons::TRANSLATE,
            Page::Data => icons::DATABASE,
            Page::Account => icons::USER_CIRCLE,
        }
    }
}

/// Message shown in the status bar until it expires.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
    pub shown_at: Instant,
}

/// Top-level application state.
pub struct AppModel {
    pub page: Page,
    pub settings: Settings,
    pub session: Session,
    pub fields: FieldsModel,
    pub products: ProductsModel,
    pub product_form: ProductFormModel,
    pub search: SearchModel,
    pub theme: JobModel,
    pub translate: JobModel,
    pub transfer: TransferModel,
    pub auth: AuthModel,
    /// Latest status message.
    pub status: Option<StatusLine>,
    /// Count of queued background commands.
    pub pending_commands: usize,
    status_ttl: Duration,
}

impl Default for AppModel {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}

impl AppModel {
    pub fn new(config: &AppConfig) -> Self {
        let ui: &UiConfig = &config.ui;
        Self {
            page: Page::default(),
            settings: Settings::from_config(config),
            session: Session::default(),
            fields: FieldsModel::new(ui),
            products: ProductsModel::new(ui),
            product_form: ProductFormModel::new(ui),
            search: SearchModel::new(ui),
            theme: JobModel::new(StreamJob::ThemeDescriptions),
            translate: JobModel::new(StreamJob::TranslateProducts),
            transfer: TransferModel::default(),
            auth: AuthModel::default(),
            status: None,
            pending_commands: 0,
            status_ttl: Duration::from_millis(ui.status_ttl_ms),
        }
    }

    pub fn registry(&self) -> &FieldRegistry {
        self.fields.registry()
    }

    pub fn job(&self, job: StreamJob) -> &JobModel {
        match job {
            StreamJob::ThemeDescriptions => &self.theme,
            StreamJob::TranslateProducts => &self.translate,
        }
    }

    fn job_mut(&mut self, job: StreamJob) -> &mut JobModel {
        match job {
            StreamJob::ThemeDescriptions => &mut self.theme,
            StreamJob::TranslateProducts => &mut self.translate,
        }
    }

    /// When the current status line should disappear.
    pub fn status_deadline(&self) -> Option<Instant> {
        self.status.as_ref().map(|s| s.shown_at + self.status_ttl)
    }
}

/// Application messages routed through the update function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Msg {
    Navigate(Page),
    StatusExpired,
    Fields(FieldsMsg),
    Products(ProductsMsg),
    ProductForm(ProductFormMsg),
    Search(SearchMsg),
    Job(StreamJob, JobMsg),
    Transfer(TransferMsg),
    Auth(AuthMsg),
}

/// Commands represent side-effects executed on worker threads.
#[derive(Clone, Debug)]
pub enum Command {
    LoadFields,
    AddField(FieldDefinition),
    UpdateField { index: usize, field: FieldDefinition },
    DeleteField { index: usize },
    LoadProducts,
    AddProduct {
        title: String,
        values: BTreeMap<String, String>,
    },
    UpdateProduct(ProductUpdate),
    DeleteProduct(ProductRef),
    DeleteSearchResult(RecordId),
    UpdateSearchResult {
        id: RecordId,
        updates: BTreeMap<String, String>,
    },
    BulkEdit(BulkEdit),
    BulkDelete(Vec<usize>),
    Search(SearchQuery),
    StartJob {
        job: StreamJob,
        input: String,
        handle: StreamHandle,
    },
    UploadCsv,
    DownloadCsv,
    SetShopify(bool),
    RefreshShopify,
    Authenticate {
        action: AuthAction,
        username: String,
        password: String,
    },
}

/// Update the application model and enqueue commands.
pub fn update(model: &mut AppModel, msg: Msg, cmds: &mut Vec<Command>) {
    match msg {
        Msg::Navigate(page) => model.page = page,
        Msg::StatusExpired => model.status = None,
        Msg::Fields(m) => {
            let mut field_cmds = Vec::new();
            let event = fields::update(&mut model.fields, m, &mut field_cmds);
            surface(model, event);
            cmds.extend(field_cmds.into_iter().map(|c| match c {
                FieldsCommand::Load => Command::LoadFields,
                FieldsCommand::Add(field) => Command::AddField(field),
                FieldsCommand::Update { index, field } => Command::UpdateField { index, field },
                FieldsCommand::Delete { index } => Command::DeleteField { index },
            }));
        }
        Msg::Products(m) => {
            let mut product_cmds = Vec::new();
            let event = products::update(
                &mut model.products,
                m,
                model.fields.registry(),
                &mut product_cmds,
            );
            surface(model, event);
            cmds.extend(product_cmds.into_iter().map(|c| match c {
                ProductsCommand::Load => Command::LoadProducts,
                ProductsCommand::Update(update) => Command::UpdateProduct(update),
                ProductsCommand::Delete(target) => Command::DeleteProduct(target),
                ProductsCommand::BulkEdit(edit) => Command::BulkEdit(edit),
                ProductsCommand::BulkDelete(indices) => Command::BulkDelete(indices),
            }));
        }
        Msg::ProductForm(m) => {
            let mut form_cmds = Vec::new();
            let event = product_form::update(
                &mut model.product_form,
                m,
                model.fields.registry(),
                &mut form_cmds,
            );
            surface(model, event);
            for c in form_cmds {
                match c {
                    ProductFormCommand::Add { title, values } => {
                        cmds.push(Command::AddProduct { title, values })
                    }
                    ProductFormCommand::RefreshProducts => refresh_products(model, cmds),
                }
            }
        }
        Msg::Search(m) => {
            let mut search_cmds = Vec::new();
            let event = search::update(
                &mut model.search,
                m,
                model.fields.registry(),
                &mut search_cmds,
            );
            surface(model, event);
            for c in search_cmds {
                match c {
                    SearchCommand::Search(query) => cmds.push(Command::Search(query)),
                    SearchCommand::Delete(id) => cmds.push(Command::DeleteSearchResult(id)),
                    SearchCommand::Update { id, updates } => {
                        cmds.push(Command::UpdateSearchResult { id, updates })
                    }
                    SearchCommand::RefreshProducts => refresh_products(model, cmds),
                }
            }
        }
        Msg::Job(job, m) => {
            let mut job_cmds = Vec::new();
            let event = progress::update(model.job_mut(job), m, &mut job_cmds);
            surface(model, event);
            cmds.extend(job_cmds.into_iter().map(|c| match c {
                JobCommand::Start { job, input, handle } => Command::StartJob { job, input, handle },
            }));
        }
        Msg::Transfer(m) => {
            let mut transfer_cmds = Vec::new();
            let event = transfer::update(
                &mut model.transfer,
                m,
                &mut model.settings,
                &mut transfer_cmds,
            );
            surface(model, event);
            for c in transfer_cmds {
                match c {
                    TransferCommand::PickAndUpload => cmds.push(Command::UploadCsv),
                    TransferCommand::PickAndDownload => cmds.push(Command::DownloadCsv),
                    TransferCommand::SetShopify(on) => cmds.push(Command::SetShopify(on)),
                    TransferCommand::RefreshShopify => cmds.push(Command::RefreshShopify),
                    TransferCommand::RefreshProducts => refresh_products(model, cmds),
                }
            }
        }
        Msg::Auth(m) => {
            let mut auth_cmds = Vec::new();
            let event = auth::update(&mut model.auth, m, &mut model.session, &mut auth_cmds);
            surface(model, event);
            cmds.extend(auth_cmds.into_iter().map(|c| match c {
                AuthCommand::Authenticate {
                    action,
                    username,
                    password,
                } => Command::Authenticate {
                    action,
                    username,
                    password,
                },
            }));
        }
    }
}

/// Route a products reload through the products component so its loading flag is set.
fn refresh_products(model: &mut AppModel, cmds: &mut Vec<Command>) {
    update(model, Msg::Products(ProductsMsg::Refresh), cmds);
}

/// Put a component event into the status bar.
fn surface(model: &mut AppModel, event: Option<UiEvent>) {
    if let Some(event) = event {
        if event.is_error {
            log::debug!("status error: {}", event.message);
        }
        model.status = Some(StatusLine {
            text: event.message,
            is_error: event.is_error,
            shown_at: Instant::now(),
        });
    }
}

/// Log a failed request and turn it into the text shown to the user.
fn failure(context: &str, err: ApiError, fallback: &str) -> String {
    log::warn!("{context} failed: {err}");
    err.user_message(fallback)
}

fn acked<T>(context: &str, result: Result<T, ApiError>, fallback: &str) -> Result<(), String> {
    result.map(|_| ()).map_err(|err| failure(context, err, fallback))
}

/// Execute a command on a worker thread, emitting result messages as they arrive.
///
/// Most commands emit exactly one message; progress streams emit one per event.
pub fn run_command(cmd: Command, client: &ApiClient, emit: &mut dyn FnMut(Msg)) {
    match cmd {
        Command::LoadFields => {
            let result = client
                .list_fields()
                .map_err(|err| failure("load fields", err, "Failed to fetch fields."));
            emit(Msg::Fields(FieldsMsg::Loaded(result)));
        }
        Command::AddField(field) => {
            let result = acked("add field", client.add_field(&field), "Failed to add field.");
            emit(Msg::Fields(FieldsMsg::Added(result)));
        }
        Command::UpdateField { index, field } => {
            let result = acked(
                "update field",
                client.update_field(index, &field),
                "Update failed.",
            );
            emit(Msg::Fields(FieldsMsg::Updated {
                index,
                field,
                result,
            }));
        }
        Command::DeleteField { index } => {
            let result = acked("delete field", client.delete_field(index), "Delete failed.");
            emit(Msg::Fields(FieldsMsg::Deleted { index, result }));
        }
        Command::LoadProducts => {
            let result = client
                .list_products()
                .map_err(|err| failure("load products", err, "Failed to fetch products."));
            emit(Msg::Products(ProductsMsg::Loaded(result)));
        }
        Command::AddProduct { title, values } => {
            let result = acked(
                "add product",
                client.add_product(&title, &values),
                "Failed to add product.",
            );
            emit(Msg::ProductForm(ProductFormMsg::Added(result)));
        }
        Command::UpdateProduct(update) => {
            let result = acked(
                "update product",
                client.update_product(&update),
                "Update failed.",
            );
            emit(Msg::Products(ProductsMsg::Updated { update, result }));
        }
        Command::DeleteProduct(target) => {
            let result = acked(
                "delete product",
                client.delete_product(&target),
                "Delete failed.",
            );
            emit(Msg::Products(ProductsMsg::Deleted { target, result }));
        }
        Command::DeleteSearchResult(id) => {
            let result = acked(
                "delete product",
                client.delete_product(&ProductRef::Id(id.clone())),
                "Delete failed.",
            );
            emit(Msg::Search(SearchMsg::Deleted { id, result }));
        }
        Command::UpdateSearchResult { id, updates } => {
            let update = ProductUpdate::Keyed {
                id: id.clone(),
                updates: updates.clone(),
            };
            let result = acked(
                "update product",
                client.update_product(&update),
                "Update failed.",
            );
            emit(Msg::Search(SearchMsg::Updated {
                id,
                updates,
                result,
            }));
        }
        Command::BulkEdit(edit) => {
            let result = acked("bulk edit", client.bulk_edit(&edit), "Edit failed.");
            emit(Msg::Products(ProductsMsg::BulkEdited(result)));
        }
        Command::BulkDelete(indices) => {
            let result = acked("bulk delete", client.bulk_delete(indices), "Delete failed.");
            emit(Msg::Products(ProductsMsg::BulkDeleted(result)));
        }
        Command::Search(query) => {
            let result = client
                .search(&query)
                .map_err(|err| failure("search", err, "Search failed."));
            emit(Msg::Search(SearchMsg::Finished(result)));
        }
        Command::StartJob { job, input, handle } => {
            let id = handle.id;
            let outcome = client.stream_job(job, &input, &handle, |signal| match signal {
                StreamSignal::Opened => emit(Msg::Job(job, JobMsg::Opened { id })),
                StreamSignal::Data(data) => emit(Msg::Job(job, JobMsg::Event { id, data })),
            });
            match outcome {
                Ok(StreamEnd::Cancelled) => log::debug!("job #{id} cancelled"),
                Ok(StreamEnd::Eof) => {
                    log::debug!("job #{id} stream ended");
                    emit(Msg::Job(job, JobMsg::Lost { id }));
                }
                Err(err) => {
                    log::warn!("job #{id} stream failed: {err}");
                    emit(Msg::Job(job, JobMsg::Lost { id }));
                }
            }
        }
        Command::UploadCsv => {
            let picked = rfd::FileDialog::new()
                .set_title("Select CSV to upload")
                .add_filter("CSV", &["csv"])
                .pick_file();
            let result = match picked {
                None => Ok(None),
                Some(path) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    client
                        .upload_csv(&path)
                        .map(|_| Some(name))
                        .map_err(|err| failure("upload csv", err, "Upload failed."))
                }
            };
            emit(Msg::Transfer(TransferMsg::UploadFinished(result)));
        }
        Command::DownloadCsv => {
            let picked = rfd::FileDialog::new()
                .set_title("Save CSV export")
                .set_file_name("products.csv")
                .add_filter("CSV", &["csv"])
                .save_file();
            let result = match picked {
                None => Ok(None),
                Some(path) => client
                    .download_csv(&path)
                    .map(|_| Some(path.display().to_string()))
                    .map_err(|err| failure("download csv", err, "Download failed.")),
            };
            emit(Msg::Transfer(TransferMsg::DownloadFinished(result)));
        }
        Command::SetShopify(on) => {
            let result = acked("set shopify", client.set_use_shopify(on), "Shopify sync failed");
            emit(Msg::Transfer(TransferMsg::ShopifySaved(result)));
        }
        Command::RefreshShopify => {
            let result = acked(
                "refresh from shopify",
                client.refresh_from_shopify(),
                "Shopify sync failed",
            );
            emit(Msg::Transfer(TransferMsg::Refreshed(result)));
        }
        Command::Authenticate {
            action,
            username,
            password,
        } => {
            let (response, fallback) = match action {
                AuthAction::Login => (client.login(&username, &password), "Login failed."),
                AuthAction::Register => {
                    (client.register(&username, &password), "Registration failed.")
                }
            };
            let result = response
                .map(|token| Grant {
                    username,
                    token: token.access_token,
                    role: token.role,
                })
                .map_err(|err| failure("authenticate", err, fallback));
            emit(Msg::Auth(AuthMsg::Finished { action, result }));
        }
    }
}
