//! Report builder state store
//!
//! Owns the working report (meta + config), the discovered schema and the UI
//! flags of one builder session. The store is a `Copy` handle: reactive state
//! lives in signals and the non-`Send` services (API client, debouncers) live in
//! a local `StoredValue`, so everything is owned by the reactive owner that
//! created the store and disposed with it.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use contracts::shared::report_builder::{
    Aggregation, ChartType, CheckDataSourceRequest, ConnectionDto, DataSourceType, DateGrouping,
    Field, FilterPatch, FilterSlot, PreviewRequest, PreviewResponse, ReportConfig, ReportDto,
    SaveReportRequest, Slot, SlotItem, Sorting,
};
use leptos::logging::log;
use leptos::prelude::*;
use leptos::task::spawn_local;

use super::api::ReportBuilderApi;
use super::debounce::{Debouncer, TimerDriver};
use super::dnd::DragState;

/// Quiet period before a preview request is sent
pub const PREVIEW_DEBOUNCE_MS: u32 = 600;
/// Lifetime of a rejected-drop message
pub const MESSAGE_LIFETIME_MS: u32 = 3000;

// ============================================================================
// Meta
// ============================================================================

/// Editable report metadata and data-source identity
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportMeta {
    /// Set once the report is persisted
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub connection_key: String,
    pub data_source_type: DataSourceType,
    pub data_source_name: String,
}

impl ReportMeta {
    pub fn from_report(report: &ReportDto) -> Self {
        Self {
            id: Some(report.id),
            name: report.name.clone(),
            description: report.description.clone().unwrap_or_default(),
            connection_key: report.connection_key.clone(),
            data_source_type: report.data_source_type.unwrap_or_default(),
            data_source_name: report.data_source_name.clone(),
        }
    }

    fn has_data_source(&self) -> bool {
        !self.connection_key.trim().is_empty() && !self.data_source_name.trim().is_empty()
    }

    pub fn check_request(&self) -> Option<CheckDataSourceRequest> {
        if !self.has_data_source() {
            return None;
        }
        Some(CheckDataSourceRequest {
            connection_key: self.connection_key.trim().to_string(),
            data_source_type: self.data_source_type,
            name: self.data_source_name.trim().to_string(),
        })
    }

    pub fn save_request(&self, config: &ReportConfig) -> Result<SaveReportRequest, BuilderValidation> {
        if self.name.trim().is_empty() {
            return Err(BuilderValidation::MissingReportName);
        }
        if !self.has_data_source() {
            return Err(BuilderValidation::MissingDataSource);
        }
        let description = self.description.trim();
        Ok(SaveReportRequest {
            name: self.name.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            connection_key: self.connection_key.trim().to_string(),
            data_source_type: self.data_source_type,
            data_source_name: self.data_source_name.trim().to_string(),
            config_json: config.to_config_json(),
        })
    }
}

/// Local validation failures; never sent to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderValidation {
    MissingCheckInputs,
    MissingReportName,
    MissingDataSource,
    UnknownField(String),
    IncompatibleField(String),
}

impl fmt::Display for BuilderValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderValidation::MissingCheckInputs => {
                write!(f, "Select a connection, a type and a data source name first")
            }
            BuilderValidation::MissingReportName => write!(f, "Report name is required"),
            BuilderValidation::MissingDataSource => {
                write!(f, "Connection, type and data source name are required")
            }
            BuilderValidation::UnknownField(name) => {
                write!(f, "Field \"{}\" is not part of the checked data source", name)
            }
            BuilderValidation::IncompatibleField(message) => write!(f, "{}", message),
        }
    }
}

/// Phase of the builder session, derived from state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderPhase {
    Unchecked,
    Checked,
    Configuring,
    Saving,
    Loading,
}

/// Preview payload when every guard passes
pub fn preview_request(
    meta: &ReportMeta,
    config: &ReportConfig,
    checked: bool,
) -> Option<PreviewRequest> {
    if !checked || !meta.has_data_source() || !config.has_assignments() {
        return None;
    }
    if config.chart_type == ChartType::Pie && config.validate_pie_config().is_some() {
        return None;
    }
    Some(PreviewRequest {
        connection_key: meta.connection_key.trim().to_string(),
        data_source_type: meta.data_source_type,
        data_source_name: meta.data_source_name.trim().to_string(),
        config_json: config.to_config_json(),
    })
}

// ============================================================================
// Store
// ============================================================================

struct StoreServices {
    api: Rc<dyn ReportBuilderApi>,
    preview_debounce: Debouncer,
    message_debounce: Debouncer,
    preview_seq: Cell<u64>,
    check_seq: Cell<u64>,
}

#[derive(Clone, Copy)]
pub struct ReportBuilderStore {
    pub meta: RwSignal<ReportMeta>,
    pub config: RwSignal<ReportConfig>,
    pub schema: RwSignal<Vec<Field>>,
    pub connections: RwSignal<Vec<ConnectionDto>>,
    pub preview: RwSignal<Option<PreviewResponse>>,

    pub data_source_checked: RwSignal<bool>,
    pub checking: RwSignal<bool>,
    pub check_error: RwSignal<Option<String>>,
    pub connections_loading: RwSignal<bool>,
    pub preview_loading: RwSignal<bool>,
    pub preview_error: RwSignal<Option<String>>,
    pub saving: RwSignal<bool>,
    pub loading: RwSignal<bool>,
    /// Transient notice for validation and persistence failures
    pub toast: RwSignal<Option<String>>,
    /// Rejected-drop message, cleared after `MESSAGE_LIFETIME_MS`
    pub drop_message: RwSignal<Option<String>>,

    pub field_search: RwSignal<String>,
    pub drag: RwSignal<DragState>,

    services: StoredValue<StoreServices, LocalStorage>,
}

impl ReportBuilderStore {
    pub fn new(api: Rc<dyn ReportBuilderApi>, timer: Rc<dyn TimerDriver>) -> Self {
        let services = StoreServices {
            api,
            preview_debounce: Debouncer::new(PREVIEW_DEBOUNCE_MS, timer.clone()),
            message_debounce: Debouncer::new(MESSAGE_LIFETIME_MS, timer),
            preview_seq: Cell::new(0),
            check_seq: Cell::new(0),
        };
        Self {
            meta: RwSignal::new(ReportMeta::default()),
            config: RwSignal::new(ReportConfig::default()),
            schema: RwSignal::new(Vec::new()),
            connections: RwSignal::new(Vec::new()),
            preview: RwSignal::new(None),
            data_source_checked: RwSignal::new(false),
            checking: RwSignal::new(false),
            check_error: RwSignal::new(None),
            connections_loading: RwSignal::new(false),
            preview_loading: RwSignal::new(false),
            preview_error: RwSignal::new(None),
            saving: RwSignal::new(false),
            loading: RwSignal::new(false),
            toast: RwSignal::new(None),
            drop_message: RwSignal::new(None),
            field_search: RwSignal::new(String::new()),
            drag: RwSignal::new(DragState::Idle),
            services: StoredValue::new_local(services),
        }
    }

    fn api(&self) -> Option<Rc<dyn ReportBuilderApi>> {
        self.services.try_with_value(|s| s.api.clone())
    }

    fn is_alive(&self) -> bool {
        self.services.try_with_value(|_| ()).is_some()
    }

    // ========================================================================
    // Derived state
    // ========================================================================

    pub fn phase(&self) -> BuilderPhase {
        if self.loading.get() {
            BuilderPhase::Loading
        } else if self.saving.get() {
            BuilderPhase::Saving
        } else if !self.data_source_checked.get() {
            BuilderPhase::Unchecked
        } else if self.config.with(|c| c.has_assignments()) {
            BuilderPhase::Configuring
        } else {
            BuilderPhase::Checked
        }
    }

    /// Schema filtered by the fields search box
    pub fn filtered_fields(&self) -> Vec<Field> {
        let query = self.field_search.get();
        self.schema.with(|schema| {
            schema
                .iter()
                .filter(|f| f.matches_search(&query))
                .cloned()
                .collect()
        })
    }

    pub fn field(&self, name: &str) -> Option<Field> {
        self.schema
            .with_untracked(|schema| schema.iter().find(|f| f.name == name).cloned())
    }

    /// Whether the current axis field is date-like (tracked)
    pub fn axis_is_date(&self) -> bool {
        let axis = self.config.with(|c| c.axis.as_ref().map(|a| a.field.clone()));
        match axis {
            Some(name) => self
                .schema
                .with(|schema| schema.iter().any(|f| f.name == name && f.is_date())),
            None => false,
        }
    }

    // ========================================================================
    // Meta editing
    // ========================================================================

    pub fn set_name(&self, name: String) {
        self.meta.update(|m| m.name = name);
    }

    pub fn set_description(&self, description: String) {
        self.meta.update(|m| m.description = description);
    }

    pub fn set_connection_key(&self, key: String) {
        self.change_identity(|m| m.connection_key = key);
    }

    pub fn set_data_source_type(&self, data_source_type: DataSourceType) {
        self.change_identity(|m| m.data_source_type = data_source_type);
    }

    pub fn set_data_source_name(&self, name: String) {
        self.change_identity(|m| m.data_source_name = name);
    }

    /// Editing the data-source identity invalidates the last check and any check in flight
    fn change_identity(&self, f: impl FnOnce(&mut ReportMeta)) {
        let before = self.meta.get_untracked();
        self.meta.update(f);
        let changed = self.meta.with_untracked(|m| {
            m.connection_key != before.connection_key
                || m.data_source_type != before.data_source_type
                || m.data_source_name != before.data_source_name
        });
        if !changed {
            return;
        }
        self.services.try_with_value(|s| s.check_seq.set(s.check_seq.get() + 1));
        self.cancel_preview();
        self.checking.set(false);
        self.data_source_checked.set(false);
        self.schema.set(Vec::new());
    }

    // ========================================================================
    // Remote operations
    // ========================================================================

    pub async fn load_connections(self) {
        let Some(api) = self.api() else { return };
        self.connections_loading.set(true);
        match api.list_connections().await {
            Ok(connections) => {
                if !self.is_alive() {
                    return;
                }
                log!("Loaded {} connections", connections.len());
                // Preselect the only connection
                if connections.len() == 1 && self.meta.with_untracked(|m| m.connection_key.is_empty()) {
                    let key = connections[0].key.clone();
                    self.meta.update(|m| m.connection_key = key);
                }
                self.connections.set(connections);
            }
            Err(e) => {
                if !self.is_alive() {
                    return;
                }
                log!("Failed to load connections: {}", e);
                self.toast.set(Some(format!("Failed to load connections: {}", e)));
            }
        }
        self.connections_loading.set(false);
    }

    /// Validate the data source and discover its schema; resets the config
    pub async fn check(self) {
        self.run_check(false).await;
    }

    async fn run_check(self, keep_config: bool) {
        let Some(request) = self.meta.with_untracked(|m| m.check_request()) else {
            self.toast
                .set(Some(BuilderValidation::MissingCheckInputs.to_string()));
            return;
        };
        let Some(api) = self.api() else { return };
        let Some(seq) = self.services.try_with_value(|s| {
            let next = s.check_seq.get() + 1;
            s.check_seq.set(next);
            next
        }) else {
            return;
        };

        self.cancel_preview();
        self.checking.set(true);
        self.check_error.set(None);
        log!(
            "Checking data source {}:{}:{}",
            request.connection_key,
            request.data_source_type.as_str(),
            request.name
        );

        let result = api.check_data_source(&request).await;
        let current = self
            .services
            .try_with_value(|s| s.check_seq.get() == seq)
            .unwrap_or(false);
        if !current {
            log!("Check #{} discarded: superseded", seq);
            return;
        }

        match result {
            Ok(response) => {
                let checked = response.exists && !response.schema.is_empty();
                if !checked {
                    let message = response
                        .message
                        .clone()
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| format!("Data source \"{}\" was not found", request.name));
                    self.check_error.set(Some(message));
                }
                log!("Check finished: {} fields", response.schema.len());
                self.schema.set(response.schema);
                if !keep_config {
                    self.config.set(ReportConfig::default());
                }
                self.preview.set(None);
                self.preview_error.set(None);
                self.data_source_checked.set(checked);
                self.schedule_preview();
            }
            Err(e) => {
                log!("Check failed: {}", e);
                self.schema.set(Vec::new());
                self.data_source_checked.set(false);
                self.check_error.set(Some(e));
            }
        }
        self.checking.set(false);
    }

    /// Execute the preview now if the guards pass; stale responses are dropped
    pub async fn run_preview(self) {
        let request = self.meta.with_untracked(|meta| {
            self.config.with_untracked(|config| {
                preview_request(meta, config, self.data_source_checked.get_untracked())
            })
        });
        let Some(request) = request else { return };
        let Some((api, seq)) = self.services.try_with_value(|s| {
            let next = s.preview_seq.get() + 1;
            s.preview_seq.set(next);
            (s.api.clone(), next)
        }) else {
            return;
        };

        self.preview_loading.set(true);
        self.preview_error.set(None);
        log!("Preview #{} dispatched", seq);

        let result = api.preview(&request).await;
        let current = self
            .services
            .try_with_value(|s| s.preview_seq.get() == seq)
            .unwrap_or(false);
        if !current {
            log!("Preview #{} discarded: superseded", seq);
            return;
        }

        match result {
            Ok(preview) => self.preview.set(Some(preview)),
            Err(e) => {
                log!("Preview #{} failed: {}", seq, e);
                self.preview_error.set(Some(e));
            }
        }
        self.preview_loading.set(false);
    }

    /// Run a pending debounced preview immediately
    pub async fn flush_preview(self) {
        let pending = self
            .services
            .try_with_value(|s| s.preview_debounce.take_pending())
            .flatten();
        if pending.is_some() {
            self.run_preview().await;
        }
    }

    pub fn preview_pending(&self) -> bool {
        self.services
            .try_with_value(|s| s.preview_debounce.is_pending())
            .unwrap_or(false)
    }

    fn schedule_preview(&self) {
        let store = *self;
        self.services.try_with_value(|s| {
            s.preview_debounce
                .schedule(move || spawn_local(store.run_preview()))
        });
    }

    /// Drop the pending preview and ignore any response still in flight
    fn cancel_preview(&self) {
        self.services.try_with_value(|s| {
            s.preview_debounce.cancel();
            s.preview_seq.set(s.preview_seq.get() + 1);
        });
        self.preview_loading.set(false);
    }

    /// Persist the report; returns its id on success
    pub async fn save(self) -> Option<i64> {
        let meta = self.meta.get_untracked();
        let body = match self.config.with_untracked(|c| meta.save_request(c)) {
            Ok(body) => body,
            Err(validation) => {
                self.toast.set(Some(validation.to_string()));
                return None;
            }
        };
        let api = self.api()?;

        self.saving.set(true);
        log!("Saving report {:?} \"{}\"", meta.id, body.name);
        let result = match meta.id {
            Some(id) => api.update_report(id, &body).await,
            None => api.create_report(&body).await,
        };
        if !self.is_alive() {
            return result.ok().map(|r| r.id);
        }
        self.saving.set(false);

        match result {
            Ok(report) => {
                self.meta.update(|m| m.id = Some(report.id));
                self.toast.set(None);
                Some(report.id)
            }
            Err(e) => {
                log!("Save failed: {}", e);
                self.toast.set(Some(format!("Save failed: {}", e)));
                None
            }
        }
    }

    /// Load a persisted report for editing and re-check its data source
    pub async fn load(self, id: i64) {
        let Some(api) = self.api() else { return };
        self.reset();
        self.loading.set(true);
        log!("Loading report {}", id);

        let report = match api.get_report(id).await {
            Ok(report) => report,
            Err(e) => {
                if self.is_alive() {
                    self.loading.set(false);
                    self.toast.set(Some(format!("Failed to load report: {}", e)));
                }
                return;
            }
        };
        if !self.is_alive() {
            return;
        }

        self.meta.set(ReportMeta::from_report(&report));
        match report.config() {
            Ok(config) => self.config.set(config),
            Err(e) => {
                log!("Report {} has unreadable configJson: {}", id, e);
                self.config.set(ReportConfig::default());
                self.toast.set(Some(format!(
                    "Saved configuration could not be read ({}); the default configuration is shown",
                    e
                )));
            }
        }
        self.loading.set(false);
        self.run_check(true).await;
    }

    // ========================================================================
    // Config mutations
    // ========================================================================

    fn mutate(&self, f: impl FnOnce(&mut ReportConfig)) {
        self.config.update(f);
        self.schedule_preview();
    }

    pub fn set_chart_type(&self, chart_type: ChartType) {
        self.mutate(|c| c.set_chart_type(chart_type));
    }

    /// Validate a dropped field against the slot and assign it
    pub fn drop_field(&self, slot: Slot, field_name: &str) -> Result<(), BuilderValidation> {
        let Some(field) = self.field(field_name) else {
            let rejection = BuilderValidation::UnknownField(field_name.to_string());
            self.show_drop_message(rejection.to_string());
            return Err(rejection);
        };
        if !slot.accepts(&field) {
            let rejection = BuilderValidation::IncompatibleField(slot.rejection_message(&field));
            self.show_drop_message(rejection.to_string());
            return Err(rejection);
        }
        self.mutate(|c| c.add_to_slot(slot, &field.name, None));
        Ok(())
    }

    fn show_drop_message(&self, message: String) {
        let drop_message = self.drop_message;
        drop_message.set(Some(message));
        self.services.try_with_value(|s| {
            s.message_debounce.schedule(move || drop_message.set(None))
        });
    }

    pub fn remove_from_slot(&self, slot: Slot, index: usize) {
        self.mutate(|c| c.remove_from_slot(slot, SlotItem::Index(index)));
    }

    pub fn reorder_slot(&self, slot: Slot, from: usize, to: usize) {
        let mut moved = false;
        self.config.update(|c| moved = c.reorder_slot(slot, from, to));
        if moved {
            self.schedule_preview();
        }
    }

    pub fn set_aggregation(&self, index: usize, aggregation: Aggregation) {
        self.mutate(|c| c.set_aggregation(index, aggregation));
    }

    /// Only applied while the axis field is date-like; clearing is always allowed
    pub fn set_date_grouping(&self, grouping: Option<DateGrouping>) {
        let axis_is_date = self.config.with_untracked(|c| {
            c.axis
                .as_ref()
                .and_then(|a| self.field(&a.field))
                .map(|f| f.is_date())
                .unwrap_or(false)
        });
        if grouping.is_some() && !axis_is_date {
            return;
        }
        self.mutate(|c| c.set_date_grouping(grouping));
    }

    pub fn set_sorting(&self, sorting: Option<Sorting>) {
        self.mutate(|c| c.set_sorting(sorting));
    }

    pub fn add_filter(&self, filter: FilterSlot) {
        self.mutate(|c| c.add_filter(filter));
    }

    pub fn update_filter(&self, index: usize, patch: FilterPatch) {
        self.mutate(|c| c.update_filter(index, patch));
    }

    pub fn remove_filter(&self, index: usize) {
        self.mutate(|c| c.remove_filter(index));
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Back to an empty session
    pub fn reset(&self) {
        self.cancel_preview();
        self.services.try_with_value(|s| {
            s.message_debounce.cancel();
            s.check_seq.set(s.check_seq.get() + 1);
        });
        self.meta.set(ReportMeta::default());
        self.config.set(ReportConfig::default());
        self.schema.set(Vec::new());
        self.preview.set(None);
        self.data_source_checked.set(false);
        self.checking.set(false);
        self.check_error.set(None);
        self.preview_error.set(None);
        self.saving.set(false);
        self.loading.set(false);
        self.toast.set(None);
        self.drop_message.set(None);
        self.field_search.set(String::new());
        self.drag.set(DragState::Idle);
    }

    /// Stop timers and ignore in-flight responses; called on unmount
    pub fn dispose(&self) {
        self.services.try_with_value(|s| {
            s.preview_debounce.cancel();
            s.message_debounce.cancel();
            s.preview_seq.set(s.preview_seq.get() + 1);
            s.check_seq.set(s.check_seq.get() + 1);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::report_builder::debounce::ManualTimer;
    use async_trait::async_trait;
    use contracts::shared::report_builder::CheckDataSourceResponse;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct FakeApi {
        schema: Vec<Field>,
        report: Option<ReportDto>,
        checks: RefCell<Vec<CheckDataSourceRequest>>,
        previews: RefCell<Vec<PreviewRequest>>,
        saves: RefCell<Vec<SaveReportRequest>>,
        gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
        check_gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
        fail_check: Cell<bool>,
        fail_preview: Cell<bool>,
        fail_save: Cell<bool>,
    }

    #[async_trait(?Send)]
    impl ReportBuilderApi for FakeApi {
        async fn list_connections(&self) -> Result<Vec<ConnectionDto>, String> {
            Ok(vec![ConnectionDto {
                key: "erp".into(),
                label: Some("ERP".into()),
            }])
        }

        async fn check_data_source(
            &self,
            request: &CheckDataSourceRequest,
        ) -> Result<CheckDataSourceResponse, String> {
            self.checks.borrow_mut().push(request.clone());
            let gate = self.check_gates.borrow_mut().pop_front();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if self.fail_check.get() {
                return Err("Connection refused".to_string());
            }
            Ok(CheckDataSourceResponse {
                exists: true,
                message: None,
                schema: self.schema.clone(),
            })
        }

        async fn preview(&self, request: &PreviewRequest) -> Result<PreviewResponse, String> {
            let gate = self.gates.borrow_mut().pop_front();
            let call = {
                let mut previews = self.previews.borrow_mut();
                previews.push(request.clone());
                previews.len()
            };
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if self.fail_preview.get() {
                return Err("no such column: total".to_string());
            }
            Ok(PreviewResponse {
                columns: vec![format!("call{}", call)],
                rows: Vec::new(),
            })
        }

        async fn list_reports(&self, _search: Option<&str>) -> Result<Vec<ReportDto>, String> {
            Ok(self.report.clone().into_iter().collect())
        }

        async fn get_report(&self, _id: i64) -> Result<ReportDto, String> {
            self.report.clone().ok_or_else(|| "Not found".to_string())
        }

        async fn create_report(&self, body: &SaveReportRequest) -> Result<ReportDto, String> {
            self.saves.borrow_mut().push(body.clone());
            if self.fail_save.get() {
                return Err("database is locked".to_string());
            }
            Ok(ReportDto {
                id: 42,
                name: body.name.clone(),
                ..Default::default()
            })
        }

        async fn update_report(&self, id: i64, body: &SaveReportRequest) -> Result<ReportDto, String> {
            self.saves.borrow_mut().push(body.clone());
            if self.fail_save.get() {
                return Err("Report 7 not found".to_string());
            }
            Ok(ReportDto {
                id,
                name: body.name.clone(),
                ..Default::default()
            })
        }

        async fn delete_report(&self, _id: i64) -> Result<(), String> {
            Ok(())
        }
    }

    fn sales_schema() -> Vec<Field> {
        vec![
            Field::new("region", "nvarchar", "String", false),
            Field::new("total", "decimal", "Decimal", false),
            Field::new("order_date", "datetime2", "DateTime", true),
        ]
    }

    fn setup(api: FakeApi) -> (Owner, Rc<FakeApi>, ManualTimer, ReportBuilderStore) {
        let owner = Owner::new();
        owner.set();
        let api = Rc::new(api);
        let timer = ManualTimer::default();
        let store = ReportBuilderStore::new(api.clone(), Rc::new(timer.clone()));
        (owner, api, timer, store)
    }

    fn point_at_sales(store: &ReportBuilderStore) {
        store.set_connection_key("erp".into());
        store.set_data_source_type(DataSourceType::View);
        store.set_data_source_name("vw_sales".into());
    }

    async fn checked_store() -> (Owner, Rc<FakeApi>, ManualTimer, ReportBuilderStore) {
        let (owner, api, timer, store) = setup(FakeApi {
            schema: sales_schema(),
            ..Default::default()
        });
        point_at_sales(&store);
        store.check().await;
        (owner, api, timer, store)
    }

    #[tokio::test]
    async fn test_check_populates_schema_and_resets_config() {
        let (_owner, api, _timer, store) = setup(FakeApi {
            schema: sales_schema()[..2].to_vec(),
            ..Default::default()
        });
        point_at_sales(&store);
        store.config.update(|c| c.set_chart_type(ChartType::Bar));

        store.check().await;

        assert!(store.data_source_checked.get_untracked());
        assert_eq!(store.schema.get_untracked().len(), 2);
        assert_eq!(store.config.get_untracked(), ReportConfig::default());
        assert_eq!(
            api.checks.borrow()[0],
            CheckDataSourceRequest {
                connection_key: "erp".into(),
                data_source_type: DataSourceType::View,
                name: "vw_sales".into(),
            }
        );
        assert_eq!(store.phase(), BuilderPhase::Checked);
    }

    #[tokio::test]
    async fn test_check_requires_all_inputs() {
        let (_owner, api, _timer, store) = setup(FakeApi::default());
        store.set_connection_key("erp".into());
        store.set_data_source_name("   ".into());

        store.check().await;

        assert!(api.checks.borrow().is_empty());
        assert_eq!(
            store.toast.get_untracked(),
            Some(BuilderValidation::MissingCheckInputs.to_string())
        );
        assert!(!store.data_source_checked.get_untracked());
    }

    #[tokio::test]
    async fn test_empty_schema_leaves_source_unchecked() {
        let (_owner, _api, _timer, store) = setup(FakeApi::default());
        point_at_sales(&store);
        store.check().await;
        assert!(!store.data_source_checked.get_untracked());
        assert!(store.check_error.get_untracked().is_some());
    }

    #[tokio::test]
    async fn test_incompatible_drop_is_rejected_with_message() {
        let (_owner, _api, timer, store) = checked_store().await;
        store.flush_preview().await;

        let result = store.drop_field(Slot::Axis, "total");
        assert!(matches!(result, Err(BuilderValidation::IncompatibleField(_))));
        assert!(store.config.get_untracked().axis.is_none());
        assert!(store.drop_message.get_untracked().is_some());

        assert_eq!(timer.fire(MESSAGE_LIFETIME_MS), 1);
        assert!(store.drop_message.get_untracked().is_none());
    }

    #[tokio::test]
    async fn test_numeric_drop_on_values_appends_sum() {
        let (_owner, _api, _timer, store) = checked_store().await;

        assert!(store.drop_field(Slot::Values, "total").is_ok());

        let values = store.config.get_untracked().values;
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].field, "total");
        assert_eq!(values[0].aggregation, Aggregation::Sum);
        assert_eq!(store.phase(), BuilderPhase::Configuring);
    }

    #[tokio::test]
    async fn test_rapid_edits_send_one_preview() {
        let (_owner, api, timer, store) = checked_store().await;
        store.drop_field(Slot::Values, "total").unwrap();
        store.set_chart_type(ChartType::Bar);
        store.set_chart_type(ChartType::Line);
        store.set_chart_type(ChartType::Table);

        assert!(store.preview_pending());
        assert_eq!(timer.last_delay(), Some(PREVIEW_DEBOUNCE_MS));
        store.flush_preview().await;

        let previews = api.previews.borrow();
        assert_eq!(previews.len(), 1);
        let sent = ReportConfig::from_config_json(&previews[0].config_json).unwrap();
        assert_eq!(sent.chart_type, ChartType::Table);
        assert_eq!(
            store.preview.get_untracked().unwrap().columns,
            vec!["call1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_invalid_pie_skips_preview() {
        let (_owner, api, _timer, store) = checked_store().await;
        store.drop_field(Slot::Axis, "region").unwrap();
        store.set_chart_type(ChartType::Pie);
        store.flush_preview().await;
        assert!(api.previews.borrow().is_empty());

        store.drop_field(Slot::Values, "total").unwrap();
        store.flush_preview().await;
        assert_eq!(api.previews.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_preview_response_is_discarded() {
        let (_owner, api, _timer, store) = checked_store().await;
        store.drop_field(Slot::Values, "total").unwrap();
        store.flush_preview().await;

        let (release, gate) = oneshot::channel();
        api.gates.borrow_mut().push_back(gate);

        let slow = store.run_preview();
        let fast = async {
            store.run_preview().await;
            let _ = release.send(());
        };
        tokio::join!(slow, fast);

        assert_eq!(api.previews.borrow().len(), 3);
        assert_eq!(
            store.preview.get_untracked().unwrap().columns,
            vec!["call3".to_string()]
        );
        assert!(!store.preview_loading.get_untracked());
    }

    #[tokio::test]
    async fn test_date_grouping_only_on_date_axis() {
        let (_owner, _api, _timer, store) = checked_store().await;
        store.drop_field(Slot::Axis, "region").unwrap();
        store.set_date_grouping(Some(DateGrouping::Month));
        assert_eq!(store.config.get_untracked().axis.unwrap().date_grouping, None);

        store.drop_field(Slot::Axis, "order_date").unwrap();
        store.set_date_grouping(Some(DateGrouping::Month));
        assert_eq!(
            store.config.get_untracked().axis.unwrap().date_grouping,
            Some(DateGrouping::Month)
        );

        store.drop_field(Slot::Axis, "region").unwrap();
        assert_eq!(store.config.get_untracked().axis.unwrap().date_grouping, None);
    }

    #[tokio::test]
    async fn test_save_without_name_is_rejected_locally() {
        let (_owner, api, _timer, store) = checked_store().await;

        assert_eq!(store.save().await, None);

        assert!(api.saves.borrow().is_empty());
        assert_eq!(
            store.toast.get_untracked(),
            Some("Report name is required".to_string())
        );
    }

    #[tokio::test]
    async fn test_save_creates_then_updates() {
        let (_owner, api, _timer, store) = checked_store().await;
        store.set_name("Sales by region".into());
        store.drop_field(Slot::Axis, "region").unwrap();

        assert_eq!(store.save().await, Some(42));
        assert_eq!(store.meta.get_untracked().id, Some(42));
        let saved = api.saves.borrow()[0].clone();
        assert_eq!(saved.config_json, store.config.get_untracked().to_config_json());

        assert_eq!(store.save().await, Some(42));
        assert_eq!(api.saves.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_load_hydrates_and_rechecks() {
        let mut config = ReportConfig::default();
        config.set_chart_type(ChartType::Bar);
        config.add_to_slot(Slot::Axis, "region", None);
        let (_owner, api, _timer, store) = setup(FakeApi {
            schema: sales_schema(),
            report: Some(ReportDto {
                id: 5,
                name: "Sales".into(),
                connection_key: "erp".into(),
                data_source_type: Some(DataSourceType::View),
                data_source_name: "vw_sales".into(),
                config_json: config.to_config_json(),
                ..Default::default()
            }),
            ..Default::default()
        });

        store.load(5).await;

        assert_eq!(store.meta.get_untracked().id, Some(5));
        assert_eq!(store.config.get_untracked(), config);
        assert_eq!(api.checks.borrow().len(), 1);
        assert!(store.data_source_checked.get_untracked());
        assert!(store.toast.get_untracked().is_none());
    }

    #[tokio::test]
    async fn test_load_with_corrupt_config_surfaces_error() {
        let (_owner, _api, _timer, store) = setup(FakeApi {
            schema: sales_schema(),
            report: Some(ReportDto {
                id: 9,
                name: "Broken".into(),
                connection_key: "erp".into(),
                data_source_type: Some(DataSourceType::View),
                data_source_name: "vw_sales".into(),
                config_json: "{\"chartType\": ".into(),
                ..Default::default()
            }),
            ..Default::default()
        });

        store.load(9).await;

        assert_eq!(store.config.get_untracked(), ReportConfig::default());
        let toast = store.toast.get_untracked().unwrap_or_default();
        assert!(toast.contains("could not be read"), "{}", toast);
        assert!(store.data_source_checked.get_untracked());
    }

    #[tokio::test]
    async fn test_editing_identity_invalidates_check() {
        let (_owner, _api, _timer, store) = checked_store().await;
        store.drop_field(Slot::Values, "total").unwrap();
        store.set_data_source_name("vw_orders".into());

        assert!(!store.data_source_checked.get_untracked());
        assert!(!store.preview_pending());
        assert_eq!(store.phase(), BuilderPhase::Unchecked);
    }

    #[tokio::test]
    async fn test_renaming_during_check_discards_its_response() {
        let (_owner, api, _timer, store) = setup(FakeApi {
            schema: sales_schema(),
            ..Default::default()
        });
        point_at_sales(&store);
        let (release, gate) = oneshot::channel();
        api.check_gates.borrow_mut().push_back(gate);

        let check = store.check();
        let rename = async {
            tokio::task::yield_now().await;
            assert!(store.checking.get_untracked());
            store.set_data_source_name("vw_orders".into());
            let _ = release.send(());
        };
        tokio::join!(check, rename);

        assert_eq!(api.checks.borrow().len(), 1);
        assert!(!store.data_source_checked.get_untracked());
        assert!(!store.checking.get_untracked());
        assert!(store.schema.get_untracked().is_empty());
        assert_eq!(store.meta.get_untracked().data_source_name, "vw_orders");

        store.flush_preview().await;
        store.run_preview().await;
        assert!(api.previews.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_failed_check_clears_schema() {
        let (_owner, api, _timer, store) = checked_store().await;
        assert_eq!(store.schema.get_untracked().len(), 3);

        api.fail_check.set(true);
        store.check().await;

        assert!(!store.data_source_checked.get_untracked());
        assert!(store.schema.get_untracked().is_empty());
        assert!(!store.checking.get_untracked());
        assert_eq!(
            store.check_error.get_untracked(),
            Some("Connection refused".to_string())
        );
    }

    #[tokio::test]
    async fn test_failed_preview_keeps_schema_and_config() {
        let (_owner, api, _timer, store) = checked_store().await;
        store.drop_field(Slot::Values, "total").unwrap();
        let config = store.config.get_untracked();

        api.fail_preview.set(true);
        store.flush_preview().await;

        assert_eq!(api.previews.borrow().len(), 1);
        assert_eq!(
            store.preview_error.get_untracked(),
            Some("no such column: total".to_string())
        );
        assert!(store.preview.get_untracked().is_none());
        assert!(!store.preview_loading.get_untracked());
        assert_eq!(store.schema.get_untracked().len(), 3);
        assert_eq!(store.config.get_untracked(), config);
        assert!(store.data_source_checked.get_untracked());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_working_report() {
        let (_owner, api, _timer, store) = checked_store().await;
        store.set_name("Sales by region".into());
        store.drop_field(Slot::Axis, "region").unwrap();
        let meta = store.meta.get_untracked();
        let config = store.config.get_untracked();

        api.fail_save.set(true);
        assert_eq!(store.save().await, None);

        assert_eq!(api.saves.borrow().len(), 1);
        assert_eq!(store.meta.get_untracked(), meta);
        assert_eq!(store.meta.get_untracked().id, None);
        assert_eq!(store.config.get_untracked(), config);
        assert!(!store.saving.get_untracked());
        assert_eq!(
            store.toast.get_untracked(),
            Some("Save failed: database is locked".to_string())
        );
    }
}
