#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tabula_document::WidgetSettings;
use tabula_editor::{
    AttributeHost, AttributePatch, CellChange, CellMatrix, CellValue, ChangeSource, EditorError,
    Widget, WidgetError, WidgetEvent, WidgetHooks,
};

#[derive(Default)]
pub struct WidgetState {
    pub data: CellMatrix,
    pub hooks: Option<WidgetHooks>,
    pub loads: Vec<CellMatrix>,
    pub settings: Vec<WidgetSettings>,
    pub destroy_count: usize,
    pub hooks_removed: bool,
    pub fail_load: bool,
    /// Emit `Loaded` from inside `load_data`
    pub confirm_load: bool,
    /// Emit a `LoadData` change from inside `load_data`
    pub echo_load: bool,
}

/// Grid stand-in; clones share state so tests can drive a mounted widget
#[derive(Clone, Default)]
pub struct FakeWidget {
    pub state: Arc<Mutex<WidgetState>>,
}

impl FakeWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn Widget> {
        Box::new(self.clone())
    }

    pub fn configure(&self, f: impl FnOnce(&mut WidgetState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn emit(&self, event: WidgetEvent) {
        let hooks = self.state.lock().unwrap().hooks.clone();
        if let Some(hooks) = hooks {
            hooks.emit(event);
        }
    }

    /// User types `value` into a cell
    pub fn edit(&self, row: usize, col: usize, value: impl Into<CellValue>) {
        let value = value.into();
        let old = {
            let mut state = self.state.lock().unwrap();
            let old = state.data.get(row, col).cloned().unwrap_or(CellValue::Null);
            state.data.set(row, col, value.clone());
            old
        };
        self.emit(WidgetEvent::CellsChanged {
            changes: vec![CellChange {
                row,
                col,
                old,
                new: value,
            }],
            source: ChangeSource::Edit,
        });
    }

    /// Formula engine updates a computed cell
    pub fn recalculate(&self, row: usize, col: usize, value: impl Into<CellValue>) {
        self.state.lock().unwrap().data.set(row, col, value.into());
        self.emit(WidgetEvent::FormulasRecalculated);
    }

    pub fn add_row(&self) {
        let at = {
            let mut state = self.state.lock().unwrap();
            let width = state.data.column_count();
            let mut rows = state.data.clone().into_rows();
            rows.push(vec![CellValue::empty(); width]);
            let at = rows.len() - 1;
            state.data = CellMatrix::new(rows).unwrap();
            at
        };
        self.emit(WidgetEvent::StructureChanged(
            tabula_editor::StructureChange::RowsCreated { at, count: 1 },
        ));
    }

    pub fn data(&self) -> CellMatrix {
        self.state.lock().unwrap().data.clone()
    }

    pub fn load_count(&self) -> usize {
        self.state.lock().unwrap().loads.len()
    }

    pub fn destroy_count(&self) -> usize {
        self.state.lock().unwrap().destroy_count
    }

    pub fn hooks_removed(&self) -> bool {
        self.state.lock().unwrap().hooks_removed
    }
}

impl Widget for FakeWidget {
    fn register_hooks(&mut self, hooks: WidgetHooks) {
        self.state.lock().unwrap().hooks = Some(hooks);
    }

    fn remove_hooks(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.hooks = None;
        state.hooks_removed = true;
    }

    fn load_data(&mut self, data: &CellMatrix) -> Result<(), WidgetError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_load {
            return Err(WidgetError::Load("grid not attached".into()));
        }
        state.data = data.clone();
        state.loads.push(data.clone());

        if let Some(hooks) = &state.hooks {
            if state.echo_load {
                hooks.after_change(
                    vec![CellChange::new(0, 0, CellValue::Null, CellValue::empty())],
                    ChangeSource::LoadData,
                );
            }
            if state.confirm_load {
                hooks.after_load();
            }
        }
        Ok(())
    }

    fn get_data(&self) -> Result<CellMatrix, WidgetError> {
        let state = self.state.lock().unwrap();
        if state.destroy_count > 0 {
            return Err(WidgetError::Destroyed);
        }
        Ok(state.data.clone())
    }

    fn update_settings(&mut self, settings: &WidgetSettings) -> Result<(), WidgetError> {
        self.state.lock().unwrap().settings.push(settings.clone());
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), WidgetError> {
        self.state.lock().unwrap().destroy_count += 1;
        Ok(())
    }
}

/// Host that records every patch it receives
#[derive(Clone, Default)]
pub struct RecordingHost {
    patches: Arc<Mutex<Vec<AttributePatch>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn AttributeHost> {
        Box::new(self.clone())
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn patches(&self) -> Vec<AttributePatch> {
        self.patches.lock().unwrap().clone()
    }

    /// Patches that carried cell data
    pub fn commits(&self) -> Vec<AttributePatch> {
        self.patches()
            .into_iter()
            .filter(|patch| patch.data.is_some())
            .collect()
    }
}

impl AttributeHost for RecordingHost {
    fn update_attributes(&mut self, patch: AttributePatch) -> Result<(), EditorError> {
        if *self.failing.lock().unwrap() {
            return Err(EditorError::Store("host rejected patch".into()));
        }
        self.patches.lock().unwrap().push(patch);
        Ok(())
    }
}

pub fn matrix(rows: serde_json::Value) -> CellMatrix {
    CellMatrix::from_json(&rows).unwrap()
}

pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
