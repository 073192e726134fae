//! # Live Widget Contract
//!
//! A widget is the externally rendered grid a node view drives. The node
//! view owns it exclusively: data goes in through [`Widget::load_data`],
//! comes back out through [`Widget::get_data`], and change notifications
//! arrive through the [`WidgetHooks`] registered at mount.

use tabula_document::{CellMatrix, CellValue, WidgetSettings};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WidgetError {
    #[error("Widget has been destroyed")]
    Destroyed,

    #[error("Failed to load data: {0}")]
    Load(String),

    #[error("Failed to read data: {0}")]
    Read(String),

    #[error("Widget error: {0}")]
    Other(String),
}

/// Interactive grid driven by a node view
pub trait Widget: Send + 'static {
    /// Start delivering change notifications to `hooks`
    fn register_hooks(&mut self, hooks: WidgetHooks);

    /// Stop delivering notifications; must be safe to call more than once
    fn remove_hooks(&mut self);

    /// Replace the grid contents. May emit change events with
    /// [`ChangeSource::LoadData`].
    fn load_data(&mut self, data: &CellMatrix) -> Result<(), WidgetError>;

    /// Current grid contents, evaluated values included
    fn get_data(&self) -> Result<CellMatrix, WidgetError>;

    /// Apply display and formula settings
    fn update_settings(&mut self, _settings: &WidgetSettings) -> Result<(), WidgetError> {
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), WidgetError>;
}

/// What triggered a cell change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    Edit,
    Paste,
    Autofill,
    UndoRedo,
    /// Data pushed in by the node view itself
    LoadData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellChange {
    pub row: usize,
    pub col: usize,
    pub old: CellValue,
    pub new: CellValue,
}

impl CellChange {
    pub fn new(row: usize, col: usize, old: impl Into<CellValue>, new: impl Into<CellValue>) -> Self {
        Self {
            row,
            col,
            old: old.into(),
            new: new.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureChange {
    RowsCreated { at: usize, count: usize },
    RowsRemoved { at: usize, count: usize },
    ColumnsCreated { at: usize, count: usize },
    ColumnsRemoved { at: usize, count: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    CellsChanged {
        changes: Vec<CellChange>,
        source: ChangeSource,
    },
    FormulasRecalculated,
    StructureChanged(StructureChange),
    /// Data pushed by `load_data` has been applied
    Loaded,
}

/// Sender side of a node view's widget event queue
///
/// Cloned freely into widget callbacks. Sending never blocks; events sent
/// after the node view is gone are dropped.
#[derive(Debug, Clone)]
pub struct WidgetHooks {
    sender: mpsc::UnboundedSender<WidgetEvent>,
}

impl WidgetHooks {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<WidgetEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: WidgetEvent) {
        // a closed queue means the view is torn down
        let _ = self.sender.send(event);
    }

    pub fn after_change(&self, changes: Vec<CellChange>, source: ChangeSource) {
        self.emit(WidgetEvent::CellsChanged { changes, source });
    }

    pub fn after_formulas_values_update(&self) {
        self.emit(WidgetEvent::FormulasRecalculated);
    }

    pub fn after_create_row(&self, at: usize, count: usize) {
        self.emit(WidgetEvent::StructureChanged(StructureChange::RowsCreated { at, count }));
    }

    pub fn after_remove_row(&self, at: usize, count: usize) {
        self.emit(WidgetEvent::StructureChanged(StructureChange::RowsRemoved { at, count }));
    }

    pub fn after_create_col(&self, at: usize, count: usize) {
        self.emit(WidgetEvent::StructureChanged(StructureChange::ColumnsCreated { at, count }));
    }

    pub fn after_remove_col(&self, at: usize, count: usize) {
        self.emit(WidgetEvent::StructureChanged(StructureChange::ColumnsRemoved { at, count }));
    }

    pub fn after_load(&self) {
        self.emit(WidgetEvent::Loaded);
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
