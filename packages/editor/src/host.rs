use crate::EditorError;
use tabula_document::AttributePatch;

/// Attribute-patch channel scoped to exactly one spreadsheet node
///
/// Patches merge into the node's attributes; fields a patch leaves unset are
/// untouched. Repeating a patch is harmless and the last call wins.
pub trait AttributeHost: Send + 'static {
    fn update_attributes(&mut self, patch: AttributePatch) -> Result<(), EditorError>;
}

impl<F> AttributeHost for F
where
    F: FnMut(AttributePatch) -> Result<(), EditorError> + Send + 'static,
{
    fn update_attributes(&mut self, patch: AttributePatch) -> Result<(), EditorError> {
        self(patch)
    }
}
