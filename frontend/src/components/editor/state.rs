//! Runtime state of the template editor.

use common::field_store::FieldStore;
use common::model::field::{Field, FieldType};
use common::model::template::Template;
use common::position_map::Rect;
use common::preview::PreviewDocument;
use common::selection::{Candidate, SelectionController};
use web_sys::Element;
use yew::prelude::*;

use super::dom::DomDocument;

pub struct EditorComponent {
    /// `None` until the server answered.
    pub template: Option<Template>,
    pub preview: PreviewDocument,
    /// Concatenated text of `preview`; every field offset points into it.
    pub flattened: String,
    pub controller: SelectionController,
    /// Box being drawn, document-local coordinates.
    pub live_rect: Option<Rect>,
    /// Candidate waiting for a name and type in the field sheet.
    pub pending: Option<Candidate>,
    pub pending_name: String,
    pub pending_type: FieldType,
    pub saving: bool,
    pub error: Option<String>,
    pub document_ref: NodeRef,
    pub sheet_ref: NodeRef,
}

impl EditorComponent {
    pub fn new() -> Self {
        Self {
            template: None,
            preview: PreviewDocument::default(),
            flattened: String::new(),
            controller: SelectionController::new(),
            live_rect: None,
            pending: None,
            pending_name: String::new(),
            pending_type: FieldType::default(),
            saving: false,
            error: None,
            document_ref: NodeRef::default(),
            sheet_ref: NodeRef::default(),
        }
    }

    pub fn fields(&self) -> &[Field] {
        self.template.as_ref().map(|t| t.schema.fields()).unwrap_or(&[])
    }

    pub fn template_id(&self) -> Option<String> {
        self.template.as_ref().map(|t| t.id.clone())
    }

    pub fn dom(&self) -> Option<DomDocument> {
        self.document_ref.cast::<Element>().map(DomDocument::new)
    }

    /// Applies a server-confirmed change to the local schema. The result
    /// must still be a valid store; otherwise the local copy is left as is.
    pub fn edit_fields(&mut self, edit: impl FnOnce(&mut Vec<Field>)) -> bool {
        let Some(template) = self.template.as_mut() else {
            return false;
        };
        let mut fields = template.schema.fields().to_vec();
        edit(&mut fields);
        match FieldStore::from_fields(fields) {
            Ok(store) => {
                template.schema = store;
                true
            }
            Err(e) => {
                self.error = Some(format!("Local field list is out of sync: {}", e));
                false
            }
        }
    }
}
