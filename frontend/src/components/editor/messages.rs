use common::model::field::{Field, FieldType};
use common::model::template::Template;
use web_sys::MouseEvent;

pub enum Msg {
    Loaded(Template),
    LoadFailed(String),
    PointerDown(MouseEvent),
    PointerMove(MouseEvent),
    PointerUp(MouseEvent),
    PointerLeave,
    MarkClicked(String),
    /// A sidebar card was picked: activate the field and scroll to it.
    RevealField(String),
    DismissError,
    SetPendingName(String),
    SetPendingType(FieldType),
    ConfirmField,
    CancelField,
    FieldAdded(Field),
    FieldChanged(Field),
    FieldRemoved(String),
    RenameField { field_id: String, name: String },
    ChangeFieldType { field_id: String, field_type: FieldType },
    DeleteField(String),
    RequestFailed(String),
}
