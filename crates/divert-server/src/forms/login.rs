//! Login form.

use super::{FieldKind, FieldSpec, FormSpec, Widget};

pub const USERNAME: FieldSpec = FieldSpec {
    name: "username",
    label: "Name",
    kind: FieldKind::Text { max_len: 150 },
    required: true,
    default: None,
    widget: Widget::TextInput,
};

pub const PASSWORD: FieldSpec = FieldSpec {
    name: "password",
    label: "Password",
    kind: FieldKind::Password,
    required: true,
    default: None,
    widget: Widget::PasswordInput,
};

pub const LOGIN_FORM: FormSpec = FormSpec {
    name: "login",
    fields: &[USERNAME, PASSWORD],
};

pub const INVALID_LOGIN: &str =
    "Please enter a correct name and password. Note that both fields may be case-sensitive.";
