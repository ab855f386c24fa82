//! Link form.

use super::{Cleaned, FieldKind, FieldSpec, FormData, FormSpec, Widget, form_data, opt_id};
use crate::storage::{COUNTRY_CHOICES, Link, LinkParams, STATUS_CHOICES};

pub const WORK_ORDER: FieldSpec = FieldSpec {
    name: "work_order",
    label: "Work order",
    kind: FieldKind::Reference,
    required: false,
    default: None,
    widget: Widget::Select,
};

pub const COUNTRY: FieldSpec = FieldSpec {
    name: "country",
    label: "Country",
    kind: FieldKind::CodeChoice(COUNTRY_CHOICES),
    required: true,
    default: None,
    widget: Widget::Select,
};

pub const IDENTIFIER: FieldSpec = FieldSpec {
    name: "identifier",
    label: "Identifier",
    kind: FieldKind::Text { max_len: 255 },
    required: true,
    default: None,
    widget: Widget::TextInput,
};

pub const DESCRIPTION: FieldSpec = FieldSpec {
    name: "description",
    label: "Description",
    kind: FieldKind::TextArea,
    required: false,
    default: None,
    widget: Widget::Textarea { rows: 3 },
};

pub const STATUS: FieldSpec = FieldSpec {
    name: "status",
    label: "Status",
    kind: FieldKind::Choice(STATUS_CHOICES),
    required: false,
    default: Some("0"),
    widget: Widget::Select,
};

pub const LINK_FORM: FormSpec = FormSpec {
    name: "link",
    fields: &[WORK_ORDER, COUNTRY, IDENTIFIER, DESCRIPTION, STATUS],
};

pub fn params(cleaned: &Cleaned) -> LinkParams {
    LinkParams {
        work_order_id: cleaned.reference(WORK_ORDER.name),
        country: cleaned.text(COUNTRY.name),
        identifier: cleaned.text(IDENTIFIER.name),
        description: cleaned.text(DESCRIPTION.name),
        status: cleaned.int(STATUS.name),
    }
}

pub fn initial(link: &Link) -> FormData {
    form_data([
        (WORK_ORDER.name, opt_id(link.work_order_id)),
        (COUNTRY.name, link.country.clone()),
        (IDENTIFIER.name, link.identifier.clone()),
        (DESCRIPTION.name, link.description.clone()),
        (STATUS.name, link.status.to_string()),
    ])
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn identifier_and_country_suffice() {
        let data = form_data([
            ("identifier", "x1".to_string()),
            ("country", "CN".to_string()),
        ]);
        let p = params(&LINK_FORM.clean(&data).unwrap());
        assert_eq!(p.identifier, "x1");
        assert_eq!(p.country, "CN");
        assert_eq!(p.status, 0);
        assert_eq!(p.work_order_id, None);
        assert_eq!(p.description, "");
    }

    #[test]
    fn unknown_country_is_rejected() {
        let data = form_data([
            ("identifier", "x1".to_string()),
            ("country", "ZZ".to_string()),
        ]);
        let errors = LINK_FORM.clean(&data).unwrap_err();
        assert!(errors.has("country"));
    }

    #[test]
    fn submitted_owner_is_not_a_field() {
        assert!(LINK_FORM.field("owner").is_none());
        assert!(LINK_FORM.field("owner_id").is_none());
    }
}
