//! Number form.

use super::{Cleaned, FieldKind, FieldSpec, FormData, FormSpec, Widget, form_data, opt_id};
use crate::storage::{Number, NumberParams, STATUS_CHOICES, TYPE_CHOICES};

pub const WORK_ORDER: FieldSpec = FieldSpec {
    name: "work_order",
    label: "Work order",
    kind: FieldKind::Reference,
    required: false,
    default: None,
    widget: Widget::Select,
};

pub const LINK: FieldSpec = FieldSpec {
    name: "link",
    label: "Link",
    kind: FieldKind::Reference,
    required: false,
    default: None,
    widget: Widget::Select,
};

pub const NUMBER_TYPE: FieldSpec = FieldSpec {
    name: "number_type",
    label: "Type",
    kind: FieldKind::Choice(TYPE_CHOICES),
    required: false,
    default: Some("1"),
    widget: Widget::Select,
};

pub const NUM: FieldSpec = FieldSpec {
    name: "num",
    label: "Number",
    kind: FieldKind::Text { max_len: 50 },
    required: true,
    default: None,
    widget: Widget::TextInput,
};

pub const STATUS: FieldSpec = FieldSpec {
    name: "status",
    label: "Status",
    kind: FieldKind::Choice(STATUS_CHOICES),
    required: false,
    default: Some("0"),
    widget: Widget::Select,
};

pub const NUMBER_FORM: FormSpec = FormSpec {
    name: "number",
    fields: &[WORK_ORDER, LINK, NUMBER_TYPE, NUM, STATUS],
};

pub fn params(cleaned: &Cleaned) -> NumberParams {
    NumberParams {
        work_order_id: cleaned.reference(WORK_ORDER.name),
        link_id: cleaned.reference(LINK.name),
        number_type: cleaned.int(NUMBER_TYPE.name),
        num: cleaned.text(NUM.name),
        status: cleaned.int(STATUS.name),
    }
}

pub fn initial(number: &Number) -> FormData {
    form_data([
        (WORK_ORDER.name, opt_id(number.work_order_id)),
        (LINK.name, opt_id(number.link_id)),
        (NUMBER_TYPE.name, number.number_type.to_string()),
        (NUM.name, number.num.clone()),
        (STATUS.name, number.status.to_string()),
    ])
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn references_are_optional() {
        let data = form_data([("num", "+15550100".to_string())]);
        let p = params(&NUMBER_FORM.clean(&data).unwrap());
        assert_eq!(p.work_order_id, None);
        assert_eq!(p.link_id, None);
        assert_eq!(p.number_type, 1);
    }

    #[test]
    fn blank_reference_clears_it() {
        let data = form_data([
            ("num", "1".to_string()),
            ("work_order", "4".to_string()),
            ("link", String::new()),
        ]);
        let p = params(&NUMBER_FORM.clean(&data).unwrap());
        assert_eq!(p.work_order_id, Some(4));
        assert_eq!(p.link_id, None);
    }
}
