//! Admin-panel forms: owner-aware record forms, inline status edits and
//! announcements.

use super::{
    Cleaned, FieldKind, FieldSpec, FormData, FormSpec, Widget, form_data, link, number,
    work_order,
};
use crate::storage::{Announcement, AnnouncementParams, STATUS_CHOICES};

/// Owner selector. Only superusers may choose; everyone else is stamped.
pub const OWNER: FieldSpec = FieldSpec {
    name: "owner",
    label: "Owner",
    kind: FieldKind::Reference,
    required: false,
    default: None,
    widget: Widget::RawId,
};

pub const ADMIN_LINK_FORM: FormSpec = FormSpec {
    name: "admin_link",
    fields: &[
        OWNER,
        link::WORK_ORDER,
        link::COUNTRY,
        link::IDENTIFIER,
        link::DESCRIPTION,
        link::STATUS,
    ],
};

pub const ADMIN_WORK_ORDER_FORM: FormSpec = FormSpec {
    name: "admin_work_order",
    fields: &[
        OWNER,
        work_order::ORDER_TYPE,
        work_order::NAME,
        work_order::ORDER_URL,
        work_order::START_TIME,
        work_order::END_TIME,
        work_order::NUM_TYPE,
        work_order::ALL_COUNT,
        work_order::RATIO,
        work_order::ORDER_ACCT,
        work_order::ORDER_PSW,
        work_order::NUM_SIZE,
        work_order::STATUS,
    ],
};

pub const ADMIN_NUMBER_FORM: FormSpec = FormSpec {
    name: "admin_number",
    fields: &[
        OWNER,
        number::WORK_ORDER,
        number::LINK,
        number::NUMBER_TYPE,
        number::NUM,
        number::STATUS,
    ],
};

/// A record's initial values plus its owner, for the admin change forms.
pub fn with_owner(mut values: FormData, owner_id: i64) -> FormData {
    values.insert(OWNER.name.to_string(), owner_id.to_string());
    values
}

/// Inline status edit from a changelist row.
pub const STATUS_FORM: FormSpec = FormSpec {
    name: "status",
    fields: &[FieldSpec {
        name: "status",
        label: "Status",
        kind: FieldKind::Choice(STATUS_CHOICES),
        required: true,
        default: None,
        widget: Widget::Select,
    }],
};

pub const TITLE: FieldSpec = FieldSpec {
    name: "title",
    label: "Title",
    kind: FieldKind::Text { max_len: 200 },
    required: true,
    default: None,
    widget: Widget::TextInput,
};
pub const CONTENT: FieldSpec = FieldSpec {
    name: "content",
    label: "Content",
    kind: FieldKind::TextArea,
    required: true,
    default: None,
    widget: Widget::Textarea { rows: 10 },
};
pub const IS_ACTIVE: FieldSpec = FieldSpec {
    name: "is_active",
    label: "Active",
    kind: FieldKind::Boolean,
    required: false,
    default: Some("true"),
    widget: Widget::Checkbox,
};

pub const ANNOUNCEMENT_FORM: FormSpec = FormSpec {
    name: "announcement",
    fields: &[TITLE, CONTENT, IS_ACTIVE],
};

pub fn announcement_params(cleaned: &Cleaned) -> AnnouncementParams {
    AnnouncementParams {
        title: cleaned.text(TITLE.name),
        content: cleaned.text(CONTENT.name),
        is_active: cleaned.boolean(IS_ACTIVE.name),
    }
}

pub fn announcement_initial(a: &Announcement) -> FormData {
    form_data([
        (TITLE.name, a.title.clone()),
        (CONTENT.name, a.content.clone()),
        (IS_ACTIVE.name, a.is_active.to_string()),
    ])
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn admin_forms_extend_user_forms_with_owner() {
        for (admin, user) in [
            (ADMIN_LINK_FORM, link::LINK_FORM),
            (ADMIN_WORK_ORDER_FORM, work_order::WORK_ORDER_FORM),
            (ADMIN_NUMBER_FORM, number::NUMBER_FORM),
        ] {
            assert_eq!(admin.fields[0].name, "owner");
            let names: Vec<_> = admin.fields[1..].iter().map(|f| f.name).collect();
            let expected: Vec<_> = user.fields.iter().map(|f| f.name).collect();
            assert_eq!(names, expected);
        }
    }

    #[test]
    fn change_form_carries_owner() {
        let values = with_owner(form_data([("num", "555".to_string())]), 42);
        let cleaned = ADMIN_NUMBER_FORM.clean(&values).unwrap();
        assert_eq!(cleaned.reference("owner"), Some(42));
    }

    #[test]
    fn status_edit_requires_known_value() {
        assert!(STATUS_FORM.clean(&FormData::new()).is_err());
        assert!(STATUS_FORM.clean(&form_data([("status", "2".to_string())])).is_err());
        let cleaned = STATUS_FORM.clean(&form_data([("status", "1".to_string())])).unwrap();
        assert_eq!(cleaned.int("status"), 1);
    }

    #[test]
    fn announcement_can_be_deactivated() {
        let data = form_data([
            ("title", "Maintenance".to_string()),
            ("content", "Tonight".to_string()),
            ("is_active", "false".to_string()),
        ]);
        let p = announcement_params(&ANNOUNCEMENT_FORM.clean(&data).unwrap());
        assert!(!p.is_active);
    }
}
