//! Admin account forms.

use super::{
    Cleaned, FieldKind, FieldSpec, FormData, FormErrors, FormSpec, Widget, form_data,
    format_datetime,
};
use crate::accounts::NewAccount;
use crate::auth::password::validate_password;
use crate::storage::{Account, AccountUpdate};

const fn password(name: &'static str, label: &'static str, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind: FieldKind::Password,
        required,
        default: None,
        widget: Widget::PasswordInput,
    }
}

const fn flag(name: &'static str, label: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind: FieldKind::Boolean,
        required: false,
        default: Some(default),
        widget: Widget::Checkbox,
    }
}

pub const NAME: FieldSpec = FieldSpec {
    name: "name",
    label: "Name",
    kind: FieldKind::Text { max_len: 150 },
    required: true,
    default: None,
    widget: Widget::TextInput,
};
pub const PASSWORD1: FieldSpec = password("password1", "Password", true);
pub const PASSWORD2: FieldSpec = password("password2", "Password confirmation", true);
pub const NEW_PASSWORD: FieldSpec = password("password", "New password", false);

pub const LEVEL: FieldSpec = FieldSpec {
    name: "level",
    label: "Membership level",
    kind: FieldKind::Integer,
    required: false,
    default: Some("1"),
    widget: Widget::NumberInput,
};
pub const LINK_QUOTA: FieldSpec = FieldSpec {
    name: "link_quota",
    label: "Link quota",
    kind: FieldKind::Integer,
    required: false,
    default: Some("10"),
    widget: Widget::NumberInput,
};
pub const EXPIRES_AT: FieldSpec = FieldSpec {
    name: "expires_at",
    label: "Membership expires",
    kind: FieldKind::DateTime,
    required: false,
    default: None,
    widget: Widget::DateTimeLocal,
};
pub const IS_ACTIVE: FieldSpec = flag("is_active", "Active", "true");
pub const IS_STAFF: FieldSpec = flag("is_staff", "Staff", "false");
pub const IS_SUPERUSER: FieldSpec = flag("is_superuser", "Superuser", "false");

pub const ACCOUNT_ADD_FORM: FormSpec = FormSpec {
    name: "account_add",
    fields: &[NAME, PASSWORD1, PASSWORD2, LEVEL, LINK_QUOTA, EXPIRES_AT],
};

pub const ACCOUNT_EDIT_FORM: FormSpec = FormSpec {
    name: "account_edit",
    fields: &[
        LEVEL,
        LINK_QUOTA,
        EXPIRES_AT,
        IS_ACTIVE,
        IS_STAFF,
        IS_SUPERUSER,
        NEW_PASSWORD,
    ],
};

/// Confirmation must match and the password must be strong enough.
pub fn check_new_password(cleaned: &Cleaned, errors: &mut FormErrors) {
    let first = cleaned.text(PASSWORD1.name);
    if first != cleaned.text(PASSWORD2.name) {
        errors.add(PASSWORD2.name, "The two password fields didn't match.");
        return;
    }
    if let Err(msg) = validate_password(&first) {
        errors.add(PASSWORD2.name, msg);
    }
}

pub fn new_account(cleaned: &Cleaned) -> NewAccount {
    NewAccount {
        name: cleaned.text(NAME.name),
        password: cleaned.opt_text(PASSWORD1.name),
        level: cleaned.opt_int(LEVEL.name),
        link_quota: cleaned.opt_int(LINK_QUOTA.name),
        expires_at: cleaned.opt_int(EXPIRES_AT.name),
        ..NewAccount::default()
    }
}

pub fn update(cleaned: &Cleaned, current: &Account) -> AccountUpdate {
    AccountUpdate {
        level: cleaned.int(LEVEL.name),
        link_quota: cleaned.int(LINK_QUOTA.name),
        expires_at: cleaned.opt_int(EXPIRES_AT.name).unwrap_or(current.expires_at),
        is_active: cleaned.boolean(IS_ACTIVE.name),
        is_staff: cleaned.boolean(IS_STAFF.name),
        is_superuser: cleaned.boolean(IS_SUPERUSER.name),
    }
}

pub fn initial(account: &Account) -> FormData {
    form_data([
        (LEVEL.name, account.level.to_string()),
        (LINK_QUOTA.name, account.link_quota.to_string()),
        (EXPIRES_AT.name, format_datetime(account.expires_at)),
        (IS_ACTIVE.name, account.is_active.to_string()),
        (IS_STAFF.name, account.is_staff.to_string()),
        (IS_SUPERUSER.name, account.is_superuser.to_string()),
    ])
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn add_data(pw1: &str, pw2: &str) -> FormData {
        form_data([
            ("name", "dora".to_string()),
            ("password1", pw1.to_string()),
            ("password2", pw2.to_string()),
            ("link_quota", "3".to_string()),
        ])
    }

    #[test]
    fn add_form_maps_to_new_account() {
        let cleaned = ACCOUNT_ADD_FORM
            .clean(&add_data("long password", "long password"))
            .unwrap();
        let mut errors = FormErrors::default();
        check_new_password(&cleaned, &mut errors);
        assert!(errors.is_empty());

        let new = new_account(&cleaned);
        assert_eq!(new.name, "dora");
        assert_eq!(new.link_quota, Some(3));
        assert_eq!(new.level, Some(1));
        assert_eq!(new.expires_at, None);
        assert_eq!(new.password.as_deref(), Some("long password"));
    }

    #[test]
    fn mismatched_or_weak_passwords() {
        let cleaned = ACCOUNT_ADD_FORM
            .clean(&add_data("long password", "other password"))
            .unwrap();
        let mut errors = FormErrors::default();
        check_new_password(&cleaned, &mut errors);
        assert!(errors.fields["password2"][0].contains("didn't match"));

        let cleaned = ACCOUNT_ADD_FORM.clean(&add_data("12345678", "12345678")).unwrap();
        let mut errors = FormErrors::default();
        check_new_password(&cleaned, &mut errors);
        assert!(errors.fields["password2"][0].contains("numeric"));
    }

    #[test]
    fn edit_keeps_expiry_when_blank() {
        let current = Account {
            id: 1,
            name: "dora".into(),
            password_hash: String::new(),
            level: 1,
            link_quota: 10,
            created_at: 0,
            expires_at: 500,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            last_login: None,
        };
        let data = form_data([("link_quota", "2".to_string()), ("is_staff", "on".to_string())]);
        let up = update(&ACCOUNT_EDIT_FORM.clean(&data).unwrap(), &current);
        assert_eq!(up.expires_at, 500);
        assert_eq!(up.link_quota, 2);
        assert!(up.is_staff);
        assert!(up.is_active);
        assert!(!up.is_superuser);
    }
}
