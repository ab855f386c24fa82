//! Diversion traffic and rule forms.

use super::{Cleaned, FieldKind, FieldSpec, FormData, FormSpec, Widget, form_data, opt_id};
use crate::storage::{DivertRule, DivertedTraffic, RuleParams, TrafficParams};

const fn text(name: &'static str, label: &'static str, max_len: usize) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind: FieldKind::Text { max_len },
        required: true,
        default: None,
        widget: Widget::TextInput,
    }
}

pub const SOURCE_IP: FieldSpec = FieldSpec {
    name: "source_ip",
    label: "Source IP",
    kind: FieldKind::IpAddress,
    required: true,
    default: None,
    widget: Widget::TextInput,
};
pub const DESTINATION: FieldSpec = text("destination", "Destination", 255);
pub const USER_AGENT: FieldSpec = FieldSpec {
    name: "user_agent",
    label: "User agent",
    kind: FieldKind::TextArea,
    required: false,
    default: None,
    widget: Widget::Textarea { rows: 3 },
};
pub const PROCESSED_BY: FieldSpec = FieldSpec {
    name: "processed_by",
    label: "Processed by",
    kind: FieldKind::Reference,
    required: false,
    default: None,
    widget: Widget::RawId,
};
pub const TRAFFIC_STATUS: FieldSpec = text("status", "Status", 50);

pub const TRAFFIC_FORM: FormSpec = FormSpec {
    name: "diverted_traffic",
    fields: &[SOURCE_IP, DESTINATION, USER_AGENT, PROCESSED_BY, TRAFFIC_STATUS],
};

pub const RULE_NAME: FieldSpec = text("name", "Name", 100);
pub const SOURCE_PATTERN: FieldSpec = text("source_pattern", "Source pattern", 255);
pub const PRIORITY: FieldSpec = FieldSpec {
    name: "priority",
    label: "Priority",
    kind: FieldKind::Integer,
    required: false,
    default: Some("0"),
    widget: Widget::NumberInput,
};
pub const IS_ACTIVE: FieldSpec = FieldSpec {
    name: "is_active",
    label: "Active",
    kind: FieldKind::Boolean,
    required: false,
    default: Some("true"),
    widget: Widget::Checkbox,
};

pub const RULE_FORM: FormSpec = FormSpec {
    name: "divert_rule",
    fields: &[RULE_NAME, SOURCE_PATTERN, DESTINATION, PRIORITY, IS_ACTIVE],
};

pub fn traffic_params(cleaned: &Cleaned) -> TrafficParams {
    TrafficParams {
        source_ip: cleaned.text(SOURCE_IP.name),
        destination: cleaned.text(DESTINATION.name),
        user_agent: cleaned.opt_text(USER_AGENT.name),
        processed_by: cleaned.reference(PROCESSED_BY.name),
        status: cleaned.text(TRAFFIC_STATUS.name),
    }
}

pub fn traffic_initial(record: &DivertedTraffic) -> FormData {
    form_data([
        (SOURCE_IP.name, record.source_ip.clone()),
        (DESTINATION.name, record.destination.clone()),
        (USER_AGENT.name, record.user_agent.clone().unwrap_or_default()),
        (PROCESSED_BY.name, opt_id(record.processed_by)),
        (TRAFFIC_STATUS.name, record.status.clone()),
    ])
}

pub fn rule_params(cleaned: &Cleaned) -> RuleParams {
    RuleParams {
        name: cleaned.text(RULE_NAME.name),
        source_pattern: cleaned.text(SOURCE_PATTERN.name),
        destination: cleaned.text(DESTINATION.name),
        priority: cleaned.int(PRIORITY.name),
        is_active: cleaned.boolean(IS_ACTIVE.name),
    }
}

pub fn rule_initial(rule: &DivertRule) -> FormData {
    form_data([
        (RULE_NAME.name, rule.name.clone()),
        (SOURCE_PATTERN.name, rule.source_pattern.clone()),
        (DESTINATION.name, rule.destination.clone()),
        (PRIORITY.name, rule.priority.to_string()),
        (IS_ACTIVE.name, rule.is_active.to_string()),
    ])
}
