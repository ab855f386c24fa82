//! Work order form.

use super::{
    Cleaned, FieldKind, FieldSpec, FormData, FormSpec, Widget, form_data, format_datetime,
};
use crate::storage::{STATUS_CHOICES, TYPE_CHOICES, WorkOrder, WorkOrderParams};

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

const fn number(name: &'static str, label: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind: FieldKind::Integer,
        required: false,
        default: Some(default),
        widget: Widget::NumberInput,
    }
}

const fn datetime(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind: FieldKind::DateTime,
        required: true,
        default: None,
        widget: Widget::DateTimeLocal,
    }
}

pub const ORDER_TYPE: FieldSpec = FieldSpec {
    name: "order_type",
    label: "Type",
    kind: FieldKind::Choice(TYPE_CHOICES),
    required: false,
    default: Some("1"),
    widget: Widget::Select,
};
pub const NAME: FieldSpec = text("name", "Name", 255);
pub const ORDER_URL: FieldSpec = FieldSpec {
    name: "order_url",
    label: "Order URL",
    kind: FieldKind::Url { max_len: 200 },
    required: true,
    default: None,
    widget: Widget::UrlInput,
};
pub const START_TIME: FieldSpec = datetime("start_time", "Start time");
pub const END_TIME: FieldSpec = datetime("end_time", "End time");
pub const NUM_TYPE: FieldSpec = number("num_type", "Number type", "1");
pub const ALL_COUNT: FieldSpec = number("all_count", "Target count", "0");
pub const RATIO: FieldSpec = number("ratio", "Ratio (%)", "100");
pub const ORDER_ACCT: FieldSpec = text("order_acct", "Order account", 100);
pub const ORDER_PSW: FieldSpec = text("order_psw", "Order password", 100);
pub const NUM_SIZE: FieldSpec = number("num_size", "Number size", "0");
pub const STATUS: FieldSpec = FieldSpec {
    name: "status",
    label: "Status",
    kind: FieldKind::Choice(STATUS_CHOICES),
    required: false,
    default: Some("0"),
    widget: Widget::Select,
};

pub const WORK_ORDER_FORM: FormSpec = FormSpec {
    name: "work_order",
    fields: &[
        ORDER_TYPE, NAME, ORDER_URL, START_TIME, END_TIME, NUM_TYPE, ALL_COUNT, RATIO, ORDER_ACCT,
        ORDER_PSW, NUM_SIZE, STATUS,
    ],
};

pub fn params(cleaned: &Cleaned) -> WorkOrderParams {
    WorkOrderParams {
        order_type: cleaned.int(ORDER_TYPE.name),
        name: cleaned.text(NAME.name),
        order_url: cleaned.text(ORDER_URL.name),
        start_time: cleaned.int(START_TIME.name),
        end_time: cleaned.int(END_TIME.name),
        num_type: cleaned.int(NUM_TYPE.name),
        all_count: cleaned.int(ALL_COUNT.name),
        ratio: cleaned.int(RATIO.name),
        order_acct: cleaned.text(ORDER_ACCT.name),
        order_psw: cleaned.text(ORDER_PSW.name),
        num_size: cleaned.int(NUM_SIZE.name),
        status: cleaned.int(STATUS.name),
    }
}

pub fn initial(order: &WorkOrder) -> FormData {
    form_data([
        (ORDER_TYPE.name, order.order_type.to_string()),
        (NAME.name, order.name.clone()),
        (ORDER_URL.name, order.order_url.clone()),
        (START_TIME.name, format_datetime(order.start_time)),
        (END_TIME.name, format_datetime(order.end_time)),
        (NUM_TYPE.name, order.num_type.to_string()),
        (ALL_COUNT.name, order.all_count.to_string()),
        (RATIO.name, order.ratio.to_string()),
        (ORDER_ACCT.name, order.order_acct.clone()),
        (ORDER_PSW.name, order.order_psw.clone()),
        (NUM_SIZE.name, order.num_size.to_string()),
        (STATUS.name, order.status.to_string()),
    ])
}
