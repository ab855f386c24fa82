//! Query-string parsing and page clamping for list views.

use serde::{Deserialize, Serialize};

use crate::forms::parse_datetime;

/// Rows per page in the account-scoped list views.
pub const PAGE_SIZE: i64 = 10;

/// Rows per page in the admin panel.
pub const ADMIN_PAGE_SIZE: i64 = 20;

/// Query parameters accepted by the list views.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
}

impl ListQuery {
    /// The status filter, if present. Non-integers are rejected.
    pub fn status_filter(&self) -> Result<Option<i64>, String> {
        parse_int_param("status", self.status.as_deref())
    }
}

/// Parse an optional integer parameter. Blank counts as absent.
pub fn parse_int_param(name: &str, raw: Option<&str>) -> Result<Option<i64>, String> {
    match non_blank(raw) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| format!("Invalid {name} filter: {v:?}")),
    }
}

/// Query parameters accepted by the admin changelists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub level: Option<String>,
    pub is_active: Option<String>,
    pub is_staff: Option<String>,
    pub processed_by: Option<String>,
    pub created_by: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub end_from: Option<String>,
    pub end_to: Option<String>,
    pub page: Option<String>,
}

impl AdminQuery {
    pub fn status_filter(&self) -> Result<Option<i64>, String> {
        parse_int_param("status", self.status.as_deref())
    }

    pub fn kind_filter(&self) -> Result<Option<i64>, String> {
        parse_int_param("type", self.kind.as_deref())
    }

    pub fn level_filter(&self) -> Result<Option<i64>, String> {
        parse_int_param("level", self.level.as_deref())
    }

    pub fn country_filter(&self) -> Option<String> {
        non_blank(self.country.as_deref()).map(String::from)
    }

    pub fn active_filter(&self) -> Result<Option<bool>, String> {
        parse_bool_param("is_active", self.is_active.as_deref())
    }

    pub fn staff_filter(&self) -> Result<Option<bool>, String> {
        parse_bool_param("is_staff", self.is_staff.as_deref())
    }

    pub fn processed_by_filter(&self) -> Result<Option<i64>, String> {
        parse_int_param("processed_by", self.processed_by.as_deref())
    }

    pub fn created_by_filter(&self) -> Result<Option<i64>, String> {
        parse_int_param("created_by", self.created_by.as_deref())
    }

    /// `[from, to)` in unix seconds on the creation or start date.
    pub fn date_range(&self) -> Result<(Option<i64>, Option<i64>), String> {
        parse_range(("from", self.from.as_deref()), ("to", self.to.as_deref()))
    }

    /// `[end_from, end_to)` on the end or expiry date.
    pub fn end_range(&self) -> Result<(Option<i64>, Option<i64>), String> {
        parse_range(
            ("end_from", self.end_from.as_deref()),
            ("end_to", self.end_to.as_deref()),
        )
    }
}

/// A bare upper date covers that whole day.
fn parse_range(
    (from_name, from): (&str, Option<&str>),
    (to_name, to): (&str, Option<&str>),
) -> Result<(Option<i64>, Option<i64>), String> {
    let from = match non_blank(from) {
        None => None,
        Some(raw) => Some(
            parse_datetime(raw).ok_or_else(|| format!("Invalid {from_name} date: {raw:?}"))?,
        ),
    };
    let to = match non_blank(to) {
        None => None,
        Some(raw) => {
            let ts =
                parse_datetime(raw).ok_or_else(|| format!("Invalid {to_name} date: {raw:?}"))?;
            Some(if raw.len() == 10 { ts + 86_400 } else { ts })
        }
    };
    Ok((from, to))
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool_param(name: &str, raw: Option<&str>) -> Result<Option<bool>, String> {
    match non_blank(raw).map(str::to_ascii_lowercase).as_deref() {
        None => Ok(None),
        Some("1" | "true" | "yes") => Ok(Some(true)),
        Some("0" | "false" | "no") => Ok(Some(false)),
        Some(other) => Err(format!("Invalid {name} filter: {other:?}")),
    }
}

/// Splits `count` rows into pages of `per_page`.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: i64,
    per_page: i64,
}

/// The slice of rows one page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub limit: i64,
    pub offset: i64,
}

impl Paginator {
    pub fn new(count: i64, per_page: i64) -> Self {
        Self {
            count: count.max(0),
            per_page: per_page.max(1),
        }
    }

    /// Always at least one page, even when empty.
    pub fn num_pages(&self) -> i64 {
        if self.count == 0 {
            1
        } else {
            (self.count + self.per_page - 1) / self.per_page
        }
    }

    /// Clamp the requested page: past the end gives the last page, anything
    /// else invalid gives the first.
    pub fn window(&self, requested: Option<&str>) -> PageWindow {
        let last = self.num_pages();
        let number = match requested.map(str::trim).and_then(|p| p.parse::<i64>().ok()) {
            Some(n) if n > last => last,
            Some(n) if n >= 1 => n,
            _ => 1,
        };
        PageWindow {
            number,
            limit: self.per_page,
            offset: (number - 1) * self.per_page,
        }
    }
}

/// One page of a listing as rendered to clients.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub per_page: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow, paginator: &Paginator) -> Self {
        let num_pages = paginator.num_pages();
        Self {
            items,
            number: window.number,
            num_pages,
            count: paginator.count,
            per_page: paginator.per_page,
            has_previous: window.number > 1,
            has_next: window.number < num_pages,
        }
    }
}
