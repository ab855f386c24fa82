//! Filtered, ordered, paginated listing shared by every table.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use divert_core::db::like_pattern;

use super::db::{Database, DatabaseError};

/// Exact-match conditions a listing can apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Status(i64),
    TextStatus(String),
    Kind(i64),
    Country(String),
    Level(i64),
    Active(bool),
    Staff(bool),
    ProcessedBy(i64),
    CreatedBy(i64),
}

/// Criteria for a listing query.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub owner_id: Option<i64>,
    pub search: Option<String>,
    /// Also match the search text against the owning account's name.
    pub search_owner_name: bool,
    pub conditions: Vec<Condition>,
    pub date_from: Option<i64>,
    pub date_to: Option<i64>,
    /// Range on the table's end date (work order end, account expiry).
    pub end_from: Option<i64>,
    pub end_to: Option<i64>,
}

impl ListFilter {
    pub fn owned_by(owner_id: i64) -> Self {
        Self {
            owner_id: Some(owner_id),
            ..Self::default()
        }
    }

    /// Any non-empty text searches, whitespace included.
    #[must_use]
    pub fn search(mut self, q: Option<&str>) -> Self {
        self.search = q.filter(|q| !q.is_empty()).map(String::from);
        self
    }

    #[must_use]
    pub fn with(mut self, condition: Option<Condition>) -> Self {
        self.conditions.extend(condition);
        self
    }
}

/// How a table maps onto [`ListFilter`].
pub struct TableSpec {
    pub table: &'static str,
    pub search_columns: &'static [&'static str],
    pub has_owner: bool,
    pub kind_column: Option<&'static str>,
    pub date_column: Option<&'static str>,
    pub end_date_column: Option<&'static str>,
    pub order_by: &'static str,
}

impl TableSpec {
    fn column(&self, condition: &Condition) -> Option<&'static str> {
        match condition {
            Condition::Status(_) | Condition::TextStatus(_) => Some("status"),
            Condition::Kind(_) => self.kind_column,
            Condition::Country(_) => Some("country"),
            Condition::Level(_) => Some("level"),
            Condition::Active(_) => Some("is_active"),
            Condition::Staff(_) => Some("is_staff"),
            Condition::ProcessedBy(_) => Some("processed_by"),
            Condition::CreatedBy(_) => Some("created_by"),
        }
    }
}

pub const LINKS: TableSpec = TableSpec {
    table: "links",
    search_columns: &["identifier", "description"],
    has_owner: true,
    kind_column: None,
    date_column: Some("created_at"),
    end_date_column: None,
    order_by: "t.id DESC",
};

pub const WORK_ORDERS: TableSpec = TableSpec {
    table: "work_orders",
    search_columns: &["name", "order_acct"],
    has_owner: true,
    kind_column: Some("order_type"),
    date_column: Some("start_time"),
    end_date_column: Some("end_time"),
    order_by: "t.id DESC",
};

pub const NUMBERS: TableSpec = TableSpec {
    table: "numbers",
    search_columns: &["num"],
    has_owner: true,
    kind_column: Some("number_type"),
    date_column: Some("created_at"),
    end_date_column: None,
    order_by: "t.id DESC",
};

pub const ACCOUNTS: TableSpec = TableSpec {
    table: "accounts",
    search_columns: &["name"],
    has_owner: false,
    kind_column: None,
    date_column: Some("created_at"),
    end_date_column: Some("expires_at"),
    order_by: "t.created_at DESC, t.id DESC",
};

pub const ANNOUNCEMENTS: TableSpec = TableSpec {
    table: "announcements",
    search_columns: &["title", "content"],
    has_owner: false,
    kind_column: None,
    date_column: Some("created_at"),
    end_date_column: None,
    order_by: "t.created_at DESC, t.id DESC",
};

pub const TRAFFIC: TableSpec = TableSpec {
    table: "diverted_traffic",
    search_columns: &["source_ip", "destination", "user_agent"],
    has_owner: false,
    kind_column: None,
    date_column: Some("timestamp"),
    end_date_column: None,
    order_by: "t.timestamp DESC, t.id DESC",
};

pub const RULES: TableSpec = TableSpec {
    table: "divert_rules",
    search_columns: &["name", "source_pattern", "destination"],
    has_owner: false,
    kind_column: None,
    date_column: Some("created_at"),
    end_date_column: None,
    order_by: "t.priority DESC, t.name ASC",
};

fn build<'a>(select: &str, spec: &TableSpec, filter: &ListFilter) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::new(format!("SELECT {select} FROM {} t", spec.table));
    if spec.has_owner {
        qb.push(" LEFT JOIN accounts a ON a.id = t.owner_id");
    }
    qb.push(" WHERE 1 = 1");

    if spec.has_owner {
        if let Some(owner_id) = filter.owner_id {
            qb.push(" AND t.owner_id = ").push_bind(owner_id);
        }
    }

    if let Some(q) = &filter.search {
        let pattern = like_pattern(q);
        qb.push(" AND (");
        let owner_name = (spec.has_owner && filter.search_owner_name).then_some("a.name");
        let columns = spec
            .search_columns
            .iter()
            .map(|c| format!("t.{c}"))
            .chain(owner_name.map(String::from));
        for (i, column) in columns.enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(column)
                .push(" LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\'");
        }
        qb.push(")");
    }

    for condition in &filter.conditions {
        let Some(column) = spec.column(condition) else {
            continue;
        };
        qb.push(format!(" AND t.{column} = "));
        match condition {
            Condition::Status(v)
            | Condition::Kind(v)
            | Condition::Level(v)
            | Condition::ProcessedBy(v)
            | Condition::CreatedBy(v) => {
                qb.push_bind(*v);
            }
            Condition::TextStatus(v) | Condition::Country(v) => {
                qb.push_bind(v.clone());
            }
            Condition::Active(v) | Condition::Staff(v) => {
                qb.push_bind(*v);
            }
        }
    }

    if let Some(column) = spec.date_column {
        if let Some(from) = filter.date_from {
            qb.push(format!(" AND t.{column} >= ")).push_bind(from);
        }
        if let Some(to) = filter.date_to {
            qb.push(format!(" AND t.{column} < ")).push_bind(to);
        }
    }

    if let Some(column) = spec.end_date_column {
        if let Some(from) = filter.end_from {
            qb.push(format!(" AND t.{column} >= ")).push_bind(from);
        }
        if let Some(to) = filter.end_to {
            qb.push(format!(" AND t.{column} < ")).push_bind(to);
        }
    }

    qb
}

impl Database {
    /// Count rows of `spec` matching `filter`.
    pub(crate) async fn count_matching(
        &self,
        spec: &TableSpec,
        filter: &ListFilter,
    ) -> Result<i64, DatabaseError> {
        let mut qb = build("COUNT(*)", spec, filter);
        let row: (i64,) = qb.build_query_as().fetch_one(self.pool()).await?;
        Ok(row.0)
    }

    /// Fetch one window of rows of `spec` matching `filter`, in the table's order.
    pub(crate) async fn fetch_matching<T>(
        &self,
        spec: &TableSpec,
        filter: &ListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let mut qb = build("t.*", spec, filter);
        qb.push(format!(" ORDER BY {}", spec.order_by));
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        let rows = qb.build_query_as::<T>().fetch_all(self.pool()).await?;
        Ok(rows)
    }
}
