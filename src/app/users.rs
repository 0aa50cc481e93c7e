//! Read side of the `"user"` table: the filter, search and ordering options
//! accepted by the listing endpoint and the SQL they turn into.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::utils::types::Timestamptz;

const SELECT_USERS: &str = r#"
    select u.user_id, u.username, u.email, u.first_name, u.last_name,
           u.date_joined, u.is_staff
    from "user" u
    where true"#;

/// Columns a search term is matched against.
const SEARCH_COLUMNS: [&str; 4] = ["u.username", "u.email", "u.first_name", "u.last_name"];

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct UserData {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[schema(value_type = String, format = DateTime)]
    pub date_joined: Timestamptz,
    pub is_staff: bool,
}

/// Query string of `GET /users/`.
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    /// Exact username
    pub username: Option<String>,

    /// Exact email
    pub email: Option<String>,

    /// Case-insensitive substring search over username, email, first and
    /// last name. Terms separated by whitespace or commas must all match.
    pub search: Option<String>,

    /// Short form of `search`, used when `search` is missing or empty
    pub q: Option<String>,

    /// Comma separated `username` / `date_joined`, `-` prefix for descending.
    /// Defaults to `-date_joined`.
    pub ordering: Option<String>,

    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<i64>,

    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Username,
    DateJoined,
}

impl OrderField {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "username" => Some(Self::Username),
            "date_joined" => Some(Self::DateJoined),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Username => "u.username",
            Self::DateJoined => "u.date_joined",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: OrderField,
    pub descending: bool,
}

impl OrderTerm {
    const DEFAULT: OrderTerm = OrderTerm {
        field: OrderField::DateJoined,
        descending: true,
    };

    fn direction(&self) -> &'static str {
        if self.descending {
            "desc"
        } else {
            "asc"
        }
    }
}

/// Parses `ordering`, dropping unknown and repeated fields. Falls back to
/// newest first when nothing usable is left.
pub fn parse_ordering(raw: Option<&str>) -> Vec<OrderTerm> {
    let mut terms: Vec<OrderTerm> = Vec::new();

    for part in raw.unwrap_or_default().split(',').map(str::trim) {
        let (descending, name) = match part.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, part),
        };

        let Some(field) = OrderField::from_name(name) else {
            continue;
        };

        if terms.iter().all(|t| t.field != field) {
            terms.push(OrderTerm { field, descending });
        }
    }

    if terms.is_empty() {
        terms.push(OrderTerm::DEFAULT);
    }

    terms
}

pub fn search_terms(raw: &str) -> Vec<&str> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect()
}

/// Escapes `LIKE` wildcards so the term matches literally.
/// Backslash is the default escape character in Postgres.
pub fn escape_like_literal(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '%' => out.push_str("\\%"),
            '_' => out.push_str("\\_"),
            other => out.push(other),
        }
    }
    out
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl UserFilter {
    pub fn build_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_USERS);

        if let Some(username) = non_empty(&self.username) {
            qb.push(" and u.username = ");
            qb.push_bind(username.to_owned());
        }

        if let Some(email) = non_empty(&self.email) {
            qb.push(" and u.email = ");
            qb.push_bind(email.to_owned());
        }

        if let Some(search) = non_empty(&self.search).or(non_empty(&self.q)) {
            for term in search_terms(search) {
                let pattern = format!("%{}%", escape_like_literal(term));

                qb.push(" and (");
                for (i, column) in SEARCH_COLUMNS.iter().enumerate() {
                    if i > 0 {
                        qb.push(" or ");
                    }
                    qb.push(*column);
                    qb.push(" ilike ");
                    qb.push_bind(pattern.clone());
                }
                qb.push(")");
            }
        }

        let ordering = parse_ordering(self.ordering.as_deref());
        qb.push(" order by ");
        for term in &ordering {
            qb.push(term.field.column());
            qb.push(" ");
            qb.push(term.direction());
            qb.push(", ");
        }
        // Stable order for rows that tie on every requested field
        qb.push("u.user_id ");
        qb.push(ordering[0].direction());

        if let Some(limit) = self.limit {
            qb.push(" limit ");
            qb.push_bind(limit);
        }

        if let Some(offset) = self.offset {
            qb.push(" offset ");
            qb.push_bind(offset);
        }

        qb
    }
}

#[tracing::instrument(name = "Fetch users", skip_all, fields(filter = ?filter))]
pub async fn fetch_users(
    filter: &UserFilter,
    pool: &PgPool,
) -> Result<Vec<UserData>, sqlx::Error> {
    let mut qb = filter.build_query();
    let users = qb.build_query_as::<UserData>().fetch_all(pool).await?;

    Ok(users)
}

/// Fails with `RowNotFound` when there is no such user.
#[tracing::instrument(name = "Fetch user", skip(pool))]
pub async fn fetch_user(user_id: Uuid, pool: &PgPool) -> Result<UserData, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(SELECT_USERS);
    qb.push(" and u.user_id = ");
    qb.push_bind(user_id);

    let user = qb.build_query_as::<UserData>().fetch_one(pool).await?;

    Ok(user)
}
