//! Query-string driven sorting, paging and resource predicates.
//!
//! Every list endpoint parses the same generic options (`sort_by`,
//! `sort_order`, `limit`, `next_token`, each also accepted in camelCase) and
//! layers its own predicates on top. A resource filter hands the collection
//! query executor two things: the generic options and an optional predicate
//! expression evaluated by the record store.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::Result;
use crate::pagination::{decode_cursor, parse_limit, Cursor, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

const SORT_BY_QUERY_NAMES: [&str; 2] = ["sort_by", "sortBy"];
const SORT_ORDER_QUERY_NAMES: [&str; 2] = ["sort_order", "sortOrder"];
const LIMIT_QUERY_NAME: &str = "limit";
const NEXT_TOKEN_QUERY_NAMES: [&str; 2] = ["next_token", "nextToken"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than `desc` (case-insensitive) sorts ascending.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// Generic sorting and paging options shared by all resources.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterOptions {
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub limit: usize,
    pub cursor: Option<Cursor>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            sort_by: None,
            sort_order: SortOrder::Asc,
            limit: DEFAULT_PAGE_SIZE,
            cursor: None,
        }
    }
}

fn first_present<'a>(keys: &[&str], query: &'a HashMap<String, String>) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| query.get(*key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

impl FilterOptions {
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self> {
        Self::from_query_with_limits(query, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    pub fn from_query_with_limits(
        query: &HashMap<String, String>,
        default_limit: usize,
        max_limit: usize,
    ) -> Result<Self> {
        let sort_by = first_present(&SORT_BY_QUERY_NAMES, query).map(str::to_string);
        let sort_order = first_present(&SORT_ORDER_QUERY_NAMES, query)
            .map(SortOrder::parse)
            .unwrap_or_default();

        let limit = match query.get(LIMIT_QUERY_NAME) {
            Some(raw) => parse_limit(raw, default_limit, max_limit)?,
            None => default_limit,
        };

        let cursor = match first_present(&NEXT_TOKEN_QUERY_NAMES, query) {
            Some(token) => decode_cursor(token)?,
            None => None,
        };

        Ok(Self {
            sort_by,
            sort_order,
            limit,
            cursor,
        })
    }

    /// Canonical sort field (lower-cased, underscores dropped) and order, or
    /// `None` when unsorted.
    pub fn normalized_sort(&self) -> Option<(String, SortOrder)> {
        let field = self.sort_by.as_deref()?.trim().to_lowercase().replace('_', "");
        if field.is_empty() {
            return None;
        }
        Some((field, self.sort_order))
    }
}

/// A single predicate on a top-level string attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    Equals { attribute: String, value: String },
    Contains { attribute: String, value: String },
}

impl Condition {
    pub fn equals(attribute: &str, value: impl Into<String>) -> Self {
        Condition::Equals {
            attribute: attribute.to_string(),
            value: value.into(),
        }
    }

    pub fn contains(attribute: &str, value: impl Into<String>) -> Self {
        Condition::Contains {
            attribute: attribute.to_string(),
            value: value.into(),
        }
    }

    pub fn attribute(&self) -> &str {
        match self {
            Condition::Equals { attribute, .. } | Condition::Contains { attribute, .. } => {
                attribute
            }
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Condition::Equals { value, .. } | Condition::Contains { value, .. } => value,
        }
    }

    /// Evaluates the predicate against a JSON-shaped record.
    pub fn matches(&self, item: &serde_json::Value) -> bool {
        let actual = item.get(self.attribute()).and_then(|v| v.as_str());
        match (self, actual) {
            (Condition::Equals { value, .. }, Some(actual)) => actual == value,
            (Condition::Contains { value, .. }, Some(actual)) => actual.contains(value.as_str()),
            (_, None) => false,
        }
    }
}

/// Conjunction of conditions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Expression {
    pub conditions: Vec<Condition>,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, item: &serde_json::Value) -> bool {
        self.conditions.iter().all(|c| c.matches(item))
    }

    /// `None` when there is nothing to filter on.
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// Capability every listable resource filter provides to the executor.
pub trait ResourceFilter {
    fn options(&self) -> &FilterOptions;

    /// Resource-specific predicate, `None` when no predicate was requested.
    fn build_expression(&self) -> Option<Expression>;

    fn normalized_sort(&self) -> Option<(String, SortOrder)> {
        self.options().normalized_sort()
    }
}

fn non_empty(query: &HashMap<String, String>, key: &str) -> Option<String> {
    query
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Filters for the team collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TeamFilter {
    pub options: FilterOptions,
    pub name_contains: Option<String>,
    pub status: Option<String>,
}

impl TeamFilter {
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self> {
        Ok(Self {
            options: FilterOptions::from_query(query)?,
            name_contains: non_empty(query, "name"),
            status: non_empty(query, "status"),
        })
    }
}

impl ResourceFilter for TeamFilter {
    fn options(&self) -> &FilterOptions {
        &self.options
    }

    fn build_expression(&self) -> Option<Expression> {
        let mut expr = Expression::new();
        if let Some(name) = &self.name_contains {
            expr = expr.and(Condition::contains("name", name.as_str()));
        }
        if let Some(status) = &self.status {
            expr = expr.and(Condition::equals("status", status.as_str()));
        }
        expr.into_option()
    }
}

/// Filters for the invites of one team.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TeamInviteFilter {
    pub options: FilterOptions,
    pub email_contains: Option<String>,
    pub status: Option<String>,
    pub role: Option<String>,
    pub invited_by: Option<String>,
}

impl TeamInviteFilter {
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self> {
        Ok(Self {
            options: FilterOptions::from_query(query)?,
            email_contains: non_empty(query, "email"),
            status: non_empty(query, "status"),
            role: non_empty(query, "role"),
            invited_by: non_empty(query, "invitedBy"),
        })
    }
}

impl ResourceFilter for TeamInviteFilter {
    fn options(&self) -> &FilterOptions {
        &self.options
    }

    fn build_expression(&self) -> Option<Expression> {
        let mut expr = Expression::new();
        if let Some(email) = &self.email_contains {
            expr = expr.and(Condition::contains("email", email.to_lowercase()));
        }
        if let Some(status) = &self.status {
            expr = expr.and(Condition::equals("status", status.as_str()));
        }
        if let Some(role) = &self.role {
            expr = expr.and(Condition::equals("role", role.as_str()));
        }
        if let Some(invited_by) = &self.invited_by {
            expr = expr.and(Condition::equals("invitedBy", invited_by.as_str()));
        }
        expr.into_option()
    }
}

/// Filters for the members of one team.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TeamMemberFilter {
    pub options: FilterOptions,
    pub role: Option<String>,
    pub status: Option<String>,
}

impl TeamMemberFilter {
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self> {
        Ok(Self {
            options: FilterOptions::from_query(query)?,
            role: non_empty(query, "role"),
            status: non_empty(query, "status"),
        })
    }
}

impl ResourceFilter for TeamMemberFilter {
    fn options(&self) -> &FilterOptions {
        &self.options
    }

    fn build_expression(&self) -> Option<Expression> {
        let mut expr = Expression::new();
        if let Some(role) = &self.role {
            expr = expr.and(Condition::equals("role", role.as_str()));
        }
        if let Some(status) = &self.status {
            expr = expr.and(Condition::equals("status", status.as_str()));
        }
        expr.into_option()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::pagination::encode_cursor;
    use serde_json::json;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_parameters() {
        let options = FilterOptions::from_query(&HashMap::new()).unwrap();
        assert_eq!(options, FilterOptions::default());
        assert_eq!(options.limit, 25);
        assert!(options.normalized_sort().is_none());
    }

    #[test]
    fn test_accepts_both_spellings() {
        let cursor = Cursor {
            last_id: Some("x".into()),
            last_created_at: None,
        };
        let token = encode_cursor(Some(&cursor)).unwrap();

        let snake = FilterOptions::from_query(&query(&[
            ("sort_by", "createdAt"),
            ("sort_order", "desc"),
            ("next_token", token.as_str()),
        ]))
        .unwrap();
        let camel = FilterOptions::from_query(&query(&[
            ("sortBy", "createdAt"),
            ("sortOrder", "desc"),
            ("nextToken", token.as_str()),
        ]))
        .unwrap();

        assert_eq!(snake, camel);
        assert_eq!(snake.cursor, Some(cursor));
        assert_eq!(
            snake.normalized_sort(),
            Some(("createdat".to_string(), SortOrder::Desc))
        );
    }

    #[test]
    fn test_unknown_sort_order_defaults_to_asc() {
        let options =
            FilterOptions::from_query(&query(&[("sortBy", "name"), ("sortOrder", "sideways")]))
                .unwrap();
        assert_eq!(options.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_limit_rules() {
        let capped = FilterOptions::from_query(&query(&[("limit", "500")])).unwrap();
        assert_eq!(capped.limit, MAX_PAGE_SIZE);

        for bad in ["0", "-1", "ten"] {
            let err = FilterOptions::from_query(&query(&[("limit", bad)])).unwrap_err();
            assert!(matches!(err, ServiceError::InvalidLimit(_)), "{}", bad);
        }
    }

    #[test]
    fn test_malformed_cursor_is_rejected() {
        let err = FilterOptions::from_query(&query(&[("next_token", "!!!")])).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCursor(_)));
    }

    #[test]
    fn test_team_filter_expression() {
        let filter = TeamFilter::from_query(&query(&[("name", " Eagles "), ("status", "active")]))
            .unwrap();
        let expr = filter.build_expression().unwrap();
        assert_eq!(
            expr.conditions,
            vec![
                Condition::contains("name", "Eagles"),
                Condition::equals("status", "active"),
            ]
        );
        assert!(expr.matches(&json!({"name": "Beach Eagles", "status": "active"})));
        assert!(!expr.matches(&json!({"name": "Beach Eagles", "status": "inactive"})));

        let empty = TeamFilter::from_query(&query(&[("status", "  ")])).unwrap();
        assert!(empty.build_expression().is_none());
    }

    #[test]
    fn test_invite_filter_expression() {
        let filter = TeamInviteFilter::from_query(&query(&[
            ("email", "Example.COM"),
            ("role", "trainer"),
            ("invitedBy", "coach"),
            ("limit", "5"),
        ]))
        .unwrap();
        assert_eq!(filter.options.limit, 5);

        let expr = filter.build_expression().unwrap();
        assert!(expr.matches(&json!({
            "email": "ann@example.com",
            "role": "trainer",
            "invitedBy": "coach"
        })));
        assert!(!expr.matches(&json!({
            "email": "ann@example.com",
            "role": "member",
            "invitedBy": "coach"
        })));
    }
}
