//! Execution history paging -- sorts and slices the upstream history list.
//!
//! The upstream returns its whole history as one unordered JSON array. The
//! dashboard asks for a sorted, paginated view of it; [`assemble`] produces
//! that view and never fails.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One past code execution, as reported by the upstream. No schema is enforced.
pub type ExecutionRecord = Map<String, Value>;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 50;
pub const DEFAULT_SORT_FIELD: &str = "timestamp";
pub const DEFAULT_ORDER: &str = "desc";

/// Paging and sorting parameters for one history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
    pub sort_by: String,
    /// Raw order string; only `desc` (any case) means descending.
    pub order: String,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: DEFAULT_SORT_FIELD.to_string(),
            order: DEFAULT_ORDER.to_string(),
        }
    }
}

impl PageRequest {
    /// Clamp `limit` into `[1, MAX_LIMIT]` and `page` to at least 1.
    pub fn sanitized(&self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_LIMIT),
            sort_by: self.sort_by.clone(),
            order: self.order.clone(),
        }
    }

    pub fn is_descending(&self) -> bool {
        self.order.eq_ignore_ascii_case("desc")
    }
}

/// Raw query string of `GET /api/history`.
///
/// Integers are kept as strings so that garbage like `?page=abc` falls back
/// to the default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl HistoryQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: parse_or(self.page.as_deref(), DEFAULT_PAGE),
            limit: parse_or(self.limit.as_deref(), DEFAULT_LIMIT),
            sort_by: self
                .sort_by
                .clone()
                .unwrap_or_else(|| DEFAULT_SORT_FIELD.to_string()),
            order: self
                .order
                .clone()
                .unwrap_or_else(|| DEFAULT_ORDER.to_string()),
        }
        .sanitized()
    }
}

fn parse_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(parse_saturating).unwrap_or(default)
}

/// Parse a decimal integer, saturating at the `i64` bounds instead of
/// failing, so `limit=99999999999999999999` still clamps to the maximum.
fn parse_saturating(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }

    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}

/// Echo of the effective sort parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: String,
}

/// One page of execution history plus paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub items: Vec<ExecutionRecord>,
    pub total: usize,
    pub page: i64,
    pub pages: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageResult {
    /// Placeholder page returned when the upstream history could not be fetched.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            pages: 1,
            sort: None,
            error: Some(message.into()),
        }
    }
}

/// Sort `records` by the requested field and cut out the requested page.
///
/// Keys compare as strings, so numeric fields order lexicographically
/// (`"10"` before `"9"`). The sort is stable in both directions. A page past
/// the end yields no items, and zero records yield `pages == 0`.
pub fn assemble(records: Vec<ExecutionRecord>, request: &PageRequest) -> PageResult {
    let request = request.sanitized();

    let mut keyed: Vec<(String, ExecutionRecord)> = records
        .into_iter()
        .map(|record| (sort_key(&record, &request.sort_by), record))
        .collect();

    if request.is_descending() {
        keyed.sort_by(|a, b| b.0.cmp(&a.0));
    } else {
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
    }

    let total = keyed.len();
    // limit is in [1, 50] after sanitizing
    let limit = request.limit as usize;
    let offset = (request.page - 1).saturating_mul(request.limit);
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(total);
    let end = start.saturating_add(limit).min(total);

    let items = keyed
        .into_iter()
        .skip(start)
        .take(end - start)
        .map(|(_, record)| record)
        .collect();

    PageResult {
        items,
        total,
        page: request.page,
        pages: total.div_ceil(limit),
        sort: Some(SortSpec {
            field: request.sort_by,
            order: request.order,
        }),
        error: None,
    }
}

/// String form of `record[field]`. Missing fields and nulls sort as `""`;
/// other non-strings use their JSON text (`true`, `10`, `[1,2]`).
fn sort_key(record: &ExecutionRecord, field: &str) -> String {
    match record.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> ExecutionRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn stamped(stamps: &[&str]) -> Vec<ExecutionRecord> {
        stamps
            .iter()
            .map(|s| record(json!({ "timestamp": s })))
            .collect()
    }

    fn numbered(n: usize) -> Vec<ExecutionRecord> {
        (1..=n)
            .map(|i| record(json!({ "id": i, "timestamp": format!("t{i:03}") })))
            .collect()
    }

    fn request(page: i64, limit: i64, sort_by: &str, order: &str) -> PageRequest {
        PageRequest {
            page,
            limit,
            sort_by: sort_by.to_string(),
            order: order.to_string(),
        }
    }

    fn stamps_of(result: &PageResult) -> Vec<&str> {
        result
            .items
            .iter()
            .map(|r| r["timestamp"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_sanitize_clamps_limit_and_page() {
        for limit in [-5, 0, 1, 10, 50, 51, 10_000, i64::MIN, i64::MAX] {
            let r = request(1, limit, "timestamp", "desc").sanitized();
            assert!((1..=MAX_LIMIT).contains(&r.limit), "limit {limit} -> {}", r.limit);
        }
        for page in [i64::MIN, -1, 0, 1, 7] {
            let r = request(page, 10, "timestamp", "desc").sanitized();
            assert!(r.page >= 1);
        }
        assert_eq!(request(0, 0, "x", "asc").sanitized(), request(1, 1, "x", "asc"));
        assert_eq!(request(3, 99, "x", "asc").sanitized().limit, 50);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = request(-2, 500, "timestamp", "DESC").sanitized();
        assert_eq!(once.sanitized(), once);
    }

    #[test]
    fn test_ascending_order() {
        let result = assemble(stamped(&["b", "a", "c"]), &request(1, 10, "timestamp", "asc"));
        assert_eq!(stamps_of(&result), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_descending_order() {
        let result = assemble(stamped(&["b", "a", "c"]), &request(1, 10, "timestamp", "desc"));
        assert_eq!(stamps_of(&result), vec!["c", "b", "a"]);

        let upper = assemble(stamped(&["b", "a", "c"]), &request(1, 10, "timestamp", "DESC"));
        assert_eq!(stamps_of(&upper), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_unknown_order_is_ascending() {
        let result = assemble(stamped(&["b", "a", "c"]), &request(1, 10, "timestamp", "sideways"));
        assert_eq!(stamps_of(&result), vec!["a", "b", "c"]);
        assert_eq!(result.sort.unwrap().order, "sideways");
    }

    #[test]
    fn test_sort_is_stable_in_both_directions() {
        let records = vec![
            record(json!({ "k": "x", "n": 1 })),
            record(json!({ "k": "y", "n": 2 })),
            record(json!({ "k": "x", "n": 3 })),
            record(json!({ "k": "y", "n": 4 })),
        ];
        let ids = |r: &PageResult| r.items.iter().map(|i| i["n"].as_i64().unwrap()).collect::<Vec<_>>();

        let asc = assemble(records.clone(), &request(1, 10, "k", "asc"));
        assert_eq!(ids(&asc), vec![1, 3, 2, 4]);

        let desc = assemble(records, &request(1, 10, "k", "desc"));
        assert_eq!(ids(&desc), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_numeric_field_sorts_as_text() {
        let records = vec![
            record(json!({ "size": 9 })),
            record(json!({ "size": 10 })),
            record(json!({ "size": 100 })),
        ];
        let result = assemble(records, &request(1, 10, "size", "asc"));
        let sizes: Vec<i64> = result.items.iter().map(|r| r["size"].as_i64().unwrap()).collect();
        assert_eq!(sizes, vec![10, 100, 9]);
    }

    #[test]
    fn test_missing_field_sorts_as_empty_string() {
        let records = vec![
            record(json!({ "timestamp": "b", "n": 1 })),
            record(json!({ "n": 2 })),
            record(json!({ "timestamp": "a", "n": 3 })),
            record(json!({ "timestamp": null, "n": 4 })),
        ];
        let ids = |r: &PageResult| r.items.iter().map(|i| i["n"].as_i64().unwrap()).collect::<Vec<_>>();

        let asc = assemble(records.clone(), &request(1, 10, "timestamp", "asc"));
        assert_eq!(ids(&asc), vec![2, 4, 3, 1]);

        let desc = assemble(records, &request(1, 10, "timestamp", "desc"));
        assert_eq!(ids(&desc), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_non_string_keys_use_json_text() {
        let key = |v: Value| sort_key(&record(json!({ "f": v })), "f");
        assert_eq!(key(Value::Null), "");
        assert_eq!(key(json!(true)), "true");
        assert_eq!(key(json!(false)), "false");
        assert_eq!(key(json!(1.5)), "1.5");
        assert_eq!(key(json!([1, 2])), "[1,2]");
        assert_eq!(sort_key(&record(json!({})), "f"), "");
    }

    #[test]
    fn test_last_partial_page() {
        let result = assemble(numbered(25), &request(3, 10, "timestamp", "asc"));
        assert_eq!(result.items.len(), 5);
        assert_eq!(result.total, 25);
        assert_eq!(result.pages, 3);
        assert_eq!(result.page, 3);
        let ids: Vec<i64> = result.items.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![21, 22, 23, 24, 25]);
    }

    #[test]
    fn test_empty_history_has_zero_pages() {
        let result = assemble(Vec::new(), &PageRequest::default());
        assert!(result.items.is_empty());
        assert_eq!(result.total, 0);
        assert_eq!(result.pages, 0);
        assert_eq!(result.page, 1);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let result = assemble(numbered(5), &request(100, 10, "timestamp", "desc"));
        assert!(result.items.is_empty());
        assert_eq!(result.total, 5);
        assert_eq!(result.pages, 1);
        assert_eq!(result.page, 100);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let result = assemble(numbered(3), &request(i64::MAX, 50, "timestamp", "asc"));
        assert!(result.items.is_empty());
        assert_eq!(result.total, 3);
    }

    #[test]
    fn test_assemble_sanitizes_request() {
        let result = assemble(numbered(60), &request(0, 500, "timestamp", "asc"));
        assert_eq!(result.page, 1);
        assert_eq!(result.items.len(), 50);
        assert_eq!(result.pages, 2);
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let records = numbered(17);
        let req = request(2, 7, "id", "desc").sanitized();
        assert_eq!(assemble(records.clone(), &req), assemble(records, &req));
    }

    #[test]
    fn test_query_parsing_falls_back_to_defaults() {
        let query = HistoryQuery {
            page: Some("abc".into()),
            limit: Some("".into()),
            sort_by: None,
            order: None,
        };
        assert_eq!(query.page_request(), PageRequest::default());

        let query = HistoryQuery {
            page: Some("-4".into()),
            limit: Some("75".into()),
            sort_by: Some("language".into()),
            order: Some("asc".into()),
        };
        assert_eq!(query.page_request(), request(1, 50, "language", "asc"));
    }

    #[test]
    fn test_oversized_integers_saturate() {
        assert_eq!(parse_saturating("99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_saturating("+99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_saturating("-99999999999999999999"), Some(i64::MIN));
        assert_eq!(parse_saturating(" 42 "), Some(42));
        assert_eq!(parse_saturating("9e99"), None);
        assert_eq!(parse_saturating("-"), None);

        let query = HistoryQuery {
            page: Some("99999999999999999999".into()),
            limit: Some("99999999999999999999".into()),
            ..HistoryQuery::default()
        };
        let req = query.page_request();
        assert_eq!(req.limit, MAX_LIMIT);
        assert_eq!(req.page, i64::MAX);
        let result = assemble(numbered(60), &req);
        assert!(result.items.is_empty());
        assert_eq!(result.pages, 2);

        let query = HistoryQuery {
            page: Some("-99999999999999999999".into()),
            limit: Some("-99999999999999999999".into()),
            ..HistoryQuery::default()
        };
        let req = query.page_request();
        assert_eq!((req.page, req.limit), (1, 1));
    }

    #[test]
    fn test_result_json_shape() {
        let result = assemble(stamped(&["a"]), &PageRequest::default());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["sort"], json!({ "field": "timestamp", "order": "desc" }));
        assert!(json.get("error").is_none());

        let fallback = serde_json::to_value(PageResult::unavailable("down")).unwrap();
        assert_eq!(
            fallback,
            json!({ "items": [], "total": 0, "page": 1, "pages": 1, "error": "down" })
        );
    }
}
