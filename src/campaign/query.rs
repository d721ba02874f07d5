use std::collections::HashMap;

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_PAGE_SIZE: u64 = 10;

/// Listing parameters. Parsing is permissive: bad numbers fall back to
/// their defaults and empty values are treated as absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u64,
    pub page_size: u64,
    pub search: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub screens: Option<Vec<String>>,
    pub inventory: Option<Vec<String>>,
}

impl Default for ListQuery {
    fn default() -> ListQuery {
        ListQuery {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            from: None,
            to: None,
            screens: None,
            inventory: None,
        }
    }
}

impl ListQuery {
    /// Parses raw query pairs. A repeated key keeps its first value.
    pub fn from_pairs<I>(pairs: I) -> ListQuery
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = HashMap::new();
        for (key, value) in pairs {
            params.entry(key).or_insert(value);
        }

        ListQuery::parse(&params)
    }

    pub fn parse(params: &HashMap<String, String>) -> ListQuery {
        let text = |key: &str| {
            params
                .get(key)
                .filter(|value| !value.is_empty())
                .cloned()
        };
        let list = |key: &str| {
            text(key).map(|value| {
                value
                    .split(',')
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            })
        };

        ListQuery {
            page: number(params.get("page"), DEFAULT_PAGE),
            page_size: number(params.get("pageSize"), DEFAULT_PAGE_SIZE),
            search: text("search"),
            from: text("from"),
            to: text("to"),
            screens: list("screens"),
            inventory: list("inventory"),
        }
    }

    /// Zero-based index of the first row on this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Inclusive index of the last row this page may hold.
    pub fn last_index(&self) -> u64 {
        self.offset().saturating_add(self.page_size - 1)
    }
}

fn number(value: Option<&String>, default: u64) -> u64 {
    let value = match value.map(|value| value.trim()) {
        Some(value) if !value.is_empty() => value,
        _ => return default,
    };

    let parsed = value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
            .map(|number| number.trunc() as i64)
    });

    match parsed {
        Some(number) => number.max(1) as u64,
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_empty() {
        assert_eq!(ListQuery::parse(&HashMap::new()), ListQuery::default());
    }

    #[test]
    fn non_numeric_pages_fall_back_to_defaults() {
        let query = ListQuery::parse(&params(&[("page", "abc"), ("pageSize", "")]));

        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 10);
    }

    #[test]
    fn pages_are_floored_to_one() {
        let query = ListQuery::parse(&params(&[("page", "0"), ("pageSize", "-4")]));
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 1);

        let query = ListQuery::parse(&params(&[("page", "2.7"), ("pageSize", " 25 ")]));
        assert_eq!(query.page, 2);
        assert_eq!(query.page_size, 25);
    }

    #[test]
    fn repeated_keys_keep_the_first_value() {
        let pairs = [("page", "2"), ("search", "spring"), ("page", "3")]
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()));

        let query = ListQuery::from_pairs(pairs);

        assert_eq!(query.page, 2);
        assert_eq!(query.search.as_deref(), Some("spring"));
    }

    #[test]
    fn empty_strings_are_absent() {
        let query = ListQuery::parse(&params(&[
            ("search", ""),
            ("from", ""),
            ("to", "2024-01-31"),
            ("screens", ""),
        ]));

        assert_eq!(query.search, None);
        assert_eq!(query.from, None);
        assert_eq!(query.to.as_deref(), Some("2024-01-31"));
        assert_eq!(query.screens, None);
    }

    #[test]
    fn lists_drop_empty_segments() {
        let query = ListQuery::parse(&params(&[
            ("screens", "CTV,,Mobile Device,"),
            ("inventory", ",Hulu"),
        ]));

        assert_eq!(
            query.screens,
            Some(vec!["CTV".to_string(), "Mobile Device".to_string()])
        );
        assert_eq!(query.inventory, Some(vec!["Hulu".to_string()]));
    }

    #[test]
    fn window_covers_the_requested_page() {
        let query = ListQuery::parse(&params(&[("page", "3"), ("pageSize", "10")]));

        assert_eq!(query.offset(), 20);
        assert_eq!(query.last_index(), 29);
        assert_eq!(ListQuery::default().offset(), 0);
        assert_eq!(ListQuery::default().last_index(), 9);
    }

    #[test]
    fn window_saturates_on_huge_pages() {
        let query = ListQuery::parse(&params(&[
            ("page", "9223372036854775807"),
            ("pageSize", "9223372036854775807"),
        ]));

        assert_eq!(query.offset(), u64::MAX);
        assert_eq!(query.last_index(), u64::MAX);
    }
}
