//! Query string helpers.
//!
//! VMmanager filter expressions are written as `field+EQ+value`. The `+`
//! separators and the `(` and `)` grouping characters must reach the server
//! untouched, so values are form-urlencoded with those three characters left
//! literal. The `'` around text values is always sent as `%27`: URL
//! normalisation escapes it in http(s) queries and the server decodes it back.

use std::fmt::{self, Display};
use url::form_urlencoded;

/// Characters that stay literal in encoded query values.
const FILTER_SAFE: [(&str, &str); 3] = [("%2B", "+"), ("%28", "("), ("%29", ")")];

/// Encode a single query component, keeping filter syntax intact.
#[must_use]
pub fn encode_component(input: &str) -> String {
    let mut encoded: String = form_urlencoded::byte_serialize(input.as_bytes()).collect();
    for (escaped, literal) in FILTER_SAFE {
        encoded = encoded.replace(escaped, literal);
    }
    encoded
}

/// Percent-encode a single path segment.
///
/// `@` stays literal so email addresses read naturally; `/`, `?`, `#` and
/// everything else outside the unreserved set are escaped.
#[must_use]
pub fn encode_path_segment(input: &str) -> String {
    form_urlencoded::byte_serialize(input.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace("%40", "@")
}

/// Builder for assembling query parameter pairs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a required key/value pair.
    pub fn push<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Display,
    {
        self.pairs.push((key.into(), value.to_string()));
    }

    /// Append a key/value pair when the value is present.
    pub fn push_opt<K, V>(&mut self, key: K, value: Option<V>)
    where
        K: Into<String>,
        V: Display,
    {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// Append a `where` filter.
    pub fn push_filter(&mut self, filter: &Filter) {
        self.push("where", filter);
    }

    /// Return the collected key/value pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Render the pairs as a query string without the leading `?`.
    #[must_use]
    pub fn encode(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Display,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.push(key, value);
        }
        params
    }
}

/// A value on the right-hand side of a filter condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// Rendered as is
    Number(String),
    /// Rendered between single quotes
    Text(String),
}

impl Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "'{value}'"),
        }
    }
}

macro_rules! numeric_filter_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    Self::Number(value.to_string())
                }
            }
        )*
    };
}

numeric_filter_value!(u32, u64, i32, i64);

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A `where` filter expression in VMmanager syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    expression: String,
}

impl Filter {
    /// Exact-match condition, `field+EQ+value`.
    #[must_use]
    pub fn eq(field: &str, value: impl Into<FilterValue>) -> Self {
        Self::condition(field, "EQ", value.into())
    }

    /// Negated match, `field+NE+value`.
    #[must_use]
    pub fn ne(field: &str, value: impl Into<FilterValue>) -> Self {
        Self::condition(field, "NE", value.into())
    }

    /// Conjunction of two filters, `(a)+AND+(b)`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self {
            expression: format!("({})+AND+({})", self.expression, other.expression),
        }
    }

    /// The raw expression.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    fn condition(field: &str, operator: &str, value: FilterValue) -> Self {
        Self {
            expression: format!("{field}+{operator}+{value}"),
        }
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}
