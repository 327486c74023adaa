//! Method and response-type tokens.
//!
//! Both are sanitized the same way: the raw input is lowercased and trimmed,
//! then compared against each allowed literal (normalized the same way) in
//! table order. The first match wins; anything else gets the table default.

use std::fmt;

/// Request methods a request can be opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
        }
    }
}

impl Default for Method {
    fn default() -> Self {
        METHOD_LITERALS.default
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// How the response body is exposed on the descriptor.
///
/// `Empty` is the `""` token and behaves like `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseType {
    Empty,
    Text,
    ArrayBuffer,
    Blob,
    Document,
    Json,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Empty => "",
            ResponseType::Text => "text",
            ResponseType::ArrayBuffer => "arraybuffer",
            ResponseType::Blob => "blob",
            ResponseType::Document => "document",
            ResponseType::Json => "json",
        }
    }

    /// Whether descriptors for this type carry `response_text`.
    pub fn exposes_text(&self) -> bool {
        matches!(self, ResponseType::Empty | ResponseType::Text)
    }
}

impl Default for ResponseType {
    fn default() -> Self {
        RESPONSE_TYPE_LITERALS.default
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A default plus the literals accepted for one token kind.
struct Literals<T: 'static> {
    default: T,
    allowed: &'static [(&'static str, T)],
}

impl<T: Copy> Literals<T> {
    fn sanitize(&self, input: Option<&str>) -> T {
        let Some(input) = input else {
            return self.default;
        };
        let wanted = input.to_lowercase();
        let wanted = trim_host_whitespace(&wanted);

        self.allowed
            .iter()
            .find(|(literal, _)| trim_host_whitespace(&literal.to_lowercase()) == wanted)
            .map(|(_, token)| *token)
            .unwrap_or(self.default)
    }
}

// Unicode whitespace plus the byte order mark, the set host string trimming strips.
fn trim_host_whitespace(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

// Only GET and POST are supported.
static METHOD_LITERALS: Literals<Method> = Literals {
    default: Method::Get,
    allowed: &[("get", Method::Get), ("post", Method::Post)],
};

static RESPONSE_TYPE_LITERALS: Literals<ResponseType> = Literals {
    default: ResponseType::Empty,
    allowed: &[
        ("text", ResponseType::Text),
        ("arraybuffer", ResponseType::ArrayBuffer),
        ("blob", ResponseType::Blob),
        ("document", ResponseType::Document),
        ("json", ResponseType::Json),
    ],
};

/// Maps raw method input onto an allowed [`Method`], `GET` otherwise.
pub fn sanitize_method(method: Option<&str>) -> Method {
    METHOD_LITERALS.sanitize(method)
}

/// Maps raw response-type input onto an allowed [`ResponseType`], `""` otherwise.
pub fn sanitize_response_type(response_type: Option<&str>) -> ResponseType {
    RESPONSE_TYPE_LITERALS.sanitize(response_type)
}
