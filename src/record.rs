use serde::Serialize;

pub const NO_COMMENT: &str = "no comment";
pub const UNKNOWN_NAME: &str = "Unknown";
pub const DEFAULT_URL_PREFIX: &str = "/";
pub const FIELD_DELIMITER: char = '|';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HttpVerb {
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "POST")]
    Post,
    #[serde(rename = "PUT")]
    Put,
    #[serde(rename = "DELETE")]
    Delete,
}

impl HttpVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub path: String,
    pub verb: HttpVerb,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodRecord {
    pub name: String,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
}

impl MethodRecord {
    pub fn new(name: String, comment: String) -> Self {
        Self {
            name,
            comment,
            route: None,
        }
    }

    pub fn with_route(name: String, comment: String, route: Route) -> Self {
        Self {
            name,
            comment,
            route: Some(route),
        }
    }
}

/// One per file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassRecord {
    pub name: String,
    pub comment: String,
    pub common_url_prefix: String,
    pub methods: Vec<MethodRecord>,
}

impl ClassRecord {
    pub fn routes(&self) -> impl Iterator<Item = (&MethodRecord, &Route)> {
        self.methods
            .iter()
            .filter_map(|m| m.route.as_ref().map(|r| (m, r)))
    }

    /// `className|classComment|commonUrlPrefix|methodUrlPath|methodName|methodComment`,
    /// one line per routed method.
    pub fn controller_lines(&self) -> String {
        let mut out = String::new();
        for (method, route) in self.routes() {
            push_line(
                &mut out,
                &[
                    &self.name,
                    &self.comment,
                    &self.common_url_prefix,
                    &route.path,
                    &method.name,
                    &method.comment,
                ],
            );
        }
        out
    }

    /// `className.methodName|className|classComment|methodName|methodComment`,
    /// one line per method.
    pub fn service_lines(&self) -> String {
        let mut out = String::new();
        for method in &self.methods {
            let qualified = format!("{}.{}", self.name, method.name);
            push_line(
                &mut out,
                &[
                    &qualified,
                    &self.name,
                    &self.comment,
                    &method.name,
                    &method.comment,
                ],
            );
        }
        out
    }
}

// Values are not escaped; a `|` inside a comment shifts the columns.
fn push_line(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(FIELD_DELIMITER);
        }
        out.push_str(field);
    }
    out.push('\n');
}
