use serde::{Deserialize, Serialize};
use std::path::Path;

/// Routing priority; the first matching keyword wins.
pub const ROUTED: [Category; 4] = [
    Category::Controller,
    Category::ServiceA,
    Category::ServiceB,
    Category::ServiceC,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Controller,
    ServiceA,
    ServiceB,
    ServiceC,
    General,
}

impl Category {
    pub fn is_service(self) -> bool {
        matches!(self, Self::ServiceA | Self::ServiceB | Self::ServiceC)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Controller => "controller",
            Self::ServiceA => "service_a",
            Self::ServiceB => "service_b",
            Self::ServiceC => "service_c",
            Self::General => "general",
        };
        f.write_str(name)
    }
}

/// Path keyword per routed category. An empty keyword disables the category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryTable {
    pub controller: String,
    pub service_a: String,
    pub service_b: String,
    pub service_c: String,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            controller: "controller".to_string(),
            service_a: "cbc".to_string(),
            service_b: "bc".to_string(),
            service_c: "qc".to_string(),
        }
    }
}

impl CategoryTable {
    pub fn keyword(&self, category: Category) -> Option<&str> {
        let keyword = match category {
            Category::Controller => &self.controller,
            Category::ServiceA => &self.service_a,
            Category::ServiceB => &self.service_b,
            Category::ServiceC => &self.service_c,
            Category::General => return None,
        };
        let keyword = keyword.trim();
        if keyword.is_empty() { None } else { Some(keyword) }
    }

    pub fn category_of(&self, path: &Path) -> Category {
        let lower = path.to_string_lossy().to_lowercase();
        ROUTED
            .into_iter()
            .find(|c| {
                self.keyword(*c)
                    .is_some_and(|k| lower.contains(&k.to_lowercase()))
            })
            .unwrap_or(Category::General)
    }

    /// Enabled categories with their output file stems, in routing order.
    pub fn streams(&self) -> Vec<(Category, String)> {
        ROUTED
            .into_iter()
            .filter_map(|c| self.keyword(c).map(|k| (c, k.to_string())))
            .collect()
    }
}
