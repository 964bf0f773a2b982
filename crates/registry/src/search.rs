//! Substring search over registry metadata.

use crate::{RegistryIndex, ToolEntry};

impl RegistryIndex {
    /// Tools matching `query`, in registry order.
    ///
    /// An empty query matches everything. Otherwise a tool matches when the
    /// lower-cased query is a substring of its lower-cased name, description
    /// or any keyword. Each tool appears at most once.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&ToolEntry> {
        if query.is_empty() {
            return self.tools.iter().collect();
        }

        let query = query.to_lowercase();
        self.tools
            .iter()
            .filter(|tool| matches(tool, &query))
            .collect()
    }
}

fn matches(tool: &ToolEntry, query: &str) -> bool {
    tool.name.to_lowercase().contains(query)
        || tool.description.to_lowercase().contains(query)
        || tool
            .keywords
            .iter()
            .any(|keyword| keyword.to_lowercase().contains(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RegistryIndex {
        let tool = |name: &str, description: &str, keywords: &[&str]| ToolEntry {
            name: name.into(),
            description: description.into(),
            repository: format!("https://github.com/example/{name}"),
            maintainer: None,
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        };
        RegistryIndex {
            schema_version: 1,
            registry_url: "https://github.com/example/registry".into(),
            tools: vec![
                tool("fs", "Filesystem tools", &["files"]),
                tool("http", "HTTP client", &["web", "net"]),
                tool("grep", "Search text in files", &["search", "text"]),
            ],
        }
    }

    fn names(results: &[&ToolEntry]) -> Vec<String> {
        results.iter().map(|t| t.name.clone()).collect()
    }

    #[test]
    fn test_empty_query_returns_all() {
        let index = registry();
        assert_eq!(names(&index.search("")), vec!["fs", "http", "grep"]);
    }

    #[test]
    fn test_matches_name_case_insensitively() {
        let index = registry();
        assert_eq!(names(&index.search("HTTP")), vec!["http"]);
    }

    #[test]
    fn test_matches_keyword() {
        let index = registry();
        assert_eq!(names(&index.search("web")), vec!["http"]);
    }

    #[test]
    fn test_multiple_fields_yield_single_result() {
        let index = registry();
        // "files" hits fs by keyword and description, grep by description
        assert_eq!(names(&index.search("files")), vec!["fs", "grep"]);
    }

    #[test]
    fn test_file_and_http_queries() {
        let index = RegistryIndex {
            tools: vec![
                ToolEntry {
                    name: "filesystem".into(),
                    description: "Access local filesystem".into(),
                    keywords: vec!["fs".into(), "file".into(), "read".into()],
                    ..Default::default()
                },
                ToolEntry {
                    name: "http-client".into(),
                    description: "Make HTTP requests".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(names(&index.search("file")), vec!["filesystem"]);
        assert_eq!(names(&index.search("HTTP")), vec!["http-client"]);
        assert_eq!(index.search("").len(), 2);
        assert!(index.search("nothing-matches").is_empty());
    }

    #[test]
    fn test_no_match() {
        assert!(registry().search("database").is_empty());
    }
}
