use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// A content document as supplied by the content store.
///
/// The store never mutates documents after parse; every index build gets a
/// fresh snapshot of the whole collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique stable identifier: lowercase, hyphenated.
    pub slug: String,
    pub title: String,
    /// Category tag, free-form ("note", "book", "article", ...).
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    /// `YYYY-MM-DD` date string from frontmatter.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Source URL for external content types.
    #[serde(default)]
    pub url: Option<String>,
    /// Raw markdown body with frontmatter stripped.
    #[serde(default)]
    pub body: String,
}

/// Frontmatter fields recognized at the head of a markdown file.
#[derive(Debug, Default, Deserialize)]
struct Frontmatter {
    title: Option<String>,
    #[serde(rename = "type")]
    doc_type: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    authors: Vec<String>,
    date: Option<String>,
    summary: Option<String>,
    url: Option<String>,
}

impl Document {
    pub fn new(slug: &str, title: &str, doc_type: &str, body: &str) -> Document {
        Document {
            slug: slug.to_string(),
            title: title.to_string(),
            doc_type: doc_type.to_string(),
            tags: Vec::new(),
            authors: Vec::new(),
            date: None,
            summary: None,
            url: None,
            body: body.to_string(),
        }
    }

    /// Parse a markdown file into a document. The file may start with a
    /// `---`-delimited YAML frontmatter block; without one the whole file
    /// is the body and metadata falls back to defaults (title = slug,
    /// type = "note").
    pub fn from_markdown(slug: &str, raw: &str) -> Result<Document> {
        let (frontmatter, body) = split_frontmatter(slug, raw)?;

        Ok(Document {
            slug: slug.to_string(),
            title: frontmatter.title.unwrap_or_else(|| slug.to_string()),
            doc_type: frontmatter.doc_type.unwrap_or_else(|| "note".to_string()),
            tags: frontmatter.tags,
            authors: frontmatter.authors,
            date: frontmatter.date,
            summary: frontmatter.summary,
            url: frontmatter.url,
            body: body.to_string(),
        })
    }

    pub fn has_summary(&self) -> bool {
        self.summary.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }
}

fn split_frontmatter<'a>(slug: &str, raw: &'a str) -> Result<(Frontmatter, &'a str)> {
    if !raw.starts_with("---") {
        return Ok((Frontmatter::default(), raw));
    }

    // Split on the frontmatter delimiters: ["", yaml, body]
    let parts: Vec<&str> = raw.splitn(3, "---").collect();
    if parts.len() < 3 {
        return Err(anyhow!("unterminated frontmatter block in {}", slug));
    }

    let frontmatter: Frontmatter = serde_yaml::from_str(parts[1])
        .map_err(|e| anyhow!("failed to parse frontmatter in {}: {}", slug, e))?;

    Ok((frontmatter, parts[2]))
}
