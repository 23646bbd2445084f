//! Tool definitions and execution for the chat assistant. Each tool takes
//! its JSON input, runs against the in-memory corpus, and returns a JSON
//! string for the model plus the notes it touched (for the sources list).

use super::SourceRef;
use crate::server::AppState;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::LazyLock;
use tangent_core::link_parser::extract_links;
use tangent_core::search::{keyword_search, merge_search_results, KeywordResult};

const DEFAULT_SEARCH_LIMIT: usize = 5;
const RELATED_LIMIT: usize = 5;
/// Truncation limits keep tool results small enough for the model's context
/// window.
const NOTE_CONTENT_LIMIT: usize = 4_000;
const SOURCE_CONTENT_LIMIT: usize = 10_000;

pub const SYSTEM_PROMPT: &str = r#"You are the user's second brain - a personal knowledge assistant.

You have tools to search and read their notes:
- search_notes: Find notes by topic (keyword scoring blended with embedding similarity)
- get_note_content: Read a note's full content including markdown body
- get_note_details: Get connections (backlinks, forward links, related notes)
- fetch_source: Fetch original source from a note's URL

**Tool usage strategy:**
1. Start with search_notes to find relevant notes
2. Use get_note_content to read the actual content
3. For external content (articles, youtube, github, podcasts) with sparse content:
   - Check if the note has a URL field
   - Use fetch_source to get the original material
4. Use get_note_details when exploring how notes connect

When answering questions:
- Speak as if you ARE their memory ("I found in your notes...", "Based on what you captured...")
- Reference specific notes by name when relevant

**CRITICAL - NO GENERAL KNOWLEDGE:**
- You are ONLY their personal knowledge base, not a general assistant
- If search_notes returns empty results or { found: false }, you MUST respond:
  "I couldn't find anything about [topic] in your notes."
- NEVER provide information you weren't given by the tools
- If asked about something not in their notes, suggest they add it

Always end your response with a "Sources:" section listing the notes you referenced, formatted as:
Sources:
- [Note Title](/path-to-note)"#;

static TOOL_DEFINITIONS: LazyLock<Value> = LazyLock::new(|| {
    json!([
        {
            "name": "search_notes",
            "description": "Search the note corpus by topic. Returns matching notes with title, summary and path.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "What to search for"},
                    "type": {"type": "string", "description": "Optional content type filter, e.g. note, book, article"},
                    "limit": {"type": "integer", "description": "Max results (default 5, capped at 10)"},
                    "mode": {"type": "string", "enum": ["keyword", "hybrid"], "description": "Search mode (default hybrid)"}
                },
                "required": ["query"]
            }
        },
        {
            "name": "get_note_content",
            "description": "Read one note's full content by slug, including its markdown body.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "slug": {"type": "string", "description": "The note's slug"}
                },
                "required": ["slug"]
            }
        },
        {
            "name": "get_note_details",
            "description": "Get a note's connections: backlinks, forward links and semantically related notes.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "slug": {"type": "string", "description": "The note's slug"},
                    "include_related": {"type": "boolean", "description": "Include semantically related notes (default true)"}
                },
                "required": ["slug"]
            }
        },
        {
            "name": "fetch_source",
            "description": "Fetch the original source material from a note's URL, stripped to plain text.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "slug": {"type": "string", "description": "The note's slug"}
                },
                "required": ["slug"]
            }
        }
    ])
});

pub fn tool_definitions() -> &'static Value {
    &TOOL_DEFINITIONS
}

/// What a tool hands back: a JSON string for the model, plus the notes it
/// touched so the handler can report sources.
pub struct ToolOutcome {
    pub result: String,
    pub notes: Vec<SourceRef>,
}

impl ToolOutcome {
    fn bare(result: Value) -> ToolOutcome {
        ToolOutcome {
            result: result.to_string(),
            notes: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchNotesInput {
    query: String,
    #[serde(rename = "type")]
    type_filter: Option<String>,
    limit: Option<usize>,
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlugInput {
    slug: String,
}

#[derive(Debug, Deserialize)]
struct NoteDetailsInput {
    slug: String,
    include_related: Option<bool>,
}

pub async fn execute_tool(
    state: &AppState,
    name: &str,
    input: &Value,
    request_id: &str,
) -> ToolOutcome {
    match name {
        "search_notes" => match serde_json::from_value::<SearchNotesInput>(input.clone()) {
            Ok(input) => run_search_notes(state, input, request_id),
            Err(_) => invalid_input(name),
        },
        "get_note_content" => match serde_json::from_value::<SlugInput>(input.clone()) {
            Ok(input) => run_get_note_content(state, &input.slug, request_id),
            Err(_) => invalid_input(name),
        },
        "get_note_details" => match serde_json::from_value::<NoteDetailsInput>(input.clone()) {
            Ok(input) => run_get_note_details(
                state,
                &input.slug,
                input.include_related.unwrap_or(true),
                request_id,
            ),
            Err(_) => invalid_input(name),
        },
        "fetch_source" => match serde_json::from_value::<SlugInput>(input.clone()) {
            Ok(input) => run_fetch_source(state, &input.slug, request_id).await,
            Err(_) => invalid_input(name),
        },
        _ => ToolOutcome::bare(json!({ "error": format!("Unknown tool: {name}") })),
    }
}

fn invalid_input(name: &str) -> ToolOutcome {
    ToolOutcome::bare(json!({ "error": format!("Invalid input for tool: {name}") }))
}

fn run_search_notes(state: &AppState, input: SearchNotesInput, request_id: &str) -> ToolOutcome {
    tracing::info!(request_id, query = %input.query, mode = ?input.mode, "tool: search_notes");

    let docs = match state.store.documents() {
        Ok(docs) => docs,
        Err(e) => {
            tracing::error!(request_id, error = %e, "search_notes: content unavailable");
            return ToolOutcome::bare(json!({ "error": "Content unavailable" }));
        }
    };

    let limit = input.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let keyword_hits = keyword_search(&docs, &input.query, input.type_filter.as_deref(), limit);

    // Hybrid mode blends keyword scores with similarity to the best
    // keyword hit's embedding; it degrades to keyword-only without one.
    let slugs: Vec<String> = match (input.mode.as_deref(), &state.embeddings) {
        (Some("keyword"), _) | (_, None) => {
            keyword_hits.iter().map(|h| h.doc.slug.clone()).collect()
        }
        (_, Some(embeddings)) => {
            let keyword_results: Vec<KeywordResult> = keyword_hits
                .iter()
                .map(|h| KeywordResult {
                    slug: h.doc.slug.clone(),
                    title: h.doc.title.clone(),
                    score: h.score as f32,
                })
                .collect();
            let semantic = match keyword_results.first() {
                Some(best) => {
                    let mut similar = embeddings.find_similar(&best.slug, limit * 2);
                    if let Some(type_filter) = input.type_filter.as_deref() {
                        similar.retain(|s| s.doc_type == type_filter);
                    }
                    similar
                }
                None => Vec::new(),
            };
            merge_search_results(&keyword_results, &semantic)
                .into_iter()
                .take(limit.min(10))
                .map(|r| r.slug)
                .collect()
        }
    };

    let mut results = Vec::new();
    let mut notes = Vec::new();
    for slug in &slugs {
        let Some(doc) = docs.iter().find(|d| d.slug == *slug) else {
            continue;
        };
        let path = format!("/{}", doc.slug);
        results.push(json!({
            "title": doc.title,
            "summary": doc.summary,
            "path": path,
        }));
        notes.push(SourceRef {
            title: doc.title.clone(),
            path,
        });
    }

    tracing::info!(request_id, found = results.len(), "search_notes results");

    if results.is_empty() {
        return ToolOutcome::bare(json!({
            "results": [],
            "found": false,
            "message": format!(
                "No notes found about \"{}\". You MUST tell the user: \"I couldn't find anything about {} in your notes.\" Do NOT provide information from general knowledge.",
                input.query, input.query
            ),
        }));
    }

    ToolOutcome {
        result: json!({ "results": results, "found": true }).to_string(),
        notes,
    }
}

fn run_get_note_content(state: &AppState, slug: &str, request_id: &str) -> ToolOutcome {
    tracing::info!(request_id, slug, "tool: get_note_content");

    let Some(doc) = state.store.get(slug) else {
        tracing::warn!(request_id, slug, "get_note_content: note not found");
        return ToolOutcome::bare(json!({ "error": "Note not found" }));
    };

    let content: String = doc.body.chars().take(NOTE_CONTENT_LIMIT).collect();
    let path = format!("/{}", doc.slug);
    let result = json!({
        "title": doc.title,
        "summary": doc.summary,
        "tags": doc.tags,
        "type": doc.doc_type,
        "path": path,
        "url": doc.url,
        "content": content,
    });

    ToolOutcome {
        result: result.to_string(),
        notes: vec![SourceRef {
            title: doc.title.clone(),
            path,
        }],
    }
}

fn run_get_note_details(
    state: &AppState,
    slug: &str,
    include_related: bool,
    request_id: &str,
) -> ToolOutcome {
    tracing::info!(request_id, slug, include_related, "tool: get_note_details");

    let docs = match state.store.documents() {
        Ok(docs) => docs,
        Err(e) => {
            tracing::error!(request_id, error = %e, "get_note_details: content unavailable");
            return ToolOutcome::bare(json!({ "error": "Content unavailable" }));
        }
    };
    let Some(doc) = docs.iter().find(|d| d.slug == slug) else {
        tracing::warn!(request_id, slug, "get_note_details: note not found");
        return ToolOutcome::bare(json!({ "error": "Note not found" }));
    };

    let backlinks: Vec<Value> = docs
        .iter()
        .filter(|d| d.slug != slug && extract_links(&d.body).iter().any(|l| l == slug))
        .map(|d| json!({ "title": d.title, "path": format!("/{}", d.slug) }))
        .collect();

    let forward_links = extract_links(&doc.body);

    let related: Vec<Value> = match (&state.embeddings, include_related) {
        (Some(embeddings), true) => embeddings
            .find_similar(slug, RELATED_LIMIT)
            .into_iter()
            .map(|s| json!({ "title": s.title, "path": format!("/{}", s.slug), "score": s.score }))
            .collect(),
        _ => Vec::new(),
    };

    let path = format!("/{}", doc.slug);
    let result = json!({
        "title": doc.title,
        "summary": doc.summary,
        "tags": doc.tags,
        "type": doc.doc_type,
        "path": path,
        "url": doc.url,
        "backlinks": backlinks,
        "forwardLinks": forward_links,
        "related": related,
    });

    ToolOutcome {
        result: result.to_string(),
        notes: vec![SourceRef {
            title: doc.title.clone(),
            path,
        }],
    }
}

async fn run_fetch_source(state: &AppState, slug: &str, request_id: &str) -> ToolOutcome {
    tracing::info!(request_id, slug, "tool: fetch_source");

    let Some(doc) = state.store.get(slug) else {
        tracing::warn!(request_id, slug, "fetch_source: note not found");
        return ToolOutcome::bare(json!({ "url": "", "content": "", "error": "Note not found" }));
    };
    let Some(url) = doc.url else {
        tracing::warn!(request_id, slug, "fetch_source: note has no source URL");
        return ToolOutcome::bare(
            json!({ "url": "", "content": "", "error": "Note has no source URL" }),
        );
    };

    let response = state
        .http
        .get(&url)
        .header(
            reqwest::header::USER_AGENT,
            "Mozilla/5.0 (compatible; Tangent/1.0)",
        )
        .header(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .send()
        .await
        .and_then(|r| r.error_for_status());

    let html = match response {
        Ok(response) => match response.text().await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(request_id, url = %url, error = %e, "fetch_source: failed to read body");
                return ToolOutcome::bare(
                    json!({ "url": url, "content": "", "error": format!("Failed to fetch: {e}") }),
                );
            }
        },
        Err(e) => {
            tracing::error!(request_id, url = %url, error = %e, "fetch_source: request failed");
            return ToolOutcome::bare(
                json!({ "url": url, "content": "", "error": format!("Failed to fetch: {e}") }),
            );
        }
    };

    let content = strip_html(&html);
    tracing::info!(request_id, url = %url, chars = content.len(), "fetch_source: fetched");
    ToolOutcome::bare(json!({ "url": url, "content": content }))
}

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Basic text extraction: drop scripts and styles, strip tags, collapse
/// whitespace, truncate.
fn strip_html(html: &str) -> String {
    let no_scripts = SCRIPT_RE.replace_all(html, "");
    let no_styles = STYLE_RE.replace_all(&no_scripts, "");
    let no_tags = TAG_RE.replace_all(&no_styles, " ");
    let collapsed = WS_RE.replace_all(&no_tags, " ");
    collapsed.trim().chars().take(SOURCE_CONTENT_LIMIT).collect()
}
