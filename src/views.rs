//! Server-rendered HTML views.
//!
//! Plain string rendering, no template engine. All database content is
//! escaped with [`escape`]. The connect form remembers the last successful
//! path in the browser's `localStorage`; the server never depends on it.

use axum::http::StatusCode;
use chroma_viewer_core::models::{Collection, DocumentEntry, EmbeddingStatus};
use chroma_viewer_core::pagination::ALLOWED_PAGE_SIZES;

use crate::server::DocumentsResponse;
use crate::session::Connection;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 72rem; color: #222; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #ddd; padding: .4rem .6rem; text-align: left; vertical-align: top; }
pre { margin: 0; white-space: pre-wrap; font-size: .85em; }
.muted { color: #777; }
.nav a, .nav span { margin-right: .5rem; }
.current { font-weight: bold; }
.error { color: #a00; }
"#;

/// Escape text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{} - Chroma Viewer</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        STYLE,
        body
    )
}

/// Connect form shown while no database is open.
pub fn connect_page() -> String {
    let body = r#"<h1>Chroma Viewer</h1>
<p>Connect to a local Chroma database directory (or its <code>chroma.sqlite3</code> file).</p>
<form id="connect-form">
  <input id="db_path" name="db_path" size="60" placeholder="/path/to/chroma" required>
  <button type="submit">Connect</button>
</form>
<p id="connect-error" class="error"></p>
<script>
const KEY = "chromaViewer.lastDbPath";
const input = document.getElementById("db_path");
input.value = localStorage.getItem(KEY) || "";
document.getElementById("connect-form").addEventListener("submit", async (ev) => {
  ev.preventDefault();
  const res = await fetch("/api/connect", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify({ db_path: input.value }),
  });
  const data = await res.json();
  if (res.ok) {
    localStorage.setItem(KEY, input.value);
    window.location.reload();
  } else {
    document.getElementById("connect-error").textContent = data.error.message;
  }
});
</script>"#;
    layout("Connect", body)
}

/// Collection list for the active connection.
pub fn collections_page(connection: &Connection, collections: &[Collection]) -> String {
    let mut body = String::new();
    body.push_str("<h1>Collections</h1>\n");
    body.push_str(&format!(
        "<p class=\"muted\">Database: <code>{}</code> (connected {})</p>\n",
        escape(&connection.path().display().to_string()),
        connection.opened_at().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    body.push_str(DISCONNECT_BUTTON);

    if collections.is_empty() {
        body.push_str("<p>This database has no collections.</p>\n");
    } else {
        body.push_str("<table>\n<tr><th>Name</th><th>Documents</th></tr>\n");
        for c in collections {
            body.push_str(&format!(
                "<tr><td><a href=\"/collection/{}\">{}</a></td><td>{}</td></tr>\n",
                urlencoding::encode(&c.name),
                escape(&c.name),
                c.document_count
            ));
        }
        body.push_str("</table>\n");
    }

    layout("Collections", &body)
}

const DISCONNECT_BUTTON: &str = r#"<p><button onclick="fetch('/api/disconnect', {method: 'POST'}).then(() => window.location.href = '/')">Disconnect</button></p>
"#;

/// One page of documents with navigation.
pub fn documents_page(response: &DocumentsResponse) -> String {
    let page = &response.page;
    let name = &response.collection_name;
    let base = format!("/collection/{}", urlencoding::encode(name));

    let mut body = String::new();
    body.push_str("<p><a href=\"/\">&larr; Collections</a></p>\n");
    body.push_str(&format!("<h1>{}</h1>\n", escape(name)));

    if page.total_items == 0 {
        body.push_str("<p>This collection is empty.</p>\n");
        return layout(name, &body);
    }

    body.push_str(&format!(
        "<p class=\"muted\">Showing {}&ndash;{} of {} documents (page {} of {})</p>\n",
        page.start_index, page.end_index, page.total_items, page.page_number, page.total_pages
    ));

    let nav = navigation(&base, page.page_number, page.total_pages, page.page_size);
    body.push_str(&nav);
    body.push_str(&page_size_selector(&base, page.page_size));

    body.push_str(
        "<table>\n<tr><th>#</th><th>ID</th><th>Text</th><th>Metadata</th><th>Embedding</th></tr>\n",
    );
    for entry in &page.items {
        body.push_str(&document_row(entry));
    }
    body.push_str("</table>\n");
    body.push_str(&nav);

    layout(name, &body)
}

fn document_row(entry: &DocumentEntry) -> String {
    let doc = &entry.document;
    let metadata = match &doc.metadata {
        Some(meta) => format!(
            "<pre>{}</pre>",
            escape(&serde_json::to_string_pretty(meta).unwrap_or_default())
        ),
        None => "<span class=\"muted\">none</span>".to_string(),
    };
    let embedding = match (&entry.embedding_preview, doc.embedding_status) {
        (Some(preview), _) => format!("<pre>{}</pre>", escape(&preview.to_display_string())),
        (None, EmbeddingStatus::NotInWriteAheadLog) => {
            "<span class=\"muted\">not available (compacted)</span>".to_string()
        }
        (None, _) => "<span class=\"muted\">not stored</span>".to_string(),
    };
    format!(
        "<tr><td>{}</td><td><code>{}</code></td><td title=\"{}\">{}</td><td>{}</td><td>{}</td></tr>\n",
        entry.index,
        escape(&doc.id),
        escape(&doc.text),
        escape(&entry.preview),
        metadata,
        embedding
    )
}

fn navigation(base: &str, current: u64, total_pages: u64, page_size: u32) -> String {
    let link = |page: u64, label: &str| {
        format!(
            "<a href=\"{}?page={}&amp;page_size={}\">{}</a>",
            base, page, page_size, label
        )
    };

    let mut nav = String::from("<p class=\"nav\">");
    if current > 1 {
        nav.push_str(&link(1, "&laquo; First"));
        nav.push_str(&link(current - 1, "&lsaquo; Prev"));
    }

    let first = current.saturating_sub(2).max(1);
    let last = (current + 2).min(total_pages);
    for p in first..=last {
        if p == current {
            nav.push_str(&format!("<span class=\"current\">{}</span>", p));
        } else {
            nav.push_str(&link(p, &p.to_string()));
        }
    }

    if current < total_pages {
        nav.push_str(&link(current + 1, "Next &rsaquo;"));
        nav.push_str(&link(total_pages, "Last &raquo;"));
    }
    nav.push_str("</p>\n");
    nav
}

fn page_size_selector(base: &str, current: u32) -> String {
    let mut out = String::from("<p class=\"nav\">Page size: ");
    for size in ALLOWED_PAGE_SIZES {
        if size == current {
            out.push_str(&format!("<span class=\"current\">{}</span>", size));
        } else {
            out.push_str(&format!(
                "<a href=\"{}?page=1&amp;page_size={}\">{}</a>",
                base, size, size
            ));
        }
    }
    out.push_str("</p>\n");
    out
}

/// Error page for the browser views.
pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(
        "<h1>{}</h1>\n<p class=\"error\">{}</p>\n<p><a href=\"/\">Back to start</a></p>\n",
        status,
        escape(message)
    );
    layout("Error", &body)
}
