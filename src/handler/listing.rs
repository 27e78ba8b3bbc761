//! Directory listing page

use std::path::Path;
use tokio::fs;

/// Render an HTML index of `dir`
///
/// `display_path` is the decoded request path, shown in the title. Entries are
/// sorted case-insensitively, directories get a trailing `/` and symlinks are
/// shown with a trailing `@` (the link target keeps the `/` of a linked
/// directory).
pub async fn render(dir: &Path, display_path: &str) -> std::io::Result<String> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_link = entry
            .file_type()
            .await
            .map(|t| t.is_symlink())
            .unwrap_or(false);
        // Follows symlinks so a linked directory is linked as a directory
        let is_dir = fs::metadata(entry.path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        entries.push(Entry {
            name,
            is_dir,
            is_link,
        });
    }
    entries.sort_by_key(|e| e.name.to_lowercase());

    let title = format!("Directory listing for {}", escape_html(display_path));
    let mut html = String::with_capacity(256 + entries.len() * 64);
    html.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"));
    for entry in &entries {
        let href_suffix = if entry.is_dir { "/" } else { "" };
        let label_suffix = if entry.is_link { "@" } else { href_suffix };
        html.push_str(&format!(
            "<li><a href=\"{}{href_suffix}\">{}{label_suffix}</a></li>\n",
            urlencoding::encode(&entry.name),
            escape_html(&entry.name),
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");

    Ok(html)
}

struct Entry {
    name: String,
    is_dir: bool,
    is_link: bool,
}

/// Escape text for HTML element and attribute content
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
