//! Mermaid ER diagram output.

use std::fmt::Write;

use crate::keys::AcceptedRelationship;

const MERMAID_CDN: &str = "https://cdn.jsdelivr.net/npm/mermaid/dist/mermaid.min.js";

/// Render accepted relationships as a Mermaid `erDiagram`.
///
/// One line per relationship, in input order:
///
/// ```text
/// erDiagram
///     orders }o--|| customers : "customer_id"
/// ```
///
/// Duplicates and self references are drawn as given. Table names are
/// reduced to Mermaid entity names with [`entity_name`].
pub fn render_mermaid(accepted: &[AcceptedRelationship]) -> String {
    let mut out = String::from("erDiagram\n");
    for rel in accepted {
        let _ = writeln!(
            out,
            "    {} }}o--|| {} : \"{}\"",
            entity_name(&rel.table),
            entity_name(&rel.referenced_table),
            rel.column.replace('"', "#quot;")
        );
    }
    out
}

/// Mermaid entity names only admit ASCII letters, digits and underscores;
/// anything else (spaces, dots, dashes from dataset-qualified names)
/// becomes `_`.
pub fn entity_name(table: &str) -> String {
    let name: String = table
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() {
        "_".to_string()
    } else {
        name
    }
}

/// Wrap a diagram in a standalone page that renders it with Mermaid.
pub fn render_html(diagram: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Domain model</title>
  <script src="{MERMAID_CDN}"></script>
</head>
<body>
  <pre class="mermaid">
{}
  </pre>
  <script>
    mermaid.initialize({{ startOnLoad: true }});
  </script>
</body>
</html>
"#,
        escape_html(diagram.trim_end())
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
