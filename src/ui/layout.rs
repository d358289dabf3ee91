//! Page shell shared by every HTML response.

use html_escape::encode_text;

/// Product name shown in the header and the tab title.
pub const APP_TITLE: &str = "Enhanced Gemini Chat";

/// Inline stylesheet. No external assets are needed to render the page.
const STYLES: &str = r"
:root { color-scheme: light dark; --accent: #6366f1; --muted: #6b7280; --panel: rgba(127,127,127,.08); --danger: #dc2626; }
* { box-sizing: border-box; }
body { margin: 0; font-family: system-ui, -apple-system, 'Segoe UI', sans-serif; line-height: 1.5; }
a { color: var(--accent); }
.layout { display: flex; min-height: 100vh; }
.sidebar { width: 300px; flex-shrink: 0; padding: 1.5rem; background: var(--panel); }
.sidebar h2 { margin-top: 0; font-size: 1.2rem; }
.sidebar hr, .main hr { border: none; border-top: 1px solid rgba(127,127,127,.3); margin: 1.25rem 0; }
.main { flex: 1; display: flex; flex-direction: column; max-width: 960px; margin: 0 auto; padding: 1.5rem 2rem; }
.main h1 { margin: 0; }
.messages { flex: 1; display: flex; flex-direction: column; gap: .75rem; }
.message { display: flex; gap: .75rem; align-items: flex-start; padding: .75rem 1rem; border-radius: .75rem; background: var(--panel); }
.message.user { background: rgba(99,102,241,.12); }
.avatar { font-size: 1.4rem; line-height: 1; }
.text { white-space: pre-wrap; overflow-wrap: anywhere; }
.placeholder { color: var(--muted); }
.alert { padding: .75rem 1rem; border-radius: .75rem; border: 1px solid var(--danger); color: var(--danger); margin: .75rem 0; }
.composer { display: flex; gap: .5rem; margin-top: 1rem; position: sticky; bottom: 0; padding: .75rem 0; }
.composer input[type=text] { flex: 1; padding: .75rem 1rem; border-radius: .75rem; border: 1px solid rgba(127,127,127,.4); font: inherit; }
button { padding: .6rem 1rem; border-radius: .75rem; border: 1px solid rgba(127,127,127,.4); font: inherit; cursor: pointer; background: transparent; }
button.primary { background: var(--accent); border-color: var(--accent); color: #fff; }
.slider { width: 100%; }
.help { color: var(--muted); font-size: .85rem; }
.empty { color: var(--muted); text-align: center; margin-top: 3rem; }
";

/// Wrap page content in the HTML document.
#[must_use]
pub fn html_shell(title: &str, content: &str) -> String {
    let title = encode_text(title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Chat with Google Gemini">
    <title>{title} - {APP_TITLE}</title>
    <link rel="icon" href="data:image/svg+xml,<svg xmlns=%22http://www.w3.org/2000/svg%22 viewBox=%220 0 100 100%22><text y=%22.9em%22 font-size=%2290%22>🤖</text></svg>">
    <style>{STYLES}</style>
</head>
<body>
{content}
</body>
</html>"#
    )
}
