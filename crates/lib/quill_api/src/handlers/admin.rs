//! Admin console shell. The gate has already decided who may see it; the
//! page itself only boots the client bundle.

use axum::response::Html;

const CONSOLE_SHELL: &str = r#"<!doctype html>
<html lang="zh-Hant">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="robots" content="noindex">
<title>Quill Admin</title>
</head>
<body>
<div id="admin-root"></div>
<script type="module" src="/admin-assets/main.js"></script>
</body>
</html>
"#;

/// `GET /admin`, `/admin/login`, `/admin/setup`, `/admin/{*path}`
pub async fn console_handler() -> Html<&'static str> {
    Html(CONSOLE_SHELL)
}
