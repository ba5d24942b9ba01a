fn error_page(title: &str, heading: &str, detail: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title} - Microblog</title>
</head>
<body>
<div class="nav">Microblog: <a href="/index">Home</a> <a href="/explore">Explore</a></div>
<hr>
<h1>{heading}</h1>
<p>{detail}</p>
<p><a href="/index">Back</a></p>
</body>
</html>
"#,
        title = super::text(title),
        heading = super::text(heading),
        detail = super::text(detail),
    )
}

pub fn not_found_page() -> String {
    error_page("Not Found", "File Not Found", "The page you asked for does not exist.")
}

pub fn bad_request_page(msg: &str) -> String {
    error_page("Bad Request", "Bad Request", msg)
}

pub fn internal_error_page() -> String {
    error_page(
        "Error",
        "An unexpected error has occurred",
        "The administrator has been notified. Sorry for the inconvenience!",
    )
}
