//! Minimal server-rendered pages for the browser flows.
//!
//! Messages passed in here are fixed strings chosen by the handlers, never
//! user input.

use axum::response::Html;

fn page(title: &str, msg: Option<&str>, body: &str) -> Html<String> {
    let msg = msg
        .map(|m| format!(r#"<p class="msg">{}</p>"#, m))
        .unwrap_or_default();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Todos</title>
</head>
<body>
    <h1>{title}</h1>
    {msg}
    {body}
</body>
</html>"#
    ))
}

pub fn login(msg: Option<&str>) -> Html<String> {
    page(
        "Login",
        msg,
        r#"<form method="post" action="/auth/">
        <input name="username" placeholder="Username" required>
        <input name="password" type="password" placeholder="Password" required>
        <button type="submit">Login</button>
    </form>
    <a href="/auth/register">Register</a>"#,
    )
}

pub fn register(msg: Option<&str>) -> Html<String> {
    page(
        "Register",
        msg,
        r#"<form method="post" action="/auth/register">
        <input name="email" type="email" placeholder="Email" required>
        <input name="username" placeholder="Username" required>
        <input name="firstname" placeholder="First name" required>
        <input name="lastname" placeholder="Last name" required>
        <input name="password" type="password" placeholder="Password" required>
        <input name="password2" type="password" placeholder="Confirm password" required>
        <button type="submit">Register</button>
    </form>
    <a href="/auth/">Login</a>"#,
    )
}

pub fn logout() -> Html<String> {
    login(Some("Logout Successful"))
}

pub fn edit_password(msg: Option<&str>) -> Html<String> {
    page(
        "Change password",
        msg,
        r#"<form method="post" action="/users/edit-password">
        <input name="username" placeholder="Username" required>
        <input name="password" type="password" placeholder="Current password" required>
        <input name="password2" type="password" placeholder="New password" required>
        <button type="submit">Change password</button>
    </form>
    <a href="/todos/">Back to todos</a>"#,
    )
}
