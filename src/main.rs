use anyhow::Context;
use std::fmt::Write;
use std::io;
use webapp_response::http::Status;
use webapp_response::http::environment::ProcessEnvironment;
use webapp_response::http::transport::WriterTransport;
use webapp_response::{AppConfig, WebApplication};

type App = WebApplication<ProcessEnvironment>;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::from_env().context("Invalid application configuration")?;
    let mut app = WebApplication::new(config, ProcessEnvironment);
    let mut transport = WriterTransport::new(io::stdout().lock());

    let route = route_name(&app).to_string();
    match route.as_str() {
        "redirect" => app
            .redirect("index.php?task=done", Status::SEE_OTHER.code_num, &mut transport)
            .context("Failed to send redirect")?,
        _ => app
            .execute(uri_summary, &mut transport)
            .context("Failed to send response")?,
    }

    Ok(())
}

/// Route without the front controller, e.g. `index.php/redirect` -> `redirect`.
fn route_name(app: &App) -> &str {
    let route = app.uris().route.as_deref().unwrap_or_default();
    let route = route.strip_prefix("index.php").unwrap_or(route);
    let route = route.trim_start_matches('/');
    route.split(['?', '#']).next().unwrap_or_default()
}

fn uri_summary(app: &mut App) -> anyhow::Result<()> {
    let mut text = String::new();
    for (key, value) in app.uris().entries() {
        writeln!(text, "{} = {}", key, value)?;
    }
    writeln!(text, "client.engine = {}", app.client().engine)?;

    app.set_header("Content-Type", "text/plain; charset=utf-8", true)
        .set_body(text);
    Ok(())
}
