//! A small site served over HTTP.
//!
//! Run with `cargo run -p oxide-mvc --example hello`, then open
//! <http://127.0.0.1:9100/>.

use std::sync::Arc;

use oxide_mvc::{
    server, AccessLog, Application, Config, Context, Method, MemoryStore, MvcError, Render,
    ResourceSet, Result, SessionConfig, SessionMiddleware, Templates, WithMethods,
};
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const APP: &str = "hello";

#[derive(Serialize)]
struct User {
    id: i64,
    name: String,
}

fn root(ctx: &mut Context<'_>) -> Result<Render> {
    let visits = ctx
        .session
        .as_mut()
        .map(|session| {
            let visits = session.get::<u64>("visits").unwrap_or(0) + 1;
            session.set("visits", &visits).map(|()| visits)
        })
        .transpose()?
        .unwrap_or(1);
    ctx.insert("visits", &visits)?;
    Ok(Render::template())
}

fn user(ctx: &mut Context<'_>) -> Result<Render> {
    let id: i64 = ctx
        .path_params
        .parse("id")
        .ok_or_else(|| MvcError::handler("id must be an integer"))?;
    if id == 0 {
        return Ok(Render::error(404));
    }
    Render::template_with(&User {
        id,
        name: format!("user{id}"),
    })
}

fn user_json(ctx: &mut Context<'_>) -> Result<Render> {
    let id: i64 = ctx.path_params.parse("id").unwrap_or_default();
    Render::json(&User {
        id,
        name: format!("user{id}"),
    })
}

fn login(ctx: &mut Context<'_>) -> Result<Render> {
    let name = ctx.params.get("name").unwrap_or("anonymous").to_string();
    if let Some(session) = ctx.session.as_mut() {
        session.set("name", &name)?;
    }
    Ok(Render::redirect("/"))
}

fn assets(ctx: &mut Context<'_>) -> Result<Render> {
    let path = ctx.path_params.get("path").unwrap_or_default().to_string();
    Ok(Render::file(path))
}

fn templates() -> Result<Templates> {
    let mut templates = Templates::new();
    templates.add_layout(
        APP,
        "app",
        "html",
        "<!doctype html><html><body>{{ content }}</body></html>",
    )?;
    templates.add(APP, "root", "html", "<h1>Hello</h1><p>Visit #{{ visits }}</p>")?;
    templates.add(APP, "user", "html", "<h1>{{ name }}</h1><p>id {{ id }}</p>")?;
    templates.add(APP, "errors/404", "html", "<h1>Nothing here</h1>")?;
    Ok(templates)
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let session = SessionConfig::new("hello_session", Arc::new(MemoryStore::new()));
    let config = Config::new(APP).default_layout("app").session(session);

    let app = Application::builder(config)
        .route("root", "/", root)
        .route("user", "/user/:id(int)", user)
        .route("user_json", "/api/user/:id(int)", user_json)
        .route("login", "/login", WithMethods::new(&[Method::Post], login))
        .route("assets", "/assets/*path", assets)
        .resources(ResourceSet::new().with("robots.txt", "User-agent: *\nDisallow:\n"))
        .templates(templates()?)
        .middleware(AccessLog)
        .middleware(SessionMiddleware)
        .build()?;

    server::run(app).await?;
    Ok(())
}
