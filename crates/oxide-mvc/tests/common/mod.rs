#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use oxide_mvc::{
    Application, ApplicationBuilder, Config, Context, Middleware, MvcError, Render, Request,
    Response, Result, Templates,
};

pub const APP: &str = "testapp";

pub fn templates() -> Templates {
    let mut t = Templates::new();
    t.add(APP, "root", "html", "tmpl1").unwrap();
    t.add(APP, "user", "html", "tmpl2-{{ id }}").unwrap();
    t.add(
        APP,
        "date",
        "html",
        "tmpl3-{{ name }}-{{ year }}-{{ month }}-{{ day }}",
    )
    .unwrap();
    t
}

pub fn root(_: &mut Context<'_>) -> Result<Render> {
    Ok(Render::template())
}

pub fn user(ctx: &mut Context<'_>) -> Result<Render> {
    let id: i64 = ctx
        .path_params
        .parse("id")
        .ok_or_else(|| MvcError::handler("bad id"))?;
    ctx.insert("id", &id)?;
    Ok(Render::template())
}

pub fn date(ctx: &mut Context<'_>) -> Result<Render> {
    for key in ["year", "month", "day"] {
        let value: u32 = ctx
            .path_params
            .parse(key)
            .ok_or_else(|| MvcError::handler(format!("bad {key}")))?;
        ctx.insert(key, &value)?;
    }
    let name = ctx.path_params.require("name").map_err(MvcError::handler)?.to_string();
    ctx.insert("name", &name)?;
    Ok(Render::template())
}

pub fn error(_: &mut Context<'_>) -> Result<Render> {
    panic!("boom")
}

pub fn failing(_: &mut Context<'_>) -> Result<Render> {
    Err(MvcError::handler("controller failed"))
}

/// Routes exercised by most tests.
pub fn builder() -> ApplicationBuilder {
    Application::builder(Config::new(APP))
        .route("root", "/", root)
        .route("user", "/user/:id(int)", user)
        .route("date", "/:year(int)/:month(int)/:day(int)/user/:name", date)
        .route("error", "/error", error)
        .route("failing", "/failing", failing)
        .templates(templates())
}

pub fn app() -> Application {
    builder().build().unwrap()
}

pub fn get(app: &Application, target: &str) -> Response {
    app.handle(Request::get(target))
}

pub fn body(res: &Response) -> String {
    res.body_string().unwrap()
}

/// Shared log of middleware calls.
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Records `<name>:before` and `<name>:after` calls.
pub struct Recorder {
    pub name: &'static str,
    pub log: Log,
    pub fail_before: bool,
    pub panic_after: bool,
}

impl Recorder {
    pub fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: log.clone(),
            fail_before: false,
            panic_after: false,
        }
    }
}

impl Middleware for Recorder {
    fn before(&self, _app: &Application, _ctx: &mut Context<'_>) -> Result<()> {
        self.log.lock().unwrap().push(format!("{}:before", self.name));
        if self.fail_before {
            return Err(MvcError::handler("before failed"));
        }
        Ok(())
    }

    fn after(&self, _app: &Application, _ctx: &mut Context<'_>) -> Result<()> {
        self.log.lock().unwrap().push(format!("{}:after", self.name));
        assert!(!self.panic_after, "after panicked");
        Ok(())
    }
}
