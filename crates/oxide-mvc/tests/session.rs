//! Session middleware across requests.

mod common;
use common::*;

use std::sync::Arc;

use chrono::Duration;
use oxide_mvc::{
    Application, Config, Context, MemoryStore, Render, Request, Result, SessionConfig,
    SessionMiddleware, SessionStore,
};

fn visits(ctx: &mut Context<'_>) -> Result<Render> {
    let Some(session) = ctx.session.as_mut() else {
        return Ok(Render::error(500));
    };
    let count = session.get::<u32>("visits").unwrap_or(0) + 1;
    session.set("visits", &count)?;
    Ok(Render::text(count.to_string()))
}

fn session_app(store: Arc<MemoryStore>) -> Application {
    let session = SessionConfig::new("sid", store).max_age(Duration::hours(1));
    Application::builder(Config::new(APP).session(session))
        .route("visits", "/visits", visits)
        .middleware(SessionMiddleware)
        .build()
        .unwrap()
}

fn session_key(set_cookie: &str) -> String {
    let pair = set_cookie.split(';').next().unwrap();
    let (name, value) = pair.split_once('=').unwrap();
    assert_eq!(name, "sid");
    value.to_string()
}

#[test]
fn new_session_sets_cookie() {
    let store = Arc::new(MemoryStore::new());
    let app = session_app(store.clone());

    let res = get(&app, "/visits");
    assert_eq!(body(&res), "1");
    let cookie = res.get_header("Set-Cookie").unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=3600"));

    let key = session_key(cookie);
    assert_eq!(key.len(), 64);
    assert!(store.load(&key).unwrap().is_some());
}

#[test]
fn session_survives_across_requests() {
    let store = Arc::new(MemoryStore::new());
    let app = session_app(store.clone());

    let res = get(&app, "/visits");
    let key = session_key(res.get_header("Set-Cookie").unwrap());

    let res = app.handle(Request::get("/visits").header("Cookie", format!("theme=dark; sid={key}")));
    assert_eq!(body(&res), "2");
    assert_eq!(session_key(res.get_header("Set-Cookie").unwrap()), key);
    assert_eq!(store.len(), 1);
}

#[test]
fn unknown_session_key_starts_fresh() {
    let store = Arc::new(MemoryStore::new());
    let app = session_app(store);

    let res = app.handle(Request::get("/visits").header("Cookie", "sid=stale"));
    assert_eq!(body(&res), "1");
    assert_ne!(session_key(res.get_header("Set-Cookie").unwrap()), "stale");
}

fn touch_then_panic(ctx: &mut Context<'_>) -> Result<Render> {
    if let Some(session) = ctx.session.as_mut() {
        session.set("seen", &true)?;
    }
    panic!("boom")
}

#[test]
fn session_saved_when_controller_panics() {
    let store = Arc::new(MemoryStore::new());
    let session = SessionConfig::new("sid", store.clone());
    let app = Application::builder(Config::new(APP).session(session))
        .route("error", "/error", touch_then_panic)
        .middleware(SessionMiddleware)
        .build()
        .unwrap();

    let res = get(&app, "/error");
    assert_eq!(res.status, 500);
    assert_eq!(store.len(), 1);
}

#[test]
fn untouched_new_sessions_are_not_stored() {
    let store = Arc::new(MemoryStore::new());
    let session = SessionConfig::new("sid", store.clone());
    let app = Application::builder(Config::new(APP).session(session))
        .route("root", "/", root)
        .route("error", "/error", error)
        .templates(templates())
        .middleware(SessionMiddleware)
        .build()
        .unwrap();

    for _ in 0..1000 {
        let res = get(&app, "/");
        assert_eq!(res.status, 200);
        assert!(res.get_header("Set-Cookie").is_none());
    }
    assert_eq!(get(&app, "/error").status, 500);
    assert!(store.is_empty());
}

#[test]
fn loaded_session_is_saved_even_when_emptied() {
    fn logout(ctx: &mut Context<'_>) -> Result<Render> {
        if let Some(session) = ctx.session.as_mut() {
            session.remove("visits");
        }
        Ok(Render::text("bye"))
    }

    let store = Arc::new(MemoryStore::new());
    let session = SessionConfig::new("sid", store.clone());
    let app = Application::builder(Config::new(APP).session(session))
        .route("visits", "/visits", visits)
        .route("logout", "/logout", logout)
        .middleware(SessionMiddleware)
        .build()
        .unwrap();

    let key = session_key(get(&app, "/visits").get_header("Set-Cookie").unwrap());
    let res = app.handle(Request::get("/logout").header("Cookie", format!("sid={key}")));
    assert_eq!(session_key(res.get_header("Set-Cookie").unwrap()), key);
    assert!(store.load(&key).unwrap().unwrap().data.is_empty());
}
