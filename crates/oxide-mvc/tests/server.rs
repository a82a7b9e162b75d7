//! HTTP transport over a real socket.

mod common;
use common::*;

use std::net::SocketAddr;
use std::sync::Arc;

use oxide_mvc::{server, Application, Config, Context, Method, Render, Result, WithMethods};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn start(app: Application) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(Arc::new(app), listener));
    addr
}

async fn send(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

fn request(method: &str, path: &str) -> String {
    format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
}

#[tokio::test]
async fn serves_templates() {
    let addr = start(app()).await;

    let res = send(addr, &request("GET", "/user/7")).await;
    assert!(res.starts_with("HTTP/1.1 200 OK"), "{res}");
    assert!(res.to_ascii_lowercase().contains("content-type: text/html"));
    assert!(res.ends_with("tmpl2-7"));
}

#[tokio::test]
async fn serves_errors() {
    let addr = start(app()).await;

    let res = send(addr, &request("GET", "/missing")).await;
    assert!(res.starts_with("HTTP/1.1 404 Not Found"), "{res}");
    assert!(res.ends_with("Not Found"));

    let res = send(addr, &request("GET", "/error")).await;
    assert!(res.starts_with("HTTP/1.1 500 Internal Server Error"), "{res}");
    assert!(res.ends_with("Internal Server Error"));
}

fn upload(ctx: &mut Context<'_>) -> Result<Render> {
    Ok(Render::text(format!("{} bytes", ctx.request.body.len())))
}

#[tokio::test]
async fn request_body_is_bounded() {
    let app = Application::builder(Config::new(APP).max_client_body_size(8))
        .route("upload", "/upload", WithMethods::new(&[Method::Post], upload))
        .build()
        .unwrap();
    let addr = start(app).await;

    let small = "POST /upload HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: 4\r\n\r\nabcd";
    let res = send(addr, small).await;
    assert!(res.starts_with("HTTP/1.1 200 OK"), "{res}");
    assert!(res.ends_with("4 bytes"));

    let large = "POST /upload HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: 16\r\n\r\n0123456789abcdef";
    let res = send(addr, large).await;
    assert!(res.starts_with("HTTP/1.1 500 Internal Server Error"), "{res}");
}
