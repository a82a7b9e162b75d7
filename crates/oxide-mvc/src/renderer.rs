//! Turns a [`Render`] directive into response bytes.

use std::fs;
use std::path::{Component, Path};

use oxide_router::status_text;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;
use tracing::debug;

use crate::context::Context;
use crate::error::{MvcError, Result};
use crate::mime;
use crate::render::Render;

/// Writes render directives into the context's response.
pub struct Renderer;

impl Renderer {
    /// Executes `render` against `ctx`.
    ///
    /// # Errors
    ///
    /// Fails on a missing template, an unknown content type, an encoding
    /// error or an unreadable file. A missing file is not an error; it
    /// renders the 404 page.
    pub fn execute(ctx: &mut Context<'_>, render: Render) -> Result<()> {
        match render {
            Render::Template { name, data } => {
                if let Some(name) = name {
                    ctx.name = name;
                }
                if let Some(data) = data {
                    ctx.set_data(data);
                }
                let format = ctx.format()?;
                let body = render_template(ctx, &format)?;
                ctx.response.body = body.into_bytes();
            }
            Render::Json(payload) => {
                ctx.set_content_type_if_missing("application/json");
                ctx.response.body = serde_json::to_vec(&payload)?;
            }
            Render::Xml { root, payload } => {
                ctx.set_content_type_if_missing("application/xml");
                ctx.response.body = encode_xml(&root, &payload)?;
            }
            Render::Text(body) => {
                ctx.set_content_type_if_missing("text/plain");
                ctx.response.body = body;
            }
            Render::File(path) => send_file(ctx, &path)?,
            Render::Redirect { url, permanent } => {
                ctx.set_status(if permanent { 301 } else { 302 });
                ctx.response.set_header("Location", url);
                ctx.response.body.clear();
            }
            Render::Error { status, data } => Self::render_error(ctx, status, data),
        }
        Ok(())
    }

    /// Renders the error page for `status`.
    ///
    /// Uses the `errors/<status>` template in the resolved format when there
    /// is one, otherwise the plain-text reason phrase. Never fails.
    pub fn render_error(ctx: &mut Context<'_>, status: u16, data: Option<Value>) {
        ctx.set_status(status);
        ctx.name = format!("errors/{status}");
        if let Some(data) = data {
            ctx.set_data(data);
        }

        let rendered = ctx
            .format()
            .and_then(|format| render_template(ctx, &format));
        match rendered {
            Ok(body) => ctx.response.body = body.into_bytes(),
            Err(err) => {
                debug!(status, error = %err, "Falling back to plain error page");
                ctx.set_content_type("text/plain");
                ctx.response.body = status_text(status).as_bytes().to_vec();
            }
        }
    }
}

fn render_template(ctx: &Context<'_>, format: &str) -> Result<String> {
    let app = ctx.app();
    let app_name = &app.config().app_name;
    let template = app
        .templates()
        .get(app_name, ctx.layout.as_deref(), &ctx.name, format)
        .ok_or_else(|| MvcError::TemplateNotFound(format!("{app_name}/{}.{format}", ctx.name)))?;
    template.execute(&ctx.template_env(format))
}

fn send_file(ctx: &mut Context<'_>, path: &str) -> Result<()> {
    let app = ctx.app();
    let data = if Path::new(path).is_absolute() {
        read_file(Path::new(path))?
    } else if Path::new(path)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        None
    } else if let Some(data) = app.resources().get(path) {
        Some(data.to_vec())
    } else {
        read_file(&app.config().static_dir().join(path))?
    };

    let Some(data) = data else {
        Renderer::render_error(ctx, 404, None);
        return Ok(());
    };

    if ctx.content_type().is_none() {
        let content_type = mime::from_extension(Path::new(path))
            .unwrap_or_else(|| mime::sniff(&data).to_string());
        ctx.set_content_type(content_type);
    }
    ctx.response.body = data;
    Ok(())
}

fn read_file(path: &Path) -> Result<Option<Vec<u8>>> {
    if !path.is_file() {
        return Ok(None);
    }
    Ok(Some(fs::read(path)?))
}

fn encode_xml(root: &str, payload: &Value) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    match payload {
        Value::Array(items) => {
            start(&mut writer, root)?;
            for item in items {
                write_element(&mut writer, "item", item)?;
            }
            end(&mut writer, root)?;
        }
        _ => write_element(&mut writer, root, payload)?,
    }
    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Array(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
        }
        Value::Null => {
            check_name(name)?;
            writer
                .write_event(Event::Empty(BytesStart::new(name)))
                .map_err(xml_error)?;
        }
        Value::Object(fields) => {
            start(writer, name)?;
            for (key, field) in fields {
                write_element(writer, key, field)?;
            }
            end(writer, name)?;
        }
        Value::String(text) => text_element(writer, name, text)?,
        other => text_element(writer, name, &other.to_string())?,
    }
    Ok(())
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    start(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    end(writer, name)
}

fn start(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    check_name(name)?;
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)
}

fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)
}

fn check_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(MvcError::Xml(format!("invalid element name: {name:?}")))
    }
}

fn xml_error(err: impl std::fmt::Display) -> MvcError {
    MvcError::Xml(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn xml(root: &str, payload: &Value) -> String {
        String::from_utf8(encode_xml(root, payload).unwrap()).unwrap()
    }

    #[test]
    fn test_xml_object() {
        assert_eq!(
            xml("user", &json!({"id": 7, "name": "naoina & co"})),
            "<user><id>7</id><name>naoina &amp; co</name></user>"
        );
    }

    #[test]
    fn test_xml_nested_arrays_repeat_elements() {
        assert_eq!(
            xml("post", &json!({"tag": ["a", "b"], "draft": null})),
            "<post><draft/><tag>a</tag><tag>b</tag></post>"
        );
    }

    #[test]
    fn test_xml_root_array() {
        assert_eq!(
            xml("response", &json!([1, 2])),
            "<response><item>1</item><item>2</item></response>"
        );
    }

    #[test]
    fn test_xml_invalid_name() {
        let err = encode_xml("response", &json!({"1st": true})).unwrap_err();
        assert!(matches!(err, MvcError::Xml(_)));
    }
}
