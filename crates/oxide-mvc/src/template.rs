//! Template lookup and execution.
//!
//! Templates are addressed by application name, handler name and format:
//! `<app>/<name>.<format>`. Layouts live beside them under
//! `<app>/layouts/<layout>.<format>` and receive the rendered page as
//! `content`.

use std::fs;
use std::path::Path;

use minijinja::Environment;

use crate::error::Result;

/// A template ready to execute.
pub trait Template {
    /// Renders the template with `data` as its environment.
    ///
    /// # Errors
    ///
    /// Returns the engine error when rendering fails.
    fn execute(&self, data: &serde_json::Value) -> Result<String>;
}

/// Looks up templates by application, layout, handler name and format.
pub trait TemplateSet: Send + Sync {
    /// Returns the template for `name` in `format`, wrapped in `layout` when
    /// that layout exists for the format. `None` when the page is missing.
    fn get(
        &self,
        app: &str,
        layout: Option<&str>,
        name: &str,
        format: &str,
    ) -> Option<Box<dyn Template + '_>>;
}

/// A [`TemplateSet`] backed by minijinja.
///
/// ```
/// use oxide_mvc::{Templates, TemplateSet};
///
/// let mut templates = Templates::new();
/// templates.add("blog", "root", "html", "Hello {{ who }}").unwrap();
///
/// let page = templates.get("blog", None, "root", "html").unwrap();
/// let html = page.execute(&serde_json::json!({"who": "world"})).unwrap();
/// assert_eq!(html, "Hello world");
/// ```
#[derive(Debug)]
pub struct Templates {
    env: Environment<'static>,
}

impl Default for Templates {
    fn default() -> Self {
        Self::new()
    }
}

impl Templates {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Adds a page template.
    ///
    /// # Errors
    ///
    /// Returns the engine error when the source does not parse.
    pub fn add(
        &mut self,
        app: &str,
        name: &str,
        format: &str,
        source: impl Into<String>,
    ) -> Result<()> {
        self.env
            .add_template_owned(page_key(app, name, format), source.into())?;
        Ok(())
    }

    /// Adds a layout template.
    ///
    /// # Errors
    ///
    /// Returns the engine error when the source does not parse.
    pub fn add_layout(
        &mut self,
        app: &str,
        layout: &str,
        format: &str,
        source: impl Into<String>,
    ) -> Result<()> {
        self.env
            .add_template_owned(layout_key(app, layout, format), source.into())?;
        Ok(())
    }

    /// Loads every file below `dir`. A file at `<dir>/blog/user.html` becomes
    /// the `user` page of application `blog` in format `html`.
    ///
    /// # Errors
    ///
    /// Fails when the tree cannot be read or a template does not parse.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut templates = Self::new();
        let root = dir.as_ref();
        templates.load_tree(root, root)?;
        Ok(templates)
    }

    fn load_tree(&mut self, root: &Path, dir: &Path) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.load_tree(root, &path)?;
                continue;
            }
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let source = fs::read_to_string(&path)?;
            self.env.add_template_owned(key, source)?;
        }
        Ok(())
    }

    fn has(&self, key: &str) -> bool {
        self.env.get_template(key).is_ok()
    }
}

impl TemplateSet for Templates {
    fn get(
        &self,
        app: &str,
        layout: Option<&str>,
        name: &str,
        format: &str,
    ) -> Option<Box<dyn Template + '_>> {
        let page = page_key(app, name, format);
        if !self.has(&page) {
            return None;
        }
        let layout = layout
            .map(|layout| layout_key(app, layout, format))
            .filter(|key| self.has(key));
        Some(Box::new(Page {
            env: &self.env,
            page,
            layout,
        }))
    }
}

struct Page<'a> {
    env: &'a Environment<'static>,
    page: String,
    layout: Option<String>,
}

impl Template for Page<'_> {
    fn execute(&self, data: &serde_json::Value) -> Result<String> {
        let body = self.env.get_template(&self.page)?.render(data)?;
        let Some(layout) = &self.layout else {
            return Ok(body);
        };

        let mut ctx: Vec<(String, minijinja::Value)> = match data {
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(k, v)| (k.clone(), minijinja::Value::from_serialize(v)))
                .collect(),
            _ => Vec::new(),
        };
        ctx.push(("content".to_string(), minijinja::Value::from_safe_string(body)));
        let ctx: minijinja::Value = ctx.into_iter().collect();

        Ok(self.env.get_template(layout)?.render(ctx)?)
    }
}

fn page_key(app: &str, name: &str, format: &str) -> String {
    format!("{app}/{name}.{format}")
}

fn layout_key(app: &str, layout: &str, format: &str) -> String {
    format!("{app}/layouts/{layout}.{format}")
}
