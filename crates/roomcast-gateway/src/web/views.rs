//! HTML views rendered from the bundled templates.
//!
//! Template names end in `.html`, so minijinja auto-escapes every
//! interpolated value.

use std::time::UNIX_EPOCH;

use minijinja::{context, Environment};

use roomcast_core::error::{Result, RoomcastError};

use crate::realtime::core::Session;

const TEMPLATES: [(&str, &str); 5] = [
    ("layout.html", include_str!("../../templates/layout.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("session.html", include_str!("../../templates/session.html")),
    ("404.html", include_str!("../../templates/404.html")),
    ("500.html", include_str!("../../templates/500.html")),
];

fn template_err(e: minijinja::Error) -> RoomcastError {
    RoomcastError::Internal(format!("template: {e}"))
}

pub struct Views {
    env: Environment<'static>,
}

impl Views {
    /// Compile every template up front so syntax errors surface at startup.
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source).map_err(template_err)?;
        }
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        self.env
            .get_template(name)
            .and_then(|t| t.render(ctx))
            .map_err(template_err)
    }

    pub fn home(&self) -> Result<String> {
        self.render("index.html", context! {})
    }

    pub fn session(&self, session: &Session) -> Result<String> {
        let created_at = session
            .created_at()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.render(
            "session.html",
            context! {
                token => session.token().to_string(),
                display_name => session.display_name(),
                created_at => created_at,
            },
        )
    }

    pub fn not_found(&self) -> Result<String> {
        self.render("404.html", context! {})
    }

    pub fn internal_error(&self) -> Result<String> {
        self.render("500.html", context! {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HubConfig;
    use crate::realtime::core::SessionRegistry;

    fn session(name: &str) -> std::sync::Arc<Session> {
        let reg = SessionRegistry::new(HubConfig::default());
        let token = reg.create(name);
        reg.get(&token).unwrap()
    }

    #[test]
    fn session_page_embeds_token_and_escaped_name() {
        let views = Views::new().unwrap();
        let s = session("<script>x</script>");
        let html = views.session(&s).unwrap();

        assert!(html.contains(&format!("data-token=\"{}\"", s.token())));
        assert!(html.contains("&lt;script&gt;"), "{html}");
        assert!(!html.contains("<script>x"), "{html}");
        assert!(html.contains("\"/ws/\""));
    }

    #[test]
    fn session_page_carries_creation_time() {
        let views = Views::new().unwrap();
        let s = session("Alice");
        let secs = s.created_at().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let html = views.session(&s).unwrap();
        assert!(html.contains(&format!("data-unix=\"{secs}\"")), "{html}");
    }

    #[test]
    fn home_posts_to_create() {
        let html = Views::new().unwrap().home().unwrap();
        assert!(html.contains("action=\"/session/create\""), "{html}");
    }

    #[test]
    fn error_pages_render_inside_the_layout() {
        let views = Views::new().unwrap();
        let nf = views.not_found().unwrap();
        let ie = views.internal_error().unwrap();
        assert!(nf.contains("<title>Not found</title>"), "{nf}");
        assert!(ie.contains("<h1>Something went wrong</h1>"), "{ie}");
        assert!(ie.starts_with("<!doctype html>"));
    }
}
