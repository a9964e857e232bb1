//! Markup rendering for the host adapters.
//!
//! Templates are named `*.html`, so minijinja HTML-escapes every value
//! unless it is passed as a safe string.

use embedchat_core::error::{EmbedchatError, Result};
use embedchat_core::message::Message;
use embedchat_core::widget::WidgetSnapshot;
use minijinja::{Environment, HtmlEscape, Value, context};

/// Id of the script tag the public widget is loaded through.
pub const SCRIPT_ID: &str = "chatbot-widget-script";
/// Id of the element the public widget injects into the host page.
pub const ROOT_ID: &str = "chatbot-widget-root";
/// Attribute carrying the client id on the script tag.
pub const CLIENT_ID_ATTR: &str = "data-client-id";

const SNIPPET_TEMPLATE: &str = include_str!("../templates/snippet.html");
const MESSAGES_TEMPLATE: &str = include_str!("../templates/messages.html");
const WIDGET_TEMPLATE: &str = include_str!("../templates/widget.html");

fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    for (name, source) in [
        ("snippet.html", SNIPPET_TEMPLATE),
        ("messages.html", MESSAGES_TEMPLATE),
        ("widget.html", WIDGET_TEMPLATE),
    ] {
        env.add_template(name, source).map_err(render_error)?;
    }
    Ok(env)
}

/// A URL for a quoted attribute.
///
/// HTML escaping turns `/` into `&#x2f;`; slashes are harmless inside a
/// quoted attribute, so they are kept readable.
fn attribute_url(url: &str) -> Value {
    Value::from_safe_string(HtmlEscape(url).to_string().replace("&#x2f;", "/"))
}

fn render(name: &str, ctx: Value) -> Result<String> {
    let env = environment()?;
    let template = env.get_template(name).map_err(render_error)?;
    template.render(ctx).map_err(render_error)
}

fn render_error(err: minijinja::Error) -> EmbedchatError {
    EmbedchatError::render(err.to_string())
}

/// Renders the embed script tag for `client_id`.
pub fn embed_snippet(client_id: &str, script_src: &str) -> Result<String> {
    render(
        "snippet.html",
        context! {
            script_src => attribute_url(script_src),
            script_id => SCRIPT_ID,
            client_id => client_id,
        },
    )
}

/// Renders the conversation messages, escaped.
pub fn render_messages(messages: &[Message]) -> Result<String> {
    render("messages.html", context! { messages => messages })
}

/// Renders the full self-contained widget markup for a snapshot.
pub fn render_widget(snapshot: &WidgetSnapshot, title: &str) -> Result<String> {
    let log = render_messages(&snapshot.messages)?;
    render(
        "widget.html",
        context! {
            root_id => ROOT_ID,
            title => title,
            phase => snapshot.phase,
            affordances => snapshot.affordances,
            log => Value::from_safe_string(log),
        },
    )
}
