/// Resolves user-facing text by message id.
pub trait MessageCatalog: Send + Sync {
    /// Returns the text for `id`, falling back to `default`, with `{{.Name}}`
    /// placeholders replaced from `args`.
    fn localize(&self, id: &str, default: &str, args: &[(&str, String)]) -> String;
}

/// Catalog without translations: always renders the default text.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCatalog;

impl MessageCatalog for DefaultCatalog {
    fn localize(&self, _id: &str, default: &str, args: &[(&str, String)]) -> String {
        render_template(default, args)
    }
}

pub fn render_template(template: &str, args: &[(&str, String)]) -> String {
    args.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{{.{name}}}}}"), value)
    })
}
