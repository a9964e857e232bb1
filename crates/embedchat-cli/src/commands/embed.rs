use anyhow::{Context, Result};
use embedchat_application::{EmbedHost, HtmlPage, Mount};
use embedchat_infrastructure::Settings;
use embedchat_interaction::HttpTransport;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub async fn run(settings: Settings, page_path: &Path, output: Option<PathBuf>) -> Result<()> {
    let html = std::fs::read_to_string(page_path)
        .with_context(|| format!("failed to read {}", page_path.display()))?;
    let mut page = HtmlPage::new(html);

    let transport = HttpTransport::new(settings.endpoint.clone(), settings.request_timeout())?;
    let identity = super::identity_store(&settings, None)?;
    let host = EmbedHost::new(settings, Arc::new(transport), Arc::new(identity));

    match host.mount(&mut page).await? {
        Mount::Mounted(_) => {}
        Mount::AlreadyMounted => eprintln!("page already contains the widget, left unchanged"),
        Mount::Inert => eprintln!("no data-client-id on the embed script tag, left unchanged"),
    }

    match output {
        Some(path) => std::fs::write(&path, page.into_html())
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", page.as_str()),
    }
    Ok(())
}
