use anyhow::Result;
use embedchat_application::embed_snippet;
use embedchat_infrastructure::Settings;

pub fn run(settings: &Settings, script_src: Option<String>) -> Result<()> {
    let config = settings.widget_config()?;
    let src = script_src.unwrap_or_else(|| settings.script_src(&config));
    println!("{}", embed_snippet(config.client_id().as_str(), &src)?);
    Ok(())
}
