use anyhow::Result;
use embedchat_infrastructure::Settings;

pub fn run(settings: &Settings, origin: Option<String>) -> Result<()> {
    let identity = super::identity_store(settings, origin.as_deref())?;
    let token = identity.resolve()?;
    println!("{token}");
    Ok(())
}
