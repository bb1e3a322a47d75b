use crate::error::CliError;
use crate::templates::TemplateStore;

pub fn handle_templates(store: &TemplateStore) -> Result<(), CliError> {
    let summaries = store.list()?;

    println!("Available templates:");
    println!();
    for summary in summaries {
        let origin = if summary.builtin { "builtin" } else { "user" };
        let aliases = if summary.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", summary.aliases.join(", "))
        };
        println!(
            "  {:<12} [{origin}] {}{aliases}",
            summary.id, summary.description
        );
    }
    Ok(())
}
