use rust_embed::RustEmbed;

/// Templates compiled into the binary from `templates/`.
#[derive(RustEmbed)]
#[folder = "templates/"]
pub struct Templates;
