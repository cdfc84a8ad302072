use std::env;

const LOG_CONFIG_VARIABLE: &str = "UNIPAL_LOG_CONFIG";
const DEFAULT_LOG_CONFIG: &str = "log4rs.yaml";

#[ctor::ctor]
fn init() {
    let config_path =
        env::var(LOG_CONFIG_VARIABLE).unwrap_or_else(|_| DEFAULT_LOG_CONFIG.to_owned());
    if let Err(e) = log4rs::init_file(&config_path, Default::default()) {
        eprintln!("Logging disabled, unable to load {}: {}", config_path, e);
    }
}

fn hex_bytes(bytes: &[u8]) -> Vec<String> {
    bytes.iter().map(|byte| format!("{:02X}", byte)).collect()
}

pub fn log_block(name: &str, content: &[u8]) {
    log::debug!("{} ({} bytes)\n{:?}", name, content.len(), hex_bytes(content));
}
