use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CLIENTDESK_LOG";

/// Filter directives: `CLIENTDESK_LOG`, then `RUST_LOG`, then a component default.
/// Unparseable values are skipped.
pub fn filter_directives<F>(component: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    [LOG_ENV, "RUST_LOG"]
        .into_iter()
        .filter_map(|key| lookup(key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty() && EnvFilter::try_new(value).is_ok())
        .unwrap_or_else(|| format!("info,clientdesk=debug,{component}=debug"))
}

/// Logs go to stderr so the CLI's stdout carries only widget output.
pub fn init_tracing(component: &str) {
    let directives = filter_directives(component, |key| std::env::var(key).ok());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_variable_wins_over_rust_log() {
        let directives = filter_directives("cli", |key| match key {
            LOG_ENV => Some("warn".to_string()),
            "RUST_LOG" => Some("trace".to_string()),
            _ => None,
        });
        assert_eq!(directives, "warn");
    }

    #[test]
    fn blank_values_fall_through_to_default() {
        let directives = filter_directives("cli", |key| match key {
            LOG_ENV => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(directives, "info,clientdesk=debug,cli=debug");
    }
}
