use std::collections::HashMap;

/// Read-only view of the variables a server hands to the application
/// (`HTTP_HOST`, `REQUEST_URI`, `SCRIPT_NAME`, ...).
///
/// Missing variables read as the empty string.
pub trait ServerEnvironment {
    fn get(&self, name: &str) -> String;
}

/// The variables of the current process, as a CGI program sees them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl ServerEnvironment for ProcessEnvironment {
    fn get(&self, name: &str) -> String {
        std::env::var(name).unwrap_or_default()
    }
}

impl ServerEnvironment for HashMap<String, String> {
    fn get(&self, name: &str) -> String {
        HashMap::get(self, name).cloned().unwrap_or_default()
    }
}

impl ServerEnvironment for HashMap<&str, &str> {
    fn get(&self, name: &str) -> String {
        HashMap::get(self, name)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_reads_as_empty() {
        let env = HashMap::from([("HTTP_HOST", "example.com")]);
        assert_eq!(ServerEnvironment::get(&env, "HTTP_HOST"), "example.com");
        assert_eq!(ServerEnvironment::get(&env, "REQUEST_URI"), "");

        let owned: HashMap<String, String> = HashMap::new();
        assert_eq!(ServerEnvironment::get(&owned, "HTTPS"), "");
    }
}
