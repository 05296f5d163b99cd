//! User-Agent selection
//!
//! Either a fixed agent string from configuration, or one rotated per
//! request from a small list of current desktop browser agents.

/// Desktop browser agents used when no fixed agent is configured
const BUILTIN_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36 Edg/135.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
];

/// Picks the User-Agent header value for each request
#[derive(Debug, Clone)]
pub struct AgentPicker {
    fixed: Option<String>,
}

impl AgentPicker {
    /// A fixed agent is used verbatim; `None` rotates the built-in list
    pub fn new(fixed: Option<String>) -> Self {
        Self { fixed }
    }

    /// Returns the agent string for one request
    pub fn choose(&self) -> &str {
        match &self.fixed {
            Some(agent) => agent,
            None => BUILTIN_AGENTS[fastrand::usize(..BUILTIN_AGENTS.len())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_agent_is_used_verbatim() {
        let picker = AgentPicker::new(Some("TestAgent/1.0".to_string()));
        for _ in 0..10 {
            assert_eq!(picker.choose(), "TestAgent/1.0");
        }
    }

    #[test]
    fn test_rotation_stays_within_builtin_list() {
        let picker = AgentPicker::new(None);
        for _ in 0..50 {
            let agent = picker.choose();
            assert!(BUILTIN_AGENTS.contains(&agent));
        }
    }
}
