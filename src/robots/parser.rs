//! Robots.txt rule evaluation
//!
//! Allow/Disallow matching is delegated to the robotstxt crate. Crawl-delay is
//! not part of the matcher, so it is read from the agent groups directly.

use robotstxt::DefaultMatcher;

/// Rules from one host's robots.txt
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    /// Raw robots.txt body; `None` means no restrictions
    content: Option<String>,
}

impl ParsedRobots {
    /// Wraps a fetched robots.txt body
    pub fn from_content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
        }
    }

    /// Rules that allow everything
    ///
    /// Used when robots.txt is unavailable or checking is turned off.
    pub fn allow_all() -> Self {
        Self { content: None }
    }

    fn body(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Checks whether `agent` may fetch `url`
    ///
    /// `url` may be absolute or a bare path such as `/page.html`.
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        match self.body() {
            Some(body) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(body, agent, url)
            }
            None => true,
        }
    }

    /// Crawl-delay in seconds that applies to `agent`
    ///
    /// A group naming the agent wins over the `*` group. Agent names match
    /// case-insensitively, and a group matches when its name is contained in
    /// the agent string.
    pub fn crawl_delay(&self, agent: &str) -> Option<f64> {
        let body = self.body()?;
        let agent = agent.to_lowercase();

        let mut group: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut specific = None;
        let mut wildcard = None;

        for line in body.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group
                    if in_rules {
                        group.clear();
                        in_rules = false;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if !delay.is_finite() || delay < 0.0 {
                        continue;
                    }
                    if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                        specific.get_or_insert(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        wildcard.get_or_insert(delay);
                    }
                }
                _ => in_rules = true,
            }
        }

        specific.or(wildcard)
    }
}
