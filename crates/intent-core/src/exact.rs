//! Exact-match stage: explicit `/command args` invocation.
//!
//! Explicit invocation is resolved straight against the full registry. The
//! lifecycle filter never sees these inputs.

use crate::command::CommandMetadata;
use crate::config::ExactConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExactMatch<'a> {
    /// Index of the command in registration order.
    pub index: usize,
    /// Text following the command name, trimmed.
    pub trailing: &'a str,
}

#[derive(Debug, Clone)]
pub struct ExactMatcher {
    prefix: String,
    namespace: Option<String>,
}

impl ExactMatcher {
    pub fn new(config: &ExactConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            namespace: config.namespace.clone().filter(|n| !n.is_empty()),
        }
    }

    /// Recognize `<prefix>[namespace]<name>[ <trailing>]` where `<name>` is a
    /// registered command. Name comparison ignores ASCII case.
    pub fn find<'a>(&self, input: &'a str, commands: &[CommandMetadata]) -> Option<ExactMatch<'a>> {
        let rest = input.trim_start().strip_prefix(self.prefix.as_str())?;
        let rest = match &self.namespace {
            Some(ns) => rest.strip_prefix(ns.as_str()).unwrap_or(rest),
            None => rest,
        };
        let (token, trailing) = match rest.find(char::is_whitespace) {
            Some(i) => (&rest[..i], rest[i..].trim()),
            None => (rest, ""),
        };
        if token.is_empty() {
            return None;
        }
        commands
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(token))
            .map(|index| ExactMatch { index, trailing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Vec<CommandMetadata> {
        vec![
            CommandMetadata::new("plan-phase", "Plan a phase", ""),
            CommandMetadata::new("progress", "Show progress", ""),
        ]
    }

    fn matcher(namespace: Option<&str>) -> ExactMatcher {
        ExactMatcher::new(&ExactConfig {
            prefix: "/".to_string(),
            namespace: namespace.map(str::to_string),
        })
    }

    #[test]
    fn matches_prefix_and_name() {
        let cmds = registry();
        let m = matcher(None).find("/plan-phase 3 --research", &cmds).unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.trailing, "3 --research");
    }

    #[test]
    fn bare_command_has_empty_trailing() {
        let cmds = registry();
        let m = matcher(None).find("  /progress  ", &cmds).unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.trailing, "");
    }

    #[test]
    fn namespace_is_optional() {
        let cmds = registry();
        let m = matcher(Some("gsd:"));
        assert_eq!(m.find("/gsd:progress", &cmds).unwrap().index, 1);
        assert_eq!(m.find("/progress", &cmds).unwrap().index, 1);
    }

    #[test]
    fn case_insensitive_name() {
        let cmds = registry();
        assert!(matcher(None).find("/Plan-Phase", &cmds).is_some());
    }

    #[test]
    fn unknown_or_unprefixed_is_none() {
        let cmds = registry();
        let m = matcher(None);
        assert!(m.find("/deploy now", &cmds).is_none());
        assert!(m.find("plan-phase 3", &cmds).is_none());
        assert!(m.find("/", &cmds).is_none());
        assert!(m.find("/plan-phase-extra", &cmds).is_none());
    }
}
