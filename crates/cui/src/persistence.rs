use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One scripted step: an action name, an optional target, then a pause on
/// the virtual clock before the next step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScriptAction {
    pub action: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub wait_ms: u64,
}

#[derive(Debug, Clone)]
pub struct AutoPerformScript {
    pub locale: Option<String>,
    pub seed: Option<u64>,
    pub actions: Vec<ScriptAction>,
}

#[derive(Debug, Clone, Deserialize)]
struct AutoPerformScriptFile {
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    actions: Vec<ScriptAction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AutoPerformPayload {
    Script(AutoPerformScriptFile),
    Actions(Vec<ScriptAction>),
}

pub fn load_auto_perform_file(path: &Path) -> Result<AutoPerformScript, String> {
    let body = fs::read_to_string(path).map_err(|err| err.to_string())?;
    parse_auto_perform(&body)
}

pub fn parse_auto_perform(body: &str) -> Result<AutoPerformScript, String> {
    let payload: AutoPerformPayload = serde_json::from_str(body).map_err(|err| err.to_string())?;
    Ok(match payload {
        AutoPerformPayload::Script(script) => AutoPerformScript {
            locale: script.locale,
            seed: script.seed,
            actions: script.actions,
        },
        AutoPerformPayload::Actions(actions) => AutoPerformScript {
            locale: None,
            seed: None,
            actions,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_script() {
        let script = parse_auto_perform(
            r#"{"locale":"zh_CN","seed":7,"actions":[{"action":"enter","wait_ms":2000},{"action":"select","target":"002"}]}"#,
        )
        .expect("script");
        assert_eq!(script.locale.as_deref(), Some("zh_CN"));
        assert_eq!(script.seed, Some(7));
        assert_eq!(script.actions.len(), 2);
        assert_eq!(script.actions[0].wait_ms, 2000);
        assert_eq!(script.actions[1].target.as_deref(), Some("002"));
    }

    #[test]
    fn parses_bare_action_list() {
        let script = parse_auto_perform(r#"[{"action":"start"},{"action":"stop"}]"#)
            .expect("actions");
        assert!(script.seed.is_none());
        assert_eq!(script.actions[1].action, "stop");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_auto_perform("[1, 2]").is_err());
    }
}
