// Gestrs Config API - Activator String Parser
// Parses activator strings like "Cmd-Shift-Button4" into key combinations

use std::collections::HashSet;

use crate::chord::KeyCombination;
use crate::key::{button_from_name, key_from_name, modifier_from_alias, ChordKey};

/// Errors that can occur during activator parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActivatorParseError {
    #[error("activator string cannot be empty")]
    EmptyInput,

    #[error("activator string cannot end with hyphen")]
    TrailingHyphen,

    #[error("unknown modifier: '{0}'")]
    UnknownModifier(String),

    #[error("unknown trigger key or button: '{0}'")]
    UnknownTrigger(String),

    #[error("'{0}' is a modifier and cannot be the trigger")]
    TriggerIsModifier(String),
}

/// Parse an activator string like "Ctrl-MiddleButton" or "Cmd-Shift-Z".
///
/// Everything before the last hyphen-separated token must be a modifier
/// alias; the last token is the trigger, resolved first as a button name
/// and then as a key name. Duplicate modifiers collapse.
pub fn parse_activator_string(exp: &str) -> Result<KeyCombination, ActivatorParseError> {
    let trimmed = exp.trim();
    if trimmed.is_empty() {
        return Err(ActivatorParseError::EmptyInput);
    }
    if trimmed.ends_with('-') {
        return Err(ActivatorParseError::TrailingHyphen);
    }

    let parts: Vec<&str> = trimmed.split('-').collect();
    let trigger_str = *parts.last().expect("split yields at least one part");

    let trigger = resolve_trigger(trigger_str)?;

    let mut modifiers = Vec::new();
    let mut seen = HashSet::new();
    for modifier_str in &parts[..parts.len() - 1] {
        let modifier = modifier_from_alias(modifier_str)
            .ok_or_else(|| ActivatorParseError::UnknownModifier(modifier_str.to_string()))?;
        if seen.insert(modifier) {
            modifiers.push(modifier);
        }
    }

    Ok(KeyCombination::new(modifiers, trigger))
}

fn resolve_trigger(token: &str) -> Result<ChordKey, ActivatorParseError> {
    if modifier_from_alias(token).is_some() {
        return Err(ActivatorParseError::TriggerIsModifier(token.to_string()));
    }
    if let Some(button) = button_from_name(token) {
        return Ok(button);
    }
    if let Some(key) = key_from_name(token) {
        if key.is_modifier() {
            return Err(ActivatorParseError::TriggerIsModifier(token.to_string()));
        }
        return Ok(key);
    }
    Err(ActivatorParseError::UnknownTrigger(token.to_string()))
}
