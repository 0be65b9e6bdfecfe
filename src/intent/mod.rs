// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mapping recognized phrases to actions.
//!
//! Recognition output is matched against an ordered table of substrings; the
//! first rule whose substring occurs in the phrase wins. Order encodes
//! precedence, so the table is a slice and never a map.
//!
//! The substrings are tuned to what the recognizer actually returns, not to
//! correct English: "red on" usually comes back as "read on", and "off" is
//! often cut to "of". Only some rules carry that tolerance (`green of`,
//! `relay of`, but `red off` and `white off`). Keep them as they are.
//!
//! # Examples
//!
//! ```
//! use relaylink::intent::IntentRouter;
//! use relaylink::types::Action;
//!
//! let router = IntentRouter::new();
//! assert_eq!(router.route("Please read on"), Some(Action::RedOn));
//! assert_eq!(router.route("all lights off"), Some(Action::AllOff));
//! assert_eq!(router.route("open the pod bay doors"), None);
//! ```

mod activation;

pub use activation::ActivationGate;

use crate::types::Action;

/// A single routing rule: if `pattern` occurs in the phrase, pick `action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Substring to look for, compared case-insensitively.
    pub pattern: &'static str,
    /// Action selected on match.
    pub action: Action,
}

const fn rule(pattern: &'static str, action: Action) -> Rule {
    Rule { pattern, action }
}

/// The default rule table, highest precedence first.
pub const DEFAULT_RULES: &[Rule] = &[
    rule("read on", Action::RedOn),
    rule("red off", Action::RedOff),
    rule("green on", Action::GreenOn),
    rule("green of", Action::GreenOff),
    rule("white on", Action::WhiteOn),
    rule("white off", Action::WhiteOff),
    rule("lights on", Action::AllOn),
    rule("lights off", Action::AllOff),
    rule("temperature", Action::GetTemperature),
    rule("gaming", Action::GamingMode),
    rule("sleep", Action::SleepMode),
    rule("relay on", Action::RelayOn),
    rule("relay of", Action::RelayOff),
    rule("automatic mode", Action::AutomaticModeToggle),
    // Spelled-out forms. Nothing above matches these phrases, so they only
    // turn an unrecognized command into a recognized one.
    rule("red light on", Action::RedOn),
    rule("red light off", Action::RedOff),
    rule("green light on", Action::GreenOn),
    rule("green light off", Action::GreenOff),
    rule("white light on", Action::WhiteOn),
    rule("white light off", Action::WhiteOff),
];

/// Ordered substring router.
#[derive(Debug, Clone)]
pub struct IntentRouter {
    rules: Vec<Rule>,
    // Lowercased `rules[i].pattern`
    patterns: Vec<String>,
}

impl IntentRouter {
    /// Creates a router with [`DEFAULT_RULES`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_rules(DEFAULT_RULES.to_vec())
    }

    /// Creates a router with a custom table. Patterns match regardless of
    /// case.
    #[must_use]
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        let patterns = rules.iter().map(|r| r.pattern.to_lowercase()).collect();
        Self { rules, patterns }
    }

    /// Returns the rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Routes a recognized phrase to an action.
    ///
    /// Returns `None` when no rule matches.
    #[must_use]
    pub fn route(&self, phrase: &str) -> Option<Action> {
        let phrase = phrase.to_lowercase();
        let (matched, _) = self
            .rules
            .iter()
            .zip(&self.patterns)
            .find(|(_, pattern)| phrase.contains(pattern.as_str()))?;
        tracing::debug!(phrase = %phrase, pattern = matched.pattern, action = %matched.action, "Routed phrase");
        Some(matched.action)
    }
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(phrase: &str) -> Option<Action> {
        IntentRouter::new().route(phrase)
    }

    #[test]
    fn recognizer_spellings() {
        assert_eq!(route("read on"), Some(Action::RedOn));
        assert_eq!(route("red off"), Some(Action::RedOff));
        assert_eq!(route("green on"), Some(Action::GreenOn));
        assert_eq!(route("green off"), Some(Action::GreenOff));
        assert_eq!(route("white on"), Some(Action::WhiteOn));
        assert_eq!(route("white off"), Some(Action::WhiteOff));
        assert_eq!(route("relay on"), Some(Action::RelayOn));
        assert_eq!(route("relay off"), Some(Action::RelayOff));
    }

    #[test]
    fn truncated_off_tolerance_is_uneven() {
        assert_eq!(route("green of"), Some(Action::GreenOff));
        assert_eq!(route("relay of"), Some(Action::RelayOff));
        // No such tolerance for red and white
        assert_eq!(route("red of"), None);
        assert_eq!(route("white of"), None);
    }

    #[test]
    fn plain_red_on_is_not_recognized() {
        assert_eq!(route("red on"), None);
    }

    #[test]
    fn spelled_out_light_commands() {
        assert_eq!(route("turn the red light on please"), Some(Action::RedOn));
        assert_eq!(route("red light off"), Some(Action::RedOff));
        assert_eq!(route("green light on"), Some(Action::GreenOn));
        assert_eq!(route("white light off"), Some(Action::WhiteOff));
    }

    #[test]
    fn all_lights() {
        assert_eq!(route("turn all lights off now"), Some(Action::AllOff));
        assert_eq!(route("lights on"), Some(Action::AllOn));
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(route("What's the TEMPERATURE"), Some(Action::GetTemperature));
        assert_eq!(route("Automatic Mode"), Some(Action::AutomaticModeToggle));
    }

    #[test]
    fn earlier_rule_wins() {
        // Specific color rules sit above the generic lights rules
        assert_eq!(route("white off and lights on"), Some(Action::WhiteOff));
        assert_eq!(route("lights on and white off"), Some(Action::WhiteOff));
        // "temperature" precedes "sleep"
        assert_eq!(route("sleep if the temperature is low"), Some(Action::GetTemperature));
    }

    #[test]
    fn original_rules_come_first_and_in_order() {
        let patterns: Vec<_> = DEFAULT_RULES.iter().take(14).map(|r| r.pattern).collect();
        assert_eq!(
            patterns,
            [
                "read on",
                "red off",
                "green on",
                "green of",
                "white on",
                "white off",
                "lights on",
                "lights off",
                "temperature",
                "gaming",
                "sleep",
                "relay on",
                "relay of",
                "automatic mode",
            ]
        );
    }

    #[test]
    fn spelled_out_rules_never_shadow_earlier_ones() {
        let router = IntentRouter::new();
        for (i, late) in DEFAULT_RULES.iter().enumerate().skip(14) {
            let winner = router.route(late.pattern);
            assert_eq!(winner, Some(late.action), "rule {i} is shadowed");
            assert!(
                DEFAULT_RULES[..14]
                    .iter()
                    .all(|early| !late.pattern.contains(early.pattern)),
                "rule {i} overlaps an earlier rule"
            );
        }
    }

    #[test]
    fn custom_table() {
        let router = IntentRouter::with_rules(vec![rule("party", Action::GamingMode)]);
        assert_eq!(router.route("party time"), Some(Action::GamingMode));
        assert_eq!(router.route("read on"), None);
    }

    #[test]
    fn uppercase_patterns_still_match() {
        let router = IntentRouter::with_rules(vec![rule("Party Time", Action::GamingMode)]);
        assert_eq!(router.route("it's party time"), Some(Action::GamingMode));
        assert_eq!(router.rules()[0].pattern, "Party Time");
    }
}
