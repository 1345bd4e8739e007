//! Feedback tiers and the repeat-suppression gate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default number of frames a spoken message blocks repeats
pub const DEFAULT_COOLDOWN_TICKS: u32 = 30;

/// Spoken when a frame reaches the excellent tier
pub const PERFECT_FORM_CUE: &str = "Perfect form";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackTier {
    Excellent,
    Good,
    Okay,
    FixForm,
    NoBody,
}

impl FeedbackTier {
    pub fn label(&self) -> &'static str {
        match self {
            FeedbackTier::Excellent => "EXCELLENT FORM",
            FeedbackTier::Good => "GOOD FORM",
            FeedbackTier::Okay => "OKAY FORM",
            FeedbackTier::FixForm => "FIX FORM",
            FeedbackTier::NoBody => "NO BODY DETECTED",
        }
    }
}

impl fmt::Display for FeedbackTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower bounds of each tier on the 0-100 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub excellent: f64,
    pub good: f64,
    pub okay: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            excellent: 90.0,
            good: 75.0,
            okay: 60.0,
        }
    }
}

impl TierThresholds {
    pub fn classify(&self, score: f64) -> FeedbackTier {
        if score >= self.excellent {
            FeedbackTier::Excellent
        } else if score >= self.good {
            FeedbackTier::Good
        } else if score >= self.okay {
            FeedbackTier::Okay
        } else {
            FeedbackTier::FixForm
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.excellent >= self.good && self.good >= self.okay && self.okay >= 0.0
    }
}

/// Suppresses repeats of the last emitted message for a number of ticks.
///
/// A message passes when it differs from the last emitted one or when the
/// cooldown has run out. Every emission restarts the cooldown.
#[derive(Debug, Clone)]
pub struct CooldownGate {
    cooldown: u32,
    remaining: u32,
    last: Option<String>,
}

impl CooldownGate {
    pub fn new(cooldown: u32) -> Self {
        Self {
            cooldown,
            remaining: 0,
            last: None,
        }
    }

    /// Returns true and records `message` if it may be emitted now
    pub fn admit(&mut self, message: &str) -> bool {
        let changed = self.last.as_deref() != Some(message);
        if !changed && self.remaining > 0 {
            return false;
        }
        self.last = Some(message.to_string());
        self.remaining = self.cooldown;
        true
    }

    /// Advance one frame
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_TICKS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        let t = TierThresholds::default();
        assert_eq!(t.classify(100.0), FeedbackTier::Excellent);
        assert_eq!(t.classify(90.0), FeedbackTier::Excellent);
        assert_eq!(t.classify(89.9), FeedbackTier::Good);
        assert_eq!(t.classify(75.0), FeedbackTier::Good);
        assert_eq!(t.classify(60.0), FeedbackTier::Okay);
        assert_eq!(t.classify(59.9), FeedbackTier::FixForm);
        assert_eq!(t.classify(0.0), FeedbackTier::FixForm);
    }

    #[test]
    fn test_repeat_suppressed_until_cooldown_expires() {
        let mut gate = CooldownGate::new(3);
        assert!(gate.admit("GOOD FORM"));
        gate.tick();
        assert!(!gate.admit("GOOD FORM"));
        gate.tick();
        gate.tick();
        assert_eq!(gate.remaining(), 0);
        assert!(gate.admit("GOOD FORM"));
    }

    #[test]
    fn test_changed_message_passes_immediately() {
        let mut gate = CooldownGate::new(30);
        assert!(gate.admit("GOOD FORM"));
        assert!(gate.admit("FIX FORM"));
        assert_eq!(gate.last(), Some("FIX FORM"));
        assert_eq!(gate.remaining(), 30);
        assert!(!gate.admit("FIX FORM"));
    }

    #[test]
    fn test_threshold_ordering() {
        assert!(TierThresholds::default().is_ordered());
        let inverted = TierThresholds {
            excellent: 50.0,
            ..Default::default()
        };
        assert!(!inverted.is_ordered());
    }
}
