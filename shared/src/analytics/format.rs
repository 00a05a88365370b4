//! Display formatting shared by stat cards, tables and detail views.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction badge shown next to a change figure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    Positive,
    Negative,
    Neutral,
}

impl ChangeDirection {
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            ChangeDirection::Positive
        } else if change < 0.0 {
            ChangeDirection::Negative
        } else {
            ChangeDirection::Neutral
        }
    }
}

/// Stat card value: numbers are animated, text is shown verbatim
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Number(n) if n.fract() == 0.0 => f.write_str(&format_thousands(*n as i64)),
            StatValue::Number(n) => write!(f, "{:.1}", n),
            StatValue::Text(s) => f.write_str(s),
        }
    }
}

/// Scalar handed to the rendering layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatCard {
    pub label: String,
    pub value: StatValue,
    pub suffix: String,
    pub change: Option<String>,
    pub change_direction: ChangeDirection,
}

impl StatCard {
    pub fn number(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value: StatValue::Number(value),
            suffix: String::new(),
            change: None,
            change_direction: ChangeDirection::Neutral,
        }
    }

    pub fn text(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: StatValue::Text(value.into()),
            suffix: String::new(),
            change: None,
            change_direction: ChangeDirection::Neutral,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Attaches a percentage change; the direction follows its sign
    pub fn with_change(mut self, change_pct: f64, caption: &str) -> Self {
        let sign = if change_pct > 0.0 { "+" } else { "" };
        self.change = Some(format!("{}{}% {}", sign, change_pct, caption).trim_end().to_string());
        self.change_direction = ChangeDirection::from_change(change_pct);
        self
    }

    /// Numeric value, when the card is animatable
    pub fn numeric_value(&self) -> Option<f64> {
        match &self.value {
            StatValue::Number(n) => Some(*n),
            StatValue::Text(_) => None,
        }
    }

    pub fn display(&self) -> String {
        format!("{}{}", self.value, self.suffix)
    }
}

/// Rounds half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Milliseconds to whole seconds, `round(ms / 1000)`
pub fn ms_to_seconds(ms: f64) -> f64 {
    round_to(ms / 1000.0, 0)
}

/// Fraction (0..1) to an integer percentage, `round(rate * 100)`
pub fn rate_to_percent(rate: f64) -> f64 {
    round_to(rate * 100.0, 0)
}

/// Fraction (0..1) to a percentage with one decimal place
pub fn rate_to_percent_1dp(rate: f64) -> f64 {
    round_to(rate * 100.0, 1)
}

/// Percentage with a fixed number of decimals, e.g. `62.5%`
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, if value.is_finite() { value } else { 0.0 })
}

/// Integer with `,` thousands separators
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0 {
        out.insert(0, '-');
    }
    out
}
