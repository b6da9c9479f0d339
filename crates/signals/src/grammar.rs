use std::collections::HashMap;
use std::str::FromStr;

use common::models::{Direction, Signal, SignalDraft, SignalField};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::SignalError;

const EXCERPT_CHARS: usize = 100;

static LONG_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bLONG\s+SIGNAL\s*[-–—]\s*([A-Z]+)\b").expect("Invalid LONG marker regex")
});

static SHORT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bSHORT\s+SIGNAL\s*[-–—]\s*([A-Z]+)\b").expect("Invalid SHORT marker regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldValue {
    Decimal(Decimal),
    Integer(i64),
}

/// One labeled line of a signal: where to find it, how to read it, whether it must be there.
struct FieldRule {
    field: SignalField,
    pattern: Regex,
    parse: fn(&str) -> Option<FieldValue>,
    required: bool,
}

impl FieldRule {
    fn new(
        field: SignalField,
        pattern: &str,
        parse: fn(&str) -> Option<FieldValue>,
        required: bool,
    ) -> Self {
        Self {
            field,
            pattern: Regex::new(pattern).expect("Invalid field regex"),
            parse,
            required,
        }
    }
}

static FIELD_GRAMMAR: Lazy<Vec<FieldRule>> = Lazy::new(|| {
    vec![
        FieldRule::new(SignalField::Entry, r"(?i)\bentry\s*:\s*(\S+)", decimal, true),
        FieldRule::new(SignalField::TakeProfit, r"(?i)\bTP\s*:\s*(\S+)", decimal, true),
        FieldRule::new(SignalField::StopLoss, r"(?i)\bSL\s*:\s*(\S+)", decimal, false),
        FieldRule::new(
            SignalField::Leverage,
            r"(?i)\bleverage\s*:\s*(\S+?)\s*x\b",
            integer,
            true,
        ),
        FieldRule::new(SignalField::Margin, r"(?i)\bmargin\s*:\s*\$\s*(\S+)", decimal, true),
    ]
});

/// Reads the number at the start of a token, dropping decoration stuck to its end
/// (`62000🎯`, `60000,`).
fn decimal(raw: &str) -> Option<FieldValue> {
    let number = raw.trim_end_matches(|c: char| !c.is_ascii_digit());
    Decimal::from_str(number).ok().map(FieldValue::Decimal)
}

/// Any run of digits is a number, even one too large for `i64`: it saturates so
/// the range check still rejects it as out of range.
fn integer(raw: &str) -> Option<FieldValue> {
    let negative = raw.starts_with('-');
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let saturated = if negative { i64::MIN } else { i64::MAX };
    Some(FieldValue::Integer(raw.parse().unwrap_or(saturated)))
}

/// Turns one chat message into a validated [`Signal`].
///
/// `NotASignal` means the message has no LONG/SHORT marker and should be skipped
/// silently. Every other error is a message that looked like a signal but cannot
/// be traded.
pub fn parse(text: &str) -> Result<Signal, SignalError> {
    let Some((direction, symbol)) = detect_marker(text) else {
        debug!("No signal marker in message");
        return Err(SignalError::NotASignal);
    };

    let mut values = HashMap::new();
    let mut missing = Vec::new();
    let mut malformed = None;

    for rule in FIELD_GRAMMAR.iter() {
        let Some(raw) = rule.pattern.captures(text).and_then(|c| c.get(1)) else {
            if rule.required {
                missing.push(rule.field);
            }
            continue;
        };

        match (rule.parse)(raw.as_str()) {
            Some(value) => {
                values.insert(rule.field, value);
            }
            None if !rule.required => {
                warn!("Ignoring unreadable {} value {:?}", rule.field, raw.as_str());
            }
            None => {
                malformed.get_or_insert(SignalError::Malformed {
                    field: rule.field,
                    raw: raw.as_str().to_string(),
                });
            }
        }
    }

    if !missing.is_empty() {
        let excerpt = excerpt(text);
        warn!("Incomplete {} signal for {}: {:?}", direction, symbol, excerpt);
        return Err(SignalError::Incomplete { missing, excerpt });
    }
    if let Some(err) = malformed {
        warn!("Rejected {} signal for {}: {}", direction, symbol, err);
        return Err(err);
    }

    let draft = SignalDraft {
        direction,
        symbol,
        entry: decimal_of(&values, SignalField::Entry)?,
        take_profit: decimal_of(&values, SignalField::TakeProfit)?,
        stop_loss: decimal_of(&values, SignalField::StopLoss).ok(),
        leverage: integer_of(&values, SignalField::Leverage)?,
        margin: decimal_of(&values, SignalField::Margin)?,
    };

    let signal = Signal::try_from_draft(draft).map_err(|e| {
        warn!("Invalid signal: {}", e);
        SignalError::from(e)
    })?;

    info!(
        "Parsed {} signal for {}: Entry {}, TP {}, Leverage {}x, Margin ${}",
        signal.direction(),
        signal.symbol(),
        signal.entry(),
        signal.take_profit(),
        signal.leverage(),
        signal.margin()
    );
    if let Some(sl) = signal.stop_loss() {
        info!("SL {} parsed but will NOT be used for trading", sl);
    }

    Ok(signal)
}

/// Canonical text form of a signal. Parsing the result yields an equal signal.
pub fn render(signal: &Signal) -> String {
    let marker = match signal.direction() {
        Direction::Long => "🟢 LONG",
        Direction::Short => "🔴 SHORT",
    };

    let mut lines = vec![
        format!("{} SIGNAL - {}", marker, signal.symbol()),
        format!("Entry: {}", signal.entry()),
        format!("TP: {}", signal.take_profit()),
    ];
    if let Some(sl) = signal.stop_loss() {
        lines.push(format!("SL: {}", sl));
    }
    lines.push(format!("Leverage: {}x", signal.leverage()));
    lines.push(format!("Margin: ${}", signal.margin()));
    lines.join("\n")
}

/// Finds the earliest LONG or SHORT marker and the symbol bound to it.
fn detect_marker(text: &str) -> Option<(Direction, String)> {
    let long = LONG_MARKER.captures(text).map(|c| (Direction::Long, c));
    let short = SHORT_MARKER.captures(text).map(|c| (Direction::Short, c));

    let (direction, captures) = match (long, short) {
        (Some(l), Some(s)) => {
            let l_start = l.1.get(0).map_or(usize::MAX, |m| m.start());
            let s_start = s.1.get(0).map_or(usize::MAX, |m| m.start());
            if s_start < l_start { s } else { l }
        }
        (Some(l), None) => l,
        (None, Some(s)) => s,
        (None, None) => return None,
    };

    let symbol = captures.get(1)?.as_str().to_ascii_uppercase();
    Some((direction, symbol))
}

fn decimal_of(
    values: &HashMap<SignalField, FieldValue>,
    field: SignalField,
) -> Result<Decimal, SignalError> {
    match values.get(&field) {
        Some(FieldValue::Decimal(d)) => Ok(*d),
        Some(FieldValue::Integer(i)) => Ok(Decimal::from(*i)),
        None => Err(SignalError::Incomplete {
            missing: vec![field],
            excerpt: String::new(),
        }),
    }
}

fn integer_of(
    values: &HashMap<SignalField, FieldValue>,
    field: SignalField,
) -> Result<i64, SignalError> {
    match values.get(&field) {
        Some(FieldValue::Integer(i)) => Ok(*i),
        Some(FieldValue::Decimal(d)) => Err(SignalError::Malformed {
            field,
            raw: d.to_string(),
        }),
        None => Err(SignalError::Incomplete {
            missing: vec![field],
            excerpt: String::new(),
        }),
    }
}

fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_CHARS).collect()
}
