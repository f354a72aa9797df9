use log::warn;
use serde_json::Value;

use crate::error::ConvertError;
use crate::geometry::{extract_line_string, position_from_value, Position};
use crate::options::ErrorPolicy;

type Result<T> = std::result::Result<T, ConvertError>;

/// Concatenate an ordered sequence of route legs into one continuous line.
///
/// The fold keeps an accumulator of coordinates; an empty accumulator means
/// "no leg has contributed yet", so a leg that seeds it uses its full
/// geometry (or its start+end positions) while every later leg appends its
/// coordinates minus the first, which duplicates the previous leg's last
/// point. A leg with a resolvable geometry always wins over its
/// start/end position fields.
///
/// A leg with no usable coordinate source either fails the call with its
/// index (`Strict`) or is skipped without touching the accumulator
/// (`Skip`). No contributing legs at all yields an empty coordinate list.
pub fn stitch_legs(legs: &[Value], on_error: ErrorPolicy) -> Result<Vec<Position>> {
    let mut acc: Vec<Position> = Vec::new();

    for (index, leg) in legs.iter().enumerate() {
        let line = leg
            .get("Geometry")
            .and_then(|geometry| extract_line_string(geometry).ok());

        if acc.is_empty() {
            match line {
                Some(line) => acc = line,
                None => match (leg_position(leg, "StartPosition"), leg_position(leg, "EndPosition")) {
                    (Some(start), Some(end)) => acc = vec![start, end],
                    _ => handle_unusable(index, on_error)?,
                },
            }
        } else {
            match line {
                Some(line) => acc.extend(line.into_iter().skip(1)),
                None => match leg_position(leg, "EndPosition") {
                    Some(end) => acc.push(end),
                    None => handle_unusable(index, on_error)?,
                },
            }
        }
    }

    Ok(acc)
}

fn handle_unusable(index: usize, on_error: ErrorPolicy) -> Result<()> {
    match on_error {
        ErrorPolicy::Strict => Err(ConvertError::MissingLegData { index }),
        ErrorPolicy::Skip => {
            warn!("skipping leg {index}: no usable geometry or positions");
            Ok(())
        }
    }
}

fn leg_position(leg: &Value, key: &str) -> Option<Position> {
    leg.get(key).and_then(|v| position_from_value(v).ok())
}
