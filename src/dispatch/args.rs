//! Argument parsing for queries and action verbs
//!
//! Every failure maps to an argument error, which skips just the one command.

use uuid::Uuid;

use crate::core::{ObjectId, RlvError, RlvResult, Vector3};

/// Separator between an option's main part and its trailing modifier
pub const OPTION_MODIFIER: char = ';';

/// Separator between keywords in `findfolder`
pub const KEYWORD_SEPARATOR: &str = "&&";

/// Parse a reply channel; replies are never sent on public chat
pub fn parse_channel(param: &str) -> RlvResult<i32> {
    match param.trim().parse::<i32>() {
        Ok(channel) if channel > 0 => Ok(channel),
        _ => Err(RlvError::InvalidChannel(param.to_string())),
    }
}

/// Parse an object, group or role id
pub fn parse_id(text: &str) -> RlvResult<ObjectId> {
    Uuid::parse_str(text.trim()).map_err(|_| RlvError::invalid(format!("not an id: {}", text)))
}

/// Parse an angle in radians
pub fn parse_angle(text: &str) -> RlvResult<f64> {
    match text.trim().parse::<f64>() {
        Ok(angle) if angle.is_finite() => Ok(angle),
        _ => Err(RlvError::invalid(format!("not an angle: {}", text))),
    }
}

/// Split `main;modifier` into its parts
pub fn split_modifier(option: &str) -> (&str, Option<&str>) {
    match option.split_once(OPTION_MODIFIER) {
        Some((main, modifier)) => (main.trim(), Some(modifier)),
        None => (option.trim(), None),
    }
}

/// Split `kw1&&kw2` into keywords
pub fn split_keywords(text: &str) -> Vec<&str> {
    text.split(KEYWORD_SEPARATOR)
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect()
}

/// Destination of a forced teleport
#[derive(Debug, Clone, PartialEq)]
pub enum TeleportTarget {
    /// `x/y/z` in global metres
    Global(Vector3),
    /// `region/x/y/z[/yaw]`; an empty region name means the current region
    Region {
        name: String,
        position: Vector3,
        look_at: Option<f64>,
    },
}

fn parse_coordinate(text: &str, raw: &str) -> RlvResult<f64> {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(RlvError::InvalidCoordinates(raw.to_string())),
    }
}

fn parse_vector(fields: &[&str], raw: &str) -> RlvResult<Vector3> {
    Ok(Vector3::new(
        parse_coordinate(fields[0], raw)?,
        parse_coordinate(fields[1], raw)?,
        parse_coordinate(fields[2], raw)?,
    ))
}

/// Parse a `tpto` option; the form is chosen solely by field count
pub fn parse_teleport(option: &str) -> RlvResult<TeleportTarget> {
    let fields: Vec<&str> = option.split('/').collect();
    match fields.len() {
        3 => Ok(TeleportTarget::Global(parse_vector(&fields, option)?)),
        4 => Ok(TeleportTarget::Region {
            name: fields[0].trim().to_string(),
            position: parse_vector(&fields[1..4], option)?,
            look_at: None,
        }),
        5 => Ok(TeleportTarget::Region {
            name: fields[0].trim().to_string(),
            position: parse_vector(&fields[1..4], option)?,
            look_at: Some(parse_coordinate(fields[4], option)?),
        }),
        _ => Err(RlvError::InvalidCoordinates(option.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel() {
        assert_eq!(parse_channel("2222").unwrap(), 2222);
        assert!(parse_channel("0").is_err());
        assert!(parse_channel("-5").is_err());
        assert!(parse_channel("force").is_err());
        assert!(parse_channel("99999999999").is_err());
    }

    #[test]
    fn test_parse_teleport_forms() {
        assert_eq!(
            parse_teleport("128/128/25").unwrap(),
            TeleportTarget::Global(Vector3::new(128.0, 128.0, 25.0))
        );
        assert_eq!(
            parse_teleport("Region Name/10/20/30").unwrap(),
            TeleportTarget::Region {
                name: "Region Name".into(),
                position: Vector3::new(10.0, 20.0, 30.0),
                look_at: None,
            }
        );
        assert_eq!(
            parse_teleport("Region Name/10/20/30/1.5").unwrap(),
            TeleportTarget::Region {
                name: "Region Name".into(),
                position: Vector3::new(10.0, 20.0, 30.0),
                look_at: Some(1.5),
            }
        );
    }

    #[test]
    fn test_parse_teleport_errors() {
        assert!(matches!(
            parse_teleport("128/128"),
            Err(RlvError::InvalidCoordinates(_))
        ));
        assert!(matches!(
            parse_teleport("128/abc/25"),
            Err(RlvError::InvalidCoordinates(_))
        ));
        assert!(parse_teleport("a/b/c/d/e/f").is_err());
        assert!(parse_teleport("1/2/NaN").is_err());
    }

    #[test]
    fn test_split_helpers() {
        assert_eq!(split_modifier("Builders;Officer"), ("Builders", Some("Officer")));
        assert_eq!(split_modifier("send"), ("send", None));
        assert_eq!(split_keywords("Red && Shoes&&"), vec!["Red", "Shoes"]);
    }

    #[test]
    fn test_parse_id_and_angle() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert!(parse_id("not-a-uuid").is_err());
        assert_eq!(parse_angle("3.14").unwrap(), 3.14);
        assert!(parse_angle("inf").is_err());
    }
}
