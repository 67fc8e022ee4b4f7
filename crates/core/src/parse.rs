//! Parsers for the free text users type after a slash command.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::preference::{NewDrinkPreference, NewShopPreference};
use crate::domain::user::{UserId, UserReference};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Please give a size and a drink type, e.g. `small tea with milk`.")]
    IncompleteDrinkPreference,
    #[error("Please name a coffee shop, e.g. `second cup, 213 sesame st`.")]
    EmptyShopName,
    #[error("`{0}` is not a date. Use YYYY-MM-DD, YYYY/MM/DD or YYYY MM DD.")]
    InvalidDate(String),
    #[error("`{0}` is not a valid response. Answer yes or no.")]
    InvalidResponse(String),
}

/// Parses `size type [details...]`. Details keep every remaining word.
pub fn parse_drink_preference(input: &str) -> Result<NewDrinkPreference, ParseError> {
    let mut words = input.split_whitespace();
    match (words.next(), words.next()) {
        (Some(size), Some(drink_type)) => Ok(NewDrinkPreference {
            size: size.to_owned(),
            drink_type: drink_type.to_owned(),
            details: words.collect::<Vec<_>>().join(" "),
        }),
        _ => Err(ParseError::IncompleteDrinkPreference),
    }
}

/// Parses `name, location` by splitting on the first comma.
///
/// Input is lowercased. Runs of commas and whitespace inside the location
/// collapse to a single space; an empty location is `None`.
pub fn parse_shop_preference(input: &str) -> Result<NewShopPreference, ParseError> {
    let lowered = input.to_lowercase();
    let (name, rest) = match lowered.split_once(',') {
        Some((name, rest)) => (name.trim(), rest),
        None => (lowered.trim(), ""),
    };

    if name.is_empty() {
        return Err(ParseError::EmptyShopName);
    }

    let location = rest
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(NewShopPreference {
        name: name.to_owned(),
        location: if location.is_empty() { None } else { Some(location) },
    })
}

/// Parses a date written as `YYYY-MM-DD`, `YYYY/MM/DD` or `YYYY MM DD`.
///
/// Both separators must be the same character and the result must be a real
/// calendar date. Use [`canonical_date`] for the `YYYY-MM-DD` form.
pub fn parse_order_date(input: &str) -> Result<NaiveDate, ParseError> {
    let invalid = || ParseError::InvalidDate(input.trim().to_owned());
    let trimmed = input.trim();
    let bytes = trimmed.as_bytes();

    if bytes.len() != 10 {
        return Err(invalid());
    }

    let separator = bytes[4];
    if !matches!(separator, b'-' | b'/' | b' ') || bytes[7] != separator {
        return Err(invalid());
    }

    let mut digits = bytes[0..4].iter().chain(&bytes[5..7]).chain(&bytes[8..10]);
    if !digits.all(u8::is_ascii_digit) {
        return Err(invalid());
    }

    let year = trimmed[0..4].parse::<i32>().map_err(|_| invalid())?;
    let month = trimmed[5..7].parse::<u32>().map_err(|_| invalid())?;
    let day = trimmed[8..10].parse::<u32>().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

pub fn canonical_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses a yes/no answer to a coffee order. Empty text counts as yes.
pub fn parse_order_response(input: &str) -> Result<bool, ParseError> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" | "yes" | "y" | "in" | "1" | "true" => Ok(true),
        "no" | "n" | "out" | "0" | "false" => Ok(false),
        _ => Err(ParseError::InvalidResponse(input.trim().to_owned())),
    }
}

/// Reads a user out of command text: `<@U123>`, `<@U123|bob>`, `@bob` or `bob`.
pub fn parse_user_reference(input: &str) -> Option<UserReference> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(inner) = trimmed.strip_prefix("<@").and_then(|rest| rest.strip_suffix('>')) {
        let id = inner.split('|').next().unwrap_or(inner).trim();
        return (!id.is_empty()).then(|| UserReference::Id(UserId::new(id)));
    }

    let name = trimmed.trim_start_matches('@').trim();
    (!name.is_empty()).then(|| UserReference::Name(name.to_owned()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        canonical_date, parse_drink_preference, parse_order_date, parse_order_response,
        parse_shop_preference, parse_user_reference, ParseError,
    };
    use crate::domain::user::{UserId, UserReference};

    #[test]
    fn drink_preference_keeps_all_detail_words() {
        let drink = parse_drink_preference("small tea with milk").expect("parse");
        assert_eq!(drink.size, "small");
        assert_eq!(drink.drink_type, "tea");
        assert_eq!(drink.details, "with milk");

        let plain = parse_drink_preference("  large   coffee ").expect("parse");
        assert_eq!(plain.details, "");
    }

    #[test]
    fn drink_preference_requires_size_and_type() {
        assert_eq!(parse_drink_preference("large"), Err(ParseError::IncompleteDrinkPreference));
        assert_eq!(parse_drink_preference("   "), Err(ParseError::IncompleteDrinkPreference));
    }

    #[test]
    fn shop_preference_splits_on_first_comma_and_lowercases() {
        let shop = parse_shop_preference("Second Cup, 213 Sesame St").expect("parse");
        assert_eq!(shop.name, "second cup");
        assert_eq!(shop.location.as_deref(), Some("213 sesame st"));
    }

    #[test]
    fn shop_preference_collapses_extra_separators_in_location() {
        let shop = parse_shop_preference("Tims,  Gordon St,, Guelph ").expect("parse");
        assert_eq!(shop.name, "tims");
        assert_eq!(shop.location.as_deref(), Some("gordon st guelph"));
    }

    #[test]
    fn shop_preference_without_location() {
        let shop = parse_shop_preference("Starbux").expect("parse");
        assert_eq!(shop.name, "starbux");
        assert_eq!(shop.location, None);

        let trailing = parse_shop_preference("Starbux, ").expect("parse");
        assert_eq!(trailing.location, None);
    }

    #[test]
    fn shop_preference_rejects_missing_name() {
        assert_eq!(parse_shop_preference(", library"), Err(ParseError::EmptyShopName));
    }

    #[test]
    fn order_date_accepts_three_separator_patterns() {
        let expected = NaiveDate::from_ymd_opt(2020, 1, 10).expect("date");
        for input in ["2020-01-10", "2020/01/10", "2020 01 10", " 2020-01-10 "] {
            assert_eq!(parse_order_date(input), Ok(expected), "input {input:?}");
        }
        assert_eq!(canonical_date(expected), "2020-01-10");
    }

    #[test]
    fn order_date_rejects_other_formats() {
        for input in [
            "2020.01.10",
            "2020-1-10",
            "20-01-10",
            "2020-01/10",
            "2020-01-100",
            "10-01-2020",
            "2020_01_10",
            "yyyy-mm-dd",
            "2020-13-01",
            "2019-02-29",
            "",
        ] {
            assert!(
                matches!(parse_order_date(input), Err(ParseError::InvalidDate(_))),
                "input {input:?} should be rejected"
            );
        }
    }

    #[test]
    fn order_response_understands_yes_and_no() {
        assert_eq!(parse_order_response(""), Ok(true));
        assert_eq!(parse_order_response("Yes"), Ok(true));
        assert_eq!(parse_order_response(" out "), Ok(false));
        assert_eq!(parse_order_response("no"), Ok(false));
        assert!(matches!(parse_order_response("maybe"), Err(ParseError::InvalidResponse(_))));
    }

    #[test]
    fn user_reference_reads_mentions_and_names() {
        assert_eq!(
            parse_user_reference("<@U123|bobby>"),
            Some(UserReference::Id(UserId::new("U123")))
        );
        assert_eq!(parse_user_reference("<@U456>"), Some(UserReference::Id(UserId::new("U456"))));
        assert_eq!(parse_user_reference("@bobby"), Some(UserReference::Name("bobby".to_owned())));
        assert_eq!(parse_user_reference("  "), None);
    }
}
