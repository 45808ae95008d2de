//! Format rules shared by request bodies.
//!
//! Bodies derive [`garde::Validate`] and point `custom(...)` at the adapters
//! below. Documents (CPF, CNPJ, phone, CEP) are accepted with or without
//! punctuation and stored as bare digits, see [`digits`].

use time::{macros::format_description, Date};

const UFS: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB",
    "PR", "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

pub fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn only_digits_and_punctuation(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '/' | ' ' | '(' | ')' | '+'))
}

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    match sum % 11 {
        0 | 1 => 0,
        r => 11 - r,
    }
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

fn to_digits(value: &str, len: usize) -> Option<Vec<u32>> {
    if !only_digits_and_punctuation(value) {
        return None;
    }
    let ds: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    (ds.len() == len).then_some(ds)
}

pub fn is_cpf(value: &str) -> bool {
    let Some(ds) = to_digits(value, 11) else {
        return false;
    };
    if all_same(&ds) {
        return false;
    }
    let first = check_digit(&ds[..9], &[10, 9, 8, 7, 6, 5, 4, 3, 2]);
    let second = check_digit(&ds[..10], &[11, 10, 9, 8, 7, 6, 5, 4, 3, 2]);
    ds[9] == first && ds[10] == second
}

pub fn is_cnpj(value: &str) -> bool {
    let Some(ds) = to_digits(value, 14) else {
        return false;
    };
    if all_same(&ds) {
        return false;
    }
    let first = check_digit(&ds[..12], &[5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]);
    let second = check_digit(&ds[..13], &[6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]);
    ds[12] == first && ds[13] == second
}

/// Brazilian landline (10 digits) or mobile (11 digits) with area code.
pub fn is_phone(value: &str) -> bool {
    if !only_digits_and_punctuation(value) {
        return false;
    }
    let ds = digits(value);
    let ds = ds.strip_prefix("55").filter(|rest| rest.len() >= 10).unwrap_or(ds.as_str());
    matches!(ds.len(), 10 | 11) && !ds.starts_with('0')
}

pub fn is_cep(value: &str) -> bool {
    to_digits(value, 8).is_some()
}

pub fn is_uf(value: &str) -> bool {
    UFS.contains(&value.trim().to_ascii_uppercase().as_str())
}

pub fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !rest.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// At least two letters; letters, spaces, apostrophes, dots and hyphens only.
pub fn is_person_name(value: &str) -> bool {
    let value = value.trim();
    value.chars().filter(|c| c.is_alphabetic()).count() >= 2
        && value
            .chars()
            .all(|c| c.is_alphabetic() || matches!(c, ' ' | '\'' | '.' | '-'))
}

fn rule(ok: bool, message: &str) -> garde::Result {
    if ok {
        Ok(())
    } else {
        Err(garde::Error::new(message.to_owned()))
    }
}

fn optional(value: &Option<String>, check: fn(&str) -> bool, message: &str) -> garde::Result {
    match value {
        Some(v) => rule(check(v), message),
        None => Ok(()),
    }
}

pub fn person_name(value: &str, _: &()) -> garde::Result {
    rule(is_person_name(value), "must be a person's name")
}

pub fn optional_person_name(value: &Option<String>, _: &()) -> garde::Result {
    optional(value, is_person_name, "must be a person's name")
}

pub fn cpf(value: &Option<String>, _: &()) -> garde::Result {
    optional(value, is_cpf, "invalid CPF")
}

pub fn cnpj(value: &Option<String>, _: &()) -> garde::Result {
    optional(value, is_cnpj, "invalid CNPJ")
}

pub fn phone(value: &Option<String>, _: &()) -> garde::Result {
    optional(value, is_phone, "invalid phone number")
}

pub fn cep(value: &Option<String>, _: &()) -> garde::Result {
    optional(value, is_cep, "invalid CEP")
}

pub fn uf(value: &Option<String>, _: &()) -> garde::Result {
    optional(value, is_uf, "invalid state")
}

pub fn date(value: &str, _: &()) -> garde::Result {
    rule(parse_date(value).is_some(), "expected YYYY-MM-DD")
}

pub fn optional_date(value: &Option<String>, _: &()) -> garde::Result {
    optional(value, |v| parse_date(v).is_some(), "expected YYYY-MM-DD")
}

/// Patch dates: `null` or a blank string clear the date, anything else must parse.
pub fn clearable_date(value: &Option<Option<String>>, _: &()) -> garde::Result {
    match value {
        Some(Some(v)) if !v.trim().is_empty() => date(v, &()),
        _ => Ok(()),
    }
}

pub fn http_url(value: &str, _: &()) -> garde::Result {
    rule(is_http_url(value), "expected an http(s) URL")
}

pub fn not_blank(value: &str, _: &()) -> garde::Result {
    rule(!value.trim().is_empty(), "must not be blank")
}

pub fn optional_not_blank(value: &Option<String>, _: &()) -> garde::Result {
    optional(value, |v| !v.trim().is_empty(), "must not be blank")
}

/// Trims, and maps blank strings to `None`.
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpf_check_digits() {
        assert!(is_cpf("529.982.247-25"));
        assert!(is_cpf("52998224725"));
        assert!(!is_cpf("529.982.247-24"));
        assert!(!is_cpf("111.111.111-11"));
        assert!(!is_cpf("5299822472"));
        assert!(!is_cpf("529a982b247c25"));
    }

    #[test]
    fn cnpj_check_digits() {
        assert!(is_cnpj("11.222.333/0001-81"));
        assert!(is_cnpj("11222333000181"));
        assert!(!is_cnpj("11.222.333/0001-82"));
        assert!(!is_cnpj("00000000000000"));
    }

    #[test]
    fn phones() {
        assert!(is_phone("(11) 98765-4321"));
        assert!(is_phone("1133334444"));
        assert!(is_phone("+55 11 98765-4321"));
        assert!(!is_phone("98765-4321"));
        assert!(!is_phone("0113333444"));
        assert!(!is_phone("11 9876x-4321"));
    }

    #[test]
    fn ceps_and_states() {
        assert!(is_cep("01310-100"));
        assert!(!is_cep("0131-100"));
        assert!(is_uf("sp"));
        assert!(!is_uf("XX"));
    }

    #[test]
    fn urls_and_dates() {
        assert!(is_http_url("https://example.com/docs?id=1"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("https://"));
        assert!(parse_date("2024-02-29").is_some());
        assert!(parse_date("2023-02-29").is_none());
        assert!(parse_date("29/02/2024").is_none());
    }

    #[test]
    fn clearable_dates() {
        assert!(clearable_date(&None, &()).is_ok());
        assert!(clearable_date(&Some(None), &()).is_ok());
        assert!(clearable_date(&Some(Some("  ".into())), &()).is_ok());
        assert!(clearable_date(&Some(Some("2024-03-01".into())), &()).is_ok());
        assert!(clearable_date(&Some(Some("bad".into())), &()).is_err());
    }

    #[test]
    fn names() {
        assert!(is_person_name("Ana Clara D'Ávila"));
        assert!(!is_person_name("A"));
        assert!(!is_person_name("R2D2"));
    }

    #[test]
    fn clean_drops_blank() {
        assert_eq!(clean(Some("  ".into())), None);
        assert_eq!(clean(Some(" x ".into())), Some("x".into()));
        assert_eq!(clean(None), None);
    }
}
