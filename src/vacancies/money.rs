//! Salary rendering. Amounts are integer cents end to end.

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let reais = (abs / 100).to_string();
    let centavos = abs % 100;

    let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
    for (i, c) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!("{sign}R$ {grouped},{centavos:02}")
}

pub fn salary_label(min: Option<i64>, max: Option<i64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) if min == max => format_cents(min),
        (Some(min), Some(max)) => format!("{} - {}", format_cents(min), format_cents(max)),
        (Some(min), None) => format!("A partir de {}", format_cents(min)),
        (None, Some(max)) => format!("Até {}", format_cents(max)),
        (None, None) => "A combinar".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_thousand_separators() {
        assert_eq!(format_cents(0), "R$ 0,00");
        assert_eq!(format_cents(5), "R$ 0,05");
        assert_eq!(format_cents(123_456), "R$ 1.234,56");
        assert_eq!(format_cents(100_000_000), "R$ 1.000.000,00");
        assert_eq!(format_cents(99_999), "R$ 999,99");
        assert_eq!(format_cents(-150), "-R$ 1,50");
    }

    #[test]
    fn large_amounts_do_not_lose_precision() {
        assert_eq!(format_cents(9_007_199_254_740_993), "R$ 90.071.992.547.409,93");
    }

    #[test]
    fn ranges() {
        assert_eq!(salary_label(Some(150_000), Some(300_000)), "R$ 1.500,00 - R$ 3.000,00");
        assert_eq!(salary_label(Some(150_000), Some(150_000)), "R$ 1.500,00");
        assert_eq!(salary_label(Some(150_000), None), "A partir de R$ 1.500,00");
        assert_eq!(salary_label(None, Some(300_000)), "Até R$ 3.000,00");
        assert_eq!(salary_label(None, None), "A combinar");
    }
}
