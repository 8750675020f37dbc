//! Maps uploaded rows onto the canonical student fields.
//!
//! Each field owns a list of accepted header aliases in priority order. A
//! header matches an alias first by trimmed, case-insensitive equality, then
//! by comparing both sides with every non-alphanumeric character removed.

use crate::models::{CanonicalStudentInput, RawRow};

const NAME: &[&str] = &["name", "student name", "full name", "student_name", "fullname"];
const EMAIL: &[&str] = &["email", "e-mail", "email address", "email id", "mail"];
const ROLL_NO: &[&str] = &[
    "rollno",
    "roll no",
    "roll number",
    "roll_no",
    "enrollment no",
    "registration no",
];
const ROLE: &[&str] = &["role", "user role", "type"];
const SEMESTER: &[&str] = &["semester", "sem", "current semester"];
const COURSE: &[&str] = &["course", "program", "programme", "branch", "degree"];
const GRADUATION_YEAR: &[&str] = &[
    "graduationyear",
    "graduation year",
    "passing year",
    "year of graduation",
    "batch",
];
const DEFAULT_RESUME: &[&str] = &[
    "defaultresume",
    "default resume",
    "resume",
    "resume link",
    "resume url",
];

const DEFAULT_ROLE: &str = "student";

pub fn normalize(row: &RawRow) -> CanonicalStudentInput {
    let role = field(row, ROLE).to_lowercase();

    CanonicalStudentInput {
        name: field(row, NAME),
        email: field(row, EMAIL),
        roll_no: field(row, ROLL_NO),
        role: if role.is_empty() {
            DEFAULT_ROLE.to_string()
        } else {
            role
        },
        semester: field(row, SEMESTER),
        course: field(row, COURSE),
        graduation_year: parse_year(&field(row, GRADUATION_YEAR)),
        default_resume: field(row, DEFAULT_RESUME),
    }
}

fn field(row: &RawRow, aliases: &[&str]) -> String {
    lookup(row, aliases)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

fn lookup<'a>(row: &'a RawRow, aliases: &[&str]) -> Option<&'a str> {
    let exact = aliases.iter().find_map(|alias| {
        row.headers()
            .find(|header| header.trim().eq_ignore_ascii_case(alias))
    });

    let header = exact.or_else(|| {
        aliases.iter().find_map(|alias| {
            let wanted = squash(alias);
            row.headers().find(|header| squash(header) == wanted)
        })
    })?;

    row.get(header)
}

fn squash(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Reads the leading integer of a cell, so spreadsheet floats such as
/// `2025.0` still yield a year.
fn parse_year(value: &str) -> Option<i32> {
    let value = value.trim();
    let (sign, digits) = match value.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", value.strip_prefix('+').unwrap_or(value)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    format!("{sign}{}", &digits[..end]).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(cells: &[(&str, &str)]) -> RawRow {
        cells.iter().copied().collect()
    }

    #[test]
    fn header_variants_map_to_canonical_fields() {
        let input = row(&[("Student Name", "Avery Lee"), ("E-Mail", "avery@x.com")]);
        let canonical = normalize(&input);
        assert_eq!(canonical.name, "Avery Lee");
        assert_eq!(canonical.email, "avery@x.com");
    }

    #[test]
    fn punctuation_and_spacing_are_ignored_as_fallback() {
        let input = row(&[
            (" ROLL-NO. ", "CS101"),
            ("Graduation_Year", "2026"),
            ("Default-Resume", "https://cdn/resumes/a.pdf"),
        ]);
        let canonical = normalize(&input);
        assert_eq!(canonical.roll_no, "CS101");
        assert_eq!(canonical.graduation_year, Some(2026));
        assert_eq!(canonical.default_resume, "https://cdn/resumes/a.pdf");
    }

    #[test]
    fn alias_priority_decides_between_columns() {
        let input = row(&[("Full Name", "Second"), ("name", "First")]);
        assert_eq!(normalize(&input).name, "First");
    }

    #[test]
    fn exact_match_beats_normalized_match() {
        let input = row(&[("e_mail", "fallback@x.com"), ("Mail", "exact@x.com")]);
        assert_eq!(normalize(&input).email, "exact@x.com");
    }

    #[test]
    fn empty_matched_cell_does_not_fall_through() {
        let input = row(&[("name", ""), ("Full Name", "X"), ("Email", "x@y.com")]);
        let normalized = normalize(&input);
        assert_eq!(normalized.name, "");
        assert_eq!(normalized.email, "x@y.com");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let canonical = normalize(&row(&[("unrelated", "value")]));
        assert_eq!(
            canonical,
            CanonicalStudentInput {
                role: "student".to_string(),
                ..CanonicalStudentInput::default()
            }
        );
    }

    #[test]
    fn role_is_trimmed_and_lowercased() {
        assert_eq!(normalize(&row(&[("Role", "  Coordinator ")])).role, "coordinator");
        assert_eq!(normalize(&row(&[("Role", "   ")])).role, "student");
        assert_eq!(normalize(&row(&[("Role", "Admin")])).role, "admin");
    }

    #[test]
    fn graduation_year_parses_leading_integer() {
        assert_eq!(parse_year("2025"), Some(2025));
        assert_eq!(parse_year("2025.0"), Some(2025));
        assert_eq!(parse_year(" 2026 batch"), Some(2026));
        assert_eq!(parse_year("next year"), None);
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("99999999999"), None);
    }

    #[test]
    fn normalization_is_deterministic() {
        let input = row(&[("Name", "A"), ("Email", "a@x.com"), ("Sem", "5")]);
        assert_eq!(normalize(&input), normalize(&input));
    }
}
