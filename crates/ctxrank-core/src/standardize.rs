//! Canonical name forms and the fuzzy identity check built on them.
//!
//! [`names_match`] is a heuristic: two names match when their sets of
//! standardized forms intersect. The relation is symmetric but not
//! transitive ("Bill Clinton" and "Hillary Clinton" both match "Clinton"
//! without matching each other), and callers must not treat it as an
//! equivalence.

use std::collections::BTreeSet;

use crate::entity::EntityType;

/// Minimum normalized Damerau-Levenshtein similarity for a word window of
/// free text to count as a mention in [`contains_flexibly`].
pub const FLEXIBLE_SIMILARITY: f64 = 0.9;

/// Forms shorter than this are never fuzzy-matched against free text.
const MIN_FUZZY_LEN: usize = 4;

fn strip_parenthetical(name: &str) -> &str {
    match name.find('(') {
        Some(pos) if pos > 0 => name[..pos].trim_end(),
        _ => name,
    }
}

fn invert_surname_first(name: &str) -> Option<String> {
    let (last, first) = name.split_once(',')?;
    let (last, first) = (last.trim(), first.trim());
    if last.is_empty() || first.is_empty() {
        return None;
    }
    Some(format!("{first} {last}"))
}

/// Every string counted as a valid form of `name`, the untouched input
/// included.
#[must_use]
pub fn standardize(name: &str, entity_type: EntityType) -> BTreeSet<String> {
    let mut forms = BTreeSet::new();
    forms.insert(name.to_string());

    let mut current = strip_parenthetical(name.trim()).to_string();
    if current.is_empty() {
        return forms;
    }
    forms.insert(current.clone());

    if entity_type == EntityType::Person {
        if let Some(inverted) = invert_surname_first(&current) {
            current = inverted;
            forms.insert(current.clone());
        }

        let tokens: Vec<&str> = current.split_whitespace().collect();
        if tokens.len() == 3 {
            current = format!("{} {}", tokens[0], tokens[2]);
            forms.insert(current.clone());
        }

        let tokens: Vec<&str> = current.split_whitespace().collect();
        if tokens.len() == 2 {
            forms.insert(tokens[1].to_string());
        }
    }

    forms
}

/// The most normalized full form of `name`: parenthetical stripped and,
/// for persons, inverted and with the middle token elided.
#[must_use]
pub fn primary_form(name: &str, entity_type: EntityType) -> String {
    let stripped = strip_parenthetical(name.trim());
    if stripped.is_empty() {
        return name.to_string();
    }
    if entity_type != EntityType::Person {
        return stripped.to_string();
    }

    let inverted = invert_surname_first(stripped).unwrap_or_else(|| stripped.to_string());
    let tokens: Vec<&str> = inverted.split_whitespace().collect();
    if tokens.len() == 3 {
        format!("{} {}", tokens[0], tokens[2])
    } else {
        tokens.join(" ")
    }
}

/// The bare surname [`standardize`] derives for a two-token person name.
#[must_use]
pub fn surname_form(name: &str, entity_type: EntityType) -> Option<String> {
    if entity_type != EntityType::Person {
        return None;
    }
    let primary = primary_form(name, entity_type);
    let tokens: Vec<&str> = primary.split_whitespace().collect();
    match tokens.as_slice() {
        [_, last] => Some((*last).to_string()),
        _ => None,
    }
}

#[must_use]
pub fn names_match(a: &str, a_type: EntityType, b: &str, b_type: EntityType) -> bool {
    let a_forms = standardize(a, a_type);
    let b_forms = standardize(b, b_type);
    !a_forms.is_disjoint(&b_forms)
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-' || c == '.'))
        .map(|w| w.trim_matches(|c: char| c == '.' || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Lenient containment of a name in free text.
///
/// True when any standardized form occurs in `text` ignoring case, or when a
/// run of words in `text` with the same word count as a form is within
/// [`FLEXIBLE_SIMILARITY`] of it.
#[must_use]
pub fn contains_flexibly(name: &str, entity_type: EntityType, text: &str) -> bool {
    let haystack = text.to_lowercase();
    let forms: Vec<String> = standardize(name, entity_type)
        .into_iter()
        .map(|f| f.to_lowercase())
        .filter(|f| !f.trim().is_empty())
        .collect();

    if forms.iter().any(|form| haystack.contains(form.as_str())) {
        return true;
    }

    let text_words = words(text);
    forms
        .iter()
        .filter(|form| form.chars().count() >= MIN_FUZZY_LEN)
        .any(|form| {
            let form_words = words(form);
            let width = form_words.len();
            if width == 0 || width > text_words.len() {
                return false;
            }
            let target = form_words.join(" ");
            text_words.windows(width).any(|window| {
                strsim::normalized_damerau_levenshtein(&window.join(" "), &target)
                    >= FLEXIBLE_SIMILARITY
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_person_inversion_and_surname() {
        let forms = standardize("Clinton, Bill", EntityType::Person);
        assert_eq!(forms, set(&["Clinton, Bill", "Bill Clinton", "Clinton"]));
    }

    #[test]
    fn test_person_middle_name_elided() {
        let forms = standardize("Bush, George W.", EntityType::Person);
        assert!(forms.contains("George W. Bush"));
        assert!(forms.contains("George Bush"));
        assert!(forms.contains("Bush"));
    }

    #[test]
    fn test_parenthetical_suffix_stripped() {
        let forms = standardize("Georgia (Country)", EntityType::Location);
        assert_eq!(forms, set(&["Georgia (Country)", "Georgia"]));
    }

    #[test]
    fn test_non_person_keeps_commas() {
        let forms = standardize("Paris, France", EntityType::Location);
        assert_eq!(forms, set(&["Paris, France"]));
    }

    #[test]
    fn test_single_token_person_has_no_extra_forms() {
        assert_eq!(standardize("Madonna", EntityType::Person), set(&["Madonna"]));
    }

    #[test]
    fn test_surname_form() {
        assert_eq!(
            surname_form("Bush, George W.", EntityType::Person).as_deref(),
            Some("Bush")
        );
        assert_eq!(surname_form("Madonna", EntityType::Person), None);
        assert_eq!(surname_form("New York", EntityType::Location), None);
    }

    #[test]
    fn test_primary_form() {
        assert_eq!(primary_form("Clinton, Bill", EntityType::Person), "Bill Clinton");
        assert_eq!(
            primary_form("Clinton, William Jefferson", EntityType::Person),
            "William Clinton"
        );
        assert_eq!(primary_form("United Nations", EntityType::Organization), "United Nations");
        assert_eq!(primary_form("Georgia (State)", EntityType::Location), "Georgia");
    }

    #[test]
    fn test_standardization_keeps_primary_form() {
        for (raw, ty) in [
            ("Clinton, Bill", EntityType::Person),
            ("Bush, George Walker", EntityType::Person),
            ("Georgia (State)", EntityType::Location),
            ("Apple Inc.", EntityType::Organization),
        ] {
            let primary = primary_form(raw, ty);
            assert!(standardize(&primary, ty).contains(&primary), "{raw}");
        }
    }

    #[test]
    fn test_match_variants_of_same_person() {
        let ty = EntityType::Person;
        assert!(names_match("Clinton, Bill", ty, "Bill Clinton", ty));
        assert!(names_match("Clinton", ty, "Clinton, Bill", ty));
        assert!(!names_match("Bill Clinton", ty, "George Bush", ty));
    }

    #[test]
    fn test_match_is_symmetric() {
        let names = [
            "Clinton, Bill",
            "Bill Clinton",
            "Clinton",
            "Hillary Clinton",
            "Clinton, Hillary Rodham",
            "Paris",
        ];
        for a in names {
            for b in names {
                assert_eq!(
                    names_match(a, EntityType::Person, b, EntityType::Person),
                    names_match(b, EntityType::Person, a, EntityType::Person),
                    "{a} / {b}"
                );
            }
        }
    }

    #[test]
    fn test_match_is_not_transitive() {
        let ty = EntityType::Person;
        assert!(names_match("Bill Clinton", ty, "Clinton", ty));
        assert!(names_match("Hillary Clinton", ty, "Clinton", ty));
        assert!(!names_match("Bill Clinton", ty, "Hillary Clinton", ty));
    }

    #[test]
    fn test_contains_flexibly() {
        let text = "President Clinton met the Secretary General in New York.";
        assert!(contains_flexibly("Clinton, Bill", EntityType::Person, text));
        assert!(contains_flexibly("new york", EntityType::Location, text));
        assert!(!contains_flexibly("Paris", EntityType::Location, text));
    }

    #[test]
    fn test_contains_flexibly_tolerates_small_spelling_differences() {
        let text = "Talks resumed in Kyiv on Monday, officials in Kiev-based ministries said.";
        assert!(contains_flexibly("Kyiv", EntityType::Location, text));
        let text = "The Millosevic government fell.";
        assert!(contains_flexibly("Milosevic", EntityType::Person, text));
    }
}
