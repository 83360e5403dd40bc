use crate::rdf::Term;

/// Pick the display label among `rdfs:label` values.
///
/// A label in the preferred language wins; otherwise the last label without a
/// language tag; otherwise the first label.
pub fn best_label<'a>(labels: &'a [Term], language: &str) -> Option<&'a Term> {
    let mut best = labels.first()?;
    for label in labels {
        match label.language() {
            Some(lang) if lang.eq_ignore_ascii_case(language) => return Some(label),
            None => best = label,
            Some(_) => {}
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_language_then_untagged_then_first() {
        let labels = vec![
            Term::lang_literal("Chat", "fr"),
            Term::literal("Cat (untagged)"),
            Term::lang_literal("Cat", "en"),
        ];
        assert_eq!(best_label(&labels, "en").unwrap().value(), "Cat");
        assert_eq!(best_label(&labels, "de").unwrap().value(), "Cat (untagged)");
        assert_eq!(best_label(&labels[..1], "de").unwrap().value(), "Chat");
        assert!(best_label(&[], "en").is_none());
    }
}
