//! Keyword classification of raw job titles into (role, seniority) tags.

/// Sentinel tag assigned when no rule in a category matches.
pub const UNKNOWN_TAG: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub role: &'static str,
    pub seniority: &'static str,
}

// Ordered by priority; the first keyword found in the title wins, so compound
// keywords must precede the bare words they contain ("engineering manager"
// before "engineer").
const ROLE_RULES: &[(&str, &str)] = &[
    ("engineering manager", "Manager"),
    ("product manager", "Product Manager"),
    ("project manager", "Project Manager"),
    ("data scientist", "Data Scientist"),
    ("machine learning", "Data Scientist"),
    ("data engineer", "Data Engineer"),
    ("site reliability", "DevOps"),
    ("devops", "DevOps"),
    ("platform engineer", "DevOps"),
    ("quality assurance", "QA"),
    ("qa engineer", "QA"),
    ("recruiter", "Recruiter"),
    ("designer", "Designer"),
    ("developer", "Developer"),
    ("engineer", "Developer"),
    ("architect", "Developer"),
    ("analyst", "Analyst"),
];

const SENIORITY_RULES: &[(&str, &str)] = &[
    ("principal", "Principal"),
    ("staff", "Staff"),
    ("senior", "Senior"),
    ("sr.", "Senior"),
    ("sr ", "Senior"),
    ("head of", "Lead"),
    ("lead", "Lead"),
    ("junior", "Junior"),
    ("jr.", "Junior"),
    ("graduate", "Junior"),
    ("intern", "Intern"),
];

/// Derive (role, seniority) tags from a raw title.
///
/// Both categories are matched independently against their own rule list by
/// case-insensitive substring scan, first match wins. A category with no
/// matching rule resolves to [`UNKNOWN_TAG`], never an error.
pub fn classify(title: &str) -> Classification {
    let lower = title.to_lowercase();
    Classification {
        role: first_match(&lower, ROLE_RULES),
        seniority: first_match(&lower, SENIORITY_RULES),
    }
}

fn first_match(lower_title: &str, rules: &[(&'static str, &'static str)]) -> &'static str {
    rules
        .iter()
        .find(|(keyword, _)| lower_title.contains(keyword))
        .map(|(_, tag)| *tag)
        .unwrap_or(UNKNOWN_TAG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_role_and_seniority_independently() {
        let tags = classify("Senior Backend Developer");
        assert_eq!(tags.role, "Developer");
        assert_eq!(tags.seniority, "Senior");
    }

    #[test]
    fn unmatched_categories_resolve_to_the_unknown_sentinel() {
        let tags = classify("Barista");
        assert_eq!(tags.role, UNKNOWN_TAG);
        assert_eq!(tags.seniority, UNKNOWN_TAG);

        // One category matching must not disturb the other.
        let tags = classify("Developer");
        assert_eq!(tags.role, "Developer");
        assert_eq!(tags.seniority, UNKNOWN_TAG);
    }

    #[test]
    fn earlier_rule_wins_when_two_rules_overlap() {
        // "Engineering Manager" contains both the "engineering manager" and
        // the "engineer" keyword; list position must decide.
        let tags = classify("Engineering Manager");
        assert_eq!(tags.role, "Manager");

        let tags = classify("Principal Staff Liaison");
        assert_eq!(tags.seniority, "Principal");
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(classify("SENIOR DATA ENGINEER").role, "Data Engineer");
        assert_eq!(classify("senior data engineer").seniority, "Senior");
    }

    #[test]
    fn classification_is_deterministic() {
        assert_eq!(classify("Lead QA Engineer"), classify("Lead QA Engineer"));
    }
}
