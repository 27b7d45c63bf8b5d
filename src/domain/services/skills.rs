/// Static category -> skill mapping used for dispatch eligibility. A
/// technician qualifies with any one of the listed skills.
const CATEGORY_SKILLS: &[(&str, &[&str])] = &[
    ("aircon", &["aircon_cleaning", "aircon_repair", "hvac"]),
    ("appliance", &["appliance_repair", "electrical"]),
    ("carpentry", &["carpentry", "furniture_assembly"]),
    ("cleaning", &["cleaning", "deep_cleaning"]),
    ("electrical", &["electrical", "wiring"]),
    ("painting", &["painting"]),
    ("pest_control", &["pest_control"]),
    ("plumbing", &["plumbing", "pipe_repair", "drainage"]),
];

/// Unknown categories fall back to a skill with the category's own name.
pub fn required_skills(category: &str) -> Vec<&str> {
    let category = category.trim();
    CATEGORY_SKILLS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(category))
        .map(|(_, skills)| skills.to_vec())
        .unwrap_or_else(|| vec![category])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_category_maps_to_skill_set() {
        let skills = required_skills("Plumbing");
        assert!(skills.contains(&"plumbing"));
        assert!(skills.contains(&"pipe_repair"));
    }

    #[test]
    fn test_unknown_category_requires_its_own_name() {
        assert_eq!(required_skills(" roofing "), vec!["roofing"]);
    }
}
