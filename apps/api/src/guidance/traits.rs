use std::collections::BTreeSet;

/// A trait combination and the roles it suggests.
#[derive(Debug, Clone, Copy)]
pub struct TraitProfile {
    pub key: &'static str,
    pub description: &'static str,
    pub roles: &'static [&'static str],
}

/// Checked in order; the first combination covered by the student's traits wins.
pub const TRAIT_PROFILES: &[TraitProfile] = &[
    TraitProfile {
        key: "C+O",
        description: "Strong decision-maker with responsibility",
        roles: &["Manager", "Admin Head", "NGO Director"],
    },
    TraitProfile {
        key: "C+R",
        description: "Can handle pressure and multiple areas",
        roles: &["Event Planner", "Product Manager"],
    },
    TraitProfile {
        key: "C+E",
        description: "Stays composed & resilient for long terms",
        roles: &["Police", "Government Officer", "Army"],
    },
    TraitProfile {
        key: "C+A",
        description: "Positive leader who inspires others",
        roles: &["HR Manager", "Motivational Coach"],
    },
    TraitProfile {
        key: "O+R",
        description: "Self-driven and adaptable across domains",
        roles: &["Startup Founder", "Project Consultant"],
    },
    TraitProfile {
        key: "O+E",
        description: "Determined initiator with long-term vision",
        roles: &["Researcher", "Business Owner", "Civil Services"],
    },
    TraitProfile {
        key: "O+A",
        description: "Responsible & optimistic individual",
        roles: &["Educator", "Youth Counselor", "Team Lead"],
    },
    TraitProfile {
        key: "R+E",
        description: "Manages multitasking under long-term stress",
        roles: &["Software Engineer", "Media Planner"],
    },
    TraitProfile {
        key: "R+A",
        description: "Juggles multiple tasks while spreading positivity",
        roles: &["Social Media Manager", "Campaign Organizer"],
    },
    TraitProfile {
        key: "E+A",
        description: "Perseveres with positive attitude",
        roles: &["Psychologist", "Teacher", "UPSC Aspirant"],
    },
    TraitProfile {
        key: "C+O+A",
        description: "Confident, responsible, and positive leader",
        roles: &["Principal", "Entrepreneur", "NGO Leader"],
    },
];

/// Upper-cased, de-duplicated trait letters.
pub fn normalize_traits<S: AsRef<str>>(traits: &[S]) -> BTreeSet<String> {
    traits
        .iter()
        .map(|t| t.as_ref().trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Roles of the first trait combination fully contained in `traits`.
pub fn trait_based_suggestions<S: AsRef<str>>(traits: &[S]) -> Vec<String> {
    let have = normalize_traits(traits);
    if have.is_empty() {
        return Vec::new();
    }

    TRAIT_PROFILES
        .iter()
        .find(|profile| profile.key.split('+').all(|letter| have.contains(letter)))
        .map(|profile| profile.roles.iter().map(|r| r.to_string()).collect())
        .unwrap_or_default()
}
