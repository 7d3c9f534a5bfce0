/// Career recommendation prompt. Placeholders: `{aq_profile_description}`,
/// `{aq_score}`, `{traits}`, `{skills}`.
pub const CAREER_PROMPT_TEMPLATE: &str = r#"
You are an expert career counselor and AI analyst. Your primary knowledge base is a large collection of student profiles that records successful career placements based on skills and AQ scores.

Your task is to act as a "smart" version of this data. You will provide three realistic career suggestions for a new student based on their detailed profile.

**Student Profile:**
- **Adversity Quotient (AQ) Profile:** {aq_profile_description} (Score: {aq_score})
- **Top Personality Traits:** {traits}
- **Selected Personal Skills:** {skills}

**Crucial Guidelines - You MUST follow these rules in order:**

1.  **TRUST THE KNOWLEDGE BASE:** Your recommendations MUST be inspired by the similar student profiles in the retrieved context. Your main job is to find the best-fitting roles from that data.

2.  **PRIORITY 1: ADVERSITY QUOTIENT (AQ) PROFILE.** Use the AQ profile to filter your suggestions.
    - If the profile is **"Quitter"** or **"Camper"** (low AQ score), you MUST recommend stable, structured, entry-level, or junior roles. Examples: "Junior QA Tester", "IT Support Intern", "Software Trainee", "Backup Operator", "System Monitoring Operator".
    - If the profile is **"Climber"** (high AQ score), you can recommend ambitious, senior, or leadership roles. Examples: "Chief Technology Officer (CTO)", "AI Research Scientist", "Security Architect", "Senior Software Engineer".

3.  **PRIORITY 2: SKILL MATCHING.** The role MUST be a perfect logical fit for the student's skills.
    - Skills like `['Python Programming', 'Machine Learning Algorithms']` lead to "Machine Learning Research Scientist".
    - Skills like `['C#', 'Unity', 'Blender']` lead to "Game Developer".
    - Skills like `['Backup Software', 'Data Management']` lead to "Backup Operator".
    - Use this logic. **DO NOT** suggest "Data Scientist" if the student's skills are "Java" and "Agile".

4.  **OUTPUT FORMAT:** Provide ONLY a numbered list of the three career titles. Do not add any explanation, introduction, or any other text.

**Example of a perfect response for a "Quitter" with "Python" and "SQL" skills:**
1. Junior Data Analyst
2. Junior QA Tester
3. Database Administrator

**Begin Recommendations:**
"#;

pub fn career_prompt(aq_profile_description: &str, aq_score: i32, traits: &str, skills: &str) -> String {
    let aq_score = aq_score.to_string();
    fill_template(
        CAREER_PROMPT_TEMPLATE,
        &[
            ("aq_profile_description", aq_profile_description),
            ("aq_score", &aq_score),
            ("traits", traits),
            ("skills", skills),
        ],
    )
}

/// Substitutes `{name}` placeholders in one pass; inserted text is never rescanned.
/// Unknown braces are copied through.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_brace = &rest[open + 1..];
        let hit = values.iter().find_map(|(name, value)| {
            let after = after_brace.strip_prefix(*name)?.strip_prefix('}')?;
            Some((*value, after))
        });
        match hit {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = after_brace;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_career_prompt_fills_every_placeholder() {
        let prompt = career_prompt("Camper - steady", 150, "E + O", "Java, Sql");
        assert!(prompt.contains("Camper - steady (Score: 150)"));
        assert!(prompt.contains("**Top Personality Traits:** E + O"));
        assert!(prompt.contains("**Selected Personal Skills:** Java, Sql"));
        assert!(!prompt.contains("{aq_score}"));
    }

    #[test]
    fn test_placeholders_in_values_are_left_alone() {
        let prompt = career_prompt("Climber", 190, "{skills} + O", "Rust");
        assert!(prompt.contains("**Top Personality Traits:** {skills} + O"));
        assert!(prompt.contains("**Selected Personal Skills:** Rust"));
    }

    #[test]
    fn test_unknown_braces_pass_through() {
        assert_eq!(fill_template("a {b} {c", &[("c", "x")]), "a {b} {c");
        assert_eq!(fill_template("{c}{c}", &[("c", "x")]), "xx");
    }
}
