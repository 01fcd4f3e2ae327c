// content/mod.rs — Template-based SEO content generation.
//
// Fills a fixed outline with canned paragraphs. Generation never fails
// visibly: an outline that parses to nothing yields the fallback document.

/// Sentinel outline value requesting the default section structure.
pub const AUTO_OUTLINE: &str = "auto";

/// Default 7-section outline used when the caller passes `auto`.
pub fn default_outline(topic: &str) -> Vec<String> {
    vec![
        "Introduction".to_string(),
        format!("What is {topic}"),
        "Key Benefits".to_string(),
        format!("How to Use {topic}"),
        "Best Practices".to_string(),
        "Common Challenges".to_string(),
        "Conclusion".to_string(),
    ]
}

/// Caller-supplied outline: one section per line, blanks dropped.
pub fn parse_outline(outline: &str) -> Vec<String> {
    outline
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Canned paragraph for a recognized section title; generic fallback
/// paragraph referencing topic and section otherwise.
fn section_paragraph(topic: &str, section: &str) -> String {
    if section == "Introduction" {
        format!(
            "{topic} has become increasingly important in today's fast-paced world. \
             Understanding its fundamentals and applications can significantly impact \
             your success."
        )
    } else if section == format!("What is {topic}") {
        format!(
            "{topic} refers to a comprehensive approach that combines various elements \
             to achieve optimal results. It encompasses multiple aspects that work \
             together seamlessly."
        )
    } else if section == "Key Benefits" {
        format!(
            "Implementing {topic} offers several advantages:\n\n\
             1. Improved efficiency and productivity\n\
             2. Enhanced performance and results\n\
             3. Better resource utilization\n\
             4. Competitive advantage in the market"
        )
    } else if section == format!("How to Use {topic}") {
        format!(
            "To effectively utilize {topic}, follow these steps:\n\n\
             1. Start with a clear strategy\n\
             2. Implement best practices\n\
             3. Monitor and measure results\n\
             4. Continuously optimize and improve"
        )
    } else if section == "Best Practices" {
        format!(
            "When working with {topic}, consider these best practices:\n\n\
             • Regular monitoring and assessment\n\
             • Continuous learning and adaptation\n\
             • Focus on quality and consistency\n\
             • Stay updated with latest trends"
        )
    } else if section == "Common Challenges" {
        format!(
            "While implementing {topic}, you might encounter these challenges:\n\n\
             • Initial learning curve\n\
             • Resource allocation\n\
             • Maintaining consistency\n\
             • Measuring ROI\n\n\
             However, these can be overcome with proper planning and execution."
        )
    } else if section == "Conclusion" {
        format!(
            "{topic} is a powerful tool that, when properly implemented, can drive \
             significant improvements in your operations. Start small, focus on \
             consistency, and scale based on results."
        )
    } else {
        format!("Learn more about {section} in relation to {topic}.")
    }
}

/// Generate a full document for the topic: title heading, one paragraph per
/// outline section, and a boilerplate summary footer.
pub fn generate(topic: &str, outline: &str) -> String {
    let sections = if outline == AUTO_OUTLINE {
        default_outline(topic)
    } else {
        parse_outline(outline)
    };
    if sections.is_empty() {
        return fallback_content(topic);
    }

    let body = sections
        .iter()
        .map(|section| section_paragraph(topic, section))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "# {topic}\n\n{body}\n\n---\n\
         This comprehensive guide covers everything you need to know about {topic}, \
         including best practices, implementation strategies, and common challenges."
    )
}

/// Fixed document returned when no usable outline exists.
fn fallback_content(topic: &str) -> String {
    format!(
        "# {topic}\n\n\
         This comprehensive guide will help you understand {topic} better.\n\n\
         ## Introduction\n\n\
         {topic} is an important concept that deserves attention...\n\n\
         ## Key Points\n\n\
         1. Understanding the basics\n\
         2. Implementation strategies\n\
         3. Best practices\n\
         4. Future considerations\n\n\
         ## Conclusion\n\n\
         By following these guidelines, you can effectively utilize {topic} in your projects."
    )
}
