//! The single keyword topic table shared by the Context Retriever and the
//! Fallback Responder. Both components previously carried their own copy of
//! this mapping; one table keeps the keyword groups identical by
//! construction.

use crate::biography::BiographyRecord;

/// Identifies a topic group. Declaration order here is the matching order
/// everywhere the table is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKey {
    Education,
    Experience,
    Skills,
    Projects,
    Contact,
    Name,
    Location,
    /// "tell me about" catch-all. Fallback-only: it has no context detail
    /// block, so the retriever skips it.
    General,
}

/// One topic group: the substrings that fire it, the canned paragraph the
/// fallback returns, and the detail block the retriever appends to the
/// generation context (absent for the catch-all group).
#[derive(Debug, Clone)]
pub struct Topic {
    pub key: TopicKey,
    pub keywords: Vec<String>,
    pub canned: String,
    pub detail: Option<String>,
}

impl Topic {
    pub fn matches(&self, question_lower: &str) -> bool {
        self.keywords.iter().any(|kw| question_lower.contains(kw.as_str()))
    }
}

/// Ordered topic table, rendered once from the biography record. The canned
/// paragraphs and detail blocks are fixed for the session after this point.
#[derive(Debug, Clone)]
pub struct TopicTable {
    topics: Vec<Topic>,
    default_answer: String,
}

impl TopicTable {
    pub fn from_record(record: &BiographyRecord) -> Self {
        let p = &record.personal;
        let name = p.name.as_str();

        let mut name_keywords = vec![
            "name".to_string(),
            "who are you".to_string(),
            "who is".to_string(),
        ];
        for token in name.split_whitespace() {
            name_keywords.push(token.to_lowercase());
        }
        if !p.nickname.is_empty() {
            name_keywords.push(p.nickname.to_lowercase());
        }

        let topics = vec![
            Topic {
                key: TopicKey::Education,
                keywords: strings(&[
                    "education", "study", "studied", "school", "college", "university", "degree",
                ]),
                canned: education_paragraph(record),
                detail: Some(education_block(record)),
            },
            Topic {
                key: TopicKey::Experience,
                keywords: strings(&["experience", "job", "work", "career", "company", "employ"]),
                canned: experience_paragraph(record),
                detail: Some(experience_block(record)),
            },
            Topic {
                key: TopicKey::Skills,
                keywords: strings(&["skill", "tech", "programming", "stack", "framework"]),
                canned: skills_paragraph(record),
                detail: Some(skills_block(record)),
            },
            Topic {
                key: TopicKey::Projects,
                keywords: strings(&["project", "portfolio", "showcase"]),
                canned: projects_paragraph(record),
                detail: Some(projects_block(record)),
            },
            Topic {
                key: TopicKey::Contact,
                keywords: strings(&["contact", "reach", "email", "linkedin", "connect", "hire"]),
                canned: contact_paragraph(record),
                detail: Some(contact_block(record)),
            },
            Topic {
                key: TopicKey::Name,
                keywords: name_keywords,
                canned: name_paragraph(record),
                detail: Some(name_block(record)),
            },
            Topic {
                key: TopicKey::Location,
                keywords: strings(&["location", "based", "live", "where"]),
                canned: location_paragraph(record),
                detail: Some(location_block(record)),
            },
            Topic {
                key: TopicKey::General,
                keywords: strings(&["tell me about", "about you", "introduce"]),
                canned: format!(
                    "{} is {}. {} Ask me about skills, education, experience, or projects!",
                    name,
                    indefinite(&p.title),
                    p.bio
                ),
                detail: None,
            },
        ];

        let default_answer = format!(
            "I'm {}'s assistant. Ask me about their skills, education, professional experience, or projects!",
            name
        );

        Self { topics, default_answer }
    }

    /// All topics, in matching order.
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Topics that carry a context detail block, in declaration order.
    /// This is the retriever's keyword stage.
    pub fn context_topics(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter().filter(|t| t.detail.is_some())
    }

    /// First topic whose keywords match, in priority order. This is the
    /// fallback responder's lookup.
    pub fn first_match(&self, question_lower: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.matches(question_lower))
    }

    /// Paragraph returned when no topic matches at all.
    pub fn default_answer(&self) -> &str {
        &self.default_answer
    }
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn indefinite(title: &str) -> String {
    let article = match title.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    };
    format!("{} {}", article, title)
}

fn education_paragraph(record: &BiographyRecord) -> String {
    let name = &record.personal.name;
    if record.personal.education.is_empty() {
        return format!("{} hasn't published education details here yet.", name);
    }
    let entries: Vec<String> = record
        .personal
        .education
        .iter()
        .map(|e| match &e.note {
            Some(note) => format!("{} at {} ({})", e.program, e.institution, note),
            None => format!("{} at {}", e.program, e.institution),
        })
        .collect();
    format!(
        "{} has a layered educational background: {}.",
        name,
        entries.join("; ")
    )
}

fn education_block(record: &BiographyRecord) -> String {
    let mut block = String::from("EDUCATION:\n");
    for e in &record.personal.education {
        match &e.note {
            Some(note) => block.push_str(&format!("- {} at {} ({})\n", e.program, e.institution, note)),
            None => block.push_str(&format!("- {} at {}\n", e.program, e.institution)),
        }
    }
    if record.personal.education.is_empty() {
        block.push_str("- No education entries on file\n");
    }
    block
}

fn experience_paragraph(record: &BiographyRecord) -> String {
    let name = &record.personal.name;
    if record.experience.is_empty() {
        return format!(
            "{} works as {}. Detailed role history isn't listed here, but feel free to ask about skills or projects.",
            name,
            indefinite(&record.personal.title)
        );
    }
    let entries: Vec<String> = record
        .experience
        .iter()
        .map(|e| format!("{} ({})", e.company, e.role))
        .collect();
    format!(
        "{} has professional experience at {}.",
        name,
        entries.join(", ")
    )
}

fn experience_block(record: &BiographyRecord) -> String {
    let mut block = String::from("EXPERIENCE:\n");
    for e in &record.experience {
        block.push_str(&format!("- {}: {}. {}\n", e.company, e.role, e.description));
        if !e.technologies.is_empty() {
            block.push_str(&format!("  Technologies: {}\n", e.technologies.join(", ")));
        }
    }
    if record.experience.is_empty() {
        block.push_str("- No experience entries on file\n");
    }
    block
}

fn skills_paragraph(record: &BiographyRecord) -> String {
    let name = &record.personal.name;
    if record.skills.is_empty() {
        return format!("{} works across the full web stack.", name);
    }
    let all: Vec<&str> = record
        .skills
        .iter()
        .flat_map(|g| g.items.iter().map(String::as_str))
        .take(8)
        .collect();
    format!("{} specializes in {}.", name, all.join(", "))
}

fn skills_block(record: &BiographyRecord) -> String {
    let mut block = String::from("SKILLS:\n");
    for group in &record.skills {
        block.push_str(&format!("- {}: {}\n", group.category, group.items.join(", ")));
    }
    if record.skills.is_empty() {
        block.push_str("- No skill entries on file\n");
    }
    block
}

fn projects_paragraph(record: &BiographyRecord) -> String {
    let name = &record.personal.name;
    if record.projects.is_empty() {
        return format!("{} is always building something; project writeups are coming soon.", name);
    }
    let entries: Vec<&str> = record.projects.iter().map(|p| p.name.as_str()).collect();
    format!("{} has built projects including {}.", name, entries.join(", "))
}

fn projects_block(record: &BiographyRecord) -> String {
    let mut block = String::from("PROJECTS:\n");
    for p in &record.projects {
        block.push_str(&format!("- {}: {}\n", p.name, p.description));
        if !p.technologies.is_empty() {
            block.push_str(&format!("  Technologies: {}\n", p.technologies.join(", ")));
        }
    }
    if record.projects.is_empty() {
        block.push_str("- No project entries on file\n");
    }
    block
}

fn contact_paragraph(record: &BiographyRecord) -> String {
    format!(
        "The best way to reach {} is through the contact links on this site.",
        record.personal.name
    )
}

fn contact_block(record: &BiographyRecord) -> String {
    format!(
        "CONTACT:\n- Reach {} through the contact links on this site\n",
        record.personal.name
    )
}

fn name_paragraph(record: &BiographyRecord) -> String {
    let p = &record.personal;
    if p.nickname.is_empty() {
        format!("{} is {}.", p.name, indefinite(&p.title))
    } else {
        format!("{} goes by {} and works as {}.", p.name, p.nickname, indefinite(&p.title))
    }
}

fn name_block(record: &BiographyRecord) -> String {
    let p = &record.personal;
    let mut block = String::from("NAME DETAILS:\n");
    block.push_str(&format!("- Full name: {}\n", p.name));
    if !p.nickname.is_empty() {
        block.push_str(&format!("- Nickname: {}\n", p.nickname));
    }
    block.push_str(&format!("- Professional title: {}\n", p.title));
    block
}

fn location_paragraph(record: &BiographyRecord) -> String {
    let p = &record.personal;
    if p.location.is_empty() {
        format!("{}'s location isn't listed here.", p.name)
    } else {
        format!("{} is {}.", p.name, lowercase_first(&p.location))
    }
}

fn location_block(record: &BiographyRecord) -> String {
    format!("LOCATION:\n- {}\n", record.personal.location)
}
