//! Derived searchable index over the biography record, plus the fuzzy
//! refinement stage used by the Context Retriever.
//!
//! The index is built once after the record loads and is read-only at query
//! time.

use nucleo_matcher::{pattern::Pattern, Matcher};

use crate::biography::BiographyRecord;

/// Minimum raw nucleo score for a fuzzy hit to count as relevant.
const MIN_FUZZY_SCORE: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Faq,
    Skills,
    Education,
    Project,
    Personal,
}

/// Back-reference from a searchable item to the record fragment it was
/// derived from.
#[derive(Debug, Clone, Copy)]
pub enum FragmentRef {
    Faq(usize),
    Skills(usize),
    Education(usize),
    Project(usize),
    Personal,
}

#[derive(Debug, Clone)]
pub struct SearchableItem {
    pub kind: ItemKind,
    /// Lower-cased concatenation of the fragment's searchable text.
    pub text: String,
    pub keywords: Vec<String>,
    pub fragment: FragmentRef,
}

impl SearchableItem {
    /// Render the kind-specific context block for this item.
    pub fn format_block(&self, record: &BiographyRecord) -> String {
        match self.fragment {
            FragmentRef::Faq(i) => {
                let faq = &record.faq[i];
                format!("Q: {}\nA: {}\n", faq.question, faq.answer)
            }
            FragmentRef::Skills(i) => {
                let group = &record.skills[i];
                format!("SKILLS ({}): {}\n", group.category, group.items.join(", "))
            }
            FragmentRef::Education(i) => {
                let e = &record.personal.education[i];
                match &e.note {
                    Some(note) => format!("EDUCATION: {} at {} ({})\n", e.program, e.institution, note),
                    None => format!("EDUCATION: {} at {}\n", e.program, e.institution),
                }
            }
            FragmentRef::Project(i) => {
                let p = &record.projects[i];
                format!("PROJECT {}: {} ({})\n", p.name, p.description, p.technologies.join(", "))
            }
            FragmentRef::Personal => {
                let p = &record.personal;
                format!("ABOUT: {}. {}\n", p.name, p.bio)
            }
        }
    }
}

/// Flatten the record into searchable items. Insertion order is the
/// tie-break order for equal fuzzy scores.
pub fn build_index(record: &BiographyRecord) -> Vec<SearchableItem> {
    let mut items = Vec::new();

    for (i, faq) in record.faq.iter().enumerate() {
        items.push(SearchableItem {
            kind: ItemKind::Faq,
            text: format!("{} {}", faq.question, faq.answer).to_lowercase(),
            keywords: faq.keywords.iter().map(|k| k.to_lowercase()).collect(),
            fragment: FragmentRef::Faq(i),
        });
    }

    for (i, group) in record.skills.iter().enumerate() {
        items.push(SearchableItem {
            kind: ItemKind::Skills,
            text: format!("{} {}", group.category, group.items.join(" ")).to_lowercase(),
            keywords: vec![group.category.to_lowercase()],
            fragment: FragmentRef::Skills(i),
        });
    }

    for (i, e) in record.personal.education.iter().enumerate() {
        items.push(SearchableItem {
            kind: ItemKind::Education,
            text: format!("{} {}", e.program, e.institution).to_lowercase(),
            keywords: Vec::new(),
            fragment: FragmentRef::Education(i),
        });
    }

    for (i, p) in record.projects.iter().enumerate() {
        items.push(SearchableItem {
            kind: ItemKind::Project,
            text: format!("{} {} {}", p.name, p.description, p.technologies.join(" "))
                .to_lowercase(),
            keywords: vec![p.name.to_lowercase()],
            fragment: FragmentRef::Project(i),
        });
    }

    items.push(SearchableItem {
        kind: ItemKind::Personal,
        text: format!(
            "{} {} {} {}",
            record.personal.name,
            record.personal.title,
            record.personal.bio,
            record.personal.interests.join(" ")
        )
        .to_lowercase(),
        keywords: Vec::new(),
        fragment: FragmentRef::Personal,
    });

    tracing::debug!(items = items.len(), "Searchable index built");
    items
}

#[derive(Debug)]
pub struct FuzzyMatch<'a> {
    pub item: &'a SearchableItem,
    pub score: u32,
}

/// Approximate search over the index. Returns up to `limit` items scoring at
/// least the relevance threshold, best first; ties keep insertion order
/// (the sort is stable).
pub fn fuzzy_search<'a>(
    items: &'a [SearchableItem],
    query: &str,
    limit: usize,
) -> Vec<FuzzyMatch<'a>> {
    // Punctuation would become literal pattern atoms ("skills?" never
    // matches "skills"); keep only words
    let query: String = query
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' { c } else { ' ' })
        .collect();
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);
    let pattern = Pattern::parse(
        query,
        nucleo_matcher::pattern::CaseMatching::Ignore,
        nucleo_matcher::pattern::Normalization::Smart,
    );

    let mut scored: Vec<FuzzyMatch<'a>> = items
        .iter()
        .filter_map(|item| {
            let text_haystack = nucleo_matcher::Utf32String::from(item.text.as_str());
            let text_score = pattern.score(text_haystack.slice(..), &mut matcher);

            let keyword_score = item
                .keywords
                .iter()
                .filter_map(|kw| {
                    let haystack = nucleo_matcher::Utf32String::from(kw.as_str());
                    pattern.score(haystack.slice(..), &mut matcher)
                })
                .max();

            let best = [text_score, keyword_score].into_iter().flatten().max()?;
            if best < MIN_FUZZY_SCORE {
                return None;
            }
            Some(FuzzyMatch { item, score: best })
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(limit);
    scored
}
