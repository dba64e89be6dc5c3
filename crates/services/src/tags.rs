//! Tag label parsing for post submissions.

use domains::{slugify, Tag, TagLabel};

/// Splits a comma-separated tag field into normalised labels.
///
/// Labels are trimmed; a label without any sluggable character is skipped and
/// only the first label per slug is kept, so each result maps to exactly one
/// stored tag.
pub fn parse_tag_labels(raw: &str) -> Vec<TagLabel> {
    let mut labels: Vec<TagLabel> = Vec::new();
    for part in raw.split(',') {
        let title = part.trim();
        let slug = slugify(title);
        if slug.is_empty() || labels.iter().any(|l| l.slug == slug) {
            continue;
        }
        labels.push(TagLabel {
            title: title.to_owned(),
            slug,
        });
    }
    labels
}

/// Renders the current tag set back into the form field.
pub fn join_tag_titles(tags: &[Tag]) -> String {
    tags.iter()
        .map(|t| t.title.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_trims_and_slugs() {
        let labels = parse_tag_labels("Rust, Web Development ,axum");
        let slugs: Vec<_> = labels.iter().map(|l| l.slug.as_str()).collect();
        assert_eq!(slugs, ["rust", "web-development", "axum"]);
        assert_eq!(labels[1].title, "Web Development");
    }

    #[test]
    fn skips_empty_and_duplicate_slugs() {
        let labels = parse_tag_labels("rust,, Rust ,RUST!,  ,???");
        assert_eq!(
            labels,
            vec![TagLabel {
                title: "rust".into(),
                slug: "rust".into()
            }]
        );
    }

    #[test]
    fn empty_field_means_no_tags() {
        assert!(parse_tag_labels("").is_empty());
    }

    #[test]
    fn joins_titles_for_the_update_form() {
        let tags = vec![
            Tag { id: 1, title: "Rust".into(), slug: "rust".into() },
            Tag { id: 2, title: "Web".into(), slug: "web".into() },
        ];
        assert_eq!(join_tag_titles(&tags), "Rust,Web");
    }
}
