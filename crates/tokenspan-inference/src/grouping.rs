//! Mention grouping for decoded entities
//!
//! Buckets entity mentions by type and collapses repeat mentions of the same
//! surface text into one group that keeps every mention. Surface texts are
//! compared ASCII case-insensitively; the first mention's casing names the
//! group.

use std::collections::BTreeMap;

use tokenspan_core::{Entity, GroupedEntity};

/// Group mentions by entity type.
///
/// Groups keep first-seen order within each type; the map itself iterates
/// in type order, so output is deterministic for a given mention list.
pub fn group_entities(entities: &[Entity]) -> BTreeMap<String, Vec<GroupedEntity>> {
    let mut grouped: BTreeMap<String, Vec<GroupedEntity>> = BTreeMap::new();
    for entity in entities {
        let bucket = grouped.entry(entity.entity_group.clone()).or_default();
        match bucket
            .iter_mut()
            .find(|group| group.word.eq_ignore_ascii_case(&entity.word))
        {
            Some(group) => {
                group.count += 1;
                group.mentions.push(entity.clone());
            }
            None => bucket.push(GroupedEntity {
                word: entity.word.clone(),
                entity_group: entity.entity_group.clone(),
                count: 1,
                mentions: vec![entity.clone()],
            }),
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(group: &str, word: &str, start: usize) -> Entity {
        Entity::new(group, word, 0.9, start, start + word.len())
    }

    #[test]
    fn mentions_bucket_by_type() {
        let entities = vec![
            entity("PER", "Tim Cook", 0),
            entity("ORG", "Apple", 20),
            entity("LOC", "Cupertino", 40),
        ];
        let grouped = group_entities(&entities);
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped["PER"].len(), 1);
        assert_eq!(grouped["ORG"][0].word, "Apple");
    }

    #[test]
    fn repeat_mentions_collapse_case_insensitively() {
        let entities = vec![
            entity("ORG", "Apple", 0),
            entity("ORG", "APPLE", 30),
            entity("ORG", "Google", 60),
        ];
        let grouped = group_entities(&entities);
        let orgs = &grouped["ORG"];
        assert_eq!(orgs.len(), 2);
        assert_eq!(orgs[0].word, "Apple");
        assert_eq!(orgs[0].count, 2);
        assert_eq!(orgs[0].mentions.len(), 2);
        assert_eq!(orgs[0].mentions[1].word, "APPLE");
        assert_eq!(orgs[1].count, 1);
    }

    #[test]
    fn same_word_in_different_types_stays_separate() {
        let entities = vec![
            entity("PER", "Jordan", 0),
            entity("LOC", "Jordan", 30),
        ];
        let grouped = group_entities(&entities);
        assert_eq!(grouped["PER"][0].count, 1);
        assert_eq!(grouped["LOC"][0].count, 1);
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(group_entities(&[]).is_empty());
    }
}
