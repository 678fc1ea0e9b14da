//! Disambiguation detection
//!
//! An entity is a disambiguation page when its "instance of" (`P31`)
//! claims include `Q4167410`. Claim values come either as a bare id string
//! or as a `wikibase-entityid` object with an `id` member; both are
//! accepted. URI forms (`http://www.wikidata.org/entity/Q4167410`) are not.

use rosette_types::{Entity, INSTANCE_OF};
use serde_json::Value;

/// Wikidata item "Wikimedia disambiguation page"
pub const DISAMBIGUATION_PAGE: &str = "Q4167410";

pub fn is_disambiguation(entity: &Entity) -> bool {
    entity.claim_values(INSTANCE_OF).any(is_disambiguation_value)
}

fn is_disambiguation_value(value: &Value) -> bool {
    match value {
        Value::String(id) => id == DISAMBIGUATION_PAGE,
        Value::Object(map) => map.get("id").and_then(Value::as_str) == Some(DISAMBIGUATION_PAGE),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosette_types::{Claim, DataValue, Snak};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn claim(value: Value) -> Claim {
        Claim {
            mainsnak: Snak {
                datavalue: Some(DataValue {
                    value,
                    value_type: None,
                }),
            },
        }
    }

    fn entity_with(property: &str, values: Vec<Value>) -> Entity {
        let mut claims = BTreeMap::new();
        claims.insert(property.to_string(), values.into_iter().map(claim).collect());
        Entity {
            id: "Q123".to_string(),
            claims: Some(claims),
            ..Default::default()
        }
    }

    #[test]
    fn test_string_value_is_detected() {
        let entity = entity_with("P31", vec![json!("Q4167410")]);
        assert!(is_disambiguation(&entity));
    }

    #[test]
    fn test_object_value_is_detected() {
        let entity = entity_with(
            "P31",
            vec![json!({"entity-type": "item", "numeric-id": 4167410, "id": "Q4167410"})],
        );
        assert!(is_disambiguation(&entity));
    }

    #[test]
    fn test_regular_article_is_not_detected() {
        assert!(!is_disambiguation(&entity_with("P31", vec![json!("Q5")])));
        assert!(!is_disambiguation(&entity_with("P31", vec![json!({"id": "Q5"})])));
    }

    #[test]
    fn test_multi_valued_instance_of() {
        let entity = entity_with("P31", vec![json!("Q5"), json!({"id": "Q4167410"})]);
        assert!(is_disambiguation(&entity));
    }

    #[test]
    fn test_absent_claims() {
        let entity = Entity {
            id: "Q789".to_string(),
            ..Default::default()
        };
        assert!(!is_disambiguation(&entity));

        // disambiguation id under another property does not count
        assert!(!is_disambiguation(&entity_with("P17", vec![json!("Q4167410")])));
    }

    #[test]
    fn test_null_and_missing_datavalue() {
        assert!(!is_disambiguation(&entity_with("P31", vec![Value::Null])));

        let mut claims = BTreeMap::new();
        claims.insert("P31".to_string(), vec![Claim::default()]);
        let entity = Entity {
            id: "Q888".to_string(),
            claims: Some(claims),
            ..Default::default()
        };
        assert!(!is_disambiguation(&entity));
    }

    #[test]
    fn test_uri_form_is_not_matched() {
        let entity = entity_with("P31", vec![json!("http://www.wikidata.org/entity/Q4167410")]);
        assert!(!is_disambiguation(&entity));
    }
}
