//! `defs:apply` (spec §4.6 "Definitions apply"): a separate, logically prior
//! run. Reads existing destination definitions, creates only missing ones,
//! never destructively updates. Reserved vendor-owned namespaces are
//! silently skipped. Metafield definitions whose validation payload
//! references a metaobject type's id are rewritten on create to reference
//! the destination's id for that same type name.

use crate::error::ApplyError;
use crate::mutate::{execute_mutation, MutationOutcome};
use crate::source::read_json_doc;
use serde_json::{json, Value};
use shopsync_client::{collect_all, ConnectionPath, GraphQlClient};
use shopsync_core::entity::is_reserved_namespace;
use shopsync_core::stats::{Outcome, PhaseStats};
use std::collections::HashMap;
use std::path::Path;

const CREATE_METAOBJECT_DEF: &str = r#"mutation CreateMetaobjectDefinition($input: MetaobjectDefinitionCreateInput!) {
    metaobjectDefinitionCreate(definition: $input) {
        metaobjectDefinition { id type }
        userErrors { field message }
    }
}"#;

const CREATE_METAFIELD_DEF: &str = r#"mutation CreateMetafieldDefinition($input: MetafieldDefinitionInput!) {
    metafieldDefinitionCreate(definition: $input) {
        createdDefinition { id }
        userErrors { field message }
    }
}"#;

pub async fn apply_definitions(client: &GraphQlClient, output_dir: &Path) -> Result<PhaseStats, ApplyError> {
    let source = read_json_doc(&output_dir.join("definitions.json"))?;
    let mut stats = PhaseStats::new("definitions");

    let mut type_to_dest_id = existing_metaobject_definitions(client).await?;
    let source_type_by_id = source_metaobject_type_index(&source);

    for def in source["metaobjectDefinitions"].as_array().unwrap_or(&Vec::new()) {
        let Some(type_) = def["type"].as_str() else { continue };
        if type_to_dest_id.contains_key(type_) {
            stats.record(Outcome::Skipped);
            continue;
        }
        match create_metaobject_definition(client, def).await {
            Ok(dest_id) => {
                type_to_dest_id.insert(type_.to_string(), dest_id);
                stats.record(Outcome::Created);
            }
            Err(msg) => stats.record_failure(msg),
        }
    }

    let existing_metafield_keys = existing_metafield_definition_keys(client).await?;
    for def in source["metafieldDefinitions"].as_array().unwrap_or(&Vec::new()) {
        let (Some(namespace), Some(key), Some(owner_type)) =
            (def["namespace"].as_str(), def["key"].as_str(), def["ownerType"].as_str())
        else {
            continue;
        };
        if is_reserved_namespace(namespace) {
            stats.record(Outcome::Skipped);
            continue;
        }
        if existing_metafield_keys.contains(&(owner_type.to_string(), namespace.to_string(), key.to_string())) {
            stats.record(Outcome::Skipped);
            continue;
        }
        match create_metafield_definition(client, def, &source_type_by_id, &type_to_dest_id).await {
            Ok(()) => stats.record(Outcome::Created),
            Err(msg) => stats.record_failure(msg),
        }
    }

    Ok(stats)
}

async fn existing_metaobject_definitions(client: &GraphQlClient) -> Result<HashMap<String, String>, ApplyError> {
    let query = r#"query Defs($cursor: String) {
        metaobjectDefinitions(first: 250, after: $cursor) {
            nodes { id type }
            pageInfo { hasNextPage endCursor }
        }
    }"#;
    let nodes = collect_all(client, query, json!({}), &ConnectionPath(vec!["metaobjectDefinitions"])).await?;
    Ok(nodes
        .iter()
        .filter_map(|n| Some((n["type"].as_str()?.to_string(), n["id"].as_str()?.to_string())))
        .collect())
}

async fn existing_metafield_definition_keys(client: &GraphQlClient) -> Result<Vec<(String, String, String)>, ApplyError> {
    const OWNER_TYPES: &[&str] = &["PRODUCT", "PRODUCTVARIANT", "COLLECTION", "PAGE", "BLOG", "ARTICLE", "SHOP"];
    let query = r#"query Defs($ownerType: MetafieldOwnerType!, $cursor: String) {
        metafieldDefinitions(ownerType: $ownerType, first: 250, after: $cursor) {
            nodes { namespace key ownerType }
            pageInfo { hasNextPage endCursor }
        }
    }"#;
    let mut out = Vec::new();
    for owner_type in OWNER_TYPES {
        let nodes = collect_all(client, query, json!({ "ownerType": owner_type }), &ConnectionPath(vec!["metafieldDefinitions"])).await?;
        for n in nodes {
            if let (Some(ns), Some(key)) = (n["namespace"].as_str(), n["key"].as_str()) {
                out.push((owner_type.to_string(), ns.to_string(), key.to_string()));
            }
        }
    }
    Ok(out)
}

/// Maps each source metaobject definition's own id to its type name, so a
/// metafield definition's validation payload (which references a definition
/// by source id) can be translated to a type name and then to the
/// destination's id for that type.
fn source_metaobject_type_index(source: &Value) -> HashMap<String, String> {
    source["metaobjectDefinitions"]
        .as_array()
        .unwrap_or(&Vec::new())
        .iter()
        .filter_map(|d| Some((d["id"].as_str()?.to_string(), d["type"].as_str()?.to_string())))
        .collect()
}

async fn create_metaobject_definition(client: &GraphQlClient, def: &Value) -> Result<String, String> {
    let input = json!({
        "type": def["type"],
        "name": def["name"],
        "fieldDefinitions": def["fieldDefinitions"].as_array().cloned().unwrap_or_default()
            .iter()
            .map(|f| json!({
                "key": f["key"],
                "name": f["name"],
                "type": f["type"]["name"],
                "required": f["required"],
            }))
            .collect::<Vec<_>>(),
    });
    match execute_mutation(client, CREATE_METAOBJECT_DEF, json!({ "input": input }), "metaobjectDefinitionCreate").await {
        MutationOutcome::Ok(result) => result["metaobjectDefinition"]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| "mutation returned no definition id".to_string()),
        MutationOutcome::UserErrors(errs) => Err(errs.join("; ")),
        MutationOutcome::Transport(err) => Err(err.to_string()),
    }
}

async fn create_metafield_definition(
    client: &GraphQlClient,
    def: &Value,
    source_type_by_id: &HashMap<String, String>,
    type_to_dest_id: &HashMap<String, String>,
) -> Result<(), String> {
    let validations = rewrite_validations(def["validations"].as_array().unwrap_or(&Vec::new()), source_type_by_id, type_to_dest_id);
    let input = json!({
        "namespace": def["namespace"],
        "key": def["key"],
        "name": def["name"],
        "type": def["type"]["name"],
        "ownerType": def["ownerType"],
        "validations": validations,
    });
    match execute_mutation(client, CREATE_METAFIELD_DEF, json!({ "input": input }), "metafieldDefinitionCreate").await {
        MutationOutcome::Ok(_) => Ok(()),
        MutationOutcome::UserErrors(errs) => Err(errs.join("; ")),
        MutationOutcome::Transport(err) => Err(err.to_string()),
    }
}

/// Rewrites any `metaobject_definition_id` validation entry from the
/// source's definition id to the destination's id for the same type name.
fn rewrite_validations(
    validations: &[Value],
    source_type_by_id: &HashMap<String, String>,
    type_to_dest_id: &HashMap<String, String>,
) -> Vec<Value> {
    validations
        .iter()
        .map(|v| {
            let Some(name) = v["name"].as_str() else { return v.clone() };
            if name != "metaobject_definition_id" {
                return v.clone();
            }
            let Some(source_id) = v["value"].as_str() else { return v.clone() };
            let Some(type_) = source_type_by_id.get(source_id) else { return v.clone() };
            let Some(dest_id) = type_to_dest_id.get(type_) else { return v.clone() };
            json!({ "name": name, "value": dest_id })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_metaobject_definition_id_validations_to_destination_ids() {
        let validations = vec![json!({"name": "metaobject_definition_id", "value": "gid://src/MetaobjectDefinition/1"})];
        let mut source_type_by_id = HashMap::new();
        source_type_by_id.insert("gid://src/MetaobjectDefinition/1".to_string(), "color_pattern".to_string());
        let mut type_to_dest_id = HashMap::new();
        type_to_dest_id.insert("color_pattern".to_string(), "gid://dst/MetaobjectDefinition/9".to_string());

        let rewritten = rewrite_validations(&validations, &source_type_by_id, &type_to_dest_id);
        assert_eq!(rewritten[0]["value"], "gid://dst/MetaobjectDefinition/9");
    }

    #[test]
    fn leaves_unrelated_validations_untouched() {
        let validations = vec![json!({"name": "min", "value": "1"})];
        let rewritten = rewrite_validations(&validations, &HashMap::new(), &HashMap::new());
        assert_eq!(rewritten[0]["value"], "1");
    }
}
