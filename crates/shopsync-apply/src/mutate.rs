//! Thin wrapper around one GraphQL mutation call that classifies the result
//! into success / transient transport failure / `userErrors` (spec §7): the
//! three outcomes every phase needs to fold into a `PhaseStats`.

use serde_json::Value;
use shopsync_client::{ClientError, GraphQlClient};

pub enum MutationOutcome {
    Ok(Value),
    Transport(ClientError),
    UserErrors(Vec<String>),
}

/// Executes `query` and extracts the result object at `result_field`
/// (e.g. `"productUpdate"`), checking its `userErrors` list.
pub async fn execute_mutation(
    client: &GraphQlClient,
    query: &str,
    variables: Value,
    result_field: &str,
) -> MutationOutcome {
    let data = match client.execute(query, variables).await {
        Ok(data) => data,
        Err(err) => return MutationOutcome::Transport(err),
    };
    let result = &data[result_field];
    let errors: Vec<String> = result
        .get("userErrors")
        .and_then(Value::as_array)
        .map(|errs| {
            errs.iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if !errors.is_empty() {
        return MutationOutcome::UserErrors(errors);
    }
    MutationOutcome::Ok(result.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_are_distinguishable_from_transport_failures() {
        // MutationOutcome variants are exercised end-to-end by the phase
        // modules; this just pins the enum's shape against accidental
        // field renames.
        let ok = MutationOutcome::Ok(Value::Null);
        assert!(matches!(ok, MutationOutcome::Ok(_)));
    }
}
