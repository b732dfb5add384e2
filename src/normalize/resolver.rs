use super::Domain;
use crate::data::CanonicalField;
use crate::error::NormalizeError;
use tracing::debug;

/// Maps each canonical field to the source column it will be read from.
///
/// Matching is case-insensitive. Fields are resolved in canonical order and each
/// scans its alias list front to back, taking the first alias that names a
/// column not already consumed by an earlier field. When several source columns
/// fold to the same name, the one listed first wins.
///
/// # Arguments
/// * `columns`: Source column names, in table order
/// * `domain`: Selects the alias table
///
/// # Errors
/// Returns [`NormalizeError::SchemaResolution`] if no datetime alias matches.
///
/// # Returns
/// `(field, source column)` pairs for resolved fields only, in canonical order
pub fn resolve_columns(
    columns: &[String],
    domain: Domain,
) -> Result<Vec<(CanonicalField, String)>, NormalizeError> {
    let folded: Vec<String> = columns.iter().map(|name| name.to_lowercase()).collect();
    let mut consumed = vec![false; columns.len()];
    let mut resolution = Vec::new();

    for (field, aliases) in domain.aliases() {
        let hit = aliases.iter().find_map(|alias| {
            folded
                .iter()
                .enumerate()
                .find(|(index, name)| !consumed[*index] && name.as_str() == *alias)
                .map(|(index, _)| (index, *alias))
        });

        if let Some((index, alias)) = hit {
            consumed[index] = true;
            debug!(
                field = %field,
                alias,
                source = %columns[index],
                "resolved column"
            );
            resolution.push((*field, columns[index].clone()));
        }
    }

    if !resolution
        .iter()
        .any(|(field, _)| *field == CanonicalField::Datetime)
    {
        return Err(NormalizeError::SchemaResolution {
            domain,
            aliases: domain.aliases_for(CanonicalField::Datetime).to_vec(),
            columns: columns.to_vec(),
        });
    }

    Ok(resolution)
}
