//! Assembles the relative path of a call: `endpoint[/id][/related[/relatedId]]`.
//!
//! Ids are caller data and are percent-encoded as single path segments.

use url::form_urlencoded;

use crate::error::ApiError;
use crate::spec::RequestSpec;

pub fn build_path(
    spec: &RequestSpec,
    object_id: Option<&str>,
    related_id: Option<&str>,
) -> Result<String, ApiError> {
    let mut path = spec.endpoint().to_string();

    if spec.needs_object_id() {
        let id = non_empty(object_id).ok_or_else(|| {
            ApiError::Validation(format!("an object id is required for '{}'", spec.endpoint()))
        })?;
        path.push('/');
        path.push_str(&encode_segment(id));
    }

    if let Some(segment) = spec.related_segment() {
        path.push('/');
        path.push_str(segment);
        if let Some(related) = non_empty(related_id) {
            path.push('/');
            path.push_str(&encode_segment(related));
        }
    }

    Ok(path)
}

/// Percent-encode `id` so `/`, `?`, `#` and spaces stay inside one segment.
fn encode_segment(id: &str) -> String {
    // byte_serialize emits `+` only for spaces; a literal `+` becomes `%2B`.
    form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::registry::{EntityType, Registry};
    use crate::spec::OperationKind;

    fn spec(kind: OperationKind, entity: EntityType, result: Option<EntityType>) -> RequestSpec {
        let registry = Registry::standard().unwrap();
        let builder = RequestSpec::builder(kind, entity);
        match result {
            Some(result) => builder.result(result),
            None => builder,
        }
        .build(&registry)
        .unwrap()
    }

    #[test]
    fn object_id_is_appended() {
        let spec = spec(OperationKind::GetEntity, EntityType::CLIENT, None);
        assert_eq!(build_path(&spec, Some("123"), None).unwrap(), "clients/123");
    }

    #[test]
    fn related_segment_and_id_are_appended() {
        let spec = spec(
            OperationKind::GetOwnedEntity,
            EntityType::LOAN_ACCOUNT,
            Some(EntityType::LOAN_TRANSACTION),
        );
        assert_eq!(
            build_path(&spec, Some("123"), Some("77")).unwrap(),
            "loans/123/transactions/77"
        );
    }

    #[test]
    fn empty_related_id_stops_at_segment() {
        let spec = spec(
            OperationKind::GetOwnedEntities,
            EntityType::LOAN_ACCOUNT,
            Some(EntityType::LOAN_TRANSACTION),
        );
        assert_eq!(
            build_path(&spec, Some("123"), Some("")).unwrap(),
            "loans/123/transactions"
        );
        assert_eq!(build_path(&spec, Some("123"), None).unwrap(), "loans/123/transactions");
    }

    #[test]
    fn missing_object_id_is_a_validation_error() {
        let spec = spec(OperationKind::DeleteEntity, EntityType::CLIENT, None);
        assert!(matches!(build_path(&spec, None, None), Err(ApiError::Validation(_))));
        assert!(matches!(build_path(&spec, Some("  "), None), Err(ApiError::Validation(_))));
    }

    #[test]
    fn reserved_characters_in_ids_stay_in_one_segment() {
        let delete = spec(OperationKind::DeleteEntity, EntityType::CLIENT, None);
        let path = build_path(&delete, Some("a/b?x=1#f"), None).unwrap();
        assert_eq!(path, "clients/a%2Fb%3Fx%3D1%23f");
        let http = crate::http::ApiRequest {
            method: HttpMethod::Delete,
            path,
            params: Vec::new(),
            encoding: crate::http::ContentEncoding::Form,
        }
        .to_http("https://demo.example.com/api");
        assert_eq!(http.url, "https://demo.example.com/api/clients/a%2Fb%3Fx%3D1%23f");

        let owned = spec(
            OperationKind::GetOwnedEntity,
            EntityType::LOAN_ACCOUNT,
            Some(EntityType::LOAN_TRANSACTION),
        );
        assert_eq!(
            build_path(&owned, Some("L 1"), Some("7+8")).unwrap(),
            "loans/L%201/transactions/7%2B8"
        );
    }

    #[test]
    fn plain_ids_are_unchanged() {
        let spec = spec(OperationKind::GetEntity, EntityType::CLIENT, None);
        assert_eq!(build_path(&spec, Some("8a8e-01_X.y"), None).unwrap(), "clients/8a8e-01_X.y");
    }

    #[test]
    fn list_ignores_object_id() {
        let spec = spec(OperationKind::GetList, EntityType::CLIENT, None);
        assert_eq!(build_path(&spec, Some("9"), None).unwrap(), "clients");
    }

    #[test]
    fn literal_path_is_used_verbatim() {
        let registry = Registry::standard().unwrap();
        let spec = RequestSpec::custom("settings/general", HttpMethod::Get)
            .build(&registry)
            .unwrap();
        assert_eq!(build_path(&spec, None, None).unwrap(), "settings/general");
    }
}
