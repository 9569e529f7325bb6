use beacon_platform::Embed;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("field {index} is null")]
    NullField { index: usize },

    #[error("field {index} has an empty name")]
    EmptyName { index: usize },

    #[error("field {index} has an empty value")]
    EmptyValue { index: usize },
}

/// Reports the first field that would make the platform reject the embed.
pub fn validate(embed: &Embed) -> Result<(), ContentError> {
    for (index, field) in embed.fields.iter().enumerate() {
        let Some(field) = field else {
            return Err(ContentError::NullField { index });
        };
        if field.name.is_empty() {
            return Err(ContentError::EmptyName { index });
        }
        if field.value.is_empty() {
            return Err(ContentError::EmptyValue { index });
        }
    }
    Ok(())
}

pub fn is_valid(embed: &Embed) -> bool {
    validate(embed).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_platform::EmbedField;

    #[test]
    fn embed_without_fields_is_valid() {
        assert!(is_valid(&Embed::default()));
        assert!(is_valid(&Embed::titled("Lobby")));
    }

    #[test]
    fn complete_fields_are_valid() {
        let embed = Embed::titled("Lobby")
            .with_field(EmbedField::new("Host", "alice"))
            .with_field(EmbedField::new("Phase", "tasks").inline());
        assert_eq!(validate(&embed), Ok(()));
    }

    #[test]
    fn empty_value_is_rejected() {
        let embed = Embed::default().with_field(EmbedField::new("Host", ""));
        assert_eq!(validate(&embed), Err(ContentError::EmptyValue { index: 0 }));
        assert!(!is_valid(&embed));
    }

    #[test]
    fn empty_name_is_rejected() {
        let embed = Embed::default()
            .with_field(EmbedField::new("Host", "alice"))
            .with_field(EmbedField::new("", "red"));
        assert_eq!(validate(&embed), Err(ContentError::EmptyName { index: 1 }));
    }

    #[test]
    fn null_slot_is_rejected() {
        let embed: Embed = serde_json::from_value(serde_json::json!({
            "title": "Lobby",
            "fields": [{ "name": "Host", "value": "alice" }, null]
        }))
        .expect("embed with null slot deserializes");
        assert_eq!(validate(&embed), Err(ContentError::NullField { index: 1 }));
    }
}
