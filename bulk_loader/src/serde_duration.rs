use serde::{
    Deserializer,
    de::{self, Visitor},
};

/// Reads a whole number of seconds.
pub struct DurationVisitor;

impl<'de> Visitor<'de> for DurationVisitor {
    type Value = std::time::Duration;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a non-negative number of seconds")
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        u64::try_from(value)
            .map(std::time::Duration::from_secs)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(std::time::Duration::from_secs(value))
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<std::time::Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_u64(DurationVisitor)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use figment::{
        Figment,
        providers::{Format, Toml},
    };

    #[derive(serde::Deserialize)]
    struct Ttl {
        #[serde(deserialize_with = "super::deserialize")]
        ttl: Duration,
    }

    fn parse(toml: &str) -> Result<Duration, figment::Error> {
        Figment::new()
            .merge(Toml::string(toml))
            .extract::<Ttl>()
            .map(|t| t.ttl)
    }

    #[test]
    fn whole_seconds() {
        assert_eq!(parse("ttl = 2592000").unwrap(), Duration::from_secs(2_592_000));
    }

    #[test]
    fn negative_or_textual_values_are_rejected() {
        assert!(parse("ttl = -1").is_err());
        assert!(parse("ttl = \"30d\"").is_err());
    }
}
