use serde::{Deserialize, Serialize};
use std::{fmt::Display, ops::Deref, str::FromStr};
use uuid::Uuid;

/// Defines a type for the ID of the reminder.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash)]
#[serde(transparent)]
pub struct ReminderId(Uuid);

impl ReminderId {
    /// Creates a new time-ordered reminder ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ReminderId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ReminderId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for ReminderId {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(value.trim())?))
    }
}

impl Deref for ReminderId {
    type Target = Uuid;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ReminderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::ReminderId;
    use uuid::uuid;

    #[test]
    fn new_ids_are_unique_and_ordered() {
        let first = ReminderId::new();
        let second = ReminderId::new();
        assert_ne!(first, second);
        assert!(first < second);
    }

    #[test]
    fn parsing_and_display() -> anyhow::Result<()> {
        let id: ReminderId = " 00000000-0000-0000-0000-000000000001 ".parse()?;
        assert_eq!(*id, uuid!("00000000-0000-0000-0000-000000000001"));
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000001");

        assert!("not-an-id".parse::<ReminderId>().is_err());
        assert!("".parse::<ReminderId>().is_err());

        Ok(())
    }

    #[test]
    fn serialization() -> anyhow::Result<()> {
        let id = ReminderId::from(uuid!("00000000-0000-0000-0000-000000000001"));
        assert_eq!(
            serde_json::to_string(&id)?,
            r#""00000000-0000-0000-0000-000000000001""#
        );
        Ok(())
    }
}
