use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// `YYYY-MM-DD` (de)serialization for optional birthdays.
pub mod birthday_format {
    pub mod option {
        use serde::{de::Error, Deserialize, Deserializer, Serializer};
        use time::{format_description::FormatItem, macros::format_description, Date};

        const FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

        pub fn serialize<S: Serializer>(date: &Option<Date>, s: S) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => {
                    let text = d.format(FORMAT).map_err(<S::Error as serde::ser::Error>::custom)?;
                    s.serialize_some(&text)
                }
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
            Option::<String>::deserialize(d)?
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| Date::parse(raw.trim(), FORMAT).map_err(D::Error::custom))
                .transpose()
        }
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, never exposed in JSON
    pub email: String,
    #[serde(with = "birthday_format::option", default)]
    pub birthday: Option<Date>,
    pub favorite_movies: Vec<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields needed to insert a user. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub birthday: Option<Date>,
}

/// Full replacement of the editable profile fields.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub birthday: Option<Date>,
}
