use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::NewCitizen;
use crate::store::ReportStore;

/// Authenticated identity as handed over by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Identity {
    pub user_id: String,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
}

impl Identity {
    pub fn display_name(&self) -> String {
        match self.full_name.as_deref().map(str::trim) {
            Some(full) if !full.is_empty() => full.to_string(),
            _ => format!(
                "{} {}",
                self.first_name.as_deref().unwrap_or(""),
                self.last_name.as_deref().unwrap_or("")
            )
            .trim()
            .to_string(),
        }
    }

    fn to_new_citizen(&self) -> NewCitizen {
        NewCitizen {
            user_id: self.user_id.clone(),
            full_name: self.display_name(),
            email: self.emails.first().cloned().unwrap_or_default(),
            phone: self.phones.first().cloned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CitizenSync {
    /// Nobody is signed in; nothing was written.
    NoIdentity,
    AlreadyPresent,
    Created,
}

/// Makes sure a citizen row exists for the signed-in identity.
///
/// Safe to call on every sign-in: the store inserts atomically on `user_id`,
/// so concurrent first logins produce one row.
pub fn ensure_citizen<S: ReportStore + ?Sized>(
    store: &S,
    identity: Option<&Identity>,
) -> Result<CitizenSync> {
    let Some(identity) = identity else {
        return Ok(CitizenSync::NoIdentity);
    };

    let created = store.insert_citizen_if_absent(&identity.to_new_citizen())?;
    if created {
        tracing::info!(user_id = %identity.user_id, "citizen profile created");
        Ok(CitizenSync::Created)
    } else {
        tracing::debug!(user_id = %identity.user_id, "citizen profile already present");
        Ok(CitizenSync::AlreadyPresent)
    }
}
