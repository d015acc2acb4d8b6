//! Member registry
//!
//! Members are patient profiles owned by the backend, at most
//! [`DEFAULT_MAX_MEMBERS`] per account. The backend addresses them by a
//! 1-based positional `memberIndex` that shifts down when a lower-indexed
//! member is deleted, so every mutation re-fetches the list first and
//! resolves the caller's [`MemberKey`] against the current order.

use crate::backend::{Backend, MemberPayload, OcrResult, UploadFile};
use crate::error::{MedlifeError, Result};
use crate::storage::AccountRepository;
use crate::validation::{numeric_only, validate_member_names};

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// Default member cap per account
pub const DEFAULT_MAX_MEMBERS: usize = 4;

/// A member record as returned by the backend
///
/// The backend is loose about types: numeric fields may arrive as JSON
/// numbers or strings and any field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Member {
    #[serde(deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub last_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub dob: String,
    #[serde(deserialize_with = "lenient_string")]
    pub race: String,
    #[serde(deserialize_with = "lenient_string")]
    pub gender: String,
    #[serde(deserialize_with = "lenient_string")]
    pub height: String,
    #[serde(deserialize_with = "lenient_string")]
    pub weight: String,
    #[serde(deserialize_with = "lenient_string")]
    pub a1c: String,
    #[serde(deserialize_with = "lenient_string")]
    pub blood_pressure: String,
    #[serde(deserialize_with = "lenient_string")]
    pub bmi: String,
    #[serde(rename = "zip_code", deserialize_with = "lenient_string")]
    pub zip_code: String,
    #[serde(deserialize_with = "lenient_string")]
    pub medicine: String,
    /// 1-based backend position; 0 until assigned
    #[serde(deserialize_with = "lenient_index")]
    pub member_index: u32,
}

impl Member {
    /// Key remembering this member's position and identity
    pub fn key(&self) -> MemberKey {
        MemberKey {
            index: self.member_index,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }

    /// `First Last`
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// `First_Last`, the name the transcript endpoints use
    pub fn transcript_name(&self) -> String {
        format!("{}_{}", self.first_name, self.last_name)
    }

    /// Editable fields of this member
    pub fn fields(&self) -> MemberFields {
        MemberFields {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            dob: self.dob.clone(),
            race: self.race.clone(),
            gender: self.gender.clone(),
            height: self.height.clone(),
            weight: self.weight.clone(),
            a1c: self.a1c.clone(),
            blood_pressure: self.blood_pressure.clone(),
            medicine: self.medicine.clone(),
            bmi: self.bmi.clone(),
            zip_code: self.zip_code.clone(),
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

fn lenient_index<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Reference to a member as last seen by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberKey {
    pub index: u32,
    pub first_name: String,
    pub last_name: String,
}

impl MemberKey {
    fn matches(&self, member: &Member) -> bool {
        member.first_name == self.first_name && member.last_name == self.last_name
    }

    /// Resolve the key against a freshly fetched list
    ///
    /// The remembered index wins when the member there still has the same
    /// name; otherwise the first member with the same name is taken.
    pub fn resolve<'a>(&self, members: &'a [Member]) -> Option<&'a Member> {
        members
            .iter()
            .find(|m| m.member_index == self.index && self.matches(m))
            .or_else(|| members.iter().find(|m| self.matches(m)))
    }
}

impl std::fmt::Display for MemberKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} {}", self.index, self.first_name, self.last_name)
    }
}

/// User-entered member form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFields {
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub race: String,
    pub gender: String,
    pub height: String,
    pub weight: String,
    pub a1c: String,
    pub blood_pressure: String,
    pub medicine: String,
    pub bmi: String,
    pub zip_code: String,
}

impl MemberFields {
    /// Build the wire payload for `email`
    ///
    /// Height, weight and BMI keep only digits and dots; everything else is
    /// trimmed.
    pub fn payload(&self, email: &str) -> MemberPayload {
        MemberPayload {
            email: email.to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            dob: self.dob.trim().to_string(),
            race: self.race.trim().to_string(),
            gender: self.gender.trim().to_string(),
            height: numeric_only(&self.height),
            weight: numeric_only(&self.weight),
            a1c: self.a1c.trim().to_string(),
            blood_pressure: self.blood_pressure.trim().to_string(),
            medicine: self.medicine.trim().to_string(),
            bmi: numeric_only(&self.bmi),
            zip_code: self.zip_code.trim().to_string(),
        }
    }

    /// Append OCR medicines to the medicine field
    pub fn append_medicines(&mut self, result: &OcrResult) {
        let line = result.medicines_line();
        if line.is_empty() {
            return;
        }
        let current = self.medicine.trim();
        self.medicine = if current.is_empty() {
            line
        } else {
            format!("{}, {}", current, line)
        };
    }
}

/// Normalize a backend member list
///
/// Entries without a first name are dropped; a missing `memberIndex` is
/// filled with the 1-based position in the backend array.
pub fn normalize_members(raw: Vec<Member>) -> Vec<Member> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(position, mut member)| {
            if member.first_name.trim().is_empty() {
                return None;
            }
            if member.member_index == 0 {
                member.member_index = position as u32 + 1;
            }
            Some(member)
        })
        .collect()
}

/// Client view of an account's members
pub struct MemberRegistry {
    backend: Arc<dyn Backend>,
    repo: AccountRepository,
    max_members: usize,
}

impl MemberRegistry {
    pub fn new(backend: Arc<dyn Backend>, repo: AccountRepository) -> Self {
        Self {
            backend,
            repo,
            max_members: DEFAULT_MAX_MEMBERS,
        }
    }

    /// Override the member cap
    pub fn with_max_members(mut self, max_members: usize) -> Self {
        self.max_members = max_members;
        self
    }

    pub fn max_members(&self) -> usize {
        self.max_members
    }

    fn email(&self) -> &str {
        self.repo.email()
    }

    /// Fetch from the backend and replace the cached snapshot
    ///
    /// # Errors
    ///
    /// Returns the backend error; the cache is left untouched on failure.
    pub async fn fetch_fresh(&self) -> Result<Vec<Member>> {
        let raw = self.backend.list_members(self.email()).await?;
        let members = normalize_members(raw);
        if let Err(e) = self.repo.save_members(&members) {
            tracing::warn!("Failed to cache member list: {}", e);
        }
        tracing::debug!("Fetched {} members", members.len());
        Ok(members)
    }

    /// Current members, falling back to the last cached snapshot
    ///
    /// Never fails: a fetch failure with no usable cache yields an empty list.
    pub async fn list(&self) -> Vec<Member> {
        match self.fetch_fresh().await {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!("Member fetch failed, using cached list: {}", e);
                self.cached()
            }
        }
    }

    /// Last cached snapshot, empty when missing or unreadable
    pub fn cached(&self) -> Vec<Member> {
        match self.repo.members() {
            Ok(Some(members)) => members,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable member cache: {}", e);
                Vec::new()
            }
        }
    }

    /// Add a member and return the refreshed list
    ///
    /// # Errors
    ///
    /// - `MedlifeError::MemberLimit` when the cached list is already full;
    ///   no request is sent
    /// - `MedlifeError::Validation` when a name is missing
    /// - `MedlifeError::Backend` when the server rejects the member
    pub async fn add(&self, fields: &MemberFields) -> Result<Vec<Member>> {
        if self.cached().len() >= self.max_members {
            return Err(MedlifeError::MemberLimit {
                limit: self.max_members,
            }
            .into());
        }
        validate_member_names(&fields.first_name, &fields.last_name).map_err(MedlifeError::from)?;

        self.backend.add_member(&fields.payload(self.email())).await?;
        tracing::info!("Added member {} {}", fields.first_name.trim(), fields.last_name.trim());
        Ok(self.list().await)
    }

    async fn resolve(&self, key: &MemberKey) -> Result<Member> {
        let members = self.fetch_fresh().await?;
        key.resolve(&members)
            .cloned()
            .ok_or_else(|| MedlifeError::StaleMember(key.to_string()).into())
    }

    /// Update the member identified by `key`
    ///
    /// # Errors
    ///
    /// Returns `MedlifeError::StaleMember` when the member is no longer in
    /// the backend list.
    pub async fn edit(&self, key: &MemberKey, fields: &MemberFields) -> Result<Vec<Member>> {
        validate_member_names(&fields.first_name, &fields.last_name).map_err(MedlifeError::from)?;
        let current = self.resolve(key).await?;
        if current.member_index != key.index {
            tracing::info!(
                "Member {} moved from index {} to {}",
                current.full_name(),
                key.index,
                current.member_index
            );
        }
        self.backend
            .edit_member(current.member_index, &fields.payload(self.email()))
            .await?;
        Ok(self.list().await)
    }

    /// Delete the member identified by `key`; the list is always re-fetched
    pub async fn delete(&self, key: &MemberKey) -> Result<Vec<Member>> {
        let current = self.resolve(key).await?;
        self.backend
            .delete_member(self.email(), current.member_index)
            .await?;
        tracing::info!("Deleted member {}", current.full_name());
        Ok(self.list().await)
    }

    /// Full record of the member at `member_index`, remembered as current
    pub async fn details(&self, member_index: u32) -> Result<Member> {
        let mut member = self.backend.member_details(self.email(), member_index).await?;
        if member.member_index == 0 {
            member.member_index = member_index;
        }
        self.repo.set_current_member(&member)?;
        Ok(member)
    }

    /// Run OCR over a prescription file
    pub async fn extract_prescription(&self, file: UploadFile) -> Result<OcrResult> {
        Ok(self.backend.extract_prescription(file).await?)
    }
}
