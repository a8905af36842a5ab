use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::RateTable;
use crate::decimal::Rate;
use crate::errors::{LedgerError, Result};
use crate::types::{MemberId, MemberStatus, RateClass};

/// fund member or external borrower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub rate_class: RateClass,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn new(name: impl Into<String>, rate_class: RateClass, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            rate_class,
            status: MemberStatus::Active,
            created_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}

/// lookup side of the member directory, as consumed by loan origination
pub trait MemberDirectory {
    fn lookup(&self, id: MemberId) -> Result<&Member>;

    /// monthly rate applied to new loans for a rate class
    fn rate_for(&self, class: RateClass) -> Rate;
}

/// in-memory member directory; members are never removed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberRegistry {
    members: HashMap<MemberId, Member>,
    rates: RateTable,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rates(rates: RateTable) -> Self {
        Self {
            members: HashMap::new(),
            rates,
        }
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn register(
        &mut self,
        name: &str,
        rate_class: RateClass,
        created_at: DateTime<Utc>,
    ) -> Result<&Member> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::MissingField { field: "name" });
        }

        let member = Member::new(name, rate_class, created_at);
        let id = member.id;
        Ok(&*self.members.entry(id).or_insert(member))
    }

    pub fn set_status(&mut self, id: MemberId, status: MemberStatus) -> Result<&Member> {
        let member = self
            .members
            .get_mut(&id)
            .ok_or(LedgerError::MemberNotFound { id })?;
        member.status = status;
        Ok(&*member)
    }

    pub fn get(&self, id: MemberId) -> Option<&Member> {
        self.members.get(&id)
    }

    /// all members, oldest registration first
    pub fn list(&self) -> Vec<&Member> {
        let mut members: Vec<&Member> = self.members.values().collect();
        members.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        members
    }

    pub fn active(&self) -> Vec<&Member> {
        self.list().into_iter().filter(|m| m.is_active()).collect()
    }
}

impl MemberDirectory for MemberRegistry {
    fn lookup(&self, id: MemberId) -> Result<&Member> {
        self.members.get(&id).ok_or(LedgerError::MemberNotFound { id })
    }

    fn rate_for(&self, class: RateClass) -> Rate {
        self.rates.rate_for(class)
    }
}
