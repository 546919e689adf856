//! Membership checks.
//!
//! KYC and joining fees live outside the pool; the pool only asks whether
//! an id currently belongs to a member.

use mutual_types::MemberId;
use std::collections::BTreeSet;

pub trait Membership {
    fn is_member(&self, id: &MemberId) -> bool;
}

/// The set of currently admitted members.
#[derive(Clone, Debug, Default)]
pub struct MemberRoll {
    members: BTreeSet<MemberId>,
}

impl MemberRoll {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if `id` was already a member.
    pub fn admit(&mut self, id: MemberId) -> bool {
        self.members.insert(id)
    }

    /// Returns false if `id` was not a member.
    pub fn expel(&mut self, id: &MemberId) -> bool {
        self.members.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberId> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Membership for MemberRoll {
    fn is_member(&self, id: &MemberId) -> bool {
        self.members.contains(id)
    }
}

impl FromIterator<MemberId> for MemberRoll {
    fn from_iter<I: IntoIterator<Item = MemberId>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}
