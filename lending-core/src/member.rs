//! Member model and directory collaborator
//!
//! Identity and session management live outside the core; the engine
//! only consults a `MemberDirectory` for precondition checks. The
//! in-memory implementation backs tests and single-process deployments.

use crate::types::{BranchId, MemberId};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Member role, as used by the dashboard's access control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberRole {
    /// Full administrator
    SuperAdmin,
    /// Branch administrator
    BranchAdmin,
    /// Librarian at the front desk
    Librarian,
    /// Ordinary member
    Member,
    /// Management (read-only reporting)
    Management,
}

/// Member account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberStatus {
    /// Registered, awaiting approval
    Pending,
    /// Approved; may borrow
    Active,
    /// Deactivated
    Inactive,
}

/// Member record as supplied by the directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Member id
    pub id: MemberId,

    /// E-mail address
    pub email: String,

    /// Display name
    pub name: String,

    /// Role
    pub role: MemberRole,

    /// Account status; must be Active to borrow
    pub status: MemberStatus,

    /// Home branch, if any
    pub branch_id: Option<BranchId>,
}

/// Member directory lookup, consumed by the core
pub trait MemberDirectory: Send + Sync {
    /// Look up a member by id
    fn get(&self, id: &MemberId) -> Option<Member>;
}

/// In-memory member directory
#[derive(Debug, Default)]
pub struct InMemoryMemberDirectory {
    members: DashMap<MemberId, Member>,
}

impl InMemoryMemberDirectory {
    /// Create empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a member record
    pub fn upsert(&self, member: Member) {
        self.members.insert(member.id.clone(), member);
    }
}

impl MemberDirectory for InMemoryMemberDirectory {
    fn get(&self, id: &MemberId) -> Option<Member> {
        self.members.get(id).map(|m| m.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_lookup() {
        let directory = InMemoryMemberDirectory::new();
        directory.upsert(Member {
            id: MemberId::new("M001"),
            email: "budi@example.com".to_string(),
            name: "Budi Santoso".to_string(),
            role: MemberRole::Member,
            status: MemberStatus::Active,
            branch_id: Some(BranchId::new("CB01")),
        });

        let found = directory.get(&MemberId::new("M001")).unwrap();
        assert_eq!(found.status, MemberStatus::Active);
        assert!(directory.get(&MemberId::new("M999")).is_none());
    }
}
