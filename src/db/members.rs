use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};

use crate::error::{Entity, StoreError, StoreResult};
use crate::input::NewMember;
use crate::models::{Member, MemberDetail};

use super::Store;

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        name: row.get(1)?,
        main_position: row.get(2)?,
    })
}

impl Store {
    /// Every member in identity order. Callers should not rely on the order.
    pub fn list_members(&self) -> StoreResult<Vec<Member>> {
        let mut stmt = self.conn.prepare(
            "SELECT member_id, member_name, main_position
             FROM members
             ORDER BY member_id",
        )?;

        let members = stmt
            .query_map([], member_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = members.len(), "listed members");

        Ok(members)
    }

    pub fn get_member(&self, id: i64) -> StoreResult<Member> {
        self.conn
            .query_row(
                "SELECT member_id, member_name, main_position
                 FROM members
                 WHERE member_id = ?1",
                [id],
                member_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found(Entity::Member, id))
    }

    /// Insert a member. Members exist independently of bands; use
    /// [`Store::create_membership`] to place them in one.
    pub fn create_member(&self, member: &NewMember) -> StoreResult<Member> {
        member.validate()?;

        self.conn.execute(
            "INSERT INTO members (member_name, main_position) VALUES (?1, ?2)",
            params![member.name, member.main_position],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(member_id = id, name = %member.name, "created member");
        Ok(Member {
            id,
            name: member.name.clone(),
            main_position: member.main_position.clone(),
        })
    }

    /// The member plus every band tenure it holds.
    pub fn member_detail(&self, id: i64) -> StoreResult<MemberDetail> {
        let member = self.get_member(id)?;
        let memberships = self.memberships_for_member(id)?;
        Ok(MemberDetail {
            member,
            memberships,
        })
    }

    pub(crate) fn member_exists(&self, id: i64) -> StoreResult<bool> {
        self.row_exists("members", "member_id", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_member_round_trips_through_get() {
        let store = Store::open_in_memory().unwrap();
        let ringo = store
            .create_member(&NewMember::new("Ringo Starr").playing("Drums"))
            .unwrap();

        assert_eq!(store.get_member(ringo.id).unwrap(), ringo);
        assert_eq!(ringo.to_string(), "Ringo Starr (Drums)");
    }

    #[test]
    fn create_member_requires_a_name() {
        let store = Store::open_in_memory().unwrap();
        let err = store.create_member(&NewMember::new("")).unwrap_err();

        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.list_members().unwrap().is_empty());
    }

    #[test]
    fn long_position_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let err = store
            .create_member(&NewMember::new("Brian Eno").playing("x".repeat(81)))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref errors) if errors.has("main_position")));
    }

    #[test]
    fn missing_member_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.get_member(3).unwrap_err().is_not_found());
    }
}
